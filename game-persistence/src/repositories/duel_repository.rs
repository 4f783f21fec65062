use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};

use super::{Debited, GameRecord, GameRepository, NewGame, UserRepository};
use crate::decode_json;
use crate::entities::{duel_scores, duels, prelude::*};
use game_types::{CardId, DuelId, DuelStatus, DuelView, GameMode, UserId};

#[derive(Debug, Clone, PartialEq)]
pub struct DuelRecord {
    pub id: DuelId,
    pub code: String,
    pub creator_id: UserId,
    pub opponent_id: Option<UserId>,
    pub themes: Vec<String>,
    pub rounds_count: i32,
    pub difficulty: Option<i32>,
    pub status: DuelStatus,
    /// Card for each round, once drawn
    pub card_sequence: Option<Vec<CardId>>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl DuelRecord {
    pub fn is_participant(&self, user_id: UserId) -> bool {
        self.creator_id == user_id || self.opponent_id == Some(user_id)
    }

    pub fn to_view(&self) -> DuelView {
        DuelView {
            id: self.id,
            code: self.code.clone(),
            creator_id: self.creator_id,
            opponent_id: self.opponent_id,
            status: self.status,
            themes: self.themes.clone(),
            rounds_count: self.rounds_count,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewDuel {
    pub code: String,
    pub creator_id: UserId,
    pub themes: Vec<String>,
    pub rounds_count: i32,
    pub difficulty: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    Joined { duel: DuelRecord, game: GameRecord },
    /// Not waiting any more, already taken, or the joiner created it
    NotJoinable,
    InsufficientFunds { required: i32, available: i32 },
}

pub struct DuelRepository {
    db: DatabaseConnection,
}

impl DuelRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_duel(model: duels::Model) -> Result<DuelRecord> {
        let status = DuelStatus::parse(&model.status)
            .ok_or_else(|| anyhow!("Duel {} has unknown status '{}'", model.id, model.status))?;
        let card_sequence = model
            .card_sequence_json
            .as_deref()
            .map(|raw| decode_json("duels.card_sequence_json", raw))
            .transpose()?;

        Ok(DuelRecord {
            themes: decode_json("duels.themes_json", &model.themes_json)?,
            id: model.id,
            code: model.code,
            creator_id: model.creator_id,
            opponent_id: model.opponent_id,
            rounds_count: model.rounds_count,
            difficulty: model.difficulty,
            status,
            card_sequence,
            created_at: model.created_at,
            finished_at: model.finished_at,
        })
    }

    fn duel_game(duel: &DuelRecord, user_id: UserId) -> NewGame {
        NewGame {
            user_id,
            mode: GameMode::Duel,
            rounds_count: duel.rounds_count,
            themes: duel.themes.clone(),
            difficulty: duel.difficulty,
            duel_id: Some(duel.id),
            weekly_event_id: None,
        }
    }

    pub async fn find_by_id(&self, id: DuelId) -> Result<Option<DuelRecord>> {
        Duels::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Self::model_to_duel)
            .transpose()
    }

    pub async fn find_by_code(&self, code: &str) -> Result<Option<DuelRecord>> {
        Duels::find()
            .filter(duels::Column::Code.eq(code))
            .one(&self.db)
            .await?
            .map(Self::model_to_duel)
            .transpose()
    }

    pub async fn code_exists(&self, code: &str) -> Result<bool> {
        let count = Duels::find()
            .filter(duels::Column::Code.eq(code))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    /// Create a waiting duel together with the creator's game, charging the entry cost.
    pub async fn create_duel(
        &self,
        new_duel: &NewDuel,
        entry_cost: i32,
        now: DateTime<Utc>,
    ) -> Result<Debited<(DuelRecord, GameRecord)>> {
        let txn = self.db.begin().await?;

        if !UserRepository::debit_coins_in(&txn, new_duel.creator_id, entry_cost).await? {
            let available = UserRepository::coins_in(&txn, new_duel.creator_id).await?;
            txn.rollback().await?;
            return Ok(Debited::InsufficientFunds {
                required: entry_cost,
                available,
            });
        }

        let duel_model = duels::ActiveModel {
            id: ActiveValue::NotSet,
            code: ActiveValue::Set(new_duel.code.clone()),
            creator_id: ActiveValue::Set(new_duel.creator_id),
            opponent_id: ActiveValue::Set(None),
            themes_json: ActiveValue::Set(serde_json::to_string(&new_duel.themes)?),
            rounds_count: ActiveValue::Set(new_duel.rounds_count),
            difficulty: ActiveValue::Set(new_duel.difficulty),
            status: ActiveValue::Set(DuelStatus::Waiting.as_str().to_string()),
            card_sequence_json: ActiveValue::Set(None),
            created_at: ActiveValue::Set(now),
            finished_at: ActiveValue::Set(None),
        };
        let inserted = Duels::insert(duel_model).exec(&txn).await?;
        let duel = Duels::find_by_id(inserted.last_insert_id)
            .one(&txn)
            .await?
            .ok_or_else(|| anyhow!("Failed to retrieve created duel"))?;
        let duel = Self::model_to_duel(duel)?;

        let game = GameRepository::insert_game_in(
            &txn,
            &Self::duel_game(&duel, new_duel.creator_id),
            now,
        )
        .await?;
        txn.commit().await?;

        tracing::info!(
            "Created duel {} ({}) by user {}",
            duel.id,
            duel.code,
            duel.creator_id
        );
        Ok(Debited::Done((duel, game)))
    }

    /// Claim the opponent slot and create the opponent's game in one transaction.
    pub async fn join_duel(
        &self,
        id: DuelId,
        opponent_id: UserId,
        entry_cost: i32,
        now: DateTime<Utc>,
    ) -> Result<JoinOutcome> {
        let txn = self.db.begin().await?;

        let claimed = Duels::update_many()
            .col_expr(duels::Column::OpponentId, Expr::value(Some(opponent_id)))
            .col_expr(
                duels::Column::Status,
                Expr::value(DuelStatus::Active.as_str()),
            )
            .filter(duels::Column::Id.eq(id))
            .filter(duels::Column::Status.eq(DuelStatus::Waiting.as_str()))
            .filter(duels::Column::OpponentId.is_null())
            .filter(duels::Column::CreatorId.ne(opponent_id))
            .exec(&txn)
            .await?;

        if claimed.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(JoinOutcome::NotJoinable);
        }

        if !UserRepository::debit_coins_in(&txn, opponent_id, entry_cost).await? {
            let available = UserRepository::coins_in(&txn, opponent_id).await?;
            txn.rollback().await?;
            return Ok(JoinOutcome::InsufficientFunds {
                required: entry_cost,
                available,
            });
        }

        let duel = Duels::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| anyhow!("Duel {} not found", id))?;
        let duel = Self::model_to_duel(duel)?;
        let game =
            GameRepository::insert_game_in(&txn, &Self::duel_game(&duel, opponent_id), now).await?;
        txn.commit().await?;

        tracing::info!("User {} joined duel {}", opponent_id, duel.id);
        Ok(JoinOutcome::Joined { duel, game })
    }

    /// Store the duel's card sequence unless one was stored first.
    pub async fn freeze_card_sequence(&self, id: DuelId, sequence: &[CardId]) -> Result<bool> {
        let result = Duels::update_many()
            .col_expr(
                duels::Column::CardSequenceJson,
                Expr::value(Some(serde_json::to_string(sequence)?)),
            )
            .filter(duels::Column::Id.eq(id))
            .filter(duels::Column::CardSequenceJson.is_null())
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Flip an active duel to finished and snapshot the participant scores.
    ///
    /// Returns false when another caller finished it first.
    pub async fn finish_duel(
        &self,
        id: DuelId,
        scores: &[(UserId, i32)],
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let txn = self.db.begin().await?;

        let finished = Duels::update_many()
            .col_expr(
                duels::Column::Status,
                Expr::value(DuelStatus::Finished.as_str()),
            )
            .col_expr(duels::Column::FinishedAt, Expr::value(Some(now)))
            .filter(duels::Column::Id.eq(id))
            .filter(duels::Column::Status.eq(DuelStatus::Active.as_str()))
            .exec(&txn)
            .await?;

        if finished.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(false);
        }

        DuelScores::delete_many()
            .filter(duel_scores::Column::DuelId.eq(id))
            .exec(&txn)
            .await?;

        for &(user_id, score) in scores {
            let score_model = duel_scores::ActiveModel {
                id: ActiveValue::NotSet,
                duel_id: ActiveValue::Set(id),
                user_id: ActiveValue::Set(user_id),
                score: ActiveValue::Set(score),
                recorded_at: ActiveValue::Set(now),
            };
            DuelScores::insert(score_model).exec(&txn).await?;
        }

        txn.commit().await?;
        Ok(true)
    }

    pub async fn scores_for_duel(&self, id: DuelId) -> Result<Vec<(UserId, i32)>> {
        let scores = DuelScores::find()
            .filter(duel_scores::Column::DuelId.eq(id))
            .order_by_asc(duel_scores::Column::UserId)
            .all(&self.db)
            .await?;
        Ok(scores.into_iter().map(|s| (s.user_id, s.score)).collect())
    }
}
