use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveValue, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};

use super::{Debited, UserRepository};
use crate::decode_json;
use crate::entities::{games, prelude::*};
use game_types::{DuelId, GameId, GameMode, GameStatus, UserId, WeeklyEventId};

#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub id: GameId,
    pub user_id: UserId,
    pub mode: GameMode,
    pub status: GameStatus,
    pub rounds_count: i32,
    pub themes: Vec<String>,
    pub difficulty: Option<i32>,
    pub score: i32,
    pub duel_id: Option<DuelId>,
    pub weekly_event_id: Option<WeeklyEventId>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl GameRecord {
    pub fn is_finished(&self) -> bool {
        self.status == GameStatus::Finished
    }
}

#[derive(Debug, Clone)]
pub struct NewGame {
    pub user_id: UserId,
    pub mode: GameMode,
    pub rounds_count: i32,
    pub themes: Vec<String>,
    pub difficulty: Option<i32>,
    pub duel_id: Option<DuelId>,
    pub weekly_event_id: Option<WeeklyEventId>,
}

pub struct GameRepository {
    db: DatabaseConnection,
}

impl GameRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub(crate) fn model_to_game(model: games::Model) -> Result<GameRecord> {
        let mode = GameMode::parse(&model.mode)
            .ok_or_else(|| anyhow!("Game {} has unknown mode '{}'", model.id, model.mode))?;
        let status = GameStatus::parse(&model.status)
            .ok_or_else(|| anyhow!("Game {} has unknown status '{}'", model.id, model.status))?;

        Ok(GameRecord {
            themes: decode_json("games.themes_json", &model.themes_json)?,
            id: model.id,
            user_id: model.user_id,
            mode,
            status,
            rounds_count: model.rounds_count,
            difficulty: model.difficulty,
            score: model.user_score,
            duel_id: model.duel_id,
            weekly_event_id: model.weekly_event_id,
            created_at: model.created_at,
            finished_at: model.finished_at,
        })
    }

    /// Create a game, charging `entry_cost` coins in the same transaction.
    pub async fn create_game(
        &self,
        new_game: &NewGame,
        entry_cost: i32,
        now: DateTime<Utc>,
    ) -> Result<Debited<GameRecord>> {
        let txn = self.db.begin().await?;

        if !UserRepository::debit_coins_in(&txn, new_game.user_id, entry_cost).await? {
            let available = UserRepository::coins_in(&txn, new_game.user_id).await?;
            txn.rollback().await?;
            return Ok(Debited::InsufficientFunds {
                required: entry_cost,
                available,
            });
        }

        let game = Self::insert_game_in(&txn, new_game, now).await?;
        txn.commit().await?;

        tracing::info!(
            "Created {} game {} for user {} ({} rounds)",
            game.mode.as_str(),
            game.id,
            game.user_id,
            game.rounds_count
        );
        Ok(Debited::Done(game))
    }

    pub async fn insert_game_in<C: ConnectionTrait>(
        conn: &C,
        new_game: &NewGame,
        now: DateTime<Utc>,
    ) -> Result<GameRecord> {
        let game_model = games::ActiveModel {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::Set(new_game.user_id),
            mode: ActiveValue::Set(new_game.mode.as_str().to_string()),
            status: ActiveValue::Set(GameStatus::Active.as_str().to_string()),
            rounds_count: ActiveValue::Set(new_game.rounds_count),
            themes_json: ActiveValue::Set(serde_json::to_string(&new_game.themes)?),
            difficulty: ActiveValue::Set(new_game.difficulty),
            user_score: ActiveValue::Set(0),
            duel_id: ActiveValue::Set(new_game.duel_id),
            weekly_event_id: ActiveValue::Set(new_game.weekly_event_id),
            created_at: ActiveValue::Set(now),
            finished_at: ActiveValue::Set(None),
        };

        let inserted = Games::insert(game_model).exec(conn).await?;
        let created = Games::find_by_id(inserted.last_insert_id)
            .one(conn)
            .await?
            .ok_or_else(|| anyhow!("Failed to retrieve created game"))?;

        Self::model_to_game(created)
    }

    pub async fn find_by_id(&self, id: GameId) -> Result<Option<GameRecord>> {
        Games::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Self::model_to_game)
            .transpose()
    }

    /// Add round points to the running game score.
    pub async fn add_score_in<C: ConnectionTrait>(conn: &C, id: GameId, points: i32) -> Result<()> {
        if points == 0 {
            return Ok(());
        }
        Games::update_many()
            .col_expr(
                games::Column::UserScore,
                Expr::col(games::Column::UserScore).add(points),
            )
            .filter(games::Column::Id.eq(id))
            .exec(conn)
            .await?;
        Ok(())
    }

    /// Flip an active game to finished. Returns false if it was already finished.
    pub async fn mark_finished(&self, id: GameId, now: DateTime<Utc>) -> Result<bool> {
        let result = Games::update_many()
            .col_expr(
                games::Column::Status,
                Expr::value(GameStatus::Finished.as_str()),
            )
            .col_expr(games::Column::FinishedAt, Expr::value(Some(now)))
            .filter(games::Column::Id.eq(id))
            .filter(games::Column::Status.eq(GameStatus::Active.as_str()))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// The most recent game `user_id` started for a duel.
    pub async fn latest_for_duel(&self, duel_id: DuelId, user_id: UserId) -> Result<Option<GameRecord>> {
        Games::find()
            .filter(games::Column::DuelId.eq(duel_id))
            .filter(games::Column::UserId.eq(user_id))
            .order_by_desc(games::Column::Id)
            .one(&self.db)
            .await?
            .map(Self::model_to_game)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_memory_and_migrate;

    async fn setup_test_db() -> (GameRepository, UserRepository) {
        let db = connect_memory_and_migrate().await.unwrap();
        (GameRepository::new(db.clone()), UserRepository::new(db))
    }

    fn solo_game(user_id: UserId) -> NewGame {
        NewGame {
            user_id,
            mode: GameMode::Solo,
            rounds_count: 3,
            themes: vec!["clube".to_string(), "estadio".to_string()],
            difficulty: None,
            duel_id: None,
            weekly_event_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_find_game() {
        let (games, users) = setup_test_db().await;
        let user = users.create_user("Player", "player@example.com", 50).await.unwrap();

        let created = match games.create_game(&solo_game(user.id), 0, Utc::now()).await.unwrap() {
            Debited::Done(game) => game,
            other => panic!("unexpected outcome: {:?}", other),
        };
        assert_eq!(created.status, GameStatus::Active);
        assert_eq!(created.score, 0);
        assert_eq!(created.themes, vec!["clube", "estadio"]);

        let found = games.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn test_entry_cost_is_charged_atomically() {
        let (games, users) = setup_test_db().await;
        let user = users.create_user("Broke", "broke@example.com", 3).await.unwrap();

        let outcome = games.create_game(&solo_game(user.id), 5, Utc::now()).await.unwrap();
        assert_eq!(
            outcome,
            Debited::InsufficientFunds {
                required: 5,
                available: 3
            }
        );
        assert_eq!(users.find_by_id(user.id).await.unwrap().unwrap().coins, 3);

        let paid = games.create_game(&solo_game(user.id), 2, Utc::now()).await.unwrap();
        assert!(matches!(paid, Debited::Done(_)));
        assert_eq!(users.find_by_id(user.id).await.unwrap().unwrap().coins, 1);
    }

    #[tokio::test]
    async fn test_score_and_finish() {
        let (games, users) = setup_test_db().await;
        let user = users.create_user("Scorer", "scorer@example.com", 50).await.unwrap();
        let game = match games.create_game(&solo_game(user.id), 0, Utc::now()).await.unwrap() {
            Debited::Done(game) => game,
            other => panic!("unexpected outcome: {:?}", other),
        };

        GameRepository::add_score_in(&games.db, game.id, 8).await.unwrap();
        GameRepository::add_score_in(&games.db, game.id, 3).await.unwrap();

        assert!(games.mark_finished(game.id, Utc::now()).await.unwrap());
        assert!(!games.mark_finished(game.id, Utc::now()).await.unwrap());

        let finished = games.find_by_id(game.id).await.unwrap().unwrap();
        assert_eq!(finished.score, 11);
        assert!(finished.is_finished());
        assert!(finished.finished_at.is_some());
        assert_eq!(users.total_score(user.id).await.unwrap(), 11);
    }
}
