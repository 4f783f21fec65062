use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};

use super::{GameRepository, UserRepository};
use crate::decode_json;
use crate::entities::{prelude::*, rounds};
use game_types::{CardId, GameId, RoundId, UserId};

#[derive(Debug, Clone, PartialEq)]
pub struct RoundRecord {
    pub id: RoundId,
    pub game_id: GameId,
    pub number: i32,
    pub card_id: CardId,
    pub requested_hints: i32,
    pub extra_hint_used: bool,
    pub hint_order: Vec<usize>,
    pub user_guess: Option<String>,
    pub points: i32,
    pub finished: bool,
    pub started_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRound {
    pub game_id: GameId,
    pub number: i32,
    pub card_id: CardId,
    pub hint_order: Vec<usize>,
    pub started_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

/// Final values written when a round closes.
#[derive(Debug, Clone)]
pub struct RoundResult {
    pub requested_hints: i32,
    pub user_guess: Option<String>,
    pub points: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HintPurchase {
    Purchased,
    AlreadyUsed,
    RoundFinished,
    InsufficientFunds { required: i32, available: i32 },
}

pub struct RoundRepository {
    db: DatabaseConnection,
}

impl RoundRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_round(model: rounds::Model) -> Result<RoundRecord> {
        Ok(RoundRecord {
            hint_order: decode_json("rounds.hint_order_json", &model.hint_order_json)?,
            id: model.id,
            game_id: model.game_id,
            number: model.number,
            card_id: model.card_id,
            requested_hints: model.requested_hints,
            extra_hint_used: model.extra_hint_used,
            user_guess: model.user_guess,
            points: model.user_points,
            finished: model.finished,
            started_at: model.started_at,
            ends_at: model.ends_at,
        })
    }

    pub async fn find_by_id(&self, id: RoundId) -> Result<Option<RoundRecord>> {
        Rounds::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Self::model_to_round)
            .transpose()
    }

    pub async fn find_by_game_and_number(
        &self,
        game_id: GameId,
        number: i32,
    ) -> Result<Option<RoundRecord>> {
        Rounds::find()
            .filter(rounds::Column::GameId.eq(game_id))
            .filter(rounds::Column::Number.eq(number))
            .one(&self.db)
            .await?
            .map(Self::model_to_round)
            .transpose()
    }

    pub async fn list_for_game(&self, game_id: GameId) -> Result<Vec<RoundRecord>> {
        Rounds::find()
            .filter(rounds::Column::GameId.eq(game_id))
            .order_by_asc(rounds::Column::Number)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Self::model_to_round)
            .collect()
    }

    pub async fn count_finished(&self, game_id: GameId) -> Result<usize> {
        let count = Rounds::find()
            .filter(rounds::Column::GameId.eq(game_id))
            .filter(rounds::Column::Finished.eq(true))
            .count(&self.db)
            .await?;
        Ok(usize::try_from(count)?)
    }

    /// Insert the round unless its slot already exists, then return whatever
    /// occupies the slot. Concurrent callers all observe the same round.
    pub async fn insert_if_absent(&self, new_round: &NewRound) -> Result<RoundRecord> {
        let round_model = rounds::ActiveModel {
            id: ActiveValue::NotSet,
            game_id: ActiveValue::Set(new_round.game_id),
            number: ActiveValue::Set(new_round.number),
            card_id: ActiveValue::Set(new_round.card_id),
            requested_hints: ActiveValue::Set(0),
            extra_hint_used: ActiveValue::Set(false),
            hint_order_json: ActiveValue::Set(serde_json::to_string(&new_round.hint_order)?),
            user_guess: ActiveValue::Set(None),
            user_points: ActiveValue::Set(0),
            finished: ActiveValue::Set(false),
            started_at: ActiveValue::Set(new_round.started_at),
            ends_at: ActiveValue::Set(new_round.ends_at),
        };

        let inserted = Rounds::insert(round_model)
            .on_conflict(
                OnConflict::columns([rounds::Column::GameId, rounds::Column::Number])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        if inserted == 0 {
            tracing::debug!(
                "Round {} of game {} already exists",
                new_round.number,
                new_round.game_id
            );
        }

        self.find_by_game_and_number(new_round.game_id, new_round.number)
            .await?
            .ok_or_else(|| anyhow!("Round {} of game {} vanished", new_round.number, new_round.game_id))
    }

    /// Move the hint counter from `expected` to `requested_hints` on an open round.
    pub async fn set_requested_hints(
        &self,
        id: RoundId,
        expected: i32,
        requested_hints: i32,
    ) -> Result<bool> {
        let result = Rounds::update_many()
            .col_expr(rounds::Column::RequestedHints, Expr::value(requested_hints))
            .filter(rounds::Column::Id.eq(id))
            .filter(rounds::Column::Finished.eq(false))
            .filter(rounds::Column::RequestedHints.eq(expected))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Close an open round and credit its points to the game together.
    ///
    /// `round` is the snapshot the outcome was computed from. Returns false,
    /// writing nothing, when the round was already finished or its hint count
    /// moved since that snapshot was read.
    pub async fn finish_round(&self, round: &RoundRecord, outcome: &RoundResult) -> Result<bool> {
        let txn = self.db.begin().await?;

        let result = Rounds::update_many()
            .col_expr(rounds::Column::Finished, Expr::value(true))
            .col_expr(
                rounds::Column::RequestedHints,
                Expr::value(outcome.requested_hints),
            )
            .col_expr(
                rounds::Column::UserGuess,
                Expr::value(outcome.user_guess.clone()),
            )
            .col_expr(rounds::Column::UserPoints, Expr::value(outcome.points))
            .filter(rounds::Column::Id.eq(round.id))
            .filter(rounds::Column::Finished.eq(false))
            .filter(rounds::Column::RequestedHints.eq(round.requested_hints))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(false);
        }

        GameRepository::add_score_in(&txn, round.game_id, outcome.points).await?;
        txn.commit().await?;
        Ok(true)
    }

    /// Mark the paid extra hint as used and charge `cost` coins, all or nothing.
    pub async fn purchase_extra_hint(
        &self,
        id: RoundId,
        user_id: UserId,
        cost: i32,
    ) -> Result<HintPurchase> {
        let txn = self.db.begin().await?;

        let marked = Rounds::update_many()
            .col_expr(rounds::Column::ExtraHintUsed, Expr::value(true))
            .filter(rounds::Column::Id.eq(id))
            .filter(rounds::Column::Finished.eq(false))
            .filter(rounds::Column::ExtraHintUsed.eq(false))
            .exec(&txn)
            .await?;

        if marked.rows_affected == 0 {
            let current = Rounds::find_by_id(id)
                .one(&txn)
                .await?
                .ok_or_else(|| anyhow!("Round {} not found", id))?;
            txn.rollback().await?;
            return Ok(if current.finished {
                HintPurchase::RoundFinished
            } else {
                HintPurchase::AlreadyUsed
            });
        }

        if !UserRepository::debit_coins_in(&txn, user_id, cost).await? {
            let available = UserRepository::coins_in(&txn, user_id).await?;
            txn.rollback().await?;
            return Ok(HintPurchase::InsufficientFunds {
                required: cost,
                available,
            });
        }

        txn.commit().await?;
        Ok(HintPurchase::Purchased)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_memory_and_migrate;
    use crate::repositories::{CardRepository, Debited, GameRecord, NewCard, NewGame};
    use chrono::Duration;
    use game_types::GameMode;

    struct Fixture {
        rounds: RoundRepository,
        games: GameRepository,
        users: UserRepository,
        game: GameRecord,
        card_id: CardId,
    }

    async fn setup(coins: i32) -> Fixture {
        let db = connect_memory_and_migrate().await.unwrap();
        let users = UserRepository::new(db.clone());
        let games = GameRepository::new(db.clone());
        let cards = CardRepository::new(db.clone());

        let user = users.create_user("Round Tester", "rounds@example.com", coins).await.unwrap();
        cards
            .import_cards(vec![NewCard {
                theme: "clube".to_string(),
                title: "Clube".to_string(),
                answer: "Palmeiras".to_string(),
                hints: (1..=10).map(|i| format!("hint {}", i)).collect(),
                difficulty: 1,
            }])
            .await
            .unwrap();
        let card = cards.random_for_theme("clube", None, &[]).await.unwrap().unwrap();

        let new_game = NewGame {
            user_id: user.id,
            mode: GameMode::Solo,
            rounds_count: 2,
            themes: vec!["clube".to_string()],
            difficulty: None,
            duel_id: None,
            weekly_event_id: None,
        };
        let game = match games.create_game(&new_game, 0, Utc::now()).await.unwrap() {
            Debited::Done(game) => game,
            other => panic!("unexpected outcome: {:?}", other),
        };

        Fixture {
            rounds: RoundRepository::new(db),
            games,
            users,
            game,
            card_id: card.id,
        }
    }

    fn new_round(fixture: &Fixture, number: i32, hint_order: Vec<usize>) -> NewRound {
        let started_at = Utc::now();
        NewRound {
            game_id: fixture.game.id,
            number,
            card_id: fixture.card_id,
            hint_order,
            started_at,
            ends_at: started_at + Duration::seconds(60),
        }
    }

    #[tokio::test]
    async fn test_round_slot_created_once() {
        let fixture = setup(50).await;

        let first = fixture
            .rounds
            .insert_if_absent(&new_round(&fixture, 1, vec![2, 0, 1]))
            .await
            .unwrap();
        let second = fixture
            .rounds
            .insert_if_absent(&new_round(&fixture, 1, vec![0, 1, 2]))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.hint_order, vec![2, 0, 1]);
        assert_eq!(fixture.rounds.list_for_game(fixture.game.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_hint_counter_compare_and_set() {
        let fixture = setup(50).await;
        let round = fixture
            .rounds
            .insert_if_absent(&new_round(&fixture, 1, vec![0, 1, 2]))
            .await
            .unwrap();

        assert!(fixture.rounds.set_requested_hints(round.id, 0, 1).await.unwrap());
        // A stale writer still expecting 0 loses
        assert!(!fixture.rounds.set_requested_hints(round.id, 0, 1).await.unwrap());

        let stored = fixture.rounds.find_by_id(round.id).await.unwrap().unwrap();
        assert_eq!(stored.requested_hints, 1);
    }

    #[tokio::test]
    async fn test_finish_round_credits_game_once() {
        let fixture = setup(50).await;
        let round = fixture
            .rounds
            .insert_if_absent(&new_round(&fixture, 1, vec![0, 1, 2]))
            .await
            .unwrap();
        let outcome = RoundResult {
            requested_hints: 3,
            user_guess: Some("palmeiras".to_string()),
            points: 8,
        };

        assert!(fixture.rounds.finish_round(&round, &outcome).await.unwrap());
        assert!(!fixture.rounds.finish_round(&round, &outcome).await.unwrap());

        let game = fixture.games.find_by_id(fixture.game.id).await.unwrap().unwrap();
        assert_eq!(game.score, 8);
        assert_eq!(fixture.rounds.count_finished(fixture.game.id).await.unwrap(), 1);

        let stored = fixture.rounds.find_by_id(round.id).await.unwrap().unwrap();
        assert!(stored.finished);
        assert_eq!(stored.points, 8);
        assert_eq!(stored.user_guess.as_deref(), Some("palmeiras"));
    }

    #[tokio::test]
    async fn test_stale_finish_loses_to_hint_request() {
        let fixture = setup(50).await;
        let round = fixture
            .rounds
            .insert_if_absent(&new_round(&fixture, 1, vec![0, 1, 2]))
            .await
            .unwrap();
        assert!(fixture.rounds.set_requested_hints(round.id, 0, 2).await.unwrap());
        let snapshot = fixture.rounds.find_by_id(round.id).await.unwrap().unwrap();

        // Another request reveals a third hint after the snapshot was read
        assert!(fixture.rounds.set_requested_hints(round.id, 2, 3).await.unwrap());

        let stale = RoundResult {
            requested_hints: 2,
            user_guess: Some("palmeiras".to_string()),
            points: 9,
        };
        assert!(!fixture.rounds.finish_round(&snapshot, &stale).await.unwrap());

        let stored = fixture.rounds.find_by_id(round.id).await.unwrap().unwrap();
        assert!(!stored.finished);
        assert_eq!(stored.requested_hints, 3);
        let game = fixture.games.find_by_id(fixture.game.id).await.unwrap().unwrap();
        assert_eq!(game.score, 0);

        let current = RoundResult {
            requested_hints: 3,
            user_guess: Some("palmeiras".to_string()),
            points: 8,
        };
        assert!(fixture.rounds.finish_round(&stored, &current).await.unwrap());
        let game = fixture.games.find_by_id(fixture.game.id).await.unwrap().unwrap();
        assert_eq!(game.score, 8);
    }

    #[tokio::test]
    async fn test_extra_hint_purchase() {
        let fixture = setup(7).await;
        let round = fixture
            .rounds
            .insert_if_absent(&new_round(&fixture, 1, vec![0, 1, 2]))
            .await
            .unwrap();

        assert_eq!(
            fixture.rounds.purchase_extra_hint(round.id, fixture.game.user_id, 5).await.unwrap(),
            HintPurchase::Purchased
        );
        assert_eq!(
            fixture.rounds.purchase_extra_hint(round.id, fixture.game.user_id, 5).await.unwrap(),
            HintPurchase::AlreadyUsed
        );
        let user = fixture.users.find_by_id(fixture.game.user_id).await.unwrap().unwrap();
        assert_eq!(user.coins, 2);
    }

    #[tokio::test]
    async fn test_extra_hint_without_funds_changes_nothing() {
        let fixture = setup(3).await;
        let round = fixture
            .rounds
            .insert_if_absent(&new_round(&fixture, 1, vec![0, 1, 2]))
            .await
            .unwrap();

        assert_eq!(
            fixture.rounds.purchase_extra_hint(round.id, fixture.game.user_id, 5).await.unwrap(),
            HintPurchase::InsufficientFunds {
                required: 5,
                available: 3
            }
        );
        let stored = fixture.rounds.find_by_id(round.id).await.unwrap().unwrap();
        assert!(!stored.extra_hint_used);

        let outcome = RoundResult {
            requested_hints: 1,
            user_guess: None,
            points: 0,
        };
        fixture.rounds.finish_round(&stored, &outcome).await.unwrap();
        assert_eq!(
            fixture.rounds.purchase_extra_hint(round.id, fixture.game.user_id, 5).await.unwrap(),
            HintPurchase::RoundFinished
        );
    }
}
