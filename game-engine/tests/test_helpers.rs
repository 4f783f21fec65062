#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use game_engine::{Config, Perfut, PlayContext};
use game_persistence::connection::connect_to_memory_database;
use game_persistence::repositories::{CardRecord, CardRepository, NewCard, RoundRepository};
use game_types::{Advance, GameId, GameOutcome, RoundView, User};
use migration::{Migrator, MigratorTrait};
use sea_orm::DatabaseConnection;

/// Engines over a fresh in-memory database.
pub struct TestSetup {
    pub db: DatabaseConnection,
    pub perfut: Perfut,
}

impl TestSetup {
    pub async fn new() -> Self {
        Self::with_config(Config::default()).await
    }

    pub async fn with_config(config: Config) -> Self {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        Self {
            perfut: Perfut::new(db.clone(), config),
            db,
        }
    }

    /// Insert one card per answer for `theme`, each with ten hints.
    pub async fn seed_cards(&self, theme: &str, answers: &[&str]) {
        let cards = answers.iter().map(|answer| create_test_card(theme, answer)).collect();
        CardRepository::new(self.db.clone())
            .import_cards(cards)
            .await
            .unwrap();
    }

    pub async fn register(&self, name: &str) -> (User, PlayContext) {
        let user = self
            .perfut
            .ledger
            .register(name, &format!("{}@test.com", name.to_lowercase()))
            .await
            .unwrap();
        let ctx = PlayContext::for_user(user.id);
        (user, ctx)
    }

    pub async fn user(&self, ctx: &PlayContext) -> User {
        self.perfut.ledger.profile(ctx).await.unwrap()
    }

    /// The card behind round `number` of a game, once the round exists.
    pub async fn card_of_round(&self, game_id: GameId, number: i32) -> CardRecord {
        let round = RoundRepository::new(self.db.clone())
            .find_by_game_and_number(game_id, number)
            .await
            .unwrap()
            .expect("round should exist");
        CardRepository::new(self.db.clone())
            .find_by_id(round.card_id)
            .await
            .unwrap()
            .unwrap()
    }

    pub async fn current_round(&self, ctx: &PlayContext, now: DateTime<Utc>) -> RoundView {
        expect_round(self.perfut.games.advance(ctx, now).await.unwrap())
    }

    /// Play the current round with the right answer.
    pub async fn answer_correctly(&self, ctx: &PlayContext, now: DateTime<Utc>) -> RoundView {
        let view = self.current_round(ctx, now).await;
        let card = self.card_of_round(view.game_id, view.number).await;
        self.perfut.games.guess(ctx, &card.answer, now).await.unwrap()
    }

    /// Skip rounds until the game reports an outcome.
    pub async fn skip_to_end(&self, ctx: &PlayContext, now: DateTime<Utc>) -> GameOutcome {
        loop {
            match self.perfut.games.advance(ctx, now).await.unwrap() {
                Advance::Round(_) => {
                    self.perfut.games.skip(ctx, now).await.unwrap();
                }
                Advance::Finished(outcome) => return outcome,
            }
        }
    }
}

pub fn create_test_card(theme: &str, answer: &str) -> NewCard {
    NewCard {
        theme: theme.to_string(),
        title: format!("Quem é {}?", answer),
        answer: answer.to_string(),
        hints: (1..=10).map(|i| format!("{} dica {}", answer, i)).collect(),
        difficulty: 1,
    }
}

/// Wednesday noon, inside the week the weekly tests use.
pub fn test_start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 4, 12, 0, 0).unwrap()
}

pub fn expect_round(advance: Advance) -> RoundView {
    match advance {
        Advance::Round(view) => view,
        other => panic!("Expected a round, got {:?}", other),
    }
}

pub fn expect_finished(advance: Advance) -> GameOutcome {
    match advance {
        Advance::Finished(outcome) => outcome,
        other => panic!("Expected a finished game, got {:?}", other),
    }
}
