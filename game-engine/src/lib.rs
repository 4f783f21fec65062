use std::sync::Arc;

use sea_orm::DatabaseConnection;

pub mod config;
pub mod context;
pub mod duel_coordinator;
pub mod error;
pub mod game_engine;
pub mod progression;
pub mod round_engine;

pub use config::Config;
pub use context::PlayContext;
pub use duel_coordinator::DuelCoordinator;
pub use error::{EngineError, EngineResult};
pub use game_engine::GameEngine;
pub use progression::ProgressionLedger;
pub use round_engine::{PlayedRound, RoundEngine};

/// The engines wired against one database and one configuration.
pub struct Perfut {
    pub games: GameEngine,
    pub duels: Arc<DuelCoordinator>,
    pub ledger: Arc<ProgressionLedger>,
    pub config: Arc<Config>,
}

impl Perfut {
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        let config = Arc::new(config);
        let duels = Arc::new(DuelCoordinator::new(db.clone(), config.clone()));
        let ledger = Arc::new(ProgressionLedger::new(db.clone(), config.clone()));
        let games = GameEngine::new(db, duels.clone(), ledger.clone(), config.clone());

        Self {
            games,
            duels,
            ledger,
            config,
        }
    }
}
