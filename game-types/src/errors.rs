use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Typed failures surfaced to callers of the game operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum GameError {
    #[error("Not authenticated")]
    NotAuthenticated,
    #[error("{entity} {id} not found")]
    NotFound { entity: String, id: String },
    #[error("Invalid state: {reason}")]
    InvalidState { reason: String },
    #[error("Insufficient funds: {required} coins required, {available} available")]
    InsufficientFunds { required: i32, available: i32 },
    #[error("No card available for theme '{theme}'")]
    NoCardAvailable { theme: String },
    #[error("Extra hint already used for this round")]
    AlreadyUsed,
    #[error("Duel '{code}' cannot be joined")]
    DuelNotJoinable { code: String },
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },
}

impl GameError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        GameError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn invalid_state(reason: impl Into<String>) -> Self {
        GameError::InvalidState {
            reason: reason.into(),
        }
    }

    pub fn invalid_input(reason: impl Into<String>) -> Self {
        GameError::InvalidInput {
            reason: reason.into(),
        }
    }
}
