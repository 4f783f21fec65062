use game_types::GameError;

/// Failure of an engine operation: a typed game failure or a storage fault.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Game(#[from] GameError),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl EngineError {
    /// The typed game failure, if this is one.
    pub fn game_error(&self) -> Option<&GameError> {
        match self {
            EngineError::Game(error) => Some(error),
            EngineError::Storage(_) => None,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
