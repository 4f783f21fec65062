use game_types::{DuelId, GameError, GameId, RoundId, UserId};

/// Caller identity and the ids the client is currently holding.
///
/// Built per request by whoever authenticates the caller; engines never keep it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayContext {
    pub user_id: Option<UserId>,
    pub active_game: Option<GameId>,
    /// Round the client last saw; actions then target it instead of the current one
    pub active_round: Option<RoundId>,
    pub active_duel: Option<DuelId>,
}

impl PlayContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn with_game(mut self, game_id: GameId) -> Self {
        self.active_game = Some(game_id);
        self
    }

    pub fn with_round(mut self, round_id: RoundId) -> Self {
        self.active_round = Some(round_id);
        self
    }

    pub fn with_duel(mut self, duel_id: DuelId) -> Self {
        self.active_duel = Some(duel_id);
        self
    }

    pub fn require_user(&self) -> Result<UserId, GameError> {
        self.user_id.ok_or(GameError::NotAuthenticated)
    }

    pub fn require_game(&self) -> Result<GameId, GameError> {
        self.active_game
            .ok_or_else(|| GameError::invalid_input("no active game"))
    }

    pub fn require_duel(&self) -> Result<DuelId, GameError> {
        self.active_duel
            .ok_or_else(|| GameError::invalid_input("no active duel"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_context_is_refused() {
        let ctx = PlayContext::anonymous();
        assert_eq!(ctx.require_user(), Err(GameError::NotAuthenticated));
        assert!(ctx.require_game().is_err());
    }

    #[test]
    fn test_builder() {
        let ctx = PlayContext::for_user(7).with_game(3).with_duel(9);
        assert_eq!(ctx.require_user(), Ok(7));
        assert_eq!(ctx.require_game(), Ok(3));
        assert_eq!(ctx.require_duel(), Ok(9));
    }
}
