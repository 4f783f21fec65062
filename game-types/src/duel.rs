use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{DuelId, GameId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum DuelStatus {
    Waiting,  // Created, no opponent yet
    Active,   // Both participants joined
    Finished, // Both participant games finished
}

impl DuelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuelStatus::Waiting => "waiting",
            DuelStatus::Active => "active",
            DuelStatus::Finished => "finished",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "waiting" => Some(DuelStatus::Waiting),
            "active" => Some(DuelStatus::Active),
            "finished" => Some(DuelStatus::Finished),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DuelView {
    pub id: DuelId,
    pub code: String,
    pub creator_id: UserId,
    pub opponent_id: Option<UserId>,
    pub status: DuelStatus,
    pub themes: Vec<String>,
    pub rounds_count: i32,
}

/// Returned to a participant entering a duel: the duel plus the game they play it with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DuelTicket {
    pub duel: DuelView,
    pub game_id: GameId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum DuelResult {
    /// At least one participant is still playing
    StillWaiting,
    Finished {
        creator_id: UserId,
        opponent_id: UserId,
        creator_score: i32,
        opponent_score: i32,
        /// `None` on an exact tie
        winner: Option<UserId>,
    },
}

impl DuelResult {
    pub fn is_finished(&self) -> bool {
        matches!(self, DuelResult::Finished { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duel_status_round_trip_names() {
        assert_eq!(DuelStatus::parse("waiting"), Some(DuelStatus::Waiting));
        assert_eq!(DuelStatus::Active.as_str(), "active");
        assert_eq!(DuelStatus::parse("cancelled"), None);
    }

    #[test]
    fn test_still_waiting_is_not_finished() {
        assert!(!DuelResult::StillWaiting.is_finished());
        let finished = DuelResult::Finished {
            creator_id: 1,
            opponent_id: 2,
            creator_score: 10,
            opponent_score: 10,
            winner: None,
        };
        assert!(finished.is_finished());
    }
}
