use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{DuelResult, GameId, RoundId, WeeklyEventId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum GameMode {
    Solo,
    Duel,
    Weekly,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Solo => "solo",
            GameMode::Duel => "duel",
            GameMode::Weekly => "weekly",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "solo" => Some(GameMode::Solo),
            "duel" => Some(GameMode::Duel),
            "weekly" => Some(GameMode::Weekly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum GameStatus {
    Active,
    Finished,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Active => "active",
            GameStatus::Finished => "finished",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(GameStatus::Active),
            "finished" => Some(GameStatus::Finished),
            _ => None,
        }
    }
}

/// What the presentation layer receives for the round currently in play.
/// The card title and, until the round allows it, the answer are withheld.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoundView {
    pub game_id: GameId,
    pub round_id: RoundId,
    pub number: i32,
    pub rounds_count: i32,
    pub theme: String,
    pub hints: Vec<String>,
    pub requested_hints: i32,
    pub extra_hint_used: bool,
    pub seconds_remaining: i64,
    pub finished: bool,
    pub answer_revealed: bool,
    pub answer: Option<String>,
    pub user_guess: Option<String>,
    pub points: i32,
    /// Points a correct guess would earn at the current hint count
    pub potential_points: i32,
    pub game_score: i32,
}

/// Result of asking a game for its current round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Advance {
    Round(RoundView),
    Finished(GameOutcome),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum GameOutcome {
    Solo {
        game_id: GameId,
        score: i32,
    },
    Weekly {
        game_id: GameId,
        event_id: WeeklyEventId,
        day: String, // ISO 8601 date
        score: i32,
    },
    Duel {
        game_id: GameId,
        result: DuelResult,
    },
}

impl GameOutcome {
    pub fn game_id(&self) -> GameId {
        match self {
            GameOutcome::Solo { game_id, .. }
            | GameOutcome::Weekly { game_id, .. }
            | GameOutcome::Duel { game_id, .. } => *game_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoundSummary {
    pub number: i32,
    pub theme: String,
    pub answer: String,
    pub user_guess: Option<String>,
    pub points: i32,
    /// Finished without a guess (skipped or out of time)
    pub unanswered: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameSummary {
    pub game_id: GameId,
    pub mode: GameMode,
    pub status: GameStatus,
    pub score: i32,
    pub rounds: Vec<RoundSummary>,
    pub created_at: String, // ISO 8601 string
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_string_mapping() {
        for mode in [GameMode::Solo, GameMode::Duel, GameMode::Weekly] {
            assert_eq!(GameMode::parse(mode.as_str()), Some(mode));
        }
        assert_eq!(GameMode::parse("quiz"), None);
    }

    #[test]
    fn test_status_string_mapping() {
        assert_eq!(GameStatus::parse("active"), Some(GameStatus::Active));
        assert_eq!(GameStatus::parse("finished"), Some(GameStatus::Finished));
        assert_eq!(GameStatus::parse("Finished"), None);
    }

    #[test]
    fn test_outcome_serializes_with_variant_tag() {
        let outcome = GameOutcome::Solo {
            game_id: 3,
            score: 18,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["Solo"]["score"], 18);
        assert_eq!(outcome.game_id(), 3);
    }
}
