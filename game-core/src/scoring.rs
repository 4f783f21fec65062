use game_types::{DuelResult, UserId};

/// Points awarded for a correct guess before any hint beyond the first is used.
pub const MAX_CARD_POINTS: i32 = 10;
/// A correct guess never earns less than this.
pub const MIN_CARD_POINTS: i32 = 1;

pub struct ScoringEngine;

impl ScoringEngine {
    /// Points for a correct guess after `hints_used` hints.
    ///
    /// The first hint is free; every further hint costs one point, down to
    /// a floor of [`MIN_CARD_POINTS`].
    pub fn card_points(hints_used: i32) -> i32 {
        let base = MAX_CARD_POINTS - (hints_used - 1).max(0);
        base.max(MIN_CARD_POINTS)
    }

    /// Final duel result from both participants' game scores.
    pub fn duel_result(
        creator_id: UserId,
        creator_score: i32,
        opponent_id: UserId,
        opponent_score: i32,
    ) -> DuelResult {
        let winner = match creator_score.cmp(&opponent_score) {
            std::cmp::Ordering::Greater => Some(creator_id),
            std::cmp::Ordering::Less => Some(opponent_id),
            std::cmp::Ordering::Equal => None,
        };

        DuelResult::Finished {
            creator_id,
            opponent_id,
            creator_score,
            opponent_score,
            winner,
        }
    }
}
