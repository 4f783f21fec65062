use chrono::{DateTime, Duration, Utc};
use game_types::GameError;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::{AnswerMatcher, ScoringEngine};

/// Random permutation of `0..hint_count`, fixed once per round.
pub fn shuffled_hint_order<R: Rng + ?Sized>(hint_count: usize, rng: &mut R) -> Vec<usize> {
    let mut order: Vec<usize> = (0..hint_count).collect();
    order.shuffle(rng);
    order
}

/// Effect of applying an action to a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundTransition {
    /// Nothing changed (finished round, hint ceiling reached, deadline not passed)
    Unchanged,
    HintRevealed { requested_hints: i32 },
    Guessed { correct: bool, points: i32 },
    Skipped,
    Expired,
}

impl RoundTransition {
    pub fn finishes_round(&self) -> bool {
        matches!(
            self,
            RoundTransition::Guessed { .. } | RoundTransition::Skipped | RoundTransition::Expired
        )
    }
}

/// Mutable play state of one round against one card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundState {
    pub requested_hints: i32,
    pub extra_hint_used: bool,
    pub user_guess: Option<String>,
    pub points: i32,
    pub finished: bool,
    pub started_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    /// Indices into the card's hint list; hints are revealed in this order
    pub hint_order: Vec<usize>,
}

impl RoundState {
    pub fn start<R: Rng + ?Sized>(
        hint_count: usize,
        now: DateTime<Utc>,
        duration: Duration,
        rng: &mut R,
    ) -> Self {
        Self {
            requested_hints: 0,
            extra_hint_used: false,
            user_guess: None,
            points: 0,
            finished: false,
            started_at: now,
            ends_at: now + duration,
            hint_order: shuffled_hint_order(hint_count, rng),
        }
    }

    /// Highest value `requested_hints` may reach.
    pub fn hint_ceiling(&self, max_hints: i32) -> i32 {
        let available = i32::try_from(self.hint_order.len()).unwrap_or(i32::MAX);
        max_hints.min(available).max(0)
    }

    pub fn reveal_next_hint(&mut self, max_hints: i32) -> RoundTransition {
        if self.finished || self.requested_hints >= self.hint_ceiling(max_hints) {
            return RoundTransition::Unchanged;
        }
        self.requested_hints += 1;
        RoundTransition::HintRevealed {
            requested_hints: self.requested_hints,
        }
    }

    /// Checks that the paid extra hint may be bought; the debit itself is the caller's.
    pub fn check_extra_hint_purchase(&self) -> Result<(), GameError> {
        if self.finished {
            return Err(GameError::invalid_state("round is already finished"));
        }
        if self.extra_hint_used {
            return Err(GameError::AlreadyUsed);
        }
        Ok(())
    }

    pub fn submit_guess(&mut self, raw_guess: &str, answer: &str) -> RoundTransition {
        if self.finished {
            return RoundTransition::Unchanged;
        }
        if self.requested_hints == 0 {
            self.requested_hints = 1;
        }
        let correct = AnswerMatcher::is_correct(raw_guess, answer);
        self.points = if correct {
            ScoringEngine::card_points(self.requested_hints)
        } else {
            0
        };
        self.user_guess = Some(raw_guess.to_string());
        self.finished = true;
        RoundTransition::Guessed {
            correct,
            points: self.points,
        }
    }

    pub fn submit_skip(&mut self) -> RoundTransition {
        if self.finished {
            return RoundTransition::Unchanged;
        }
        self.finish_unanswered();
        RoundTransition::Skipped
    }

    pub fn expire_if_past_deadline(&mut self, now: DateTime<Utc>) -> RoundTransition {
        if self.finished || now <= self.ends_at {
            return RoundTransition::Unchanged;
        }
        self.finish_unanswered();
        RoundTransition::Expired
    }

    fn finish_unanswered(&mut self) {
        self.finished = true;
        self.points = 0;
        self.user_guess = None;
    }

    /// Hints visible to the player: the leading entries of the frozen order,
    /// one extra when the paid hint was bought.
    pub fn revealed_hints<'a>(&self, hints: &'a [String]) -> Vec<&'a str> {
        let extra = usize::from(self.extra_hint_used);
        let shown = usize::try_from(self.requested_hints).unwrap_or(0) + extra;
        self.hint_order
            .iter()
            .take(shown)
            .filter_map(|&index| hints.get(index).map(String::as_str))
            .collect()
    }

    pub fn seconds_remaining(&self, now: DateTime<Utc>) -> i64 {
        if self.finished {
            return 0;
        }
        (self.ends_at - now).num_seconds().max(0)
    }

    /// The answer is shown once the player has committed a guess.
    pub fn answer_revealed(&self) -> bool {
        self.finished && self.user_guess.is_some()
    }

    /// Finished without a guess: skipped or out of time.
    pub fn unanswered(&self) -> bool {
        self.finished && self.user_guess.is_none()
    }

    pub fn potential_points(&self) -> i32 {
        ScoringEngine::card_points(self.requested_hints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn start_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn fresh_round(hint_count: usize) -> RoundState {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        RoundState::start(hint_count, start_time(), Duration::seconds(60), &mut rng)
    }

    fn hints(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("hint {}", i)).collect()
    }

    #[test]
    fn test_start_shape() {
        let round = fresh_round(10);
        assert_eq!(round.requested_hints, 0);
        assert!(!round.finished);
        assert_eq!(round.ends_at - round.started_at, Duration::seconds(60));

        let mut sorted = round.hint_order.clone();
        sorted.sort();
        assert_eq!(sorted, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_reveal_stops_at_ceiling() {
        let mut round = fresh_round(3);
        for expected in 1..=3 {
            assert_eq!(
                round.reveal_next_hint(10),
                RoundTransition::HintRevealed {
                    requested_hints: expected
                }
            );
        }
        assert_eq!(round.reveal_next_hint(10), RoundTransition::Unchanged);
        assert_eq!(round.requested_hints, 3);

        let mut capped = fresh_round(12);
        for _ in 0..20 {
            capped.reveal_next_hint(10);
        }
        assert_eq!(capped.requested_hints, 10);
    }

    #[test]
    fn test_revealed_hints_follow_frozen_order() {
        let card_hints = hints(10);
        let mut round = fresh_round(10);
        round.reveal_next_hint(10);
        round.reveal_next_hint(10);
        let first_read = round.revealed_hints(&card_hints);
        let second_read = round.revealed_hints(&card_hints);
        assert_eq!(first_read, second_read);
        assert_eq!(first_read.len(), 2);
        assert_eq!(first_read[0], card_hints[round.hint_order[0]]);
        assert_eq!(first_read[1], card_hints[round.hint_order[1]]);

        round.reveal_next_hint(10);
        let third_read = round.revealed_hints(&card_hints);
        assert_eq!(&third_read[..2], &first_read[..]);
    }

    #[test]
    fn test_extra_hint_is_additive() {
        let card_hints = hints(10);
        let mut round = fresh_round(10);
        round.reveal_next_hint(10);
        assert!(round.check_extra_hint_purchase().is_ok());
        round.extra_hint_used = true;
        assert_eq!(round.revealed_hints(&card_hints).len(), 2);
        assert_eq!(round.requested_hints, 1);
        assert_eq!(round.check_extra_hint_purchase(), Err(GameError::AlreadyUsed));
    }

    #[test]
    fn test_correct_guess_scores_by_hints() {
        let mut round = fresh_round(10);
        for _ in 0..3 {
            round.reveal_next_hint(10);
        }
        let transition = round.submit_guess("Néymar Jr.", "Neymar JR");
        assert_eq!(
            transition,
            RoundTransition::Guessed {
                correct: true,
                points: 8
            }
        );
        assert!(round.finished);
        assert!(round.answer_revealed());
        assert_eq!(round.user_guess.as_deref(), Some("Néymar Jr."));
    }

    #[test]
    fn test_guess_without_hints_counts_first_hint() {
        let mut round = fresh_round(10);
        round.submit_guess("fred", "Fred");
        assert_eq!(round.requested_hints, 1);
        assert_eq!(round.points, 10);
    }

    #[test]
    fn test_wrong_guess_scores_zero() {
        let mut round = fresh_round(10);
        let transition = round.submit_guess("Romário", "Fred");
        assert_eq!(
            transition,
            RoundTransition::Guessed {
                correct: false,
                points: 0
            }
        );
        assert!(round.answer_revealed());
    }

    #[test]
    fn test_finished_round_is_terminal() {
        let mut round = fresh_round(10);
        round.submit_guess("fred", "Fred");
        let snapshot = round.clone();

        assert_eq!(round.submit_guess("other", "Fred"), RoundTransition::Unchanged);
        assert_eq!(round.submit_skip(), RoundTransition::Unchanged);
        assert_eq!(round.reveal_next_hint(10), RoundTransition::Unchanged);
        assert_eq!(
            round.expire_if_past_deadline(start_time() + Duration::hours(1)),
            RoundTransition::Unchanged
        );
        assert_eq!(round, snapshot);
        assert!(round.check_extra_hint_purchase().is_err());
    }

    #[test]
    fn test_skip_leaves_guess_empty() {
        let mut round = fresh_round(10);
        round.reveal_next_hint(10);
        assert_eq!(round.submit_skip(), RoundTransition::Skipped);
        assert!(round.finished);
        assert!(round.unanswered());
        assert!(!round.answer_revealed());
        assert_eq!(round.points, 0);
    }

    #[test]
    fn test_expiry_is_lazy_and_idempotent() {
        let mut round = fresh_round(10);
        let at_deadline = round.ends_at;
        assert_eq!(round.expire_if_past_deadline(at_deadline), RoundTransition::Unchanged);
        assert!(!round.finished);

        let late = at_deadline + Duration::seconds(1);
        assert_eq!(round.expire_if_past_deadline(late), RoundTransition::Expired);
        let expired = round.clone();
        assert_eq!(round.expire_if_past_deadline(late), RoundTransition::Unchanged);
        assert_eq!(round, expired);
        assert!(round.unanswered());
    }

    #[test]
    fn test_expiry_keeps_earned_points() {
        let mut round = fresh_round(10);
        round.submit_guess("fred", "Fred");
        round.expire_if_past_deadline(start_time() + Duration::minutes(10));
        assert_eq!(round.points, 10);
        assert_eq!(round.user_guess.as_deref(), Some("fred"));
    }

    #[test]
    fn test_seconds_remaining() {
        let round = fresh_round(10);
        assert_eq!(round.seconds_remaining(start_time()), 60);
        assert_eq!(round.seconds_remaining(start_time() + Duration::seconds(45)), 15);
        assert_eq!(round.seconds_remaining(start_time() + Duration::seconds(90)), 0);
    }

    #[test]
    fn test_potential_points() {
        let mut round = fresh_round(10);
        assert_eq!(round.potential_points(), 10);
        round.reveal_next_hint(10);
        round.reveal_next_hint(10);
        assert_eq!(round.potential_points(), 9);
    }
}
