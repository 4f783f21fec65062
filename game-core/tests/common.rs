#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use game_core::{GamePlan, RoundState};
use game_types::GameMode;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub const ROUND_SECONDS: i64 = 60;

/// A card as the rules see it: the answer and its authored hints.
pub struct TestCard {
    pub answer: String,
    pub hints: Vec<String>,
}

pub fn create_test_card(answer: &str, hint_count: usize) -> TestCard {
    TestCard {
        answer: answer.to_string(),
        hints: (1..=hint_count)
            .map(|i| format!("{} hint {}", answer, i))
            .collect(),
    }
}

pub fn test_start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 14, 20, 0, 0).unwrap()
}

/// Starts a round with a seeded shuffle so orders are reproducible.
pub fn start_round(card: &TestCard, seed: u64) -> RoundState {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    RoundState::start(
        card.hints.len(),
        test_start_time(),
        Duration::seconds(ROUND_SECONDS),
        &mut rng,
    )
}

pub fn create_solo_plan(rounds: i32, themes: &[&str]) -> GamePlan {
    GamePlan::new(GameMode::Solo, rounds, themes).expect("valid plan")
}

/// Reveals `count` hints, ignoring ceiling no-ops.
pub fn reveal_hints(round: &mut RoundState, count: usize) {
    for _ in 0..count {
        round.reveal_next_hint(10);
    }
}
