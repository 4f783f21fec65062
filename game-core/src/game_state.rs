use game_types::{GameError, GameMode, filter_known_themes};
use tracing::debug;

pub const MAX_ROUNDS_PER_GAME: i32 = 50;

/// The fixed shape of a game: how many rounds it has and which theme each round uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GamePlan {
    pub mode: GameMode,
    pub rounds_count: i32,
    pub themes: Vec<String>,
}

impl GamePlan {
    /// Validate a requested plan; unknown themes are dropped.
    pub fn new<S: AsRef<str>>(
        mode: GameMode,
        rounds_count: i32,
        requested_themes: &[S],
    ) -> Result<Self, GameError> {
        if !(1..=MAX_ROUNDS_PER_GAME).contains(&rounds_count) {
            return Err(GameError::invalid_input(format!(
                "rounds count must be between 1 and {}, got {}",
                MAX_ROUNDS_PER_GAME, rounds_count
            )));
        }

        let themes = filter_known_themes(requested_themes);
        if themes.len() < requested_themes.len() {
            debug!(
                "Dropped {} unknown theme(s) from a {} plan",
                requested_themes.len() - themes.len(),
                mode.as_str()
            );
        }
        if themes.is_empty() {
            return Err(GameError::invalid_input("select at least one known theme"));
        }

        Ok(Self {
            mode,
            rounds_count,
            themes,
        })
    }

    /// Cyclic assignment: round `n` (1-based) uses `themes[(n - 1) % len]`.
    pub fn theme_for_round(&self, number: i32) -> Option<&str> {
        theme_for_round(&self.themes, number)
    }

}

pub fn theme_for_round(themes: &[String], number: i32) -> Option<&str> {
    if themes.is_empty() || number < 1 {
        return None;
    }
    let index = usize::try_from(number - 1).ok()? % themes.len();
    themes.get(index).map(String::as_str)
}

/// The round a player is on: one past the number of finished rounds.
pub fn current_round_number(finished_rounds: usize) -> i32 {
    i32::try_from(finished_rounds).unwrap_or(i32::MAX - 1) + 1
}

/// A game is over once its current round number passes the target count.
pub fn is_game_complete(finished_rounds: usize, rounds_count: i32) -> bool {
    current_round_number(finished_rounds) > rounds_count
}
