use std::env;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub round_duration_secs: i64,
    pub max_hints: i32,
    pub hint_cost: i32,
    pub game_entry_cost: i32,
    pub duel_entry_cost: i32,
    /// Coins credited for each login streak day; the last entry repeats
    pub streak_rewards: Vec<i32>,
    pub ad_watch_reward: i32,
    pub starting_coins: i32,
    pub default_rounds: i32,
}

fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid {}: {}", name, e)),
        Err(_) => Ok(default),
    }
}

fn parse_rewards(raw: &str) -> Result<Vec<i32>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i32>()
                .with_context(|| format!("Invalid STREAK_REWARDS entry '{}'", part))
        })
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let streak_rewards = match env::var("STREAK_REWARDS") {
            Ok(raw) => parse_rewards(&raw)?,
            Err(_) => defaults.streak_rewards,
        };

        let config = Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            round_duration_secs: env_or("ROUND_DURATION_SECONDS", defaults.round_duration_secs)?,
            max_hints: env_or("MAX_HINTS", defaults.max_hints)?,
            hint_cost: env_or("EXTRA_HINT_COST", defaults.hint_cost)?,
            game_entry_cost: env_or("GAME_ENTRY_COST", defaults.game_entry_cost)?,
            duel_entry_cost: env_or("DUEL_ENTRY_COST", defaults.duel_entry_cost)?,
            streak_rewards,
            ad_watch_reward: env_or("AD_WATCH_REWARD", defaults.ad_watch_reward)?,
            starting_coins: env_or("STARTING_COINS", defaults.starting_coins)?,
            default_rounds: env_or("DEFAULT_ROUNDS", defaults.default_rounds)?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.round_duration_secs <= 0 {
            return Err(anyhow!("Invalid ROUND_DURATION_SECONDS: must be positive"));
        }
        if self.max_hints < 1 {
            return Err(anyhow!("Invalid MAX_HINTS: must be at least 1"));
        }
        if self.hint_cost < 0 || self.game_entry_cost < 0 || self.duel_entry_cost < 0 {
            return Err(anyhow!("Invalid cost: coin costs cannot be negative"));
        }
        if self.default_rounds < 1 {
            return Err(anyhow!("Invalid DEFAULT_ROUNDS: must be at least 1"));
        }
        Ok(())
    }

    pub fn round_duration(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.round_duration_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://perfut.db?mode=rwc".to_string(),
            round_duration_secs: 60,
            max_hints: 10,
            hint_cost: 5,
            game_entry_cost: 0,
            duel_entry_cost: 0,
            streak_rewards: vec![5, 10, 15, 20, 25, 30, 50],
            ad_watch_reward: 5,
            starting_coins: 50,
            default_rounds: 5,
        }
    }
}
