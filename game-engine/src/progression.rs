use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::DatabaseConnection;
use tracing::{debug, info};

use crate::config::Config;
use crate::context::PlayContext;
use crate::error::EngineResult;
use game_core::{evaluate_daily_login, level_for_total_score};
use game_persistence::repositories::{UserRepository, WeeklyEventRecord, WeeklyRepository};
use game_types::{
    DailyLoginReward, GameError, RankingEntry, User, UserId, WeeklyEventId,
    WeeklyLeaderboardEntry,
};

/// Coins, levels, login streaks and weekly scores.
pub struct ProgressionLedger {
    users: UserRepository,
    weekly: WeeklyRepository,
    config: Arc<Config>,
}

impl ProgressionLedger {
    pub fn new(db: DatabaseConnection, config: Arc<Config>) -> Self {
        Self {
            users: UserRepository::new(db.clone()),
            weekly: WeeklyRepository::new(db),
            config,
        }
    }

    async fn load_user(&self, user_id: UserId) -> EngineResult<User> {
        Ok(self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| GameError::not_found("User", user_id))?)
    }

    /// Create a player record with the configured starting balance.
    pub async fn register(&self, name: &str, email: &str) -> EngineResult<User> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() {
            return Err(GameError::invalid_input("name is required").into());
        }
        if !email.contains('@') {
            return Err(GameError::invalid_input(format!("'{}' is not an email address", email)).into());
        }
        if self.users.find_by_email(&email.to_lowercase()).await?.is_some() {
            return Err(GameError::invalid_input("email already registered").into());
        }

        Ok(self
            .users
            .create_user(name, email, self.config.starting_coins)
            .await?)
    }

    pub async fn profile(&self, ctx: &PlayContext) -> EngineResult<User> {
        let user_id = ctx.require_user()?;
        self.load_user(user_id).await
    }

    /// `floor(total game score / 100) + 1`, stored as the user's level.
    pub async fn recompute_level(&self, user_id: UserId) -> EngineResult<i32> {
        let (old_level, level) = self
            .users
            .refresh_level(user_id, level_for_total_score)
            .await?;
        if level != old_level {
            info!("User {} moved from level {} to {}", user_id, old_level, level);
        }
        Ok(level)
    }

    /// Credit today's login reward once per calendar day.
    pub async fn apply_daily_login(
        &self,
        ctx: &PlayContext,
        now: DateTime<Utc>,
    ) -> EngineResult<DailyLoginReward> {
        let user_id = ctx.require_user()?;
        let user = self.load_user(user_id).await?;
        let last_login = self.users.last_login_date(user_id).await?;
        let today = now.date_naive();

        let credit = evaluate_daily_login(
            last_login,
            user.login_streak,
            today,
            &self.config.streak_rewards,
        );
        if credit.already_claimed {
            debug!("User {} already claimed the login reward for {}", user_id, today);
            return Ok(DailyLoginReward {
                coins_awarded: 0,
                streak: credit.streak,
                already_claimed: true,
            });
        }

        let recorded = self
            .users
            .record_daily_login(user_id, last_login, today, credit.streak, credit.coins)
            .await?;
        if !recorded {
            // A concurrent login for the same user got there first
            let current = self.load_user(user_id).await?;
            return Ok(DailyLoginReward {
                coins_awarded: 0,
                streak: current.login_streak,
                already_claimed: true,
            });
        }

        info!(
            "User {} login streak {} credited {} coins",
            user_id, credit.streak, credit.coins
        );
        Ok(DailyLoginReward {
            coins_awarded: credit.coins,
            streak: credit.streak,
            already_claimed: false,
        })
    }

    /// Credit the reward for watching an ad; returns the updated user.
    pub async fn reward_ad_watch(&self, ctx: &PlayContext) -> EngineResult<User> {
        let user_id = ctx.require_user()?;
        if !self
            .users
            .credit_coins(user_id, self.config.ad_watch_reward)
            .await?
        {
            return Err(GameError::not_found("User", user_id).into());
        }
        info!(
            "User {} credited {} coins for an ad",
            user_id, self.config.ad_watch_reward
        );
        self.load_user(user_id).await
    }

    pub async fn create_weekly_event(
        &self,
        name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> EngineResult<WeeklyEventRecord> {
        if end_date < start_date {
            return Err(GameError::invalid_input("weekly event ends before it starts").into());
        }
        Ok(self.weekly.create_event(name, start_date, end_date).await?)
    }

    /// Stop an event from accepting new weekly games. Stored scores stay.
    pub async fn close_weekly_event(&self, event_id: WeeklyEventId) -> EngineResult<()> {
        if !self.weekly.set_active(event_id, false).await? {
            return Err(GameError::not_found("WeeklyEvent", event_id).into());
        }
        info!("Weekly event {} closed", event_id);
        Ok(())
    }

    pub async fn active_weekly_event(&self, today: NaiveDate) -> EngineResult<Option<WeeklyEventRecord>> {
        Ok(self.weekly.active_event(today).await?)
    }

    /// Set the player's result for `day`; a retry on the same day overwrites it.
    pub async fn record_weekly_score(
        &self,
        event_id: WeeklyEventId,
        user_id: UserId,
        day: NaiveDate,
        score: i32,
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        self.weekly
            .upsert_score(event_id, user_id, day, score, now)
            .await?;
        info!(
            "Weekly event {} recorded {} points for user {} on {}",
            event_id, score, user_id, day
        );
        Ok(())
    }

    /// Players by total game score; each listed level is refreshed on the way.
    pub async fn ranking(&self, limit: usize) -> EngineResult<Vec<RankingEntry>> {
        let totals = self.users.totals_by_score().await?;

        let mut entries = Vec::with_capacity(limit.min(totals.len()));
        for (index, total) in totals.into_iter().take(limit).enumerate() {
            let level = self.recompute_level(total.user.id).await?;
            entries.push(RankingEntry {
                user_id: total.user.id,
                name: total.user.name,
                total_score: total.total_score,
                level,
                rank: u32::try_from(index + 1).unwrap_or(u32::MAX),
            });
        }
        Ok(entries)
    }

    pub async fn weekly_leaderboard(
        &self,
        event_id: WeeklyEventId,
        limit: usize,
    ) -> EngineResult<Vec<WeeklyLeaderboardEntry>> {
        if self.weekly.find_event(event_id).await?.is_none() {
            return Err(GameError::not_found("WeeklyEvent", event_id).into());
        }

        let standings = self.weekly.standings(event_id).await?;
        Ok(standings
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(index, standing)| WeeklyLeaderboardEntry {
                user_id: standing.user_id,
                name: standing.name,
                total_score: standing.total_score,
                days_played: standing.days_played,
                rank: u32::try_from(index + 1).unwrap_or(u32::MAX),
            })
            .collect())
    }
}
