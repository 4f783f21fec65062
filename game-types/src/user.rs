use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::UserId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub coins: i32,
    pub level: i32,
    pub login_streak: i32,
    pub last_login_date: Option<String>, // ISO 8601 date
    pub created_at: String,              // ISO 8601 string for simplicity
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailyLoginReward {
    pub coins_awarded: i32,
    pub streak: i32,
    pub already_claimed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RankingEntry {
    pub user_id: UserId,
    pub name: String,
    pub total_score: i64,
    pub level: i32,
    pub rank: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WeeklyLeaderboardEntry {
    pub user_id: UserId,
    pub name: String,
    pub total_score: i64,
    pub days_played: i32,
    pub rank: u32,
}
