use chrono::NaiveDate;

/// Game score needed per level.
pub const POINTS_PER_LEVEL: i64 = 100;

/// `floor(total / 100) + 1`; negative totals stay at level 1.
pub fn level_for_total_score(total_score: i64) -> i32 {
    let level = total_score.max(0) / POINTS_PER_LEVEL + 1;
    i32::try_from(level).unwrap_or(i32::MAX)
}

/// Coins for a given streak day. The last entry of the table repeats once the
/// streak outgrows it.
pub fn streak_reward(streak: i32, rewards: &[i32]) -> i32 {
    if rewards.is_empty() || streak < 1 {
        return 0;
    }
    let index = usize::try_from(streak).unwrap_or(usize::MAX).min(rewards.len()) - 1;
    rewards[index]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginCredit {
    pub streak: i32,
    pub coins: i32,
    pub already_claimed: bool,
}

/// Streak and coin credit for a login on `today`.
pub fn evaluate_daily_login(
    last_login: Option<NaiveDate>,
    current_streak: i32,
    today: NaiveDate,
    rewards: &[i32],
) -> LoginCredit {
    if last_login == Some(today) {
        return LoginCredit {
            streak: current_streak,
            coins: 0,
            already_claimed: true,
        };
    }

    let consecutive = last_login
        .and_then(|last| last.succ_opt())
        .is_some_and(|next_day| next_day == today);
    let streak = if consecutive { current_streak + 1 } else { 1 };

    LoginCredit {
        streak,
        coins: streak_reward(streak, rewards),
        already_claimed: false,
    }
}
