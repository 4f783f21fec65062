use std::collections::HashMap;

use anyhow::Result;
use chrono::NaiveDate;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveValue, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QuerySelect,
};

use crate::entities::{games, prelude::*, users};
use game_types::{User, UserId};

pub struct UserRepository {
    db: DatabaseConnection,
}

/// A user with the sum of all their game scores.
#[derive(Debug, Clone)]
pub struct UserTotal {
    pub user: User,
    pub total_score: i64,
}

impl UserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_user(model: users::Model) -> User {
        User {
            id: model.id,
            name: model.name,
            email: model.email,
            coins: model.coins,
            level: model.level,
            login_streak: model.login_streak,
            last_login_date: model.last_login_date.map(|d| d.to_string()),
            created_at: model.created_at.to_rfc3339(),
        }
    }

    pub async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        let user_model = Users::find_by_id(id).one(&self.db).await?;
        Ok(user_model.map(Self::model_to_user))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user_model = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await?;

        Ok(user_model.map(Self::model_to_user))
    }

    /// Last recorded login day, needed to evaluate streaks.
    pub async fn last_login_date(&self, id: UserId) -> Result<Option<NaiveDate>> {
        let user = Users::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User {} not found", id))?;
        Ok(user.last_login_date)
    }

    pub async fn create_user(&self, name: &str, email: &str, starting_coins: i32) -> Result<User> {
        let user_model = users::ActiveModel {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(name.to_string()),
            email: ActiveValue::Set(email.trim().to_lowercase()),
            coins: ActiveValue::Set(starting_coins.max(0)),
            level: ActiveValue::Set(1),
            login_streak: ActiveValue::Set(0),
            last_login_date: ActiveValue::Set(None),
            created_at: ActiveValue::Set(chrono::Utc::now()),
        };

        let saved_model = Users::insert(user_model).exec(&self.db).await?;

        // Fetch the created user
        let created_user = Users::find_by_id(saved_model.last_insert_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created user"))?;

        tracing::info!("Created user {} ({})", created_user.id, created_user.email);
        Ok(Self::model_to_user(created_user))
    }

    pub async fn credit_coins(&self, id: UserId, amount: i32) -> Result<bool> {
        let result = Users::update_many()
            .col_expr(
                users::Column::Coins,
                Expr::col(users::Column::Coins).add(amount.max(0)),
            )
            .filter(users::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    /// Debit `amount` coins only if the balance covers it.
    ///
    /// Runs on any connection so callers can pair the debit with the write it pays for.
    pub async fn debit_coins_in<C: ConnectionTrait>(conn: &C, id: UserId, amount: i32) -> Result<bool> {
        if amount <= 0 {
            return Ok(true);
        }
        let result = Users::update_many()
            .col_expr(
                users::Column::Coins,
                Expr::col(users::Column::Coins).sub(amount),
            )
            .filter(users::Column::Id.eq(id))
            .filter(users::Column::Coins.gte(amount))
            .exec(conn)
            .await?;
        Ok(result.rows_affected == 1)
    }

    pub async fn coins_in<C: ConnectionTrait>(conn: &C, id: UserId) -> Result<i32> {
        let user = Users::find_by_id(id)
            .one(conn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User {} not found", id))?;
        Ok(user.coins)
    }

    /// Sum of the scores of every game the user owns.
    pub async fn total_score(&self, id: UserId) -> Result<i64> {
        let total: Option<Option<i64>> = Games::find()
            .select_only()
            .column_as(games::Column::UserScore.sum(), "total")
            .filter(games::Column::UserId.eq(id))
            .into_tuple()
            .one(&self.db)
            .await?;
        Ok(total.flatten().unwrap_or(0))
    }

    /// Store the level derived from the user's current total score.
    ///
    /// The stored level is only ever written through this projection.
    pub async fn refresh_level(&self, id: UserId, level_for: impl Fn(i64) -> i32) -> Result<(i32, i32)> {
        let user = Users::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User {} not found", id))?;
        let level = level_for(self.total_score(id).await?);

        if level != user.level {
            Users::update_many()
                .col_expr(users::Column::Level, Expr::value(level))
                .filter(users::Column::Id.eq(id))
                .exec(&self.db)
                .await?;
        }
        Ok((user.level, level))
    }

    /// Record a daily login if nobody else recorded one since `previous_login` was read.
    pub async fn record_daily_login(
        &self,
        id: UserId,
        previous_login: Option<NaiveDate>,
        today: NaiveDate,
        streak: i32,
        coins: i32,
    ) -> Result<bool> {
        let mut update = Users::update_many()
            .col_expr(users::Column::LastLoginDate, Expr::value(Some(today)))
            .col_expr(users::Column::LoginStreak, Expr::value(streak))
            .col_expr(
                users::Column::Coins,
                Expr::col(users::Column::Coins).add(coins.max(0)),
            )
            .filter(users::Column::Id.eq(id));

        update = match previous_login {
            Some(day) => update.filter(users::Column::LastLoginDate.eq(day)),
            None => update.filter(users::Column::LastLoginDate.is_null()),
        };

        let result = update.exec(&self.db).await?;
        Ok(result.rows_affected == 1)
    }

    /// All users with their total game score, highest first.
    pub async fn totals_by_score(&self) -> Result<Vec<UserTotal>> {
        let sums: Vec<(i32, Option<i64>)> = Games::find()
            .select_only()
            .column(games::Column::UserId)
            .column_as(games::Column::UserScore.sum(), "total")
            .group_by(games::Column::UserId)
            .into_tuple()
            .all(&self.db)
            .await?;
        let sums: HashMap<i32, i64> = sums
            .into_iter()
            .map(|(user_id, total)| (user_id, total.unwrap_or(0)))
            .collect();

        let mut totals: Vec<UserTotal> = Users::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|model| {
                let total_score = sums.get(&model.id).copied().unwrap_or(0);
                UserTotal {
                    user: Self::model_to_user(model),
                    total_score,
                }
            })
            .collect();

        totals.sort_by(|a, b| {
            b.total_score
                .cmp(&a.total_score)
                .then_with(|| a.user.id.cmp(&b.user.id))
        });
        Ok(totals)
    }
}
