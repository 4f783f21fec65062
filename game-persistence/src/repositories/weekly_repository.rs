use std::collections::HashMap;

use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use crate::entities::{prelude::*, users, weekly_events, weekly_scores};
use game_types::{UserId, WeeklyEventId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyEventRecord {
    pub id: WeeklyEventId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub active: bool,
}

impl WeeklyEventRecord {
    pub fn covers(&self, day: NaiveDate) -> bool {
        self.active && self.start_date <= day && day <= self.end_date
    }
}

/// One player's accumulated result in a weekly event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyStanding {
    pub user_id: UserId,
    pub name: String,
    pub total_score: i64,
    pub days_played: i32,
}

pub struct WeeklyRepository {
    db: DatabaseConnection,
}

impl WeeklyRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_event(model: weekly_events::Model) -> WeeklyEventRecord {
        WeeklyEventRecord {
            id: model.id,
            name: model.name,
            start_date: model.start_date,
            end_date: model.end_date,
            active: model.active,
        }
    }

    pub async fn create_event(
        &self,
        name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<WeeklyEventRecord> {
        let event_model = weekly_events::ActiveModel {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(name.to_string()),
            start_date: ActiveValue::Set(start_date),
            end_date: ActiveValue::Set(end_date),
            active: ActiveValue::Set(true),
        };

        let inserted = WeeklyEvents::insert(event_model).exec(&self.db).await?;
        let created = WeeklyEvents::find_by_id(inserted.last_insert_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow!("Failed to retrieve created weekly event"))?;

        tracing::info!(
            "Created weekly event {} '{}' ({} to {})",
            created.id,
            created.name,
            created.start_date,
            created.end_date
        );
        Ok(Self::model_to_event(created))
    }

    pub async fn find_event(&self, id: WeeklyEventId) -> Result<Option<WeeklyEventRecord>> {
        let event = WeeklyEvents::find_by_id(id).one(&self.db).await?;
        Ok(event.map(Self::model_to_event))
    }

    /// The active event whose date range contains `today`; the latest-starting one wins.
    pub async fn active_event(&self, today: NaiveDate) -> Result<Option<WeeklyEventRecord>> {
        let event = WeeklyEvents::find()
            .filter(weekly_events::Column::Active.eq(true))
            .filter(weekly_events::Column::StartDate.lte(today))
            .filter(weekly_events::Column::EndDate.gte(today))
            .order_by_desc(weekly_events::Column::StartDate)
            .order_by_desc(weekly_events::Column::Id)
            .one(&self.db)
            .await?;
        Ok(event.map(Self::model_to_event))
    }

    pub async fn set_active(&self, id: WeeklyEventId, active: bool) -> Result<bool> {
        let result = WeeklyEvents::update_many()
            .col_expr(weekly_events::Column::Active, Expr::value(active))
            .filter(weekly_events::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    /// Write the player's score for `day`, replacing any earlier one.
    pub async fn upsert_score(
        &self,
        event_id: WeeklyEventId,
        user_id: UserId,
        day: NaiveDate,
        score: i32,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let score_model = weekly_scores::ActiveModel {
            id: ActiveValue::NotSet,
            event_id: ActiveValue::Set(event_id),
            user_id: ActiveValue::Set(user_id),
            day: ActiveValue::Set(day),
            score: ActiveValue::Set(score),
            updated_at: ActiveValue::Set(now),
        };

        WeeklyScores::insert(score_model)
            .on_conflict(
                OnConflict::columns([
                    weekly_scores::Column::EventId,
                    weekly_scores::Column::UserId,
                    weekly_scores::Column::Day,
                ])
                .update_columns([weekly_scores::Column::Score, weekly_scores::Column::UpdatedAt])
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        tracing::debug!(
            "Weekly score for event {} user {} on {} set to {}",
            event_id,
            user_id,
            day,
            score
        );
        Ok(())
    }

    pub async fn score_for(
        &self,
        event_id: WeeklyEventId,
        user_id: UserId,
        day: NaiveDate,
    ) -> Result<Option<i32>> {
        let row = WeeklyScores::find()
            .filter(weekly_scores::Column::EventId.eq(event_id))
            .filter(weekly_scores::Column::UserId.eq(user_id))
            .filter(weekly_scores::Column::Day.eq(day))
            .one(&self.db)
            .await?;
        Ok(row.map(|r| r.score))
    }

    pub async fn count_scores(&self, event_id: WeeklyEventId, user_id: UserId) -> Result<usize> {
        let rows = WeeklyScores::find()
            .filter(weekly_scores::Column::EventId.eq(event_id))
            .filter(weekly_scores::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?;
        Ok(rows.len())
    }

    /// Players of an event ordered by summed daily scores, highest first.
    pub async fn standings(&self, event_id: WeeklyEventId) -> Result<Vec<WeeklyStanding>> {
        let sums: Vec<(i32, Option<i64>, i64)> = WeeklyScores::find()
            .select_only()
            .column(weekly_scores::Column::UserId)
            .column_as(weekly_scores::Column::Score.sum(), "total")
            .column_as(weekly_scores::Column::Id.count(), "days")
            .filter(weekly_scores::Column::EventId.eq(event_id))
            .group_by(weekly_scores::Column::UserId)
            .into_tuple()
            .all(&self.db)
            .await?;

        let user_ids: Vec<i32> = sums.iter().map(|(user_id, _, _)| *user_id).collect();
        let names: HashMap<i32, String> = Users::find()
            .filter(users::Column::Id.is_in(user_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|user| (user.id, user.name))
            .collect();

        let mut standings: Vec<WeeklyStanding> = sums
            .into_iter()
            .map(|(user_id, total, days)| WeeklyStanding {
                user_id,
                name: names.get(&user_id).cloned().unwrap_or_default(),
                total_score: total.unwrap_or(0),
                days_played: i32::try_from(days).unwrap_or(i32::MAX),
            })
            .collect();

        standings.sort_by(|a, b| {
            b.total_score
                .cmp(&a.total_score)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        Ok(standings)
    }
}
