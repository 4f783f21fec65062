use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "weekly_scores")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub event_id: i32,
    pub user_id: i32,
    pub day: Date,
    pub score: i32,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::weekly_events::Entity",
        from = "Column::EventId",
        to = "super::weekly_events::Column::Id"
    )]
    WeeklyEvent,
}

impl Related<super::weekly_events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WeeklyEvent.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
