use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "weekly_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub start_date: Date,
    pub end_date: Date,
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::weekly_scores::Entity")]
    WeeklyScores,
}

impl Related<super::weekly_scores::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WeeklyScores.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
