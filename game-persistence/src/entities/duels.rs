use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "duels")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub code: String,
    pub creator_id: i32,
    pub opponent_id: Option<i32>,
    #[sea_orm(column_type = "Text")]
    pub themes_json: String,
    pub rounds_count: i32,
    pub difficulty: Option<i32>,
    pub status: String,
    /// JSON array of card ids, one per round; written once
    #[sea_orm(column_type = "Text", nullable)]
    pub card_sequence_json: Option<String>,
    pub created_at: DateTimeUtc,
    pub finished_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::duel_scores::Entity")]
    DuelScores,
}

impl Related<super::duel_scores::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DuelScores.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
