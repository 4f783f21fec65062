use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "duel_scores")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub duel_id: i32,
    pub user_id: i32,
    pub score: i32,
    pub recorded_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::duels::Entity",
        from = "Column::DuelId",
        to = "super::duels::Column::Id"
    )]
    Duel,
}

impl Related<super::duels::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Duel.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
