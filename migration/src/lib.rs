pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_users_table;
mod m20240101_000002_create_cards_table;
mod m20240101_000003_create_weekly_tables;
mod m20240101_000004_create_duel_tables;
mod m20240101_000005_create_game_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users_table::Migration),
            Box::new(m20240101_000002_create_cards_table::Migration),
            Box::new(m20240101_000003_create_weekly_tables::Migration),
            Box::new(m20240101_000004_create_duel_tables::Migration),
            Box::new(m20240101_000005_create_game_tables::Migration),
        ]
    }
}
