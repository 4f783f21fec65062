use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection, DbErr};

pub async fn connect_to_database(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

pub async fn connect_to_memory_database() -> Result<DatabaseConnection, DbErr> {
    Database::connect("sqlite::memory:").await
}

/// Connect and bring the schema up to date.
pub async fn connect_and_migrate(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = connect_to_database(database_url).await?;
    Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied");
    Ok(db)
}

/// Fresh in-memory database with the full schema, used by tests.
pub async fn connect_memory_and_migrate() -> Result<DatabaseConnection, DbErr> {
    let db = connect_to_memory_database().await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}
