use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Games::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Games::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Games::UserId).integer().not_null())
                    .col(ColumnDef::new(Games::Mode).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Games::Status)
                            .string_len(20)
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(Games::RoundsCount)
                            .integer()
                            .not_null()
                            .default(5),
                    )
                    .col(ColumnDef::new(Games::ThemesJson).text().not_null())
                    .col(ColumnDef::new(Games::Difficulty).integer().null())
                    .col(
                        ColumnDef::new(Games::UserScore)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Games::DuelId).integer().null())
                    .col(ColumnDef::new(Games::WeeklyEventId).integer().null())
                    .col(
                        ColumnDef::new(Games::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Games::FinishedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_games_user")
                            .from(Games::Table, Games::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_games_duel")
                            .from(Games::Table, Games::DuelId)
                            .to(Duels::Table, Duels::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_games_weekly_event")
                            .from(Games::Table, Games::WeeklyEventId)
                            .to(WeeklyEvents::Table, WeeklyEvents::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_games_user")
                    .table(Games::Table)
                    .col(Games::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_games_duel")
                    .table(Games::Table)
                    .col(Games::DuelId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Rounds::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Rounds::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Rounds::GameId).integer().not_null())
                    .col(ColumnDef::new(Rounds::Number).integer().not_null())
                    .col(ColumnDef::new(Rounds::CardId).integer().not_null())
                    .col(
                        ColumnDef::new(Rounds::RequestedHints)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Rounds::ExtraHintUsed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Rounds::HintOrderJson).text().not_null())
                    .col(ColumnDef::new(Rounds::UserGuess).string_len(120).null())
                    .col(
                        ColumnDef::new(Rounds::UserPoints)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Rounds::Finished)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Rounds::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Rounds::EndsAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rounds_game")
                            .from(Rounds::Table, Rounds::GameId)
                            .to(Games::Table, Games::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rounds_card")
                            .from(Rounds::Table, Rounds::CardId)
                            .to(Cards::Table, Cards::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // A round slot is created at most once per game
        manager
            .create_index(
                Index::create()
                    .name("uq_rounds_game_number")
                    .table(Rounds::Table)
                    .col(Rounds::GameId)
                    .col(Rounds::Number)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Rounds::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Games::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Games {
    Table,
    Id,
    UserId,
    Mode,
    Status,
    RoundsCount,
    ThemesJson,
    Difficulty,
    UserScore,
    DuelId,
    WeeklyEventId,
    CreatedAt,
    FinishedAt,
}

#[derive(DeriveIden)]
enum Rounds {
    Table,
    Id,
    GameId,
    Number,
    CardId,
    RequestedHints,
    ExtraHintUsed,
    HintOrderJson,
    UserGuess,
    UserPoints,
    Finished,
    StartedAt,
    EndsAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Cards {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Duels {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum WeeklyEvents {
    Table,
    Id,
}
