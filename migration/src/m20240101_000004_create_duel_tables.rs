use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Duels::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Duels::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Duels::Code)
                            .string_len(16)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Duels::CreatorId).integer().not_null())
                    .col(ColumnDef::new(Duels::OpponentId).integer().null())
                    .col(ColumnDef::new(Duels::ThemesJson).text().not_null())
                    .col(ColumnDef::new(Duels::RoundsCount).integer().not_null())
                    .col(ColumnDef::new(Duels::Difficulty).integer().null())
                    .col(
                        ColumnDef::new(Duels::Status)
                            .string_len(20)
                            .not_null()
                            .default("waiting"),
                    )
                    .col(ColumnDef::new(Duels::CardSequenceJson).text().null())
                    .col(
                        ColumnDef::new(Duels::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Duels::FinishedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_duels_creator")
                            .from(Duels::Table, Duels::CreatorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_duels_opponent")
                            .from(Duels::Table, Duels::OpponentId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DuelScores::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DuelScores::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DuelScores::DuelId).integer().not_null())
                    .col(ColumnDef::new(DuelScores::UserId).integer().not_null())
                    .col(ColumnDef::new(DuelScores::Score).integer().not_null())
                    .col(
                        ColumnDef::new(DuelScores::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_duel_scores_duel")
                            .from(DuelScores::Table, DuelScores::DuelId)
                            .to(Duels::Table, Duels::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_duel_scores_user")
                            .from(DuelScores::Table, DuelScores::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_duel_scores_duel_user")
                    .table(DuelScores::Table)
                    .col(DuelScores::DuelId)
                    .col(DuelScores::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DuelScores::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Duels::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Duels {
    Table,
    Id,
    Code,
    CreatorId,
    OpponentId,
    ThemesJson,
    RoundsCount,
    Difficulty,
    Status,
    CardSequenceJson,
    CreatedAt,
    FinishedAt,
}

#[derive(DeriveIden)]
enum DuelScores {
    Table,
    Id,
    DuelId,
    UserId,
    Score,
    RecordedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
