use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WeeklyEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WeeklyEvents::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WeeklyEvents::Name).string().not_null())
                    .col(ColumnDef::new(WeeklyEvents::StartDate).date().not_null())
                    .col(ColumnDef::new(WeeklyEvents::EndDate).date().not_null())
                    .col(
                        ColumnDef::new(WeeklyEvents::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WeeklyScores::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WeeklyScores::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WeeklyScores::EventId).integer().not_null())
                    .col(ColumnDef::new(WeeklyScores::UserId).integer().not_null())
                    .col(ColumnDef::new(WeeklyScores::Day).date().not_null())
                    .col(
                        ColumnDef::new(WeeklyScores::Score)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(WeeklyScores::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_weekly_scores_event")
                            .from(WeeklyScores::Table, WeeklyScores::EventId)
                            .to(WeeklyEvents::Table, WeeklyEvents::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_weekly_scores_user")
                            .from(WeeklyScores::Table, WeeklyScores::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One daily result per player per event
        manager
            .create_index(
                Index::create()
                    .name("uq_weekly_scores_event_user_day")
                    .table(WeeklyScores::Table)
                    .col(WeeklyScores::EventId)
                    .col(WeeklyScores::UserId)
                    .col(WeeklyScores::Day)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WeeklyScores::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WeeklyEvents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum WeeklyEvents {
    Table,
    Id,
    Name,
    StartDate,
    EndDate,
    Active,
}

#[derive(DeriveIden)]
enum WeeklyScores {
    Table,
    Id,
    EventId,
    UserId,
    Day,
    Score,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
