use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Cards::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Cards::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Cards::Theme).string_len(40).not_null())
                    .col(ColumnDef::new(Cards::Title).string_len(120).not_null())
                    .col(ColumnDef::new(Cards::Answer).string_len(120).not_null())
                    .col(ColumnDef::new(Cards::HintsJson).text().not_null())
                    .col(
                        ColumnDef::new(Cards::Difficulty)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .to_owned(),
            )
            .await?;

        // Cards are always looked up by theme, optionally narrowed by difficulty
        manager
            .create_index(
                Index::create()
                    .name("idx_cards_theme_difficulty")
                    .table(Cards::Table)
                    .col(Cards::Theme)
                    .col(Cards::Difficulty)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Cards::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Cards {
    Table,
    Id,
    Theme,
    Title,
    Answer,
    HintsJson,
    Difficulty,
}
