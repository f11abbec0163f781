use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PosterFetchAttempts::Table)
                    .if_not_exists()
                    .col(pk_auto(PosterFetchAttempts::Id))
                    .col(integer(PosterFetchAttempts::ScreeningId))
                    .col(string(PosterFetchAttempts::Source))
                    .col(string(PosterFetchAttempts::Status))
                    .col(string(PosterFetchAttempts::AttemptedAt))
                    .col(string_null(PosterFetchAttempts::ErrorMessage))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_poster_fetch_attempts_screening")
                            .from(PosterFetchAttempts::Table, PosterFetchAttempts::ScreeningId)
                            .to(Screenings::Table, Screenings::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_poster_fetch_attempts_screening_source")
                    .table(PosterFetchAttempts::Table)
                    .col(PosterFetchAttempts::ScreeningId)
                    .col(PosterFetchAttempts::Source)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(PosterFetchAttempts::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum PosterFetchAttempts {
    Table,
    Id,
    ScreeningId,
    Source,
    Status,
    AttemptedAt,
    ErrorMessage,
}

#[derive(DeriveIden)]
enum Screenings {
    Table,
    Id,
}
