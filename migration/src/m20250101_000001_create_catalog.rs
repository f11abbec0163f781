use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Movies::Table)
                    .if_not_exists()
                    .col(pk_auto(Movies::Id))
                    .col(string(Movies::Title))
                    .col(string(Movies::Slug))
                    .to_owned(),
            )
            .await?;

        // Slugs are indexed, not unique: duplicates are collapsed by the dedupper.
        manager
            .create_index(
                Index::create()
                    .name("idx_movies_slug")
                    .table(Movies::Table)
                    .col(Movies::Slug)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Cinemas::Table)
                    .if_not_exists()
                    .col(pk_auto(Cinemas::Id))
                    .col(string(Cinemas::Slug))
                    .col(string(Cinemas::Name))
                    .col(string(Cinemas::Url))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cinemas_slug_unique")
                    .table(Cinemas::Table)
                    .col(Cinemas::Slug)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Screenings::Table)
                    .if_not_exists()
                    .col(pk_auto(Screenings::Id))
                    .col(integer(Screenings::MovieId))
                    .col(integer(Screenings::CinemaId))
                    .col(string_null(Screenings::Url))
                    .col(string_null(Screenings::Image))
                    .col(string_null(Screenings::ImageAlt))
                    .col(integer_null(Screenings::ImageWidth))
                    .col(integer_null(Screenings::ImageHeight))
                    .col(text(Screenings::Description))
                    .col(boolean(Screenings::Draft))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_screenings_movie")
                            .from(Screenings::Table, Screenings::MovieId)
                            .to(Movies::Table, Movies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_screenings_cinema")
                            .from(Screenings::Table, Screenings::CinemaId)
                            .to(Cinemas::Table, Cinemas::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_screenings_movie_cinema")
                    .table(Screenings::Table)
                    .col(Screenings::MovieId)
                    .col(Screenings::CinemaId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ScreeningDates::Table)
                    .if_not_exists()
                    .col(pk_auto(ScreeningDates::Id))
                    .col(integer(ScreeningDates::ScreeningId))
                    .col(string(ScreeningDates::Date))
                    .col(string(ScreeningDates::Time))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_screening_dates_screening")
                            .from(ScreeningDates::Table, ScreeningDates::ScreeningId)
                            .to(Screenings::Table, Screenings::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_screening_dates_screening_date")
                    .table(ScreeningDates::Table)
                    .col(ScreeningDates::ScreeningId)
                    .col(ScreeningDates::Date)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ScreeningDates::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Screenings::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Cinemas::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Movies::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Movies {
    Table,
    Id,
    Title,
    Slug,
}

#[derive(DeriveIden)]
enum Cinemas {
    Table,
    Id,
    Slug,
    Name,
    Url,
}

#[derive(DeriveIden)]
enum Screenings {
    Table,
    Id,
    MovieId,
    CinemaId,
    Url,
    Image,
    ImageAlt,
    ImageWidth,
    ImageHeight,
    Description,
    Draft,
}

#[derive(DeriveIden)]
enum ScreeningDates {
    Table,
    Id,
    ScreeningId,
    Date,
    Time,
}
