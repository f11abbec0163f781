use sea_orm::{ConnectionTrait, DbErr, EntityTrait, Set, sea_query::OnConflict};

use crate::entities::cinema;

/// `(slug, name, url)` of every cinema the scrapers cover.
pub const CINEMAS: [(&str, &str, &str); 4] = [
    ("capitolio", "Cinemateca Capitólio", "http://www.capitolio.org.br/"),
    ("sala-redencao", "Sala Redenção", "https://www.ufrgs.br/difusaocultural/salaredencao/"),
    ("cinebancarios", "CineBancários", "http://cinebancarios.blogspot.com/"),
    ("paulo-amorim", "Cinemateca Paulo Amorim", "https://www.cinematecapauloamorim.com.br/"),
];

/// Inserts missing reference cinemas; returns how many were added.
pub async fn seed_cinemas<C: ConnectionTrait>(db: &C) -> Result<u64, DbErr> {
    let models = CINEMAS.iter().map(|(slug, name, url)| cinema::ActiveModel {
        id: Default::default(),
        slug: Set(slug.to_string()),
        name: Set(name.to_string()),
        url: Set(url.to_string()),
    });

    cinema::Entity::insert_many(models)
        .on_conflict(OnConflict::column(cinema::Column::Slug).do_nothing().to_owned())
        .exec_without_returning(db)
        .await
}
