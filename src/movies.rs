use sea_orm::{ConnectionTrait, DbErr};
use tracing::debug;

use crate::{entities::movie, slug::slugify, store};

/// Finds the movie whose slug matches `title`, creating it when missing.
///
/// `movies.slug` has no unique constraint, so two concurrent imports of a new
/// title can both insert. After inserting, the lowest-id row for the slug is
/// returned, so racing importers converge on the row the dedupper keeps and
/// the extra row is left without screenings.
pub async fn get_or_create<C: ConnectionTrait>(db: &C, title: &str) -> Result<movie::Model, DbErr> {
    let slug = slugify(title);

    if let Some(existing) = store::find_movie_by_slug(db, &slug).await? {
        return Ok(existing);
    }

    let created = store::create_movie(db, title.trim(), &slug).await?;
    debug!(slug = %slug, id = created.id, "created movie");

    let canonical = store::find_movie_by_slug(db, &slug).await?;
    Ok(canonical.unwrap_or(created))
}
