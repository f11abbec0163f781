//! Queries over the catalog tables. Every function takes any
//! `ConnectionTrait` so it runs the same inside or outside a transaction.

use std::collections::{HashMap, HashSet};

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, sea_query::Expr,
};
use tracing::warn;

use crate::{
    entities::{cinema, movie, poster_fetch_attempt, screening, screening_date},
    merge::DateChanges,
    models::{AttemptStatus, ShowTime},
    poster::StoredPoster,
};

pub async fn find_cinema_by_slug<C: ConnectionTrait>(
    db: &C,
    slug: &str,
) -> Result<Option<cinema::Model>, DbErr> {
    cinema::Entity::find().filter(cinema::Column::Slug.eq(slug)).one(db).await
}

pub async fn all_cinemas<C: ConnectionTrait>(db: &C) -> Result<Vec<cinema::Model>, DbErr> {
    cinema::Entity::find().order_by_asc(cinema::Column::Id).all(db).await
}

/// Lowest id first, matching the row the dedupper keeps.
pub async fn find_movie_by_slug<C: ConnectionTrait>(
    db: &C,
    slug: &str,
) -> Result<Option<movie::Model>, DbErr> {
    movie::Entity::find()
        .filter(movie::Column::Slug.eq(slug))
        .order_by_asc(movie::Column::Id)
        .one(db)
        .await
}

pub async fn create_movie<C: ConnectionTrait>(
    db: &C,
    title: &str,
    slug: &str,
) -> Result<movie::Model, DbErr> {
    movie::ActiveModel {
        id: Default::default(),
        title: Set(title.to_string()),
        slug: Set(slug.to_string()),
    }
    .insert(db)
    .await
}

pub async fn all_movies<C: ConnectionTrait>(db: &C) -> Result<Vec<movie::Model>, DbErr> {
    movie::Entity::find().order_by_asc(movie::Column::Id).all(db).await
}

pub async fn delete_movie<C: ConnectionTrait>(db: &C, movie_id: i32) -> Result<(), DbErr> {
    movie::Entity::delete_by_id(movie_id).exec(db).await?;
    Ok(())
}

/// The first matching row is canonical when several exist.
pub async fn find_screening<C: ConnectionTrait>(
    db: &C,
    movie_id: i32,
    cinema_id: i32,
) -> Result<Option<screening::Model>, DbErr> {
    screening::Entity::find()
        .filter(screening::Column::MovieId.eq(movie_id))
        .filter(screening::Column::CinemaId.eq(cinema_id))
        .order_by_asc(screening::Column::Id)
        .one(db)
        .await
}

pub async fn screenings_for_movie<C: ConnectionTrait>(
    db: &C,
    movie_id: i32,
) -> Result<Vec<screening::Model>, DbErr> {
    screening::Entity::find()
        .filter(screening::Column::MovieId.eq(movie_id))
        .order_by_asc(screening::Column::Id)
        .all(db)
        .await
}

pub async fn count_screenings_for_movie<C: ConnectionTrait>(
    db: &C,
    movie_id: i32,
) -> Result<u64, DbErr> {
    screening::Entity::find().filter(screening::Column::MovieId.eq(movie_id)).count(db).await
}

/// Screenings without a poster, paired with their movie, oldest first.
pub async fn screenings_without_image<C: ConnectionTrait>(
    db: &C,
) -> Result<Vec<(screening::Model, movie::Model)>, DbErr> {
    let rows = screening::Entity::find()
        .find_also_related(movie::Entity)
        .filter(
            Condition::any()
                .add(screening::Column::Image.is_null())
                .add(screening::Column::Image.eq("")),
        )
        .order_by_asc(screening::Column::Id)
        .all(db)
        .await?;
    Ok(rows.into_iter().filter_map(|(s, m)| m.map(|m| (s, m))).collect())
}

/// Poster sources already tried, per screening.
pub async fn attempted_sources<C: ConnectionTrait>(
    db: &C,
    screening_ids: &[i32],
) -> Result<HashMap<i32, HashSet<String>>, DbErr> {
    let mut attempted: HashMap<i32, HashSet<String>> = HashMap::new();
    if screening_ids.is_empty() {
        return Ok(attempted);
    }
    let rows = poster_fetch_attempt::Entity::find()
        .filter(poster_fetch_attempt::Column::ScreeningId.is_in(screening_ids.iter().copied()))
        .all(db)
        .await?;
    for row in rows {
        attempted.entry(row.screening_id).or_default().insert(row.source);
    }
    Ok(attempted)
}

pub async fn record_poster_attempt<C: ConnectionTrait>(
    db: &C,
    screening_id: i32,
    source: &str,
    status: AttemptStatus,
    error_message: Option<String>,
) -> Result<poster_fetch_attempt::Model, DbErr> {
    poster_fetch_attempt::ActiveModel {
        id: Default::default(),
        screening_id: Set(screening_id),
        source: Set(source.to_string()),
        status: Set(status.as_str().to_string()),
        attempted_at: Set(jiff::Timestamp::now().to_string()),
        error_message: Set(error_message),
    }
    .insert(db)
    .await
}

/// Hands the attempt history of one screening to another.
pub async fn move_poster_attempts<C: ConnectionTrait>(
    db: &C,
    from_screening_id: i32,
    to_screening_id: i32,
) -> Result<(), DbErr> {
    poster_fetch_attempt::Entity::update_many()
        .col_expr(poster_fetch_attempt::Column::ScreeningId, Expr::value(to_screening_id))
        .filter(poster_fetch_attempt::Column::ScreeningId.eq(from_screening_id))
        .exec(db)
        .await?;
    Ok(())
}

#[derive(Clone, Debug, Default)]
pub struct NewScreening {
    pub movie_id: i32,
    pub cinema_id: i32,
    pub url: Option<String>,
    pub image: Option<String>,
    pub image_alt: Option<String>,
    pub image_width: Option<i32>,
    pub image_height: Option<i32>,
    pub description: String,
    pub draft: bool,
}

impl NewScreening {
    /// Same screening data, attached to another movie.
    pub fn copy_of(source: &screening::Model, movie_id: i32) -> Self {
        Self {
            movie_id,
            cinema_id: source.cinema_id,
            url: source.url.clone(),
            image: source.image.clone(),
            image_alt: source.image_alt.clone(),
            image_width: source.image_width,
            image_height: source.image_height,
            description: source.description.clone(),
            draft: source.draft,
        }
    }
}

pub async fn create_screening<C: ConnectionTrait>(
    db: &C,
    new: NewScreening,
    dates: &[ShowTime],
) -> Result<screening::Model, DbErr> {
    let created = screening::ActiveModel {
        id: Default::default(),
        movie_id: Set(new.movie_id),
        cinema_id: Set(new.cinema_id),
        url: Set(new.url),
        image: Set(new.image),
        image_alt: Set(new.image_alt),
        image_width: Set(new.image_width),
        image_height: Set(new.image_height),
        description: Set(new.description),
        draft: Set(new.draft),
    }
    .insert(db)
    .await?;

    insert_dates(db, created.id, dates).await?;
    Ok(created)
}

pub async fn set_screening_image<C: ConnectionTrait>(
    db: &C,
    screening: screening::Model,
    poster: &StoredPoster,
) -> Result<screening::Model, DbErr> {
    let mut model: screening::ActiveModel = screening.into();
    model.image = Set(Some(poster.filename.clone()));
    model.image_width = Set(Some(poster.width as i32));
    model.image_height = Set(Some(poster.height as i32));
    model.update(db).await
}

/// Deletes a screening together with its dates and poster attempts.
pub async fn delete_screening<C: ConnectionTrait>(db: &C, screening_id: i32) -> Result<(), DbErr> {
    poster_fetch_attempt::Entity::delete_many()
        .filter(poster_fetch_attempt::Column::ScreeningId.eq(screening_id))
        .exec(db)
        .await?;
    screening_date::Entity::delete_many()
        .filter(screening_date::Column::ScreeningId.eq(screening_id))
        .exec(db)
        .await?;
    screening::Entity::delete_by_id(screening_id).exec(db).await?;
    Ok(())
}

/// Every stored date row of a screening, in insertion order.
pub async fn date_rows<C: ConnectionTrait>(
    db: &C,
    screening_id: i32,
) -> Result<Vec<screening_date::Model>, DbErr> {
    screening_date::Entity::find()
        .filter(screening_date::Column::ScreeningId.eq(screening_id))
        .order_by_asc(screening_date::Column::Id)
        .all(db)
        .await
}

/// Stored dates in insertion order. Rows that do not hold a valid date and
/// `HH:MM` time are left out, so merges never touch them.
pub async fn screening_dates<C: ConnectionTrait>(
    db: &C,
    screening_id: i32,
) -> Result<Vec<(i32, ShowTime)>, DbErr> {
    Ok(date_rows(db, screening_id)
        .await?
        .into_iter()
        .filter_map(|row| match ShowTime::from_columns(&row.date, &row.time) {
            Some(show_time) => Some((row.id, show_time)),
            None => {
                warn!(id = row.id, date = %row.date, time = %row.time, "skipping unreadable screening date");
                None
            },
        })
        .collect())
}

/// Rows that `screening_dates` leaves out, kept verbatim.
pub async fn unreadable_dates<C: ConnectionTrait>(
    db: &C,
    screening_id: i32,
) -> Result<Vec<screening_date::Model>, DbErr> {
    Ok(date_rows(db, screening_id)
        .await?
        .into_iter()
        .filter(|row| ShowTime::from_columns(&row.date, &row.time).is_none())
        .collect())
}

/// Re-points existing date rows to another screening, untouched otherwise.
pub async fn move_dates<C: ConnectionTrait>(
    db: &C,
    date_ids: &[i32],
    screening_id: i32,
) -> Result<(), DbErr> {
    if date_ids.is_empty() {
        return Ok(());
    }
    screening_date::Entity::update_many()
        .col_expr(screening_date::Column::ScreeningId, Expr::value(screening_id))
        .filter(screening_date::Column::Id.is_in(date_ids.iter().copied()))
        .exec(db)
        .await?;
    Ok(())
}

pub async fn apply_date_changes<C: ConnectionTrait>(
    db: &C,
    screening_id: i32,
    changes: &DateChanges,
) -> Result<(), DbErr> {
    if !changes.remove.is_empty() {
        screening_date::Entity::delete_many()
            .filter(screening_date::Column::Id.is_in(changes.remove.iter().copied()))
            .exec(db)
            .await?;
    }
    insert_dates(db, screening_id, &changes.add).await
}

async fn insert_dates<C: ConnectionTrait>(
    db: &C,
    screening_id: i32,
    dates: &[ShowTime],
) -> Result<(), DbErr> {
    if dates.is_empty() {
        return Ok(());
    }

    let models = dates.iter().map(|d| screening_date::ActiveModel {
        id: Default::default(),
        screening_id: Set(screening_id),
        date: Set(d.date_column()),
        time: Set(d.time.clone()),
    });
    screening_date::Entity::insert_many(models).exec(db).await?;
    Ok(())
}
