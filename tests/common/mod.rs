#![allow(dead_code)]

use cinemaempoa::{
    db,
    entities::{movie, screening, screening_date},
    error::PosterError,
    models::{MergePolicies, ScrapeResult, ShowTime},
    poster::{PosterStorage, StoredPoster},
    seeds, store,
};
use jiff::civil::date;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Set};
use tempfile::TempDir;

pub struct TestDb {
    pub db: DatabaseConnection,
    _dir: TempDir,
}

/// Fresh, migrated SQLite file with the reference cinemas seeded.
pub async fn setup() -> TestDb {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("catalog.db").display());
    let db = db::connect_and_migrate(&url).await.unwrap();
    seeds::seed_cinemas(&db).await.unwrap();
    TestDb { db, _dir: dir }
}

pub fn policies() -> MergePolicies {
    MergePolicies::overwrite_same_day(["capitolio"])
}

pub fn now() -> ShowTime {
    ShowTime::new(date(2025, 12, 20), 10, 30)
}

pub fn show_time(raw: &str) -> ShowTime {
    ShowTime::parse(raw).unwrap()
}

pub struct NoPosters;

#[async_trait::async_trait]
impl PosterStorage for NoPosters {
    async fn store(&self, _url: &str) -> Result<StoredPoster, PosterError> {
        Err(PosterError::UnsupportedImage)
    }
}

pub struct FakePosters;

#[async_trait::async_trait]
impl PosterStorage for FakePosters {
    async fn store(&self, url: &str) -> Result<StoredPoster, PosterError> {
        let name = url.rsplit('/').next().unwrap_or("poster.png");
        Ok(StoredPoster { filename: name.to_string(), width: 500, height: 750 })
    }
}

pub fn scrape_result(json: serde_json::Value) -> ScrapeResult {
    ScrapeResult::from_json(&json.to_string()).unwrap()
}

/// One cinema with one feature, in the shape scrapers emit.
pub fn single_feature(cinema_slug: &str, title: &str, time: serde_json::Value) -> ScrapeResult {
    scrape_result(serde_json::json!({
        "cinemas": [{
            "url": "",
            "cinema": cinema_slug,
            "slug": cinema_slug,
            "features": [{
                "title": title,
                "excerpt": "cool film",
                "poster": "",
                "original_title": "",
                "price": "",
                "director": "",
                "classification": "",
                "general_info": "",
                "read_more": "",
                "time": time,
            }],
        }],
    }))
}

pub async fn cinema_id(db: &DatabaseConnection, slug: &str) -> i32 {
    store::find_cinema_by_slug(db, slug).await.unwrap().unwrap().id
}

/// Creates a movie with one screening at `cinema_slug` holding `dates`.
pub async fn movie_with_screening(
    db: &DatabaseConnection,
    title: &str,
    slug: &str,
    cinema_slug: &str,
    dates: &[&str],
) -> (movie::Model, screening::Model) {
    let movie = store::create_movie(db, title, slug).await.unwrap();
    let screening = add_screening(db, &movie, cinema_slug, dates).await;
    (movie, screening)
}

pub async fn add_screening(
    db: &DatabaseConnection,
    movie: &movie::Model,
    cinema_slug: &str,
    dates: &[&str],
) -> screening::Model {
    let dates: Vec<ShowTime> = dates.iter().map(|d| show_time(d)).collect();
    store::create_screening(
        db,
        store::NewScreening {
            movie_id: movie.id,
            cinema_id: cinema_id(db, cinema_slug).await,
            description: "cool film".to_string(),
            ..Default::default()
        },
        &dates,
    )
    .await
    .unwrap()
}

/// Inserts a date row as-is, bypassing show time validation.
pub async fn add_raw_date(db: &DatabaseConnection, screening_id: i32, date: &str, time: &str) {
    screening_date::ActiveModel {
        id: Default::default(),
        screening_id: Set(screening_id),
        date: Set(date.to_string()),
        time: Set(time.to_string()),
    }
    .insert(db)
    .await
    .unwrap();
}

/// Raw `(date, time)` columns of a screening in storage order.
pub async fn raw_dates_of(db: &DatabaseConnection, screening_id: i32) -> Vec<(String, String)> {
    store::date_rows(db, screening_id)
        .await
        .unwrap()
        .into_iter()
        .map(|row| (row.date, row.time))
        .collect()
}

/// Dates of a screening in storage order, as `YYYY-MM-DDTHH:MM`.
pub async fn dates_of(db: &DatabaseConnection, screening_id: i32) -> Vec<String> {
    store::screening_dates(db, screening_id)
        .await
        .unwrap()
        .into_iter()
        .map(|(_, s)| s.to_string())
        .collect()
}

pub async fn counts(db: &DatabaseConnection) -> (u64, u64, u64) {
    (
        movie::Entity::find().count(db).await.unwrap(),
        screening::Entity::find().count(db).await.unwrap(),
        screening_date::Entity::find().count(db).await.unwrap(),
    )
}
