//! Collapses movies that ended up sharing a slug.
//!
//! The lowest id in each slug group survives. Screenings of the other movies
//! are copied over when the survivor has none at that cinema, or have their
//! dates accumulated into the survivor's screening when it does.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, TransactionTrait};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    entities::{movie, screening},
    merge,
    models::ShowTime,
    store::{self, NewScreening},
};

#[derive(Debug, Default, Eq, PartialEq, Serialize)]
pub struct DedupeSummary {
    pub groups: usize,
    pub movies_removed: usize,
    pub screenings_moved: usize,
    pub screenings_merged: usize,
}

/// Groups of more than one movie per slug, each ordered by id.
async fn duplicate_groups<C: ConnectionTrait>(db: &C) -> Result<Vec<Vec<movie::Model>>, DbErr> {
    let mut by_slug: BTreeMap<String, Vec<movie::Model>> = BTreeMap::new();
    for movie in store::all_movies(db).await? {
        by_slug.entry(movie.slug.clone()).or_default().push(movie);
    }
    Ok(by_slug.into_values().filter(|group| group.len() > 1).collect())
}

pub async fn run(db: &DatabaseConnection) -> Result<DedupeSummary, DbErr> {
    let mut summary = DedupeSummary::default();

    for group in duplicate_groups(db).await? {
        let Some((survivor, duplicates)) = group.split_first() else {
            continue;
        };
        info!(slug = %survivor.slug, survivor_id = survivor.id, duplicates = duplicates.len(), "merging duplicate movies");

        let txn = db.begin().await?;
        for duplicate in duplicates {
            for screening in store::screenings_for_movie(&txn, duplicate.id).await? {
                if merge_screening(&txn, survivor, screening).await? {
                    summary.screenings_merged += 1;
                } else {
                    summary.screenings_moved += 1;
                }
            }

            let remaining = store::count_screenings_for_movie(&txn, duplicate.id).await?;
            assert_eq!(remaining, 0, "movie {} still owns screenings after merge", duplicate.id);

            store::delete_movie(&txn, duplicate.id).await?;
            summary.movies_removed += 1;
        }
        txn.commit().await?;
        summary.groups += 1;
    }

    info!(
        groups = summary.groups,
        movies_removed = summary.movies_removed,
        screenings_moved = summary.screenings_moved,
        screenings_merged = summary.screenings_merged,
        "dedupper finished"
    );
    Ok(summary)
}

/// Hands one screening of a duplicate over to the survivor. Returns `true`
/// when its dates were merged into an existing survivor screening and
/// `false` when the screening was re-created under the survivor.
///
/// Date rows that do not parse are carried over as stored.
async fn merge_screening<C: ConnectionTrait>(
    db: &C,
    survivor: &movie::Model,
    screening: screening::Model,
) -> Result<bool, DbErr> {
    let Some(target) = store::find_screening(db, survivor.id, screening.cinema_id).await? else {
        let copy = store::create_screening(db, NewScreening::copy_of(&screening, survivor.id), &[])
            .await?;
        let rows: Vec<i32> = store::date_rows(db, screening.id).await?.iter().map(|r| r.id).collect();
        store::move_dates(db, &rows, copy.id).await?;
        store::move_poster_attempts(db, screening.id, copy.id).await?;
        store::delete_screening(db, screening.id).await?;
        debug!(from = screening.id, to = copy.id, cinema_id = screening.cinema_id, dates = rows.len(), "re-pointed screening");
        return Ok(false);
    };

    let dates: Vec<ShowTime> =
        store::screening_dates(db, screening.id).await?.into_iter().map(|(_, s)| s).collect();
    let rows = store::screening_dates(db, target.id).await?;
    let existing: Vec<ShowTime> = rows.iter().map(|(_, s)| s.clone()).collect();
    let changes = merge::changes(&rows, &merge::accumulate(&existing, &dates));

    let known: HashSet<(String, String)> = store::unreadable_dates(db, target.id)
        .await?
        .into_iter()
        .map(|row| (row.date, row.time))
        .collect();
    let carried: Vec<i32> = store::unreadable_dates(db, screening.id)
        .await?
        .into_iter()
        .filter(|row| !known.contains(&(row.date.clone(), row.time.clone())))
        .map(|row| row.id)
        .collect();
    store::move_dates(db, &carried, target.id).await?;

    store::delete_screening(db, screening.id).await?;
    store::apply_date_changes(db, target.id, &changes).await?;
    debug!(
        from = screening.id,
        into = target.id,
        added = changes.add.len(),
        carried = carried.len(),
        "merged screening dates"
    );
    Ok(true)
}

/// Read-only view of one duplicate slug group.
#[derive(Debug, Serialize)]
pub struct DuplicateGroup {
    pub slug: String,
    pub movie_ids: Vec<i32>,
    pub movie_titles: Vec<String>,
    pub cinemas: BTreeMap<String, CinemaShowings>,
}

#[derive(Debug, Default, Serialize)]
pub struct CinemaShowings {
    pub dates: BTreeSet<String>,
    pub images: BTreeSet<String>,
}

pub async fn report<C: ConnectionTrait>(db: &C) -> Result<Vec<DuplicateGroup>, DbErr> {
    let cinema_slugs: HashMap<i32, String> =
        store::all_cinemas(db).await?.into_iter().map(|c| (c.id, c.slug)).collect();

    let mut report = Vec::new();
    for group in duplicate_groups(db).await? {
        let mut cinemas: BTreeMap<String, CinemaShowings> = BTreeMap::new();
        for movie in &group {
            for screening in store::screenings_for_movie(db, movie.id).await? {
                let slug = cinema_slugs
                    .get(&screening.cinema_id)
                    .cloned()
                    .unwrap_or_else(|| screening.cinema_id.to_string());
                let entry = cinemas.entry(slug).or_default();
                entry.images.extend(screening.image.clone());
                for row in store::date_rows(db, screening.id).await? {
                    entry.dates.insert(format!("{}T{}", row.date, row.time));
                }
            }
        }

        report.push(DuplicateGroup {
            slug: group[0].slug.clone(),
            movie_ids: group.iter().map(|m| m.id).collect(),
            movie_titles: group.iter().map(|m| m.title.clone()).collect(),
            cinemas,
        });
    }
    Ok(report)
}
