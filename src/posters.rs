//! Backfills posters for screenings that were imported without one.
//!
//! Each run asks every screening's next untried source, in source order, and
//! records the outcome in `poster_fetch_attempts`. Screenings that every
//! source has already been asked about are left for manual review.

use futures::{StreamExt, stream};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    entities::{movie, screening},
    error::AppResult,
    models::AttemptStatus,
    poster::{PosterSource, PosterStorage, StoredPoster},
    store,
};

#[derive(Debug, Default, Eq, PartialEq, Serialize)]
pub struct PipelineResult {
    pub processed: usize,
    pub posters_found: usize,
    pub posters_not_found: usize,
    pub errors: usize,
    pub skipped_all_sources_tried: usize,
}

enum Outcome {
    Found(StoredPoster),
    NotFound,
    Failed(String),
}

struct Pending<'s> {
    screening: screening::Model,
    movie: movie::Model,
    source: &'s dyn PosterSource,
}

pub struct PosterPipeline<'a> {
    /// Tried in order, one per screening and run.
    pub sources: Vec<&'a dyn PosterSource>,
    pub storage: &'a dyn PosterStorage,
    pub max_concurrent: usize,
}

impl PosterPipeline<'_> {
    /// Looks up and stores posters for screenings that have none. `limit`
    /// caps the screenings that still have a source left to try. Lookups run
    /// concurrently; database updates are applied one by one afterwards.
    pub async fn run(
        &self,
        db: &DatabaseConnection,
        limit: Option<u64>,
        dry_run: bool,
    ) -> AppResult<PipelineResult> {
        let candidates = store::screenings_without_image(db).await?;
        let ids: Vec<i32> = candidates.iter().map(|(s, _)| s.id).collect();
        let attempted = store::attempted_sources(db, &ids).await?;

        let mut result = PipelineResult::default();
        let mut pending = Vec::new();
        for (screening, movie) in candidates {
            if limit.is_some_and(|limit| pending.len() as u64 >= limit) {
                break;
            }
            let tried = attempted.get(&screening.id);
            let next = self
                .sources
                .iter()
                .copied()
                .find(|source| !tried.is_some_and(|tried| tried.contains(source.name())));
            match next {
                Some(source) => pending.push(Pending { screening, movie, source }),
                None => {
                    debug!(screening_id = screening.id, title = %movie.title, "every poster source tried");
                    result.skipped_all_sources_tried += 1;
                },
            }
        }
        info!(
            pending = pending.len(),
            exhausted = result.skipped_all_sources_tried,
            "screenings missing posters"
        );

        if dry_run {
            for p in &pending {
                info!(screening_id = p.screening.id, title = %p.movie.title, source = p.source.name(), "would fetch poster");
            }
            result.processed = pending.len();
            return Ok(result);
        }

        let outcomes: Vec<(Pending, Outcome)> = stream::iter(pending)
            .map(|p| async move {
                let outcome = self.lookup(&p).await;
                (p, outcome)
            })
            .buffer_unordered(self.max_concurrent.max(1))
            .collect()
            .await;

        result.processed = outcomes.len();
        for (p, outcome) in outcomes {
            let source = p.source.name();
            match outcome {
                Outcome::Found(poster) => {
                    store::set_screening_image(db, p.screening.clone(), &poster).await?;
                    store::record_poster_attempt(db, p.screening.id, source, AttemptStatus::Success, None)
                        .await?;
                    result.posters_found += 1;
                },
                Outcome::NotFound => {
                    store::record_poster_attempt(db, p.screening.id, source, AttemptStatus::NotFound, None)
                        .await?;
                    result.posters_not_found += 1;
                },
                Outcome::Failed(message) => {
                    store::record_poster_attempt(
                        db,
                        p.screening.id,
                        source,
                        AttemptStatus::Error,
                        Some(message.chars().take(500).collect()),
                    )
                    .await?;
                    result.errors += 1;
                },
            }
        }

        info!(
            processed = result.processed,
            found = result.posters_found,
            not_found = result.posters_not_found,
            errors = result.errors,
            exhausted = result.skipped_all_sources_tried,
            "poster pipeline finished"
        );
        Ok(result)
    }

    async fn lookup(&self, p: &Pending<'_>) -> Outcome {
        let source = p.source.name();
        let url = match p.source.poster_url(&p.movie.title).await {
            Ok(Some(url)) => url,
            Ok(None) => {
                debug!(title = %p.movie.title, source, "no poster found");
                return Outcome::NotFound;
            },
            Err(err) => {
                warn!(title = %p.movie.title, source, error = %err, "poster lookup failed");
                return Outcome::Failed(err.to_string());
            },
        };

        match self.storage.store(&url).await {
            Ok(poster) => Outcome::Found(poster),
            Err(err) => {
                warn!(title = %p.movie.title, url = %url, error = %err, "poster download failed");
                Outcome::Failed(format!("download failed: {url}: {err}"))
            },
        }
    }
}
