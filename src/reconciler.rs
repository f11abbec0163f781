//! Merges a scrape result into the movie/screening catalog.

use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tracing::{debug, info, warn};

use crate::{
    entities::cinema,
    error::{ImportError, ImportResult},
    merge,
    models::{MergePolicies, MergePolicy, ScrapeResult, ScrapedFeature, ShowTime},
    movies,
    poster::{PosterStorage, StoredPoster},
    slug::slugify,
    store::{self, NewScreening},
    timeparse,
};

pub struct Reconciler<'a> {
    policies: &'a MergePolicies,
    posters: &'a dyn PosterStorage,
    now: ShowTime,
}

/// A cinema from the scrape result, checked against the catalog.
struct ValidatedCinema<'r> {
    cinema: cinema::Model,
    policy: MergePolicy,
    features: Vec<ValidatedFeature<'r>>,
}

struct ValidatedFeature<'r> {
    feature: &'r ScrapedFeature,
    show_times: Vec<ShowTime>,
    poster: Option<StoredPoster>,
}

#[derive(Default)]
struct Tally {
    created: usize,
    updated: usize,
    unchanged: usize,
}

impl<'a> Reconciler<'a> {
    pub fn new(policies: &'a MergePolicies, posters: &'a dyn PosterStorage) -> Self {
        Self { policies, posters, now: ShowTime::now() }
    }

    /// Pins the clock used to anchor free-text times and to date features
    /// that carry none.
    pub fn with_now(mut self, now: ShowTime) -> Self {
        self.now = now;
        self
    }

    /// Imports every feature of every cinema and returns how many screenings
    /// were touched. Unknown cinemas and malformed show times abort the whole
    /// import before anything is written; all writes share one transaction.
    /// Posters are downloaded before that transaction opens.
    pub async fn import(&self, db: &DatabaseConnection, result: &ScrapeResult) -> ImportResult<usize> {
        debug!(cinemas = result.cinemas.len(), features = result.feature_count(), "validating scrape result");
        let mut validated = self.validate(db, result).await?;
        self.prefetch_posters(db, &mut validated).await?;

        let txn = db.begin().await?;
        let mut tally = Tally::default();
        for cinema in &validated {
            for feature in &cinema.features {
                self.import_feature(&txn, cinema, feature, &mut tally).await?;
            }
        }
        txn.commit().await?;

        let touched = tally.created + tally.updated + tally.unchanged;
        info!(
            touched,
            created = tally.created,
            updated = tally.updated,
            unchanged = tally.unchanged,
            "import finished"
        );
        Ok(touched)
    }

    async fn validate<'r>(
        &self,
        db: &DatabaseConnection,
        result: &'r ScrapeResult,
    ) -> ImportResult<Vec<ValidatedCinema<'r>>> {
        let mut validated = Vec::with_capacity(result.cinemas.len());
        for scraped in &result.cinemas {
            let Some(cinema) = store::find_cinema_by_slug(db, &scraped.slug).await? else {
                return Err(ImportError::UnknownCinema(scraped.slug.clone()));
            };
            let policy = self.policies.policy_for(&cinema.slug);

            let features = scraped
                .features
                .iter()
                .map(|feature| {
                    Ok(ValidatedFeature { feature, show_times: self.show_times(feature)?, poster: None })
                })
                .collect::<ImportResult<Vec<_>>>()?;

            validated.push(ValidatedCinema { cinema, policy, features });
        }
        Ok(validated)
    }

    /// Parsed show times of a feature; never empty.
    fn show_times(&self, feature: &ScrapedFeature) -> ImportResult<Vec<ShowTime>> {
        let Some(input) = &feature.time else {
            return Ok(vec![self.now.clone()]);
        };

        let entries = match timeparse::parse(input, self.now.date) {
            Some(entries) => entries,
            None => {
                warn!(title = %feature.title, time = ?input, "unparseable show time, using now");
                return Ok(vec![self.now.clone()]);
            },
        };

        let show_times = timeparse::to_show_times(&entries).map_err(|value| {
            ImportError::InvalidShowtime { title: feature.title.clone(), value }
        })?;

        if show_times.is_empty() {
            return Ok(vec![self.now.clone()]);
        }
        Ok(merge::accumulate(&[], &show_times))
    }

    /// Downloads posters for features that will open a new screening.
    async fn prefetch_posters(
        &self,
        db: &DatabaseConnection,
        validated: &mut [ValidatedCinema<'_>],
    ) -> ImportResult<()> {
        for cinema in validated.iter_mut() {
            for entry in cinema.features.iter_mut() {
                let feature = entry.feature;
                if feature.poster.as_present().is_none() {
                    continue;
                }
                let screening = match store::find_movie_by_slug(db, &slugify(&feature.title)).await? {
                    Some(movie) => store::find_screening(db, movie.id, cinema.cinema.id).await?,
                    None => None,
                };
                if screening.is_none() {
                    entry.poster = self.fetch_poster(feature).await;
                }
            }
        }
        Ok(())
    }

    async fn import_feature(
        &self,
        txn: &DatabaseTransaction,
        cinema: &ValidatedCinema<'_>,
        validated: &ValidatedFeature<'_>,
        tally: &mut Tally,
    ) -> ImportResult<()> {
        let feature = validated.feature;
        let movie = movies::get_or_create(txn, &feature.title).await?;

        let Some(screening) = store::find_screening(txn, movie.id, cinema.cinema.id).await? else {
            let poster = validated.poster.as_ref();
            let created = store::create_screening(
                txn,
                NewScreening {
                    movie_id: movie.id,
                    cinema_id: cinema.cinema.id,
                    url: feature.read_more.as_present().map(str::to_string),
                    image: poster.map(|p| p.filename.clone()),
                    image_alt: None,
                    image_width: poster.map(|p| p.width as i32),
                    image_height: poster.map(|p| p.height as i32),
                    description: feature.description(),
                    draft: true,
                },
                &validated.show_times,
            )
            .await?;
            debug!(cinema = %cinema.cinema.slug, movie = %movie.slug, screening_id = created.id, "created draft screening");
            tally.created += 1;
            return Ok(());
        };

        let rows = store::screening_dates(txn, screening.id).await?;
        let existing: Vec<ShowTime> = rows.iter().map(|(_, s)| s.clone()).collect();
        let merged = cinema.policy.merge(&existing, &validated.show_times);
        let changes = merge::changes(&rows, &merged);

        if changes.is_empty() {
            tally.unchanged += 1;
            return Ok(());
        }

        store::apply_date_changes(txn, screening.id, &changes).await?;
        debug!(
            cinema = %cinema.cinema.slug,
            movie = %movie.slug,
            screening_id = screening.id,
            policy = ?cinema.policy,
            added = changes.add.len(),
            removed = changes.remove.len(),
            "merged screening dates"
        );
        tally.updated += 1;
        Ok(())
    }

    async fn fetch_poster(&self, feature: &ScrapedFeature) -> Option<StoredPoster> {
        let url = feature.poster.as_present()?;
        match self.posters.store(url).await {
            Ok(poster) => Some(poster),
            Err(err) => {
                warn!(title = %feature.title, url = %url, error = %err, "poster import failed");
                None
            },
        }
    }
}
