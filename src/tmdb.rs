use std::{num::NonZeroU32, sync::Arc};

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::{error::AppResult, poster::PosterSource};

const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";
// w92, w154, w185, w342, w500, w780, original
const POSTER_SIZE: &str = "w500";
const SEARCH_LANGUAGES: [&str; 2] = ["pt-BR", "en-US"];

pub struct TmdbClient {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl TmdbClient {
    pub fn new(client: reqwest::Client, access_token: String, base_url: String, rps: u32) -> Self {
        let rps = NonZeroU32::new(rps).unwrap_or(NonZeroU32::MIN);
        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(rps)));
        Self { client, access_token, base_url, limiter }
    }

    /// Best match for `title`, searching in Portuguese first, then English.
    pub async fn search_movie(&self, title: &str) -> AppResult<Option<SearchMovie>> {
        let url = format!("{}/search/movie", self.base_url.trim_end_matches('/'));

        for language in SEARCH_LANGUAGES {
            self.limiter.until_ready().await;

            let resp: SearchResponse = self
                .client
                .get(&url)
                .bearer_auth(&self.access_token)
                .query(&[("query", title), ("language", language)])
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            if let Some(movie) = resp.results.into_iter().next() {
                debug!(title = %title, language = %language, tmdb_id = movie.id, "found TMDB match");
                return Ok(Some(movie));
            }
        }

        Ok(None)
    }
}

#[async_trait::async_trait]
impl PosterSource for TmdbClient {
    fn name(&self) -> &'static str {
        "tmdb"
    }

    async fn poster_url(&self, title: &str) -> AppResult<Option<String>> {
        let Some(movie) = self.search_movie(title).await? else {
            info!(title = %title, "no TMDB result");
            return Ok(None);
        };

        let Some(poster_path) = movie.poster_path.filter(|p| !p.is_empty()) else {
            info!(title = %title, tmdb_id = movie.id, "TMDB match has no poster");
            return Ok(None);
        };

        Ok(Some(poster_image_url(&poster_path)))
    }
}

fn poster_image_url(poster_path: &str) -> String {
    format!("{IMAGE_BASE_URL}/{POSTER_SIZE}/{}", poster_path.trim_start_matches('/'))
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<SearchMovie>,
}

#[derive(Debug, Deserialize)]
pub struct SearchMovie {
    pub id: i32,
    pub poster_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_w500_image_url() {
        assert_eq!(
            poster_image_url("/kqjL17yufvn9OVLyXYpvtyrFfak.jpg"),
            "https://image.tmdb.org/t/p/w500/kqjL17yufvn9OVLyXYpvtyrFfak.jpg"
        );
    }

    #[test]
    fn search_response_tolerates_missing_posters() {
        let raw = r#"{"page": 1, "results": [{"id": 550, "title": "Fight Club", "poster_path": null}]}"#;
        let resp: SearchResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.results[0].id, 550);
        assert!(resp.results[0].poster_path.is_none());
    }
}
