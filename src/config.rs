use std::{path::PathBuf, str::FromStr};

use anyhow::Context;

use crate::models::MergePolicies;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub upload_folder: PathBuf,
    pub tmdb_access_token: Option<String>,
    pub tmdb_base_url: String,
    pub tmdb_rps: u32,
    pub poster_timeout_secs: u64,
    pub max_concurrent: usize,
    pub merge_policies: MergePolicies,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://cinemaempoa.db?mode=rwc".to_string());

        let upload_folder =
            PathBuf::from(std::env::var("UPLOAD_FOLDER").unwrap_or_else(|_| "uploads".to_string()));

        let tmdb_access_token = std::env::var("TMDB_ACCESS_TOKEN")
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        let tmdb_base_url = std::env::var("TMDB_BASE_URL")
            .unwrap_or_else(|_| "https://api.themoviedb.org/3".to_string());

        let tmdb_rps: u32 = numeric_setting("TMDB_RPS", std::env::var("TMDB_RPS").ok(), 4)?;
        let poster_timeout_secs: u64 =
            numeric_setting("POSTER_TIMEOUT_SECS", std::env::var("POSTER_TIMEOUT_SECS").ok(), 10)?;
        let max_concurrent: usize = numeric_setting(
            "MAX_CONCURRENT_REQUESTS",
            std::env::var("MAX_CONCURRENT_REQUESTS").ok(),
            4,
        )?;

        let overwrite_same_day = std::env::var("OVERWRITE_SAME_DAY_CINEMAS")
            .unwrap_or_else(|_| "capitolio".to_string());

        Ok(Self {
            database_url,
            upload_folder,
            tmdb_access_token,
            tmdb_base_url,
            tmdb_rps,
            poster_timeout_secs,
            max_concurrent,
            merge_policies: MergePolicies::overwrite_same_day(overwrite_same_day.split(',')),
        })
    }
}

/// Parses an optional numeric setting. Unset falls back to `default`; a value
/// that does not parse is an error naming the variable.
fn numeric_setting<T>(key: &str, raw: Option<String>, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw.trim().parse().with_context(|| format!("{key}={raw:?}")),
    }
}
