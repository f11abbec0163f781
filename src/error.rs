use thiserror::Error;

#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self(err)
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self(anyhow::Error::new(err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        Self(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self(anyhow::Error::new(err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self(anyhow::Error::new(err))
    }
}

impl From<ImportError> for AppError {
    fn from(err: ImportError) -> Self {
        Self(anyhow::Error::new(err))
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Failures of a scrape-result import. Everything except `Database` is
/// detected before the first write.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("scrape result is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("scrape result has an invalid structure: {0}")]
    InvalidStructure(#[source] serde_json::Error),

    #[error("invalid show time `{value}` for `{title}`")]
    InvalidShowtime { title: String, value: String },

    #[error("unknown cinema `{0}`")]
    UnknownCinema(String),

    #[error(transparent)]
    Database(#[from] sea_orm::DbErr),
}

pub type ImportResult<T> = Result<T, ImportError>;

/// Per-feature poster failures. Never escape an import.
#[derive(Debug, Error)]
pub enum PosterError {
    #[error("poster request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("poster payload is not a supported image")]
    UnsupportedImage,

    #[error("could not store poster: {0}")]
    Io(#[from] std::io::Error),
}
