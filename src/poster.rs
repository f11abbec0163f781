//! Poster download, storage and lookup.

use std::path::PathBuf;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{AppResult, PosterError};

/// A poster saved under the upload folder.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StoredPoster {
    pub filename: String,
    pub width: u32,
    pub height: u32,
}

/// Where imported posters end up.
#[async_trait::async_trait]
pub trait PosterStorage: Send + Sync {
    async fn store(&self, url: &str) -> Result<StoredPoster, PosterError>;
}

/// Finds a poster URL for a movie title.
#[async_trait::async_trait]
pub trait PosterSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn poster_url(&self, title: &str) -> AppResult<Option<String>>;
}

/// Downloads posters over HTTP and writes them to the local upload folder.
///
/// The client is expected to carry a request timeout, so one slow host
/// cannot stall an import.
pub struct PosterStore {
    http: reqwest::Client,
    upload_folder: PathBuf,
}

impl PosterStore {
    pub fn new(http: reqwest::Client, upload_folder: PathBuf) -> Self {
        Self { http, upload_folder }
    }
}

#[async_trait::async_trait]
impl PosterStorage for PosterStore {
    async fn store(&self, url: &str) -> Result<StoredPoster, PosterError> {
        let bytes = self.http.get(url).send().await?.error_for_status()?.bytes().await?;
        let meta = ImageMeta::sniff(&bytes).ok_or(PosterError::UnsupportedImage)?;

        let filename = format!("{:x}.{}", Sha256::digest(url.as_bytes()), meta.format.extension());
        let path = self.upload_folder.join(&filename);

        tokio::fs::create_dir_all(&self.upload_folder).await?;
        if tokio::fs::try_exists(&path).await? {
            debug!(url = %url, filename = %filename, "poster already stored");
        } else {
            tokio::fs::write(&path, &bytes).await?;
            debug!(url = %url, filename = %filename, width = meta.width, height = meta.height, "stored poster");
        }

        Ok(StoredPoster { filename, width: meta.width, height: meta.height })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Webp => "webp",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ImageMeta {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl ImageMeta {
    /// Reads format and pixel size from the file header. Anything that is
    /// not a PNG, JPEG or WebP image yields `None`.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        let format = match imagesize::image_type(bytes).ok()? {
            imagesize::ImageType::Png => ImageFormat::Png,
            imagesize::ImageType::Jpeg => ImageFormat::Jpeg,
            imagesize::ImageType::Webp => ImageFormat::Webp,
            _ => return None,
        };
        let size = imagesize::blob_size(bytes).ok()?;
        Some(Self {
            format,
            width: u32::try_from(size.width).ok()?,
            height: u32::try_from(size.height).ok()?,
        })
    }
}
