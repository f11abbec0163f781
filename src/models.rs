use std::{collections::BTreeSet, fmt};

use jiff::civil::Date;
use serde::{Deserialize, Deserializer, de::Error as _};

use crate::error::{ImportError, ImportResult};

/// Normalized output of every scraper adapter: one entry per cinema.
#[derive(Clone, Debug, Deserialize)]
#[serde(from = "ScrapeResultRepr")]
pub struct ScrapeResult {
    pub cinemas: Vec<ScrapedCinema>,
}

// The runner writes a bare list of cinemas; exported files wrap it.
#[derive(Deserialize)]
#[serde(untagged)]
enum ScrapeResultRepr {
    Wrapped { cinemas: Vec<ScrapedCinema> },
    Bare(Vec<ScrapedCinema>),
}

impl From<ScrapeResultRepr> for ScrapeResult {
    fn from(repr: ScrapeResultRepr) -> Self {
        match repr {
            ScrapeResultRepr::Wrapped { cinemas } | ScrapeResultRepr::Bare(cinemas) => {
                Self { cinemas }
            },
        }
    }
}

impl ScrapeResult {
    /// Two-step parse so callers can tell broken JSON from a wrong shape.
    pub fn from_json(raw: &str) -> ImportResult<Self> {
        let value: serde_json::Value = serde_json::from_str(raw).map_err(ImportError::Malformed)?;
        serde_json::from_value(value).map_err(ImportError::InvalidStructure)
    }

    pub fn feature_count(&self) -> usize {
        self.cinemas.iter().map(|c| c.features.len()).sum()
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ScrapedCinema {
    pub url: String,
    pub cinema: String,
    pub slug: String,
    pub features: Vec<ScrapedFeature>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ScrapedFeature {
    pub title: String,
    pub excerpt: String,
    #[serde(default)]
    pub poster: FieldValue,
    #[serde(default)]
    pub time: Option<TimeInput>,
    #[serde(default)]
    pub original_title: FieldValue,
    #[serde(default)]
    pub price: FieldValue,
    #[serde(default)]
    pub director: FieldValue,
    #[serde(default)]
    pub classification: FieldValue,
    #[serde(default)]
    pub general_info: FieldValue,
    #[serde(default)]
    pub read_more: FieldValue,
}

impl ScrapedFeature {
    /// Present fields in fixed order, one per line.
    pub fn description(&self) -> String {
        let excerpt = self.excerpt.trim();
        [
            self.original_title.as_present(),
            self.price.as_present(),
            self.director.as_present(),
            self.classification.as_present(),
            self.general_info.as_present(),
            (!excerpt.is_empty()).then_some(excerpt),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("\n")
    }
}

/// Optional scraped text. Scrapers emit `false` once they know a field does
/// not exist for a movie, and `null`/`""` while it is still undetermined.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum FieldValue {
    #[default]
    Unknown,
    Absent,
    Present(String),
}

impl FieldValue {
    pub fn as_present(&self) -> Option<&str> {
        match self {
            FieldValue::Present(value) => Some(value.trim()),
            FieldValue::Unknown | FieldValue::Absent => None,
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Text(String),
        }

        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(FieldValue::Unknown),
            Some(Raw::Flag(false)) => Ok(FieldValue::Absent),
            Some(Raw::Flag(true)) => Err(D::Error::custom("expected a string, null or false")),
            Some(Raw::Text(text)) if text.trim().is_empty() => Ok(FieldValue::Unknown),
            Some(Raw::Text(text)) => Ok(FieldValue::Present(text)),
        }
    }
}

/// Raw `time` field of a feature.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
pub enum TimeInput {
    Text(String),
    List(Vec<String>),
}

/// One concrete showing: a calendar date and an `HH:MM` time.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ShowTime {
    pub date: Date,
    pub time: String,
}

impl ShowTime {
    pub fn new(date: Date, hour: u8, minute: u8) -> Self {
        Self { date, time: format!("{hour:02}:{minute:02}") }
    }

    /// Parses the canonical `YYYY-MM-DDTHH:MM` form.
    pub fn parse(raw: &str) -> Option<Self> {
        let (date, time) = raw.trim().split_once('T')?;
        let date: Date = date.parse().ok()?;
        let (hour, minute) = parse_clock(time)?;
        Some(Self::new(date, hour, minute))
    }

    /// Builds a show time from stored columns, tolerating `HH:MM:SS`.
    pub fn from_columns(date: &str, time: &str) -> Option<Self> {
        let date: Date = date.parse().ok()?;
        let clock = time.get(..5).unwrap_or(time);
        let (hour, minute) = parse_clock(clock)?;
        Some(Self::new(date, hour, minute))
    }

    pub fn now() -> Self {
        let now = jiff::Zoned::now();
        Self::new(now.date(), now.hour() as u8, now.minute() as u8)
    }

    pub fn date_column(&self) -> String {
        self.date.to_string()
    }
}

impl fmt::Display for ShowTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}T{}", self.date, self.time)
    }
}

fn parse_clock(raw: &str) -> Option<(u8, u8)> {
    let (hour, minute) = raw.split_once(':')?;
    if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
        return None;
    }
    let hour: u8 = hour.parse().ok()?;
    let minute: u8 = minute.parse().ok()?;
    (hour < 24 && minute < 60).then_some((hour, minute))
}

/// How a re-import combines its dates with the ones already stored.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum MergePolicy {
    /// Union on exact `(date, time)`; nothing is ever dropped.
    #[default]
    Accumulate,
    /// Every calendar date present in the import replaces the stored
    /// entries for that date; other dates are kept.
    OverwriteSameDay,
}

/// Per-cinema merge policies, resolved once from configuration.
#[derive(Clone, Debug, Default)]
pub struct MergePolicies {
    overwrite_same_day: BTreeSet<String>,
}

impl MergePolicies {
    pub fn overwrite_same_day<I, S>(slugs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let overwrite_same_day = slugs
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Self { overwrite_same_day }
    }

    pub fn policy_for(&self, cinema_slug: &str) -> MergePolicy {
        if self.overwrite_same_day.contains(cinema_slug) {
            MergePolicy::OverwriteSameDay
        } else {
            MergePolicy::Accumulate
        }
    }
}

/// Outcome of one poster lookup, as recorded in `poster_fetch_attempts`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AttemptStatus {
    Success,
    NotFound,
    Error,
}

impl AttemptStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttemptStatus::Success => "success",
            AttemptStatus::NotFound => "not_found",
            AttemptStatus::Error => "error",
        }
    }
}
