use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::rules::TaxonomyError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid time basis: '{0}' (expected local, utc or an offset like +02:00)")]
    TimeBasis(String),
    #[error("Empty currency marker")]
    EmptyCurrencyMarker,
    #[error("Invalid extraction pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error(transparent)]
    Taxonomy(#[from] TaxonomyError),
}

/// Which clock the epoch timestamps are rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimeBasis {
    /// The host's local time zone.
    #[default]
    Local,
    Utc,
    Fixed(FixedOffset),
}

impl TimeBasis {
    pub fn localize(self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self {
            TimeBasis::Local => instant.with_timezone(&Local).naive_local(),
            TimeBasis::Utc => instant.naive_utc(),
            TimeBasis::Fixed(offset) => instant.with_timezone(&offset).naive_local(),
        }
    }
}

impl std::str::FromStr for TimeBasis {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(TimeBasis::Local),
            "utc" | "z" => Ok(TimeBasis::Utc),
            other => other
                .parse::<FixedOffset>()
                .map(TimeBasis::Fixed)
                .map_err(|_| ConfigError::TimeBasis(s.to_string())),
        }
    }
}

impl fmt::Display for TimeBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeBasis::Local => write!(f, "local"),
            TimeBasis::Utc => write!(f, "utc"),
            TimeBasis::Fixed(offset) => write!(f, "{offset}"),
        }
    }
}

impl TryFrom<String> for TimeBasis {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TimeBasis> for String {
    fn from(basis: TimeBasis) -> Self {
        basis.to_string()
    }
}

/// Engine settings. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Literal that must directly follow a numeral for it to count as the amount.
    pub currency_marker: String,
    /// Literals that introduce the transaction id, tried as alternatives.
    pub transaction_id_markers: Vec<String>,
    pub time_basis: TimeBasis,
    /// Reject messages whose timestamp yields a date but no time of day.
    pub require_time: bool,
    /// Category rule table; the built-in table is used when absent.
    pub taxonomy_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            currency_marker: "RWF".to_string(),
            transaction_id_markers: vec!["TxId".to_string()],
            time_basis: TimeBasis::Local,
            require_time: true,
            taxonomy_path: None,
        }
    }
}

impl EngineConfig {
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(toml_content)?;
        if config.currency_marker.trim().is_empty() {
            return Err(ConfigError::EmptyCurrencyMarker);
        }
        Ok(config)
    }

    /// Read a config file. A relative `taxonomy_path` is resolved against
    /// the directory holding the config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = read_to_string(path)?;
        let mut config = Self::from_toml(&content)?;
        if let (Some(taxonomy), Some(dir)) = (config.taxonomy_path.as_mut(), path.parent()) {
            if taxonomy.is_relative() {
                *taxonomy = dir.join(&*taxonomy);
            }
        }
        Ok(config)
    }
}

pub(crate) fn read_to_string(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
