//! Environment-driven configuration.

use crate::asset::{domain::ASSET_BUCKET, services::AssetSettings};
use crate::credential::adapters::cipher::ENCRYPTION_KEY_LEN;
use crate::generation::domain::is_valid_bucket_name;
use crate::generation::services::{
    DEFAULT_MAX_CONCURRENT_JOBS, DEFAULT_MAX_JOBS_PER_HOUR, DEFAULT_SIGNED_URL_TTL,
    DEFAULT_STORAGE_BUCKET, DEFAULT_THUMBNAIL_MAX_WIDTH, JobSettings,
};
use crate::telemetry::{LogFormat, TelemetryConfig};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use secrecy::SecretSlice;
use std::fmt::Display;
use std::num::{NonZeroU32, NonZeroU64, NonZeroUsize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Capacity of the admission gate.
pub const MAX_CONCURRENT_JOBS_VAR: &str = "PAPERJOBS_MAX_CONCURRENT_JOBS";
/// Per-owner hourly submission cap.
pub const MAX_JOBS_PER_HOUR_VAR: &str = "PAPERJOBS_MAX_JOBS_PER_HOUR";
/// Bucket receiving artifacts.
pub const STORAGE_BUCKET_VAR: &str = "PAPERJOBS_STORAGE_BUCKET";
/// Bucket receiving uploaded assets.
pub const ASSET_BUCKET_VAR: &str = "PAPERJOBS_ASSET_BUCKET";
/// Retrieval URL lifetime in seconds.
pub const SIGNED_URL_TTL_VAR: &str = "PAPERJOBS_SIGNED_URL_TTL_SECS";
/// Maximum thumbnail width in pixels.
pub const THUMBNAIL_MAX_WIDTH_VAR: &str = "PAPERJOBS_THUMBNAIL_MAX_WIDTH";
/// Base64-encoded 32-byte credential encryption key.
pub const ENCRYPTION_KEY_VAR: &str = "PAPERJOBS_ENCRYPTION_KEY";
/// Log output format.
pub const LOG_FORMAT_VAR: &str = "PAPERJOBS_LOG_FORMAT";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is unset.
    #[error("{0} must be set")]
    Missing(&'static str),
    /// A variable holds an unusable value.
    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        /// Variable name.
        var: &'static str,
        /// Offending value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
    /// The `.env` file exists but could not be read.
    #[error("failed to load .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
}

/// Service configuration.
#[derive(Debug)]
pub struct JobsConfig {
    /// Job admission, limits, and publishing settings.
    pub jobs: JobSettings,
    /// Asset bucket and URL settings.
    pub assets: AssetSettings,
    /// Raw credential encryption key.
    pub encryption_key: SecretSlice<u8>,
    /// Logging settings.
    pub telemetry: TelemetryConfig,
}

impl JobsConfig {
    /// Loads configuration from the process environment after reading an
    /// optional `.env` file.
    ///
    /// | Env Var                          | Default       |
    /// |----------------------------------|---------------|
    /// | `PAPERJOBS_MAX_CONCURRENT_JOBS`  | `3`           |
    /// | `PAPERJOBS_MAX_JOBS_PER_HOUR`    | `5`           |
    /// | `PAPERJOBS_STORAGE_BUCKET`       | `generations` |
    /// | `PAPERJOBS_ASSET_BUCKET`         | `assets`      |
    /// | `PAPERJOBS_SIGNED_URL_TTL_SECS`  | `3600`        |
    /// | `PAPERJOBS_THUMBNAIL_MAX_WIDTH`  | `400`         |
    /// | `PAPERJOBS_ENCRYPTION_KEY`       | required      |
    /// | `PAPERJOBS_LOG_FORMAT`           | `pretty`      |
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a value is missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => {}
            Err(err) if err.not_found() => {}
            Err(err) => return Err(ConfigError::Dotenv(err)),
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through `lookup`, which returns a variable's value
    /// or `None` when unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a value is missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_concurrent_jobs: NonZeroUsize =
            parse_or(&lookup, MAX_CONCURRENT_JOBS_VAR, DEFAULT_MAX_CONCURRENT_JOBS)?;
        let max_jobs_per_hour: u32 =
            parse_or(&lookup, MAX_JOBS_PER_HOUR_VAR, DEFAULT_MAX_JOBS_PER_HOUR)?;
        let ttl_secs: NonZeroU64 = parse_or(
            &lookup,
            SIGNED_URL_TTL_VAR,
            NonZeroU64::new(DEFAULT_SIGNED_URL_TTL.as_secs()).unwrap_or(NonZeroU64::MIN),
        )?;
        let thumbnail_max_width: NonZeroU32 =
            parse_or(&lookup, THUMBNAIL_MAX_WIDTH_VAR, DEFAULT_THUMBNAIL_MAX_WIDTH)?;

        let storage_bucket = bucket_or(&lookup, STORAGE_BUCKET_VAR, DEFAULT_STORAGE_BUCKET)?;
        let asset_bucket = bucket_or(&lookup, ASSET_BUCKET_VAR, ASSET_BUCKET)?;
        let signed_url_ttl = Duration::from_secs(ttl_secs.get());

        let format = match lookup(LOG_FORMAT_VAR) {
            Some(raw) => LogFormat::try_from(raw.as_str()).map_err(|reason| ConfigError::Invalid {
                var: LOG_FORMAT_VAR,
                value: raw.clone(),
                reason,
            })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            jobs: JobSettings {
                max_concurrent_jobs,
                max_jobs_per_hour,
                storage_bucket,
                signed_url_ttl,
                thumbnail_max_width,
            },
            assets: AssetSettings {
                bucket: asset_bucket,
                signed_url_ttl,
            },
            encryption_key: decode_key(lookup(ENCRYPTION_KEY_VAR))?,
            telemetry: TelemetryConfig {
                format,
                ..TelemetryConfig::default()
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let Some(raw) = lookup(var) else {
        return Ok(default);
    };
    raw.trim().parse().map_err(|err: T::Err| ConfigError::Invalid {
        var,
        value: raw.clone(),
        reason: err.to_string(),
    })
}

fn bucket_or<F>(lookup: &F, var: &'static str, default: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let bucket = lookup(var).map_or_else(|| default.to_owned(), |value| value.trim().to_owned());
    if !is_valid_bucket_name(&bucket) {
        return Err(ConfigError::Invalid {
            var,
            value: bucket,
            reason: "bucket must be a single path segment other than '.' or '..'".to_owned(),
        });
    }
    Ok(bucket)
}

fn decode_key(raw: Option<String>) -> Result<SecretSlice<u8>, ConfigError> {
    let encoded = raw.ok_or(ConfigError::Missing(ENCRYPTION_KEY_VAR))?;
    let invalid = |reason: String| ConfigError::Invalid {
        var: ENCRYPTION_KEY_VAR,
        value: "<redacted>".to_owned(),
        reason,
    };
    let key = STANDARD
        .decode(encoded.trim())
        .map_err(|err| invalid(err.to_string()))?;
    if key.len() != ENCRYPTION_KEY_LEN {
        return Err(invalid(format!(
            "expected {ENCRYPTION_KEY_LEN} bytes, got {}",
            key.len()
        )));
    }
    Ok(SecretSlice::from(key))
}
