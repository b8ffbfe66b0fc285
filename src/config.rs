//! Layered application configuration.
//!
//! Settings are merged with figment, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config <PATH>`, or the platform config directory)
//! 3. `SIMDUPE_*` environment variables (`__` separates nested keys, e.g.
//!    `SIMDUPE_BUCKET__BANDS=8`)
//! 4. CLI flags, applied by the caller afterwards
//!
//! ```toml
//! threshold = 0.92
//! images = true
//! videos = false
//! threads = 8
//!
//! [bucket]
//! key_bits = 16
//! bands = 4
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::duplicates::bucket::{BucketError, BucketRule, DEFAULT_BANDS, DEFAULT_KEY_BITS};
use crate::duplicates::{validate_threshold, FinderError, DEFAULT_THRESHOLD};

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "SIMDUPE_";

/// Errors raised while loading or validating configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// A provider (file or environment) could not be parsed.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// Threshold out of range.
    #[error(transparent)]
    Threshold(#[from] FinderError),

    /// Bucket settings are unusable.
    #[error("Invalid bucket settings: {0}")]
    Bucket(#[from] BucketError),

    /// No platform configuration directory could be determined.
    #[error("Failed to determine configuration directory")]
    NoConfigDir,

    /// Writing the configuration file failed.
    #[error("Failed to write configuration to {path}: {source}")]
    Write {
        /// Destination file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Serializing the configuration failed.
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Bucket key settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketConfig {
    /// Bits per bucket key (1-64)
    pub key_bits: u32,
    /// Number of bands
    pub bands: u32,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            key_bits: DEFAULT_KEY_BITS,
            bands: DEFAULT_BANDS,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Similarity threshold in `[0, 1]`
    pub threshold: f64,
    /// Compare images
    pub images: bool,
    /// Compare videos
    pub videos: bool,
    /// Worker threads (0 = one per CPU)
    pub threads: usize,
    /// Bucket key settings
    pub bucket: BucketConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            images: true,
            videos: true,
            threads: 0,
            bucket: BucketConfig::default(),
        }
    }
}

impl Config {
    /// Load from the default platform path (if it exists) and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or environment holds unparsable values.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load_from_path(&path),
            None => Self::extract(Self::figment_base()),
        }
    }

    /// Load from a specific TOML file (missing files are ignored) and the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or environment holds unparsable values.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        log::debug!("Loading configuration from {}", path.display());
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::extract(figment)
    }

    fn figment_base() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        figment.extract().map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns an error for an out-of-range threshold or bucket settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_threshold(self.threshold)?;
        self.bucket_rule()?;
        if !self.images && !self.videos {
            log::warn!("Both image and video comparison are disabled");
        }
        Ok(())
    }

    /// The bucket rule described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `key_bits` or `bands` is out of range.
    pub fn bucket_rule(&self) -> Result<BucketRule, ConfigError> {
        Ok(BucketRule::new(self.bucket.key_bits, self.bucket.bands)?)
    }

    /// Serialize as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write this configuration as TOML, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Platform-specific configuration file path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "simdupe", "simdupe")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Platform-specific configuration file path, or an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoConfigDir`] if no home directory is known.
    pub fn require_default_path() -> Result<PathBuf, ConfigError> {
        Self::default_path().ok_or(ConfigError::NoConfigDir)
    }
}
