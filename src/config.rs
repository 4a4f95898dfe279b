//! Layered run configuration.
//!
//! Values are resolved with figment, lowest priority first:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. TOML file: `--config <PATH>`, else `config.toml` in the platform
//!    config directory
//! 3. Environment variables prefixed `DUPESWEEP_` (e.g. `DUPESWEEP_WORKERS=8`)
//! 4. Command-line flags ([`Config::merge_scan_args`])
//!
//! A missing default file is fine; a missing explicit file is an error.
//!
//! ```toml
//! min_size = 4096
//! min_age_secs = 604800
//! workers = 8
//! hash = "blake3"
//! delete_mode = "trash"
//! keep = "one"
//! ```
//!
//! `keep` has no default. [`Config::validate`] refuses to produce
//! [`RunSettings`] until it is set somewhere in the stack.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::actions::{DeleteMode, KeepPolicy};
use crate::cli::ScanArgs;
use crate::duplicates::finder::{DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS};
use crate::duplicates::FinderConfig;
use crate::scanner::{Eligibility, HashAlgorithm};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "DUPESWEEP_";

/// Errors raised while resolving configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    /// A layer contained a value of the wrong type or an unknown variant.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),

    /// No keep policy was chosen.
    #[error(
        "No keep policy set: pass --keep one (keep one copy per group) or --keep none \
         (delete every copy), or set `keep` in the config file"
    )]
    MissingKeepPolicy,

    /// `workers` was zero.
    #[error("workers must be at least 1")]
    InvalidWorkers,

    /// `queue_capacity` was zero.
    #[error("queue_capacity must be at least 1")]
    InvalidQueueCapacity,
}

/// Raw configuration as read from every layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minimum file size in bytes
    pub min_size: u64,
    /// Minimum time since last modification, in seconds
    pub min_age_secs: u64,
    /// Number of hashing workers
    pub workers: usize,
    /// Capacity of the work queue
    pub queue_capacity: usize,
    /// Content hash algorithm
    pub hash: HashAlgorithm,
    /// How duplicates are removed
    pub delete_mode: DeleteMode,
    /// Which group members survive; must be set explicitly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep: Option<KeepPolicy>,
    /// Follow symbolic links while walking
    pub follow_symlinks: bool,
}

impl Default for Config {
    fn default() -> Self {
        let eligibility = Eligibility::default();
        Self {
            min_size: eligibility.min_size,
            min_age_secs: eligibility.min_age.as_secs(),
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            hash: HashAlgorithm::default(),
            delete_mode: DeleteMode::default(),
            keep: None,
            follow_symlinks: false,
        }
    }
}

impl Config {
    /// Default config file location, if the platform has one.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "dupesweep", "dupesweep")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load defaults, the config file and the environment.
    ///
    /// # Errors
    ///
    /// Fails if `explicit` names a missing file or any layer holds an
    /// invalid value.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::FileNotFound(path.to_path_buf()));
                }
                Self::load_from_path(path)
            }
            None => match Self::default_path() {
                Some(path) => Self::load_from_path(&path),
                None => Self::extract(Self::base_figment()),
            },
        }
    }

    /// Load defaults, the TOML file at `path` (skipped if absent) and the
    /// environment.
    ///
    /// # Errors
    ///
    /// Fails if any layer holds an invalid value.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        log::debug!("Loading configuration from {}", path.display());
        let figment = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX));
        Self::extract(figment)
    }

    fn base_figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default())).merge(Env::prefixed(ENV_PREFIX))
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        figment.extract().map_err(|e| ConfigError::Invalid(Box::new(e)))
    }

    /// Apply command-line overrides. Flags left unset change nothing.
    pub fn merge_scan_args(&mut self, args: &ScanArgs) {
        if let Some(min_size) = args.min_size {
            self.min_size = min_size;
        }
        if let Some(min_age) = args.min_age {
            self.min_age_secs = min_age.as_secs();
        }
        if let Some(workers) = args.workers {
            self.workers = workers;
        }
        if let Some(capacity) = args.queue_capacity {
            self.queue_capacity = capacity;
        }
        if let Some(hash) = args.hash {
            self.hash = hash;
        }
        if let Some(keep) = args.keep {
            self.keep = Some(keep);
        }
        if args.trash {
            self.delete_mode = DeleteMode::Trash;
        }
        if args.dry_run {
            self.delete_mode = DeleteMode::DryRun;
        }
        if let Some(follow) = args.follow_symlinks_override() {
            self.follow_symlinks = follow;
        }
    }

    /// Check the merged values and produce settings for a run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKeepPolicy`] when no layer chose a keep
    /// policy, or an error for zero workers / queue capacity.
    pub fn validate(&self) -> Result<RunSettings, ConfigError> {
        let keep = self.keep.ok_or(ConfigError::MissingKeepPolicy)?;
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkers);
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::InvalidQueueCapacity);
        }
        Ok(RunSettings {
            eligibility: Eligibility::new(self.min_size, Duration::from_secs(self.min_age_secs)),
            workers: self.workers,
            queue_capacity: self.queue_capacity,
            hash: self.hash,
            delete_mode: self.delete_mode,
            keep,
            follow_symlinks: self.follow_symlinks,
        })
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Fails only if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Validated settings for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    /// Size/age thresholds
    pub eligibility: Eligibility,
    /// Number of hashing workers (at least 1)
    pub workers: usize,
    /// Work queue capacity (at least 1)
    pub queue_capacity: usize,
    /// Content hash algorithm
    pub hash: HashAlgorithm,
    /// How duplicates are removed
    pub delete_mode: DeleteMode,
    /// Which group members survive
    pub keep: KeepPolicy,
    /// Follow symbolic links while walking
    pub follow_symlinks: bool,
}

impl RunSettings {
    /// Finder configuration for these settings.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_workers(self.workers)
            .with_queue_capacity(self.queue_capacity)
            .with_eligibility(self.eligibility)
            .with_hash_algorithm(self.hash)
            .with_follow_symlinks(self.follow_symlinks)
    }
}
