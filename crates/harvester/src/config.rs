//! Daemon configuration.
//!
//! The configuration is a single JSON document handed to `harvestd` with
//! `-c`. Parsing produces an immutable [`Config`] value; every consumer of
//! the configuration receives it already validated and normalized.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Default number of seconds the throttle suspends a caller once the
/// error window is full.
const DEFAULT_THROTTLER_WAIT_SECS: u64 = 1800;
/// Default size of the throttle's sliding error window.
const DEFAULT_SLIDING_WINDOW_SIZE: usize = 60;
/// Default interval, in milliseconds, at which recorded errors leak out
/// of the window.
const DEFAULT_LEAK_INTERVAL_MS: u64 = 1000;

/// Smallest accepted scratch-bypass threshold, in gigabytes.
const MIN_TMP_DIR_FILE_SIZE_LIMIT: f64 = 0.1;

/// Errors produced while loading or validating the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Root directory under which all working trees are cloned.
    pub clone_dir: PathBuf,

    /// Package working trees into `<clone_path>.tar` after each
    /// successful fetch.
    #[serde(default)]
    pub tar_repositories: bool,

    /// Scratch directory used for extraction and re-archival when
    /// `tar_repositories` is enabled. Empty means the system default.
    #[serde(default)]
    pub tmp_dir: String,

    /// Archive size, in gigabytes, above which the scratch directory is
    /// bypassed and extraction happens next to the final path.
    #[serde(default = "default_tmp_dir_file_size_limit")]
    pub tmp_dir_file_size_limit: f64,

    /// Number of parallel fetcher workers.
    #[serde(default = "default_max_fetcher_workers")]
    pub max_fetcher_workers: usize,

    /// Pause between two full fetch cycles.
    #[serde(with = "humantime_serde")]
    pub fetch_time_interval: Duration,

    /// Pause between two full crawling cycles.
    #[serde(with = "humantime_serde")]
    pub crawling_time_interval: Duration,

    /// Restrict the fetch enumeration to these primary languages.
    /// Empty means no filter.
    #[serde(default)]
    pub fetch_languages: Vec<String>,

    /// Seconds the throttle suspends a caller when the error window is
    /// full.
    #[serde(default = "default_throttler_wait_time")]
    pub throttler_wait_time: u64,

    /// Capacity of the throttle's sliding error window.
    #[serde(default = "default_sliding_window_size")]
    pub throttler_sliding_window_size: usize,

    /// Milliseconds between two leaks out of the error window.
    #[serde(default = "default_leak_interval")]
    pub throttler_leak_interval: u64,

    /// One block per provider to crawl.
    pub crawlers: Vec<CrawlerConfig>,

    /// Relational store connection parameters.
    pub database: DatabaseConfig,
}

/// Configuration for a single provider crawler.
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Crawler type (e.g. "github").
    #[serde(rename = "type")]
    pub kind: String,

    /// Programming languages of interest.
    pub languages: Vec<String>,

    /// Number of repositories to crawl; 0 means unlimited. With the
    /// search API the limit applies per language, otherwise globally.
    #[serde(default)]
    pub limit: i64,

    /// Keep fork repositories.
    #[serde(default)]
    pub fork: bool,

    /// Provider API token. Without one the provider usually grants only
    /// a small unauthenticated call budget.
    #[serde(default)]
    pub oauth_access_token: String,

    /// Use the provider's search API (stargazer-ranked, capped at 1000
    /// results per query) instead of exhaustive listing.
    #[serde(default)]
    pub use_search_api: bool,

    /// Listing cursor to start from.
    #[serde(default)]
    pub since_id: u64,
}

/// PostgreSQL connection parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub hostname: String,
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub dbname: String,
    pub ssl_mode: String,
}

fn default_tmp_dir_file_size_limit() -> f64 {
    MIN_TMP_DIR_FILE_SIZE_LIMIT
}

fn default_max_fetcher_workers() -> usize {
    1
}

fn default_throttler_wait_time() -> u64 {
    DEFAULT_THROTTLER_WAIT_SECS
}

fn default_sliding_window_size() -> usize {
    DEFAULT_SLIDING_WINDOW_SIZE
}

fn default_leak_interval() -> u64 {
    DEFAULT_LEAK_INTERVAL_MS
}

impl Config {
    /// Read, parse, normalize and validate a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Parse a configuration from a JSON string.
    pub fn from_json(raw: &str) -> Result<Self> {
        let mut cfg: Config = serde_json::from_str(raw)?;
        cfg.normalize();
        cfg.verify()?;
        Ok(cfg)
    }

    /// Apply the documented floors to out-of-range values.
    fn normalize(&mut self) {
        if self.tmp_dir_file_size_limit < MIN_TMP_DIR_FILE_SIZE_LIMIT {
            self.tmp_dir_file_size_limit = MIN_TMP_DIR_FILE_SIZE_LIMIT;
        }
        if self.max_fetcher_workers == 0 {
            self.max_fetcher_workers = 1;
        }
    }

    fn verify(&self) -> Result<()> {
        if self.clone_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("clone_dir cannot be empty".into()));
        }

        if self.throttler_wait_time == 0 {
            return Err(ConfigError::Invalid(
                "throttler_wait_time must be greater than 0".into(),
            ));
        }

        if self.throttler_sliding_window_size == 0 {
            return Err(ConfigError::Invalid(
                "throttler_sliding_window_size must be greater than 0".into(),
            ));
        }

        if self.throttler_leak_interval < 100 {
            return Err(ConfigError::Invalid(
                "throttler_leak_interval must be at least 100 milliseconds".into(),
            ));
        }

        for crawler in &self.crawlers {
            crawler.verify()?;
        }

        self.database.verify()
    }

    /// The configured scratch directory, or `None` for the system default.
    pub fn scratch_dir(&self) -> Option<&Path> {
        if self.tmp_dir.trim().is_empty() {
            None
        } else {
            Some(Path::new(&self.tmp_dir))
        }
    }
}

impl CrawlerConfig {
    fn verify(&self) -> Result<()> {
        if self.kind.trim().is_empty() {
            return Err(ConfigError::Invalid("crawler type cannot be empty".into()));
        }

        if self.languages.is_empty() {
            return Err(ConfigError::Invalid(
                "crawler must have at least one language".into(),
            ));
        }

        Ok(())
    }
}

impl DatabaseConfig {
    fn verify(&self) -> Result<()> {
        if self.hostname.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "database hostname cannot be empty".into(),
            ));
        }

        if self.port == 0 {
            return Err(ConfigError::Invalid(
                "database port must be greater than 0".into(),
            ));
        }

        if self.username.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "database username cannot be empty".into(),
            ));
        }

        if self.dbname.trim().is_empty() {
            return Err(ConfigError::Invalid("database name cannot be empty".into()));
        }

        let ssl_modes: HashSet<&str> = ["disable", "require", "verify-ca", "verify-full"]
            .into_iter()
            .collect();
        if !ssl_modes.contains(self.ssl_mode.as_str()) {
            return Err(ConfigError::Invalid(
                "database ssl_mode must be one of disable, require, verify-ca or verify-full"
                    .into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> serde_json::Value {
        serde_json::json!({
            "clone_dir": "/srv/harvest/repos",
            "tar_repositories": true,
            "tmp_dir": "/tmp",
            "tmp_dir_file_size_limit": 2.5,
            "max_fetcher_workers": 8,
            "fetch_time_interval": "30m",
            "crawling_time_interval": "2h",
            "fetch_languages": ["go", "rust"],
            "throttler_wait_time": 600,
            "throttler_sliding_window_size": 30,
            "throttler_leak_interval": 250,
            "crawlers": [{
                "type": "github",
                "languages": ["Rust"],
                "limit": 100,
                "fork": false,
                "oauth_access_token": "token",
                "use_search_api": true,
                "since_id": 0
            }],
            "database": {
                "hostname": "localhost",
                "port": 5432,
                "username": "harvest",
                "password": "secret",
                "dbname": "harvest",
                "ssl_mode": "disable"
            }
        })
    }

    fn parse(value: serde_json::Value) -> Result<Config> {
        Config::from_json(&value.to_string())
    }

    #[test]
    fn full_config_parses() {
        let cfg = parse(sample_json()).expect("valid config");
        assert_eq!(cfg.clone_dir, PathBuf::from("/srv/harvest/repos"));
        assert_eq!(cfg.fetch_time_interval, Duration::from_secs(30 * 60));
        assert_eq!(cfg.crawling_time_interval, Duration::from_secs(2 * 3600));
        assert_eq!(cfg.max_fetcher_workers, 8);
        assert_eq!(cfg.crawlers.len(), 1);
        assert!(cfg.crawlers[0].use_search_api);
        assert_eq!(cfg.scratch_dir(), Some(Path::new("/tmp")));
    }

    #[test]
    fn throttler_defaults_applied() {
        let mut value = sample_json();
        let obj = value.as_object_mut().unwrap();
        obj.remove("throttler_wait_time");
        obj.remove("throttler_sliding_window_size");
        obj.remove("throttler_leak_interval");

        let cfg = parse(value).expect("valid config");
        assert_eq!(cfg.throttler_wait_time, 1800);
        assert_eq!(cfg.throttler_sliding_window_size, 60);
        assert_eq!(cfg.throttler_leak_interval, 1000);
    }

    #[test]
    fn floors_applied() {
        let mut value = sample_json();
        value["tmp_dir_file_size_limit"] = serde_json::json!(0.001);
        value["max_fetcher_workers"] = serde_json::json!(0);

        let cfg = parse(value).expect("valid config");
        assert!((cfg.tmp_dir_file_size_limit - 0.1).abs() < f64::EPSILON);
        assert_eq!(cfg.max_fetcher_workers, 1);
    }

    #[test]
    fn empty_tmp_dir_means_system_default() {
        let mut value = sample_json();
        value["tmp_dir"] = serde_json::json!("");
        let cfg = parse(value).expect("valid config");
        assert_eq!(cfg.scratch_dir(), None);
    }

    #[test]
    fn rejects_empty_clone_dir() {
        let mut value = sample_json();
        value["clone_dir"] = serde_json::json!("");
        assert!(matches!(parse(value), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_invalid_interval() {
        let mut value = sample_json();
        value["fetch_time_interval"] = serde_json::json!("not-a-duration");
        assert!(matches!(parse(value), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn rejects_crawler_without_languages() {
        let mut value = sample_json();
        value["crawlers"][0]["languages"] = serde_json::json!([]);
        assert!(matches!(parse(value), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_zero_throttle_parameters() {
        for key in [
            "throttler_wait_time",
            "throttler_sliding_window_size",
        ] {
            let mut value = sample_json();
            value[key] = serde_json::json!(0);
            assert!(matches!(parse(value), Err(ConfigError::Invalid(_))), "{key}");
        }

        let mut value = sample_json();
        value["throttler_leak_interval"] = serde_json::json!(99);
        assert!(matches!(parse(value), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_unknown_ssl_mode() {
        let mut value = sample_json();
        value["database"]["ssl_mode"] = serde_json::json!("prefer");
        assert!(matches!(parse(value), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_zero_database_port() {
        let mut value = sample_json();
        value["database"]["port"] = serde_json::json!(0);
        assert!(matches!(parse(value), Err(ConfigError::Invalid(_))));
    }
}
