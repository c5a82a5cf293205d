//! Engine configuration.
//!
//! Loaded from a TOML file; every field has a default so an empty (or
//! missing) file still describes the published dataset layout:
//!
//! ```toml
//! data_dir = "data"
//!
//! [sources]
//! citizen_science = "dataset_CSsources_mod.csv"
//! occurrences = "GBIFdata_CO.geojson"
//! grid = "CO_UTM2.geojson"
//! cameras = "locCam3.csv"
//!
//! [grid]
//! cell_id_field = "CUADRICULA"
//!
//! [cache]
//! ttl_seconds = 3600
//!
//! [analysis]
//! top_n = 5
//! category_a = "Daily Record"
//! category_b = "Sequences Record"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! `WILDMON_DATA_DIR` in the process environment overrides `data_dir`.
//! Loading a `.env` file is left to the binary, which does it once at
//! startup.

use std::path::Path;

use serde::Deserialize;

use crate::ingest::grid::DEFAULT_CELL_ID_FIELD;
use crate::ingest::transport::is_remote;
use crate::logging::LogLevel;
use crate::sources::{DAILY_RECORD, SEQUENCES_RECORD};

pub const DATA_DIR_ENV: &str = "WILDMON_DATA_DIR";
pub const CONFIG_PATH_ENV: &str = "WILDMON_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "wildmon.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub data_dir: String,
    pub sources: SourcePaths,
    pub grid: GridSettings,
    pub cache: CacheSettings,
    pub analysis: AnalysisSettings,
    pub logging: LoggingSettings,
}

/// Source locations: paths relative to `data_dir`, absolute paths, or
/// `http(s)://` URLs. An empty string means "not deployed".
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourcePaths {
    pub citizen_science: String,
    pub occurrences: String,
    pub grid: String,
    pub cameras: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    pub cell_id_field: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub top_n: usize,
    pub category_a: String,
    pub category_b: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub file: Option<String>,
    pub console_timestamps: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            sources: SourcePaths::default(),
            grid: GridSettings::default(),
            cache: CacheSettings::default(),
            analysis: AnalysisSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for SourcePaths {
    fn default() -> Self {
        Self {
            citizen_science: "dataset_CSsources_mod.csv".to_string(),
            occurrences: "GBIFdata_CO.geojson".to_string(),
            grid: "CO_UTM2.geojson".to_string(),
            cameras: "locCam3.csv".to_string(),
        }
    }
}

impl Default for GridSettings {
    fn default() -> Self {
        Self { cell_id_field: DEFAULT_CELL_ID_FIELD.to_string() }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { ttl_seconds: 3600 }
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            top_n: 5,
            category_a: DAILY_RECORD.to_string(),
            category_b: SEQUENCES_RECORD.to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            console_timestamps: false,
        }
    }
}

impl EngineConfig {
    /// Resolves a configured source location against `data_dir`.
    pub fn resolve(&self, location: &str) -> String {
        let location = location.trim();
        if location.is_empty() || is_remote(location) || Path::new(location).is_absolute() {
            return location.to_string();
        }
        Path::new(&self.data_dir).join(location).display().to_string()
    }

    pub fn citizen_science_location(&self) -> String {
        self.resolve(&self.sources.citizen_science)
    }

    pub fn occurrences_location(&self) -> String {
        self.resolve(&self.sources.occurrences)
    }

    pub fn grid_location(&self) -> String {
        self.resolve(&self.sources.grid)
    }

    pub fn cameras_location(&self) -> String {
        self.resolve(&self.sources.cameras)
    }

    /// Cache lifetime; values beyond chrono's range clamp to `Duration::MAX`.
    pub fn cache_ttl(&self) -> chrono::Duration {
        i64::try_from(self.cache.ttl_seconds)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }

    /// Configured log level, falling back to `Info` for unknown names.
    pub fn log_level(&self) -> LogLevel {
        LogLevel::parse(&self.logging.level).unwrap_or(LogLevel::Info)
    }

    /// Replaces `data_dir` when an override is present.
    pub fn with_data_dir_override(mut self, data_dir: Option<String>) -> Self {
        if let Some(dir) = data_dir.filter(|d| !d.trim().is_empty()) {
            self.data_dir = dir;
        }
        self
    }

    /// Applies `WILDMON_DATA_DIR` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Applies overrides looked up by environment variable name.
    pub fn with_overrides_from(self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        self.with_data_dir_override(lookup(DATA_DIR_ENV))
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::Parse(msg) => write!(f, "Failed to parse config file: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

pub fn parse_config(text: &str) -> Result<EngineConfig, ConfigError> {
    toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    parse_config(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.analysis.category_a, DAILY_RECORD);
        assert_eq!(config.analysis.top_n, 5);
        assert_eq!(config.cache_ttl(), chrono::Duration::hours(1));
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let config = parse_config(
            r#"
            data_dir = "/srv/cordoba"
            [sources]
            cameras = ""
            [analysis]
            top_n = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.analysis.top_n, 10);
        assert_eq!(config.analysis.category_b, SEQUENCES_RECORD);
        assert_eq!(config.cameras_location(), "");
        assert_eq!(
            config.citizen_science_location(),
            Path::new("/srv/cordoba").join("dataset_CSsources_mod.csv").display().to_string()
        );
    }

    #[test]
    fn test_remote_and_absolute_locations_are_not_joined() {
        let mut config = EngineConfig::default();
        config.sources.occurrences = "https://example.org/occ.geojson".to_string();
        config.sources.grid = "/abs/grid.geojson".to_string();
        assert_eq!(config.occurrences_location(), "https://example.org/occ.geojson");
        assert_eq!(config.grid_location(), "/abs/grid.geojson");
    }

    #[test]
    fn test_data_dir_override() {
        let config = EngineConfig::default().with_data_dir_override(Some("elsewhere".into()));
        assert_eq!(config.data_dir, "elsewhere");
        let config = config.with_data_dir_override(Some("  ".into()));
        assert_eq!(config.data_dir, "elsewhere");
    }

    #[test]
    fn test_overrides_read_only_the_given_lookup() {
        let config = EngineConfig::default()
            .with_overrides_from(|name| (name == DATA_DIR_ENV).then(|| "/srv/wildmon".to_string()));
        assert_eq!(config.data_dir, "/srv/wildmon");

        let config = EngineConfig::default().with_overrides_from(|_| None);
        assert_eq!(config.data_dir, EngineConfig::default().data_dir);
    }

    #[test]
    fn test_huge_cache_ttl_clamps_instead_of_panicking() {
        let config = parse_config("[cache]\nttl_seconds = 100000000000000000\n").unwrap();
        assert_eq!(config.cache_ttl(), chrono::Duration::MAX);

        let config = parse_config("[cache]\nttl_seconds = 90\n").unwrap();
        assert_eq!(config.cache_ttl(), chrono::Duration::seconds(90));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        assert!(matches!(parse_config("top_n = = 3"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_unknown_log_level_falls_back_to_info() {
        let config = parse_config("[logging]\nlevel = \"chatty\"\n").unwrap();
        assert_eq!(config.log_level(), LogLevel::Info);
    }
}
