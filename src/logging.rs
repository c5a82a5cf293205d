/// Structured logging for the observation engine
///
/// Provides context-rich logging tagged with the input kind and source
/// location, timestamps, and severity levels. Supports both console output
/// and file-based logging for batch report runs.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use crate::model::LoadError;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Parses a level name as written in configuration files.
    pub fn parse(name: &str) -> Option<LogLevel> {
        match name.trim().to_ascii_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warning),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Source Kinds
// ---------------------------------------------------------------------------

/// Which input (or engine component) a log line concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    CitizenScience,
    Occurrence,
    Grid,
    Cameras,
    Cache,
    System,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::CitizenScience => write!(f, "CS"),
            SourceKind::Occurrence => write!(f, "OCC"),
            SourceKind::Grid => write!(f, "GRID"),
            SourceKind::Cameras => write!(f, "CAM"),
            SourceKind::Cache => write!(f, "CACHE"),
            SourceKind::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - optional source not provided
    Expected,
    /// Unexpected failure - broken file, schema drift or unreachable host
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn log(&self, level: LogLevel, source: SourceKind, location: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let location_part = location.map(|s| format!(" [{}]", s)).unwrap_or_default();
        let log_entry = format!(
            "{} {} {}{}: {}",
            timestamp, level, source, location_part, message
        );

        if self.console_timestamps {
            match level {
                LogLevel::Error => eprintln!("{}", log_entry),
                LogLevel::Warning => eprintln!("   {}", log_entry),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}", message),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", source, location_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", source, location_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => {}
            }
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn dispatch(level: LogLevel, source: SourceKind, location: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, source, location, message);
        }
    }
}

/// Log a general informational message
pub fn info(source: SourceKind, location: Option<&str>, message: &str) {
    dispatch(LogLevel::Info, source, location, message);
}

/// Log a warning message
pub fn warn(source: SourceKind, location: Option<&str>, message: &str) {
    dispatch(LogLevel::Warning, source, location, message);
}

/// Log an error message
pub fn error(source: SourceKind, location: Option<&str>, message: &str) {
    dispatch(LogLevel::Error, source, location, message);
}

/// Log a debug message
pub fn debug(source: SourceKind, location: Option<&str>, message: &str) {
    dispatch(LogLevel::Debug, source, location, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a source load failure.
///
/// An empty location means the source was never configured, which is a
/// normal deployment (e.g. no camera file). Everything that points at a
/// broken or drifting input is unexpected.
pub fn classify_load_failure(location: &str, err: &LoadError) -> FailureType {
    if location.trim().is_empty() {
        return FailureType::Expected;
    }
    match err {
        LoadError::Http(_) | LoadError::Parse(_) | LoadError::UnsupportedCrs(_) => {
            FailureType::Unexpected
        }
        e if e.is_schema_violation() => FailureType::Unexpected,
        // a missing file may be a typo or a source that is simply not deployed
        LoadError::Io { .. } => FailureType::Unknown,
        _ => FailureType::Unknown,
    }
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log a source load failure with automatic classification. This is the
/// reader boundary's `DataLoadError` signal.
pub fn log_load_failure(source: SourceKind, location: &str, err: &LoadError) {
    let failure_type = classify_load_failure(location, err);
    let message = format!("load failed [{}]: {}", failure_type, err);

    match failure_type {
        FailureType::Expected => debug(source, Some(location), &message),
        FailureType::Unexpected => error(source, Some(location), &message),
        FailureType::Unknown => warn(source, Some(location), &message),
    }
}

// ---------------------------------------------------------------------------
// Load Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of one reader's row accounting
pub fn log_load_summary(source: SourceKind, location: &str, read: usize, kept: usize) {
    let dropped = read.saturating_sub(kept);
    let message = format!(
        "Load complete: {}/{} rows kept, {} dropped",
        kept, read, dropped
    );

    if dropped == 0 {
        info(source, Some(location), &message);
    } else if kept == 0 {
        error(source, Some(location), &message);
    } else {
        warn(source, Some(location), &message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("WARN"), Some(LogLevel::Warning));
        assert_eq!(LogLevel::parse(" debug "), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("verbose"), None);
    }

    #[test]
    fn test_failure_classification() {
        let schema = LoadError::MissingColumns(vec!["Records".to_string()]);
        assert_eq!(classify_load_failure("data/cs.csv", &schema), FailureType::Unexpected);

        let http = LoadError::Http(503);
        assert_eq!(classify_load_failure("https://example.org/x.csv", &http), FailureType::Unexpected);

        let missing = LoadError::Io {
            location: "data/locCam3.csv".to_string(),
            message: "file not found".to_string(),
        };
        assert_eq!(classify_load_failure("data/locCam3.csv", &missing), FailureType::Unknown);
        assert_eq!(classify_load_failure("", &missing), FailureType::Expected);
    }
}
