//! Source Verification Module
//!
//! Checks every configured source before a report run: can it be read,
//! does it parse, and how many rows survive validation. Unlike the
//! `load_*` readers, which swallow failures, this keeps each error so it
//! can be shown to whoever maintains the data directory.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::ingest::cameras::parse_cameras;
use crate::ingest::citizen::parse_citizen_science;
use crate::ingest::grid::parse_grid;
use crate::ingest::occurrence::parse_occurrences;
use crate::ingest::{Parsed, read_and_parse};
use crate::logging::{self, SourceKind};
use crate::model::LoadError;

// ============================================================================
// Verification Results
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub timestamp: String,
    pub sources: Vec<SourceVerification>,
    pub summary: VerificationSummary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub total: usize,
    pub working: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceVerification {
    pub source: String,
    pub location: String,
    pub status: VerificationStatus,
    pub rows_read: usize,
    pub rows_kept: usize,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum VerificationStatus {
    Success,
    /// Readable, but some rows were dropped.
    PartialSuccess,
    Failed,
}

impl VerificationReport {
    pub fn find(&self, source: &str) -> Option<&SourceVerification> {
        self.sources.iter().find(|s| s.source == source)
    }
}

// ============================================================================
// Single-source Verification
// ============================================================================

fn verify_source<T>(
    kind: SourceKind,
    source: &str,
    location: &str,
    parse: impl FnOnce(&str) -> Result<Parsed<T>, LoadError>,
) -> SourceVerification {
    let mut result = SourceVerification {
        source: source.to_string(),
        location: location.to_string(),
        status: VerificationStatus::Failed,
        rows_read: 0,
        rows_kept: 0,
        error_message: None,
    };

    match read_and_parse(location, parse) {
        Ok(parsed) => {
            result.rows_read = parsed.rows_read;
            result.rows_kept = parsed.rows_kept;
            if parsed.rows_read > 0 && parsed.rows_kept == 0 {
                result.error_message = Some("every row was dropped".to_string());
            } else if parsed.rows_dropped() > 0 {
                result.status = VerificationStatus::PartialSuccess;
            } else {
                result.status = VerificationStatus::Success;
            }
        }
        Err(err) => {
            logging::log_load_failure(kind, location, &err);
            result.error_message = Some(err.to_string());
        }
    }

    result
}

// ============================================================================
// Full Verification Runner
// ============================================================================

pub fn verify_sources(config: &EngineConfig) -> VerificationReport {
    let cell_id_field = config.grid.cell_id_field.as_str();
    let sources = vec![
        verify_source(
            SourceKind::CitizenScience,
            "citizen_science",
            &config.citizen_science_location(),
            parse_citizen_science,
        ),
        verify_source(
            SourceKind::Occurrence,
            "occurrences",
            &config.occurrences_location(),
            parse_occurrences,
        ),
        verify_source(SourceKind::Grid, "grid", &config.grid_location(), |text| {
            parse_grid(text, cell_id_field)
        }),
        verify_source(
            SourceKind::Cameras,
            "cameras",
            &config.cameras_location(),
            parse_cameras,
        ),
    ];

    let mut summary = VerificationSummary {
        total: sources.len(),
        ..VerificationSummary::default()
    };
    for source in &sources {
        match source.status {
            VerificationStatus::Success | VerificationStatus::PartialSuccess => summary.working += 1,
            VerificationStatus::Failed => summary.failed += 1,
        }
    }

    VerificationReport {
        timestamp: Utc::now().to_rfc3339(),
        sources,
        summary,
    }
}

pub fn print_summary(report: &VerificationReport) {
    println!("\n═══════════════════════════════════════════════════════════");
    println!("📊 SOURCE VERIFICATION");
    println!("═══════════════════════════════════════════════════════════");
    println!();
    for source in &report.sources {
        match source.status {
            VerificationStatus::Success => {
                println!("  {:<16} ✓ OK ({} rows)", source.source, source.rows_kept);
            }
            VerificationStatus::PartialSuccess => {
                println!(
                    "  {:<16} ⚠ Partial ({}/{} rows kept)",
                    source.source, source.rows_kept, source.rows_read
                );
            }
            VerificationStatus::Failed => {
                println!(
                    "  {:<16} ✗ FAILED: {}",
                    source.source,
                    source.error_message.as_deref().unwrap_or("Unknown")
                );
            }
        }
    }
    println!();
    println!(
        "Sources: {}/{} working  ({} failed)",
        report.summary.working, report.summary.total, report.summary.failed
    );
    println!("═══════════════════════════════════════════════════════════");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreadable_sources_fail_with_message() {
        let mut config = EngineConfig::default();
        config.data_dir = "/no/such/dir".to_string();
        config.sources.cameras = String::new();

        let report = verify_sources(&config);
        assert_eq!(report.summary.total, 4);
        assert_eq!(report.summary.failed, 4);
        assert_eq!(report.summary.working, 0);

        let cameras = report.find("cameras").unwrap();
        assert_eq!(cameras.status, VerificationStatus::Failed);
        assert!(cameras.error_message.is_some());
    }

    #[test]
    fn test_dropped_rows_give_partial_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cs.csv");
        std::fs::write(
            &path,
            "Species.Name,Grid,Data.Source,Records\nVulpes vulpes,30SUG49,Daily Record,3\n,30SUG49,Daily Record,2\n",
        )
        .unwrap();

        let result = verify_source(
            SourceKind::CitizenScience,
            "citizen_science",
            &path.display().to_string(),
            parse_citizen_science,
        );
        assert_eq!(result.status, VerificationStatus::PartialSuccess);
        assert_eq!(result.rows_read, 2);
        assert_eq!(result.rows_kept, 1);
        assert_eq!(result.error_message, None);
    }
}
