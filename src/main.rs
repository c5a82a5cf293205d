use std::path::Path;
use std::process::ExitCode;

use serde::Serialize;

use wildmon_engine::analysis::aggregate::{AggregationResult, aggregate_by};
use wildmon_engine::analysis::correlation::{CorrelationStrength, OutlierSensitivity, outlier_sensitivity};
use wildmon_engine::analysis::filter::ObservationFilter;
use wildmon_engine::analysis::summary::{SummaryStats, summarize};
use wildmon_engine::analysis::temporal::{OccurrenceOverview, occurrence_overview};
use wildmon_engine::cache::SourceCache;
use wildmon_engine::config::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH, EngineConfig, load_config};
use wildmon_engine::dataset::Dataset;
use wildmon_engine::logging::{self, SourceKind};
use wildmon_engine::model::Dimension;
use wildmon_engine::spatial::join::{CellCounts, count_by_cell};
use wildmon_engine::verify::{print_summary, verify_sources};

#[derive(Serialize)]
struct Report {
    summary: SummaryStats,
    by_species: AggregationResult,
    by_grid: AggregationResult,
    by_source: AggregationResult,
    correlation: OutlierSensitivity,
    correlation_strength: CorrelationStrength,
    reduced_correlation_strength: CorrelationStrength,
    occurrences: OccurrenceOverview,
    occurrences_per_cell: CellCounts,
    cameras_per_cell: CellCounts,
}

fn config_path() -> String {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let path = config_path();
    let config = if Path::new(&path).exists() {
        match load_config(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}: {}", path, e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        EngineConfig::default()
    }
    .with_env_overrides();

    logging::init_logger(
        config.log_level(),
        config.logging.file.as_deref(),
        config.logging.console_timestamps,
    );
    logging::info(SourceKind::System, Some(&path), "starting report run");

    let verification = verify_sources(&config);
    print_summary(&verification);

    let cache = SourceCache::new();
    let dataset = Dataset::load(&config, &cache);
    let view = dataset.view(&ObservationFilter::new());

    let correlation = outlier_sensitivity(&view, &config.analysis.category_a, &config.analysis.category_b);
    let report = Report {
        summary: summarize(&view, config.analysis.top_n),
        by_species: aggregate_by(&view, Dimension::Species),
        by_grid: aggregate_by(&view, Dimension::Grid),
        by_source: aggregate_by(&view, Dimension::Source),
        correlation_strength: CorrelationStrength::classify(correlation.full.r),
        reduced_correlation_strength: CorrelationStrength::classify(correlation.reduced.r),
        correlation,
        occurrences: occurrence_overview(&dataset.occurrences.features),
        occurrences_per_cell: count_by_cell(&dataset.occurrences_on_grid()),
        cameras_per_cell: count_by_cell(&dataset.cameras_on_grid()),
    };

    match serde_json::to_string_pretty(&report) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            logging::error(SourceKind::System, None, &format!("could not encode report: {}", e));
            ExitCode::FAILURE
        }
    }
}
