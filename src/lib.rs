//! Normalization, filtering, aggregation and spatial-join engine for
//! wildlife monitoring datasets.
//!
//! Sources are read by `ingest`, bundled by `dataset::Dataset` through a
//! `cache::SourceCache`, and analysed by `analysis` and `spatial::join`.
//! Readers never fail outward; every analysis is total over empty input.

pub mod analysis;
pub mod cache;
pub mod config;
pub mod dataset;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod sources;
pub mod spatial;
pub mod verify;

pub use analysis::aggregate::{AggregationResult, AggregationRow, aggregate_by, top_n};
pub use analysis::correlation::{Correlation, CorrelationTable, OutlierSensitivity, correlate, outlier_sensitivity};
pub use analysis::filter::{ObservationFilter, filter_observations};
pub use analysis::summary::{SummaryStats, summarize};
pub use cache::SourceCache;
pub use config::EngineConfig;
pub use dataset::Dataset;
pub use model::{
    CameraSite, Dimension, GeoOccurrenceRecord, GridCell, GridLayer, LoadError, PointLayer,
    SpeciesObservationRecord,
};
pub use spatial::crs::Crs;
pub use spatial::join::{AssignedPoint, assign_to_grid};
