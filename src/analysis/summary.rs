//! Dashboard-level summary metrics over a (possibly filtered) view.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::analysis::aggregate::{RankedTotal, aggregate_by, top_n};
use crate::analysis::filter::distinct_values;
use crate::model::{Dimension, SpeciesObservationRecord};

/// Default length of the top-species and top-grid lists.
pub const DEFAULT_TOP_N: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SummaryStats {
    pub total_records: u64,
    pub unique_species: usize,
    pub unique_grids: usize,
    pub unique_sources: usize,
    /// Distinct species per source.
    pub richness_by_source: BTreeMap<String, usize>,
    pub top_species: Vec<RankedTotal>,
    pub top_grids: Vec<RankedTotal>,
}

/// Summarizes `records`. An empty view yields zeros and empty
/// collections.
pub fn summarize(records: &[SpeciesObservationRecord], top: usize) -> SummaryStats {
    let richness_by_source = aggregate_by(records, Dimension::Source)
        .rows
        .into_iter()
        .map(|row| {
            let species = row.num_species.unwrap_or(0);
            (row.key, species)
        })
        .collect();

    SummaryStats {
        total_records: records.iter().fold(0, |acc, r| acc.saturating_add(r.record_count)),
        unique_species: distinct_values(records, Dimension::Species).len(),
        unique_grids: distinct_values(records, Dimension::Grid).len(),
        unique_sources: distinct_values(records, Dimension::Source).len(),
        richness_by_source,
        top_species: top_n(records, Dimension::Species, top),
        top_grids: top_n(records, Dimension::Grid, top),
    }
}
