//! Conjunctive filtering of citizen-science observations.
//!
//! A filter holds at most one equality constraint per dimension plus an
//! inclusive minimum count. An absent constraint is `None`; the UI's
//! "All" choice is mapped to `None` at the boundary by [`selection`].

use std::collections::BTreeSet;

use crate::model::{Dimension, SpeciesObservationRecord};

/// The choice a selector shows for "no constraint".
pub const ALL_SELECTION: &str = "All";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservationFilter {
    pub species: Option<String>,
    pub grid: Option<String>,
    pub source: Option<String>,
    /// Inclusive lower bound on `record_count`. 0 constrains nothing.
    pub min_records: u64,
}

/// Maps a selector choice to a constraint: blank or "All" means none.
pub fn selection(choice: &str) -> Option<String> {
    let choice = choice.trim();
    if choice.is_empty() || choice == ALL_SELECTION {
        None
    } else {
        Some(choice.to_string())
    }
}

impl ObservationFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a filter from raw selector choices.
    pub fn from_selection(species: &str, grid: &str, source: &str, min_records: u64) -> Self {
        Self {
            species: selection(species),
            grid: selection(grid),
            source: selection(source),
            min_records,
        }
    }

    pub fn species(mut self, species: impl Into<String>) -> Self {
        self.species = Some(species.into());
        self
    }

    pub fn grid(mut self, grid: impl Into<String>) -> Self {
        self.grid = Some(grid.into());
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn min_records(mut self, min_records: u64) -> Self {
        self.min_records = min_records;
        self
    }

    pub fn is_unconstrained(&self) -> bool {
        self.species.is_none() && self.grid.is_none() && self.source.is_none() && self.min_records == 0
    }

    fn constraint(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Species => self.species.as_deref(),
            Dimension::Grid => self.grid.as_deref(),
            Dimension::Source => self.source.as_deref(),
        }
    }

    /// True when `record` satisfies every constraint.
    pub fn matches(&self, record: &SpeciesObservationRecord) -> bool {
        let dimensions_match = Dimension::ALL.iter().all(|&dim| match self.constraint(dim) {
            None => true,
            Some(wanted) => record.key(dim) == Some(wanted),
        });
        dimensions_match && record.record_count >= self.min_records
    }
}

/// Returns a new table with the records matching `filter`. The input is
/// only read.
pub fn filter_observations(
    records: &[SpeciesObservationRecord],
    filter: &ObservationFilter,
) -> Vec<SpeciesObservationRecord> {
    records.iter().filter(|r| filter.matches(r)).cloned().collect()
}

/// Sorted distinct values present along `dimension` (selector options).
pub fn distinct_values(records: &[SpeciesObservationRecord], dimension: Dimension) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| r.key(dimension))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect()
}
