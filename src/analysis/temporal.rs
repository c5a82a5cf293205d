//! Temporal and taxonomic breakdowns of the historical occurrence layer.
//!
//! Occurrences without a year are left out of every per-year series;
//! occurrences without a value at the requested rank are left out of the
//! per-taxon breakdowns.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::analysis::aggregate::{RankedTotal, sort_by_total_then_key};
use crate::model::{GeoOccurrenceRecord, TaxonRank};

/// Records observed in one year, and the running total up to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearCount {
    pub year: i32,
    pub records: usize,
    pub cumulative: usize,
}

/// The accumulation curve of one taxon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxonAccumulation {
    pub taxon: String,
    pub years: Vec<YearCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OccurrenceOverview {
    pub total_records: usize,
    pub distinct_genera: usize,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
    pub distinct_institutions: usize,
}

fn accumulate(years: impl Iterator<Item = i32>) -> Vec<YearCount> {
    let mut per_year: BTreeMap<i32, usize> = BTreeMap::new();
    for year in years {
        *per_year.entry(year).or_insert(0) += 1;
    }
    let mut cumulative = 0;
    per_year
        .into_iter()
        .map(|(year, records)| {
            cumulative += records;
            YearCount { year, records, cumulative }
        })
        .collect()
}

/// Records per year, ascending, with the cumulative count.
pub fn yearly_counts(occurrences: &[GeoOccurrenceRecord]) -> Vec<YearCount> {
    accumulate(occurrences.iter().filter_map(|o| o.year))
}

/// One accumulation curve per taxon at `rank`, ordered by taxon name.
pub fn accumulation_by_rank(occurrences: &[GeoOccurrenceRecord], rank: TaxonRank) -> Vec<TaxonAccumulation> {
    let mut by_taxon: BTreeMap<&str, Vec<i32>> = BTreeMap::new();
    for occurrence in occurrences {
        if let (Some(taxon), Some(year)) = (occurrence.taxon(rank), occurrence.year) {
            by_taxon.entry(taxon).or_default().push(year);
        }
    }
    by_taxon
        .into_iter()
        .map(|(taxon, years)| TaxonAccumulation {
            taxon: taxon.to_string(),
            years: accumulate(years.into_iter()),
        })
        .collect()
}

/// Occurrence counts per taxon at `rank`, most frequent first.
pub fn rank_counts(occurrences: &[GeoOccurrenceRecord], rank: TaxonRank) -> Vec<RankedTotal> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for taxon in occurrences.iter().filter_map(|o| o.taxon(rank)) {
        *counts.entry(taxon).or_insert(0) += 1;
    }
    let mut ranked: Vec<RankedTotal> = counts
        .into_iter()
        .map(|(key, total_records)| RankedTotal {
            key: key.to_string(),
            total_records,
        })
        .collect();
    sort_by_total_then_key(&mut ranked, |r| r.total_records, |r| r.key.as_str());
    ranked
}

pub fn occurrence_overview(occurrences: &[GeoOccurrenceRecord]) -> OccurrenceOverview {
    let genera: BTreeSet<&str> = occurrences.iter().filter_map(|o| o.genus.as_deref()).collect();
    let institutions: BTreeSet<&str> = occurrences
        .iter()
        .filter_map(|o| o.institution.as_deref())
        .collect();
    let years = occurrences.iter().filter_map(|o| o.year);

    OccurrenceOverview {
        total_records: occurrences.len(),
        distinct_genera: genera.len(),
        first_year: years.clone().min(),
        last_year: years.max(),
        distinct_institutions: institutions.len(),
    }
}
