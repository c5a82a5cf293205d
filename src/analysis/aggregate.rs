//! Grouped aggregation of citizen-science observations.
//!
//! Rows are always ordered by `total_records` descending, ties broken by
//! group key ascending, so results are deterministic.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::model::{Dimension, SpeciesObservationRecord};

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// One group of an aggregation. Exactly two of the three `num_*` fields
/// are set: the distinct counts of the dimensions other than the grouped
/// one, measured within the group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregationRow {
    pub key: String,
    pub total_records: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_species: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_grids: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_sources: Option<usize>,
}

impl AggregationRow {
    pub fn distinct(&self, dimension: Dimension) -> Option<usize> {
        match dimension {
            Dimension::Species => self.num_species,
            Dimension::Grid => self.num_grids,
            Dimension::Source => self.num_sources,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregationResult {
    pub dimension: Dimension,
    pub rows: Vec<AggregationRow>,
}

impl AggregationResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&AggregationRow> {
        self.rows.iter().find(|r| r.key == key)
    }

    pub fn total_records(&self) -> u64 {
        self.rows.iter().fold(0, |acc, r| acc.saturating_add(r.total_records))
    }
}

/// A key with its summed record count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedTotal {
    pub key: String,
    pub total_records: u64,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[derive(Default)]
struct GroupAccumulator<'a> {
    total: u64,
    distinct: [BTreeSet<&'a str>; 2],
}

pub(crate) fn sort_by_total_then_key<T>(items: &mut [T], total: impl Fn(&T) -> u64, key: impl Fn(&T) -> &str) {
    items.sort_by(|a, b| total(b).cmp(&total(a)).then_with(|| key(a).cmp(key(b))));
}

/// Groups `records` by `dimension` and computes per-group totals and
/// distinct counts of the other two dimensions.
///
/// Totals saturate at `u64::MAX` rather than overflow.
///
/// Records without a key for `dimension` (no grid id) are left out of a
/// grid aggregation; absent values are never counted as distinct.
pub fn aggregate_by(records: &[SpeciesObservationRecord], dimension: Dimension) -> AggregationResult {
    let others = dimension.others();
    let mut groups: BTreeMap<&str, GroupAccumulator> = BTreeMap::new();

    for record in records {
        let Some(key) = record.key(dimension) else {
            continue;
        };
        let group = groups.entry(key).or_default();
        group.total = group.total.saturating_add(record.record_count);
        for (set, other) in group.distinct.iter_mut().zip(others) {
            if let Some(value) = record.key(other) {
                set.insert(value);
            }
        }
    }

    let mut rows: Vec<AggregationRow> = groups
        .into_iter()
        .map(|(key, group)| {
            let mut row = AggregationRow {
                key: key.to_string(),
                total_records: group.total,
                num_species: None,
                num_grids: None,
                num_sources: None,
            };
            for (set, other) in group.distinct.iter().zip(others) {
                let count = Some(set.len());
                match other {
                    Dimension::Species => row.num_species = count,
                    Dimension::Grid => row.num_grids = count,
                    Dimension::Source => row.num_sources = count,
                }
            }
            row
        })
        .collect();

    sort_by_total_then_key(&mut rows, |r| r.total_records, |r| r.key.as_str());
    AggregationResult { dimension, rows }
}

/// Summed record counts per key along `dimension`, ranked.
pub fn ranked_totals(records: &[SpeciesObservationRecord], dimension: Dimension) -> Vec<RankedTotal> {
    let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
    for record in records {
        if let Some(key) = record.key(dimension) {
            let total = totals.entry(key).or_insert(0);
            *total = total.saturating_add(record.record_count);
        }
    }
    let mut ranked: Vec<RankedTotal> = totals
        .into_iter()
        .map(|(key, total_records)| RankedTotal {
            key: key.to_string(),
            total_records,
        })
        .collect();
    sort_by_total_then_key(&mut ranked, |r| r.total_records, |r| r.key.as_str());
    ranked
}

/// The `n` keys with the greatest summed records.
pub fn top_n(records: &[SpeciesObservationRecord], dimension: Dimension, n: usize) -> Vec<RankedTotal> {
    let mut ranked = ranked_totals(records, dimension);
    ranked.truncate(n);
    ranked
}

// ---------------------------------------------------------------------------
// Cross tabulation
// ---------------------------------------------------------------------------

/// Summed records for the top row keys broken down by column key, e.g.
/// species × grid for a heat map or species × source for stacked bars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossTab {
    pub row_dimension: Dimension,
    pub column_dimension: Dimension,
    /// Row keys, ranked by total.
    pub rows: Vec<String>,
    /// Column keys, ascending.
    pub columns: Vec<String>,
    /// `cells[r][c]` is the total for `rows[r]` × `columns[c]`.
    pub cells: Vec<Vec<u64>>,
}

impl CrossTab {
    pub fn value(&self, row: &str, column: &str) -> Option<u64> {
        let r = self.rows.iter().position(|k| k == row)?;
        let c = self.columns.iter().position(|k| k == column)?;
        Some(self.cells[r][c])
    }
}

pub fn cross_tab(
    records: &[SpeciesObservationRecord],
    row_dimension: Dimension,
    column_dimension: Dimension,
    top_rows: usize,
) -> CrossTab {
    let rows: Vec<String> = top_n(records, row_dimension, top_rows)
        .into_iter()
        .map(|r| r.key)
        .collect();

    let mut sums: BTreeMap<(&str, &str), u64> = BTreeMap::new();
    let mut columns: BTreeSet<&str> = BTreeSet::new();
    for record in records {
        let (Some(row), Some(col)) = (record.key(row_dimension), record.key(column_dimension)) else {
            continue;
        };
        if !rows.iter().any(|r| r == row) {
            continue;
        }
        columns.insert(col);
        let sum = sums.entry((row, col)).or_insert(0);
        *sum = sum.saturating_add(record.record_count);
    }

    let columns: Vec<String> = columns.into_iter().map(String::from).collect();
    let cells = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|col| sums.get(&(row.as_str(), col.as_str())).copied().unwrap_or(0))
                .collect()
        })
        .collect();

    CrossTab {
        row_dimension,
        column_dimension,
        rows,
        columns,
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(species: &str, grid: Option<&str>, source: &str, n: u64) -> SpeciesObservationRecord {
        SpeciesObservationRecord::new(species, grid, source, n)
    }

    #[test]
    fn test_species_aggregation_counts_other_dimensions_within_group() {
        let view = vec![
            obs("SpeciesX", Some("Grid1"), "SourceA", 5),
            obs("SpeciesX", Some("Grid2"), "SourceB", 3),
        ];
        let result = aggregate_by(&view, Dimension::Species);
        assert_eq!(
            result.rows,
            vec![AggregationRow {
                key: "SpeciesX".to_string(),
                total_records: 8,
                num_species: None,
                num_grids: Some(2),
                num_sources: Some(2),
            }]
        );
    }

    #[test]
    fn test_rows_sorted_by_total_then_key() {
        let view = vec![
            obs("B", Some("G1"), "S", 4),
            obs("A", Some("G1"), "S", 4),
            obs("C", Some("G1"), "S", 9),
        ];
        let keys: Vec<_> = aggregate_by(&view, Dimension::Species)
            .rows
            .into_iter()
            .map(|r| r.key)
            .collect();
        assert_eq!(keys, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_grid_aggregation_skips_missing_grid() {
        let view = vec![obs("A", None, "S", 4), obs("B", Some("G1"), "S", 2)];
        let result = aggregate_by(&view, Dimension::Grid);
        assert_eq!(result.len(), 1);
        assert_eq!(result.rows[0].num_species, Some(1));
        assert_eq!(result.rows[0].num_sources, Some(1));

        // species grouping still counts A's records, just not a grid for it
        let by_species = aggregate_by(&view, Dimension::Species);
        assert_eq!(by_species.get("A").unwrap().num_grids, Some(0));
    }

    #[test]
    fn test_empty_input_yields_empty_result() {
        for dim in Dimension::ALL {
            let result = aggregate_by(&[], dim);
            assert!(result.is_empty());
            assert_eq!(result.dimension, dim);
        }
    }

    #[test]
    fn test_top_n_truncates_and_breaks_ties_by_key() {
        let view = vec![
            obs("Z", None, "S", 1),
            obs("Y", None, "S", 1),
            obs("X", None, "S", 7),
        ];
        let top = top_n(&view, Dimension::Species, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].key, "X");
        assert_eq!(top[1].key, "Y");
    }

    #[test]
    fn test_cross_tab_limits_rows_and_fills_zeros() {
        let view = vec![
            obs("Vulpes", Some("G1"), "Daily Record", 3),
            obs("Vulpes", Some("G2"), "Daily Record", 1),
            obs("Meles", Some("G2"), "Sequences Record", 2),
            obs("Genetta", Some("G3"), "Daily Record", 1),
        ];
        let tab = cross_tab(&view, Dimension::Species, Dimension::Grid, 2);
        assert_eq!(tab.rows, vec!["Vulpes", "Meles"]);
        assert_eq!(tab.columns, vec!["G1", "G2"]);
        assert_eq!(tab.value("Vulpes", "G1"), Some(3));
        assert_eq!(tab.value("Meles", "G1"), Some(0));
        assert_eq!(tab.value("Genetta", "G3"), None);
    }

    #[test]
    fn test_totals_saturate_instead_of_overflowing() {
        let view = vec![
            obs("Vulpes", Some("G1"), "Daily Record", u64::MAX - 1),
            obs("Vulpes", Some("G1"), "Daily Record", u64::MAX - 1),
            obs("Meles", Some("G1"), "Daily Record", 5),
        ];
        let result = aggregate_by(&view, Dimension::Grid);
        assert_eq!(result.get("G1").unwrap().total_records, u64::MAX);
        assert_eq!(result.total_records(), u64::MAX);
        assert_eq!(aggregate_by(&view, Dimension::Species).total_records(), u64::MAX);

        assert_eq!(top_n(&view, Dimension::Species, 1)[0].total_records, u64::MAX);
        let tab = cross_tab(&view, Dimension::Species, Dimension::Grid, 2);
        assert_eq!(tab.value("Vulpes", "G1"), Some(u64::MAX));
    }
}
