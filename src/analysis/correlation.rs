//! Correlation between two source categories, with outlier sensitivity.
//!
//! Each entity (normally a species) gets its summed records under
//! category A and under category B; the two per-entity sums are
//! outer-joined and Pearson's r is computed over the paired columns.
//! The sensitivity variant drops the entity with the largest A sum and
//! recomputes r. Both values are always reported together.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{Dimension, SpeciesObservationRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrelationRow {
    pub entity: String,
    pub value_a: u64,
    pub value_b: u64,
}

/// One row per entity present in either category, ascending by entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrelationTable {
    pub entity_dimension: Dimension,
    pub category_a: String,
    pub category_b: String,
    pub rows: Vec<CorrelationRow>,
}

impl CorrelationTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, entity: &str) -> Option<&CorrelationRow> {
        self.rows.iter().find(|r| r.entity == entity)
    }

    fn columns(&self) -> (Vec<f64>, Vec<f64>) {
        self.rows
            .iter()
            .map(|r| (r.value_a as f64, r.value_b as f64))
            .unzip()
    }

    /// Pearson's r over the two columns.
    pub fn pearson_r(&self) -> f64 {
        let (a, b) = self.columns();
        pearson(&a, &b)
    }

    /// The entity with the largest category-A sum (lowest key on ties).
    pub fn max_entity_a(&self) -> Option<&CorrelationRow> {
        self.rows
            .iter()
            .reduce(|best, row| if row.value_a > best.value_a { row } else { best })
    }

    fn without(&self, entity: &str) -> CorrelationTable {
        CorrelationTable {
            entity_dimension: self.entity_dimension,
            category_a: self.category_a.clone(),
            category_b: self.category_b.clone(),
            rows: self.rows.iter().filter(|r| r.entity != entity).cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correlation {
    pub table: CorrelationTable,
    pub r: f64,
}

/// Full and single-outlier-excluded correlations, side by side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierSensitivity {
    pub full: Correlation,
    pub excluded_entity: Option<String>,
    pub reduced: Correlation,
    /// `reduced.r - full.r`
    pub delta: f64,
}

/// Qualitative strength of a correlation coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CorrelationStrength {
    Strong,
    Moderate,
    Weak,
}

impl CorrelationStrength {
    pub fn classify(r: f64) -> CorrelationStrength {
        let magnitude = r.abs();
        if magnitude > 0.7 {
            CorrelationStrength::Strong
        } else if magnitude > 0.4 {
            CorrelationStrength::Moderate
        } else {
            CorrelationStrength::Weak
        }
    }
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Pearson's correlation coefficient of two paired series.
///
/// Returns 0.0 when fewer than two pairs exist or when either series is
/// constant; neither case has a defined coefficient.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return 0.0;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return 0.0;
    }
    (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
}

// ---------------------------------------------------------------------------
// Correlation tables
// ---------------------------------------------------------------------------

fn sums_for_category<'a>(
    records: &'a [SpeciesObservationRecord],
    entity: Dimension,
    category: &str,
) -> BTreeMap<&'a str, u64> {
    let mut sums = BTreeMap::new();
    for record in records.iter().filter(|r| r.data_source == category) {
        if let Some(key) = record.key(entity) {
            let sum = sums.entry(key).or_insert(0u64);
            *sum = sum.saturating_add(record.record_count);
        }
    }
    sums
}

/// Builds the outer-joined per-entity table for two source categories.
pub fn correlation_table(
    records: &[SpeciesObservationRecord],
    entity: Dimension,
    category_a: &str,
    category_b: &str,
) -> CorrelationTable {
    let sums_a = sums_for_category(records, entity, category_a);
    let sums_b = sums_for_category(records, entity, category_b);

    let mut joined: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
    for (key, sum) in sums_a {
        joined.entry(key).or_default().0 = sum;
    }
    for (key, sum) in sums_b {
        joined.entry(key).or_default().1 = sum;
    }

    CorrelationTable {
        entity_dimension: entity,
        category_a: category_a.to_string(),
        category_b: category_b.to_string(),
        rows: joined
            .into_iter()
            .map(|(entity, (value_a, value_b))| CorrelationRow {
                entity: entity.to_string(),
                value_a,
                value_b,
            })
            .collect(),
    }
}

/// Per-entity correlation along any dimension.
pub fn correlate_by(
    records: &[SpeciesObservationRecord],
    entity: Dimension,
    category_a: &str,
    category_b: &str,
) -> Correlation {
    let table = correlation_table(records, entity, category_a, category_b);
    let r = table.pearson_r();
    Correlation { table, r }
}

/// Per-species correlation between two source categories.
pub fn correlate(records: &[SpeciesObservationRecord], category_a: &str, category_b: &str) -> Correlation {
    correlate_by(records, Dimension::Species, category_a, category_b)
}

/// Correlation with and without the species that dominates category A.
pub fn outlier_sensitivity(
    records: &[SpeciesObservationRecord],
    category_a: &str,
    category_b: &str,
) -> OutlierSensitivity {
    let full = correlate(records, category_a, category_b);
    let excluded_entity = full.table.max_entity_a().map(|row| row.entity.clone());

    let reduced_table = match &excluded_entity {
        Some(entity) => full.table.without(entity),
        None => full.table.clone(),
    };
    let reduced = Correlation {
        r: reduced_table.pearson_r(),
        table: reduced_table,
    };
    let delta = reduced.r - full.r;

    OutlierSensitivity {
        full,
        excluded_entity,
        reduced,
        delta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(species: &str, source: &str, n: u64) -> SpeciesObservationRecord {
        SpeciesObservationRecord::new(species, Some("G1"), source, n)
    }

    #[test]
    fn test_outer_join_fills_missing_side_with_zero() {
        let view = vec![obs("SpeciesX", "A", 5), obs("SpeciesX", "B", 3), obs("SpeciesY", "B", 2)];
        let result = correlate(&view, "A", "B");
        assert_eq!(
            result.table.rows,
            vec![
                CorrelationRow { entity: "SpeciesX".into(), value_a: 5, value_b: 3 },
                CorrelationRow { entity: "SpeciesY".into(), value_a: 0, value_b: 2 },
            ]
        );
        // [5, 0] vs [3, 2] is perfectly linear
        assert!((result.r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_other_categories_are_ignored() {
        let view = vec![obs("SpeciesX", "A", 5), obs("SpeciesZ", "C", 50)];
        let table = correlation_table(&view, Dimension::Species, "A", "B");
        assert_eq!(table.len(), 1);
        assert!(table.get("SpeciesZ").is_none());
    }

    #[test]
    fn test_fewer_than_two_entities_gives_zero() {
        assert_eq!(correlate(&[], "A", "B").r, 0.0);
        assert!(correlate(&[], "A", "B").table.is_empty());
        assert_eq!(correlate(&[obs("X", "A", 4)], "A", "B").r, 0.0);
    }

    #[test]
    fn test_pearson_known_values() {
        assert!((pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]) - 1.0).abs() < 1e-12);
        assert!((pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]) + 1.0).abs() < 1e-12);
        assert_eq!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), 0.0);
        // hand-computed: r = 0.8 for this pair
        let r = pearson(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 1.0, 4.0, 3.0, 5.0]);
        assert!((r - 0.8).abs() < 1e-12, "r was {}", r);
    }

    #[test]
    fn test_outlier_exclusion_drops_dominant_species() {
        let view = vec![
            obs("Oryctolagus cuniculus", "Daily Record", 400),
            obs("Oryctolagus cuniculus", "Sequences Record", 120),
            obs("Vulpes vulpes", "Daily Record", 10),
            obs("Vulpes vulpes", "Sequences Record", 14),
            obs("Meles meles", "Daily Record", 6),
            obs("Meles meles", "Sequences Record", 5),
            obs("Sus scrofa", "Daily Record", 2),
            obs("Sus scrofa", "Sequences Record", 9),
        ];
        let s = outlier_sensitivity(&view, "Daily Record", "Sequences Record");
        assert_eq!(s.excluded_entity.as_deref(), Some("Oryctolagus cuniculus"));
        assert_eq!(s.reduced.table.len(), s.full.table.len() - 1);
        assert!(s.reduced.table.get("Oryctolagus cuniculus").is_none());
        assert!((s.delta - (s.reduced.r - s.full.r)).abs() < 1e-12);
        assert!(s.full.r > 0.9, "a single dominant species drives r up, got {}", s.full.r);
        assert!(s.reduced.r < s.full.r);
    }

    #[test]
    fn test_max_entity_tie_resolves_to_lowest_key() {
        let view = vec![obs("B", "A", 5), obs("A", "A", 5), obs("C", "B", 1)];
        let table = correlation_table(&view, Dimension::Species, "A", "B");
        assert_eq!(table.max_entity_a().unwrap().entity, "A");
    }

    #[test]
    fn test_empty_sensitivity_has_no_excluded_entity() {
        let s = outlier_sensitivity(&[], "A", "B");
        assert_eq!(s.excluded_entity, None);
        assert!(s.reduced.table.is_empty());
        assert_eq!(s.delta, 0.0);
    }

    #[test]
    fn test_category_sums_saturate() {
        let view = vec![obs("X", "A", u64::MAX), obs("X", "A", 3), obs("Y", "B", 1)];
        let table = correlation_table(&view, Dimension::Species, "A", "B");
        assert_eq!(table.get("X").unwrap().value_a, u64::MAX);
    }

    #[test]
    fn test_strength_classification() {
        assert_eq!(CorrelationStrength::classify(0.85), CorrelationStrength::Strong);
        assert_eq!(CorrelationStrength::classify(-0.5), CorrelationStrength::Moderate);
        assert_eq!(CorrelationStrength::classify(0.4), CorrelationStrength::Weak);
    }
}
