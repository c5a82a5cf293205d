/// Tabular citizen-science reader.
///
/// Input is a comma-delimited export with one row per (species, grid,
/// source) count. Column names follow the published dataset
/// (`Species.Name`, `Grid`, `Data.Source`, `Records`); snake_case
/// equivalents are accepted too.

use crate::ingest::delimited::{cell, coerce_count, parse_delimited};
use crate::ingest::{Parsed, load_or_empty};
use crate::logging::{self, SourceKind};
use crate::model::{LoadError, SpeciesObservationRecord, UNKNOWN_SOURCE};
use crate::sources;

const SPECIES_COLUMNS: &[&str] = &["Species.Name", "species_name"];
const GRID_COLUMNS: &[&str] = &["Grid", "grid_id"];
const SOURCE_COLUMNS: &[&str] = &["Data.Source", "data_source"];
const RECORDS_COLUMNS: &[&str] = &["Records", "record_count"];

/// Parses citizen-science CSV text.
///
/// Rows with an empty species or an empty count cell are dropped; a count
/// cell that is present but invalid becomes 0.
pub fn parse_citizen_science(text: &str) -> Result<Parsed<Vec<SpeciesObservationRecord>>, LoadError> {
    let table = parse_delimited(text, ',')?;
    let columns =
        table.require_columns(&[SPECIES_COLUMNS, GRID_COLUMNS, SOURCE_COLUMNS, RECORDS_COLUMNS])?;
    let (species_col, grid_col, source_col, records_col) =
        (columns[0], columns[1], columns[2], columns[3]);

    let records: Vec<SpeciesObservationRecord> = table
        .rows
        .iter()
        .filter_map(|row| {
            let species = cell(row, species_col)?;
            let count = coerce_count(cell(row, records_col)?);
            Some(SpeciesObservationRecord {
                species_name: species.to_string(),
                grid_id: cell(row, grid_col).map(String::from),
                data_source: cell(row, source_col).unwrap_or(UNKNOWN_SOURCE).to_string(),
                record_count: count,
            })
        })
        .collect();

    Ok(Parsed {
        rows_read: table.rows.len(),
        rows_kept: records.len(),
        value: records,
    })
}

/// Loads the citizen-science table from `location`. Never fails; see
/// the module docs of `ingest`.
pub fn load_citizen_science(location: &str) -> Vec<SpeciesObservationRecord> {
    let records = load_or_empty(SourceKind::CitizenScience, location, Vec::new, parse_citizen_science);
    flag_unrecognised_sources(location, &records);
    records
}

fn flag_unrecognised_sources(location: &str, records: &[SpeciesObservationRecord]) {
    let mut unknown: Vec<&str> = records
        .iter()
        .map(|r| r.data_source.as_str())
        .filter(|s| !sources::is_known_source(s))
        .collect();
    unknown.sort_unstable();
    unknown.dedup();
    for label in unknown {
        logging::debug(
            SourceKind::CitizenScience,
            Some(location),
            &format!("unrecognised data source label '{}'", label),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Species.Name,Grid,Data.Source,Records
Oryctolagus cuniculus,30SUG40,Daily Record,41
Vulpes vulpes,30SUG40,Sequences Record,3
Meles meles,,Global Biodiversity,2
,30SUG41,Daily Record,5
Genetta genetta,30SUG41,Daily Record,
Sus scrofa,30SUG41,No Validation,lots
Lynx pardinus,30SUG42,,0
";

    #[test]
    fn test_parses_valid_rows_and_drops_incomplete_ones() {
        let parsed = parse_citizen_science(SAMPLE).unwrap();
        assert_eq!(parsed.rows_read, 7);
        assert_eq!(parsed.rows_kept, 5);
        assert_eq!(parsed.rows_dropped(), 2);

        let names: Vec<_> = parsed.value.iter().map(|r| r.species_name.as_str()).collect();
        assert!(!names.contains(&"Genetta genetta"), "row without a count must be dropped");
        assert!(names.iter().all(|n| !n.is_empty()), "row without a species must be dropped");
    }

    #[test]
    fn test_missing_grid_is_absent_not_empty() {
        let parsed = parse_citizen_science(SAMPLE).unwrap();
        let meles = parsed.value.iter().find(|r| r.species_name == "Meles meles").unwrap();
        assert_eq!(meles.grid_id, None);
    }

    #[test]
    fn test_invalid_count_is_coerced_to_zero_and_zero_is_kept() {
        let parsed = parse_citizen_science(SAMPLE).unwrap();
        let sus = parsed.value.iter().find(|r| r.species_name == "Sus scrofa").unwrap();
        assert_eq!(sus.record_count, 0);
        let lynx = parsed.value.iter().find(|r| r.species_name == "Lynx pardinus").unwrap();
        assert_eq!(lynx.record_count, 0);
        assert_eq!(lynx.data_source, UNKNOWN_SOURCE);
    }

    #[test]
    fn test_out_of_range_counts_become_zero_and_aggregate() {
        let text = "Species.Name,Grid,Data.Source,Records\n\
Vulpes vulpes,G1,Daily Record,1e20\n\
Vulpes vulpes,G1,Daily Record,1e20\n\
Vulpes vulpes,G1,Daily Record,2\n";
        let parsed = parse_citizen_science(text).unwrap();
        assert_eq!(parsed.rows_kept, 3);
        assert_eq!(parsed.value[0].record_count, 0);

        let totals = crate::analysis::aggregate::aggregate_by(&parsed.value, crate::model::Dimension::Grid);
        assert_eq!(totals.get("G1").unwrap().total_records, 2);
    }

    #[test]
    fn test_snake_case_headers_are_accepted() {
        let text = "species_name,grid_id,data_source,record_count\nVulpes vulpes,G1,Daily Record,4\n";
        let parsed = parse_citizen_science(text).unwrap();
        assert_eq!(parsed.value, vec![SpeciesObservationRecord::new("Vulpes vulpes", Some("G1"), "Daily Record", 4)]);
    }

    #[test]
    fn test_missing_required_column_rejects_file() {
        let text = "Species.Name,Grid,Records\nVulpes vulpes,G1,4\n";
        let err = parse_citizen_science(text).unwrap_err();
        assert_eq!(err, LoadError::MissingColumns(vec!["Data.Source".to_string()]));
    }

    #[test]
    fn test_load_of_missing_file_returns_empty_table() {
        assert!(load_citizen_science("/no/such/dataset_CSsources_mod.csv").is_empty());
    }
}
