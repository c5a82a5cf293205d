/// Historical occurrence reader (GBIF-style point export).
///
/// Each feature is one occurrence with a point geometry and taxonomic,
/// temporal and institutional attributes. Features without a usable
/// point are dropped; the rest of the file is kept.

use crate::ingest::geojson::{parse_feature_collection, point_coord, property_string, property_year};
use crate::ingest::{Parsed, load_or_empty};
use crate::logging::SourceKind;
use crate::model::{GeoOccurrenceRecord, LoadError, PointLayer};
use crate::spatial::crs::Crs;

const SPECIES_PROPS: &[&str] = &["species", "scientificName", "Species.Name"];
const GENUS_PROPS: &[&str] = &["genus"];
const FAMILY_PROPS: &[&str] = &["family"];
const ORDER_PROPS: &[&str] = &["order"];
const YEAR_PROPS: &[&str] = &["year"];
const INSTITUTION_PROPS: &[&str] = &["institution", "institut_1", "institutionCode"];
const GRID_PROPS: &[&str] = &["CUADRICULA", "Grid"];

pub fn parse_occurrences(text: &str) -> Result<Parsed<PointLayer<GeoOccurrenceRecord>>, LoadError> {
    let collection = parse_feature_collection(text)?;
    let rows_read = collection.features.len();

    let records: Vec<GeoOccurrenceRecord> = collection
        .features
        .iter()
        .filter_map(|feature| {
            let coord = point_coord(feature.geometry.as_ref()?).ok()?;
            let mut record = GeoOccurrenceRecord::at(coord.x, coord.y);
            if let Some(props) = &feature.properties {
                record.species = property_string(props, SPECIES_PROPS);
                record.genus = property_string(props, GENUS_PROPS);
                record.family = property_string(props, FAMILY_PROPS);
                record.order = property_string(props, ORDER_PROPS);
                record.year = property_year(props, YEAR_PROPS);
                record.institution = property_string(props, INSTITUTION_PROPS);
                record.source_grid = property_string(props, GRID_PROPS);
            }
            Some(record)
        })
        .collect();

    Ok(Parsed {
        rows_read,
        rows_kept: records.len(),
        value: PointLayer::new(collection.crs, records),
    })
}

/// Loads the occurrence layer from `location`. Never fails.
pub fn load_occurrences(location: &str) -> PointLayer<GeoOccurrenceRecord> {
    load_or_empty(
        SourceKind::Occurrence,
        location,
        || PointLayer::empty(Crs::WGS84),
        parse_occurrences,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type":"Feature","geometry":{"type":"Point","coordinates":[-4.78,37.89]},
             "properties":{"genus":"Vulpes","family":"Canidae","order":"Carnivora",
                           "year":2012,"institut_1":"iNaturalist","CUADRICULA":"30SUG49"}},
            {"type":"Feature","geometry":null,"properties":{"genus":"Meles"}},
            {"type":"Feature","geometry":{"type":"Point","coordinates":[-4.5]},"properties":{}},
            {"type":"Feature","geometry":{"type":"Point","coordinates":[-4.6,38.0]}}
        ]
    }"#;

    #[test]
    fn test_features_without_coordinates_are_dropped() {
        let parsed = parse_occurrences(SAMPLE).unwrap();
        assert_eq!(parsed.rows_read, 4);
        assert_eq!(parsed.rows_kept, 2);
        assert_eq!(parsed.value.crs, Crs::WGS84);
    }

    #[test]
    fn test_attributes_are_mapped() {
        let parsed = parse_occurrences(SAMPLE).unwrap();
        let fox = &parsed.value.features[0];
        assert_eq!(fox.longitude, -4.78);
        assert_eq!(fox.latitude, 37.89);
        assert_eq!(fox.genus.as_deref(), Some("Vulpes"));
        assert_eq!(fox.order.as_deref(), Some("Carnivora"));
        assert_eq!(fox.year, Some(2012));
        assert_eq!(fox.institution.as_deref(), Some("iNaturalist"));
        assert_eq!(fox.source_grid.as_deref(), Some("30SUG49"));

        let bare = &parsed.value.features[1];
        assert_eq!(bare.genus, None);
        assert_eq!(bare.year, None);
    }

    #[test]
    fn test_unsupported_crs_rejects_file() {
        let text = r#"{"type":"FeatureCollection",
            "crs":{"type":"name","properties":{"name":"EPSG:3857"}},"features":[]}"#;
        assert!(matches!(parse_occurrences(text), Err(LoadError::UnsupportedCrs(_))));
    }

    #[test]
    fn test_load_of_broken_file_returns_empty_layer() {
        let layer = load_occurrences("/no/such/GBIFdata_CO.geojson");
        assert!(layer.is_empty());
    }
}
