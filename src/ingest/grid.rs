/// Reference grid reader (UTM 10x10 km cells).
///
/// The grid is the fixed frame every spatial join is measured against,
/// so it is all-or-nothing: one malformed cell, a missing identifier, or
/// a duplicated identifier rejects the whole file.

use std::collections::HashSet;

use crate::ingest::geojson::{parse_feature_collection, polygonal, property_string};
use crate::ingest::{Parsed, load_or_empty};
use crate::logging::SourceKind;
use crate::model::{GridCell, GridLayer, LoadError};
use crate::spatial::crs::Crs;

/// Default property holding the cell identifier in the published grid.
pub const DEFAULT_CELL_ID_FIELD: &str = "CUADRICULA";

pub fn parse_grid(text: &str, cell_id_field: &str) -> Result<Parsed<GridLayer>, LoadError> {
    let collection = parse_feature_collection(text)?;
    let mut seen = HashSet::new();
    let mut cells = Vec::with_capacity(collection.features.len());

    for (index, feature) in collection.features.iter().enumerate() {
        let geometry = feature.geometry.as_ref().ok_or_else(|| LoadError::InvalidGeometry {
            feature: index,
            reason: "geometry is null".to_string(),
        })?;
        let geometry = polygonal(geometry)
            .map_err(|reason| LoadError::InvalidGeometry { feature: index, reason })?;

        let cell_id = feature
            .properties
            .as_ref()
            .and_then(|props| property_string(props, &[cell_id_field]))
            .ok_or(LoadError::MissingCellId { feature: index })?;
        if !seen.insert(cell_id.clone()) {
            return Err(LoadError::DuplicateCellId(cell_id));
        }

        cells.push(GridCell { cell_id, geometry });
    }

    Ok(Parsed {
        rows_read: cells.len(),
        rows_kept: cells.len(),
        value: GridLayer {
            crs: collection.crs,
            cells,
        },
    })
}

/// Loads the reference grid from `location`. Never fails; a rejected
/// file yields an empty grid.
pub fn load_grid(location: &str, cell_id_field: &str) -> GridLayer {
    load_or_empty(
        SourceKind::Grid,
        location,
        || GridLayer::empty(Crs::WGS84),
        |text| parse_grid(text, cell_id_field),
    )
}
