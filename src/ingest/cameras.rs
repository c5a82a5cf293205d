/// Camera-trap site reader.
///
/// Semicolon-delimited export from the schools' deployment sheet. Header
/// names come with stray whitespace and coordinates may use a decimal
/// comma.

use crate::ingest::delimited::{cell, parse_coordinate, parse_delimited};
use crate::ingest::{Parsed, load_or_empty};
use crate::logging::SourceKind;
use crate::model::{CameraSite, LoadError, PointLayer};
use crate::spatial::crs::Crs;

const NAME_COLUMNS: &[&str] = &["Name", "Camera", "Site"];
const LATITUDE_COLUMNS: &[&str] = &["Latitude", "lat"];
const LONGITUDE_COLUMNS: &[&str] = &["Longitude", "lon", "long"];

pub fn parse_cameras(text: &str) -> Result<Parsed<Vec<CameraSite>>, LoadError> {
    let table = parse_delimited(text, ';')?;
    let columns = table.require_columns(&[LATITUDE_COLUMNS, LONGITUDE_COLUMNS])?;
    let (lat_col, lon_col) = (columns[0], columns[1]);
    let name_col = table.column(NAME_COLUMNS);

    let sites: Vec<CameraSite> = table
        .rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let latitude = parse_coordinate(cell(row, lat_col)?)?;
            let longitude = parse_coordinate(cell(row, lon_col)?)?;
            let name = name_col
                .and_then(|c| cell(row, c))
                .map(String::from)
                .unwrap_or_else(|| format!("camera-{}", i + 1));
            Some(CameraSite { name, longitude, latitude })
        })
        .collect();

    Ok(Parsed {
        rows_read: table.rows.len(),
        rows_kept: sites.len(),
        value: sites,
    })
}

/// Loads camera sites from `location`. Never fails.
pub fn load_cameras(location: &str) -> Vec<CameraSite> {
    load_or_empty(SourceKind::Cameras, location, Vec::new, parse_cameras)
}

/// Materializes camera sites as a WGS84 point layer.
///
/// Pure: the input is only read, and calling it twice yields equal layers.
pub fn camera_layer(sites: &[CameraSite]) -> PointLayer<CameraSite> {
    PointLayer::new(Crs::WGS84, sites.to_vec())
}
