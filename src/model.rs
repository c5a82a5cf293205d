/// Core data types for the wildlife observation engine.
///
/// This module defines the canonical model shared by every reader and
/// analysis stage: tabular citizen-science counts, point occurrences,
/// grid cells, and camera sites. Readers map their raw rows onto these
/// types; everything downstream consumes them read-only.

use geo::{Coord, MultiPolygon, Point};
use serde::Serialize;

use crate::spatial::crs::Crs;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Source label assigned to citizen-science rows with an empty source cell.
pub const UNKNOWN_SOURCE: &str = "Unknown";

// ---------------------------------------------------------------------------
// Tabular observations
// ---------------------------------------------------------------------------

/// One row of the tabular citizen-science dataset.
///
/// `species_name` is never empty and `record_count` is always present;
/// rows violating either are dropped by the reader before they reach
/// this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeciesObservationRecord {
    pub species_name: String,
    pub grid_id: Option<String>,
    pub data_source: String,
    pub record_count: u64,
}

impl SpeciesObservationRecord {
    pub fn new(
        species_name: impl Into<String>,
        grid_id: Option<&str>,
        data_source: impl Into<String>,
        record_count: u64,
    ) -> Self {
        Self {
            species_name: species_name.into(),
            grid_id: grid_id.map(String::from),
            data_source: data_source.into(),
            record_count,
        }
    }

    /// Returns this record's key along `dimension`, or `None` when the
    /// record carries no value for it (only possible for the grid).
    pub fn key(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Species => Some(&self.species_name),
            Dimension::Grid => self.grid_id.as_deref(),
            Dimension::Source => Some(&self.data_source),
        }
    }
}

/// The three dimensions a citizen-science table can be grouped or
/// filtered along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Species,
    Grid,
    Source,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Species, Dimension::Grid, Dimension::Source];

    /// The two dimensions other than `self`, in declaration order.
    pub fn others(self) -> [Dimension; 2] {
        match self {
            Dimension::Species => [Dimension::Grid, Dimension::Source],
            Dimension::Grid => [Dimension::Species, Dimension::Source],
            Dimension::Source => [Dimension::Species, Dimension::Grid],
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dimension::Species => write!(f, "species"),
            Dimension::Grid => write!(f, "grid"),
            Dimension::Source => write!(f, "source"),
        }
    }
}

// ---------------------------------------------------------------------------
// Point and polygon entities
// ---------------------------------------------------------------------------

/// Anything that carries a single point position in its layer's CRS.
pub trait PointFeature {
    fn position(&self) -> Coord<f64>;
}

/// One historical occurrence with point geometry and taxonomic metadata.
///
/// `longitude`/`latitude` are the point's x/y in the owning layer's CRS
/// (easting/northing when the layer is projected).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoOccurrenceRecord {
    pub longitude: f64,
    pub latitude: f64,
    pub species: Option<String>,
    pub genus: Option<String>,
    pub family: Option<String>,
    pub order: Option<String>,
    pub year: Option<i32>,
    pub institution: Option<String>,
    /// Grid code as recorded by the publishing institution, if any.
    pub source_grid: Option<String>,
}

impl GeoOccurrenceRecord {
    pub fn at(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
            species: None,
            genus: None,
            family: None,
            order: None,
            year: None,
            institution: None,
            source_grid: None,
        }
    }

    pub fn geometry(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }

    /// Taxon value at the given rank.
    pub fn taxon(&self, rank: TaxonRank) -> Option<&str> {
        match rank {
            TaxonRank::Order => self.order.as_deref(),
            TaxonRank::Family => self.family.as_deref(),
            TaxonRank::Genus => self.genus.as_deref(),
        }
    }
}

impl PointFeature for GeoOccurrenceRecord {
    fn position(&self) -> Coord<f64> {
        Coord { x: self.longitude, y: self.latitude }
    }
}

/// Taxonomic ranks carried by occurrence records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxonRank {
    Order,
    Family,
    Genus,
}

/// One physical camera-trap deployment. Always WGS84.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraSite {
    pub name: String,
    pub longitude: f64,
    pub latitude: f64,
}

impl PointFeature for CameraSite {
    fn position(&self) -> Coord<f64> {
        Coord { x: self.longitude, y: self.latitude }
    }
}

/// A collection of point features sharing one CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct PointLayer<T> {
    pub crs: Crs,
    pub features: Vec<T>,
}

impl<T> PointLayer<T> {
    pub fn new(crs: Crs, features: Vec<T>) -> Self {
        Self { crs, features }
    }

    pub fn empty(crs: Crs) -> Self {
        Self { crs, features: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// One polygon cell of the fixed reference grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    pub cell_id: String,
    pub geometry: MultiPolygon<f64>,
}

/// The complete reference grid. Its CRS is authoritative for joins.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayer {
    pub crs: Crs,
    pub cells: Vec<GridCell>,
}

impl GridLayer {
    pub fn empty(crs: Crs) -> Self {
        Self { crs, cells: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn find_cell(&self, cell_id: &str) -> Option<&GridCell> {
        self.cells.iter().find(|c| c.cell_id == cell_id)
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while reading a source. Readers absorb these at their
/// boundary; they are only ever logged or reported, never propagated
/// past the dataset builder.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadError {
    /// The file could not be opened or read.
    Io { location: String, message: String },
    /// Non-2xx HTTP response for a remote source.
    Http(u16),
    /// The content is not in the expected format.
    Parse(String),
    /// Required columns are absent from the header.
    MissingColumns(Vec<String>),
    /// A feature's geometry is missing or malformed.
    InvalidGeometry { feature: usize, reason: String },
    /// A grid feature has no cell identifier.
    MissingCellId { feature: usize },
    /// Two grid features share a cell identifier.
    DuplicateCellId(String),
    /// The declared CRS cannot be reprojected.
    UnsupportedCrs(String),
}

impl LoadError {
    /// True for the schema-validation sub-case of a load failure.
    pub fn is_schema_violation(&self) -> bool {
        matches!(
            self,
            LoadError::MissingColumns(_)
                | LoadError::MissingCellId { .. }
                | LoadError::DuplicateCellId(_)
                | LoadError::InvalidGeometry { .. }
        )
    }
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io { location, message } => {
                write!(f, "IO error reading {}: {}", location, message)
            }
            LoadError::Http(code) => write!(f, "HTTP error: {}", code),
            LoadError::Parse(msg) => write!(f, "Parse error: {}", msg),
            LoadError::MissingColumns(cols) => {
                write!(f, "Missing required columns: {}", cols.join(", "))
            }
            LoadError::InvalidGeometry { feature, reason } => {
                write!(f, "Invalid geometry in feature {}: {}", feature, reason)
            }
            LoadError::MissingCellId { feature } => {
                write!(f, "Missing cell identifier in feature {}", feature)
            }
            LoadError::DuplicateCellId(id) => write!(f, "Duplicate cell identifier: {}", id),
            LoadError::UnsupportedCrs(name) => write!(f, "Unsupported CRS: {}", name),
        }
    }
}

impl std::error::Error for LoadError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_returns_none_for_missing_grid() {
        let record = SpeciesObservationRecord::new("Vulpes vulpes", None, "Daily Record", 2);
        assert_eq!(record.key(Dimension::Species), Some("Vulpes vulpes"));
        assert_eq!(record.key(Dimension::Grid), None);
        assert_eq!(record.key(Dimension::Source), Some("Daily Record"));
    }

    #[test]
    fn test_others_never_contains_self() {
        for dim in Dimension::ALL {
            assert!(!dim.others().contains(&dim), "{} listed among its own others", dim);
        }
    }

    #[test]
    fn test_schema_violation_classification() {
        assert!(LoadError::MissingColumns(vec!["Records".into()]).is_schema_violation());
        assert!(LoadError::DuplicateCellId("30SUG40".into()).is_schema_violation());
        assert!(!LoadError::Http(500).is_schema_violation());
        assert!(!LoadError::Parse("bad json".into()).is_schema_violation());
    }
}
