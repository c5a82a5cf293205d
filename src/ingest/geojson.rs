/// GeoJSON feature collections for the geometry-bearing sources.
///
/// The envelope is deserialized into typed structs; geometries and
/// properties stay as `serde_json::Value` so each reader can decide how
/// strict to be (occurrences drop bad rows, the grid rejects the file).

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::model::LoadError;
use crate::spatial::crs::Crs;

// ============================================================================
// Envelope Structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawCollection {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    crs: Option<RawCrs>,
    #[serde(default)]
    features: Vec<RawFeature>,
}

/// Legacy (pre RFC 7946) named CRS member, still written by GDAL/QGIS.
#[derive(Debug, Deserialize)]
struct RawCrs {
    properties: RawCrsProperties,
}

#[derive(Debug, Deserialize)]
struct RawCrsProperties {
    name: String,
}

#[derive(Debug, Deserialize)]
pub struct RawFeature {
    #[serde(default)]
    pub geometry: Option<Value>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

/// A parsed collection with its declared CRS (EPSG:4326 when undeclared).
#[derive(Debug)]
pub struct FeatureCollection {
    pub crs: Crs,
    pub features: Vec<RawFeature>,
}

pub fn parse_feature_collection(text: &str) -> Result<FeatureCollection, LoadError> {
    let raw: RawCollection =
        serde_json::from_str(text).map_err(|e| LoadError::Parse(e.to_string()))?;
    if raw.kind != "FeatureCollection" {
        return Err(LoadError::Parse(format!(
            "expected a FeatureCollection, found {}",
            raw.kind
        )));
    }
    let crs = match raw.crs {
        Some(c) => Crs::parse(&c.properties.name)?,
        None => Crs::WGS84,
    };
    Ok(FeatureCollection {
        crs,
        features: raw.features,
    })
}

// ============================================================================
// Geometry Conversion
// ============================================================================

fn geometry_type(geometry: &Value) -> Option<&str> {
    geometry.get("type").and_then(Value::as_str)
}

fn position(value: &Value) -> Result<Coord<f64>, String> {
    let arr = value.as_array().ok_or("position is not an array")?;
    if arr.len() < 2 {
        return Err("position has fewer than two ordinates".to_string());
    }
    let x = arr[0].as_f64().ok_or("x ordinate is not a number")?;
    let y = arr[1].as_f64().ok_or("y ordinate is not a number")?;
    if !x.is_finite() || !y.is_finite() {
        return Err("non-finite ordinate".to_string());
    }
    Ok(Coord { x, y })
}

/// Extracts the coordinate of a `Point` geometry.
pub fn point_coord(geometry: &Value) -> Result<Coord<f64>, String> {
    match geometry_type(geometry) {
        Some("Point") => position(geometry.get("coordinates").ok_or("missing coordinates")?),
        Some(other) => Err(format!("expected Point, found {}", other)),
        None => Err("geometry has no type".to_string()),
    }
}

fn ring(value: &Value) -> Result<LineString<f64>, String> {
    let positions = value.as_array().ok_or("ring is not an array")?;
    if positions.len() < 4 {
        return Err(format!("ring has {} positions, need at least 4", positions.len()));
    }
    let coords = positions.iter().map(position).collect::<Result<Vec<_>, _>>()?;
    Ok(LineString::from(coords))
}

fn polygon(value: &Value) -> Result<Polygon<f64>, String> {
    let rings = value.as_array().ok_or("polygon is not an array of rings")?;
    let (exterior, interiors) = rings.split_first().ok_or("polygon has no rings")?;
    let interiors = interiors.iter().map(ring).collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(ring(exterior)?, interiors))
}

/// Converts a `Polygon` or `MultiPolygon` geometry into a multipolygon.
pub fn polygonal(geometry: &Value) -> Result<MultiPolygon<f64>, String> {
    let coordinates = geometry.get("coordinates").ok_or("missing coordinates")?;
    match geometry_type(geometry) {
        Some("Polygon") => Ok(MultiPolygon::new(vec![polygon(coordinates)?])),
        Some("MultiPolygon") => {
            let parts = coordinates.as_array().ok_or("multipolygon is not an array")?;
            if parts.is_empty() {
                return Err("multipolygon has no parts".to_string());
            }
            let polygons = parts.iter().map(polygon).collect::<Result<Vec<_>, _>>()?;
            Ok(MultiPolygon::new(polygons))
        }
        Some(other) => Err(format!("expected Polygon or MultiPolygon, found {}", other)),
        None => Err("geometry has no type".to_string()),
    }
}

// ============================================================================
// Property Access
// ============================================================================

/// First non-empty property among `names`, rendered as a string.
/// Integral numbers are rendered without a fractional part.
pub fn property_string(props: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| match props.get(*name)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.to_string(),
        }),
        _ => None,
    })
}

/// First property among `names` that reads as a whole year within `i32`.
pub fn property_year(props: &Map<String, Value>, names: &[&str]) -> Option<i32> {
    names.iter().find_map(|name| {
        let year = match props.get(*name)? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        if !year.is_finite() || year.fract() != 0.0 {
            return None;
        }
        i32::try_from(year as i64).ok()
    })
}
