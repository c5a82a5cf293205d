//! Coordinate reference systems and reprojection.
//!
//! Only the systems the monitoring data actually uses are supported:
//! geographic lon/lat and UTM zones on the WGS84/GRS80 ellipsoid. A CRS
//! outside that set is rejected when its layer is loaded, so reprojection
//! itself can never fail.
//!
//! The projection uses the Transverse Mercator series expansion
//! (Snyder, "Map Projections: A Working Manual", eq. 8-9 to 8-25), which is
//! accurate to well under a metre inside a UTM zone.

use geo::Coord;

use crate::model::LoadError;

// WGS84 ellipsoid. GRS80 differs only in the 9th digit of the flattening.
const SEMI_MAJOR_M: f64 = 6_378_137.0;
const FLATTENING: f64 = 1.0 / 298.257_223_563;
const UTM_SCALE: f64 = 0.9996;
const FALSE_EASTING_M: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH_M: f64 = 10_000_000.0;

/// The shape of a supported CRS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Longitude/latitude in degrees.
    Geographic,
    /// Easting/northing in metres.
    Utm { zone: u8, south: bool },
}

/// A CRS identified by its EPSG code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Crs {
    epsg: u32,
}

impl Crs {
    pub const WGS84: Crs = Crs { epsg: 4326 };

    /// Builds a CRS from an EPSG code, rejecting codes that cannot be
    /// reprojected.
    pub fn from_epsg(epsg: u32) -> Result<Crs, LoadError> {
        let crs = Crs { epsg };
        if crs.projection().is_some() {
            Ok(crs)
        } else {
            Err(LoadError::UnsupportedCrs(format!("EPSG:{}", epsg)))
        }
    }

    /// Parses a CRS name as written in data files: `EPSG:25830`,
    /// `urn:ogc:def:crs:EPSG::32630`, `urn:ogc:def:crs:OGC:1.3:CRS84`.
    pub fn parse(name: &str) -> Result<Crs, LoadError> {
        let upper = name.trim().to_ascii_uppercase();
        if upper.ends_with("CRS84") {
            return Ok(Crs::WGS84);
        }
        let code = upper
            .rsplit(':')
            .next()
            .and_then(|tail| tail.trim().parse::<u32>().ok())
            .ok_or_else(|| LoadError::UnsupportedCrs(name.to_string()))?;
        Crs::from_epsg(code).map_err(|_| LoadError::UnsupportedCrs(name.to_string()))
    }

    pub fn epsg(&self) -> u32 {
        self.epsg
    }

    /// UTM zone CRS on WGS84 for the given zone.
    pub fn utm(zone: u8, south: bool) -> Result<Crs, LoadError> {
        let base = if south { 32700 } else { 32600 };
        Crs::from_epsg(base + u32::from(zone))
    }

    fn projection(&self) -> Option<Projection> {
        let zone_of = |base: u32| {
            let zone = self.epsg.checked_sub(base)?;
            (1..=60).contains(&zone).then_some(zone as u8)
        };
        match self.epsg {
            4326 | 4258 => Some(Projection::Geographic),
            32601..=32660 => zone_of(32600).map(|zone| Projection::Utm { zone, south: false }),
            32701..=32760 => zone_of(32700).map(|zone| Projection::Utm { zone, south: true }),
            25801..=25860 => zone_of(25800).map(|zone| Projection::Utm { zone, south: false }),
            _ => None,
        }
    }

    /// The projection kind. Always defined, since construction validates it.
    pub fn kind(&self) -> Projection {
        self.projection().unwrap_or(Projection::Geographic)
    }

    pub fn is_geographic(&self) -> bool {
        self.kind() == Projection::Geographic
    }
}

impl Default for Crs {
    fn default() -> Self {
        Crs::WGS84
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

// ---------------------------------------------------------------------------
// Reprojection
// ---------------------------------------------------------------------------

/// Reprojects one coordinate from `from` into `to`.
pub fn reproject(coord: Coord<f64>, from: Crs, to: Crs) -> Coord<f64> {
    if from == to {
        return coord;
    }
    let geographic = match from.kind() {
        Projection::Geographic => coord,
        Projection::Utm { zone, south } => utm_to_geographic(coord, zone, south),
    };
    match to.kind() {
        Projection::Geographic => geographic,
        Projection::Utm { zone, south } => geographic_to_utm(geographic, zone, south),
    }
}

fn central_meridian_deg(zone: u8) -> f64 {
    f64::from(zone) * 6.0 - 183.0
}

struct Ellipsoid {
    e2: f64,
    ep2: f64,
}

fn ellipsoid() -> Ellipsoid {
    let e2 = FLATTENING * (2.0 - FLATTENING);
    Ellipsoid { e2, ep2: e2 / (1.0 - e2) }
}

/// Meridian arc length from the equator to latitude `phi` (radians).
fn meridian_arc(phi: f64, e2: f64) -> f64 {
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    SEMI_MAJOR_M
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
}

/// Forward projection: lon/lat degrees to UTM easting/northing.
pub fn geographic_to_utm(coord: Coord<f64>, zone: u8, south: bool) -> Coord<f64> {
    let Ellipsoid { e2, ep2 } = ellipsoid();
    let phi = coord.y.to_radians();
    let lambda = coord.x.to_radians();
    let lambda0 = central_meridian_deg(zone).to_radians();

    let sin_phi = phi.sin();
    let cos_phi = phi.cos();
    let n = SEMI_MAJOR_M / (1.0 - e2 * sin_phi * sin_phi).sqrt();
    let t = phi.tan().powi(2);
    let c = ep2 * cos_phi * cos_phi;
    let a = (lambda - lambda0) * cos_phi;
    let m = meridian_arc(phi, e2);

    let easting = UTM_SCALE
        * n
        * (a + (1.0 - t + c) * a.powi(3) / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a.powi(5) / 120.0)
        + FALSE_EASTING_M;
    let mut northing = UTM_SCALE
        * (m + n
            * phi.tan()
            * (a * a / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a.powi(6) / 720.0));
    if south {
        northing += FALSE_NORTHING_SOUTH_M;
    }
    Coord { x: easting, y: northing }
}

/// Inverse projection: UTM easting/northing to lon/lat degrees.
pub fn utm_to_geographic(coord: Coord<f64>, zone: u8, south: bool) -> Coord<f64> {
    let Ellipsoid { e2, ep2 } = ellipsoid();
    let x = coord.x - FALSE_EASTING_M;
    let y = if south { coord.y - FALSE_NORTHING_SOUTH_M } else { coord.y };

    let e4 = e2 * e2;
    let e6 = e4 * e2;
    let m = y / UTM_SCALE;
    let mu = m / (SEMI_MAJOR_M * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));
    let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    let sin_phi1 = phi1.sin();
    let cos_phi1 = phi1.cos();
    let n1 = SEMI_MAJOR_M / (1.0 - e2 * sin_phi1 * sin_phi1).sqrt();
    let t1 = phi1.tan().powi(2);
    let c1 = ep2 * cos_phi1 * cos_phi1;
    let r1 = SEMI_MAJOR_M * (1.0 - e2) / (1.0 - e2 * sin_phi1 * sin_phi1).powf(1.5);
    let d = x / (n1 * UTM_SCALE);

    let phi = phi1
        - (n1 * phi1.tan() / r1)
            * (d * d / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                    * d.powi(6)
                    / 720.0);
    let lambda = (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
        + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1) * d.powi(5)
            / 120.0)
        / cos_phi1;

    Coord {
        x: central_meridian_deg(zone) + lambda.to_degrees(),
        y: phi.to_degrees(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn test_parse_common_names() {
        assert_eq!(Crs::parse("EPSG:4326").unwrap(), Crs::WGS84);
        assert_eq!(Crs::parse("urn:ogc:def:crs:OGC:1.3:CRS84").unwrap(), Crs::WGS84);
        assert_eq!(Crs::parse("urn:ogc:def:crs:EPSG::25830").unwrap().epsg(), 25830);
        assert_eq!(Crs::parse("epsg:32630").unwrap().epsg(), 32630);
    }

    #[test]
    fn test_parse_rejects_unsupported_codes() {
        assert!(matches!(Crs::parse("EPSG:3857"), Err(LoadError::UnsupportedCrs(_))));
        assert!(matches!(Crs::parse("EPSG:23030"), Err(LoadError::UnsupportedCrs(_))));
        assert!(Crs::parse("not a crs").is_err());
    }

    #[test]
    fn test_utm_zone_kinds() {
        assert_eq!(Crs::parse("EPSG:25830").unwrap().kind(), Projection::Utm { zone: 30, south: false });
        assert_eq!(Crs::parse("EPSG:32721").unwrap().kind(), Projection::Utm { zone: 21, south: true });
        assert!(Crs::WGS84.is_geographic());
    }

    #[test]
    fn test_central_meridian_on_equator_maps_to_false_origin() {
        // Zone 30 central meridian is 3°W.
        let utm = geographic_to_utm(Coord { x: -3.0, y: 0.0 }, 30, false);
        assert!(close(utm.x, 500_000.0, 1e-6), "easting was {}", utm.x);
        assert!(close(utm.y, 0.0, 1e-6), "northing was {}", utm.y);
    }

    #[test]
    fn test_cordoba_lands_in_expected_utm_range() {
        // Córdoba city, roughly 4.78°W 37.88°N, sits west of the zone 30
        // central meridian and ~4190 km north of the equator.
        let utm = geographic_to_utm(Coord { x: -4.7794, y: 37.8882 }, 30, false);
        assert!(utm.x > 330_000.0 && utm.x < 360_000.0, "easting was {}", utm.x);
        assert!(utm.y > 4_180_000.0 && utm.y < 4_210_000.0, "northing was {}", utm.y);
    }

    #[test]
    fn test_inverse_recovers_geographic_position() {
        let original = Coord { x: -4.7794, y: 37.8882 };
        let there = reproject(original, Crs::WGS84, Crs::parse("EPSG:25830").unwrap());
        let back = reproject(there, Crs::parse("EPSG:25830").unwrap(), Crs::WGS84);
        assert!(close(back.x, original.x, 1e-6), "lon drifted to {}", back.x);
        assert!(close(back.y, original.y, 1e-6), "lat drifted to {}", back.y);
    }

    #[test]
    fn test_southern_hemisphere_adds_false_northing() {
        let utm = geographic_to_utm(Coord { x: -57.0, y: -10.0 }, 21, true);
        assert!(utm.y > 8_800_000.0 && utm.y < 9_000_000.0, "northing was {}", utm.y);
        let back = utm_to_geographic(utm, 21, true);
        assert!(close(back.y, -10.0, 1e-6));
    }

    #[test]
    fn test_same_crs_is_identity() {
        let c = Coord { x: 343_000.0, y: 4_195_000.0 };
        let crs = Crs::parse("EPSG:25830").unwrap();
        assert_eq!(reproject(c, crs, crs), c);
    }
}
