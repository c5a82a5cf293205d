/// Spatial support: CRS handling and the grid join.
///
/// Submodules:
/// - `crs` : supported reference systems and UTM reprojection.
/// - `join`: point-in-polygon assignment against the reference grid.

pub mod crs;
pub mod join;
