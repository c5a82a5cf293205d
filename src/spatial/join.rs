//! Point-in-polygon assignment of point layers to the reference grid.
//!
//! The grid is never reprojected: points are moved into the grid's CRS
//! before any geometric test. Membership is "within", i.e. the strict
//! interior of a cell, so a point on a cell edge is unassigned. A point
//! inside more than one cell (overlapping polygons) goes to the lowest
//! `cell_id`. Unassigned points are kept with a `None` cell.

use std::collections::BTreeMap;

use geo::{BoundingRect, Contains, Coord, Point, Rect};
use serde::Serialize;

use crate::model::{GridCell, GridLayer, PointFeature, PointLayer};
use crate::spatial::crs::reproject;

/// One input point with its position in the grid CRS and its cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignedPoint<T> {
    pub feature: T,
    /// Position in the grid's CRS.
    pub x: f64,
    pub y: f64,
    pub cell_id: Option<String>,
}

impl<T> AssignedPoint<T> {
    pub fn is_assigned(&self) -> bool {
        self.cell_id.is_some()
    }
}

/// Per-cell point counts, plus the points no cell contains.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CellCounts {
    pub by_cell: BTreeMap<String, usize>,
    pub unassigned: usize,
}

impl CellCounts {
    pub fn total(&self) -> usize {
        self.by_cell.values().sum::<usize>() + self.unassigned
    }
}

struct IndexedCell<'a> {
    cell: &'a GridCell,
    bounds: Option<Rect<f64>>,
}

impl IndexedCell<'_> {
    fn contains(&self, coord: Coord<f64>) -> bool {
        let Some(bounds) = self.bounds else {
            return false;
        };
        let (min, max) = (bounds.min(), bounds.max());
        if coord.x < min.x || coord.x > max.x || coord.y < min.y || coord.y > max.y {
            return false;
        }
        self.cell.geometry.contains(&Point::from(coord))
    }
}

/// Assigns every point of `points` to the grid cell containing it.
///
/// The output has exactly one entry per input point, in input order.
pub fn assign_to_grid<T>(points: &PointLayer<T>, grid: &GridLayer) -> Vec<AssignedPoint<T>>
where
    T: PointFeature + Clone,
{
    // Sorted by id so the first hit is the lowest id.
    let mut cells: Vec<IndexedCell> = grid
        .cells
        .iter()
        .map(|cell| IndexedCell {
            cell,
            bounds: cell.geometry.bounding_rect(),
        })
        .collect();
    cells.sort_by(|a, b| a.cell.cell_id.cmp(&b.cell.cell_id));

    points
        .features
        .iter()
        .map(|feature| {
            let coord = reproject(feature.position(), points.crs, grid.crs);
            let cell_id = if coord.x.is_finite() && coord.y.is_finite() {
                cells
                    .iter()
                    .find(|c| c.contains(coord))
                    .map(|c| c.cell.cell_id.clone())
            } else {
                None
            };
            AssignedPoint {
                feature: feature.clone(),
                x: coord.x,
                y: coord.y,
                cell_id,
            }
        })
        .collect()
}

/// Counts assigned points per cell.
pub fn count_by_cell<T>(assigned: &[AssignedPoint<T>]) -> CellCounts {
    let mut counts = CellCounts::default();
    for point in assigned {
        match &point.cell_id {
            Some(id) => *counts.by_cell.entry(id.clone()).or_insert(0) += 1,
            None => counts.unassigned += 1,
        }
    }
    counts
}
