//! Selecting the part of a flowline that falls inside a bounding box

use crate::flowline::{FlowlinePoint, FlowlineTable};
use serde::Deserialize;

/// Axis-aligned box given by its south-west and north-east corners
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BoundingBox {
    /// `[easting, northing]` of the south-west corner
    pub southwest: [f64; 2],
    /// `[easting, northing]` of the north-east corner
    pub northeast: [f64; 2],
}

impl BoundingBox {
    pub fn new(southwest: (f64, f64), northeast: (f64, f64)) -> Self {
        Self {
            southwest: [southwest.0, southwest.1],
            northeast: [northeast.0, northeast.1],
        }
    }

    /// Whether the point lies strictly inside the box; edges are outside
    pub fn contains(&self, easting: f64, northing: f64) -> bool {
        easting > self.southwest[0]
            && easting < self.northeast[0]
            && northing > self.southwest[1]
            && northing < self.northeast[1]
    }
}

/// Snapshot of the flowline points inside a box, re-indexed from zero
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegionSelection {
    points: Vec<FlowlinePoint>,
}

impl RegionSelection {
    pub fn points(&self) -> &[FlowlinePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn distances(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.distance).collect()
    }

    /// Distance of the first and last selected point
    pub fn distance_span(&self) -> Option<(f64, f64)> {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => Some((first.distance, last.distance)),
            _ => None,
        }
    }
}

/// Points of `table` strictly inside `bbox`, in table order
pub fn select_region(table: &FlowlineTable, bbox: &BoundingBox) -> RegionSelection {
    let points = table
        .points()
        .filter(|p| bbox.contains(p.easting, p.northing))
        .enumerate()
        .map(|(i, mut p)| {
            p.index = i;
            p
        })
        .collect();
    RegionSelection { points }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> FlowlineTable {
        FlowlineTable::new(
            vec![0.0, 100.0, 200.0, 300.0, 400.0],
            vec![0.0, 10.0, 20.0, 30.0, 40.0],
            vec![0.0, 5.0, 50.0, 5.0, 0.0],
        )
        .unwrap()
    }

    #[test]
    fn selects_scattered_points_in_order() {
        let bbox = BoundingBox::new((5.0, 1.0), (45.0, 10.0));
        let selection = select_region(&table(), &bbox);
        assert_eq!(selection.distances(), vec![100.0, 300.0]);
        let indices: Vec<usize> = selection.points().iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 1]);
        assert_eq!(selection.distance_span(), Some((100.0, 300.0)));
    }

    #[test]
    fn box_edges_are_excluded() {
        let bbox = BoundingBox::new((10.0, -1.0), (30.0, 60.0));
        let selection = select_region(&table(), &bbox);
        assert_eq!(selection.distances(), vec![200.0]);
    }

    #[test]
    fn disjoint_box_selects_nothing() {
        let bbox = BoundingBox::new((1000.0, 1000.0), (2000.0, 2000.0));
        let selection = select_region(&table(), &bbox);
        assert!(selection.is_empty());
        assert_eq!(selection.distance_span(), None);
    }

    #[test]
    fn enclosing_box_selects_everything() {
        let table = table();
        let bbox = BoundingBox::new((-1.0, -1.0), (41.0, 51.0));
        let selection = select_region(&table, &bbox);
        assert_eq!(selection.len(), table.len());
        assert_eq!(selection.distances(), table.distance().to_vec());
    }
}
