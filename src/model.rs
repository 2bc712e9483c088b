//! Core data model: node sets, scattered field samples, sections

use crate::error::{PostError, PostResult};
use crate::frame::LocalFrame;
use crate::geometry::Boundary;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapping from node ID to global coordinates.
///
/// Immutable once loaded; 2-D meshes store z = 0. Iteration order is
/// ascending node ID so downstream arrays are deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeSet {
    nodes: BTreeMap<i64, [f64; 3]>,
}

impl NodeSet {
    /// Build from `(id, [x, y, z])` rows. Duplicate IDs keep the first row,
    /// matching the data-loading convention of the result tables.
    pub fn from_rows(rows: &[(i64, [f64; 3])]) -> Self {
        let mut nodes = BTreeMap::new();
        for &(id, coords) in rows {
            nodes.entry(id).or_insert(coords);
        }
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Coordinates of a node, if present.
    pub fn coords(&self, id: i64) -> Option<Vector3<f64>> {
        self.nodes.get(&id).map(|c| Vector3::new(c[0], c[1], c[2]))
    }

    /// Coordinates of a node, or `NodeNotFound`.
    pub fn require(&self, id: i64) -> PostResult<Vector3<f64>> {
        self.coords(id).ok_or(PostError::NodeNotFound(id))
    }

    /// Resolve a list of IDs to coordinates, in order.
    pub fn resolve(&self, ids: &[i64]) -> PostResult<Vec<Vector3<f64>>> {
        ids.iter().map(|&id| self.require(id)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, Vector3<f64>)> + '_ {
        self.nodes
            .iter()
            .map(|(&id, c)| (id, Vector3::new(c[0], c[1], c[2])))
    }
}

/// Scattered field data for one section/frame: `(x_i, y_i, value_i)` in local
/// section coordinates.
///
/// This is the source of truth for contouring; the interpolated grid is
/// always derived from it, and extremum annotation reads these raw values,
/// never the grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSample {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
}

impl FieldSample {
    /// Create a sample set. Fails when the arrays are empty, differ in
    /// length, or contain non-finite values.
    pub fn new(x: Vec<f64>, y: Vec<f64>, z: Vec<f64>) -> PostResult<Self> {
        if x.is_empty() {
            return Err(PostError::InvalidGeometry("empty sample set".into()));
        }
        if x.len() != y.len() || x.len() != z.len() {
            return Err(PostError::InvalidGeometry(format!(
                "sample arrays disagree in length: x={}, y={}, z={}",
                x.len(),
                y.len(),
                z.len()
            )));
        }
        if x.iter().chain(&y).chain(&z).any(|v| !v.is_finite()) {
            return Err(PostError::InvalidGeometry(
                "sample set contains non-finite values".into(),
            ));
        }
        Ok(Self { x, y, z })
    }

    /// Create from `(x, y, value)` triples.
    pub fn from_points(points: &[[f64; 3]]) -> PostResult<Self> {
        Self::new(
            points.iter().map(|p| p[0]).collect(),
            points.iter().map(|p| p[1]).collect(),
            points.iter().map(|p| p[2]).collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Drop all samples with `y < base`. Models the deletion-height policy
    /// that excludes base-contact stress-concentration noise.
    pub fn filter_above(&self, base: f64) -> Self {
        let keep: Vec<usize> = (0..self.len()).filter(|&i| self.y[i] >= base).collect();
        Self {
            x: keep.iter().map(|&i| self.x[i]).collect(),
            y: keep.iter().map(|&i| self.y[i]).collect(),
            z: keep.iter().map(|&i| self.z[i]).collect(),
        }
    }

    /// Drop samples whose nearest distance to any point of `zone` is below
    /// `min_dist`. Used to exclude nodes near a known stress-concentration
    /// region before interpolating.
    pub fn exclude_near(&self, zone: &[[f64; 2]], min_dist: f64) -> Self {
        if zone.is_empty() {
            return self.clone();
        }
        let keep: Vec<usize> = (0..self.len())
            .filter(|&i| {
                let d2 = zone
                    .iter()
                    .map(|p| (p[0] - self.x[i]).powi(2) + (p[1] - self.y[i]).powi(2))
                    .fold(f64::INFINITY, f64::min);
                d2.sqrt() > min_dist
            })
            .collect();
        Self {
            x: keep.iter().map(|&i| self.x[i]).collect(),
            y: keep.iter().map(|&i| self.y[i]).collect(),
            z: keep.iter().map(|&i| self.z[i]).collect(),
        }
    }

    /// Clamp values above `limit` down to `limit` (damage factors saturate
    /// at 1.0 in the export).
    pub fn clamp_max(&mut self, limit: f64) {
        for v in &mut self.z {
            if *v > limit {
                *v = limit;
            }
        }
    }

    /// Index of the sample with the largest value.
    pub fn argmax(&self) -> usize {
        self.arg_by(|a, b| a > b)
    }

    /// Index of the sample with the smallest value.
    pub fn argmin(&self) -> usize {
        self.arg_by(|a, b| a < b)
    }

    /// Index of the sample with the largest absolute value.
    pub fn argmax_abs(&self) -> usize {
        self.arg_by(|a, b| a.abs() > b.abs())
    }

    fn arg_by(&self, better: impl Fn(f64, f64) -> bool) -> usize {
        let mut idx = 0;
        for i in 1..self.z.len() {
            if better(self.z[i], self.z[idx]) {
                idx = i;
            }
        }
        idx
    }

    /// `(min, max)` of the raw values.
    pub fn value_range(&self) -> (f64, f64) {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &v in &self.z {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        (lo, hi)
    }
}

/// A named planar cut or surface of the 3-D model: the local frame that maps
/// it to 2-D plus its clipping boundaries and holes.
#[derive(Debug, Clone)]
pub struct Section {
    pub name: String,
    pub frame: LocalFrame,
    pub boundaries: Vec<Boundary>,
    pub holes: Vec<Boundary>,
}

impl Section {
    pub fn new(name: impl Into<String>, frame: LocalFrame) -> Self {
        Self {
            name: name.into(),
            frame,
            boundaries: Vec::new(),
            holes: Vec::new(),
        }
    }

    pub fn with_boundary(mut self, boundary: Boundary) -> Self {
        self.boundaries.push(boundary);
        self
    }

    pub fn with_hole(mut self, hole: Boundary) -> Self {
        self.holes.push(hole);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_set_lookup() {
        let set = NodeSet::from_rows(&[(3, [1.0, 2.0, 3.0]), (1, [0.0, 0.0, 0.0])]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.coords(3).unwrap().x, 1.0);
        assert!(matches!(set.require(7), Err(PostError::NodeNotFound(7))));
    }

    #[test]
    fn test_node_set_keeps_first_duplicate() {
        let set = NodeSet::from_rows(&[(1, [5.0, 0.0, 0.0]), (1, [9.0, 0.0, 0.0])]);
        assert_eq!(set.coords(1).unwrap().x, 5.0);
    }

    #[test]
    fn test_sample_validation() {
        assert!(FieldSample::new(vec![], vec![], vec![]).is_err());
        assert!(FieldSample::new(vec![0.0], vec![0.0], vec![f64::NAN]).is_err());
        assert!(FieldSample::new(vec![0.0, 1.0], vec![0.0], vec![0.0, 1.0]).is_err());
    }

    #[test]
    fn test_filter_above() {
        let s = FieldSample::new(
            vec![0.0, 1.0, 2.0],
            vec![-5.0, 0.0, 5.0],
            vec![1.0, 2.0, 3.0],
        )
        .unwrap();
        let f = s.filter_above(0.0);
        assert_eq!(f.len(), 2);
        assert_eq!(f.z, vec![2.0, 3.0]);
    }

    #[test]
    fn test_exclude_near() {
        let s = FieldSample::new(vec![0.0, 10.0], vec![0.0, 0.0], vec![1.0, 2.0]).unwrap();
        let f = s.exclude_near(&[[0.0, 0.0]], 1.0);
        assert_eq!(f.len(), 1);
        assert_eq!(f.x, vec![10.0]);
    }

    #[test]
    fn test_extrema() {
        let s = FieldSample::new(
            vec![0.0, 1.0, 2.0],
            vec![0.0, 0.0, 0.0],
            vec![-4.0, 3.0, 1.0],
        )
        .unwrap();
        assert_eq!(s.argmax(), 1);
        assert_eq!(s.argmin(), 0);
        assert_eq!(s.argmax_abs(), 0);
    }
}
