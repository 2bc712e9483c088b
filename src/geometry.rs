//! Boundary and hole polygons for section clipping

use crate::error::{PostError, PostResult};
use geo::{Contains, Coord, LineString, Point, Polygon};
use serde::{Deserialize, Deserializer, Serialize};

/// A closed polygon in local section coordinates.
///
/// Used both as the outer clipping region of a section and, via
/// [`Section::holes`](crate::model::Section), as an excluded sub-region.
/// Vertices may wind either way; containment is robust for non-convex
/// outlines.
#[derive(Debug, Clone, Serialize)]
pub struct Boundary {
    points: Vec<[f64; 2]>,
    #[serde(skip)]
    polygon: Polygon<f64>,
}

// Only the vertex list is serialized; the containment polygon is rebuilt on
// deserialization so cached boundaries stay usable.
impl<'de> Deserialize<'de> for Boundary {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            points: Vec<[f64; 2]>,
        }
        let raw = Raw::deserialize(deserializer)?;
        Boundary::new(raw.points).map_err(serde::de::Error::custom)
    }
}

impl Boundary {
    /// Build a closed boundary from an ordered vertex list. The outline is
    /// closed automatically when the last point differs from the first.
    /// Fewer than 3 distinct vertices is invalid geometry.
    pub fn new(mut points: Vec<[f64; 2]>) -> PostResult<Self> {
        if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
            if points.len() > 1 && first != last {
                points.push(first);
            }
        }
        // Last vertex duplicates the first, so 4 entries = a triangle.
        if points.len() < 4 {
            return Err(PostError::InvalidGeometry(format!(
                "boundary needs at least 3 distinct points, got {}",
                points.len().saturating_sub(1)
            )));
        }
        if points.iter().flatten().any(|v| !v.is_finite()) {
            return Err(PostError::InvalidGeometry(
                "boundary contains non-finite coordinates".into(),
            ));
        }
        let ring: Vec<Coord<f64>> = points.iter().map(|p| Coord { x: p[0], y: p[1] }).collect();
        let polygon = Polygon::new(LineString::new(ring), vec![]);
        Ok(Self { points, polygon })
    }

    /// Closed vertex list (first == last).
    pub fn points(&self) -> &[[f64; 2]] {
        &self.points
    }

    /// Point-in-polygon test. Points on the outline count as outside, which
    /// matches the masking convention of the contour grid.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.polygon.contains(&Point::new(x, y))
    }

    /// Axis-aligned bounding box as `([min_x, min_y], [max_x, max_y])`.
    pub fn bounding_box(&self) -> ([f64; 2], [f64; 2]) {
        let mut min = [f64::INFINITY; 2];
        let mut max = [f64::NEG_INFINITY; 2];
        for p in &self.points {
            for k in 0..2 {
                min[k] = min[k].min(p[k]);
                max[k] = max[k].max(p[k]);
            }
        }
        (min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Boundary {
        Boundary::new(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]).unwrap()
    }

    #[test]
    fn test_auto_close() {
        let b = unit_square();
        assert_eq!(b.points().len(), 5);
        assert_eq!(b.points()[0], *b.points().last().unwrap());
    }

    #[test]
    fn test_too_few_points() {
        let err = Boundary::new(vec![[0.0, 0.0], [1.0, 0.0]]);
        assert!(matches!(err, Err(PostError::InvalidGeometry(_))));
    }

    #[test]
    fn test_containment() {
        let b = unit_square();
        assert!(b.contains(0.5, 0.5));
        assert!(!b.contains(1.5, 0.5));
        assert!(!b.contains(-0.1, 0.5));
    }

    #[test]
    fn test_non_convex_containment() {
        // L-shaped outline: the notch in the upper right is outside.
        let b = Boundary::new(vec![
            [0.0, 0.0],
            [2.0, 0.0],
            [2.0, 1.0],
            [1.0, 1.0],
            [1.0, 2.0],
            [0.0, 2.0],
        ])
        .unwrap();
        assert!(b.contains(0.5, 1.5));
        assert!(b.contains(1.5, 0.5));
        assert!(!b.contains(1.5, 1.5));
    }

    #[test]
    fn test_serde_round_trip_rebuilds_polygon() {
        let b = unit_square();
        let json = serde_json::to_string(&b).unwrap();
        let back: Boundary = serde_json::from_str(&json).unwrap();
        assert_eq!(back.points(), b.points());
        assert!(back.contains(0.5, 0.5));
        assert!(!back.contains(1.5, 0.5));
    }

    #[test]
    fn test_bounding_box() {
        let b = Boundary::new(vec![[-1.0, 2.0], [3.0, 2.0], [3.0, 5.0]]).unwrap();
        let (min, max) = b.bounding_box();
        assert_eq!(min, [-1.0, 2.0]);
        assert_eq!(max, [3.0, 5.0]);
    }
}
