//! Local section frames built from three reference points

use crate::error::{PostError, PostResult};
use crate::model::NodeSet;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Default norm threshold below which a frame is considered degenerate.
pub const DEFAULT_FRAME_EPSILON: f64 = 1e-10;

/// An orthonormal 2-D frame embedded in 3-D space.
///
/// Built from three reference points: the origin, a point on the local
/// x-axis and a point in the local xy-plane. Projection maps global 3-D
/// coordinates to local `(x, y)` pairs; the z-axis is carried along for the
/// two-plane stability vectors but plays no part in projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalFrame {
    origin: Vector3<f64>,
    x_axis: Vector3<f64>,
    y_axis: Vector3<f64>,
    z_axis: Vector3<f64>,
}

impl LocalFrame {
    /// Construct a frame by Gram-Schmidt orthogonalization:
    /// x̂ = normalize(x_point − origin), ŷ = normalize of the xy-plane
    /// direction with its x̂ component removed, ẑ = x̂ × ŷ.
    pub fn from_points(
        origin: Vector3<f64>,
        x_point: Vector3<f64>,
        xy_point: Vector3<f64>,
    ) -> PostResult<Self> {
        Self::from_points_with_epsilon(origin, x_point, xy_point, DEFAULT_FRAME_EPSILON)
    }

    /// As [`from_points`](Self::from_points) with a caller-chosen epsilon for
    /// the degenerate-norm checks.
    pub fn from_points_with_epsilon(
        origin: Vector3<f64>,
        x_point: Vector3<f64>,
        xy_point: Vector3<f64>,
        epsilon: f64,
    ) -> PostResult<Self> {
        let dx = x_point - origin;
        let nx = dx.norm();
        if nx < epsilon {
            return Err(PostError::DegenerateFrame(
                "x-axis point coincides with origin".into(),
            ));
        }
        let x_axis = dx / nx;

        let d = xy_point - origin;
        let dy = d - d.dot(&x_axis) * x_axis;
        let ny = dy.norm();
        if ny < epsilon {
            return Err(PostError::DegenerateFrame(
                "xy-plane point is collinear with the x-axis".into(),
            ));
        }
        let y_axis = dy / ny;
        let z_axis = x_axis.cross(&y_axis);

        Ok(Self {
            origin,
            x_axis,
            y_axis,
            z_axis,
        })
    }

    /// Resolve the three reference points from node IDs and build the frame.
    pub fn from_node_ids(
        nodes: &NodeSet,
        origin_id: i64,
        x_id: i64,
        xy_id: i64,
    ) -> PostResult<Self> {
        let origin = nodes.require(origin_id)?;
        let x_point = nodes.require(x_id)?;
        let xy_point = nodes.require(xy_id)?;
        Self::from_points(origin, x_point, xy_point)
    }

    pub fn origin(&self) -> Vector3<f64> {
        self.origin
    }

    pub fn x_axis(&self) -> Vector3<f64> {
        self.x_axis
    }

    pub fn y_axis(&self) -> Vector3<f64> {
        self.y_axis
    }

    pub fn z_axis(&self) -> Vector3<f64> {
        self.z_axis
    }

    /// Project one global point into local `(x, y)` coordinates.
    pub fn project_point(&self, p: &Vector3<f64>) -> [f64; 2] {
        let d = p - self.origin;
        [d.dot(&self.x_axis), d.dot(&self.y_axis)]
    }

    /// Project a set of global points. Field samples, boundaries, holes and
    /// reference points all go through this same mapping so a section stays
    /// self-consistent.
    pub fn project(&self, points: &[Vector3<f64>]) -> Vec<[f64; 2]> {
        points.iter().map(|p| self.project_point(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tilted_frame() -> LocalFrame {
        LocalFrame::from_points(
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(2.0, 3.0, 3.0),
            Vector3::new(1.0, 4.0, 5.0),
        )
        .unwrap()
    }

    #[test]
    fn test_axes_orthonormal() {
        let f = tilted_frame();
        assert_relative_eq!(f.x_axis().norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(f.y_axis().norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(f.x_axis().dot(&f.y_axis()), 0.0, epsilon = 1e-12);
        let z = f.x_axis().cross(&f.y_axis());
        assert_relative_eq!((z - f.z_axis()).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_origin_projects_to_zero() {
        let f = tilted_frame();
        let p = f.project_point(&f.origin());
        assert_relative_eq!(p[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(p[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_projection_dot_identity() {
        // Re-expressing local coordinates along the basis vectors must
        // reconstruct the in-plane component of the global delta.
        let f = tilted_frame();
        let p = Vector3::new(4.0, -1.0, 2.5);
        let [lx, ly] = f.project_point(&p);
        let rebuilt = f.origin() + lx * f.x_axis() + ly * f.y_axis();
        let residual = p - rebuilt;
        // Residual must be orthogonal to the section plane.
        assert_relative_eq!(residual.dot(&f.x_axis()), 0.0, epsilon = 1e-12);
        assert_relative_eq!(residual.dot(&f.y_axis()), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_origin() {
        let o = Vector3::new(0.0, 0.0, 0.0);
        let err = LocalFrame::from_points(o, o, Vector3::new(0.0, 1.0, 0.0));
        assert!(matches!(err, Err(PostError::DegenerateFrame(_))));
    }

    #[test]
    fn test_degenerate_collinear() {
        let err = LocalFrame::from_points(
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(2.0, 0.0, 0.0),
        );
        assert!(matches!(err, Err(PostError::DegenerateFrame(_))));
    }

    #[test]
    fn test_from_node_ids() {
        let nodes = NodeSet::from_rows(&[
            (10, [0.0, 0.0, 0.0]),
            (11, [1.0, 0.0, 0.0]),
            (12, [0.0, 1.0, 0.0]),
        ]);
        let f = LocalFrame::from_node_ids(&nodes, 10, 11, 12).unwrap();
        assert_relative_eq!(f.z_axis().z, 1.0, epsilon = 1e-12);
        assert!(LocalFrame::from_node_ids(&nodes, 10, 11, 99).is_err());
    }
}
