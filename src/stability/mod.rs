//! Sliding-stability safety factors on dam cut planes
//!
//! Implements the partial-coefficient limit-state check
//!
//! ```text
//!       f' / γf · max(0, -R)  +  c' / γc · A · 1e6
//!   K = --------------------------------------------
//!            |S| · γ0 · φ · γd
//! ```
//!
//! where `R` and `S` are the normal and shear stress resultants integrated
//! over the plane, `A` the plane area, and the partial coefficients follow
//! the design-code values below. Stresses enter in Pa with compression
//! negative; cohesion `c'` enters in MPa, hence the 1e6. Time histories
//! evaluate K per frame and accumulate the duration spent below 1.

pub mod block;

pub use block::{
    safety_factor_3d, safety_factor_history_3d, sliding_direction, PlaneStress, SlidingPlane,
};

use crate::error::{PostError, PostResult};
use log::debug;
use serde::{Deserialize, Serialize};

/// Partial coefficient on the friction term.
pub const GAMMA_F: f64 = 1.7;
/// Partial coefficient on the cohesion term.
pub const GAMMA_C: f64 = 2.0;
/// Importance coefficient of the structure.
pub const GAMMA_0: f64 = 1.1;

/// Load case, fixing the design-situation coefficient φ and the structural
/// coefficient γd.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadCase {
    Static,
    Dynamic,
}

impl LoadCase {
    pub fn phi(self) -> f64 {
        match self {
            LoadCase::Static => 1.0,
            LoadCase::Dynamic => 0.85,
        }
    }

    pub fn gamma_d(self) -> f64 {
        match self {
            LoadCase::Static => 1.5,
            LoadCase::Dynamic => 0.65,
        }
    }
}

/// Shear strength of a plane: friction coefficient f' and cohesion c' in MPa.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ShearParams {
    pub friction: f64,
    pub cohesion: f64,
}

/// One horizontal cut plane through a 2-D section: per node the local x
/// position, the normal stress and the in-plane shear stress (both Pa,
/// compression negative). Nodes are kept sorted by x.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutPlane2D {
    x: Vec<f64>,
    normal: Vec<f64>,
    shear: Vec<f64>,
}

impl CutPlane2D {
    pub fn new(mut rows: Vec<(f64, f64, f64)>) -> PostResult<Self> {
        if rows.len() < 2 {
            return Err(PostError::InvalidGeometry(format!(
                "cut plane needs at least 2 nodes, got {}",
                rows.len()
            )));
        }
        if rows
            .iter()
            .any(|(x, n, s)| !x.is_finite() || !n.is_finite() || !s.is_finite())
        {
            return Err(PostError::InvalidGeometry(
                "non-finite cut plane entry".into(),
            ));
        }
        rows.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(Self {
            x: rows.iter().map(|r| r.0).collect(),
            normal: rows.iter().map(|r| r.1).collect(),
            shear: rows.iter().map(|r| r.2).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Tributary width per node: half the adjacent intervals, end nodes get
    /// half of their single interval.
    fn widths(&self) -> Vec<f64> {
        let n = self.x.len();
        let mut w = vec![0.0; n];
        w[0] = (self.x[1] - self.x[0]) / 2.0;
        w[n - 1] = (self.x[n - 1] - self.x[n - 2]) / 2.0;
        for i in 1..n - 1 {
            w[i] = (self.x[i + 1] - self.x[i - 1]) / 2.0;
        }
        w
    }

    /// `(A, R, S)`: total width, normal resultant and shear resultant.
    pub fn resultants(&self) -> (f64, f64, f64) {
        let widths = self.widths();
        let a: f64 = widths.iter().sum();
        let r: f64 = widths.iter().zip(&self.normal).map(|(w, n)| w * n).sum();
        let s: f64 = widths.iter().zip(&self.shear).map(|(w, v)| w * v).sum();
        (a, r, s)
    }
}

/// Per-frame safety factors plus the accumulated time below K = 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyHistory {
    pub k: Vec<f64>,
    pub fail_duration: f64,
}

impl SafetyHistory {
    pub(crate) fn from_factors(k: Vec<f64>, dt: f64) -> Self {
        let fail_duration = k.iter().filter(|&&v| v < 1.0).count() as f64 * dt;
        Self { k, fail_duration }
    }

    pub fn min(&self) -> f64 {
        self.k.iter().copied().fold(f64::INFINITY, f64::min)
    }
}

pub(crate) fn limit_state(
    resisting: f64,
    sliding: f64,
    case: LoadCase,
) -> f64 {
    let denom = sliding.abs() * GAMMA_0 * case.phi() * case.gamma_d();
    if denom == 0.0 {
        return f64::INFINITY;
    }
    resisting / denom
}

/// Safety factor of one 2-D cut plane.
pub fn safety_factor_2d(
    plane: &CutPlane2D,
    params: &ShearParams,
    case: LoadCase,
) -> PostResult<f64> {
    let (a, r, s) = plane.resultants();
    if a <= 0.0 {
        return Err(PostError::InvalidGeometry(
            "cut plane has zero width".into(),
        ));
    }
    let resisting =
        params.friction / GAMMA_F * (-r).max(0.0) + params.cohesion / GAMMA_C * a * 1e6;
    let k = limit_state(resisting, s, case);
    debug!("2d cut plane: A={a:.3} R={r:.3e} S={s:.3e} K={k:.3}");
    Ok(k)
}

/// Safety factor per frame of a dynamic history, with the fail duration
/// accumulated as frames-below-one times `dt`.
pub fn safety_factor_history_2d(
    frames: &[CutPlane2D],
    params: &ShearParams,
    dt: f64,
) -> PostResult<SafetyHistory> {
    if frames.is_empty() {
        return Err(PostError::InvalidGeometry("empty frame list".into()));
    }
    let k = frames
        .iter()
        .map(|plane| safety_factor_2d(plane, params, LoadCase::Dynamic))
        .collect::<PostResult<Vec<f64>>>()?;
    Ok(SafetyHistory::from_factors(k, dt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_tributary_widths() {
        let plane = CutPlane2D::new(vec![
            (0.0, 0.0, 0.0),
            (1.0, 0.0, 0.0),
            (3.0, 0.0, 0.0),
        ])
        .unwrap();
        let (a, _, _) = plane.resultants();
        // 0.5 + 1.5 + 1.0 spans the full 3.0 width.
        assert_relative_eq!(a, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_static_limit_state_boundary() {
        // A = 1, R = -1, S = 1; f'/γf = 1.65 matches the denominator
        // 1.1 * 1.0 * 1.5 exactly, so K = 1.
        let plane = CutPlane2D::new(vec![(0.0, -1.0, 1.0), (1.0, -1.0, 1.0)]).unwrap();
        let params = ShearParams {
            friction: 2.805,
            cohesion: 0.0,
        };
        let k = safety_factor_2d(&plane, &params, LoadCase::Static).unwrap();
        assert_relative_eq!(k, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_tension_gives_no_friction_resistance() {
        // R > 0 (net tension): only cohesion resists.
        let plane = CutPlane2D::new(vec![(0.0, 2.0, 1.0), (1.0, 2.0, 1.0)]).unwrap();
        let params = ShearParams {
            friction: 10.0,
            cohesion: 0.0,
        };
        let k = safety_factor_2d(&plane, &params, LoadCase::Static).unwrap();
        assert_relative_eq!(k, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cohesion_term_in_mpa() {
        // Pure cohesion: K = (c/γc · A · 1e6) / (|S| · 1.65).
        let plane = CutPlane2D::new(vec![(0.0, 0.0, 1e6), (1.0, 0.0, 1e6)]).unwrap();
        let params = ShearParams {
            friction: 0.0,
            cohesion: 0.5,
        };
        let k = safety_factor_2d(&plane, &params, LoadCase::Static).unwrap();
        assert_relative_eq!(k, 0.25 / 1.65, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_shear_is_infinitely_safe() {
        let plane = CutPlane2D::new(vec![(0.0, -1.0, 0.0), (1.0, -1.0, 0.0)]).unwrap();
        let params = ShearParams {
            friction: 1.0,
            cohesion: 0.0,
        };
        let k = safety_factor_2d(&plane, &params, LoadCase::Static).unwrap();
        assert!(k.is_infinite());
    }

    #[test]
    fn test_dynamic_history_fail_duration() {
        // f'/γf = 1.0, R = -2 per frame; shear tuned so K hits the targets.
        let params = ShearParams {
            friction: 1.7,
            cohesion: 0.0,
        };
        let denom = GAMMA_0 * LoadCase::Dynamic.phi() * LoadCase::Dynamic.gamma_d();
        let targets = [1.2, 0.9, 0.95, 1.5];
        let frames: Vec<CutPlane2D> = targets
            .iter()
            .map(|k_target| {
                let s = 2.0 / (denom * k_target);
                CutPlane2D::new(vec![(0.0, -2.0, s), (1.0, -2.0, s)]).unwrap()
            })
            .collect();
        let history = safety_factor_history_2d(&frames, &params, 0.01).unwrap();
        for (k, target) in history.k.iter().zip(&targets) {
            assert_relative_eq!(*k, *target, epsilon = 1e-9);
        }
        // Two frames below 1.0 at dt = 0.01.
        assert_relative_eq!(history.fail_duration, 0.02, epsilon = 1e-12);
        assert_relative_eq!(history.min(), 0.9, epsilon = 1e-9);
    }

    #[test]
    fn test_single_node_plane_rejected() {
        assert!(CutPlane2D::new(vec![(0.0, 1.0, 1.0)]).is_err());
    }
}
