//! Two-plane wedge stability in 3-D
//!
//! A dam-shoulder block bounded by two non-parallel sliding planes. Nodal
//! tributary areas come from the reaction-force vectors of a rigid contact
//! run projected on the plane normal. Full stress tensors are resolved into
//! normal and sliding-direction components, integrated per plane, and fed
//! into the same partial-coefficient limit state as the 2-D check.

use super::{limit_state, LoadCase, SafetyHistory, ShearParams, GAMMA_C, GAMMA_F};
use crate::error::{PostError, PostResult};
use log::debug;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

/// Full symmetric stress tensor at one node, Pa, compression negative.
/// Component order: S11, S22, S33, S12, S13, S23.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlaneStress {
    pub node: i64,
    pub tensor: [f64; 6],
}

impl PlaneStress {
    fn matrix(&self) -> Matrix3<f64> {
        let [s11, s22, s33, s12, s13, s23] = self.tensor;
        Matrix3::new(s11, s12, s13, s12, s22, s23, s13, s23, s33)
    }
}

/// Integrated force resultants of one plane for one stress state.
#[derive(Debug, Clone, Copy)]
struct PlaneForces {
    area: f64,
    /// Normal compression force (positive when the plane is pressed shut).
    clamp: f64,
    /// Driving force along the sliding direction.
    drive: f64,
}

/// One sliding plane: unit normal plus per-node tributary areas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlidingPlane {
    normal: Vector3<f64>,
    nodes: Vec<(i64, f64)>,
}

impl SlidingPlane {
    /// Build a plane from its (not necessarily unit) normal and the nodal
    /// reaction vectors; each node's tributary area is the reaction
    /// component along the normal.
    pub fn new(normal: Vector3<f64>, reactions: &[(i64, [f64; 3])]) -> PostResult<Self> {
        let n = normal.norm();
        if n < 1e-12 {
            return Err(PostError::InvalidGeometry("zero plane normal".into()));
        }
        if reactions.is_empty() {
            return Err(PostError::InvalidGeometry(
                "sliding plane has no nodes".into(),
            ));
        }
        let unit = normal / n;
        let nodes = reactions
            .iter()
            .map(|&(id, r)| (id, unit.dot(&Vector3::from(r)).abs()))
            .collect();
        Ok(Self { normal: unit, nodes })
    }

    pub fn normal(&self) -> Vector3<f64> {
        self.normal
    }

    pub fn total_area(&self) -> f64 {
        self.nodes.iter().map(|(_, a)| a).sum()
    }

    /// Resolve nodal stress tensors into plane resultants along the sliding
    /// direction `t`. Every plane node must have a stress record.
    fn resolved(&self, stresses: &[PlaneStress], t: &Vector3<f64>) -> PostResult<PlaneForces> {
        let mut area = 0.0;
        let mut clamp = 0.0;
        let mut drive = 0.0;
        for &(id, a) in &self.nodes {
            let stress = stresses
                .iter()
                .find(|s| s.node == id)
                .ok_or(PostError::NodeNotFound(id))?;
            let traction = stress.matrix() * self.normal;
            let sigma_n = traction.dot(&self.normal);
            let tangential = traction - sigma_n * self.normal;
            let sigma_t = tangential.dot(t);
            area += a;
            clamp -= sigma_n * a;
            drive += sigma_t * a;
        }
        Ok(PlaneForces { area, clamp, drive })
    }
}

/// Intersection direction of the two planes, the kinematically admissible
/// sliding direction of the wedge. Parallel planes cannot form a wedge.
pub fn sliding_direction(n1: Vector3<f64>, n2: Vector3<f64>) -> PostResult<Vector3<f64>> {
    let t = n1.cross(&n2);
    let norm = t.norm();
    if norm < 1e-12 {
        return Err(PostError::InvalidGeometry(
            "sliding planes are parallel".into(),
        ));
    }
    Ok(t / norm)
}

fn wedge_factor(
    resolved: &[(PlaneForces, &ShearParams)],
    case: LoadCase,
) -> f64 {
    let mut resisting = 0.0;
    let mut driving = 0.0;
    for (forces, params) in resolved {
        resisting += params.cohesion / GAMMA_C * forces.area * 1e6
            + params.friction / GAMMA_F * forces.clamp.max(0.0);
        driving += forces.drive.abs();
    }
    limit_state(resisting, driving, case)
}

/// Safety factor of a two-plane wedge for one stress state per plane.
pub fn safety_factor_3d(
    plane_a: &SlidingPlane,
    stresses_a: &[PlaneStress],
    params_a: &ShearParams,
    plane_b: &SlidingPlane,
    stresses_b: &[PlaneStress],
    params_b: &ShearParams,
    case: LoadCase,
) -> PostResult<f64> {
    let t = sliding_direction(plane_a.normal, plane_b.normal)?;
    let fa = plane_a.resolved(stresses_a, &t)?;
    let fb = plane_b.resolved(stresses_b, &t)?;
    let k = wedge_factor(&[(fa, params_a), (fb, params_b)], case);
    debug!(
        "wedge: A={:.3} W={:.3e}/{:.3e} P={:.3e}/{:.3e} K={:.3}",
        fa.area + fb.area,
        fa.clamp,
        fb.clamp,
        fa.drive,
        fb.drive,
        k
    );
    Ok(k)
}

/// Per-frame wedge safety factors over two synchronized stress histories.
/// The histories must carry the same number of frames.
pub fn safety_factor_history_3d(
    plane_a: &SlidingPlane,
    frames_a: &[Vec<PlaneStress>],
    params_a: &ShearParams,
    plane_b: &SlidingPlane,
    frames_b: &[Vec<PlaneStress>],
    params_b: &ShearParams,
    dt: f64,
) -> PostResult<SafetyHistory> {
    if frames_a.len() != frames_b.len() {
        return Err(PostError::FrameCountMismatch {
            left: frames_a.len(),
            right: frames_b.len(),
        });
    }
    if frames_a.is_empty() {
        return Err(PostError::InvalidGeometry("empty frame list".into()));
    }
    let t = sliding_direction(plane_a.normal, plane_b.normal)?;
    let mut k = Vec::with_capacity(frames_a.len());
    for (sa, sb) in frames_a.iter().zip(frames_b) {
        let fa = plane_a.resolved(sa, &t)?;
        let fb = plane_b.resolved(sb, &t)?;
        k.push(wedge_factor(
            &[(fa, params_a), (fb, params_b)],
            LoadCase::Dynamic,
        ));
    }
    Ok(SafetyHistory::from_factors(k, dt))
}
