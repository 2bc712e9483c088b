//! Relative-displacement envelopes over time-history results
//!
//! Dynamic displacement output is absolute; what matters structurally is the
//! motion relative to a reference node (typically at the dam heel). Each
//! frame is re-based by subtracting the reference node's value, then the
//! per-node maximum and minimum over all frames form the envelope.

use crate::error::{PostError, PostResult};
use serde::{Deserialize, Serialize};

/// Squared-distance tolerance when resolving a reference node by local
/// coordinates.
pub const REFERENCE_DISTANCE_SQ: f64 = 1.0;

/// One scalar field sampled at a fixed node list over many frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeriesField {
    node_ids: Vec<i64>,
    frames: Vec<Vec<f64>>,
}

impl TimeSeriesField {
    /// Every frame must carry one value per node.
    pub fn new(node_ids: Vec<i64>, frames: Vec<Vec<f64>>) -> PostResult<Self> {
        if node_ids.is_empty() {
            return Err(PostError::InvalidGeometry("empty node list".into()));
        }
        if frames.is_empty() {
            return Err(PostError::InvalidGeometry("no frames".into()));
        }
        for (k, frame) in frames.iter().enumerate() {
            if frame.len() != node_ids.len() {
                return Err(PostError::FrameCountMismatch {
                    left: node_ids.len(),
                    right: frame.len(),
                });
            }
            if frame.iter().any(|v| !v.is_finite()) {
                return Err(PostError::InvalidGeometry(format!(
                    "non-finite value in frame {k}"
                )));
            }
        }
        Ok(Self { node_ids, frames })
    }

    pub fn node_ids(&self) -> &[i64] {
        &self.node_ids
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

/// How to pick the node every frame is re-based against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ReferenceNode {
    /// By node ID.
    Id(i64),
    /// By local section coordinates; the nearest node within
    /// [`REFERENCE_DISTANCE_SQ`] wins.
    Local { x: f64, y: f64 },
}

/// Per-node extremes of the re-based field, with the local coordinates
/// carried along for contouring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub node_ids: Vec<i64>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub max: Vec<f64>,
    pub min: Vec<f64>,
}

fn resolve_reference(
    series: &TimeSeriesField,
    coords: &[[f64; 2]],
    reference: ReferenceNode,
) -> PostResult<usize> {
    match reference {
        ReferenceNode::Id(id) => series
            .node_ids
            .iter()
            .position(|&n| n == id)
            .ok_or_else(|| PostError::ReferenceNodeNotFound(format!("node {id} not in series"))),
        ReferenceNode::Local { x, y } => {
            let mut best: Option<(usize, f64)> = None;
            for (i, p) in coords.iter().enumerate() {
                let d2 = (p[0] - x).powi(2) + (p[1] - y).powi(2);
                if d2 < REFERENCE_DISTANCE_SQ && best.map_or(true, |(_, bd)| d2 < bd) {
                    best = Some((i, d2));
                }
            }
            best.map(|(i, _)| i).ok_or_else(|| {
                PostError::ReferenceNodeNotFound(format!("no node within 1.0 of ({x}, {y})"))
            })
        }
    }
}

/// Compute the relative-displacement envelope. `coords` pairs with the
/// series node list in order.
pub fn compute_envelope(
    series: &TimeSeriesField,
    coords: &[[f64; 2]],
    reference: ReferenceNode,
) -> PostResult<Envelope> {
    if coords.len() != series.node_ids.len() {
        return Err(PostError::FrameCountMismatch {
            left: series.node_ids.len(),
            right: coords.len(),
        });
    }
    let ref_idx = resolve_reference(series, coords, reference)?;

    let n = series.node_ids.len();
    let mut max = vec![f64::NEG_INFINITY; n];
    let mut min = vec![f64::INFINITY; n];
    for frame in &series.frames {
        let base = frame[ref_idx];
        for i in 0..n {
            let v = frame[i] - base;
            max[i] = max[i].max(v);
            min[i] = min[i].min(v);
        }
    }

    Ok(Envelope {
        node_ids: series.node_ids.clone(),
        x: coords.iter().map(|p| p[0]).collect(),
        y: coords.iter().map(|p| p[1]).collect(),
        max,
        min,
    })
}
