//! Seismic post-processing for gravity and arch dam FE results
//!
//! This library turns raw solver exports (mesh decks, result tables, contact
//! printouts) into engineering deliverables:
//! - Section contour plots of stress, displacement, damage and joint opening,
//!   with boundary clipping, hole masking and automatic exact → extrapolated
//!   interpolation fallback
//! - Relative-displacement envelopes over dynamic time histories
//! - Sliding-stability safety factors: 2-D cut planes and 3-D two-plane
//!   wedges, static and per-frame dynamic with fail-duration accounting
//! - Transverse joint opening extraction and reduction
//!
//! ## Example
//! ```rust
//! use dam_post::prelude::*;
//!
//! // A section outline in local coordinates and a handful of samples.
//! let boundary = Boundary::new(vec![[0.0, 0.0], [10.0, 0.0], [10.0, 8.0], [0.0, 8.0]])?;
//! let sample = FieldSample::new(
//!     vec![1.0, 9.0, 5.0, 1.0],
//!     vec![1.0, 1.0, 7.0, 7.0],
//!     vec![-2.0, -1.0, 0.5, 0.0],
//! )?;
//!
//! let plot = compute_contour(&sample, &boundary, &[], &ContourOptions::default())?;
//! assert!(plot.figure.svg.contains("<svg"));
//!
//! // Stability of a horizontal cut plane under the same section.
//! let plane = CutPlane2D::new(vec![(0.0, -1.2e6, 0.4e6), (10.0, -0.8e6, 0.3e6)])?;
//! let params = ShearParams { friction: 1.1, cohesion: 0.9 };
//! let k = safety_factor_2d(&plane, &params, LoadCase::Static)?;
//! assert!(k > 1.0);
//! # Ok::<(), dam_post::error::PostError>(())
//! ```

pub mod contour;
pub mod envelope;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod io;
pub mod joint;
pub mod model;
pub mod stability;

// Re-export common types
pub mod prelude {
    pub use crate::contour::{
        compute_contour, compute_contour_multi, compute_grid, ContourGrid, ContourOptions,
        ContourPlot, Extremum, ExtremumMark, Figure, InterpMethod, Levels, RbfKernel,
    };
    pub use crate::envelope::{compute_envelope, Envelope, ReferenceNode, TimeSeriesField};
    pub use crate::error::{PostError, PostResult};
    pub use crate::frame::LocalFrame;
    pub use crate::geometry::Boundary;
    pub use crate::io::{MeshSets, StressHistory, Table};
    pub use crate::joint::{JointRow, JointSeries};
    pub use crate::model::{FieldSample, NodeSet, Section};
    pub use crate::stability::{
        safety_factor_2d, safety_factor_3d, safety_factor_history_2d, safety_factor_history_3d,
        CutPlane2D, LoadCase, PlaneStress, SafetyHistory, ShearParams, SlidingPlane,
    };
}
