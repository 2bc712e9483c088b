//! Scattered-data contouring with extrapolation, hole masking and boundary
//! clipping
//!
//! The engine interpolates a [`FieldSample`] onto a regular grid spanning the
//! boundary's bounding box, masks cells outside the boundary or inside holes
//! to NaN, and optionally renders line/filled contours with an extremum
//! annotation. Two interpolation modes exist: `Exact` (linear over a Delaunay
//! triangulation, undefined outside the sample hull) and `Extrapolated`
//! (radial-basis-function fit, defined everywhere). The default `Auto` policy
//! attempts exact first and falls back when the triangulation degenerates or
//! leaves required in-boundary cells unresolved.

pub mod rbf;
pub mod render;
pub mod triangulate;

pub use rbf::{Rbf, RbfKernel};
pub use render::Figure;

use crate::error::{PostError, PostResult};
use crate::geometry::Boundary;
use crate::model::FieldSample;
use log::debug;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use triangulate::Triangulation;

/// Interpolation mode selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InterpMethod {
    /// Delaunay/linear only; NaN outside the sample hull.
    Exact,
    /// RBF only; globally defined.
    Extrapolated,
    /// Exact first, RBF fallback on degenerate input or unresolved cells.
    #[default]
    Auto,
}

/// Contour level specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Levels {
    /// N auto-spaced levels strictly between the data min and max.
    Count(usize),
    /// Explicit ascending level values.
    Explicit(Vec<f64>),
}

impl Default for Levels {
    fn default() -> Self {
        Levels::Count(10)
    }
}

impl Levels {
    /// Resolve to concrete level values over `(lo, hi)`.
    pub fn resolve(&self, lo: f64, hi: f64) -> Vec<f64> {
        match self {
            Levels::Count(n) => {
                if hi <= lo || *n == 0 {
                    return Vec::new();
                }
                (1..=*n)
                    .map(|k| lo + (hi - lo) * k as f64 / (*n as f64 + 1.0))
                    .collect()
            }
            Levels::Explicit(values) => values.clone(),
        }
    }
}

/// Which raw-sample extremum to mark on the figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtremumMark {
    Max,
    Min,
    /// Largest absolute value (the default for mixed-sign stress fields).
    #[default]
    Abs,
    None,
}

/// Options for one contour computation. Defaults mirror the standard
/// section-plot configuration: 100×100 grid, auto interpolation with a cubic
/// RBF fallback, 10 levels, 1 decimal digit on labels, absolute extremum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContourOptions {
    /// Grid resolution per axis.
    pub dpi: usize,
    pub method: InterpMethod,
    /// Kernel used by the extrapolated mode.
    pub kernel: RbfKernel,
    pub levels: Levels,
    /// Decimal digits on contour labels.
    pub decimals: usize,
    pub extremum: ExtremumMark,
    /// Deletion height: samples with y below this are dropped before
    /// interpolating (base-contact stress concentration policy).
    pub base_height: Option<f64>,
    /// Override the lower end of the auto level range.
    pub vmin: Option<f64>,
    /// Override the upper end of the auto level range.
    pub vmax: Option<f64>,
    /// Paint filled bands under the contour lines.
    pub filled: bool,
}

impl Default for ContourOptions {
    fn default() -> Self {
        Self {
            dpi: 100,
            method: InterpMethod::Auto,
            kernel: RbfKernel::Cubic,
            levels: Levels::default(),
            decimals: 1,
            extremum: ExtremumMark::Abs,
            base_height: None,
            vmin: None,
            vmax: None,
            filled: false,
        }
    }
}

impl ContourOptions {
    pub fn with_dpi(mut self, dpi: usize) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn with_method(mut self, method: InterpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_levels(mut self, levels: Levels) -> Self {
        self.levels = levels;
        self
    }

    pub fn with_decimals(mut self, decimals: usize) -> Self {
        self.decimals = decimals;
        self
    }

    pub fn with_extremum(mut self, extremum: ExtremumMark) -> Self {
        self.extremum = extremum;
        self
    }

    pub fn with_base_height(mut self, base: f64) -> Self {
        self.base_height = Some(base);
        self
    }

    pub fn with_range(mut self, vmin: f64, vmax: f64) -> Self {
        self.vmin = Some(vmin);
        self.vmax = Some(vmax);
        self
    }

    pub fn with_filled(mut self, filled: bool) -> Self {
        self.filled = filled;
        self
    }
}

/// A dense regular grid interpolated from a [`FieldSample`], with NaN in
/// every cell outside the boundary or inside a hole. `values[(j, i)]` is the
/// value at `(x[i], y[j])`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContourGrid {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub values: DMatrix<f64>,
}

impl ContourGrid {
    /// `(min, max)` over the unmasked cells, or `None` if every cell is NaN.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for v in self.values.iter().filter(|v| v.is_finite()) {
            lo = lo.min(*v);
            hi = hi.max(*v);
        }
        if lo.is_finite() {
            Some((lo, hi))
        } else {
            None
        }
    }

    /// Fraction of cells that are unmasked and finite.
    pub fn coverage(&self) -> f64 {
        let finite = self.values.iter().filter(|v| v.is_finite()).count();
        finite as f64 / self.values.len() as f64
    }
}

/// The marked extremum of the raw (un-gridded) sample values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Extremum {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

/// Result of a rendered contour computation: the grid for parameter-only
/// re-plots plus the figure.
#[derive(Debug, Clone)]
pub struct ContourPlot {
    pub grid: ContourGrid,
    pub figure: Figure,
    pub extremum: Option<Extremum>,
}

/// Interpolate a sample set onto the boundary's grid without rendering.
pub fn compute_grid(
    sample: &FieldSample,
    boundary: &Boundary,
    holes: &[Boundary],
    options: &ContourOptions,
) -> PostResult<ContourGrid> {
    let filtered = apply_base_height(sample, options)?;
    build_grid(&filtered, boundary, holes, options)
}

/// Interpolate and render one boundary. Returns the grid, the SVG figure and
/// the marked extremum.
pub fn compute_contour(
    sample: &FieldSample,
    boundary: &Boundary,
    holes: &[Boundary],
    options: &ContourOptions,
) -> PostResult<ContourPlot> {
    let filtered = apply_base_height(sample, options)?;
    let grid = build_grid(&filtered, boundary, holes, options)?;
    let (lo, hi) = level_range(&filtered, options);
    let levels = options.levels.resolve(lo, hi);
    let extremum = pick_extremum(&filtered, options.extremum);
    let figure = render::render(&render::RenderSpec {
        grids: std::slice::from_ref(&grid),
        boundaries: std::slice::from_ref(boundary),
        holes,
        levels: &levels,
        decimals: options.decimals,
        filled: options.filled,
        extremum,
    })?;
    Ok(ContourPlot {
        grid,
        figure,
        extremum,
    })
}

/// Multi-surface sections: one grid per boundary, all drawn into a single
/// figure with levels shared across surfaces (derived from the global sample
/// range unless explicit levels are given).
pub fn compute_contour_multi(
    sample: &FieldSample,
    boundaries: &[Boundary],
    holes: &[Boundary],
    options: &ContourOptions,
) -> PostResult<(Vec<ContourGrid>, Figure)> {
    if boundaries.is_empty() {
        return Err(PostError::InvalidGeometry("no boundaries given".into()));
    }
    let filtered = apply_base_height(sample, options)?;
    let grids: Vec<ContourGrid> = boundaries
        .iter()
        .map(|b| build_grid(&filtered, b, holes, options))
        .collect::<PostResult<_>>()?;
    let (lo, hi) = level_range(&filtered, options);
    let levels = options.levels.resolve(lo, hi);
    let extremum = pick_extremum(&filtered, options.extremum);
    let figure = render::render(&render::RenderSpec {
        grids: &grids,
        boundaries,
        holes,
        levels: &levels,
        decimals: options.decimals,
        filled: options.filled,
        extremum,
    })?;
    Ok((grids, figure))
}

fn apply_base_height(sample: &FieldSample, options: &ContourOptions) -> PostResult<FieldSample> {
    if sample.is_empty() {
        return Err(PostError::InvalidGeometry("empty sample set".into()));
    }
    let filtered = match options.base_height {
        Some(base) => sample.filter_above(base),
        None => sample.clone(),
    };
    if filtered.is_empty() {
        return Err(PostError::InvalidGeometry(
            "every sample lies below the deletion height".into(),
        ));
    }
    Ok(filtered)
}

fn level_range(sample: &FieldSample, options: &ContourOptions) -> (f64, f64) {
    let (lo, hi) = sample.value_range();
    (options.vmin.unwrap_or(lo), options.vmax.unwrap_or(hi))
}

fn pick_extremum(sample: &FieldSample, mark: ExtremumMark) -> Option<Extremum> {
    let idx = match mark {
        ExtremumMark::Max => sample.argmax(),
        ExtremumMark::Min => sample.argmin(),
        ExtremumMark::Abs => sample.argmax_abs(),
        ExtremumMark::None => return None,
    };
    Some(Extremum {
        x: sample.x[idx],
        y: sample.y[idx],
        value: sample.z[idx],
    })
}

fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![lo];
    }
    (0..n)
        .map(|i| lo + (hi - lo) * i as f64 / (n as f64 - 1.0))
        .collect()
}

fn build_grid(
    sample: &FieldSample,
    boundary: &Boundary,
    holes: &[Boundary],
    options: &ContourOptions,
) -> PostResult<ContourGrid> {
    if options.dpi < 2 {
        return Err(PostError::InvalidGeometry(format!(
            "grid resolution must be at least 2, got {}",
            options.dpi
        )));
    }
    let (min, max) = boundary.bounding_box();
    let xi = linspace(min[0], max[0], options.dpi);
    let yi = linspace(min[1], max[1], options.dpi);

    // Cells we must resolve: inside the boundary and not inside a hole.
    let ny = yi.len();
    let nx = xi.len();
    let mut required = vec![false; ny * nx];
    for j in 0..ny {
        for i in 0..nx {
            let inside = boundary.contains(xi[i], yi[j])
                && !holes.iter().any(|h| h.contains(xi[i], yi[j]));
            required[j * nx + i] = inside;
        }
    }

    let mut values = match options.method {
        InterpMethod::Exact => exact_values(sample, &xi, &yi)?,
        InterpMethod::Extrapolated => rbf_values(sample, &xi, &yi, options.kernel)?,
        InterpMethod::Auto => match exact_values(sample, &xi, &yi) {
            Ok(v) if covers_required(&v, &required) => v,
            Ok(_) => {
                debug!("exact interpolation left required cells unresolved, extrapolating");
                rbf_values(sample, &xi, &yi, options.kernel)?
            }
            Err(PostError::Interpolation(reason)) => {
                debug!("exact interpolation failed ({reason}), extrapolating");
                rbf_values(sample, &xi, &yi, options.kernel)?
            }
            Err(e) => return Err(e),
        },
    };

    // Boundary/hole masking.
    for j in 0..ny {
        for i in 0..nx {
            if !required[j * nx + i] {
                values[(j, i)] = f64::NAN;
            }
        }
    }

    debug!(
        "contour grid {}x{} from {} samples, coverage {:.0}%",
        nx,
        ny,
        sample.len(),
        100.0 * values.iter().filter(|v| v.is_finite()).count() as f64 / values.len() as f64,
    );

    Ok(ContourGrid {
        x: xi,
        y: yi,
        values,
    })
}

fn covers_required(values: &DMatrix<f64>, required: &[bool]) -> bool {
    let nx = values.ncols();
    for j in 0..values.nrows() {
        for i in 0..nx {
            if required[j * nx + i] && !values[(j, i)].is_finite() {
                return false;
            }
        }
    }
    true
}

fn exact_values(sample: &FieldSample, xi: &[f64], yi: &[f64]) -> PostResult<DMatrix<f64>> {
    let tri = Triangulation::build(&sample.x, &sample.y, &sample.z)?;
    let mut values = DMatrix::zeros(yi.len(), xi.len());
    for (j, &y) in yi.iter().enumerate() {
        for (i, &x) in xi.iter().enumerate() {
            values[(j, i)] = tri.interpolate(x, y);
        }
    }
    Ok(values)
}

fn rbf_values(
    sample: &FieldSample,
    xi: &[f64],
    yi: &[f64],
    kernel: RbfKernel,
) -> PostResult<DMatrix<f64>> {
    let rbf = Rbf::fit(&sample.x, &sample.y, &sample.z, kernel)?;
    let mut values = DMatrix::zeros(yi.len(), xi.len());
    for (j, &y) in yi.iter().enumerate() {
        for (i, &x) in xi.iter().enumerate() {
            values[(j, i)] = rbf.eval(x, y);
        }
    }
    Ok(values)
}
