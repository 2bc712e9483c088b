//! Radial-basis-function interpolation for the extrapolated mode
//!
//! Fits a globally-defined interpolant through every sample site by solving
//! the dense symmetric kernel system with an LU decomposition. Unlike the
//! exact mode this resolves grid cells outside the convex hull of the
//! samples, which is what the boundary-clipped contour grids need near
//! section edges.

use crate::error::{PostError, PostResult};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Kernel function applied to inter-site distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RbfKernel {
    /// r
    Linear,
    /// r³ (the default of the stress/displacement contour paths)
    #[default]
    Cubic,
    /// r² ln r
    ThinPlate,
    /// sqrt((r/ε)² + 1)
    Multiquadric,
    /// exp(−(r/ε)²)
    Gaussian,
}

impl RbfKernel {
    fn eval(self, r: f64, epsilon: f64) -> f64 {
        match self {
            RbfKernel::Linear => r,
            RbfKernel::Cubic => r * r * r,
            RbfKernel::ThinPlate => {
                if r > 0.0 {
                    r * r * r.ln()
                } else {
                    0.0
                }
            }
            RbfKernel::Multiquadric => ((r / epsilon).powi(2) + 1.0).sqrt(),
            RbfKernel::Gaussian => (-(r / epsilon).powi(2)).exp(),
        }
    }
}

/// A fitted radial-basis-function interpolant.
#[derive(Debug, Clone)]
pub struct Rbf {
    sites: Vec<[f64; 2]>,
    weights: DVector<f64>,
    kernel: RbfKernel,
    epsilon: f64,
}

impl Rbf {
    /// Fit an interpolant through every `(x, y, value)` sample. The shape
    /// parameter ε defaults to the average site spacing estimated from the
    /// bounding box. Fails with an internal interpolation error when the
    /// kernel system is singular (e.g. duplicated sites).
    pub fn fit(x: &[f64], y: &[f64], values: &[f64], kernel: RbfKernel) -> PostResult<Self> {
        let n = x.len();
        if n == 0 {
            return Err(PostError::Interpolation("no sample sites".into()));
        }
        let sites: Vec<[f64; 2]> = (0..n).map(|i| [x[i], y[i]]).collect();

        let mut min = [f64::INFINITY; 2];
        let mut max = [f64::NEG_INFINITY; 2];
        for p in &sites {
            for k in 0..2 {
                min[k] = min[k].min(p[k]);
                max[k] = max[k].max(p[k]);
            }
        }
        let area = (max[0] - min[0]) * (max[1] - min[1]);
        let epsilon = if area > 0.0 {
            (area / n as f64).sqrt()
        } else {
            1.0
        };

        let mut a = DMatrix::zeros(n, n);
        for i in 0..n {
            for j in i..n {
                let r = ((sites[i][0] - sites[j][0]).powi(2)
                    + (sites[i][1] - sites[j][1]).powi(2))
                .sqrt();
                let v = kernel.eval(r, epsilon);
                a[(i, j)] = v;
                a[(j, i)] = v;
            }
        }
        let b = DVector::from_column_slice(values);
        let weights = a
            .lu()
            .solve(&b)
            .ok_or_else(|| PostError::Interpolation("singular RBF kernel system".into()))?;

        Ok(Self {
            sites,
            weights,
            kernel,
            epsilon,
        })
    }

    /// Evaluate the interpolant at `(x, y)`. Defined everywhere.
    pub fn eval(&self, x: f64, y: f64) -> f64 {
        let mut sum = 0.0;
        for (site, w) in self.sites.iter().zip(self.weights.iter()) {
            let r = ((x - site[0]).powi(2) + (y - site[1]).powi(2)).sqrt();
            sum += w * self.kernel.eval(r, self.epsilon);
        }
        sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_exact_at_sites() {
        let x = [0.0, 1.0, 0.0, 1.0, 0.5];
        let y = [0.0, 0.0, 1.0, 1.0, 0.5];
        let z = [1.0, 2.0, 3.0, 4.0, 2.5];
        for kernel in [RbfKernel::Linear, RbfKernel::Cubic, RbfKernel::Multiquadric] {
            let rbf = Rbf::fit(&x, &y, &z, kernel).unwrap();
            for i in 0..x.len() {
                assert_relative_eq!(rbf.eval(x[i], y[i]), z[i], epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn test_defined_outside_hull() {
        let x = [0.0, 1.0, 0.0];
        let y = [0.0, 0.0, 1.0];
        let z = [1.0, 1.0, 1.0];
        let rbf = Rbf::fit(&x, &y, &z, RbfKernel::Cubic).unwrap();
        assert!(rbf.eval(5.0, 5.0).is_finite());
    }

    #[test]
    fn test_collinear_sites_still_fit() {
        // The configuration that breaks the exact mode must stay solvable
        // here, otherwise the fallback would have nowhere to go.
        let x = [0.0, 1.0, 2.0];
        let y = [0.0, 0.0, 0.0];
        let z = [0.0, 1.0, 4.0];
        let rbf = Rbf::fit(&x, &y, &z, RbfKernel::Cubic).unwrap();
        assert_relative_eq!(rbf.eval(1.0, 0.0), 1.0, epsilon = 1e-8);
    }
}
