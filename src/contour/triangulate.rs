//! Delaunay triangulation and barycentric evaluation for the exact
//! interpolation mode
//!
//! Bowyer-Watson incremental insertion with a super-triangle. The resulting
//! interpolant is linear per triangle and undefined (NaN) outside the convex
//! hull of the samples, which is what drives the exact → extrapolated
//! fallback in the contour engine.

use crate::error::{PostError, PostResult};

#[derive(Debug, Clone, Copy)]
struct Triangle {
    v: [usize; 3],
    // Circumcircle center and squared radius, cached at construction.
    cx: f64,
    cy: f64,
    r2: f64,
}

impl Triangle {
    fn new(v: [usize; 3], pts: &[[f64; 2]]) -> Self {
        let [a, b, c] = [pts[v[0]], pts[v[1]], pts[v[2]]];
        let d = 2.0 * (a[0] * (b[1] - c[1]) + b[0] * (c[1] - a[1]) + c[0] * (a[1] - b[1]));
        if d.abs() < 1e-14 {
            // Degenerate sliver: an unbounded circumcircle makes it a bad
            // triangle for every insertion, so it cannot survive.
            return Self {
                v,
                cx: 0.0,
                cy: 0.0,
                r2: f64::INFINITY,
            };
        }
        let a2 = a[0] * a[0] + a[1] * a[1];
        let b2 = b[0] * b[0] + b[1] * b[1];
        let c2 = c[0] * c[0] + c[1] * c[1];
        let cx = (a2 * (b[1] - c[1]) + b2 * (c[1] - a[1]) + c2 * (a[1] - b[1])) / d;
        let cy = (a2 * (c[0] - b[0]) + b2 * (a[0] - c[0]) + c2 * (b[0] - a[0])) / d;
        let r2 = (a[0] - cx).powi(2) + (a[1] - cy).powi(2);
        Self { v, cx, cy, r2 }
    }

    fn circumcircle_contains(&self, p: [f64; 2]) -> bool {
        if self.r2.is_infinite() {
            return true;
        }
        (p[0] - self.cx).powi(2) + (p[1] - self.cy).powi(2) <= self.r2 * (1.0 + 1e-12)
    }
}

/// A Delaunay triangulation over scattered sample points, paired with their
/// values for linear interpolation.
#[derive(Debug, Clone)]
pub struct Triangulation {
    points: Vec<[f64; 2]>,
    values: Vec<f64>,
    triangles: Vec<[usize; 3]>,
}

impl Triangulation {
    /// Triangulate `(x, y)` sample sites carrying `values`. Exact duplicate
    /// sites keep the first value. Fails with an internal interpolation
    /// error when fewer than 3 distinct sites exist or all sites are
    /// collinear; the caller recovers by switching to the extrapolated mode.
    pub fn build(x: &[f64], y: &[f64], values: &[f64]) -> PostResult<Self> {
        let mut points: Vec<[f64; 2]> = Vec::with_capacity(x.len());
        let mut vals: Vec<f64> = Vec::with_capacity(x.len());
        for i in 0..x.len() {
            let p = [x[i], y[i]];
            if !points.contains(&p) {
                points.push(p);
                vals.push(values[i]);
            }
        }
        if points.len() < 3 {
            return Err(PostError::Interpolation(format!(
                "need at least 3 distinct sample sites, got {}",
                points.len()
            )));
        }

        // Super-triangle comfortably containing every site.
        let mut min = [f64::INFINITY; 2];
        let mut max = [f64::NEG_INFINITY; 2];
        for p in &points {
            for k in 0..2 {
                min[k] = min[k].min(p[k]);
                max[k] = max[k].max(p[k]);
            }
        }
        let span = (max[0] - min[0]).max(max[1] - min[1]).max(1.0);
        let mid = [(min[0] + max[0]) / 2.0, (min[1] + max[1]) / 2.0];
        let n = points.len();
        let mut all = points.clone();
        all.push([mid[0] - 20.0 * span, mid[1] - 10.0 * span]);
        all.push([mid[0] + 20.0 * span, mid[1] - 10.0 * span]);
        all.push([mid[0], mid[1] + 20.0 * span]);

        let mut tris = vec![Triangle::new([n, n + 1, n + 2], &all)];

        for i in 0..n {
            let p = all[i];
            let (bad, good): (Vec<Triangle>, Vec<Triangle>) =
                tris.into_iter().partition(|t| t.circumcircle_contains(p));

            // Edges of the cavity: those belonging to exactly one bad triangle.
            let mut edges: Vec<(usize, usize)> = Vec::new();
            for t in &bad {
                for e in [(t.v[0], t.v[1]), (t.v[1], t.v[2]), (t.v[2], t.v[0])] {
                    let key = (e.0.min(e.1), e.0.max(e.1));
                    if let Some(pos) = edges.iter().position(|&k| k == key) {
                        edges.swap_remove(pos);
                    } else {
                        edges.push(key);
                    }
                }
            }

            tris = good;
            for (a, b) in edges {
                tris.push(Triangle::new([a, b, i], &all));
            }
        }

        let triangles: Vec<[usize; 3]> = tris
            .into_iter()
            .filter(|t| t.v.iter().all(|&v| v < n))
            .map(|t| t.v)
            .collect();
        if triangles.is_empty() {
            return Err(PostError::Interpolation(
                "degenerate triangulation (collinear sample sites)".into(),
            ));
        }

        Ok(Self {
            points,
            values: vals,
            triangles,
        })
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Linear interpolation at `(x, y)`; NaN outside the convex hull.
    pub fn interpolate(&self, x: f64, y: f64) -> f64 {
        for t in &self.triangles {
            let [a, b, c] = [self.points[t[0]], self.points[t[1]], self.points[t[2]]];
            // Cheap bounding-box reject before the barycentric solve.
            if x < a[0].min(b[0]).min(c[0]) - 1e-12
                || x > a[0].max(b[0]).max(c[0]) + 1e-12
                || y < a[1].min(b[1]).min(c[1]) - 1e-12
                || y > a[1].max(b[1]).max(c[1]) + 1e-12
            {
                continue;
            }
            let det = (b[1] - c[1]) * (a[0] - c[0]) + (c[0] - b[0]) * (a[1] - c[1]);
            if det.abs() < 1e-14 {
                continue;
            }
            let l1 = ((b[1] - c[1]) * (x - c[0]) + (c[0] - b[0]) * (y - c[1])) / det;
            let l2 = ((c[1] - a[1]) * (x - c[0]) + (a[0] - c[0]) * (y - c[1])) / det;
            let l3 = 1.0 - l1 - l2;
            let tol = -1e-9;
            if l1 >= tol && l2 >= tol && l3 >= tol {
                return l1 * self.values[t[0]] + l2 * self.values[t[1]] + l3 * self.values[t[2]];
            }
        }
        f64::NAN
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_collinear_sites_fail() {
        let x = [0.0, 1.0, 2.0];
        let y = [0.0, 0.0, 0.0];
        let z = [1.0, 2.0, 3.0];
        assert!(matches!(
            Triangulation::build(&x, &y, &z),
            Err(PostError::Interpolation(_))
        ));
    }

    #[test]
    fn test_square_triangulation() {
        let x = [0.0, 1.0, 1.0, 0.0];
        let y = [0.0, 0.0, 1.0, 1.0];
        let z = [0.0; 4];
        let t = Triangulation::build(&x, &y, &z).unwrap();
        assert_eq!(t.triangle_count(), 2);
    }

    #[test]
    fn test_linear_precision() {
        // A linear field must be reproduced exactly inside the hull.
        let f = |x: f64, y: f64| 2.0 * x - 3.0 * y + 1.0;
        let x = [0.0, 4.0, 4.0, 0.0, 2.0];
        let y = [0.0, 0.0, 4.0, 4.0, 2.0];
        let z: Vec<f64> = x.iter().zip(&y).map(|(&x, &y)| f(x, y)).collect();
        let t = Triangulation::build(&x, &y, &z).unwrap();
        for &(qx, qy) in &[(1.0, 1.0), (3.0, 2.0), (2.0, 3.5), (0.5, 0.25)] {
            assert_relative_eq!(t.interpolate(qx, qy), f(qx, qy), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_nan_outside_hull() {
        let x = [0.0, 1.0, 0.0];
        let y = [0.0, 0.0, 1.0];
        let z = [1.0, 1.0, 1.0];
        let t = Triangulation::build(&x, &y, &z).unwrap();
        assert!(t.interpolate(2.0, 2.0).is_nan());
        assert!(t.interpolate(0.25, 0.25).is_finite());
    }

    #[test]
    fn test_duplicate_sites_keep_first() {
        let x = [0.0, 0.0, 1.0, 0.0];
        let y = [0.0, 1.0, 0.0, 0.0];
        let z = [5.0, 0.0, 0.0, 99.0];
        let t = Triangulation::build(&x, &y, &z).unwrap();
        assert_relative_eq!(t.interpolate(1e-6, 1e-6), 5.0, epsilon = 1e-3);
    }
}
