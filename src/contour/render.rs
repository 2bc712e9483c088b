//! Contour figure rendering
//!
//! Traces iso-lines on the masked grid with marching squares and draws them
//! into an SVG figure: boundary outlines, white-filled holes, labelled
//! levels, optional filled bands and the extremum marker.

use super::{ContourGrid, Extremum};
use crate::error::{PostError, PostResult};
use crate::geometry::Boundary;
use plotters::prelude::*;

/// A rendered figure. The SVG text is self-contained and ready to write to
/// disk or embed.
#[derive(Debug, Clone)]
pub struct Figure {
    pub svg: String,
    pub width: u32,
    pub height: u32,
}

/// Everything one render pass needs. Multi-surface sections pass several
/// grids and boundaries sharing one level set.
pub(crate) struct RenderSpec<'a> {
    pub grids: &'a [ContourGrid],
    pub boundaries: &'a [Boundary],
    pub holes: &'a [Boundary],
    pub levels: &'a [f64],
    pub decimals: usize,
    pub filled: bool,
    pub extremum: Option<Extremum>,
}

const BASE_WIDTH: u32 = 610;

/// Trace the iso-line of `level` across the grid. Cells touching a masked
/// (NaN) corner are skipped; saddle cells are disambiguated by the cell
/// center average. Returns world-coordinate segments.
pub(crate) fn iso_segments(grid: &ContourGrid, level: f64) -> Vec<[(f64, f64); 2]> {
    let mut segments = Vec::new();
    let nx = grid.x.len();
    let ny = grid.y.len();
    for j in 0..ny.saturating_sub(1) {
        for i in 0..nx.saturating_sub(1) {
            let c = [
                (grid.x[i], grid.y[j], grid.values[(j, i)]),
                (grid.x[i + 1], grid.y[j], grid.values[(j, i + 1)]),
                (grid.x[i + 1], grid.y[j + 1], grid.values[(j + 1, i + 1)]),
                (grid.x[i], grid.y[j + 1], grid.values[(j + 1, i)]),
            ];
            if c.iter().any(|&(_, _, v)| v.is_nan()) {
                continue;
            }

            // Crossing points on the four cell edges, in edge order.
            let mut crossings: Vec<(f64, f64)> = Vec::new();
            for k in 0..4 {
                let (x0, y0, v0) = c[k];
                let (x1, y1, v1) = c[(k + 1) % 4];
                if (v0 >= level) != (v1 >= level) {
                    let t = (level - v0) / (v1 - v0);
                    crossings.push((x0 + t * (x1 - x0), y0 + t * (y1 - y0)));
                }
            }
            match crossings.len() {
                2 => segments.push([crossings[0], crossings[1]]),
                4 => {
                    // Saddle: pair the crossings so both halves stay on the
                    // same side as the cell center.
                    let center = c.iter().map(|&(_, _, v)| v).sum::<f64>() / 4.0;
                    if (center >= level) == (c[0].2 >= level) {
                        segments.push([crossings[0], crossings[3]]);
                        segments.push([crossings[1], crossings[2]]);
                    } else {
                        segments.push([crossings[0], crossings[1]]);
                        segments.push([crossings[2], crossings[3]]);
                    }
                }
                _ => {}
            }
        }
    }
    segments
}

// Blue-to-red band colormap for the filled mode.
fn band_color(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0) as u8;
    RGBColor(
        channel(1.5 - (4.0 * t - 3.0).abs()),
        channel(1.5 - (4.0 * t - 2.0).abs()),
        channel(1.5 - (4.0 * t - 1.0).abs()),
    )
}

fn figure_extent(boundaries: &[Boundary]) -> ([f64; 2], [f64; 2]) {
    let mut min = [f64::INFINITY; 2];
    let mut max = [f64::NEG_INFINITY; 2];
    for b in boundaries {
        let (bmin, bmax) = b.bounding_box();
        for k in 0..2 {
            min[k] = min[k].min(bmin[k]);
            max[k] = max[k].max(bmax[k]);
        }
    }
    (min, max)
}

pub(crate) fn render(spec: &RenderSpec) -> PostResult<Figure> {
    let (min, max) = figure_extent(spec.boundaries);
    let dx = (max[0] - min[0]).max(1e-9);
    let dy = (max[1] - min[1]).max(1e-9);
    let height = ((BASE_WIDTH as f64 * dy / dx).round() as u32).clamp(120, 1600);
    let width = BASE_WIDTH;

    // Shared range for filled band colors.
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for g in spec.grids {
        if let Some((glo, ghi)) = g.value_range() {
            lo = lo.min(glo);
            hi = hi.max(ghi);
        }
    }

    let pad_x = dx * 0.03;
    let pad_y = dy * 0.03;
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| PostError::Render(e.to_string()))?;

        let mut chart = ChartBuilder::on(&root)
            .margin(8)
            .x_label_area_size(24)
            .y_label_area_size(40)
            .build_cartesian_2d(
                (min[0] - pad_x)..(max[0] + pad_x),
                (min[1] - pad_y)..(max[1] + pad_y),
            )
            .map_err(|e| PostError::Render(e.to_string()))?;
        chart
            .configure_mesh()
            .disable_mesh()
            .draw()
            .map_err(|e| PostError::Render(e.to_string()))?;

        if spec.filled && hi > lo {
            for grid in spec.grids {
                let hx = if grid.x.len() > 1 {
                    (grid.x[1] - grid.x[0]) / 2.0
                } else {
                    pad_x
                };
                let hy = if grid.y.len() > 1 {
                    (grid.y[1] - grid.y[0]) / 2.0
                } else {
                    pad_y
                };
                let mut cells = Vec::new();
                for (j, &y) in grid.y.iter().enumerate() {
                    for (i, &x) in grid.x.iter().enumerate() {
                        let v = grid.values[(j, i)];
                        if v.is_finite() {
                            let color = band_color((v - lo) / (hi - lo));
                            cells.push(Rectangle::new(
                                [(x - hx, y - hy), (x + hx, y + hy)],
                                color.filled(),
                            ));
                        }
                    }
                }
                chart
                    .draw_series(cells)
                    .map_err(|e| PostError::Render(e.to_string()))?;
            }
        }

        let label_font = ("sans-serif", 12).into_font().color(&BLACK);
        for grid in spec.grids {
            for &level in spec.levels {
                let segments = iso_segments(grid, level);
                if segments.is_empty() {
                    continue;
                }
                for seg in &segments {
                    chart
                        .draw_series(LineSeries::new(seg.iter().copied(), BLACK.stroke_width(1)))
                        .map_err(|e| PostError::Render(e.to_string()))?;
                }
                // One label per level per grid, on a mid segment.
                let (lx, ly) = segments[segments.len() / 2][0];
                let label = format!("{:.*}", spec.decimals, level);
                chart
                    .draw_series(std::iter::once(Text::new(label, (lx, ly), label_font.clone())))
                    .map_err(|e| PostError::Render(e.to_string()))?;
            }
        }

        for hole in spec.holes {
            let ring: Vec<(f64, f64)> = hole.points().iter().map(|p| (p[0], p[1])).collect();
            chart
                .draw_series(std::iter::once(Polygon::new(ring.clone(), WHITE.filled())))
                .map_err(|e| PostError::Render(e.to_string()))?;
            chart
                .draw_series(LineSeries::new(ring, BLACK.stroke_width(1)))
                .map_err(|e| PostError::Render(e.to_string()))?;
        }

        for boundary in spec.boundaries {
            let ring = boundary.points().iter().map(|p| (p[0], p[1]));
            chart
                .draw_series(LineSeries::new(ring, BLACK.stroke_width(2)))
                .map_err(|e| PostError::Render(e.to_string()))?;
        }

        if let Some(e) = spec.extremum {
            chart
                .draw_series(std::iter::once(Circle::new((e.x, e.y), 4, RED.filled())))
                .map_err(|e| PostError::Render(e.to_string()))?;
            let label = format!("{:.*}", spec.decimals.max(1), e.value);
            chart
                .draw_series(std::iter::once(Text::new(
                    label,
                    (e.x, e.y),
                    ("sans-serif", 13).into_font().color(&RED),
                )))
                .map_err(|e| PostError::Render(e.to_string()))?;
        }

        root.present().map_err(|e| PostError::Render(e.to_string()))?;
    }

    Ok(Figure { svg, width, height })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    fn ramp_grid() -> ContourGrid {
        // 3x3 grid of f(x, y) = x over [0, 2]².
        let x = vec![0.0, 1.0, 2.0];
        let y = vec![0.0, 1.0, 2.0];
        let values = DMatrix::from_fn(3, 3, |_, i| i as f64);
        ContourGrid { x, y, values }
    }

    #[test]
    fn test_iso_segments_vertical_line() {
        let grid = ramp_grid();
        let segments = iso_segments(&grid, 0.5);
        assert_eq!(segments.len(), 2);
        for seg in &segments {
            assert!((seg[0].0 - 0.5).abs() < 1e-12);
            assert!((seg[1].0 - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_iso_segments_skip_masked_cells() {
        let mut grid = ramp_grid();
        grid.values[(0, 1)] = f64::NAN;
        let segments = iso_segments(&grid, 0.5);
        // Only the top-left cell survives.
        assert_eq!(segments.len(), 1);
    }

    #[test]
    fn test_iso_segments_no_crossing() {
        let grid = ramp_grid();
        assert!(iso_segments(&grid, 5.0).is_empty());
    }

    #[test]
    fn test_render_produces_svg() {
        let grid = ramp_grid();
        let boundary =
            Boundary::new(vec![[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]]).unwrap();
        let figure = render(&RenderSpec {
            grids: std::slice::from_ref(&grid),
            boundaries: std::slice::from_ref(&boundary),
            holes: &[],
            levels: &[0.5, 1.5],
            decimals: 1,
            filled: true,
            extremum: Some(Extremum {
                x: 1.0,
                y: 1.0,
                value: 1.0,
            }),
        })
        .unwrap();
        assert!(figure.svg.contains("<svg"));
        assert_eq!(figure.width, 610);
    }
}
