//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - mean path: `-` line
//! - ±1σ band: `.` lines
//! - endpoint marginals: `o`

use crate::domain::BridgePath;

/// Render the mean path with its ±1σ band.
pub fn render_bridge_plot(path: &BridgePath, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let mean: Vec<(f64, f64)> = path.iter().map(|s| (s.t, s.mean)).collect();
    let upper: Vec<(f64, f64)> = path.iter().map(|s| (s.t, s.mean + s.std())).collect();
    let lower: Vec<(f64, f64)> = path.iter().map(|s| (s.t, s.mean - s.std())).collect();

    let (t_min, t_max) = (0.0, path.horizon());
    let (y_min, y_max) = y_range(&[&upper, &lower, &mean]).unwrap_or((-1.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Mean first so the band never hides it.
    draw_curve(&mut grid, &mean, t_min, t_max, y_min, y_max, '-');
    draw_curve(&mut grid, &upper, t_min, t_max, y_min, y_max, '.');
    draw_curve(&mut grid, &lower, t_min, t_max, y_min, y_max, '.');

    for &(t, y) in [mean.first(), mean.last()].into_iter().flatten() {
        let x = map_x(t, t_min, t_max, width);
        let yy = map_y(y, y_min, y_max, height);
        grid[yy][x] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Bridge: t=[{t_min:.3}, {t_max:.3}] | mean+-1sd=[{y_min:.6}, {y_max:.6}]\n"
    ));
    push_grid(&mut out, grid);
    out
}

/// Render the volatility `sqrt(variance(t))` along the path.
pub fn render_volatility_plot(path: &BridgePath, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let vol: Vec<(f64, f64)> = path.iter().map(|s| (s.t, s.std())).collect();
    let (t_min, t_max) = (0.0, path.horizon());
    let (y_min, y_max) = y_range(&[&vol]).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    draw_curve(&mut grid, &vol, t_min, t_max, y_min, y_max, '-');

    let mut out = String::new();
    out.push_str(&format!(
        "Volatility: t=[{t_min:.3}, {t_max:.3}] | sd=[{y_min:.6}, {y_max:.6}]\n"
    ));
    push_grid(&mut out, grid);
    out
}

fn push_grid(out: &mut String, grid: Vec<Vec<char>>) {
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
}

fn y_range(series: &[&[(f64, f64)]]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for s in series {
        for &(_, y) in s.iter() {
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
    }

    if min_y.is_finite() && max_y.is_finite() {
        if max_y > min_y {
            Some((min_y, max_y))
        } else {
            // Flat series: open a small window around it.
            let half = (min_y.abs() * 0.5).max(1e-9);
            Some((min_y - half, max_y + half))
        }
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(
    grid: &mut [Vec<char>],
    curve: &[(f64, f64)],
    t_min: f64,
    t_max: f64,
    y_min: f64,
    y_max: f64,
    ch: char,
) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(t, y) in curve {
        let x = map_x(t, t_min, t_max, width);
        let yy = map_y(y, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, x, yy, ch);
        } else if grid[yy][x] == ' ' {
            grid[yy][x] = ch;
        }
        prev = Some((x, yy));
    }
}

/// Integer line drawing (Bresenham-ish). Only writes into empty cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BridgeState;

    #[test]
    fn bridge_plot_golden_snapshot_flat() {
        let path = BridgePath::from_states(
            1.0,
            vec![
                BridgeState { t: 0.0, mean: 0.0, variance: 1.0 },
                BridgeState { t: 1.0, mean: 0.0, variance: 1.0 },
            ],
        );
        let txt = render_bridge_plot(&path, 10, 5);
        let expected = concat!(
            "Bridge: t=[0.000, 1.000] | mean+-1sd=[-1.100000, 1.100000]\n",
            "..........\n",
            "          \n",
            "o--------o\n",
            "          \n",
            "..........\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn volatility_plot_golden_snapshot_compressing() {
        let path = BridgePath::from_states(
            1.0,
            vec![
                BridgeState { t: 0.0, mean: 0.0, variance: 4.0 },
                BridgeState { t: 0.5, mean: 0.0, variance: 2.25 },
                BridgeState { t: 1.0, mean: 0.0, variance: 1.0 },
            ],
        );
        let txt = render_volatility_plot(&path, 11, 5);
        let expected = concat!(
            "Volatility: t=[0.000, 1.000] | sd=[0.950000, 2.050000]\n",
            "--         \n",
            "  --       \n",
            "    ---    \n",
            "       --  \n",
            "         --\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn real_bridge_plot_has_requested_size() {
        use crate::bridge::build;
        use crate::domain::{BridgeConfig, GaussianMarginal};

        let open = GaussianMarginal::from_std(-0.000017, 0.0016);
        let close = GaussianMarginal::from_std(0.000003, 0.0010);
        let path = build(&open, &close, &BridgeConfig::new(1.0, 100, 0.0)).unwrap();
        let txt = render_bridge_plot(&path, 60, 15);
        let rows: Vec<&str> = txt.lines().skip(1).collect();
        assert_eq!(rows.len(), 15);
        assert!(rows.iter().all(|r| r.chars().count() == 60));
        assert_eq!(txt.matches('o').count(), 2);
    }
}
