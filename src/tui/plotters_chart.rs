//! Plotters-powered line chart widget for Ratatui.
//!
//! Plotters output is drawn into the Ratatui buffer through
//! `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// One line series with its color.
pub struct LineSpec<'a> {
    pub points: &'a [(f64, f64)],
    pub color: RGBColor,
}

/// A render-only chart description.
///
/// All series and bounds are computed outside the render call, so `render()`
/// only draws.
pub struct BridgePlottersChart<'a> {
    pub lines: &'a [LineSpec<'a>],
    /// Highlighted points drawn on top of the lines (the two marginals).
    pub markers: &'a [(f64, f64)],
    /// X bounds (bridge time).
    pub x_bounds: [f64; 2],
    /// Y bounds (basis points).
    pub y_bounds: [f64; 2],
    pub x_label: &'a str,
    pub y_label: &'a str,
    pub fmt_x: fn(f64) -> String,
    pub fmt_y: fn(f64) -> String,
}

impl<'a> Widget for BridgePlottersChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to build a chart in a tiny area.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;

        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc(self.y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| (self.fmt_x)(*v))
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            for line in self.lines {
                chart.draw_series(LineSeries::new(line.points.iter().copied(), &line.color))?;
            }

            // `Circle` radii are mis-scaled by the ratatui backend; a colored
            // `Pixel` renders as a clean dot.
            chart.draw_series(
                self.markers
                    .iter()
                    .map(|&(x, y)| Pixel::new((x, y), RGBColor(255, 255, 0))),
            )?;

            Ok(())
        });

        widget.render(area, buf);
    }
}
