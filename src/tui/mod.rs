//! Ratatui-based terminal UI.
//!
//! The TUI shows the bridge mean with a ±1σ band and the volatility profile,
//! with a settings panel for the bridge parameters and a summary panel.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use plotters::style::RGBColor;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};

use crate::app::pipeline::{BridgeSettings, DiffusionSource, RunOutput, run_from_samples};
use crate::cli::TuiArgs;
use crate::config::{AppConfig, HorizonUnit};
use crate::data::{SyntheticSpec, generate_samples};
use crate::domain::WindowSamples;
use crate::error::AppError;

mod plotters_chart;

use plotters_chart::{BridgePlottersChart, LineSpec};

/// Returns are charted in basis points.
const BP: f64 = 1e4;

/// Smallest non-zero diffusion reachable with ←/→.
const DIFFUSION_STEP: f64 = 1e-7;

const STEPS_DELTA: usize = 10;

/// Start the TUI.
pub fn run(config: AppConfig, args: TuiArgs) -> Result<(), AppError> {
    let source = if args.demo {
        Source::Demo { seed: args.seed }
    } else {
        Source::Saved {
            dir: args
                .data_dir
                .clone()
                .unwrap_or_else(|| config.paths.processed_data.clone()),
        }
    };
    let mut app = App::new(config, source);

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Where the window samples come from.
#[derive(Debug, Clone, PartialEq)]
enum Source {
    Demo { seed: u64 },
    Saved { dir: PathBuf },
}

impl Source {
    fn label(&self) -> String {
        match self {
            Source::Demo { seed } => format!("demo (seed {seed})"),
            Source::Saved { dir } => dir.display().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Steps,
    Diffusion,
    Coupling,
    Horizon,
    Estimate,
    Seed,
}

struct App {
    config: AppConfig,
    source: Source,
    samples: Option<WindowSamples>,
    run: Option<RunOutput>,
    selected_field: usize,
    status: String,
}

impl App {
    fn new(config: AppConfig, source: Source) -> Self {
        let mut app = Self {
            config,
            source,
            samples: None,
            run: None,
            selected_field: 0,
            status: String::new(),
        };
        app.reload();
        app
    }

    fn fields(&self) -> &'static [Field] {
        match self.source {
            Source::Demo { .. } => &[
                Field::Steps,
                Field::Diffusion,
                Field::Coupling,
                Field::Horizon,
                Field::Estimate,
                Field::Seed,
            ],
            Source::Saved { .. } => &[
                Field::Steps,
                Field::Diffusion,
                Field::Coupling,
                Field::Horizon,
                Field::Estimate,
            ],
        }
    }

    fn ticker(&self) -> Option<&str> {
        match self.source {
            Source::Demo { .. } => None,
            Source::Saved { .. } => Some(self.config.data.ticker.as_str()),
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the TUI should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => {
                self.selected_field = self.selected_field.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected_field + 1 < self.fields().len() {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Char('c') => {
                self.config.bridge.coupling = self.config.bridge.coupling.next();
                self.status = format!("coupling: {}", self.config.bridge.coupling.label());
                self.recompute();
            }
            KeyCode::Char('r') => {
                if let Source::Demo { seed } = &mut self.source {
                    *seed = seed.wrapping_add(1);
                }
                self.reload();
            }
            KeyCode::Char('f') => self.fetch(),
            KeyCode::Char('d') => {
                if let Some(run) = &self.run {
                    match crate::debug::write_debug_bundle(run, std::path::Path::new(crate::debug::DEBUG_DIR)) {
                        Ok(path) => {
                            self.status = format!("Wrote debug bundle: {}", path.display());
                        }
                        Err(err) => {
                            self.status = format!("Debug write failed: {err}");
                        }
                    }
                } else {
                    self.status = "No bridge to dump.".to_string();
                }
            }
            _ => {}
        }

        false
    }

    fn adjust_field(&mut self, delta: i32) {
        let Some(&field) = self.fields().get(self.selected_field) else {
            return;
        };
        let bridge = &mut self.config.bridge;
        match field {
            Field::Steps => {
                bridge.time_steps = step_steps(bridge.time_steps, delta);
                self.status = format!("steps: {}", bridge.time_steps);
            }
            Field::Diffusion => {
                bridge.diffusion = step_diffusion(bridge.diffusion, delta);
                self.status = format!("diffusion: {:.2e}", bridge.diffusion);
            }
            Field::Coupling => {
                bridge.coupling = bridge.coupling.next();
                self.status = format!("coupling: {}", bridge.coupling.label());
            }
            Field::Horizon => {
                bridge.horizon = next_horizon(bridge.horizon, delta);
                self.status = format!("horizon: {:?}", bridge.horizon);
            }
            Field::Estimate => {
                bridge.estimate_diffusion = !bridge.estimate_diffusion;
                self.status = format!("estimate σ²: {}", bridge.estimate_diffusion);
            }
            Field::Seed => {
                if let Source::Demo { seed } = &mut self.source {
                    *seed = if delta >= 0 {
                        seed.wrapping_add(1)
                    } else {
                        seed.wrapping_sub(1)
                    };
                }
                self.reload();
                return;
            }
        }
        self.recompute();
    }

    /// Reload window samples from the current source and recompute.
    fn reload(&mut self) {
        let loaded = match &self.source {
            Source::Demo { seed } => generate_samples(&SyntheticSpec {
                seed: *seed,
                ..SyntheticSpec::default()
            }),
            Source::Saved { dir } => crate::io::load_window_samples(dir),
        };
        match loaded {
            Ok(samples) => {
                self.status = format!(
                    "Loaded {}: open n={}, close n={}",
                    self.source.label(),
                    samples.open.len(),
                    samples.close.len()
                );
                self.samples = Some(samples);
                self.recompute();
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to load window samples");
                self.samples = None;
                self.run = None;
                self.status = format!("{err} (press f to fetch)");
            }
        }
    }

    /// Download fresh bars, save the window returns and recompute.
    fn fetch(&mut self) {
        let Source::Saved { dir } = &self.source else {
            self.status = "Fetching is disabled in demo mode.".to_string();
            return;
        };
        let fetched = crate::app::fetch_samples(&self.config)
            .and_then(|samples| crate::io::write_window_samples(dir, &samples).map(|_| samples));
        match fetched {
            Ok(samples) => {
                self.status = format!(
                    "Fetched {}: open n={}, close n={}",
                    self.config.data.ticker,
                    samples.open.len(),
                    samples.close.len()
                );
                self.samples = Some(samples);
                self.recompute();
            }
            Err(err) => {
                self.status = format!("Fetch failed: {err}");
            }
        }
    }

    fn recompute(&mut self) {
        let Some(samples) = &self.samples else {
            self.run = None;
            return;
        };
        let result = self
            .config
            .validate()
            .map_err(AppError::from)
            .and_then(|()| BridgeSettings::from_config(&self.config))
            .and_then(|settings| run_from_samples(samples, &settings, self.ticker()));
        match result {
            Ok(run) => self.run = Some(run),
            Err(err) => {
                self.run = None;
                self.status = format!("Bridge failed: {err}");
            }
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("sb", Style::default().fg(Color::Cyan)),
            Span::raw("  open → close Gaussian Schrödinger bridge"),
        ]));

        let ticker = self.ticker().unwrap_or("synthetic");
        lines.push(Line::from(Span::styled(
            format!("ticker: {ticker} | source: {}", self.source.label()),
            Style::default().fg(Color::Gray),
        )));

        if let Some(run) = &self.run {
            let cfg = &run.solution.config;
            let diffusion = match run.diffusion_source {
                DiffusionSource::Fixed => "fixed",
                DiffusionSource::Estimated(_) => "estimated",
                DiffusionSource::Fallback => "fixed, estimate unavailable",
            };
            lines.push(Line::from(Span::styled(
                format!(
                    "open μ={:+.6} σ={:.6} | close μ={:+.6} σ={:.6} | T={} | σ²={:.3e} ({diffusion})",
                    run.open.marginal.mean,
                    run.open.marginal.std(),
                    run.close.marginal.mean,
                    run.close.marginal.std(),
                    fmt_horizon(cfg.horizon),
                    cfg.diffusion,
                ),
                Style::default().fg(Color::Gray),
            )));
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(9)])
            .split(area);

        let charts = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(rows[0]);
        let panels = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);

        let series = self.run.as_ref().map(chart_series);
        self.draw_mean_chart(frame, charts[0], series.as_ref());
        self.draw_volatility_chart(frame, charts[1], series.as_ref());
        self.draw_settings(frame, panels[0]);
        self.draw_summary(frame, panels[1]);
    }

    fn draw_mean_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect, series: Option<&ChartSeries>) {
        let Some(inner) = chart_frame(frame, area, "Mean ± 1σ") else {
            return;
        };
        let Some(s) = series else {
            render_waiting(frame, inner);
            return;
        };

        let lines = [
            LineSpec {
                points: &s.upper,
                color: RGBColor(128, 128, 128),
            },
            LineSpec {
                points: &s.lower,
                color: RGBColor(128, 128, 128),
            },
            LineSpec {
                points: &s.mean,
                color: RGBColor(0, 255, 255),
            },
        ];
        let labels = AxisLabels {
            x: "t",
            y: "return (bp)",
        };
        render_chart(frame, inner, &lines, &s.mean_markers, s.x_bounds, s.mean_bounds, labels);
    }

    fn draw_volatility_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect, series: Option<&ChartSeries>) {
        let Some(inner) = chart_frame(frame, area, "Volatility") else {
            return;
        };
        let Some(s) = series else {
            render_waiting(frame, inner);
            return;
        };

        let lines = [LineSpec {
            points: &s.volatility,
            color: RGBColor(0, 255, 0),
        }];
        let labels = AxisLabels { x: "t", y: "σ (bp)" };
        render_chart(frame, inner, &lines, &s.volatility_markers, s.x_bounds, s.volatility_bounds, labels);
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let bridge = &self.config.bridge;
        let items = self
            .fields()
            .iter()
            .map(|field| {
                let text = match field {
                    Field::Steps => format!("Steps: {}", bridge.time_steps),
                    Field::Diffusion => format!("Diffusion σ²: {:.2e}", bridge.diffusion),
                    Field::Coupling => format!("Coupling: {}", bridge.coupling.label()),
                    Field::Horizon => format!("Horizon: {:?}", bridge.horizon),
                    Field::Estimate => format!(
                        "Estimate σ²: {}",
                        if bridge.estimate_diffusion { "on" } else { "off" }
                    ),
                    Field::Seed => match self.source {
                        Source::Demo { seed } => format!("Seed: {seed}"),
                        Source::Saved { .. } => "Seed: -".to_string(),
                    },
                };
                ListItem::new(text)
            })
            .collect::<Vec<_>>();

        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ratatui::widgets::ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_summary(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Summary").borders(Borders::ALL);
        let Some(run) = &self.run else {
            frame.render_widget(Paragraph::new("-").block(block), area);
            return;
        };

        let s = &run.solution.summary;
        let i = &run.interpretation;
        let strong = Style::default().add_modifier(Modifier::BOLD);
        let lines = vec![
            Line::from(format!("drift coefficient   {:+.3e}", s.drift_coefficient)),
            Line::from(format!("volatility          {:.3e}", s.volatility)),
            Line::from(format!("reversion strength  {:+.4}", s.reversion_strength)),
            Line::from(format!("|drift| / vol       {:.4}", s.drift_to_volatility)),
            Line::from(vec![
                Span::raw("regime              "),
                Span::styled(format!("{:?} ({:?})", i.regime, i.strength), strong),
            ]),
            Line::from(format!(
                "vol change {:+.1}% | mean reversion: {}",
                i.volatility_change_pct,
                if i.mean_reversion { "yes" } else { "no" }
            )),
        ];
        frame.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ adjust  c coupling  r reload  f fetch  d debug  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Chart-ready series for one run, in basis points.
#[derive(Debug, Clone)]
struct ChartSeries {
    mean: Vec<(f64, f64)>,
    upper: Vec<(f64, f64)>,
    lower: Vec<(f64, f64)>,
    volatility: Vec<(f64, f64)>,
    mean_markers: Vec<(f64, f64)>,
    volatility_markers: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    mean_bounds: [f64; 2],
    volatility_bounds: [f64; 2],
}

fn chart_series(run: &RunOutput) -> ChartSeries {
    let path = &run.solution.path;
    let n = path.len();
    let mut mean = Vec::with_capacity(n);
    let mut upper = Vec::with_capacity(n);
    let mut lower = Vec::with_capacity(n);
    let mut volatility = Vec::with_capacity(n);
    for st in path.iter() {
        let m = st.mean * BP;
        let sd = st.std() * BP;
        mean.push((st.t, m));
        upper.push((st.t, m + sd));
        lower.push((st.t, m - sd));
        volatility.push((st.t, sd));
    }

    let horizon = path.horizon();
    let x_bounds = if horizon.is_finite() && horizon > 0.0 {
        [0.0, horizon]
    } else {
        [0.0, 1.0]
    };

    let mean_markers = vec![
        (0.0, run.open.marginal.mean * BP),
        (x_bounds[1], run.close.marginal.mean * BP),
    ];
    let volatility_markers = vec![
        (0.0, run.open.marginal.std() * BP),
        (x_bounds[1], run.close.marginal.std() * BP),
    ];

    let mean_bounds = padded_bounds(&[upper.as_slice(), lower.as_slice(), mean_markers.as_slice()]);
    let volatility_bounds = padded_bounds(&[volatility.as_slice(), volatility_markers.as_slice()]);

    ChartSeries {
        mean,
        upper,
        lower,
        volatility,
        mean_markers,
        volatility_markers,
        x_bounds,
        mean_bounds,
        volatility_bounds,
    }
}

/// Y range covering every series, padded by 5%.
fn padded_bounds(series: &[&[(f64, f64)]]) -> [f64; 2] {
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(_, y) in series.iter().flat_map(|s| s.iter()) {
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }

    if !y_min.is_finite() || !y_max.is_finite() || y_max <= y_min {
        let mid = if y_min.is_finite() { y_min } else { 0.0 };
        return [mid - 1.0, mid + 1.0];
    }

    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);
    [y_min - pad, y_max + pad]
}

fn step_steps(steps: usize, delta: i32) -> usize {
    if delta >= 0 {
        steps.saturating_add(STEPS_DELTA)
    } else {
        steps.saturating_sub(STEPS_DELTA).max(2)
    }
}

/// Doubles or halves `σ²`, stepping to and from zero through `DIFFUSION_STEP`.
fn step_diffusion(diffusion: f64, delta: i32) -> f64 {
    if delta >= 0 {
        if diffusion < DIFFUSION_STEP {
            DIFFUSION_STEP
        } else {
            diffusion * 2.0
        }
    } else if diffusion <= DIFFUSION_STEP {
        0.0
    } else {
        diffusion / 2.0
    }
}

fn next_horizon(cur: HorizonUnit, delta: i32) -> HorizonUnit {
    let order = [HorizonUnit::Session, HorizonUnit::Hours, HorizonUnit::Minutes];
    let idx = order.iter().position(|&h| h == cur).unwrap_or(0);
    let next = if delta >= 0 {
        (idx + 1) % order.len()
    } else {
        (idx + order.len() - 1) % order.len()
    };
    order[next]
}

fn fmt_horizon(h: f64) -> String {
    if h.fract() == 0.0 {
        format!("{h:.0}")
    } else {
        format!("{h:.2}")
    }
}

fn fmt_axis_x(v: f64) -> String {
    format!("{v:.2}")
}

fn fmt_axis_y_bp(v: f64) -> String {
    format!("{v:.1}")
}

fn chart_frame(frame: &mut ratatui::Frame<'_>, area: Rect, title: &str) -> Option<Rect> {
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(Clear, inner);
    (inner.width > 0 && inner.height > 0).then_some(inner)
}

fn render_waiting(frame: &mut ratatui::Frame<'_>, inner: Rect) {
    let msg = Paragraph::new("Waiting for data...")
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default());
    frame.render_widget(msg, inner);
}

#[derive(Debug, Clone, Copy)]
struct AxisLabels<'a> {
    x: &'a str,
    y: &'a str,
}

fn render_chart(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    lines: &[LineSpec<'_>],
    markers: &[(f64, f64)],
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    labels: AxisLabels<'_>,
) {
    let (chart_rect, insets) = chart_layout(inner);
    let widget = BridgePlottersChart {
        lines,
        markers,
        x_bounds,
        y_bounds,
        x_label: labels.x,
        y_label: labels.y,
        fmt_x: fmt_axis_x,
        fmt_y: fmt_axis_y_bp,
    };
    frame.render_widget(widget, chart_rect);
    if let Some(insets) = insets {
        draw_axis_ticks(frame, inner, chart_rect, insets, x_bounds, y_bounds, labels);
    }
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    labels: AxisLabels<'_>,
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = format!("{x_val:.1}");
        let label_len = label.len() as u16;
        let start = x.saturating_sub((label.len() / 2) as u16);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = format!("{y_val:.1}");
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new(labels.x)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new(labels.y).style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CouplingLaw;

    fn demo_app() -> App {
        App::new(AppConfig::default(), Source::Demo { seed: 42 })
    }

    #[test]
    fn demo_source_computes_a_bridge() {
        let app = demo_app();
        let run = app.run.as_ref().unwrap();
        assert_eq!(run.solution.path.len(), 100);
        assert!(app.status.starts_with("Loaded demo (seed 42)"));
    }

    #[test]
    fn missing_saved_returns_leave_no_run() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::new(
            AppConfig::default(),
            Source::Saved {
                dir: dir.path().join("nothing"),
            },
        );
        assert!(app.samples.is_none());
        assert!(app.run.is_none());
        assert!(app.status.ends_with("(press f to fetch)"));
    }

    #[test]
    fn settings_keys_recompute_the_bridge() {
        let mut app = demo_app();

        app.handle_key(KeyCode::Char('c'));
        assert_eq!(app.config.bridge.coupling, CouplingLaw::Independent);
        assert_eq!(app.run.as_ref().unwrap().solution.config.coupling, CouplingLaw::Independent);

        app.handle_key(KeyCode::Right);
        assert_eq!(app.run.as_ref().unwrap().solution.path.len(), 110);

        // Seed is the last field in demo mode.
        for _ in 0..10 {
            app.handle_key(KeyCode::Down);
        }
        assert_eq!(app.fields()[app.selected_field], Field::Seed);
        app.handle_key(KeyCode::Left);
        assert_eq!(app.source, Source::Demo { seed: 41 });

        assert!(app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn diffusion_steps_through_zero() {
        assert_eq!(step_diffusion(0.0, 1), DIFFUSION_STEP);
        assert_eq!(step_diffusion(DIFFUSION_STEP, 1), 2.0 * DIFFUSION_STEP);
        assert_eq!(step_diffusion(4e-7, -1), 2e-7);
        assert_eq!(step_diffusion(DIFFUSION_STEP, -1), 0.0);
        assert_eq!(step_steps(5, -1), 2);
        assert_eq!(next_horizon(HorizonUnit::Session, -1), HorizonUnit::Minutes);
    }

    #[test]
    fn chart_bounds_cover_the_band() {
        let app = demo_app();
        let s = chart_series(app.run.as_ref().unwrap());
        assert_eq!(s.x_bounds, [0.0, 1.0]);
        for &(_, y) in s.upper.iter().chain(&s.lower) {
            assert!(y > s.mean_bounds[0] && y < s.mean_bounds[1]);
        }
        for &(_, y) in &s.volatility {
            assert!(y > s.volatility_bounds[0] && y < s.volatility_bounds[1]);
        }
        assert_eq!(padded_bounds(&[[(0.0, 3.0)].as_slice()]), [2.0, 4.0]);
    }
}
