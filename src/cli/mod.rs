//! Command-line parsing for the open→close bridge estimator.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the bridge math. Every bridge/data flag is optional: when absent,
//! the value from the TOML config (or its default) is used.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{AppConfig, HorizonUnit};
use crate::domain::CouplingLaw;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "sb",
    version,
    about = "Gaussian Schrödinger bridge between open and close return distributions"
)]
pub struct Cli {
    /// TOML config file (defaults to ./config.toml when present).
    #[arg(long, global = true, value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Log progress (info level).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log numeric details (debug level) and write a debug bundle for each run.
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Download intraday bars, extract open/close window returns and save them.
    Fetch(FetchArgs),
    /// Fit the bridge from saved window returns and report it.
    Fit(FitArgs),
    /// Solve the bridge for marginals given on the command line.
    Solve(SolveArgs),
    /// Run the bridge on seeded synthetic window samples.
    Demo(DemoArgs),
    /// Plot a previously exported bridge JSON.
    Plot(PlotArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same underlying pipeline as `sb fit`, but renders results
    /// in a terminal UI using Ratatui.
    Tui(TuiArgs),
}

/// Market data overrides.
#[derive(Debug, Args, Clone, Default)]
pub struct DataArgs {
    /// Ticker symbol.
    #[arg(short = 't', long)]
    pub ticker: Option<String>,

    /// Number of 7-day chunks to download.
    #[arg(long)]
    pub weeks: Option<u32>,

    /// Bar interval (1m, 5m, 15m, 1h, ...).
    #[arg(long)]
    pub interval: Option<String>,

    /// Drop returns that span the overnight gap.
    #[arg(long)]
    pub intraday_only: bool,
}

impl DataArgs {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(t) = &self.ticker {
            config.data.ticker = t.clone();
        }
        if let Some(w) = self.weeks {
            config.data.weeks_back = w;
        }
        if let Some(i) = &self.interval {
            config.data.interval = i.clone();
        }
        if self.intraday_only {
            config.data.intraday_only = true;
        }
    }
}

/// Bridge overrides shared by every command that solves a bridge.
#[derive(Debug, Args, Clone, Default)]
pub struct BridgeArgs {
    /// Grid points including both endpoints.
    #[arg(short = 's', long)]
    pub steps: Option<usize>,

    /// Reference diffusion σ² (per unit of horizon).
    #[arg(short = 'd', long)]
    pub diffusion: Option<f64>,

    /// Estimate σ² from session returns (falls back to --diffusion).
    #[arg(long)]
    pub estimate_diffusion: bool,

    /// Unit of the horizon T.
    #[arg(long, value_enum)]
    pub horizon: Option<HorizonUnit>,

    /// Endpoint coupling used for the variance law.
    #[arg(long, value_enum)]
    pub coupling: Option<CouplingLaw>,
}

impl BridgeArgs {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(s) = self.steps {
            config.bridge.time_steps = s;
        }
        if let Some(d) = self.diffusion {
            config.bridge.diffusion = d;
        }
        if self.estimate_diffusion {
            config.bridge.estimate_diffusion = true;
        }
        if let Some(h) = self.horizon {
            config.bridge.horizon = h;
        }
        if let Some(c) = self.coupling {
            config.bridge.coupling = c;
        }
    }
}

/// Terminal output and export options.
#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Disable the terminal plots.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Rows of the path table (0 disables it).
    #[arg(long, default_value_t = 11)]
    pub table_rows: usize,

    /// Write bridge_path.csv / drift_field.csv / summary_stats.csv.
    ///
    /// Without a value the configured results directory is used.
    #[arg(long, value_name = "DIR", num_args = 0..=1, default_missing_value = "")]
    pub export: Option<PathBuf>,

    /// Export the full bridge (marginals + path + field) to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct FetchArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Directory for the processed return files (overrides [paths].processed_data).
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Directory with open_returns.csv / close_returns.csv (overrides [paths].processed_data).
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Fetch fresh data first instead of reading saved returns.
    #[arg(long)]
    pub fetch: bool,

    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub bridge: BridgeArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct SolveArgs {
    /// Mean of the open-window returns.
    #[arg(long, allow_negative_numbers = true)]
    pub open_mean: f64,

    /// Standard deviation of the open-window returns.
    #[arg(long)]
    pub open_std: f64,

    /// Mean of the close-window returns.
    #[arg(long, allow_negative_numbers = true)]
    pub close_mean: f64,

    /// Standard deviation of the close-window returns.
    #[arg(long)]
    pub close_std: f64,

    #[command(flatten)]
    pub bridge: BridgeArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    /// Random seed for sample generation.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Returns per window.
    #[arg(short = 'n', long, default_value_t = 120)]
    pub count: usize,

    #[command(flatten)]
    pub bridge: BridgeArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Options for plotting a saved bridge.
#[derive(Debug, Args)]
pub struct PlotArgs {
    /// Bridge JSON file produced by `--export-json`.
    #[arg(long, value_name = "JSON")]
    pub bridge: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    /// Start on synthetic samples instead of saved returns.
    #[arg(long)]
    pub demo: bool,

    /// Random seed for demo samples.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Directory with saved window returns (overrides [paths].processed_data).
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(flatten)]
    pub bridge: BridgeArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn solve_accepts_negative_means() {
        let cli = Cli::try_parse_from([
            "sb",
            "solve",
            "--open-mean",
            "-0.0001",
            "--open-std",
            "0.002",
            "--close-mean",
            "0",
            "--close-std",
            "0.001",
            "--coupling",
            "independent",
        ])
        .unwrap();
        let Command::Solve(args) = cli.command else {
            panic!("expected solve");
        };
        assert_eq!(args.open_mean, -0.0001);
        assert_eq!(args.bridge.coupling, Some(CouplingLaw::Independent));
        assert!(args.output.export.is_none());
    }

    #[test]
    fn overrides_apply_on_top_of_config() {
        let cli = Cli::try_parse_from(["sb", "-v", "fit", "--steps", "250", "--horizon", "minutes", "-t", "QQQ"])
            .unwrap();
        assert!(cli.verbose);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        let mut config = AppConfig::default();
        args.data.apply(&mut config);
        args.bridge.apply(&mut config);
        assert_eq!(config.data.ticker, "QQQ");
        assert_eq!(config.bridge.time_steps, 250);
        assert_eq!(config.bridge.horizon, HorizonUnit::Minutes);
        assert_eq!(config.bridge.diffusion, 0.0);
    }

    #[test]
    fn bare_export_flag_means_configured_dir() {
        let cli = Cli::try_parse_from(["sb", "demo", "--export"]).unwrap();
        let Command::Demo(args) = cli.command else {
            panic!("expected demo");
        };
        assert_eq!(args.output.export, Some(PathBuf::new()));
    }
}
