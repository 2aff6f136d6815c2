//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and installs logging
//! - resolves the TOML config and applies CLI overrides
//! - fetches or loads window returns
//! - runs the bridge pipeline
//! - prints reports/plots and writes optional exports

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, DemoArgs, FetchArgs, FitArgs, OutputArgs, PlotArgs, SolveArgs, TuiArgs};
use crate::config::{AppConfig, resolve_config};
use crate::data::{SyntheticSpec, YahooClient, generate_samples, log_returns, split_windows};
use crate::domain::{FittedMarginal, GaussianMarginal, Window, WindowSamples};
use crate::error::AppError;

pub mod pipeline;

use pipeline::{BridgeSettings, RunOutput};

/// Log file used while the TUI owns the terminal.
const TUI_LOG_FILE: &str = "sb.log";

/// Entry point for the `sb` binary.
pub fn run() -> Result<(), AppError> {
    // We want `sb` and `sb --coupling independent` to behave like `sb tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    let log_file = matches!(cli.command, Command::Tui(_)).then(|| Path::new(TUI_LOG_FILE));
    init_logging(cli.verbose, cli.debug, log_file)?;

    let config = resolve_config(cli.config.as_deref())?;

    match cli.command {
        Command::Fetch(args) => handle_fetch(config, args),
        Command::Fit(args) => handle_fit(config, args, cli.debug),
        Command::Solve(args) => handle_solve(config, args, cli.debug),
        Command::Demo(args) => handle_demo(config, args, cli.debug),
        Command::Plot(args) => handle_plot(args),
        Command::Tui(args) => handle_tui(config, args),
    }
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins; otherwise `--debug` → debug, `--verbose` → info, else warn.
fn init_logging(verbose: bool, debug: bool, log_file: Option<&Path>) -> Result<(), AppError> {
    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    // A second install (e.g. in tests) is harmless, so the result is ignored.
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| AppError::new(2, format!("Failed to create log file '{}': {e}", path.display())))?;
            let _ = builder.with_writer(Mutex::new(file)).with_ansi(false).try_init();
        }
        None => {
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
    }
    Ok(())
}

fn handle_fetch(mut config: AppConfig, args: FetchArgs) -> Result<(), AppError> {
    args.data.apply(&mut config);
    config.validate()?;

    let samples = fetch_samples(&config)?;
    let dir = args.out.unwrap_or_else(|| config.paths.processed_data.clone());
    crate::io::write_window_samples(&dir, &samples)?;

    println!(
        "Open returns : {} samples\nClose returns: {} samples\nSession returns: {} samples",
        samples.open.len(),
        samples.close.len(),
        samples.session.len()
    );
    println!("Saved window returns to {}", dir.display());
    Ok(())
}

fn handle_fit(mut config: AppConfig, args: FitArgs, debug: bool) -> Result<(), AppError> {
    args.data.apply(&mut config);
    args.bridge.apply(&mut config);
    config.validate()?;

    let samples = if args.fetch {
        let samples = fetch_samples(&config)?;
        crate::io::write_window_samples(&config.paths.processed_data, &samples)?;
        samples
    } else {
        let dir = args
            .data_dir
            .clone()
            .unwrap_or_else(|| config.paths.processed_data.clone());
        crate::io::load_window_samples(&dir)?
    };

    let settings = BridgeSettings::from_config(&config)?;
    let run = pipeline::run_from_samples(&samples, &settings, Some(&config.data.ticker))?;
    present(&run, &args.output, &config, debug)
}

fn handle_solve(mut config: AppConfig, args: SolveArgs, debug: bool) -> Result<(), AppError> {
    args.bridge.apply(&mut config);
    config.validate()?;

    let open = FittedMarginal {
        window: Window::Open,
        marginal: GaussianMarginal::from_std(args.open_mean, args.open_std),
        samples: None,
    };
    let close = FittedMarginal {
        window: Window::Close,
        marginal: GaussianMarginal::from_std(args.close_mean, args.close_std),
        samples: None,
    };

    let settings = BridgeSettings::from_config(&config)?;
    let run = pipeline::run_from_marginals(open, close, &settings, None)?;
    present(&run, &args.output, &config, debug)
}

fn handle_demo(mut config: AppConfig, args: DemoArgs, debug: bool) -> Result<(), AppError> {
    args.bridge.apply(&mut config);
    config.validate()?;

    let spec = SyntheticSpec {
        open_count: args.count,
        close_count: args.count,
        seed: args.seed,
        ..SyntheticSpec::default()
    };
    let samples = generate_samples(&spec)?;

    let settings = BridgeSettings::from_config(&config)?;
    let run = pipeline::run_from_samples(&samples, &settings, None)?;
    present(&run, &args.output, &config, debug)
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let bridge = crate::io::read_bridge_json(&args.bridge)?;
    let path = bridge.bridge_path();

    if let Some(ticker) = &bridge.ticker {
        println!("{ticker} ({})", bridge.generated_at.format("%Y-%m-%d %H:%M UTC"));
    }
    println!("{}", crate::plot::render_bridge_plot(&path, args.width, args.height));
    println!("{}", crate::plot::render_volatility_plot(&path, args.width, args.height));
    Ok(())
}

fn handle_tui(mut config: AppConfig, args: TuiArgs) -> Result<(), AppError> {
    args.bridge.apply(&mut config);
    config.validate()?;
    crate::tui::run(config, args)
}

/// Print the report and write whatever exports were requested.
fn present(run: &RunOutput, output: &OutputArgs, config: &AppConfig, debug: bool) -> Result<(), AppError> {
    println!("{}", crate::report::format_run_summary(run));

    if output.table_rows > 0 {
        println!("{}", crate::report::format_path_table(&run.solution, output.table_rows));
    }

    if !output.no_plot {
        println!(
            "{}",
            crate::plot::render_bridge_plot(&run.solution.path, output.width, output.height)
        );
        println!(
            "{}",
            crate::plot::render_volatility_plot(&run.solution.path, output.width, output.height)
        );
    }

    if let Some(dir) = &output.export {
        let dir = if dir.as_os_str().is_empty() {
            config.paths.results_tables.clone()
        } else {
            dir.clone()
        };
        let tables = crate::io::write_tables(&dir, &run.solution)?;
        println!("Wrote {}", tables.bridge_path.display());
        println!("Wrote {}", tables.drift_field.display());
        println!("Wrote {}", tables.summary_stats.display());
    }

    if let Some(path) = &output.export_json {
        let file = crate::io::bridge_file(run.ticker.as_deref(), &run.open, &run.close, &run.solution);
        crate::io::write_bridge_json(path, &file)?;
        println!("Wrote {}", path.display());
    }

    if debug {
        let path = crate::debug::write_debug_bundle(run, Path::new(crate::debug::DEBUG_DIR))?;
        println!("Wrote debug bundle: {}", path.display());
    }

    Ok(())
}

/// Download bars for the configured ticker and split them into window samples.
///
/// The raw bars are saved under `[paths].raw_data` as `<ticker>_intraday_full.csv`.
pub fn fetch_samples(config: &AppConfig) -> Result<WindowSamples, AppError> {
    let clock = config.session_clock()?;
    let client = YahooClient::from_env()?;

    tracing::info!(
        ticker = %config.data.ticker,
        weeks = config.data.weeks_back,
        interval = %config.data.interval,
        "fetching bars"
    );
    let bars = client.fetch_bars(&config.data.ticker, config.data.weeks_back, &config.data.interval)?;

    let raw_dir = &config.paths.raw_data;
    std::fs::create_dir_all(raw_dir)
        .map_err(|e| AppError::new(2, format!("Failed to create directory '{}': {e}", raw_dir.display())))?;
    let raw_path = raw_dir.join(format!("{}_intraday_full.csv", config.data.ticker));
    crate::io::write_bars_csv(&raw_path, &bars)?;
    tracing::info!(path = %raw_path.display(), bars = bars.len(), "saved raw bars");

    let returns = log_returns(&bars, config.data.intraday_only);
    let samples = split_windows(&returns, &clock);
    tracing::info!(
        open = samples.open.len(),
        close = samples.close.len(),
        session = samples.session.len(),
        "extracted window returns"
    );
    Ok(samples)
}

/// Rewrite argv so `sb` defaults to `sb tui`.
///
/// Rules:
/// - `sb`                      -> `sb tui`
/// - `sb --demo ...`           -> `sb tui --demo ...`
/// - `sb --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(
        arg1.as_str(),
        "fetch" | "fit" | "solve" | "demo" | "plot" | "tui"
    );
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, look for a subcommand after the global flags.
    if arg1.starts_with('-') {
        let has_subcommand = argv[1..].iter().any(|a| {
            matches!(
                a.as_str(),
                "fetch" | "fit" | "solve" | "demo" | "plot" | "tui"
            )
        });
        if !has_subcommand {
            argv.insert(1, "tui".to_string());
        }
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
