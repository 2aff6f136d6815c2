//! Export bridge results to CSV tables.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::BridgeSolution;
use crate::error::AppError;

pub const BRIDGE_PATH_FILE: &str = "bridge_path.csv";
pub const DRIFT_FIELD_FILE: &str = "drift_field.csv";
pub const SUMMARY_STATS_FILE: &str = "summary_stats.csv";

/// Paths of the tables written by [`write_tables`].
#[derive(Debug, Clone)]
pub struct ExportedTables {
    pub bridge_path: PathBuf,
    pub drift_field: PathBuf,
    pub summary_stats: PathBuf,
}

/// Write `bridge_path.csv`, `drift_field.csv` and `summary_stats.csv` into `dir`.
pub fn write_tables(dir: &Path, solution: &BridgeSolution) -> Result<ExportedTables, AppError> {
    fs::create_dir_all(dir)
        .map_err(|e| AppError::new(2, format!("Failed to create directory '{}': {e}", dir.display())))?;

    let tables = ExportedTables {
        bridge_path: dir.join(BRIDGE_PATH_FILE),
        drift_field: dir.join(DRIFT_FIELD_FILE),
        summary_stats: dir.join(SUMMARY_STATS_FILE),
    };

    write_path_csv(&tables.bridge_path, solution)?;
    write_field_csv(&tables.drift_field, solution)?;
    write_summary_csv(&tables.summary_stats, solution)?;

    tracing::info!(dir = %dir.display(), rows = solution.path.len(), "exported tables");
    Ok(tables)
}

fn write_path_csv(path: &Path, solution: &BridgeSolution) -> Result<(), AppError> {
    let mut file = create(path)?;
    writeln!(file, "time,mean,variance,volatility").map_err(header_err)?;
    for st in solution.path.iter() {
        writeln!(file, "{:.10},{:.12e},{:.12e},{:.12e}", st.t, st.mean, st.variance, st.std()).map_err(row_err)?;
    }
    Ok(())
}

fn write_field_csv(path: &Path, solution: &BridgeSolution) -> Result<(), AppError> {
    let mut file = create(path)?;
    writeln!(file, "time,drift_intercept,reversion_coefficient,realized_drift").map_err(header_err)?;
    for (st, p) in solution.path.iter().zip(solution.field.iter()) {
        writeln!(
            file,
            "{:.10},{:.12e},{:.12e},{:.12e}",
            p.t,
            p.drift_intercept,
            p.reversion_coefficient,
            p.drift_at(st.mean)
        )
        .map_err(row_err)?;
    }
    Ok(())
}

fn write_summary_csv(path: &Path, solution: &BridgeSolution) -> Result<(), AppError> {
    let s = &solution.summary;
    let cfg = &solution.config;
    let rows: [(&str, f64); 12] = [
        ("open_mean", s.open_mean),
        ("close_mean", s.close_mean),
        ("mean_shift", s.mean_shift),
        ("drift_coefficient", s.drift_coefficient),
        ("volatility", s.volatility),
        ("reversion_strength", s.reversion_strength),
        ("open_volatility", s.open_volatility),
        ("close_volatility", s.close_volatility),
        ("drift_to_volatility", s.drift_to_volatility),
        ("horizon", cfg.horizon),
        ("steps", cfg.steps as f64),
        ("diffusion", cfg.diffusion),
    ];

    let mut file = create(path)?;
    writeln!(file, "metric,value").map_err(header_err)?;
    for (metric, value) in rows {
        writeln!(file, "{metric},{value:.12e}").map_err(row_err)?;
    }
    Ok(())
}

fn create(path: &Path) -> Result<File, AppError> {
    File::create(path).map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))
}

fn header_err(e: std::io::Error) -> AppError {
    AppError::new(2, format!("Failed to write export CSV header: {e}"))
}

fn row_err(e: std::io::Error) -> AppError {
    AppError::new(2, format!("Failed to write export CSV row: {e}"))
}
