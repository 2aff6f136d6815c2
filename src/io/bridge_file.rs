//! Read/write bridge JSON files.
//!
//! Bridge JSON is the portable representation of one run:
//! - the fitted endpoint marginals and the bridge configuration
//! - the summary scalars
//! - the full density path and drift field, for re-plotting without recomputing
//!
//! The schema is defined by `domain::BridgeFile`.

use std::fs::File;
use std::path::Path;

use chrono::Utc;

use crate::domain::{BridgeFile, BridgeSolution, FittedMarginal};
use crate::error::AppError;

/// Assemble the file representation of a solved bridge.
pub fn bridge_file(
    ticker: Option<&str>,
    open: &FittedMarginal,
    close: &FittedMarginal,
    solution: &BridgeSolution,
) -> BridgeFile {
    BridgeFile {
        tool: "sb".to_string(),
        generated_at: Utc::now(),
        ticker: ticker.map(str::to_string),
        open: *open,
        close: *close,
        config: solution.config,
        summary: solution.summary,
        path: solution.path.states().to_vec(),
        field: solution.field.points().to_vec(),
    }
}

/// Write a bridge JSON file.
pub fn write_bridge_json(path: &Path, file: &BridgeFile) -> Result<(), AppError> {
    let out = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create bridge JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(out, file)
        .map_err(|e| AppError::new(2, format!("Failed to write bridge JSON: {e}")))?;
    Ok(())
}

/// Read a bridge JSON file.
pub fn read_bridge_json(path: &Path) -> Result<BridgeFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open bridge JSON '{}': {e}", path.display())))?;
    let bridge: BridgeFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid bridge JSON: {e}")))?;
    if bridge.path.len() < 2 {
        return Err(AppError::new(2, "Bridge JSON must contain at least 2 path states."));
    }
    Ok(bridge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::solve;
    use crate::domain::{BridgeConfig, GaussianMarginal, Window};
    use tempfile::tempdir;

    #[test]
    fn saved_bridge_reloads_for_plotting() {
        let open = FittedMarginal {
            window: Window::Open,
            marginal: GaussianMarginal::from_std(-0.0001, 0.002),
            samples: Some(120),
        };
        let close = FittedMarginal {
            window: Window::Close,
            marginal: GaussianMarginal::from_std(0.0, 0.001),
            samples: None,
        };
        let solution = solve(&open.marginal, &close.marginal, &BridgeConfig::new(6.5, 17, 2e-7)).unwrap();
        let file = bridge_file(Some("SPY"), &open, &close, &solution);

        let dir = tempdir().unwrap();
        let path = dir.path().join("bridge.json");
        write_bridge_json(&path, &file).unwrap();
        let loaded = read_bridge_json(&path).unwrap();

        assert_eq!(loaded.tool, "sb");
        assert_eq!(loaded.ticker.as_deref(), Some("SPY"));
        assert_eq!(loaded.config.steps, 17);
        assert_eq!(loaded.open.samples, Some(120));

        let reloaded = loaded.bridge_path();
        assert_eq!(reloaded.len(), solution.path.len());
        assert_eq!(reloaded.horizon(), 6.5);
        for (a, b) in reloaded.iter().zip(solution.path.iter()) {
            assert!((a.t - b.t).abs() < 1e-12);
            assert!((a.mean - b.mean).abs() < 1e-18);
            assert!((a.variance - b.variance).abs() < 1e-18);
        }
        assert_eq!(loaded.field.len(), solution.field.len());
        assert!((loaded.summary.volatility - solution.summary.volatility).abs() < 1e-15);
    }

    #[test]
    fn garbage_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bridge.json");
        std::fs::write(&path, "{\"tool\": \"sb\"}").unwrap();
        assert_eq!(read_bridge_json(&path).unwrap_err().exit_code(), 2);
    }
}
