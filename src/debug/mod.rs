//! Debug bundle writer for inspecting one bridge run and its variants.

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::app::pipeline::{DiffusionSource, RunOutput};
use crate::bridge::solve;
use crate::domain::CouplingLaw;
use crate::error::AppError;

/// Default directory for debug bundles.
pub const DEBUG_DIR: &str = "debug";

/// Grid rows listed in the path section.
const GRID_ROWS: usize = 21;

pub fn write_debug_bundle(run: &RunOutput, dir: &Path) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| AppError::new(4, format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let ticker = run.ticker.as_deref().unwrap_or("manual");
    let cfg = &run.solution.config;
    let path = dir.join(format!("sb_debug_{ticker}_{}_{ts}.md", cfg.coupling.label()));

    let mut file = File::create(&path).map_err(|e| AppError::new(4, format!("Failed to create debug file: {e}")))?;

    writeln!(file, "# sb debug bundle").map_err(header_err)?;
    writeln!(file, "- generated: {}", Local::now().to_rfc3339()).map_err(header_err)?;
    writeln!(file, "- ticker: {ticker}").map_err(header_err)?;
    writeln!(
        file,
        "- bridge: horizon={}, steps={}, diffusion={:.6e}, coupling={}",
        cfg.horizon,
        cfg.steps,
        cfg.diffusion,
        cfg.coupling.label()
    )
    .map_err(header_err)?;
    match run.diffusion_source {
        DiffusionSource::Fixed => writeln!(file, "- diffusion source: fixed"),
        DiffusionSource::Fallback => writeln!(file, "- diffusion source: fixed (estimate unavailable)"),
        DiffusionSource::Estimated(est) => writeln!(
            file,
            "- diffusion source: estimated (n={}, residual per-bar variance={:.6e})",
            est.samples, est.residual_variance
        ),
    }
    .map_err(header_err)?;

    writeln!(file, "\n## Marginals").map_err(write_err)?;
    writeln!(file, "| window | n | mean | std | variance |").map_err(write_err)?;
    writeln!(file, "| - | - | - | - | - |").map_err(write_err)?;
    for m in [&run.open, &run.close] {
        writeln!(
            file,
            "| {} | {} | {:.8} | {:.8} | {:.6e} |",
            m.window.label(),
            m.samples.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string()),
            m.marginal.mean,
            m.marginal.std(),
            m.marginal.variance
        )
        .map_err(write_err)?;
    }

    let s = &run.solution.summary;
    writeln!(file, "\n## Summary").map_err(write_err)?;
    writeln!(file, "| metric | value |").map_err(write_err)?;
    writeln!(file, "| - | - |").map_err(write_err)?;
    for (metric, value) in [
        ("mean_shift", s.mean_shift),
        ("drift_coefficient", s.drift_coefficient),
        ("volatility", s.volatility),
        ("reversion_strength", s.reversion_strength),
        ("drift_to_volatility", s.drift_to_volatility),
    ] {
        writeln!(file, "| {metric} | {value:.6e} |").map_err(write_err)?;
    }
    writeln!(file, "\nInterpretation: {:?}", run.interpretation).map_err(write_err)?;

    // Same marginals under both couplings and a few reference diffusions.
    writeln!(file, "\n## Variants").map_err(write_err)?;
    writeln!(file, "| coupling | diffusion | drift | volatility | reversion | drift/vol |").map_err(write_err)?;
    writeln!(file, "| - | - | - | - | - | - |").map_err(write_err)?;
    let mut diffusions = vec![0.0, cfg.diffusion, s.volatility * s.volatility / cfg.horizon];
    diffusions.sort_by(|a, b| a.total_cmp(b));
    diffusions.dedup();
    for coupling in [CouplingLaw::Entropic, CouplingLaw::Independent] {
        for &diffusion in &diffusions {
            let variant_cfg = crate::domain::BridgeConfig { diffusion, coupling, ..*cfg };
            match solve(&run.open.marginal, &run.close.marginal, &variant_cfg) {
                Ok(v) => writeln!(
                    file,
                    "| {} | {:.6e} | {:.6e} | {:.6e} | {:.6} | {:.4} |",
                    coupling.label(),
                    diffusion,
                    v.summary.drift_coefficient,
                    v.summary.volatility,
                    v.summary.reversion_strength,
                    v.summary.drift_to_volatility
                ),
                Err(e) => writeln!(file, "| {} | {:.6e} | failed: {e} | | | |", coupling.label(), diffusion),
            }
            .map_err(write_err)?;
        }
    }

    writeln!(file, "\n## Path").map_err(write_err)?;
    writeln!(file, "| t | mean | variance | drift_intercept | reversion_coefficient |").map_err(write_err)?;
    writeln!(file, "| - | - | - | - | - |").map_err(write_err)?;
    let n = run.solution.path.len();
    let stride = (n / (GRID_ROWS - 1)).max(1);
    for (i, (st, p)) in run
        .solution
        .path
        .iter()
        .zip(run.solution.field.iter())
        .enumerate()
    {
        if i % stride != 0 && i + 1 != n {
            continue;
        }
        writeln!(
            file,
            "| {:.4} | {:.6e} | {:.6e} | {:.6e} | {:.6} |",
            st.t, st.mean, st.variance, p.drift_intercept, p.reversion_coefficient
        )
        .map_err(write_err)?;
    }

    tracing::debug!(path = %path.display(), "wrote debug bundle");
    Ok(path)
}

fn header_err(e: std::io::Error) -> AppError {
    AppError::new(4, format!("Failed to write debug header: {e}"))
}

fn write_err(e: std::io::Error) -> AppError {
    AppError::new(4, format!("Failed to write debug: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::{BridgeSettings, run_from_samples};
    use crate::config::AppConfig;
    use crate::data::{SyntheticSpec, generate_samples};
    use tempfile::tempdir;

    #[test]
    fn bundle_lists_marginals_variants_and_path() {
        let samples = generate_samples(&SyntheticSpec::default()).unwrap();
        let settings = BridgeSettings::from_config(&AppConfig::default()).unwrap();
        let run = run_from_samples(&samples, &settings, Some("SPY")).unwrap();

        let dir = tempdir().unwrap();
        let path = write_debug_bundle(&run, dir.path()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();

        assert!(text.starts_with("# sb debug bundle"));
        assert!(text.contains("| open | 120 |"));
        assert!(text.contains("## Variants"));
        assert!(text.contains("| independent |"));
        // 100 steps with stride 5: indices 0, 5, ..., 95 plus the last one.
        let path_rows = text
            .split("## Path")
            .nth(1)
            .unwrap()
            .lines()
            .filter(|l| l.starts_with("| ") && !l.starts_with("| t ") && !l.starts_with("| - "))
            .count();
        assert_eq!(path_rows, 21);
    }
}
