//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the bridge math stays clean and testable
//! - output changes are localized (easy to snapshot)

use crate::app::pipeline::{DiffusionSource, RunOutput};
use crate::bridge::instantaneous_volatility;
use crate::domain::{BridgeSolution, FittedMarginal};
use crate::report::{DriftDirection, DriftStrength, Regime};

/// Format the full run summary (marginals + bridge parameters + interpretation).
pub fn format_run_summary(output: &RunOutput) -> String {
    let mut out = String::new();
    let sol = &output.solution;
    let s = &sol.summary;
    let i = &output.interpretation;

    out.push_str("=== sb - Schrödinger Bridge (open -> close) ===\n");
    if let Some(ticker) = &output.ticker {
        out.push_str(&format!("Ticker: {ticker}\n"));
    }
    out.push_str(&format_marginal("Open ", &output.open));
    out.push_str(&format_marginal("Close", &output.close));
    out.push_str(&format!(
        "Bridge: T={} (steps={}) | sigma^2={:.6e} ({}) | coupling={}\n",
        fmt_horizon(sol.config.horizon),
        sol.config.steps,
        sol.config.diffusion,
        diffusion_label(&output.diffusion_source),
        sol.config.coupling.label(),
    ));

    out.push_str("\nBridge parameters:\n");
    out.push_str(&format!("- drift              : {:.6}\n", s.drift_coefficient));
    out.push_str(&format!("- volatility         : {:.6}\n", s.volatility));
    if let Some(mid) = instantaneous_volatility(&sol.path, sol.config.horizon / 2.0) {
        out.push_str(&format!("- mid-session vol    : {mid:.6}\n"));
    }
    out.push_str(&format!("- reversion strength : {:.4}\n", s.reversion_strength));
    out.push_str(&format!("- drift / volatility : {:.4}\n", s.drift_to_volatility));

    out.push_str("\nInterpretation:\n");
    out.push_str(&format!(
        "- mean reversion    : {}\n",
        if i.mean_reversion { "YES" } else { "NO" }
    ));
    out.push_str(&format!("- volatility change : {:.1}%\n", i.volatility_change_pct));
    out.push_str(&format!(
        "- drift             : {}\n",
        match i.drift_direction {
            DriftDirection::Negative => "Negative",
            DriftDirection::Positive => "Positive",
        }
    ));
    out.push_str(&format!(
        "- regime            : {} ({})\n",
        match i.regime {
            Regime::Reverting => "Reverting",
            Regime::Repelling => "Repelling",
        },
        match i.strength {
            DriftStrength::Strong => "Strong",
            DriftStrength::Moderate => "Moderate",
        }
    ));
    out.push('\n');

    out
}

/// Format `rows` evenly spaced grid points of the path and drift field.
///
/// The first and last grid points are always included.
pub fn format_path_table(solution: &BridgeSolution, rows: usize) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:>8} {:>12} {:>12} {:>13} {:>13}\n",
            "t", "mean", "std", "intercept", "reversion"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<8} {:-<12} {:-<12} {:-<13} {:-<13}\n", "", "", "", "", "").trim_end());
    out.push('\n');

    let states = solution.path.states();
    let points = solution.field.points();
    for idx in sample_indices(states.len(), rows) {
        let (st, p) = (&states[idx], &points[idx]);
        out.push_str(
            format!(
                "{:>8.4} {:>12.6} {:>12.6} {:>13.6e} {:>13.6}\n",
                st.t,
                st.mean,
                st.std(),
                p.drift_intercept,
                p.reversion_coefficient
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

fn format_marginal(label: &str, m: &FittedMarginal) -> String {
    let n = m.samples.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string());
    format!(
        "{label}: n={n} | mu={:.6} | sigma={:.6}\n",
        m.marginal.mean,
        m.marginal.std()
    )
}

fn diffusion_label(source: &DiffusionSource) -> String {
    match source {
        DiffusionSource::Fixed => "fixed".to_string(),
        DiffusionSource::Estimated(est) => format!("estimated from {} returns", est.samples),
        DiffusionSource::Fallback => "fixed, estimate unavailable".to_string(),
    }
}

fn fmt_horizon(h: f64) -> String {
    if h.fract() == 0.0 {
        format!("{h:.0}")
    } else {
        format!("{h:.2}")
    }
}

fn sample_indices(len: usize, rows: usize) -> Vec<usize> {
    if len == 0 || rows == 0 {
        return Vec::new();
    }
    if rows >= len || len == 1 {
        return (0..len).collect();
    }
    if rows == 1 {
        return vec![0];
    }
    let mut out: Vec<usize> = (0..rows)
        .map(|k| ((k * (len - 1)) as f64 / (rows - 1) as f64).round() as usize)
        .collect();
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::solve;
    use crate::domain::{BridgeConfig, GaussianMarginal};

    #[test]
    fn sample_indices_cover_both_ends() {
        assert_eq!(sample_indices(100, 5), vec![0, 25, 50, 74, 99]);
        assert_eq!(sample_indices(3, 10), vec![0, 1, 2]);
        assert_eq!(sample_indices(10, 1), vec![0]);
        assert!(sample_indices(0, 4).is_empty());
    }

    #[test]
    fn run_summary_reports_mid_session_volatility() {
        use crate::app::pipeline::{BridgeSettings, run_from_marginals};
        use crate::config::AppConfig;
        use crate::domain::{FittedMarginal, Window};

        let settings = BridgeSettings {
            steps: 11,
            ..BridgeSettings::from_config(&AppConfig::default()).unwrap()
        };
        let open = FittedMarginal {
            window: Window::Open,
            marginal: GaussianMarginal::from_std(-0.0001, 0.002),
            samples: None,
        };
        let close = FittedMarginal {
            window: Window::Close,
            marginal: GaussianMarginal::from_std(0.0, 0.001),
            samples: None,
        };
        let run = run_from_marginals(open, close, &settings, None).unwrap();

        // Zero diffusion interpolates the std: halfway between 0.002 and 0.001.
        let text = format_run_summary(&run);
        assert!(text.contains("- mid-session vol    : 0.001500\n"), "{text}");
    }

    #[test]
    fn path_table_has_header_and_rows() {
        let open = GaussianMarginal::from_std(-0.0001, 0.002);
        let close = GaussianMarginal::from_std(0.0, 0.001);
        let sol = solve(&open, &close, &BridgeConfig::new(1.0, 11, 0.0)).unwrap();
        let table = format_path_table(&sol, 3);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].trim_start().starts_with('t'));
        assert!(lines[2].trim_start().starts_with("0.0000"));
        assert!(lines[3].trim_start().starts_with("0.5000"));
        assert!(lines[4].trim_start().starts_with("1.0000"));
        assert!(lines.iter().all(|l| !l.ends_with(' ')));
    }
}
