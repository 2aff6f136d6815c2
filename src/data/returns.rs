//! Price bars → log returns → open/close window samples.

use chrono::{NaiveDateTime, NaiveTime};

use crate::domain::{PriceBar, TimedReturn, WindowSamples};
use crate::error::AppError;

/// Trading-session clock: market hours plus the two sampling windows.
///
/// Windows are inclusive at both ends and compared on exchange-local time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionClock {
    market_open: NaiveTime,
    open_window_end: NaiveTime,
    close_start: NaiveTime,
    market_close: NaiveTime,
}

impl SessionClock {
    pub fn new(
        market_open: NaiveTime,
        open_window_end: NaiveTime,
        close_start: NaiveTime,
        market_close: NaiveTime,
    ) -> Result<Self, AppError> {
        if market_open >= open_window_end {
            return Err(AppError::new(
                2,
                format!("open window end {open_window_end} must be after market open {market_open}"),
            ));
        }
        if open_window_end > close_start {
            return Err(AppError::new(
                2,
                format!("open window end {open_window_end} must not be after close start {close_start}"),
            ));
        }
        if close_start >= market_close {
            return Err(AppError::new(
                2,
                format!("close start {close_start} must be before market close {market_close}"),
            ));
        }
        Ok(Self {
            market_open,
            open_window_end,
            close_start,
            market_close,
        })
    }

    pub fn market_open(&self) -> NaiveTime {
        self.market_open
    }

    pub fn market_close(&self) -> NaiveTime {
        self.market_close
    }

    /// Minutes from market open to market close.
    pub fn session_minutes(&self) -> f64 {
        (self.market_close - self.market_open).num_seconds() as f64 / 60.0
    }

    pub fn in_market_hours(&self, ts: NaiveDateTime) -> bool {
        let t = ts.time();
        t >= self.market_open && t <= self.market_close
    }

    pub fn in_open_window(&self, ts: NaiveDateTime) -> bool {
        let t = ts.time();
        t >= self.market_open && t <= self.open_window_end
    }

    pub fn in_close_window(&self, ts: NaiveDateTime) -> bool {
        let t = ts.time();
        t >= self.close_start && t <= self.market_close
    }

    /// Elapsed fraction of the session at `ts` (0 at the open, 1 at the close).
    pub fn session_fraction(&self, ts: NaiveDateTime) -> f64 {
        let elapsed = (ts.time() - self.market_open).num_seconds() as f64 / 60.0;
        elapsed / self.session_minutes()
    }
}

/// One-period log returns from a bar series.
///
/// Bars are sorted and de-duplicated by timestamp first. A return is emitted only
/// when both closes are positive and finite. With `intraday_only`, returns whose
/// previous bar falls on another calendar day are dropped.
pub fn log_returns(bars: &[PriceBar], intraday_only: bool) -> Vec<TimedReturn> {
    let mut sorted = bars.to_vec();
    sorted.sort_by_key(|b| b.timestamp);
    sorted.dedup_by_key(|b| b.timestamp);

    let mut out = Vec::with_capacity(sorted.len().saturating_sub(1));
    for w in sorted.windows(2) {
        let (prev, curr) = (&w[0], &w[1]);
        if !(valid_price(prev.close) && valid_price(curr.close)) {
            continue;
        }
        if intraday_only && prev.timestamp.date() != curr.timestamp.date() {
            continue;
        }
        out.push(TimedReturn {
            timestamp: curr.timestamp,
            value: (curr.close / prev.close).ln(),
        });
    }
    out
}

/// Keep returns stamped inside market hours.
pub fn market_hours(returns: &[TimedReturn], clock: &SessionClock) -> Vec<TimedReturn> {
    returns
        .iter()
        .filter(|r| clock.in_market_hours(r.timestamp))
        .copied()
        .collect()
}

/// Split market-hours returns into the open and close window samples.
pub fn split_windows(returns: &[TimedReturn], clock: &SessionClock) -> WindowSamples {
    let session = market_hours(returns, clock);
    let open = session
        .iter()
        .filter(|r| clock.in_open_window(r.timestamp))
        .map(|r| r.value)
        .collect();
    let close = session
        .iter()
        .filter(|r| clock.in_close_window(r.timestamp))
        .map(|r| r.value)
        .collect();
    WindowSamples { open, close, session }
}

fn valid_price(p: f64) -> bool {
    p.is_finite() && p > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn clock() -> SessionClock {
        SessionClock::new(t(9, 30), t(9, 35), t(15, 55), t(16, 0)).unwrap()
    }

    #[test]
    fn clock_rejects_bad_ordering() {
        assert!(SessionClock::new(t(9, 30), t(9, 30), t(15, 55), t(16, 0)).is_err());
        assert!(SessionClock::new(t(9, 30), t(16, 0), t(15, 55), t(16, 0)).is_err());
        assert!(SessionClock::new(t(9, 30), t(9, 35), t(16, 0), t(16, 0)).is_err());
        // Open window may run straight into the close window.
        assert!(SessionClock::new(t(9, 30), t(12, 0), t(12, 0), t(16, 0)).is_ok());
    }

    #[test]
    fn session_geometry() {
        let c = clock();
        assert_eq!(c.session_minutes(), 390.0);
        assert_eq!(c.session_fraction(ts(3, 9, 30)), 0.0);
        assert_eq!(c.session_fraction(ts(3, 16, 0)), 1.0);
        assert!((c.session_fraction(ts(3, 12, 45)) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn log_returns_sort_dedup_and_skip_bad_prices() {
        let bars = vec![
            PriceBar { timestamp: ts(3, 9, 32), close: 110.0 },
            PriceBar { timestamp: ts(3, 9, 31), close: 100.0 },
            PriceBar { timestamp: ts(3, 9, 32), close: 999.0 },
            PriceBar { timestamp: ts(3, 9, 33), close: 0.0 },
            PriceBar { timestamp: ts(3, 9, 34), close: 121.0 },
        ];
        let r = log_returns(&bars, false);
        // 9:31 -> 9:32 kept; both pairs touching the zero close dropped.
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].timestamp, ts(3, 9, 32));
        assert!((r[0].value - (1.1_f64).ln()).abs() < 1e-15);
    }

    #[test]
    fn overnight_returns_respect_intraday_flag() {
        let bars = vec![
            PriceBar { timestamp: ts(3, 16, 0), close: 100.0 },
            PriceBar { timestamp: ts(4, 9, 30), close: 102.0 },
            PriceBar { timestamp: ts(4, 9, 31), close: 101.0 },
        ];
        assert_eq!(log_returns(&bars, false).len(), 2);
        let intraday = log_returns(&bars, true);
        assert_eq!(intraday.len(), 1);
        assert_eq!(intraday[0].timestamp, ts(4, 9, 31));
    }

    #[test]
    fn windows_are_inclusive() {
        let returns: Vec<TimedReturn> = [
            (9, 29, 1.0),
            (9, 30, 2.0),
            (9, 35, 3.0),
            (9, 36, 4.0),
            (15, 54, 5.0),
            (15, 55, 6.0),
            (16, 0, 7.0),
            (16, 1, 8.0),
        ]
        .iter()
        .map(|&(h, m, v)| TimedReturn { timestamp: ts(5, h, m), value: v })
        .collect();

        let w = split_windows(&returns, &clock());
        assert_eq!(w.open, vec![2.0, 3.0]);
        assert_eq!(w.close, vec![6.0, 7.0]);
        assert_eq!(w.session.len(), 6);
    }
}
