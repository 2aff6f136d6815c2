//! Yahoo chart API integration for intraday price bars.

use chrono::{DateTime, Duration, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::domain::PriceBar;
use crate::error::AppError;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = concat!("sb-bridge/", env!("CARGO_PKG_VERSION"));

/// Intraday history is served in windows of at most 7 days.
const CHUNK_DAYS: i64 = 7;

pub struct YahooClient {
    client: Client,
    base_url: String,
}

impl YahooClient {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let base_url = std::env::var("SB_CHART_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::new(4, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Download `weeks_back` consecutive 7-day chunks ending now.
    ///
    /// A failing or empty chunk is logged and skipped; the call only fails when no
    /// bars were collected at all. Bars come back in exchange-local time.
    pub fn fetch_bars(&self, ticker: &str, weeks_back: u32, interval: &str) -> Result<Vec<PriceBar>, AppError> {
        let now = Utc::now();
        let mut bars = Vec::new();

        for week in 0..weeks_back {
            let end = now - Duration::days(CHUNK_DAYS * week as i64);
            let start = end - Duration::days(CHUNK_DAYS);

            match self.fetch_chunk(ticker, start, end, interval) {
                Ok(chunk) if chunk.is_empty() => {
                    tracing::warn!(week = week + 1, %start, %end, "no bars for chunk, skipping");
                }
                Ok(chunk) => {
                    tracing::info!(week = week + 1, bars = chunk.len(), "fetched chunk");
                    bars.extend(chunk);
                }
                Err(err) => {
                    tracing::warn!(week = week + 1, error = %err, "chunk failed, skipping");
                }
            }
        }

        if bars.is_empty() {
            return Err(AppError::new(
                3,
                format!("No {interval} bars returned for {ticker} over the last {weeks_back} week(s)."),
            ));
        }

        bars.sort_by_key(|b| b.timestamp);
        bars.dedup_by_key(|b| b.timestamp);
        Ok(bars)
    }

    fn fetch_chunk(
        &self,
        ticker: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: &str,
    ) -> Result<Vec<PriceBar>, AppError> {
        let url = format!("{}/{}", self.base_url, ticker);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("period1", start.timestamp().to_string()),
                ("period2", end.timestamp().to_string()),
                ("interval", interval.to_string()),
                ("includePrePost", "false".to_string()),
            ])
            .send()
            .map_err(|e| AppError::new(4, format!("Chart request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                4,
                format!("Chart request failed with status {}.", resp.status()),
            ));
        }

        let body: ChartResponse = resp
            .json()
            .map_err(|e| AppError::new(4, format!("Failed to parse chart response: {e}")))?;

        parse_chart(body)
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

fn parse_chart(body: ChartResponse) -> Result<Vec<PriceBar>, AppError> {
    if let Some(err) = body.chart.error {
        return Err(AppError::new(4, format!("Chart API error {}: {}", err.code, err.description)));
    }

    let Some(result) = body.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    let offset = result.meta.gmtoffset;
    let mut out = Vec::with_capacity(result.timestamp.len());
    for (ts, close) in result.timestamp.iter().zip(closes) {
        let Some(close) = close.filter(|c| c.is_finite()) else {
            continue;
        };
        let local = DateTime::from_timestamp(ts + offset, 0)
            .ok_or_else(|| AppError::new(4, format!("Invalid chart timestamp {ts}.")))?
            .naive_utc();
        out.push(PriceBar { timestamp: local, close });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn parse(json: &str) -> Result<Vec<PriceBar>, AppError> {
        let body: ChartResponse = serde_json::from_str(json).unwrap();
        parse_chart(body)
    }

    #[test]
    fn converts_to_exchange_time_and_skips_nulls() {
        // 2025-03-10 13:30:00 UTC = 09:30 EDT (offset -4h)
        let json = r#"{
            "chart": {
                "result": [{
                    "meta": {"gmtoffset": -14400, "symbol": "SPY"},
                    "timestamp": [1741613400, 1741613460, 1741613520],
                    "indicators": {"quote": [{"close": [560.1, null, 560.4], "open": [1, 2, 3]}]}
                }],
                "error": null
            }
        }"#;
        let bars = parse(json).unwrap();
        assert_eq!(bars.len(), 2);
        let expected = NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(bars[0].timestamp, expected);
        assert_eq!(bars[0].close, 560.1);
        assert_eq!(bars[1].timestamp, expected + Duration::minutes(2));
    }

    #[test]
    fn api_error_is_reported() {
        let json = r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found"}}}"#;
        let err = parse(json).unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert!(err.message().contains("No data found"));
    }

    #[test]
    fn empty_result_is_empty_chunk() {
        let json = r#"{"chart": {"result": [{"meta": {"gmtoffset": 0}, "indicators": {"quote": []}}], "error": null}}"#;
        assert!(parse(json).unwrap().is_empty());
    }
}
