//! CSV ingest and persistence for price bars and return samples.
//!
//! Three file shapes are understood:
//!
//! - window returns: one `returns` column (`open_returns.csv`, `close_returns.csv`)
//! - session returns: `timestamp,returns`
//! - raw bars: `timestamp,close`
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Empty cells are missing values**, not errors (pandas writes them for NaN)

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::Path;

use chrono::NaiveDateTime;
use csv::StringRecord;

use crate::domain::{PriceBar, TimedReturn, WindowSamples};
use crate::error::AppError;

pub const OPEN_RETURNS_FILE: &str = "open_returns.csv";
pub const CLOSE_RETURNS_FILE: &str = "close_returns.csv";
pub const SESSION_RETURNS_FILE: &str = "session_returns.csv";

const TIMESTAMP_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Parsed rows plus what was skipped along the way.
#[derive(Debug, Clone)]
pub struct Ingested<T> {
    pub rows: Vec<T>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Read a single-column `returns` file.
pub fn read_returns_csv(path: &Path) -> Result<Ingested<f64>, AppError> {
    read_table(path, &["returns"], |record, header_map| {
        match get_optional(record, header_map, "returns") {
            None => Ok(None),
            Some(raw) => parse_f64(raw, "returns").map(Some),
        }
    })
}

/// Read a `timestamp,returns` session file.
pub fn read_session_csv(path: &Path) -> Result<Ingested<TimedReturn>, AppError> {
    read_table(path, &["timestamp", "returns"], |record, header_map| {
        let timestamp = parse_timestamp(get_required(record, header_map, "timestamp")?)?;
        match get_optional(record, header_map, "returns") {
            None => Ok(None),
            Some(raw) => Ok(Some(TimedReturn {
                timestamp,
                value: parse_f64(raw, "returns")?,
            })),
        }
    })
}

/// Read a `timestamp,close` bar file.
pub fn read_bars_csv(path: &Path) -> Result<Ingested<PriceBar>, AppError> {
    read_table(path, &["timestamp", "close"], |record, header_map| {
        let timestamp = parse_timestamp(get_required(record, header_map, "timestamp")?)?;
        match get_optional(record, header_map, "close") {
            None => Ok(None),
            Some(raw) => Ok(Some(PriceBar {
                timestamp,
                close: parse_f64(raw, "close")?,
            })),
        }
    })
}

pub fn write_returns_csv(path: &Path, values: &[f64]) -> Result<(), AppError> {
    let mut writer = create_writer(path)?;
    write_row(&mut writer, ["returns".to_string()])?;
    for v in values {
        write_row(&mut writer, [v.to_string()])?;
    }
    flush(writer)
}

pub fn write_session_csv(path: &Path, returns: &[TimedReturn]) -> Result<(), AppError> {
    let mut writer = create_writer(path)?;
    write_row(&mut writer, ["timestamp".to_string(), "returns".to_string()])?;
    for r in returns {
        write_row(
            &mut writer,
            [r.timestamp.format(TIMESTAMP_FMT).to_string(), r.value.to_string()],
        )?;
    }
    flush(writer)
}

pub fn write_bars_csv(path: &Path, bars: &[PriceBar]) -> Result<(), AppError> {
    let mut writer = create_writer(path)?;
    write_row(&mut writer, ["timestamp".to_string(), "close".to_string()])?;
    for b in bars {
        write_row(
            &mut writer,
            [b.timestamp.format(TIMESTAMP_FMT).to_string(), b.close.to_string()],
        )?;
    }
    flush(writer)
}

/// Persist window samples as `open_returns.csv`, `close_returns.csv` and
/// (when non-empty) `session_returns.csv` under `dir`.
pub fn write_window_samples(dir: &Path, samples: &WindowSamples) -> Result<(), AppError> {
    fs::create_dir_all(dir)
        .map_err(|e| AppError::new(2, format!("Failed to create directory '{}': {e}", dir.display())))?;
    write_returns_csv(&dir.join(OPEN_RETURNS_FILE), &samples.open)?;
    write_returns_csv(&dir.join(CLOSE_RETURNS_FILE), &samples.close)?;
    if !samples.session.is_empty() {
        write_session_csv(&dir.join(SESSION_RETURNS_FILE), &samples.session)?;
    }
    Ok(())
}

/// Load window samples written by [`write_window_samples`].
///
/// The session file is optional; without it diffusion cannot be estimated.
pub fn load_window_samples(dir: &Path) -> Result<WindowSamples, AppError> {
    let open = read_returns_csv(&dir.join(OPEN_RETURNS_FILE))?;
    let close = read_returns_csv(&dir.join(CLOSE_RETURNS_FILE))?;
    report_row_errors(OPEN_RETURNS_FILE, &open.row_errors);
    report_row_errors(CLOSE_RETURNS_FILE, &close.row_errors);

    let session_path = dir.join(SESSION_RETURNS_FILE);
    let session = if session_path.exists() {
        let session = read_session_csv(&session_path)?;
        report_row_errors(SESSION_RETURNS_FILE, &session.row_errors);
        session.rows
    } else {
        Vec::new()
    };

    tracing::info!(
        dir = %dir.display(),
        open = open.rows.len(),
        close = close.rows.len(),
        session = session.len(),
        "loaded window samples"
    );

    Ok(WindowSamples {
        open: open.rows,
        close: close.rows,
        session,
    })
}

fn report_row_errors(file: &str, errors: &[RowError]) {
    for e in errors {
        tracing::warn!(file, line = e.line, "{}", e.message);
    }
}

fn read_table<T>(
    path: &Path,
    required: &[&str],
    mut parse: impl FnMut(&StringRecord, &HashMap<String, usize>) -> Result<Option<T>, String>,
) -> Result<Ingested<T>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    for name in required {
        if !header_map.contains_key(*name) {
            return Err(AppError::new(
                2,
                format!("Missing required column `{name}` in '{}'.", path.display()),
            ));
        }
    }

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header, CSV lines are 1-based
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse(&record, &header_map) {
            Ok(Some(row)) => rows.push(row),
            Ok(None) => {}
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    Ok(Ingested {
        rows,
        row_errors,
        rows_read,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports may prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    get_optional(record, header_map, name).ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_f64(s: &str, column: &str) -> Result<f64, String> {
    let v = s
        .parse::<f64>()
        .map_err(|_| format!("Invalid number '{s}' in column `{column}`"))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("Non-finite value '{s}' in column `{column}`"))
    }
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime, String> {
    // Accept both the space-separated form we write and ISO-8601 with a `T`.
    const FMTS: [&str; 2] = [TIMESTAMP_FMT, "%Y-%m-%dT%H:%M:%S"];
    for fmt in FMTS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(ts);
        }
    }
    Err(format!("Invalid timestamp '{s}'. Expected YYYY-MM-DD HH:MM:SS."))
}

fn create_writer(path: &Path) -> Result<csv::Writer<File>, AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create CSV '{}': {e}", path.display())))?;
    Ok(csv::Writer::from_writer(file))
}

fn write_row<I>(writer: &mut csv::Writer<File>, record: I) -> Result<(), AppError>
where
    I: IntoIterator<Item = String>,
{
    writer
        .write_record(record)
        .map_err(|e| AppError::new(2, format!("Failed to write CSV row: {e}")))
}

fn flush(mut writer: csv::Writer<File>) -> Result<(), AppError> {
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush CSV: {e}")))
}
