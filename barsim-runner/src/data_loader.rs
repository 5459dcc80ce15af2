//! Bar loading for the runner.
//!
//! Reads OHLCV bars from CSV. Headers are matched case-insensitively; the time
//! column may be called `date`, `timestamp` or `datetime`, and `volume` is
//! optional. Rows are kept in file order: ordering and price sanity are the
//! engine's job, so a bad file fails the run at the offending bar instead of
//! being repaired here.
//!
//! Synthetic random-walk bars are available for development and tests.
//! Results produced on them are tagged as synthetic.

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use barsim_core::domain::Bar;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{source_name}: missing required column '{column}'")]
    MissingColumn {
        source_name: String,
        column: &'static str,
    },

    #[error("{source_name} row {row}: unparseable timestamp '{value}'")]
    BadTimestamp {
        source_name: String,
        row: usize,
        value: String,
    },

    #[error("{source_name} row {row}: column '{column}' is not a number: '{value}'")]
    BadNumber {
        source_name: String,
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("{0} contains no bars")]
    Empty(String),
}

/// Bars plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedBars {
    pub bars: Vec<Bar>,
    /// Where the bars came from (file path or `synthetic:<seed>`).
    pub source: String,
    /// BLAKE3 over every bar's fields.
    pub dataset_hash: String,
    pub synthetic: bool,
}

impl LoadedBars {
    pub fn new(bars: Vec<Bar>, source: impl Into<String>, synthetic: bool) -> Self {
        let dataset_hash = dataset_hash(&bars);
        Self {
            bars,
            source: source.into(),
            dataset_hash,
            synthetic,
        }
    }
}

const TIME_COLUMNS: [&str; 3] = ["date", "timestamp", "datetime"];

/// Column positions resolved from the header row.
struct Columns {
    time: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

impl Columns {
    fn resolve(headers: &csv::StringRecord, source_name: &str) -> Result<Self, LoadError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &'static str| {
            find(name).ok_or_else(|| LoadError::MissingColumn {
                source_name: source_name.to_string(),
                column: name,
            })
        };
        let time = TIME_COLUMNS
            .iter()
            .find_map(|name| find(name))
            .ok_or_else(|| LoadError::MissingColumn {
                source_name: source_name.to_string(),
                column: "date",
            })?;
        Ok(Self {
            time,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            volume: find("volume"),
        })
    }
}

/// Load bars from a CSV file.
pub fn load_csv(path: &Path) -> Result<LoadedBars, LoadError> {
    let source_name = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: source_name.clone(),
        source,
    })?;
    let bars = read_bars(file, &source_name)?;
    tracing::info!(source = %source_name, bars = bars.len(), "loaded bars");
    Ok(LoadedBars::new(bars, source_name, false))
}

/// Parse CSV bars from any reader. `source_name` labels errors.
pub fn read_bars<R: Read>(reader: R, source_name: &str) -> Result<Vec<Bar>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let columns = Columns::resolve(rdr.headers()?, source_name)?;

    let mut bars = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        // 1-based, counting the header line.
        let row = i + 2;
        let field = |idx: usize| record.get(idx).unwrap_or("");
        let number = |idx: usize, column: &'static str| -> Result<f64, LoadError> {
            let raw = field(idx);
            raw.parse::<f64>().map_err(|_| LoadError::BadNumber {
                source_name: source_name.to_string(),
                row,
                column,
                value: raw.to_string(),
            })
        };

        let raw_time = field(columns.time);
        let timestamp = parse_timestamp(raw_time).ok_or_else(|| LoadError::BadTimestamp {
            source_name: source_name.to_string(),
            row,
            value: raw_time.to_string(),
        })?;
        let volume = match columns.volume {
            Some(idx) if !field(idx).is_empty() => number(idx, "volume")?,
            _ => 0.0,
        };
        bars.push(Bar::new(
            timestamp,
            number(columns.open, "open")?,
            number(columns.high, "high")?,
            number(columns.low, "low")?,
            number(columns.close, "close")?,
            volume,
        ));
    }

    if bars.is_empty() {
        return Err(LoadError::Empty(source_name.to_string()));
    }
    Ok(bars)
}

/// Accepts `YYYY-MM-DD HH:MM:SS` (optionally with fractional seconds or a
/// `T` separator), RFC 3339 and `YYYY-MM-DD HH:MM:SS±HH:MM` (offset dropped,
/// wall-clock time kept), or a bare `YYYY-MM-DD` (midnight).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

    let raw = raw.trim();
    for format in NAIVE_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_local());
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(ts.naive_local());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// BLAKE3 over the timestamp and OHLCV bit patterns of every bar.
pub fn dataset_hash(bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(&bar.timestamp.and_utc().timestamp_micros().to_le_bytes());
        for value in [bar.open, bar.high, bar.low, bar.close, bar.volume] {
            hasher.update(&value.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

/// Deterministic daily random-walk bars starting 2020-01-01.
pub fn synthetic_bars(count: usize, seed: u64) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = NaiveDate::from_ymd_opt(2020, 1, 1)
        .and_then(|d| d.and_hms_opt(16, 0, 0))
        .unwrap_or_default();

    let mut bars = Vec::with_capacity(count);
    let mut close = 100.0_f64;
    for i in 0..count {
        let open = close;
        close = open * (1.0 + rng.gen_range(-0.02..0.02));
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(100_000.0..1_000_000.0_f64).round();
        bars.push(Bar::new(
            start + chrono::Duration::days(i as i64),
            open,
            high,
            low,
            close,
            volume,
        ));
    }
    bars
}

/// Synthetic bars wrapped with provenance.
pub fn load_synthetic(count: usize, seed: u64) -> LoadedBars {
    LoadedBars::new(synthetic_bars(count, seed), format!("synthetic:{seed}"), true)
}
