//! CSV file data adapter.
//!
//! Reads `<SYMBOL>.csv` price tables and optional `<SYMBOL>_sentiment.csv`
//! companions from one directory. Columns are matched by header name,
//! case-insensitively; only date, open, high, low and close are required.

use crate::domain::bar::{Bar, Indicators};
use crate::domain::error::AgentBenchError;
use crate::domain::sentiment::SentimentSeries;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

const SENTIMENT_SUFFIX: &str = "_sentiment.csv";

pub struct CsvAdapter {
    base_path: PathBuf,
}

/// Header name → column index, built once per file.
struct Columns(HashMap<String, usize>);

impl Columns {
    fn new(headers: &csv::StringRecord) -> Self {
        Columns(
            headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.trim().to_lowercase(), i))
                .collect(),
        )
    }

    fn find(&self, names: &[&str]) -> Option<usize> {
        names.iter().find_map(|n| self.0.get(*n).copied())
    }

    fn require(&self, names: &[&str], file: &str) -> Result<usize, AgentBenchError> {
        self.find(names).ok_or_else(|| {
            AgentBenchError::data(format!("{}: missing '{}' column", file, names[0]))
        })
    }
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn sentiment_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}{}", symbol, SENTIMENT_SUFFIX))
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| raw.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

fn parse_price(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

/// Empty and NaN cells are missing values.
fn parse_optional(raw: Option<&str>) -> Result<Option<f64>, String> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let value: f64 = raw.parse().map_err(|_| format!("'{}' is not a number", raw))?;
    Ok(value.is_finite().then_some(value))
}

fn parse_flag(raw: Option<&str>) -> Result<bool, String> {
    match raw.map(|s| s.trim().to_lowercase()).as_deref() {
        None | Some("") => Ok(false),
        Some("true" | "1" | "1.0" | "yes") => Ok(true),
        Some("false" | "0" | "0.0" | "no") => Ok(false),
        Some(other) => Err(format!("'{}' is not a boolean", other)),
    }
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, AgentBenchError> {
        let path = self.csv_path(symbol);
        if !path.is_file() {
            return Err(AgentBenchError::NoData {
                symbol: symbol.to_string(),
            });
        }
        let file = path.display().to_string();

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|e| AgentBenchError::data(format!("failed to read {}: {}", file, e)))?;
        let headers = rdr
            .headers()
            .map_err(|e| AgentBenchError::data(format!("{}: {}", file, e)))?
            .clone();
        let cols = Columns::new(&headers);

        let date_col = cols.require(&["date"], &file)?;
        let open_col = cols.require(&["open"], &file)?;
        let high_col = cols.require(&["high"], &file)?;
        let low_col = cols.require(&["low"], &file)?;
        let close_col = cols.require(&["close"], &file)?;
        let sma_fast_col = cols.find(&["sma_fast", "sma_20"]);
        let sma_slow_col = cols.find(&["sma_slow", "sma_50"]);
        let rsi_col = cols.find(&["rsi"]);
        let macd_col = cols.find(&["macd"]);
        let macd_signal_col = cols.find(&["macd_signal"]);
        let bb_low_col = cols.find(&["bb_low"]);
        let atr_col = cols.find(&["atr"]);
        let engulfing_col = cols.find(&["bullish_engulfing"]);
        let hammer_col = cols.find(&["hammer"]);
        let sentiment_col = cols.find(&["sentiment"]);

        let mut bars = Vec::new();
        let mut seen = BTreeSet::new();

        for (row, result) in rdr.records().enumerate() {
            let line = row + 2;
            let record = result
                .map_err(|e| AgentBenchError::data(format!("{}: CSV parse error: {}", file, e)))?;
            let cell = |col: Option<usize>| col.and_then(|c| record.get(c));
            let bad = |what: &str, reason: String| {
                AgentBenchError::data(format!(
                    "{} line {}: invalid {}: {}",
                    file, line, what, reason
                ))
            };

            let date_raw = cell(Some(date_col)).unwrap_or_default();
            let date = parse_date(date_raw)
                .ok_or_else(|| bad("date", format!("'{}', expected YYYY-MM-DD", date_raw)))?;
            if !seen.insert(date) {
                return Err(bad("date", format!("duplicate date {}", date)));
            }

            let price = |col: usize, what: &str| {
                let raw = cell(Some(col)).unwrap_or_default();
                parse_price(raw).ok_or_else(|| bad(what, format!("'{}' is not a price", raw)))
            };
            let open = price(open_col, "open")?;
            let high = price(high_col, "high")?;
            let low = price(low_col, "low")?;
            let close = price(close_col, "close")?;

            let optional = |col: Option<usize>, what: &str| {
                parse_optional(cell(col)).map_err(|r| bad(what, r))
            };
            let indicators = Indicators {
                sma_fast: optional(sma_fast_col, "sma_fast")?,
                sma_slow: optional(sma_slow_col, "sma_slow")?,
                rsi: optional(rsi_col, "rsi")?,
                macd: optional(macd_col, "macd")?,
                macd_signal: optional(macd_signal_col, "macd_signal")?,
                bb_low: optional(bb_low_col, "bb_low")?,
                atr: optional(atr_col, "atr")?,
                bullish_engulfing: parse_flag(cell(engulfing_col))
                    .map_err(|r| bad("bullish_engulfing", r))?,
                hammer: parse_flag(cell(hammer_col)).map_err(|r| bad("hammer", r))?,
                sentiment: optional(sentiment_col, "sentiment")?,
            };

            let mut bar = Bar::new(symbol, date, open, high, low, close);
            bar.indicators = indicators;
            bars.push(bar);
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn fetch_sentiment(&self, symbol: &str) -> Result<SentimentSeries, AgentBenchError> {
        let path = self.sentiment_path(symbol);
        if !path.is_file() {
            return Ok(SentimentSeries::default());
        }
        let file = path.display().to_string();

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|e| AgentBenchError::data(format!("failed to read {}: {}", file, e)))?;
        let headers = rdr
            .headers()
            .map_err(|e| AgentBenchError::data(format!("{}: {}", file, e)))?
            .clone();
        let cols = Columns::new(&headers);
        let date_col = cols.require(&["date"], &file)?;
        let score_col = cols.require(&["sentiment", "score"], &file)?;

        let mut observations = Vec::new();
        for result in rdr.records() {
            let record = result
                .map_err(|e| AgentBenchError::data(format!("{}: CSV parse error: {}", file, e)))?;
            let raw_date = record.get(date_col).unwrap_or_default();
            let date = parse_date(raw_date).ok_or_else(|| {
                AgentBenchError::data(format!("{}: invalid date '{}'", file, raw_date))
            })?;
            let score = parse_optional(record.get(score_col))
                .map_err(|r| AgentBenchError::data(format!("{}: {}", file, r)))?;
            if let Some(score) = score {
                observations.push((date, score));
            }
        }
        Ok(SentimentSeries::from_observations(observations))
    }

    fn list_symbols(&self) -> Result<Vec<String>, AgentBenchError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            AgentBenchError::data(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|e| AgentBenchError::data(format!("directory entry error: {}", e)))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();

            if name.ends_with(SENTIMENT_SUFFIX) {
                continue;
            }
            if let Some(symbol) = name.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
