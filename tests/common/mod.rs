#![allow(dead_code)]

use agentbench::domain::agent::Agent;
use agentbench::domain::bar::{Bar, Indicators};
pub use agentbench::domain::market::{MarketData, SymbolData};
use agentbench::domain::strategy::StrategyConfig;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fs;
use std::io::Write;
use std::path::Path;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Flat bar (open = high = low = close) with no indicators.
pub fn make_bar(symbol: &str, date: NaiveDate, close: Decimal) -> Bar {
    Bar::new(symbol, date, close, close, close, close)
}

/// Bar carrying precomputed indicators.
pub fn bar_with(symbol: &str, date: NaiveDate, close: Decimal, indicators: Indicators) -> Bar {
    let mut bar = make_bar(symbol, date, close);
    bar.indicators = indicators;
    bar
}

/// Indicators for a bar in an uptrend (fast above slow) or downtrend.
pub fn trend(up: bool) -> Indicators {
    Indicators {
        sma_fast: Some(if up { 105.0 } else { 95.0 }),
        sma_slow: Some(100.0),
        ..Indicators::default()
    }
}

pub fn agent(name: &str, config: StrategyConfig) -> Agent {
    Agent::new(name, config, dec!(10000)).unwrap()
}

/// `count` daily bars drifting upward with a small oscillation.
pub fn generate_bars(symbol: &str, start: NaiveDate, count: usize) -> Vec<Bar> {
    (0..count)
        .map(|i| {
            let cents = 10_000 + i as i64 * 50 + ((i % 7) as i64 - 3) * 150;
            let close = Decimal::new(cents, 2);
            Bar::new(
                symbol,
                start + chrono::Duration::days(i as i64),
                close - dec!(0.5),
                close + dec!(1),
                close - dec!(1),
                close,
            )
        })
        .collect()
}

/// Writes `<symbol>.csv` with the OHLC columns of `bars`.
pub fn write_price_csv(dir: &Path, symbol: &str, bars: &[Bar]) {
    let mut file = fs::File::create(dir.join(format!("{}.csv", symbol))).unwrap();
    writeln!(file, "date,open,high,low,close,volume").unwrap();
    for bar in bars {
        writeln!(
            file,
            "{},{},{},{},{},1000",
            bar.date, bar.open, bar.high, bar.low, bar.close
        )
        .unwrap();
    }
}

pub fn write_sentiment_csv(dir: &Path, symbol: &str, rows: &[(NaiveDate, f64)]) {
    let mut file = fs::File::create(dir.join(format!("{}_sentiment.csv", symbol))).unwrap();
    writeln!(file, "date,sentiment").unwrap();
    for (date, value) in rows {
        writeln!(file, "{},{}", date, value).unwrap();
    }
}
