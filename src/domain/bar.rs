//! Daily bar representation: OHLC prices plus precomputed indicator fields.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Indicator values attached to one bar. `None` means the value is not
/// available yet (warm-up) or was not supplied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Indicators {
    pub sma_fast: Option<f64>,
    pub sma_slow: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub bb_low: Option<f64>,
    pub atr: Option<f64>,
    pub bullish_engulfing: bool,
    pub hammer: bool,
    pub sentiment: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub indicators: Indicators,
}

impl Bar {
    pub fn new(
        symbol: &str,
        date: NaiveDate,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
    ) -> Self {
        Bar {
            symbol: symbol.to_string(),
            date,
            open,
            high,
            low,
            close,
            indicators: Indicators::default(),
        }
    }

    pub fn close_f64(&self) -> f64 {
        self.close.to_f64().unwrap_or(0.0)
    }

    pub fn high_f64(&self) -> f64 {
        self.high.to_f64().unwrap_or(0.0)
    }

    pub fn low_f64(&self) -> f64 {
        self.low.to_f64().unwrap_or(0.0)
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high_f64() - self.low_f64();
        let hc = (self.high_f64() - prev_close).abs();
        let lc = (self.low_f64() - prev_close).abs();
        hl.max(hc).max(lc)
    }

    pub fn is_green(&self) -> bool {
        self.close > self.open
    }

    pub fn is_red(&self) -> bool {
        self.close < self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_bar() -> Bar {
        Bar::new(
            "AAPL",
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            dec!(100),
            dec!(110),
            dec!(90),
            dec!(105),
        )
    }

    #[test]
    fn new_bar_has_no_indicators() {
        let bar = sample_bar();
        assert_eq!(bar.indicators, Indicators::default());
        assert!(bar.indicators.sma_fast.is_none());
        assert!(!bar.indicators.hammer);
    }

    #[test]
    fn close_as_f64() {
        assert!((sample_bar().close_f64() - 105.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_hl_dominates() {
        let bar = sample_bar();
        // high-low=20, |high-100|=10, |low-100|=10 → 20
        assert!((bar.true_range(100.0) - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        let bar = sample_bar();
        // |110-70| = 40
        assert!((bar.true_range(70.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_down() {
        let bar = sample_bar();
        // |90-130| = 40
        assert!((bar.true_range(130.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn candle_colour() {
        let bar = sample_bar();
        assert!(bar.is_green());
        assert!(!bar.is_red());
    }
}
