//! Indicator feed enrichment.
//!
//! Fills the indicator fields of a symbol's bar sequence from its own OHLC
//! history. Fields already supplied by the input are left untouched, and a
//! sentiment value holds until the next bar that carries one.

use crate::domain::bar::Bar;
use crate::domain::error::AgentBenchError;
use crate::domain::indicator::bollinger::multiplier_x100;
use crate::domain::indicator::{
    IndicatorSeries, IndicatorValue, calculate_atr, calculate_bollinger, calculate_macd,
    calculate_rsi, calculate_sma,
};
use crate::domain::sentiment::carry_forward;

#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    pub sma_fast: usize,
    pub sma_slow: usize,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bb_period: usize,
    pub bb_stddev: f64,
    pub atr_period: usize,
    pub detect_patterns: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            sma_fast: 20,
            sma_slow: 50,
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bb_period: 20,
            bb_stddev: 2.0,
            atr_period: 14,
            detect_patterns: true,
        }
    }
}

impl FeedConfig {
    pub fn validate(&self) -> Result<(), AgentBenchError> {
        let periods = [
            ("sma_fast", self.sma_fast),
            ("sma_slow", self.sma_slow),
            ("rsi_period", self.rsi_period),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("bb_period", self.bb_period),
            ("atr_period", self.atr_period),
        ];
        for (key, value) in periods {
            if value == 0 {
                return Err(AgentBenchError::invalid("feed", key, "period must be positive"));
            }
        }
        if self.sma_fast >= self.sma_slow {
            return Err(AgentBenchError::invalid(
                "feed",
                "sma_fast",
                "sma_fast must be shorter than sma_slow",
            ));
        }
        if self.macd_fast >= self.macd_slow {
            return Err(AgentBenchError::invalid(
                "feed",
                "macd_fast",
                "macd_fast must be shorter than macd_slow",
            ));
        }
        if !self.bb_stddev.is_finite() || self.bb_stddev <= 0.0 {
            return Err(AgentBenchError::invalid(
                "feed",
                "bb_stddev",
                "bb_stddev must be positive",
            ));
        }
        Ok(())
    }
}

/// Computes missing indicator fields for one symbol's bars, which must be
/// sorted by date.
pub fn enrich(bars: &mut [Bar], config: &FeedConfig) {
    if bars.is_empty() {
        return;
    }
    carry_forward(bars);

    let sma_fast = calculate_sma(bars, config.sma_fast);
    let sma_slow = calculate_sma(bars, config.sma_slow);
    let rsi = calculate_rsi(bars, config.rsi_period);
    let macd = calculate_macd(bars, config.macd_fast, config.macd_slow, config.macd_signal);
    let bollinger = calculate_bollinger(bars, config.bb_period, multiplier_x100(config.bb_stddev));
    let atr = calculate_atr(bars, config.atr_period);

    for i in 0..bars.len() {
        let (bullish_engulfing, hammer) = if config.detect_patterns {
            let prev = if i > 0 { Some(&bars[i - 1]) } else { None };
            (
                prev.is_some_and(|p| is_bullish_engulfing(p, &bars[i])),
                is_hammer(&bars[i]),
            )
        } else {
            (
                bars[i].indicators.bullish_engulfing,
                bars[i].indicators.hammer,
            )
        };

        let ind = &mut bars[i].indicators;
        fill(&mut ind.sma_fast, sma_fast.simple_at(i));
        fill(&mut ind.sma_slow, sma_slow.simple_at(i));
        fill(&mut ind.rsi, rsi.simple_at(i));
        fill(&mut ind.atr, atr.simple_at(i));

        if let Some(IndicatorValue::Macd { line, signal, .. }) = macd.valid_at(i) {
            fill(&mut ind.macd, Some(*line));
            fill(&mut ind.macd_signal, Some(*signal));
        }
        fill(&mut ind.bb_low, lower_band(&bollinger, i));

        ind.bullish_engulfing = bullish_engulfing;
        ind.hammer = hammer;
    }
}

fn fill(slot: &mut Option<f64>, computed: Option<f64>) {
    if slot.is_none() {
        *slot = computed;
    }
}

fn lower_band(series: &IndicatorSeries, index: usize) -> Option<f64> {
    match series.valid_at(index)? {
        IndicatorValue::Bollinger { lower, .. } => Some(*lower),
        _ => None,
    }
}

/// Previous candle red, current green, opening below the previous close
/// and closing above the previous open.
pub fn is_bullish_engulfing(prev: &Bar, current: &Bar) -> bool {
    prev.is_red()
        && current.is_green()
        && current.open < prev.close
        && current.close > prev.open
}

/// Lower wick longer than twice the body, upper wick shorter than the body.
pub fn is_hammer(bar: &Bar) -> bool {
    let body = (bar.close - bar.open).abs();
    let lower_wick = bar.open.min(bar.close) - bar.low;
    let upper_wick = bar.high - bar.open.max(bar.close);
    lower_wick > body * rust_decimal::Decimal::TWO && upper_wick < body
}
