//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: slow - 1 + signal - 1 bars

use crate::domain::bar::Bar;
use crate::domain::indicator::ema::ema_of;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn calculate_macd(
    bars: &[Bar],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    };

    if bars.is_empty() || fast == 0 || slow == 0 || signal_period == 0 {
        return IndicatorSeries {
            indicator_type,
            values: Vec::new(),
        };
    }

    let closes: Vec<f64> = bars.iter().map(Bar::close_f64).collect();
    let macd_line: Vec<Option<f64>> = ema_of(&closes, fast)
        .into_iter()
        .zip(ema_of(&closes, slow))
        .map(|(f, s)| Some(f? - s?))
        .collect();

    // The signal EMA starts at the first defined MACD value.
    let first = macd_line.iter().position(Option::is_some).unwrap_or(bars.len());
    let defined: Vec<f64> = macd_line[first..].iter().flatten().copied().collect();
    let mut signal_line = vec![None; first];
    signal_line.extend(ema_of(&defined, signal_period));

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let line = macd_line[i].unwrap_or(0.0);
            let signal = signal_line[i];
            let signal_value = signal.unwrap_or(0.0);
            IndicatorPoint {
                date: bar.date,
                valid: signal.is_some(),
                value: IndicatorValue::Macd {
                    line,
                    signal: signal_value,
                    histogram: line - signal_value,
                },
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}
