//! Average True Range with Wilder smoothing.
//!
//! Seed: mean of the first n true ranges (the first bar uses high - low).
//! Then ATR[i] = (ATR[i-1] * (n-1) + TR[i]) / n.
//! Warmup: first (n-1) bars are invalid.

use crate::domain::bar::Bar;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};

pub fn calculate_atr(bars: &[Bar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.is_empty() {
        return IndicatorSeries {
            indicator_type: IndicatorType::Atr(period),
            values: vec![],
        };
    }

    let tr_values: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high_f64() - bar.low_f64()
            } else {
                bar.true_range(bars[i - 1].close_f64())
            }
        })
        .collect();

    let mut results: Vec<IndicatorPoint> = Vec::with_capacity(bars.len());
    let mut atr = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        let valid = i + 1 >= period;
        if i + 1 == period {
            atr = tr_values[..=i].iter().sum::<f64>() / period as f64;
        } else if i + 1 > period {
            atr = (atr * (period - 1) as f64 + tr_values[i]) / period as f64;
        }

        results.push(IndicatorPoint {
            date: bar.date,
            valid,
            value: IndicatorValue::Simple(if valid { atr } else { 0.0 }),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values: results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn make_bar(day: u32, high: f64, low: f64, close: f64) -> Bar {
        Bar::new(
            "TEST",
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            Decimal::try_from(close).unwrap(),
            Decimal::try_from(high).unwrap(),
            Decimal::try_from(low).unwrap(),
            Decimal::try_from(close).unwrap(),
        )
    }

    #[test]
    fn atr_warmup() {
        let bars: Vec<Bar> = (1..=5).map(|d| make_bar(d, 110.0, 90.0, 100.0)).collect();
        let series = calculate_atr(&bars, 3);

        assert_eq!(series.values.len(), 5);
        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        assert!(series.values[4].valid);
    }

    #[test]
    fn atr_constant_range() {
        let bars: Vec<Bar> = (1..=5).map(|d| make_bar(d, 110.0, 90.0, 100.0)).collect();
        let series = calculate_atr(&bars, 3);

        for i in 2..5 {
            assert!((series.simple_at(i).unwrap() - 20.0).abs() < 1e-10);
        }
    }

    #[test]
    fn atr_wilder_smoothing() {
        let bars = vec![
            make_bar(1, 102.0, 98.0, 100.0),
            make_bar(2, 104.0, 100.0, 102.0),
            make_bar(3, 112.0, 100.0, 110.0),
        ];
        let series = calculate_atr(&bars, 2);

        // TR: 4, 4, 12 → seed 4, then (4 * 1 + 12) / 2 = 8
        assert!((series.simple_at(1).unwrap() - 4.0).abs() < 1e-10);
        assert!((series.simple_at(2).unwrap() - 8.0).abs() < 1e-10);
    }

    #[test]
    fn atr_period_0() {
        let bars = vec![make_bar(1, 110.0, 90.0, 100.0)];
        assert!(calculate_atr(&bars, 0).values.is_empty());
    }
}
