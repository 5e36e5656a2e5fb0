//! Daily sentiment series with last-observation carry-forward.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::bar::Bar;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SentimentSeries {
    daily: BTreeMap<NaiveDate, f64>,
}

impl SentimentSeries {
    /// Builds a series from individual scored observations (e.g. one per
    /// headline). Observations on the same date are averaged; the daily mean
    /// is clamped to [-1, 1]. Non-finite scores are ignored.
    pub fn from_observations<I>(observations: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let mut sums: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
        for (date, score) in observations {
            if !score.is_finite() {
                continue;
            }
            let entry = sums.entry(date).or_insert((0.0, 0));
            entry.0 += score;
            entry.1 += 1;
        }

        let daily = sums
            .into_iter()
            .map(|(date, (sum, count))| (date, (sum / count as f64).clamp(-1.0, 1.0)))
            .collect();
        SentimentSeries { daily }
    }

    pub fn is_empty(&self) -> bool {
        self.daily.is_empty()
    }

    pub fn len(&self) -> usize {
        self.daily.len()
    }

    /// The last observed daily value on or before `date`; neutral (0.0)
    /// before the first observation.
    pub fn value_on(&self, date: NaiveDate) -> f64 {
        self.daily
            .range(..=date)
            .next_back()
            .map(|(_, v)| *v)
            .unwrap_or(0.0)
    }

    /// Fills the sentiment field of every bar that does not already carry one.
    pub fn attach(&self, bars: &mut [Bar]) {
        if self.is_empty() {
            return;
        }
        for bar in bars.iter_mut() {
            if bar.indicators.sentiment.is_none() {
                bar.indicators.sentiment = Some(self.value_on(bar.date));
            }
        }
    }
}

/// Holds each bar's sentiment over the following bars that carry none.
/// Bars before the first observed value stay empty. `bars` must be in date
/// order.
pub fn carry_forward(bars: &mut [Bar]) {
    let mut last = None;
    for bar in bars.iter_mut() {
        match bar.indicators.sentiment {
            Some(value) => last = Some(value),
            None => bar.indicators.sentiment = last,
        }
    }
}
