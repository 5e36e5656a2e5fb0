//! Exponential moving average.
//!
//! Seeded with the simple mean of the first `period` values, then smoothed
//! with k = 2/(period+1).

/// EMA over a raw value sequence; `None` until `period` values have been seen.
pub fn ema_of(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut seed = 0.0;
    let mut current: Option<f64> = None;

    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            current = match current {
                Some(prev) => Some(v * k + prev * (1.0 - k)),
                None => {
                    seed += v;
                    (i + 1 == period).then(|| seed / period as f64)
                }
            };
            current
        })
        .collect()
}
