//! ATR trailing stop.
//!
//! The high-water mark lives on the `Position`; it is raised with every
//! evaluated close before the stop is checked.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use super::bar::Bar;
use super::position::Position;
use super::strategy::{MissingAtr, TrailingStop};

/// `highest_price - multiplier × atr`, or `None` when the stop is disabled
/// or inactive on this bar.
pub fn stop_price(position: &Position, atr: Option<f64>, stop: &TrailingStop) -> Option<Decimal> {
    if !stop.is_enabled() {
        return None;
    }
    let atr = match (atr, stop.missing_atr) {
        (Some(atr), _) if atr.is_finite() => atr,
        (_, MissingAtr::Zero) => 0.0,
        (_, MissingAtr::Skip) => return None,
    };
    let distance = Decimal::from_f64(stop.atr_multiplier * atr)?;
    Some(position.highest_price - distance)
}

/// Marks the position with the bar's close, then reports whether the close
/// fell below the trailing stop.
pub fn update_and_check(position: &mut Position, bar: &Bar, stop: &TrailingStop) -> bool {
    position.mark(bar.close);
    stop_price(position, bar.indicators.atr, stop).is_some_and(|stop| bar.close < stop)
}
