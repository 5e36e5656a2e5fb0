//! Confluence scoring.
//!
//! Every weighted rule is evaluated against one bar's indicator fields and
//! the weights of the rules that fire are summed. A rule with a non-zero
//! weight whose inputs are missing makes the whole bar unscorable, which
//! the caller treats as HOLD.

use rust_decimal::prelude::ToPrimitive;
use std::fmt;

use super::bar::Bar;
use super::strategy::{RuleThresholds, ScoringRule, StrategyConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => f.write_str("BUY"),
            Signal::Sell => f.write_str("SELL"),
            Signal::Hold => f.write_str("HOLD"),
        }
    }
}

/// Whether `rule` fires on `bar`; `None` when a required input is missing.
/// Pattern flags and sentiment are always available (missing sentiment is
/// neutral).
pub fn rule_fires(rule: ScoringRule, bar: &Bar, thresholds: &RuleThresholds) -> Option<bool> {
    let ind = &bar.indicators;
    let close = bar.close.to_f64()?;
    let sentiment = ind.sentiment.unwrap_or(0.0);

    let fires = match rule {
        ScoringRule::TrendAlignment => ind.sma_fast? > ind.sma_slow?,
        ScoringRule::StrongTrend => {
            let fast = ind.sma_fast?;
            fast > ind.sma_slow? && close > fast
        }
        ScoringRule::Oversold => ind.rsi? < thresholds.rsi_oversold,
        ScoringRule::Overbought => ind.rsi? > thresholds.rsi_overbought,
        ScoringRule::HealthyMomentum => {
            let rsi = ind.rsi?;
            rsi > thresholds.rsi_momentum_floor && rsi < thresholds.rsi_overbought
        }
        ScoringRule::MacdBullish => ind.macd? > ind.macd_signal?,
        ScoringRule::BollingerDip => close < ind.bb_low?,
        ScoringRule::BullishEngulfing => ind.bullish_engulfing,
        ScoringRule::Hammer => ind.hammer,
        ScoringRule::PositiveSentiment => sentiment > thresholds.sentiment_upper,
        ScoringRule::NegativeSentiment => sentiment < thresholds.sentiment_lower,
    };
    Some(fires)
}

/// Sum of the weights of every firing rule, or `None` if the bar lacks an
/// input some weighted rule needs.
pub fn score(bar: &Bar, config: &StrategyConfig) -> Option<i32> {
    let mut total = 0;
    for (&rule, &weight) in &config.weights {
        if weight == 0 {
            continue;
        }
        if rule_fires(rule, bar, &config.thresholds)? {
            total += weight;
        }
    }
    Some(total)
}

pub fn signal(score: i32, config: &StrategyConfig) -> Signal {
    if score >= config.buy_threshold {
        Signal::Buy
    } else if score <= config.sell_threshold {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

/// Score-derived signal for one bar; HOLD when the bar cannot be scored.
pub fn bar_signal(bar: &Bar, config: &StrategyConfig) -> Signal {
    score(bar, config).map_or(Signal::Hold, |s| signal(s, config))
}

/// Fast MA was at or above the slow MA on `prev` and is below it on `current`.
pub fn is_trend_reversal(prev: &Bar, current: &Bar) -> bool {
    let (p, c) = (&prev.indicators, &current.indicators);
    match (p.sma_fast, p.sma_slow, c.sma_fast, c.sma_slow) {
        (Some(pf), Some(ps), Some(cf), Some(cs)) => pf >= ps && cf < cs,
        _ => false,
    }
}
