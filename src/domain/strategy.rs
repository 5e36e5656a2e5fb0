//! Strategy configuration: scoring weights, thresholds, sizing and risk.
//!
//! One `StrategyConfig` drives the shared scoring/risk/allocation engine.
//! Agent behaviours differ only by data, see the presets below.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use super::config_validation::validate_strategy;
use super::error::AgentBenchError;

pub const MAG7: [&str; 8] = ["AAPL", "GOOGL", "MSFT", "AMZN", "TSLA", "NVDA", "META", "NFLX"];

/// Independent bullish/bearish conditions that contribute to the confluence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringRule {
    /// Fast MA above slow MA.
    TrendAlignment,
    /// Uptrend with the close above the fast MA.
    StrongTrend,
    /// RSI below the oversold threshold.
    Oversold,
    /// RSI above the overbought threshold.
    Overbought,
    /// RSI strictly between the momentum floor and the overbought threshold.
    HealthyMomentum,
    /// MACD line above its signal line.
    MacdBullish,
    /// Close below the lower Bollinger band.
    BollingerDip,
    BullishEngulfing,
    Hammer,
    PositiveSentiment,
    NegativeSentiment,
}

impl ScoringRule {
    pub const ALL: [ScoringRule; 11] = [
        ScoringRule::TrendAlignment,
        ScoringRule::StrongTrend,
        ScoringRule::Oversold,
        ScoringRule::Overbought,
        ScoringRule::HealthyMomentum,
        ScoringRule::MacdBullish,
        ScoringRule::BollingerDip,
        ScoringRule::BullishEngulfing,
        ScoringRule::Hammer,
        ScoringRule::PositiveSentiment,
        ScoringRule::NegativeSentiment,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ScoringRule::TrendAlignment => "trend_alignment",
            ScoringRule::StrongTrend => "strong_trend",
            ScoringRule::Oversold => "oversold",
            ScoringRule::Overbought => "overbought",
            ScoringRule::HealthyMomentum => "healthy_momentum",
            ScoringRule::MacdBullish => "macd_bullish",
            ScoringRule::BollingerDip => "bollinger_dip",
            ScoringRule::BullishEngulfing => "bullish_engulfing",
            ScoringRule::Hammer => "hammer",
            ScoringRule::PositiveSentiment => "positive_sentiment",
            ScoringRule::NegativeSentiment => "negative_sentiment",
        }
    }
}

impl fmt::Display for ScoringRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScoringRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ScoringRule::ALL
            .into_iter()
            .find(|rule| rule.name() == wanted)
            .ok_or_else(|| format!("unknown scoring rule '{}'", s.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleThresholds {
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub rsi_momentum_floor: f64,
    pub sentiment_upper: f64,
    pub sentiment_lower: f64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        RuleThresholds {
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            rsi_momentum_floor: 50.0,
            sentiment_upper: 0.1,
            sentiment_lower: -0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum AllocationPolicy {
    /// floor(amount / price) shares.
    FixedDollar { amount: Decimal },
    /// floor(initial_capital × fraction / price) shares.
    FractionOfInitial { fraction: Decimal },
    /// floor(cash × fraction / price) shares, skipped when the allocation is
    /// below `min_trade`.
    FractionOfCash { fraction: Decimal, min_trade: Decimal },
}

impl AllocationPolicy {
    pub fn kind(&self) -> &'static str {
        match self {
            AllocationPolicy::FixedDollar { .. } => "fixed_dollar",
            AllocationPolicy::FractionOfInitial { .. } => "fraction_of_initial",
            AllocationPolicy::FractionOfCash { .. } => "fraction_of_cash",
        }
    }
}

/// What the trailing stop does on a bar without an ATR value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingAtr {
    /// No stop check on that bar.
    #[default]
    Skip,
    /// Stop distance of zero: the stop sits at the high-water mark.
    Zero,
}

impl FromStr for MissingAtr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(MissingAtr::Skip),
            "zero" => Ok(MissingAtr::Zero),
            other => Err(format!("unknown missing_atr policy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailingStop {
    /// ATR multiple below the high-water mark; 0 disables the stop.
    pub atr_multiplier: f64,
    pub missing_atr: MissingAtr,
}

impl TrailingStop {
    pub fn disabled() -> Self {
        TrailingStop {
            atr_multiplier: 0.0,
            missing_atr: MissingAtr::Skip,
        }
    }

    pub fn atr(multiplier: f64) -> Self {
        TrailingStop {
            atr_multiplier: multiplier,
            missing_atr: MissingAtr::Skip,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.atr_multiplier > 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub name: String,
    pub description: String,
    pub weights: BTreeMap<ScoringRule, i32>,
    pub thresholds: RuleThresholds,
    pub buy_threshold: i32,
    pub sell_threshold: i32,
    pub allocation: AllocationPolicy,
    pub trailing_stop: TrailingStop,
    /// Force a sell when the fast MA crosses below the slow MA while held.
    pub trend_reversal_exit: bool,
    /// Tradable symbols; `None` trades every symbol in the feed.
    pub universe: Option<BTreeSet<String>>,
}

impl StrategyConfig {
    pub fn weight(&self, rule: ScoringRule) -> i32 {
        self.weights.get(&rule).copied().unwrap_or(0)
    }

    pub fn trades(&self, symbol: &str) -> bool {
        self.universe
            .as_ref()
            .is_none_or(|universe| universe.contains(symbol))
    }

    pub fn validate(&self) -> Result<(), AgentBenchError> {
        validate_strategy(self)
    }

    /// SMA trend follower: buy in an uptrend, sell otherwise, $1000 per entry.
    /// Equal fast and slow averages score 0 and therefore sell.
    pub fn basic() -> Self {
        StrategyConfig {
            name: "basic".into(),
            description: "Moving-average trend follower with fixed dollar entries".into(),
            weights: BTreeMap::from([(ScoringRule::TrendAlignment, 1)]),
            thresholds: RuleThresholds::default(),
            buy_threshold: 1,
            sell_threshold: 0,
            allocation: AllocationPolicy::FixedDollar {
                amount: dec!(1000),
            },
            trailing_stop: TrailingStop::disabled(),
            trend_reversal_exit: false,
            universe: None,
        }
    }

    /// Trend + RSI reversal scoring with a 2 ATR trailing stop.
    pub fn pro() -> Self {
        StrategyConfig {
            name: "pro".into(),
            description: "Scored trend/RSI strategy with a 2 ATR trailing stop".into(),
            weights: BTreeMap::from([
                (ScoringRule::TrendAlignment, 2),
                (ScoringRule::Oversold, 2),
                (ScoringRule::Overbought, -2),
            ]),
            thresholds: RuleThresholds::default(),
            buy_threshold: 3,
            sell_threshold: 0,
            allocation: AllocationPolicy::FractionOfInitial {
                fraction: dec!(0.20),
            },
            trailing_stop: TrailingStop::atr(2.0),
            trend_reversal_exit: false,
            universe: None,
        }
    }

    /// Compounding allocation, lower entry bar and a wider 4 ATR stop.
    pub fn aggressive() -> Self {
        StrategyConfig {
            name: "aggressive".into(),
            description: "Compounding momentum strategy with a 4 ATR trailing stop".into(),
            weights: BTreeMap::from([
                (ScoringRule::TrendAlignment, 2),
                (ScoringRule::StrongTrend, 1),
                (ScoringRule::HealthyMomentum, 1),
                (ScoringRule::Oversold, 2),
                (ScoringRule::Overbought, -2),
            ]),
            thresholds: RuleThresholds::default(),
            buy_threshold: 2,
            sell_threshold: 0,
            allocation: AllocationPolicy::FractionOfCash {
                fraction: dec!(0.30),
                min_trade: dec!(1000),
            },
            trailing_stop: TrailingStop::atr(4.0),
            trend_reversal_exit: false,
            universe: None,
        }
    }

    /// `aggressive` restricted to the large-cap tech names.
    pub fn mag7() -> Self {
        StrategyConfig {
            name: "mag7".into(),
            description: "Aggressive strategy restricted to mega-cap tech".into(),
            universe: Some(MAG7.iter().map(|s| s.to_string()).collect()),
            ..Self::aggressive()
        }
    }

    /// Full multi-factor confluence scoring, all-in sizing, exit on death cross.
    pub fn confluence() -> Self {
        StrategyConfig {
            name: "confluence".into(),
            description: "Multi-factor pattern and sentiment confluence".into(),
            weights: BTreeMap::from([
                (ScoringRule::TrendAlignment, 2),
                (ScoringRule::Oversold, 2),
                (ScoringRule::Overbought, -2),
                (ScoringRule::MacdBullish, 1),
                (ScoringRule::BollingerDip, 2),
                (ScoringRule::BullishEngulfing, 2),
                (ScoringRule::Hammer, 1),
                (ScoringRule::PositiveSentiment, 2),
                (ScoringRule::NegativeSentiment, -2),
            ]),
            thresholds: RuleThresholds::default(),
            buy_threshold: 3,
            sell_threshold: 0,
            allocation: AllocationPolicy::FractionOfCash {
                fraction: Decimal::ONE,
                min_trade: Decimal::ZERO,
            },
            trailing_stop: TrailingStop::disabled(),
            trend_reversal_exit: true,
            universe: None,
        }
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "basic" => Some(Self::basic()),
            "pro" => Some(Self::pro()),
            "aggressive" => Some(Self::aggressive()),
            "mag7" => Some(Self::mag7()),
            "confluence" => Some(Self::confluence()),
            _ => None,
        }
    }

    pub fn preset_names() -> [&'static str; 5] {
        ["basic", "pro", "aggressive", "mag7", "confluence"]
    }
}
