//! Typed run settings built from a sectioned configuration source.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::path::PathBuf;
use std::str::FromStr;

use crate::domain::config_validation::{
    optional_date, parse_decimal, split_list, validate_backtest_config,
};
use crate::domain::error::AgentBenchError;
use crate::domain::feed::FeedConfig;
use crate::domain::strategy::{AllocationPolicy, MissingAtr, ScoringRule, StrategyConfig};
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_INITIAL_CAPITAL: Decimal = dec!(10000);

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSettings {
    pub state_file: PathBuf,
    /// Seconds between cycles; 0 runs a single cycle.
    pub interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub initial_capital: Decimal,
    pub data_dir: PathBuf,
    /// Empty means every symbol the data source offers.
    pub symbols: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub output_dir: Option<PathBuf>,
    pub feed: FeedConfig,
    pub agents: Vec<(String, StrategyConfig)>,
    pub service: ServiceSettings,
}

impl RunSettings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, AgentBenchError> {
        validate_backtest_config(config)?;

        let initial_capital = match config.get_string("backtest", "initial_capital") {
            Some(raw) => parse_decimal("backtest", "initial_capital", &raw)?,
            None => DEFAULT_INITIAL_CAPITAL,
        };
        let data_dir = PathBuf::from(
            config
                .get_string("backtest", "data_dir")
                .unwrap_or_default()
                .trim(),
        );
        let symbols = config
            .get_string("backtest", "symbols")
            .map(|s| split_list(&s).into_iter().map(|s| s.to_uppercase()).collect())
            .unwrap_or_default();
        let output_dir = config
            .get_string("backtest", "output_dir")
            .filter(|s| !s.trim().is_empty())
            .map(|s| PathBuf::from(s.trim()));

        let feed = build_feed_config(config)?;

        let names = config
            .get_string("backtest", "agents")
            .map(|s| split_list(&s))
            .unwrap_or_default();
        let mut agents = Vec::with_capacity(names.len());
        for name in names {
            let strategy = build_strategy(config, &name)?;
            agents.push((name, strategy));
        }

        let state_file = config
            .get_string("service", "state_file")
            .filter(|s| !s.trim().is_empty())
            .map(|s| PathBuf::from(s.trim()))
            .unwrap_or_else(|| PathBuf::from("agentbench_state.json"));
        let interval = config.get_int("service", "interval_secs", 0);
        if interval < 0 {
            return Err(AgentBenchError::invalid(
                "service",
                "interval_secs",
                "interval_secs must not be negative",
            ));
        }

        Ok(RunSettings {
            initial_capital,
            data_dir,
            symbols,
            start_date: optional_date(config, "start_date")?,
            end_date: optional_date(config, "end_date")?,
            output_dir,
            feed,
            agents,
            service: ServiceSettings {
                state_file,
                interval_secs: interval as u64,
            },
        })
    }
}

fn period(config: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, AgentBenchError> {
    let value = config.get_int("feed", key, default as i64);
    usize::try_from(value)
        .map_err(|_| AgentBenchError::invalid("feed", key, "period must not be negative"))
}

pub fn build_feed_config(config: &dyn ConfigPort) -> Result<FeedConfig, AgentBenchError> {
    let d = FeedConfig::default();
    let feed = FeedConfig {
        sma_fast: period(config, "sma_fast", d.sma_fast)?,
        sma_slow: period(config, "sma_slow", d.sma_slow)?,
        rsi_period: period(config, "rsi_period", d.rsi_period)?,
        macd_fast: period(config, "macd_fast", d.macd_fast)?,
        macd_slow: period(config, "macd_slow", d.macd_slow)?,
        macd_signal: period(config, "macd_signal", d.macd_signal)?,
        bb_period: period(config, "bb_period", d.bb_period)?,
        bb_stddev: config.get_double("feed", "bb_stddev", d.bb_stddev),
        atr_period: period(config, "atr_period", d.atr_period)?,
        detect_patterns: config.get_bool("feed", "detect_patterns", d.detect_patterns),
    };
    feed.validate()?;
    Ok(feed)
}

fn parse_f64(section: &str, key: &str, raw: &str) -> Result<f64, AgentBenchError> {
    let raw = raw.trim();
    raw.parse::<f64>().map_err(|_| {
        AgentBenchError::invalid(section, key, format!("'{}' is not a number", raw))
    })
}

fn parse_i32(section: &str, key: &str, raw: &str) -> Result<i32, AgentBenchError> {
    let raw = raw.trim();
    raw.parse::<i32>().map_err(|_| {
        AgentBenchError::invalid(section, key, format!("'{}' is not an integer", raw))
    })
}

fn parse_flag(section: &str, key: &str, raw: &str) -> Result<bool, AgentBenchError> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        other => Err(AgentBenchError::invalid(
            section,
            key,
            format!("'{}' is not a boolean", other),
        )),
    }
}

/// Builds the strategy for agent `name` from its `[agent.<name>]` section:
/// the preset (defaulting to the agent's name) plus any overrides.
pub fn build_strategy(
    config: &dyn ConfigPort,
    name: &str,
) -> Result<StrategyConfig, AgentBenchError> {
    let section = format!("agent.{}", name.to_lowercase());
    let get = |key: &str| config.get_string(&section, key).filter(|v| !v.trim().is_empty());

    let preset = get("preset").unwrap_or_else(|| name.to_string());
    let mut strategy = StrategyConfig::preset(&preset).ok_or_else(|| {
        AgentBenchError::invalid(
            &section,
            "preset",
            format!(
                "unknown preset '{}', expected one of {}",
                preset.trim(),
                StrategyConfig::preset_names().join(", ")
            ),
        )
    })?;

    if let Some(raw) = get("buy_threshold") {
        strategy.buy_threshold = parse_i32(&section, "buy_threshold", &raw)?;
    }
    if let Some(raw) = get("sell_threshold") {
        strategy.sell_threshold = parse_i32(&section, "sell_threshold", &raw)?;
    }

    let t = &mut strategy.thresholds;
    for (key, slot) in [
        ("rsi_oversold", &mut t.rsi_oversold),
        ("rsi_overbought", &mut t.rsi_overbought),
        ("rsi_momentum_floor", &mut t.rsi_momentum_floor),
        ("sentiment_upper", &mut t.sentiment_upper),
        ("sentiment_lower", &mut t.sentiment_lower),
    ] {
        if let Some(raw) = get(key) {
            *slot = parse_f64(&section, key, &raw)?;
        }
    }

    strategy.allocation = build_allocation(&section, &strategy.allocation, &get)?;

    if let Some(raw) = get("trailing_stop_atr") {
        strategy.trailing_stop.atr_multiplier = parse_f64(&section, "trailing_stop_atr", &raw)?;
    }
    if let Some(raw) = get("missing_atr") {
        strategy.trailing_stop.missing_atr = MissingAtr::from_str(&raw)
            .map_err(|reason| AgentBenchError::invalid(&section, "missing_atr", reason))?;
    }
    if let Some(raw) = get("trend_reversal_exit") {
        strategy.trend_reversal_exit = parse_flag(&section, "trend_reversal_exit", &raw)?;
    }
    if let Some(raw) = get("universe") {
        strategy.universe = Some(split_list(&raw).into_iter().map(|s| s.to_uppercase()).collect());
    }

    for key in config.keys(&section) {
        let Some(rule_name) = key.strip_prefix("weight.") else {
            continue;
        };
        let rule = ScoringRule::from_str(rule_name)
            .map_err(|reason| AgentBenchError::invalid(&section, &key, reason))?;
        let raw = get(&key).unwrap_or_default();
        strategy
            .weights
            .insert(rule, parse_i32(&section, &key, &raw)?);
    }

    strategy.validate()?;
    Ok(strategy)
}

fn build_allocation<F>(
    section: &str,
    current: &AllocationPolicy,
    get: &F,
) -> Result<AllocationPolicy, AgentBenchError>
where
    F: Fn(&str) -> Option<String>,
{
    let kind = get("allocation").map(|s| s.trim().to_lowercase());
    let amount = get("allocation_amount")
        .map(|raw| parse_decimal(section, "allocation_amount", &raw))
        .transpose()?;
    let fraction = get("allocation_fraction")
        .map(|raw| parse_decimal(section, "allocation_fraction", &raw))
        .transpose()?;
    let min_trade = get("min_trade")
        .map(|raw| parse_decimal(section, "min_trade", &raw))
        .transpose()?;

    let kind = kind.unwrap_or_else(|| current.kind().to_string());
    let (cur_amount, cur_fraction, cur_min) = match current {
        AllocationPolicy::FixedDollar { amount } => (Some(*amount), None, None),
        AllocationPolicy::FractionOfInitial { fraction } => (None, Some(*fraction), None),
        AllocationPolicy::FractionOfCash {
            fraction,
            min_trade,
        } => (None, Some(*fraction), Some(*min_trade)),
    };

    let missing = |key: &str| AgentBenchError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    };
    match kind.as_str() {
        "fixed_dollar" => Ok(AllocationPolicy::FixedDollar {
            amount: amount.or(cur_amount).ok_or_else(|| missing("allocation_amount"))?,
        }),
        "fraction_of_initial" => Ok(AllocationPolicy::FractionOfInitial {
            fraction: fraction
                .or(cur_fraction)
                .ok_or_else(|| missing("allocation_fraction"))?,
        }),
        "fraction_of_cash" => Ok(AllocationPolicy::FractionOfCash {
            fraction: fraction
                .or(cur_fraction)
                .ok_or_else(|| missing("allocation_fraction"))?,
            min_trade: min_trade.or(cur_min).unwrap_or(Decimal::ZERO),
        }),
        other => Err(AgentBenchError::invalid(
            section,
            "allocation",
            format!(
                "unknown allocation '{}', expected fixed_dollar, \
                 fraction_of_initial or fraction_of_cash",
                other
            ),
        )),
    }
}
