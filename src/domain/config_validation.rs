//! Configuration validation.
//!
//! Everything is checked before a simulation starts: nothing inside a run
//! fails on configuration.

use crate::domain::error::AgentBenchError;
use crate::domain::strategy::{AllocationPolicy, StrategyConfig};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), AgentBenchError> {
    validate_initial_capital(config)?;
    validate_dates(config)?;
    validate_data_dir(config)?;
    validate_agents(config)?;
    Ok(())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), AgentBenchError> {
    let Some(raw) = config.get_string("backtest", "initial_capital") else {
        return Ok(());
    };
    let value = parse_decimal("backtest", "initial_capital", &raw)?;
    if value <= Decimal::ZERO {
        return Err(AgentBenchError::invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), AgentBenchError> {
    let start = optional_date(config, "start_date")?;
    let end = optional_date(config, "end_date")?;

    if let (Some(start), Some(end)) = (start, end)
        && start > end
    {
        return Err(AgentBenchError::invalid(
            "backtest",
            "start_date",
            "start_date must not be after end_date",
        ));
    }
    Ok(())
}

pub(crate) fn optional_date(
    config: &dyn ConfigPort,
    field: &str,
) -> Result<Option<NaiveDate>, AgentBenchError> {
    match config.get_string("backtest", field) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                AgentBenchError::invalid(
                    "backtest",
                    field,
                    format!("invalid {} format, expected YYYY-MM-DD", field),
                )
            }),
    }
}

fn validate_data_dir(config: &dyn ConfigPort) -> Result<(), AgentBenchError> {
    match config.get_string("backtest", "data_dir") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(AgentBenchError::ConfigMissing {
            section: "backtest".to_string(),
            key: "data_dir".to_string(),
        }),
    }
}

fn validate_agents(config: &dyn ConfigPort) -> Result<(), AgentBenchError> {
    let agents = config
        .get_string("backtest", "agents")
        .map(|s| split_list(&s))
        .unwrap_or_default();
    if agents.is_empty() {
        return Err(AgentBenchError::ConfigMissing {
            section: "backtest".to_string(),
            key: "agents".to_string(),
        });
    }
    Ok(())
}

/// Comma-separated list, trimmed, empty entries dropped.
pub(crate) fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

pub(crate) fn parse_decimal(
    section: &str,
    key: &str,
    raw: &str,
) -> Result<Decimal, AgentBenchError> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| AgentBenchError::invalid(section, key, format!("'{}' is not a number", raw)))
}

/// Consistency checks on a fully built strategy.
pub fn validate_strategy(strategy: &StrategyConfig) -> Result<(), AgentBenchError> {
    let name = strategy.name.as_str();

    if strategy.buy_threshold <= strategy.sell_threshold {
        return Err(AgentBenchError::strategy(
            name,
            format!(
                "buy_threshold ({}) must exceed sell_threshold ({})",
                strategy.buy_threshold, strategy.sell_threshold
            ),
        ));
    }
    if strategy.weights.values().all(|w| *w == 0) {
        return Err(AgentBenchError::strategy(name, "no scoring rule has a weight"));
    }

    validate_allocation(name, &strategy.allocation)?;

    let stop = strategy.trailing_stop.atr_multiplier;
    if !stop.is_finite() || stop < 0.0 {
        return Err(AgentBenchError::strategy(
            name,
            "trailing stop ATR multiplier must be zero or positive",
        ));
    }

    let t = &strategy.thresholds;
    let all_finite = [
        t.rsi_oversold,
        t.rsi_overbought,
        t.rsi_momentum_floor,
        t.sentiment_upper,
        t.sentiment_lower,
    ]
    .iter()
    .all(|v| v.is_finite());
    if !all_finite {
        return Err(AgentBenchError::strategy(name, "thresholds must be finite"));
    }
    if t.rsi_oversold >= t.rsi_overbought {
        return Err(AgentBenchError::strategy(
            name,
            "rsi_oversold must be below rsi_overbought",
        ));
    }
    if t.rsi_momentum_floor >= t.rsi_overbought {
        return Err(AgentBenchError::strategy(
            name,
            "rsi_momentum_floor must be below rsi_overbought",
        ));
    }
    if t.sentiment_lower >= t.sentiment_upper {
        return Err(AgentBenchError::strategy(
            name,
            "sentiment_lower must be below sentiment_upper",
        ));
    }

    if strategy.universe.as_ref().is_some_and(|u| u.is_empty()) {
        return Err(AgentBenchError::strategy(name, "universe is empty"));
    }
    Ok(())
}

fn validate_allocation(name: &str, policy: &AllocationPolicy) -> Result<(), AgentBenchError> {
    match policy {
        AllocationPolicy::FixedDollar { amount } => {
            if *amount <= Decimal::ZERO {
                return Err(AgentBenchError::strategy(name, "allocation amount must be positive"));
            }
        }
        AllocationPolicy::FractionOfInitial { fraction } => check_fraction(name, *fraction)?,
        AllocationPolicy::FractionOfCash {
            fraction,
            min_trade,
        } => {
            check_fraction(name, *fraction)?;
            if *min_trade < Decimal::ZERO {
                return Err(AgentBenchError::strategy(name, "min_trade must not be negative"));
            }
        }
    }
    Ok(())
}

fn check_fraction(name: &str, fraction: Decimal) -> Result<(), AgentBenchError> {
    if fraction <= Decimal::ZERO || fraction > Decimal::ONE {
        return Err(AgentBenchError::strategy(
            name,
            format!("allocation fraction {} must be in (0, 1]", fraction),
        ));
    }
    Ok(())
}
