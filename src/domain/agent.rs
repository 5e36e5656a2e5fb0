//! Simulated trading agent: a strategy plus its cash, holdings and trade log.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::error::AgentBenchError;
use super::position::{Position, TradeRecord};
use super::strategy::StrategyConfig;

/// Total portfolio value of one agent at the close of one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationPoint {
    pub date: NaiveDate,
    pub value: Decimal,
}

/// Cash and holdings only change through `execution::{buy, sell}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub name: String,
    pub config: StrategyConfig,
    pub initial_capital: Decimal,
    pub cash: Decimal,
    pub positions: BTreeMap<String, Position>,
    pub trades: Vec<TradeRecord>,
    #[serde(default)]
    pub rejected_orders: u64,
}

impl Agent {
    pub fn new(
        name: &str,
        config: StrategyConfig,
        initial_capital: Decimal,
    ) -> Result<Self, AgentBenchError> {
        if name.trim().is_empty() {
            return Err(AgentBenchError::strategy(&config.name, "agent name is empty"));
        }
        if initial_capital < Decimal::ZERO {
            return Err(AgentBenchError::strategy(
                name,
                "initial capital must not be negative",
            ));
        }
        config.validate()?;

        Ok(Agent {
            name: name.to_string(),
            config,
            initial_capital,
            cash: initial_capital,
            positions: BTreeMap::new(),
            trades: Vec::new(),
            rejected_orders: 0,
        })
    }

    pub fn holds(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn shares(&self, symbol: &str) -> u64 {
        self.positions.get(symbol).map_or(0, |p| p.shares)
    }

    /// Cash plus every position at its last marked price.
    pub fn portfolio_value(&self) -> Decimal {
        self.cash
            + self
                .positions
                .values()
                .map(Position::marked_value)
                .sum::<Decimal>()
    }

    pub fn valuation(&self, date: NaiveDate) -> ValuationPoint {
        ValuationPoint {
            date,
            value: self.portfolio_value(),
        }
    }

    /// Swaps in a new strategy while keeping cash, positions and trades.
    pub fn reconfigure(&mut self, config: StrategyConfig) -> Result<(), AgentBenchError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }
}
