//! Live-service trading cycle over a persisted set of agents.
//!
//! A cycle is a pure function from the previous `AgentBook` to the next
//! one, so a caller persists the new book only once the cycle succeeded.

use chrono::NaiveDate;
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use super::agent::{Agent, ValuationPoint};
use super::engine::step;
use super::error::AgentBenchError;
use super::market::MarketData;
use super::position::TradeRecord;
use super::strategy::StrategyConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentBook {
    pub agents: Vec<Agent>,
    #[serde(default)]
    pub history: BTreeMap<String, Vec<ValuationPoint>>,
    #[serde(default)]
    pub last_processed: Option<NaiveDate>,
}

impl AgentBook {
    pub fn agent(&self, name: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.name == name)
    }

    /// Applies configured strategies by agent name. Known agents keep their
    /// cash, positions and trades; new names start with `initial_capital`.
    /// Agents missing from `configs` are left as they are.
    pub fn sync_configs(
        &mut self,
        configs: Vec<(String, StrategyConfig)>,
        initial_capital: Decimal,
    ) -> Result<(), AgentBenchError> {
        for (name, config) in configs {
            match self.agents.iter_mut().find(|a| a.name == name) {
                Some(agent) => agent.reconfigure(config)?,
                None => {
                    info!(agent = %name, strategy = %config.name, "adding agent");
                    self.agents.push(Agent::new(&name, config, initial_capital)?);
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentCycle {
    pub name: String,
    pub trades: Vec<TradeRecord>,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// Market date processed, `None` when the book was already up to date.
    pub date: Option<NaiveDate>,
    pub agents: Vec<AgentCycle>,
}

impl CycleReport {
    pub fn trade_count(&self) -> usize {
        self.agents.iter().map(|a| a.trades.len()).sum()
    }
}

/// Evaluates every agent against each symbol's newest bar and appends one
/// valuation point per agent. Symbols whose newest bar is not after the
/// book's last processed date are not re-traded.
pub fn run_cycle(book: &AgentBook, market: &MarketData) -> (AgentBook, CycleReport) {
    let Some(latest) = market.latest_date() else {
        return up_to_date(book);
    };
    if book.last_processed.is_some_and(|last| last >= latest) {
        return up_to_date(book);
    }

    let outcomes: Vec<(Agent, AgentCycle)> = book
        .agents
        .par_iter()
        .map(|agent| cycle_agent(agent.clone(), market, book.last_processed))
        .collect();

    let mut next = AgentBook {
        agents: Vec::with_capacity(outcomes.len()),
        history: book.history.clone(),
        last_processed: Some(latest),
    };
    let mut report = CycleReport {
        date: Some(latest),
        agents: Vec::with_capacity(outcomes.len()),
    };
    for (agent, summary) in outcomes {
        next.history
            .entry(agent.name.clone())
            .or_default()
            .push(ValuationPoint {
                date: latest,
                value: summary.value,
            });
        next.agents.push(agent);
        report.agents.push(summary);
    }

    info!(date = %latest, trades = report.trade_count(), "cycle complete");
    (next, report)
}

fn up_to_date(book: &AgentBook) -> (AgentBook, CycleReport) {
    info!(last_processed = ?book.last_processed, "no new market data");
    (
        book.clone(),
        CycleReport {
            date: None,
            agents: Vec::new(),
        },
    )
}

fn cycle_agent(
    mut agent: Agent,
    market: &MarketData,
    last_processed: Option<NaiveDate>,
) -> (Agent, AgentCycle) {
    let sizing_cash = agent.cash;
    let before = agent.trades.len();

    for data in market.symbols() {
        if !agent.config.trades(&data.symbol) {
            continue;
        }
        let Some(bar) = data.latest() else {
            continue;
        };
        if last_processed.is_some_and(|last| bar.date <= last) {
            continue;
        }
        if let Some((prev, bar)) = data.bar_with_prev(bar.date) {
            step(&mut agent, prev, bar, sizing_cash);
        }
    }

    let summary = AgentCycle {
        name: agent.name.clone(),
        trades: agent.trades[before..].to_vec(),
        value: agent.portfolio_value(),
    };
    (agent, summary)
}
