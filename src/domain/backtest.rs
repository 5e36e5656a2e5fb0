//! Multi-agent backtest driver.
//!
//! Each agent walks its own timeline (the union of dates over its tradable
//! universe) strictly in ascending order. Agents share nothing but the
//! read-only market snapshot, so they are simulated in parallel.

use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::BTreeSet;
use tracing::{info, warn};

use super::agent::{Agent, ValuationPoint};
use super::engine::{Decision, step};
use super::error::AgentBenchError;
use super::market::MarketData;
use super::metrics::PerformanceMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Initialized,
    Running,
    Complete,
}

/// One agent's end state and equity curve.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentRun {
    pub agent: Agent,
    pub equity_curve: Vec<ValuationPoint>,
}

impl AgentRun {
    pub fn metrics(&self) -> PerformanceMetrics {
        PerformanceMetrics::compute(
            self.agent.initial_capital,
            &self.equity_curve,
            &self.agent.trades,
        )
    }
}

pub struct Backtest<'a> {
    market: &'a MarketData,
    runs: Vec<AgentRun>,
    state: RunState,
}

impl<'a> Backtest<'a> {
    /// Agent names must be unique and every strategy valid.
    pub fn new(market: &'a MarketData, agents: Vec<Agent>) -> Result<Self, AgentBenchError> {
        let mut names = BTreeSet::new();
        for agent in &agents {
            agent.config.validate()?;
            if !names.insert(agent.name.as_str()) {
                return Err(AgentBenchError::strategy(
                    &agent.config.name,
                    format!("duplicate agent name '{}'", agent.name),
                ));
            }
        }

        let runs = agents
            .into_iter()
            .map(|agent| AgentRun {
                agent,
                equity_curve: Vec::new(),
            })
            .collect();
        Ok(Backtest {
            market,
            runs,
            state: RunState::Initialized,
        })
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Runs every agent to the end of the data. A backtest runs once.
    pub fn run(&mut self) -> Result<&[AgentRun], AgentBenchError> {
        if self.state != RunState::Initialized {
            return Err(AgentBenchError::RunState {
                reason: format!("backtest already {:?}", self.state),
            });
        }
        self.state = RunState::Running;
        info!(agents = self.runs.len(), "backtest started");

        let market = self.market;
        self.runs = std::mem::take(&mut self.runs)
            .into_par_iter()
            .map(|run| simulate(run.agent, market))
            .collect();

        self.state = RunState::Complete;
        for run in &self.runs {
            let m = run.metrics();
            info!(
                agent = %run.agent.name,
                days = run.equity_curve.len(),
                trades = m.trade_count,
                rejected = run.agent.rejected_orders,
                final_value = %m.final_value,
                return_pct = m.total_return_pct,
                "agent finished"
            );
        }
        Ok(&self.runs)
    }

    pub fn results(&self) -> &[AgentRun] {
        &self.runs
    }

    pub fn into_results(self) -> Vec<AgentRun> {
        self.runs
    }
}

/// Simulates one agent over its timeline.
pub fn simulate(mut agent: Agent, market: &MarketData) -> AgentRun {
    let timeline: Vec<NaiveDate> = market.timeline(|symbol| agent.config.trades(symbol));
    if timeline.is_empty() {
        warn!(agent = %agent.name, "no bars in the agent's universe");
    }

    let mut equity_curve = Vec::with_capacity(timeline.len());
    for date in timeline {
        process_date(&mut agent, market, date);
        equity_curve.push(agent.valuation(date));
    }

    AgentRun {
        agent,
        equity_curve,
    }
}

/// Evaluates every tradable symbol with a bar on `date`, in symbol order.
/// Returns the number of orders executed.
pub fn process_date(agent: &mut Agent, market: &MarketData, date: NaiveDate) -> usize {
    let sizing_cash = agent.cash;
    let mut executed = 0;

    for data in market.symbols() {
        if !agent.config.trades(&data.symbol) {
            continue;
        }
        let Some((prev, bar)) = data.bar_with_prev(date) else {
            continue;
        };
        match step(agent, prev, bar, sizing_cash) {
            Decision::Bought(_) | Decision::Sold { .. } => executed += 1,
            Decision::Hold | Decision::Rejected(_) => {}
        }
    }
    executed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::{Bar, Indicators};
    use crate::domain::strategy::StrategyConfig;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn trend_bar(symbol: &str, day: u32, close: Decimal, fast: f64, slow: f64) -> Bar {
        let mut bar = Bar::new(symbol, d(day), close, close, close, close);
        bar.indicators = Indicators {
            sma_fast: Some(fast),
            sma_slow: Some(slow),
            ..Indicators::default()
        };
        bar
    }

    fn basic_agent(name: &str) -> Agent {
        Agent::new(name, StrategyConfig::basic(), dec!(10000)).unwrap()
    }

    #[test]
    fn run_once_then_complete() {
        let market = MarketData::new();
        let mut backtest = Backtest::new(&market, vec![basic_agent("a")]).unwrap();
        assert_eq!(backtest.state(), RunState::Initialized);

        backtest.run().unwrap();
        assert_eq!(backtest.state(), RunState::Complete);
        assert!(matches!(backtest.run(), Err(AgentBenchError::RunState { .. })));
    }

    #[test]
    fn duplicate_agent_names_rejected() {
        let market = MarketData::new();
        let result = Backtest::new(&market, vec![basic_agent("a"), basic_agent("a")]);
        assert!(matches!(result, Err(AgentBenchError::StrategyInvalid { .. })));
    }

    #[test]
    fn empty_market_gives_empty_results() {
        let market = MarketData::new();
        let mut backtest = Backtest::new(&market, vec![basic_agent("a")]).unwrap();
        let runs = backtest.run().unwrap();

        assert!(runs[0].equity_curve.is_empty());
        assert!(runs[0].agent.trades.is_empty());
        assert_eq!(runs[0].metrics().total_return_pct, 0.0);
    }

    #[test]
    fn buys_then_values_daily() {
        let market = MarketData::from_bars(vec![(
            "AAPL".to_string(),
            vec![
                trend_bar("AAPL", 3, dec!(100), 101.0, 100.0),
                trend_bar("AAPL", 4, dec!(110), 101.0, 100.0),
            ],
        )]);
        let run = simulate(basic_agent("a"), &market);

        assert_eq!(run.agent.trades.len(), 1);
        assert_eq!(run.agent.shares("AAPL"), 10);
        assert_eq!(
            run.equity_curve,
            vec![
                ValuationPoint { date: d(3), value: dec!(10000) },
                ValuationPoint { date: d(4), value: dec!(10100) },
            ]
        );
    }

    #[test]
    fn gap_day_values_at_last_known_close() {
        let market = MarketData::from_bars(vec![
            (
                "AAPL".to_string(),
                vec![
                    trend_bar("AAPL", 3, dec!(100), 101.0, 100.0),
                    trend_bar("AAPL", 5, dec!(120), 101.0, 100.0),
                ],
            ),
            (
                "MSFT".to_string(),
                vec![trend_bar("MSFT", 4, dec!(2000), 90.0, 100.0)],
            ),
        ]);
        let run = simulate(basic_agent("a"), &market);

        // day 4 has no AAPL bar: the 10 shares stay marked at 100
        let values: Vec<Decimal> = run.equity_curve.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![dec!(10000), dec!(10000), dec!(10200)]);
    }

    #[test]
    fn universe_limits_symbols_and_timeline() {
        let market = MarketData::from_bars(vec![
            ("AAPL".to_string(), vec![trend_bar("AAPL", 3, dec!(100), 101.0, 100.0)]),
            ("IBM".to_string(), vec![trend_bar("IBM", 4, dec!(100), 101.0, 100.0)]),
        ]);
        let mut config = StrategyConfig::basic();
        config.universe = Some(["AAPL".to_string()].into_iter().collect());
        let agent = Agent::new("aapl_only", config, dec!(10000)).unwrap();

        let run = simulate(agent, &market);
        assert_eq!(run.equity_curve.len(), 1);
        assert!(!run.agent.holds("IBM"));
        assert!(run.agent.holds("AAPL"));
    }

    #[test]
    fn agent_with_no_bars_in_universe_has_empty_curve() {
        let market = MarketData::from_bars(vec![(
            "IBM".to_string(),
            vec![trend_bar("IBM", 3, dec!(100), 101.0, 100.0)],
        )]);
        let agent = Agent::new("mag7", StrategyConfig::mag7(), dec!(10000)).unwrap();
        let run = simulate(agent, &market);

        assert!(run.equity_curve.is_empty());
        assert!(run.agent.trades.is_empty());
    }

    #[test]
    fn fraction_of_cash_sizes_from_start_of_day_cash() {
        let bars = |symbol: &str| {
            let mut bar = Bar::new(symbol, d(3), dec!(100), dec!(100), dec!(100), dec!(100));
            bar.indicators = Indicators {
                sma_fast: Some(101.0),
                sma_slow: Some(100.0),
                rsi: Some(60.0),
                ..Indicators::default()
            };
            vec![bar]
        };
        let market = MarketData::from_bars(vec![
            ("AAA".to_string(), bars("AAA")),
            ("BBB".to_string(), bars("BBB")),
        ]);
        let agent = Agent::new("agg", StrategyConfig::aggressive(), dec!(10000)).unwrap();
        let run = simulate(agent, &market);

        // both symbols get 30% of the opening 10000
        assert_eq!(run.agent.shares("AAA"), 30);
        assert_eq!(run.agent.shares("BBB"), 30);
        assert_eq!(run.agent.cash, dec!(4000));
    }
}
