//! One agent, one symbol, one bar: risk check, scoring, sizing and execution
//! in that order.

use rust_decimal::Decimal;
use tracing::debug;

use super::agent::Agent;
use super::allocation::size;
use super::bar::Bar;
use super::execution::{OrderRejection, buy, liquidate};
use super::position::TradeRecord;
use super::risk::update_and_check;
use super::scoring::{Signal, is_trend_reversal, score, signal};

/// Why a sell fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    TrailingStop,
    TrendReversal,
    Score,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Bought(TradeRecord),
    Sold {
        trade: TradeRecord,
        reason: ExitReason,
    },
    Hold,
    Rejected(OrderRejection),
}

/// Evaluates `bar` for `agent` and applies the resulting order.
///
/// `prev` is the symbol's previous bar (for the trend-reversal edge) and
/// `sizing_cash` the agent's cash at the start of the date.
pub fn step(agent: &mut Agent, prev: Option<&Bar>, bar: &Bar, sizing_cash: Decimal) -> Decision {
    let symbol = bar.symbol.as_str();

    let stopped = match agent.positions.get_mut(symbol) {
        Some(position) => update_and_check(position, bar, &agent.config.trailing_stop),
        None => false,
    };
    if stopped {
        return exit(agent, bar, ExitReason::TrailingStop);
    }

    if agent.config.trend_reversal_exit
        && agent.holds(symbol)
        && prev.is_some_and(|prev| is_trend_reversal(prev, bar))
    {
        return exit(agent, bar, ExitReason::TrendReversal);
    }

    let Some(score) = score(bar, &agent.config) else {
        return Decision::Hold;
    };
    match signal(score, &agent.config) {
        Signal::Sell if agent.holds(symbol) => exit(agent, bar, ExitReason::Score),
        Signal::Buy => {
            let shares = size(Signal::Buy, agent, symbol, bar.close, sizing_cash);
            if shares == 0 {
                return Decision::Hold;
            }
            match buy(agent, symbol, bar.close, shares, bar.date) {
                Ok(trade) => {
                    debug!(
                        agent = %agent.name,
                        symbol,
                        date = %bar.date,
                        score,
                        shares,
                        price = %bar.close,
                        "buy"
                    );
                    Decision::Bought(trade)
                }
                Err(rejection) => reject(agent, rejection),
            }
        }
        _ => Decision::Hold,
    }
}

fn exit(agent: &mut Agent, bar: &Bar, reason: ExitReason) -> Decision {
    match liquidate(agent, &bar.symbol, bar.close, bar.date) {
        Ok(trade) => {
            debug!(
                agent = %agent.name,
                symbol = %bar.symbol,
                date = %bar.date,
                shares = trade.shares,
                price = %bar.close,
                ?reason,
                "sell"
            );
            Decision::Sold { trade, reason }
        }
        Err(rejection) => reject(agent, rejection),
    }
}

fn reject(agent: &mut Agent, rejection: OrderRejection) -> Decision {
    agent.rejected_orders += 1;
    debug!(agent = %agent.name, %rejection, "order rejected");
    Decision::Rejected(rejection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::Indicators;
    use crate::domain::strategy::StrategyConfig;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn bar(day: u32, close: Decimal, indicators: Indicators) -> Bar {
        let mut bar = Bar::new(
            "AAPL",
            NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            close,
            close,
            close,
            close,
        );
        bar.indicators = indicators;
        bar
    }

    fn uptrend(rsi: f64, atr: f64) -> Indicators {
        Indicators {
            sma_fast: Some(105.0),
            sma_slow: Some(100.0),
            rsi: Some(rsi),
            atr: Some(atr),
            ..Indicators::default()
        }
    }

    fn downtrend() -> Indicators {
        Indicators {
            sma_fast: Some(95.0),
            sma_slow: Some(100.0),
            rsi: Some(50.0),
            atr: Some(1.0),
            ..Indicators::default()
        }
    }

    fn pro_agent() -> Agent {
        Agent::new("pro", StrategyConfig::pro(), dec!(10000)).unwrap()
    }

    #[test]
    fn buys_on_confluence() {
        let mut agent = pro_agent();
        let sizing_cash = agent.cash;
        let decision = step(&mut agent, None, &bar(1, dec!(100), uptrend(25.0, 5.0)), sizing_cash);

        match decision {
            Decision::Bought(trade) => assert_eq!(trade.shares, 20),
            other => panic!("expected buy, got {:?}", other),
        }
        assert_eq!(agent.cash, dec!(8000));
    }

    #[test]
    fn trailing_stop_overrides_buy_score() {
        let mut agent = pro_agent();
        let sizing_cash = agent.cash;
        step(&mut agent, None, &bar(1, dec!(100), uptrend(25.0, 5.0)), sizing_cash);
        let sizing_cash = agent.cash;
        step(&mut agent, None, &bar(2, dec!(110), uptrend(50.0, 5.0)), sizing_cash);

        // score would be 4 (BUY), but 99 < 110 - 2 × 5
        let sizing_cash = agent.cash;
        let decision = step(&mut agent, None, &bar(3, dec!(99), uptrend(25.0, 5.0)), sizing_cash);
        match decision {
            Decision::Sold { trade, reason } => {
                assert_eq!(reason, ExitReason::TrailingStop);
                assert_eq!(trade.shares, 20);
            }
            other => panic!("expected stop-out, got {:?}", other),
        }
        assert!(!agent.holds("AAPL"));
    }

    #[test]
    fn score_sell_liquidates_holding() {
        let mut agent = pro_agent();
        let sizing_cash = agent.cash;
        step(&mut agent, None, &bar(1, dec!(100), uptrend(25.0, 5.0)), sizing_cash);
        let sizing_cash = agent.cash;
        let decision = step(&mut agent, None, &bar(2, dec!(101), downtrend()), sizing_cash);
        assert!(matches!(
            decision,
            Decision::Sold {
                reason: ExitReason::Score,
                ..
            }
        ));
        assert_eq!(agent.cash, dec!(10020));
    }

    #[test]
    fn sell_signal_without_holding_is_hold() {
        let mut agent = pro_agent();
        let sizing_cash = agent.cash;
        let decision = step(&mut agent, None, &bar(1, dec!(100), downtrend()), sizing_cash);
        assert_eq!(decision, Decision::Hold);
        assert!(agent.trades.is_empty());
    }

    #[test]
    fn trend_reversal_forces_exit() {
        let mut agent = Agent::new("c", StrategyConfig::confluence(), dec!(1000)).unwrap();
        agent.config.buy_threshold = 1;
        let day1 = bar(
            1,
            dec!(100),
            Indicators {
                sma_fast: Some(101.0),
                sma_slow: Some(100.0),
                rsi: Some(50.0),
                macd: Some(1.0),
                macd_signal: Some(0.0),
                bb_low: Some(90.0),
                ..Indicators::default()
            },
        );
        let sizing_cash = agent.cash;
        step(&mut agent, None, &day1, sizing_cash);
        assert!(agent.holds("AAPL"));

        // bearish cross with a score that would otherwise hold
        let day2 = bar(
            2,
            dec!(100),
            Indicators {
                sma_fast: Some(99.0),
                sma_slow: Some(100.0),
                rsi: Some(50.0),
                macd: Some(1.0),
                macd_signal: Some(0.0),
                bb_low: Some(90.0),
                ..Indicators::default()
            },
        );
        let sizing_cash = agent.cash;
        let decision = step(&mut agent, Some(&day1), &day2, sizing_cash);
        assert!(matches!(
            decision,
            Decision::Sold {
                reason: ExitReason::TrendReversal,
                ..
            }
        ));
    }

    #[test]
    fn missing_indicators_hold_but_still_mark() {
        let mut agent = pro_agent();
        let sizing_cash = agent.cash;
        step(&mut agent, None, &bar(1, dec!(100), uptrend(25.0, 5.0)), sizing_cash);

        let bare = Indicators {
            atr: Some(50.0),
            ..Indicators::default()
        };
        let sizing_cash = agent.cash;
        let decision = step(&mut agent, None, &bar(2, dec!(120), bare), sizing_cash);
        assert_eq!(decision, Decision::Hold);
        assert_eq!(agent.position("AAPL").unwrap().highest_price, dec!(120));
    }

    #[test]
    fn already_held_buy_signal_holds() {
        let mut agent = pro_agent();
        let sizing_cash = agent.cash;
        step(&mut agent, None, &bar(1, dec!(100), uptrend(25.0, 5.0)), sizing_cash);
        let sizing_cash = agent.cash;
        let decision = step(&mut agent, None, &bar(2, dec!(101), uptrend(25.0, 5.0)), sizing_cash);
        assert_eq!(decision, Decision::Hold);
        assert_eq!(agent.trades.len(), 1);
    }
}
