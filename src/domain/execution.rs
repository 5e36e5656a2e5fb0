//! Trade ledger.
//!
//! `buy` and `sell` are the only operations that move an agent's cash and
//! holdings. Each either applies fully and appends a `TradeRecord`, or
//! returns an `OrderRejection` and leaves the agent untouched.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::agent::Agent;
use super::position::{Position, Side, TradeRecord};

/// A refused order. Not an error: the driver counts it and carries on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderRejection {
    #[error("insufficient cash for {symbol}: need {required}, have {available}")]
    InsufficientCash {
        symbol: String,
        required: Decimal,
        available: Decimal,
    },

    #[error("insufficient shares of {symbol}: want {requested}, hold {held}")]
    InsufficientShares {
        symbol: String,
        requested: u64,
        held: u64,
    },

    #[error("zero quantity order for {symbol}")]
    ZeroQuantity { symbol: String },

    #[error("non-positive price {price} for {symbol}")]
    NonPositivePrice { symbol: String, price: Decimal },
}

fn check_order(symbol: &str, price: Decimal, shares: u64) -> Result<(), OrderRejection> {
    if shares == 0 {
        return Err(OrderRejection::ZeroQuantity {
            symbol: symbol.to_string(),
        });
    }
    if price <= Decimal::ZERO {
        return Err(OrderRejection::NonPositivePrice {
            symbol: symbol.to_string(),
            price,
        });
    }
    Ok(())
}

/// Buys `shares` at `price`. Adding to an existing position averages the
/// entry price and keeps the higher high-water mark.
pub fn buy(
    agent: &mut Agent,
    symbol: &str,
    price: Decimal,
    shares: u64,
    date: NaiveDate,
) -> Result<TradeRecord, OrderRejection> {
    check_order(symbol, price, shares)?;

    let cost = price
        .checked_mul(Decimal::from(shares))
        .filter(|cost| *cost <= agent.cash)
        .ok_or_else(|| OrderRejection::InsufficientCash {
            symbol: symbol.to_string(),
            required: price.saturating_mul(Decimal::from(shares)),
            available: agent.cash,
        })?;

    agent.cash -= cost;
    match agent.positions.get_mut(symbol) {
        Some(position) => {
            let held = Decimal::from(position.shares);
            let total = position.shares + shares;
            position.entry_price =
                (position.entry_price * held + cost) / Decimal::from(total);
            position.shares = total;
            position.mark(price);
        }
        None => {
            agent
                .positions
                .insert(symbol.to_string(), Position::open(symbol, shares, price, date));
        }
    }

    let record = TradeRecord {
        date,
        symbol: symbol.to_string(),
        side: Side::Buy,
        price,
        shares,
        value: cost,
    };
    agent.trades.push(record.clone());
    Ok(record)
}

/// Sells `shares` at `price`. The position is dropped once no shares remain,
/// taking its trailing-stop state with it.
pub fn sell(
    agent: &mut Agent,
    symbol: &str,
    price: Decimal,
    shares: u64,
    date: NaiveDate,
) -> Result<TradeRecord, OrderRejection> {
    check_order(symbol, price, shares)?;

    let held = agent.shares(symbol);
    if held < shares {
        return Err(OrderRejection::InsufficientShares {
            symbol: symbol.to_string(),
            requested: shares,
            held,
        });
    }
    let proceeds = price
        .checked_mul(Decimal::from(shares))
        .ok_or_else(|| OrderRejection::NonPositivePrice {
            symbol: symbol.to_string(),
            price,
        })?;

    agent.cash += proceeds;
    if held == shares {
        agent.positions.remove(symbol);
    } else if let Some(position) = agent.positions.get_mut(symbol) {
        position.shares -= shares;
        position.mark(price);
    }

    let record = TradeRecord {
        date,
        symbol: symbol.to_string(),
        side: Side::Sell,
        price,
        shares,
        value: proceeds,
    };
    agent.trades.push(record.clone());
    Ok(record)
}

/// Sells the whole holding in `symbol`.
pub fn liquidate(
    agent: &mut Agent,
    symbol: &str,
    price: Decimal,
    date: NaiveDate,
) -> Result<TradeRecord, OrderRejection> {
    let held = agent.shares(symbol);
    sell(agent, symbol, price, held, date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::StrategyConfig;
    use rust_decimal_macros::dec;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, day).unwrap()
    }

    fn agent(cash: Decimal) -> Agent {
        Agent::new("ledger", StrategyConfig::basic(), cash).unwrap()
    }

    #[test]
    fn buy_deducts_cash_and_opens_position() {
        let mut a = agent(dec!(1000));
        let record = buy(&mut a, "AAPL", dec!(150.25), 4, date(1)).unwrap();

        assert_eq!(record.side, Side::Buy);
        assert_eq!(record.value, dec!(601.00));
        assert_eq!(a.cash, dec!(399.00));

        let pos = a.position("AAPL").unwrap();
        assert_eq!(pos.shares, 4);
        assert_eq!(pos.entry_price, dec!(150.25));
        assert_eq!(pos.highest_price, dec!(150.25));
        assert_eq!(a.trades.len(), 1);
    }

    #[test]
    fn buy_exact_cash_is_allowed() {
        let mut a = agent(dec!(300));
        assert!(buy(&mut a, "X", dec!(100), 3, date(1)).is_ok());
        assert_eq!(a.cash, Decimal::ZERO);
    }

    #[test]
    fn buy_rejected_without_cash_leaves_agent_unchanged() {
        let mut a = agent(dec!(100));
        let before = a.clone();

        let err = buy(&mut a, "AAPL", dec!(50), 3, date(1)).unwrap_err();
        assert!(matches!(err, OrderRejection::InsufficientCash { .. }));
        assert_eq!(a, before);
    }

    #[test]
    fn buy_rejects_zero_quantity_and_bad_price() {
        let mut a = agent(dec!(100));
        assert!(matches!(
            buy(&mut a, "X", dec!(10), 0, date(1)),
            Err(OrderRejection::ZeroQuantity { .. })
        ));
        assert!(matches!(
            buy(&mut a, "X", dec!(0), 1, date(1)),
            Err(OrderRejection::NonPositivePrice { .. })
        ));
        assert!(a.trades.is_empty());
    }

    #[test]
    fn buy_into_existing_position_averages_entry() {
        let mut a = agent(dec!(10000));
        buy(&mut a, "X", dec!(100), 10, date(1)).unwrap();
        buy(&mut a, "X", dec!(130), 10, date(2)).unwrap();

        let pos = a.position("X").unwrap();
        assert_eq!(pos.shares, 20);
        assert_eq!(pos.entry_price, dec!(115));
        assert_eq!(pos.highest_price, dec!(130));
        assert_eq!(pos.entry_date, date(1));
    }

    #[test]
    fn partial_sell_keeps_position() {
        let mut a = agent(dec!(1000));
        buy(&mut a, "X", dec!(10), 50, date(1)).unwrap();
        let record = sell(&mut a, "X", dec!(12), 20, date(2)).unwrap();

        assert_eq!(record.value, dec!(240));
        assert_eq!(a.cash, dec!(740));
        assert_eq!(a.shares("X"), 30);
    }

    #[test]
    fn full_sell_removes_position() {
        let mut a = agent(dec!(1000));
        buy(&mut a, "X", dec!(10), 50, date(1)).unwrap();
        liquidate(&mut a, "X", dec!(9), date(3)).unwrap();

        assert!(!a.holds("X"));
        assert_eq!(a.cash, dec!(950));
        assert_eq!(a.trades.len(), 2);
        assert_eq!(a.trades[1].side, Side::Sell);
    }

    #[test]
    fn oversell_rejected_without_mutation() {
        let mut a = agent(dec!(1000));
        buy(&mut a, "X", dec!(10), 5, date(1)).unwrap();
        let before = a.clone();

        let err = sell(&mut a, "X", dec!(10), 6, date(2)).unwrap_err();
        assert_eq!(
            err,
            OrderRejection::InsufficientShares {
                symbol: "X".into(),
                requested: 6,
                held: 5
            }
        );
        assert_eq!(a, before);
    }

    #[test]
    fn sell_unheld_symbol_rejected() {
        let mut a = agent(dec!(1000));
        assert!(matches!(
            sell(&mut a, "NOPE", dec!(10), 1, date(1)),
            Err(OrderRejection::InsufficientShares { held: 0, .. })
        ));
    }

    #[test]
    fn liquidate_without_position_is_zero_quantity() {
        let mut a = agent(dec!(1000));
        assert!(matches!(
            liquidate(&mut a, "NOPE", dec!(10), date(1)),
            Err(OrderRejection::ZeroQuantity { .. })
        ));
    }

    #[test]
    fn trade_value_is_conserved() {
        let mut a = agent(dec!(5000));
        let price = dec!(123.45);

        let before = a.cash + Decimal::from(a.shares("X")) * price;
        buy(&mut a, "X", price, 17, date(1)).unwrap();
        let after_buy = a.cash + Decimal::from(a.shares("X")) * price;
        assert_eq!(before, after_buy);

        sell(&mut a, "X", price, 9, date(2)).unwrap();
        let after_sell = a.cash + Decimal::from(a.shares("X")) * price;
        assert_eq!(before, after_sell);
    }
}
