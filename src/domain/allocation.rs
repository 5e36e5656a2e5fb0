//! Position sizing.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use super::agent::Agent;
use super::scoring::Signal;
use super::strategy::AllocationPolicy;

/// Shares to buy for `symbol` at `price`. Zero unless the signal is BUY, the
/// symbol is not already held and the whole floor quantity is affordable.
///
/// `sizing_cash` is the cash that fraction-of-cash sizing works from; the
/// driver passes the agent's cash at the start of the date so that sizing
/// does not depend on which symbol is evaluated first.
pub fn size(
    signal: Signal,
    agent: &Agent,
    symbol: &str,
    price: Decimal,
    sizing_cash: Decimal,
) -> u64 {
    if signal != Signal::Buy || agent.holds(symbol) || price <= Decimal::ZERO {
        return 0;
    }

    let budget = match &agent.config.allocation {
        AllocationPolicy::FixedDollar { amount } => *amount,
        AllocationPolicy::FractionOfInitial { fraction } => agent.initial_capital * fraction,
        AllocationPolicy::FractionOfCash {
            fraction,
            min_trade,
        } => {
            let budget = sizing_cash * fraction;
            if budget < *min_trade {
                return 0;
            }
            budget
        }
    };

    let shares = floor_shares(budget, price);
    let affordable = price
        .checked_mul(Decimal::from(shares))
        .is_some_and(|cost| cost <= agent.cash);
    if affordable { shares } else { 0 }
}

fn floor_shares(budget: Decimal, price: Decimal) -> u64 {
    if budget <= Decimal::ZERO {
        return 0;
    }
    budget
        .checked_div(price)
        .and_then(|q| q.floor().to_u64())
        .unwrap_or(0)
}
