//! Open positions and the immutable trade log entries.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A long holding in one symbol. Only exists while `shares > 0`; the ledger
/// removes it from the agent's map when the last share is sold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub shares: u64,
    pub entry_price: Decimal,
    pub entry_date: NaiveDate,
    /// High-water mark since entry, never decreases while held.
    pub highest_price: Decimal,
    /// Most recent close seen for the symbol, used for valuation on dates
    /// without a bar.
    pub last_price: Decimal,
}

impl Position {
    pub fn open(symbol: &str, shares: u64, price: Decimal, date: NaiveDate) -> Self {
        Position {
            symbol: symbol.to_string(),
            shares,
            entry_price: price,
            entry_date: date,
            highest_price: price,
            last_price: price,
        }
    }

    /// Records a new close: raises the high-water mark and updates the mark price.
    pub fn mark(&mut self, close: Decimal) {
        if close > self.highest_price {
            self.highest_price = close;
        }
        self.last_price = close;
    }

    pub fn market_value(&self, price: Decimal) -> Decimal {
        price * Decimal::from(self.shares)
    }

    /// Value at the last marked price.
    pub fn marked_value(&self) -> Decimal {
        self.market_value(self.last_price)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("BUY"),
            Side::Sell => f.write_str("SELL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub date: NaiveDate,
    pub symbol: String,
    pub side: Side,
    pub price: Decimal,
    pub shares: u64,
    /// price × shares
    pub value: Decimal,
}
