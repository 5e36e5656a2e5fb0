//! Per-symbol bar storage with date lookup, and the date timeline built
//! across symbols.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::bar::Bar;
use super::feed::{FeedConfig, enrich};
use super::sentiment::SentimentSeries;

#[derive(Debug, Clone)]
pub struct SymbolData {
    pub symbol: String,
    pub bars: Vec<Bar>,
    pub date_index: HashMap<NaiveDate, usize>,
}

impl SymbolData {
    /// Sorts `bars` by date. When a date repeats, the later bar wins.
    pub fn new(symbol: &str, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|bar| bar.date);
        bars.dedup_by(|later, earlier| {
            if later.date == earlier.date {
                std::mem::swap(later, earlier);
                true
            } else {
                false
            }
        });
        let date_index = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.date, i))
            .collect();
        SymbolData {
            symbol: symbol.to_string(),
            bars,
            date_index,
        }
    }

    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    pub fn bar_on(&self, date: NaiveDate) -> Option<&Bar> {
        self.date_index.get(&date).map(|&i| &self.bars[i])
    }

    /// The bar on `date` together with the symbol's previous bar, if any.
    pub fn bar_with_prev(&self, date: NaiveDate) -> Option<(Option<&Bar>, &Bar)> {
        let i = *self.date_index.get(&date)?;
        let prev = i.checked_sub(1).map(|p| &self.bars[p]);
        Some((prev, &self.bars[i]))
    }

    pub fn latest(&self) -> Option<&Bar> {
        self.bars.last()
    }

    fn reindex(&mut self) {
        self.date_index = self
            .bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.date, i))
            .collect();
    }
}

/// Immutable market snapshot shared by every agent in a run.
#[derive(Debug, Clone, Default)]
pub struct MarketData {
    symbols: BTreeMap<String, SymbolData>,
}

impl MarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, data: SymbolData) {
        self.symbols.insert(data.symbol.clone(), data);
    }

    pub fn from_bars<I>(series: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<Bar>)>,
    {
        let mut market = MarketData::new();
        for (symbol, bars) in series {
            market.insert(SymbolData::new(&symbol, bars));
        }
        market
    }

    pub fn get(&self, symbol: &str) -> Option<&SymbolData> {
        self.symbols.get(symbol)
    }

    /// Symbols in lexicographic order.
    pub fn symbols(&self) -> impl Iterator<Item = &SymbolData> {
        self.symbols.values()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.values().all(|data| data.bars.is_empty())
    }

    /// Sorted union of the dates of every symbol accepted by `filter`.
    pub fn timeline<F>(&self, filter: F) -> Vec<NaiveDate>
    where
        F: Fn(&str) -> bool,
    {
        let dates: BTreeSet<NaiveDate> = self
            .symbols
            .values()
            .filter(|data| filter(&data.symbol))
            .flat_map(|data| data.bars.iter().map(|bar| bar.date))
            .collect();
        dates.into_iter().collect()
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.symbols
            .values()
            .filter_map(|data| data.latest().map(|bar| bar.date))
            .max()
    }

    /// Computes missing indicator fields on every symbol.
    pub fn enrich(&mut self, config: &FeedConfig) {
        for data in self.symbols.values_mut() {
            enrich(&mut data.bars, config);
        }
    }

    pub fn attach_sentiment(&mut self, symbol: &str, series: &SentimentSeries) {
        if let Some(data) = self.symbols.get_mut(symbol) {
            series.attach(&mut data.bars);
        }
    }

    /// Drops bars outside `[start, end]`. Run after enrichment so warm-up
    /// history still feeds the indicators.
    pub fn restrict(&mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) {
        for data in self.symbols.values_mut() {
            data.bars.retain(|bar| {
                start.is_none_or(|s| bar.date >= s) && end.is_none_or(|e| bar.date <= e)
            });
            data.reindex();
        }
    }
}
