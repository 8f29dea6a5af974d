//! Ticker index over the canonical, chronologically sorted transaction list.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::models::Transaction;

/// Ticker -> positions in the master list, in master-list order.
///
/// Holds indices rather than copies; resolve them through the owning
/// [`Ledger`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickerIndex {
    positions: HashMap<String, Vec<usize>>,
}

impl TickerIndex {
    pub fn build(transactions: &[Transaction]) -> Self {
        let mut positions: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, tx) in transactions.iter().enumerate() {
            positions.entry(tx.ticker.clone()).or_default().push(i);
        }
        Self { positions }
    }

    /// Master-list positions for an exact (already normalized) ticker.
    pub fn positions(&self, ticker: &str) -> &[usize] {
        self.positions.get(ticker).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[usize])> {
        self.positions.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// Final, read-only transaction set plus its ticker index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    transactions: Vec<Transaction>,
    index: TickerIndex,
}

impl Ledger {
    /// Wrap an already deduplicated, chronologically sorted list.
    pub fn new(transactions: Vec<Transaction>) -> Self {
        let index = TickerIndex::build(&transactions);
        Self { transactions, index }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn index(&self) -> &TickerIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Transactions for `ticker` in chronological order. The lookup trims
    /// and upper-cases its argument; unknown tickers yield nothing.
    pub fn lookup(&self, ticker: &str) -> Vec<&Transaction> {
        let key = ticker.trim().to_uppercase();
        self.ticker_transactions(&key).collect()
    }

    /// Transactions for an exact ticker key.
    pub fn ticker_transactions<'a>(
        &'a self,
        ticker: &str,
    ) -> impl Iterator<Item = &'a Transaction> + 'a {
        let positions = self.index.positions(ticker);
        positions.iter().map(move |&i| &self.transactions[i])
    }

    /// Distinct tickers, sorted.
    pub fn tickers(&self) -> Vec<&str> {
        let mut tickers: Vec<&str> = self.index.iter().map(|(t, _)| t).collect();
        tickers.sort_unstable();
        tickers
    }
}

/// Transactions with `start <= timestamp <= end`.
pub fn in_time_range(
    transactions: &[Transaction],
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Vec<&Transaction> {
    transactions
        .iter()
        .filter(|t| start <= t.timestamp && t.timestamp <= end)
        .collect()
}
