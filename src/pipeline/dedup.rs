//! Exact-duplicate removal over validated transactions.

use std::collections::HashSet;

use crate::models::Transaction;

/// Drop transactions field-wise equal to an earlier one, keeping the first
/// occurrence. Returns the survivors in input order and the number removed.
///
/// Comparison is on normalized values, so ` aapl ` and `AAPL` rows with
/// otherwise equal fields collapse into one.
pub fn dedup(transactions: Vec<Transaction>) -> (Vec<Transaction>, usize) {
    let mut seen: HashSet<Transaction> = HashSet::with_capacity(transactions.len());
    let mut kept = Vec::with_capacity(transactions.len());
    let mut removed = 0;

    for tx in transactions {
        if seen.contains(&tx) {
            removed += 1;
            continue;
        }
        seen.insert(tx.clone());
        kept.push(tx);
    }

    (kept, removed)
}
