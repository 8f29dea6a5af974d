//! Chronological ordering of the final transaction set.

use crate::models::Transaction;

/// Stable sort by timestamp ascending; equal timestamps keep their
/// relative order.
pub fn sort_chronologically(transactions: &mut [Transaction]) {
    transactions.sort_by_key(|t| t.timestamp);
}

/// True if the slice is non-decreasing by timestamp.
pub fn is_chronological(transactions: &[Transaction]) -> bool {
    transactions.windows(2).all(|w| w[0].timestamp <= w[1].timestamp)
}
