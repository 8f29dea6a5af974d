//! Unvalidated input row as read from the source table.

use super::transaction::Transaction;

/// Six optional text fields, exactly as they appeared in the source.
///
/// `line` is the 1-based source line, kept for diagnostics only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub line: Option<u64>,
    pub timestamp: Option<String>,
    pub ticker: Option<String>,
    pub action: Option<String>,
    pub quantity: Option<String>,
    pub price: Option<String>,
    pub trader_id: Option<String>,
}

impl RawRow {
    /// Build a row from plain string fields, mostly for tests and fixtures.
    pub fn from_fields(
        timestamp: &str,
        ticker: &str,
        action: &str,
        quantity: &str,
        price: &str,
        trader_id: &str,
    ) -> Self {
        Self {
            line: None,
            timestamp: Some(timestamp.to_string()),
            ticker: Some(ticker.to_string()),
            action: Some(action.to_string()),
            quantity: Some(quantity.to_string()),
            price: Some(price.to_string()),
            trader_id: Some(trader_id.to_string()),
        }
    }
}

impl From<&Transaction> for RawRow {
    fn from(tx: &Transaction) -> Self {
        Self {
            line: None,
            timestamp: Some(tx.timestamp.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            ticker: Some(tx.ticker.clone()),
            action: Some(tx.action.as_str().to_string()),
            quantity: Some(tx.quantity.to_string()),
            price: Some(tx.price.to_string()),
            trader_id: Some(tx.trader_id.clone()),
        }
    }
}
