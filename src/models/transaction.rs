//! Transaction model: a validated BUY/SELL trade record.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
        }
    }

    /// Parse an already upper-cased action. Anything other than BUY/SELL
    /// (HOLD included) is not a tradable action.
    pub fn from_normalized(s: &str) -> Option<Self> {
        match s {
            "BUY" => Some(Action::Buy),
            "SELL" => Some(Action::Sell),
            _ => None,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A trade that survived cleaning.
///
/// Invariants once past the cleaner: `quantity > 0`, `price > 0`, and
/// `ticker` is trimmed and upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transaction {
    /// When the trade happened (naive, as written in the source)
    pub timestamp: NaiveDateTime,

    /// Instrument symbol
    pub ticker: String,

    /// Trade direction
    pub action: Action,

    /// Number of shares traded
    pub quantity: Decimal,

    /// Price per share
    pub price: Decimal,

    /// Who placed the trade
    pub trader_id: String,
}

impl Transaction {
    /// Dollar value of the trade. Saturates at `Decimal::MAX`.
    pub fn notional(&self) -> Decimal {
        self.quantity.saturating_mul(self.price)
    }

    /// Quantity signed by direction: BUY adds, SELL subtracts.
    pub fn signed_quantity(&self) -> Decimal {
        match self.action {
            Action::Buy => self.quantity,
            Action::Sell => -self.quantity,
        }
    }

    pub fn is_buy(&self) -> bool {
        self.action == Action::Buy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn make(action: Action, quantity: Decimal, price: Decimal) -> Transaction {
        Transaction {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .and_then(|d| d.and_hms_opt(9, 30, 0))
                .unwrap(),
            ticker: "AAPL".to_string(),
            action,
            quantity,
            price,
            trader_id: "t1".to_string(),
        }
    }

    #[test]
    fn test_signed_quantity() {
        assert_eq!(make(Action::Buy, dec!(10), dec!(5)).signed_quantity(), dec!(10));
        assert_eq!(make(Action::Sell, dec!(4), dec!(5)).signed_quantity(), dec!(-4));
    }

    #[test]
    fn test_notional() {
        assert_eq!(make(Action::Buy, dec!(3), dec!(101.25)).notional(), dec!(303.75));
    }

    #[test]
    fn test_action_parsing_is_exact() {
        assert_eq!(Action::from_normalized("BUY"), Some(Action::Buy));
        assert_eq!(Action::from_normalized("SELL"), Some(Action::Sell));
        assert_eq!(Action::from_normalized("HOLD"), None);
        assert_eq!(Action::from_normalized("buy"), None);
    }

    #[test]
    fn test_equal_values_hash_equal() {
        use std::collections::HashSet;

        let a = make(Action::Buy, dec!(5), dec!(100));
        let b = make(Action::Buy, dec!(5.0), dec!(100.00));
        let mut seen = HashSet::new();
        seen.insert(a);
        assert!(seen.contains(&b));
    }
}
