//! Validator/cleaner: turns a raw row into a transaction or a reject reason.
//!
//! Rules run in a fixed order and the first failing rule decides the reason:
//! - missing timestamp, ticker, action, price or trader_id
//! - ticker is blank after trimming
//! - action is not BUY/SELL after upper-casing
//! - price not numeric or not positive
//! - quantity not numeric or not positive, or quantity x price overflows
//!   (absent quantity lands here)
//! - timestamp not parseable

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use tracing::debug;

use crate::models::{Action, CleaningReport, RawRow, RejectReason, Transaction};

/// Naive formats tried in order after RFC 3339.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Validate and normalize a single row.
pub fn validate(row: &RawRow) -> Result<Transaction, RejectReason> {
    let (Some(timestamp), Some(ticker), Some(action), Some(price), Some(trader_id)) = (
        present(&row.timestamp),
        present(&row.ticker),
        present(&row.action),
        present(&row.price),
        present(&row.trader_id),
    ) else {
        return Err(RejectReason::MissingField);
    };

    let ticker = normalize_ticker(ticker).ok_or(RejectReason::MissingField)?;
    let action = Action::from_normalized(&action.to_uppercase()).ok_or(RejectReason::InvalidAction)?;
    let price = parse_positive(price).ok_or(RejectReason::InvalidPrice)?;
    let quantity = present(&row.quantity)
        .and_then(parse_positive)
        .ok_or(RejectReason::InvalidQuantity)?;
    // Notional must be representable.
    quantity.checked_mul(price).ok_or(RejectReason::InvalidQuantity)?;
    let timestamp = parse_timestamp(timestamp).ok_or(RejectReason::InvalidTimestamp)?;

    Ok(Transaction {
        timestamp,
        ticker,
        action,
        quantity,
        price,
        trader_id: trader_id.to_string(),
    })
}

/// Validate every row, tallying rejections into a fresh report.
///
/// `raw_rows` and the rejection counts are filled in; `accepted` and
/// `duplicates_removed` are left for the later stages.
pub fn clean<I>(rows: I) -> (Vec<Transaction>, CleaningReport)
where
    I: IntoIterator<Item = RawRow>,
{
    let mut report = CleaningReport::default();
    let mut accepted = Vec::new();

    for row in rows {
        report.raw_rows += 1;
        match validate(&row) {
            Ok(tx) => accepted.push(tx),
            Err(reason) => {
                debug!(line = ?row.line, reason = %reason, "Row rejected");
                report.record_rejection(reason);
            }
        }
    }

    (accepted, report)
}

/// Trimmed field text, or `None` when absent or blank.
fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Trim and upper-case a ticker. `None` if nothing is left.
pub fn normalize_ticker(raw: &str) -> Option<String> {
    let ticker = raw.trim().to_uppercase();
    (!ticker.is_empty()).then_some(ticker)
}

/// Parse a strictly positive decimal amount. Plain and scientific notation
/// are accepted.
pub fn parse_positive(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    let value = Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()?;
    (value > Decimal::ZERO).then_some(value)
}

/// Parse a timestamp. Offsets are converted to UTC; a bare date means midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(ts: &str, ticker: &str, action: &str, qty: &str, price: &str, trader: &str) -> RawRow {
        RawRow::from_fields(ts, ticker, action, qty, price, trader)
    }

    #[test]
    fn test_empty_timestamp_is_missing_field() {
        let r = row("", "AMZN", "BUY", "5", "100", "t1");
        assert_eq!(validate(&r), Err(RejectReason::MissingField));
    }

    #[test]
    fn test_normalizes_ticker_and_action() {
        let r = row("2024-01-01T00:00:00", " amzn ", "buy", "5", "100", "t1");
        let tx = validate(&r).unwrap();
        assert_eq!(tx.ticker, "AMZN");
        assert_eq!(tx.action, Action::Buy);
        assert_eq!(tx.quantity, dec!(5));
        assert_eq!(tx.price, dec!(100));
        assert_eq!(tx.trader_id, "t1");
        assert_eq!(tx.timestamp, parse_timestamp("2024-01-01 00:00:00").unwrap());
    }

    #[test]
    fn test_hold_is_invalid_action() {
        let r = row("2024-01-01T00:00:00", "TSLA", "HOLD", "5", "100", "t1");
        assert_eq!(validate(&r), Err(RejectReason::InvalidAction));
    }

    #[test]
    fn test_zero_quantity_is_invalid_quantity() {
        let r = row("2024-01-01T00:00:00", "TSLA", "SELL", "0", "100", "t1");
        assert_eq!(validate(&r), Err(RejectReason::InvalidQuantity));
    }

    #[test]
    fn test_absent_quantity_is_invalid_quantity() {
        let mut r = row("2024-01-01T00:00:00", "TSLA", "SELL", "", "100", "t1");
        assert_eq!(validate(&r), Err(RejectReason::InvalidQuantity));
        r.quantity = None;
        assert_eq!(validate(&r), Err(RejectReason::InvalidQuantity));
    }

    #[test]
    fn test_blank_trader_is_missing_field() {
        let r = row("2024-01-01T00:00:00", "TSLA", "SELL", "1", "100", "   ");
        assert_eq!(validate(&r), Err(RejectReason::MissingField));
    }

    #[test]
    fn test_price_rules() {
        let base = |p: &str| row("2024-01-01 09:00:00", "MSFT", "BUY", "1", p, "t1");
        assert_eq!(validate(&base("-3")), Err(RejectReason::InvalidPrice));
        assert_eq!(validate(&base("0")), Err(RejectReason::InvalidPrice));
        assert_eq!(validate(&base("abc")), Err(RejectReason::InvalidPrice));
        assert_eq!(validate(&base("1.5e2")).unwrap().price, dec!(150));
    }

    #[test]
    fn test_rule_order_reports_first_failure() {
        // Bad action, price, quantity and timestamp: action wins.
        let r = row("yesterday", "IBM", "HOLD", "-1", "-1", "t1");
        assert_eq!(validate(&r), Err(RejectReason::InvalidAction));

        // Bad price and quantity: price wins.
        let r = row("yesterday", "IBM", "SELL", "-1", "-1", "t1");
        assert_eq!(validate(&r), Err(RejectReason::InvalidPrice));

        // Only the timestamp is unparseable.
        let r = row("yesterday", "IBM", "SELL", "1", "1", "t1");
        assert_eq!(validate(&r), Err(RejectReason::InvalidTimestamp));
    }

    #[test]
    fn test_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5)
            .and_then(|d| d.and_hms_opt(14, 30, 0))
            .unwrap();
        assert_eq!(parse_timestamp("2024-03-05 14:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05T14:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05T14:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05T16:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05 14:30"), Some(expected));
        assert!(parse_timestamp("2024-03-05").is_some());
        assert_eq!(parse_timestamp("2024-13-45 99:00:00"), None);
    }

    #[test]
    fn test_clean_counts_per_reason() {
        let rows = vec![
            row("2024-01-01 10:00:00", "AAPL", "BUY", "10", "150", "t1"),
            row("", "AAPL", "BUY", "10", "150", "t1"),
            row("2024-01-01 10:00:00", "AAPL", "HOLD", "10", "150", "t1"),
            row("2024-01-01 10:00:00", "AAPL", "SELL", "10", "0", "t1"),
            row("not a date", "AAPL", "SELL", "10", "150", "t1"),
        ];
        let (accepted, report) = clean(rows);

        assert_eq!(accepted.len(), 1);
        assert_eq!(report.raw_rows, 5);
        assert_eq!(report.rejected_for(RejectReason::MissingField), 1);
        assert_eq!(report.rejected_for(RejectReason::InvalidAction), 1);
        assert_eq!(report.rejected_for(RejectReason::InvalidPrice), 1);
        assert_eq!(report.rejected_for(RejectReason::InvalidTimestamp), 1);
        assert_eq!(report.rejected_for(RejectReason::InvalidQuantity), 0);
    }

    #[test]
    fn test_unrepresentable_notional_is_invalid_quantity() {
        let r = row("2024-01-01 10:00:00", "AAPL", "BUY", "10000000000", "100000000000000000000", "t1");
        assert_eq!(validate(&r), Err(RejectReason::InvalidQuantity));

        let r = row("2024-01-01 10:00:00", "AAPL", "BUY", "1", "100000000000000000000", "t1");
        assert_eq!(validate(&r).unwrap().notional(), dec!(100000000000000000000));
    }
}
