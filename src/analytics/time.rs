//! Time analysis: span, bucketed counts, hour-of-day profile, peaks.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{NaiveDateTime, Timelike};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{TimeAnalysis, Transaction};

/// Granularity for the transaction-count distribution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeBucket {
    Hour,
    Day,
    Week,
    #[default]
    Month,
}

impl TimeBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeBucket::Hour => "hour",
            TimeBucket::Day => "day",
            TimeBucket::Week => "week",
            TimeBucket::Month => "month",
        }
    }

    /// Label for the bucket containing `ts`. Labels sort chronologically.
    pub fn label(&self, ts: NaiveDateTime) -> String {
        let fmt = match self {
            TimeBucket::Hour => "%Y-%m-%d %H:00",
            TimeBucket::Day => "%Y-%m-%d",
            TimeBucket::Week => "%G-W%V",
            TimeBucket::Month => "%Y-%m",
        };
        ts.format(fmt).to_string()
    }
}

impl FromStr for TimeBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hour" | "hourly" => Ok(TimeBucket::Hour),
            "day" | "daily" => Ok(TimeBucket::Day),
            "week" | "weekly" => Ok(TimeBucket::Week),
            "month" | "monthly" => Ok(TimeBucket::Month),
            other => Err(format!("unknown time bucket '{other}' (hour, day, week, month)")),
        }
    }
}

impl std::fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive time window; an open end is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl TimeWindow {
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.start.map_or(true, |s| ts >= s) && self.end.map_or(true, |e| ts <= e)
    }
}

/// First/last timestamp and the span between them.
pub fn time_range(transactions: &[Transaction]) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let first = transactions.iter().map(|t| t.timestamp).min()?;
    let last = transactions.iter().map(|t| t.timestamp).max()?;
    Some((first, last))
}

/// Transaction counts per bucket label.
pub fn distribution(transactions: &[Transaction], bucket: TimeBucket) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for tx in transactions {
        *counts.entry(bucket.label(tx.timestamp)).or_insert(0) += 1;
    }
    counts
}

/// Single-pass time analysis. Peak ties go to the earliest day and the
/// lowest hour.
pub fn time_analysis(transactions: &[Transaction], bucket: TimeBucket) -> TimeAnalysis {
    let mut hourly: BTreeMap<u32, usize> = BTreeMap::new();
    let mut daily_volume: BTreeMap<String, Decimal> = BTreeMap::new();

    for tx in transactions {
        *hourly.entry(tx.timestamp.hour()).or_insert(0) += 1;
        let day = daily_volume
            .entry(TimeBucket::Day.label(tx.timestamp))
            .or_insert(Decimal::ZERO);
        *day = day.saturating_add(tx.notional());
    }

    let mut peak_day: Option<(&String, Decimal)> = None;
    for (day, volume) in &daily_volume {
        if peak_day.map_or(true, |(_, best)| *volume > best) {
            peak_day = Some((day, *volume));
        }
    }

    let mut peak_hour: Option<(u32, usize)> = None;
    for (&hour, &count) in &hourly {
        if peak_hour.map_or(true, |(_, best)| count > best) {
            peak_hour = Some((hour, count));
        }
    }

    let range = time_range(transactions);
    let span_seconds = range.map_or(0, |(first, last)| (last - first).num_seconds());

    TimeAnalysis {
        first: range.map(|(first, _)| first),
        last: range.map(|(_, last)| last),
        span_seconds,
        bucket,
        distribution: distribution(transactions, bucket),
        peak_day: peak_day.map(|(day, _)| day.clone()),
        peak_day_volume: peak_day.map_or(Decimal::ZERO, |(_, v)| v),
        peak_hour: peak_hour.map(|(hour, _)| hour),
        trading_days: daily_volume.len(),
        hourly,
    }
}
