//! Analytics snapshot types. Derived from the ledger on demand, never stored.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::analytics::TimeBucket;

/// Count, shares and dollar value for a slice of transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionVolume {
    pub count: usize,
    pub quantity: Decimal,
    pub dollar_volume: Decimal,
}

/// Volume overall and split by action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeBreakdown {
    pub overall: ActionVolume,
    pub buy: ActionVolume,
    pub sell: ActionVolume,
}

/// Volume traded in a single ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerVolume {
    pub ticker: String,
    pub count: usize,
    pub quantity: Decimal,
    pub dollar_volume: Decimal,
}

/// Net shares held in a ticker (BUY positive, SELL negative).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetPosition {
    pub ticker: String,
    pub net_quantity: Decimal,
}

impl NetPosition {
    /// Zero net quantity means the position is fully closed.
    pub fn is_flat(&self) -> bool {
        self.net_quantity.is_zero()
    }
}

/// Descriptive price statistics for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceStats {
    pub ticker: String,
    pub mean: f64,
    /// Sample standard deviation; zero with fewer than two prices
    pub std_dev: f64,
    pub min: Decimal,
    pub max: Decimal,
}

/// Transactions placed by one trader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraderActivity {
    pub trader_id: String,
    pub transactions: usize,
}

/// When trading happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeAnalysis {
    pub first: Option<NaiveDateTime>,
    pub last: Option<NaiveDateTime>,
    /// Seconds between first and last transaction
    pub span_seconds: i64,
    pub bucket: TimeBucket,
    /// Transaction count per bucket label, chronological
    pub distribution: BTreeMap<String, usize>,
    /// Transaction count per hour of day (0-23)
    pub hourly: BTreeMap<u32, usize>,
    /// Day with the highest dollar volume
    pub peak_day: Option<String>,
    pub peak_day_volume: Decimal,
    /// Hour of day with the most transactions
    pub peak_hour: Option<u32>,
    pub trading_days: usize,
}

/// Everything the insight request and the dashboard consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub total_transactions: usize,
    pub total_buys: usize,
    pub total_sells: usize,
    pub total_quantity: Decimal,
    pub total_dollar_volume: Decimal,
    pub volume: VolumeBreakdown,
    pub unique_tickers: Vec<String>,
    pub active_trader_count: usize,
    pub volume_by_ticker: Vec<TickerVolume>,
    pub net_position_by_ticker: Vec<NetPosition>,
    pub price_stats: Vec<PriceStats>,
    pub most_active_traders: Vec<TraderActivity>,
    pub time_analysis: TimeAnalysis,
}

impl std::fmt::Display for AnalyticsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n{:=^60}", " ANALYTICS ")?;
        writeln!(f)?;
        writeln!(f, "--- Volume ---")?;
        writeln!(f, "Transactions:  {}", self.total_transactions)?;
        writeln!(f, "Buys:          {} ({} shares)", self.total_buys, self.volume.buy.quantity)?;
        writeln!(f, "Sells:         {} ({} shares)", self.total_sells, self.volume.sell.quantity)?;
        writeln!(f, "Shares:        {}", self.total_quantity)?;
        writeln!(f, "Dollar Volume: ${:.2}", self.total_dollar_volume)?;
        writeln!(f, "Tickers:       {}", self.unique_tickers.len())?;
        writeln!(f, "Traders:       {}", self.active_trader_count)?;
        writeln!(f)?;

        writeln!(f, "--- Volume by Ticker ---")?;
        for v in &self.volume_by_ticker {
            writeln!(f, "  {:<8} {:>5} trades  ${:>14.2}", v.ticker, v.count, v.dollar_volume)?;
        }
        writeln!(f)?;

        writeln!(f, "--- Net Position by Ticker ---")?;
        for p in &self.net_position_by_ticker {
            let marker = if p.is_flat() { "  (closed)" } else { "" };
            writeln!(f, "  {:<8} {:>12}{}", p.ticker, p.net_quantity, marker)?;
        }
        writeln!(f)?;

        writeln!(f, "--- Prices ---")?;
        for s in &self.price_stats {
            writeln!(
                f,
                "  {:<8} mean {:>10.2}  sd {:>8.2}  range {} - {}",
                s.ticker, s.mean, s.std_dev, s.min, s.max
            )?;
        }
        writeln!(f)?;

        writeln!(f, "--- Most Active Traders ---")?;
        for t in &self.most_active_traders {
            writeln!(f, "  {:<16} {:>5}", t.trader_id, t.transactions)?;
        }
        writeln!(f)?;

        let time = &self.time_analysis;
        writeln!(f, "--- Time ---")?;
        match (time.first, time.last) {
            (Some(first), Some(last)) => {
                writeln!(f, "Period:        {} to {}", first.format("%Y-%m-%d %H:%M"), last.format("%Y-%m-%d %H:%M"))?;
                writeln!(f, "Span:          {:.1} days", time.span_seconds as f64 / 86_400.0)?;
            }
            _ => writeln!(f, "Period:        n/a")?,
        }
        writeln!(f, "Trading Days:  {}", time.trading_days)?;
        if let Some(day) = &time.peak_day {
            writeln!(f, "Peak Day:      {} (${:.2})", day, time.peak_day_volume)?;
        }
        if let Some(hour) = time.peak_hour {
            writeln!(f, "Peak Hour:     {}:00", hour)?;
        }
        writeln!(f, "Per {}:", time.bucket)?;
        for (label, count) in &time.distribution {
            writeln!(f, "  {:<16} {:>5}", label, count)?;
        }
        write!(f, "{:=^60}", "")
    }
}
