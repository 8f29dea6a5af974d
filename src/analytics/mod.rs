//! Analytics engine: pure, single-pass aggregates over the cleaned ledger.

mod calculator;
mod time;

pub use calculator::{
    active_traders, most_active_traders, net_position, net_positions, price_stats, volume,
    volume_by_ticker,
};
pub use time::{distribution, time_analysis, time_range, TimeBucket, TimeWindow};

use crate::models::AnalyticsSummary;
use crate::pipeline::Ledger;

/// Knobs for [`summarize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyticsOptions {
    pub bucket: TimeBucket,
    pub top_traders: usize,
    /// Restricts the active-trader count only
    pub trader_window: Option<TimeWindow>,
}

impl Default for AnalyticsOptions {
    fn default() -> Self {
        Self {
            bucket: TimeBucket::Month,
            top_traders: 10,
            trader_window: None,
        }
    }
}

/// Assemble the full summary.
pub fn summarize(ledger: &Ledger, options: &AnalyticsOptions) -> AnalyticsSummary {
    let transactions = ledger.transactions();
    let volume = volume(transactions);

    AnalyticsSummary {
        total_transactions: volume.overall.count,
        total_buys: volume.buy.count,
        total_sells: volume.sell.count,
        total_quantity: volume.overall.quantity,
        total_dollar_volume: volume.overall.dollar_volume.round_dp(2),
        volume,
        unique_tickers: ledger.tickers().into_iter().map(str::to_string).collect(),
        active_trader_count: active_traders(transactions, options.trader_window.as_ref()).len(),
        volume_by_ticker: volume_by_ticker(ledger),
        net_position_by_ticker: net_positions(ledger),
        price_stats: price_stats(ledger),
        most_active_traders: most_active_traders(transactions, options.top_traders),
        time_analysis: time_analysis(transactions, options.bucket),
    }
}
