//! Volume, position, trader and price aggregates over the ledger.

use std::collections::{BTreeSet, HashMap};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use statrs::statistics::Statistics;

use crate::models::{
    Action, ActionVolume, NetPosition, PriceStats, TickerVolume, TraderActivity, Transaction,
    VolumeBreakdown,
};
use crate::pipeline::Ledger;

use super::time::TimeWindow;

impl ActionVolume {
    fn add(&mut self, tx: &Transaction) {
        self.count += 1;
        self.quantity = self.quantity.saturating_add(tx.quantity);
        self.dollar_volume = self.dollar_volume.saturating_add(tx.notional());
    }
}

/// Count, shares and dollar volume overall and per action.
pub fn volume(transactions: &[Transaction]) -> VolumeBreakdown {
    let mut breakdown = VolumeBreakdown::default();
    for tx in transactions {
        breakdown.overall.add(tx);
        match tx.action {
            Action::Buy => breakdown.buy.add(tx),
            Action::Sell => breakdown.sell.add(tx),
        }
    }
    breakdown
}

/// Per-ticker volume, highest dollar volume first.
pub fn volume_by_ticker(ledger: &Ledger) -> Vec<TickerVolume> {
    let mut volumes: Vec<TickerVolume> = ledger
        .tickers()
        .into_iter()
        .map(|ticker| {
            let mut acc = ActionVolume::default();
            ledger.ticker_transactions(ticker).for_each(|tx| acc.add(tx));
            TickerVolume {
                ticker: ticker.to_string(),
                count: acc.count,
                quantity: acc.quantity,
                dollar_volume: acc.dollar_volume,
            }
        })
        .collect();

    volumes.sort_by(|a, b| {
        b.dollar_volume
            .cmp(&a.dollar_volume)
            .then_with(|| a.ticker.cmp(&b.ticker))
    });
    volumes
}

/// Net shares for one ticker: BUY adds, SELL subtracts. Zero when flat or unknown.
pub fn net_position(ledger: &Ledger, ticker: &str) -> Decimal {
    ledger
        .ticker_transactions(ticker)
        .map(Transaction::signed_quantity)
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Net position for every ticker, largest absolute exposure first.
pub fn net_positions(ledger: &Ledger) -> Vec<NetPosition> {
    let mut positions: Vec<NetPosition> = ledger
        .tickers()
        .into_iter()
        .map(|ticker| NetPosition {
            ticker: ticker.to_string(),
            net_quantity: net_position(ledger, ticker),
        })
        .collect();

    positions.sort_by(|a, b| {
        b.net_quantity
            .abs()
            .cmp(&a.net_quantity.abs())
            .then_with(|| a.ticker.cmp(&b.ticker))
    });
    positions
}

/// Distinct trader ids, optionally restricted to a time window.
pub fn active_traders(transactions: &[Transaction], window: Option<&TimeWindow>) -> BTreeSet<String> {
    transactions
        .iter()
        .filter(|t| window.map_or(true, |w| w.contains(t.timestamp)))
        .map(|t| t.trader_id.clone())
        .collect()
}

/// Top `limit` traders by transaction count; ties broken by trader id.
pub fn most_active_traders(transactions: &[Transaction], limit: usize) -> Vec<TraderActivity> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for tx in transactions {
        *counts.entry(tx.trader_id.as_str()).or_insert(0) += 1;
    }

    let mut ranked: Vec<TraderActivity> = counts
        .into_iter()
        .map(|(trader_id, transactions)| TraderActivity {
            trader_id: trader_id.to_string(),
            transactions,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.transactions
            .cmp(&a.transactions)
            .then_with(|| a.trader_id.cmp(&b.trader_id))
    });
    ranked.truncate(limit);
    ranked
}

/// Mean, sample standard deviation and range of prices per ticker.
pub fn price_stats(ledger: &Ledger) -> Vec<PriceStats> {
    ledger
        .tickers()
        .into_iter()
        .filter_map(|ticker| {
            let prices: Vec<Decimal> = ledger.ticker_transactions(ticker).map(|t| t.price).collect();
            let min = prices.iter().min().copied()?;
            let max = prices.iter().max().copied()?;
            let floats: Vec<f64> = prices.iter().filter_map(|p| p.to_f64()).collect();

            let mean = floats.iter().mean();
            let std_dev = if floats.len() < 2 { 0.0 } else { floats.iter().std_dev() };

            Some(PriceStats {
                ticker: ticker.to_string(),
                mean,
                std_dev,
                min,
                max,
            })
        })
        .collect()
}
