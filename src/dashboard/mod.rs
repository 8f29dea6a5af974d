//! Interactive terminal dashboard over a cleaned ledger.
//!
//! Tabs: overview, traders, time, transactions, ticker lookup and AI
//! insight. Insight requests run on the tokio runtime in the background
//! so the UI never waits on the network.

pub mod app;
pub mod renderer;

pub use app::{DashboardApp, InsightState, Tab};
pub use renderer::run;
