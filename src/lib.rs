//! Portfolio transaction analytics.
//!
//! Loads a CSV of trades, cleans and indexes it, computes portfolio
//! analytics and optionally asks a language model to interpret them.

pub mod analytics;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod insight;
pub mod models;
pub mod pipeline;

pub use error::{PipelineError, Result};
