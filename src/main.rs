//! Portfolio Insights
//!
//! Cleans a CSV of portfolio transactions, reports portfolio analytics and
//! asks a language model to interpret them.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use portfolio_insights::analytics::{net_position, summarize, TimeBucket, TimeWindow};
use portfolio_insights::config::Config;
use portfolio_insights::dashboard::{self, DashboardApp};
use portfolio_insights::insight::{unavailable_message, InsightClient, InsightError};
use portfolio_insights::models::AnalyticsSummary;
use portfolio_insights::pipeline::{self, parse_timestamp, CleanedData};

/// Portfolio transaction analytics CLI.
#[derive(Parser)]
#[command(name = "portfolio-insights")]
#[command(about = "Clean, analyze and explain portfolio transactions", long_about = None)]
struct Cli {
    /// Input CSV (overrides PORTFOLIO_DATA_PATH)
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Time distribution granularity (hour, day, week, month)
    #[arg(short, long, global = true)]
    bucket: Option<TimeBucket>,

    /// Number of most active traders to report
    #[arg(long, global = true)]
    top_traders: Option<usize>,

    /// Insight model (overrides INSIGHT_MODEL)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Insight deadline in seconds (overrides INSIGHT_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean the data and print the cleaning report and analytics
    Analyze {
        /// Also list every transaction for this ticker
        #[arg(short, long)]
        ticker: Option<String>,

        /// Print the analytics summary as JSON
        #[arg(long)]
        json: bool,

        /// Write the cleaned transactions to this CSV file
        #[arg(short, long)]
        export: Option<PathBuf>,

        /// Count active traders from this time on
        #[arg(long, value_parser = parse_cli_timestamp)]
        since: Option<NaiveDateTime>,

        /// Count active traders up to this time
        #[arg(long, value_parser = parse_cli_timestamp)]
        until: Option<NaiveDateTime>,
    },

    /// Analyze, then ask the model for a written interpretation
    Insight,

    /// Interactive terminal dashboard
    Dashboard,
}

fn parse_cli_timestamp(raw: &str) -> std::result::Result<NaiveDateTime, String> {
    parse_timestamp(raw).ok_or_else(|| format!("unrecognised timestamp: {raw}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    // Log lines would tear the terminal UI
    let log_level = match cli.command {
        Commands::Dashboard => Level::ERROR,
        _ => log_level,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = Config::from_env();
    if let Some(path) = cli.data {
        config.data_path = path;
    }
    if let Some(bucket) = cli.bucket {
        config.analytics.bucket = bucket;
    }
    if let Some(n) = cli.top_traders {
        config.analytics.top_traders = n.max(1);
    }
    if let Some(model) = cli.model {
        config.insight.model = model;
    }
    if let Some(secs) = cli.timeout {
        config.insight.timeout = Duration::from_secs(secs.max(1));
    }

    let data = pipeline::load(&config.data_path)
        .with_context(|| format!("failed to load {}", config.data_path.display()))?;

    match cli.command {
        Commands::Analyze {
            ticker,
            json,
            export,
            since,
            until,
        } => {
            if since.is_some() || until.is_some() {
                config.analytics.trader_window = Some(TimeWindow { start: since, end: until });
            }
            let summary = summarize(&data.ledger, &config.analytics);

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_report(&data);
                if !data.report.is_empty_result() {
                    println!("{}", summary);
                }
            }

            if let Some(ticker) = ticker {
                print_ticker(&data, &ticker);
            }

            if let Some(path) = export {
                let file = File::create(&path)
                    .with_context(|| format!("failed to create {}", path.display()))?;
                pipeline::export(data.ledger.transactions(), BufWriter::new(file))?;
                info!(path = %path.display(), rows = data.ledger.len(), "Exported cleaned transactions");
                println!("Exported {} transactions to {}", data.ledger.len(), path.display());
            }
        }

        Commands::Insight => {
            let summary = summarize(&data.ledger, &config.analytics);
            print_report(&data);
            if data.report.is_empty_result() {
                return Ok(());
            }
            println!("{}", summary);

            println!("\n{:=^60}", " AI INSIGHTS ");
            match generate_insight(&config, &summary).await {
                Ok(text) => println!("\n{}", text),
                Err(e) => {
                    warn!(error = %e, "Insight generation failed");
                    println!("\n{}", unavailable_message(&e));
                }
            }
        }

        Commands::Dashboard => {
            let summary = summarize(&data.ledger, &config.analytics);
            let client = match InsightClient::from_config(&config.insight) {
                Ok(client) => Some(client),
                Err(InsightError::NotConfigured) => None,
                Err(e) => {
                    warn!(error = %e, "Insight client unavailable");
                    None
                }
            };

            let runtime = tokio::runtime::Handle::current();
            let app = DashboardApp::new(data.ledger, data.report, summary, client, runtime);
            tokio::task::spawn_blocking(move || dashboard::run(app))
                .await
                .context("dashboard task panicked")??;
        }
    }

    Ok(())
}

async fn generate_insight(config: &Config, summary: &AnalyticsSummary) -> Result<String, InsightError> {
    let client = InsightClient::from_config(&config.insight)?;
    info!(model = %client.model(), "Requesting insight");
    client.generate(summary).await
}

fn print_report(data: &CleanedData) {
    println!("\n{:=^60}", " DATA CLEANING ");
    println!("{}", data.report);

    if data.report.is_empty_result() {
        println!("\nNo valid transactions remained after cleaning; nothing to analyze.");
    }
}

fn print_ticker(data: &CleanedData, ticker: &str) {
    let transactions = data.ledger.lookup(ticker);
    let ticker = ticker.trim().to_uppercase();

    println!("\n--- {} ({} transactions) ---", ticker, transactions.len());
    if transactions.is_empty() {
        println!("No transactions for {}", ticker);
        return;
    }

    for tx in &transactions {
        println!(
            "  {} | {} {} @ ${:.2} | {}",
            tx.timestamp.format("%Y-%m-%d %H:%M:%S"),
            tx.action,
            tx.quantity,
            tx.price,
            tx.trader_id
        );
    }
    println!("Net position: {}", net_position(&data.ledger, &ticker));
}
