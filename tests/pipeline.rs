use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use rust_decimal_macros::dec;

use portfolio_insights::analytics::{net_position, summarize, AnalyticsOptions, TimeWindow};
use portfolio_insights::models::RejectReason;
use portfolio_insights::pipeline::{self, is_chronological, parse_timestamp, CleanedData};
use portfolio_insights::PipelineError;

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/transactions.csv")
}

fn load_fixture() -> CleanedData {
    pipeline::load(fixture()).unwrap()
}

#[test]
fn fixture_cleans_to_expected_count() {
    let data = load_fixture();
    assert_eq!(data.report.raw_rows, 1215);
    assert_eq!(data.report.accepted, 1089);
    assert_eq!(data.ledger.len(), 1089);
    assert_eq!(data.report.total_removed(), 126);
}

#[test]
fn fixture_rejections_by_reason() {
    let report = load_fixture().report;
    assert_eq!(report.rejected_for(RejectReason::MissingField), 30);
    assert_eq!(report.rejected_for(RejectReason::InvalidAction), 20);
    assert_eq!(report.rejected_for(RejectReason::InvalidPrice), 18);
    assert_eq!(report.rejected_for(RejectReason::InvalidQuantity), 15);
    assert_eq!(report.rejected_for(RejectReason::InvalidTimestamp), 8);
    assert_eq!(report.duplicates_removed, 35);
}

#[test]
fn cleaned_ledger_is_sorted_distinct_and_normalized() {
    let data = load_fixture();
    let txs = data.ledger.transactions();

    assert!(is_chronological(txs));
    let distinct: HashSet<_> = txs.iter().collect();
    assert_eq!(distinct.len(), txs.len());

    for tx in txs {
        assert_eq!(tx.ticker, tx.ticker.trim().to_uppercase());
        assert!(tx.price > dec!(0));
        assert!(tx.quantity > dec!(0));
    }
}

#[test]
fn index_covers_every_transaction_once() {
    let data = load_fixture();
    let ledger = &data.ledger;

    let mut seen = HashSet::new();
    for (ticker, positions) in ledger.index().iter() {
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        for &i in positions {
            assert_eq!(ledger.transactions()[i].ticker, ticker);
            assert!(seen.insert(i));
        }
    }
    assert_eq!(seen.len(), ledger.len());
    assert_eq!(
        ledger.tickers(),
        ["AAPL", "AMZN", "GOOGL", "JPM", "META", "MSFT", "NVDA", "TSLA"]
    );
}

#[test]
fn lookup_and_net_position_on_fixture() {
    let data = load_fixture();
    let jpm = data.ledger.lookup(" jpm ");
    assert_eq!(jpm.len(), 162);
    assert!(jpm.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    assert_eq!(net_position(&data.ledger, "JPM"), dec!(1735));
    assert_eq!(net_position(&data.ledger, "NVDA"), dec!(1678));
    assert!(data.ledger.lookup("IBM").is_empty());
}

#[test]
fn summary_on_fixture() {
    let data = load_fixture();
    let summary = summarize(&data.ledger, &AnalyticsOptions::default());

    assert_eq!(summary.total_transactions, 1089);
    assert_eq!(summary.total_buys, 737);
    assert_eq!(summary.total_sells, 352);
    assert_eq!(summary.unique_tickers.len(), 8);
    assert_eq!(summary.active_trader_count, 40);
    assert_eq!(summary.most_active_traders.len(), 10);
    assert_eq!(summary.net_position_by_ticker[0].ticker, "JPM");

    let counted: usize = summary.time_analysis.distribution.values().sum();
    assert_eq!(counted, 1089);
    let hourly: usize = summary.time_analysis.hourly.values().sum();
    assert_eq!(hourly, 1089);
}

#[test]
fn trader_window_narrows_active_traders() {
    let data = load_fixture();
    let first = data.ledger.transactions()[0].timestamp;
    let options = AnalyticsOptions {
        trader_window: Some(TimeWindow {
            start: Some(first),
            end: Some(first),
        }),
        ..AnalyticsOptions::default()
    };
    let summary = summarize(&data.ledger, &options);
    assert_eq!(summary.active_trader_count, 1);
    assert_eq!(summary.total_transactions, 1089);

    let window = TimeWindow {
        start: parse_timestamp("2030-01-01"),
        end: None,
    };
    let options = AnalyticsOptions {
        trader_window: Some(window),
        ..AnalyticsOptions::default()
    };
    assert_eq!(summarize(&data.ledger, &options).active_trader_count, 0);
}

#[test]
fn export_then_reload_is_identical() {
    let data = load_fixture();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clean.csv");

    let file = fs::File::create(&path).unwrap();
    pipeline::export(data.ledger.transactions(), file).unwrap();

    let reloaded = pipeline::load(&path).unwrap();
    assert_eq!(reloaded.report.raw_rows, 1089);
    assert_eq!(reloaded.report.total_removed(), 0);
    assert_eq!(reloaded.ledger.transactions(), data.ledger.transactions());
}

#[test]
fn missing_columns_are_fatal() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "timestamp,ticker,quantity,price").unwrap();
    writeln!(file, "2024-01-01 09:00:00,AAPL,10,100").unwrap();

    match pipeline::load(file.path()) {
        Err(PipelineError::MissingColumns(missing)) => {
            assert_eq!(missing, ["action", "trader_id"]);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn unreadable_source_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = pipeline::load(dir.path().join("nope.csv")).unwrap_err();
    assert!(matches!(err, PipelineError::SourceUnreadable { .. }));
}

#[test]
fn all_rows_rejected_is_an_empty_result_not_an_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "timestamp,ticker,action,quantity,price,trader_id").unwrap();
    writeln!(file, "2024-01-01 09:00:00,AAPL,HOLD,10,100,t1").unwrap();
    writeln!(file, "2024-01-01 09:00:00,AAPL,BUY,10,-1,t1").unwrap();

    let data = pipeline::load(file.path()).unwrap();
    assert!(data.report.is_empty_result());
    assert!(data.ledger.is_empty());
    assert_eq!(data.report.total_removed(), 2);
}

#[test]
fn huge_amounts_never_panic_analytics() {
    let csv = "timestamp,ticker,action,quantity,price,trader_id
2024-01-01 09:00:00,AAPL,BUY,10000000000,100000000000000000000,t1
2024-01-01 10:00:00,AAPL,BUY,70000000000000000000000000000,1,t1
2024-01-01 11:00:00,AAPL,BUY,70000000000000000000000000000,1,t2
";
    let data = pipeline::load_reader(csv.as_bytes()).unwrap();
    assert_eq!(data.report.rejected_for(RejectReason::InvalidQuantity), 1);
    assert_eq!(data.ledger.len(), 2);

    let summary = summarize(&data.ledger, &AnalyticsOptions::default());
    assert_eq!(summary.total_transactions, 2);
    assert_eq!(summary.total_quantity, rust_decimal::Decimal::MAX);
    assert!(!summary.to_string().is_empty());
}
