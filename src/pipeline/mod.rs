//! Cleaning pipeline: parse -> validate -> dedup -> sort -> index.
//!
//! Every stage consumes its input whole and hands a new value to the next.

mod dedup;
mod index;
mod parser;
mod sorter;
mod validator;

use std::io;
use std::path::Path;

use tracing::{info, warn};

use crate::error::Result;
use crate::models::{CleaningReport, RawRow, Transaction};

pub use dedup::dedup;
pub use index::{in_time_range, Ledger, TickerIndex};
pub use parser::{RecordSource, COLUMNS};
pub use sorter::{is_chronological, sort_chronologically};
pub use validator::{clean, normalize_ticker, parse_positive, parse_timestamp, validate};

/// Output of a full cleaning run.
#[derive(Debug, Clone, Default)]
pub struct CleanedData {
    pub ledger: Ledger,
    pub report: CleaningReport,
}

/// Run the pipeline over a CSV file.
pub fn load(path: impl AsRef<Path>) -> Result<CleanedData> {
    let path = path.as_ref();
    info!(path = %path.display(), "Loading transactions");
    let source = RecordSource::open(path)?;
    process(source)
}

/// Run the pipeline over any CSV reader.
pub fn load_reader<R: io::Read>(reader: R) -> Result<CleanedData> {
    process(RecordSource::from_reader(reader)?)
}

fn process<R: io::Read>(source: RecordSource<R>) -> Result<CleanedData> {
    let rows = source.collect::<Result<Vec<RawRow>>>()?;
    Ok(finalize(rows))
}

/// Validate, dedup, sort and index rows that are already in memory.
pub fn finalize<I>(rows: I) -> CleanedData
where
    I: IntoIterator<Item = RawRow>,
{
    let (accepted, mut report) = clean(rows);
    let (mut transactions, duplicates) = dedup(accepted);
    sort_chronologically(&mut transactions);

    report.duplicates_removed = duplicates;
    report.accepted = transactions.len();

    info!(
        raw = report.raw_rows,
        accepted = report.accepted,
        rejected = report.total_rejected(),
        duplicates = report.duplicates_removed,
        "Cleaning complete"
    );
    if report.is_empty_result() {
        warn!("No transactions survived cleaning");
    }

    CleanedData {
        ledger: Ledger::new(transactions),
        report,
    }
}

/// Write transactions as CSV with the canonical six-column header.
pub fn export<W: io::Write>(transactions: &[Transaction], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for tx in transactions {
        wtr.serialize(tx)?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}
