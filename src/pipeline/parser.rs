//! Record parser: pulls raw rows out of the source CSV without judging them.

use std::fs::File;
use std::io;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};
use tracing::{debug, warn};

use crate::error::{PipelineError, Result};
use crate::models::RawRow;

/// Column names the source must carry, in canonical order.
pub const COLUMNS: [&str; 6] = ["timestamp", "ticker", "action", "quantity", "price", "trader_id"];

/// Header position of each required column.
#[derive(Debug, Clone, Copy)]
struct ColumnPositions {
    timestamp: usize,
    ticker: usize,
    action: usize,
    quantity: usize,
    price: usize,
    trader_id: usize,
}

impl ColumnPositions {
    fn resolve(headers: &StringRecord) -> Result<Self> {
        let normalized: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |name: &str| normalized.iter().position(|h| h == name);

        let missing: Vec<String> = COLUMNS
            .iter()
            .filter(|&&c| find(c).is_none())
            .map(|&c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(PipelineError::MissingColumns(missing));
        }

        // All present, checked above.
        let pos = |name: &str| find(name).unwrap_or_default();
        Ok(Self {
            timestamp: pos("timestamp"),
            ticker: pos("ticker"),
            action: pos("action"),
            quantity: pos("quantity"),
            price: pos("price"),
            trader_id: pos("trader_id"),
        })
    }

    fn extract(&self, record: &StringRecord) -> RawRow {
        let field = |idx: usize| record.get(idx).map(str::to_string);
        RawRow {
            line: record.position().map(|p| p.line()),
            timestamp: field(self.timestamp),
            ticker: field(self.ticker),
            action: field(self.action),
            quantity: field(self.quantity),
            price: field(self.price),
            trader_id: field(self.trader_id),
        }
    }
}

/// Lazy, single-pass sequence of [`RawRow`]s.
///
/// Only I/O failures surface as errors. A row the CSV layer cannot decode
/// comes through with every field absent so the validator drops it.
pub struct RecordSource<R: io::Read> {
    records: StringRecordsIntoIter<R>,
    positions: ColumnPositions,
}

impl RecordSource<File> {
    /// Open a CSV file. Fails if it cannot be read or its header is unusable.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| PipelineError::SourceUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Opened transaction source");
        Self::from_reader(file)
    }
}

impl<R: io::Read> RecordSource<R> {
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(PipelineError::EmptySource);
        }
        let positions = ColumnPositions::resolve(&headers)?;

        Ok(Self {
            records: rdr.into_records(),
            positions,
        })
    }
}

impl<R: io::Read> Iterator for RecordSource<R> {
    type Item = Result<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.records.next()?;
        Some(match next {
            Ok(record) => Ok(self.positions.extract(&record)),
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => Err(e.into()),
            Err(e) => {
                let line = e.position().map(|p| p.line());
                warn!(line = ?line, error = %e, "Undecodable row passed on as empty");
                Ok(RawRow {
                    line,
                    ..Default::default()
                })
            }
        })
    }
}
