//! Asynchronous CSV reader with batch interface
//!
//! Uses csv-async for streaming parsing. Callers pull batches of operations;
//! malformed rows are logged and skipped.
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of LedgerOperations
//!                  ↓
//!           csv_format module
//! ```

use crate::io::csv_format::{convert_csv_record, CsvRecord};
use crate::types::{LedgerError, LedgerOperation};
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Asynchronous CSV reader
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self { csv_reader }
    }

    /// Read up to `batch_size` operations
    ///
    /// Returns an empty vector at end of input.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<LedgerOperation> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<CsvRecord>();

        while batch.len() < batch_size {
            match records.next().await {
                Some(Ok(csv_record)) => match convert_csv_record(csv_record) {
                    Ok(operation) => batch.push(operation),
                    Err(e) => warn!(error = %e, "skipping malformed record"),
                },
                Some(Err(e)) => {
                    let line = e.position().map(|pos| pos.line());
                    let error = LedgerError::ParseError {
                        line,
                        message: e.to_string(),
                    };
                    warn!(error = %error, "skipping malformed record");
                }
                None => break,
            }
        }

        batch
    }
}
