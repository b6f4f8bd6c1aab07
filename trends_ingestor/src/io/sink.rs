use async_trait::async_trait;
use snafu::{Backtrace, Snafu};

use crate::models::observation::SeriesData;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SinkError {
    /// An error occurred while trying to write the data (e.g., file I/O error).
    #[snafu(display("Failed to write data: {message}"))]
    WriteError {
        message: String,
        backtrace: Backtrace,
    },

    /// A stored dataset exists but does not match the two-column contract.
    #[snafu(display("Stored data does not parse: {message}"))]
    ParseError {
        message: String,
        backtrace: Backtrace,
    },

    /// A generic I/O error.
    #[snafu(display("I/O error: {source}"))]
    Io {
        source: std::io::Error,
        backtrace: Backtrace,
    },
}

/// Destination for per-series datasets.
#[async_trait]
pub trait DataSink {
    /// The type of output returned after a successful write operation.
    ///
    /// This keeps the trait flexible. For example:
    /// - A file sink returns the path of the rewritten file.
    /// - A database sink might return the number of rows inserted.
    type Output;

    /// Loads the previously stored dataset for `symbol`.
    ///
    /// `Ok(None)` means no dataset has been written for this symbol yet; an
    /// `Err` means one exists but could not be read back.
    async fn load(&self, symbol: &str) -> Result<Option<SeriesData>, SinkError>;

    /// Replaces the stored dataset for `symbol` in one atomic step. A reader
    /// polling the destination never observes a partially written dataset.
    async fn write(&self, symbol: &str, data: &SeriesData) -> Result<Self::Output, SinkError>;
}
