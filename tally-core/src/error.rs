use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort an aggregation.  A single failing file fails the whole run.
#[derive(Debug, Error)]
pub enum Error {
    /// The file could not be opened or read
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        /// File being processed
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },

    /// The extractor panicked while processing the file
    #[error("worker panicked while processing '{}'", path.display())]
    WorkerPanicked {
        /// File being processed
        path: PathBuf,
    },

    /// The worker pool could not be built or went away mid-run
    #[error("worker pool failure: {0}")]
    Pool(String),
}

impl Error {
    /// Wraps an I/O failure with the file it happened on
    pub fn io<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }
}
