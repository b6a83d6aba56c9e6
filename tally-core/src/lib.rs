//! tally
//!
//! `tally` provides primitives for building frequency rankings over many input files
//! concurrently.
//!
//! What is it?
//! ---
//!
//! `Tally` fans a per-file function out across a bounded pool of threads, folds each
//! per-file frequency table into a single global table as soon as it arrives, and
//! selects the top-K entries from the result.  It is useful for:
//!
//! * Counting keys across large collections of log or record files.
//! * Ranking dates, tokens, users or any other hashable key.
//! * Two-level rankings, such as the most active user on each of the busiest days.
//!
//! How to Use It?
//! ---
//!
//! The crate is built from three pieces:
//!
//! 1. `Scheduler` - Runs a function once per file and hands each result back to the
//!    calling thread in completion order.
//! 2. `Extractor` + `Merge` - Turns one file into a partial table and combines partial
//!    tables by per-key addition.
//! 3. `Tally` - A counter that knows how to select its own top-K: `Counts` sorts the
//!    full table, `HeapCounter` pops from a lazily invalidated heap.
//!
//! Example - Counting words
//! ---
//! ```rust
//! use std::path::{Path, PathBuf};
//! use tally::counter::{Counts, Tally};
//! use tally::reduce::{aggregate, Extractor};
//! use tally::scheduler::SerialScheduler;
//! use tally::Error;
//!
//! struct FileName;
//!
//! impl Extractor for FileName {
//!     type Table = Counts<String>;
//!
//!     fn extract(&self, path: &Path) -> Result<Self::Table, Error> {
//!         let mut counts = Counts::new();
//!         counts.add(path.display().to_string(), 1);
//!         Ok(counts)
//!     }
//! }
//!
//! let paths: Vec<PathBuf> = vec!["a".into(), "b".into(), "a".into()];
//! let table = aggregate(&SerialScheduler, &paths, FileName).unwrap();
//! assert_eq!(table.top_k(1), vec![("a".to_owned(), 2)]);
//! ```

#![warn(missing_docs)]

#[macro_use]
extern crate log;

/// Contains the Error type shared by every stage
pub mod error;

/// Contains Scheduler trait definition and implementations
pub mod scheduler;

/// Contains the Merge and Extractor traits and the aggregation driver
pub mod reduce;

/// Contains the Tally trait and its full-sort and heap-based counters
pub mod counter;

/// Contains the two-level Nested table
pub mod nested;

pub use error::Error;

/// Number of entries every ranking selects unless told otherwise
pub const TOP_K: usize = 10;
