//! The three post statistics, each with a memory-optimized and a time-optimized strategy.
//!
//! The strategies differ only in the counter they build per file: `Counts` keeps a plain
//! map and sorts it once at the end, `HeapCounter` keeps a heap alongside the map so the
//! top entries can be popped directly.  Both rank count descending, key ascending.

/// Busiest dates and their most active user
pub mod dates;

/// Most used emoji
pub mod emoji;

/// Most mentioned users
pub mod mentions;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use tally::reduce::{aggregate, Extractor};
use tally::scheduler::Scheduler;
use tally::Error;

use crate::utils::{LineStats, Scanned};

/// Which counter each extractor builds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Plain hash maps, fully sorted at the end
    Memory,
    /// Hash maps with a lazily invalidated heap
    Time
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Strategy::Memory),
            "time" => Ok(Strategy::Time),
            other => Err(format!("unknown strategy '{}', expected 'memory' or 'time'", other))
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Strategy::Memory => write!(f, "memory"),
            Strategy::Time => write!(f, "time")
        }
    }
}

/// A ranking plus the line counts of every file that fed it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report<R> {
    /// Ranked entries, best first
    pub entries: Vec<R>,
    /// Lines read across all files
    pub lines: LineStats
}

// Aggregates with `extractor` and ranks the merged table
fn report<S, E, T, R, F>(
    scheduler: &S,
    paths: &[PathBuf],
    extractor: E,
    rank: F
) -> Result<Report<R>, Error>
where
    S: Scheduler,
    E: Extractor<Table=Scanned<T>>,
    F: FnOnce(T) -> Vec<R>
{
    let Scanned { table, lines } = aggregate(scheduler, paths, extractor)?;
    debug!("Read {} files: {} lines, {} records, {} malformed",
           paths.len(), lines.lines, lines.records, lines.malformed);
    Ok(Report { entries: rank(table), lines })
}
