//! Tally-Posts
//! ---
//! Tally-Posts ranks line-delimited JSON posts by three statistics:
//!
//! * the ten dates with the most posts, with the most active author of each,
//! * the ten most used emoji,
//! * the ten most mentioned usernames.
//!
//! Every statistic comes in two strategies that always return the same ranking: a
//! memory-optimized one that keeps plain hash maps and sorts once, and a time-optimized one
//! that keeps a lazily invalidated heap next to each map.
//!
//! Each input line is one post:
//!
//! ```json
//! {"date": "2021-02-24T09:23:35+00:00", "user": {"username": "alice"},
//!  "content": "🔥 @bob", "mentionedUsers": [{"username": "bob"}]}
//! ```
//!
//! Lines that do not parse are skipped and counted.  A file that cannot be read fails the
//! whole run.
//!
//! Example - Busiest dates
//! ---
//! ```rust,no_run
//! use tally_posts::top_dates_time;
//!
//! let top = top_dates_time(&["posts-1.jsonl", "posts-2.jsonl"]).expect("Unreadable input");
//! for (date, user) in top {
//!     println!("{}: {}", date, user);
//! }
//! ```
//!
//! Example - Choosing a scheduler
//! ---
//! ```rust,no_run
//! use std::path::PathBuf;
//! use tally::scheduler::RayonScheduler;
//! use tally_posts::metrics::{emoji::top_emojis, Strategy};
//!
//! let paths = vec![PathBuf::from("posts.jsonl")];
//! let report = top_emojis(&RayonScheduler::new(4), &paths, Strategy::Memory, 10).unwrap();
//! println!("{:?} from {} records", report.entries, report.lines.records);
//! ```

#![warn(missing_docs)]

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

/// Defines the Record parsed from each input line
pub mod record;

/// Defines the line reader and per-file line statistics
pub mod utils;

/// Defines emoji detection
pub mod text;

/// Defines the three statistics and their strategies
pub mod metrics;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tally::scheduler::GreedyScheduler;
use tally::TOP_K;

pub use metrics::dates::DateRank;
pub use metrics::{Report, Strategy};
pub use tally::Error;
pub use utils::LineStats;

fn owned<P: AsRef<Path>>(paths: &[P]) -> Vec<PathBuf> {
    paths.iter().map(|p| p.as_ref().to_path_buf()).collect()
}

fn run_dates<P: AsRef<Path>>(paths: &[P], strategy: Strategy) -> Result<Vec<(NaiveDate, String)>, Error> {
    let report = metrics::dates::top_dates(&GreedyScheduler::new(), &owned(paths), strategy, TOP_K)?;
    Ok(report.entries.into_iter().map(|r| (r.date, r.top_user)).collect())
}

fn run_emojis<P: AsRef<Path>>(paths: &[P], strategy: Strategy) -> Result<Vec<(String, u64)>, Error> {
    metrics::emoji::top_emojis(&GreedyScheduler::new(), &owned(paths), strategy, TOP_K)
        .map(|report| report.entries)
}

fn run_mentions<P: AsRef<Path>>(paths: &[P], strategy: Strategy) -> Result<Vec<(String, u64)>, Error> {
    metrics::mentions::top_mentions(&GreedyScheduler::new(), &owned(paths), strategy, TOP_K)
        .map(|report| report.entries)
}

/// Ten busiest dates with their most active user, using plain maps
pub fn top_dates_memory<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<(NaiveDate, String)>, Error> {
    run_dates(paths, Strategy::Memory)
}

/// Ten busiest dates with their most active user, using lazily invalidated heaps
pub fn top_dates_time<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<(NaiveDate, String)>, Error> {
    run_dates(paths, Strategy::Time)
}

/// Ten most used emoji with their counts, using plain maps
pub fn top_emojis_memory<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<(String, u64)>, Error> {
    run_emojis(paths, Strategy::Memory)
}

/// Ten most used emoji with their counts, using lazily invalidated heaps
pub fn top_emojis_time<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<(String, u64)>, Error> {
    run_emojis(paths, Strategy::Time)
}

/// Ten most mentioned users with their counts, using plain maps
pub fn top_mentions_memory<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<(String, u64)>, Error> {
    run_mentions(paths, Strategy::Memory)
}

/// Ten most mentioned users with their counts, using lazily invalidated heaps
pub fn top_mentions_time<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<(String, u64)>, Error> {
    run_mentions(paths, Strategy::Time)
}

#[cfg(test)]
pub(crate) mod test_utils {
    use std::fs::File;
    use std::io::{BufWriter, Write};
    use std::path::PathBuf;

    use serde_json::json;
    use tempfile::TempDir;

    pub fn post(date: &str, user: &str, content: &str) -> String {
        json!({"date": date, "user": {"username": user}, "content": content, "mentionedUsers": null})
            .to_string()
    }

    pub fn mentioning(date: &str, user: &str, mentioned: &[&str]) -> String {
        let users: Vec<_> = mentioned.iter().map(|u| json!({"username": u})).collect();
        json!({"date": date, "user": {"username": user}, "content": "", "mentionedUsers": users})
            .to_string()
    }

    pub fn write_posts(dir: &TempDir, name: &str, lines: &[String]) -> PathBuf {
        let path = dir.path().join(name);
        let mut out = BufWriter::new(File::create(&path).expect("Can't create fixture!"));
        for line in lines {
            writeln!(out, "{}", line).expect("Error writing fixture");
        }
        path
    }
}
