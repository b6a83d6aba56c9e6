use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tally::counter::{Counts, HeapCounter, Tally};
use tally::nested::Nested;
use tally::reduce::Extractor;
use tally::scheduler::Scheduler;
use tally::Error;

use super::{report, Report, Strategy};
use crate::utils::{scan, Scanned};

/// Posts per date, with posts per user within each date
pub type DateTable<T, S> = Nested<NaiveDate, String, T, S>;

/// One of the busiest dates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRank {
    /// The date
    pub date: NaiveDate,
    /// User with the most posts on that date
    pub top_user: String,
    /// Posts on that date
    pub posts: u64,
    /// Posts by `top_user` on that date
    pub user_posts: u64
}

/// Counts posts per date and per (date, author) with counters `T` and `S`
pub struct DateExtractor<T, S>(PhantomData<fn() -> (T, S)>);

impl <T, S> DateExtractor<T, S> {
    /// Creates the extractor
    pub fn new() -> Self {
        DateExtractor(PhantomData)
    }
}

impl <T, S> Default for DateExtractor<T, S> {
    fn default() -> Self {
        DateExtractor::new()
    }
}

impl <T, S> Extractor for DateExtractor<T, S>
where
    T: Tally<NaiveDate> + 'static,
    S: Tally<String> + 'static
{
    type Table = Scanned<DateTable<T, S>>;

    fn extract(&self, path: &Path) -> Result<Self::Table, Error> {
        scan(path, DateTable::new(), |table, record| {
            table.add(record.date, record.user.username, 1)
        })
    }
}

/// Plain maps for both levels
pub type MemoryDates = DateExtractor<Counts<NaiveDate>, Counts<String>>;

/// Lazily invalidated heaps for both levels
pub type TimeDates = DateExtractor<HeapCounter<NaiveDate>, HeapCounter<String>>;

/// Ranks the top `k` dates and resolves the top user of each
pub fn rank_dates<T, S>(table: DateTable<T, S>, k: usize) -> Vec<DateRank>
where
    T: Tally<NaiveDate>,
    S: Tally<String>
{
    table.top_k(k).into_iter()
        .map(|row| {
            let (top_user, user_posts) = row.top.unwrap_or_default();
            DateRank { date: row.key, top_user, posts: row.count, user_posts }
        })
        .collect()
}

/// Computes the `k` busiest dates across `paths`
pub fn top_dates<S: Scheduler>(
    scheduler: &S,
    paths: &[PathBuf],
    strategy: Strategy,
    k: usize
) -> Result<Report<DateRank>, Error> {
    match strategy {
        Strategy::Memory => report(scheduler, paths, MemoryDates::new(), |t| rank_dates(t, k)),
        Strategy::Time => report(scheduler, paths, TimeDates::new(), |t| rank_dates(t, k))
    }
}
