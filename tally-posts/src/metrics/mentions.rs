use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use tally::counter::{Counts, HeapCounter, Tally};
use tally::reduce::Extractor;
use tally::scheduler::Scheduler;
use tally::Error;

use super::{report, Report, Strategy};
use crate::utils::{scan, Scanned};

/// Counts mentioned usernames with counter `C`.  A user mentioned twice in one post counts
/// twice.
pub struct MentionExtractor<C>(PhantomData<fn() -> C>);

impl <C> MentionExtractor<C> {
    /// Creates the extractor
    pub fn new() -> Self {
        MentionExtractor(PhantomData)
    }
}

impl <C> Default for MentionExtractor<C> {
    fn default() -> Self {
        MentionExtractor::new()
    }
}

impl <C: Tally<String> + 'static> Extractor for MentionExtractor<C> {
    type Table = Scanned<C>;

    fn extract(&self, path: &Path) -> Result<Self::Table, Error> {
        scan(path, C::default(), |table, record| {
            for mention in record.mentioned_users.into_iter().flatten() {
                table.add(mention.username, 1);
            }
        })
    }
}

/// Plain map of mention counts
pub type MemoryMentions = MentionExtractor<Counts<String>>;

/// Mention counts with a lazily invalidated heap
pub type TimeMentions = MentionExtractor<HeapCounter<String>>;

/// Computes the `k` most mentioned users across `paths`
pub fn top_mentions<S: Scheduler>(
    scheduler: &S,
    paths: &[PathBuf],
    strategy: Strategy,
    k: usize
) -> Result<Report<(String, u64)>, Error> {
    match strategy {
        Strategy::Memory => report(scheduler, paths, MemoryMentions::new(), |t: Counts<String>| t.top_k(k)),
        Strategy::Time => report(scheduler, paths, TimeMentions::new(), |t: HeapCounter<String>| t.top_k(k))
    }
}

#[cfg(test)]
mod mentions_test {
    use super::*;
    use crate::test_utils::{mentioning, post, write_posts};
    use tally::scheduler::SerialScheduler;

    #[test]
    fn test_null_and_repeated_mentions() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_posts(&dir, "mentions.jsonl", &[
            post("2023-01-01", "a", "nobody"),
            mentioning("2023-01-01", "a", &["dave", "dave"]),
            mentioning("2023-01-02", "b", &["erin"]),
            mentioning("2023-01-02", "c", &[]),
        ]);
        for strategy in vec![Strategy::Memory, Strategy::Time] {
            let report = top_mentions(&SerialScheduler, &[path.clone()], strategy, 10).unwrap();
            assert_eq!(report.entries, vec![("dave".to_owned(), 2), ("erin".to_owned(), 1)]);
        }
    }

    #[test]
    fn test_missing_file_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_posts(&dir, "good.jsonl", &[mentioning("2023-01-01", "a", &["x"])]);
        let missing = dir.path().join("missing.jsonl");
        let err = top_mentions(&SerialScheduler, &[good, missing.clone()], Strategy::Memory, 10)
            .unwrap_err();
        match err {
            Error::Io { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error: {}", other)
        }
    }
}
