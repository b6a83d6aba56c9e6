use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use tally::counter::{Counts, HeapCounter, Tally};
use tally::reduce::Extractor;
use tally::scheduler::Scheduler;
use tally::Error;

use super::{report, Report, Strategy};
use crate::text::find_emojis;
use crate::utils::{scan, Scanned};

/// Counts emoji occurrences in post content with counter `C`
pub struct EmojiExtractor<C>(PhantomData<fn() -> C>);

impl <C> EmojiExtractor<C> {
    /// Creates the extractor
    pub fn new() -> Self {
        EmojiExtractor(PhantomData)
    }
}

impl <C> Default for EmojiExtractor<C> {
    fn default() -> Self {
        EmojiExtractor::new()
    }
}

impl <C: Tally<String> + 'static> Extractor for EmojiExtractor<C> {
    type Table = Scanned<C>;

    fn extract(&self, path: &Path) -> Result<Self::Table, Error> {
        scan(path, C::default(), |table, record| {
            for emoji in find_emojis(&record.content) {
                table.add(emoji.to_owned(), 1);
            }
        })
    }
}

/// Plain map of emoji counts
pub type MemoryEmojis = EmojiExtractor<Counts<String>>;

/// Emoji counts with a lazily invalidated heap
pub type TimeEmojis = EmojiExtractor<HeapCounter<String>>;

/// Computes the `k` most used emoji across `paths`
pub fn top_emojis<S: Scheduler>(
    scheduler: &S,
    paths: &[PathBuf],
    strategy: Strategy,
    k: usize
) -> Result<Report<(String, u64)>, Error> {
    match strategy {
        Strategy::Memory => report(scheduler, paths, MemoryEmojis::new(), |t: Counts<String>| t.top_k(k)),
        Strategy::Time => report(scheduler, paths, TimeEmojis::new(), |t: HeapCounter<String>| t.top_k(k))
    }
}
