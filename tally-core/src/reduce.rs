use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Error;
use crate::scheduler::Scheduler;

/// Combines two partial results by per-key addition.
///
/// Implementations must be associative and commutative: folding the same tables in any
/// order has to produce the same table.  Merging an empty table is a no-op.
pub trait Merge {
    /// Folds `other` into `self`
    fn merge(&mut self, other: Self);
}

/// Turns one input file into a partial table.
///
/// An extractor reads only the file it is given and never touches global state, so it can
/// run on any thread.
pub trait Extractor: Send + Sync + 'static {
    /// Partial table produced for each file
    type Table: Merge + Default + Send + 'static;

    /// Reads `path` and counts everything relevant in it
    fn extract(&self, path: &Path) -> Result<Self::Table, Error>;
}

/// Runs `extractor` over every path and merges the partial tables as they complete.
///
/// Merging happens on the calling thread only; workers hand their tables over by value,
/// so the global table is never shared.  An empty path list yields an empty table and the
/// first failing file aborts the run.
pub fn aggregate<S: Scheduler, E: Extractor>(
    scheduler: &S,
    paths: &[PathBuf],
    extractor: E
) -> Result<E::Table, Error> {
    let extractor = Arc::new(extractor);
    let mut global = E::Table::default();
    let mut merged = 0usize;
    scheduler.execute(paths, move |path| extractor.extract(path), |path, partial| {
        trace!("Merging partial table from {:?}", path);
        global.merge(partial);
        merged += 1;
        Ok(())
    })?;
    debug!("Merged {} partial tables", merged);
    Ok(global)
}

/// Folds tables in iteration order
pub fn merge_all<T: Merge + Default, I: IntoIterator<Item=T>>(tables: I) -> T {
    tables.into_iter().fold(T::default(), |mut acc, t| {
        acc.merge(t);
        acc
    })
}
