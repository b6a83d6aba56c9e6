use std::fs::File;
use std::io::prelude::*;
use std::io::BufReader;
use std::path::Path;

use tally::reduce::Merge;
use tally::Error;

use crate::record::Record;

/// Line counts for one file, or for a whole run once merged
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LineStats {
    /// Lines read, including blank and malformed ones
    pub lines: u64,
    /// Lines parsed into a Record
    pub records: u64,
    /// Lines holding only whitespace
    pub blank: u64,
    /// Lines skipped because they did not parse
    pub malformed: u64
}

impl Merge for LineStats {
    fn merge(&mut self, other: Self) {
        self.lines += other.lines;
        self.records += other.records;
        self.blank += other.blank;
        self.malformed += other.malformed;
    }
}

/// A partial table together with the lines that produced it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scanned<T> {
    /// Counts built from the file
    pub table: T,
    /// What was read to build them
    pub lines: LineStats
}

impl <T: Merge> Merge for Scanned<T> {
    fn merge(&mut self, other: Self) {
        self.table.merge(other.table);
        self.lines.merge(other.lines);
    }
}

/// Streams every well-formed Record in a file through `f`.
///
/// Malformed lines are skipped and counted, never fatal.  Failing to open or read the file
/// is fatal and names the file.
pub fn read_records<F: FnMut(Record)>(path: &Path, mut f: F) -> Result<LineStats, Error> {
    let fd = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut reader = BufReader::new(fd);
    let mut stats = LineStats::default();
    let mut line = Vec::new();
    loop {
        line.clear();
        let size = reader.read_until(b'\n', &mut line)
            .map_err(|e| Error::io(path, e))?;
        if size == 0 {
            break;
        }
        stats.lines += 1;

        if line.iter().all(|b| b.is_ascii_whitespace()) {
            stats.blank += 1;
            continue;
        }

        // Bytes go straight to serde_json so invalid UTF-8 counts as malformed
        match serde_json::from_slice::<Record>(&line) {
            Ok(record) => {
                stats.records += 1;
                f(record);
            },
            Err(e) => {
                stats.malformed += 1;
                debug!("Skipping line {} of {:?}: {}", stats.lines, path, e);
            }
        }
    }

    if stats.malformed > 0 {
        warn!("Skipped {} malformed lines out of {} in {:?}", stats.malformed, stats.lines, path);
    }
    trace!("Read {:?}: {:?}", path, stats);
    Ok(stats)
}

/// Folds every Record of a file into `table` with `f`
pub fn scan<T, F: FnMut(&mut T, Record)>(path: &Path, mut table: T, mut f: F) -> Result<Scanned<T>, Error> {
    let lines = read_records(path, |record| f(&mut table, record))?;
    Ok(Scanned { table, lines })
}
