use std::cmp::Reverse;
use std::fs::metadata;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

use jobpool::JobPool;
use priority_queue::PriorityQueue;
use rayon::ThreadPoolBuilder;

use crate::error::Error;

/// Runs a unit of work once per input file.
///
/// `work` runs on the scheduler's threads and owns everything it touches.  Each result is
/// handed to `on_complete` on the calling thread as soon as its file finishes, in
/// completion order rather than submission order.  The first failure, whether from `work`
/// or from `on_complete`, stops the dispatch of new files and is returned once the files
/// already in flight have drained.
pub trait Scheduler {
    /// Processes every path, returning the first error encountered.
    fn execute<T, F, C>(&self, paths: &[PathBuf], work: F, on_complete: C) -> Result<(), Error>
    where
        T: Send + 'static,
        F: Fn(&Path) -> Result<T, Error> + Send + Sync + 'static,
        C: FnMut(&Path, T) -> Result<(), Error>;
}

// Converts a panic in user code into an error for the coordinator
fn guarded<T, F: Fn(&Path) -> Result<T, Error>>(work: &F, path: &Path) -> Result<T, Error> {
    catch_unwind(AssertUnwindSafe(|| work(path))).unwrap_or_else(|_| {
        Err(Error::WorkerPanicked { path: path.to_owned() })
    })
}

// Records the first failure; later ones are logged and dropped
fn settle<T, C: FnMut(&Path, T) -> Result<(), Error>>(
    failure: &mut Option<Error>,
    on_complete: &mut C,
    path: &Path,
    out: Result<T, Error>
) {
    if failure.is_some() {
        if let Err(e) = out {
            debug!("Ignoring later failure on {:?}: {}", path, e);
        }
        return;
    }

    if let Err(e) = out.and_then(|table| on_complete(path, table)) {
        warn!("Aborting after failure on {:?}: {}", path, e);
        *failure = Some(e);
    }
}

/// Runs files on a fixed pool of threads, largest file first.
///
/// At most `n_threads` files are in flight at any time.  Pending files wait in a priority
/// queue keyed by size, so the longest jobs start early and the tail of the run stays short.
pub struct GreedyScheduler(usize);

impl GreedyScheduler {
    /// Creates a scheduler with one thread per available CPU
    pub fn new() -> Self {
        GreedyScheduler(num_cpus::get())
    }

    /// Creates a scheduler with the given number of threads (at least one)
    pub fn with_threads(n_threads: usize) -> Self {
        GreedyScheduler(n_threads.max(1))
    }

    /// Number of worker threads
    pub fn threads(&self) -> usize {
        self.0
    }
}

impl Default for GreedyScheduler {
    fn default() -> Self {
        GreedyScheduler::new()
    }
}

impl Scheduler for GreedyScheduler {

    fn execute<T, F, C>(
        &self,
        paths: &[PathBuf],
        work: F,
        mut on_complete: C
    ) -> Result<(), Error>
    where
        T: Send + 'static,
        F: Fn(&Path) -> Result<T, Error> + Send + Sync + 'static,
        C: FnMut(&Path, T) -> Result<(), Error>
    {
        debug!("Number of Files Specified: {}", paths.len());
        if paths.is_empty() {
            return Ok(());
        }

        // Index keeps duplicate paths distinct and breaks size ties by input order
        let mut queue = PriorityQueue::new();
        for (idx, path) in paths.iter().enumerate() {
            let size = metadata(path).map(|m| m.len()).unwrap_or(0);
            queue.push((idx, path.clone()), (size, Reverse(idx)));
        }

        let n_threads = self.0.min(paths.len());
        debug!("Worker Threads: {}", n_threads);

        let work = Arc::new(work);
        let mut pool = JobPool::new(n_threads);
        let mut free_threads = n_threads;
        let (tx, rx) = mpsc::channel();
        let mut failure = None;
        loop {
            // Queue up all free items
            while failure.is_none() && free_threads > 0 && !queue.is_empty() {
                if let Some(((_idx, path), (size, _))) = queue.pop() {
                    trace!("Queueing file: {:?}, bytes: {}", path, size);
                    let w = work.clone();
                    let thread_tx = tx.clone();
                    pool.queue(move || {
                        let out = guarded(&*w, &path);
                        // Receiver outlives every job; a failed send means the run is over
                        let _ = thread_tx.send((path, out));
                    });
                    free_threads -= 1;
                }
            }

            // Nothing in flight: either done or draining after a failure
            if free_threads == n_threads {
                break;
            }

            // Eat!
            let (path, out) = match rx.recv() {
                Ok(msg) => msg,
                Err(e) => {
                    failure = Some(Error::Pool(e.to_string()));
                    break;
                }
            };
            free_threads += 1;
            trace!("{:?} finished", path);
            settle(&mut failure, &mut on_complete, &path, out);
        }
        pool.shutdown();

        debug!("Finished");
        match failure {
            Some(e) => Err(e),
            None => Ok(())
        }
    }
}

/// Runs files on a dedicated rayon thread pool.
///
/// Every file is spawned up front; once a failure is seen the remaining queued files are
/// skipped without being read.
pub struct RayonScheduler(usize);

impl RayonScheduler {
    /// Creates a scheduler with the given number of threads (at least one)
    pub fn new(n_threads: usize) -> Self {
        RayonScheduler(n_threads.max(1))
    }

    /// Number of worker threads
    pub fn threads(&self) -> usize {
        self.0
    }
}

impl Default for RayonScheduler {
    fn default() -> Self {
        RayonScheduler::new(num_cpus::get())
    }
}

impl Scheduler for RayonScheduler {

    fn execute<T, F, C>(
        &self,
        paths: &[PathBuf],
        work: F,
        mut on_complete: C
    ) -> Result<(), Error>
    where
        T: Send + 'static,
        F: Fn(&Path) -> Result<T, Error> + Send + Sync + 'static,
        C: FnMut(&Path, T) -> Result<(), Error>
    {
        debug!("Number of Files Specified: {}", paths.len());
        if paths.is_empty() {
            return Ok(());
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.0)
            .thread_name(|i| format!("tally-worker-{}", i))
            .build()
            .map_err(|e| Error::Pool(e.to_string()))?;
        debug!("Worker Threads: {}", pool.current_num_threads());

        let work = Arc::new(work);
        let aborted = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();
        for path in paths.iter().cloned() {
            let w = work.clone();
            let stop = aborted.clone();
            let thread_tx = tx.clone();
            pool.spawn(move || {
                if stop.load(Ordering::Relaxed) {
                    trace!("Skipping {:?}", path);
                    return;
                }
                let out = guarded(&*w, &path);
                let _ = thread_tx.send((path, out));
            });
        }
        // Channel closes once the last job drops its sender
        drop(tx);

        let mut failure = None;
        for (path, out) in rx {
            trace!("{:?} finished", path);
            settle(&mut failure, &mut on_complete, &path, out);
            if failure.is_some() {
                aborted.store(true, Ordering::Relaxed);
            }
        }

        debug!("Finished");
        match failure {
            Some(e) => Err(e),
            None => Ok(())
        }
    }
}

/// Runs every file on the calling thread, in the order given.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialScheduler;

impl Scheduler for SerialScheduler {

    fn execute<T, F, C>(
        &self,
        paths: &[PathBuf],
        work: F,
        mut on_complete: C
    ) -> Result<(), Error>
    where
        T: Send + 'static,
        F: Fn(&Path) -> Result<T, Error> + Send + Sync + 'static,
        C: FnMut(&Path, T) -> Result<(), Error>
    {
        for path in paths {
            trace!("Processing file: {:?}", path);
            let table = guarded(&work, path)?;
            on_complete(path, table)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod scheduler_test {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread::sleep;
    use std::time::Duration;

    fn paths(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("file-{}", i))).collect()
    }

    fn index_of(path: &Path) -> usize {
        path.to_str().unwrap()
            .trim_start_matches("file-")
            .parse()
            .unwrap()
    }

    fn collect_all<S: Scheduler>(s: &S, n: usize) -> Vec<usize> {
        let mut seen = Vec::new();
        s.execute(&paths(n), |p| Ok(index_of(p)), |_p, i| {
            seen.push(i);
            Ok(())
        }).unwrap();
        seen.sort();
        seen
    }

    fn fail_on_three<S: Scheduler>(s: &S) -> Error {
        s.execute(&paths(8), |p| {
            if index_of(p) == 3 {
                Err(Error::io(p, std::io::Error::new(std::io::ErrorKind::NotFound, "gone")))
            } else {
                Ok(())
            }
        }, |_p, _| Ok(())).unwrap_err()
    }

    #[test]
    fn test_greedy_runs_every_file() {
        let s = GreedyScheduler::with_threads(3);
        assert_eq!(collect_all(&s, 20), (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_rayon_runs_every_file() {
        let s = RayonScheduler::new(3);
        assert_eq!(collect_all(&s, 20), (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_thread_counts() {
        assert_eq!(GreedyScheduler::with_threads(0).threads(), 1);
        assert_eq!(GreedyScheduler::with_threads(6).threads(), 6);
        assert_eq!(RayonScheduler::new(0).threads(), 1);
        assert_eq!(RayonScheduler::new(3).threads(), 3);
        assert_eq!(GreedyScheduler::new().threads(), num_cpus::get());
    }

    #[test]
    fn test_serial_keeps_order() {
        let mut seen = Vec::new();
        SerialScheduler.execute(&paths(5), |p| Ok(index_of(p)), |_p, i| {
            seen.push(i);
            Ok(())
        }).unwrap();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_empty_input() {
        let never = |_p: &Path| -> Result<(), Error> { panic!("no files to run") };
        GreedyScheduler::with_threads(2).execute(&[], never, |_p, _| Ok(())).unwrap();
        RayonScheduler::new(2).execute(&[], never, |_p, _| Ok(())).unwrap();
    }

    #[test]
    fn test_greedy_bounds_in_flight() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (a, p) = (active.clone(), peak.clone());
        GreedyScheduler::with_threads(2).execute(&paths(10), move |_path| {
            let now = a.fetch_add(1, Ordering::SeqCst) + 1;
            p.fetch_max(now, Ordering::SeqCst);
            sleep(Duration::from_millis(5));
            a.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }, |_p, _| Ok(())).unwrap();
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn test_failure_propagates() {
        for err in vec![
            fail_on_three(&GreedyScheduler::with_threads(2)),
            fail_on_three(&RayonScheduler::new(2)),
            fail_on_three(&SerialScheduler),
        ] {
            match err {
                Error::Io { path, .. } => assert_eq!(path, PathBuf::from("file-3")),
                other => panic!("unexpected error: {}", other)
            }
        }
    }

    #[test]
    fn test_panic_becomes_error() {
        let err = GreedyScheduler::with_threads(2).execute(&paths(4), |p| {
            if index_of(p) == 1 {
                panic!("bad file");
            }
            Ok(())
        }, |_p, _| Ok(())).unwrap_err();
        match err {
            Error::WorkerPanicked { path } => assert_eq!(path, PathBuf::from("file-1")),
            other => panic!("unexpected error: {}", other)
        }
    }

    #[test]
    fn test_rayon_panic_becomes_error() {
        let err = RayonScheduler::new(2).execute(&paths(4), |p| {
            if index_of(p) == 2 {
                panic!("bad file");
            }
            Ok(())
        }, |_p, _| Ok(())).unwrap_err();
        match err {
            Error::WorkerPanicked { path } => assert_eq!(path, PathBuf::from("file-2")),
            other => panic!("unexpected error: {}", other)
        }
    }

    #[test]
    fn test_rayon_skips_queued_files_after_failure() {
        let ran = Arc::new(AtomicUsize::new(0));
        let r = ran.clone();
        // One thread takes files in submission order, so file-0 fails first
        let err = RayonScheduler::new(1).execute(&paths(16), move |p| {
            r.fetch_add(1, Ordering::SeqCst);
            if index_of(p) == 0 {
                return Err(Error::Pool("first file".to_owned()));
            }
            sleep(Duration::from_millis(20));
            Ok(())
        }, |_p, _| Ok(()));
        assert!(err.is_err());
        assert!(ran.load(Ordering::SeqCst) < 16);
    }

    #[test]
    fn test_collector_failure_stops_run() {
        let mut calls = 0;
        let err = SerialScheduler.execute(&paths(4), |p| Ok(index_of(p)), |p, _| {
            calls += 1;
            Err(Error::Pool(format!("refused {:?}", p)))
        });
        assert!(err.is_err());
        assert_eq!(calls, 1);
    }
}
