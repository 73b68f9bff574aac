//! # Progress — Atomic Aggregation and Signal-Driven Pipe Reporting
//!
//! Per-worker progress is tracked with one atomic counter per worker,
//! written only by its owner and summed on demand — the sum is racy by
//! design, which is fine: a progress readout a few cells stale is still
//! useful, and paying for synchronization on every cell visited would not
//! be. A dedicated reporter thread wakes on `SIGUSR1` (or `SIGINT`, see
//! [`install_handler`]) and pushes a fixed 24-byte little-endian record
//! `{current, total, auxiliary}` to a file descriptor opened
//! `O_WRONLY | O_TRUNC`, in one `write()` call so readers never observe a
//! torn record.
//!
//! ## Why not POSIX `pause()` directly
//!
//! A signal-driven reporter could block every worker thread's signal mask
//! and have one dedicated thread sit in `pause()` with the signal unmasked.
//! Rust doesn't have a safe binding for a bare `pause()` that composes with
//! ordinary control flow (the handler itself must be async-signal-safe, and
//! `pause` doesn't tell you *how many* signals arrived while you were doing
//! other things). Instead, the signal handler here only increments an
//! atomic "signal generation" counter — itself async-signal-safe — and the
//! reporter thread parks on a condvar, waking whenever the generation
//! counter advances or a short timeout elapses. The observable behavior is
//! the same: a thread that does nothing until the progress signal arrives,
//! then emits exactly one report per arrival (coalesced if multiple signals
//! land before the reporter wakes, matching `pause`-based coalescing under
//! signal coupling).

use std::io::Write;
use std::os::unix::io::{FromRawFd, RawFd};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

/// Every `PERIOD` cells visited, `SetRecord::query`/`query_parallel` bump
/// the slot the caller hands them; re-exported here so callers that wire up
/// a `Progress`'s per-worker counter as that slot can refer to one constant.
pub use crate::set_record::PERIOD;

static SIGNAL_GENERATION: AtomicU64 = AtomicU64::new(0);

extern "C" fn on_progress_signal(_sig: libc::c_int) {
    // Async-signal-safe: a single atomic fetch-add, nothing else.
    SIGNAL_GENERATION.fetch_add(1, Ordering::Relaxed);
}

/// Installs `on_progress_signal` as the handler for `signal` — `SIGUSR1` by
/// default, or `SIGINT` under `gen`/`weed`'s `-i` flag. Re-registering for a
/// different signal mid-run is not a supported use case (each binary
/// invocation picks one signal at startup), so this is a plain idempotent
/// call rather than a `Once`.
pub fn install_handler(signal: libc::c_int) {
    unsafe {
        libc::signal(signal, on_progress_signal as libc::sighandler_t);
    }
}

/// Shared progress state for one pipeline run: one atomic counter per
/// worker, plus an optional "unmarked count" auxiliary value the caller
/// updates between stages.
pub struct Progress {
    workers: Vec<AtomicU64>,
    total: AtomicU64,
    auxiliary: AtomicU64,
    generation_seen: AtomicUsize,
}

impl Progress {
    pub fn new(worker_count: usize, total: u64) -> Arc<Self> {
        let mut workers = Vec::with_capacity(worker_count);
        workers.resize_with(worker_count, || AtomicU64::new(0));
        Arc::new(Progress {
            workers,
            total: AtomicU64::new(total),
            auxiliary: AtomicU64::new(0),
            generation_seen: AtomicUsize::new(0),
        })
    }

    pub fn counter(&self, worker: usize) -> &AtomicU64 {
        &self.workers[worker]
    }

    pub fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
    }

    /// Sets the optional `-u` auxiliary value (e.g. current unmarked count).
    pub fn set_auxiliary(&self, value: u64) {
        self.auxiliary.store(value, Ordering::Relaxed);
    }

    fn current(&self) -> u64 {
        self.workers.iter().map(|c| c.load(Ordering::Relaxed)).sum()
    }

    /// Builds the 24-byte little-endian `{current, total, auxiliary}`
    /// record pushed to the progress pipe.
    pub fn snapshot_record(&self) -> [u8; 24] {
        let mut buf = [0u8; 24];
        buf[0..8].copy_from_slice(&self.current().to_le_bytes());
        buf[8..16].copy_from_slice(&self.total.load(Ordering::Relaxed).to_le_bytes());
        buf[16..24].copy_from_slice(&self.auxiliary.load(Ordering::Relaxed).to_le_bytes());
        buf
    }
}

/// Opens `path` `O_WRONLY | O_TRUNC` and writes `record` in a single
/// `write()` call, so a reader polling with `od` or equivalent never
/// observes a partially-written record.
pub fn push_record(path: &std::path::Path, record: &[u8; 24]) -> std::io::Result<()> {
    let c_path = std::ffi::CString::new(path.as_os_str().to_str().unwrap_or_default())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    let fd: RawFd = unsafe { libc::open(c_path.as_ptr(), libc::O_WRONLY | libc::O_TRUNC) };
    if fd < 0 {
        return Err(std::io::Error::last_os_error());
    }
    let mut file = unsafe { std::fs::File::from_raw_fd(fd) };
    file.write_all(record)
}

/// Spawns the dedicated reporter thread: blocks until the progress signal
/// (`SIGUSR1`, or `SIGINT` under `-i`) arrives (coalescing bursts), then
/// pushes a snapshot of `progress` to `pipe_path`. Runs until `shutdown` is
/// set. Caller must have already called [`install_handler`].
///
/// `on_report`, if given, runs immediately before each snapshot is taken —
/// this is where `gen`/`weed`'s `-u` (refresh the unmarked-count auxiliary
/// value) and `-x` (re-export the SR being built) hook in, since both are
/// defined relative to a progress report, not to any individual cell visit.
pub fn start_reporter(
    progress: Arc<Progress>,
    pipe_path: std::path::PathBuf,
    shutdown: Arc<AtomicBool>,
    on_report: Option<Arc<dyn Fn() + Send + Sync>>,
) -> thread::JoinHandle<()> {
    let pair = Arc::new((Mutex::new(()), Condvar::new()));

    thread::spawn(move || {
        let (lock, cvar) = &*pair;
        loop {
            if shutdown.load(Ordering::Relaxed) {
                return;
            }
            let current_gen = SIGNAL_GENERATION.load(Ordering::Relaxed) as usize;
            let seen = progress.generation_seen.load(Ordering::Relaxed);
            if current_gen == seen {
                let guard = lock.lock().unwrap();
                let _ = cvar
                    .wait_timeout(guard, std::time::Duration::from_millis(200))
                    .unwrap();
                continue;
            }
            progress.generation_seen.store(current_gen, Ordering::Relaxed);
            if let Some(hook) = &on_report {
                hook();
            }
            let record = progress.snapshot_record();
            let _ = push_record(&pipe_path, &record);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero_and_sum_correctly() {
        let p = Progress::new(4, 100);
        assert_eq!(p.current(), 0);
        p.counter(0).fetch_add(10, Ordering::Relaxed);
        p.counter(3).fetch_add(5, Ordering::Relaxed);
        assert_eq!(p.current(), 15);
    }

    #[test]
    fn snapshot_record_layout_is_little_endian_24_bytes() {
        let p = Progress::new(2, 42);
        p.counter(0).fetch_add(7, Ordering::Relaxed);
        p.set_auxiliary(3);
        let rec = p.snapshot_record();
        assert_eq!(rec.len(), 24);
        assert_eq!(u64::from_le_bytes(rec[0..8].try_into().unwrap()), 7);
        assert_eq!(u64::from_le_bytes(rec[8..16].try_into().unwrap()), 42);
        assert_eq!(u64::from_le_bytes(rec[16..24].try_into().unwrap()), 3);
    }

    #[test]
    fn concurrent_increments_are_accurate() {
        let p = Progress::new(8, 0);
        let threads: Vec<_> = (0..8)
            .map(|w| {
                let p = Arc::clone(&p);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        p.counter(w).fetch_add(1, Ordering::Relaxed);
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(p.current(), 8000);
    }
}
