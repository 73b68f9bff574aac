//! # weed — Verify Unmarked Entries via the Exhaustive Test
//!
//! `weed recSize rec.dat [minm maxm threads [prog.out]]`
//!
//! Scans `rec.dat` for cells with `NULLIFIABLE` clear, decides each with
//! [`nullcore::nulltest::nullifiable`], and marks the confirmed-nullifiable
//! ones. Mirrors [`nullcore::pipeline::Pipeline`]'s verify stage, against an
//! on-disk record.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use clap::Parser;
use nullcore::error::Error;
use nullcore::nulltest::{self, Verdict};
use nullcore::persistence;
use nullcore::progress::Progress;
use nullcore::set_record::NULLIFIABLE;

#[derive(Parser)]
#[command(name = "weed", about = "Verify unmarked entries via the exhaustive test")]
struct Args {
    /// Size of the record
    rec_size: usize,
    /// Record path
    rec: PathBuf,
    /// Expected minimum M-value, asserted against the record's header
    minm: Option<u64>,
    /// Expected maximum M-value, asserted against the record's header
    maxm: Option<u64>,
    /// Worker thread count (default 1)
    #[arg(env = "NULLCORE_THREADS")]
    threads: Option<usize>,
    /// Progress pipe path
    prog_out: Option<PathBuf>,

    /// Verbose logging
    #[arg(short = 'v')]
    verbose: bool,
    /// Export the record to disk on every progress report
    #[arg(short = 'x')]
    export_on_progress: bool,
    /// Deliver progress on SIGINT instead of SIGUSR1
    #[arg(short = 'i')]
    progress_on_sigint: bool,
}

fn run(args: Args) -> Result<(), Error> {
    let sr = Arc::new(persistence::import(&args.rec)?);
    if sr.get_size() != args.rec_size {
        return Err(Error::InvalidArgs(format!(
            "rec.dat has size {} but recSize {} was given",
            sr.get_size(),
            args.rec_size
        )));
    }
    if let Some(minm) = args.minm {
        if minm != sr.get_min_m() {
            return Err(Error::InvalidArgs(format!(
                "rec.dat min_m is {} but {minm} was given",
                sr.get_min_m()
            )));
        }
    }
    if let Some(maxm) = args.maxm {
        if maxm != sr.get_max_m() {
            return Err(Error::InvalidArgs(format!(
                "rec.dat max_m is {} but {maxm} was given",
                sr.get_max_m()
            )));
        }
    }

    let threads = args.threads.unwrap_or(1).max(1) as u64;
    let progress = Progress::new(threads as usize, sr.get_total() as u64);
    let shutdown = Arc::new(AtomicBool::new(false));

    let reporter = args.prog_out.as_ref().map(|path| {
        let signal = if args.progress_on_sigint {
            libc::SIGINT
        } else {
            libc::SIGUSR1
        };
        nullcore::progress::install_handler(signal);

        let hook: Option<Arc<dyn Fn() + Send + Sync>> = if args.export_on_progress {
            let sr = Arc::clone(&sr);
            let rec_path = args.rec.clone();
            Some(Arc::new(move || {
                let _ = persistence::export(&sr, &rec_path);
            }))
        } else {
            None
        };

        nullcore::progress::start_reporter(
            Arc::clone(&progress),
            path.clone(),
            Arc::clone(&shutdown),
            hook,
        )
    });

    let to_mark: Mutex<Vec<Vec<u64>>> = Mutex::new(Vec::new());
    rayon::scope(|scope| {
        for worker in 0..threads {
            let progress = Arc::clone(&progress);
            let sr = &sr;
            let to_mark = &to_mark;
            scope.spawn(move |_| {
                sr.query_parallel(
                    NULLIFIABLE,
                    0,
                    threads,
                    worker,
                    Some(progress.counter(worker as usize)),
                    |set, _size, _b| {
                        if nulltest::nullifiable(set) == Verdict::Nullifiable {
                            to_mark.lock().unwrap().push(set.to_vec());
                        }
                    },
                );
            });
        }
    });

    let to_mark = to_mark.into_inner().unwrap();
    let newly_marked = to_mark.len();
    for set in &to_mark {
        sr.mark(set, NULLIFIABLE)?;
    }

    shutdown.store(true, Ordering::Relaxed);
    if let Some(handle) = reporter {
        let _ = handle.join();
    }

    persistence::export(&sr, &args.rec)?;

    if args.verbose {
        tracing::info!(
            rec_size = args.rec_size,
            newly_marked,
            "verify stage complete"
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    nullcore::cli_support::init_tracing();
    let args = Args::parse();
    nullcore::cli_support::run_and_exit(|| run(args))
}
