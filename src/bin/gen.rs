//! # gen — Perform One Expansion Stage
//!
//! `gen srcSize src.dat dest.dat [threads [prog.out]]`
//!
//! Scans `src.dat` (a size-`srcSize` [`nullcore::set_record::SetRecord`]) in
//! parallel for nullifiable entries, expands each into size `srcSize + 1`
//! via [`nullcore::expansion`], and marks the results into `dest.dat`.
//! Mirrors [`nullcore::pipeline::Pipeline`]'s generation stage, one stage at
//! a time, against on-disk records rather than in-process.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use clap::Parser;
use nullcore::error::Error;
use nullcore::expansion::{self, EquivalentPairs, MUT_ADD, MUT_MUL, SUPERS};
use nullcore::persistence;
use nullcore::progress::Progress;
use nullcore::set_record::{SetRecord, MARKED, NULLIFIABLE, ONLY_SUPERSET};

#[derive(Parser)]
#[command(name = "gen", about = "Perform one expansion stage")]
struct Args {
    /// Size of the source record
    src_size: usize,
    /// Source record path
    src: PathBuf,
    /// Destination record path
    dest: PathBuf,
    /// Worker thread count (default 1)
    #[arg(env = "NULLCORE_THREADS")]
    threads: Option<usize>,
    /// Progress pipe path
    prog_out: Option<PathBuf>,

    /// Create `dest` fresh instead of requiring it to already exist
    #[arg(short = 'c')]
    create: bool,
    /// Verbose logging
    #[arg(short = 'v')]
    verbose: bool,
    /// Supersets only (drop arithmetic mutation expansion)
    #[arg(short = 's')]
    supersets_only: bool,
    /// Arithmetic mutations only (drop superset expansion)
    #[arg(short = 'm')]
    mutations_only: bool,
    /// Also expand `ONLY_SUPERSET`-only entries
    #[arg(short = 't')]
    thorough: bool,
    /// Export `dest` to disk on every progress report
    #[arg(short = 'x')]
    export_on_progress: bool,
    /// Include the current unmarked count as the progress auxiliary value
    #[arg(short = 'u')]
    unmarked_count: bool,
    /// Deliver progress on SIGINT instead of SIGUSR1
    #[arg(short = 'i')]
    progress_on_sigint: bool,
}

fn mode_flags(args: &Args) -> Result<u8, Error> {
    match (args.supersets_only, args.mutations_only) {
        (true, true) => Err(Error::InvalidArgs(
            "-s and -m are mutually exclusive".to_string(),
        )),
        (true, false) => Ok(SUPERS),
        (false, true) => Ok(MUT_ADD | MUT_MUL),
        (false, false) => Ok(SUPERS | MUT_ADD | MUT_MUL),
    }
}

fn open_dest(args: &Args, src: &SetRecord) -> Result<SetRecord, Error> {
    if args.create {
        let mut dest = SetRecord::initialize(args.src_size + 1);
        dest.allocate(
            src.get_var_size() + 1,
            1,
            src.get_max_m(),
            &(0..src.get_fixed_size())
                .filter_map(|i| src.get_fixed_value(i))
                .collect::<Vec<_>>(),
        )?;
        Ok(dest)
    } else {
        persistence::import(&args.dest)
    }
}

fn run(args: Args) -> Result<(), Error> {
    let mode = mode_flags(&args)?;
    let threads = args.threads.unwrap_or(1).max(1) as u64;

    let src = persistence::import(&args.src)?;
    if src.get_size() != args.src_size {
        return Err(Error::InvalidArgs(format!(
            "src.dat has size {} but srcSize {} was given",
            src.get_size(),
            args.src_size
        )));
    }

    let dest = Arc::new(open_dest(&args, &src)?);
    let pairs = EquivalentPairs::build(dest.get_max_m());
    let dest_total = dest.get_total() as u64;

    let (scan_mask, scan_bits) = if args.thorough {
        (0u8, MARKED)
    } else {
        (MARKED, NULLIFIABLE)
    };

    let progress = Progress::new(threads as usize, src.get_total() as u64);
    let shutdown = Arc::new(AtomicBool::new(false));
    let marked = Arc::new(AtomicU64::new(0));

    let reporter = args.prog_out.as_ref().map(|path| {
        let signal = if args.progress_on_sigint {
            libc::SIGINT
        } else {
            libc::SIGUSR1
        };
        nullcore::progress::install_handler(signal);

        let hook: Option<Arc<dyn Fn() + Send + Sync>> = if args.unmarked_count || args.export_on_progress {
            let dest = Arc::clone(&dest);
            let marked = Arc::clone(&marked);
            let dest_path = args.dest.clone();
            let report_unmarked = args.unmarked_count;
            let report_export = args.export_on_progress;
            let progress_for_hook = Arc::clone(&progress);
            Some(Arc::new(move || {
                if report_unmarked {
                    let m = marked.load(Ordering::Relaxed);
                    progress_for_hook.set_auxiliary(dest_total.saturating_sub(m));
                }
                if report_export {
                    let _ = persistence::export(&dest, &dest_path);
                }
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

    rayon::scope(|scope| {
        for worker in 0..threads {
            let progress = Arc::clone(&progress);
            let src = &src;
            let dest = Arc::clone(&dest);
            let pairs = &pairs;
            let marked = Arc::clone(&marked);
            scope.spawn(move |_| {
                src.query_parallel(
                    scan_mask,
                    scan_bits,
                    threads,
                    worker,
                    Some(progress.counter(worker as usize)),
                    |set, _size, _b| {
                        if mode & SUPERS != 0 {
                            let _ = expansion::expand(set, 1, dest.get_max_m(), SUPERS, pairs, |t| {
                                if dest.mark(t, NULLIFIABLE | ONLY_SUPERSET).unwrap_or(false) {
                                    marked.fetch_add(1, Ordering::Relaxed);
                                }
                            });
                        }
                        if mode & (MUT_ADD | MUT_MUL) != 0 {
                            let _ = expansion::expand(
                                set,
                                1,
                                dest.get_max_m(),
                                mode & (MUT_ADD | MUT_MUL),
                                pairs,
                                |t| {
                                    if dest.mark(t, NULLIFIABLE).unwrap_or(false) {
                                        marked.fetch_add(1, Ordering::Relaxed);
                                    }
                                },
                            );
                        }
                    },
                );
            });
        }
    });

    shutdown.store(true, Ordering::Relaxed);
    if let Some(handle) = reporter {
        let _ = handle.join();
    }

    persistence::export(&dest, &args.dest)?;

    if args.verbose {
        tracing::info!(
            src_size = args.src_size,
            dest_size = dest.get_size(),
            newly_marked = marked.load(Ordering::Relaxed),
            "expansion stage complete"
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    nullcore::cli_support::init_tracing();
    let args = Args::parse();
    nullcore::cli_support::run_and_exit(|| run(args))
}
