//! # eval — Print Unmarked Sets
//!
//! `eval recSize rec.dat`
//!
//! Scans `rec.dat` for cells with every bit in [`nullcore::set_record::MARKED`]
//! clear — the innullifiable residue after a completed sweep — and prints
//! the count, or (with `-s`) every set.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use nullcore::error::Error;
use nullcore::persistence;
use nullcore::set_record::MARKED;

#[derive(Parser)]
#[command(name = "eval", about = "Print unmarked (innullifiable) sets")]
struct Args {
    /// Size of the record
    rec_size: usize,
    /// Record path
    rec: PathBuf,

    /// List every unmarked set, one per line
    #[arg(short = 's')]
    list_sets: bool,
}

fn run(args: Args) -> Result<(), Error> {
    let sr = persistence::import(&args.rec)?;
    if sr.get_size() != args.rec_size {
        return Err(Error::InvalidArgs(format!(
            "rec.dat has size {} but recSize {} was given",
            sr.get_size(),
            args.rec_size
        )));
    }

    let mut count = 0u64;
    sr.query(MARKED, 0, None, |set, _size, _b| {
        count += 1;
        if args.list_sets {
            let rendered = set
                .iter()
                .map(u64::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            println!("{{{rendered}}}");
        }
    });

    println!("{count} innullifiable set(s)");
    Ok(())
}

fn main() -> ExitCode {
    nullcore::cli_support::init_tracing();
    let args = Args::parse();
    nullcore::cli_support::run_and_exit(|| run(args))
}
