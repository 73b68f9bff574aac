//! # create — Allocate a Blank Set Record File
//!
//! `create size minm maxm fixedSize "fixedVals" rec.dat`
//!
//! Allocates an empty (all-zero) [`nullcore::set_record::SetRecord`] with
//! the given variable-prefix bounds and fixed suffix, and writes it to
//! `rec.dat`. `fixedVals` is a single quoted argument holding whitespace- or
//! comma-separated fixed values, e.g. `"7 9"` or `"7,9"`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use nullcore::error::Error;
use nullcore::persistence;
use nullcore::set_record::SetRecord;

#[derive(Parser)]
#[command(name = "create", about = "Create a blank Set Record file")]
struct Args {
    /// Full set size (variable prefix + fixed suffix)
    size: usize,
    /// Minimum M-value of the variable prefix
    minm: u64,
    /// Maximum M-value of the variable prefix
    maxm: u64,
    /// Number of fixed suffix values
    fixed_size: usize,
    /// Fixed values as one quoted, whitespace- or comma-separated argument
    fixed_vals: String,
    /// Output path
    rec: PathBuf,
}

fn parse_fixed_vals(raw: &str, expected: usize) -> Result<Vec<u64>, Error> {
    let values: Vec<u64> = raw
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u64>()
                .map_err(|_| Error::InvalidArgs(format!("not a valid integer: {s}")))
        })
        .collect::<Result<_, _>>()?;
    if values.len() != expected {
        return Err(Error::InvalidArgs(format!(
            "fixedSize {expected} does not match {} parsed fixed values",
            values.len()
        )));
    }
    Ok(values)
}

fn run(args: Args) -> Result<(), Error> {
    let fixed_values = parse_fixed_vals(&args.fixed_vals, args.fixed_size)?;
    if args.fixed_size > args.size {
        return Err(Error::InvalidArgs(
            "fixedSize cannot exceed size".to_string(),
        ));
    }
    let var_size = args.size - args.fixed_size;

    let mut sr = SetRecord::initialize(args.size);
    sr.allocate(var_size, args.minm, args.maxm, &fixed_values)?;
    persistence::export(&sr, &args.rec)?;

    tracing::info!(
        size = args.size,
        var_size,
        minm = args.minm,
        maxm = args.maxm,
        total = sr.get_total(),
        path = %args.rec.display(),
        "created blank set record"
    );
    Ok(())
}

fn main() -> ExitCode {
    nullcore::cli_support::init_tracing();
    let args = Args::parse();
    nullcore::cli_support::run_and_exit(|| run(args))
}
