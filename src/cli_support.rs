//! # CLI Support — Shared Binary Glue
//!
//! Tracing setup and the exit-code mapping shared by all four binaries
//! (`create`, `gen`, `weed`, `eval`). Kept in the library so each binary's
//! `main` stays a thin dispatch.

use std::process::ExitCode;

use crate::error::Error;

/// Installs a `tracing_subscriber` pipeline reading `RUST_LOG`, defaulting
/// to `info` when unset.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Runs `body`, logging and translating any [`Error`] into the exit-code
/// convention: `InvalidArgs` → 2, everything else → 1, success → 0.
pub fn run_and_exit(body: impl FnOnce() -> Result<(), Error>) -> ExitCode {
    match body() {
        Ok(()) => ExitCode::from(0),
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
