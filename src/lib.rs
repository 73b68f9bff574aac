//! # nullcore — Innullifiable Set Search Engine
//!
//! Searches for **innullifiable sets**: sets of `N` distinct positive
//! integers in `[1, M]` from which no sequence of the four binary
//! arithmetic operations (+, −, ×, ÷) — constrained to positive integer
//! intermediates at every step — can ever reach zero.
//!
//! ## Module Organization
//!
//! - [`combinadic`] — bijection between an `n`-subset of positive integers
//!   and a dense integer index (the Combinatorial Number System).
//! - [`set_record`] — dense, atomically-markable membership table over that
//!   index, with parallel-safe scanning.
//! - [`nulltest`] — exhaustive recursive proof of nullifiability for a
//!   single set.
//! - [`expansion`] — given one nullifiable set, generates every reachable
//!   nullifiable set one size larger (superset extension and arithmetic
//!   equivalent-pair substitution).
//! - [`pipeline`] — composes the above into a full `(N, M)` sweep.
//! - [`persistence`] — binary file codec for a [`set_record::SetRecord`].
//! - [`progress`] — atomic progress aggregation and signal-driven reporting
//!   to a named pipe.
//! - [`error`] — the tagged failure taxonomy every fallible operation
//!   returns.
//!
//! ## Design Philosophy
//!
//! Every fallible operation returns a tagged [`error::Error`] rather than
//! panicking; the only panics in this crate are on precondition violations
//! the public API explicitly declares unchecked (documented per function).
//! Mark operations are monotone and idempotent under the weakest ordering
//! that's sound (`Relaxed`) — see each module's docs for why.

use mimalloc::MiMalloc;

/// Set once here rather than per-binary: all four `[[bin]]` targets link
/// against this library, and a global allocator may only be registered once
/// per final binary — defining it in the shared crate root covers all of
/// them.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

pub mod cli_support;
pub mod combinadic;
pub mod error;
pub mod expansion;
pub mod nulltest;
pub mod persistence;
pub mod pipeline;
pub mod progress;
pub mod set_record;

pub use error::{Error, Result};
