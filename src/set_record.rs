//! # SetRecord — Dense, Atomically-Markable Set Membership Table
//!
//! A `SetRecord` owns one byte per addressable `n`-subset of `[min_m, max_m]`
//! (optionally with a fixed constant suffix above `max_m`), indexed by the
//! combinadic bijection in [`crate::combinadic`]. Marks are lock-free
//! fetch-or; reads are plain atomic loads. The array is write-mostly-once —
//! bits only ever turn on — so weak `Relaxed` ordering is sufficient: no
//! query needs to observe a globally consistent snapshot, only that every
//! bit it *does* see reflects some prior mark.
//!
//! ## Cell Layout
//!
//! Each cell is one byte. Two bits are meaningful to the pipeline:
//!
//! - [`NULLIFIABLE`] (bit 0) — this set is known nullifiable.
//! - [`ONLY_SUPERSET`] (bit 1) — this set was marked solely because it's a
//!   superset of a smaller nullifiable set, not via an arithmetic mutation.
//!
//! [`MARKED`] is the combined mask. Callers are free to use the remaining six
//! bits for their own bookkeeping; `SetRecord` itself only interprets the
//! mask/bits arguments it's given.

use std::sync::atomic::{AtomicU8, Ordering};

use crate::combinadic::{self, validate_ascending};
use crate::error::{Error, Result};

pub const NULLIFIABLE: u8 = 1 << 0;
pub const ONLY_SUPERSET: u8 = 1 << 1;
pub const MARKED: u8 = NULLIFIABLE | ONLY_SUPERSET;

/// Every 4096th cell visited by a scan bumps the progress slot.
pub const PERIOD: u64 = 4096;

const MAX_FIXED: usize = 4;

#[derive(Debug)]
pub struct SetRecord {
    size: usize,
    var_size: usize,
    fixed_values: Vec<u64>,
    min_m: u64,
    max_m: u64,
    /// `φ(canonical prefix at min_m)` — the index offset subtracted from
    /// every absolute combinadic index to get a cell-array position.
    base_offset: u64,
    cells: Box<[AtomicU8]>,
}

impl SetRecord {
    /// Fresh, unallocated record of the given set size. No failure mode
    /// except the allocator itself (which Rust surfaces as an abort) — see
    /// `persistence.rs` for the one place a *checked* allocation failure
    /// can be raised instead.
    pub fn initialize(size: usize) -> Self {
        SetRecord {
            size,
            var_size: 0,
            fixed_values: Vec::new(),
            min_m: 0,
            max_m: 0,
            base_offset: 0,
            cells: Box::new([]),
        }
    }

    /// (Re)allocates the cell array for a `(var_size, min_m, max_m,
    /// fixed_values)` split. Not safe to call concurrently with `mark` or
    /// `query`/`query_parallel`.
    pub fn allocate(
        &mut self,
        var_size: usize,
        min_m: u64,
        max_m: u64,
        fixed_values: &[u64],
    ) -> Result<()> {
        if var_size + fixed_values.len() != self.size {
            return Err(Error::InvalidArgs(format!(
                "var_size ({var_size}) + fixed_values.len() ({}) must equal size ({})",
                fixed_values.len(),
                self.size
            )));
        }
        if fixed_values.len() > MAX_FIXED {
            return Err(Error::InvalidArgs(format!(
                "at most {MAX_FIXED} fixed values are supported, got {}",
                fixed_values.len()
            )));
        }
        if fixed_values.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::InvalidArgs(
                "fixed_values must be strictly ascending".into(),
            ));
        }
        if let Some(&first_fixed) = fixed_values.first() {
            if first_fixed <= max_m {
                return Err(Error::InvalidArgs(format!(
                    "first fixed value {first_fixed} must exceed max_m {max_m}"
                )));
            }
        }

        // No set of a var_size-element prefix can have an M-value smaller
        // than var_size itself (you need at least that many distinct
        // positive integers below or at it).
        let min_m = min_m.max(var_size as u64);

        let total = if var_size == 0 {
            1
        } else {
            combinadic::mcn(max_m, var_size as u64)
                .saturating_sub(combinadic::mcn(min_m.saturating_sub(1), var_size as u64))
        };

        let mut cells = Vec::with_capacity(total as usize);
        cells.resize_with(total as usize, || AtomicU8::new(0));

        self.var_size = var_size;
        self.fixed_values = fixed_values.to_vec();
        self.min_m = min_m;
        self.max_m = max_m;
        self.base_offset = if var_size == 0 {
            0
        } else {
            combinadic::mcn(min_m.saturating_sub(1), var_size as u64)
        };
        self.cells = cells.into_boxed_slice();
        Ok(())
    }

    // -- metadata getters --------------------------------------------------

    pub fn get_size(&self) -> usize {
        self.size
    }
    pub fn get_var_size(&self) -> usize {
        self.var_size
    }
    pub fn get_min_m(&self) -> u64 {
        self.min_m
    }
    pub fn get_max_m(&self) -> u64 {
        self.max_m
    }
    pub fn get_fixed_size(&self) -> usize {
        self.fixed_values.len()
    }
    pub fn get_fixed_value(&self, i: usize) -> Option<u64> {
        self.fixed_values.get(i).copied()
    }
    pub fn get_total(&self) -> usize {
        self.cells.len()
    }

    /// Raw byte at absolute cell index `i`. Used by `persistence` for
    /// export; not part of the public set-lookup API (use [`Self::get`]
    /// for that).
    pub fn cell_raw(&self, i: usize) -> u8 {
        self.cells[i].load(Ordering::Relaxed)
    }

    /// Overwrites the cell array from a raw byte buffer of length
    /// `get_total()`. Used by `persistence` for import; not safe to call
    /// concurrently with `mark`/`query`, matching `allocate`'s contract.
    pub fn load_raw(&mut self, data: &[u8]) {
        assert_eq!(data.len(), self.cells.len());
        for (cell, &byte) in self.cells.iter().zip(data) {
            cell.store(byte, Ordering::Relaxed);
        }
    }

    /// The variable prefix and fixed suffix a full `size`-element `set` must
    /// decompose into for this record, or `None` if `set` doesn't match the
    /// fixed suffix or falls outside `[min_m, max_m]`.
    fn split<'a>(&self, set: &'a [u64]) -> Option<(&'a [u64], u64)> {
        if set.len() != self.size {
            return None;
        }
        let (var_part, fixed_part) = set.split_at(self.var_size);
        if fixed_part != self.fixed_values.as_slice() {
            return None;
        }
        let m_value = *var_part.last()?;
        if m_value < self.min_m || m_value > self.max_m {
            return None;
        }
        Some((var_part, m_value))
    }

    fn cell_index(&self, var_part: &[u64]) -> usize {
        (combinadic::index_of(var_part) - self.base_offset) as usize
    }

    /// ORs `mask` into the cell for `set`, returning whether any new bit
    /// became set. Returns `Ok(false)` (a deliberate skip, not an error)
    /// when `set`'s M-value falls outside `[min_m, max_m]` or its suffix
    /// doesn't match the fixed values. Fails with [`Error::InvalidArgs`]
    /// only when `set` itself is malformed (wrong length or not strictly
    /// ascending).
    pub fn mark(&self, set: &[u64], mask: u8) -> Result<bool> {
        if set.len() != self.size {
            return Err(Error::InvalidArgs(format!(
                "set has length {} but record size is {}",
                set.len(),
                self.size
            )));
        }
        validate_ascending(set)?;

        let Some((var_part, _)) = self.split(set) else {
            return Ok(false);
        };
        if self.cells.is_empty() {
            return Ok(false);
        }
        let idx = self.cell_index(var_part);
        let prev = self.cells[idx].fetch_or(mask, Ordering::Relaxed);
        Ok(prev & mask != mask)
    }

    /// Atomically reads the cell for `set`. Returns `0` if `set` falls
    /// outside the addressable range (mirrors `mark`'s skip semantics).
    pub fn get(&self, set: &[u64]) -> u8 {
        match self.split(set) {
            Some((var_part, _)) if !self.cells.is_empty() => {
                self.cells[self.cell_index(var_part)].load(Ordering::Relaxed)
            }
            _ => 0,
        }
    }

    fn matches(mask: u8, bits: u8, b: u8) -> bool {
        if mask != 0 {
            (b & mask) == (bits & mask)
        } else if bits != 0 {
            (b & bits) != 0
        } else {
            true
        }
    }

    /// Scans cells in strictly increasing combinadic index order, invoking
    /// `callback(set, size, cell_byte)` for every cell whose byte matches the
    /// predicate derived from `mask`/`bits`. Returns the
    /// number of matches. `progress_slot`, if given, is bumped every
    /// [`PERIOD`] cells visited (not matched).
    pub fn query(
        &self,
        mask: u8,
        bits: u8,
        progress_slot: Option<&std::sync::atomic::AtomicU64>,
        mut callback: impl FnMut(&[u64], usize, u8),
    ) -> u64 {
        let mut matches = 0u64;
        let mut buf = Vec::with_capacity(self.var_size);
        if self.var_size > 0 {
            buf.resize(self.var_size, 0);
            combinadic::set_from_index(self.var_size, self.base_offset, &mut buf);
        }
        buf.extend_from_slice(&self.fixed_values);

        for (i, cell) in self.cells.iter().enumerate() {
            if i != 0 && self.var_size > 0 {
                combinadic::advance(&mut buf[..self.var_size], self.var_size, 1);
            }
            let b = cell.load(Ordering::Relaxed);
            if Self::matches(mask, bits, b) {
                callback(&buf, self.size, b);
                matches += 1;
            }
            if let Some(slot) = progress_slot {
                if (i as u64 + 1) % PERIOD == 0 {
                    slot.store(i as u64 + 1, Ordering::Relaxed);
                }
            }
        }
        matches
    }

    /// Same as [`Self::query`], but visits only cells `i` with `i mod
    /// concurrents == worker_mod`, starting from `worker_mod`. Every cell in
    /// `[0, total)` is visited by exactly one worker across the full set of
    /// `worker_mod ∈ [0, concurrents)`; callback invocation order across
    /// workers is unspecified, but strictly increasing within one worker.
    #[allow(clippy::too_many_arguments)]
    pub fn query_parallel(
        &self,
        mask: u8,
        bits: u8,
        concurrents: u64,
        worker_mod: u64,
        progress_slot: Option<&std::sync::atomic::AtomicU64>,
        mut callback: impl FnMut(&[u64], usize, u8),
    ) -> u64 {
        assert!(concurrents > 0, "concurrents must be >= 1");
        assert!(worker_mod < concurrents, "worker_mod must be < concurrents");

        let total = self.cells.len() as u64;
        if worker_mod >= total {
            return 0;
        }
        let mut matches = 0u64;
        let mut buf = Vec::with_capacity(self.var_size);
        if self.var_size > 0 {
            buf.resize(self.var_size, 0);
            combinadic::set_from_index(self.var_size, self.base_offset + worker_mod, &mut buf);
        }
        buf.extend_from_slice(&self.fixed_values);

        let mut i = worker_mod;
        let mut visited_since_mark = 0u64;
        let mut first = true;
        while i < total {
            if !first && self.var_size > 0 {
                combinadic::advance(&mut buf[..self.var_size], self.var_size, concurrents);
            }
            first = false;
            let b = self.cells[i as usize].load(Ordering::Relaxed);
            if Self::matches(mask, bits, b) {
                callback(&buf, self.size, b);
                matches += 1;
            }
            visited_since_mark += 1;
            if let Some(slot) = progress_slot {
                if visited_since_mark % PERIOD == 0 {
                    slot.fetch_add(PERIOD, Ordering::Relaxed);
                }
            }
            i += concurrents;
        }
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_normalizes_min_m() {
        let mut sr = SetRecord::initialize(3);
        sr.allocate(3, 0, 10, &[]).unwrap();
        assert_eq!(sr.get_min_m(), 3);
    }

    #[test]
    fn allocate_rejects_size_mismatch() {
        let mut sr = SetRecord::initialize(3);
        assert!(sr.allocate(2, 1, 10, &[]).is_err());
    }

    #[test]
    fn allocate_rejects_bad_fixed_values() {
        let mut sr = SetRecord::initialize(4);
        assert!(sr.allocate(2, 1, 5, &[3, 2]).is_err()); // not ascending
        assert!(sr.allocate(2, 1, 5, &[4, 6]).is_err()); // first <= max_m
        assert!(sr.allocate(2, 1, 5, &[6, 7]).is_ok());
    }

    #[test]
    fn mark_is_idempotent() {
        let mut sr = SetRecord::initialize(3);
        sr.allocate(3, 1, 10, &[]).unwrap();
        let set = [1u64, 4, 6];
        assert!(sr.mark(&set, NULLIFIABLE).unwrap());
        assert!(!sr.mark(&set, NULLIFIABLE).unwrap());
        assert_eq!(sr.get(&set), NULLIFIABLE);
    }

    #[test]
    fn mark_skips_out_of_range_m_value() {
        let mut sr = SetRecord::initialize(3);
        sr.allocate(3, 1, 5, &[]).unwrap();
        let set = [1u64, 2, 9]; // M-value 9 > max_m 5
        assert!(!sr.mark(&set, NULLIFIABLE).unwrap());
        assert_eq!(sr.get(&set), 0);
    }

    #[test]
    fn mark_rejects_malformed_set() {
        let mut sr = SetRecord::initialize(3);
        sr.allocate(3, 1, 10, &[]).unwrap();
        assert!(sr.mark(&[3, 2, 1], NULLIFIABLE).is_err());
        assert!(sr.mark(&[1, 2], NULLIFIABLE).is_err());
    }

    #[test]
    fn query_visits_in_increasing_order_and_counts_matches() {
        let mut sr = SetRecord::initialize(3);
        sr.allocate(3, 1, 6, &[]).unwrap();
        sr.mark(&[1, 4, 6], NULLIFIABLE).unwrap();
        sr.mark(&[2, 3, 5], NULLIFIABLE | ONLY_SUPERSET).unwrap();

        let mut seen = Vec::new();
        let count = sr.query(MARKED, NULLIFIABLE, None, |set, _size, b| {
            seen.push((set.to_vec(), b));
        });
        assert_eq!(count, 1);
        assert_eq!(seen, vec![(vec![1, 4, 6], NULLIFIABLE)]);

        let mut all = Vec::new();
        let count_any = sr.query(0, 0, None, |set, _, _| all.push(set.to_vec()));
        assert_eq!(count_any as usize, sr.get_total());
        // Strictly increasing combinadic order.
        let idxs: Vec<u64> = all.iter().map(|s| combinadic::index_of(s)).collect();
        assert!(idxs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn query_parallel_covers_every_cell_exactly_once() {
        let mut sr = SetRecord::initialize(3);
        sr.allocate(3, 1, 9, &[]).unwrap();
        sr.mark(&[1, 4, 6], NULLIFIABLE).unwrap();
        sr.mark(&[1, 4, 9], NULLIFIABLE).unwrap();
        sr.mark(&[5, 7, 9], NULLIFIABLE).unwrap();

        let workers = 4u64;
        let mut visited = std::collections::HashSet::new();
        for w in 0..workers {
            sr.query_parallel(0, 0, workers, w, None, |set, _, _| {
                assert!(visited.insert(combinadic::index_of(set)));
            });
        }
        assert_eq!(visited.len(), sr.get_total());
    }

    #[test]
    fn fixed_suffix_round_trips() {
        let mut sr = SetRecord::initialize(4);
        sr.allocate(2, 1, 5, &[7, 9]).unwrap();
        let set = [1u64, 3, 7, 9];
        assert!(sr.mark(&set, NULLIFIABLE).unwrap());
        assert_eq!(sr.get(&set), NULLIFIABLE);
        // A different fixed suffix is out of range for this record.
        assert_eq!(sr.get(&[1, 3, 7, 10]), 0);
    }
}
