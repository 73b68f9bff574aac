//! # Combinadic — Bijection Between N-Subsets and Integer Indices
//!
//! Implements the Combinatorial Number System (CNS) bijection `φ` between an
//! `n`-element strictly-ascending subset of positive integers and a dense
//! integer index, ordered lexicographically on the *reversed* tuple (highest
//! value most significant). This is what lets [`crate::set_record::SetRecord`]
//! address every `n`-subset of `[1, M]` with a single flat byte array instead
//! of a hash map keyed by the tuple itself.
//!
//! ## Definition
//!
//! For a set `(x_1, …, x_n)` with `1 ≤ x_1 < … < x_n`:
//!
//! ```text
//! φ((x_1, …, x_n)) = Σ_{k=1..n} C(x_k − 1, k)
//! ```
//!
//! where `C(a, b)` is the binomial coefficient, taken to be 0 when `a < b`.
//! The inverse is computed greedily from the most significant component
//! down: at each step, find the largest `i` such that `C(i, vals) ≤
//! remainder`, emit `i + 1`, and subtract `C(i, vals)` from the remainder.
//!
//! ## References
//!
//! James McCaffrey, "Generating the mth Lexicographical Element of a
//! Mathematical Combination", MSDN Library, 2004 (the standard reference for
//! the Combinatorial Number System used here).

use crate::error::{Error, Result};

/// `C(m, n)`, the binomial coefficient, computed with a 64-bit accumulator.
///
/// Returns 0 when `m < n` (no such combination exists) rather than erroring,
/// since out-of-domain binomial coefficients arise routinely at the edges of
/// the `[min_m, max_m]` window. Callers are responsible for keeping `m, n`
/// within a range where the
/// true value fits in `u64` — this is an internal combinatorial-index
/// primitive, not a general-purpose bignum routine, and the expected ranges
/// (`M` up to a few hundred, `N` up to a few dozen) never approach overflow.
pub fn mcn(m: u64, n: u64) -> u64 {
    if n > m {
        return 0;
    }
    let n = n.min(m - n);
    let mut result: u64 = 1;
    for i in 0..n {
        result = result
            .checked_mul(m - i)
            .expect("mcn: multiplication overflow — m, n out of expected range")
            / (i + 1);
    }
    result
}

/// Computes `φ(set)`, the combinadic index of an ascending set of positive
/// integers. No precondition failure mode: callers are trusted to pass a
/// strictly ascending slice of values `≥ 1` (higher-level callers such as
/// [`crate::set_record::SetRecord::mark`] validate this at the public
/// boundary before calling in).
pub fn index_of(set: &[u64]) -> u64 {
    let mut index = 0u64;
    for (k, &x) in set.iter().enumerate() {
        let k = (k + 1) as u64;
        index += mcn(x - 1, k);
    }
    index
}

/// Writes the unique `n`-element set with `φ(set) = k` into `out`.
///
/// `out` must have length `n`. Uses the greedy top-down decomposition: for
/// each position from `n` down to `1`, finds the largest `i` with
/// `C(i, vals) ≤ remainder`, sets that element to `i + 1`, and subtracts
/// `C(i, vals)` from the remainder.
pub fn set_from_index(n: usize, k: u64, out: &mut [u64]) {
    assert_eq!(out.len(), n, "set_from_index: output buffer must have length n");
    let mut remainder = k;
    for vals in (1..=n).rev() {
        let mut i = (vals - 1) as u64;
        loop {
            let candidate = mcn(i + 1, vals as u64);
            if candidate > remainder {
                break;
            }
            i += 1;
        }
        out[vals - 1] = i + 1;
        remainder -= mcn(i, vals as u64);
    }
}

/// Advances `set` in place to the set whose index is `φ(set) + k`.
///
/// Amortized O(n) for small `k`. The low element (position 0, lowest value)
/// is the one that moves on every step; when it has enough headroom before
/// colliding with the element above it, this is a single increment. When it
/// doesn't, the carry ripples upward through as many positions as needed —
/// each candidate carry position is checked against *its own* ceiling, since
/// incrementing it by one may itself collide with the position above — until
/// it lands on a position with room. Every position below the landing point
/// is then reset to the canonical prefix `(1, 2, …)`, the consumed quantum is
/// subtracted from `k`, and position 0 (now canonical) resumes absorbing
/// whatever of `k` remains.
pub fn advance(set: &mut [u64], n: usize, mut k: u64) {
    assert_eq!(set.len(), n, "advance: set buffer must have length n");
    if k == 0 || n == 0 {
        return;
    }
    loop {
        let ceiling = if n > 1 { set[1] } else { u64::MAX };
        let avail = ceiling - set[0] - 1;
        if k <= avail {
            set[0] += k;
            return;
        }
        k -= avail + 1;

        let mut carry_pos = 1;
        loop {
            if carry_pos == n - 1 {
                set[carry_pos] += 1;
                break;
            }
            if set[carry_pos] + 1 < set[carry_pos + 1] {
                set[carry_pos] += 1;
                break;
            }
            carry_pos += 1;
        }
        for i in 0..carry_pos {
            set[i] = (i + 1) as u64;
        }
        if k == 0 {
            return;
        }
    }
}

/// Validates that `set` is strictly ascending and every element is `≥ 1`.
/// Returns [`Error::InvalidArgs`] on violation; this is the shared
/// precondition check used by [`crate::set_record::SetRecord::mark`]. Range
/// checks against a specific upper bound (e.g. `M`) are the caller's
/// business — `mark` deliberately treats an out-of-window M-value as a
/// no-op skip rather than a validation failure (see [`mcn`] docs).
pub fn validate_ascending(set: &[u64]) -> Result<()> {
    if set.is_empty() {
        return Ok(());
    }
    if set[0] < 1 {
        return Err(Error::InvalidArgs(format!("element {} must be >= 1", set[0])));
    }
    for w in set.windows(2) {
        if w[0] >= w[1] {
            return Err(Error::InvalidArgs(format!(
                "set not strictly ascending at {} >= {}",
                w[0], w[1]
            )));
        }
    }
    Ok(())
}

/// Validates that `set` is strictly ascending, `≥ 1`, and every element is
/// `≤ max`. Used at the boundaries that work against a hard global ceiling
/// `M` (e.g. [`crate::expansion::expand`]'s precondition).
pub fn validate_bounded(set: &[u64], max: u64) -> Result<()> {
    validate_ascending(set)?;
    if let Some(&last) = set.last() {
        if last > max {
            return Err(Error::InvalidArgs(format!(
                "element {last} out of range [1, {max}]"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mcn_matches_pascal_triangle() {
        assert_eq!(mcn(5, 0), 1);
        assert_eq!(mcn(5, 5), 1);
        assert_eq!(mcn(5, 2), 10);
        assert_eq!(mcn(4, 2), 6);
        assert_eq!(mcn(2, 5), 0);
    }

    #[test]
    fn index_of_known_values() {
        // First 3-subset in CNS order is {1, 2, 3} -> index 0.
        assert_eq!(index_of(&[1, 2, 3]), 0);
        // Single-element sets: index_of({x}) = C(x-1, 1) = x-1.
        assert_eq!(index_of(&[1]), 0);
        assert_eq!(index_of(&[5]), 4);
    }

    #[test]
    fn round_trip_small_sets() {
        let n = 3;
        for k in 0..200u64 {
            let mut buf = vec![0u64; n];
            set_from_index(n, k, &mut buf);
            assert_eq!(index_of(&buf), k, "round trip failed for k={k}, got {buf:?}");
            // Ascending.
            assert!(buf.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn advance_matches_index_arithmetic() {
        let n = 4;
        let mut set = vec![1u64, 2, 3, 4];
        let start_index = index_of(&set);
        for &k in &[0u64, 1, 5, 37, 100] {
            let mut s = set.clone();
            advance(&mut s, n, k);
            assert_eq!(index_of(&s), start_index + k);
        }
        advance(&mut set, n, 1);
        assert_eq!(set, vec![1, 2, 3, 5]);
    }

    #[test]
    fn advance_carries_across_positions() {
        let n = 3;
        let mut set = vec![1u64, 2, 3]; // index 0
        // Exhaust all sets with top element 3: there's only C(2,2)=1 of them
        // (namely {1,2,3}), so advancing by 1 must carry into top=4.
        advance(&mut set, n, 1);
        assert_eq!(set, vec![1, 2, 4]);
    }

    #[test]
    fn advance_cascades_through_multiple_levels() {
        // {1,2,3} + 3 must ripple through two carries to reach {2,3,4}
        // (the combinadic successor chain is {1,2,4}, {1,3,4}, {2,3,4}).
        let n = 3;
        let mut set = vec![1u64, 2, 3];
        let start = index_of(&set);
        advance(&mut set, n, 3);
        assert_eq!(set, vec![2, 3, 4]);
        assert_eq!(index_of(&set), start + 3);
    }

    #[test]
    fn advance_matches_brute_force_over_many_starts() {
        let n = 4;
        for start_k in 0..80u64 {
            for &step in &[1u64, 2, 7, 15] {
                let mut set = vec![0u64; n];
                set_from_index(n, start_k, &mut set);
                advance(&mut set, n, step);
                let mut expected = vec![0u64; n];
                set_from_index(n, start_k + step, &mut expected);
                assert_eq!(
                    set, expected,
                    "start_k={start_k} step={step} mismatch"
                );
            }
        }
    }

    #[test]
    fn validate_ascending_rejects_bad_input() {
        assert!(validate_ascending(&[1, 2, 3]).is_ok());
        assert!(validate_ascending(&[1, 1, 3]).is_err());
        assert!(validate_ascending(&[3, 2, 1]).is_err());
        assert!(validate_bounded(&[1, 2, 3], 10).is_ok());
        assert!(validate_bounded(&[1, 2, 11], 10).is_err());
    }
}
