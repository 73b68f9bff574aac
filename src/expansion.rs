//! # Expansion — Superset and Arithmetic-Mutation Expansion
//!
//! Given a nullifiable set `s` of size `n`, generates all "reachable"
//! nullifiable sets of size `n + 1` within `[1, M]`, by two orthogonal
//! mechanisms:
//!
//! - **Superset expansion**: `s ∪ {v}` for every `v ∈ [1, M] \ s`. Trivially
//!   nullifiable-preserving — a nullifiable set stays nullifiable under
//!   addition of any extra element, since the original reduction sequence
//!   still applies and simply never touches the new element.
//! - **Arithmetic (equivalent-pair) expansion**: for each element `s[i]`,
//!   substitute it with an *equivalent pair* `(a, b)` — two values that
//!   combine back to `s[i]` under one of the four operations — producing a
//!   new size-`(n+1)` set that is nullifiable exactly because `s` was (the
//!   substituted pair can always recombine to reproduce `s[i]` and then
//!   follow `s`'s own reduction).
//!
//! The equivalent-pair table is precomputed once per `(M)` and shared across
//! every expansion call in a run (see [`EquivalentPairs::build`]).

use crate::combinadic::validate_bounded;
use crate::error::Result;

pub const SUPERS: u8 = 1 << 0;
pub const MUT_ADD: u8 = 1 << 1;
pub const MUT_MUL: u8 = 1 << 2;

/// Whether a pair `(a, b)` was found via an additive relation (`a+b=v` or
/// `b-a=v`) or a multiplicative one (`a*b=v` or `b/a=v`), used to gate it
/// behind [`MUT_ADD`] / [`MUT_MUL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PairKind {
    Additive,
    Multiplicative,
}

#[derive(Debug, Clone, Copy)]
struct Pair {
    a: u64,
    b: u64,
    kind: PairKind,
}

/// Precomputed equivalent-pair table: `pairs[v - 1]` holds every
/// `(a, b)` with `1 ≤ a < b ≤ M`, `a ≠ v`, `b ≠ v`, such that one of
/// `a+b=v`, `b−a=v`, `a·b=v`, `b/a=v` (exact division) holds.
///
/// Bounded by `3M/2 − 5` entries per value for `M > 5`.
pub struct EquivalentPairs {
    max_m: u64,
    pairs: Vec<Vec<Pair>>,
}

impl EquivalentPairs {
    /// Builds the table for `v ∈ [1, max_m]`, enumerating:
    ///
    /// - `(a, v − a)` for `a ∈ [1, v/2]` (additive, sum)
    /// - `(a, v + a)` for `a ∈ [1, M − v]` (additive, difference)
    /// - `(d, v/d)` for divisors `d ∈ [2, √v]` with `v mod d = 0` (multiplicative, quotient)
    /// - `(d, v·d)` for `d ∈ [2, M/v]` (multiplicative, product)
    ///
    /// Pairs where either component equals `v`, or the two components are
    /// equal, are dropped. Stored as `(a, b)` with `a < b`.
    pub fn build(max_m: u64) -> Self {
        let mut pairs: Vec<Vec<Pair>> = vec![Vec::new(); max_m as usize];
        for v in 1..=max_m {
            let slot = &mut pairs[(v - 1) as usize];
            let mut push = |a: u64, b: u64, kind: PairKind| {
                let (a, b) = if a < b { (a, b) } else { (b, a) };
                if a == 0 || a == v || b == v || a == b {
                    return;
                }
                slot.push(Pair { a, b, kind });
            };

            for a in 1..=(v / 2) {
                push(a, v - a, PairKind::Additive);
            }
            for a in 1..=max_m.saturating_sub(v) {
                push(a, v + a, PairKind::Additive);
            }
            let mut d = 2u64;
            while d * d <= v {
                if v % d == 0 {
                    push(d, v / d, PairKind::Multiplicative);
                }
                d += 1;
            }
            if v > 0 {
                let max_d = max_m / v;
                for d in 2..=max_d {
                    push(d, v * d, PairKind::Multiplicative);
                }
            }
        }
        EquivalentPairs { max_m, pairs }
    }

    fn pairs_for(&self, v: u64) -> &[Pair] {
        if v == 0 || v > self.max_m {
            &[]
        } else {
            &self.pairs[(v - 1) as usize]
        }
    }

    /// Total number of stored pairs across all values, exposed for tests
    /// validating the `3M/2 - 5` density bound.
    pub fn total_pairs(&self) -> usize {
        self.pairs.iter().map(|p| p.len()).sum()
    }
}

/// Expands `set` (size `n`) into size-`(n+1)` sets within `[min_m, max_m]`,
/// invoking `callback` for each. `mode_flags` is a bitwise-or of [`SUPERS`],
/// [`MUT_ADD`], [`MUT_MUL`]. Deduplication is implicit in the cursor
/// discipline of superset expansion and the collision check in arithmetic
/// expansion — never via an auxiliary set.
pub fn expand(
    set: &[u64],
    min_m: u64,
    max_m: u64,
    mode_flags: u8,
    pairs: &EquivalentPairs,
    mut callback: impl FnMut(&[u64]),
) -> Result<()> {
    validate_bounded(set, max_m)?;

    if mode_flags & SUPERS != 0 {
        superset_expand(set, max_m, min_m, &mut callback);
    }
    if mode_flags & (MUT_ADD | MUT_MUL) != 0 {
        arithmetic_expand(set, min_m, max_m, mode_flags, pairs, &mut callback);
    }
    Ok(())
}

fn emit_if_in_range(t: &[u64], min_m: u64, max_m: u64, callback: &mut impl FnMut(&[u64])) {
    if let Some(&m_value) = t.last() {
        if m_value >= min_m && m_value <= max_m {
            callback(t);
        }
    }
}

/// Enumerates `s ∪ {v}` for every `v ∈ [1, max_m] \ s`, using an insertion
/// cursor walked alongside `v` so no duplicate-check set is needed: when `v`
/// equals the element just past the cursor, the cursor advances and the
/// value is skipped (it's already in `s`).
fn superset_expand(s: &[u64], max_m: u64, min_m: u64, callback: &mut impl FnMut(&[u64])) {
    let n = s.len();
    let mut t = vec![0u64; n + 1];
    let mut pos = 0usize; // index into s of the next element >= current v

    for v in 1..=max_m {
        if pos < n && s[pos] == v {
            pos += 1;
            continue;
        }
        // Build t = s[..pos] ++ [v] ++ s[pos..], which stays sorted because
        // everything in s[..pos] is < v and everything in s[pos..] is > v.
        t[..pos].copy_from_slice(&s[..pos]);
        t[pos] = v;
        t[pos + 1..].copy_from_slice(&s[pos..]);
        emit_if_in_range(&t, min_m, max_m, callback);
    }
}

/// For each position `i`, for each equivalent pair `(a, b)` of `s[i]`,
/// constructs `(s \ {s[i]}) ∪ {a, b}` if it has no duplicates, merging in
/// linear time and dropping on any collision with a remaining element.
fn arithmetic_expand(
    s: &[u64],
    min_m: u64,
    max_m: u64,
    mode_flags: u8,
    pairs: &EquivalentPairs,
    callback: &mut impl FnMut(&[u64]),
) {
    let n = s.len();
    for i in 0..n {
        let v = s[i];
        let rest: Vec<u64> = s
            .iter()
            .enumerate()
            .filter(|&(k, _)| k != i)
            .map(|(_, &x)| x)
            .collect();

        for pair in pairs.pairs_for(v) {
            let wanted = match pair.kind {
                PairKind::Additive => MUT_ADD,
                PairKind::Multiplicative => MUT_MUL,
            };
            if mode_flags & wanted == 0 {
                continue;
            }
            if rest.binary_search(&pair.a).is_ok() || rest.binary_search(&pair.b).is_ok() {
                continue;
            }
            let mut merged = Vec::with_capacity(n + 1);
            merged.extend_from_slice(&rest);
            merged.push(pair.a);
            merged.push(pair.b);
            merged.sort_unstable();
            emit_if_in_range(&merged, min_m, max_m, callback);
        }
    }
}

/// Base-stage seeding: expands the degenerate pseudo-pair `{v, v}` by
/// substituting one copy of `v` with an equivalent
/// pair `(a, b)`, leaving the other copy of `v` untouched — producing valid
/// ascending 3-sets `{v, a, b}`. Unlike [`expand`], this does not take a real
/// ascending set as input (a two-element set can't contain `v` twice), so it
/// is its own small entry point rather than a call through `expand`.
pub fn expand_base_pair(
    v: u64,
    max_m: u64,
    pairs: &EquivalentPairs,
    mut callback: impl FnMut(&[u64]),
) {
    for pair in pairs.pairs_for(v) {
        let mut triple = [pair.a, v, pair.b];
        triple.sort_unstable();
        if *triple.last().unwrap() <= max_m {
            callback(&triple);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_table_excludes_degenerate_pairs() {
        let table = EquivalentPairs::build(10);
        for v in 1..=10u64 {
            for pair in table.pairs_for(v) {
                assert_ne!(pair.a, v);
                assert_ne!(pair.b, v);
                assert_ne!(pair.a, pair.b);
                assert!(pair.a < pair.b);
            }
        }
    }

    #[test]
    fn pair_table_density_bound() {
        let m = 30u64;
        let table = EquivalentPairs::build(m);
        assert!((table.total_pairs() as u64) <= 3 * m / 2); // generous upper bound, 3M/2 - 5 for M>5
    }

    #[test]
    fn superset_expansion_excludes_existing_members() {
        let s = [2u64, 4, 5];
        let mut out = Vec::new();
        superset_expand(&s, 6, 1, &mut |t| out.push(t.to_vec()));
        let expected: Vec<Vec<u64>> = vec![
            vec![1, 2, 4, 5],
            vec![2, 3, 4, 5],
            vec![2, 4, 5, 6],
        ];
        assert_eq!(out, expected);
    }

    #[test]
    fn superset_expansion_skips_value_already_in_set() {
        let s = [3u64];
        let mut out = Vec::new();
        superset_expand(&s, 6, 1, &mut |t| out.push(t.to_vec()));
        assert!(!out.iter().any(|t| t == &vec![3, 3]));
        assert_eq!(out, vec![vec![1, 3], vec![2, 3], vec![3, 4], vec![3, 5], vec![3, 6]]);
    }

    #[test]
    fn arithmetic_expansion_drops_collisions() {
        let pairs = EquivalentPairs::build(10);
        let s = [2u64, 3, 6]; // 6 = 2*3, but 2 and 3 are both already present
        let mut out = Vec::new();
        arithmetic_expand(&s, 1, 10, MUT_ADD | MUT_MUL, &pairs, &mut |t| out.push(t.to_vec()));
        for t in &out {
            assert_eq!(t.len(), 4);
            let mut sorted = t.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), t.len(), "expansion {t:?} has duplicates");
        }
    }

    #[test]
    fn expansion_soundness_on_known_nullifiable_set() {
        // {1,4,6,8} is innullifiable but {1,2,3} is nullifiable (1+2=3).
        let s = [1u64, 2, 3];
        let pairs = EquivalentPairs::build(9);
        let mut out = Vec::new();
        expand(&s, 1, 9, SUPERS | MUT_ADD | MUT_MUL, &pairs, |t| out.push(t.to_vec())).unwrap();
        for t in &out {
            assert_eq!(crate::nulltest::nullifiable(t), crate::nulltest::Verdict::Nullifiable);
        }
    }
}
