//! # Pipeline — Multi-Stage, Multi-Threaded Sweep Driver
//!
//! Composes [`crate::set_record::SetRecord`], [`crate::expansion`], and
//! [`crate::nulltest`] to sweep a `(N, M)` pair completely in memory: base
//! stage → generation stages → verify stage. This is the in-process engine;
//! the four CLI binaries (`create`, `gen`, `weed`, `eval`) implement the
//! same stages one at a time against on-disk `SetRecord` files, which is how
//! a real multi-process sweep is actually driven (`scripts/run_sweep.sh`).
//! `Pipeline` exists so the whole sweep can run — and be tested — without
//! round-tripping through the filesystem between every stage.

use std::sync::Arc;

use crate::error::Result;
use crate::expansion::{self, EquivalentPairs, MUT_ADD, MUT_MUL, SUPERS};
use crate::nulltest::{self, Verdict};
use crate::progress::Progress;
use crate::set_record::{SetRecord, MARKED, NULLIFIABLE, ONLY_SUPERSET};

pub struct PipelineConfig {
    pub n: usize,
    pub m: u64,
    pub threads: usize,
    /// Also re-expand entries marked solely via superset propagation. Off
    /// by default — those expansions were already covered by the smaller
    /// parent at the time it was itself expanded via the generation stage.
    pub thorough: bool,
}

pub struct Pipeline {
    config: PipelineConfig,
    /// `records[s - 3]` is the SR for size `s`, for `s ∈ [3, n]`.
    records: Vec<SetRecord>,
    pairs: EquivalentPairs,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let mut records = Vec::with_capacity(config.n - 2);
        for size in 3..=config.n {
            let mut sr = SetRecord::initialize(size);
            sr.allocate(size, size as u64, config.m, &[])?;
            records.push(sr);
        }
        let pairs = EquivalentPairs::build(config.m);
        Ok(Pipeline {
            config,
            records,
            pairs,
        })
    }

    pub fn record(&self, size: usize) -> &SetRecord {
        &self.records[size - 3]
    }

    /// Runs the full sweep: base stage, then generation stages for
    /// `s ∈ [3, N-1]`, then the verify stage. The `progress` worker count
    /// must equal `config.threads`.
    pub fn run(&self, progress: &Arc<Progress>) -> Result<()> {
        self.base_stage();
        for s in 3..self.config.n {
            self.generation_stage(s, progress)?;
        }
        self.verify_stage(progress)?;
        Ok(())
    }

    /// Seeds every `{v, v}` pseudo-pair through the size-2 arithmetic
    /// expansion, marks the resulting 3-sets nullifiable, and eagerly
    /// propagates each seed's full superset closure up through every
    /// larger size.
    fn base_stage(&self) {
        for v in 1..=self.config.m {
            expansion::expand_base_pair(v, self.config.m, &self.pairs, |set3| {
                if self.record(3).mark(set3, NULLIFIABLE).unwrap_or(false) {
                    self.propagate_supersets(3, set3);
                }
            });
        }
    }

    fn propagate_supersets(&self, size: usize, set: &[u64]) {
        if size >= self.config.n {
            return;
        }
        let mut children: Vec<Vec<u64>> = Vec::new();
        expansion::expand(set, size as u64 + 1, self.config.m, SUPERS, &self.pairs, |t| {
            children.push(t.to_vec());
        })
        .expect("base-stage seeds are always well-formed");
        for child in children {
            if self
                .record(size + 1)
                .mark(&child, NULLIFIABLE | ONLY_SUPERSET)
                .unwrap_or(false)
            {
                self.propagate_supersets(size + 1, &child);
            }
        }
    }

    /// Parallel-scans the size-`s` record for entries that earn
    /// re-expansion, expands each, and marks size-`(s+1)`.
    fn generation_stage(&self, s: usize, progress: &Arc<Progress>) -> Result<()> {
        let (mask, bits) = if self.config.thorough {
            (0u8, MARKED) // any marked entry, including ONLY_SUPERSET-only ones
        } else {
            (MARKED, NULLIFIABLE) // nullifiable but not merely a superset
        };

        let src = self.record(s);
        let dst = self.record(s + 1);
        let threads = self.config.threads.max(1) as u64;

        rayon::scope(|scope| {
            for worker in 0..threads {
                let progress = Arc::clone(progress);
                scope.spawn(move |_| {
                    src.query_parallel(
                        mask,
                        bits,
                        threads,
                        worker,
                        Some(progress.counter(worker as usize)),
                        |set, _size, _b| {
                            expansion::expand(set, 1, self.config.m, SUPERS, &self.pairs, |t| {
                                let _ = dst.mark(t, NULLIFIABLE | ONLY_SUPERSET);
                            })
                            .ok();
                            expansion::expand(
                                set,
                                1,
                                self.config.m,
                                MUT_ADD | MUT_MUL,
                                &self.pairs,
                                |t| {
                                    let _ = dst.mark(t, NULLIFIABLE);
                                },
                            )
                            .ok();
                        },
                    );
                });
            }
        });
        Ok(())
    }

    /// Every cell in the size-N record with `NULLIFIABLE` clear is decided
    /// by the exhaustive test; confirmed nullifiable sets are marked.
    fn verify_stage(&self, progress: &Arc<Progress>) -> Result<()> {
        let n = self.config.n;
        let sr = self.record(n);
        let threads = self.config.threads.max(1) as u64;
        let to_mark: std::sync::Mutex<Vec<Vec<u64>>> = std::sync::Mutex::new(Vec::new());

        rayon::scope(|scope| {
            for worker in 0..threads {
                let progress = Arc::clone(progress);
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

        for set in to_mark.into_inner().unwrap() {
            sr.mark(&set, NULLIFIABLE)?;
        }
        Ok(())
    }

    /// Collects every set in the size-N record with all marked bits clear —
    /// the final innullifiable residue, in combinadic order.
    pub fn innullifiable_sets(&self) -> Vec<Vec<u64>> {
        let sr = self.record(self.config.n);
        let mut out = Vec::new();
        sr.query(MARKED, 0, None, |set, _size, _b| out.push(set.to_vec()));
        out
    }

    pub fn total_for(&self, size: usize) -> usize {
        self.record(size).get_total()
    }
}
