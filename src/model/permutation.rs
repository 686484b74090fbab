//! # Permutation Engine
//!
//! Per condition:
//! 1. Score the user's genesets.
//! 2. If that score is `<= 0`, report `p = 1` without simulation.
//! 3. Otherwise score `trials` size-matched null SNP sets in parallel and
//!    count those scoring at least as high (ties count as hits).
//! 4. `p = hits / trials`.
//!
//! Conditions run one after another in column order; the trials of one
//! condition are split into fixed blocks that run on the rayon pool. Each
//! block owns a generator seeded from `(seed, column, block)` and a private
//! hit count, and block counts are reduced with a sum. Results therefore
//! depend only on the seed, never on thread count or scheduling.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::{debug, info_span};

use crate::data::expression::{BinaryStats, ExpressionMatrix};
use crate::error::{EnrichError, Result};
use crate::model::geneset_catalog::{GenesetBins, UserGenesets};
use crate::model::null_sampler;
use crate::model::scoring::ColumnScorer;
use crate::utils::telemetry::TelemetryBlackboard;

/// Trials per parallel task
pub const TRIAL_BLOCK: usize = 64;

/// Outcome of the permutation test for one condition
#[derive(Clone, Debug, PartialEq)]
pub struct PermutationResult {
    pub condition: String,
    pub pvalue: f64,
    /// Null SNP sets scoring at least the observed score
    pub nulls_observed: usize,
    /// Null SNP sets scored; zero when the test was skipped
    pub nulls_tested: usize,
}

impl PermutationResult {
    /// Result for a condition whose observed score cannot be exceeded meaningfully.
    fn vacuous(condition: &str) -> Self {
        Self {
            condition: condition.to_string(),
            pvalue: 1.0,
            nulls_observed: 0,
            nulls_tested: 0,
        }
    }
}

/// Runs the permutation test over every condition of a binary matrix
pub struct PermutationEngine<'a> {
    matrix: &'a ExpressionMatrix,
    stats: &'a BinaryStats,
    user: &'a UserGenesets,
    bins: &'a GenesetBins,
    trials: usize,
    seed: u64,
}

impl<'a> PermutationEngine<'a> {
    /// Fails with `Config` if `trials` is zero, and with `EmptyBin` if any
    /// user geneset size has nothing to resample.
    pub fn new(
        matrix: &'a ExpressionMatrix,
        stats: &'a BinaryStats,
        user: &'a UserGenesets,
        bins: &'a GenesetBins,
        trials: usize,
        seed: u64,
    ) -> Result<Self> {
        if trials == 0 {
            return Err(EnrichError::config("at least one null SNP set must be tested"));
        }
        bins.validate(user.sizes())?;
        Ok(Self {
            matrix,
            stats,
            user,
            bins,
            trials,
            seed,
        })
    }

    /// Test every condition in column order.
    pub fn run(&self, telemetry: Option<&TelemetryBlackboard>) -> Vec<PermutationResult> {
        let n_cols = self.matrix.n_conditions();
        if let Some(t) = telemetry {
            t.set_total_columns(n_cols as u64);
        }

        (0..n_cols)
            .map(|col| {
                let result = self.run_column(col);
                if let Some(t) = telemetry {
                    t.column_done(result.nulls_tested as u64);
                }
                result
            })
            .collect()
    }

    /// Test a single condition.
    pub fn run_column(&self, col: usize) -> PermutationResult {
        let condition = &self.matrix.conditions()[col];
        let _span = info_span!("permute_column", col, condition = condition.as_str()).entered();

        let scorer = ColumnScorer::new(col, self.matrix, self.stats);
        let observed = scorer.score(self.user.genesets());
        if observed <= 0.0 {
            debug!(condition = condition.as_str(), "observed score is zero; skipping");
            return PermutationResult::vacuous(condition);
        }

        let hits = self.count_hits(&scorer, observed, col);
        let result = PermutationResult {
            condition: condition.clone(),
            pvalue: hits as f64 / self.trials as f64,
            nulls_observed: hits,
            nulls_tested: self.trials,
        };
        debug!(
            condition = condition.as_str(),
            observed,
            hits,
            pvalue = result.pvalue,
            "column tested"
        );
        result
    }

    /// Null SNP sets (out of `self.trials`) scoring at least `observed`.
    fn count_hits(&self, scorer: &ColumnScorer<'_>, observed: f64, col: usize) -> usize {
        let n_blocks = self.trials.div_ceil(TRIAL_BLOCK);
        let sizes = self.user.sizes();

        (0..n_blocks)
            .into_par_iter()
            .map(|block| {
                let mut rng = StdRng::seed_from_u64(block_seed(self.seed, col, block));
                let n_trials = TRIAL_BLOCK.min(self.trials - block * TRIAL_BLOCK);
                let mut hits = 0usize;
                for _ in 0..n_trials {
                    let null_set = null_sampler::sample(sizes, self.bins, &mut rng);
                    if scorer.score(null_set) >= observed {
                        hits += 1;
                    }
                }
                hits
            })
            .sum()
    }
}

/// Seed for one block of trials.
#[inline]
fn block_seed(seed: u64, col: usize, block: usize) -> u64 {
    seed ^ (col as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (block as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F).rotate_left(31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::gene::{GeneIdx, GeneSet, Genes};
    use crate::data::interval::{GenomicInterval, VariantIntervals};
    use crate::model::interval_index::IntervalIndex;
    use std::collections::BTreeSet;

    /// 40 genes laid end to end on chr1 (gene i at [i*100, i*100+100)), two
    /// background SNPs per gene, and three conditions:
    /// - `hot`: genes 0..4 active
    /// - `cold`: no genes active
    /// - `spread`: every other gene active
    struct Fixture {
        matrix: ExpressionMatrix,
        stats: BinaryStats,
        user: UserGenesets,
        bins: GenesetBins,
    }

    fn fixture() -> Fixture {
        let n = 40usize;
        let genes = Genes::from_names((0..n).map(|i| format!("g{}", i)).collect());
        let rows = (0..n)
            .map(|i| {
                vec![
                    if i < 4 { 1.0 } else { 0.0 },
                    0.0,
                    if i % 2 == 0 { 1.0 } else { 0.0 },
                ]
            })
            .collect();
        let matrix = ExpressionMatrix::from_rows(
            genes,
            vec!["hot".into(), "cold".into(), "spread".into()],
            rows,
        )
        .unwrap();
        let stats = matrix.binary_stats().unwrap();

        let index = IntervalIndex::build(
            (0..n as u64).map(|i| ("chr1".to_string(), i * 100, i * 100 + 100, GeneIdx::new(i as u32))),
        );
        let mut variants = VariantIntervals::new();
        for i in 0..n as u64 {
            variants.insert(format!("a{}", i), GenomicInterval::new("chr1", i * 100 + 10, i * 100 + 11));
            variants.insert(format!("b{}", i), GenomicInterval::new("chr1", i * 100 + 50, i * 100 + 51));
        }

        let user_sets: Vec<GeneSet> = (0..4).map(|i| vec![GeneIdx::new(i)]).collect();
        let user = UserGenesets::from_genesets(user_sets, 10);
        let bins = GenesetBins::build(&variants, &index, 0, &user.distinct_sizes(), 10);

        Fixture {
            matrix,
            stats,
            user,
            bins,
        }
    }

    fn engine(f: &Fixture, trials: usize, seed: u64) -> PermutationEngine<'_> {
        PermutationEngine::new(&f.matrix, &f.stats, &f.user, &f.bins, trials, seed).unwrap()
    }

    #[test]
    fn test_vacuous_column() {
        let f = fixture();
        let result = engine(&f, 100, 1).run_column(1);
        assert_eq!(result.condition, "cold");
        assert_eq!(result.pvalue, 1.0);
        assert_eq!(result.nulls_observed, 0);
        assert_eq!(result.nulls_tested, 0);
    }

    #[test]
    fn test_enriched_column_has_small_pvalue() {
        let f = fixture();
        let result = engine(&f, 1000, 3).run_column(0);
        assert_eq!(result.nulls_tested, 1000);
        // All four user genes are active; a null set hits that only with
        // probability (4/40)^4.
        assert!(result.pvalue < 0.01, "pvalue = {}", result.pvalue);
    }

    #[test]
    fn test_bounds_hold_for_every_column() {
        let f = fixture();
        let trials = 130; // not a multiple of the block size
        for r in engine(&f, trials, 11).run(None) {
            assert!((0.0..=1.0).contains(&r.pvalue));
            assert!(r.nulls_observed <= r.nulls_tested);
            assert!(r.nulls_tested == 0 || r.nulls_tested == trials);
            if r.nulls_tested > 0 {
                assert_eq!(r.pvalue, r.nulls_observed as f64 / trials as f64);
            }
        }
    }

    #[test]
    fn test_results_in_column_order() {
        let f = fixture();
        let names: Vec<String> = engine(&f, 10, 0).run(None).into_iter().map(|r| r.condition).collect();
        assert_eq!(names, vec!["hot", "cold", "spread"]);
    }

    #[test]
    fn test_seeded_runs_repeat_across_thread_counts() {
        let f = fixture();
        let run_with = |threads: usize| {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build().unwrap();
            pool.install(|| engine(&f, 500, 2024).run(None))
        };
        let single = run_with(1);
        let multi = run_with(4);
        assert_eq!(single, multi);
    }

    #[test]
    fn test_ties_count_as_hits() {
        // Every background geneset is identical to the user's, so every null
        // set ties the observed score.
        let f = fixture();
        let genes = f.matrix.genes().as_ref().clone();
        let matrix = ExpressionMatrix::from_rows(
            genes,
            vec!["c".into()],
            (0..40).map(|i| vec![if i == 0 { 1.0 } else { 0.0 }]).collect(),
        )
        .unwrap();
        let stats = matrix.binary_stats().unwrap();
        let user = UserGenesets::from_genesets(vec![vec![GeneIdx::new(0)]], 10);

        let index = IntervalIndex::build(vec![("chr1".to_string(), 0, 100, GeneIdx::new(0))]);
        let mut variants = VariantIntervals::new();
        variants.insert("x".into(), GenomicInterval::new("chr1", 5, 6));
        let bins = GenesetBins::build(&variants, &index, 0, &user.distinct_sizes(), 10);

        let engine = PermutationEngine::new(&matrix, &stats, &user, &bins, 50, 5).unwrap();
        let result = engine.run_column(0);
        assert_eq!(result.nulls_observed, 50);
        assert_eq!(result.pvalue, 1.0);
    }

    #[test]
    fn test_missing_bin_is_fatal() {
        let f = fixture();
        let user = UserGenesets::from_genesets(vec![vec![GeneIdx::new(0), GeneIdx::new(1)]], 10);
        let needed: BTreeSet<usize> = [1].into_iter().collect();
        let index = IntervalIndex::build(vec![("chr1".to_string(), 0, 100, GeneIdx::new(0))]);
        let mut variants = VariantIntervals::new();
        variants.insert("x".into(), GenomicInterval::new("chr1", 5, 6));
        let bins = GenesetBins::build(&variants, &index, 0, &needed, 10);

        let err = PermutationEngine::new(&f.matrix, &f.stats, &user, &bins, 10, 0);
        assert!(matches!(err, Err(EnrichError::EmptyBin { size: 2 })));
    }

    #[test]
    fn test_zero_trials_rejected() {
        let f = fixture();
        assert!(matches!(
            PermutationEngine::new(&f.matrix, &f.stats, &f.user, &f.bins, 0, 1),
            Err(EnrichError::Config { .. })
        ));
        let result = engine(&f, 1, 1).run_column(0);
        assert!((0.0..=1.0).contains(&result.pvalue));
        assert_eq!(result.nulls_tested, 1);
    }

    #[test]
    fn test_block_seeds_differ() {
        let seeds: BTreeSet<u64> = (0..4)
            .flat_map(|col| (0..16).map(move |block| block_seed(99, col, block)))
            .collect();
        assert_eq!(seeds.len(), 64);
    }
}
