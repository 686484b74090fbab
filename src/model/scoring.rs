//! # Binomial Enrichment Score
//!
//! For one condition with `n` active genes out of `N` (`p = n / N`), each
//! geneset with `k` active members contributes `-log10(Binomial(n, p).pmf(k))`.
//! The score of a SNP set is the sum of its genesets' terms.
//!
//! A non-finite total (a term with zero probability) scores `0.0`.

use std::f64::consts::LN_10;

use statrs::distribution::{Binomial, Discrete};

use crate::data::expression::{BinaryStats, ExpressionMatrix};
use crate::data::gene::GeneIdx;

/// Scores SNP sets against one condition.
///
/// The `-log10` term for every possible `k` is tabulated up front, so scoring a
/// geneset is a count plus a lookup.
#[derive(Clone, Debug)]
pub struct ColumnScorer<'a> {
    column: &'a [f64],
    /// `terms[k]` for `k` in `0..=n`; larger `k` has zero probability
    terms: Vec<f64>,
}

impl<'a> ColumnScorer<'a> {
    pub fn new(col: usize, matrix: &'a ExpressionMatrix, stats: &BinaryStats) -> Self {
        let n = stats.successes(col);
        let terms = match Binomial::new(stats.prob(col), n) {
            Ok(dist) => (0..=n).map(|k| -dist.ln_pmf(k) / LN_10).collect(),
            Err(_) => Vec::new(),
        };
        Self {
            column: matrix.column(col),
            terms,
        }
    }

    /// Number of active genes in `geneset`.
    #[inline]
    pub fn successes(&self, geneset: &[GeneIdx]) -> usize {
        geneset
            .iter()
            .filter(|g| self.column[g.as_usize()] > 0.0)
            .count()
    }

    /// `-log10` binomial probability of `k` active genes.
    #[inline]
    pub fn term(&self, k: usize) -> f64 {
        self.terms.get(k).copied().unwrap_or(f64::INFINITY)
    }

    /// Sum of per-geneset terms, or `0.0` if the sum is not finite.
    pub fn score<I, S>(&self, genesets: I) -> f64
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[GeneIdx]>,
    {
        let total: f64 = genesets
            .into_iter()
            .map(|g| self.term(self.successes(g.as_ref())))
            .sum();
        if total.is_finite() {
            total
        } else {
            0.0
        }
    }
}

/// Score `genesets` against condition `col`.
pub fn score<I, S>(col: usize, genesets: I, matrix: &ExpressionMatrix, stats: &BinaryStats) -> f64
where
    I: IntoIterator<Item = S>,
    S: AsRef<[GeneIdx]>,
{
    ColumnScorer::new(col, matrix, stats).score(genesets)
}
