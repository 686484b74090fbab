//! # Expression Matrix
//!
//! Genes x conditions matrix read from GCT. Values are stored column-major so
//! that scoring one condition walks one contiguous slice.
//!
//! Only binary (0/1) matrices can be scored. For those, per-condition
//! success counts and probabilities are computed once up front and then
//! shared read-only with every worker.

use std::sync::Arc;

use crate::data::gene::{GeneIdx, Genes, MAX_GENES};
use crate::error::{EnrichError, Result};

/// Gene x condition values
#[derive(Clone, Debug)]
pub struct ExpressionMatrix {
    /// Row metadata (one gene per row)
    genes: Arc<Genes>,
    /// Condition (column) names
    conditions: Vec<String>,
    /// Values, column-major: `values[col * n_genes + row]`
    values: Vec<f64>,
}

impl ExpressionMatrix {
    /// Build from row-major rows as they appear in a GCT file.
    pub fn from_rows(genes: Genes, conditions: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_genes = genes.len();
        let n_cols = conditions.len();
        if n_genes > MAX_GENES {
            return Err(EnrichError::invalid_data(format!(
                "{} genes exceeds the limit of {}",
                n_genes, MAX_GENES
            )));
        }
        if rows.len() != n_genes {
            return Err(EnrichError::invalid_data(format!(
                "{} gene names but {} data rows",
                n_genes,
                rows.len()
            )));
        }

        let mut values = vec![0.0; n_genes * n_cols];
        for (r, row) in rows.iter().enumerate() {
            if row.len() != n_cols {
                return Err(EnrichError::invalid_data(format!(
                    "row {} ({}) has {} values, expected {}",
                    r,
                    &genes[GeneIdx::new(r as u32)],
                    row.len(),
                    n_cols
                )));
            }
            for (c, &v) in row.iter().enumerate() {
                values[c * n_genes + r] = v;
            }
        }

        Ok(Self {
            genes: Arc::new(genes),
            conditions,
            values,
        })
    }

    /// Number of genes (rows)
    pub fn n_genes(&self) -> usize {
        self.genes.len()
    }

    /// Number of conditions (columns)
    pub fn n_conditions(&self) -> usize {
        self.conditions.len()
    }

    pub fn genes(&self) -> &Arc<Genes> {
        &self.genes
    }

    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    /// All values of one condition, indexed by `GeneIdx`
    #[inline]
    pub fn column(&self, col: usize) -> &[f64] {
        let n = self.n_genes();
        &self.values[col * n..(col + 1) * n]
    }

    #[inline]
    pub fn get(&self, gene: GeneIdx, col: usize) -> f64 {
        self.values[col * self.n_genes() + gene.as_usize()]
    }

    /// True when every value is exactly 0 or 1.
    pub fn is_binary(&self) -> bool {
        self.values.iter().all(|&v| v == 0.0 || v == 1.0)
    }

    /// Condition names not present among the matrix columns.
    pub fn missing_conditions<'a, I>(&self, requested: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        requested
            .into_iter()
            .filter(|name| !self.conditions.contains(name))
            .cloned()
            .collect()
    }

    /// Per-condition success statistics. Fails for non-binary matrices.
    pub fn binary_stats(&self) -> Result<BinaryStats> {
        if self.n_genes() == 0 || self.n_conditions() == 0 {
            return Err(EnrichError::invalid_data("expression matrix is empty"));
        }
        if !self.is_binary() {
            return Err(EnrichError::unsupported_expression(
                "values other than 0 and 1 found; only binary matrices can be scored",
            ));
        }
        Ok(BinaryStats::from_matrix(self))
    }
}

/// Success count and empirical success probability for every condition
#[derive(Clone, Debug)]
pub struct BinaryStats {
    successes: Vec<u64>,
    probs: Vec<f64>,
}

impl BinaryStats {
    fn from_matrix(matrix: &ExpressionMatrix) -> Self {
        let n_genes = matrix.n_genes() as f64;
        let successes: Vec<u64> = (0..matrix.n_conditions())
            .map(|c| matrix.column(c).iter().filter(|&&v| v > 0.0).count() as u64)
            .collect();
        let probs = successes.iter().map(|&n| n as f64 / n_genes).collect();
        Self { successes, probs }
    }

    /// Number of active genes in condition `col`
    #[inline]
    pub fn successes(&self, col: usize) -> u64 {
        self.successes[col]
    }

    /// Fraction of all genes active in condition `col`
    #[inline]
    pub fn prob(&self, col: usize) -> f64 {
        self.probs[col]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genes(n: usize) -> Genes {
        Genes::from_names((0..n).map(|i| format!("g{}", i)).collect())
    }

    #[test]
    fn test_column_major_layout() {
        let m = ExpressionMatrix::from_rows(
            genes(3),
            vec!["a".into(), "b".into()],
            vec![vec![1.0, 0.0], vec![0.0, 0.0], vec![1.0, 1.0]],
        )
        .unwrap();
        assert_eq!(m.column(0), &[1.0, 0.0, 1.0]);
        assert_eq!(m.column(1), &[0.0, 0.0, 1.0]);
        assert_eq!(m.get(GeneIdx::new(2), 1), 1.0);
    }

    #[test]
    fn test_binary_stats() {
        let m = ExpressionMatrix::from_rows(
            genes(4),
            vec!["a".into(), "b".into()],
            vec![vec![1.0, 0.0], vec![1.0, 0.0], vec![0.0, 0.0], vec![1.0, 1.0]],
        )
        .unwrap();
        let stats = m.binary_stats().unwrap();
        assert_eq!(stats.successes(0), 3);
        assert_eq!(stats.successes(1), 1);
        assert!((stats.prob(0) - 0.75).abs() < 1e-12);
        assert!((stats.prob(1) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_continuous_rejected() {
        let m = ExpressionMatrix::from_rows(
            genes(2),
            vec!["a".into()],
            vec![vec![0.5], vec![3.2]],
        )
        .unwrap();
        assert!(!m.is_binary());
        assert!(matches!(
            m.binary_stats(),
            Err(EnrichError::UnsupportedExpression { .. })
        ));
    }

    #[test]
    fn test_non_binary_later_column_rejected() {
        let m = ExpressionMatrix::from_rows(
            genes(2),
            vec!["a".into(), "b".into()],
            vec![vec![1.0, 0.0], vec![0.0, 2.5]],
        )
        .unwrap();
        assert!(!m.is_binary());
        assert!(matches!(
            m.binary_stats(),
            Err(EnrichError::UnsupportedExpression { .. })
        ));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = ExpressionMatrix::from_rows(
            genes(2),
            vec!["a".into(), "b".into()],
            vec![vec![0.0, 1.0], vec![1.0]],
        );
        assert!(matches!(err, Err(EnrichError::InvalidData { .. })));
    }

    #[test]
    fn test_missing_conditions() {
        let m = ExpressionMatrix::from_rows(
            genes(1),
            vec!["liver".into(), "lung".into()],
            vec![vec![0.0, 1.0]],
        )
        .unwrap();
        let requested = vec!["lung".to_string(), "brain".to_string()];
        assert_eq!(m.missing_conditions(&requested), vec!["brain".to_string()]);
    }
}
