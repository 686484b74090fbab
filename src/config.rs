//! # Configuration Logic
//!
//! CLI argument parsing and validation.
//!
//! ## Example CLI
//! ```bash
//! snpenrich --snps user.txt --expression expr.gct.gz \
//!     --gene-intervals genes.bed.gz --snp-intervals snps.bed.gz \
//!     --null-snps background.txt --out results --slop 10000 --threads 8
//! ```

use std::path::PathBuf;

use clap::Parser;

use crate::error::{EnrichError, Result};
use crate::utils::threading::clamp_threads;

/// Genes at or above this many per SNP share one resampling bin.
pub const DEFAULT_MAX_GENESET_SIZE: usize = 10;

/// Null SNP sets scored per condition.
pub const DEFAULT_TRIALS: usize = 1000;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "snpenrich",
    version,
    about = "Test genes near a SNP set for enrichment of condition-specific expression"
)]
pub struct Config {
    /// SNP names to test (first whitespace-delimited field per line; gzip ok)
    #[arg(long)]
    pub snps: PathBuf,

    /// Expression matrix in GCT 1.2 format; must be binary (0/1)
    #[arg(long)]
    pub expression: PathBuf,

    /// BED file of gene intervals, named as in the expression matrix rows
    #[arg(long = "gene-intervals")]
    pub gene_intervals: PathBuf,

    /// BED file of reference SNP intervals
    #[arg(long = "snp-intervals")]
    pub snp_intervals: PathBuf,

    /// SNP names eligible for null SNP sets
    #[arg(long = "null-snps")]
    pub null_snps: PathBuf,

    /// Optional list of condition names that must be present in the expression matrix
    #[arg(long)]
    pub condition: Option<PathBuf>,

    /// Output directory (created if missing)
    #[arg(long)]
    pub out: PathBuf,

    /// Window added on each side of a SNP that overlaps no gene
    #[arg(long, default_value_t = 10_000)]
    pub slop: u64,

    /// Number of worker threads (default: all cores)
    #[arg(long, alias = "processes")]
    pub threads: Option<usize>,

    /// Null SNP sets tested per condition
    #[arg(long, default_value_t = DEFAULT_TRIALS)]
    pub permutations: usize,

    /// Genesets larger than this are pooled into the largest bin
    #[arg(long = "max-geneset-size", default_value_t = DEFAULT_MAX_GENESET_SIZE)]
    pub max_geneset_size: usize,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Emit span timing events
    #[arg(long)]
    pub profile: bool,
}

impl Config {
    /// Parse command-line arguments and validate them.
    pub fn parse_and_validate() -> Result<Self> {
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check parameter ranges and input file existence.
    pub fn validate(&self) -> Result<()> {
        if self.permutations == 0 {
            return Err(EnrichError::config("--permutations must be at least 1"));
        }
        if self.max_geneset_size == 0 {
            return Err(EnrichError::config("--max-geneset-size must be at least 1"));
        }
        if self.threads == Some(0) {
            return Err(EnrichError::config("--threads must be at least 1"));
        }

        let mut inputs = vec![
            &self.snps,
            &self.expression,
            &self.gene_intervals,
            &self.snp_intervals,
            &self.null_snps,
        ];
        if let Some(condition) = &self.condition {
            inputs.push(condition);
        }
        for path in inputs {
            if !path.exists() {
                return Err(EnrichError::FileNotFound { path: path.clone() });
            }
        }
        Ok(())
    }

    /// Worker thread count, clamped to `[1, available cores]`.
    pub fn nthreads(&self) -> usize {
        clamp_threads(self.threads.unwrap_or(usize::MAX))
    }

    /// The seed for this run; drawn at random when none was given.
    pub fn resolved_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }
}
