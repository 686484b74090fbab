//! # snpenrich Library
//!
//! Tests whether genes near a set of SNPs are enriched for activity in each
//! condition of a binary expression matrix, against size-matched null SNP sets.
//!
//! ## Modules
//! - `config`: CLI argument parsing and validation
//! - `data`: In-memory inputs (intervals, genes, expression matrix)
//! - `error`: Error types and result aliases
//! - `io`: Name list, BED and GCT reading; result writing
//! - `model`: Interval index, geneset bins, null sampling, scoring, permutation
//! - `pipelines`: High-level workflow orchestration
//! - `utils`: Thread pool and progress telemetry

pub mod config;
pub mod data;
pub mod error;
pub mod io;
pub mod model;
pub mod pipelines;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use data::{BinaryStats, ExpressionMatrix, GeneIdx, GeneSet, Genes, GenomicInterval, VariantIntervals};
pub use error::{EnrichError, Result};
pub use model::geneset_catalog::{GenesetBins, OverlapReportRow, UserGenesets};
pub use model::interval_index::IntervalIndex;
pub use model::permutation::{PermutationEngine, PermutationResult};
pub use pipelines::{run_enrichment, EnrichmentInputs, EnrichmentOutput, EnrichmentParams, EnrichmentPipeline};
