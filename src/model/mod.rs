//! # Model Module
//!
//! The enrichment engine. Nothing here performs I/O.
//!
//! ## Core Algorithms
//! - `interval_index`: Per-chromosome interval trees with slop fallback
//! - `geneset_catalog`: SNP to geneset resolution and size-stratified bins
//! - `null_sampler`: Size-matched null SNP sets, drawn with replacement
//! - `scoring`: Summed `-log10` binomial probabilities per condition
//! - `permutation`: Parallel empirical p-values per condition
//!
//! ## Data Flow
//! ```text
//! gene BED ──► IntervalIndex ──► UserGenesets (template sizes)
//!                    │                 │
//!   background SNPs ─┴──► GenesetBins ◄┘
//!                              │
//!          ExpressionMatrix ──►PermutationEngine ──► PermutationResult per condition
//! ```
//!
//! Everything upstream of `PermutationEngine` is built once and only read
//! afterwards, so the rayon workers share it by plain reference.

pub mod geneset_catalog;
pub mod interval_index;
pub mod null_sampler;
pub mod permutation;
pub mod scoring;
