//! # Data Module
//!
//! In-memory representations of the run's inputs.
//!
//! ## Design Philosophy
//! - **Zero-cost newtypes:** `GeneIdx` indexes expression rows so hot loops never
//!   compare gene names.
//! - **Build once, share read-only:** matrices and statistics are immutable after
//!   construction and handed to workers by reference.

pub mod expression;
pub mod gene;
pub mod interval;

// Re-export commonly used types
pub use expression::{BinaryStats, ExpressionMatrix};
pub use gene::{GeneIdx, GeneSet, Genes};
pub use interval::{retain_background, GenomicInterval, VariantIntervals};
