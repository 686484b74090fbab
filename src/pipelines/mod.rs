//! # Pipeline Module
//!
//! High-level orchestration of an enrichment run.
//! Coordinates I/O, index construction, binning and the permutation engine.

pub mod enrichment;

pub use enrichment::{
    run_enrichment, EnrichmentInputs, EnrichmentOutput, EnrichmentParams, EnrichmentPipeline,
};
