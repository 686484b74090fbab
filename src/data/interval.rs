//! # Genomic Intervals
//!
//! Named SNP intervals as read from BED. Coordinates are kept exactly as in
//! the file and queried half-open.

use std::collections::{BTreeMap, BTreeSet};

/// A region on one chromosome
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GenomicInterval {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
}

impl GenomicInterval {
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
        }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// SNP name to interval, iterated in name order
pub type VariantIntervals = BTreeMap<String, GenomicInterval>;

/// Keep only SNPs named in `background`. Returns how many were dropped.
pub fn retain_background(variants: &mut VariantIntervals, background: &BTreeSet<String>) -> usize {
    let before = variants.len();
    variants.retain(|name, _| background.contains(name));
    before - variants.len()
}
