//! # Null SNP Set Sampling
//!
//! Draws a surrogate SNP set with the same geneset-size profile as the
//! user's SNPs: one geneset per template entry, picked uniformly with
//! replacement from the bin of that size.
//!
//! The random source is an explicit argument so every worker can own its
//! generator.

use rand::Rng;

use crate::data::gene::GeneSet;
use crate::error::Result;
use crate::model::geneset_catalog::GenesetBins;

/// Draw one geneset per entry of `target_sizes`, preserving order.
///
/// Every size in `target_sizes` must have a non-empty bin; check with
/// [`GenesetBins::validate`] before sampling in a hot loop.
///
/// # Panics
/// If a required bin is empty.
#[inline]
pub fn sample<'a, R: Rng + ?Sized>(
    target_sizes: &[usize],
    bins: &'a GenesetBins,
    rng: &mut R,
) -> Vec<&'a GeneSet> {
    target_sizes
        .iter()
        .map(|&size| {
            let bin = bins.bin(size);
            &bin[rng.gen_range(0..bin.len())]
        })
        .collect()
}

/// Like [`sample`], but reports an empty bin instead of panicking.
pub fn try_sample<'a, R: Rng + ?Sized>(
    target_sizes: &[usize],
    bins: &'a GenesetBins,
    rng: &mut R,
) -> Result<Vec<&'a GeneSet>> {
    bins.validate(target_sizes)?;
    Ok(sample(target_sizes, bins, rng))
}
