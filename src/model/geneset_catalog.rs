//! # Geneset Catalog
//!
//! Resolves SNPs to the genes they overlap and pools background genesets by
//! size so null SNP sets can be drawn with the same size profile as the
//! user's SNPs.
//!
//! ## Size bins
//! A geneset's bin key is its size clamped to `max_size`. The stored geneset
//! itself is never truncated. Bins are only built for keys that occur among
//! the user's SNPs; other sizes are never sampled and are skipped.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{info, info_span};

use crate::data::gene::{GeneSet, Genes};
use crate::data::interval::{GenomicInterval, VariantIntervals};
use crate::error::{EnrichError, Result};
use crate::model::interval_index::IntervalIndex;

/// One line of the per-SNP overlap report
#[derive(Clone, Debug, PartialEq)]
pub struct OverlapReportRow {
    pub variant: String,
    /// `None` when the SNP is absent from the reference intervals
    pub interval: Option<GenomicInterval>,
    /// Names of overlapping genes; `None` when the SNP is absent
    pub genes: Option<Vec<String>>,
}

/// Genesets of the user's SNPs and the matching size template
#[derive(Clone, Debug, Default)]
pub struct UserGenesets {
    /// One geneset per user SNP that overlaps at least one gene
    genesets: Vec<GeneSet>,
    /// Clamped size of each geneset, parallel to `genesets`
    sizes: Vec<usize>,
}

impl UserGenesets {
    /// Resolve every user SNP (in name order) against all reference intervals.
    ///
    /// SNPs missing from `variants` appear in the report only. SNPs overlapping
    /// no gene, even after slop, appear in the report with zero genes and
    /// contribute no geneset.
    pub fn resolve(
        user_names: &BTreeSet<String>,
        variants: &VariantIntervals,
        index: &IntervalIndex,
        slop: u64,
        genes: &Genes,
        max_size: usize,
    ) -> (Self, Vec<OverlapReportRow>) {
        let mut user = Self::default();
        let mut report = Vec::with_capacity(user_names.len());

        for name in user_names {
            let Some(interval) = variants.get(name) else {
                report.push(OverlapReportRow {
                    variant: name.clone(),
                    interval: None,
                    genes: None,
                });
                continue;
            };

            let geneset = index.resolve_overlaps(&interval.chrom, interval.start, interval.end, slop);
            let gene_names = geneset.iter().map(|&g| genes[g].to_string()).collect();
            report.push(OverlapReportRow {
                variant: name.clone(),
                interval: Some(interval.clone()),
                genes: Some(gene_names),
            });

            if !geneset.is_empty() {
                user.sizes.push(geneset.len().min(max_size));
                user.genesets.push(geneset);
            }
        }

        (user, report)
    }

    pub fn from_genesets(genesets: Vec<GeneSet>, max_size: usize) -> Self {
        let sizes = genesets.iter().map(|g| g.len().min(max_size)).collect();
        Self { genesets, sizes }
    }

    pub fn genesets(&self) -> &[GeneSet] {
        &self.genesets
    }

    /// Clamped sizes, one per user geneset, in the same order
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    pub fn len(&self) -> usize {
        self.genesets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genesets.is_empty()
    }

    /// Distinct clamped sizes
    pub fn distinct_sizes(&self) -> BTreeSet<usize> {
        self.sizes.iter().copied().collect()
    }
}

/// Background genesets pooled by clamped size
#[derive(Clone, Debug, Default)]
pub struct GenesetBins {
    bins: BTreeMap<usize, Vec<GeneSet>>,
}

impl GenesetBins {
    /// Resolve every background SNP and bin its geneset, keeping only sizes in
    /// `needed_sizes`.
    pub fn build(
        variants: &VariantIntervals,
        index: &IntervalIndex,
        slop: u64,
        needed_sizes: &BTreeSet<usize>,
        max_size: usize,
    ) -> Self {
        let _span = info_span!("bin_genesets", n_variants = variants.len()).entered();

        let mut bins: BTreeMap<usize, Vec<GeneSet>> = BTreeMap::new();
        for interval in variants.values() {
            let geneset = index.resolve_overlaps(&interval.chrom, interval.start, interval.end, slop);
            if geneset.is_empty() {
                continue;
            }
            let key = geneset.len().min(max_size);
            if !needed_sizes.contains(&key) {
                continue;
            }
            bins.entry(key).or_default().push(geneset);
        }

        for (size, bin) in &bins {
            info!("Gene sets with size {}: {}", size, bin.len());
        }

        Self { bins }
    }

    /// Check that every size in `sizes` can be sampled.
    pub fn validate(&self, sizes: &[usize]) -> Result<()> {
        for &size in sizes {
            if self.bin(size).is_empty() {
                return Err(EnrichError::EmptyBin { size });
            }
        }
        Ok(())
    }

    /// Genesets with clamped size `size`; empty if none were binned
    pub fn bin(&self, size: usize) -> &[GeneSet] {
        self.bins.get(&size).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Sizes that have a bin
    pub fn sizes(&self) -> impl Iterator<Item = usize> + '_ {
        self.bins.keys().copied()
    }

    /// Total genesets across all bins
    pub fn total(&self) -> usize {
        self.bins.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::gene::GeneIdx;
    use crate::data::interval::retain_background;

    /// Ten adjacent genes on chr1, gene i spanning [i*100, i*100 + 100).
    fn setup() -> (Genes, IntervalIndex) {
        let genes = Genes::from_names((0..10).map(|i| format!("G{}", i)).collect());
        let records = (0..10u64).map(|i| ("chr1".to_string(), i * 100, i * 100 + 100, GeneIdx::new(i as u32)));
        (genes, IntervalIndex::build(records))
    }

    /// An interval overlapping exactly `n` genes starting at gene `first`.
    fn spanning(first: u64, n: u64) -> GenomicInterval {
        GenomicInterval::new("chr1", first * 100 + 10, (first + n - 1) * 100 + 20)
    }

    fn names(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_user_resolution_and_report() {
        let (genes, index) = setup();
        let mut variants = VariantIntervals::new();
        variants.insert("rsA".into(), spanning(0, 2));
        variants.insert("rsB".into(), GenomicInterval::new("chr9", 5, 6));

        let user = names(&["rsA", "rsB", "rsMissing"]);
        let (resolved, report) = UserGenesets::resolve(&user, &variants, &index, 0, &genes, 10);

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved.sizes(), &[2]);
        assert_eq!(report.len(), 3);

        assert_eq!(report[0].variant, "rsA");
        let mut got = report[0].genes.clone().unwrap();
        got.sort();
        assert_eq!(got, vec!["G0".to_string(), "G1".to_string()]);

        assert_eq!(report[1].variant, "rsB");
        assert_eq!(report[1].genes, Some(vec![]));

        assert_eq!(report[2].variant, "rsMissing");
        assert!(report[2].interval.is_none());
        assert!(report[2].genes.is_none());
    }

    #[test]
    fn test_user_sizes_are_clamped_but_sets_kept() {
        let (genes, index) = setup();
        let mut variants = VariantIntervals::new();
        variants.insert("rsWide".into(), spanning(0, 6));

        let (resolved, _) = UserGenesets::resolve(&names(&["rsWide"]), &variants, &index, 0, &genes, 4);
        assert_eq!(resolved.sizes(), &[4]);
        assert_eq!(resolved.genesets()[0].len(), 6);
    }

    #[test]
    fn test_bins_only_for_needed_sizes() {
        let (_, index) = setup();
        let mut variants = VariantIntervals::new();
        variants.insert("b2".into(), spanning(0, 2));
        for i in 0..5 {
            variants.insert(format!("b3_{}", i), spanning(i, 3));
        }
        variants.insert("b5".into(), spanning(1, 5));

        let user = UserGenesets::from_genesets(
            vec![
                vec![GeneIdx::new(0), GeneIdx::new(1)],
                vec![GeneIdx::new(2), GeneIdx::new(3)],
                (0..5).map(GeneIdx::new).collect(),
            ],
            10,
        );
        assert_eq!(user.sizes(), &[2, 2, 5]);

        let bins = GenesetBins::build(&variants, &index, 0, &user.distinct_sizes(), 10);
        assert_eq!(bins.sizes().collect::<Vec<_>>(), vec![2, 5]);
        assert!(bins.bin(3).is_empty());
        assert_eq!(bins.bin(2).len(), 1);
        assert_eq!(bins.bin(5).len(), 1);
        assert!(bins.validate(user.sizes()).is_ok());
    }

    #[test]
    fn test_oversized_genesets_share_top_bin() {
        let (_, index) = setup();
        let mut variants = VariantIntervals::new();
        variants.insert("w7".into(), spanning(0, 7));
        variants.insert("w9".into(), spanning(0, 9));
        variants.insert("w3".into(), spanning(0, 3));

        let needed: BTreeSet<usize> = [3].into_iter().collect();
        let bins = GenesetBins::build(&variants, &index, 0, &needed, 3);
        let mut lens: Vec<usize> = bins.bin(3).iter().map(Vec::len).collect();
        lens.sort();
        assert_eq!(lens, vec![3, 7, 9]);
    }

    #[test]
    fn test_non_background_never_binned() {
        let (_, index) = setup();
        let mut variants = VariantIntervals::new();
        variants.insert("keep".into(), spanning(0, 1));
        variants.insert("drop".into(), spanning(5, 1));

        let dropped = retain_background(&mut variants, &names(&["keep"]));
        assert_eq!(dropped, 1);

        let needed: BTreeSet<usize> = [1].into_iter().collect();
        let bins = GenesetBins::build(&variants, &index, 0, &needed, 10);
        assert_eq!(bins.bin(1), &[vec![GeneIdx::new(0)]]);
        assert_eq!(bins.total(), 1);
    }

    #[test]
    fn test_geneless_variants_contribute_nothing() {
        let (_, index) = setup();
        let mut variants = VariantIntervals::new();
        variants.insert("desert".into(), GenomicInterval::new("chr1", 5_000, 5_001));

        let needed: BTreeSet<usize> = (1..=10).collect();
        let bins = GenesetBins::build(&variants, &index, 100, &needed, 10);
        assert_eq!(bins.total(), 0);
    }

    #[test]
    fn test_validate_names_missing_size() {
        let (_, index) = setup();
        let mut variants = VariantIntervals::new();
        variants.insert("b1".into(), spanning(0, 1));

        let needed: BTreeSet<usize> = [1, 4].into_iter().collect();
        let bins = GenesetBins::build(&variants, &index, 0, &needed, 10);
        match bins.validate(&[1, 4, 1]) {
            Err(EnrichError::EmptyBin { size }) => assert_eq!(size, 4),
            other => panic!("expected EmptyBin, got {:?}", other),
        }
    }
}
