//! # Gene Interval Index
//!
//! One static augmented interval tree per chromosome, holding gene intervals
//! tagged with their expression-matrix row.
//!
//! Each tree is a sorted array read as a balanced BST (the midpoint of any
//! range is that range's root), with a parallel array of subtree maximum end
//! coordinates. Built once, then queried from many threads without locking:
//! O(log n + k) per half-open overlap query.

use std::collections::HashMap;

use tracing::info;

use crate::data::gene::{GeneIdx, GeneSet, Genes};

/// A half-open interval `[start, end)` with a payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval<T> {
    pub start: u64,
    pub end: u64,
    pub data: T,
}

impl<T> Interval<T> {
    pub fn new(start: u64, end: u64, data: T) -> Self {
        Self { start, end, data }
    }
}

/// Static interval tree over intervals sorted by `(start, end)`.
///
/// The tree is implicit in the sorted order: the root of the subtree over
/// `intervals[lo..hi]` is the element at `lo + (hi - lo) / 2`. `max_end` runs
/// parallel to `intervals` and holds, for each subtree root, the largest end
/// coordinate below it. Query results come back sorted by start.
#[derive(Debug, Clone)]
pub struct IntervalTree<T> {
    intervals: Vec<Interval<T>>,
    max_end: Vec<u64>,
}

impl<T> IntervalTree<T> {
    /// Build from unsorted intervals. O(n log n).
    pub fn from_unsorted(mut intervals: Vec<Interval<T>>) -> Self {
        intervals.sort_by_key(|iv| (iv.start, iv.end));
        let mut max_end = vec![0; intervals.len()];
        fill_max_end(&intervals, &mut max_end, 0, intervals.len());
        Self { intervals, max_end }
    }

    /// All intervals with `interval.start < end && interval.end > start`.
    pub fn query(&self, start: u64, end: u64) -> Vec<&Interval<T>> {
        let mut results = Vec::new();
        self.collect(0, self.intervals.len(), start, end, &mut results);
        results
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    fn collect<'a>(&'a self, lo: usize, hi: usize, start: u64, end: u64, out: &mut Vec<&'a Interval<T>>) {
        if lo >= hi {
            return;
        }
        let mid = lo + (hi - lo) / 2;
        if self.max_end[mid] <= start {
            return;
        }

        self.collect(lo, mid, start, end, out);

        let iv = &self.intervals[mid];
        // Everything from here rightwards starts at or after the query end
        if iv.start >= end {
            return;
        }
        if iv.end > start {
            out.push(iv);
        }
        self.collect(mid + 1, hi, start, end, out);
    }
}

/// Post-order fill of `max_end` for the subtree over `intervals[lo..hi]`.
fn fill_max_end<T>(intervals: &[Interval<T>], max_end: &mut [u64], lo: usize, hi: usize) -> u64 {
    if lo >= hi {
        return 0;
    }
    let mid = lo + (hi - lo) / 2;
    let left = fill_max_end(intervals, max_end, lo, mid);
    let right = fill_max_end(intervals, max_end, mid + 1, hi);
    max_end[mid] = intervals[mid].end.max(left).max(right);
    max_end[mid]
}

/// A gene interval record before indexing: `(chrom, start, end, gene)`
pub type GeneRecord = (String, u64, u64, GeneIdx);

/// Per-chromosome gene interval trees
#[derive(Debug, Clone, Default)]
pub struct IntervalIndex {
    trees: HashMap<String, IntervalTree<GeneIdx>>,
}

impl IntervalIndex {
    pub fn build<I>(records: I) -> Self
    where
        I: IntoIterator<Item = GeneRecord>,
    {
        let mut by_chrom: HashMap<String, Vec<Interval<GeneIdx>>> = HashMap::new();
        for (chrom, start, end, gene) in records {
            by_chrom
                .entry(chrom)
                .or_default()
                .push(Interval::new(start, end, gene));
        }
        let trees = by_chrom
            .into_iter()
            .map(|(chrom, ivs)| (chrom, IntervalTree::from_unsorted(ivs)))
            .collect();
        Self { trees }
    }

    /// Index named gene intervals, keeping only genes that are rows of the
    /// expression matrix. Returns the index and the number of skipped records.
    pub fn build_from_genes<I>(records: I, genes: &Genes) -> (Self, usize)
    where
        I: IntoIterator<Item = (String, u64, u64, String)>,
    {
        let mut skipped = 0usize;
        let kept: Vec<GeneRecord> = records
            .into_iter()
            .filter_map(|(chrom, start, end, name)| match genes.index_of(&name) {
                Some(idx) => Some((chrom, start, end, idx)),
                None => {
                    skipped += 1;
                    None
                }
            })
            .collect();
        let index = Self::build(kept);
        info!(
            skipped,
            "Skipped gene intervals absent from the expression matrix"
        );
        (index, skipped)
    }

    /// Intervals on `chrom` overlapping `[start, end)`, sorted by start.
    pub fn query(&self, chrom: &str, start: u64, end: u64) -> Vec<&Interval<GeneIdx>> {
        self.trees
            .get(chrom)
            .map(|tree| tree.query(start, end))
            .unwrap_or_default()
    }

    /// Genes overlapping `[start, end)`. When there are none, query once more
    /// with the window widened by `slop` on each side (start floored at 1).
    pub fn resolve_overlaps(&self, chrom: &str, start: u64, end: u64, slop: u64) -> GeneSet {
        let mut hits = self.query(chrom, start, end);
        if hits.is_empty() {
            let lo = start.saturating_sub(slop).max(1);
            hits = self.query(chrom, lo, end.saturating_add(slop));
        }
        hits.into_iter().map(|iv| iv.data).collect()
    }

    pub fn n_chromosomes(&self) -> usize {
        self.trees.len()
    }

    /// Total number of indexed gene intervals
    pub fn len(&self) -> usize {
        self.trees.values().map(IntervalTree::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
