//! # Gene Definitions
//!
//! Gene index type and the ordered gene table taken from the expression
//! matrix rows. Hot loops carry `GeneIdx` rather than gene names.

use std::collections::HashMap;
use std::num::TryFromIntError;
use std::sync::Arc;

/// Largest number of genes (expression matrix rows) a `GeneIdx` can address
pub const MAX_GENES: usize = u32::MAX as usize;

/// Zero-cost newtype for gene (expression matrix row) indices
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct GeneIdx(pub u32);

impl GeneIdx {
    pub fn new(idx: u32) -> Self {
        Self(idx)
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for GeneIdx {
    fn from(idx: u32) -> Self {
        Self(idx)
    }
}

impl TryFrom<usize> for GeneIdx {
    type Error = TryFromIntError;

    fn try_from(idx: usize) -> Result<Self, Self::Error> {
        u32::try_from(idx).map(Self)
    }
}

impl From<GeneIdx> for usize {
    fn from(idx: GeneIdx) -> usize {
        idx.0 as usize
    }
}

/// Genes overlapping a single SNP, as expression-matrix row indices
pub type GeneSet = Vec<GeneIdx>;

/// Ordered gene names, matching the expression matrix rows
#[derive(Clone, Debug, Default)]
pub struct Genes {
    names: Vec<Arc<str>>,
    /// Map from gene name to row index for fast lookup
    name_to_idx: HashMap<Arc<str>, GeneIdx>,
}

impl Genes {
    /// Create from row names. If a name repeats, lookups resolve to its first row.
    ///
    /// Holds at most [`MAX_GENES`] names; the GCT reader and
    /// `ExpressionMatrix::from_rows` reject larger tables.
    pub fn from_names(names: Vec<String>) -> Self {
        debug_assert!(names.len() <= MAX_GENES);
        let names: Vec<Arc<str>> = names.into_iter().map(|s| s.into()).collect();
        let mut name_to_idx = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            name_to_idx
                .entry(name.clone())
                .or_insert_with(|| GeneIdx::new(i as u32));
        }
        Self { names, name_to_idx }
    }

    /// Number of genes
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Get gene index by name
    pub fn index_of(&self, name: &str) -> Option<GeneIdx> {
        self.name_to_idx.get(name).copied()
    }

    pub fn names(&self) -> &[Arc<str>] {
        &self.names
    }
}

impl std::ops::Index<GeneIdx> for Genes {
    type Output = str;

    fn index(&self, idx: GeneIdx) -> &Self::Output {
        &self.names[idx.as_usize()]
    }
}
