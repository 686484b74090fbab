//! # Name Lists
//!
//! SNP and condition lists: the first whitespace-delimited field of every
//! non-blank line.

use std::collections::BTreeSet;
use std::io::BufRead;
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::io::open_text;

/// Read a name list from a file (plain or gzipped).
pub fn read_names(path: &Path) -> Result<BTreeSet<String>> {
    let names = read_names_from(open_text(path)?)?;
    info!("{:?} has {} items", path, names.len());
    Ok(names)
}

pub fn read_names_from<R: BufRead>(reader: R) -> Result<BTreeSet<String>> {
    let mut names = BTreeSet::new();
    for line in reader.lines() {
        let line = line?;
        if let Some(first) = line.split_whitespace().next() {
            names.insert(first.to_string());
        }
    }
    Ok(names)
}
