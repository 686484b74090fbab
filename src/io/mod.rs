//! # I/O Module
//!
//! File reading/writing boundaries. Converts between plain-text or gzipped
//! inputs and the in-memory types consumed by `model`.

pub mod bed;
pub mod gct;
pub mod names;
pub mod output;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::error::{EnrichError, Result};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Open a text file, transparently decompressing gzip (detected by magic bytes).
pub fn open_text(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => EnrichError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => EnrichError::Io(e),
    })?;

    let mut reader = BufReader::new(file);
    let is_gzipped = reader.fill_buf()?.starts_with(&GZIP_MAGIC);
    if is_gzipped {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(reader))))
    } else {
        Ok(Box::new(reader))
    }
}
