//! # BED Reading
//!
//! Named intervals from the first four BED columns (`chrom start end name`).
//! Extra columns are ignored; `#`, `track` and `browser` lines are skipped.

use std::io::BufRead;
use std::path::Path;

use tracing::info;

use crate::data::interval::{GenomicInterval, VariantIntervals};
use crate::error::{EnrichError, Result};
use crate::io::open_text;

/// One parsed BED line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BedRecord {
    pub name: String,
    pub interval: GenomicInterval,
}

/// Stream BED records from a reader.
pub fn parse_bed<R: BufRead>(reader: R) -> impl Iterator<Item = Result<BedRecord>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(i, line)| match line {
            Ok(line) => parse_line(i + 1, &line).transpose(),
            Err(e) => Some(Err(e.into())),
        })
}

fn parse_line(line_no: usize, line: &str) -> Result<Option<BedRecord>> {
    let trimmed = line.trim();
    if trimmed.is_empty()
        || trimmed.starts_with('#')
        || trimmed.starts_with("track")
        || trimmed.starts_with("browser")
    {
        return Ok(None);
    }

    let mut fields = trimmed.split_whitespace();
    let (Some(chrom), Some(start), Some(end), Some(name)) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(EnrichError::parse(line_no, "expected at least 4 BED columns"));
    };

    let start: u64 = start
        .parse()
        .map_err(|_| EnrichError::parse(line_no, format!("invalid start '{}'", start)))?;
    let end: u64 = end
        .parse()
        .map_err(|_| EnrichError::parse(line_no, format!("invalid end '{}'", end)))?;
    if end < start {
        return Err(EnrichError::parse(
            line_no,
            format!("end {} is before start {}", end, start),
        ));
    }

    Ok(Some(BedRecord {
        name: name.to_string(),
        interval: GenomicInterval::new(chrom, start, end),
    }))
}

/// Read SNP intervals keyed by name. A repeated name keeps its last interval.
pub fn read_variant_intervals(path: &Path) -> Result<VariantIntervals> {
    let mut intervals = VariantIntervals::new();
    for record in parse_bed(open_text(path)?) {
        let record = record?;
        intervals.insert(record.name, record.interval);
    }
    info!("{:?} has {} items", path, intervals.len());
    Ok(intervals)
}

/// Read gene intervals as `(chrom, start, end, name)` tuples, in file order.
pub fn read_gene_records(path: &Path) -> Result<Vec<(String, u64, u64, String)>> {
    parse_bed(open_text(path)?)
        .map(|r| r.map(|rec| (rec.interval.chrom, rec.interval.start, rec.interval.end, rec.name)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_records() {
        let input = "track name=test\n#comment\nchr1\t100\t200\tgeneA\t0\t+\n\nchr2 5 6 rs9\n";
        let records: Vec<BedRecord> = parse_bed(input.as_bytes()).collect::<Result<_>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "geneA");
        assert_eq!(records[0].interval, GenomicInterval::new("chr1", 100, 200));
        assert_eq!(records[1].interval.chrom, "chr2");
    }

    #[test]
    fn test_short_line_is_error_with_line_number() {
        let input = "chr1\t1\t2\tok\nchr1\t3\t4\n";
        let err = parse_bed(input.as_bytes()).collect::<Result<Vec<_>>>().unwrap_err();
        match err {
            EnrichError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_bad_coordinates() {
        assert!(parse_line(1, "chr1\tx\t2\tn").is_err());
        assert!(parse_line(1, "chr1\t9\t2\tn").is_err());
    }
}
