//! # Result Writers
//!
//! Tab-delimited output: `pvalues.txt` (one row per condition) and
//! `snp_genes.txt` (one row per user SNP).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::model::geneset_catalog::OverlapReportRow;
use crate::model::permutation::PermutationResult;

pub const PVALUES_FILE: &str = "pvalues.txt";
pub const SNP_GENES_FILE: &str = "snp_genes.txt";

pub fn write_pvalues<W: Write>(mut out: W, results: &[PermutationResult]) -> Result<()> {
    writeln!(out, "name\tpvalue\tnulls_observed\tnulls_tested")?;
    for r in results {
        if r.nulls_tested == 0 {
            writeln!(out, "{}\t1.0\t0\t0", r.condition)?;
        } else {
            writeln!(
                out,
                "{}\t{}\t{}\t{}",
                r.condition, r.pvalue, r.nulls_observed, r.nulls_tested
            )?;
        }
    }
    out.flush()?;
    Ok(())
}

pub fn write_snp_genes<W: Write>(mut out: W, rows: &[OverlapReportRow]) -> Result<()> {
    writeln!(out, "chrom\tstart\tend\tname\tn_genes\tgenes")?;
    for row in rows {
        match (&row.interval, &row.genes) {
            (Some(iv), Some(genes)) => writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}\t{}",
                iv.chrom,
                iv.start,
                iv.end,
                row.variant,
                genes.len(),
                genes.join(",")
            )?,
            _ => writeln!(out, "NA\tNA\tNA\t{}\tNA\tNA", row.variant)?,
        }
    }
    out.flush()?;
    Ok(())
}

/// Write both result files into `dir`, creating it if needed.
pub fn write_results(dir: &Path, results: &[PermutationResult], report: &[OverlapReportRow]) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    write_snp_genes(BufWriter::new(File::create(dir.join(SNP_GENES_FILE))?), report)?;
    write_pvalues(BufWriter::new(File::create(dir.join(PVALUES_FILE))?), results)?;
    Ok(())
}
