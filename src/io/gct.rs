//! # GCT Reading
//!
//! GCT 1.2 expression matrices:
//! ```text
//! #1.2
//! <rows>  <cols>
//! Name    Description <condition>...
//! <gene>  <desc>      <value>...
//! ```
//! Header and data lines are tab-delimited; the description may contain spaces.

use std::io::BufRead;
use std::path::Path;

use tracing::info;

use crate::data::expression::ExpressionMatrix;
use crate::data::gene::{Genes, MAX_GENES};
use crate::error::{EnrichError, Result};
use crate::io::open_text;

pub fn read_gct(path: &Path) -> Result<ExpressionMatrix> {
    let matrix = read_gct_from(open_text(path)?)?;
    info!(
        "{:?} has {} rows, {} columns",
        path,
        matrix.n_genes(),
        matrix.n_conditions()
    );
    Ok(matrix)
}

pub fn read_gct_from<R: BufRead>(reader: R) -> Result<ExpressionMatrix> {
    let mut lines = reader.lines().enumerate().map(|(i, l)| (i + 1, l));
    let mut next_line = |what: &str| -> Result<(usize, String)> {
        match lines.next() {
            Some((n, Ok(line))) => Ok((n, line)),
            Some((_, Err(e))) => Err(e.into()),
            None => Err(EnrichError::invalid_data(format!(
                "GCT file ended before {}",
                what
            ))),
        }
    };

    let (n, version) = next_line("version line")?;
    if !version.trim_start().starts_with("#1.2") {
        return Err(EnrichError::parse(n, "not a GCT 1.2 file (expected '#1.2')"));
    }

    let (n, dims) = next_line("dimensions line")?;
    let mut dims_iter = dims.split_whitespace().map(str::parse::<usize>);
    let (n_rows, n_cols) = match (dims_iter.next(), dims_iter.next()) {
        (Some(Ok(r)), Some(Ok(c))) if r > 0 && c > 0 && r <= MAX_GENES => (r, c),
        _ => return Err(EnrichError::parse(n, format!("malformed dimensions '{}'", dims.trim()))),
    };

    let (n, header) = next_line("column header")?;
    let conditions: Vec<String> = header
        .trim_end_matches(['\r', '\n'])
        .split('\t')
        .skip(2)
        .map(str::to_string)
        .collect();
    if conditions.len() != n_cols {
        return Err(EnrichError::parse(
            n,
            format!("expected {} condition names, found {}", n_cols, conditions.len()),
        ));
    }

    let mut gene_names = Vec::with_capacity(n_rows);
    let mut rows = Vec::with_capacity(n_rows);
    for _ in 0..n_rows {
        let (n, line) = next_line("all declared rows")?;
        let mut fields = line.trim_end_matches(['\r', '\n']).split('\t');
        let name = fields
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| EnrichError::parse(n, "missing gene name"))?;
        fields.next(); // Description

        let values = fields
            .map(|v| {
                v.trim()
                    .parse::<f64>()
                    .map_err(|_| EnrichError::parse(n, format!("invalid value '{}'", v)))
            })
            .collect::<Result<Vec<f64>>>()?;
        if values.len() != n_cols {
            return Err(EnrichError::parse(
                n,
                format!("expected {} values, found {}", n_cols, values.len()),
            ));
        }

        gene_names.push(name.to_string());
        rows.push(values);
    }

    ExpressionMatrix::from_rows(Genes::from_names(gene_names), conditions, rows)
}
