//! # Enrichment Pipeline
//!
//! Orchestrates a full run:
//! 1. Load SNP lists, SNP intervals, the expression matrix and gene intervals
//! 2. Check requested conditions and that the matrix is binary
//! 3. Index gene intervals (genes absent from the matrix are skipped)
//! 4. Resolve the user's SNPs to genesets and build the overlap report
//! 5. Drop SNP intervals outside the background set
//! 6. Bin background genesets by size
//! 7. Run the permutation test for every condition on the worker pool
//! 8. Write `snp_genes.txt` and `pvalues.txt`
//!
//! Steps 2-7 are available without files through [`run_enrichment`].

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, info_span, warn};

use crate::config::Config;
use crate::data::expression::ExpressionMatrix;
use crate::data::interval::{retain_background, VariantIntervals};
use crate::error::{EnrichError, Result};
use crate::io::{bed, gct, names, output};
use crate::model::geneset_catalog::{GenesetBins, OverlapReportRow, UserGenesets};
use crate::model::interval_index::IntervalIndex;
use crate::model::permutation::{PermutationEngine, PermutationResult};
use crate::utils::telemetry::{Stage, TelemetryBlackboard};
use crate::utils::threading::build_thread_pool;

/// Scalar run parameters
#[derive(Clone, Debug)]
pub struct EnrichmentParams {
    pub slop: u64,
    pub max_geneset_size: usize,
    pub trials: usize,
    pub seed: u64,
}

/// Everything a run reads, already parsed
#[derive(Clone, Debug)]
pub struct EnrichmentInputs {
    /// Reference SNP intervals
    pub variants: VariantIntervals,
    /// SNPs eligible for null sets
    pub background: BTreeSet<String>,
    /// SNPs under test
    pub user: BTreeSet<String>,
    /// Gene intervals as `(chrom, start, end, name)`
    pub gene_records: Vec<(String, u64, u64, String)>,
    pub matrix: ExpressionMatrix,
    /// Conditions that must be present in the matrix
    pub conditions: Option<BTreeSet<String>>,
}

#[derive(Clone, Debug)]
pub struct EnrichmentOutput {
    /// One result per matrix column, in column order
    pub results: Vec<PermutationResult>,
    /// One row per user SNP, in name order
    pub report: Vec<OverlapReportRow>,
}

/// Run the enrichment test on parsed inputs.
///
/// Parallel work runs on the current rayon pool; call inside
/// `ThreadPool::install` to control the worker count.
pub fn run_enrichment(
    inputs: EnrichmentInputs,
    params: &EnrichmentParams,
    telemetry: Option<&TelemetryBlackboard>,
) -> Result<EnrichmentOutput> {
    let EnrichmentInputs {
        mut variants,
        background,
        user,
        gene_records,
        matrix,
        conditions,
    } = inputs;

    if let Some(conditions) = &conditions {
        let missing = matrix.missing_conditions(conditions);
        if !missing.is_empty() {
            return Err(EnrichError::MissingConditions { names: missing });
        }
    }
    let stats = matrix.binary_stats()?;
    info!("Expression is binary");

    if let Some(t) = telemetry {
        t.set_stage(Stage::ResolvingOverlaps);
    }
    let (index, _skipped) = IntervalIndex::build_from_genes(gene_records, matrix.genes());
    if index.is_empty() {
        warn!("No gene intervals match expression matrix rows; every condition will be untestable");
    }

    let (user_genesets, report) = info_span!("resolve_user_snps").in_scope(|| {
        UserGenesets::resolve(
            &user,
            &variants,
            &index,
            params.slop,
            matrix.genes(),
            params.max_geneset_size,
        )
    });
    let missing_user = report.iter().filter(|r| r.interval.is_none()).count();
    if missing_user > 0 {
        warn!("{} user SNPs are absent from the SNP intervals", missing_user);
    }
    info!(
        "{} of {} user SNPs overlap at least one gene",
        user_genesets.len(),
        user.len()
    );

    let dropped = retain_background(&mut variants, &background);
    info!(
        "Dropped {} SNP intervals that do not belong to the provided null set",
        dropped
    );

    if let Some(t) = telemetry {
        t.set_stage(Stage::BinningGenesets);
    }
    let bins = GenesetBins::build(
        &variants,
        &index,
        params.slop,
        &user_genesets.distinct_sizes(),
        params.max_geneset_size,
    );

    if let Some(t) = telemetry {
        t.set_stage(Stage::Permuting);
    }
    let engine = PermutationEngine::new(
        &matrix,
        &stats,
        &user_genesets,
        &bins,
        params.trials,
        params.seed,
    )?;
    let results = info_span!("permutation", trials = params.trials).in_scope(|| engine.run(telemetry));

    Ok(EnrichmentOutput { results, report })
}

/// File-to-file enrichment run driven by [`Config`]
pub struct EnrichmentPipeline {
    config: Config,
    telemetry: Option<Arc<TelemetryBlackboard>>,
}

impl EnrichmentPipeline {
    pub fn new(config: Config, telemetry: Option<Arc<TelemetryBlackboard>>) -> Self {
        Self { config, telemetry }
    }

    fn set_stage(&self, stage: Stage) {
        if let Some(t) = &self.telemetry {
            t.set_stage(stage);
        }
    }

    pub fn load_inputs(&self) -> Result<EnrichmentInputs> {
        let _span = info_span!("load_inputs").entered();
        let cfg = &self.config;

        let user = names::read_names(&cfg.snps)?;
        let background = names::read_names(&cfg.null_snps)?;
        let conditions = cfg.condition.as_deref().map(names::read_names).transpose()?;
        let variants = bed::read_variant_intervals(&cfg.snp_intervals)?;
        let matrix = gct::read_gct(&cfg.expression)?;
        let gene_records = bed::read_gene_records(&cfg.gene_intervals)?;

        Ok(EnrichmentInputs {
            variants,
            background,
            user,
            gene_records,
            matrix,
            conditions,
        })
    }

    pub fn run(&mut self) -> Result<EnrichmentOutput> {
        self.set_stage(Stage::LoadingData);
        let inputs = self.load_inputs()?;

        let params = EnrichmentParams {
            slop: self.config.slop,
            max_geneset_size: self.config.max_geneset_size,
            trials: self.config.permutations,
            seed: self.config.resolved_seed(),
        };
        info!(seed = params.seed, "Random seed");

        let n_threads = self.config.nthreads();
        let pool = build_thread_pool(n_threads)?;
        info!("Computing scores for null SNP sets with {} threads", n_threads);
        let telemetry = self.telemetry.as_deref();
        let out = pool.install(|| run_enrichment(inputs, &params, telemetry))?;

        self.set_stage(Stage::WritingOutput);
        output::write_results(&self.config.out, &out.results, &out.report)?;
        info!("Wrote results to {:?}", self.config.out);

        Ok(out)
    }
}
