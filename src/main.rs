//! # snpenrich: SNP-set enrichment for condition-specific gene activity
//!
//! ## Usage
//! ```bash
//! snpenrich --snps user.txt --expression expr.gct.gz \
//!     --gene-intervals genes.bed.gz --snp-intervals snps.bed.gz \
//!     --null-snps background.txt --out results
//!
//! # Reproducible run with span timings
//! snpenrich ... --seed 42 --profile
//! ```

use std::time::Instant;

use snpenrich::config::Config;
use snpenrich::pipelines::EnrichmentPipeline;
use snpenrich::utils::telemetry::{HeartbeatConfig, HeartbeatHandle, Stage, TelemetryBlackboard};
use snpenrich::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize the tracing subscriber; with `profile`, span close events carry timings.
fn init_logging(profile: bool) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let span_events = if profile { FmtSpan::CLOSE } else { FmtSpan::NONE };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_span_events(span_events)
                .with_target(false)
                .with_timer(fmt::time::uptime()),
        )
        .init();
}

fn run() -> Result<()> {
    let start = Instant::now();

    let config = Config::parse_and_validate()?;
    init_logging(config.profile);

    eprintln!("snpenrich v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("Threads: {}", config.nthreads());
    eprintln!("SNPs: {:?}", config.snps);
    eprintln!("Expression: {:?}", config.expression);
    eprintln!("Output: {:?}", config.out);

    let telemetry = TelemetryBlackboard::new();
    let heartbeat = HeartbeatHandle::spawn(telemetry.clone(), HeartbeatConfig::default())?;

    let mut pipeline = EnrichmentPipeline::new(config, Some(telemetry.clone()));
    pipeline.run()?;

    telemetry.set_stage(Stage::Complete);
    heartbeat.shutdown();

    eprintln!("\nCompleted in {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}
