//! ferrostruct: fetch, parse, analyse and annotate one structure entry.
//! Entry point for the command-line binary.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use ferrostruct_annotation::sources::{CrossReferenceSource, PdbeClient, RcsbClient, UniProtClient};
use ferrostruct_annotation::{AnnotationAggregator, EntryPipeline, IdentifierResolver};
use ferrostruct_common::SandboxClient;
use ferrostruct_structure::{GeometricAnalyzer, ParseOptions, StructureFetcher, StructureParser};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "ferrostruct", version, about = "Structure entry ingestion and annotation")]
struct Cli {
    /// Structure entry id (e.g. 1A4U) or canonical protein accession (e.g. P13569).
    identifier: String,

    /// Config file path (defaults to FERROSTRUCT_CONFIG, then ./ferrostruct.toml).
    #[arg(long, env = "FERROSTRUCT_CONFIG")]
    config: Option<PathBuf>,

    /// Abort on the first malformed record instead of skipping it.
    #[arg(long)]
    strict: bool,

    /// Pretty-print the JSON report.
    #[arg(long)]
    pretty: bool,
}

fn build_pipeline(config: &config::Config) -> anyhow::Result<EntryPipeline> {
    let mut http = SandboxClient::with_timeout(config.network.request_timeout())?;
    for domain in &config.network.extra_allowed_domains {
        http.allow_domain(domain);
    }

    let endpoints = &config.endpoints;
    let uniprot = Arc::new(UniProtClient::new(http.clone(), &endpoints.uniprot));
    let rcsb = Arc::new(RcsbClient::new(http.clone(), &endpoints.rcsb_data));
    let pdbe = Arc::new(PdbeClient::new(http.clone(), &endpoints.pdbe));
    let fetcher = StructureFetcher::new(http, &endpoints.rcsb_files, &endpoints.alphafold);

    let step_timeout = config.network.step_timeout();
    // Entity-level references first, then the entry-level mapping.
    let xref_sources: Vec<Arc<dyn CrossReferenceSource>> = vec![rcsb.clone() as Arc<dyn CrossReferenceSource>, pdbe];
    let resolver = IdentifierResolver::new(uniprot.clone(), xref_sources, rcsb.clone())
        .with_step_timeout(step_timeout);
    let aggregator = AnnotationAggregator::new(Arc::new(resolver), uniprot, rcsb)
        .with_step_timeout(step_timeout);

    let parser = StructureParser::new(ParseOptions { strict: config.parser.strict });
    let analyzer = GeometricAnalyzer::new(config.analysis.pocket_params());

    Ok(EntryPipeline::new(Arc::new(fetcher), aggregator, parser, analyzer)
        .with_step_timeout(step_timeout))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ferrostruct=debug,info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("ferrostruct {} starting", env!("CARGO_PKG_VERSION"));

    let mut config = config::Config::load(cli.config.as_deref())?;
    if cli.strict {
        config.parser.strict = true;
    }
    info!(
        strict = config.parser.strict,
        step_timeout_secs = config.network.step_timeout_secs,
        "Configuration loaded"
    );

    let pipeline = build_pipeline(&config)?;
    let report = pipeline.run(&cli.identifier).await?;

    if report.is_partial() {
        warn!(
            fields = ?report.annotation.placeholder_fields(),
            "Annotation is partial; placeholder fields are tagged in the report"
        );
    }

    let json = if cli.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");

    Ok(())
}
