mod cli;
mod config;
mod errors;
mod index;
mod llm_client;
mod matching;
mod models;
mod pipeline;
mod routes;
mod skills;
mod state;
mod storage;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Cli, Commands, RunArgs, ServeArgs};
use crate::config::Config;
use crate::index::{JobIndex, LocalVectorIndex};
use crate::llm_client::embedding::GeminiEmbedder;
use crate::llm_client::LlmClient;
use crate::matching::MatchMode;
use crate::models::DocType;
use crate::pipeline::{DirectorySource, Pipeline};
use crate::routes::build_router;
use crate::skills::Taxonomy;
use crate::state::AppState;
use crate::storage::{BlobStore, DocumentStore, LocalBlobStore, S3BlobStore};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting matcher v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Run(args) => {
            if let Some(mode) = args.mode {
                config.match_mode = mode;
            }
            let pipeline = build_pipeline(&config).await?;
            run_batch(&pipeline, args).await
        }
        Commands::Serve(args) => {
            if let Some(mode) = args.mode {
                config.match_mode = mode;
            }
            let pipeline = build_pipeline(&config).await?;
            serve(pipeline, &config, args).await
        }
    }
}

async fn build_pipeline(config: &Config) -> Result<Pipeline> {
    let taxonomy = Taxonomy::load(&config.taxonomy_path)
        .with_context(|| format!("Loading taxonomy from {}", config.taxonomy_path.display()))?;
    info!(
        categories = taxonomy.categories().len(),
        critical = taxonomy.critical_skills().len(),
        "Skill taxonomy loaded"
    );

    let llm = LlmClient::new(config.anthropic_api_key.clone());
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let remote: Arc<dyn BlobStore> = match &config.s3 {
        Some(settings) => Arc::new(S3BlobStore::connect(settings).await),
        None => {
            let store = LocalBlobStore::new(&config.remote_dir);
            info!(root = %store.root().display(), "S3_BUCKET not set, using local document store");
            Arc::new(store)
        }
    };
    let store = DocumentStore::new(remote, LocalBlobStore::new(&config.cache_dir));

    let job_index = match config.match_mode {
        MatchMode::Semantic => {
            let embedder = GeminiEmbedder::new(config.require_google_api_key()?.to_string());
            let index =
                LocalVectorIndex::open(&config.vector_dir, &config.vector_collection).await?;
            info!(
                collection = %config.vector_collection,
                model = llm_client::embedding::EMBEDDING_MODEL,
                "Vector index opened"
            );
            Some(Arc::new(JobIndex::new(Arc::new(index), Arc::new(embedder))))
        }
        MatchMode::Lexical => None,
    };

    Ok(Pipeline::assemble(
        Arc::new(llm),
        Arc::new(taxonomy),
        job_index,
        store,
    ))
}

async fn run_batch(pipeline: &Pipeline, args: RunArgs) -> Result<()> {
    let resumes = DirectorySource::new(&args.resume_dir, DocType::Resume);
    let jobs = DirectorySource::new(&args.job_dir, DocType::Job);
    let report = pipeline.run(&resumes, &jobs).await?;

    for skipped in &report.skipped {
        info!(doc_id = %skipped.doc_id, doc_type = %skipped.doc_type, reason = %skipped.reason, "Skipped");
    }

    if let Some(path) = &args.summary_path {
        let body = serde_json::to_vec_pretty(&report)?;
        tokio::fs::write(path, body)
            .await
            .with_context(|| format!("Writing batch summary to {}", path.display()))?;
        info!(path = %path.display(), "Batch summary written");
    }

    info!(
        reports = report.reports.len(),
        skipped = report.skipped.len(),
        "All resumes processed"
    );
    Ok(())
}

async fn serve(pipeline: Pipeline, config: &Config, args: ServeArgs) -> Result<()> {
    let state = AppState {
        pipeline: Arc::new(pipeline),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let port = args.port.unwrap_or(config.port);
    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
