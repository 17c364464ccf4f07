use chrono::Utc;
use clap::{Parser, Subcommand};
use cognistore_core::{
    ingest_folder_best_effort, ChunkStore, FirestoreStore, GeminiClient, LocalStore,
    RecallOptions, RecallPipeline,
};
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "cognistore", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory for the local chunk store.
    #[arg(long, default_value = ".cognistore")]
    store_dir: String,

    /// Firestore project id; when set, chunks live in Firestore instead of
    /// the local store.
    #[arg(long)]
    firestore_project: Option<String>,

    /// User the Firestore chunks belong to.
    #[arg(long, default_value = "default")]
    firestore_user: String,

    /// Firestore REST endpoint (point at an emulator for local testing).
    #[arg(long, default_value = cognistore_core::stores::firestore::DEFAULT_ENDPOINT)]
    firestore_endpoint: String,

    /// OAuth bearer token for Firestore requests.
    #[arg(long, env = "FIRESTORE_TOKEN")]
    firestore_token: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a folder of PDFs into the chunk store.
    Ingest {
        /// Folder that contains PDFs recursively.
        #[arg(long)]
        folder: String,
    },
    /// Answer a question from the ingested documents.
    Ask {
        /// The question to answer.
        #[arg(long)]
        question: String,
        /// Number of context chunks fed to the model.
        #[arg(long, default_value = "6")]
        top_k: usize,
        /// Print the ranked source chunks after the answer.
        #[arg(long, default_value_t = false)]
        show_sources: bool,
    },
    /// Summarize a single PDF without storing it.
    Summarize {
        /// Path to the PDF.
        #[arg(long)]
        file: String,
    },
}

fn build_store(cli: &Cli) -> Box<dyn ChunkStore + Send + Sync> {
    match &cli.firestore_project {
        Some(project) => Box::new(FirestoreStore::new(
            &cli.firestore_endpoint,
            project,
            &cli.firestore_user,
            cli.firestore_token.clone(),
        )),
        None => Box::new(LocalStore::new(&cli.store_dir)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "cognistore boot"
    );

    match &cli.command {
        Command::Ingest { folder } => {
            let path = Path::new(folder);
            let report = ingest_folder_best_effort(path, &RecallOptions::default())
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            if !report.skipped_files.is_empty() {
                warn!(
                    "skipped_files={} for folder={}",
                    report.skipped_files.len(),
                    folder
                );
                for skipped in &report.skipped_files {
                    warn!(path = %skipped.path.display(), reason = %skipped.reason, "skipped pdf");
                }
            }

            if report.documents.is_empty() {
                println!("0 chunks ingested (all files were skipped)");
                return Ok(());
            }

            info!(
                folder = %folder,
                document_count = %report.documents.len(),
                chunk_count = %report.chunk_count(),
                "storing chunks"
            );

            let store = build_store(&cli);
            for document in &report.documents {
                store
                    .put_chunks(&document.fingerprint, &document.chunks)
                    .await
                    .map_err(|error| anyhow::anyhow!(error.to_string()))?;
            }

            println!(
                "{} chunks from {} document(s) ingested at {}",
                report.chunk_count(),
                report.documents.len(),
                Utc::now().to_rfc3339()
            );
        }
        Command::Ask {
            question,
            top_k,
            show_sources,
        } => {
            let model =
                GeminiClient::from_env().map_err(|error| anyhow::anyhow!(error.to_string()))?;
            let pipeline = RecallPipeline::new(build_store(&cli), model).with_options(
                RecallOptions {
                    top_k: *top_k,
                    ..RecallOptions::default()
                },
            );

            let answer = pipeline
                .answer(question)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            println!("{}", answer.text);

            if *show_sources {
                for hit in &answer.sources {
                    match hit.chunk.page {
                        Some(page) => println!(
                            "[score={} idx={} page={}]\n{}",
                            hit.score, hit.chunk.index, page, hit.chunk.text
                        ),
                        None => println!(
                            "[score={} idx={}]\n{}",
                            hit.score, hit.chunk.index, hit.chunk.text
                        ),
                    }
                }
            }
        }
        Command::Summarize { file } => {
            let model =
                GeminiClient::from_env().map_err(|error| anyhow::anyhow!(error.to_string()))?;
            let pipeline = RecallPipeline::new(build_store(&cli), model);

            let summary = pipeline
                .summarize(Path::new(file))
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            println!("{summary}");
        }
    }

    Ok(())
}
