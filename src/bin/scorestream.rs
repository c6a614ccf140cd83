//! scorestream: generate and revise music-score documents from the shell
//!
//! Every stream part is written to stdout as one NDJSON envelope while the
//! same parts drive a local artifact state, exactly as a remote consumer
//! would see them. A final JSON line carries the operation summary.
//!
//! ## Usage
//! ```text
//! scorestream [--config <path>] create "<title>"
//! scorestream [--config <path>] update <document-id> "<description>"
//! scorestream [--config <path>] show <document-id>
//! scorestream [--config <path>] list
//! ```
//!
//! ## Configuration
//! - SCORESTREAM_CONFIG: Path to config file (default: config.yaml)
//! - SCORESTREAM_LOG: Log filter (default: info); logs go to stderr

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use scorestream::backend::init_backend;
use scorestream::config::Config;
use scorestream::interfaces::{DocumentStore, StreamWriter, TransportError};
use scorestream::storage::init_storage;
use scorestream::transport::{part_channel, JsonLinesWriter, PartReceiver};
use scorestream::utils::bootstrap::init_tracing;
use scorestream::{DocumentService, Orchestrator};
use scorestream_client::{
    AbcHeaderRenderer, ArtifactState, Document, DocumentKind, RendererHandle, ScoreView,
};

#[derive(Debug, Parser)]
#[command(name = "scorestream", about = "Generate and revise music-score documents")]
struct Cli {
    /// Config file, layered over config.yaml and SCORESTREAM_CONFIG
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a new score from its title
    Create { title: String },
    /// Revise an existing score
    Update { id: Uuid, description: String },
    /// Print a stored document
    Show { id: Uuid },
    /// List stored document ids
    List,
}

/// Mirror parts to stdout and into a local artifact until the producer is
/// done.
fn spawn_consumer(
    mut parts: PartReceiver,
    document: Document,
) -> JoinHandle<Result<ArtifactState, TransportError>> {
    tokio::spawn(async move {
        let stdout = JsonLinesWriter::new(tokio::io::stdout());
        let mut artifact = ArtifactState::new(document);
        let mut view = ScoreView::new(RendererHandle::ready(Arc::new(AbcHeaderRenderer)));

        while let Some(part) = parts.next().await {
            stdout.write(part.clone()).await?;
            artifact.apply(part);
            view.sync(&artifact);
        }
        if artifact.abort() {
            error!("Stream ended before finish; draft discarded");
        }

        match (view.view(), view.error()) {
            (Some(rendered), _) => info!(
                title = ?rendered.title,
                key = %rendered.key,
                voices = rendered.voices.len(),
                "Score rendered"
            ),
            (None, Some(e)) => error!(error = %e, "Score failed to render"),
            (None, None) => {}
        }
        Ok(artifact)
    })
}

async fn print_json(value: &impl serde::Serialize) -> Result<(), Box<dyn std::error::Error>> {
    let mut line = serde_json::to_string(value)?;
    line.push('\n');
    let mut stdout = tokio::io::stdout();
    stdout.write_all(line.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}

async fn document_service(
    config: &Config,
    store: Arc<dyn DocumentStore>,
) -> Result<DocumentService, Box<dyn std::error::Error>> {
    let backend = init_backend(&config.backend).await?;
    Ok(DocumentService::new(store, Orchestrator::new(backend)))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    init_tracing();
    let config_path = cli.config.as_deref().and_then(|path| path.to_str());
    let config = Config::load(config_path)?;

    let store = init_storage(&config.storage).await?;

    let summary = match cli.command {
        Command::Show { id } => return print_json(&store.load(id).await?).await,
        Command::List => return print_json(&store.list().await?).await,
        Command::Create { title } => {
            let service = document_service(&config, store).await?;
            let (writer, receiver) = part_channel(config.stream.channel_capacity);
            let id = Uuid::new_v4();
            let consumer = spawn_consumer(
                receiver,
                Document::new(id, title.clone(), DocumentKind::Music),
            );
            let summary = service
                .create_document_with_id(id, &title, DocumentKind::Music, &writer)
                .await;
            drop(writer);
            let artifact = consumer.await??;
            info!(versions = artifact.document().history.len(), "Consumer finished");
            summary?
        }
        Command::Update { id, description } => {
            let document = store.load(id).await?;
            let service = document_service(&config, store).await?;
            let (writer, receiver) = part_channel(config.stream.channel_capacity);
            let consumer = spawn_consumer(receiver, document);
            let summary = service.update_document(id, &description, &writer).await;
            drop(writer);
            let artifact = consumer.await??;
            info!(versions = artifact.document().history.len(), "Consumer finished");
            summary?
        }
    };

    info!(document_id = %summary.id, versions = summary.versions, "Done");
    print_json(&summary).await
}
