// Stratabin - workspace core command line
// Entry point and logging setup

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stratabin::app::{self, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "stratabin")]
#[command(about = "Stratabin workspace tools", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding settings, database and backups
    #[arg(long, global = true, env = "STRATABIN_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print an overview of the stored workspace
    Summary,

    /// Write the workspace as JSON to a file
    Export {
        path: PathBuf,
    },

    /// Create a backup archive
    Backup,

    /// List backup archives, newest first
    ListBackups,

    /// Replace the workspace with a backup archive
    Restore {
        file: PathBuf,
    },

    /// Send a chat message for a canvas and print the reply
    Chat {
        canvas_id: String,
        message: String,
    },
}

fn default_data_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".stratabin")
}

async fn print_summary(state: &AppState) {
    let store = state.store.lock().await;
    let snapshot = store.snapshot();

    println!("Data directory: {}", state.app_data_dir.display());
    println!("Storage backend: {}", state.persistence.backend().name());
    println!("Canvases: {} ({} pinned)", snapshot.canvases.len(), store.pinned_canvases().len());
    println!("Folders: {}", snapshot.folders.len());
    println!("Timelines: {}", snapshot.timelines.len());
    println!("Diagrams: {}", snapshot.diagrams.len());
    println!("Calendar days: {}", store.dates_with_events().len());

    for canvas in store.canvases().values() {
        println!("  {}  {}", canvas.id, canvas.display_name());
    }
}

async fn run(state: &AppState, command: Commands) -> Result<()> {
    match command {
        Commands::Summary => print_summary(state).await,
        Commands::Export { path } => {
            let snapshot = state.store.lock().await.snapshot();
            let json = serde_json::to_string_pretty(&snapshot)?;
            tokio::fs::write(&path, json)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Exported workspace to {}", path.display());
        }
        Commands::Backup => {
            let path = state.create_backup().await?;
            println!("Backup written to {}", path.display());
        }
        Commands::ListBackups => {
            for backup in state.backup_service.list_backups().await? {
                println!(
                    "{}  {} bytes  {}",
                    backup.created_at.format("%Y-%m-%d %H:%M:%S"),
                    backup.size,
                    backup.path.display()
                );
            }
        }
        Commands::Restore { file } => {
            state.restore_backup(&file).await?;
            println!("Workspace restored from {}", file.display());
        }
        Commands::Chat { canvas_id, message } => {
            let reply = state.chat_service.send_message(&canvas_id, &message).await?;
            println!("{}", reply.content);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stratabin=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);

    tracing::info!("Starting Stratabin");

    let state = app::setup(data_dir)
        .await
        .context("Failed to initialize application")?;

    let result = run(&state, cli.command.unwrap_or(Commands::Summary)).await;
    state.shutdown().await?;

    result
}
