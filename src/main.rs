use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use designpilot::review::display::{history_slots, relative_upload_time, HistorySlot};
use designpilot::review::{
    open_file, ContentKind, FileKeyValueStore, HistoryRecord, HttpAnalysisClient, Reopened,
    UploadFlow,
};
use designpilot::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Portfolio and interview review from the command line.
#[derive(Parser, Debug)]
#[command(name = "designpilot", version, about)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload a file and wait for its analysis
    Upload {
        kind: ContentKind,
        path: PathBuf,
        /// Override the media type guessed from the extension
        #[arg(long)]
        media_type: Option<String>,
    },
    /// List recent uploads
    History { kind: ContentKind },
    /// Show a stored record, analyzing it if it has no result yet
    Show { kind: ContentKind, id: String },
    /// Remove all stored records for a kind
    Clear { kind: ContentKind },
    /// Configuration helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the config file's JSON Schema
    Schema,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Config {
        command: ConfigCommands::Schema,
    } = cli.command
    {
        println!("{}", Config::schema_json()?);
        return Ok(());
    }

    let config = Config::load(cli.config.as_deref())?;
    let kv = FileKeyValueStore::new(&config.history.storage_dir, Some(config.history.quota_bytes))
        .with_context(|| format!("Failed to open history in {}", config.history.storage_dir))?;
    let client = HttpAnalysisClient::new(&config.api.base_url);
    let flow = UploadFlow::with_capacity(Arc::new(client), Arc::new(kv), config.history.capacity);

    match cli.command {
        Commands::Upload {
            kind,
            path,
            media_type,
        } => {
            let file = open_file(&path, media_type.as_deref()).await?;
            let submission = flow.submit(file, kind).await?;
            print_record(kind, submission.record());
            let done = submission.completed().await?;
            println!();
            print_record(kind, &done);
        }
        Commands::History { kind } => {
            let records = flow.history(kind).list();
            let now = Utc::now();
            for slot in history_slots(kind, &records, flow.history(kind).capacity()) {
                match slot {
                    HistorySlot::Filled(record) => println!(
                        "{}  {}  ({})",
                        record.id,
                        record.name,
                        relative_upload_time(&record.upload_time, now)
                    ),
                    HistorySlot::Empty { label } => println!("-  {}  (No upload yet)", label),
                }
            }
        }
        Commands::Show { kind, id } => match flow.reopen(kind, &id).await? {
            Reopened::Cached(record) => print_record(kind, &record),
            Reopened::Pending(submission) => {
                print_record(kind, submission.record());
                let done = submission.completed().await?;
                println!();
                print_record(kind, &done);
            }
            Reopened::Unavailable(record) => {
                print_record(kind, &record);
                println!("No data available for this record");
            }
        },
        Commands::Clear { kind } => {
            flow.history(kind).clear();
            println!("Cleared {} history", kind);
        }
        Commands::Config { .. } => {}
    }

    Ok(())
}

fn print_record(kind: ContentKind, record: &HistoryRecord) {
    println!("{} ({})", record.name, record.file_name);
    println!("  id:       {}", record.id);
    println!("  uploaded: {}", record.upload_time);
    if record.payload_base64.is_empty() {
        println!("  file:     not cached");
    } else {
        println!("  file:     cached ({} bytes encoded)", record.payload_base64.len());
    }
    if kind.has_transcription() {
        println!(
            "  transcription:\n    {}",
            record.transcription_text.as_deref().unwrap_or_default()
        );
    }
    println!("  suggestions:\n    {}", record.suggestion_text);
}
