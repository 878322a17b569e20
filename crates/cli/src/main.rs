//! Tansu CLI
//!
//! Operator commands for a Tansu media storage deployment: provision the
//! backend, mirror static assets, and manage individual attachments.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use tansu_record::MediaId;
use tansu_service::{MediaConfig, MediaService, build_service};
use tansu_storage::{FetchResponse, guess_content_type};

/// Tansu CLI — manage media storage for an imageboard deployment.
#[derive(Parser, Debug)]
#[command(name = "tansu", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, env = "TANSU_CONFIG", default_value = "tansu.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ensure the storage backend's directories or buckets exist.
    Bootstrap,
    /// Mirror the static asset tree into the backend.
    SyncStatic,
    /// Upload a file as a new attachment.
    Save {
        /// File to upload; its name supplies the stored extension.
        file: PathBuf,
        /// Declared content type. Guessed from the extension when omitted.
        #[arg(long)]
        mimetype: Option<String>,
    },
    /// Retrieve an attachment's bytes or redirect URL.
    Fetch {
        /// Media id.
        id: i64,
        /// Write bytes here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Delete an attachment, its thumbnail, and its record.
    Delete {
        /// Media id.
        id: i64,
    },
    /// Print the public URLs for an attachment.
    Url {
        /// Media id.
        id: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = MediaConfig::load(&cli.config)?;
    let service = build_service(&config).await?;

    match cli.command {
        Command::Bootstrap => {
            service.bootstrap().await?;
            println!("backend ready");
        }
        Command::SyncStatic => {
            service.sync_static_assets().await?;
            println!("static assets synced");
        }
        Command::Save { file, mimetype } => save(&service, &file, mimetype).await?,
        Command::Fetch { id, out } => fetch(&service, MediaId(id), out).await?,
        Command::Delete { id } => {
            service.delete(MediaId(id)).await?;
            println!("deleted {id}");
        }
        Command::Url { id } => {
            let record = service.get(MediaId(id)).await?;
            println!("original:  {}", service.media_url(&record));
            println!("thumbnail: {}", service.thumbnail_url(&record));
        }
    }

    Ok(())
}

async fn save(service: &MediaService, file: &Path, mimetype: Option<String>) -> anyhow::Result<()> {
    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("{} has no usable filename", file.display()))?
        .to_owned();
    let mimetype = mimetype.unwrap_or_else(|| guess_content_type(file).to_owned());
    let data = Bytes::from(tokio::fs::read(file).await?);

    let record = service.save(&filename, &mimetype, data).await?;
    println!(
        "saved id={} extension={} mimetype={} animated={}",
        record.id, record.extension, record.mimetype, record.is_animated
    );
    println!("url: {}", service.media_url(&record));
    Ok(())
}

async fn fetch(
    service: &MediaService,
    id: MediaId,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    match service.fetch(id).await? {
        FetchResponse::Bytes {
            data,
            content_type,
            last_modified,
        } => {
            eprintln!("{content_type}, {} bytes, modified {last_modified}", data.len());
            match out {
                Some(path) => tokio::fs::write(&path, &data).await?,
                None => {
                    use std::io::Write;
                    std::io::stdout().write_all(&data)?;
                }
            }
        }
        FetchResponse::Redirect { url } => println!("{url}"),
    }
    Ok(())
}
