//! Command-line client for a landrop server.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use landrop_client::{HttpTransport, UploadEvent, Uploader};
use landrop_protocol::size::{format_size, parse_size};

#[derive(Debug, Parser)]
#[command(name = "landrop", about = "Local-network file manager client")]
struct Cli {
    /// Server base URL.
    #[arg(long, global = true, default_value = "http://localhost:8736")]
    server: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Upload one or more files.
    Send {
        /// Files to upload.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Destination directory, relative to the server's storage root.
        #[arg(long, default_value = "")]
        to: String,

        /// Chunk threshold override, e.g. "5MB".
        #[arg(long)]
        chunk_size: Option<String>,
    },
    /// List a directory.
    Ls {
        #[arg(default_value = "")]
        path: String,
    },
    /// Delete a file or directory.
    Rm { path: String },
    /// Download a file.
    Fetch {
        path: String,

        /// Output file (defaults to the remote file name).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show server storage status.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let transport = HttpTransport::new(&cli.server);

    match cli.command {
        Command::Send {
            files,
            to,
            chunk_size,
        } => send(transport, files, to, chunk_size).await,
        Command::Ls { path } => {
            let listing = transport.list(&path).await?;
            for dir in &listing.directories {
                println!("{}/", dir.name);
            }
            for file in &listing.files {
                println!("{:<40} {:>10}  {}", file.name, file.size_formatted, file.uploaded_at);
            }
            Ok(())
        }
        Command::Rm { path } => {
            transport.delete(&path).await?;
            println!("deleted {path}");
            Ok(())
        }
        Command::Fetch { path, output } => {
            let bytes = transport.download(&path).await?;
            let target = output.unwrap_or_else(|| {
                PathBuf::from(path.rsplit('/').next().unwrap_or("download"))
            });
            tokio::fs::write(&target, &bytes).await?;
            println!("fetched {} ({} bytes)", target.display(), bytes.len());
            Ok(())
        }
        Command::Status => {
            let status = transport.status().await?;
            println!("server:     {}", status.name);
            println!("used:       {}", status.used_formatted);
            println!("chunk size: {}", format_size(status.chunk_size));
            if status.max_upload_size > 0 {
                println!("max upload: {}", format_size(status.max_upload_size));
            }
            Ok(())
        }
    }
}

async fn send(
    transport: HttpTransport,
    files: Vec<PathBuf>,
    to: String,
    chunk_size: Option<String>,
) -> anyhow::Result<()> {
    // Prefer the server's advertised chunk size; a CLI flag overrides.
    let chunk_bytes = match chunk_size {
        Some(text) => match parse_size(&text) {
            0 => anyhow::bail!("unparseable chunk size: {text}"),
            bytes => bytes,
        },
        None => transport.status().await.map(|s| s.chunk_size).unwrap_or(0),
    };

    let mut uploader = Uploader::new(Arc::new(transport));
    if chunk_bytes > 0 {
        uploader = uploader.with_chunk_size(chunk_bytes);
    }

    // Ctrl-C stops before the next chunk goes out.
    let cancel = uploader.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let (tx, mut rx) = tokio::sync::mpsc::channel(64);
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                UploadEvent::FileStarted {
                    file_name,
                    file_size,
                    total_chunks,
                } => {
                    println!("{file_name}: {file_size} bytes in {total_chunks} chunk(s)");
                }
                UploadEvent::Progress(p) => {
                    println!("{}: {:.0}%", p.file_name, p.fraction() * 100.0);
                }
                UploadEvent::FileCompleted { record } => {
                    println!("{}: done ({})", record.name, record.size_formatted);
                }
                UploadEvent::FileFailed { file_name, error } => {
                    eprintln!("{file_name}: failed: {error}");
                }
            }
        }
    });

    let report = uploader.upload_many(&files, &to, &tx).await;
    drop(tx);
    let _ = printer.await;

    println!("{}", report.summary());
    if !report.all_succeeded() {
        std::process::exit(1);
    }
    Ok(())
}
