//! Upload command - attach a document to a startup.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use launchpad_fetch::UploadFile;
use tracing::info;

use super::{json, queries};
use crate::{Cli, OutputFormat};

/// Arguments for the upload command.
#[derive(Args)]
pub struct UploadArgs {
    /// Startup the document belongs to.
    pub startup_id: String,

    /// File to upload.
    pub path: PathBuf,

    /// MIME type. Guessed from the extension when omitted.
    #[arg(long)]
    pub mime: Option<String>,
}

/// Runs the upload command.
pub async fn run(args: &UploadArgs, cli: &Cli) -> Result<()> {
    let bytes = tokio::fs::read(&args.path)
        .await
        .with_context(|| format!("failed to read {}", args.path.display()))?;
    let file_name = args
        .path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", args.path.display()))?;

    let mut file = UploadFile::new(file_name, bytes);
    if let Some(mime) = args.mime.clone().or_else(|| guess_mime(&args.path).map(String::from)) {
        file = file.with_mime(mime);
    }

    let queries = queries(cli).await?;
    let artifact = queries.upload_document(&args.startup_id, file).await?;
    info!(path = %artifact.path, "Document uploaded");

    match cli.format {
        OutputFormat::Text => println!("Uploaded: {}", artifact.url),
        OutputFormat::Json => println!("{}", json(cli).format(&artifact)?),
    }
    Ok(())
}

fn guess_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    Some(match ext.as_str() {
        "pdf" => "application/pdf",
        "txt" | "md" => "text/plain",
        "csv" => "text/csv",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => return None,
    })
}
