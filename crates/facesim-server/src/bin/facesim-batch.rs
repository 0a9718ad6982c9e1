//! Batch ingestion from an image directory
//!
//! Usage: `facesim-batch <image-dir> [query-label]`
//!
//! Ingests every `jpg`/`jpeg`/`png` file directly inside `image-dir`, then,
//! when a label is given, prints the most similar stored face.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use facesim_core::{ImageData, IngestionReport};
use facesim_server::{create_app_state, logging::init_logging, ServerConfig};

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

async fn read_images(dir: &Path) -> Result<Vec<ImageData>> {
    let mut paths: Vec<PathBuf> = Vec::new();
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to read directory {}", dir.display()))?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && is_image(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => {
                warn!(path = %path.display(), "Skipping file with a non UTF-8 name");
                continue;
            }
        };
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        images.push(ImageData::named(name, bytes));
    }
    Ok(images)
}

fn log_failures(report: &IngestionReport) {
    for failure in &report.failures {
        warn!(source = %failure.source, reason = %failure.reason, "{}", failure.message);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(dir) = args.next() else {
        bail!("usage: facesim-batch <image-dir> [query-label]");
    };
    let query_label = args.next();

    let config = ServerConfig::load().context("Failed to load configuration")?;
    init_logging(&config).context("Failed to initialize logging")?;

    let state = create_app_state(&config)
        .await
        .context("Failed to set up the face pipeline")?;

    let images = read_images(Path::new(&dir)).await?;
    info!(images = images.len(), dir = %dir, "Found images");

    let report = match state.ingestion.ingest_batch(&images).await {
        Ok(report) => report,
        Err(aborted) => {
            log_failures(&aborted.report);
            error!(
                images = aborted.report.images_processed,
                stored = ?aborted.report.stored,
                "Ingestion stopped early, the listed faces were stored"
            );
            return Err(aborted).context("Ingestion aborted");
        }
    };
    log_failures(&report);
    info!(
        images = report.images_processed,
        stored = report.stored.len(),
        failures = report.failures.len(),
        "Ingestion finished"
    );

    if let Some(label) = query_label {
        match state
            .query
            .find_most_similar(&label)
            .await
            .with_context(|| format!("Lookup for '{}' failed", label))?
        {
            Some(best) => println!("{} -> {} (score {:.4})", label, best.label, best.score),
            None => println!("{} -> no other faces stored", label),
        }
    }

    Ok(())
}
