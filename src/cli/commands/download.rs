//! Download command.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use crate::config::Settings;
use crate::govinfo::GovInfoClient;
use crate::models::{Congress, DocumentId, FileFormat};
use crate::services::{AcquireTarget, DownloadConfig, DownloadEvent, DownloadService};
use crate::utils::format_size;

/// Build acquisition targets from the raw arguments.
fn build_targets(ids: &[String], congresses: &[String]) -> anyhow::Result<Vec<AcquireTarget>> {
    let mut targets = Vec::with_capacity(ids.len() + congresses.len());
    for raw in congresses {
        targets.push(AcquireTarget::Congress(Congress::parse(raw)?));
    }
    for raw in ids {
        let id = DocumentId::parse(raw)?;
        // Rejected here so a bad id fails before any network activity
        id.congress()?;
        targets.push(AcquireTarget::Document(id));
    }
    if targets.is_empty() {
        anyhow::bail!("nothing to download: pass --id and/or --congress");
    }
    Ok(targets)
}

/// Download one format for a set of documents and Congresses.
pub async fn cmd_download(
    settings: &Settings,
    ids: &[String],
    congresses: &[String],
    format: FileFormat,
) -> anyhow::Result<()> {
    let targets = build_targets(ids, congresses)?;
    let archive = GovInfoClient::new(settings.archive_config()?)?;

    settings.ensure_directories()?;
    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    let service = DownloadService::new(
        ctx,
        archive,
        DownloadConfig {
            downloads_dir: settings.downloads_dir.clone(),
        },
    );

    let (event_tx, mut event_rx) = mpsc::channel::<DownloadEvent>(100);
    let service = service.with_events(event_tx);

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message("listing");

    // Spawn event handler task (UI layer)
    let progress = pb.clone();
    let event_handler = tokio::spawn(async move {
        let mut bytes = 0u64;
        while let Some(event) = event_rx.recv().await {
            match event {
                DownloadEvent::Listed { congress, count } => {
                    progress.println(format!(
                        "  {} {}: {} documents listed",
                        style("→").dim(),
                        congress,
                        count
                    ));
                }
                DownloadEvent::Queued { total } => {
                    progress.set_length(total as u64);
                    progress.set_message("");
                }
                DownloadEvent::Started { id } => {
                    progress.set_message(id.to_string());
                }
                DownloadEvent::Skipped { .. } => progress.inc(1),
                DownloadEvent::Completed { bytes: n, .. } => {
                    bytes += n as u64;
                    progress.inc(1);
                }
                DownloadEvent::Failed { id, error } => {
                    progress.println(format!(
                        "{} Failed to download {}: {}",
                        style("✗").red(),
                        id,
                        error
                    ));
                    progress.inc(1);
                }
            }
        }
        bytes
    });

    let result = service.acquire(&targets, format).await;
    // Closing the channel lets the handler finish
    drop(service);
    let bytes = match event_handler.await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Event handler task failed: {}", e);
            0
        }
    };
    pb.finish_and_clear();

    let report = result?;

    println!(
        "{} Downloaded {} {} files ({})",
        style("✓").green(),
        report.downloaded.len(),
        format,
        format_size(bytes)
    );
    if !report.skipped.is_empty() {
        println!(
            "  {} {} already present",
            style("→").dim(),
            report.skipped.len()
        );
    }
    if report.registered > 0 {
        println!(
            "  {} {} newly listed documents registered",
            style("→").dim(),
            report.registered
        );
    }

    if !report.is_success() {
        for failure in &report.failed {
            eprintln!("  {} {}: {}", style("✗").red(), failure.id, failure.reason);
        }
        anyhow::bail!(
            "{} of {} downloads failed; run again to retry",
            report.failed.len(),
            report.failed.len() + report.downloaded.len()
        );
    }

    Ok(())
}
