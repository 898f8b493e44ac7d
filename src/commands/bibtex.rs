//! BibTeX command handler: resolve harvested records into a `.bib` library.

use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use openaire_core::harvest::bibtex::BibtexClient;
use openaire_core::harvest::doi::record_link_candidate;
use openaire_core::harvest::read_records_json;
use tracing::info;

use crate::app_config::EffectiveConfig;
use crate::cli::BibtexArgs;
use crate::exit_handler::{ProcessExit, determine_exit_outcome};

pub async fn run_bibtex_command(
    args: &BibtexArgs,
    config: &EffectiveConfig,
    show_progress: bool,
) -> Result<ProcessExit> {
    let records = read_records_json(&args.input)
        .await
        .context("Failed to load harvest file")?;
    let candidates: Vec<String> = records.iter().filter_map(record_link_candidate).collect();
    info!(
        records = records.len(),
        candidates = candidates.len(),
        "Found potential DOIs/URLs"
    );

    if candidates.is_empty() {
        println!(
            "No DOIs or URLs found in {} records of {}",
            records.len(),
            args.input.display()
        );
        return Ok(ProcessExit::Success);
    }

    let delay = Duration::from_millis(args.delay_ms.unwrap_or(config.request_delay_ms));
    let client = BibtexClient::new()?
        .with_resolver(args.doi_resolver.as_str())
        .with_delay(delay);

    let progress = progress_bar(show_progress, candidates.len());
    let library = client
        .fetch_library(&candidates, |candidate, _outcome| {
            progress.set_message(candidate.to_string());
            progress.inc(1);
        })
        .await;
    progress.finish_and_clear();

    if library.is_empty() {
        println!(
            "No BibTeX entries were generated from {} DOIs/URLs",
            library.attempted()
        );
    } else {
        library
            .write_to(&args.output)
            .await
            .context("Failed to write BibTeX library")?;
        println!(
            "Created {} with {}/{} entries",
            args.output.display(),
            library.entries().len(),
            library.attempted()
        );
    }

    Ok(determine_exit_outcome(
        library.entries().len(),
        library.failed(),
    ))
}

fn progress_bar(visible: bool, total: usize) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::with_template("[{pos}/{len}] {bar:30} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}
