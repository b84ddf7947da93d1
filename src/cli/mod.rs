// src/cli/mod.rs
//
// Command-line interface module

mod args;
mod output;

pub use args::Args;
pub use output::{format_summary, print_json, print_summary, RunSummary};

use anyhow::{Context, Result};
use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::config::MixMode;
use crate::core::dsp::ComponentStatistics;
use crate::core::reconstruct::to_bytes;
use crate::core::visualization::save_gray;
use crate::core::{JobOutcome, JobPhase, JobResult, MixerWorkspace};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Run the CLI: load, mix in the background, save and report
pub fn run(args: &Args) -> Result<RunSummary> {
    let started = Instant::now();
    let mut workspace = MixerWorkspace::new(args.job_config());

    for (slot, path) in args.inputs.iter().enumerate() {
        workspace
            .load_image(slot, path)
            .with_context(|| format!("Failed to load {}", path.display()))?;
    }
    let shape = workspace.resize_all()?;
    let request = args.to_request()?;

    let handle = workspace.mix_async(&request, |outcome: &JobOutcome| {
        info!("Job {} reported {:?}", outcome.generation, outcome.result.phase());
    })?;
    let generation = handle.generation();

    let outcome = if args.no_progress || args.json {
        handle.wait()?
    } else {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:40.cyan/blue}] {pos}% | {msg}")?
                .progress_chars("█▓░"),
        );
        bar.set_message("mixing");
        let outcome = loop {
            bar.set_position(handle.progress() as u64);
            if let Some(outcome) = handle.wait_timeout(POLL_INTERVAL) {
                break outcome;
            }
        };
        bar.set_position(handle.progress() as u64);
        bar.finish_and_clear();
        outcome
    };

    let mut summary = RunSummary {
        timestamp: Local::now(),
        inputs: args.inputs.iter().map(|p| p.display().to_string()).collect(),
        shape,
        mode: request.mode.clone(),
        output_port: outcome.port.index(),
        generation,
        status: outcome.result.phase(),
        progress: workspace.progress().progress,
        elapsed_ms: 0,
        output_path: None,
        output_statistics: None,
        written_files: Vec::new(),
        error: None,
    };

    match &outcome.result {
        JobResult::Completed(image) => {
            save_gray(&to_bytes(image), &args.output)
                .with_context(|| format!("Failed to write {}", args.output.display()))?;
            summary.output_path = Some(args.output.display().to_string());
            summary.output_statistics = Some(ComponentStatistics::from_grid("output", image));
        }
        JobResult::Cancelled => summary.error = Some("mix was cancelled".to_string()),
        JobResult::Failed(message) => summary.error = Some(message.clone()),
    }

    if let Some(dir) = &args.components_dir {
        summary.written_files = write_components(&workspace, dir)?;
    }

    summary.elapsed_ms = started.elapsed().as_millis() as u64;
    if summary.status != JobPhase::Completed {
        info!("Mix did not complete: {:?}", summary.status);
    }
    Ok(summary)
}

/// Component grid per loaded slot plus the current mask of each mixed component
fn write_components(workspace: &MixerWorkspace, dir: &Path) -> Result<Vec<String>> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let mut written = Vec::new();

    for slot in workspace.loaded_slots() {
        let path = dir.join(format!("slot{}_components.png", slot));
        save_gray(&workspace.component_grid(slot, true)?, &path)?;
        written.push(path.display().to_string());
    }

    let mode = workspace
        .settings()
        .map(|s| s.mode())
        .unwrap_or(MixMode::MagnitudePhase);
    for kind in mode.components() {
        let path = dir.join(format!("mask_{}.png", kind.name()));
        save_gray(&workspace.mask_visualization(kind)?, &path)?;
        written.push(path.display().to_string());
    }

    Ok(written)
}
