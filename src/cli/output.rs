//! Output formatting for CLI results

use chrono::{DateTime, Local};
use colorful::Colorful;
use serde::Serialize;

use crate::core::dsp::ComponentStatistics;
use crate::core::JobPhase;

/// Everything reported about one CLI run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub timestamp: DateTime<Local>,
    pub inputs: Vec<String>,
    pub shape: (usize, usize),
    pub mode: String,
    pub output_port: usize,
    pub generation: u64,
    pub status: JobPhase,
    pub progress: u8,
    pub elapsed_ms: u64,
    pub output_path: Option<String>,
    pub output_statistics: Option<ComponentStatistics>,
    pub written_files: Vec<String>,
    pub error: Option<String>,
}

impl RunSummary {
    pub fn success(&self) -> bool {
        self.status == JobPhase::Completed
    }
}

/// Terminal report
pub fn format_summary(summary: &RunSummary, verbose: bool) -> String {
    let mut output = String::new();

    let status = match summary.status {
        JobPhase::Completed => "✓ MIXED".green().to_string(),
        JobPhase::Cancelled => "■ CANCELLED".yellow().to_string(),
        _ => "✗ FAILED".red().to_string(),
    };
    output.push_str(&format!("{} {}\n", status, summary.mode.as_str().cyan()));

    for (slot, input) in summary.inputs.iter().enumerate() {
        output.push_str(&format!("  Slot {}: {}\n", slot, input));
    }
    output.push_str(&format!("  Size: {}x{}\n", summary.shape.1, summary.shape.0));
    output.push_str(&format!("  Output port: {}\n", summary.output_port));

    if let Some(path) = &summary.output_path {
        output.push_str(&format!("  Saved to: {}\n", path));
    }
    if let Some(error) = &summary.error {
        output.push_str(&format!("  Error: {}\n", error.as_str().red()));
    }

    if verbose {
        output.push_str(&format!(
            "\n  Job {} finished at {}% in {} ms\n",
            summary.generation, summary.progress, summary.elapsed_ms
        ));
        if let Some(stats) = &summary.output_statistics {
            output.push_str(&format!(
                "  Output: min {:.1}, max {:.1}, mean {:.1}, std {:.1}, median {:.1}\n",
                stats.min, stats.max, stats.mean, stats.std, stats.median
            ));
        }
        for file in &summary.written_files {
            output.push_str(&format!("  Wrote {}\n", file));
        }
    }

    output
}

pub fn print_summary(summary: &RunSummary, verbose: bool) {
    print!("{}", format_summary(summary, verbose));
}

pub fn print_json(summary: &RunSummary) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(status: JobPhase) -> RunSummary {
        RunSummary {
            timestamp: Local::now(),
            inputs: vec!["a.png".to_string(), "b.png".to_string()],
            shape: (64, 32),
            mode: "magnitude_phase".to_string(),
            output_port: 1,
            generation: 1,
            status,
            progress: 100,
            elapsed_ms: 12,
            output_path: Some("mixed.png".to_string()),
            output_statistics: None,
            written_files: Vec::new(),
            error: None,
        }
    }

    #[test]
    fn test_text_summary_mentions_inputs() {
        let text = format_summary(&summary(JobPhase::Completed), false);
        assert!(text.contains("MIXED"));
        assert!(text.contains("Slot 1: b.png"));
        assert!(text.contains("Size: 32x64"));
    }

    #[test]
    fn test_json_summary_fields() {
        let json = serde_json::to_value(summary(JobPhase::Cancelled)).unwrap();
        assert_eq!(json["status"], "cancelled");
        assert_eq!(json["output_port"], 1);
        assert_eq!(json["shape"][0], 64);
        assert!(!summary(JobPhase::Cancelled).success());
    }
}
