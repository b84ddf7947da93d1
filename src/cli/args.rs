//! CLI argument definitions and conversion into a mix request

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{ComponentKind, MixMode, MixRequest, RegionKind, RegionRequest, WeightsRequest, MAX_SLOTS};
use crate::core::JobConfig;

#[derive(Parser, Debug, Clone)]
#[command(name = "fourier-mixer")]
#[command(version, about = "Blend up to four images in the Fourier domain")]
pub struct Args {
    /// Input images, loaded into slots 0-3 in order
    #[arg(required = true, num_args = 1..=4)]
    pub inputs: Vec<PathBuf>,

    /// Mixing mode (magnitude_phase or real_imaginary)
    #[arg(short, long, default_value = "magnitude_phase")]
    pub mode: String,

    /// Magnitude weights, one per input (comma separated)
    #[arg(long, value_delimiter = ',', value_name = "W,...")]
    pub magnitude: Option<Vec<f64>>,

    /// Phase weights, one per input
    #[arg(long, value_delimiter = ',', value_name = "W,...")]
    pub phase: Option<Vec<f64>>,

    /// Real-part weights, one per input
    #[arg(long, value_delimiter = ',', value_name = "W,...")]
    pub real: Option<Vec<f64>>,

    /// Imaginary-part weights, one per input
    #[arg(long, value_delimiter = ',', value_name = "W,...")]
    pub imaginary: Option<Vec<f64>>,

    /// Restrict mixing to a rectangular frequency region
    #[arg(long)]
    pub region: bool,

    /// Region center column (fraction of width)
    #[arg(long, default_value_t = 0.5)]
    pub region_x: f64,

    /// Region center row (fraction of height)
    #[arg(long, default_value_t = 0.5)]
    pub region_y: f64,

    /// Region width (fraction of width)
    #[arg(long, default_value_t = 0.3)]
    pub region_width: f64,

    /// Region height (fraction of height)
    #[arg(long, default_value_t = 0.3)]
    pub region_height: f64,

    /// Region type for every component (inner or outer)
    #[arg(long, default_value = "inner")]
    pub region_type: String,

    /// Region type for one component, e.g. phase=outer (repeatable)
    #[arg(long = "component-region", value_name = "COMPONENT=TYPE")]
    pub component_regions: Vec<String>,

    /// Read the mix request from a JSON file instead of the flags above
    #[arg(long, conflicts_with_all = ["magnitude", "phase", "real", "imaginary", "region"])]
    pub request: Option<PathBuf>,

    /// Output port receiving the result (0 or 1)
    #[arg(short, long, default_value_t = 0)]
    pub port: usize,

    /// Output image path
    #[arg(short, long, default_value = "mixed.png")]
    pub output: PathBuf,

    /// Directory for per-slot component grids and region masks
    #[arg(long)]
    pub components_dir: Option<PathBuf>,

    /// Print a JSON summary instead of text
    #[arg(long)]
    pub json: bool,

    /// Verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// How long a replaced job may take to stop, in milliseconds
    #[arg(long, env = "FOURIER_MIXER_CANCEL_WAIT_MS", default_value_t = 1000)]
    pub cancel_wait_ms: u64,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

impl Args {
    pub fn job_config(&self) -> JobConfig {
        JobConfig {
            cancel_wait: Duration::from_millis(self.cancel_wait_ms),
            ..JobConfig::default()
        }
    }

    /// Build the mix request from a JSON file or from the flags.
    ///
    /// Without any weight flags every input contributes equally to both
    /// components of the mode.
    pub fn to_request(&self) -> Result<MixRequest> {
        if let Some(path) = &self.request {
            return MixRequest::load(path)
                .with_context(|| format!("Failed to read mix request {}", path.display()));
        }

        if self.inputs.len() > MAX_SLOTS {
            bail!("At most {} inputs are supported", MAX_SLOTS);
        }
        let mode = MixMode::from_name(&self.mode)?;

        let mut weights = WeightsRequest {
            magnitude: self.magnitude.clone(),
            phase: self.phase.clone(),
            real: self.real.clone(),
            imaginary: self.imaginary.clone(),
        };
        let no_weights = mode.components().iter().all(|&k| weights.get(k).is_none());
        if no_weights {
            let share = vec![1.0 / self.inputs.len() as f64; self.inputs.len()];
            for kind in mode.components() {
                set_weights(&mut weights, kind, share.clone());
            }
        }

        let mut region = RegionRequest {
            enabled: self.region,
            x: self.region_x,
            y: self.region_y,
            width: Some(self.region_width),
            height: Some(self.region_height),
            kind: Some(RegionKind::from_name(&self.region_type)?.name().to_string()),
            ..RegionRequest::default()
        };
        for entry in &self.component_regions {
            let (component, kind) = parse_component_region(entry)?;
            let kind = Some(kind.name().to_string());
            match component {
                ComponentKind::Magnitude => region.magnitude = kind,
                ComponentKind::Phase => region.phase = kind,
                ComponentKind::Real => region.real = kind,
                ComponentKind::Imaginary => region.imaginary = kind,
            }
        }

        Ok(MixRequest {
            active_slots: Some((0..self.inputs.len()).collect()),
            mode: mode.name().to_string(),
            weights,
            region,
            output_port: self.port,
        })
    }
}

fn set_weights(weights: &mut WeightsRequest, kind: ComponentKind, values: Vec<f64>) {
    match kind {
        ComponentKind::Magnitude => weights.magnitude = Some(values),
        ComponentKind::Phase => weights.phase = Some(values),
        ComponentKind::Real => weights.real = Some(values),
        ComponentKind::Imaginary => weights.imaginary = Some(values),
    }
}

/// Parse `component=type`, e.g. `phase=outer`
fn parse_component_region(entry: &str) -> Result<(ComponentKind, RegionKind)> {
    let (component, kind) = entry
        .split_once('=')
        .with_context(|| format!("Invalid component region '{}'. Use COMPONENT=inner|outer", entry))?;
    Ok((ComponentKind::from_name(component.trim())?, RegionKind::from_name(kind.trim())?))
}
