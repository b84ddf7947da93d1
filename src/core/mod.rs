//! Frequency-domain mixing core

pub mod dsp;
pub mod job;
pub mod mask;
pub mod mixer;
pub mod reconstruct;
pub mod spectrum;
pub mod visualization;
pub mod workspace;

pub use dsp::{ComponentStatistics, Fft2d, Grid};
pub use job::{JobConfig, JobContext, JobController, JobHandle, JobOutcome, JobPhase, JobResult};
pub use mask::{build_mask, region_bounds, region_from_corners, RegionBounds};
pub use mixer::mix;
pub use reconstruct::reconstruct;
pub use spectrum::{ImageSlot, Spectrum};
pub use visualization::{DisplayAdjust, PreparedComponents};
pub use workspace::{MixSummary, MixerWorkspace, ProgressReport, WorkspaceStatus};
