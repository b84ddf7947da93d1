//! Fourier Mixer - blend images in the frequency domain
//!
//! Combines the 2-D Fourier spectra of up to four grayscale images into a
//! new image. Each spectral component (magnitude, phase, real, imaginary) is
//! blended with its own weight per source, optionally restricted to an inner
//! (low-frequency) or outer (high-frequency) rectangle, and the result is
//! reconstructed with an inverse transform.
//!
//! ## Features
//!
//! - **Spectrum cache**: per-slot centered FFT, recomputed only when the image changes
//! - **Two mixing modes**: magnitude/phase (polar) and real/imaginary (Cartesian)
//! - **Frequency regions**: inner/outer rectangles, settable per component
//! - **Background jobs**: cancellable, progress-reporting, one at a time, generation-tagged
//! - **Component display**: log-scaled magnitude, min-max normalization, brightness/contrast
//!
//! ## Module Structure
//!
//! - `core` - FFT, mixing, masks, reconstruction, jobs and the workspace façade
//! - `config` - Mix settings and the JSON mix request
//! - `cli` - Command-line interface
//! - `error` - Error type shared by every module
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fourier_mixer::{MixRequest, MixerWorkspace, OutputPort};
//!
//! let mut workspace = MixerWorkspace::default();
//! workspace.load_image(0, "a.png")?;
//! workspace.load_image(1, "b.png")?;
//! workspace.resize_all()?;
//!
//! // Magnitude from slot 0, phase from slot 1
//! let request = MixRequest::from_json(
//!     r#"{"weights": {"magnitude": [1, 0], "phase": [0, 1]}}"#,
//! )?;
//! let handle = workspace.mix_async(&request, |outcome| {
//!     println!("job {} finished", outcome.generation);
//! })?;
//! handle.wait()?;
//!
//! let pixels = workspace.output_bytes(OutputPort::First)?;
//! ```
//!
//! ## Progress Checkpoints
//!
//! | Progress | Stage                                  |
//! |----------|----------------------------------------|
//! | 10       | Mixing started                         |
//! | 50       | Mix done (cancellation checked)        |
//! | 70       | Frequency un-shift done                |
//! | 90       | Inverse FFT done (cancellation checked)|
//! | 100      | Normalized output written to its port  |

// Frequency-domain core
pub mod core;

// Command-line interface
pub mod cli;

// Settings and mix requests
pub mod config;

// Error types
pub mod error;

// Re-export commonly used types at crate root for convenience
pub use config::{
    ComponentKind, MixMode, MixRequest, MixSettings, MixSettingsBuilder, OutputPort, RegionConfig,
    RegionKind,
};
pub use core::{
    DisplayAdjust, Grid, ImageSlot, JobConfig, JobController, JobHandle, JobOutcome, JobResult,
    MixerWorkspace, Spectrum,
};
pub use error::{MixResult, MixerError};
