//! Error types for the mixing core

use thiserror::Error;

/// Result type for mixer operations
pub type MixResult<T> = Result<T, MixerError>;

/// Errors raised by the spectrum cache, mixer and job controller
#[derive(Error, Debug)]
pub enum MixerError {
    /// Slot has no image loaded
    #[error("slot {slot} has no image loaded")]
    NotLoaded { slot: usize },

    /// A component projection was requested before the transform ran
    #[error("spectrum not computed for slot {slot}")]
    SpectrumNotComputed { slot: usize },

    /// Weight vector has the wrong length or a negative entry
    #[error("invalid weight: {0}")]
    InvalidWeight(String),

    /// Region position or size outside [0, 1]
    #[error("invalid region: {0}")]
    InvalidRegion(String),

    /// Active slots differ in dimensions
    #[error("shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Buffer length does not match the declared dimensions
    #[error("buffer length {found} does not match dimensions ({expected} cells)")]
    DataLength { expected: usize, found: usize },

    #[error("no active slots to mix")]
    NoActiveSlots,

    #[error("invalid mixing mode: {0}")]
    InvalidMode(String),

    #[error("invalid slot index {0} (must be 0-3)")]
    InvalidSlot(usize),

    #[error("invalid output port {0} (must be 0 or 1)")]
    InvalidPort(usize),

    #[error("output port {port} holds no image yet")]
    NoOutput { port: usize },

    #[error("invalid component type: {0}")]
    InvalidComponent(String),

    /// Cooperative cancellation observed at a checkpoint
    #[error("operation cancelled")]
    Cancelled,

    /// The background job panicked or failed outside the mixing code
    #[error("job failed: {0}")]
    JobFailed(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}
