//! Digital signal processing utilities
//!
//! - `grid` - row-major 2-D array shared by every stage
//! - `fft` - 2-D forward/inverse FFT and the centering shifts
//! - `stats` - min/max, correlation, edge strength, component statistics

pub mod fft;
pub mod grid;
pub mod stats;

pub use fft::{fft_shift, ifft_shift, Fft2d};
pub use grid::Grid;
pub use stats::ComponentStatistics;
