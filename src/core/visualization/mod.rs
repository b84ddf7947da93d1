//! Visualization of spectral components
//!
//! Normalizes magnitude, phase, real and imaginary components into byte
//! images and writes them out as PNG files.

mod display;
mod export;

pub use display::{
    component_grid,
    log_scale,
    normalize_for_display,
    prepare,
    prepare_all,
    DisplayAdjust,
    PreparedComponents,
};
pub use export::{save_gray, to_gray_image};
