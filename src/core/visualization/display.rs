// src/core/visualization/display.rs
//
// Turns raw spectral components into byte images for inspection.

use serde::{Deserialize, Serialize};

use crate::config::ComponentKind;
use crate::core::dsp::stats::min_max;
use crate::core::dsp::Grid;
use crate::core::spectrum::ImageSlot;
use crate::error::{MixResult, MixerError};

/// Window/level adjustment applied after normalization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayAdjust {
    /// Added after scaling, typically -255..255
    pub brightness: f64,
    /// Multiplier, typically 0.5..3.0
    pub contrast: f64,
}

impl Default for DisplayAdjust {
    fn default() -> Self {
        Self {
            brightness: 0.0,
            contrast: 1.0,
        }
    }
}

impl DisplayAdjust {
    pub fn new(brightness: f64, contrast: f64) -> Self {
        Self { brightness, contrast }
    }

    pub fn is_identity(&self) -> bool {
        self.brightness == 0.0 && self.contrast == 1.0
    }

    /// `clamp(v * contrast + brightness, 0, 255)`
    pub fn apply(&self, value: f64) -> f64 {
        (value * self.contrast + self.brightness).clamp(0.0, 255.0)
    }
}

/// Min-max scale into `[lo, hi]`; a flat input maps to the midpoint
pub fn normalize_for_display(values: &Grid<f64>, lo: f64, hi: f64) -> Grid<f64> {
    let (min, max) = min_max(values.as_slice());
    if max == min {
        let mid = (lo + hi) / 2.0;
        return values.map(|_| mid);
    }
    let span = max - min;
    values.map(|v| (v - min) / span * (hi - lo) + lo)
}

/// `ln(1 + x)`, compressing the magnitude's dynamic range
pub fn log_scale(magnitude: &Grid<f64>) -> Grid<f64> {
    magnitude.map(f64::ln_1p)
}

/// Display-ready bytes for one component
pub fn prepare(component: &Grid<f64>, kind: ComponentKind, adjust: &DisplayAdjust) -> Grid<u8> {
    let normalized = match kind {
        ComponentKind::Magnitude => normalize_for_display(&log_scale(component), 0.0, 255.0),
        ComponentKind::Phase | ComponentKind::Real | ComponentKind::Imaginary => {
            normalize_for_display(component, 0.0, 255.0)
        }
    };

    if adjust.is_identity() {
        normalized.map(|v| v as u8)
    } else {
        normalized.map(|v| adjust.apply(v) as u8)
    }
}

/// All four components of one slot, ready for display
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedComponents {
    pub magnitude: Grid<u8>,
    pub phase: Grid<u8>,
    pub real: Grid<u8>,
    pub imaginary: Grid<u8>,
}

impl PreparedComponents {
    pub fn get(&self, kind: ComponentKind) -> &Grid<u8> {
        match kind {
            ComponentKind::Magnitude => &self.magnitude,
            ComponentKind::Phase => &self.phase,
            ComponentKind::Real => &self.real,
            ComponentKind::Imaginary => &self.imaginary,
        }
    }
}

/// Prepare every component of a slot with its computed spectrum
pub fn prepare_all(slot: &ImageSlot) -> MixResult<PreparedComponents> {
    let plain = DisplayAdjust::default();
    let one = |kind: ComponentKind| -> MixResult<Grid<u8>> {
        Ok(prepare(&slot.component(kind)?, kind, &plain))
    };
    Ok(PreparedComponents {
        magnitude: one(ComponentKind::Magnitude)?,
        phase: one(ComponentKind::Phase)?,
        real: one(ComponentKind::Real)?,
        imaginary: one(ComponentKind::Imaginary)?,
    })
}

/// Mosaic of a slot's components.
///
/// With the original: `[original, magnitude, phase] / [real, imaginary, blank]`.
/// Without: `[magnitude, phase] / [real, imaginary]`.
pub fn component_grid(slot: &ImageSlot, include_original: bool) -> MixResult<Grid<u8>> {
    let parts = prepare_all(slot)?;

    if include_original {
        let image = slot
            .image()
            .ok_or(MixerError::NotLoaded { slot: slot.index() })?;
        let original = normalize_for_display(image, 0.0, 255.0).map(|v| v as u8);
        let (rows, cols) = original.shape();
        let blank = Grid::filled(rows, cols, 0u8);
        Ok(tile(&[
            [&original, &parts.magnitude, &parts.phase].as_slice(),
            [&parts.real, &parts.imaginary, &blank].as_slice(),
        ]))
    } else {
        Ok(tile(&[
            [&parts.magnitude, &parts.phase].as_slice(),
            [&parts.real, &parts.imaginary].as_slice(),
        ]))
    }
}

/// Stack equally sized tiles row by row
fn tile(layout: &[&[&Grid<u8>]]) -> Grid<u8> {
    let (tile_rows, tile_cols) = layout
        .first()
        .and_then(|row| row.first())
        .map(|t| t.shape())
        .unwrap_or((0, 0));
    let per_row = layout.iter().map(|row| row.len()).max().unwrap_or(0);

    Grid::from_fn(layout.len() * tile_rows, per_row * tile_cols, |r, c| {
        layout[r / tile_rows.max(1)]
            .get(c / tile_cols.max(1))
            .and_then(|t| t.get(r % tile_rows.max(1), c % tile_cols.max(1)))
            .unwrap_or(0)
    })
}
