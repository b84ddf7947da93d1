// src/core/mixer.rs
//
// Component mixing: blends N centered spectra into one, per mode.

use log::debug;
use num_complex::Complex64;
use rayon::prelude::*;

use super::dsp::Grid;
use super::mask::build_mask;
use super::spectrum::Spectrum;
use crate::config::{ComponentKind, MixSettings, RegionConfig};
use crate::error::{MixResult, MixerError};

/// Relative tolerance for treating magnitude and phase weights as equal
const EQUAL_WEIGHT_TOLERANCE: f64 = 1e-9;

/// Shape shared by every spectrum, or the first mismatch
pub fn common_shape(spectra: &[&Spectrum]) -> MixResult<(usize, usize)> {
    let first = spectra.first().ok_or(MixerError::NoActiveSlots)?;
    let expected = first.shape();
    for spectrum in &spectra[1..] {
        if spectrum.shape() != expected {
            return Err(MixerError::ShapeMismatch {
                expected,
                found: spectrum.shape(),
            });
        }
    }
    Ok(expected)
}

/// Mix `spectra` (in the order the weight vectors describe) into one spectrum
pub fn mix(spectra: &[&Spectrum], settings: &MixSettings) -> MixResult<Spectrum> {
    let (rows, cols) = common_shape(spectra)?;

    if settings.slot_count() != spectra.len() {
        return Err(MixerError::InvalidWeight(format!(
            "weights describe {} slots but {} spectra were supplied",
            settings.slot_count(),
            spectra.len()
        )));
    }

    if settings.total_weight() == 0.0 {
        debug!("All weights are zero, returning an empty {}x{} spectrum", rows, cols);
        return Ok(Grid::filled(rows, cols, Complex64::new(0.0, 0.0)));
    }

    match settings {
        MixSettings::MagnitudePhase(s) => {
            if weights_match(s.magnitude_weights(), s.phase_weights()) {
                debug!("Magnitude and phase weights match, mixing complex spectra directly");
                mix_direct(spectra, s.magnitude_weights(), s.magnitude_region())
            } else {
                debug!("Mixing {} spectra in magnitude/phase", spectra.len());
                mix_polar(
                    spectra,
                    s.magnitude_weights(),
                    s.phase_weights(),
                    s.magnitude_region(),
                    s.phase_region(),
                )
            }
        }
        MixSettings::RealImaginary(s) => {
            debug!("Mixing {} spectra in real/imaginary", spectra.len());
            mix_cartesian(
                spectra,
                s.real_weights(),
                s.imaginary_weights(),
                s.real_region(),
                s.imaginary_region(),
            )
        }
    }
}

fn weights_match(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(&x, &y)| {
            let scale = x.abs().max(y.abs()).max(1.0);
            (x - y).abs() <= EQUAL_WEIGHT_TOLERANCE * scale
        })
}

/// `Σ wᵢ · Fᵢ`, masked once with `region`
pub fn mix_direct(spectra: &[&Spectrum], weights: &[f64], region: &RegionConfig) -> MixResult<Spectrum> {
    let (rows, cols) = common_shape(spectra)?;
    let mask = build_mask((rows, cols), region);
    let terms = active_terms(spectra, weights);

    let data: Vec<Complex64> = mask
        .as_slice()
        .par_iter()
        .enumerate()
        .map(|(i, &m)| {
            if m == 0.0 {
                return Complex64::new(0.0, 0.0);
            }
            let sum: Complex64 = terms.iter().map(|(s, w)| s.as_slice()[i] * *w).sum();
            sum * m
        })
        .collect();

    Grid::from_vec(rows, cols, data)
}

/// Separate magnitude and phase blends, `M · exp(i·P)`.
///
/// The phase mask multiplies the accumulated phase, so bins outside it keep
/// their magnitude with zero phase.
pub fn mix_polar(
    spectra: &[&Spectrum],
    magnitude_weights: &[f64],
    phase_weights: &[f64],
    magnitude_region: &RegionConfig,
    phase_region: &RegionConfig,
) -> MixResult<Spectrum> {
    let shape = common_shape(spectra)?;
    let magnitude = masked_sum(spectra, magnitude_weights, magnitude_region, shape, |c| c.norm());
    let phase = masked_sum(spectra, phase_weights, phase_region, shape, |c| c.arg());

    let data = magnitude
        .par_iter()
        .zip(phase.par_iter())
        .map(|(&m, &p)| Complex64::from_polar(m, p))
        .collect();
    Grid::from_vec(shape.0, shape.1, data)
}

/// Separate real and imaginary blends, `R + i·I`
pub fn mix_cartesian(
    spectra: &[&Spectrum],
    real_weights: &[f64],
    imaginary_weights: &[f64],
    real_region: &RegionConfig,
    imaginary_region: &RegionConfig,
) -> MixResult<Spectrum> {
    let shape = common_shape(spectra)?;
    let real = masked_sum(spectra, real_weights, real_region, shape, |c| c.re);
    let imaginary = masked_sum(spectra, imaginary_weights, imaginary_region, shape, |c| c.im);

    let data = real
        .par_iter()
        .zip(imaginary.par_iter())
        .map(|(&re, &im)| Complex64::new(re, im))
        .collect();
    Grid::from_vec(shape.0, shape.1, data)
}

fn active_terms<'a>(spectra: &[&'a Spectrum], weights: &[f64]) -> Vec<(&'a Spectrum, f64)> {
    spectra
        .iter()
        .zip(weights)
        .filter(|&(_, &w)| w != 0.0)
        .map(|(&s, &w)| (s, w))
        .collect()
}

/// Weighted sum of one projection, multiplied by the region mask
fn masked_sum<F>(
    spectra: &[&Spectrum],
    weights: &[f64],
    region: &RegionConfig,
    shape: (usize, usize),
    project: F,
) -> Vec<f64>
where
    F: Fn(Complex64) -> f64 + Sync,
{
    let mask = build_mask(shape, region);
    let terms = active_terms(spectra, weights);

    mask.as_slice()
        .par_iter()
        .enumerate()
        .map(|(i, &m)| {
            if m == 0.0 {
                return 0.0;
            }
            let sum: f64 = terms.iter().map(|(s, w)| w * project(s.as_slice()[i])).sum();
            sum * m
        })
        .collect()
}

/// Component of `kind` across the mixed spectrum, for inspection
pub fn project(spectrum: &Spectrum, kind: ComponentKind) -> Grid<f64> {
    match kind {
        ComponentKind::Magnitude => spectrum.map(|c| c.norm()),
        ComponentKind::Phase => spectrum.map(|c| c.arg()),
        ComponentKind::Real => spectrum.map(|c| c.re),
        ComponentKind::Imaginary => spectrum.map(|c| c.im),
    }
}
