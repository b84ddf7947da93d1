// src/core/reconstruct.rs
//
// Mixed spectrum back to a spatial image in [0, 255].

use log::debug;

use super::dsp::{ifft_shift, Fft2d, Grid};
use super::spectrum::Spectrum;

/// Upper end of the output range
pub const OUTPUT_MAX: f64 = 255.0;

/// Move the DC term from the center back to the origin
pub fn unshift(spectrum: &Spectrum) -> Spectrum {
    ifft_shift(spectrum)
}

/// Inverse transform of an uncentered spectrum, keeping only the real part
pub fn inverse_real(fft: &mut Fft2d, spectrum: &Spectrum) -> Grid<f64> {
    fft.inverse(spectrum).map(|c| c.re)
}

/// Shift to a zero minimum and scale the maximum to 255.
///
/// A flat input stays all zero.
pub fn normalize_output(image: &Grid<f64>) -> Grid<f64> {
    let min = image.iter().copied().fold(f64::INFINITY, f64::min);
    if !min.is_finite() {
        return image.map(|_| 0.0);
    }
    let shifted = image.map(|v| v - min);
    let max = shifted.iter().copied().fold(0.0, f64::max);
    if max > 0.0 {
        let scale = OUTPUT_MAX / max;
        shifted.map(|v| v * scale)
    } else {
        shifted
    }
}

/// Full pipeline: unshift, inverse transform, real part, normalize
pub fn reconstruct(spectrum: &Spectrum) -> Grid<f64> {
    let mut fft = Fft2d::new();
    let image = inverse_real(&mut fft, &unshift(spectrum));
    debug!("Reconstructed {:?} image", image.shape());
    normalize_output(&image)
}

/// Truncate a [0, 255] float image to bytes
pub fn to_bytes(image: &Grid<f64>) -> Grid<u8> {
    image.map(|v| v.clamp(0.0, OUTPUT_MAX) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_range() {
        let image = Grid::from_vec(1, 4, vec![-2.0, 0.0, 2.0, 6.0]).unwrap();
        let out = normalize_output(&image);
        assert_eq!(out.as_slice(), &[0.0, 63.75, 127.5, 255.0]);
    }

    #[test]
    fn test_normalize_flat_input() {
        let image = Grid::filled(3, 3, 42.0);
        assert!(normalize_output(&image).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_reconstruct_recovers_image_shape() {
        let image = Grid::from_fn(6, 5, |r, c| ((r * 5 + c) % 7) as f64);
        let spectrum = Fft2d::new().centered_spectrum(&image);
        let out = reconstruct(&spectrum);

        // Values 0..=6 map linearly onto 0..=255
        for (a, b) in image.iter().zip(out.iter()) {
            assert!((a * 255.0 / 6.0 - b).abs() < 1e-6, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_to_bytes_truncates() {
        let image = Grid::from_vec(1, 3, vec![0.9, 127.99, 300.0]).unwrap();
        assert_eq!(to_bytes(&image).as_slice(), &[0, 127, 255]);
    }
}
