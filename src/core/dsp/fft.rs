//! 2-D FFT processing with frequency centering
//!
//! Forward transforms are unnormalized; inverse transforms divide by the
//! element count, so `inverse(forward(x)) == x`.

use num_complex::Complex64;
use rayon::prelude::*;
use rustfft::{Fft, FftDirection, FftPlanner};
use std::sync::Arc;

use super::grid::Grid;

/// 2-D FFT computation over row-major grids
pub struct Fft2d {
    planner: FftPlanner<f64>,
}

impl Fft2d {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    /// Forward transform of a real grid
    pub fn forward(&mut self, image: &Grid<f64>) -> Grid<Complex64> {
        let mut buffer = image.map(|v| Complex64::new(v, 0.0));
        self.process(&mut buffer, FftDirection::Forward);
        buffer
    }

    /// Forward transform with the DC term moved to the center
    pub fn centered_spectrum(&mut self, image: &Grid<f64>) -> Grid<Complex64> {
        fft_shift(&self.forward(image))
    }

    /// Normalized inverse transform
    pub fn inverse(&mut self, spectrum: &Grid<Complex64>) -> Grid<Complex64> {
        let mut buffer = spectrum.clone();
        self.process(&mut buffer, FftDirection::Inverse);

        let scale = 1.0 / buffer.len().max(1) as f64;
        buffer.as_mut_slice().par_iter_mut().for_each(|c| *c *= scale);
        buffer
    }

    fn process(&mut self, buffer: &mut Grid<Complex64>, direction: FftDirection) {
        let (rows, cols) = buffer.shape();
        if rows == 0 || cols == 0 {
            return;
        }

        let row_fft = self.planner.plan_fft(cols, direction);
        transform_rows(buffer.as_mut_slice(), cols, &row_fft);

        // Columns: transpose, transform rows, transpose back
        let col_fft = self.planner.plan_fft(rows, direction);
        let mut transposed = buffer.transpose();
        transform_rows(transposed.as_mut_slice(), rows, &col_fft);
        *buffer = transposed.transpose();
    }
}

impl Default for Fft2d {
    fn default() -> Self {
        Self::new()
    }
}

fn transform_rows(data: &mut [Complex64], row_len: usize, fft: &Arc<dyn Fft<f64>>) {
    data.par_chunks_mut(row_len).for_each(|row| fft.process(row));
}

/// Move the zero-frequency term to the center (numpy `fftshift`)
pub fn fft_shift<T: Copy>(grid: &Grid<T>) -> Grid<T> {
    grid.roll(grid.rows() / 2, grid.cols() / 2)
}

/// Undo [`fft_shift`] (numpy `ifftshift`); differs from it for odd sizes
pub fn ifft_shift<T: Copy>(grid: &Grid<T>) -> Grid<T> {
    let (rows, cols) = grid.shape();
    grid.roll(rows - rows / 2, cols - cols / 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dc_component_centered() {
        let image = Grid::filled(8, 6, 3.0);
        let mut fft = Fft2d::new();
        let spectrum = fft.centered_spectrum(&image);

        let dc = spectrum[(4, 3)];
        assert!((dc.re - 144.0).abs() < 1e-9, "DC: {}", dc.re);
        assert!(dc.im.abs() < 1e-9);
        assert!(spectrum[(0, 0)].norm() < 1e-9);
    }

    #[test]
    fn test_roundtrip_non_square() {
        let image = Grid::from_fn(5, 7, |r, c| (r * 7 + c) as f64 * 0.5 - 3.0);
        let mut fft = Fft2d::new();
        let spectrum = fft.forward(&image);
        let recovered = fft.inverse(&spectrum);

        for (a, b) in image.iter().zip(recovered.iter()) {
            assert!((a - b.re).abs() < 1e-10);
            assert!(b.im.abs() < 1e-10);
        }
    }

    #[test]
    fn test_shift_inverse_odd_sizes() {
        let grid = Grid::from_fn(5, 3, |r, c| r * 3 + c);
        assert_eq!(ifft_shift(&fft_shift(&grid)), grid);
        assert_ne!(fft_shift(&fft_shift(&grid)), grid);
    }
}
