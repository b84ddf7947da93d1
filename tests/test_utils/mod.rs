// tests/test_utils/mod.rs
//
// Deterministic synthetic images shared by the integration tests.

#![allow(dead_code)]

use fourier_mixer::core::dsp::stats::pearson;
use fourier_mixer::Grid;
use std::f64::consts::PI;

/// Side length of the square test images
pub const SIZE: usize = 256;

/// One 2-D cosine: `amplitude * cos(2π(u·col + v·row)/size + phase)`
#[derive(Debug, Clone, Copy)]
pub struct Wave {
    pub u: usize,
    pub v: usize,
    pub amplitude: f64,
    pub phase: f64,
}

impl Wave {
    pub fn new(u: usize, v: usize, amplitude: f64, phase: f64) -> Self {
        Self { u, v, amplitude, phase }
    }
}

/// `offset + Σ waves` on a `size` x `size` grid
pub fn wave_image(size: usize, offset: f64, waves: &[Wave]) -> Grid<f64> {
    Grid::from_fn(size, size, |r, c| {
        offset
            + waves
                .iter()
                .map(|w| {
                    let arg = 2.0 * PI * ((w.u * c + w.v * r) % size) as f64 / size as f64;
                    w.amplitude * (arg + w.phase).cos()
                })
                .sum::<f64>()
    })
}

/// Distinct, non-conjugate frequencies shared by the image pair
const FREQUENCIES: [(usize, usize); 5] = [(3, 5), (7, 2), (1, 9), (12, 4), (5, 13)];

/// Image pair with identical frequency support and quarter-turn phase offsets.
///
/// A's magnitudes are `[4, 3, 2, 1.5, 1]`, B's `[2, 3, 4, 1, 2]`. B's phases
/// are A's plus π/2 and it sits on a 128 offset, so A and B are uncorrelated.
pub fn orthogonal_pair() -> (Grid<f64>, Grid<f64>) {
    let a_amp = [4.0, 3.0, 2.0, 1.5, 1.0];
    let b_amp = [2.0, 3.0, 4.0, 1.0, 2.0];
    let base_phase = [0.0, 0.7, 1.9, -2.3, 0.4];

    let a: Vec<Wave> = FREQUENCIES
        .iter()
        .zip(a_amp.iter().zip(&base_phase))
        .map(|(&(u, v), (&amp, &ph))| Wave::new(u, v, amp * 20.0, ph))
        .collect();
    let b: Vec<Wave> = FREQUENCIES
        .iter()
        .zip(b_amp.iter().zip(&base_phase))
        .map(|(&(u, v), (&amp, &ph))| Wave::new(u, v, amp * 20.0, ph + PI / 2.0))
        .collect();

    (wave_image(SIZE, 0.0, &a), wave_image(SIZE, 128.0, &b))
}

/// Expected correlation between `|F_A|·e^{i∠F_B}` and B
pub fn expected_phase_swap_correlation() -> f64 {
    let a = [4.0f64, 3.0, 2.0, 1.5, 1.0];
    let b = [2.0f64, 3.0, 4.0, 1.0, 2.0];
    let dot: f64 = a.iter().zip(&b).map(|(x, y)| x * y).sum();
    let na: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let nb: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    dot / (na * nb)
}

/// Strong low-frequency stripes with a faint high-frequency texture
pub fn stripes_with_texture() -> Grid<f64> {
    wave_image(
        SIZE,
        128.0,
        &[Wave::new(2, 0, 100.0, 0.0), Wave::new(100, 90, 10.0, 0.0)],
    )
}

/// Pseudo-random image in [0, 255) from a linear congruential generator
pub fn noise_image(rows: usize, cols: usize, seed: u64) -> Grid<f64> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    Grid::from_fn(rows, cols, |_, _| {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((state >> 33) % 256) as f64
    })
}

pub fn correlation(a: &Grid<f64>, b: &Grid<f64>) -> f64 {
    pearson(a.as_slice(), b.as_slice())
}
