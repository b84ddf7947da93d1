// tests/mixing_properties_test.rs
//
// Numeric properties of the transform, mixer and reconstruction pipeline.

mod test_utils;

use fourier_mixer::core::dsp::stats::{edge_strength, energy};
use fourier_mixer::core::dsp::Fft2d;
use fourier_mixer::core::mixer::{self, mix_direct, mix_polar};
use fourier_mixer::core::reconstruct::reconstruct;
use fourier_mixer::{ComponentKind, Grid, MixMode, MixSettingsBuilder, RegionConfig, RegionKind, Spectrum};
use test_utils::*;

fn spectrum_of(image: &Grid<f64>) -> Spectrum {
    Fft2d::new().centered_spectrum(image)
}

fn mix_pair(a: &Spectrum, b: &Spectrum, mode: MixMode, first: [f64; 2], second: [f64; 2]) -> Grid<f64> {
    let [k1, k2] = mode.components();
    let settings = MixSettingsBuilder::new(mode)
        .weights(k1, first.to_vec())
        .weights(k2, second.to_vec())
        .build(2)
        .unwrap();
    reconstruct(&mixer::mix(&[a, b], &settings).unwrap())
}

fn filtered(image: &Grid<f64>, region: RegionConfig) -> Grid<f64> {
    let spectrum = spectrum_of(image);
    let settings = MixSettingsBuilder::new(MixMode::MagnitudePhase)
        .weights(ComponentKind::Magnitude, vec![1.0])
        .weights(ComponentKind::Phase, vec![1.0])
        .region(region)
        .build(1)
        .unwrap();
    reconstruct(&mixer::mix(&[&spectrum], &settings).unwrap())
}

#[test]
fn test_round_trip_recovers_image() {
    let image = noise_image(48, 40, 7);
    let mut fft = Fft2d::new();
    let spectrum = fft.forward(&image);
    let recovered = fft.inverse(&spectrum);

    let worst = image
        .iter()
        .zip(recovered.iter())
        .map(|(x, y)| (x - y.re).abs())
        .fold(0.0, f64::max);
    assert!(worst < 1e-3, "max round-trip error {}", worst);
}

#[test]
fn test_parseval_energy_conservation() {
    let image = noise_image(64, 32, 11);
    let spectrum = Fft2d::new().forward(&image);

    let spatial = energy(image.as_slice());
    let spectral: f64 = spectrum.iter().map(|c| c.norm_sqr()).sum::<f64>() / image.len() as f64;
    let relative = (spatial - spectral).abs() / spatial;
    assert!(relative < 0.01, "spatial {} vs spectral {}", spatial, spectral);
}

#[test]
fn test_equal_weight_paths_agree() {
    let (a, b) = orthogonal_pair();
    let (fa, fb) = (spectrum_of(&a), spectrum_of(&b));
    let region = RegionConfig::disabled();

    for weights in [[1.0, 0.0], [0.0, 1.0]] {
        let direct = mix_direct(&[&fa, &fb], &weights, &region).unwrap();
        let polar = mix_polar(&[&fa, &fb], &weights, &weights, &region, &region).unwrap();
        for (x, y) in direct.iter().zip(polar.iter()) {
            let scale = x.norm().max(1.0);
            assert!((x - y).norm() <= 1e-9 * scale, "{} vs {}", x, y);
        }
    }
}

#[test]
fn test_phase_dominates_magnitude() {
    let (a, b) = orthogonal_pair();
    let (fa, fb) = (spectrum_of(&a), spectrum_of(&b));

    let out = mix_pair(&fa, &fb, MixMode::MagnitudePhase, [1.0, 0.0], [0.0, 1.0]);
    let with_a = correlation(&out, &a);
    let with_b = correlation(&out, &b);

    assert!(with_b > with_a, "r(B) {} should exceed r(A) {}", with_b, with_a);
    assert!(with_b > 0.8, "r(B) = {}", with_b);
    assert!(with_a.abs() < 0.5, "r(A) = {}", with_a);
    assert!((with_b - expected_phase_swap_correlation()).abs() < 1e-3);
}

#[test]
fn test_real_imaginary_single_source_reconstructs_it() {
    let (a, b) = orthogonal_pair();
    let (fa, fb) = (spectrum_of(&a), spectrum_of(&b));

    let out = mix_pair(&fa, &fb, MixMode::RealImaginary, [0.0, 1.0], [0.0, 1.0]);
    assert!(correlation(&out, &b) > 0.999);
}

#[test]
fn test_monotonic_weighting() {
    let (a, b) = orthogonal_pair();
    let (fa, fb) = (spectrum_of(&a), spectrum_of(&b));
    let standalone_b = mix_pair(&fa, &fb, MixMode::MagnitudePhase, [0.0, 1.0], [0.0, 1.0]);

    let correlations: Vec<f64> = [0.0, 0.25, 0.5, 0.75, 1.0]
        .iter()
        .map(|&t| {
            let weights = [1.0 - t, t];
            let out = mix_pair(&fa, &fb, MixMode::MagnitudePhase, weights, weights);
            correlation(&out, &standalone_b)
        })
        .collect();

    for pair in correlations.windows(2) {
        assert!(pair[1] > pair[0], "correlation not increasing: {:?}", correlations);
    }
    assert!(correlations[4] > 0.999);
}

#[test]
fn test_region_filtering_edge_strength() {
    let image = stripes_with_texture();

    let unfiltered = filtered(&image, RegionConfig::disabled());
    let inner = filtered(&image, RegionConfig::centered(0.3, 0.3, RegionKind::Inner));
    let outer = filtered(&image, RegionConfig::centered(0.3, 0.3, RegionKind::Outer));

    let (e_inner, e_plain, e_outer) = (
        edge_strength(&inner),
        edge_strength(&unfiltered),
        edge_strength(&outer),
    );
    assert!(e_inner < e_outer, "inner {} vs outer {}", e_inner, e_outer);
    assert!(e_outer > e_plain, "outer {} vs unfiltered {}", e_outer, e_plain);
    assert!(e_inner < e_plain, "inner {} vs unfiltered {}", e_inner, e_plain);
}

#[test]
fn test_zero_weights_reconstruct_to_flat_zero() {
    let (a, b) = orthogonal_pair();
    let (fa, fb) = (spectrum_of(&a), spectrum_of(&b));
    let out = mix_pair(&fa, &fb, MixMode::RealImaginary, [0.0, 0.0], [0.0, 0.0]);
    assert!(out.iter().all(|&v| v == 0.0));
}

#[test]
fn test_output_range() {
    let (a, b) = orthogonal_pair();
    let (fa, fb) = (spectrum_of(&a), spectrum_of(&b));
    let out = mix_pair(&fa, &fb, MixMode::MagnitudePhase, [0.3, 0.9], [0.6, 0.2]);

    let min = out.iter().copied().fold(f64::INFINITY, f64::min);
    let max = out.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    assert!(min.abs() < 1e-9);
    assert!((max - 255.0).abs() < 1e-9);
}
