// src/core/mask.rs
//
// Rectangular inner/outer frequency masks over a centered spectrum.

use serde::Serialize;

use super::dsp::Grid;
use crate::config::{RegionConfig, RegionKind};

/// Pixel extents of a region rectangle, half-open on both axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegionBounds {
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
    pub kind: RegionKind,
}

impl RegionBounds {
    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.row_start..self.row_end).contains(&row) && (self.col_start..self.col_end).contains(&col)
    }

    /// Number of pixels inside the rectangle
    pub fn area(&self) -> usize {
        (self.row_end - self.row_start) * (self.col_end - self.col_start)
    }
}

/// `[mid - half, mid + half)` around `center * len`, clamped to `0..len`.
///
/// A one-pixel extent has `half == 0` and yields an empty span.
fn axis_span(len: usize, center: f64, frac: f64) -> (usize, usize) {
    let extent = ((len as f64 * frac).round() as usize).max(1);
    let mid = (len as f64 * center).round() as usize;
    let half = extent / 2;

    let start = mid.saturating_sub(half).min(len);
    let end = (mid + half).min(len);
    (start, end.max(start))
}

/// Pixel rectangle for `region` on a spectrum of `shape`, or `None` when disabled
pub fn region_bounds(shape: (usize, usize), region: &RegionConfig) -> Option<RegionBounds> {
    if !region.enabled {
        return None;
    }
    let (rows, cols) = shape;
    let (row_start, row_end) = axis_span(rows, region.y, region.height);
    let (col_start, col_end) = axis_span(cols, region.x, region.width);
    Some(RegionBounds {
        row_start,
        row_end,
        col_start,
        col_end,
        kind: region.kind,
    })
}

/// Binary mask of `shape`: 1.0 where frequencies pass, 0.0 where they are removed.
///
/// Disabled regions pass everything. `Inner` keeps the rectangle, `Outer`
/// keeps its complement.
pub fn build_mask(shape: (usize, usize), region: &RegionConfig) -> Grid<f64> {
    let (rows, cols) = shape;
    match region_bounds(shape, region) {
        None => Grid::filled(rows, cols, 1.0),
        Some(bounds) => {
            let (inside, outside) = match bounds.kind {
                RegionKind::Inner => (1.0, 0.0),
                RegionKind::Outer => (0.0, 1.0),
            };
            Grid::from_fn(rows, cols, |r, c| {
                if bounds.contains(r, c) {
                    inside
                } else {
                    outside
                }
            })
        }
    }
}

/// 0/255 byte image of a mask
pub fn mask_to_bytes(mask: &Grid<f64>) -> Grid<u8> {
    mask.map(|v| if v > 0.5 { 255 } else { 0 })
}

/// Region centered on a rectangle drawn between two pixel corners.
///
/// `x` runs along columns, `y` along rows. The result is enabled, inner,
/// and clamped to the unit square.
pub fn region_from_corners(shape: (usize, usize), x1: f64, y1: f64, x2: f64, y2: f64) -> RegionConfig {
    let (rows, cols) = shape;
    let rows = rows.max(1) as f64;
    let cols = cols.max(1) as f64;
    let unit = |v: f64| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };

    RegionConfig {
        enabled: true,
        x: unit((x1 + x2) / 2.0 / cols),
        y: unit((y1 + y2) / 2.0 / rows),
        width: unit((x2 - x1).abs() / cols),
        height: unit((y2 - y1).abs() / rows),
        kind: RegionKind::Inner,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ones(mask: &Grid<f64>) -> usize {
        mask.iter().filter(|&&v| v == 1.0).count()
    }

    #[test]
    fn test_disabled_region_passes_everything() {
        let region = RegionConfig {
            enabled: false,
            ..RegionConfig::centered(0.1, 0.1, RegionKind::Inner)
        };
        let mask = build_mask((10, 12), &region);
        assert_eq!(ones(&mask), 120);
    }

    #[test]
    fn test_inner_bounds() {
        let region = RegionConfig::centered(0.3, 0.3, RegionKind::Inner);
        let bounds = region_bounds((256, 256), &region).unwrap();
        // round(76.8) = 77 pixels, half = 38 around 128
        assert_eq!((bounds.row_start, bounds.row_end), (90, 166));
        assert_eq!((bounds.col_start, bounds.col_end), (90, 166));

        let mask = build_mask((256, 256), &region);
        assert_eq!(ones(&mask), 76 * 76);
        assert_eq!(mask[(128, 128)], 1.0);
        assert_eq!(mask[(0, 0)], 0.0);
    }

    #[test]
    fn test_outer_is_complement_of_inner() {
        let inner = RegionConfig::centered(0.4, 0.2, RegionKind::Inner);
        let outer = inner.with_kind(RegionKind::Outer);
        let a = build_mask((20, 30), &inner);
        let b = build_mask((20, 30), &outer);
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x + y, 1.0);
        }
    }

    #[test]
    fn test_zero_size_region_is_empty() {
        let inner = RegionConfig::centered(0.0, 0.0, RegionKind::Inner);
        let bounds = region_bounds((9, 9), &inner).unwrap();
        assert_eq!(bounds.area(), 0);
        assert_eq!(ones(&build_mask((9, 9), &inner)), 0);

        let outer = inner.with_kind(RegionKind::Outer);
        assert_eq!(ones(&build_mask((9, 9), &outer)), 81);
    }

    #[test]
    fn test_one_pixel_extent_is_empty() {
        // 0.15 * 9 rounds to 1, half of which is 0
        let region = RegionConfig::centered(0.15, 0.5, RegionKind::Inner);
        let bounds = region_bounds((9, 9), &region).unwrap();
        assert_eq!(bounds.col_start, bounds.col_end);
        assert_eq!(ones(&build_mask((9, 9), &region)), 0);
    }

    #[test]
    fn test_region_clamped_at_border() {
        let region = RegionConfig {
            enabled: true,
            x: 1.0,
            y: 0.0,
            width: 0.5,
            height: 0.5,
            kind: RegionKind::Inner,
        };
        let bounds = region_bounds((10, 10), &region).unwrap();
        assert_eq!((bounds.row_start, bounds.row_end), (0, 2));
        assert_eq!((bounds.col_start, bounds.col_end), (8, 10));
        assert_eq!(bounds.area(), 4);
    }

    #[test]
    fn test_region_from_corners() {
        let region = region_from_corners((100, 200), 150.0, 60.0, 50.0, 20.0);
        assert!(region.enabled);
        assert!((region.x - 0.5).abs() < 1e-12);
        assert!((region.y - 0.4).abs() < 1e-12);
        assert!((region.width - 0.5).abs() < 1e-12);
        assert!((region.height - 0.4).abs() < 1e-12);
        assert!(region.validate().is_ok());
    }

    #[test]
    fn test_mask_bytes() {
        let mask = Grid::from_vec(1, 2, vec![0.0, 1.0]).unwrap();
        assert_eq!(mask_to_bytes(&mask).as_slice(), &[0, 255]);
    }
}
