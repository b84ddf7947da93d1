//! Statistical helpers over grids and slices

use serde::Serialize;

use super::grid::Grid;

/// (min, max) of a slice; (0, 0) when empty
pub fn min_max(data: &[f64]) -> (f64, f64) {
    if data.is_empty() {
        return (0.0, 0.0);
    }
    data.iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population standard deviation
pub fn std_dev(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let m = mean(data);
    let var = data.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / data.len() as f64;
    var.sqrt()
}

/// Compute median of a slice
pub fn median(data: &mut [f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    data.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mid = data.len() / 2;
    if data.len() % 2 == 0 {
        (data[mid - 1] + data[mid]) / 2.0
    } else {
        data[mid]
    }
}

/// Sum of squares
pub fn energy(data: &[f64]) -> f64 {
    data.iter().map(|v| v * v).sum()
}

/// Pearson correlation coefficient; 0 when either side is constant
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let ma = mean(&a[..n]);
    let mb = mean(&b[..n]);

    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for (x, y) in a[..n].iter().zip(&b[..n]) {
        let dx = x - ma;
        let dy = y - mb;
        cov += dx * dy;
        va += dx * dx;
        vb += dy * dy;
    }

    if va <= 0.0 || vb <= 0.0 {
        return 0.0;
    }
    cov / (va.sqrt() * vb.sqrt())
}

/// Mean gradient magnitude using central differences over interior pixels
pub fn edge_strength(image: &Grid<f64>) -> f64 {
    let (rows, cols) = image.shape();
    if rows < 3 || cols < 3 {
        return 0.0;
    }

    let mut total = 0.0;
    for r in 1..rows - 1 {
        for c in 1..cols - 1 {
            let gx = (image[(r, c + 1)] - image[(r, c - 1)]) * 0.5;
            let gy = (image[(r + 1, c)] - image[(r - 1, c)]) * 0.5;
            total += (gx * gx + gy * gy).sqrt();
        }
    }
    total / ((rows - 2) * (cols - 2)) as f64
}

/// Summary statistics of one spectral component
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentStatistics {
    pub component: String,
    pub shape: (usize, usize),
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
    pub median: f64,
}

impl ComponentStatistics {
    pub fn from_grid(component: impl Into<String>, values: &Grid<f64>) -> Self {
        let (min, max) = min_max(values.as_slice());
        let mut sorted = values.as_slice().to_vec();
        Self {
            component: component.into(),
            shape: values.shape(),
            min,
            max,
            mean: mean(values.as_slice()),
            std: std_dev(values.as_slice()),
            median: median(&mut sorted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pearson_extremes() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [2.0, 4.0, 6.0, 8.0];
        let c = [4.0, 3.0, 2.0, 1.0];
        assert!((pearson(&a, &b) - 1.0).abs() < 1e-12);
        assert!((pearson(&a, &c) + 1.0).abs() < 1e-12);
        assert_eq!(pearson(&a, &[5.0; 4]), 0.0);
    }

    #[test]
    fn test_edge_strength_flat_vs_ramp() {
        let flat = Grid::filled(8, 8, 10.0);
        let ramp = Grid::from_fn(8, 8, |_, c| c as f64 * 2.0);
        assert_eq!(edge_strength(&flat), 0.0);
        assert!((edge_strength(&ramp) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_component_statistics() {
        let grid = Grid::from_vec(2, 2, vec![1.0, 2.0, 3.0, 10.0]).unwrap();
        let stats = ComponentStatistics::from_grid("real", &grid);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 10.0);
        assert_eq!(stats.mean, 4.0);
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.shape, (2, 2));
    }
}
