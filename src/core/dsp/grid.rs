// src/core/dsp/grid.rs
//
// Row-major 2-D array used for images, spectra, masks and display buffers.

use serde::Serialize;
use std::ops::{Index, IndexMut};

use crate::error::{MixResult, MixerError};

/// Dense row-major 2-D array
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Copy> Grid<T> {
    /// Create a grid filled with `value`
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Wrap an existing row-major buffer
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> MixResult<Self> {
        if data.len() != rows * cols {
            return Err(MixerError::DataLength {
                expected: rows * cols,
                found: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Build a grid by evaluating `f(row, col)` for every cell
    pub fn from_fn<F>(rows: usize, cols: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> T,
    {
        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                data.push(f(r, c));
            }
        }
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Apply `f` element-wise into a new grid of the same shape
    pub fn map<U, F>(&self, f: F) -> Grid<U>
    where
        U: Copy,
        F: Fn(T) -> U,
    {
        Grid {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Transposed copy (cols x rows)
    pub fn transpose(&self) -> Self {
        let mut data = Vec::with_capacity(self.data.len());
        for c in 0..self.cols {
            for r in 0..self.rows {
                data.push(self.data[r * self.cols + c]);
            }
        }
        Self {
            rows: self.cols,
            cols: self.rows,
            data,
        }
    }

    /// Circularly shift rows by `dr` and columns by `dc`
    pub fn roll(&self, dr: usize, dc: usize) -> Self {
        if self.is_empty() {
            return self.clone();
        }
        let mut data = self.data.clone();
        for r in 0..self.rows {
            let dst_r = (r + dr) % self.rows;
            for c in 0..self.cols {
                let dst_c = (c + dc) % self.cols;
                data[dst_r * self.cols + dst_c] = self.data[r * self.cols + c];
            }
        }
        Self {
            rows: self.rows,
            cols: self.cols,
            data,
        }
    }
}

impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    fn index(&self, (row, col): (usize, usize)) -> &T {
        &self.data[row * self.cols + col]
    }
}

impl<T> IndexMut<(usize, usize)> for Grid<T> {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        &mut self.data[row * self.cols + col]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec_checks_length() {
        assert!(Grid::from_vec(2, 3, vec![0.0; 6]).is_ok());
        assert!(matches!(
            Grid::from_vec(2, 3, vec![0.0; 5]),
            Err(MixerError::DataLength { expected: 6, found: 5 })
        ));
    }

    #[test]
    fn test_roll_wraps() {
        let grid = Grid::from_fn(2, 3, |r, c| r * 3 + c);
        let rolled = grid.roll(1, 1);
        assert_eq!(rolled[(1, 1)], grid[(0, 0)]);
        assert_eq!(rolled[(0, 0)], grid[(1, 2)]);
    }

    #[test]
    fn test_transpose() {
        let grid = Grid::from_fn(2, 3, |r, c| r * 3 + c);
        let t = grid.transpose();
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t[(2, 1)], grid[(1, 2)]);
    }
}
