// src/core/visualization/export.rs
//
// PNG output of byte grids

use image::GrayImage;
use log::debug;
use std::path::Path;

use crate::core::dsp::Grid;
use crate::error::{MixResult, MixerError};

/// Convert a byte grid into an 8-bit grayscale image
pub fn to_gray_image(grid: &Grid<u8>) -> MixResult<GrayImage> {
    let (rows, cols) = grid.shape();
    GrayImage::from_raw(cols as u32, rows as u32, grid.as_slice().to_vec()).ok_or(
        MixerError::DataLength {
            expected: rows * cols,
            found: grid.len(),
        },
    )
}

/// Write a byte grid as a grayscale image; format follows the extension
pub fn save_gray<P: AsRef<Path>>(grid: &Grid<u8>, path: P) -> MixResult<()> {
    let path = path.as_ref();
    to_gray_image(grid)?.save(path)?;
    debug!("Saved {:?} image to {}", grid.shape(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gray_image_layout() {
        let grid = Grid::from_fn(2, 3, |r, c| (r * 3 + c) as u8 * 10);
        let image = to_gray_image(&grid).unwrap();
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.get_pixel(2, 1).0, [50]);
    }

    #[test]
    fn test_save_and_reload() {
        let grid = Grid::from_fn(4, 5, |r, c| (r * 40 + c * 5) as u8);
        let path = std::env::temp_dir().join(format!("fourier_mixer_export_{}.png", std::process::id()));
        save_gray(&grid, &path).unwrap();

        let reloaded = image::open(&path).unwrap().to_luma8();
        assert_eq!(reloaded.as_raw(), grid.as_slice());
        let _ = std::fs::remove_file(&path);
    }
}
