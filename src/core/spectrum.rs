// src/core/spectrum.rs
//
// Per-slot image storage with a lazily computed, frequency-centered spectrum.
// Any change to the image drops the cached spectrum.

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma};
use log::{debug, info};
use num_complex::Complex64;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::dsp::{Fft2d, Grid};
use crate::config::ComponentKind;
use crate::error::{MixResult, MixerError};

/// Complex 2-D spectrum with the DC term at the center
pub type Spectrum = Grid<Complex64>;

/// Luminosity weights for RGB to gray conversion
const LUMA_WEIGHTS: [f64; 3] = [0.299, 0.587, 0.114];

/// One input slot: a grayscale image and its cached spectrum
#[derive(Debug, Clone)]
pub struct ImageSlot {
    index: usize,
    image: Option<Grid<f64>>,
    original: Option<Grid<f64>>,
    spectrum: Option<Arc<Spectrum>>,
    dirty: bool,
    source: Option<PathBuf>,
}

impl ImageSlot {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            image: None,
            original: None,
            spectrum: None,
            dirty: true,
            source: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Replace the image with a grayscale array
    pub fn load(&mut self, image: Grid<f64>) {
        debug!("Slot {}: loaded {:?} array", self.index, image.shape());
        self.original = Some(image.clone());
        self.image = Some(image);
        self.source = None;
        self.invalidate();
    }

    /// Replace the image with interleaved RGB data, converting to grayscale
    pub fn load_rgb(&mut self, rows: usize, cols: usize, rgb: &[f64]) -> MixResult<()> {
        if rgb.len() != rows * cols * 3 {
            return Err(MixerError::DataLength {
                expected: rows * cols * 3,
                found: rgb.len(),
            });
        }
        let gray = rgb
            .chunks_exact(3)
            .map(|px| px[0] * LUMA_WEIGHTS[0] + px[1] * LUMA_WEIGHTS[1] + px[2] * LUMA_WEIGHTS[2])
            .collect();
        self.load(Grid::from_vec(rows, cols, gray)?);
        Ok(())
    }

    /// Decode an image file and convert it to grayscale
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> MixResult<()> {
        let path = path.as_ref();
        let rgb = image::open(path)?.to_rgb8();
        let (width, height) = rgb.dimensions();
        let data: Vec<f64> = rgb.as_raw().iter().map(|&v| v as f64).collect();

        self.load_rgb(height as usize, width as usize, &data)?;
        self.source = Some(path.to_path_buf());
        info!("Slot {}: loaded {} ({}x{})", self.index, path.display(), width, height);
        Ok(())
    }

    pub fn image(&self) -> Option<&Grid<f64>> {
        self.image.as_ref()
    }

    pub fn original(&self) -> Option<&Grid<f64>> {
        self.original.as_ref()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.image.is_some()
    }

    pub fn shape(&self) -> Option<(usize, usize)> {
        self.image.as_ref().map(Grid::shape)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn has_spectrum(&self) -> bool {
        self.spectrum.is_some() && !self.dirty
    }

    /// Cached spectrum, if current
    pub fn spectrum(&self) -> Option<Arc<Spectrum>> {
        if self.dirty {
            None
        } else {
            self.spectrum.clone()
        }
    }

    fn require_image(&self) -> MixResult<&Grid<f64>> {
        self.image
            .as_ref()
            .ok_or(MixerError::NotLoaded { slot: self.index })
    }

    fn invalidate(&mut self) {
        self.spectrum = None;
        self.dirty = true;
    }

    /// Resample to `rows` x `cols` with a Lanczos filter
    pub fn resize(&mut self, rows: usize, cols: usize) -> MixResult<()> {
        let image = self.require_image()?;
        if image.shape() == (rows, cols) {
            return Ok(());
        }

        let (src_rows, src_cols) = image.shape();
        let buffer: ImageBuffer<Luma<f32>, Vec<f32>> = ImageBuffer::from_raw(
            src_cols as u32,
            src_rows as u32,
            image.iter().map(|&v| v as f32).collect(),
        )
        .ok_or(MixerError::DataLength {
            expected: src_rows * src_cols,
            found: image.len(),
        })?;

        let resized = imageops::resize(&buffer, cols as u32, rows as u32, FilterType::Lanczos3);
        let data = resized.into_raw().into_iter().map(f64::from).collect();
        self.image = Some(Grid::from_vec(rows, cols, data)?);
        self.invalidate();

        debug!(
            "Slot {}: resized {}x{} -> {}x{}",
            self.index, src_rows, src_cols, rows, cols
        );
        Ok(())
    }

    /// `clamp(x * contrast + brightness, 0, 255)` applied to the image itself
    pub fn apply_brightness_contrast(&mut self, brightness: f64, contrast: f64) -> MixResult<()> {
        let adjusted = self
            .require_image()?
            .map(|v| (v * contrast + brightness).clamp(0.0, 255.0));
        self.image = Some(adjusted);
        self.invalidate();
        Ok(())
    }

    /// Restore the image as it was first loaded
    pub fn reset_to_original(&mut self) -> MixResult<()> {
        let original = self
            .original
            .clone()
            .ok_or(MixerError::NotLoaded { slot: self.index })?;
        self.image = Some(original);
        self.invalidate();
        Ok(())
    }

    /// Drop image and spectrum
    pub fn clear(&mut self) {
        *self = Self::new(self.index);
    }

    /// Compute (or reuse) the centered spectrum.
    ///
    /// The cache is reused unless `force` is set or the image changed since
    /// the last computation.
    pub fn compute(&mut self, force: bool) -> MixResult<Arc<Spectrum>> {
        let image = self.require_image()?;

        if !force && !self.dirty {
            if let Some(cached) = &self.spectrum {
                debug!("Slot {}: using cached spectrum {:?}", self.index, cached.shape());
                return Ok(Arc::clone(cached));
            }
        }

        let spectrum = Arc::new(Fft2d::new().centered_spectrum(image));
        debug!("Slot {}: spectrum computed {:?}", self.index, spectrum.shape());

        self.spectrum = Some(Arc::clone(&spectrum));
        self.dirty = false;
        Ok(spectrum)
    }

    fn require_spectrum(&self) -> MixResult<&Spectrum> {
        match &self.spectrum {
            Some(spectrum) if !self.dirty => Ok(spectrum.as_ref()),
            _ => Err(MixerError::SpectrumNotComputed { slot: self.index }),
        }
    }

    /// |F|
    pub fn magnitude(&self) -> MixResult<Grid<f64>> {
        Ok(self.require_spectrum()?.map(|c| c.norm()))
    }

    /// arg(F) in (-pi, pi]
    pub fn phase(&self) -> MixResult<Grid<f64>> {
        Ok(self.require_spectrum()?.map(|c| c.arg()))
    }

    pub fn real(&self) -> MixResult<Grid<f64>> {
        Ok(self.require_spectrum()?.map(|c| c.re))
    }

    pub fn imaginary(&self) -> MixResult<Grid<f64>> {
        Ok(self.require_spectrum()?.map(|c| c.im))
    }

    pub fn component(&self, kind: ComponentKind) -> MixResult<Grid<f64>> {
        match kind {
            ComponentKind::Magnitude => self.magnitude(),
            ComponentKind::Phase => self.phase(),
            ComponentKind::Real => self.real(),
            ComponentKind::Imaginary => self.imaginary(),
        }
    }
}
