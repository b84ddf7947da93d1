// src/core/workspace.rs
//
// Four input slots, two output ports and one job controller behind a single
// façade. This is the surface a front end (CLI, server) drives.

use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::dsp::{ComponentStatistics, Grid};
use super::job::{JobConfig, JobController, JobHandle, JobOutcome, JobPhase};
use super::mask::{build_mask, mask_to_bytes, region_bounds, RegionBounds};
use super::mixer;
use super::reconstruct::{reconstruct, to_bytes};
use super::spectrum::{ImageSlot, Spectrum};
use super::visualization::{self, DisplayAdjust, PreparedComponents};
use crate::config::{ComponentKind, MixRequest, MixSettings, OutputPort, RegionConfig, ResolvedMix, MAX_SLOTS};
use crate::error::{MixResult, MixerError};

/// Result of a synchronous mix
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MixSummary {
    pub shape: (usize, usize),
    pub output_port: usize,
    pub progress: u8,
}

/// Snapshot for progress polling
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressReport {
    pub progress: u8,
    pub is_processing: bool,
}

/// Overall state of the workspace
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkspaceStatus {
    pub loaded_slots: Vec<usize>,
    pub spectra_computed: Vec<usize>,
    pub phase: JobPhase,
    pub is_processing: bool,
    pub progress: u8,
    /// Whether each output port holds an image
    pub outputs: [bool; 2],
    pub last_error: Option<String>,
}

pub struct MixerWorkspace {
    slots: Vec<ImageSlot>,
    display: HashMap<(usize, ComponentKind), DisplayAdjust>,
    settings: Option<MixSettings>,
    jobs: JobController,
}

impl MixerWorkspace {
    pub fn new(config: JobConfig) -> Self {
        Self {
            slots: (0..MAX_SLOTS).map(ImageSlot::new).collect(),
            display: HashMap::new(),
            settings: None,
            jobs: JobController::new(config),
        }
    }

    pub fn slot(&self, index: usize) -> MixResult<&ImageSlot> {
        self.slots.get(index).ok_or(MixerError::InvalidSlot(index))
    }

    fn slot_mut(&mut self, index: usize) -> MixResult<&mut ImageSlot> {
        self.slots.get_mut(index).ok_or(MixerError::InvalidSlot(index))
    }

    pub fn jobs(&self) -> &JobController {
        &self.jobs
    }

    // ===== Slots =====

    pub fn load_image<P: AsRef<Path>>(&mut self, index: usize, path: P) -> MixResult<()> {
        self.slot_mut(index)?.load_file(path)
    }

    pub fn load_array(&mut self, index: usize, image: Grid<f64>) -> MixResult<()> {
        self.slot_mut(index)?.load(image);
        Ok(())
    }

    pub fn load_rgb(&mut self, index: usize, rows: usize, cols: usize, rgb: &[f64]) -> MixResult<()> {
        self.slot_mut(index)?.load_rgb(rows, cols, rgb)
    }

    pub fn loaded_slots(&self) -> Vec<usize> {
        self.slots
            .iter()
            .filter(|s| s.is_loaded())
            .map(ImageSlot::index)
            .collect()
    }

    /// Resize every loaded slot to the smallest common height and width and
    /// compute the spectra.
    pub fn resize_all(&mut self) -> MixResult<(usize, usize)> {
        let shapes: Vec<(usize, usize)> = self.slots.iter().filter_map(ImageSlot::shape).collect();
        let rows = shapes.iter().map(|s| s.0).min().ok_or(MixerError::NoActiveSlots)?;
        let cols = shapes.iter().map(|s| s.1).min().ok_or(MixerError::NoActiveSlots)?;

        for slot in self.slots.iter_mut().filter(|s| s.is_loaded()) {
            slot.resize(rows, cols)?;
            slot.compute(false)?;
        }
        info!("Resized {} slots to {}x{}", shapes.len(), rows, cols);
        Ok((rows, cols))
    }

    /// Adjust a slot's image in place and return its display bytes
    pub fn apply_brightness_contrast(&mut self, index: usize, brightness: f64, contrast: f64) -> MixResult<Grid<u8>> {
        self.slot_mut(index)?.apply_brightness_contrast(brightness, contrast)?;
        self.image_display(index)
    }

    pub fn reset_slot(&mut self, index: usize) -> MixResult<()> {
        self.slot_mut(index)?.reset_to_original()
    }

    /// Slot image scaled to [0, 255]
    pub fn image_display(&self, index: usize) -> MixResult<Grid<u8>> {
        let slot = self.slot(index)?;
        let image = slot.image().ok_or(MixerError::NotLoaded { slot: index })?;
        Ok(visualization::normalize_for_display(image, 0.0, 255.0).map(|v| v as u8))
    }

    fn loaded_shape(&self) -> MixResult<(usize, usize)> {
        let mut shapes = self.slots.iter().filter_map(ImageSlot::shape);
        let expected = shapes.next().ok_or(MixerError::NoActiveSlots)?;
        match shapes.find(|&s| s != expected) {
            Some(found) => Err(MixerError::ShapeMismatch { expected, found }),
            None => Ok(expected),
        }
    }

    // ===== Mixing =====

    /// Resolve `request` against the loaded slots and keep its settings for
    /// mask previews.
    pub fn configure(&mut self, request: &MixRequest) -> MixResult<ResolvedMix> {
        let resolved = request.resolve(&self.loaded_slots())?;
        self.settings = Some(resolved.settings.clone());
        Ok(resolved)
    }

    pub fn settings(&self) -> Option<&MixSettings> {
        self.settings.as_ref()
    }

    fn prepare_mix(&mut self, request: &MixRequest) -> MixResult<(ResolvedMix, Vec<Arc<Spectrum>>)> {
        let resolved = self.configure(request)?;
        let spectra = resolved
            .slots
            .iter()
            .map(|&i| self.slots[i].compute(false))
            .collect::<MixResult<Vec<_>>>()?;
        debug!("Mixing slots {:?} into port {}", resolved.slots, resolved.port.index());
        Ok((resolved, spectra))
    }

    /// Mix and reconstruct on the calling thread
    pub fn mix(&mut self, request: &MixRequest) -> MixResult<MixSummary> {
        let (resolved, spectra) = self.prepare_mix(request)?;
        let refs: Vec<&Spectrum> = spectra.iter().map(|s| s.as_ref()).collect();
        let output = reconstruct(&mixer::mix(&refs, &resolved.settings)?);

        let summary = MixSummary {
            shape: output.shape(),
            output_port: resolved.port.index(),
            progress: 100,
        };
        self.jobs.set_output(resolved.port, output);
        Ok(summary)
    }

    /// Start the mix as a background job, replacing any running one
    pub fn mix_async<C>(&mut self, request: &MixRequest, callback: C) -> MixResult<JobHandle>
    where
        C: FnOnce(&JobOutcome) + Send + 'static,
    {
        let (resolved, spectra) = self.prepare_mix(request)?;
        self.jobs.start(spectra, resolved.settings, resolved.port, callback)
    }

    pub fn progress(&self) -> ProgressReport {
        ProgressReport {
            progress: self.jobs.progress(),
            is_processing: self.jobs.is_processing(),
        }
    }

    /// Cancel the running job; false if nothing was running
    pub fn cancel(&self) -> bool {
        self.jobs.cancel()
    }

    pub fn output(&self, port: OutputPort) -> Option<Grid<f64>> {
        self.jobs.output(port)
    }

    pub fn output_bytes(&self, port: OutputPort) -> MixResult<Grid<u8>> {
        self.jobs
            .output(port)
            .map(|image| to_bytes(&image))
            .ok_or(MixerError::NoOutput { port: port.index() })
    }

    /// Brightness/contrast on a stored output; the adjusted image replaces it
    pub fn adjust_output(&self, port: OutputPort, brightness: f64, contrast: f64) -> MixResult<Grid<u8>> {
        let output = self
            .jobs
            .output(port)
            .ok_or(MixerError::NoOutput { port: port.index() })?;
        let adjust = DisplayAdjust::new(brightness, contrast);
        let adjusted = output.map(|v| adjust.apply(v));
        let bytes = to_bytes(&adjusted);
        self.jobs.set_output(port, adjusted);
        Ok(bytes)
    }

    // ===== Components =====

    /// Store display brightness/contrast for one component of one slot.
    ///
    /// Only the display changes; the spectrum is untouched.
    pub fn set_component_display(&mut self, index: usize, kind: ComponentKind, adjust: DisplayAdjust) -> MixResult<Grid<u8>> {
        if !self.slot(index)?.has_spectrum() {
            return Err(MixerError::SpectrumNotComputed { slot: index });
        }
        self.display.insert((index, kind), adjust);
        self.component_image(index, kind)
    }

    pub fn component_display(&self, index: usize, kind: ComponentKind) -> DisplayAdjust {
        self.display.get(&(index, kind)).copied().unwrap_or_default()
    }

    /// Component prepared for display with the slot's stored adjustment
    pub fn component_image(&self, index: usize, kind: ComponentKind) -> MixResult<Grid<u8>> {
        let component = self.slot(index)?.component(kind)?;
        Ok(visualization::prepare(&component, kind, &self.component_display(index, kind)))
    }

    pub fn all_components(&self, index: usize) -> MixResult<PreparedComponents> {
        visualization::prepare_all(self.slot(index)?)
    }

    pub fn component_grid(&self, index: usize, include_original: bool) -> MixResult<Grid<u8>> {
        visualization::component_grid(self.slot(index)?, include_original)
    }

    pub fn component_statistics(&self, index: usize, kind: ComponentKind) -> MixResult<ComponentStatistics> {
        let component = self.slot(index)?.component(kind)?;
        Ok(ComponentStatistics::from_grid(kind.name(), &component))
    }

    // ===== Regions =====

    fn region_for(&self, kind: ComponentKind) -> MixResult<RegionConfig> {
        match &self.settings {
            None => Ok(RegionConfig::disabled()),
            Some(settings) => settings.region(kind).copied().ok_or_else(|| {
                MixerError::InvalidComponent(format!(
                    "{} is not mixed in {} mode",
                    kind,
                    settings.mode().name()
                ))
            }),
        }
    }

    /// Current mask of `kind` over the loaded image shape, as 0/255 bytes
    pub fn mask_visualization(&self, kind: ComponentKind) -> MixResult<Grid<u8>> {
        let shape = self.loaded_shape()?;
        Ok(mask_to_bytes(&build_mask(shape, &self.region_for(kind)?)))
    }

    /// Pixel rectangle of the current region for `kind`, `None` when disabled
    pub fn region_bounds(&self, kind: ComponentKind) -> MixResult<Option<RegionBounds>> {
        let shape = self.loaded_shape()?;
        Ok(region_bounds(shape, &self.region_for(kind)?))
    }

    // ===== State =====

    pub fn status(&self) -> WorkspaceStatus {
        let progress = self.progress();
        WorkspaceStatus {
            loaded_slots: self.loaded_slots(),
            spectra_computed: self
                .slots
                .iter()
                .filter(|s| s.has_spectrum())
                .map(ImageSlot::index)
                .collect(),
            phase: self.jobs.phase(),
            is_processing: progress.is_processing,
            progress: progress.progress,
            outputs: [
                self.jobs.output(OutputPort::First).is_some(),
                self.jobs.output(OutputPort::Second).is_some(),
            ],
            last_error: self.jobs.last_error(),
        }
    }

    /// Cancel any running job and clear slots, outputs and display settings
    pub fn reset(&mut self) {
        if self.jobs.cancel() && !self.jobs.wait_for_idle(self.jobs.config().cancel_wait) {
            warn!("Reset while a cancelled job is still running");
        }
        for slot in &mut self.slots {
            slot.clear();
        }
        self.display.clear();
        self.settings = None;
        self.jobs.clear_outputs();
        info!("Workspace reset");
    }
}

impl Default for MixerWorkspace {
    fn default() -> Self {
        Self::new(JobConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegionRequest;

    fn ramp(rows: usize, cols: usize) -> Grid<f64> {
        Grid::from_fn(rows, cols, |r, c| ((r * cols + c) % 17) as f64 * 10.0)
    }

    #[test]
    fn test_invalid_slot_index() {
        let mut ws = MixerWorkspace::default();
        assert!(matches!(ws.load_array(4, ramp(2, 2)), Err(MixerError::InvalidSlot(4))));
    }

    #[test]
    fn test_resize_all_to_smallest() {
        let mut ws = MixerWorkspace::default();
        ws.load_array(0, ramp(16, 20)).unwrap();
        ws.load_array(2, ramp(12, 24)).unwrap();
        assert_eq!(ws.resize_all().unwrap(), (12, 20));
        assert_eq!(ws.status().spectra_computed, vec![0, 2]);
    }

    #[test]
    fn test_resize_all_needs_images() {
        let mut ws = MixerWorkspace::default();
        assert!(matches!(ws.resize_all(), Err(MixerError::NoActiveSlots)));
    }

    #[test]
    fn test_sync_mix_fills_port() {
        let mut ws = MixerWorkspace::default();
        ws.load_array(1, ramp(8, 8)).unwrap();
        let request = MixRequest::from_json(
            r#"{"weights": {"magnitude": [0, 1], "phase": [0, 1]}, "output_port": 1}"#,
        )
        .unwrap();

        let summary = ws.mix(&request).unwrap();
        assert_eq!(summary.output_port, 1);
        assert!(ws.output(OutputPort::First).is_none());
        assert_eq!(ws.output_bytes(OutputPort::Second).unwrap().shape(), (8, 8));
    }

    #[test]
    fn test_mask_follows_configured_region() {
        let mut ws = MixerWorkspace::default();
        ws.load_array(0, ramp(10, 10)).unwrap();
        assert!(ws.mask_visualization(ComponentKind::Phase).unwrap().iter().all(|&b| b == 255));

        let request = MixRequest {
            region: RegionRequest {
                enabled: true,
                width: Some(0.4),
                height: Some(0.4),
                kind: Some("outer".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        ws.configure(&request).unwrap();
        let mask = ws.mask_visualization(ComponentKind::Phase).unwrap();
        assert_eq!(mask[(5, 5)], 0);
        assert_eq!(mask[(0, 0)], 255);
        assert!(matches!(
            ws.mask_visualization(ComponentKind::Real),
            Err(MixerError::InvalidComponent(_))
        ));
    }

    #[test]
    fn test_component_display_requires_spectrum() {
        let mut ws = MixerWorkspace::default();
        ws.load_array(0, ramp(4, 4)).unwrap();
        assert!(matches!(
            ws.set_component_display(0, ComponentKind::Real, DisplayAdjust::new(10.0, 1.0)),
            Err(MixerError::SpectrumNotComputed { slot: 0 })
        ));
    }

    #[test]
    fn test_adjust_output_without_output() {
        let ws = MixerWorkspace::default();
        assert!(matches!(
            ws.adjust_output(OutputPort::First, 10.0, 1.0),
            Err(MixerError::NoOutput { port: 0 })
        ));
    }
}
