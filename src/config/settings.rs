// src/config/settings.rs
//
// Validated mixing settings: mode, per-component weights and frequency regions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{MixResult, MixerError};

/// Which pair of spectral components is mixed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixMode {
    MagnitudePhase,
    RealImaginary,
}

impl MixMode {
    pub fn name(&self) -> &'static str {
        match self {
            MixMode::MagnitudePhase => "magnitude_phase",
            MixMode::RealImaginary => "real_imaginary",
        }
    }

    pub fn from_name(name: &str) -> MixResult<Self> {
        match name.to_lowercase().replace('-', "_").as_str() {
            "magnitude_phase" => Ok(MixMode::MagnitudePhase),
            "real_imaginary" => Ok(MixMode::RealImaginary),
            _ => Err(MixerError::InvalidMode(name.to_string())),
        }
    }

    /// The two components this mode blends
    pub fn components(&self) -> [ComponentKind; 2] {
        match self {
            MixMode::MagnitudePhase => [ComponentKind::Magnitude, ComponentKind::Phase],
            MixMode::RealImaginary => [ComponentKind::Real, ComponentKind::Imaginary],
        }
    }
}

impl Default for MixMode {
    fn default() -> Self {
        Self::MagnitudePhase
    }
}

/// A projection of a complex spectrum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Magnitude,
    Phase,
    Real,
    Imaginary,
}

impl ComponentKind {
    pub fn all() -> [Self; 4] {
        [Self::Magnitude, Self::Phase, Self::Real, Self::Imaginary]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ComponentKind::Magnitude => "magnitude",
            ComponentKind::Phase => "phase",
            ComponentKind::Real => "real",
            ComponentKind::Imaginary => "imaginary",
        }
    }

    pub fn from_name(name: &str) -> MixResult<Self> {
        match name.to_lowercase().as_str() {
            "magnitude" => Ok(Self::Magnitude),
            "phase" => Ok(Self::Phase),
            "real" => Ok(Self::Real),
            "imaginary" => Ok(Self::Imaginary),
            _ => Err(MixerError::InvalidComponent(name.to_string())),
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Keep the inside (low frequencies) or the outside (high frequencies) of the rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    Inner,
    Outer,
}

impl RegionKind {
    pub fn name(&self) -> &'static str {
        match self {
            RegionKind::Inner => "inner",
            RegionKind::Outer => "outer",
        }
    }

    pub fn from_name(name: &str) -> MixResult<Self> {
        match name.to_lowercase().as_str() {
            "inner" => Ok(Self::Inner),
            "outer" => Ok(Self::Outer),
            _ => Err(MixerError::InvalidRegion(format!(
                "region type must be 'inner' or 'outer', got '{}'",
                name
            ))),
        }
    }
}

impl Default for RegionKind {
    fn default() -> Self {
        Self::Inner
    }
}

/// Rectangular frequency region for one component.
///
/// Position and size are fractions of the spectrum dimensions. A disabled
/// region passes every frequency regardless of the other fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    pub enabled: bool,
    /// Center column as a fraction of the width
    pub x: f64,
    /// Center row as a fraction of the height
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub kind: RegionKind,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            x: 0.5,
            y: 0.5,
            width: 0.3,
            height: 0.3,
            kind: RegionKind::Inner,
        }
    }
}

impl RegionConfig {
    /// Region that passes everything
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Centered region of the given fractional size
    pub fn centered(width: f64, height: f64, kind: RegionKind) -> Self {
        Self {
            enabled: true,
            width,
            height,
            kind,
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: RegionKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn validate(&self) -> MixResult<()> {
        let fields = [
            ("x", self.x),
            ("y", self.y),
            ("width", self.width),
            ("height", self.height),
        ];
        for (name, value) in fields {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(MixerError::InvalidRegion(format!(
                    "{} must be between 0.0 and 1.0, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Weights and regions for magnitude/phase mixing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MagnitudePhaseSettings {
    magnitude_weights: Vec<f64>,
    phase_weights: Vec<f64>,
    magnitude_region: RegionConfig,
    phase_region: RegionConfig,
}

impl MagnitudePhaseSettings {
    pub fn new(
        magnitude_weights: Vec<f64>,
        phase_weights: Vec<f64>,
        magnitude_region: RegionConfig,
        phase_region: RegionConfig,
    ) -> MixResult<Self> {
        validate_weights("magnitude", &magnitude_weights)?;
        validate_weights("phase", &phase_weights)?;
        validate_pair_length(&magnitude_weights, &phase_weights)?;
        magnitude_region.validate()?;
        phase_region.validate()?;
        Ok(Self {
            magnitude_weights,
            phase_weights,
            magnitude_region,
            phase_region,
        })
    }

    pub fn magnitude_weights(&self) -> &[f64] {
        &self.magnitude_weights
    }

    pub fn phase_weights(&self) -> &[f64] {
        &self.phase_weights
    }

    pub fn magnitude_region(&self) -> &RegionConfig {
        &self.magnitude_region
    }

    pub fn phase_region(&self) -> &RegionConfig {
        &self.phase_region
    }
}

/// Weights and regions for real/imaginary mixing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealImaginarySettings {
    real_weights: Vec<f64>,
    imaginary_weights: Vec<f64>,
    real_region: RegionConfig,
    imaginary_region: RegionConfig,
}

impl RealImaginarySettings {
    pub fn new(
        real_weights: Vec<f64>,
        imaginary_weights: Vec<f64>,
        real_region: RegionConfig,
        imaginary_region: RegionConfig,
    ) -> MixResult<Self> {
        validate_weights("real", &real_weights)?;
        validate_weights("imaginary", &imaginary_weights)?;
        validate_pair_length(&real_weights, &imaginary_weights)?;
        real_region.validate()?;
        imaginary_region.validate()?;
        Ok(Self {
            real_weights,
            imaginary_weights,
            real_region,
            imaginary_region,
        })
    }

    pub fn real_weights(&self) -> &[f64] {
        &self.real_weights
    }

    pub fn imaginary_weights(&self) -> &[f64] {
        &self.imaginary_weights
    }

    pub fn real_region(&self) -> &RegionConfig {
        &self.real_region
    }

    pub fn imaginary_region(&self) -> &RegionConfig {
        &self.imaginary_region
    }
}

/// Complete settings for one mix, tagged by mode
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MixSettings {
    MagnitudePhase(MagnitudePhaseSettings),
    RealImaginary(RealImaginarySettings),
}

impl MixSettings {
    pub fn mode(&self) -> MixMode {
        match self {
            MixSettings::MagnitudePhase(_) => MixMode::MagnitudePhase,
            MixSettings::RealImaginary(_) => MixMode::RealImaginary,
        }
    }

    /// Number of slots the weight vectors describe
    pub fn slot_count(&self) -> usize {
        match self {
            MixSettings::MagnitudePhase(s) => s.magnitude_weights.len(),
            MixSettings::RealImaginary(s) => s.real_weights.len(),
        }
    }

    /// Weights for `kind`, if this mode uses it
    pub fn weights(&self, kind: ComponentKind) -> Option<&[f64]> {
        match (self, kind) {
            (MixSettings::MagnitudePhase(s), ComponentKind::Magnitude) => Some(s.magnitude_weights.as_slice()),
            (MixSettings::MagnitudePhase(s), ComponentKind::Phase) => Some(s.phase_weights.as_slice()),
            (MixSettings::RealImaginary(s), ComponentKind::Real) => Some(s.real_weights.as_slice()),
            (MixSettings::RealImaginary(s), ComponentKind::Imaginary) => Some(s.imaginary_weights.as_slice()),
            _ => None,
        }
    }

    /// Region for `kind`, if this mode uses it
    pub fn region(&self, kind: ComponentKind) -> Option<&RegionConfig> {
        match (self, kind) {
            (MixSettings::MagnitudePhase(s), ComponentKind::Magnitude) => Some(&s.magnitude_region),
            (MixSettings::MagnitudePhase(s), ComponentKind::Phase) => Some(&s.phase_region),
            (MixSettings::RealImaginary(s), ComponentKind::Real) => Some(&s.real_region),
            (MixSettings::RealImaginary(s), ComponentKind::Imaginary) => Some(&s.imaginary_region),
            _ => None,
        }
    }

    /// Sum of every weight relevant to the mode
    pub fn total_weight(&self) -> f64 {
        self.mode()
            .components()
            .iter()
            .filter_map(|&k| self.weights(k))
            .flat_map(|w| w.iter())
            .sum()
    }
}

/// Output slot receiving a completed mix; 0-based everywhere
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputPort {
    First,
    Second,
}

impl OutputPort {
    pub fn from_index(index: usize) -> MixResult<Self> {
        match index {
            0 => Ok(OutputPort::First),
            1 => Ok(OutputPort::Second),
            _ => Err(MixerError::InvalidPort(index)),
        }
    }

    pub fn index(&self) -> usize {
        match self {
            OutputPort::First => 0,
            OutputPort::Second => 1,
        }
    }
}

impl Default for OutputPort {
    fn default() -> Self {
        Self::First
    }
}

/// Fluent construction of [`MixSettings`]
#[derive(Debug, Clone)]
pub struct MixSettingsBuilder {
    mode: MixMode,
    weights: HashMap<ComponentKind, Vec<f64>>,
    region: RegionConfig,
    region_kinds: HashMap<ComponentKind, RegionKind>,
}

impl MixSettingsBuilder {
    pub fn new(mode: MixMode) -> Self {
        Self {
            mode,
            weights: HashMap::new(),
            region: RegionConfig::default(),
            region_kinds: HashMap::new(),
        }
    }

    pub fn weights(mut self, kind: ComponentKind, weights: Vec<f64>) -> Self {
        self.weights.insert(kind, weights);
        self
    }

    /// Shared region geometry; per-component kinds default to the geometry's kind
    pub fn region(mut self, region: RegionConfig) -> Self {
        self.region = region;
        self
    }

    pub fn region_kind(mut self, kind: ComponentKind, region_kind: RegionKind) -> Self {
        self.region_kinds.insert(kind, region_kind);
        self
    }

    /// Build for `slot_count` active slots; missing weight vectors are zero-filled
    pub fn build(self, slot_count: usize) -> MixResult<MixSettings> {
        if slot_count == 0 {
            return Err(MixerError::NoActiveSlots);
        }

        let weights_for = |kind: ComponentKind| -> MixResult<Vec<f64>> {
            match self.weights.get(&kind) {
                Some(w) if w.len() != slot_count => Err(MixerError::InvalidWeight(format!(
                    "{} weights must have {} entries (one per active slot), got {}",
                    kind,
                    slot_count,
                    w.len()
                ))),
                Some(w) => Ok(w.clone()),
                None => Ok(vec![0.0; slot_count]),
            }
        };
        let region_for = |kind: ComponentKind| {
            let region_kind = self.region_kinds.get(&kind).copied().unwrap_or(self.region.kind);
            self.region.with_kind(region_kind)
        };

        match self.mode {
            MixMode::MagnitudePhase => Ok(MixSettings::MagnitudePhase(MagnitudePhaseSettings::new(
                weights_for(ComponentKind::Magnitude)?,
                weights_for(ComponentKind::Phase)?,
                region_for(ComponentKind::Magnitude),
                region_for(ComponentKind::Phase),
            )?)),
            MixMode::RealImaginary => Ok(MixSettings::RealImaginary(RealImaginarySettings::new(
                weights_for(ComponentKind::Real)?,
                weights_for(ComponentKind::Imaginary)?,
                region_for(ComponentKind::Real),
                region_for(ComponentKind::Imaginary),
            )?)),
        }
    }
}

fn validate_weights(name: &str, weights: &[f64]) -> MixResult<()> {
    if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(MixerError::InvalidWeight(format!(
            "{} weights must be finite and non-negative, got {}",
            name, bad
        )));
    }
    Ok(())
}

fn validate_pair_length(a: &[f64], b: &[f64]) -> MixResult<()> {
    if a.len() != b.len() {
        return Err(MixerError::InvalidWeight(format!(
            "weight vectors differ in length: {} vs {}",
            a.len(),
            b.len()
        )));
    }
    Ok(())
}
