// src/config/request.rs
//
// Wire shape of a mix request as sent by a front end, and its resolution
// into validated settings for the slots that are actually loaded.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::settings::{
    ComponentKind, MixMode, MixSettings, MixSettingsBuilder, OutputPort, RegionConfig, RegionKind,
};
use crate::error::{MixResult, MixerError};

/// Number of input slots a request may reference
pub const MAX_SLOTS: usize = 4;

/// Per-component weight vectors, indexed by slot number
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightsRequest {
    pub magnitude: Option<Vec<f64>>,
    pub phase: Option<Vec<f64>>,
    pub real: Option<Vec<f64>>,
    pub imaginary: Option<Vec<f64>>,
}

impl WeightsRequest {
    pub fn get(&self, kind: ComponentKind) -> Option<&Vec<f64>> {
        match kind {
            ComponentKind::Magnitude => self.magnitude.as_ref(),
            ComponentKind::Phase => self.phase.as_ref(),
            ComponentKind::Real => self.real.as_ref(),
            ComponentKind::Imaginary => self.imaginary.as_ref(),
        }
    }
}

/// Region as sent on the wire.
///
/// `type` applies to every component; the per-component keys override it.
/// `size` is the legacy square form and is used only when width/height are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionRequest {
    pub enabled: bool,
    pub x: f64,
    pub y: f64,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub size: Option<f64>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub magnitude: Option<String>,
    pub phase: Option<String>,
    pub real: Option<String>,
    pub imaginary: Option<String>,
}

impl Default for RegionRequest {
    fn default() -> Self {
        Self {
            enabled: false,
            x: 0.5,
            y: 0.5,
            width: None,
            height: None,
            size: None,
            kind: None,
            magnitude: None,
            phase: None,
            real: None,
            imaginary: None,
        }
    }
}

impl RegionRequest {
    fn component_kind(&self, kind: ComponentKind) -> Option<&String> {
        match kind {
            ComponentKind::Magnitude => self.magnitude.as_ref(),
            ComponentKind::Phase => self.phase.as_ref(),
            ComponentKind::Real => self.real.as_ref(),
            ComponentKind::Imaginary => self.imaginary.as_ref(),
        }
    }

    /// Shared geometry with the default region kind
    pub fn geometry(&self) -> MixResult<RegionConfig> {
        let defaults = RegionConfig::default();
        let (width, height) = match (self.width, self.height, self.size) {
            (Some(w), Some(h), _) => (w, h),
            (_, _, Some(size)) => (size, size),
            (w, h, None) => (w.unwrap_or(defaults.width), h.unwrap_or(defaults.height)),
        };
        let kind = match &self.kind {
            Some(name) => RegionKind::from_name(name)?,
            None => RegionKind::Inner,
        };

        let region = RegionConfig {
            enabled: self.enabled,
            x: self.x,
            y: self.y,
            width,
            height,
            kind,
        };
        region.validate()?;
        Ok(region)
    }
}

/// A mix request: which slots, which mode, weights, region and destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixRequest {
    /// Slots to mix; `None` means every loaded slot
    pub active_slots: Option<Vec<usize>>,
    pub mode: String,
    pub weights: WeightsRequest,
    pub region: RegionRequest,
    pub output_port: usize,
}

impl Default for MixRequest {
    fn default() -> Self {
        Self {
            active_slots: None,
            mode: MixMode::MagnitudePhase.name().to_string(),
            weights: WeightsRequest::default(),
            region: RegionRequest::default(),
            output_port: 0,
        }
    }
}

/// A request bound to concrete slots
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMix {
    /// Slot indices in mixing order; weight vectors follow this order
    pub slots: Vec<usize>,
    pub settings: MixSettings,
    pub port: OutputPort,
}

impl MixRequest {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Bind the request to the loaded slots.
    ///
    /// Without `active_slots` every loaded slot takes part; an explicitly
    /// requested slot that is not loaded is `NotLoaded`. Weight vectors are
    /// indexed by slot number and projected onto the active slots.
    pub fn resolve(&self, loaded: &[usize]) -> MixResult<ResolvedMix> {
        let mode = MixMode::from_name(&self.mode)?;
        let port = OutputPort::from_index(self.output_port)?;

        let slots: Vec<usize> = match &self.active_slots {
            Some(requested) => {
                if let Some(&bad) = requested.iter().find(|&&s| s >= MAX_SLOTS) {
                    return Err(MixerError::InvalidSlot(bad));
                }
                if let Some(&empty) = requested.iter().find(|&&s| !loaded.contains(&s)) {
                    return Err(MixerError::NotLoaded { slot: empty });
                }
                requested.clone()
            }
            None => loaded.to_vec(),
        };
        if slots.is_empty() {
            return Err(MixerError::NoActiveSlots);
        }

        let mut builder = MixSettingsBuilder::new(mode).region(self.region.geometry()?);
        for kind in mode.components() {
            if let Some(all) = self.weights.get(kind) {
                let projected = slots
                    .iter()
                    .map(|&s| {
                        all.get(s).copied().ok_or_else(|| {
                            MixerError::InvalidWeight(format!(
                                "{} weights have {} entries but slot {} is active",
                                kind,
                                all.len(),
                                s
                            ))
                        })
                    })
                    .collect::<MixResult<Vec<f64>>>()?;
                builder = builder.weights(kind, projected);
            }
            if let Some(name) = self.region.component_kind(kind) {
                builder = builder.region_kind(kind, RegionKind::from_name(name)?);
            }
        }

        Ok(ResolvedMix {
            settings: builder.build(slots.len())?,
            slots,
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_request() {
        let json = r#"{
            "active_slots": [0, 2],
            "mode": "magnitude_phase",
            "weights": {"magnitude": [1.0, 0.0, 0.25, 0.0], "phase": [0.0, 0.0, 1.0, 0.0]},
            "region": {"enabled": true, "x": 0.5, "y": 0.5, "width": 0.2, "height": 0.4,
                       "type": "inner", "phase": "outer"},
            "output_port": 1
        }"#;
        let request = MixRequest::from_json(json).unwrap();
        let resolved = request.resolve(&[0, 1, 2]).unwrap();

        assert_eq!(resolved.slots, vec![0, 2]);
        assert_eq!(resolved.port, OutputPort::Second);
        let settings = &resolved.settings;
        assert_eq!(settings.weights(ComponentKind::Magnitude).unwrap(), &[1.0, 0.25]);
        assert_eq!(settings.weights(ComponentKind::Phase).unwrap(), &[0.0, 1.0]);
        assert_eq!(settings.region(ComponentKind::Magnitude).unwrap().kind, RegionKind::Inner);
        assert_eq!(settings.region(ComponentKind::Phase).unwrap().kind, RegionKind::Outer);
        assert_eq!(settings.region(ComponentKind::Phase).unwrap().height, 0.4);
    }

    #[test]
    fn test_requested_unloaded_slot_rejected() {
        let request = MixRequest {
            active_slots: Some(vec![0, 1, 3]),
            ..Default::default()
        };
        assert!(matches!(request.resolve(&[1, 3]), Err(MixerError::NotLoaded { slot: 0 })));

        let request = MixRequest {
            active_slots: Some(vec![1, 3]),
            ..Default::default()
        };
        let resolved = request.resolve(&[1, 3]).unwrap();
        assert_eq!(resolved.slots, vec![1, 3]);
        assert_eq!(resolved.settings.weights(ComponentKind::Phase).unwrap(), &[0.0, 0.0]);
    }

    #[test]
    fn test_implicit_slots_follow_loaded() {
        let resolved = MixRequest::default().resolve(&[2]).unwrap();
        assert_eq!(resolved.slots, vec![2]);
    }

    #[test]
    fn test_no_loaded_slots() {
        let request = MixRequest::default();
        assert!(matches!(request.resolve(&[]), Err(MixerError::NoActiveSlots)));
    }

    #[test]
    fn test_invalid_mode_and_port() {
        let request = MixRequest {
            mode: "hue_saturation".to_string(),
            ..Default::default()
        };
        assert!(matches!(request.resolve(&[0]), Err(MixerError::InvalidMode(_))));

        let request = MixRequest {
            output_port: 2,
            ..Default::default()
        };
        assert!(matches!(request.resolve(&[0]), Err(MixerError::InvalidPort(2))));
    }

    #[test]
    fn test_legacy_size_sets_square_region() {
        let request: MixRequest =
            serde_json::from_str(r#"{"region": {"enabled": true, "size": 0.6, "type": "outer"}}"#)
                .unwrap();
        let region = request.region.geometry().unwrap();
        assert_eq!((region.width, region.height), (0.6, 0.6));
        assert_eq!(region.kind, RegionKind::Outer);
    }

    #[test]
    fn test_short_weight_vector_rejected() {
        let request = MixRequest {
            weights: WeightsRequest {
                magnitude: Some(vec![1.0]),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(request.resolve(&[0, 2]), Err(MixerError::InvalidWeight(_))));
    }
}
