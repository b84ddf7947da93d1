//! Configuration module for the Fourier mixer

mod request;
mod settings;

pub use request::{MixRequest, RegionRequest, ResolvedMix, WeightsRequest, MAX_SLOTS};
pub use settings::{
    ComponentKind, MagnitudePhaseSettings, MixMode, MixSettings, MixSettingsBuilder, OutputPort,
    RealImaginarySettings, RegionConfig, RegionKind,
};
