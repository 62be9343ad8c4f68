use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::core::SynthMode;
use super::curve::Curve;
use super::envelope::EnvelopeConfig;
use super::error::SynthError;
use super::operator::OperatorConfig;
use super::waveform::Waveform;

#[derive(Clone, Debug, PartialEq)]
pub struct SynthConfig {
    /// Voices per operator before the oldest is stolen.
    pub max_voices: usize,
    pub sample_rate: f32,
    /// Pending control commands the render side can fall behind by.
    pub command_capacity: usize,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            max_voices: 32,
            sample_rate: 44100.0, // Standard audio sample rate
            command_capacity: 256,
        }
    }
}

/// A named, serializable operator chain.
///
/// Operator 0 is the carrier; each operator's `modulator` field indexes into
/// the same list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub name: String,
    #[serde(default)]
    pub mode: SynthMode,
    pub operators: Vec<OperatorConfig>,
}

impl Patch {
    pub fn from_json(json: &str) -> Result<Self, SynthError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SynthError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SynthError::PatchRead {
            path: path.to_path_buf(),
            source,
        })?;
        let patch = Self::from_json(&json)?;
        info!("Loaded patch '{}' from {}", patch.name, path.display());
        Ok(patch)
    }

    pub fn to_json(&self) -> Result<String, SynthError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for Patch {
    /// Two-operator FM pair played polyphonically: a sine carrier with a
    /// slight vibrato, modulated by a sine an octave up.
    fn default() -> Self {
        let carrier = OperatorConfig {
            base_frequency: 220.0,
            volume: 0.6,
            waveform: Waveform::Sine,
            modulator: Some(1),
            modulation_depth: 80.0,
            use_lfo: true,
            lfo_frequency: 5.0,
            lfo_curve: Curve::vibrato(0.01),
            envelope: EnvelopeConfig::new(0.01, 0.2, 0.7, 0.4).with_interrupt(true),
            ..OperatorConfig::default()
        };
        let modulator = OperatorConfig {
            base_frequency: 440.0,
            frequency_multiplier: 2.0,
            volume: 1.0,
            envelope: EnvelopeConfig::new(0.005, 0.3, 0.2, 0.2).with_interrupt(true),
            ..OperatorConfig::default()
        };
        Self {
            name: "fm-pair".to_string(),
            mode: SynthMode::Midi,
            operators: vec![carrier, modulator],
        }
    }
}
