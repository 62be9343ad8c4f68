use serde::{Deserialize, Serialize};

use super::curve::Curve;
use super::prelude::{ping_pong, TAU};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
    /// Shaped by a [`Curve`]; only meaningful for LFOs.
    Custom,
}

impl Waveform {
    /// Evaluates the waveform at a normalized phase in [0, 1).
    ///
    /// `curve` is only consulted for [`Waveform::Custom`]; without one the
    /// custom shape is silent.
    pub fn evaluate(self, phase: f64, curve: Option<&Curve>) -> f32 {
        match self {
            Waveform::Sine => (phase * TAU).sin() as f32,
            Waveform::Square => {
                if (phase * TAU).sin() >= 0.0 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => (2.0 * phase - 1.0) as f32,
            // Four ramps per cycle of ping-pong keeps the period equal to Sine.
            Waveform::Triangle => (ping_pong(phase * 4.0, 2.0) - 1.0) as f32,
            Waveform::Custom => curve
                .map(|c| c.evaluate(phase as f32).clamp(0.0, 1.0))
                .unwrap_or(0.0),
        }
    }

    /// Next audible waveform. Custom is never entered by cycling.
    pub fn next(self) -> Self {
        match self {
            Waveform::Sine => Waveform::Square,
            Waveform::Square => Waveform::Sawtooth,
            Waveform::Sawtooth => Waveform::Triangle,
            Waveform::Triangle => Waveform::Sine,
            Waveform::Custom => Waveform::Sine,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            Waveform::Sine => Waveform::Triangle,
            Waveform::Square => Waveform::Sine,
            Waveform::Sawtooth => Waveform::Square,
            Waveform::Triangle => Waveform::Sawtooth,
            Waveform::Custom => Waveform::Triangle,
        }
    }
}
