//! Piecewise-linear curves sampled by oscillator phase.
//!
//! A [`Curve`] is a list of keyframes over normalized time. It drives the
//! [`Waveform::Custom`](super::waveform::Waveform::Custom) shape used by
//! operator LFOs.

use serde::{Deserialize, Serialize};

use super::prelude::lerp;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
}

impl Keyframe {
    pub fn new(time: f32, value: f32) -> Self {
        Self { time, value }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Keyframe>", into = "Vec<Keyframe>")]
pub struct Curve {
    keys: Vec<Keyframe>,
}

impl Curve {
    /// Builds a curve from keyframes in any order.
    pub fn new(mut keys: Vec<Keyframe>) -> Self {
        keys.retain(|k| k.time.is_finite() && k.value.is_finite());
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    /// A flat curve.
    pub fn constant(value: f32) -> Self {
        Self::new(vec![Keyframe::new(0.0, value), Keyframe::new(1.0, value)])
    }

    /// Dips from 1.0 down to `1.0 - depth` at mid-cycle and back.
    ///
    /// As an LFO frequency multiplier this gives a gentle vibrato.
    pub fn vibrato(depth: f32) -> Self {
        let depth = depth.clamp(0.0, 1.0);
        Self::new(vec![
            Keyframe::new(0.0, 1.0),
            Keyframe::new(0.5, 1.0 - depth),
            Keyframe::new(1.0, 1.0),
        ])
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Samples the curve at `time`, holding the end values outside the keyed range.
    pub fn evaluate(&self, time: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };
        if time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }
        // First key strictly after `time`; guaranteed to exist and be > 0 here.
        let upper = self.keys.partition_point(|k| k.time <= time);
        let a = self.keys[upper - 1];
        let b = self.keys[upper];
        let span = b.time - a.time;
        if span <= f32::EPSILON {
            return b.value;
        }
        lerp(a.value, b.value, (time - a.time) / span)
    }
}

impl From<Vec<Keyframe>> for Curve {
    fn from(keys: Vec<Keyframe>) -> Self {
        Self::new(keys)
    }
}

impl From<Curve> for Vec<Keyframe> {
    fn from(curve: Curve) -> Self {
        curve.keys
    }
}
