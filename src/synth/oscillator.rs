use super::curve::Curve;
use super::waveform::Waveform;

/// Phase-accumulator waveform generator.
///
/// Phase is normalized to [0, 1) and advanced by `frequency / sample_rate`
/// on every sample. The only state is the phase itself, plus an optional
/// curve for [`Waveform::Custom`].
#[derive(Debug, Clone)]
pub struct Oscillator {
    phase: f64,
    sample_rate: f64,
    curve: Option<Curve>,
}

impl Oscillator {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            phase: 0.0,
            sample_rate: f64::from(sample_rate.max(1.0)),
            curve: None,
        }
    }

    pub fn with_curve(sample_rate: f32, curve: Curve) -> Self {
        Self {
            curve: Some(curve),
            ..Self::new(sample_rate)
        }
    }

    /// Advances the phase and returns the next sample scaled by `amplitude`.
    pub fn generate_sample(&mut self, frequency: f32, amplitude: f32, waveform: Waveform) -> f32 {
        self.phase += f64::from(frequency) / self.sample_rate;
        self.wrap_phase();
        waveform.evaluate(self.phase, self.curve.as_ref()) * amplitude
    }

    fn wrap_phase(&mut self) {
        if !self.phase.is_finite() {
            self.phase = 0.0;
            return;
        }
        // Subtracting the floor handles negative and very small increments alike.
        self.phase -= self.phase.floor();
        if self.phase >= 1.0 {
            self.phase = 0.0;
        }
    }

    pub fn reset_phase(&mut self) {
        self.phase = 0.0;
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate as f32
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = f64::from(sample_rate.max(1.0));
    }

    pub fn curve(&self) -> Option<&Curve> {
        self.curve.as_ref()
    }

    pub fn set_curve(&mut self, curve: Option<Curve>) {
        self.curve = curve;
    }
}
