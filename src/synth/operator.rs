use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::curve::Curve;
use super::envelope::{Envelope, EnvelopeConfig};
use super::oscillator::Oscillator;
use super::scale::{quantize, NoteName};
use super::voice::{Voice, VoiceHandle};
use super::waveform::Waveform;

pub const MIN_BASE_FREQUENCY: f32 = 1.0;
pub const MAX_BASE_FREQUENCY: f32 = 5000.0;
pub const MIN_LFO_FREQUENCY: f32 = 0.1;
pub const MAX_LFO_FREQUENCY: f32 = 20.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleDirection {
    Forward,
    Backward,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OperatorEvent {
    CycleWaveform { direction: CycleDirection },
    SetWaveform { operator: usize, waveform: Waveform },
    SetVolume { operator: usize, volume: f32 },
    SetModulationDepth { operator: usize, depth: f32 },
    SetQuantize { operator: usize, enabled: bool },
    SetLfo { operator: usize, enabled: bool, frequency: f32 },
}

/// Operator settings. Also the on-disk shape of an operator inside a patch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorConfig {
    /// Drone frequency in Hz, 1..=5000.
    pub base_frequency: f32,
    pub frequency_multiplier: f32,
    /// Output gain, 0..=1.
    pub volume: f32,
    pub waveform: Waveform,
    pub quantize_to_scale: bool,
    /// Index of the operator that modulates this one, if any.
    pub modulator: Option<usize>,
    /// Hz of frequency deviation per unit of modulator output.
    pub modulation_depth: f32,
    pub use_lfo: bool,
    pub lfo_frequency: f32,
    pub lfo_curve: Curve,
    pub envelope: EnvelopeConfig,
}

impl OperatorConfig {
    pub fn sanitized(mut self) -> Self {
        self.base_frequency = clamp_or(
            self.base_frequency,
            MIN_BASE_FREQUENCY,
            MAX_BASE_FREQUENCY,
            440.0,
        );
        self.frequency_multiplier = if self.frequency_multiplier.is_finite() {
            self.frequency_multiplier.max(0.0)
        } else {
            1.0
        };
        self.volume = clamp_or(self.volume, 0.0, 1.0, 1.0);
        if !self.modulation_depth.is_finite() {
            self.modulation_depth = 0.0;
        }
        self.lfo_frequency = clamp_or(
            self.lfo_frequency,
            MIN_LFO_FREQUENCY,
            MAX_LFO_FREQUENCY,
            5.0,
        );
        if self.lfo_curve.is_empty() {
            self.lfo_curve = Curve::constant(1.0);
        }
        self.envelope = self.envelope.sanitized();
        self
    }
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            base_frequency: 440.0,
            frequency_multiplier: 1.0,
            volume: 1.0,
            waveform: Waveform::Sine,
            quantize_to_scale: false,
            modulator: None,
            modulation_depth: 80.0,
            use_lfo: false,
            lfo_frequency: 5.0,
            lfo_curve: Curve::constant(1.0),
            envelope: EnvelopeConfig::default(),
        }
    }
}

fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

/// One FM stage: a drone oscillator gated by the synth, plus a pool of
/// independently enveloped note voices.
///
/// The modulator link is an index into the owning [`OperatorChain`]; the
/// operator itself never holds another operator.
///
/// [`OperatorChain`]: super::chain::OperatorChain
pub struct Operator {
    config: OperatorConfig,
    envelope: Envelope,
    main_oscillator: Oscillator,
    primary_enabled: bool,
    /// Drone runs at zero base frequency and is gated by voice activity.
    voice_driven: bool,
    drone_gate: bool,
    lfo: Oscillator,
    voices: Vec<Voice>,
    max_voices: usize,
    current_note: Option<NoteName>,
}

impl Operator {
    pub fn new(config: OperatorConfig, sample_rate: f32, max_voices: usize) -> Self {
        let config = config.sanitized();
        let max_voices = max_voices.max(1);
        Self {
            envelope: Envelope::new(config.envelope),
            main_oscillator: Oscillator::new(sample_rate),
            primary_enabled: true,
            voice_driven: false,
            drone_gate: false,
            lfo: Oscillator::with_curve(sample_rate, config.lfo_curve.clone()),
            voices: Vec::with_capacity(max_voices),
            max_voices,
            current_note: None,
            config,
        }
    }

    /// Produces the next output sample.
    ///
    /// `modulation` is the modulator's output for this sample, `None` when no
    /// modulator is attached. Voices play at their own fixed frequencies; only
    /// the drone oscillator follows the modulated frequency.
    ///
    /// A voice-driven drone has no base frequency, so it sounds only the
    /// modulation, and it is gated on while any voice is held.
    pub fn frequency_sample_value(&mut self, note_on: bool, dt: f32, modulation: Option<f32>) -> f32 {
        if self.voices.is_empty() && !self.primary_enabled {
            return 0.0;
        }

        let note_on = if self.voice_driven {
            let gate = note_on && self.voices.iter().any(Voice::is_note_on);
            if gate && !self.drone_gate {
                self.main_oscillator.reset_phase();
            }
            self.drone_gate = gate;
            gate
        } else {
            note_on
        };

        let mut frequency = if self.voice_driven {
            0.0
        } else {
            self.config.base_frequency * self.config.frequency_multiplier
        };
        if self.config.quantize_to_scale && !self.voice_driven {
            match quantize(frequency) {
                Some(pitch) => {
                    frequency = pitch.frequency;
                    self.current_note = Some(pitch.note);
                }
                None => self.current_note = None,
            }
        }

        if let Some(modulator_value) = modulation {
            frequency += modulator_value * self.config.modulation_depth;
        }

        if self.config.use_lfo {
            frequency *= self
                .lfo
                .generate_sample(self.config.lfo_frequency, 1.0, Waveform::Custom);
        }

        let main_amplitude = self.envelope.update(note_on, dt);
        let mut sample = if self.primary_enabled {
            self.main_oscillator.generate_sample(
                frequency,
                self.config.volume * main_amplitude,
                self.config.waveform,
            )
        } else {
            0.0
        };

        for voice in self.voices.iter_mut().rev() {
            sample += voice.next_sample(self.config.volume, self.config.waveform, dt);
        }
        // Released voices leave only after their tail has finished.
        self.voices.retain(|voice| !voice.is_finished());

        sample
    }

    /// Starts a new voice at `frequency` and returns its handle.
    pub fn add_voice(&mut self, frequency: f32) -> VoiceHandle {
        let handle = VoiceHandle::next();
        self.insert_voice(handle, frequency);
        handle
    }

    /// Starts a voice under a handle allocated elsewhere (the control thread).
    ///
    /// The pool never grows past `max_voices`; the oldest voice is stolen instead.
    pub fn insert_voice(&mut self, handle: VoiceHandle, frequency: f32) {
        if self.voices.len() >= self.max_voices {
            trace!(stolen = ?self.voices[0].handle(), "voice pool full, stealing oldest voice");
            self.voices.remove(0);
        }
        self.voices.push(Voice::new(
            handle,
            frequency,
            self.config.envelope,
            self.main_oscillator.sample_rate(),
        ));
    }

    /// Releases the voice; it is discarded once its release tail completes.
    /// Returns `false` for unknown or already-released handles.
    pub fn remove_voice(&mut self, handle: VoiceHandle) -> bool {
        match self
            .voices
            .iter_mut()
            .find(|voice| voice.handle() == handle && !voice.is_marked_for_removal())
        {
            Some(voice) => {
                voice.release();
                true
            }
            None => false,
        }
    }

    pub fn clear_voices(&mut self) {
        self.voices.clear();
    }

    pub fn voice(&self, handle: VoiceHandle) -> Option<&Voice> {
        self.voices.iter().find(|voice| voice.handle() == handle)
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn max_voices(&self) -> usize {
        self.max_voices
    }

    pub fn config(&self) -> &OperatorConfig {
        &self.config
    }

    pub fn modulator(&self) -> Option<usize> {
        self.config.modulator
    }

    pub(crate) fn set_modulator(&mut self, modulator: Option<usize>) {
        self.config.modulator = modulator;
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn envelope_mut(&mut self) -> &mut Envelope {
        &mut self.envelope
    }

    /// Note name of the last quantized frequency, if quantization is on.
    pub fn current_note(&self) -> Option<NoteName> {
        self.current_note
    }

    pub fn is_primary_enabled(&self) -> bool {
        self.primary_enabled
    }

    /// Turns the always-on drone oscillator on or off. Note voices are unaffected.
    pub fn set_primary_enabled(&mut self, enabled: bool) {
        if enabled && !self.primary_enabled {
            self.main_oscillator.reset_phase();
        }
        self.primary_enabled = enabled;
    }

    pub fn is_voice_driven(&self) -> bool {
        self.voice_driven
    }

    /// Drops the drone's base frequency to zero and gates it by held voices,
    /// so in MIDI mode the drone carries only the modulator's signal.
    pub fn set_voice_driven(&mut self, voice_driven: bool) {
        if voice_driven != self.voice_driven {
            self.main_oscillator.reset_phase();
            self.drone_gate = false;
        }
        self.voice_driven = voice_driven;
    }

    /// Restarts the drone oscillator at phase zero.
    pub fn retrigger(&mut self) {
        self.main_oscillator.reset_phase();
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.main_oscillator.set_sample_rate(sample_rate);
        self.lfo.set_sample_rate(sample_rate);
        for voice in &mut self.voices {
            voice.set_sample_rate(sample_rate);
        }
    }

    pub fn set_base_frequency(&mut self, frequency: f32) {
        self.config.base_frequency = clamp_or(
            frequency,
            MIN_BASE_FREQUENCY,
            MAX_BASE_FREQUENCY,
            self.config.base_frequency,
        );
    }

    pub fn set_frequency_multiplier(&mut self, multiplier: f32) {
        if multiplier.is_finite() {
            self.config.frequency_multiplier = multiplier.max(0.0);
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        debug!("Operator volume set to: {}", volume);
        self.config.volume = clamp_or(volume, 0.0, 1.0, self.config.volume);
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        debug!("Operator waveform set to: {:?}", waveform);
        self.config.waveform = waveform;
    }

    pub fn cycle_waveform(&mut self, direction: CycleDirection) {
        let waveform = match direction {
            CycleDirection::Forward => self.config.waveform.next(),
            CycleDirection::Backward => self.config.waveform.previous(),
        };
        self.set_waveform(waveform);
    }

    pub fn set_modulation_depth(&mut self, depth: f32) {
        if depth.is_finite() {
            self.config.modulation_depth = depth;
        }
    }

    pub fn set_quantize_to_scale(&mut self, enabled: bool) {
        self.config.quantize_to_scale = enabled;
        if !enabled {
            self.current_note = None;
        }
    }

    pub fn set_lfo(&mut self, enabled: bool, frequency: f32) {
        self.config.use_lfo = enabled;
        self.config.lfo_frequency = clamp_or(
            frequency,
            MIN_LFO_FREQUENCY,
            MAX_LFO_FREQUENCY,
            self.config.lfo_frequency,
        );
    }

    pub fn set_lfo_curve(&mut self, curve: Curve) {
        let curve = if curve.is_empty() {
            Curve::constant(1.0)
        } else {
            curve
        };
        self.lfo.set_curve(Some(curve.clone()));
        self.config.lfo_curve = curve;
    }

    /// Replaces the template envelope. Running voices keep their own copy.
    pub fn set_envelope(&mut self, envelope: EnvelopeConfig) {
        debug!(
            "Operator envelope set to: {}, {}, {}, {}",
            envelope.attack, envelope.decay, envelope.sustain, envelope.release
        );
        self.config.envelope = envelope.sanitized();
        self.envelope.set_config(self.config.envelope);
    }
}

impl Default for Operator {
    fn default() -> Self {
        Self::new(OperatorConfig::default(), 44100.0, 32)
    }
}
