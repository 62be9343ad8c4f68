use std::sync::atomic::{AtomicU64, Ordering};

use super::envelope::{Envelope, EnvelopeConfig};
use super::oscillator::Oscillator;
use super::waveform::Waveform;

static NEXT_VOICE_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one polyphonic voice inside an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceHandle(u64);

impl VoiceHandle {
    /// Allocates a process-unique handle.
    pub fn next() -> Self {
        Self(NEXT_VOICE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

/// One sounding note within an operator: its own oscillator and envelope
/// at a fixed target frequency.
#[derive(Debug, Clone)]
pub struct Voice {
    handle: VoiceHandle,
    oscillator: Oscillator,
    envelope: Envelope,
    frequency: f32,
    note_on: bool,
    to_remove: bool,
}

impl Voice {
    /// Creates a gated voice. Voices are always interruptible so stacked notes
    /// release independently, whatever the template says.
    pub fn new(handle: VoiceHandle, frequency: f32, template: EnvelopeConfig, sample_rate: f32) -> Self {
        Self {
            handle,
            oscillator: Oscillator::new(sample_rate),
            envelope: Envelope::new(template.with_interrupt(true)),
            frequency,
            note_on: true,
            to_remove: false,
        }
    }

    pub fn next_sample(&mut self, volume: f32, waveform: Waveform, dt: f32) -> f32 {
        let amplitude = self.envelope.update(self.note_on, dt);
        self.oscillator
            .generate_sample(self.frequency, volume * amplitude, waveform)
    }

    /// Drops the gate and marks the voice for removal once its release tail ends.
    pub fn release(&mut self) {
        self.note_on = false;
        self.to_remove = true;
    }

    /// Released and silent; safe to discard.
    pub fn is_finished(&self) -> bool {
        self.to_remove && self.envelope.is_complete()
    }

    pub fn handle(&self) -> VoiceHandle {
        self.handle
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn is_note_on(&self) -> bool {
        self.note_on
    }

    pub fn is_marked_for_removal(&self) -> bool {
        self.to_remove
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub(crate) fn set_sample_rate(&mut self, sample_rate: f32) {
        self.oscillator.set_sample_rate(sample_rate);
    }
}
