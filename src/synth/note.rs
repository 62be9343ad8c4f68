use super::error::SynthError;
use super::scale::A4_FREQUENCY;

/// MIDI note number of A4.
pub const A4_NOTE: u8 = 69;

/// Converts a MIDI note number to its equal-tempered frequency in Hz.
pub fn midi_note_to_frequency(note_number: u8) -> f32 {
    A4_FREQUENCY * 2f32.powf((f32::from(note_number) - f32::from(A4_NOTE)) / 12.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteSource {
    Keyboard,
    Midi,
    Sequencer,
}

/// A live note on/off message from an input device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    pub note_number: u8,
    pub velocity: u8,
    pub frequency: f32,
    pub is_on: bool,
    pub source: NoteSource,
}

impl NoteEvent {
    pub fn new(
        note_number: u8,
        velocity: u8,
        is_on: bool,
        source: NoteSource,
    ) -> Result<Self, SynthError> {
        if note_number > 127 {
            return Err(SynthError::InvalidNote(note_number));
        }
        Ok(Self {
            note_number,
            velocity: velocity.min(127),
            frequency: midi_note_to_frequency(note_number),
            is_on,
            source,
        })
    }
}
