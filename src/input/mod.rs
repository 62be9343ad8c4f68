//! Note sources that feed a [`SynthController`](crate::synth::SynthController):
//! the computer keyboard, MIDI hardware and timed note sequences.

pub mod sequence;
pub use self::sequence::{NoteSequence, ScheduledNote, ScheduledSequence};

#[cfg(feature = "native")]
mod keyboard;
#[cfg(feature = "native")]
mod midi;
#[cfg(feature = "native")]
pub use self::keyboard::KeyboardHandler;
#[cfg(feature = "native")]
pub use self::midi::MidiHandler;

use crate::synth::note::NoteEvent;
use crate::synth::operator::OperatorEvent;

/// What an input handler asks the control loop to do.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    Note(NoteEvent),
    Operator(OperatorEvent),
    /// Flip the synth gate between note on and note off.
    ToggleGate,
}
