//! Twelve-tone equal temperament anchored at A4 = 440 Hz.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const A4_FREQUENCY: f32 = 440.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteName {
    A,
    ASharp,
    B,
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
}

/// Note names indexed by semitone offset from A.
pub const TWELVE_TONE_SCALE: [NoteName; 12] = [
    NoteName::A,
    NoteName::ASharp,
    NoteName::B,
    NoteName::C,
    NoteName::CSharp,
    NoteName::D,
    NoteName::DSharp,
    NoteName::E,
    NoteName::F,
    NoteName::FSharp,
    NoteName::G,
    NoteName::GSharp,
];

impl NoteName {
    /// Name for a semitone offset from A4, negative offsets included.
    pub fn from_semitones(semitones: i32) -> Self {
        TWELVE_TONE_SCALE[semitones.rem_euclid(12) as usize]
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NoteName::A => "A",
            NoteName::ASharp => "A#",
            NoteName::B => "B",
            NoteName::C => "C",
            NoteName::CSharp => "C#",
            NoteName::D => "D",
            NoteName::DSharp => "D#",
            NoteName::E => "E",
            NoteName::F => "F",
            NoteName::FSharp => "F#",
            NoteName::G => "G",
            NoteName::GSharp => "G#",
        };
        f.write_str(name)
    }
}

/// Result of snapping a frequency to the nearest tempered pitch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantizedPitch {
    pub frequency: f32,
    /// Semitones above (or below) A4.
    pub semitones: i32,
    pub note: NoteName,
}

/// Snaps `frequency` to the nearest 12-TET pitch.
///
/// Returns `None` for non-positive or non-finite input, where no pitch exists.
pub fn quantize(frequency: f32) -> Option<QuantizedPitch> {
    if !(frequency.is_finite() && frequency > 0.0) {
        return None;
    }
    let exact = 12.0 * (f64::from(frequency) / f64::from(A4_FREQUENCY)).log2();
    let semitones = exact.round() as i32;
    Some(QuantizedPitch {
        frequency: semitone_to_frequency(semitones),
        semitones,
        note: NoteName::from_semitones(semitones),
    })
}

pub fn semitone_to_frequency(semitones: i32) -> f32 {
    (f64::from(A4_FREQUENCY) * 2f64.powf(f64::from(semitones) / 12.0)) as f32
}
