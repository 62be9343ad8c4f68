use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building or configuring synths.
///
/// Nothing on the render path returns these; note lifecycle calls treat bad
/// input as a logged no-op instead.
#[derive(Debug, Error)]
pub enum SynthError {
    /// MIDI note number outside 0..=127.
    #[error("invalid MIDI note number: {0}")]
    InvalidNote(u8),

    /// Tempo or tick resolution that cannot convert ticks to seconds.
    #[error("invalid tempo: {bpm} bpm at {ticks_per_quarter} ticks per quarter note")]
    InvalidTempo { bpm: f32, ticks_per_quarter: f32 },

    /// Negative or non-finite note timing.
    #[error("invalid note timing: start {start}s, duration {duration}s")]
    InvalidTiming { start: f32, duration: f32 },

    /// An operator names a modulator index that does not exist.
    #[error("operator {operator} references unknown modulator {modulator} ({len} operators)")]
    UnknownModulator {
        operator: usize,
        modulator: usize,
        len: usize,
    },

    /// Modulators must sit after the operator they modulate.
    #[error("operator {operator} cannot be modulated by operator {modulator}: modulators must come later in the chain")]
    ModulatorOrder { operator: usize, modulator: usize },

    /// A modulator may drive at most one operator.
    #[error("operator {modulator} already modulates operator {first}; cannot also modulate {second}")]
    SharedModulator {
        modulator: usize,
        first: usize,
        second: usize,
    },

    /// Failed to read a patch file.
    #[error("failed to read patch '{path}': {source}")]
    PatchRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Patch JSON was malformed.
    #[error("failed to parse patch: {0}")]
    PatchParse(#[from] serde_json::Error),

    /// Audio device or stream failure.
    #[error("audio backend error: {0}")]
    Audio(String),

    /// MIDI port discovery or connection failure.
    #[error("MIDI error: {0}")]
    Midi(String),
}
