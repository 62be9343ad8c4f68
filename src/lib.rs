//! Polyphonic FM synthesis engine.
//!
//! Control-rate code drives [`synth::SynthController`]s (note on/off, polyphonic
//! notes), while an audio callback pulls mixed blocks from the matching
//! render-side [`synth::Synth`]s through a [`runtime::RenderHost`].

pub mod input;
pub mod runtime;
pub mod synth;

#[cfg(feature = "native")]
pub mod audio;
