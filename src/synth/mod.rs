pub mod chain;
pub mod config;
pub mod control;
pub mod core;
pub mod curve;
pub mod envelope;
pub mod error;
pub mod mixer;
pub mod note;
pub mod operator;
pub mod oscillator;
pub mod prelude;
pub mod scale;
pub mod scheduler;
pub mod voice;
pub mod waveform;

pub use self::chain::OperatorChain;
pub use self::config::{Patch, SynthConfig};
pub use self::control::{NoteHandle, SynthController};
pub use self::core::{Synth, SynthMode};
pub use self::envelope::{Envelope, EnvelopeConfig, EnvelopeState};
pub use self::error::SynthError;
pub use self::mixer::Mixer;
pub use self::operator::{Operator, OperatorConfig};
pub use self::scheduler::{Scheduler, TimerToken};
pub use self::voice::VoiceHandle;
pub use self::waveform::Waveform;
pub use self::core::{SynthId, SynthShared};
pub use self::curve::{Curve, Keyframe};
pub use self::mixer::SynthIdentity;
pub use self::operator::{CycleDirection, OperatorEvent};
