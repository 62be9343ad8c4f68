mod cpal_backend;
pub use self::cpal_backend::CpalBackend;

use crate::synth::SynthError;

pub trait AudioBackend {
    fn start(&mut self) -> Result<(), SynthError>;
    fn stop(&mut self);
}
