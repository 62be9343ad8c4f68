mod host;
pub use self::host::{RenderHost, SynthSender, MAX_SYNTHS};

#[cfg(feature = "native")]
pub mod native;
#[cfg(feature = "native")]
pub use self::native::{start, Options};
