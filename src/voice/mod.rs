//! Voice cloning and microphone ownership

mod library;
mod media;
mod sample;

pub use library::VoiceLibrary;
pub use media::{MediaArbiter, MediaOwner};
pub use sample::VoiceSampleRecorder;
