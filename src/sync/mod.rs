//! Position synchronisation with the room peer
//!
//! Slide index and transcript progress are pushed through single-slot
//! debouncers so bursts of changes collapse into one send.

mod debounce;
mod slide;
mod transcript;

pub use debounce::Debouncer;
pub use slide::{SlideContext, SlideSynchronizer};
pub use transcript::{TranscriptPosition, TranscriptSegment, TranscriptSynchronizer};
