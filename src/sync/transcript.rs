use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, error};

use super::debounce::Debouncer;
use crate::channel::{codec, Envelope, RoomTransport, TranscriptPositionBody, TranscriptPositionMessage};

/// One time-aligned piece of the walkthrough transcript (seconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }
}

/// Split of the transcript around the playback time
///
/// `read` holds segments with `end <= time`, `remaining` those with
/// `start > time`. A segment with `start <= time < end` is still being
/// spoken and lands in neither list. Empty texts are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptPosition {
    pub read: Vec<String>,
    pub remaining: Vec<String>,
}

impl TranscriptPosition {
    pub fn at(segments: &[TranscriptSegment], time: f64) -> Self {
        let mut position = TranscriptPosition::default();
        for segment in segments {
            let text = segment.text.trim();
            if text.is_empty() {
                continue;
            }
            if segment.end <= time {
                position.read.push(text.to_string());
            } else if segment.start > time {
                position.remaining.push(text.to_string());
            }
        }
        position
    }

    pub fn into_body(self) -> TranscriptPositionBody {
        TranscriptPositionBody {
            read: self.read,
            remaining: self.remaining,
        }
    }
}

#[derive(Default)]
struct TranscriptState {
    segments: Vec<TranscriptSegment>,
    last_sent: Option<TranscriptPosition>,
}

struct Shared {
    transport: Arc<dyn RoomTransport>,
    state: Mutex<TranscriptState>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, TranscriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn send(&self, position: TranscriptPosition) {
        if !self.transport.state().borrow().is_connected() {
            return;
        }
        if self.state().last_sent.as_ref() == Some(&position) {
            return;
        }
        match self.publish(position.clone()).await {
            Ok(()) => {
                debug!(
                    "Sent transcript position (read={}, remaining={})",
                    position.read.len(),
                    position.remaining.len()
                );
                self.state().last_sent = Some(position);
            }
            Err(e) => error!("Error sending transcript position: {:#}", e),
        }
    }

    async fn publish(&self, position: TranscriptPosition) -> Result<()> {
        let envelope = Envelope::TranscriptPosition(TranscriptPositionMessage {
            transcript_position: position.into_body(),
        });
        let payload = codec::encode(&envelope).context("Failed to encode transcript position")?;
        self.transport.publish(envelope.topic(), payload).await
    }
}

/// Keeps the agent informed of how far video playback has progressed
/// through the walkthrough transcript
pub struct TranscriptSynchronizer {
    shared: Arc<Shared>,
    debouncer: Debouncer<TranscriptPosition>,
}

impl TranscriptSynchronizer {
    pub fn new(transport: Arc<dyn RoomTransport>, quiet: Duration) -> Self {
        let shared = Arc::new(Shared {
            transport,
            state: Mutex::new(TranscriptState::default()),
        });
        let fire_shared = Arc::clone(&shared);
        let debouncer = Debouncer::new(quiet, move |position: TranscriptPosition| {
            let shared = Arc::clone(&fire_shared);
            async move { shared.send(position).await }
        });
        Self { shared, debouncer }
    }

    pub fn set_segments(&self, segments: Vec<TranscriptSegment>) {
        let mut state = self.shared.state();
        state.segments = segments;
        state.last_sent = None;
    }

    pub fn segments(&self) -> Vec<TranscriptSegment> {
        self.shared.state().segments.clone()
    }

    /// Playback reached `time` seconds. Returns the partition at that time.
    pub fn on_time_update(&self, time: f64) -> TranscriptPosition {
        let position = {
            let state = self.shared.state();
            TranscriptPosition::at(&state.segments, time)
        };
        if self.shared.state().last_sent.as_ref() == Some(&position) {
            self.debouncer.cancel();
        } else {
            self.debouncer.schedule(position.clone());
        }
        position
    }

    pub fn last_sent(&self) -> Option<TranscriptPosition> {
        self.shared.state().last_sent.clone()
    }

    pub fn reset(&self) {
        self.debouncer.cancel();
        self.shared.state().last_sent = None;
    }

    pub async fn flush_now(&self) -> bool {
        self.debouncer.flush_now().await
    }
}
