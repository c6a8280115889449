use anyhow::{bail, Result};
use serde::Serialize;
use std::sync::Mutex;
use tracing::info;

/// Flows that can hold the microphone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaOwner {
    /// Live conversation with the agent in the room
    LiveConversation,
    /// Recording a sample for voice cloning
    VoiceSample,
}

/// Exclusive ownership of the capture device
///
/// Acquiring while another flow holds the device is an error; the caller has
/// to stop one flow before starting the other.
#[derive(Debug, Default)]
pub struct MediaArbiter {
    owner: Mutex<Option<MediaOwner>>,
}

impl MediaArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, who: MediaOwner) -> Result<()> {
        let mut owner = self.owner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match *owner {
            Some(current) if current == who => Ok(()),
            Some(current) => bail!(
                "microphone is held by {:?}; stop it before starting {:?}",
                current,
                who
            ),
            None => {
                info!("Microphone acquired by {:?}", who);
                *owner = Some(who);
                Ok(())
            }
        }
    }

    /// Release if `who` holds the device; no-op otherwise
    pub fn release(&self, who: MediaOwner) {
        let mut owner = self.owner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if *owner == Some(who) {
            info!("Microphone released by {:?}", who);
            *owner = None;
        }
    }

    pub fn owner(&self) -> Option<MediaOwner> {
        *self.owner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
