//! Connection state tracking for the realtime room

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use crate::channel::{ConnectionState, JoinRequest, RoomTransport};

/// A change of connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: ConnectionState,
    pub to: ConnectionState,
}

impl Transition {
    pub fn connected(&self) -> bool {
        self.to == ConnectionState::Connected && self.from != ConnectionState::Connected
    }

    pub fn disconnected(&self) -> bool {
        self.to == ConnectionState::Disconnected && self.from != ConnectionState::Disconnected
    }
}

/// Read-only view over the transport's connection state and microphone flag
pub struct ConnectionTracker {
    transport: Arc<dyn RoomTransport>,
    observed: std::sync::Mutex<ConnectionState>,
}

impl ConnectionTracker {
    pub fn new(transport: Arc<dyn RoomTransport>) -> Self {
        let initial = *transport.state().borrow();
        Self {
            transport,
            observed: std::sync::Mutex::new(initial),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.transport.state().borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    pub fn microphone_enabled(&self) -> bool {
        self.transport.is_microphone_enabled()
    }

    /// Stream of raw state values from the transport
    pub fn watch(&self) -> watch::Receiver<ConnectionState> {
        self.transport.state()
    }

    /// Record `next` as the latest observed state, returning the transition
    /// if it differs from the previous observation
    pub fn observe(&self, next: ConnectionState) -> Option<Transition> {
        let mut observed = self
            .observed
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if *observed == next {
            return None;
        }
        let transition = Transition {
            from: *observed,
            to: next,
        };
        *observed = next;
        info!("Room connection: {:?} -> {:?}", transition.from, transition.to);
        Some(transition)
    }

    /// Ask the transport to join (`Some`) or leave (`None`) the room
    pub async fn request_connect(&self, join: Option<JoinRequest>) -> Result<()> {
        match join {
            Some(request) => self.transport.connect(request).await,
            None => self.transport.disconnect().await,
        }
    }

    pub async fn set_microphone_enabled(&self, enabled: bool) -> Result<()> {
        self.transport.set_microphone_enabled(enabled).await
    }
}
