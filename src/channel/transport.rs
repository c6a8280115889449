use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};

use super::messages::DataPacket;
use crate::session::AgentRole;

/// Connection state of the realtime room as reported by the transport
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }
}

/// Who is joining the room and in which role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRequest {
    pub room: String,
    pub user_id: String,
    pub role: AgentRole,
}

/// Realtime room transport
///
/// Implementations:
/// - NATS: data channel mapped onto subjects (production)
/// - Loopback: in-process, for tests and demos
#[async_trait::async_trait]
pub trait RoomTransport: Send + Sync {
    /// Join the room. State changes are reported through [`RoomTransport::state`].
    async fn connect(&self, request: JoinRequest) -> Result<()>;

    /// Leave the room
    async fn disconnect(&self) -> Result<()>;

    /// Watch channel carrying every connection state transition
    fn state(&self) -> watch::Receiver<ConnectionState>;

    /// Reliable, ordered-per-topic send on the named data channel
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()>;

    /// Receive inbound data-channel frames for the current room. Frames this
    /// client published are not delivered back.
    async fn subscribe(&self) -> Result<mpsc::Receiver<DataPacket>>;

    async fn set_microphone_enabled(&self, enabled: bool) -> Result<()>;

    fn is_microphone_enabled(&self) -> bool;

    /// Transport name for logging
    fn name(&self) -> &str;
}
