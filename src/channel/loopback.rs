use anyhow::{bail, Context, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::debug;

use super::codec;
use super::messages::{DataPacket, Envelope};
use super::transport::{ConnectionState, JoinRequest, RoomTransport};

/// In-process room transport
///
/// Records every published frame, lets callers inject inbound frames and
/// drive state transitions by hand. Used by the test suite and demos.
#[derive(Clone)]
pub struct LoopbackTransport {
    state_tx: Arc<watch::Sender<ConnectionState>>,
    inbound_tx: Arc<Mutex<Option<mpsc::Sender<DataPacket>>>>,
    sent: Arc<Mutex<Vec<DataPacket>>>,
    joins: Arc<Mutex<Vec<JoinRequest>>>,
    microphone: Arc<AtomicBool>,
    fail_publish: Arc<AtomicBool>,
    publish_attempts: Arc<AtomicUsize>,
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackTransport {
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            state_tx: Arc::new(state_tx),
            inbound_tx: Arc::new(Mutex::new(None)),
            sent: Arc::new(Mutex::new(Vec::new())),
            joins: Arc::new(Mutex::new(Vec::new())),
            microphone: Arc::new(AtomicBool::new(false)),
            fail_publish: Arc::new(AtomicBool::new(false)),
            publish_attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Force a state transition, as the room SDK would on network changes
    pub fn set_state(&self, state: ConnectionState) {
        self.state_tx.send_replace(state);
    }

    pub fn current_state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    /// Make subsequent publishes fail (or succeed again)
    pub fn fail_publishes(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }

    pub fn publish_attempts(&self) -> usize {
        self.publish_attempts.load(Ordering::SeqCst)
    }

    /// Deliver a raw frame to the subscriber
    pub async fn inject(&self, packet: DataPacket) -> Result<()> {
        let sender = self
            .inbound_tx
            .lock()
            .await
            .clone()
            .context("No subscriber attached")?;
        sender
            .send(packet)
            .await
            .context("Subscriber dropped the receiver")?;
        Ok(())
    }

    /// Encode and deliver an envelope to the subscriber
    pub async fn inject_envelope(&self, envelope: &Envelope) -> Result<()> {
        let payload = codec::encode(envelope)?;
        self.inject(DataPacket::new(envelope.topic(), payload)).await
    }

    pub async fn sent(&self) -> Vec<DataPacket> {
        self.sent.lock().await.clone()
    }

    /// Sent frames decoded back into envelopes
    pub async fn sent_envelopes(&self) -> Vec<Envelope> {
        self.sent
            .lock()
            .await
            .iter()
            .filter_map(|packet| codec::decode_packet(packet).ok())
            .collect()
    }

    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }

    pub async fn joins(&self) -> Vec<JoinRequest> {
        self.joins.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl RoomTransport for LoopbackTransport {
    async fn connect(&self, request: JoinRequest) -> Result<()> {
        debug!("Loopback join: {:?}", request);
        self.joins.lock().await.push(request);
        self.state_tx.send_replace(ConnectionState::Connecting);
        self.state_tx.send_replace(ConnectionState::Connected);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.microphone.store(false, Ordering::SeqCst);
        self.state_tx.send_replace(ConnectionState::Disconnected);
        Ok(())
    }

    fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()> {
        self.publish_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_publish.load(Ordering::SeqCst) {
            bail!("loopback publish failure on '{}'", topic);
        }
        if !self.current_state().is_connected() {
            bail!("loopback transport is not connected");
        }
        self.sent.lock().await.push(DataPacket::new(topic, payload));
        Ok(())
    }

    async fn subscribe(&self) -> Result<mpsc::Receiver<DataPacket>> {
        let (tx, rx) = mpsc::channel(256);
        *self.inbound_tx.lock().await = Some(tx);
        Ok(rx)
    }

    async fn set_microphone_enabled(&self, enabled: bool) -> Result<()> {
        self.microphone.store(enabled, Ordering::SeqCst);
        Ok(())
    }

    fn is_microphone_enabled(&self) -> bool {
        self.microphone.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "loopback"
    }
}
