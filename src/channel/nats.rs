use anyhow::{anyhow, Context, Result};
use async_nats::Client;
use futures::stream::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::messages::DataPacket;
use super::transport::{ConnectionState, JoinRequest, RoomTransport};

struct ActiveRoom {
    client: Client,
    room: String,
    forward_task: JoinHandle<()>,
}

/// Room transport that maps the data channel onto NATS subjects
///
/// Topic `t` in room `r` is published on `{prefix}.{r}.data.{t}`.
pub struct NatsRoomTransport {
    url: String,
    prefix: String,
    state_tx: Arc<watch::Sender<ConnectionState>>,
    inbound_tx: Arc<Mutex<Option<mpsc::Sender<DataPacket>>>>,
    active: Mutex<Option<ActiveRoom>>,
    microphone: AtomicBool,
}

impl NatsRoomTransport {
    pub fn new(url: impl Into<String>, prefix: impl Into<String>) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            url: url.into(),
            prefix: prefix.into(),
            state_tx: Arc::new(state_tx),
            inbound_tx: Arc::new(Mutex::new(None)),
            active: Mutex::new(None),
            microphone: AtomicBool::new(false),
        }
    }

    fn data_subject(&self, room: &str, topic: &str) -> String {
        format!("{}.{}.data.{}", self.prefix, room, topic)
    }

    fn control_subject(&self, room: &str) -> String {
        format!("{}.{}.control", self.prefix, room)
    }
}

#[async_trait::async_trait]
impl RoomTransport for NatsRoomTransport {
    async fn connect(&self, request: JoinRequest) -> Result<()> {
        let mut active = self.active.lock().await;
        if active.is_some() {
            warn!("Already joined a room; ignoring connect");
            return Ok(());
        }

        info!(
            "Connecting to NATS at {} for room {} as {} ({})",
            self.url, request.room, request.user_id, request.role
        );
        self.state_tx.send_replace(ConnectionState::Connecting);

        let events = Arc::clone(&self.state_tx);
        let client = async_nats::ConnectOptions::new()
            .name(format!("walkthrough-sync-{}", request.user_id))
            .no_echo()
            .event_callback(move |event| {
                let events = Arc::clone(&events);
                async move {
                    match event {
                        async_nats::Event::Connected => {
                            events.send_replace(ConnectionState::Connected);
                        }
                        async_nats::Event::Disconnected => {
                            events.send_replace(ConnectionState::Reconnecting);
                        }
                        other => info!("NATS event: {}", other),
                    }
                }
            })
            .connect(self.url.as_str())
            .await;

        let client = match client {
            Ok(client) => client,
            Err(e) => {
                self.state_tx.send_replace(ConnectionState::Disconnected);
                return Err(anyhow!(e).context("Failed to connect to NATS"));
            }
        };

        let wildcard = format!("{}.{}.data.>", self.prefix, request.room);
        let mut subscriber = client
            .subscribe(wildcard.clone())
            .await
            .context("Failed to subscribe to room data channel")?;
        info!("Subscribed to {}", wildcard);

        let inbound_tx = Arc::clone(&self.inbound_tx);
        let topic_prefix = format!("{}.{}.data.", self.prefix, request.room);
        let forward_task = tokio::spawn(async move {
            while let Some(msg) = subscriber.next().await {
                let subject = msg.subject.to_string();
                let topic = subject
                    .strip_prefix(&topic_prefix)
                    .unwrap_or(subject.as_str())
                    .to_string();
                let packet = DataPacket::new(topic, msg.payload.to_vec());

                let sender = inbound_tx.lock().await.clone();
                if let Some(sender) = sender {
                    if sender.send(packet).await.is_err() {
                        warn!("Inbound receiver dropped; discarding frame");
                    }
                }
            }
            info!("Room data subscription ended");
        });

        *active = Some(ActiveRoom {
            client,
            room: request.room,
            forward_task,
        });
        self.state_tx.send_replace(ConnectionState::Connected);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        let room = self.active.lock().await.take();
        if let Some(room) = room {
            info!("Leaving room {}", room.room);
            room.forward_task.abort();
            if let Err(e) = room.client.flush().await {
                warn!("Failed to flush NATS client on disconnect: {}", e);
            }
        }
        self.microphone.store(false, Ordering::SeqCst);
        self.state_tx.send_replace(ConnectionState::Disconnected);
        Ok(())
    }

    fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()> {
        let active = self.active.lock().await;
        let room = active.as_ref().context("Not connected to a room")?;
        let subject = self.data_subject(&room.room, topic);

        room.client
            .publish(subject.clone(), payload.into())
            .await
            .context("Failed to publish data-channel frame")?;
        // Flush so the frame is on the wire before the caller moves on
        room.client
            .flush()
            .await
            .context("Failed to flush data-channel frame")?;

        Ok(())
    }

    async fn subscribe(&self) -> Result<mpsc::Receiver<DataPacket>> {
        let (tx, rx) = mpsc::channel(256);
        *self.inbound_tx.lock().await = Some(tx);
        Ok(rx)
    }

    async fn set_microphone_enabled(&self, enabled: bool) -> Result<()> {
        let active = self.active.lock().await;
        let room = active.as_ref().context("Not connected to a room")?;
        let payload = serde_json::to_vec(&serde_json::json!({ "microphone": enabled }))?;

        if let Err(e) = room
            .client
            .publish(self.control_subject(&room.room), payload.into())
            .await
        {
            error!("Failed to publish microphone state: {}", e);
            return Err(anyhow!(e).context("Failed to publish microphone state"));
        }

        self.microphone.store(enabled, Ordering::SeqCst);
        Ok(())
    }

    fn is_microphone_enabled(&self) -> bool {
        self.microphone.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "nats"
    }
}
