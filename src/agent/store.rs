use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use super::config::{AgentConfig, KnowledgeEntry};
use crate::backend::WalkthroughBackend;
use crate::channel::{codec, AgentConfigMessage, Envelope, RoomTransport};

#[derive(Debug, Default)]
struct StoreState {
    config: AgentConfig,
    dirty: bool,
}

/// Local copy of the agent configuration
///
/// Fetched at session start, edited locally, saved on request and mirrored
/// to the room whenever the connection is (re)established.
pub struct AgentConfigStore {
    backend: Arc<dyn WalkthroughBackend>,
    brdge_id: String,
    state: Mutex<StoreState>,
}

impl AgentConfigStore {
    pub fn new(backend: Arc<dyn WalkthroughBackend>, brdge_id: impl Into<String>) -> Self {
        Self {
            backend,
            brdge_id: brdge_id.into(),
            state: Mutex::new(StoreState::default()),
        }
    }

    pub async fn load(&self) -> Result<AgentConfig> {
        let config = self
            .backend
            .get_agent_config(&self.brdge_id)
            .await
            .context("Error loading agent config")?;
        let mut state = self.state.lock().await;
        state.config = config.clone();
        state.dirty = false;
        Ok(config)
    }

    pub async fn get(&self) -> AgentConfig {
        self.state.lock().await.config.clone()
    }

    pub async fn is_dirty(&self) -> bool {
        self.state.lock().await.dirty
    }

    /// Apply a local change
    pub async fn update<F>(&self, change: F)
    where
        F: FnOnce(&mut AgentConfig) + Send,
    {
        let mut state = self.state.lock().await;
        let before = state.config.clone();
        change(&mut state.config);
        if state.config != before {
            state.dirty = true;
        }
    }

    pub async fn replace(&self, config: AgentConfig) {
        self.update(|current| *current = config).await;
    }

    pub async fn add_knowledge(&self, entry: KnowledgeEntry) {
        self.update(|config| config.knowledge_base.push(entry)).await;
    }

    pub async fn remove_knowledge(&self, id: &str) -> bool {
        let mut removed = false;
        self.update(|config| {
            let before = config.knowledge_base.len();
            config.knowledge_base.retain(|entry| entry.id != id);
            removed = config.knowledge_base.len() != before;
        })
        .await;
        removed
    }

    /// Push the local configuration to the backend
    pub async fn save(&self) -> Result<()> {
        let config = self.get().await;
        self.backend
            .put_agent_config(&self.brdge_id, &config)
            .await
            .context("Error saving agent config")?;
        let mut state = self.state.lock().await;
        if state.config == config {
            state.dirty = false;
        }
        info!("Saved agent config for {}", self.brdge_id);
        Ok(())
    }

    /// Send the configuration to the agent over the data channel
    pub async fn mirror(&self, transport: &dyn RoomTransport, user_id: Option<String>) -> Result<()> {
        let envelope = Envelope::AgentConfig(AgentConfigMessage {
            agent_config: self.get().await,
            user_id,
            brdge_id: self.brdge_id.clone(),
        });
        let payload = codec::encode(&envelope).context("Failed to encode agent config")?;
        transport.publish(envelope.topic(), payload).await
    }
}
