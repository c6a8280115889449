use anyhow::{Context, Result};
use reqwest::{multipart, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::RwLock;
use std::time::Duration;
use tracing::{debug, info};

use super::models::{
    CloneVoiceResponse, EntityMetadata, GenerateScriptsResponse, ScriptMap, ScriptsResponse,
    ScriptsSnapshot, SignedUrlResponse, Voice, VoiceListResponse, Walkthrough,
    WalkthroughId, WalkthroughListResponse,
};
use crate::agent::AgentConfig;

/// REST backend that owns walkthroughs, scripts, agent configs and voices
#[async_trait::async_trait]
pub trait WalkthroughBackend: Send + Sync {
    /// Install (or clear) the bearer token used on subsequent requests
    fn set_auth_token(&self, token: Option<String>);

    /// Display name of the presentation, if the backend knows one
    async fn entity_name(&self, id: &str) -> Result<Option<String>>;

    /// All recorded walkthroughs, in whatever order the backend returns
    async fn list_walkthroughs(&self, id: &str) -> Result<Vec<Walkthrough>>;

    async fn generate_scripts(&self, id: &str, walkthrough: WalkthroughId) -> Result<ScriptMap>;

    /// Stored scripts, `None` when none were generated yet
    async fn get_scripts(&self, id: &str) -> Result<Option<ScriptsSnapshot>>;

    async fn update_scripts(&self, id: &str, scripts: &ScriptMap) -> Result<()>;

    async fn get_agent_config(&self, id: &str) -> Result<AgentConfig>;

    async fn put_agent_config(&self, id: &str, config: &AgentConfig) -> Result<()>;

    /// Upload a voice sample (WAV bytes) to be cloned under `name`
    async fn clone_voice(&self, id: &str, name: &str, audio: Vec<u8>) -> Result<Option<Voice>>;

    async fn list_voices(&self, id: &str) -> Result<Vec<Voice>>;

    async fn activate_voice(&self, id: &str, voice_id: &str) -> Result<()>;

    async fn deactivate_voice(&self, id: &str, voice_id: &str) -> Result<()>;

    /// Time-limited URL of the most recent recording
    async fn latest_recording_url(&self, id: &str) -> Result<String>;
}

/// `reqwest` implementation of [`WalkthroughBackend`]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    entity_path: String,
    token: RwLock<Option<String>>,
}

impl HttpBackend {
    pub fn new(
        base_url: impl Into<String>,
        entity_path: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            entity_path: entity_path.into().trim_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    fn url(&self, id: &str, suffix: &str) -> String {
        if suffix.is_empty() {
            format!("{}/{}/{}", self.base_url, self.entity_path, id)
        } else {
            format!("{}/{}/{}/{}", self.base_url, self.entity_path, id, suffix)
        }
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let token = self
            .token
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T> {
        debug!("GET {}", url);
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?
            .error_for_status()
            .with_context(|| format!("GET {} returned an error status", url))?;

        response
            .json()
            .await
            .with_context(|| format!("GET {} returned an unexpected body", url))
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        builder: RequestBuilder,
        url: &str,
        body: &B,
    ) -> Result<reqwest::Response> {
        self.authorize(builder)
            .json(body)
            .send()
            .await
            .with_context(|| format!("request to {} failed", url))?
            .error_for_status()
            .with_context(|| format!("{} returned an error status", url))
    }
}

#[async_trait::async_trait]
impl WalkthroughBackend for HttpBackend {
    fn set_auth_token(&self, token: Option<String>) {
        *self
            .token
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = token;
    }

    async fn entity_name(&self, id: &str) -> Result<Option<String>> {
        let metadata: EntityMetadata = self.get_json(self.url(id, "")).await?;
        Ok(metadata.name)
    }

    async fn list_walkthroughs(&self, id: &str) -> Result<Vec<Walkthrough>> {
        let response: WalkthroughListResponse =
            self.get_json(self.url(id, "walkthrough-list")).await?;
        Ok(response.into_walkthroughs())
    }

    async fn generate_scripts(&self, id: &str, walkthrough: WalkthroughId) -> Result<ScriptMap> {
        let url = self.url(id, "generate-slide-scripts");
        info!("Generating scripts for {} from walkthrough {}", id, walkthrough);
        let response = self
            .send_json(
                self.client.post(&url),
                &url,
                &serde_json::json!({ "walkthrough_id": walkthrough }),
            )
            .await?;
        let body: GenerateScriptsResponse = response
            .json()
            .await
            .context("Script generation returned an unexpected body")?;

        body.scripts
            .context("Script generation response contained no scripts")
    }

    async fn get_scripts(&self, id: &str) -> Result<Option<ScriptsSnapshot>> {
        let response: ScriptsResponse = self.get_json(self.url(id, "scripts")).await?;
        if !response.has_scripts {
            return Ok(None);
        }
        let source_walkthrough = response
            .metadata
            .as_ref()
            .and_then(|metadata| metadata.source_walkthrough());
        Ok(Some(ScriptsSnapshot {
            scripts: response.scripts,
            source_walkthrough,
        }))
    }

    async fn update_scripts(&self, id: &str, scripts: &ScriptMap) -> Result<()> {
        let url = self.url(id, "scripts/update");
        self.send_json(
            self.client.put(&url),
            &url,
            &serde_json::json!({ "scripts": scripts }),
        )
        .await?;
        Ok(())
    }

    async fn get_agent_config(&self, id: &str) -> Result<AgentConfig> {
        self.get_json(self.url(id, "agent-config")).await
    }

    async fn put_agent_config(&self, id: &str, config: &AgentConfig) -> Result<()> {
        let url = self.url(id, "agent-config");
        self.send_json(self.client.put(&url), &url, config).await?;
        Ok(())
    }

    async fn clone_voice(&self, id: &str, name: &str, audio: Vec<u8>) -> Result<Option<Voice>> {
        let url = self.url(id, "voice/clone");
        let audio_part = multipart::Part::bytes(audio)
            .file_name("voice-sample.wav")
            .mime_str("audio/wav")
            .context("Invalid audio mime type")?;
        let form = multipart::Form::new()
            .part("audio", audio_part)
            .text("name", name.to_string());

        let response = self
            .authorize(self.client.post(&url))
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("request to {} failed", url))?
            .error_for_status()
            .with_context(|| format!("{} returned an error status", url))?;
        let body: CloneVoiceResponse = response
            .json()
            .await
            .context("Voice clone returned an unexpected body")?;

        Ok(body.voice)
    }

    async fn list_voices(&self, id: &str) -> Result<Vec<Voice>> {
        let response: VoiceListResponse = self.get_json(self.url(id, "voices")).await?;
        Ok(response.voices)
    }

    async fn activate_voice(&self, id: &str, voice_id: &str) -> Result<()> {
        let url = self.url(id, "voice/activate");
        self.send_json(
            self.client.post(&url),
            &url,
            &serde_json::json!({ "voice_id": voice_id }),
        )
        .await?;
        Ok(())
    }

    async fn deactivate_voice(&self, id: &str, voice_id: &str) -> Result<()> {
        let url = self.url(id, "voice/deactivate");
        self.send_json(
            self.client.post(&url),
            &url,
            &serde_json::json!({ "voice_id": voice_id }),
        )
        .await?;
        Ok(())
    }

    async fn latest_recording_url(&self, id: &str) -> Result<String> {
        let response: SignedUrlResponse = self
            .get_json(self.url(id, "recordings/latest/signed-url"))
            .await?;
        Ok(response.url)
    }
}
