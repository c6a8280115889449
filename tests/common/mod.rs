#![allow(dead_code)]

use anyhow::{anyhow, Result};
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use walkthrough_sync::backend::{
    ScriptEntry, ScriptMap, ScriptsSnapshot, Voice, VoiceStatus, Walkthrough, WalkthroughBackend,
    WalkthroughId,
};
use walkthrough_sync::{
    AgentConfig, AgentRole, LoopbackTransport, SessionParams, SessionSettings, WalkthroughSession,
};

/// Walkthrough recorded `minutes` after a fixed epoch
pub fn walkthrough(id: WalkthroughId, minutes: i64) -> Walkthrough {
    Walkthrough {
        id,
        timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap() + ChronoDuration::minutes(minutes),
    }
}

pub fn scripts(entries: &[(&str, &str)]) -> ScriptMap {
    entries
        .iter()
        .map(|(slide, text)| (slide.to_string(), ScriptEntry::new(*text, "")))
        .collect()
}

pub fn voice(id: &str, status: VoiceStatus) -> Voice {
    Voice {
        id: id.to_string(),
        name: format!("Voice {}", id),
        created_at: None,
        status,
    }
}

#[derive(Default)]
struct FakeState {
    walkthroughs: Vec<Walkthrough>,
    /// Responses handed out before falling back to `walkthroughs`
    scripted_lists: VecDeque<Result<Vec<Walkthrough>, String>>,
    scripts: Option<ScriptsSnapshot>,
    generate: Option<Result<ScriptMap, String>>,
    generate_calls: Vec<WalkthroughId>,
    updates: Vec<ScriptMap>,
    fail_updates: bool,
    agent_config: AgentConfig,
    saved_configs: Vec<AgentConfig>,
    voices: Vec<Voice>,
    voice_calls: Vec<String>,
    token: Option<String>,
}

/// In-memory backend recording every call
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
    list_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_walkthroughs(&self, walkthroughs: Vec<Walkthrough>) {
        self.state.lock().unwrap().walkthroughs = walkthroughs;
    }

    pub fn push_list_response(&self, response: Result<Vec<Walkthrough>, &str>) {
        self.state
            .lock()
            .unwrap()
            .scripted_lists
            .push_back(response.map_err(str::to_string));
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn set_scripts(&self, scripts: ScriptMap, source: Option<WalkthroughId>) {
        self.state.lock().unwrap().scripts = Some(ScriptsSnapshot {
            scripts,
            source_walkthrough: source,
        });
    }

    pub fn set_generate_result(&self, result: Result<ScriptMap, &str>) {
        self.state.lock().unwrap().generate = Some(result.map_err(str::to_string));
    }

    pub fn generate_calls(&self) -> Vec<WalkthroughId> {
        self.state.lock().unwrap().generate_calls.clone()
    }

    pub fn updates(&self) -> Vec<ScriptMap> {
        self.state.lock().unwrap().updates.clone()
    }

    pub fn fail_updates(&self, fail: bool) {
        self.state.lock().unwrap().fail_updates = fail;
    }

    pub fn set_agent_config(&self, config: AgentConfig) {
        self.state.lock().unwrap().agent_config = config;
    }

    pub fn saved_configs(&self) -> Vec<AgentConfig> {
        self.state.lock().unwrap().saved_configs.clone()
    }

    pub fn set_voices(&self, voices: Vec<Voice>) {
        self.state.lock().unwrap().voices = voices;
    }

    pub fn stored_voices(&self) -> Vec<Voice> {
        self.state.lock().unwrap().voices.clone()
    }

    pub fn voice_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().voice_calls.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state.lock().unwrap().token.clone()
    }
}

#[async_trait::async_trait]
impl WalkthroughBackend for FakeBackend {
    fn set_auth_token(&self, token: Option<String>) {
        self.state.lock().unwrap().token = token;
    }

    async fn entity_name(&self, id: &str) -> Result<Option<String>> {
        Ok(Some(format!("Deck {}", id)))
    }

    async fn list_walkthroughs(&self, _id: &str) -> Result<Vec<Walkthrough>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        match state.scripted_lists.pop_front() {
            Some(Ok(list)) => {
                state.walkthroughs = list.clone();
                Ok(list)
            }
            Some(Err(e)) => Err(anyhow!(e)),
            None => Ok(state.walkthroughs.clone()),
        }
    }

    async fn generate_scripts(&self, _id: &str, walkthrough: WalkthroughId) -> Result<ScriptMap> {
        let mut state = self.state.lock().unwrap();
        state.generate_calls.push(walkthrough);
        match state.generate.clone() {
            Some(Ok(scripts)) => {
                state.scripts = Some(ScriptsSnapshot {
                    scripts: scripts.clone(),
                    source_walkthrough: Some(walkthrough),
                });
                Ok(scripts)
            }
            Some(Err(e)) => Err(anyhow!(e)),
            None => Err(anyhow!("no generate result configured")),
        }
    }

    async fn get_scripts(&self, _id: &str) -> Result<Option<ScriptsSnapshot>> {
        Ok(self.state.lock().unwrap().scripts.clone())
    }

    async fn update_scripts(&self, _id: &str, scripts: &ScriptMap) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_updates {
            return Err(anyhow!("update rejected"));
        }
        state.updates.push(scripts.clone());
        let source = state.scripts.as_ref().and_then(|s| s.source_walkthrough);
        state.scripts = Some(ScriptsSnapshot {
            scripts: scripts.clone(),
            source_walkthrough: source,
        });
        Ok(())
    }

    async fn get_agent_config(&self, _id: &str) -> Result<AgentConfig> {
        Ok(self.state.lock().unwrap().agent_config.clone())
    }

    async fn put_agent_config(&self, _id: &str, config: &AgentConfig) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.saved_configs.push(config.clone());
        state.agent_config = config.clone();
        Ok(())
    }

    async fn clone_voice(&self, _id: &str, name: &str, audio: Vec<u8>) -> Result<Option<Voice>> {
        let mut state = self.state.lock().unwrap();
        if audio.is_empty() {
            return Err(anyhow!("empty sample"));
        }
        let voice = Voice {
            id: format!("v{}", state.voices.len() + 1),
            name: name.to_string(),
            created_at: None,
            status: VoiceStatus::Inactive,
        };
        state.voices.push(voice.clone());
        state.voice_calls.push(format!("clone:{}", name));
        Ok(Some(voice))
    }

    async fn list_voices(&self, _id: &str) -> Result<Vec<Voice>> {
        Ok(self.state.lock().unwrap().voices.clone())
    }

    async fn activate_voice(&self, _id: &str, voice_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.voice_calls.push(format!("activate:{}", voice_id));
        for voice in state.voices.iter_mut() {
            if voice.id == voice_id {
                voice.status = VoiceStatus::Active;
            }
        }
        Ok(())
    }

    async fn deactivate_voice(&self, _id: &str, voice_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.voice_calls.push(format!("deactivate:{}", voice_id));
        for voice in state.voices.iter_mut() {
            if voice.id == voice_id {
                voice.status = VoiceStatus::Inactive;
            }
        }
        Ok(())
    }

    async fn latest_recording_url(&self, id: &str) -> Result<String> {
        Ok(format!("https://recordings.test/{}/latest.mp4", id))
    }
}

pub fn params() -> SessionParams {
    SessionParams::new("deck-1", 5, "https://api.test", "anon_test")
}

/// Session over a loopback transport and fake backend, already started
pub async fn started_session(
    role: AgentRole,
) -> (Arc<WalkthroughSession>, LoopbackTransport, Arc<FakeBackend>) {
    let transport = LoopbackTransport::new();
    let backend = FakeBackend::new();
    let session = Arc::new(
        WalkthroughSession::new(
            params(),
            role,
            Arc::new(transport.clone()),
            backend.clone(),
            SessionSettings::default(),
        )
        .unwrap(),
    );
    session.start().await.unwrap();
    (session, transport, backend)
}

/// Let spawned tasks run without advancing the clock much
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
