use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::media::{MediaArbiter, MediaOwner};
use super::sample::VoiceSampleRecorder;
use crate::backend::{Voice, VoiceStatus, WalkthroughBackend};

#[derive(Debug, Default)]
struct VoiceState {
    voices: Vec<Voice>,
    selected: Option<String>,
    recorder: Option<VoiceSampleRecorder>,
    capturing: bool,
}

/// Cloned voices for one presentation, plus sample capture for new clones
pub struct VoiceLibrary {
    backend: Arc<dyn WalkthroughBackend>,
    brdge_id: String,
    media: Arc<MediaArbiter>,
    state: Mutex<VoiceState>,
    cloning: AtomicBool,
}

impl VoiceLibrary {
    pub fn new(
        backend: Arc<dyn WalkthroughBackend>,
        brdge_id: impl Into<String>,
        media: Arc<MediaArbiter>,
    ) -> Self {
        Self {
            backend,
            brdge_id: brdge_id.into(),
            media,
            state: Mutex::new(VoiceState::default()),
            cloning: AtomicBool::new(false),
        }
    }

    pub async fn refresh(&self) -> Result<Vec<Voice>> {
        let voices = self
            .backend
            .list_voices(&self.brdge_id)
            .await
            .context("Error loading voices")?;
        let mut state = self.state.lock().await;
        state.voices = voices.clone();
        Ok(voices)
    }

    pub async fn voices(&self) -> Vec<Voice> {
        self.state.lock().await.voices.clone()
    }

    pub async fn selected(&self) -> Option<String> {
        self.state.lock().await.selected.clone()
    }

    pub async fn select(&self, voice_id: Option<String>) {
        self.state.lock().await.selected = voice_id;
    }

    pub async fn active(&self) -> Option<Voice> {
        self.state
            .lock()
            .await
            .voices
            .iter()
            .find(|voice| voice.is_active())
            .cloned()
    }

    /// Begin capturing a voice sample. Fails if the live conversation holds the microphone.
    pub async fn start_sample(&self, sample_rate: u32, channels: u16) -> Result<()> {
        self.media.acquire(MediaOwner::VoiceSample)?;
        let mut state = self.state.lock().await;
        state.recorder = Some(VoiceSampleRecorder::new(sample_rate, channels));
        state.capturing = true;
        info!("Voice sample capture started");
        Ok(())
    }

    pub async fn push_sample_frame(&self, frame: &[i16]) {
        let mut state = self.state.lock().await;
        if !state.capturing {
            return;
        }
        if let Some(recorder) = state.recorder.as_mut() {
            recorder.push(frame);
        }
    }

    /// Stop capturing; the sample is kept for cloning. Returns its duration.
    pub async fn stop_sample(&self) -> Option<f64> {
        let mut state = self.state.lock().await;
        if !state.capturing {
            return None;
        }
        state.capturing = false;
        self.media.release(MediaOwner::VoiceSample);
        let duration = state.recorder.as_ref().map(|r| r.duration_secs());
        info!("Voice sample capture stopped ({:?}s)", duration);
        duration
    }

    pub fn is_cloning(&self) -> bool {
        self.cloning.load(Ordering::SeqCst)
    }

    /// Upload the captured sample to be cloned as `name`
    ///
    /// Without a sample or a name this is a no-op (`Ok(None)`). On failure
    /// the sample is kept so the user can retry.
    pub async fn clone_voice(&self, name: &str) -> Result<Option<Voice>> {
        let name = name.trim();
        let wav = {
            let state = self.state.lock().await;
            match state.recorder.as_ref() {
                Some(recorder) if !recorder.is_empty() && !name.is_empty() && !state.capturing => {
                    recorder.to_wav()?
                }
                _ => {
                    warn!("Voice clone needs a finished sample and a name");
                    return Ok(None);
                }
            }
        };

        if self.cloning.swap(true, Ordering::SeqCst) {
            warn!("Voice clone already in progress");
            return Ok(None);
        }
        let result = self.backend.clone_voice(&self.brdge_id, name, wav).await;
        self.cloning.store(false, Ordering::SeqCst);
        let voice = result.context("Error cloning voice")?;

        if let Err(e) = self.refresh().await {
            warn!("Voice cloned but list refresh failed: {:#}", e);
        }

        let mut state = self.state.lock().await;
        if let Some(voice) = &voice {
            info!("Cloned voice {} ({})", voice.name, voice.id);
            state.selected = Some(voice.id.clone());
        }
        state.recorder = None;
        Ok(voice)
    }

    /// Make `voice_id` the only active voice
    pub async fn activate(&self, voice_id: &str) -> Result<()> {
        let previously_active: Vec<String> = self
            .state
            .lock()
            .await
            .voices
            .iter()
            .filter(|voice| voice.is_active() && voice.id != voice_id)
            .map(|voice| voice.id.clone())
            .collect();

        for other in &previously_active {
            self.backend
                .deactivate_voice(&self.brdge_id, other)
                .await
                .with_context(|| format!("Failed to deactivate voice {}", other))?;
        }
        self.backend
            .activate_voice(&self.brdge_id, voice_id)
            .await
            .with_context(|| format!("Failed to activate voice {}", voice_id))?;

        let mut state = self.state.lock().await;
        for voice in state.voices.iter_mut() {
            voice.status = if voice.id == voice_id {
                VoiceStatus::Active
            } else {
                VoiceStatus::Inactive
            };
        }
        state.selected = Some(voice_id.to_string());
        info!("Activated voice {}", voice_id);
        Ok(())
    }

    pub async fn deactivate(&self, voice_id: &str) -> Result<()> {
        self.backend
            .deactivate_voice(&self.brdge_id, voice_id)
            .await
            .with_context(|| format!("Failed to deactivate voice {}", voice_id))?;
        let mut state = self.state.lock().await;
        if let Some(voice) = state.voices.iter_mut().find(|voice| voice.id == voice_id) {
            voice.status = VoiceStatus::Inactive;
        }
        Ok(())
    }
}
