use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::backend::{ScriptEntry, ScriptMap, WalkthroughBackend, WalkthroughId};
use crate::channel::{codec, Envelope, RoomTransport, ScriptsUpdated};
use crate::session::SessionGuard;
use crate::sync::Debouncer;

/// Result of [`ScriptEditCoordinator::commit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Saved,
    NothingToSave,
    /// The session moved on while the request was in flight
    Discarded,
}

/// Result of applying a remote SCRIPTS_UPDATED notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteUpdateOutcome {
    /// No local edits; the remote scripts are now effective
    Replaced,
    /// Unsaved local edits were kept and a conflict flagged
    ConflictFlagged,
}

#[derive(Debug, Default)]
struct ScriptState {
    persisted: ScriptMap,
    edited: ScriptMap,
    dirty: bool,
    conflict: bool,
}

impl ScriptState {
    fn recompute_dirty(&mut self) {
        let persisted = &self.persisted;
        self.edited.retain(|slide, entry| {
            persisted
                .get(slide)
                .map_or(true, |current| current.script != entry.script)
        });
        self.dirty = !self.edited.is_empty();
        if !self.dirty {
            self.conflict = false;
        }
    }

    fn effective(&self) -> ScriptMap {
        let mut effective = self.persisted.clone();
        if self.dirty {
            for (slide, entry) in &self.edited {
                effective.insert(slide.clone(), entry.clone());
            }
        }
        effective
    }
}

struct Inner {
    backend: Arc<dyn WalkthroughBackend>,
    transport: Arc<dyn RoomTransport>,
    brdge_id: String,
    guard: SessionGuard,
    state: Mutex<ScriptState>,
    /// Held for the duration of a save so commits never overlap
    commit_lock: Mutex<()>,
    generating: std::sync::atomic::AtomicBool,
}

impl Inner {
    async fn commit(&self) -> Result<CommitOutcome> {
        let _serialized = self.commit_lock.lock().await;
        let epoch = self.guard.current();

        let snapshot = {
            let state = self.state.lock().await;
            if !state.dirty {
                return Ok(CommitOutcome::NothingToSave);
            }
            state.effective()
        };

        self.backend
            .update_scripts(&self.brdge_id, &snapshot)
            .await
            .context("Failed to save script changes")?;

        if !self.guard.is_current(epoch) {
            return Ok(CommitOutcome::Discarded);
        }

        let mut state = self.state.lock().await;
        state.persisted = snapshot;
        // Edits typed while the save was in flight survive
        state.recompute_dirty();
        state.conflict = false;
        info!(
            "Saved {} slide scripts ({} edits still pending)",
            state.persisted.len(),
            state.edited.len()
        );
        Ok(CommitOutcome::Saved)
    }
}

/// Owns the persisted and in-progress script maps for one presentation
///
/// `edit` only touches the local working copy; `commit` persists it. Remote
/// generation events replace the persisted map but never drop unsaved edits.
pub struct ScriptEditCoordinator {
    inner: Arc<Inner>,
    autosave: Option<Debouncer<()>>,
}

impl ScriptEditCoordinator {
    pub fn new(
        backend: Arc<dyn WalkthroughBackend>,
        transport: Arc<dyn RoomTransport>,
        brdge_id: impl Into<String>,
        guard: SessionGuard,
        autosave_after: Option<Duration>,
    ) -> Self {
        let inner = Arc::new(Inner {
            backend,
            transport,
            brdge_id: brdge_id.into(),
            guard,
            state: Mutex::new(ScriptState::default()),
            commit_lock: Mutex::new(()),
            generating: std::sync::atomic::AtomicBool::new(false),
        });

        let autosave = autosave_after.map(|quiet| {
            let inner = Arc::clone(&inner);
            Debouncer::new(quiet, move |_: ()| {
                let inner = Arc::clone(&inner);
                async move {
                    if let Err(e) = inner.commit().await {
                        error!("Autosave failed: {:#}", e);
                    }
                }
            })
        });

        Self { inner, autosave }
    }

    /// Record an edit to one slide's script in the working copy
    pub async fn edit(&self, slide_id: &str, text: &str) {
        let dirty = {
            let mut state = self.inner.state.lock().await;
            let agent = state
                .edited
                .get(slide_id)
                .or_else(|| state.persisted.get(slide_id))
                .map(|entry| entry.agent.clone())
                .unwrap_or_default();
            state
                .edited
                .insert(slide_id.to_string(), ScriptEntry::new(text, agent));
            state.recompute_dirty();
            state.dirty
        };

        if let Some(autosave) = &self.autosave {
            if dirty {
                autosave.schedule(());
            } else {
                autosave.cancel();
            }
        }
    }

    /// Persist the working copy
    pub async fn commit(&self) -> Result<CommitOutcome> {
        if let Some(autosave) = &self.autosave {
            autosave.cancel();
        }
        self.inner.commit().await
    }

    /// Throw away unsaved edits
    pub async fn discard(&self) {
        if let Some(autosave) = &self.autosave {
            autosave.cancel();
        }
        let mut state = self.inner.state.lock().await;
        state.edited.clear();
        state.dirty = false;
        state.conflict = false;
    }

    /// Install scripts loaded from the backend at session start
    pub async fn load(&self, scripts: ScriptMap) {
        let mut state = self.inner.state.lock().await;
        state.persisted = scripts;
        state.recompute_dirty();
    }

    /// A peer generated new scripts
    pub async fn on_remote_scripts_updated(&self, scripts: ScriptMap) -> RemoteUpdateOutcome {
        let mut state = self.inner.state.lock().await;
        state.persisted = scripts;
        state.recompute_dirty();
        if state.dirty {
            state.conflict = true;
            warn!(
                "Remote scripts arrived with {} unsaved local edits; keeping edits",
                state.edited.len()
            );
            RemoteUpdateOutcome::ConflictFlagged
        } else {
            info!("Applied remote scripts ({} slides)", state.persisted.len());
            RemoteUpdateOutcome::Replaced
        }
    }

    /// Generate scripts from a walkthrough and broadcast the change
    ///
    /// On failure the current scripts are left untouched.
    pub async fn generate(&self, walkthrough: WalkthroughId) -> Result<ScriptMap> {
        use std::sync::atomic::Ordering;

        let epoch = self.inner.guard.current();
        self.inner.generating.store(true, Ordering::SeqCst);
        let result = self
            .inner
            .backend
            .generate_scripts(&self.inner.brdge_id, walkthrough)
            .await;
        self.inner.generating.store(false, Ordering::SeqCst);

        let scripts = result.context("Error generating scripts")?;
        if !self.inner.guard.is_current(epoch) {
            anyhow::bail!("session ended while scripts were generating");
        }

        if let Some(autosave) = &self.autosave {
            autosave.cancel();
        }
        {
            let mut state = self.inner.state.lock().await;
            state.persisted = scripts.clone();
            state.edited.clear();
            state.dirty = false;
            state.conflict = false;
        }
        info!("Generated scripts for {} slides", scripts.len());

        let connected = self.inner.transport.state().borrow().is_connected();
        if connected {
            if let Err(e) = self.broadcast_update().await {
                error!("Error sending script update: {:#}", e);
            }
        }

        Ok(scripts)
    }

    async fn broadcast_update(&self) -> Result<()> {
        let envelope = Envelope::ScriptsUpdated(ScriptsUpdated {
            brdge_id: self.inner.brdge_id.clone(),
            timestamp: Utc::now().timestamp_millis(),
        });
        let payload = codec::encode(&envelope)?;
        self.inner.transport.publish(envelope.topic(), payload).await
    }

    pub fn is_generating(&self) -> bool {
        self.inner
            .generating
            .load(std::sync::atomic::Ordering::SeqCst)
    }

    pub async fn persisted(&self) -> ScriptMap {
        self.inner.state.lock().await.persisted.clone()
    }

    pub async fn edited(&self) -> ScriptMap {
        self.inner.state.lock().await.edited.clone()
    }

    /// What should be displayed: edits over persisted while dirty
    pub async fn effective(&self) -> ScriptMap {
        self.inner.state.lock().await.effective()
    }

    pub async fn is_dirty(&self) -> bool {
        self.inner.state.lock().await.dirty
    }

    pub async fn has_conflict(&self) -> bool {
        self.inner.state.lock().await.conflict
    }

    pub async fn has_scripts(&self) -> bool {
        !self.inner.state.lock().await.persisted.is_empty()
    }
}
