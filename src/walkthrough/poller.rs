use anyhow::Result;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::catalog::WalkthroughCatalog;
use crate::backend::{Walkthrough, WalkthroughBackend};
use crate::config::DiscoveryConfig;
use crate::session::SessionGuard;

struct PollerInner {
    backend: Arc<dyn WalkthroughBackend>,
    brdge_id: String,
    settings: DiscoveryConfig,
    catalog: Arc<Mutex<WalkthroughCatalog>>,
    guard: SessionGuard,
    running: AtomicBool,
    rearm: AtomicBool,
    queries: AtomicUsize,
}

impl PollerInner {
    async fn query(&self) -> Result<Vec<Walkthrough>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.backend.list_walkthroughs(&self.brdge_id).await
    }

    /// One bounded discovery run
    async fn discover(&self) -> Option<Walkthrough> {
        let epoch = self.guard.current();
        let known = self.catalog.lock().await.len();
        let max_attempts = self.settings.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            info!("Polling for new walkthrough (attempt {}/{})", attempt, max_attempts);

            match self.query().await {
                Ok(walkthroughs) if walkthroughs.len() > known => {
                    if !self.guard.is_current(epoch) {
                        info!("Session moved on; discarding discovered walkthroughs");
                        return None;
                    }
                    let mut catalog = self.catalog.lock().await;
                    catalog.replace(walkthroughs);
                    let newest = catalog.newest().cloned();
                    catalog.select(newest.as_ref().map(|w| w.id));
                    if let Some(w) = &newest {
                        info!("New walkthrough found: {} ({} known)", w.id, catalog.len());
                    }
                    return newest;
                }
                Ok(_) => {}
                Err(e) => warn!("Error polling walkthroughs: {:#}", e),
            }

            if !self.guard.is_current(epoch) {
                return None;
            }
            if attempt < max_attempts {
                tokio::time::sleep(self.settings.interval()).await;
            }
        }

        info!("No new walkthrough after {} attempts", max_attempts);
        None
    }
}

/// Converges on a newly persisted walkthrough after a completion signal
///
/// The agent only signals that processing is finishing; the record appears
/// some time later. Runs are serialized: a signal arriving mid-run re-arms
/// one more run after the current one ends.
#[derive(Clone)]
pub struct DiscoveryPoller {
    inner: Arc<PollerInner>,
}

impl DiscoveryPoller {
    pub fn new(
        backend: Arc<dyn WalkthroughBackend>,
        brdge_id: impl Into<String>,
        settings: DiscoveryConfig,
        catalog: Arc<Mutex<WalkthroughCatalog>>,
        guard: SessionGuard,
    ) -> Self {
        Self {
            inner: Arc::new(PollerInner {
                backend,
                brdge_id: brdge_id.into(),
                settings,
                catalog,
                guard,
                running: AtomicBool::new(false),
                rearm: AtomicBool::new(false),
                queries: AtomicUsize::new(0),
            }),
        }
    }

    /// Start a background run, or re-arm if one is already running.
    /// Returns the task handle when a new run was started.
    pub fn on_walkthrough_completed(&self) -> Option<JoinHandle<()>> {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            info!("Discovery already running; re-arming");
            self.inner.rearm.store(true, Ordering::SeqCst);
            return None;
        }

        let inner = Arc::clone(&self.inner);
        Some(tokio::spawn(async move {
            loop {
                inner.discover().await;
                if inner.rearm.swap(false, Ordering::SeqCst) {
                    continue;
                }
                inner.running.store(false, Ordering::SeqCst);
                // A signal may have re-armed between the check and the store
                if inner.rearm.swap(false, Ordering::SeqCst)
                    && !inner.running.swap(true, Ordering::SeqCst)
                {
                    continue;
                }
                break;
            }
        }))
    }

    /// Run one discovery in the caller's task
    pub async fn discover(&self) -> Option<Walkthrough> {
        self.inner.discover().await
    }

    /// Manual fallback: reload the list, keeping the selection
    pub async fn refresh(&self) -> Result<usize> {
        let epoch = self.inner.guard.current();
        let walkthroughs = self.inner.query().await?;
        if !self.inner.guard.is_current(epoch) {
            return Ok(self.inner.catalog.lock().await.len());
        }
        let mut catalog = self.inner.catalog.lock().await;
        catalog.replace(walkthroughs);
        catalog.select_newest_if_unset();
        Ok(catalog.len())
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Total list queries issued since creation
    pub fn queries_issued(&self) -> usize {
        self.inner.queries.load(Ordering::SeqCst)
    }
}
