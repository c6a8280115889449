use anyhow::{Context, Result};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, error, info};

use super::debounce::Debouncer;
use crate::channel::{codec, Envelope, RoomTransport, SlideUpdate};
use crate::session::{AgentRole, SessionParams};

/// Everything a SLIDE_UPDATE needs besides the slide index
#[derive(Debug, Clone, Default)]
pub struct SlideContext {
    pub params: Option<SessionParams>,
    pub role: AgentRole,
}

#[derive(Default)]
struct SlideState {
    context: SlideContext,
    /// Last index the peer acknowledged receiving (successful send)
    last_sent: Option<u32>,
}

struct Shared {
    transport: Arc<dyn RoomTransport>,
    state: Mutex<SlideState>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, SlideState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn send(&self, slide: u32) {
        if !self.transport.state().borrow().is_connected() {
            debug!("Not connected; skipping slide update for {}", slide);
            return;
        }

        let update = {
            let state = self.state();
            if state.last_sent == Some(slide) {
                debug!("Slide {} already sent; suppressing duplicate", slide);
                return;
            }
            match build_update(&state.context, slide) {
                Some(update) => update,
                None => {
                    debug!("Session parameters incomplete; not sending slide {}", slide);
                    return;
                }
            }
        };

        match self.publish(update).await {
            Ok(()) => {
                self.state().last_sent = Some(slide);
                info!("Sent slide update: slide {}", slide);
            }
            Err(e) => error!("Error sending slide update: {:#}", e),
        }
    }

    async fn publish(&self, update: SlideUpdate) -> Result<()> {
        let envelope = Envelope::SlideUpdate(update);
        let payload = codec::encode(&envelope).context("Failed to encode slide update")?;
        self.transport.publish(envelope.topic(), payload).await
    }
}

fn build_update(context: &SlideContext, slide: u32) -> Option<SlideUpdate> {
    let params = context.params.as_ref()?;
    if !params.has_required() {
        return None;
    }
    Some(SlideUpdate {
        brdge_id: params.brdge_id.clone()?,
        num_slides: params.num_slides,
        api_base_url: params.api_base_url.clone()?,
        current_slide: slide,
        slide_url: params.slide_url(slide),
        agent_type: context.role,
        user_id: Some(params.user_id.clone()),
    })
}

/// Pushes the presenter's slide position to the peer
///
/// Changes are debounced; only the most recent index inside a quiet period
/// is sent, and an index equal to the last successful send is suppressed.
pub struct SlideSynchronizer {
    shared: Arc<Shared>,
    debouncer: Debouncer<u32>,
}

impl SlideSynchronizer {
    pub fn new(transport: Arc<dyn RoomTransport>, quiet: Duration) -> Self {
        let shared = Arc::new(Shared {
            transport,
            state: Mutex::new(SlideState::default()),
        });
        let fire_shared = Arc::clone(&shared);
        let debouncer = Debouncer::new(quiet, move |slide: u32| {
            let shared = Arc::clone(&fire_shared);
            async move { shared.send(slide).await }
        });

        Self { shared, debouncer }
    }

    /// Replace the parameters used to build outgoing updates
    pub fn set_context(&self, context: SlideContext) {
        self.shared.state().context = context;
    }

    pub fn last_sent(&self) -> Option<u32> {
        self.shared.state().last_sent
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// The presenter moved to `slide`
    pub fn on_slide_changed(&self, slide: u32) {
        if !self.shared.transport.state().borrow().is_connected() {
            return;
        }
        if self.shared.state().last_sent == Some(slide) {
            // Back on the slide the peer already shows; drop any pending move
            self.debouncer.cancel();
            return;
        }
        self.debouncer.schedule(slide);
    }

    /// The room (re)connected: forget what was sent and push `slide` once
    pub fn on_connection_established(&self, slide: u32) {
        self.shared.state().last_sent = None;
        self.debouncer.schedule(slide);
    }

    /// Drop the pending send and the last-sent marker
    pub fn reset(&self) {
        self.debouncer.cancel();
        self.shared.state().last_sent = None;
    }

    /// Send the pending index now instead of waiting for the quiet period
    pub async fn flush_now(&self) -> bool {
        self.debouncer.flush_now().await
    }
}
