use anyhow::{bail, Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::guard::SessionGuard;
use super::params::{AgentRole, SessionParams};
use super::status::SessionStatus;
use super::workflow::{
    AffordanceInputs, Affordances, Workflow, WorkflowChange, WorkflowEvent, WorkflowState,
};
use crate::agent::AgentConfigStore;
use crate::backend::{WalkthroughBackend, WalkthroughId};
use crate::channel::{codec, ConnectionState, DataPacket, Envelope, JoinRequest, RoomTransport};
use crate::config::{Config, DiscoveryConfig, ScriptsConfig, SyncConfig};
use crate::connection::ConnectionTracker;
use crate::identity;
use crate::scripts::ScriptEditCoordinator;
use crate::sync::{
    SlideContext, SlideSynchronizer, TranscriptPosition, TranscriptSegment,
    TranscriptSynchronizer,
};
use crate::theme::Theme;
use crate::voice::{MediaArbiter, MediaOwner, VoiceLibrary};
use crate::walkthrough::{DiscoveryPoller, WalkthroughCatalog};

/// Tunables for one session
#[derive(Debug, Clone, Default)]
pub struct SessionSettings {
    pub sync: SyncConfig,
    pub discovery: DiscoveryConfig,
    pub scripts: ScriptsConfig,
    pub theme: Theme,
}

impl From<&Config> for SessionSettings {
    fn from(config: &Config) -> Self {
        Self {
            sync: config.sync.clone(),
            discovery: config.discovery.clone(),
            scripts: config.scripts.clone(),
            theme: Theme::new(config.theme.accent),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    Requested,
    AlreadyConnected,
    /// Editing was requested before an auth token was installed
    NotReady,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateOutcome {
    /// No walkthrough selected, or generation not possible in this state
    Skipped,
    Generated { slides: usize },
}

/// One presentation session: connection, position sync, walkthrough
/// discovery, script editing and the workflow tying them together
pub struct WalkthroughSession {
    brdge_id: String,
    params: Mutex<SessionParams>,
    role: Mutex<AgentRole>,
    auth_token: Mutex<Option<String>>,
    display_name: Mutex<Option<String>>,
    info_overlay: AtomicBool,
    transport: Arc<dyn RoomTransport>,
    backend: Arc<dyn WalkthroughBackend>,
    tracker: ConnectionTracker,
    slides: SlideSynchronizer,
    transcript: TranscriptSynchronizer,
    catalog: Arc<Mutex<WalkthroughCatalog>>,
    discovery: DiscoveryPoller,
    scripts: ScriptEditCoordinator,
    agent: AgentConfigStore,
    voices: VoiceLibrary,
    media: Arc<MediaArbiter>,
    workflow: Mutex<Workflow>,
    guard: SessionGuard,
    theme: Theme,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl WalkthroughSession {
    pub fn new(
        params: SessionParams,
        role: AgentRole,
        transport: Arc<dyn RoomTransport>,
        backend: Arc<dyn WalkthroughBackend>,
        settings: SessionSettings,
    ) -> Result<Self> {
        if !params.has_required() {
            bail!(
                "Missing required parameters: brdgeId={:?}, numSlides={}, apiBaseUrl={:?}",
                params.brdge_id,
                params.num_slides,
                params.api_base_url
            );
        }
        let brdge_id = params.brdge_id.clone().unwrap_or_default();
        info!("Creating walkthrough session for {}", brdge_id);

        let guard = SessionGuard::new();
        let media = Arc::new(MediaArbiter::new());
        let catalog = Arc::new(Mutex::new(WalkthroughCatalog::default()));

        let slides = SlideSynchronizer::new(Arc::clone(&transport), settings.sync.slide_debounce());
        slides.set_context(SlideContext {
            params: Some(params.clone()),
            role,
        });

        Ok(Self {
            tracker: ConnectionTracker::new(Arc::clone(&transport)),
            slides,
            transcript: TranscriptSynchronizer::new(
                Arc::clone(&transport),
                settings.sync.transcript_debounce(),
            ),
            discovery: DiscoveryPoller::new(
                Arc::clone(&backend),
                brdge_id.clone(),
                settings.discovery.clone(),
                Arc::clone(&catalog),
                guard.clone(),
            ),
            scripts: ScriptEditCoordinator::new(
                Arc::clone(&backend),
                Arc::clone(&transport),
                brdge_id.clone(),
                guard.clone(),
                settings.scripts.autosave(),
            ),
            agent: AgentConfigStore::new(Arc::clone(&backend), brdge_id.clone()),
            voices: VoiceLibrary::new(Arc::clone(&backend), brdge_id.clone(), Arc::clone(&media)),
            brdge_id,
            params: Mutex::new(params),
            role: Mutex::new(role),
            auth_token: Mutex::new(None),
            display_name: Mutex::new(None),
            info_overlay: AtomicBool::new(true),
            transport,
            backend,
            catalog,
            media,
            workflow: Mutex::new(Workflow::new()),
            guard,
            theme: settings.theme,
            tasks: Mutex::new(Vec::new()),
        })
    }

    pub fn brdge_id(&self) -> &str {
        &self.brdge_id
    }

    pub fn scripts(&self) -> &ScriptEditCoordinator {
        &self.scripts
    }

    pub fn agent(&self) -> &AgentConfigStore {
        &self.agent
    }

    pub fn voices(&self) -> &VoiceLibrary {
        &self.voices
    }

    pub fn discovery(&self) -> &DiscoveryPoller {
        &self.discovery
    }

    pub fn slides(&self) -> &SlideSynchronizer {
        &self.slides
    }

    pub fn transcript(&self) -> &TranscriptSynchronizer {
        &self.transcript
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub async fn workflow_state(&self) -> WorkflowState {
        self.workflow.lock().await.state()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.tracker.state()
    }

    pub fn info_overlay_visible(&self) -> bool {
        self.info_overlay.load(Ordering::SeqCst)
    }

    pub async fn params(&self) -> SessionParams {
        self.params.lock().await.clone()
    }

    pub async fn role(&self) -> AgentRole {
        *self.role.lock().await
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Spawn the inbound-frame and connection-watch loops, then load
    /// everything the backend already knows about this presentation
    pub async fn start(self: &Arc<Self>) -> Result<()> {
        let mut inbound = self
            .transport
            .subscribe()
            .await
            .context("Failed to subscribe to room data channel")?;
        let session = Arc::clone(self);
        let inbound_task = tokio::spawn(async move {
            info!(
                "Data channel receive loop started on {}",
                session.transport.name()
            );
            while let Some(packet) = inbound.recv().await {
                session.handle_packet(packet).await;
            }
            info!("Data channel receive loop stopped");
        });

        let mut states = self.tracker.watch();
        let session = Arc::clone(self);
        let connection_task = tokio::spawn(async move {
            while states.changed().await.is_ok() {
                let state = *states.borrow_and_update();
                session.on_connection_state(state).await;
            }
        });

        {
            let mut tasks = self.tasks.lock().await;
            tasks.push(inbound_task);
            tasks.push(connection_task);
        }

        self.bootstrap().await;
        Ok(())
    }

    /// Load metadata, scripts, walkthroughs, agent config and voices.
    /// Each load is independent; failures are logged.
    pub async fn bootstrap(&self) {
        let epoch = self.guard.current();

        match self.backend.entity_name(&self.brdge_id).await {
            Ok(name) => *self.display_name.lock().await = name,
            Err(e) => warn!("Error fetching presentation metadata: {:#}", e),
        }

        match self.backend.get_scripts(&self.brdge_id).await {
            Ok(Some(snapshot)) if self.guard.is_current(epoch) => {
                self.scripts.load(snapshot.scripts).await;
                if let Some(source) = snapshot.source_walkthrough {
                    self.catalog.lock().await.select(Some(source));
                }
            }
            Ok(_) => {}
            Err(e) => warn!("Error checking for existing scripts: {:#}", e),
        }

        if let Err(e) = self.discovery.refresh().await {
            warn!("Error loading walkthroughs: {:#}", e);
        }

        if let Err(e) = self.agent.load().await {
            warn!("{:#}", e);
        }

        if let Err(e) = self.voices.refresh().await {
            warn!("{:#}", e);
        }
    }

    /// Stop background work and leave the room. Results of requests still in
    /// flight are discarded when they land.
    pub async fn teardown(&self) {
        info!("Tearing down session {}", self.brdge_id);
        self.guard.advance();
        self.slides.reset();
        self.transcript.reset();

        for task in self.tasks.lock().await.drain(..) {
            task.abort();
        }

        self.media.release(MediaOwner::LiveConversation);
        if let Err(e) = self.tracker.request_connect(None).await {
            error!("Failed to disconnect during teardown: {:#}", e);
        }
    }

    // ------------------------------------------------------------------
    // Identity and connection
    // ------------------------------------------------------------------

    /// Install the auth token delivered out-of-band
    pub async fn set_auth_token(&self, token: Option<String>) {
        self.backend.set_auth_token(token.clone());
        match token.as_deref().map(identity::subject_from_token) {
            Some(Ok(Some(subject))) => {
                info!("Authenticated as {}", subject);
                self.params.lock().await.user_id = subject;
            }
            Some(Ok(None)) => debug!("Auth token has no subject; keeping current user id"),
            Some(Err(e)) => warn!("Could not read subject from auth token: {:#}", e),
            None => {}
        }
        *self.auth_token.lock().await = token;
        self.refresh_slide_context().await;
    }

    async fn refresh_slide_context(&self) {
        let context = SlideContext {
            params: Some(self.params.lock().await.clone()),
            role: *self.role.lock().await,
        };
        self.slides.set_context(context);
    }

    /// Join the room in `role`. Editing requires an auth token.
    pub async fn connect(&self, role: AgentRole) -> Result<ConnectOutcome> {
        match self.tracker.state() {
            ConnectionState::Connected | ConnectionState::Connecting => {
                return Ok(ConnectOutcome::AlreadyConnected)
            }
            ConnectionState::Disconnected | ConnectionState::Reconnecting => {}
        }

        let has_token = self.auth_token.lock().await.is_some();
        if role == AgentRole::Edit && !has_token {
            warn!("Edit session needs an auth token before connecting");
            return Ok(ConnectOutcome::NotReady);
        }

        *self.role.lock().await = role;
        self.refresh_slide_context().await;

        let user_id = self.params.lock().await.user_id.clone();
        self.tracker
            .request_connect(Some(JoinRequest {
                room: self.brdge_id.clone(),
                user_id,
                role,
            }))
            .await
            .context("Failed to connect to room")?;
        Ok(ConnectOutcome::Requested)
    }

    pub async fn disconnect(&self) -> Result<()> {
        self.tracker
            .request_connect(None)
            .await
            .context("Failed to disconnect from room")
    }

    pub async fn set_microphone_enabled(&self, enabled: bool) -> Result<()> {
        if !self.tracker.is_connected() {
            debug!("Not connected; ignoring microphone toggle");
            return Ok(());
        }
        if enabled {
            self.media.acquire(MediaOwner::LiveConversation)?;
        }
        self.tracker.set_microphone_enabled(enabled).await?;
        if !enabled {
            self.media.release(MediaOwner::LiveConversation);
        }
        Ok(())
    }

    /// React to a state reported by the transport
    pub async fn on_connection_state(&self, state: ConnectionState) {
        let Some(transition) = self.tracker.observe(state) else {
            return;
        };

        if transition.connected() {
            self.on_connected().await;
        } else if transition.disconnected() {
            self.on_disconnected().await;
        }
    }

    async fn on_connected(&self) {
        self.info_overlay.store(false, Ordering::SeqCst);

        let current_slide = self.params.lock().await.current_slide;
        self.slides.on_connection_established(current_slide);

        let role = *self.role.lock().await;
        let microphone = match role {
            AgentRole::Edit => match self.media.acquire(MediaOwner::LiveConversation) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Leaving microphone off: {:#}", e);
                    false
                }
            },
            AgentRole::View => false,
        };
        if let Err(e) = self.tracker.set_microphone_enabled(microphone).await {
            error!("Failed to set microphone state: {:#}", e);
        }

        let user_id = Some(self.params.lock().await.user_id.clone());
        if let Err(e) = self.agent.mirror(self.transport.as_ref(), user_id).await {
            error!("Error sending agent config: {:#}", e);
        }
    }

    async fn on_disconnected(&self) {
        self.info_overlay.store(true, Ordering::SeqCst);
        self.slides.reset();
        self.transcript.reset();
        self.media.release(MediaOwner::LiveConversation);

        let change = self
            .workflow
            .lock()
            .await
            .apply(WorkflowEvent::ConnectionLost);
        if change.is_some() {
            self.discovery.on_walkthrough_completed();
        }
    }

    // ------------------------------------------------------------------
    // Workflow
    // ------------------------------------------------------------------

    /// Idle → Recording: join the room as the presenter
    pub async fn start_walkthrough(&self) -> Result<Option<WorkflowChange>> {
        if self.workflow_state().await != WorkflowState::Idle {
            return Ok(None);
        }
        match self.connect(AgentRole::Edit).await? {
            ConnectOutcome::Requested => Ok(self
                .workflow
                .lock()
                .await
                .apply(WorkflowEvent::StartWalkthrough)),
            ConnectOutcome::AlreadyConnected => {
                warn!("Already in the room; leave it before starting a walkthrough");
                Ok(None)
            }
            ConnectOutcome::NotReady => Ok(None),
        }
    }

    /// Recording → Idle: leave the room and look for the new walkthrough
    pub async fn stop_walkthrough(&self) -> Result<Option<WorkflowChange>> {
        let change = self
            .workflow
            .lock()
            .await
            .apply(WorkflowEvent::StopWalkthrough);
        if change.is_none() {
            return Ok(None);
        }
        self.disconnect().await?;
        self.discovery.on_walkthrough_completed();
        Ok(change)
    }

    /// Generating straight out of Recording still closes the live session
    async fn end_recording(&self) {
        if let Err(e) = self.disconnect().await {
            error!("{:#}", e);
        }
        self.discovery.on_walkthrough_completed();
    }

    /// Join as a passive viewer to replay the walkthrough
    pub async fn play(&self) -> Result<ConnectOutcome> {
        self.connect(AgentRole::View).await
    }

    /// Generate scripts from the selected walkthrough
    ///
    /// A no-op without a selection or while already generating. On failure
    /// the workflow returns to Idle and the error is returned to the caller.
    pub async fn generate(&self) -> Result<GenerateOutcome> {
        let selected = self.catalog.lock().await.selected();
        let Some(walkthrough) = selected else {
            debug!("Generate requested without a selected walkthrough");
            return Ok(GenerateOutcome::Skipped);
        };

        let started = self.workflow.lock().await.apply(WorkflowEvent::Generate {
            has_selection: true,
        });
        let Some(started) = started else {
            return Ok(GenerateOutcome::Skipped);
        };
        if started.from == WorkflowState::Recording {
            self.end_recording().await;
        }

        match self.scripts.generate(walkthrough).await {
            Ok(scripts) => {
                self.workflow
                    .lock()
                    .await
                    .apply(WorkflowEvent::GenerationSucceeded);
                Ok(GenerateOutcome::Generated {
                    slides: scripts.len(),
                })
            }
            Err(e) => {
                error!("{:#}", e);
                self.workflow
                    .lock()
                    .await
                    .apply(WorkflowEvent::GenerationFailed);
                Err(e)
            }
        }
    }

    /// Reviewing → Sharing
    pub async fn share(&self) -> Option<WorkflowChange> {
        self.workflow.lock().await.apply(WorkflowEvent::Share)
    }

    pub async fn affordances(&self) -> Affordances {
        let params = self.params().await;
        let inputs = AffordanceInputs {
            state: self.workflow_state().await,
            connection: self.tracker.state(),
            role: self.role().await,
            has_selection: self.catalog.lock().await.selected().is_some(),
            has_scripts: self.scripts.has_scripts().await,
            scripts_dirty: self.scripts.is_dirty().await,
            current_slide: params.current_slide,
            num_slides: params.num_slides,
        };
        Affordances::from_inputs(&inputs)
    }

    // ------------------------------------------------------------------
    // Walkthroughs
    // ------------------------------------------------------------------

    pub async fn select_walkthrough(&self, id: Option<WalkthroughId>) {
        self.catalog.lock().await.select(id);
    }

    pub async fn selected_walkthrough(&self) -> Option<WalkthroughId> {
        self.catalog.lock().await.selected()
    }

    pub async fn refresh_walkthroughs(&self) -> Result<usize> {
        self.discovery.refresh().await
    }

    pub async fn catalog(&self) -> WalkthroughCatalog {
        self.catalog.lock().await.clone()
    }

    /// Time-limited URL of the most recent recording, for playback
    pub async fn latest_recording_url(&self) -> Result<String> {
        self.backend
            .latest_recording_url(&self.brdge_id)
            .await
            .context("Error fetching recording URL")
    }

    // ------------------------------------------------------------------
    // Slides and transcript
    // ------------------------------------------------------------------

    pub async fn go_to_slide(&self, slide: u32) -> u32 {
        let (changed, current) = {
            let mut params = self.params.lock().await;
            let changed = params.go_to(slide);
            (changed, params.current_slide)
        };
        if changed {
            self.slides.on_slide_changed(current);
        }
        current
    }

    pub async fn next_slide(&self) -> u32 {
        self.step_slide(SessionParams::next).await
    }

    pub async fn prev_slide(&self) -> u32 {
        self.step_slide(SessionParams::prev).await
    }

    async fn step_slide(&self, step: fn(&mut SessionParams) -> bool) -> u32 {
        let (changed, current) = {
            let mut params = self.params.lock().await;
            let changed = step(&mut params);
            (changed, params.current_slide)
        };
        if changed {
            self.slides.on_slide_changed(current);
        }
        current
    }

    pub fn set_transcript(&self, segments: Vec<TranscriptSegment>) {
        self.transcript.set_segments(segments);
    }

    /// Video playback reached `time` seconds
    pub fn on_video_time(&self, time: f64) -> TranscriptPosition {
        self.transcript.on_time_update(time)
    }

    // ------------------------------------------------------------------
    // Scripts
    // ------------------------------------------------------------------

    pub async fn edit_script(&self, slide_id: &str, text: &str) {
        self.scripts.edit(slide_id, text).await;
    }

    // ------------------------------------------------------------------
    // Inbound frames
    // ------------------------------------------------------------------

    pub async fn handle_packet(&self, packet: DataPacket) {
        if let Some(envelope) = codec::decode_or_drop(&packet) {
            self.handle_envelope(envelope).await;
        }
    }

    pub async fn handle_envelope(&self, envelope: Envelope) {
        let kind = envelope.kind();
        debug!("Received {} envelope", kind);
        match envelope {
            Envelope::ScriptsUpdated(update) => {
                if update.brdge_id != self.brdge_id {
                    debug!("Ignoring script update for {}", update.brdge_id);
                    return;
                }
                self.reload_remote_scripts().await;
            }
            Envelope::WalkthroughCompleted(_) => {
                info!("Walkthrough completed, refreshing...");
                self.discovery.on_walkthrough_completed();
            }
            Envelope::SlideUpdate(_)
            | Envelope::TranscriptPosition(_)
            | Envelope::AgentConfig(_) => {
                debug!("Ignoring outbound-only {} envelope", kind);
            }
        }
    }

    async fn reload_remote_scripts(&self) {
        let epoch = self.guard.current();
        match self.backend.get_scripts(&self.brdge_id).await {
            Ok(Some(snapshot)) => {
                if !self.guard.is_current(epoch) {
                    return;
                }
                self.scripts.on_remote_scripts_updated(snapshot.scripts).await;
            }
            Ok(None) => debug!("Scripts updated remotely but none are stored"),
            Err(e) => error!("Error loading updated scripts: {:#}", e),
        }
    }

    // ------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------

    pub async fn status(&self) -> SessionStatus {
        let params = self.params().await;
        let catalog = self.catalog().await;
        SessionStatus {
            brdge_id: self.brdge_id.clone(),
            display_name: self
                .display_name
                .lock()
                .await
                .clone()
                .unwrap_or_else(|| self.brdge_id.clone()),
            num_slides: params.num_slides,
            current_slide: params.current_slide,
            slide_url: params.current_slide_url(),
            user_id: params.user_id.clone(),
            role: self.role().await,
            connection: self.tracker.state(),
            microphone_enabled: self.tracker.microphone_enabled(),
            media_owner: self.media.owner(),
            info_overlay_visible: self.info_overlay_visible(),
            workflow: self.workflow_state().await,
            affordances: self.affordances().await,
            walkthroughs: catalog.entries(),
            selected_walkthrough: catalog.selected(),
            scripts: self.scripts.effective().await,
            scripts_dirty: self.scripts.is_dirty().await,
            scripts_conflict: self.scripts.has_conflict().await,
            generating: self.scripts.is_generating(),
            voices: self.voices.voices().await,
            selected_voice: self.voices.selected().await,
            theme: self.theme.css_variables(),
        }
    }
}
