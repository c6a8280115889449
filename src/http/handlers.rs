use super::state::AppState;
use crate::agent::AgentConfig;
use crate::backend::WalkthroughId;
use crate::scripts::CommitOutcome;
use crate::session::{ConnectOutcome, GenerateOutcome, WorkflowChange, WorkflowState};
use crate::sync::{TranscriptPosition, TranscriptSegment};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    /// Bearer token; `null` clears it
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MicrophoneRequest {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct WorkflowResponse {
    pub workflow: WorkflowState,
    pub changed: bool,
}

#[derive(Debug, Serialize)]
pub struct ConnectResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct SlideResponse {
    pub current_slide: u32,
}

#[derive(Debug, Deserialize)]
pub struct EditScriptRequest {
    pub script: String,
}

#[derive(Debug, Serialize)]
pub struct ScriptsResponse {
    pub scripts: crate::backend::ScriptMap,
    pub dirty: bool,
    pub conflict: bool,
    pub generating: bool,
}

#[derive(Debug, Serialize)]
pub struct CommitResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub status: String,
    pub slides: usize,
}

#[derive(Debug, Deserialize)]
pub struct SelectWalkthroughRequest {
    pub id: Option<WalkthroughId>,
}

#[derive(Debug, Serialize)]
pub struct RecordingUrlResponse {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct TranscriptRequest {
    pub segments: Vec<TranscriptSegment>,
}

#[derive(Debug, Deserialize)]
pub struct TimeUpdateRequest {
    /// Playback position in seconds
    pub time: f64,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

fn workflow_response(workflow: WorkflowState, change: Option<WorkflowChange>) -> Response {
    (
        StatusCode::OK,
        Json(WorkflowResponse {
            workflow,
            changed: change.is_some(),
        }),
    )
        .into_response()
}

fn connect_response(outcome: ConnectOutcome) -> Response {
    let (status, text) = match outcome {
        ConnectOutcome::Requested => (StatusCode::OK, "connecting"),
        ConnectOutcome::AlreadyConnected => (StatusCode::OK, "already_connected"),
        ConnectOutcome::NotReady => (StatusCode::CONFLICT, "not_ready"),
    };
    (
        status,
        Json(ConnectResponse {
            status: text.to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// Session
// ============================================================================

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /session/status
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.session.status().await))
}

/// POST /session/auth
/// Install (or clear) the auth token
pub async fn set_auth(
    State(state): State<AppState>,
    Json(req): Json<AuthRequest>,
) -> impl IntoResponse {
    state.session.set_auth_token(req.token).await;
    StatusCode::NO_CONTENT
}

/// POST /session/play
/// Join the room as a viewer
pub async fn play(State(state): State<AppState>) -> Response {
    match state.session.play().await {
        Ok(outcome) => connect_response(outcome),
        Err(e) => {
            error!("Failed to join room: {:#}", e);
            error_response(StatusCode::BAD_GATEWAY, format!("{:#}", e))
        }
    }
}

/// POST /session/disconnect
pub async fn disconnect(State(state): State<AppState>) -> Response {
    match state.session.disconnect().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(StatusCode::BAD_GATEWAY, format!("{:#}", e)),
    }
}

/// POST /session/microphone
pub async fn set_microphone(
    State(state): State<AppState>,
    Json(req): Json<MicrophoneRequest>,
) -> Response {
    match state.session.set_microphone_enabled(req.enabled).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(StatusCode::CONFLICT, format!("{:#}", e)),
    }
}

// ============================================================================
// Workflow
// ============================================================================

/// POST /walkthrough/start
/// Join as presenter and start recording
pub async fn start_walkthrough(State(state): State<AppState>) -> Response {
    match state.session.start_walkthrough().await {
        Ok(change) => workflow_response(state.session.workflow_state().await, change),
        Err(e) => {
            error!("Failed to start walkthrough: {:#}", e);
            error_response(StatusCode::BAD_GATEWAY, format!("{:#}", e))
        }
    }
}

/// POST /walkthrough/stop
/// Stop recording and look for the saved walkthrough
pub async fn stop_walkthrough(State(state): State<AppState>) -> Response {
    match state.session.stop_walkthrough().await {
        Ok(change) => workflow_response(state.session.workflow_state().await, change),
        Err(e) => {
            error!("Failed to stop walkthrough: {:#}", e);
            error_response(StatusCode::BAD_GATEWAY, format!("{:#}", e))
        }
    }
}

/// POST /generate
/// Generate scripts from the selected walkthrough
pub async fn generate(State(state): State<AppState>) -> Response {
    match state.session.generate().await {
        Ok(GenerateOutcome::Generated { slides }) => (
            StatusCode::OK,
            Json(GenerateResponse {
                status: "generated".to_string(),
                slides,
            }),
        )
            .into_response(),
        Ok(GenerateOutcome::Skipped) => (
            StatusCode::CONFLICT,
            Json(GenerateResponse {
                status: "skipped".to_string(),
                slides: 0,
            }),
        )
            .into_response(),
        Err(e) => error_response(StatusCode::BAD_GATEWAY, format!("{:#}", e)),
    }
}

/// POST /share
pub async fn share(State(state): State<AppState>) -> Response {
    let change = state.session.share().await;
    workflow_response(state.session.workflow_state().await, change)
}

// ============================================================================
// Slides and transcript
// ============================================================================

/// POST /slides/goto/:index
pub async fn go_to_slide(State(state): State<AppState>, Path(index): Path<u32>) -> Response {
    let current_slide = state.session.go_to_slide(index).await;
    (StatusCode::OK, Json(SlideResponse { current_slide })).into_response()
}

/// POST /slides/next
pub async fn next_slide(State(state): State<AppState>) -> Response {
    let current_slide = state.session.next_slide().await;
    (StatusCode::OK, Json(SlideResponse { current_slide })).into_response()
}

/// POST /slides/prev
pub async fn prev_slide(State(state): State<AppState>) -> Response {
    let current_slide = state.session.prev_slide().await;
    (StatusCode::OK, Json(SlideResponse { current_slide })).into_response()
}

/// PUT /transcript
/// Replace the transcript segments used for position sync
pub async fn set_transcript(
    State(state): State<AppState>,
    Json(req): Json<TranscriptRequest>,
) -> impl IntoResponse {
    state.session.set_transcript(req.segments);
    StatusCode::NO_CONTENT
}

/// POST /transcript/time
/// Video playback position changed
pub async fn transcript_time(
    State(state): State<AppState>,
    Json(req): Json<TimeUpdateRequest>,
) -> impl IntoResponse {
    let position: TranscriptPosition = state.session.on_video_time(req.time);
    (StatusCode::OK, Json(position))
}

// ============================================================================
// Scripts
// ============================================================================

/// GET /scripts
pub async fn get_scripts(State(state): State<AppState>) -> impl IntoResponse {
    let scripts = state.session.scripts();
    (
        StatusCode::OK,
        Json(ScriptsResponse {
            scripts: scripts.effective().await,
            dirty: scripts.is_dirty().await,
            conflict: scripts.has_conflict().await,
            generating: scripts.is_generating(),
        }),
    )
}

/// PUT /scripts/:slide_id
/// Edit one slide's script locally
pub async fn edit_script(
    State(state): State<AppState>,
    Path(slide_id): Path<String>,
    Json(req): Json<EditScriptRequest>,
) -> impl IntoResponse {
    state.session.edit_script(&slide_id, &req.script).await;
    StatusCode::NO_CONTENT
}

/// POST /scripts/commit
pub async fn commit_scripts(State(state): State<AppState>) -> Response {
    match state.session.scripts().commit().await {
        Ok(outcome) => {
            let status = match outcome {
                CommitOutcome::Saved => "saved",
                CommitOutcome::NothingToSave => "nothing_to_save",
                CommitOutcome::Discarded => "discarded",
            };
            info!("Script commit: {}", status);
            (
                StatusCode::OK,
                Json(CommitResponse {
                    status: status.to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to save scripts: {:#}", e);
            error_response(StatusCode::BAD_GATEWAY, format!("{:#}", e))
        }
    }
}

/// POST /scripts/discard
pub async fn discard_scripts(State(state): State<AppState>) -> impl IntoResponse {
    state.session.scripts().discard().await;
    StatusCode::NO_CONTENT
}

// ============================================================================
// Walkthroughs
// ============================================================================

/// GET /walkthroughs
pub async fn list_walkthroughs(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.session.catalog().await.entries()))
}

/// POST /walkthroughs/refresh
pub async fn refresh_walkthroughs(State(state): State<AppState>) -> Response {
    match state.session.refresh_walkthroughs().await {
        Ok(count) => (StatusCode::OK, Json(RefreshResponse { count })).into_response(),
        Err(e) => error_response(StatusCode::BAD_GATEWAY, format!("{:#}", e)),
    }
}

/// GET /recordings/latest
/// Signed URL of the most recent recording
pub async fn latest_recording(State(state): State<AppState>) -> Response {
    match state.session.latest_recording_url().await {
        Ok(url) => (StatusCode::OK, Json(RecordingUrlResponse { url })).into_response(),
        Err(e) => error_response(StatusCode::BAD_GATEWAY, format!("{:#}", e)),
    }
}

/// POST /walkthroughs/select
pub async fn select_walkthrough(
    State(state): State<AppState>,
    Json(req): Json<SelectWalkthroughRequest>,
) -> impl IntoResponse {
    state.session.select_walkthrough(req.id).await;
    StatusCode::NO_CONTENT
}

// ============================================================================
// Agent configuration
// ============================================================================

/// GET /agent-config
pub async fn get_agent_config(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.session.agent().get().await))
}

/// PUT /agent-config
/// Replace the local copy; call save to persist
pub async fn put_agent_config(
    State(state): State<AppState>,
    Json(config): Json<AgentConfig>,
) -> impl IntoResponse {
    state.session.agent().replace(config).await;
    StatusCode::NO_CONTENT
}

/// POST /agent-config/save
pub async fn save_agent_config(State(state): State<AppState>) -> Response {
    match state.session.agent().save().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(StatusCode::BAD_GATEWAY, format!("{:#}", e)),
    }
}

// ============================================================================
// Voices
// ============================================================================

/// GET /voices
pub async fn list_voices(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.session.voices().voices().await))
}

/// POST /voices/:voice_id/activate
pub async fn activate_voice(
    State(state): State<AppState>,
    Path(voice_id): Path<String>,
) -> Response {
    match state.session.voices().activate(&voice_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(StatusCode::BAD_GATEWAY, format!("{:#}", e)),
    }
}

/// POST /voices/:voice_id/deactivate
pub async fn deactivate_voice(
    State(state): State<AppState>,
    Path(voice_id): Path<String>,
) -> Response {
    match state.session.voices().deactivate(&voice_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(StatusCode::BAD_GATEWAY, format!("{:#}", e)),
    }
}
