//! HTTP API for driving a walkthrough session from a UI
//!
//! - GET /health - Health check
//! - GET /session/status - Full session snapshot
//! - POST /session/auth | /session/play | /session/disconnect | /session/microphone
//! - POST /walkthrough/start | /walkthrough/stop - Record a walkthrough
//! - POST /generate | /share - Script generation and sharing
//! - POST /slides/goto/:index | /slides/next | /slides/prev - Slide navigation
//! - PUT /transcript, POST /transcript/time - Transcript position sync
//! - GET /scripts, PUT /scripts/:slide_id, POST /scripts/commit | /scripts/discard
//! - GET /walkthroughs, POST /walkthroughs/refresh | /walkthroughs/select
//! - GET /recordings/latest - Signed URL of the latest recording
//! - GET|PUT /agent-config, POST /agent-config/save
//! - GET /voices, POST /voices/:id/activate | /voices/:id/deactivate

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
