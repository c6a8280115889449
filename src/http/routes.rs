use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session and connection
        .route("/session/status", get(handlers::get_status))
        .route("/session/auth", post(handlers::set_auth))
        .route("/session/play", post(handlers::play))
        .route("/session/disconnect", post(handlers::disconnect))
        .route("/session/microphone", post(handlers::set_microphone))
        // Workflow
        .route("/walkthrough/start", post(handlers::start_walkthrough))
        .route("/walkthrough/stop", post(handlers::stop_walkthrough))
        .route("/generate", post(handlers::generate))
        .route("/share", post(handlers::share))
        // Slides and transcript
        .route("/slides/goto/:index", post(handlers::go_to_slide))
        .route("/slides/next", post(handlers::next_slide))
        .route("/slides/prev", post(handlers::prev_slide))
        .route("/transcript", put(handlers::set_transcript))
        .route("/transcript/time", post(handlers::transcript_time))
        // Scripts
        .route("/scripts", get(handlers::get_scripts))
        .route("/scripts/commit", post(handlers::commit_scripts))
        .route("/scripts/discard", post(handlers::discard_scripts))
        .route("/scripts/:slide_id", put(handlers::edit_script))
        // Walkthroughs
        .route("/walkthroughs", get(handlers::list_walkthroughs))
        .route("/walkthroughs/refresh", post(handlers::refresh_walkthroughs))
        .route("/walkthroughs/select", post(handlers::select_walkthrough))
        .route("/recordings/latest", get(handlers::latest_recording))
        // Agent configuration
        .route(
            "/agent-config",
            get(handlers::get_agent_config).put(handlers::put_agent_config),
        )
        .route("/agent-config/save", post(handlers::save_agent_config))
        // Voices
        .route("/voices", get(handlers::list_voices))
        .route("/voices/:voice_id/activate", post(handlers::activate_voice))
        .route("/voices/:voice_id/deactivate", post(handlers::deactivate_voice))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
