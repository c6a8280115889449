mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use walkthrough_sync::{create_router, AgentRole, AppState};

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_health_check() {
    let (session, _, _) = common::started_session(AgentRole::View).await;
    let app = create_router(AppState::new(session));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_status_reports_session() {
    let (session, _, _) = common::started_session(AgentRole::View).await;
    let app = create_router(AppState::new(session));

    let (status, body) = send(&app, "GET", "/session/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["brdge_id"], "deck-1");
    assert_eq!(body["display_name"], "Deck deck-1");
    assert_eq!(body["current_slide"], 1);
    assert_eq!(body["connection"], "disconnected");
    assert_eq!(body["workflow"], "idle");
    assert_eq!(body["info_overlay_visible"], true);
    assert_eq!(body["affordances"]["next_slide"], true);
}

#[tokio::test]
async fn test_slide_navigation() {
    let (session, _, _) = common::started_session(AgentRole::View).await;
    let app = create_router(AppState::new(session));

    let (_, body) = send(&app, "POST", "/slides/next", None).await;
    assert_eq!(body["current_slide"], 2);
    let (_, body) = send(&app, "POST", "/slides/goto/42", None).await;
    assert_eq!(body["current_slide"], 5);
    let (_, body) = send(&app, "POST", "/slides/prev", None).await;
    assert_eq!(body["current_slide"], 4);
}

#[tokio::test]
async fn test_edit_walkthrough_without_token_is_refused() {
    let (session, transport, _) = common::started_session(AgentRole::Edit).await;
    let app = create_router(AppState::new(session));

    let (status, body) = send(&app, "POST", "/walkthrough/start", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["changed"], false);
    assert_eq!(body["workflow"], "idle");
    assert!(transport.joins().await.is_empty());

    let (status, _) = send(&app, "POST", "/session/auth", Some(json!({"token": "t"}))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, "POST", "/walkthrough/start", None).await;
    assert_eq!(body["changed"], true);
    assert_eq!(body["workflow"], "recording");
}

#[tokio::test]
async fn test_script_edit_and_commit() {
    let (session, _, backend) = common::started_session(AgentRole::Edit).await;
    session.scripts().load(common::scripts(&[("1", "Hello")])).await;
    let app = create_router(AppState::new(session));

    let (status, _) = send(&app, "PUT", "/scripts/1", Some(json!({"script": "Hi"}))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, "GET", "/scripts", None).await;
    assert_eq!(body["dirty"], true);
    assert_eq!(body["scripts"]["1"]["script"], "Hi");

    let (status, body) = send(&app, "POST", "/scripts/commit", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "saved");
    assert_eq!(backend.updates().len(), 1);

    let (_, body) = send(&app, "POST", "/scripts/commit", None).await;
    assert_eq!(body["status"], "nothing_to_save");
}

#[tokio::test]
async fn test_generate_without_selection_conflicts() {
    let (session, _, _) = common::started_session(AgentRole::Edit).await;
    let app = create_router(AppState::new(session));

    let (status, body) = send(&app, "POST", "/generate", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "skipped");
}

#[tokio::test]
async fn test_generate_failure_is_reported() {
    let (session, _, backend) = common::started_session(AgentRole::Edit).await;
    backend.set_generate_result(Err("upstream timeout"));
    let app = create_router(AppState::new(session));

    let (status, _) = send(&app, "POST", "/walkthroughs/select", Some(json!({"id": 3}))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "POST", "/generate", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("upstream timeout"));
}

#[tokio::test]
async fn test_walkthrough_refresh_and_list() {
    let (session, _, backend) = common::started_session(AgentRole::Edit).await;
    backend.set_walkthroughs(vec![common::walkthrough(1, 0), common::walkthrough(2, 5)]);
    let app = create_router(AppState::new(session));

    let (_, body) = send(&app, "POST", "/walkthroughs/refresh", None).await;
    assert_eq!(body["count"], 2);

    let (_, body) = send(&app, "GET", "/walkthroughs", None).await;
    assert_eq!(body[0]["id"], 2);
    assert_eq!(body[0]["ordinal"], 2);
    assert_eq!(body[1]["id"], 1);
}

#[tokio::test]
async fn test_transcript_time_returns_partition() {
    let (session, _, _) = common::started_session(AgentRole::View).await;
    let app = create_router(AppState::new(session));

    let segments = json!({"segments": [
        {"text": "One", "start": 0.0, "end": 1.0},
        {"text": "Two", "start": 1.0, "end": 2.0},
        {"text": "Three", "start": 2.0, "end": 3.0}
    ]});
    let (status, _) = send(&app, "PUT", "/transcript", Some(segments)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, "POST", "/transcript/time", Some(json!({"time": 1.5}))).await;
    assert_eq!(body["read"], json!(["One"]));
    assert_eq!(body["remaining"], json!(["Three"]));
}

#[tokio::test]
async fn test_agent_config_round_trip() {
    let (session, _, backend) = common::started_session(AgentRole::Edit).await;
    let app = create_router(AppState::new(session));

    let config = json!({"personality": "upbeat", "knowledge_base": []});
    let (status, _) = send(&app, "PUT", "/agent-config", Some(config)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "POST", "/agent-config/save", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(backend.saved_configs()[0].personality, "upbeat");

    let (_, body) = send(&app, "GET", "/agent-config", None).await;
    assert_eq!(body["personality"], "upbeat");
}

#[tokio::test]
async fn test_voice_activation() {
    let (session, _, backend) = common::started_session(AgentRole::Edit).await;
    backend.set_voices(vec![
        common::voice("a", walkthrough_sync::backend::VoiceStatus::Active),
        common::voice("b", walkthrough_sync::backend::VoiceStatus::Inactive),
    ]);
    session.voices().refresh().await.unwrap();
    let app = create_router(AppState::new(session));

    let (status, _) = send(&app, "POST", "/voices/b/activate", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, "GET", "/voices", None).await;
    assert_eq!(body[0]["status"], "inactive");
    assert_eq!(body[1]["status"], "active");
}

#[tokio::test]
async fn test_latest_recording_url() {
    let (session, _, _) = common::started_session(AgentRole::View).await;
    let app = create_router(AppState::new(session));

    let (status, body) = send(&app, "GET", "/recordings/latest", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], "https://recordings.test/deck-1/latest.mp4");
}
