mod common;

use std::sync::Arc;
use tokio::time::{sleep, Duration};
use walkthrough_sync::channel::{Envelope, JoinRequest, LoopbackTransport, RoomTransport};
use walkthrough_sync::sync::{SlideContext, SlideSynchronizer};
use walkthrough_sync::{AgentRole, ConnectionState};

async fn connected_sync() -> (SlideSynchronizer, LoopbackTransport) {
    let transport = LoopbackTransport::new();
    transport
        .connect(JoinRequest {
            room: "deck-1".to_string(),
            user_id: "anon_test".to_string(),
            role: AgentRole::Edit,
        })
        .await
        .unwrap();

    let sync = SlideSynchronizer::new(Arc::new(transport.clone()), Duration::from_millis(300));
    sync.set_context(SlideContext {
        params: Some(common::params()),
        role: AgentRole::Edit,
    });
    (sync, transport)
}

async fn sent_slides(transport: &LoopbackTransport) -> Vec<u32> {
    transport
        .sent_envelopes()
        .await
        .into_iter()
        .filter_map(|envelope| match envelope {
            Envelope::SlideUpdate(update) => Some(update.current_slide),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_changes_sends_only_the_last() {
    let (sync, transport) = connected_sync().await;

    sync.on_slide_changed(2);
    sleep(Duration::from_millis(100)).await;
    sync.on_slide_changed(3);
    sleep(Duration::from_millis(100)).await;
    sync.on_slide_changed(4);

    sleep(Duration::from_millis(299)).await;
    assert!(sent_slides(&transport).await.is_empty());
    assert!(sync.is_pending());

    sleep(Duration::from_millis(2)).await;
    assert_eq!(sent_slides(&transport).await, vec![4]);
    assert_eq!(sync.last_sent(), Some(4));
    assert!(!sync.is_pending());
}

#[tokio::test(start_paused = true)]
async fn test_slide_update_carries_session_fields() {
    let (sync, transport) = connected_sync().await;

    sync.on_slide_changed(2);
    sleep(Duration::from_millis(350)).await;

    let envelopes = transport.sent_envelopes().await;
    let Some(Envelope::SlideUpdate(update)) = envelopes.first() else {
        panic!("expected a slide update, got {:?}", envelopes);
    };
    assert_eq!(update.brdge_id, "deck-1");
    assert_eq!(update.num_slides, 5);
    assert_eq!(update.api_base_url, "https://api.test");
    assert_eq!(update.slide_url, "https://api.test/brdges/deck-1/slides/2");
    assert_eq!(update.agent_type, AgentRole::Edit);
    assert_eq!(update.user_id.as_deref(), Some("anon_test"));
}

#[tokio::test(start_paused = true)]
async fn test_changes_while_disconnected_are_ignored() {
    let transport = LoopbackTransport::new();
    let sync = SlideSynchronizer::new(Arc::new(transport.clone()), Duration::from_millis(300));
    sync.set_context(SlideContext {
        params: Some(common::params()),
        role: AgentRole::Edit,
    });

    sync.on_slide_changed(3);
    assert!(!sync.is_pending());

    sleep(Duration::from_secs(1)).await;
    assert_eq!(transport.publish_attempts(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_returning_to_last_sent_slide_cancels_pending_send() {
    let (sync, transport) = connected_sync().await;

    sync.on_slide_changed(2);
    sleep(Duration::from_millis(400)).await;
    assert_eq!(sent_slides(&transport).await, vec![2]);

    sync.on_slide_changed(3);
    sync.on_slide_changed(2);
    assert!(!sync.is_pending());

    sleep(Duration::from_secs(1)).await;
    assert_eq!(sent_slides(&transport).await, vec![2]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_send_does_not_mark_slide_as_sent() {
    let (sync, transport) = connected_sync().await;
    transport.fail_publishes(true);

    sync.on_slide_changed(2);
    sleep(Duration::from_millis(400)).await;
    assert_eq!(transport.publish_attempts(), 1);
    assert_eq!(sync.last_sent(), None);

    transport.fail_publishes(false);
    sync.on_slide_changed(2);
    sleep(Duration::from_millis(400)).await;
    assert_eq!(sent_slides(&transport).await, vec![2]);
}

#[tokio::test(start_paused = true)]
async fn test_flush_now_skips_the_quiet_period() {
    let (sync, transport) = connected_sync().await;

    sync.on_slide_changed(5);
    assert!(sync.flush_now().await);
    assert_eq!(sent_slides(&transport).await, vec![5]);

    // The armed timer must not send a second time
    sleep(Duration::from_secs(1)).await;
    assert_eq!(sent_slides(&transport).await, vec![5]);
    assert!(!sync.flush_now().await);
}

#[tokio::test(start_paused = true)]
async fn test_incomplete_parameters_suppress_send() {
    let (sync, transport) = connected_sync().await;
    sync.set_context(SlideContext::default());

    sync.on_slide_changed(2);
    sleep(Duration::from_millis(400)).await;
    assert_eq!(transport.publish_attempts(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_each_connection_pushes_current_slide_once() {
    let (session, transport, _backend) = common::started_session(AgentRole::View).await;

    session.play().await.unwrap();
    sleep(Duration::from_millis(400)).await;
    assert_eq!(sent_slides(&transport).await, vec![1]);

    // Navigation while connected goes out as usual
    session.go_to_slide(3).await;
    sleep(Duration::from_millis(400)).await;
    assert_eq!(sent_slides(&transport).await, vec![1, 3]);

    // Drop and rejoin: the current slide is pushed exactly once more
    transport.set_state(ConnectionState::Disconnected);
    sleep(Duration::from_millis(10)).await;
    session.play().await.unwrap();
    sleep(Duration::from_secs(2)).await;
    assert_eq!(sent_slides(&transport).await, vec![1, 3, 3]);
}

#[tokio::test(start_paused = true)]
async fn test_navigation_is_clamped() {
    let (session, _transport, _backend) = common::started_session(AgentRole::View).await;

    assert_eq!(session.prev_slide().await, 1);
    assert_eq!(session.go_to_slide(99).await, 5);
    assert_eq!(session.next_slide().await, 5);
    assert_eq!(session.prev_slide().await, 4);
}
