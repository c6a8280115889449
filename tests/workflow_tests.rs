mod common;

use tokio::time::{sleep, Duration};
use walkthrough_sync::session::{
    AffordanceInputs, Affordances, ConnectOutcome, GenerateOutcome, Workflow, WorkflowEvent,
    WorkflowState,
};
use walkthrough_sync::{AgentRole, ConnectionState};

#[test]
fn test_happy_path() {
    let mut workflow = Workflow::new();
    assert_eq!(workflow.state(), WorkflowState::Idle);

    let steps = [
        (WorkflowEvent::StartWalkthrough, WorkflowState::Recording),
        (WorkflowEvent::StopWalkthrough, WorkflowState::Idle),
        (
            WorkflowEvent::Generate {
                has_selection: true,
            },
            WorkflowState::Generating,
        ),
        (WorkflowEvent::GenerationSucceeded, WorkflowState::Reviewing),
        (WorkflowEvent::Share, WorkflowState::Sharing),
    ];
    for (event, expected) in steps {
        let change = workflow.apply(event).unwrap();
        assert_eq!(change.to, expected);
        assert_eq!(workflow.state(), expected);
    }
}

#[test]
fn test_connection_loss_ends_recording() {
    let mut workflow = Workflow::new();
    workflow.apply(WorkflowEvent::StartWalkthrough);
    let change = workflow.apply(WorkflowEvent::ConnectionLost).unwrap();
    assert_eq!(change.from, WorkflowState::Recording);
    assert_eq!(change.to, WorkflowState::Idle);
}

#[test]
fn test_generation_failure_returns_to_idle() {
    let mut workflow = Workflow::new();
    workflow.apply(WorkflowEvent::Generate {
        has_selection: true,
    });
    workflow.apply(WorkflowEvent::GenerationFailed);
    assert_eq!(workflow.state(), WorkflowState::Idle);
}

#[test]
fn test_invalid_events_are_ignored() {
    let mut workflow = Workflow::new();
    assert!(workflow.apply(WorkflowEvent::StopWalkthrough).is_none());
    assert!(workflow.apply(WorkflowEvent::Share).is_none());
    assert!(workflow.apply(WorkflowEvent::GenerationSucceeded).is_none());
    assert!(workflow
        .apply(WorkflowEvent::Generate {
            has_selection: false
        })
        .is_none());
    assert_eq!(workflow.state(), WorkflowState::Idle);

    workflow.apply(WorkflowEvent::Generate {
        has_selection: true,
    });
    assert!(workflow.apply(WorkflowEvent::StartWalkthrough).is_none());
    assert!(workflow
        .apply(WorkflowEvent::Generate {
            has_selection: true
        })
        .is_none());
    assert_eq!(workflow.state(), WorkflowState::Generating);
}

fn inputs() -> AffordanceInputs {
    AffordanceInputs {
        state: WorkflowState::Idle,
        connection: ConnectionState::Disconnected,
        role: AgentRole::Edit,
        has_selection: false,
        has_scripts: false,
        scripts_dirty: false,
        current_slide: 1,
        num_slides: 5,
    }
}

#[test]
fn test_idle_affordances() {
    let affordances = Affordances::from_inputs(&inputs());
    assert!(affordances.start_walkthrough);
    assert!(!affordances.stop_walkthrough);
    assert!(!affordances.generate);
    assert!(!affordances.play);
    assert!(!affordances.previous_slide);
    assert!(affordances.next_slide);
    assert!(!affordances.toggle_microphone);
}

#[test]
fn test_generate_requires_selection() {
    let mut with_selection = inputs();
    with_selection.has_selection = true;
    assert!(Affordances::from_inputs(&with_selection).generate);

    with_selection.state = WorkflowState::Generating;
    let affordances = Affordances::from_inputs(&with_selection);
    assert!(!affordances.generate);
    assert!(!affordances.edit_scripts);
}

#[test]
fn test_recording_affordances() {
    let mut recording = inputs();
    recording.state = WorkflowState::Recording;
    recording.connection = ConnectionState::Connected;
    recording.has_scripts = true;
    recording.current_slide = 5;

    let affordances = Affordances::from_inputs(&recording);
    assert!(!affordances.start_walkthrough);
    assert!(affordances.stop_walkthrough);
    assert!(!affordances.play);
    assert!(affordances.toggle_microphone);
    assert!(affordances.previous_slide);
    assert!(!affordances.next_slide);
}

#[test]
fn test_share_and_save_affordances() {
    let mut reviewing = inputs();
    reviewing.state = WorkflowState::Reviewing;
    reviewing.has_scripts = true;
    reviewing.scripts_dirty = true;

    let affordances = Affordances::from_inputs(&reviewing);
    assert!(affordances.share);
    assert!(affordances.play);
    assert!(affordances.edit_scripts);
    assert!(affordances.save_scripts);
}

#[tokio::test(start_paused = true)]
async fn test_edit_connect_waits_for_auth_token() {
    let (session, transport, backend) = common::started_session(AgentRole::Edit).await;

    assert!(session.start_walkthrough().await.unwrap().is_none());
    assert_eq!(session.workflow_state().await, WorkflowState::Idle);
    assert!(transport.joins().await.is_empty());

    session.set_auth_token(Some("opaque-token".to_string())).await;
    assert_eq!(backend.token().as_deref(), Some("opaque-token"));

    let change = session.start_walkthrough().await.unwrap().unwrap();
    assert_eq!(change.to, WorkflowState::Recording);
    let joins = transport.joins().await;
    assert_eq!(joins.len(), 1);
    assert_eq!(joins[0].room, "deck-1");
    assert_eq!(joins[0].role, AgentRole::Edit);
}

#[tokio::test(start_paused = true)]
async fn test_stop_walkthrough_disconnects_and_discovers() {
    let (session, transport, backend) = common::started_session(AgentRole::Edit).await;
    session.set_auth_token(Some("t".to_string())).await;
    session.start_walkthrough().await.unwrap();
    sleep(Duration::from_millis(50)).await;
    assert!(!session.info_overlay_visible());
    assert!(transport.current_state().is_connected());

    let calls_before = backend.list_calls();
    backend.set_walkthroughs(vec![common::walkthrough(1, 0)]);
    let change = session.stop_walkthrough().await.unwrap().unwrap();
    assert_eq!(change.to, WorkflowState::Idle);
    sleep(Duration::from_secs(1)).await;

    assert_eq!(transport.current_state(), ConnectionState::Disconnected);
    assert!(session.info_overlay_visible());
    assert!(backend.list_calls() > calls_before);
    assert_eq!(session.selected_walkthrough().await, Some(1));
}

#[tokio::test(start_paused = true)]
async fn test_start_walkthrough_while_viewing_is_ignored() {
    let (session, transport, _backend) = common::started_session(AgentRole::View).await;
    session.set_auth_token(Some("t".to_string())).await;
    assert_eq!(session.play().await.unwrap(), ConnectOutcome::Requested);
    sleep(Duration::from_millis(50)).await;

    assert!(session.start_walkthrough().await.unwrap().is_none());
    assert_eq!(session.workflow_state().await, WorkflowState::Idle);

    let joins = transport.joins().await;
    assert_eq!(joins.len(), 1);
    assert_eq!(joins[0].role, AgentRole::View);
    assert!(transport.current_state().is_connected());
}

#[tokio::test(start_paused = true)]
async fn test_generate_while_recording_ends_the_session() {
    let (session, transport, backend) = common::started_session(AgentRole::Edit).await;
    session.set_auth_token(Some("t".to_string())).await;
    session.select_walkthrough(Some(3)).await;
    backend.set_generate_result(Ok(common::scripts(&[("1", "Generated")])));
    session.start_walkthrough().await.unwrap();
    sleep(Duration::from_millis(50)).await;
    assert!(transport.current_state().is_connected());

    let calls_before = backend.list_calls();
    backend.set_walkthroughs(vec![common::walkthrough(3, 5), common::walkthrough(4, 0)]);
    assert_eq!(
        session.generate().await.unwrap(),
        GenerateOutcome::Generated { slides: 1 }
    );
    assert_eq!(backend.generate_calls(), vec![3]);
    sleep(Duration::from_secs(1)).await;

    assert_eq!(session.workflow_state().await, WorkflowState::Reviewing);
    assert_eq!(transport.current_state(), ConnectionState::Disconnected);
    assert!(session.info_overlay_visible());
    assert!(backend.list_calls() > calls_before);
    assert_eq!(session.catalog().await.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_connection_ends_recording() {
    let (session, transport, _backend) = common::started_session(AgentRole::Edit).await;
    session.set_auth_token(Some("t".to_string())).await;
    session.start_walkthrough().await.unwrap();
    sleep(Duration::from_millis(50)).await;

    transport.set_state(ConnectionState::Disconnected);
    sleep(Duration::from_millis(50)).await;

    assert_eq!(session.workflow_state().await, WorkflowState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_microphone_defaults_follow_role() {
    let (editor, editor_transport, _) = common::started_session(AgentRole::Edit).await;
    editor.set_auth_token(Some("t".to_string())).await;
    editor.start_walkthrough().await.unwrap();
    sleep(Duration::from_millis(50)).await;
    assert!(editor.status().await.microphone_enabled);

    let (viewer, _, _) = common::started_session(AgentRole::View).await;
    assert_eq!(viewer.play().await.unwrap(), ConnectOutcome::Requested);
    sleep(Duration::from_millis(50)).await;
    assert!(!viewer.status().await.microphone_enabled);
    assert_eq!(viewer.play().await.unwrap(), ConnectOutcome::AlreadyConnected);

    editor.teardown().await;
    assert_eq!(editor_transport.current_state(), ConnectionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn test_agent_config_is_mirrored_on_connect() {
    let (session, transport, backend) = common::started_session(AgentRole::View).await;
    let mut config = walkthrough_sync::AgentConfig::default();
    config.personality = "friendly".to_string();
    backend.set_agent_config(config);
    session.agent().load().await.unwrap();

    session.play().await.unwrap();
    sleep(Duration::from_millis(50)).await;

    let mirrored = transport
        .sent_envelopes()
        .await
        .into_iter()
        .find_map(|envelope| match envelope {
            walkthrough_sync::Envelope::AgentConfig(message) => Some(message),
            _ => None,
        })
        .unwrap();
    assert_eq!(mirrored.agent_config.personality, "friendly");
    assert_eq!(mirrored.brdge_id, "deck-1");
    assert_eq!(mirrored.user_id.as_deref(), Some("anon_test"));
}
