use walkthrough_sync::channel::{
    codec, DataPacket, DecodeError, Envelope, ScriptsUpdated, SlideUpdate,
    TranscriptPositionBody, TranscriptPositionMessage,
};
use walkthrough_sync::AgentRole;

#[test]
fn test_slide_update_wire_shape() {
    let envelope = Envelope::SlideUpdate(SlideUpdate {
        brdge_id: "42".to_string(),
        num_slides: 12,
        api_base_url: "https://api.test".to_string(),
        current_slide: 3,
        slide_url: "https://api.test/brdges/42/slides/3".to_string(),
        agent_type: AgentRole::Edit,
        user_id: Some("user-7".to_string()),
    });

    let json: serde_json::Value = serde_json::from_slice(&codec::encode(&envelope).unwrap()).unwrap();
    assert_eq!(json["type"], "SLIDE_UPDATE");
    assert_eq!(json["brdgeId"], "42");
    assert_eq!(json["numSlides"], 12);
    assert_eq!(json["apiBaseUrl"], "https://api.test");
    assert_eq!(json["currentSlide"], 3);
    assert_eq!(json["slideUrl"], "https://api.test/brdges/42/slides/3");
    assert_eq!(json["agentType"], "edit");
    assert_eq!(json["userId"], "user-7");
    assert_eq!(envelope.topic(), "slide_updates");
}

#[test]
fn test_scripts_updated_decodes() {
    let json = br#"{"type":"SCRIPTS_UPDATED","brdgeId":"42","timestamp":1714550400000}"#;
    let envelope = codec::decode(json).unwrap();
    assert_eq!(
        envelope,
        Envelope::ScriptsUpdated(ScriptsUpdated {
            brdge_id: "42".to_string(),
            timestamp: 1_714_550_400_000,
        })
    );
    assert_eq!(envelope.kind(), "SCRIPTS_UPDATED");
}

#[test]
fn test_walkthrough_completed_ignores_extra_fields() {
    let json = br#"{"type":"WALKTHROUGH_COMPLETED","walkthrough_id":9}"#;
    let envelope = codec::decode(json).unwrap();
    assert!(matches!(envelope, Envelope::WalkthroughCompleted(_)));
    assert_eq!(envelope.topic(), "walkthrough_completed");
}

#[test]
fn test_any_frame_on_completion_topic_is_the_signal() {
    let packet = DataPacket::new("walkthrough_completed", b"not even json".to_vec());
    let envelope = codec::decode_packet(&packet).unwrap();
    assert!(matches!(envelope, Envelope::WalkthroughCompleted(_)));
}

#[test]
fn test_tagless_transcript_position_is_inferred() {
    let json = br#"{"transcript_position":{"read":["Hello"],"remaining":["World"]}}"#;
    let envelope = codec::decode(json).unwrap();
    assert_eq!(
        envelope,
        Envelope::TranscriptPosition(TranscriptPositionMessage {
            transcript_position: TranscriptPositionBody {
                read: vec!["Hello".to_string()],
                remaining: vec!["World".to_string()],
            },
        })
    );
}

#[test]
fn test_tagless_agent_config_is_inferred() {
    let json = br#"{"agent_config":{"personality":"calm"},"user_id":null,"brdge_id":"42"}"#;
    match codec::decode(json).unwrap() {
        Envelope::AgentConfig(message) => {
            assert_eq!(message.agent_config.personality, "calm");
            assert_eq!(message.brdge_id, "42");
            assert!(message.user_id.is_none());
        }
        other => panic!("unexpected envelope: {:?}", other),
    }
}

#[test]
fn test_malformed_json_is_rejected() {
    assert!(matches!(codec::decode(b"{not json"), Err(DecodeError::Malformed(_))));
}

#[test]
fn test_non_object_is_rejected() {
    assert!(matches!(codec::decode(b"[1,2,3]"), Err(DecodeError::NotAnObject)));
}

#[test]
fn test_unknown_type_is_rejected() {
    match codec::decode(br#"{"type":"SELF_DESTRUCT"}"#) {
        Err(DecodeError::UnknownType(kind)) => assert_eq!(kind, "SELF_DESTRUCT"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_missing_type_without_known_payload_is_rejected() {
    assert!(matches!(
        codec::decode(br#"{"hello":"world"}"#),
        Err(DecodeError::MissingType)
    ));
}

#[test]
fn test_known_type_with_bad_body_is_rejected() {
    match codec::decode(br#"{"type":"SLIDE_UPDATE","currentSlide":"three"}"#) {
        Err(DecodeError::InvalidBody { kind, .. }) => assert_eq!(kind, "SLIDE_UPDATE"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_decode_or_drop_discards_garbage() {
    let packet = DataPacket::new("slide_updates", b"\xff\xfe".to_vec());
    assert!(codec::decode_or_drop(&packet).is_none());
}
