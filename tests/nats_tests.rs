use base64::Engine;
use voice_stitch::nats::messages::{InboundContent, InboundMessage, OutboundMessage};
use voice_stitch::{EventKind, OfferedAction, OutboundInstruction, Replies, UserId};

#[test]
fn test_voice_message_becomes_fragment() {
    let json = format!(
        r#"{{
            "user_id": "123456",
            "message_id": 88,
            "kind": "voice",
            "audio": "{}"
        }}"#,
        base64::engine::general_purpose::STANDARD.encode(b"opus bytes")
    );

    let msg: InboundMessage = serde_json::from_str(&json).unwrap();
    let event = msg.into_event(&Replies::default()).unwrap().unwrap();

    assert_eq!(event.user_id.as_str(), "123456");
    match event.kind {
        EventKind::AudioFragment(payload) => {
            assert_eq!(payload.fragment_id, "voice_88.ogg");
            assert_eq!(payload.bytes, b"opus bytes");
            assert_eq!(payload.format_hint.as_extension(), Some("ogg"));
        }
        other => panic!("expected fragment, got {:?}", other),
    }
}

#[test]
fn test_audio_message_uses_file_name() {
    let msg = InboundMessage {
        user_id: UserId::parse("1").unwrap(),
        message_id: 3,
        content: InboundContent::Audio {
            audio: base64::engine::general_purpose::STANDARD.encode([0u8; 4]),
            file_name: Some("song.mp3".to_string()),
        },
    };

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"kind\":\"audio\""));

    let event = msg.into_event(&Replies::default()).unwrap().unwrap();
    match event.kind {
        EventKind::AudioFragment(payload) => {
            assert_eq!(payload.format_hint.as_extension(), Some("mp3"));
            assert_eq!(payload.fragment_id, "song.mp3");
        }
        other => panic!("expected fragment, got {:?}", other),
    }
}

#[test]
fn test_text_routing_and_unknown_text() {
    let replies = Replies::default();

    let start: InboundMessage = serde_json::from_str(
        r#"{ "user_id": "1", "message_id": 1, "kind": "text", "text": "/start" }"#,
    )
    .unwrap();
    assert!(matches!(
        start.into_event(&replies).unwrap().unwrap().kind,
        EventKind::Start
    ));

    let chatter: InboundMessage = serde_json::from_str(
        r#"{ "user_id": "1", "message_id": 2, "kind": "text", "text": "hi there" }"#,
    )
    .unwrap();
    assert!(chatter.into_event(&replies).unwrap().is_none());
}

#[test]
fn test_bad_base64_rejected() {
    let msg: InboundMessage = serde_json::from_str(
        r#"{ "user_id": "1", "message_id": 1, "kind": "voice", "audio": "%%%" }"#,
    )
    .unwrap();

    assert!(msg.into_event(&Replies::default()).is_err());
}

#[test]
fn test_invalid_user_id_rejected() {
    let result = serde_json::from_str::<InboundMessage>(
        r#"{ "user_id": "../../tmp", "message_id": 1, "kind": "text", "text": "/start" }"#,
    );

    assert!(result.is_err());
}

#[test]
fn test_outbound_message_serialization() {
    let replies = Replies::default();
    let instruction = OutboundInstruction::text("done")
        .with_artifact(vec![1, 2, 3])
        .with_actions([OfferedAction::StartOver, OfferedAction::AddMore]);

    let msg = OutboundMessage::new(&UserId::parse("77").unwrap(), instruction, &replies);
    let json = serde_json::to_string(&msg).unwrap();

    assert!(json.contains("\"user_id\":\"77\""));
    assert!(json.contains("\"add_more\""));
    assert_eq!(msg.actions, vec![OfferedAction::AddMore, OfferedAction::StartOver]);
    assert_eq!(msg.buttons, vec!["Add another fragment", "Start over"]);
    assert_eq!(
        msg.audio.as_deref(),
        Some(base64::engine::general_purpose::STANDARD.encode([1u8, 2, 3]).as_str())
    );
}
