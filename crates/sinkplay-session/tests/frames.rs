//! Drives a session with raw server frames, the way the client task does,
//! and checks the bytes it would write back.

use chrono::{DateTime, Utc};
use sinkplay_protocol::{Codec, JsonLineCodec};
use sinkplay_session::{
    Clock, Session, SessionConfig, SessionError, SessionEvent, SessionState,
};

struct At(i64);

impl Clock for At {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.0, 0).unwrap()
    }
}

fn connected(config: SessionConfig) -> (Session<At>, Vec<u8>) {
    let mut session = Session::with_clock(config, At(1005));
    session.begin_connect().unwrap();
    let hello = session.on_transport_connected().unwrap();
    (session, JsonLineCodec.encode(&hello).unwrap())
}

fn replies(session: &mut Session<At>, frame: &str) -> Vec<String> {
    session
        .handle_frame(frame.as_bytes())
        .unwrap()
        .replies
        .iter()
        .map(|m| String::from_utf8(JsonLineCodec.encode(m).unwrap()).unwrap())
        .collect()
}

#[test]
fn test_handshake_frames_produce_ready_then_list() {
    let (mut session, hello) =
        connected(SessionConfig::new("h", "alice", "main").with_password("password"));
    let hello = String::from_utf8(hello).unwrap();
    assert!(hello.starts_with("{\"Hello\":"));
    assert!(hello.contains("5f4dcc3b5aa765d61d8327deb882cf99"));

    let out = replies(
        &mut session,
        r#"{"Hello": {"username": "alice", "room": {"name": "main"}, "version": "1.2.255", "motd": ""}}"#,
    );
    assert_eq!(
        out,
        [
            "{\"Set\":{\"ready\":{\"isReady\":false,\"manuallyInitiated\":false}}}\r\n",
            "{\"List\":null}\r\n",
        ]
    );
    assert_eq!(session.state(), SessionState::Active);
}

#[test]
fn test_state_frame_gets_exactly_one_reply() {
    let (mut session, _) = connected(SessionConfig::new("h", "alice", "main"));
    replies(&mut session, r#"{"Hello": {"username": "alice", "room": {"name": "main"}}}"#);

    let out = replies(
        &mut session,
        r#"{"State": {"ping": {"latencyCalculation": 1000.0, "serverRtt": 0}, "playstate": {"position": 0, "paused": true}}}"#,
    );
    assert_eq!(
        out,
        ["{\"State\":{\"ping\":{\"latencyCalculation\":1000.0,\"clientLatencyCalculation\":5.0,\"clientRtt\":0.0}}}\r\n"]
    );
}

#[test]
fn test_full_room_sequence() {
    let (mut session, _) = connected(SessionConfig::new("h", "alice", "main"));
    let frames = [
        r#"{"Hello": {"username": "alice", "room": {"name": "main"}}}"#,
        r#"{"List": {"main": {"alice": {"position": 0, "isReady": false, "file": {}}, "bob": {"position": 0, "isReady": "<null>", "file": {"name": "ep1.mkv", "duration": "1432.5"}}}}}"#,
        r#"{"Set": {"user": {"carol": {"room": {"name": "main"}, "event": {"joined": true}}}}}"#,
        r#"{"Set": {"ready": {"username": "bob", "isReady": true, "manuallyInitiated": true}}}"#,
        r#"{"Chat": {"username": "bob", "message": "ready when you are"}}"#,
        r#"{"Set": {"user": {"carol": {"room": {"name": "main"}, "event": {"left": true}}}}}"#,
    ];
    for frame in frames {
        session.handle_frame(frame.as_bytes()).unwrap();
    }

    let snap = session.snapshot();
    let names: Vec<_> = snap.users.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, ["alice", "bob"]);
    let bob = snap.user("bob").unwrap();
    assert!(bob.ready);
    assert_eq!(
        bob.file.as_ref().and_then(|f| f.duration_seconds),
        Some(1432.5)
    );
    assert_eq!(snap.chat.len(), 1);
    assert_eq!(snap.chat[0].username, "bob");
}

#[test]
fn test_malformed_frame_leaves_session_usable() {
    let (mut session, _) = connected(SessionConfig::new("h", "alice", "main"));
    replies(&mut session, r#"{"Hello": {"username": "alice", "room": {"name": "main"}}}"#);

    assert!(matches!(
        session.handle_frame(br#"{"Set": {"ready": {"username": "bob", "isReady": 7}}}"#),
        Err(SessionError::Protocol(_))
    ));
    let out = session
        .handle_frame(br#"{"Error": {"message": "Wrong password"}}"#)
        .unwrap();
    assert_eq!(
        out.events,
        [SessionEvent::ServerError("Wrong password".into())]
    );
    assert_eq!(session.state(), SessionState::Active);
}
