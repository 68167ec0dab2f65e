//! Tests of the session's platform event processing.

use calliope::{
    AudioExclusionPolicy, MediaKind, MediaSession, SessionConfig,
};

use crate::mock::{
    FakeDevices, FakeOutput, FakePeer, FakePublication, FakeRoom,
};

fn session(room: &FakeRoom, auto_unsubscribe: bool) -> MediaSession {
    MediaSession::new(
        room.as_platform(),
        FakeDevices::without_devices().as_platform(),
        FakeOutput::new().as_platform(),
        SessionConfig {
            exclude_audio: AudioExclusionPolicy::new(vec![
                "svc_audio_track".to_owned(),
            ]),
            auto_unsubscribe,
            ..SessionConfig::default()
        },
    )
}

#[tokio::test]
async fn run_drains_the_platform_event_queue() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let room = FakeRoom::new("alice");
            let peer = FakePeer::new("bob", true);
            room.add_peer(peer.clone());
            let session = session(&room, true);

            tokio::task::spawn_local(session.run());

            let publication = FakePublication::subscribed(
                "TR_A",
                Some("svc_audio_track"),
                MediaKind::Audio,
            );
            peer.add_publication(publication.clone());
            room.fire(calliope::platform::Event::TrackPublished {
                peer: peer.as_platform(),
                publication: publication.as_platform(),
            });

            for _ in 0..10 {
                tokio::task::yield_now().await;
                if !publication.is_subscribed_now() {
                    break;
                }
            }
            assert!(!publication.is_subscribed_now());
        })
        .await;
}

#[tokio::test]
async fn run_ends_when_the_session_is_dropped() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let room = FakeRoom::new("alice");
            let session = session(&room, false);

            let handle = tokio::task::spawn_local(session.run());
            drop(session);

            let peer = FakePeer::new("bob", false);
            room.fire(calliope::platform::Event::PeerConnected {
                peer: peer.as_platform(),
            });

            handle.await.unwrap();
        })
        .await;
}

#[tokio::test]
async fn handle_detaches_when_the_session_is_dropped() {
    let room = FakeRoom::new("alice");
    let session = session(&room, false);
    let handle = session.new_handle();

    assert!(handle.selection().is_ok());
    handle
        .push_chat(calliope::ChatMessage {
            id: "c1".to_owned(),
            timestamp: 1,
            text: "hello".to_owned(),
            sender: Some("alice".to_owned()),
            edit_timestamp: None,
        })
        .unwrap();
    assert_eq!(handle.transcript_entries().unwrap().len(), 1);

    drop(session);

    assert!(handle.selection().is_err());
    assert!(handle.transcript_entries().is_err());
    assert!(handle.select_source("cam1".to_owned()).await.is_err());
}

#[tokio::test]
async fn peer_events_keep_the_participant_directory_current() {
    let room = FakeRoom::new("alice");
    let session = session(&room, false);

    let peer = FakePeer::new("agent-1", true);
    room.add_peer(peer.clone());
    session
        .handle_event(calliope::platform::Event::PeerConnected {
            peer: peer.as_platform(),
        })
        .await;
    assert_eq!(
        session.participants().remotes(),
        vec!["agent-1".to_owned()],
    );

    room.remove_peer("agent-1");
    session
        .handle_event(calliope::platform::Event::PeerDisconnected {
            identity: "agent-1".to_owned(),
        })
        .await;
    assert!(session.participants().remotes().is_empty());
}
