//! Tests of the remote track registry.

use calliope::{MediaKind, RemoteTrackRegistry};

use crate::mock::{FakePeer, FakePublication, FakeRoom};

fn room_with_peer() -> (FakeRoom, FakePeer) {
    let room = FakeRoom::new("alice");
    let peer = FakePeer::new("bob", false);
    room.add_peer(peer.clone());
    (room, peer)
}

#[tokio::test]
async fn refresh_indexes_video_publications_by_name() {
    let (room, peer) = room_with_peer();
    peer.add_publication(FakePublication::new(
        "TR_1",
        Some("face_cam"),
        MediaKind::Video,
    ));
    peer.add_publication(FakePublication::new("TR_2", None, MediaKind::Video));
    peer.add_publication(FakePublication::new(
        "TR_3",
        Some("mic"),
        MediaKind::Audio,
    ));

    let registry = RemoteTrackRegistry::new(room.as_platform());
    registry.refresh();

    let entry = registry.lookup("face_cam").unwrap();
    assert_eq!(entry.sid, "TR_1");
    assert_eq!(entry.owner, "bob");
    assert!(!entry.is_subscribed);

    // unnamed publications fall back to their SID
    assert!(registry.lookup("TR_2").is_some());

    // audio publications are not indexed
    assert!(registry.lookup("mic").is_none());
}

#[tokio::test]
async fn refresh_replaces_the_index_wholesale() {
    let (room, peer) = room_with_peer();
    peer.add_publication(FakePublication::new(
        "TR_1",
        Some("face_cam"),
        MediaKind::Video,
    ));

    let registry = RemoteTrackRegistry::new(room.as_platform());
    registry.refresh();
    assert!(registry.lookup("face_cam").is_some());

    peer.remove_publication("TR_1");
    registry.refresh();
    assert!(registry.lookup("face_cam").is_none());
}

#[tokio::test]
async fn subscribe_is_idempotent() {
    let (room, peer) = room_with_peer();
    let publication =
        FakePublication::new("TR_1", Some("face_cam"), MediaKind::Video);
    peer.add_publication(publication.clone());

    let registry = RemoteTrackRegistry::new(room.as_platform());
    registry.refresh();

    assert!(registry.subscribe("face_cam").await);
    assert!(registry.subscribe("face_cam").await);

    // exactly one platform call, not two
    assert_eq!(publication.set_subscribed_calls(), 1);
    assert!(registry.lookup("face_cam").unwrap().is_subscribed);
}

#[tokio::test]
async fn unsubscribe_is_idempotent() {
    let (room, peer) = room_with_peer();
    let publication = FakePublication::subscribed(
        "TR_1",
        Some("face_cam"),
        MediaKind::Video,
    );
    peer.add_publication(publication.clone());

    let registry = RemoteTrackRegistry::new(room.as_platform());
    registry.refresh();

    assert!(registry.unsubscribe("face_cam").await);
    assert!(registry.unsubscribe("face_cam").await);

    assert_eq!(publication.set_subscribed_calls(), 1);
    assert!(!registry.lookup("face_cam").unwrap().is_subscribed);
}

#[tokio::test]
async fn subscribe_reports_unknown_track() {
    let (room, _peer) = room_with_peer();
    let registry = RemoteTrackRegistry::new(room.as_platform());
    registry.refresh();

    assert!(!registry.subscribe("nonexistent").await);
}

#[tokio::test]
async fn subscribe_reports_platform_failure() {
    let (room, peer) = room_with_peer();
    let publication =
        FakePublication::new("TR_1", Some("face_cam"), MediaKind::Video);
    publication.set_fail_set_subscribed(true);
    peer.add_publication(publication.clone());

    let registry = RemoteTrackRegistry::new(room.as_platform());
    registry.refresh();

    assert!(!registry.subscribe("face_cam").await);
    assert!(!publication.is_subscribed_now());
}
