//! Tests of avatar video track picking.

use calliope::{
    media::track::remote, AvatarTrackPicker, MediaKind, SourceDescriptor,
    SourceKind,
};

use crate::mock::{FakePeer, FakePublication, FakeRoom};

fn reserved_source(remote_name: &str) -> SourceDescriptor {
    SourceDescriptor {
        id: "rt1".to_owned(),
        label: "Preview".to_owned(),
        icon: None,
        description: None,
        kind: SourceKind::RemotePublished,
        remote_name: Some(remote_name.to_owned()),
        enabled: true,
    }
}

fn remote_track(owner: &str, publication: &FakePublication) -> remote::Track {
    remote::Track::new(
        owner.to_owned(),
        publication.as_platform(),
        publication.fake_track(),
    )
}

#[tokio::test]
async fn suggested_track_wins_when_not_reserved() {
    let room = FakeRoom::new("alice");
    let picker =
        AvatarTrackPicker::new(room.as_platform(), &[reserved_source("detector")]);

    let publication =
        FakePublication::subscribed("TR_1", Some("avatar_feed"), MediaKind::Video);
    let suggested = remote_track("bob", &publication);

    let picked = picker.pick(Some(suggested.clone())).unwrap();
    assert_eq!(picked, suggested);
}

#[tokio::test]
async fn reserved_suggestion_falls_back_to_agent_track() {
    let room = FakeRoom::new("alice");
    let agent = FakePeer::new("agent-1", true);
    let reserved = FakePublication::subscribed(
        "TR_1",
        Some("detector_feed"),
        MediaKind::Video,
    );
    let fallback =
        FakePublication::subscribed("TR_2", Some("avatar_feed"), MediaKind::Video);
    agent.add_publication(reserved.clone());
    agent.add_publication(fallback.clone());
    room.add_peer(agent);

    let picker = AvatarTrackPicker::new(
        room.as_platform(),
        &[reserved_source("detector_feed")],
    );

    let picked = picker.pick(Some(remote_track("agent-1", &reserved))).unwrap();
    assert_eq!(picked.name(), "avatar_feed");
    assert_eq!(picked.owner(), "agent-1");
}

#[tokio::test]
async fn non_agent_and_unsubscribed_tracks_are_skipped() {
    let room = FakeRoom::new("alice");

    let human = FakePeer::new("carol", false);
    human.add_publication(FakePublication::subscribed(
        "TR_1",
        Some("webcam"),
        MediaKind::Video,
    ));
    room.add_peer(human);

    let agent = FakePeer::new("agent-1", true);
    agent.add_publication(FakePublication::new(
        "TR_2",
        Some("avatar_feed"),
        MediaKind::Video,
    ));
    room.add_peer(agent);

    let picker = AvatarTrackPicker::new(room.as_platform(), &[]);

    assert!(picker.pick(None).is_none());
}
