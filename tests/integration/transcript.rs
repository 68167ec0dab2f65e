//! Tests of transcript merging and participant attribution.

use std::rc::Rc;

use calliope::{
    ChatMessage, ParticipantDirectory, ParticipantRef, TranscriptMerger,
    TranscriptionSegment,
};

fn chat(id: &str, timestamp: u64, text: &str) -> ChatMessage {
    ChatMessage {
        id: id.to_owned(),
        timestamp,
        text: text.to_owned(),
        sender: None,
        edit_timestamp: None,
    }
}

fn segment(
    id: &str,
    timestamp: u64,
    text: &str,
    speaker: &str,
) -> TranscriptionSegment {
    TranscriptionSegment {
        id: id.to_owned(),
        timestamp,
        text: text.to_owned(),
        speaker: speaker.to_owned(),
    }
}

fn merger_with_remotes(remotes: &[&str]) -> Rc<TranscriptMerger> {
    let directory = ParticipantDirectory::new("alice".to_owned());
    for remote in remotes {
        directory.add_remote((*remote).to_owned());
    }
    TranscriptMerger::new(directory, Vec::new(), true)
}

#[tokio::test]
async fn merge_orders_by_timestamp_transcription_first_on_ties() {
    let merger = merger_with_remotes(&["agent-1"]);

    merger.push_transcription(segment("t5", 5, "five", "agent-1"));
    merger.push_transcription(segment("t10", 10, "ten", "agent-1"));
    merger.push_transcription(segment("t15", 15, "fifteen", "agent-1"));
    merger.push_chat(chat("c7", 7, "seven"));
    merger.push_chat(chat("c10", 10, "ten"));

    let ids: Vec<_> =
        merger.entries().into_iter().map(|e| e.id).collect();
    assert_eq!(ids, vec!["t5", "c7", "t10", "c10", "t15"]);
}

#[tokio::test]
async fn user_alias_identity_attributes_to_local() {
    let directory = ParticipantDirectory::new("alice".to_owned());
    directory.add_remote("svc_publisher".to_owned());
    let merger = TranscriptMerger::new(
        directory,
        vec!["svc_publisher".to_owned()],
        true,
    );

    merger.push_transcription(segment("t1", 1, "hello", "svc_publisher"));

    let entries = merger.entries();
    assert_eq!(
        entries[0].origin,
        Some(ParticipantRef::Local("alice".to_owned())),
    );
}

#[tokio::test]
async fn local_and_remote_identities_resolve_directly() {
    let merger = merger_with_remotes(&["bob"]);

    merger.push_transcription(segment("t1", 1, "hi", "alice"));
    merger.push_transcription(segment("t2", 2, "hey", "bob"));

    let entries = merger.entries();
    assert_eq!(
        entries[0].origin,
        Some(ParticipantRef::Local("alice".to_owned())),
    );
    assert_eq!(
        entries[1].origin,
        Some(ParticipantRef::Remote("bob".to_owned())),
    );
}

#[tokio::test]
async fn smart_matching_prefers_agent_looking_remote() {
    let merger = merger_with_remotes(&["camera-rig", "Agent-AB12"]);

    merger.push_chat(chat("c1", 1, "response"));

    let entries = merger.entries();
    assert_eq!(
        entries[0].origin,
        Some(ParticipantRef::Remote("Agent-AB12".to_owned())),
    );
}

#[tokio::test]
async fn smart_matching_falls_back_to_first_remote() {
    let merger = merger_with_remotes(&["camera-rig", "recorder"]);

    merger.push_chat(chat("c1", 1, "response"));

    let entries = merger.entries();
    assert_eq!(
        entries[0].origin,
        Some(ParticipantRef::Remote("camera-rig".to_owned())),
    );
}

#[tokio::test]
async fn unresolved_items_are_still_appended() {
    let directory = ParticipantDirectory::new("alice".to_owned());
    let merger = TranscriptMerger::new(directory, Vec::new(), false);

    merger.push_chat(chat("c1", 1, "orphan"));
    merger.push_transcription(segment("t1", 2, "ghost", "unknown"));

    let entries = merger.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].origin, None);
    assert_eq!(entries[1].origin, None);
}

#[tokio::test]
async fn chat_edit_updates_text_and_flag_but_keeps_order() {
    let merger = merger_with_remotes(&["agent-1"]);

    merger.push_chat(chat("c1", 10, "original"));
    merger.push_chat(chat("c2", 20, "later"));

    let mut edit = chat("c1", 10, "corrected");
    edit.edit_timestamp = Some(30);
    merger.push_chat(edit);

    let entries = merger.entries();
    assert_eq!(entries[0].id, "c1");
    assert_eq!(entries[0].text, "corrected");
    assert!(entries[0].edited);
    assert_eq!(entries[0].timestamp, 10);
    assert!(!entries[1].edited);
}

#[tokio::test]
async fn transcription_upsert_replaces_text_in_place() {
    let merger = merger_with_remotes(&["agent-1"]);

    merger.push_transcription(segment("t1", 5, "partial", "agent-1"));
    merger.push_transcription(segment("t1", 8, "partial sentence", "agent-1"));

    let entries = merger.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].text, "partial sentence");
    assert_eq!(entries[0].timestamp, 5);
    assert!(!entries[0].edited);
}

#[tokio::test]
async fn attribution_reflects_directory_at_arrival_time() {
    let directory = ParticipantDirectory::new("alice".to_owned());
    let merger =
        TranscriptMerger::new(Rc::clone(&directory), Vec::new(), true);

    // nobody connected yet: unresolvable even with smart matching
    merger.push_chat(chat("c1", 1, "early"));

    directory.add_remote("agent-1".to_owned());
    merger.push_chat(chat("c2", 2, "late"));

    let entries = merger.entries();
    assert_eq!(entries[0].origin, None);
    assert_eq!(
        entries[1].origin,
        Some(ParticipantRef::Remote("agent-1".to_owned())),
    );
}
