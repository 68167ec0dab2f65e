//! Client-side media session layer for voice/video agent interfaces.
//!
//! Decides, for a single user session, which video source is shown, which
//! audio sources are played, and how incoming chat/transcription events
//! are merged into one ordered conversation log. Actual capture and
//! transport are delegated to an external real-time media platform,
//! reached through the [`platform`] traits.

#![allow(clippy::module_name_repetitions)]

pub mod conf;
pub mod media;
pub mod platform;
pub mod session;
pub mod transcript;

#[doc(inline)]
pub use self::{
    conf::{
        AudioExclusionPolicy, SessionConfig, SourceDescriptor, SourceKind,
    },
    media::{
        track::TrackHandle, AudioTrackFilter, AvatarTrackPicker, MediaKind,
        RemoteTrackEntry, RemoteTrackRegistry, SelectedTrackStore,
        SelectionPhase, SelectionState, SourceError, SourceOption,
        VideoSourceSelector,
    },
    session::{HandleDetachedError, MediaSession, SessionHandle},
    transcript::{
        ChatMessage, ParticipantDirectory, ParticipantRef, TranscriptEntry,
        TranscriptMerger, TranscriptionSegment,
    },
};
