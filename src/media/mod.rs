//! Video source selection, remote track indexing and audio filtering.

pub mod audio;
pub mod avatar;
pub mod registry;
pub mod selector;
pub mod store;
pub mod track;

use derive_more::Display;

#[doc(inline)]
pub use self::{
    audio::AudioTrackFilter,
    avatar::AvatarTrackPicker,
    registry::{RemoteTrackEntry, RemoteTrackRegistry},
    selector::{SourceOption, VideoSourceSelector},
    store::{
        SelectedTrackStore, SelectionPhase, SelectionState, SourceError,
    },
    track::TrackHandle,
};

/// [MediaStreamTrack.kind][1] representation.
///
/// [1]: https://w3.org/TR/mediacapture-streams/#dfn-kind
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum MediaKind {
    /// Audio track.
    #[display(fmt = "audio")]
    Audio,

    /// Video track.
    #[display(fmt = "video")]
    Video,
}
