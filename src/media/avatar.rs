//! Avatar video track picking.

use std::rc::Rc;

use crate::{
    conf::{SourceDescriptor, SourceKind},
    media::{track::remote, MediaKind},
    platform,
};

/// Picks the remote video track used as the agent's avatar.
///
/// Tracks reserved by [`SourceKind::RemotePublished`] descriptors are
/// dedicated to the selectable preview and never used as an avatar: the
/// platform-suggested track is taken when it is not reserved, otherwise
/// the first subscribed, non-reserved video track of an agent peer.
pub struct AvatarTrackPicker {
    /// Platform room the peer set is read from.
    room: Rc<dyn platform::Room>,

    /// Remote names reserved by the configured video sources.
    reserved: Vec<String>,
}

impl AvatarTrackPicker {
    /// Creates a new [`AvatarTrackPicker`] reserving the remote names of
    /// the provided descriptors.
    #[must_use]
    pub fn new(
        room: Rc<dyn platform::Room>,
        sources: &[SourceDescriptor],
    ) -> Self {
        let reserved = sources
            .iter()
            .filter(|d| d.enabled && d.kind == SourceKind::RemotePublished)
            .map(|d| d.remote_key().to_owned())
            .collect();
        Self { room, reserved }
    }

    /// Indicates whether a track with the provided name is reserved by a
    /// configured video source.
    #[must_use]
    pub fn is_reserved(&self, track_name: &str) -> bool {
        self.reserved.iter().any(|name| {
            track_name == name
                || track_name.contains(name.as_str())
                || name.contains(track_name)
        })
    }

    /// Picks the avatar video track.
    ///
    /// Prefers the provided platform-suggested track when it is not
    /// reserved; falls back to the first subscribed, non-reserved video
    /// track of an agent peer.
    #[must_use]
    pub fn pick(
        &self,
        suggested: Option<remote::Track>,
    ) -> Option<remote::Track> {
        if let Some(track) = suggested {
            if !self.is_reserved(&track.name()) {
                return Some(track);
            }
            log::debug!("suggested avatar track `{}` is reserved", track.name());
        }

        for peer in self.room.remote_peers() {
            if !peer.is_agent() {
                continue;
            }
            for publication in peer.publications(MediaKind::Video) {
                if !publication.is_subscribed() {
                    continue;
                }
                let track = match publication.track() {
                    Some(track) => track,
                    None => continue,
                };
                let name =
                    publication.name().unwrap_or_else(|| publication.sid());
                if self.is_reserved(&name) {
                    continue;
                }
                return Some(remote::Track::new(
                    peer.identity(),
                    publication,
                    track,
                ));
            }
        }
        None
    }
}
