//! Local and remote media track handles.

pub mod local;
pub mod remote;

use derive_more::From;

/// Handle to the currently previewed media track.
///
/// The distinction between a local capture track and a remote track
/// reference is an explicit tagged union, never inferred from the shape of
/// the underlying platform object.
#[derive(Clone, Debug, From, PartialEq)]
pub enum TrackHandle {
    /// Local capture track.
    Local(local::Track),

    /// Reference to a subscribed remote track.
    Remote(remote::Track),
}

impl TrackHandle {
    /// Indicates whether this [`TrackHandle`] references a local capture
    /// track.
    #[inline]
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }
}
