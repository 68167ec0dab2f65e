//! Reference to a subscribed remote track.

use std::{fmt, rc::Rc};

use crate::platform;

/// Reference to a remote track: the owning peer's identity, the
/// publication it came from and the live platform track.
///
/// Unlike [`local::Track`], dropping a remote reference never releases the
/// underlying media — delivery is controlled through the publication's
/// subscription state.
///
/// [`local::Track`]: super::local::Track
#[derive(Clone)]
pub struct Track {
    /// Identity of the peer owning the referenced publication.
    owner: String,

    /// Publication the referenced track belongs to.
    publication: Rc<dyn platform::Publication>,

    /// Live platform track of the publication.
    track: Rc<dyn platform::MediaTrack>,
}

impl Track {
    /// Creates a new remote [`Track`] reference.
    #[inline]
    #[must_use]
    pub fn new(
        owner: String,
        publication: Rc<dyn platform::Publication>,
        track: Rc<dyn platform::MediaTrack>,
    ) -> Self {
        Self {
            owner,
            publication,
            track,
        }
    }

    /// Returns identity of the peer owning the referenced publication.
    #[inline]
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Returns logical name of the referenced publication, falling back to
    /// its SID when the publisher didn't provide one.
    #[inline]
    #[must_use]
    pub fn name(&self) -> String {
        self.publication
            .name()
            .unwrap_or_else(|| self.publication.sid())
    }

    /// Returns the publication the referenced track belongs to.
    #[inline]
    #[must_use]
    pub fn publication(&self) -> Rc<dyn platform::Publication> {
        Rc::clone(&self.publication)
    }

    /// Returns the live platform track.
    #[inline]
    #[must_use]
    pub fn platform_track(&self) -> Rc<dyn platform::MediaTrack> {
        Rc::clone(&self.track)
    }
}

impl fmt::Debug for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("remote::Track")
            .field("owner", &self.owner)
            .field("name", &self.name())
            .finish()
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.track, &other.track)
    }
}
