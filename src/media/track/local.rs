//! Local video capture track.

use std::{fmt, rc::Rc};

use crate::platform;

/// Strongly owned handle to a local capture track.
///
/// Stopping it releases the underlying capture device.
#[derive(Clone)]
pub struct Track(Rc<dyn platform::MediaTrack>);

impl Track {
    /// Creates a new [`Track`] from the provided platform capture track.
    #[inline]
    #[must_use]
    pub fn new(track: Rc<dyn platform::MediaTrack>) -> Self {
        Self(track)
    }

    /// Returns unique identifier of this [`Track`].
    #[inline]
    #[must_use]
    pub fn id(&self) -> String {
        self.0.id()
    }

    /// Returns the underlying platform track.
    #[inline]
    #[must_use]
    pub fn platform_track(&self) -> Rc<dyn platform::MediaTrack> {
        Rc::clone(&self.0)
    }

    /// Stops this [`Track`], releasing the capture device.
    #[inline]
    pub fn stop(&self) {
        self.0.stop();
    }
}

impl fmt::Debug for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("local::Track").field(&self.0.id()).finish()
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
