//! Live index of remote video tracks advertised by peers.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::{media::MediaKind, platform};

/// Snapshot of one remote video track known to the
/// [`RemoteTrackRegistry`].
#[derive(Clone)]
pub struct RemoteTrackEntry {
    /// Logical name of the track (publication name, falling back to SID).
    pub name: String,

    /// Platform-assigned stable identifier.
    pub sid: String,

    /// Identity of the peer owning the publication.
    pub owner: String,

    /// Indicator whether media of the track is currently being delivered.
    pub is_subscribed: bool,

    /// The underlying publication.
    publication: Rc<dyn platform::Publication>,
}

impl RemoteTrackEntry {
    /// Returns the underlying publication of this [`RemoteTrackEntry`].
    #[inline]
    #[must_use]
    pub fn publication(&self) -> Rc<dyn platform::Publication> {
        Rc::clone(&self.publication)
    }

    /// Returns the live platform track of this [`RemoteTrackEntry`].
    ///
    /// Present only while subscribed.
    #[inline]
    #[must_use]
    pub fn platform_track(&self) -> Option<Rc<dyn platform::MediaTrack>> {
        self.publication.track()
    }
}

/// Index of remote video tracks keyed by logical name.
///
/// Driven purely by platform events: the whole index is recomputed from
/// the current peer set on every [`RemoteTrackRegistry::refresh()`] call,
/// never patched in place, so a snapshot can't mix entries from different
/// generations of the peer set.
pub struct RemoteTrackRegistry {
    /// Platform room the peer set is read from.
    room: Rc<dyn platform::Room>,

    /// Logical name to the latest known [`RemoteTrackEntry`].
    entries: RefCell<HashMap<String, RemoteTrackEntry>>,
}

impl RemoteTrackRegistry {
    /// Creates a new empty [`RemoteTrackRegistry`] reading peers from the
    /// provided room.
    #[must_use]
    pub fn new(room: Rc<dyn platform::Room>) -> Rc<Self> {
        Rc::new(Self {
            room,
            entries: RefCell::new(HashMap::new()),
        })
    }

    /// Recomputes the entire index from the current set of connected peers
    /// and their video publications.
    ///
    /// Intended to be called on every relevant platform event (peer
    /// joined/left, track published/unpublished/subscribed/unsubscribed).
    pub fn refresh(&self) {
        let mut entries = HashMap::new();
        for peer in self.room.remote_peers() {
            for publication in peer.publications(MediaKind::Video) {
                let name =
                    publication.name().unwrap_or_else(|| publication.sid());
                entries.insert(
                    name.clone(),
                    RemoteTrackEntry {
                        name,
                        sid: publication.sid(),
                        owner: peer.identity(),
                        is_subscribed: publication.is_subscribed(),
                        publication,
                    },
                );
            }
        }
        log::debug!("remote track registry: {} tracks known", entries.len());
        *self.entries.borrow_mut() = entries;
    }

    /// Looks up the [`RemoteTrackEntry`] with the provided logical name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<RemoteTrackEntry> {
        self.entries.borrow().get(name).cloned()
    }

    /// Requests delivery of the remote track with the provided logical
    /// name.
    ///
    /// Idempotent: returns `true` immediately if the track is already
    /// subscribed. Subscription failures are reported as `false`, never
    /// escalated.
    pub async fn subscribe(&self, name: &str) -> bool {
        self.set_subscribed(name, true).await
    }

    /// Stops delivery of the remote track with the provided logical name.
    ///
    /// Idempotent: returns `true` immediately if the track is already
    /// unsubscribed. Failures are reported as `false`, never escalated.
    pub async fn unsubscribe(&self, name: &str) -> bool {
        self.set_subscribed(name, false).await
    }

    async fn set_subscribed(&self, name: &str, subscribed: bool) -> bool {
        let entry = match self.lookup(name) {
            Some(entry) => entry,
            None => {
                log::warn!("remote track `{}` is not known", name);
                return false;
            }
        };
        if entry.is_subscribed == subscribed {
            return true;
        }
        match entry.publication.set_subscribed(subscribed).await {
            Ok(()) => {
                self.refresh();
                true
            }
            Err(e) => {
                log::error!(
                    "failed to set subscription state of remote track \
                     `{}`: {}",
                    name,
                    e,
                );
                false
            }
        }
    }
}
