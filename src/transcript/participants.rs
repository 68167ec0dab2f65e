//! Directory of session participants.

use std::{cell::RefCell, rc::Rc};

/// Directory of the local participant's identity and the identities of
/// connected remote participants, in join order.
///
/// Queried fresh per transcript item, so attribution always reflects the
/// current connection topology.
pub struct ParticipantDirectory {
    /// Identity of the local participant.
    local: String,

    /// Identities of connected remote participants, in join order.
    remotes: RefCell<Vec<String>>,
}

impl ParticipantDirectory {
    /// Creates a new [`ParticipantDirectory`] with the provided local
    /// identity and no remote participants.
    #[must_use]
    pub fn new(local_identity: String) -> Rc<Self> {
        Rc::new(Self {
            local: local_identity,
            remotes: RefCell::new(Vec::new()),
        })
    }

    /// Returns identity of the local participant.
    #[inline]
    #[must_use]
    pub fn local(&self) -> &str {
        &self.local
    }

    /// Indicates whether the provided identity is the local participant's.
    #[inline]
    #[must_use]
    pub fn is_local(&self, identity: &str) -> bool {
        self.local == identity
    }

    /// Returns identities of connected remote participants, in join
    /// order.
    #[must_use]
    pub fn remotes(&self) -> Vec<String> {
        self.remotes.borrow().clone()
    }

    /// Records a remote participant's connection.
    ///
    /// No-op if the identity is already known.
    pub fn add_remote(&self, identity: String) {
        let mut remotes = self.remotes.borrow_mut();
        if !remotes.contains(&identity) {
            remotes.push(identity);
        }
    }

    /// Records a remote participant's disconnection.
    pub fn remove_remote(&self, identity: &str) {
        self.remotes.borrow_mut().retain(|i| i != identity);
    }
}
