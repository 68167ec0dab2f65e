//! Session-scoped shared state of the current video selection.

use std::rc::Rc;

use derive_more::Display;
use futures::stream::LocalBoxStream;
use medea_reactive::ObservableCell;

use crate::media::track::TrackHandle;

/// Failure of a video source switch.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum SourceError {
    /// Descriptor or remote track is absent.
    #[display(fmt = "video source `{}` is not found", _0)]
    NotFound(String),

    /// Platform refused to subscribe to the remote track.
    #[display(fmt = "failed to subscribe to remote track `{}`", _0)]
    SubscriptionFailed(String),

    /// Platform refused to publish the local track.
    #[display(fmt = "failed to publish local track `{}`: {}", _0, _1)]
    PublishFailed(String, String),

    /// Local capture device could not be acquired.
    #[display(fmt = "video capture device is unavailable: {}", _0)]
    DeviceUnavailable(String),
}

/// Phase of the [`VideoSourceSelector`]'s state machine.
///
/// [`VideoSourceSelector`]: crate::media::VideoSourceSelector
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SelectionPhase {
    /// No selection.
    Idle,

    /// Asynchronous switch is in flight.
    Switching,

    /// Selection is attached and rendering.
    Active,

    /// Selection was attempted and failed; the descriptor ID is retained,
    /// no handle is attached.
    Failed,
}

/// State of the current video selection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectionState {
    /// Identifier of the currently selected source descriptor.
    pub selected_id: Option<String>,

    /// Currently attached preview handle.
    ///
    /// Non-`None` only when [`SelectionState::selected_id`] resolved to an
    /// available, successfully attached source.
    pub active_handle: Option<TrackHandle>,

    /// Indicator whether an asynchronous switch is in flight.
    pub pending: bool,

    /// Failure of the most recent switch.
    ///
    /// Cleared explicitly by an acknowledgement, or by the next switch.
    pub last_error: Option<SourceError>,
}

impl SelectionState {
    /// Returns the [`SelectionPhase`] this [`SelectionState`] is in.
    #[must_use]
    pub fn phase(&self) -> SelectionPhase {
        if self.pending {
            SelectionPhase::Switching
        } else if self.active_handle.is_some() {
            SelectionPhase::Active
        } else if self.selected_id.is_some() && self.last_error.is_some() {
            SelectionPhase::Failed
        } else {
            SelectionPhase::Idle
        }
    }
}

/// Observable cell holding the current [`SelectionState`].
///
/// Written only by the [`VideoSourceSelector`]; rendering collaborators
/// read the current state and subscribe to its changes. Mutation is not
/// part of the public interface, so an outside writer is impossible by
/// construction.
///
/// [`VideoSourceSelector`]: crate::media::VideoSourceSelector
pub struct SelectedTrackStore(ObservableCell<SelectionState>);

impl Default for SelectedTrackStore {
    fn default() -> Self {
        Self(ObservableCell::new(SelectionState::default()))
    }
}

impl SelectedTrackStore {
    /// Creates a new [`SelectedTrackStore`] in the idle state.
    #[inline]
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Returns the current [`SelectionState`].
    #[inline]
    #[must_use]
    pub fn get(&self) -> SelectionState {
        self.0.get()
    }

    /// Returns [`LocalBoxStream`] emitting every [`SelectionState`]
    /// change, starting with the current state.
    #[inline]
    pub fn subscribe(&self) -> LocalBoxStream<'static, SelectionState> {
        self.0.subscribe()
    }

    /// Replaces the stored [`SelectionState`].
    pub(crate) fn set(&self, state: SelectionState) {
        self.0.set(state);
    }

    /// Updates the stored [`SelectionState`] with the provided function.
    pub(crate) fn mutate<F: FnOnce(&mut SelectionState)>(&self, f: F) {
        let mut state = self.0.get();
        f(&mut state);
        self.0.set(state);
    }
}
