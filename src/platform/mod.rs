//! Abstraction over the external real-time media platform.
//!
//! The platform supplies peer/track discovery events, a per-track
//! subscription primitive, a local capture factory and publish/unpublish
//! primitives. All of them are fallible and asynchronous: none of the
//! returned [`Future`]s is assumed to complete synchronously or in order.
//!
//! [`Future`]: std::future::Future

use std::{borrow::Cow, rc::Rc};

use async_trait::async_trait;
use derive_more::Display;
use futures::{future::LocalBoxFuture, stream::LocalBoxStream};

use crate::media::MediaKind;

/// Error returned from a platform primitive.
///
/// Carries only a human-readable description: the platform's own error
/// types never cross this boundary.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[display(fmt = "{}", message)]
pub struct Error {
    /// Description of this [`Error`].
    message: Cow<'static, str>,
}

impl Error {
    /// Creates a new [`Error`] with the provided description.
    #[inline]
    #[must_use]
    pub fn new<S: Into<Cow<'static, str>>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<&'static str> for Error {
    #[inline]
    fn from(message: &'static str) -> Self {
        Self::new(message)
    }
}

impl From<String> for Error {
    #[inline]
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Kind of a media input/output device.
///
/// Reflects [MediaDeviceKind][1] of the underlying platform.
///
/// [1]: https://w3.org/TR/mediacapture-streams/#dom-mediadevicekind
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MediaDeviceKind {
    /// Audio input device (microphone).
    AudioInput,

    /// Audio output device (speakers, headset).
    AudioOutput,

    /// Video input device (camera).
    VideoInput,
}

/// Information about a media input/output device.
#[derive(Clone, Debug)]
pub struct MediaDeviceInfo {
    /// Unique identifier of the represented device.
    pub device_id: String,

    /// Kind of the represented device.
    pub kind: MediaDeviceKind,

    /// Label describing the represented device (for example,
    /// "External USB Webcam").
    pub label: String,
}

/// Live media track handle provided by the platform.
///
/// Either a local capture track or the media of a subscribed remote
/// publication.
#[cfg_attr(feature = "mockable", mockall::automock)]
pub trait MediaTrack {
    /// Returns unique identifier of this track (platform SID for remote
    /// tracks, device-scoped ID for capture tracks).
    fn id(&self) -> String;

    /// Returns [`MediaKind`] of this track.
    fn kind(&self) -> MediaKind;

    /// Stops this track, releasing any underlying capture resource.
    ///
    /// No-op for tracks that don't own a capture resource.
    fn stop(&self);
}

/// Remote peer's advertisement of an available track.
#[cfg_attr(feature = "mockable", mockall::automock)]
pub trait Publication {
    /// Returns platform-assigned stable identifier of this [`Publication`].
    fn sid(&self) -> String;

    /// Returns logical name of this [`Publication`], if the publishing peer
    /// provided one.
    fn name(&self) -> Option<String>;

    /// Returns [`MediaKind`] of the published track.
    fn kind(&self) -> MediaKind;

    /// Indicates whether media of this [`Publication`] is currently being
    /// delivered.
    fn is_subscribed(&self) -> bool;

    /// Returns the live [`MediaTrack`] of this [`Publication`].
    ///
    /// Present only while subscribed.
    fn track(&self) -> Option<Rc<dyn MediaTrack>>;

    /// Requests the platform to start or stop delivering media of this
    /// [`Publication`].
    fn set_subscribed(
        &self,
        subscribed: bool,
    ) -> LocalBoxFuture<'static, Result<(), Error>>;
}

/// Remote peer connected to the session.
#[cfg_attr(feature = "mockable", mockall::automock)]
pub trait Peer {
    /// Returns identity of this [`Peer`].
    fn identity(&self) -> String;

    /// Indicates whether this [`Peer`] is an agent (a non-human publisher).
    fn is_agent(&self) -> bool;

    /// Returns all [`Publication`]s of this [`Peer`] with the provided
    /// [`MediaKind`].
    fn publications(&self, kind: MediaKind) -> Vec<Rc<dyn Publication>>;
}

/// Media session surface of the platform: connected peers, the local
/// participant's publications, and the discovery event stream.
#[cfg_attr(feature = "mockable", mockall::automock)]
pub trait Room {
    /// Returns identity of the local participant.
    fn local_identity(&self) -> String;

    /// Returns all currently connected remote [`Peer`]s.
    fn remote_peers(&self) -> Vec<Rc<dyn Peer>>;

    /// Publishes the provided local [`MediaTrack`] under the provided
    /// logical name, making it visible to remote peers.
    fn publish(
        &self,
        track: Rc<dyn MediaTrack>,
        name: String,
    ) -> LocalBoxFuture<'static, Result<(), Error>>;

    /// Removes the local publication with the provided logical name.
    fn unpublish(
        &self,
        name: String,
    ) -> LocalBoxFuture<'static, Result<(), Error>>;

    /// Returns [`LocalBoxStream`] of all discovery [`Event`]s fired by the
    /// platform.
    fn subscribe(&self) -> LocalBoxStream<'static, Event>;
}

/// Factory of local capture tracks.
#[cfg_attr(feature = "mockable", mockall::automock)]
pub trait MediaDevices {
    /// Enumerates available media input/output devices.
    fn enumerate_devices(
        &self,
    ) -> LocalBoxFuture<'static, Result<Vec<MediaDeviceInfo>, Error>>;

    /// Acquires a video capture track from the device with the provided
    /// identifier, or from the default device if none is provided.
    fn create_video_track(
        &self,
        device_id: Option<String>,
    ) -> LocalBoxFuture<'static, Result<Rc<dyn MediaTrack>, Error>>;
}

/// Rendering destination for an audio track (for example, an output
/// element).
#[cfg_attr(feature = "mockable", mockall::automock)]
pub trait AudioSink {
    /// Attaches the provided [`MediaTrack`] to this sink, starting playback.
    fn attach(&self, track: Rc<dyn MediaTrack>);

    /// Detaches the currently attached track, stopping playback.
    fn detach(&self);

    /// Sets playback volume of this sink (`0.0`..=`1.0`).
    fn set_volume(&self, volume: f64);
}

/// Factory of [`AudioSink`]s.
#[cfg_attr(feature = "mockable", mockall::automock)]
pub trait AudioOutput {
    /// Creates a new detached [`AudioSink`].
    fn create_sink(&self) -> Rc<dyn AudioSink>;
}

/// Discovery event fired by the platform.
#[derive(Clone)]
pub enum Event {
    /// New remote peer connected to the session.
    PeerConnected {
        /// The connected peer.
        peer: Rc<dyn Peer>,
    },

    /// Remote peer disconnected from the session.
    PeerDisconnected {
        /// Identity of the disconnected peer.
        identity: String,
    },

    /// Remote peer advertised a new track.
    TrackPublished {
        /// The publishing peer.
        peer: Rc<dyn Peer>,

        /// The new publication.
        publication: Rc<dyn Publication>,
    },

    /// Remote peer removed a track advertisement.
    TrackUnpublished {
        /// The peer that owned the publication.
        peer: Rc<dyn Peer>,

        /// The removed publication.
        publication: Rc<dyn Publication>,
    },

    /// Media of a remote publication started being delivered.
    TrackSubscribed {
        /// The peer owning the publication.
        peer: Rc<dyn Peer>,

        /// The subscribed publication.
        publication: Rc<dyn Publication>,
    },

    /// Media of a remote publication stopped being delivered.
    TrackUnsubscribed {
        /// The peer owning the publication.
        peer: Rc<dyn Peer>,

        /// The unsubscribed publication.
        publication: Rc<dyn Publication>,
    },
}

/// Handler of [`Event`]s.
#[async_trait(?Send)]
pub trait EventHandler {
    /// Output of every handler method.
    type Output;

    /// Handles [`Event::PeerConnected`].
    async fn on_peer_connected(&self, peer: Rc<dyn Peer>) -> Self::Output;

    /// Handles [`Event::PeerDisconnected`].
    async fn on_peer_disconnected(&self, identity: String) -> Self::Output;

    /// Handles [`Event::TrackPublished`].
    async fn on_track_published(
        &self,
        peer: Rc<dyn Peer>,
        publication: Rc<dyn Publication>,
    ) -> Self::Output;

    /// Handles [`Event::TrackUnpublished`].
    async fn on_track_unpublished(
        &self,
        peer: Rc<dyn Peer>,
        publication: Rc<dyn Publication>,
    ) -> Self::Output;

    /// Handles [`Event::TrackSubscribed`].
    async fn on_track_subscribed(
        &self,
        peer: Rc<dyn Peer>,
        publication: Rc<dyn Publication>,
    ) -> Self::Output;

    /// Handles [`Event::TrackUnsubscribed`].
    async fn on_track_unsubscribed(
        &self,
        peer: Rc<dyn Peer>,
        publication: Rc<dyn Publication>,
    ) -> Self::Output;
}

impl Event {
    /// Dispatches this [`Event`] with the provided [`EventHandler`].
    pub async fn dispatch_with<T: EventHandler>(
        self,
        handler: &T,
    ) -> T::Output {
        match self {
            Self::PeerConnected { peer } => {
                handler.on_peer_connected(peer).await
            }
            Self::PeerDisconnected { identity } => {
                handler.on_peer_disconnected(identity).await
            }
            Self::TrackPublished { peer, publication } => {
                handler.on_track_published(peer, publication).await
            }
            Self::TrackUnpublished { peer, publication } => {
                handler.on_track_unpublished(peer, publication).await
            }
            Self::TrackSubscribed { peer, publication } => {
                handler.on_track_subscribed(peer, publication).await
            }
            Self::TrackUnsubscribed { peer, publication } => {
                handler.on_track_unsubscribed(peer, publication).await
            }
        }
    }
}
