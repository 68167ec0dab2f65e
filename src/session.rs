//! Media session wiring all the components together.

use std::rc::{Rc, Weak};

use async_trait::async_trait;
use derive_more::Display;
use futures::{
    future::LocalBoxFuture, stream::LocalBoxStream, FutureExt as _,
    StreamExt as _,
};
use tracerr::Traced;

use crate::{
    conf::SessionConfig,
    media::{
        audio::AudioTrackFilter, avatar::AvatarTrackPicker,
        registry::RemoteTrackRegistry, selector::VideoSourceSelector,
        store::{SelectedTrackStore, SelectionState}, MediaKind,
    },
    platform::{self, EventHandler},
    transcript::{
        ChatMessage, ParticipantDirectory, TranscriptEntry, TranscriptMerger,
        TranscriptionSegment,
    },
};

/// Error of [`SessionHandle`]'s [`Weak`] pointer being detached.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[display(fmt = "SessionHandle is in detached state")]
pub struct HandleDetachedError;

/// Client-side media session of a single user.
///
/// Owns the video selection path, the audio filtering path and the
/// transcript path, and feeds them from the platform's discovery event
/// stream. All platform events and user actions are serialized onto one
/// logical thread of execution.
pub struct MediaSession(Rc<InnerSession>);

/// Actual data and components of a [`MediaSession`].
struct InnerSession {
    /// Platform room of this session.
    room: Rc<dyn platform::Room>,

    /// Index of remote video tracks.
    registry: Rc<RemoteTrackRegistry>,

    /// Orchestrator of the current video selection.
    selector: Rc<VideoSourceSelector>,

    /// Filter of inbound audio tracks.
    audio: Rc<AudioTrackFilter>,

    /// Picker of the avatar video track.
    avatar: AvatarTrackPicker,

    /// Directory of session participants.
    directory: Rc<ParticipantDirectory>,

    /// Merger of chat and transcription streams.
    transcript: Rc<TranscriptMerger>,
}

impl MediaSession {
    /// Creates a new [`MediaSession`] on top of the provided platform
    /// primitives and static configuration.
    #[must_use]
    pub fn new(
        room: Rc<dyn platform::Room>,
        devices: Rc<dyn platform::MediaDevices>,
        output: Rc<dyn platform::AudioOutput>,
        config: SessionConfig,
    ) -> Self {
        let registry = RemoteTrackRegistry::new(Rc::clone(&room));
        let store = SelectedTrackStore::new();
        let selector = VideoSourceSelector::new(
            Rc::clone(&room),
            devices,
            Rc::clone(&registry),
            store,
            &config,
        );
        let audio = AudioTrackFilter::new(
            Rc::clone(&room),
            output,
            config.exclude_audio.clone(),
            config.auto_unsubscribe,
        );
        let avatar = AvatarTrackPicker::new(Rc::clone(&room), &config.sources);
        let directory = ParticipantDirectory::new(room.local_identity());
        for peer in room.remote_peers() {
            directory.add_remote(peer.identity());
        }
        let transcript = TranscriptMerger::new(
            Rc::clone(&directory),
            config.user_alias_identities.clone(),
            config.smart_matching,
        );

        registry.refresh();

        Self(Rc::new(InnerSession {
            room,
            registry,
            selector,
            audio,
            avatar,
            directory,
            transcript,
        }))
    }

    /// Performs the startup sweep: enforces the audio exclusion policy on
    /// publications that predate this session and records the preselected
    /// video source.
    pub async fn start(&self) {
        self.0.registry.refresh();
        self.0.audio.enforce().await;
        self.0.selector.apply_default().await;
    }

    /// Returns [`LocalBoxFuture`] processing the platform's discovery
    /// event stream until the stream ends or this [`MediaSession`] is
    /// dropped.
    ///
    /// Intended to be spawned on the embedder's single-threaded executor.
    pub fn run(&self) -> LocalBoxFuture<'static, ()> {
        let mut events = self.0.room.subscribe();
        let inner = Rc::downgrade(&self.0);
        async move {
            while let Some(event) = events.next().await {
                match inner.upgrade() {
                    Some(inner) => event.dispatch_with(&*inner).await,
                    None => break,
                }
            }
        }
        .boxed_local()
    }

    /// Dispatches a single platform [`Event`] to this session's
    /// components.
    ///
    /// [`Event`]: platform::Event
    pub async fn handle_event(&self, event: platform::Event) {
        event.dispatch_with(&*self.0).await;
    }

    /// Returns the orchestrator of the current video selection.
    #[inline]
    #[must_use]
    pub fn selector(&self) -> Rc<VideoSourceSelector> {
        Rc::clone(&self.0.selector)
    }

    /// Returns the store holding the current selection state.
    #[inline]
    #[must_use]
    pub fn store(&self) -> Rc<SelectedTrackStore> {
        self.0.selector.store()
    }

    /// Returns the filter of inbound audio tracks.
    #[inline]
    #[must_use]
    pub fn audio_filter(&self) -> Rc<AudioTrackFilter> {
        Rc::clone(&self.0.audio)
    }

    /// Returns the picker of the avatar video track.
    #[inline]
    #[must_use]
    pub fn avatar_picker(&self) -> &AvatarTrackPicker {
        &self.0.avatar
    }

    /// Returns the merger of chat and transcription streams.
    #[inline]
    #[must_use]
    pub fn transcript(&self) -> Rc<TranscriptMerger> {
        Rc::clone(&self.0.transcript)
    }

    /// Returns the directory of session participants.
    #[inline]
    #[must_use]
    pub fn participants(&self) -> Rc<ParticipantDirectory> {
        Rc::clone(&self.0.directory)
    }

    /// Creates a new external [`SessionHandle`] to this [`MediaSession`].
    #[inline]
    #[must_use]
    pub fn new_handle(&self) -> SessionHandle {
        SessionHandle(Rc::downgrade(&self.0))
    }

    /// Closes this session: drops the video selection and releases every
    /// outstanding audio sink.
    pub async fn close(&self) {
        self.0.selector.deselect().await;
        self.0.audio.teardown();
    }
}

/// External handle to a [`MediaSession`], given out to rendering
/// collaborators.
///
/// Actually, represents a [`Weak`]-based handle to the session's inner
/// state: it exposes only the public operations and never keeps the
/// session alive.
#[derive(Clone)]
pub struct SessionHandle(Weak<InnerSession>);

impl SessionHandle {
    /// Switches the current video selection to the source with the
    /// provided identifier.
    ///
    /// # Errors
    ///
    /// With [`HandleDetachedError`] if the session is gone.
    pub async fn select_source(
        &self,
        id: String,
    ) -> Result<(), Traced<HandleDetachedError>> {
        let inner = self.upgrade()?;
        inner.selector.select(&id).await;
        Ok(())
    }

    /// Drops the current video selection.
    ///
    /// # Errors
    ///
    /// With [`HandleDetachedError`] if the session is gone.
    pub async fn deselect_source(
        &self,
    ) -> Result<(), Traced<HandleDetachedError>> {
        let inner = self.upgrade()?;
        inner.selector.deselect().await;
        Ok(())
    }

    /// Clears the visible error of the most recent failed switch.
    ///
    /// # Errors
    ///
    /// With [`HandleDetachedError`] if the session is gone.
    pub fn acknowledge_error(
        &self,
    ) -> Result<(), Traced<HandleDetachedError>> {
        self.upgrade().map(|inner| inner.selector.acknowledge_error())
    }

    /// Returns the current [`SelectionState`].
    ///
    /// # Errors
    ///
    /// With [`HandleDetachedError`] if the session is gone.
    pub fn selection(
        &self,
    ) -> Result<SelectionState, Traced<HandleDetachedError>> {
        self.upgrade().map(|inner| inner.selector.store().get())
    }

    /// Returns [`LocalBoxStream`] emitting every [`SelectionState`]
    /// change.
    ///
    /// # Errors
    ///
    /// With [`HandleDetachedError`] if the session is gone.
    pub fn subscribe_selection(
        &self,
    ) -> Result<LocalBoxStream<'static, SelectionState>, Traced<HandleDetachedError>>
    {
        self.upgrade()
            .map(|inner| inner.selector.store().subscribe())
    }

    /// Explicitly subscribes to the audio track with the provided SID,
    /// independent of the exclusion policy.
    ///
    /// # Errors
    ///
    /// With [`HandleDetachedError`] if the session is gone.
    pub async fn manual_subscribe_audio(
        &self,
        sid: String,
    ) -> Result<bool, Traced<HandleDetachedError>> {
        let inner = self.upgrade()?;
        Ok(inner.audio.manual_subscribe(&sid).await)
    }

    /// Explicitly unsubscribes from the audio track with the provided
    /// SID, independent of the exclusion policy.
    ///
    /// # Errors
    ///
    /// With [`HandleDetachedError`] if the session is gone.
    pub async fn manual_unsubscribe_audio(
        &self,
        sid: String,
    ) -> Result<bool, Traced<HandleDetachedError>> {
        let inner = self.upgrade()?;
        Ok(inner.audio.manual_unsubscribe(&sid).await)
    }

    /// Ingests a chat message into the transcript.
    ///
    /// # Errors
    ///
    /// With [`HandleDetachedError`] if the session is gone.
    pub fn push_chat(
        &self,
        message: ChatMessage,
    ) -> Result<(), Traced<HandleDetachedError>> {
        self.upgrade()
            .map(|inner| inner.transcript.push_chat(message))
    }

    /// Ingests a transcription segment into the transcript.
    ///
    /// # Errors
    ///
    /// With [`HandleDetachedError`] if the session is gone.
    pub fn push_transcription(
        &self,
        segment: TranscriptionSegment,
    ) -> Result<(), Traced<HandleDetachedError>> {
        self.upgrade()
            .map(|inner| inner.transcript.push_transcription(segment))
    }

    /// Returns the merged transcript, ordered by timestamp ascending.
    ///
    /// # Errors
    ///
    /// With [`HandleDetachedError`] if the session is gone.
    pub fn transcript_entries(
        &self,
    ) -> Result<Vec<TranscriptEntry>, Traced<HandleDetachedError>> {
        self.upgrade().map(|inner| inner.transcript.entries())
    }

    fn upgrade(&self) -> Result<Rc<InnerSession>, Traced<HandleDetachedError>> {
        self.0
            .upgrade()
            .ok_or_else(|| tracerr::new!(HandleDetachedError))
    }
}

#[async_trait(?Send)]
impl EventHandler for InnerSession {
    type Output = ();

    async fn on_peer_connected(&self, peer: Rc<dyn platform::Peer>) {
        log::info!("peer `{}` connected", peer.identity());
        self.directory.add_remote(peer.identity());
        self.registry.refresh();
        for publication in peer.publications(MediaKind::Audio) {
            self.audio.on_track_published(&publication).await;
            if publication.is_subscribed() {
                self.audio.render(&peer.identity(), &publication);
            }
        }
        self.selector.on_registry_refreshed();
    }

    async fn on_peer_disconnected(&self, identity: String) {
        log::info!("peer `{}` disconnected", identity);
        self.directory.remove_remote(&identity);
        self.audio.drop_peer(&identity);
        self.registry.refresh();
        self.selector.on_registry_refreshed();
    }

    async fn on_track_published(
        &self,
        _: Rc<dyn platform::Peer>,
        publication: Rc<dyn platform::Publication>,
    ) {
        self.registry.refresh();
        self.audio.on_track_published(&publication).await;
        self.selector.on_registry_refreshed();
    }

    async fn on_track_unpublished(
        &self,
        _: Rc<dyn platform::Peer>,
        _: Rc<dyn platform::Publication>,
    ) {
        self.registry.refresh();
        self.selector.on_registry_refreshed();
    }

    async fn on_track_subscribed(
        &self,
        peer: Rc<dyn platform::Peer>,
        publication: Rc<dyn platform::Publication>,
    ) {
        self.registry.refresh();
        self.audio.render(&peer.identity(), &publication);
        self.selector.on_registry_refreshed();
    }

    async fn on_track_unsubscribed(
        &self,
        peer: Rc<dyn platform::Peer>,
        publication: Rc<dyn platform::Publication>,
    ) {
        self.registry.refresh();
        if publication.kind() == MediaKind::Audio {
            let name =
                publication.name().unwrap_or_else(|| publication.sid());
            self.audio.stop(&peer.identity(), &name);
        }
        self.selector.on_registry_refreshed();
    }
}
