//! Video source lifecycle orchestration.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use crate::{
    conf::{SessionConfig, SourceDescriptor, SourceKind},
    media::{
        registry::RemoteTrackRegistry,
        store::{SelectedTrackStore, SourceError},
        track::{local, remote, TrackHandle},
    },
    platform,
};

/// One selectable video source together with its current availability.
#[derive(Clone, Debug)]
pub struct SourceOption {
    /// The described video source.
    pub descriptor: SourceDescriptor,

    /// Indicator whether the source is currently satisfiable: a video
    /// input device is present for a local source, the remote track is
    /// advertised for a remote one.
    pub available: bool,
}

/// Orchestrator of the current video selection.
///
/// Owns the notion of "currently selected video source": drives local
/// device capture, remote track subscription and publish/unpublish, and
/// publishes results into the [`SelectedTrackStore`].
///
/// Overlapping switches are serialized with a monotonically increasing
/// generation token: every switch captures a token at its start and
/// re-checks it after each suspension point. A continuation holding a
/// stale token releases whatever it acquired and never touches the
/// selection state.
pub struct VideoSourceSelector {
    /// Platform room used for publish/unpublish.
    room: Rc<dyn platform::Room>,

    /// Factory of local capture tracks.
    devices: Rc<dyn platform::MediaDevices>,

    /// Index of remote video tracks.
    registry: Rc<RemoteTrackRegistry>,

    /// Shared cell the selection state is published into.
    store: Rc<SelectedTrackStore>,

    /// Selectable video sources, in configuration order.
    sources: Vec<SourceDescriptor>,

    /// Source preselected at session start.
    default_source: Option<String>,

    /// Indicator whether a captured local track is also published.
    publish_local: bool,

    /// Generation token of the most recent switch.
    generation: Cell<u64>,

    /// Logical name this selector published the local track under.
    published_as: RefCell<Option<String>>,

    /// Logical name of the remote track this selector subscribed to.
    ///
    /// Subscriptions that were already established by somebody else are
    /// not owned and not released on cleanup.
    owned_subscription: RefCell<Option<String>>,
}

impl VideoSourceSelector {
    /// Creates a new [`VideoSourceSelector`] publishing into the provided
    /// [`SelectedTrackStore`].
    #[must_use]
    pub fn new(
        room: Rc<dyn platform::Room>,
        devices: Rc<dyn platform::MediaDevices>,
        registry: Rc<RemoteTrackRegistry>,
        store: Rc<SelectedTrackStore>,
        config: &SessionConfig,
    ) -> Rc<Self> {
        Rc::new(Self {
            room,
            devices,
            registry,
            store,
            sources: config.sources.clone(),
            default_source: config.default_source.clone(),
            publish_local: config.publish_local,
            generation: Cell::new(0),
            published_as: RefCell::new(None),
            owned_subscription: RefCell::new(None),
        })
    }

    /// Returns the [`SelectedTrackStore`] this selector publishes into.
    #[inline]
    #[must_use]
    pub fn store(&self) -> Rc<SelectedTrackStore> {
        Rc::clone(&self.store)
    }

    /// Returns the configured video sources.
    #[inline]
    #[must_use]
    pub fn sources(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    /// Switches the current video selection to the source with the
    /// provided identifier.
    ///
    /// Begins with an unconditional cleanup of the current handle (local
    /// capture stopped, own publication removed, own subscription
    /// released, store cleared), which runs even when the new selection
    /// later fails. The outcome is recorded in the [`SelectedTrackStore`];
    /// failures never escalate.
    pub async fn select(&self, id: &str) {
        let token = self.bump_generation();
        log::info!("switching video source to `{}`", id);
        self.store.mutate(|state| {
            state.selected_id = Some(id.to_owned());
            state.pending = true;
            state.last_error = None;
        });

        let descriptor = self
            .sources
            .iter()
            .find(|d| d.enabled && d.id == id)
            .cloned();
        let keep = descriptor
            .as_ref()
            .filter(|d| d.kind == SourceKind::RemotePublished)
            .map(|d| d.remote_key().to_owned());

        self.cleanup(keep.as_deref()).await;
        if self.is_stale(token) {
            return;
        }

        match descriptor {
            Some(d) => match d.kind {
                SourceKind::LocalDevice => self.attach_local(token, &d).await,
                SourceKind::RemotePublished => {
                    self.attach_remote(token, &d).await;
                }
            },
            None => self.fail(token, SourceError::NotFound(id.to_owned())),
        }
    }

    /// Drops the current video selection.
    ///
    /// Runs the same unconditional cleanup as [`VideoSourceSelector::
    /// select()`] and leaves the selection idle.
    pub async fn deselect(&self) {
        let token = self.bump_generation();
        log::info!("deselecting video source");
        self.store.mutate(|state| {
            state.selected_id = None;
            state.pending = true;
            state.last_error = None;
        });

        self.cleanup(None).await;
        if self.is_stale(token) {
            return;
        }
        self.store.mutate(|state| {
            state.pending = false;
        });
    }

    /// Clears the visible error of the most recent failed switch.
    ///
    /// The error is never cleared implicitly by later platform events, so
    /// a failure stays visible until acknowledged or until a new switch.
    pub fn acknowledge_error(&self) {
        self.store.mutate(|state| {
            state.last_error = None;
        });
    }

    /// Records the preselected video source at session start.
    ///
    /// The configured default is recorded without attaching anything; when
    /// it is unknown or disabled, the first enabled source that is
    /// currently available is preselected instead.
    pub async fn apply_default(&self) {
        let configured = self.default_source.as_ref().filter(|id| {
            self.sources.iter().any(|d| d.enabled && &d.id == *id)
        });
        let id = match configured {
            Some(id) => Some(id.clone()),
            None => self.first_available().await,
        };
        if let Some(id) = id {
            log::info!("video source `{}` preselected", id);
            self.store.mutate(|state| {
                state.selected_id = Some(id.clone());
            });
        }
    }

    /// Reports every enabled video source together with its current
    /// availability.
    pub async fn source_options(&self) -> Vec<SourceOption> {
        let mut options = Vec::new();
        for descriptor in self.sources.iter().filter(|d| d.enabled) {
            options.push(SourceOption {
                available: self.is_available(descriptor).await,
                descriptor: descriptor.clone(),
            });
        }
        options
    }

    /// Reacts to a refresh of the [`RemoteTrackRegistry`]: an actively
    /// selected remote track that is no longer advertised fails the
    /// selection with [`SourceError::NotFound`].
    pub(crate) fn on_registry_refreshed(&self) {
        let state = self.store.get();
        if state.pending {
            return;
        }
        let name = match &state.active_handle {
            Some(TrackHandle::Remote(track)) => track.name(),
            _ => return,
        };
        if self.registry.lookup(&name).is_some() {
            return;
        }

        log::warn!("selected remote video source `{}` disappeared", name);
        drop(self.owned_subscription.borrow_mut().take());
        self.store.mutate(|state| {
            state.active_handle = None;
            state.last_error = Some(SourceError::NotFound(name.clone()));
        });
    }

    /// Releases everything the current selection holds: stops a local
    /// capture track, removes this selector's publication and releases
    /// this selector's remote subscription (unless the switch in progress
    /// targets the same remote track).
    async fn cleanup(&self, keep_subscription: Option<&str>) {
        let mut previous = None;
        self.store.mutate(|state| {
            previous = state.active_handle.take();
        });
        if let Some(TrackHandle::Local(track)) = previous {
            track.stop();
        }

        if let Some(name) = self.published_as.borrow_mut().take() {
            if let Err(e) = self.room.unpublish(name.clone()).await {
                log::warn!(
                    "failed to unpublish local track `{}`: {}",
                    name,
                    e,
                );
            }
        }

        let owned = self.owned_subscription.borrow_mut().take();
        if let Some(name) = owned {
            if keep_subscription == Some(name.as_str()) {
                *self.owned_subscription.borrow_mut() = Some(name);
            } else {
                self.registry.unsubscribe(&name).await;
            }
        }
    }

    /// Acquires a capture track and, when configured so, publishes it.
    ///
    /// Any previously published local track has already been unpublished
    /// by the cleanup step, so two publications never coexist.
    async fn attach_local(&self, token: u64, descriptor: &SourceDescriptor) {
        let track = match self.devices.create_video_track(None).await {
            Ok(track) => track,
            Err(e) => {
                self.fail(
                    token,
                    SourceError::DeviceUnavailable(e.to_string()),
                );
                return;
            }
        };
        if self.is_stale(token) {
            track.stop();
            return;
        }

        if self.publish_local {
            let publish = self
                .room
                .publish(Rc::clone(&track), descriptor.id.clone());
            if let Err(e) = publish.await {
                track.stop();
                self.fail(
                    token,
                    SourceError::PublishFailed(
                        descriptor.id.clone(),
                        e.to_string(),
                    ),
                );
                return;
            }
            if self.is_stale(token) {
                if let Err(e) =
                    self.room.unpublish(descriptor.id.clone()).await
                {
                    log::warn!(
                        "failed to unpublish stale local track `{}`: {}",
                        descriptor.id,
                        e,
                    );
                }
                track.stop();
                return;
            }
            *self.published_as.borrow_mut() = Some(descriptor.id.clone());
        }

        log::info!("local video source `{}` attached", descriptor.id);
        self.complete(token, TrackHandle::Local(local::Track::new(track)))
            .await;
    }

    /// Resolves the descriptor's remote name via the registry, subscribes
    /// when needed and attaches the resulting remote track.
    async fn attach_remote(&self, token: u64, descriptor: &SourceDescriptor) {
        let name = descriptor.remote_key();
        let entry = match self.registry.lookup(name) {
            Some(entry) => entry,
            None => {
                self.fail(token, SourceError::NotFound(name.to_owned()));
                return;
            }
        };

        if !entry.is_subscribed {
            if !self.registry.subscribe(name).await {
                self.fail(
                    token,
                    SourceError::SubscriptionFailed(name.to_owned()),
                );
                return;
            }
            if self.is_stale(token) {
                self.release_stale_subscription(name).await;
                return;
            }
            *self.owned_subscription.borrow_mut() = Some(name.to_owned());
        }

        let entry = match self.registry.lookup(name) {
            Some(entry) => entry,
            None => {
                self.fail(token, SourceError::NotFound(name.to_owned()));
                return;
            }
        };
        let track = match entry.platform_track() {
            Some(track) => track,
            None => {
                self.fail(
                    token,
                    SourceError::SubscriptionFailed(name.to_owned()),
                );
                return;
            }
        };

        log::info!("remote video source `{}` attached", descriptor.id);
        let handle = TrackHandle::Remote(remote::Track::new(
            entry.owner.clone(),
            entry.publication(),
            track,
        ));
        self.complete(token, handle).await;
    }

    /// Installs the attached handle into the selection state, unless the
    /// token went stale, in which case the handle's resources are released
    /// instead.
    async fn complete(&self, token: u64, handle: TrackHandle) {
        if !self.is_stale(token) {
            self.store.mutate(|state| {
                state.active_handle = Some(handle);
                state.pending = false;
            });
            return;
        }
        match handle {
            TrackHandle::Local(track) => track.stop(),
            TrackHandle::Remote(track) => {
                self.release_stale_subscription(&track.name()).await;
            }
        }
    }

    /// Records the failure of the switch holding the provided token.
    ///
    /// A stale switch's failure is discarded: the newer switch owns the
    /// selection state.
    fn fail(&self, token: u64, error: SourceError) {
        if self.is_stale(token) {
            return;
        }
        log::error!("video source switch failed: {}", error);
        self.store.mutate(|state| {
            state.pending = false;
            state.last_error = Some(error);
        });
    }

    /// Releases a subscription established by a switch that went stale,
    /// unless the current selection took the subscription over.
    async fn release_stale_subscription(&self, name: &str) {
        if self.owned_subscription.borrow().as_deref() == Some(name) {
            return;
        }
        if self.current_remote_target().as_deref() == Some(name) {
            return;
        }
        self.registry.unsubscribe(name).await;
    }

    /// Returns the remote name the current selection points at, if it is
    /// a remote source.
    fn current_remote_target(&self) -> Option<String> {
        let selected = self.store.get().selected_id?;
        let descriptor = self.sources.iter().find(|d| d.id == selected)?;
        if descriptor.kind == SourceKind::RemotePublished {
            Some(descriptor.remote_key().to_owned())
        } else {
            None
        }
    }

    async fn first_available(&self) -> Option<String> {
        for descriptor in self.sources.iter().filter(|d| d.enabled) {
            if self.is_available(descriptor).await {
                return Some(descriptor.id.clone());
            }
        }
        None
    }

    async fn is_available(&self, descriptor: &SourceDescriptor) -> bool {
        match descriptor.kind {
            SourceKind::LocalDevice => self
                .devices
                .enumerate_devices()
                .await
                .map(|devices| {
                    devices.iter().any(|info| {
                        info.kind == platform::MediaDeviceKind::VideoInput
                    })
                })
                .unwrap_or(false),
            SourceKind::RemotePublished => {
                self.registry.lookup(descriptor.remote_key()).is_some()
            }
        }
    }

    fn bump_generation(&self) -> u64 {
        let next = self.generation.get() + 1;
        self.generation.set(next);
        next
    }

    fn is_stale(&self, token: u64) -> bool {
        self.generation.get() != token
    }
}
