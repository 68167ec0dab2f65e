//! Inbound audio track filtering and rendering.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::Rc,
};

use crate::{conf::AudioExclusionPolicy, media::MediaKind, platform};

/// Key of an attached audio sink.
type SinkKey = (String, String);

/// Decides which inbound audio tracks are rendered to the user and which
/// are suppressed.
///
/// Declarative control comes from the [`AudioExclusionPolicy`]; imperative
/// control from [`AudioTrackFilter::manual_subscribe()`] /
/// [`AudioTrackFilter::manual_unsubscribe()`]. Sinks are keyed by
/// `(peer identity, track name)` and attach/detach idempotently, so
/// duplicate render/stop calls under event storms are safe no-ops.
pub struct AudioTrackFilter {
    /// Patterns of suppressed tracks.
    policy: AudioExclusionPolicy,

    /// Indicator whether matched tracks are unsubscribed at the platform
    /// level as soon as they are observed.
    auto_unsubscribe: bool,

    /// Platform room the peer set is read from.
    room: Rc<dyn platform::Room>,

    /// Factory of audio sinks.
    output: Rc<dyn platform::AudioOutput>,

    /// Outstanding sinks by `(peer identity, track name)`.
    sinks: RefCell<HashMap<SinkKey, Rc<dyn platform::AudioSink>>>,

    /// Playback volume applied to every sink.
    volume: Cell<f64>,
}

impl AudioTrackFilter {
    /// Creates a new [`AudioTrackFilter`] with the provided policy.
    #[must_use]
    pub fn new(
        room: Rc<dyn platform::Room>,
        output: Rc<dyn platform::AudioOutput>,
        policy: AudioExclusionPolicy,
        auto_unsubscribe: bool,
    ) -> Rc<Self> {
        Rc::new(Self {
            policy,
            auto_unsubscribe,
            room,
            output,
            sinks: RefCell::new(HashMap::new()),
            volume: Cell::new(1.0),
        })
    }

    /// Indicates whether a track with the provided name/SID is suppressed
    /// by the exclusion policy.
    ///
    /// Pure function of the policy and the provided candidate: nothing is
    /// memoized, so a track renamed into a pattern becomes excluded on the
    /// next evaluation.
    #[inline]
    #[must_use]
    pub fn should_exclude(&self, name_or_sid: &str) -> bool {
        self.policy.matches(name_or_sid)
    }

    /// Attaches an audio sink for the provided publication, unless the
    /// publication is excluded.
    ///
    /// Idempotent per `(peer identity, track name)`: re-rendering an
    /// already rendered track reuses its sink. A track that has become
    /// excluded since it was attached is detached instead.
    pub fn render(
        &self,
        peer_identity: &str,
        publication: &Rc<dyn platform::Publication>,
    ) {
        if publication.kind() != MediaKind::Audio {
            return;
        }
        let track = match publication.track() {
            Some(track) => track,
            None => return,
        };
        let name = publication.name().unwrap_or_else(|| publication.sid());

        if self.should_exclude(&name) || self.should_exclude(&publication.sid())
        {
            log::info!(
                "audio track `{}` of `{}` is excluded",
                name,
                peer_identity,
            );
            self.stop(peer_identity, &name);
            return;
        }

        let key = (peer_identity.to_owned(), name.clone());
        let mut sinks = self.sinks.borrow_mut();
        let sink = sinks
            .entry(key)
            .or_insert_with(|| self.output.create_sink());
        sink.set_volume(self.volume.get());
        sink.attach(track);
        log::debug!("audio track `{}` of `{}` rendered", name, peer_identity);
    }

    /// Detaches the sink of the provided track, if any.
    ///
    /// Idempotent: stopping a track that isn't rendered is a no-op.
    pub fn stop(&self, peer_identity: &str, track_name: &str) {
        let key = (peer_identity.to_owned(), track_name.to_owned());
        if let Some(sink) = self.sinks.borrow_mut().remove(&key) {
            sink.detach();
            log::debug!(
                "audio track `{}` of `{}` stopped",
                track_name,
                peer_identity,
            );
        }
    }

    /// Detaches every sink attached for the provided peer.
    ///
    /// Intended to be called on the peer's disconnect.
    pub fn drop_peer(&self, peer_identity: &str) {
        let removed: Vec<_> = {
            let mut sinks = self.sinks.borrow_mut();
            let keys: Vec<_> = sinks
                .keys()
                .filter(|(identity, _)| identity == peer_identity)
                .cloned()
                .collect();
            keys.into_iter().filter_map(|k| sinks.remove(&k)).collect()
        };
        for sink in removed {
            sink.detach();
        }
    }

    /// Enumerates and detaches every outstanding sink.
    ///
    /// Intended to be called on component teardown: no sink release is
    /// left to garbage collection.
    pub fn teardown(&self) {
        let sinks: Vec<_> =
            self.sinks.borrow_mut().drain().map(|(_, sink)| sink).collect();
        for sink in sinks {
            sink.detach();
        }
    }

    /// Sets playback volume of every attached (and future) sink.
    pub fn set_volume(&self, volume: f64) {
        self.volume.set(volume);
        for sink in self.sinks.borrow().values() {
            sink.set_volume(volume);
        }
    }

    /// Reacts to a newly observed audio publication: in auto-unsubscribe
    /// mode an excluded track is unsubscribed at the platform level right
    /// away, independent of rendering.
    pub async fn on_track_published(
        &self,
        publication: &Rc<dyn platform::Publication>,
    ) {
        if !self.auto_unsubscribe || publication.kind() != MediaKind::Audio {
            return;
        }
        let name = publication.name().unwrap_or_else(|| publication.sid());
        if !self.should_exclude(&name) && !self.should_exclude(&publication.sid())
        {
            return;
        }
        log::info!("auto-unsubscribing excluded audio track `{}`", name);
        if let Err(e) = publication.set_subscribed(false).await {
            log::error!(
                "failed to auto-unsubscribe audio track `{}`: {}",
                name,
                e,
            );
        }
    }

    /// Sweeps all currently known audio publications, auto-unsubscribing
    /// the excluded ones.
    ///
    /// Intended to be called once at session start to cover publications
    /// that predate this filter.
    pub async fn enforce(&self) {
        if !self.auto_unsubscribe {
            return;
        }
        for peer in self.room.remote_peers() {
            for publication in peer.publications(MediaKind::Audio) {
                if publication.is_subscribed() {
                    self.on_track_published(&publication).await;
                }
            }
        }
    }

    /// Explicitly subscribes to the audio track with the provided SID,
    /// independent of the exclusion policy.
    ///
    /// Returns `false` when no such track exists or the platform refused.
    pub async fn manual_subscribe(&self, sid: &str) -> bool {
        self.manual_set_subscribed(sid, true).await
    }

    /// Explicitly unsubscribes from the audio track with the provided
    /// SID, independent of the exclusion policy.
    ///
    /// Returns `false` when no such track exists or the platform refused.
    pub async fn manual_unsubscribe(&self, sid: &str) -> bool {
        self.manual_set_subscribed(sid, false).await
    }

    async fn manual_set_subscribed(&self, sid: &str, subscribed: bool) -> bool {
        for peer in self.room.remote_peers() {
            for publication in peer.publications(MediaKind::Audio) {
                if publication.sid() != sid {
                    continue;
                }
                if publication.is_subscribed() == subscribed {
                    return true;
                }
                return match publication.set_subscribed(subscribed).await {
                    Ok(()) => true,
                    Err(e) => {
                        log::error!(
                            "failed to toggle subscription of audio track \
                             `{}`: {}",
                            sid,
                            e,
                        );
                        false
                    }
                };
            }
        }
        log::warn!("audio track `{}` is not known", sid);
        false
    }
}
