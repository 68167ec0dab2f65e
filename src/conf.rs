//! Static session configuration.
//!
//! Loaded once at session start and immutable afterwards.

use serde::Deserialize;

/// Kind of a selectable video source.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Local capture device (camera).
    LocalDevice,

    /// Named track published by a remote peer.
    RemotePublished,
}

/// Configuration entry naming one selectable video source.
#[derive(Clone, Debug, Deserialize)]
pub struct SourceDescriptor {
    /// Unique identifier of this video source.
    pub id: String,

    /// Display label of this video source.
    pub label: String,

    /// Display icon of this video source.
    #[serde(default)]
    pub icon: Option<String>,

    /// Display description of this video source.
    #[serde(default)]
    pub description: Option<String>,

    /// Kind of this video source.
    pub kind: SourceKind,

    /// Logical name used to locate a [`SourceKind::RemotePublished`] track.
    ///
    /// Defaults to [`SourceDescriptor::id`] when absent.
    #[serde(default)]
    pub remote_name: Option<String>,

    /// Indicator whether this video source participates in selection.
    #[serde(default = "SourceDescriptor::enabled_by_default")]
    pub enabled: bool,
}

impl SourceDescriptor {
    /// Returns the logical name under which the remote track of this
    /// source is looked up.
    #[inline]
    #[must_use]
    pub fn remote_key(&self) -> &str {
        self.remote_name.as_deref().unwrap_or(&self.id)
    }

    fn enabled_by_default() -> bool {
        true
    }
}

/// Ordered list of patterns deciding which inbound audio tracks are
/// suppressed.
///
/// A candidate track name (or SID) matches when it equals a pattern,
/// contains a pattern, or is contained by a pattern. Matching is evaluated
/// fresh per track, never cached across renames.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct AudioExclusionPolicy {
    patterns: Vec<String>,
}

impl AudioExclusionPolicy {
    /// Creates a new [`AudioExclusionPolicy`] from the provided patterns.
    #[inline]
    #[must_use]
    pub fn new<I: IntoIterator<Item = String>>(patterns: I) -> Self {
        Self {
            patterns: patterns.into_iter().collect(),
        }
    }

    /// Indicates whether the provided candidate track name/SID matches this
    /// [`AudioExclusionPolicy`].
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        self.patterns.iter().any(|pattern| {
            candidate == pattern
                || candidate.contains(pattern.as_str())
                || pattern.contains(candidate)
        })
    }

    /// Returns patterns of this [`AudioExclusionPolicy`].
    #[inline]
    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

/// Complete static configuration of a media session.
#[derive(Clone, Debug, Deserialize)]
pub struct SessionConfig {
    /// Selectable video sources.
    #[serde(default)]
    pub sources: Vec<SourceDescriptor>,

    /// Identifier of the video source preselected at session start.
    ///
    /// The preselection records the identifier without attaching anything;
    /// when the configured source is unknown, the first enabled source
    /// whose media is currently available is preselected instead.
    #[serde(default)]
    pub default_source: Option<String>,

    /// Patterns of inbound audio tracks that are never rendered.
    #[serde(default)]
    pub exclude_audio: AudioExclusionPolicy,

    /// Indicator whether excluded audio tracks are unsubscribed at the
    /// platform level as soon as they are observed, instead of merely not
    /// being attached to a sink.
    #[serde(default)]
    pub auto_unsubscribe: bool,

    /// Identities treated as stand-ins for the local participant when
    /// attributing transcript items (used when a non-human publisher
    /// carries the human user's audio).
    #[serde(default)]
    pub user_alias_identities: Vec<String>,

    /// Indicator whether unresolved transcript items fall back to an
    /// agent-looking (or the first) remote participant.
    #[serde(default = "SessionConfig::smart_matching_by_default")]
    pub smart_matching: bool,

    /// Indicator whether a selected local device track is also published,
    /// making the local camera visible to remote peers.
    #[serde(default = "SessionConfig::publish_local_by_default")]
    pub publish_local: bool,
}

impl SessionConfig {
    /// Parses a [`SessionConfig`] from its JSON representation.
    ///
    /// # Errors
    ///
    /// Errors if the provided JSON doesn't represent a valid
    /// [`SessionConfig`].
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn smart_matching_by_default() -> bool {
        true
    }

    fn publish_local_by_default() -> bool {
        true
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            default_source: None,
            exclude_audio: AudioExclusionPolicy::default(),
            auto_unsubscribe: false,
            user_alias_identities: Vec::new(),
            smart_matching: true,
            publish_local: true,
        }
    }
}
