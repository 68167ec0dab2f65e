//! Merging of chat and transcription streams into one ordered log.

pub mod participants;

use std::{cell::RefCell, rc::Rc};

#[doc(inline)]
pub use self::participants::ParticipantDirectory;

/// Keywords marking a remote identity as agent-like for the smart
/// attribution fallback.
const AGENT_KEYWORDS: &[&str] = &["agent", "assistant", "bot"];

/// Reference to the participant a transcript entry is attributed to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParticipantRef {
    /// The local participant.
    Local(String),

    /// A remote participant with the carried identity.
    Remote(String),
}

impl ParticipantRef {
    /// Returns identity of the referenced participant.
    #[inline]
    #[must_use]
    pub fn identity(&self) -> &str {
        match self {
            Self::Local(identity) | Self::Remote(identity) => identity,
        }
    }
}

/// Discrete chat message arriving from the chat stream.
#[derive(Clone, Debug)]
pub struct ChatMessage {
    /// Unique identifier of this message.
    pub id: String,

    /// Arrival timestamp, in milliseconds. The ordering key of the
    /// resulting entry, even across later edits.
    pub timestamp: u64,

    /// Text of this message.
    pub text: String,

    /// Declared sender identity, if any.
    pub sender: Option<String>,

    /// Timestamp of the latest edit, if this message is an edit of an
    /// earlier one.
    pub edit_timestamp: Option<u64>,
}

/// Live transcription segment arriving from the transcription stream.
#[derive(Clone, Debug)]
pub struct TranscriptionSegment {
    /// Unique identifier of this segment. A re-arriving identifier
    /// replaces the segment's text in place.
    pub id: String,

    /// Timestamp of the segment's first arrival, in milliseconds.
    pub timestamp: u64,

    /// Transcribed text.
    pub text: String,

    /// Identity of the speaking participant as declared by the
    /// transcription source.
    pub speaker: String,
}

/// One entry of the merged conversation log.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TranscriptEntry {
    /// Unique identifier of this entry.
    pub id: String,

    /// Ordering key: the original arrival timestamp, in milliseconds.
    pub timestamp: u64,

    /// Latest text of this entry.
    pub text: String,

    /// Participant this entry is attributed to.
    ///
    /// `None` when attribution failed — a degraded but valid result; the
    /// display layer decides the fallback label.
    pub origin: Option<ParticipantRef>,

    /// Indicator whether this entry has been edited after arrival.
    pub edited: bool,
}

/// Combines the chat message stream and the transcription stream into one
/// chronologically ordered, participant-attributed log.
///
/// Attribution is resolved per incoming item against the current
/// [`ParticipantDirectory`] snapshot. Entries are retained for the
/// session's duration and never mutated after creation, except by a later
/// event carrying the same identifier.
pub struct TranscriptMerger {
    /// Directory attribution is resolved against.
    directory: Rc<ParticipantDirectory>,

    /// Identities standing in for the local participant.
    user_aliases: Vec<String>,

    /// Indicator whether unresolved items fall back to an agent-looking
    /// (or the first) remote participant.
    smart_matching: bool,

    /// Entries originating from transcription segments, in arrival order.
    transcriptions: RefCell<Vec<TranscriptEntry>>,

    /// Entries originating from chat messages, in arrival order.
    chat: RefCell<Vec<TranscriptEntry>>,
}

impl TranscriptMerger {
    /// Creates a new empty [`TranscriptMerger`].
    #[must_use]
    pub fn new(
        directory: Rc<ParticipantDirectory>,
        user_aliases: Vec<String>,
        smart_matching: bool,
    ) -> Rc<Self> {
        Rc::new(Self {
            directory,
            user_aliases,
            smart_matching,
            transcriptions: RefCell::new(Vec::new()),
            chat: RefCell::new(Vec::new()),
        })
    }

    /// Ingests a chat message.
    ///
    /// A message carrying a known identifier updates the existing entry's
    /// text, marking it edited when an edit timestamp is present; the
    /// entry keeps its original ordering timestamp.
    pub fn push_chat(&self, message: ChatMessage) {
        let mut chat = self.chat.borrow_mut();
        if let Some(entry) = chat.iter_mut().find(|e| e.id == message.id) {
            entry.text = message.text;
            if message.edit_timestamp.is_some() {
                entry.edited = true;
            }
            return;
        }

        let origin = self.resolve(message.sender.as_deref());
        chat.push(TranscriptEntry {
            id: message.id,
            timestamp: message.timestamp,
            text: message.text,
            origin,
            edited: message.edit_timestamp.is_some(),
        });
    }

    /// Ingests a transcription segment.
    ///
    /// A segment carrying a known identifier replaces the existing
    /// entry's text in place (live segment growth) without marking it
    /// edited; the entry keeps its original ordering timestamp.
    pub fn push_transcription(&self, segment: TranscriptionSegment) {
        let mut transcriptions = self.transcriptions.borrow_mut();
        if let Some(entry) =
            transcriptions.iter_mut().find(|e| e.id == segment.id)
        {
            entry.text = segment.text;
            return;
        }

        let origin = self.resolve(Some(&segment.speaker));
        transcriptions.push(TranscriptEntry {
            id: segment.id,
            timestamp: segment.timestamp,
            text: segment.text,
            origin,
            edited: false,
        });
    }

    /// Returns the merged log, ordered by timestamp ascending.
    ///
    /// The sort is stable and transcription entries are merged ahead of
    /// chat entries, so a transcription entry and a chat entry with equal
    /// timestamps always come out transcription-first.
    #[must_use]
    pub fn entries(&self) -> Vec<TranscriptEntry> {
        let mut merged: Vec<_> = self
            .transcriptions
            .borrow()
            .iter()
            .chain(self.chat.borrow().iter())
            .cloned()
            .collect();
        merged.sort_by_key(|entry| entry.timestamp);
        merged
    }

    /// Resolves the participant an item with the provided declared
    /// identity is attributed to.
    ///
    /// A user-alias identity and the local identity attribute to the
    /// local participant; a known remote identity attributes to that
    /// remote. Otherwise, with smart matching enabled, an agent-looking
    /// remote is preferred, falling back to the first remote; without it
    /// the item stays unattributed.
    fn resolve(&self, declared: Option<&str>) -> Option<ParticipantRef> {
        if let Some(identity) = declared {
            if self.user_aliases.iter().any(|alias| alias == identity) {
                return Some(ParticipantRef::Local(
                    self.directory.local().to_owned(),
                ));
            }
            if self.directory.is_local(identity) {
                return Some(ParticipantRef::Local(identity.to_owned()));
            }
            if self.directory.remotes().iter().any(|r| r == identity) {
                return Some(ParticipantRef::Remote(identity.to_owned()));
            }
        }

        if self.smart_matching {
            let remotes = self.directory.remotes();
            let agent = remotes.iter().find(|identity| {
                let lowered = identity.to_lowercase();
                AGENT_KEYWORDS.iter().any(|kw| lowered.contains(kw))
            });
            if let Some(identity) = agent.or_else(|| remotes.first()) {
                return Some(ParticipantRef::Remote(identity.clone()));
            }
        }
        None
    }
}
