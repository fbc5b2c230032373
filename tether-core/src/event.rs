//! Inbound platform events and the identifiers they carry.
//!
//! The engine only ever sees two kinds of events: a message was posted, or a
//! reaction was added to a message. Both are plain data; the platform layer is
//! responsible for translating its own gateway payloads into them.

use crate::message::Message;
use std::fmt;

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u64);

        impl $name {
            /// Return the raw numeric id.
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

snowflake!(
    /// Identifier of a platform user.
    UserId
);
snowflake!(
    /// Identifier of a channel (or direct-message conversation).
    ChannelId
);
snowflake!(
    /// Identifier of a single message.
    MessageId
);

/// A reaction emote, compared by its textual form.
///
/// Unicode emotes use the glyph itself (`"▶"`); custom emotes use whatever
/// stable name the platform layer chooses (`"name:1234"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Emote(String);

impl Emote {
    /// Create an emote from its textual form.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The textual form of the emote.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Emote {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Emote {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for Emote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message was posted in a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    /// Id of the posted message.
    pub id: MessageId,
    /// Who posted it.
    pub author_id: UserId,
    /// Where it was posted.
    pub channel_id: ChannelId,
    /// Raw text content.
    pub content: String,
}

impl Message for MessageEvent {}

/// A reaction was added to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionEvent {
    /// The message that was reacted to.
    pub message_id: MessageId,
    /// Who added the reaction.
    pub author_id: UserId,
    /// The channel of the reacted message.
    pub channel_id: ChannelId,
    /// The emote that was added.
    pub emote: Emote,
}

impl Message for ReactionEvent {}

/// Events that know who produced them and where.
///
/// The user and channel criteria are written once against this trait and work
/// for both messages and reactions.
pub trait Sourced {
    /// The user that produced the event.
    fn author_id(&self) -> UserId;

    /// The channel the event happened in.
    fn channel_id(&self) -> ChannelId;
}

impl Sourced for MessageEvent {
    fn author_id(&self) -> UserId {
        self.author_id
    }

    fn channel_id(&self) -> ChannelId {
        self.channel_id
    }
}

impl Sourced for ReactionEvent {
    fn author_id(&self) -> UserId {
        self.author_id
    }

    fn channel_id(&self) -> ChannelId {
        self.channel_id
    }
}
