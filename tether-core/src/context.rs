//! The source context of an interaction.

use crate::event::{ChannelId, MessageEvent, UserId};

/// Who started an interaction, and where.
///
/// Every wait and every callback set is owned by a context. Criteria receive
/// it next to the event so that "from the source user" and "in the source
/// channel" can be expressed without capturing ids in closures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Context {
    /// The user whose command started the interaction.
    pub user_id: UserId,
    /// The channel the command was issued in.
    pub channel_id: ChannelId,
}

impl Context {
    /// Create a context for a user in a channel.
    pub const fn new(user_id: UserId, channel_id: ChannelId) -> Self {
        Self {
            user_id,
            channel_id,
        }
    }

    /// The context of the command carried by `message`.
    pub fn from_message(message: &MessageEvent) -> Self {
        Self::new(message.author_id, message.channel_id)
    }
}
