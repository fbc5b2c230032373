//! # Outbound Platform Operations
//!
//! The engine never talks to a chat platform directly. Everything it needs to
//! do to the outside world goes through this trait, implemented by the
//! platform layer (a gateway client, an HTTP client, or a test double).

use crate::{
    error::PlatformError,
    event::{ChannelId, Emote, MessageId, UserId},
};
use async_trait::async_trait;

/// The outbound side of a chat platform.
///
/// Implementations are shared between tasks behind an `Arc<dyn Platform>`,
/// so every method takes `&self`.
#[async_trait]
pub trait Platform: Send + Sync + 'static {
    /// The bot's own user. The engine drops every event this user authored,
    /// including the echoes of the reactions it seeds.
    fn current_user(&self) -> UserId;

    /// Post `content` in `channel` and return the id of the new message.
    async fn send_message(
        &self,
        channel: ChannelId,
        content: &str,
    ) -> Result<MessageId, PlatformError>;

    /// Replace the content of `message`.
    async fn edit_message(&self, message: MessageId, content: &str) -> Result<(), PlatformError>;

    /// Remove the reaction `emote` that `user` added to `message`.
    async fn remove_reaction(
        &self,
        message: MessageId,
        user: UserId,
        emote: &Emote,
    ) -> Result<(), PlatformError>;

    /// Add the bot's own `emote` reaction to `message`.
    async fn add_reaction(&self, message: MessageId, emote: &Emote) -> Result<(), PlatformError>;

    /// Delete `message`.
    async fn delete_message(&self, message: MessageId) -> Result<(), PlatformError>;
}
