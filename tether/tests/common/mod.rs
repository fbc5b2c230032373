#![allow(dead_code)]

use std::sync::Arc;
use tether::{
    ChannelId, Context, Emote, EngineConfig, Interactions, MessageEvent, MessageId, ReactionEvent,
    UserId, testing::RecordingPlatform,
};

// ============================================================================
// Participants
// ============================================================================

pub const OWNER: UserId = UserId(1);
pub const STRANGER: UserId = UserId(2);
pub const BOT: UserId = UserId(99);
pub const CHANNEL: ChannelId = ChannelId(10);
pub const ELSEWHERE: ChannelId = ChannelId(11);

pub fn ctx() -> Context {
    Context::new(OWNER, CHANNEL)
}

// ============================================================================
// Engine and Events
// ============================================================================

pub fn engine(config: EngineConfig) -> (Interactions, RecordingPlatform) {
    let platform = RecordingPlatform::new().with_user(BOT);
    let engine = Interactions::new(Arc::new(platform.clone()), config);
    (engine, platform)
}

pub fn message(id: u64, author: UserId, content: &str) -> MessageEvent {
    MessageEvent {
        id: MessageId(id),
        author_id: author,
        channel_id: CHANNEL,
        content: content.to_string(),
    }
}

pub fn reaction(message: MessageId, user: UserId, emote: &str) -> ReactionEvent {
    ReactionEvent {
        message_id: message,
        author_id: user,
        channel_id: CHANNEL,
        emote: Emote::new(emote),
    }
}

/// Yield until `done` holds. Spawned tasks get to run in between.
pub async fn until(mut done: impl FnMut() -> bool) {
    while !done() {
        tokio::task::yield_now().await;
    }
}
