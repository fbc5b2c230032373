//! Criteria on who produced an event and where.

use tether_core::{ChannelId, Context, Criterion, Sourced, UserId};

/// The event was produced by the user that started the interaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct FromSourceUser;

impl<E: Sourced> Criterion<E> for FromSourceUser {
    fn evaluate(&self, event: &E, ctx: &Context) -> bool {
        event.author_id() == ctx.user_id
    }
}

/// The event happened in the channel the interaction started in.
#[derive(Debug, Clone, Copy, Default)]
pub struct InSourceChannel;

impl<E: Sourced> Criterion<E> for InSourceChannel {
    fn evaluate(&self, event: &E, ctx: &Context) -> bool {
        event.channel_id() == ctx.channel_id
    }
}

/// The event was produced by a specific user.
#[derive(Debug, Clone, Copy)]
pub struct FromUser(pub UserId);

impl<E: Sourced> Criterion<E> for FromUser {
    fn evaluate(&self, event: &E, _ctx: &Context) -> bool {
        event.author_id() == self.0
    }
}

/// The event happened in a specific channel.
#[derive(Debug, Clone, Copy)]
pub struct InChannel(pub ChannelId);

impl<E: Sourced> Criterion<E> for InChannel {
    fn evaluate(&self, event: &E, _ctx: &Context) -> bool {
        event.channel_id() == self.0
    }
}
