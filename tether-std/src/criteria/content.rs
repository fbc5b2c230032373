//! Criteria on message content.

use tether_core::{Context, Criterion, MessageEvent};

/// The message content, trimmed, parses as a signed integer.
#[derive(Debug, Clone, Copy, Default)]
pub struct IsInteger;

impl Criterion<MessageEvent> for IsInteger {
    fn evaluate(&self, event: &MessageEvent, _ctx: &Context) -> bool {
        event.content.trim().parse::<i64>().is_ok()
    }
}
