//! Criteria on reaction emotes.

use tether_core::{Context, Criterion, Emote, ReactionEvent};

/// The reaction's emote is one of a permitted set.
#[derive(Debug, Clone, Default)]
pub struct EmoteIn {
    permitted: Vec<Emote>,
}

impl EmoteIn {
    /// Permit exactly `emotes`.
    pub fn new<I, T>(emotes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Emote>,
    {
        Self {
            permitted: emotes.into_iter().map(Into::into).collect(),
        }
    }

    /// The permitted emotes.
    pub fn permitted(&self) -> &[Emote] {
        &self.permitted
    }
}

impl Criterion<ReactionEvent> for EmoteIn {
    fn evaluate(&self, event: &ReactionEvent, _ctx: &Context) -> bool {
        self.permitted.contains(&event.emote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::{ChannelId, MessageId, UserId};

    #[test]
    fn membership() {
        let ctx = Context::new(UserId(1), ChannelId(1));
        let criterion = EmoteIn::new(["✅", "❌"]);
        let mut event = ReactionEvent {
            message_id: MessageId(1),
            author_id: UserId(1),
            channel_id: ChannelId(1),
            emote: Emote::new("✅"),
        };
        assert!(criterion.evaluate(&event, &ctx));

        event.emote = Emote::new("🔁");
        assert!(!criterion.evaluate(&event, &ctx));
        assert_eq!(criterion.permitted().len(), 2);
    }
}
