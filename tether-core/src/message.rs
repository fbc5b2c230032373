//! Message trait for inbound event types.

/// A marker trait for inbound platform events.
///
/// Events must be `Clone + Send + Sync + 'static`: a matched event is handed
/// to the waiting caller by value while the registry keeps evaluating the
/// original against other entries.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Clone, Debug)]
/// struct ButtonPressed { message_id: MessageId, user: UserId }
///
/// impl Message for ButtonPressed {}
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid inbound Message",
    label = "must be `Clone + Send + Sync + 'static`",
    note = "Inbound events in Tether are cloned into wait handles and shared across tasks."
)]
pub trait Message: Clone + Send + Sync + 'static {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{MessageEvent, ReactionEvent};

    fn routable<M: Message>() {}

    #[test]
    fn inbound_events_are_messages() {
        routable::<MessageEvent>();
        routable::<ReactionEvent>();
    }
}
