//! Callback set construction.

use futures::future::BoxFuture;
use std::{fmt, future::Future, sync::Arc, time::Duration};
use tether_core::{
    AllOf, Always, BoxCriterion, Context, Criterion, Emote, MessageId, Platform, ReactionEvent,
    ReactionHandler, SharedHandler,
};

/// What to do with a reaction that the callback set does not accept.
///
/// Stripping rejected reactions keeps the message tidy but costs one outbound
/// call per rejected reaction, which counts against platform rate limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemovalPolicy {
    /// Leave rejected reactions on the message.
    #[default]
    Keep,
    /// Remove reactions that fail the criterion or have no binding.
    Remove,
}

/// When a callback set stops accepting reactions on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiry {
    /// Use the engine's configured default.
    #[default]
    Default,
    /// Expire this long after the set is attached.
    After(Duration),
    /// Never expire; the set stays until a handler detaches it.
    Never,
}

impl Expiry {
    /// Resolve against an engine default.
    pub fn or(self, default: Option<Duration>) -> Option<Duration> {
        match self {
            Expiry::Default => default,
            Expiry::After(timeout) => Some(timeout),
            Expiry::Never => None,
        }
    }
}

impl From<Duration> for Expiry {
    fn from(timeout: Duration) -> Self {
        Expiry::After(timeout)
    }
}

/// Passed to a callback set's timeout callback.
#[derive(Clone)]
pub struct TimeoutInput {
    /// The context that owned the expired set.
    pub context: Context,
    /// The message the set was attached to.
    pub message_id: MessageId,
    /// The outbound platform.
    pub platform: Arc<dyn Platform>,
}

impl fmt::Debug for TimeoutInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeoutInput")
            .field("context", &self.context)
            .field("message_id", &self.message_id)
            .finish_non_exhaustive()
    }
}

pub(crate) type TimeoutCallback =
    Box<dyn FnOnce(TimeoutInput) -> BoxFuture<'static, ()> + Send + Sync>;

/// One emote bound to one handler.
#[derive(Clone)]
pub struct Binding {
    emote: Emote,
    handler: SharedHandler,
}

impl Binding {
    /// The emote that triggers the handler.
    pub fn emote(&self) -> &Emote {
        &self.emote
    }

    pub(crate) fn handler(&self) -> SharedHandler {
        Arc::clone(&self.handler)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("emote", &self.emote)
            .finish_non_exhaustive()
    }
}

/// The reaction-triggered handlers of one message.
///
/// # Example
///
/// ```rust,ignore
/// let set = CallbackSet::new()
///     .bind("✅", |input: ReactionInput| async move { CallbackAction::Detach })
///     .bind("❌", |_| async {})
///     .with_criterion(FromSourceUser)
///     .expires_after(Duration::from_secs(30));
/// ```
pub struct CallbackSet {
    pub(crate) bindings: Vec<Binding>,
    pub(crate) criterion: BoxCriterion<ReactionEvent>,
    pub(crate) expiry: Expiry,
    pub(crate) removal: Option<RemovalPolicy>,
    pub(crate) expires_after_use: bool,
    pub(crate) single_use_per_user: bool,
    pub(crate) handler_timeout: Option<Duration>,
    pub(crate) on_timeout: Option<TimeoutCallback>,
}

impl Default for CallbackSet {
    fn default() -> Self {
        Self::new()
    }
}

impl CallbackSet {
    /// An empty set that accepts reactions from anyone.
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
            criterion: Always.boxed(),
            expiry: Expiry::Default,
            removal: None,
            expires_after_use: false,
            single_use_per_user: false,
            handler_timeout: None,
            on_timeout: None,
        }
    }

    /// Bind `handler` to `emote`.
    ///
    /// Bindings are matched in insertion order; if the same emote is bound
    /// twice, only the first binding ever runs.
    pub fn bind<H: ReactionHandler>(self, emote: impl Into<Emote>, handler: H) -> Self {
        self.bind_shared(emote, Arc::new(handler))
    }

    /// Bind an already shared handler to `emote`.
    pub fn bind_shared(mut self, emote: impl Into<Emote>, handler: SharedHandler) -> Self {
        self.bindings.push(Binding {
            emote: emote.into(),
            handler,
        });
        self
    }

    /// Only accept reactions that satisfy `criterion`.
    pub fn with_criterion<C: Criterion<ReactionEvent>>(mut self, criterion: C) -> Self {
        self.criterion = criterion.boxed();
        self
    }

    /// Additionally require `criterion`, on top of the one already set.
    pub fn require<C: Criterion<ReactionEvent>>(mut self, criterion: C) -> Self {
        self.criterion = AllOf::new()
            .with(self.criterion)
            .with(criterion)
            .boxed();
        self
    }

    /// Expire `timeout` after the set is attached.
    pub fn expires_after(mut self, timeout: Duration) -> Self {
        self.expiry = Expiry::After(timeout);
        self
    }

    /// Set the expiry explicitly.
    pub fn with_expiry(mut self, expiry: Expiry) -> Self {
        self.expiry = expiry;
        self
    }

    /// Override the engine's removal policy for this set.
    pub fn with_removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.removal = Some(policy);
        self
    }

    /// Detach after the first successfully handled reaction.
    pub fn expires_after_use(mut self, enabled: bool) -> Self {
        self.expires_after_use = enabled;
        self
    }

    /// Let each user trigger the set at most once.
    pub fn single_use_per_user(mut self, enabled: bool) -> Self {
        self.single_use_per_user = enabled;
        self
    }

    /// Treat a handler that runs longer than `limit` as faulted.
    pub fn with_handler_timeout(mut self, limit: Duration) -> Self {
        self.handler_timeout = Some(limit);
        self
    }

    /// Run `callback` when the set expires. Not run when a handler detaches it.
    pub fn on_timeout<F, Fut>(mut self, callback: F) -> Self
    where
        F: FnOnce(TimeoutInput) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_timeout = Some(Box::new(move |input| -> BoxFuture<'static, ()> {
            Box::pin(callback(input))
        }));
        self
    }

    /// The configured expiry.
    pub fn expiry(&self) -> Expiry {
        self.expiry
    }

    /// The handler time limit, if one was set.
    pub fn handler_timeout(&self) -> Option<Duration> {
        self.handler_timeout
    }

    /// All bindings in insertion order.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// The distinct bound emotes, in the order they were first bound.
    pub fn emotes(&self) -> Vec<Emote> {
        let mut emotes: Vec<Emote> = Vec::with_capacity(self.bindings.len());
        for binding in &self.bindings {
            if !emotes.contains(&binding.emote) {
                emotes.push(binding.emote.clone());
            }
        }
        emotes
    }

    /// The binding that handles `emote`: the earliest one bound to it.
    pub fn find(&self, emote: &Emote) -> Option<&Binding> {
        self.bindings.iter().find(|binding| &binding.emote == emote)
    }
}

impl fmt::Debug for CallbackSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackSet")
            .field("bindings", &self.bindings)
            .field("expiry", &self.expiry)
            .field("removal", &self.removal)
            .field("expires_after_use", &self.expires_after_use)
            .field("single_use_per_user", &self.single_use_per_user)
            .field("handler_timeout", &self.handler_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::{CallbackAction, ReactionInput};

    #[test]
    fn duplicate_emotes_resolve_to_the_first_binding() {
        let set = CallbackSet::new()
            .bind("✅", |_: ReactionInput| async { CallbackAction::Detach })
            .bind("❌", |_: ReactionInput| async {})
            .bind("✅", |_: ReactionInput| async {});

        assert_eq!(set.bindings().len(), 3);
        assert_eq!(set.emotes(), vec![Emote::new("✅"), Emote::new("❌")]);

        let found = set.find(&Emote::new("✅")).unwrap();
        assert!(Arc::ptr_eq(&found.handler, &set.bindings()[0].handler));
        assert!(set.find(&Emote::new("🔁")).is_none());
    }

    #[test]
    fn expiry_resolution() {
        let default = Some(Duration::from_secs(15));
        assert_eq!(Expiry::Default.or(default), default);
        assert_eq!(
            Expiry::After(Duration::from_secs(3)).or(default),
            Some(Duration::from_secs(3))
        );
        assert_eq!(Expiry::Never.or(default), None);
        assert_eq!(
            Expiry::from(Duration::from_secs(5)),
            Expiry::After(Duration::from_secs(5))
        );
    }

    #[test]
    fn required_criteria_stack() {
        use tether_core::{ChannelId, UserId};

        let set = CallbackSet::new()
            .with_criterion(|event: &ReactionEvent, _: &Context| event.emote.as_str() == "✅")
            .require(|event: &ReactionEvent, ctx: &Context| event.author_id == ctx.user_id);
        let ctx = Context::new(UserId(1), ChannelId(10));
        let event = |user: u64, emote: &str| ReactionEvent {
            message_id: MessageId(5),
            author_id: UserId(user),
            channel_id: ChannelId(10),
            emote: Emote::new(emote),
        };

        assert!(set.criterion.evaluate(&event(1, "✅"), &ctx));
        assert!(!set.criterion.evaluate(&event(2, "✅"), &ctx));
        assert!(!set.criterion.evaluate(&event(1, "❌"), &ctx));
    }
}
