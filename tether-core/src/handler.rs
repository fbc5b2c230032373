//! # Reaction Handlers
//!
//! A reaction handler is the business logic bound to one emote on one
//! message. It receives the interaction context, the reaction that triggered
//! it and the outbound platform, and tells the registry whether the callback
//! set should stay attached.
//!
//! # Usage Patterns
//!
//! 1. **Direct closure**: `|input: ReactionInput| async move { ... }`
//! 2. **Struct implementation**: `impl ReactionHandler for MyHandler`
//!
//! # Static vs Dynamic Dispatch
//!
//! [`ReactionHandler`] uses a native `async fn` signature. Callback sets store
//! heterogeneous handlers, so they hold them as [`DynReactionHandler`], which
//! every `ReactionHandler` implements automatically.

use crate::{
    context::Context,
    error::BoxError,
    event::ReactionEvent,
    platform::Platform,
    response::{CallbackAction, IntoCallbackAction},
};
use std::{fmt, future::Future, pin::Pin, sync::Arc};

/// Everything a reaction handler gets to work with.
#[derive(Clone)]
pub struct ReactionInput {
    /// The context that owns the callback set.
    pub context: Context,
    /// The reaction that matched the binding.
    pub reaction: ReactionEvent,
    /// The outbound platform, for replies and edits.
    pub platform: Arc<dyn Platform>,
}

impl fmt::Debug for ReactionInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactionInput")
            .field("context", &self.context)
            .field("reaction", &self.reaction)
            .finish_non_exhaustive()
    }
}

/// Logic bound to a reaction emote.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `ReactionHandler`",
    label = "missing `ReactionHandler` implementation",
    note = "Use a closure `Fn(ReactionInput) -> impl Future` or implement `ReactionHandler`."
)]
pub trait ReactionHandler: Send + Sync + 'static {
    /// The handler's return value, usually `()`, `CallbackAction` or a `Result`.
    type Output: IntoCallbackAction + Send;

    /// Handle a matched reaction.
    fn call(&self, input: ReactionInput) -> impl Future<Output = Self::Output> + Send;
}

// Blanket impl for closures
impl<F, Fut> ReactionHandler for F
where
    F: Fn(ReactionInput) -> Fut + Send + Sync + 'static,
    Fut: Future + Send,
    Fut::Output: IntoCallbackAction + Send,
{
    type Output = Fut::Output;

    fn call(&self, input: ReactionInput) -> impl Future<Output = Self::Output> + Send {
        (self)(input)
    }
}

/// Dynamic object-safe version of [`ReactionHandler`].
pub trait DynReactionHandler: Send + Sync + 'static {
    /// Handle a matched reaction (dynamic dispatch version).
    fn call_dyn<'a>(
        &'a self,
        input: ReactionInput,
    ) -> Pin<Box<dyn Future<Output = Result<CallbackAction, BoxError>> + Send + 'a>>;
}

// Blanket implementation: any ReactionHandler implements DynReactionHandler.
impl<H: ReactionHandler> DynReactionHandler for H {
    fn call_dyn<'a>(
        &'a self,
        input: ReactionInput,
    ) -> Pin<Box<dyn Future<Output = Result<CallbackAction, BoxError>> + Send + 'a>> {
        Box::pin(async move { self.call(input).await.into_action() })
    }
}

/// A shared, type-erased reaction handler.
pub type SharedHandler = Arc<dyn DynReactionHandler>;
