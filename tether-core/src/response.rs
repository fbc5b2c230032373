//! Handler return values.

use crate::error::BoxError;

/// What a callback set should do after one of its handlers ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallbackAction {
    /// Stay attached and keep accepting reactions.
    #[default]
    Continue,
    /// Detach the callback set; later reactions on the message are not handled.
    Detach,
}

impl CallbackAction {
    /// Whether this action ends the callback set.
    pub const fn is_terminal(self) -> bool {
        matches!(self, CallbackAction::Detach)
    }
}

/// Trait for converting a handler's output into a [`CallbackAction`].
///
/// # Default Implementations
///
/// - `()` → Continue
/// - `bool` → `true` = Detach, `false` = Continue
/// - `CallbackAction` → As is
/// - `Option<T>` → `None` = Continue, otherwise delegates to `T`
/// - `Result<T, E>` → Delegates to inner `T` or propagates error
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an `IntoCallbackAction`",
    label = "missing `IntoCallbackAction` implementation",
    note = "Reaction handlers must return `()`, `bool`, `CallbackAction`, or a `Result` of one."
)]
pub trait IntoCallbackAction {
    /// Convert the output into a callback action or a handler error.
    fn into_action(self) -> Result<CallbackAction, BoxError>;
}

impl IntoCallbackAction for () {
    fn into_action(self) -> Result<CallbackAction, BoxError> {
        Ok(CallbackAction::Continue)
    }
}

impl IntoCallbackAction for bool {
    fn into_action(self) -> Result<CallbackAction, BoxError> {
        Ok(if self {
            CallbackAction::Detach
        } else {
            CallbackAction::Continue
        })
    }
}

impl IntoCallbackAction for CallbackAction {
    fn into_action(self) -> Result<CallbackAction, BoxError> {
        Ok(self)
    }
}

impl<T: IntoCallbackAction> IntoCallbackAction for Option<T> {
    fn into_action(self) -> Result<CallbackAction, BoxError> {
        match self {
            Some(t) => t.into_action(),
            None => Ok(CallbackAction::Continue),
        }
    }
}

impl<T, E> IntoCallbackAction for Result<T, E>
where
    T: IntoCallbackAction,
    E: Into<BoxError>,
{
    fn into_action(self) -> Result<CallbackAction, BoxError> {
        match self {
            Ok(t) => t.into_action(),
            Err(e) => Err(e.into()),
        }
    }
}
