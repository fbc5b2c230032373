//! Reaction callbacks.
//!
//! A [`CallbackSet`] binds emotes to handlers on one message; the
//! [`CallbackRegistry`] routes reaction events to the set attached to their
//! message.

pub mod registry;
pub mod set;

pub use registry::{CallbackRegistry, Generation, ReactionDispatch};
pub use set::{Binding, CallbackSet, Expiry, RemovalPolicy, TimeoutInput};
