//! # tether-core
//!
//! Core traits and types for the Tether interactive reply engine.
//!
//! This crate has minimal dependencies and is meant to be imported by platform
//! adapters that only need to produce events and implement [`Platform`],
//! without pulling in the registries and the scheduler from `tether-std`.
//!
//! # Building Blocks
//!
//! - [`MessageEvent`] / [`ReactionEvent`]: the two inbound event kinds
//! - [`Context`]: who started an interaction, and where
//! - [`Criterion`]: pure predicates deciding whether an event is the awaited one
//! - [`ReactionHandler`]: logic bound to one emote on one message
//! - [`Platform`]: the outbound operations the engine is allowed to perform
//!
//! # Error Types
//!
//! - [`TetherError`] - Top-level error type
//! - [`PlatformError`] - Outbound call failures
//! - [`HandlerError`] - Reaction handler faults

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod context;
mod criterion;
mod error;
mod event;
mod handler;
mod message;
mod platform;
mod response;

// Re-exports
pub use context::Context;
pub use criterion::{AllOf, Always, And, BoxCriterion, Criterion};
pub use error::{
    BoxError, HandlerError, PaginatorError, PlatformError, SchedulerError, TetherError,
};
pub use event::{ChannelId, Emote, MessageEvent, MessageId, ReactionEvent, Sourced, UserId};
pub use handler::{DynReactionHandler, ReactionHandler, ReactionInput, SharedHandler};
pub use message::Message;
pub use platform::Platform;
pub use response::{CallbackAction, IntoCallbackAction};

// Platform implementations are written with `#[async_trait]`.
pub use async_trait::async_trait;
