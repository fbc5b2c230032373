//! # tether - Interactive Replies for Chat Bots
//!
//! `tether` lets a command handler suspend until a correlated follow-up
//! arrives (the requester's next message, or a reaction on a message the bot
//! sent) and drives reaction-controlled messages such as paginators. It is
//! independent of any chat platform: the platform adapter feeds in two event
//! streams and implements [`Platform`] for the outbound side.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tether::prelude::*;
//!
//! let engine = Interactions::new(Arc::new(MyPlatform::new()), EngineConfig::new());
//! tokio::spawn({
//!     let engine = engine.clone();
//!     async move { engine.run(messages, reactions).await }
//! });
//!
//! // Ask a question and wait for the answer.
//! let ctx = Context::from_message(&command);
//! let answer = engine
//!     .wait_for_next_message_from(ctx, true, true, Duration::from_secs(15))
//!     .await?;
//!
//! // React-to-confirm.
//! let set = CallbackSet::new()
//!     .bind("✅", |input: ReactionInput| async move { CallbackAction::Detach })
//!     .bind("❌", |_: ReactionInput| async { CallbackAction::Detach });
//! engine.send_with_reaction_callbacks(ctx, "Sure?", set, true).await?;
//!
//! // Pages.
//! engine.send_paginated(ctx, Paginator::new(pages), Always).await?;
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod config;
mod engine;

pub use config::EngineConfig;
pub use engine::{Interactions, ReactionRoute};

pub use tether_core::{
    // Criteria
    AllOf,
    Always,
    And,
    BoxCriterion,
    // Errors
    BoxError,
    // Response
    CallbackAction,
    // Events
    ChannelId,
    Context,
    Criterion,
    // Handler
    DynReactionHandler,
    Emote,
    HandlerError,
    IntoCallbackAction,
    Message,
    MessageEvent,
    MessageId,
    PaginatorError,
    // Platform
    Platform,
    PlatformError,
    ReactionEvent,
    ReactionHandler,
    ReactionInput,
    SchedulerError,
    SharedHandler,
    Sourced,
    TetherError,
    UserId,
    async_trait,
};

pub use tether_std::{
    callbacks::{CallbackSet, Expiry, ReactionDispatch, RemovalPolicy, TimeoutInput},
    paginator::{NavigationReactions, PageAction, Paginator},
    pending::{WaitHandle, WaitId, WaitOutcome},
};

/// Standard criteria.
pub mod criteria {
    #![allow(clippy::wildcard_imports)]
    pub use tether_std::criteria::*;
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use tether_std::testing::*;
}

/// Prelude module - common imports for Tether.
///
/// # Usage
///
/// ```rust,ignore
/// use tether::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Always,
        // Callbacks
        CallbackAction,
        CallbackSet,
        Context,
        // Core traits
        Criterion,
        // Engine
        EngineConfig,
        Expiry,
        Interactions,
        MessageEvent,
        Paginator,
        Platform,
        ReactionEvent,
        ReactionHandler,
        ReactionInput,
        RemovalPolicy,
        // Errors
        TetherError,
        WaitOutcome,
        criteria::{FromSourceUser, InSourceChannel},
    };
}
