//! # tether-std
//!
//! Standard implementations for the Tether interactive reply engine.
//!
//! This crate provides:
//! - **Criteria**: [`FromSourceUser`](criteria::FromSourceUser), [`EmoteIn`](criteria::EmoteIn), [`IsInteger`](criteria::IsInteger) and friends
//! - **Pending waits**: [`PendingRegistry`](pending::PendingRegistry)
//! - **Reaction callbacks**: [`CallbackRegistry`](callbacks::CallbackRegistry), [`CallbackSet`](callbacks::CallbackSet)
//! - **Pagination**: [`Paginator`](paginator::Paginator)
//! - **Deadlines**: [`TimeoutScheduler`](scheduler::TimeoutScheduler)

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use tether_core;

// Modules
pub mod callbacks;
pub mod criteria;
pub mod paginator;
pub mod pending;
pub mod scheduler;
pub mod testing;
