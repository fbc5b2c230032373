//! Paginated messages.
//!
//! A [`Paginator`] becomes an ordinary [`CallbackSet`](crate::callbacks::CallbackSet)
//! whose handlers share one [`PaginatorState`]. Index moves are pure
//! ([`PaginatorState::apply`]); the handlers only turn a changed index into an
//! edit of the message.

pub mod controller;
pub mod navigation;
pub mod state;

pub use controller::{PageServices, Paginator};
pub use navigation::{NavigationReactions, PageAction};
pub use state::{PaginatorState, Transition};
