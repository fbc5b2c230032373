//! Standard criteria.
//!
//! - [`FromSourceUser`] / [`InSourceChannel`]: relative to the interaction context
//! - [`FromUser`] / [`InChannel`]: fixed ids
//! - [`EmoteIn`]: reaction emote is one of a permitted set
//! - [`IsInteger`]: message content parses as an integer

pub mod content;
pub mod reaction;
pub mod source;

pub use content::IsInteger;
pub use reaction::EmoteIn;
pub use source::{FromSourceUser, FromUser, InChannel, InSourceChannel};
