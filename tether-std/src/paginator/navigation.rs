//! Navigation vocabulary.

use std::fmt;
use tether_core::Emote;

/// A navigation action triggered by a reaction on a paginated message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageAction {
    /// Go to the first page.
    First,
    /// Go back one page.
    Previous,
    /// Go forward one page.
    Next,
    /// Go to the last page.
    Last,
    /// Stop the paginator and detach it from the message.
    Stop,
    /// Ask the requester for a page number and go there.
    Jump,
    /// Post a short help text that deletes itself.
    Info,
}

impl PageAction {
    /// The emote used for this action unless configured otherwise.
    pub fn default_emote(self) -> Emote {
        let emote = match self {
            PageAction::First => "⏮",
            PageAction::Previous => "◀",
            PageAction::Next => "▶",
            PageAction::Last => "⏭",
            PageAction::Stop => "⏹",
            PageAction::Jump => "🔢",
            PageAction::Info => "ℹ",
        };
        Emote::new(emote)
    }
}

impl fmt::Display for PageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PageAction::First => "first",
            PageAction::Previous => "previous",
            PageAction::Next => "next",
            PageAction::Last => "last",
            PageAction::Stop => "stop",
            PageAction::Jump => "jump",
            PageAction::Info => "info",
        };
        f.write_str(name)
    }
}

/// The permitted navigation actions and the emote bound to each, in the
/// order the reactions are seeded on the message.
///
/// The default is first, previous, next, last and stop. Jump and info are
/// opt-in.
///
/// # Example
///
/// ```rust,ignore
/// let navigation = NavigationReactions::default()
///     .without(PageAction::First)
///     .without(PageAction::Last)
///     .with(PageAction::Jump, "🔢");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationReactions {
    actions: Vec<(PageAction, Emote)>,
}

impl NavigationReactions {
    /// No actions at all.
    pub fn empty() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    /// Enable `action` on `emote`. Enabling an action twice rebinds it in
    /// place.
    pub fn with(mut self, action: PageAction, emote: impl Into<Emote>) -> Self {
        let emote = emote.into();
        match self.actions.iter_mut().find(|(a, _)| *a == action) {
            Some(slot) => slot.1 = emote,
            None => self.actions.push((action, emote)),
        }
        self
    }

    /// Enable `action` on its default emote.
    pub fn with_default(self, action: PageAction) -> Self {
        self.with(action, action.default_emote())
    }

    /// Disable `action`.
    pub fn without(mut self, action: PageAction) -> Self {
        self.actions.retain(|(a, _)| *a != action);
        self
    }

    /// Whether `action` is enabled.
    pub fn contains(&self, action: PageAction) -> bool {
        self.actions.iter().any(|(a, _)| *a == action)
    }

    /// The emote `action` is bound to.
    pub fn emote_for(&self, action: PageAction) -> Option<&Emote> {
        self.actions
            .iter()
            .find(|(a, _)| *a == action)
            .map(|(_, emote)| emote)
    }

    /// Enabled actions in seeding order.
    pub fn iter(&self) -> impl Iterator<Item = (PageAction, &Emote)> {
        self.actions.iter().map(|(action, emote)| (*action, emote))
    }

    /// Number of enabled actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether no action is enabled.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl Default for NavigationReactions {
    fn default() -> Self {
        [
            PageAction::First,
            PageAction::Previous,
            PageAction::Next,
            PageAction::Last,
            PageAction::Stop,
        ]
        .into_iter()
        .fold(Self::empty(), Self::with_default)
    }
}
