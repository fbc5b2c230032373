//! Pure page-index state machine.

use super::navigation::PageAction;
use std::sync::Arc;
use tether_core::MessageId;

/// Result of applying a navigation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The index changed; the message must be edited.
    Moved {
        /// Index before the move.
        from: usize,
        /// Index after the move.
        to: usize,
    },
    /// The index did not change; nothing is sent.
    Unchanged,
    /// The paginator stops and detaches.
    Stop,
}

/// Pages and the current position of one paginated message.
///
/// `index` is always within `0..page_count()`.
#[derive(Debug, Clone)]
pub struct PaginatorState {
    pages: Arc<[String]>,
    index: usize,
    message_id: MessageId,
    wrap_around: bool,
}

impl PaginatorState {
    /// Start at page 0. Returns `None` for an empty page list.
    pub fn new(pages: Arc<[String]>, message_id: MessageId, wrap_around: bool) -> Option<Self> {
        if pages.is_empty() {
            return None;
        }
        Some(Self {
            pages,
            index: 0,
            message_id,
            wrap_around,
        })
    }

    /// The message showing the pages.
    pub fn message_id(&self) -> MessageId {
        self.message_id
    }

    /// The current zero-based index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Content of the current page.
    pub fn current(&self) -> &str {
        &self.pages[self.index]
    }

    /// Apply `action`.
    ///
    /// Jump and info never move the index on their own; jump goes through
    /// [`jump_to`](Self::jump_to) once the page number is known.
    pub fn apply(&mut self, action: PageAction) -> Transition {
        let last = self.pages.len() - 1;
        let target = match action {
            PageAction::First => 0,
            PageAction::Last => last,
            PageAction::Previous => match self.index {
                0 if self.wrap_around => last,
                i => i.saturating_sub(1),
            },
            PageAction::Next => match self.index {
                i if i == last && self.wrap_around => 0,
                i => (i + 1).min(last),
            },
            PageAction::Stop => return Transition::Stop,
            PageAction::Jump | PageAction::Info => return Transition::Unchanged,
        };
        self.move_to(target)
    }

    /// Go to the one-based page `page`, clamped into range.
    pub fn jump_to(&mut self, page: i64) -> Transition {
        let count = self.pages.len() as i64;
        let target = page.clamp(1, count) - 1;
        self.move_to(target as usize)
    }

    fn move_to(&mut self, target: usize) -> Transition {
        if target == self.index {
            return Transition::Unchanged;
        }
        let from = self.index;
        self.index = target;
        Transition::Moved { from, to: target }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(pages: usize, wrap: bool) -> PaginatorState {
        let pages: Arc<[String]> = (1..=pages).map(|i| format!("page {i}")).collect();
        PaginatorState::new(pages, MessageId(1), wrap).unwrap()
    }

    #[test]
    fn empty_pages_are_rejected() {
        assert!(PaginatorState::new(Arc::from(Vec::new()), MessageId(1), false).is_none());
    }

    #[test]
    fn moves_saturate_at_both_ends() {
        let mut s = state(3, false);
        assert_eq!(s.apply(PageAction::Previous), Transition::Unchanged);
        assert_eq!(s.apply(PageAction::First), Transition::Unchanged);
        assert_eq!(s.apply(PageAction::Last), Transition::Moved { from: 0, to: 2 });
        assert_eq!(s.apply(PageAction::Next), Transition::Unchanged);
        assert_eq!(s.index(), 2);
        assert_eq!(s.current(), "page 3");
    }

    #[test]
    fn next_next_previous() {
        let mut s = state(3, false);
        s.apply(PageAction::Next);
        s.apply(PageAction::Next);
        assert_eq!(s.apply(PageAction::Previous), Transition::Moved { from: 2, to: 1 });
        assert_eq!(s.index(), 1);
    }

    #[test]
    fn wrap_around_at_the_ends() {
        let mut s = state(3, true);
        assert_eq!(s.apply(PageAction::Previous), Transition::Moved { from: 0, to: 2 });
        assert_eq!(s.apply(PageAction::Next), Transition::Moved { from: 2, to: 0 });
    }

    #[test]
    fn single_page_never_moves() {
        let mut s = state(1, true);
        assert_eq!(s.apply(PageAction::Next), Transition::Unchanged);
        assert_eq!(s.apply(PageAction::Previous), Transition::Unchanged);
    }

    #[test]
    fn stop_and_passive_actions() {
        let mut s = state(3, false);
        assert_eq!(s.apply(PageAction::Stop), Transition::Stop);
        assert_eq!(s.apply(PageAction::Info), Transition::Unchanged);
        assert_eq!(s.apply(PageAction::Jump), Transition::Unchanged);
        assert_eq!(s.index(), 0);
    }

    #[test]
    fn jump_is_one_based_and_clamped() {
        let mut s = state(5, false);
        assert_eq!(s.jump_to(3), Transition::Moved { from: 0, to: 2 });
        assert_eq!(s.jump_to(99), Transition::Moved { from: 2, to: 4 });
        assert_eq!(s.jump_to(-7), Transition::Moved { from: 4, to: 0 });
        assert_eq!(s.jump_to(1), Transition::Unchanged);
    }
}
