//! # Criterion
//!
//! A criterion decides whether an inbound event satisfies a pending wait or a
//! callback set. Criteria are pure: they never mutate shared state, and the
//! same criterion evaluated twice against the same event and context gives the
//! same answer.
//!
//! Criteria are open for extension. Any `Fn(&E, &Context) -> bool` is a
//! criterion, and the standard primitives (source user, source channel,
//! permitted emotes, ...) live in `tether-std`.
//!
//! # Composition
//!
//! Criteria compose by conjunction only. [`Criterion::and`] builds a static
//! pair; [`AllOf`] holds a runtime list. Both evaluate left to right and stop
//! at the first failing criterion.

use crate::context::Context;
use std::{fmt, sync::Arc};

/// A pure predicate over an event of type `E` and the interaction context.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `Criterion` for `{E}`",
    label = "missing `Criterion` implementation",
    note = "Implement `Criterion<{E}>` or pass a closure `Fn(&{E}, &Context) -> bool`."
)]
pub trait Criterion<E>: Send + Sync + 'static {
    /// Return `true` when `event` satisfies this criterion.
    fn evaluate(&self, event: &E, ctx: &Context) -> bool;

    /// Require both this criterion and `other`.
    fn and<C>(self, other: C) -> And<Self, C>
    where
        Self: Sized,
        C: Criterion<E>,
    {
        And {
            first: self,
            second: other,
        }
    }

    /// Erase the concrete type.
    fn boxed(self) -> BoxCriterion<E>
    where
        Self: Sized,
        E: 'static,
    {
        BoxCriterion::new(self)
    }
}

impl<E, F> Criterion<E> for F
where
    F: Fn(&E, &Context) -> bool + Send + Sync + 'static,
{
    fn evaluate(&self, event: &E, ctx: &Context) -> bool {
        (self)(event, ctx)
    }
}

/// Conjunction of two criteria, built by [`Criterion::and`].
#[derive(Debug, Clone, Copy)]
pub struct And<A, B> {
    first: A,
    second: B,
}

impl<E, A, B> Criterion<E> for And<A, B>
where
    A: Criterion<E>,
    B: Criterion<E>,
{
    fn evaluate(&self, event: &E, ctx: &Context) -> bool {
        self.first.evaluate(event, ctx) && self.second.evaluate(event, ctx)
    }
}

/// Matches every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct Always;

impl<E> Criterion<E> for Always {
    fn evaluate(&self, _event: &E, _ctx: &Context) -> bool {
        true
    }
}

/// A type-erased, cheaply cloneable criterion.
pub struct BoxCriterion<E> {
    inner: Arc<dyn Criterion<E>>,
}

impl<E: 'static> BoxCriterion<E> {
    /// Erase `criterion`.
    pub fn new<C: Criterion<E>>(criterion: C) -> Self {
        Self {
            inner: Arc::new(criterion),
        }
    }
}

impl<E> Clone for BoxCriterion<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> fmt::Debug for BoxCriterion<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxCriterion").finish_non_exhaustive()
    }
}

impl<E: 'static> Criterion<E> for BoxCriterion<E> {
    fn evaluate(&self, event: &E, ctx: &Context) -> bool {
        self.inner.evaluate(event, ctx)
    }

    fn boxed(self) -> BoxCriterion<E> {
        self
    }
}

/// A runtime list of criteria that must all hold.
///
/// An empty list matches everything.
pub struct AllOf<E> {
    criteria: Vec<BoxCriterion<E>>,
}

impl<E: 'static> AllOf<E> {
    /// Create an empty conjunction.
    pub fn new() -> Self {
        Self {
            criteria: Vec::new(),
        }
    }

    /// Append a criterion; it is evaluated after the ones already present.
    pub fn with<C: Criterion<E>>(mut self, criterion: C) -> Self {
        self.push(criterion);
        self
    }

    /// Append a criterion (mutable version).
    pub fn push<C: Criterion<E>>(&mut self, criterion: C) {
        self.criteria.push(criterion.boxed());
    }

    /// Number of criteria in the conjunction.
    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    /// Whether the conjunction is empty.
    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

impl<E: 'static> Default for AllOf<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for AllOf<E> {
    fn clone(&self) -> Self {
        Self {
            criteria: self.criteria.clone(),
        }
    }
}

impl<E: 'static> Criterion<E> for AllOf<E> {
    fn evaluate(&self, event: &E, ctx: &Context) -> bool {
        self.criteria.iter().all(|c| c.evaluate(event, ctx))
    }
}
