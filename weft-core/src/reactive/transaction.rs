//! Transactions: one batch of events plus the deferred-effect queue.
//!
//! A transaction is the unit of change. It carries the events being applied,
//! delegates per-node resolution to a [`Resolver`], and collects the effects
//! scheduled during recomputation. Effects are only ever appended here; the
//! owning store drains them strictly after every snapshot of the transaction
//! has been committed, so an effect never observes a half-updated graph.

use std::cell::RefCell;

use super::atom::Atom;
use super::event::Event;
use super::snapshot::{Ctx, SnapshotRef};
use crate::store::Store;

/// A deferred side effect as returned by a tracking callback.
///
/// It receives the store handle and the owning node's context once the
/// transaction has settled.
pub type Effect = Box<dyn FnOnce(&Store, &Ctx) + Send>;

/// An effect already bound to its node's context, as held in the queue.
pub type ScheduledEffect = Box<dyn FnOnce(&Store) + Send>;

/// Resolves a node to its up-to-date snapshot within the current transaction.
///
/// Implementations must be idempotent per transaction: resolving the same
/// node twice returns the identical snapshot object. The store's resolver
/// applies the memoization contract recursively; tests substitute counting
/// stubs.
pub trait Resolver {
    /// Resolve `atom` under `tx`, optionally starting from a snapshot the
    /// caller already holds.
    fn resolve(&self, tx: &Transaction<'_>, atom: &Atom, known: Option<&SnapshotRef>)
        -> SnapshotRef;
}

/// One batch of events being applied across the graph.
pub struct Transaction<'a> {
    resolver: &'a dyn Resolver,
    events: Vec<Event>,
    effects: RefCell<Vec<ScheduledEffect>>,
}

impl<'a> Transaction<'a> {
    /// Create a transaction over the given events.
    pub fn new(resolver: &'a dyn Resolver, events: Vec<Event>) -> Self {
        Self {
            resolver,
            events,
            effects: RefCell::new(Vec::new()),
        }
    }

    /// The events of this batch, in dispatch order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Resolve a dependency node to its snapshot under this transaction.
    pub fn resolve(&self, atom: &Atom, known: Option<&SnapshotRef>) -> SnapshotRef {
        self.resolver.resolve(self, atom, known)
    }

    /// Append a deferred effect. Never executes it.
    pub fn schedule(&self, effect: ScheduledEffect) {
        self.effects.borrow_mut().push(effect);
    }

    /// Number of effects queued so far.
    pub fn pending_effects(&self) -> usize {
        self.effects.borrow().len()
    }

    /// Drain the effect queue, in append order.
    pub fn take_effects(&self) -> Vec<ScheduledEffect> {
        self.effects.take()
    }
}
