//! A minimal node-graph store.
//!
//! The store owns the committed snapshot of every node and drives the
//! recompute engine. `dispatch` is the unit of work: it wraps a batch of
//! events in a transaction, resolves every registered atom through the
//! memoization contract (each node at most once per transaction, via a patch
//! table), commits the snapshots that changed, and only then drains the
//! deferred-effect queue. Effects therefore always observe a fully settled
//! graph, and may themselves dispatch follow-up transactions.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::reactive::{memo, Atom, Event, NodeId, Resolver, SnapshotRef, Transaction, Value};

/// Owns committed snapshots and dispatches transactions over the graph.
pub struct Store {
    /// Atoms resolved on every dispatch, in registration order.
    atoms: RwLock<Vec<Atom>>,
    /// Committed snapshot per node, replaced wholesale on change.
    snapshots: RwLock<HashMap<NodeId, SnapshotRef>>,
}

impl Store {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            atoms: RwLock::new(Vec::new()),
            snapshots: RwLock::new(HashMap::new()),
        }
    }

    /// Register an atom so every dispatch keeps it up to date.
    ///
    /// Unregistered atoms still resolve correctly when read as dependencies;
    /// registration only makes an atom a root of each transaction.
    pub fn register(&self, atom: &Atom) {
        let mut atoms = self.atoms.write();
        if atoms.iter().any(|known| known.id() == atom.id()) {
            return;
        }
        atoms.push(atom.clone());
        self.snapshots
            .write()
            .entry(atom.id())
            .or_insert_with(|| atom.initial_snapshot());
    }

    /// The committed snapshot of an atom (its initial snapshot if it has
    /// never been computed).
    pub fn snapshot_of(&self, atom: &Atom) -> SnapshotRef {
        self.snapshots
            .read()
            .get(&atom.id())
            .cloned()
            .unwrap_or_else(|| atom.initial_snapshot())
    }

    /// The committed state of an atom.
    pub fn state_of(&self, atom: &Atom) -> Value {
        self.snapshot_of(atom).state.clone()
    }

    /// Apply one batch of events across the graph, then run the effects it
    /// queued.
    pub fn dispatch(&self, events: Vec<Event>) {
        debug!(events = events.len(), "dispatching transaction");
        let scope = TransactionScope {
            store: self,
            patch: RefCell::new(HashMap::new()),
        };
        let tx = Transaction::new(&scope, events);

        let atoms = self.atoms.read().clone();
        for atom in &atoms {
            tx.resolve(atom, None);
        }

        let effects = tx.take_effects();
        drop(tx);
        let patch = scope.patch.into_inner();

        {
            let mut snapshots = self.snapshots.write();
            for (id, next) in patch {
                match snapshots.get(&id) {
                    Some(prev) if Arc::ptr_eq(prev, &next) => {}
                    _ => {
                        trace!(node = id.raw(), "committing snapshot");
                        snapshots.insert(id, next);
                    }
                }
            }
        }

        // State updates have settled; only now do queued effects run.
        if !effects.is_empty() {
            debug!(effects = effects.len(), "draining effect queue");
        }
        for effect in effects {
            effect(self);
        }
    }

    /// Dispatch a single event.
    pub fn dispatch_one(&self, event: Event) {
        self.dispatch(vec![event]);
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-transaction resolver: memoizes each node's resolution in a patch
/// table so repeated reads return the identical snapshot object.
struct TransactionScope<'s> {
    store: &'s Store,
    patch: RefCell<HashMap<NodeId, SnapshotRef>>,
}

impl Resolver for TransactionScope<'_> {
    fn resolve(
        &self,
        tx: &Transaction<'_>,
        atom: &Atom,
        known: Option<&SnapshotRef>,
    ) -> SnapshotRef {
        if let Some(done) = self.patch.borrow().get(&atom.id()) {
            return done.clone();
        }

        let prev = match known {
            Some(known) => known.clone(),
            None => self.store.snapshot_of(atom),
        };
        let computer = atom.computer();
        let next = memo(tx, &prev, |track, state| computer(track, state));

        self.patch.borrow_mut().insert(atom.id(), next.clone());
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{value, EventType};

    #[test]
    fn register_seeds_the_initial_snapshot() {
        let store = Store::new();
        let atom = Atom::new("a", 3i32, |_track, state| state);

        store.register(&atom);

        assert_eq!(store.state_of(&atom).downcast_ref::<i32>(), Some(&3));
    }

    #[test]
    fn register_is_idempotent() {
        let store = Store::new();
        let atom = Atom::new("a", 0i32, |_track, state| state);

        store.register(&atom);
        store.register(&atom);

        assert_eq!(store.atoms.read().len(), 1);
    }

    #[test]
    fn unregistered_atom_reads_initial_state() {
        let store = Store::new();
        let atom = Atom::new("a", 9i32, |_track, state| state);

        assert_eq!(store.state_of(&atom).downcast_ref::<i32>(), Some(&9));
    }

    #[test]
    fn noop_dispatch_preserves_snapshot_identity() {
        let tick = EventType::new("tick");
        let store = Store::new();
        let atom = Atom::new("a", 0i32, move |track, state| {
            let mut next = None;
            track.on(tick, |payload, _event| {
                next = Some(*payload.downcast_ref::<i32>().unwrap());
                None
            });
            match next {
                Some(n) => value(n),
                None => state,
            }
        });
        store.register(&atom);

        store.dispatch_one(tick.event(5i32));
        let first = store.snapshot_of(&atom);
        assert_eq!(first.state_as::<i32>(), Some(&5));

        store.dispatch(vec![]);
        let second = store.snapshot_of(&atom);
        assert!(Arc::ptr_eq(&first, &second));
    }
}
