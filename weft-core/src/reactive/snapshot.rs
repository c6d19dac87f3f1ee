//! Snapshots and dependency descriptors.
//!
//! A snapshot is the immutable record of one recomputation: the node's
//! computed state, the dependencies that produced it (in the exact order they
//! were read), the node's opaque context, and the set of event types that may
//! invalidate it. A snapshot is never mutated in place; a change always means
//! a brand-new snapshot object.
//!
//! Identity is the comparison primitive everywhere in this module. Two states
//! are "the same" iff they are the same allocation (`Arc::ptr_eq`), and the
//! engine returns the previous snapshot object itself whenever nothing
//! observable changed. Downstream nodes rely on that pointer identity to
//! short-circuit their own recomputation, which is why deep equality is never
//! used here: it would make "unchanged" expensive exactly where it has to be
//! free.

use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

use indexmap::IndexSet;
use smallvec::SmallVec;

use super::atom::Atom;
use super::event::EventType;

/// Type-erased node state. Compared by allocation identity, never by value.
pub type Value = Arc<dyn Any + Send + Sync>;

/// Opaque per-node context, carried across recomputations untouched.
pub type Ctx = Arc<dyn Any + Send + Sync>;

/// The coarse invalidation index: event types that may invalidate a snapshot.
///
/// Shared by reference so an unchanged set costs nothing to carry forward.
pub type TypeSet = Arc<IndexSet<EventType>>;

/// Ordered dependency list. Most nodes read only a handful of dependencies,
/// so the common case stays inline.
pub type DepList = SmallVec<[Dep; 4]>;

/// Shared handle to an immutable snapshot.
pub type SnapshotRef = Arc<Snapshot>;

/// Wrap a plain value into erased node state.
pub fn value<T: Send + Sync + 'static>(v: T) -> Value {
    Arc::new(v)
}

/// Identity comparison for erased state.
pub fn value_eq(a: &Value, b: &Value) -> bool {
    Arc::ptr_eq(a, b)
}

/// One recorded dependency of a recomputation run.
#[derive(Clone)]
pub enum Dep {
    /// A read of another node, together with the snapshot observed at read
    /// time.
    Node { atom: Atom, cache: SnapshotRef },
    /// A subscription to an event type. No payload is captured; the type
    /// alone decides future invalidation.
    Event { ty: EventType },
}

impl Debug for Dep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dep::Node { atom, .. } => f.debug_tuple("Node").field(&atom.name()).finish(),
            Dep::Event { ty } => f.debug_tuple("Event").field(&ty.name()).finish(),
        }
    }
}

/// A node's last computed result and the bookkeeping that produced it.
pub struct Snapshot {
    /// Dependencies in the order the computation read them.
    pub deps: DepList,
    /// The computed state.
    pub state: Value,
    /// Caller-supplied context, never inspected by the engine.
    pub ctx: Ctx,
    /// Event types that may invalidate this snapshot, unioned bottom-up from
    /// the dependencies.
    pub types: TypeSet,
}

impl Snapshot {
    /// The snapshot of a node that has never been computed: no dependencies,
    /// the initial state, an empty type set.
    pub fn initial(state: Value) -> SnapshotRef {
        Self::initial_with_ctx(state, Arc::new(()))
    }

    /// Like [`Snapshot::initial`] with a caller-supplied context.
    pub fn initial_with_ctx(state: Value, ctx: Ctx) -> SnapshotRef {
        Arc::new(Snapshot {
            deps: DepList::new(),
            state,
            ctx,
            types: Arc::new(IndexSet::new()),
        })
    }

    /// Downcast the state to a concrete type.
    pub fn state_as<T: 'static>(&self) -> Option<&T> {
        self.state.downcast_ref()
    }
}

impl Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("deps", &self.deps)
            .field("types", &self.types)
            .finish()
    }
}
