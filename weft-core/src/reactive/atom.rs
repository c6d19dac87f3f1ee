//! Atoms: node identity plus the pure computation that derives their state.
//!
//! An atom is self-describing: it bundles a unique ID, a diagnostic name, the
//! initial state, an optional effect context, and the computation function.
//! That keeps dependency resolution registry-free: a recorded dependency
//! carries the atom handle itself, so any resolver can recompute it.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::snapshot::{Ctx, Snapshot, SnapshotRef, Value};
use super::track::Track;

/// Unique identifier for a node in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique node ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// A node's pure computation function.
///
/// It receives the tracking handle (the only sanctioned way to read other
/// nodes or observe events) and the previous state, and returns the new
/// state. Returning the previous state unchanged (same allocation) tells the
/// engine nothing happened.
pub type Computer = Arc<dyn for<'t> Fn(&Track<'t>, Value) -> Value + Send + Sync>;

struct AtomInner {
    id: NodeId,
    name: &'static str,
    initial: Value,
    ctx: Ctx,
    computer: Computer,
}

/// A reactive computation node.
///
/// Cheap to clone; clones share identity.
#[derive(Clone)]
pub struct Atom {
    inner: Arc<AtomInner>,
}

impl Atom {
    /// Create a new atom with the given name, initial state, and computation.
    pub fn new<T, F>(name: &'static str, initial: T, computer: F) -> Self
    where
        T: Send + Sync + 'static,
        F: for<'t> Fn(&Track<'t>, Value) -> Value + Send + Sync + 'static,
    {
        Self::with_ctx(name, initial, Arc::new(()), computer)
    }

    /// Like [`Atom::new`], with a caller-supplied context that is handed to
    /// this atom's deferred effects. The engine never looks inside it.
    pub fn with_ctx<T, F>(name: &'static str, initial: T, ctx: Ctx, computer: F) -> Self
    where
        T: Send + Sync + 'static,
        F: for<'t> Fn(&Track<'t>, Value) -> Value + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(AtomInner {
                id: NodeId::new(),
                name,
                initial: Arc::new(initial),
                ctx,
                computer: Arc::new(computer),
            }),
        }
    }

    /// Get the atom's unique ID.
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// Get the diagnostic name.
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Get a handle to the computation function.
    pub fn computer(&self) -> Computer {
        Arc::clone(&self.inner.computer)
    }

    /// The snapshot this atom holds before its first recomputation.
    ///
    /// Its dependency list is empty, so the first resolution always runs the
    /// computation.
    pub fn initial_snapshot(&self) -> SnapshotRef {
        Snapshot::initial_with_ctx(self.inner.initial.clone(), self.inner.ctx.clone())
    }
}

impl PartialEq for Atom {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Atom {}

impl Debug for Atom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Atom")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .finish()
    }
}
