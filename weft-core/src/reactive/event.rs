//! Event types and events.
//!
//! An event is an external occurrence applied to the graph as part of a
//! transaction. Nodes subscribe to events coarsely, by event type: a node
//! that tracked a type is a candidate for recomputation whenever a matching
//! event shows up in a later transaction.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::snapshot::Value;

/// Identifier for a kind of event.
///
/// Each call to [`EventType::new`] produces a distinct identifier. The name
/// is carried for diagnostics only; equality is by the generated ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventType {
    id: u64,
    name: &'static str,
}

impl EventType {
    /// Create a new unique event type with the given diagnostic name.
    pub fn new(name: &'static str) -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self {
            id: COUNTER.fetch_add(1, Ordering::Relaxed),
            name,
        }
    }

    /// Get the diagnostic name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Build an event of this type carrying the given payload.
    pub fn event<T: Send + Sync + 'static>(self, payload: T) -> Event {
        Event {
            ty: self,
            payload: Arc::new(payload),
        }
    }
}

/// One occurrence of an event: a type identifier plus an opaque payload.
#[derive(Clone)]
pub struct Event {
    /// The type of this event.
    pub ty: EventType,
    /// The payload, type-erased like node state.
    pub payload: Value,
}

impl Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event").field("ty", &self.ty).finish()
    }
}
