//! Reactive primitives and the recompute engine.
//!
//! This module implements the core of Weft's incremental recomputation:
//! atoms, snapshots, transactions, and the `memo` engine that decides, per
//! node and per transaction, whether a computation has to run again.
//!
//! # Concepts
//!
//! ## Atoms
//!
//! An atom is a unit of reactive computation: an identity plus a pure
//! function deriving its state from other atoms and from events.
//!
//! ## Snapshots
//!
//! Each atom's last computed result, together with the dependencies that
//! produced it, lives in an immutable snapshot. Snapshots are compared by
//! object identity; an unchanged node keeps its snapshot allocation across
//! transactions, which lets everything downstream short-circuit.
//!
//! ## Transactions
//!
//! A transaction applies one batch of events across the graph. Nodes are
//! resolved at most once per transaction, and side effects triggered along
//! the way are queued on the transaction and executed only after all state
//! has settled.
//!
//! # Implementation Notes
//!
//! Dependencies are detected automatically: the computation function receives
//! a tracking handle and reads other atoms through it, so the dependency list
//! of a run is exactly the sequence of reads it performed. This approach
//! ("transparent reactivity") is shared with fine-grained UI frameworks, but
//! here it additionally records event-type subscriptions, giving every
//! snapshot a coarse invalidation index over event types.

mod atom;
mod event;
mod memo;
mod snapshot;
mod track;
mod transaction;
mod violation;

pub use atom::{Atom, Computer, NodeId};
pub use event::{Event, EventType};
pub use memo::memo;
pub use snapshot::{value, value_eq, Ctx, Dep, DepList, Snapshot, SnapshotRef, TypeSet, Value};
pub use track::Track;
pub use transaction::{Effect, Resolver, ScheduledEffect, Transaction};
pub use violation::TrackViolation;
