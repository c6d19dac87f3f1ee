//! Weft Core
//!
//! This crate provides the incremental recomputation engine for the Weft
//! reactive state graph. It implements:
//!
//! - Reactive primitives (atoms, snapshots, transactions)
//! - The `memo` engine: per-node, per-transaction recompute decisions with
//!   structural sharing of unchanged snapshots
//! - Selective invalidation by event type
//! - Deferred side-effect scheduling with two-phase execution
//! - A minimal store that drives transactions over the graph
//!
//! # Architecture
//!
//! The crate is organized into two modules:
//!
//! - `reactive`: atoms, snapshots, the tracking sandbox, and the recompute
//!   engine
//! - `store`: a node-graph store owning committed snapshots and dispatching
//!   transactions
//!
//! # Example
//!
//! ```rust,ignore
//! use weft_core::reactive::{value, Atom, EventType};
//! use weft_core::store::Store;
//!
//! let incr = EventType::new("incr");
//!
//! // An atom that accumulates increments.
//! let counter = Atom::new("counter", 0i32, move |track, state| {
//!     let mut n = *state.downcast_ref::<i32>().unwrap();
//!     track.on(incr, |payload, _event| {
//!         n += *payload.downcast_ref::<i32>().unwrap();
//!         None
//!     });
//!     value(n)
//! });
//!
//! let store = Store::new();
//! store.register(&counter);
//!
//! store.dispatch_one(incr.event(5));
//! assert_eq!(store.state_of(&counter).downcast_ref::<i32>(), Some(&5));
//!
//! // No matching event: the counter is not recomputed at all.
//! store.dispatch(vec![]);
//! ```

pub mod reactive;
pub mod store;
