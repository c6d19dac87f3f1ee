//! The tracking handle: the sandboxed read API of a recomputation run.
//!
//! A computation function receives a [`Track`] and may read other nodes or
//! subscribe to events only through it. While the computation runs, the
//! handle accumulates the dependency list of the run and three change flags
//! (order / cache / types) that the engine folds into the result.
//!
//! The handle carries a per-run depth counter rather than any global state:
//! depth 1 is a direct read from the computation body, depth above 1 is a
//! read issued from inside a tracking callback. Callbacks may perform bare
//! reads, but registering further dependencies or event handlers from one is
//! a protocol violation. After the computation returns the handle expires
//! permanently; any later call (a stray callback that captured a clone) is
//! rejected.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use super::atom::Atom;
use super::event::{Event, EventType};
use super::snapshot::{value_eq, Dep, DepList, SnapshotRef, Value};
use super::transaction::{Effect, Transaction};
use super::violation::{violation, TrackViolation};

enum Depth {
    Level(u32),
    Expired,
}

struct Frame<'t> {
    tx: &'t Transaction<'t>,
    prev: SnapshotRef,
    patch_deps: DepList,
    order_changed: bool,
    cache_changed: bool,
    types_changed: bool,
    depth: Depth,
}

/// Sandboxed read handle handed to a computation function for one run.
///
/// Cloneable so callbacks can capture it; every clone shares the same run
/// state and expires together.
pub struct Track<'t> {
    frame: Rc<RefCell<Frame<'t>>>,
}

impl Clone for Track<'_> {
    fn clone(&self) -> Self {
        Self {
            frame: Rc::clone(&self.frame),
        }
    }
}

// Decrements the depth counter on every exit path, including unwinding out
// of a violation raised further down.
struct DepthGuard<'a, 't>(&'a Track<'t>);

impl Drop for DepthGuard<'_, '_> {
    fn drop(&mut self) {
        let mut frame = self.0.frame.borrow_mut();
        if let Depth::Level(n) = frame.depth {
            frame.depth = Depth::Level(n.saturating_sub(1));
        }
    }
}

impl<'t> Track<'t> {
    pub(crate) fn begin(
        tx: &'t Transaction<'t>,
        prev: SnapshotRef,
        patch_deps: DepList,
        cache_changed: bool,
        types_changed: bool,
    ) -> Self {
        Self {
            frame: Rc::new(RefCell::new(Frame {
                tx,
                prev,
                patch_deps,
                order_changed: false,
                cache_changed,
                types_changed,
                depth: Depth::Level(0),
            })),
        }
    }

    /// Expire the handle and hand the run's bookkeeping back to the engine.
    /// Returns `(deps, order_changed, cache_changed, types_changed)`.
    pub(crate) fn finish(&self) -> (DepList, bool, bool, bool) {
        let mut frame = self.frame.borrow_mut();
        frame.depth = Depth::Expired;
        (
            std::mem::take(&mut frame.patch_deps),
            frame.order_changed,
            frame.cache_changed,
            frame.types_changed,
        )
    }

    /// Read a node dependency.
    ///
    /// At depth 1 this records the dependency; from inside a callback it is a
    /// bare read that registers nothing.
    pub fn get(&self, atom: &Atom) -> Value {
        self.track_node(atom, None::<fn(&Value) -> Option<Effect>>)
    }

    /// Read a node dependency with a change callback.
    ///
    /// The callback fires iff the dependency order changed at this position
    /// or the resolved state differs by identity from the state recorded at
    /// this position last run. A `Some(effect)` return is queued on the
    /// transaction; `None` means no effect.
    pub fn watch<F>(&self, atom: &Atom, cb: F) -> Value
    where
        F: FnOnce(&Value) -> Option<Effect>,
    {
        self.track_node(atom, Some(cb))
    }

    /// Subscribe to an event type.
    ///
    /// The callback fires once per matching event in the transaction, in
    /// dispatch order, each `Some(effect)` queued separately. It may fire
    /// several times in one run, or not at all.
    pub fn on<F>(&self, ty: EventType, mut cb: F)
    where
        F: FnMut(&Value, &Event) -> Option<Effect>,
    {
        let depth = self.enter();
        let _guard = DepthGuard(self);
        if depth != 1 {
            violation(TrackViolation::NestedEventHandling);
        }

        let prev = self.frame.borrow().prev.clone();
        let mut frame = self.frame.borrow_mut();
        let pos = frame.patch_deps.len();
        let same_event = matches!(prev.deps.get(pos), Some(Dep::Event { ty: p }) if *p == ty);
        frame.order_changed |= !same_event;
        let order_changed = frame.order_changed;
        frame.types_changed |= order_changed;
        frame.patch_deps.push(Dep::Event { ty });
        let tx = frame.tx;
        drop(frame);

        for event in tx.events() {
            if event.ty == ty {
                if let Some(effect) = cb(&event.payload, event) {
                    self.schedule(effect, &prev);
                }
            }
        }
    }

    fn track_node<F>(&self, atom: &Atom, cb: Option<F>) -> Value
    where
        F: FnOnce(&Value) -> Option<Effect>,
    {
        let depth = self.enter();
        let _guard = DepthGuard(self);

        let tx = self.frame.borrow().tx;
        let patch = tx.resolve(atom, None);

        if depth != 1 {
            if cb.is_some() {
                violation(TrackViolation::NestedTrackingCallback);
            }
            return patch.state.clone();
        }

        let prev = self.frame.borrow().prev.clone();
        let mut frame = self.frame.borrow_mut();
        let pos = frame.patch_deps.len();
        let prev_dep = prev.deps.get(pos);
        let same_node = matches!(prev_dep, Some(Dep::Node { atom: p, .. }) if p.id() == atom.id());
        frame.order_changed |= !same_node;
        let order_changed = frame.order_changed;
        if order_changed {
            frame.cache_changed = true;
            frame.types_changed = true;
        } else if let Some(Dep::Node { cache, .. }) = prev_dep {
            frame.cache_changed |= !Arc::ptr_eq(cache, &patch);
            frame.types_changed |= !Arc::ptr_eq(&cache.types, &patch.types);
        }
        frame.patch_deps.push(Dep::Node {
            atom: atom.clone(),
            cache: patch.clone(),
        });
        drop(frame);

        if let Some(cb) = cb {
            let state_changed = match prev_dep {
                Some(Dep::Node { cache, .. }) => !value_eq(&cache.state, &patch.state),
                _ => true,
            };
            if order_changed || state_changed {
                if let Some(effect) = cb(&patch.state) {
                    self.schedule(effect, &prev);
                }
            }
        }

        patch.state.clone()
    }

    // Binds the owning node's ctx into the queued effect.
    fn schedule(&self, effect: Effect, prev: &SnapshotRef) {
        let ctx = prev.ctx.clone();
        let tx = self.frame.borrow().tx;
        tx.schedule(Box::new(move |store| effect(store, &ctx)));
    }

    fn enter(&self) -> u32 {
        let mut frame = self.frame.borrow_mut();
        match frame.depth {
            Depth::Expired => violation(TrackViolation::OutdatedTrackingCall),
            Depth::Level(n) => {
                frame.depth = Depth::Level(n + 1);
                n + 1
            }
        }
    }
}
