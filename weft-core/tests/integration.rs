//! Integration tests for the recompute engine driven by the store.
//!
//! These tests exercise the full protocol: dispatching event batches,
//! recursive dependency resolution, snapshot sharing across transactions,
//! and the two-phase split between state updates and deferred effects.

use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::Arc;

use weft_core::reactive::{value, Atom, Ctx, EventType};
use weft_core::store::Store;

/// An atom that sums the payloads of every matching event, keeping its state
/// allocation when no event arrived.
fn counter(name: &'static str, ty: EventType) -> Atom {
    Atom::new(name, 0i32, move |track, state| {
        let mut next = None;
        let current = *state.downcast_ref::<i32>().unwrap();
        track.on(ty, |payload, _event| {
            let n = next.unwrap_or(current) + *payload.downcast_ref::<i32>().unwrap();
            next = Some(n);
            None
        });
        match next {
            Some(n) => value(n),
            None => state,
        }
    })
}

#[test]
fn counter_accumulates_events() {
    let incr = EventType::new("incr");
    let store = Store::new();
    let counter = counter("counter", incr);
    store.register(&counter);

    store.dispatch_one(incr.event(5i32));
    assert_eq!(store.state_of(&counter).downcast_ref::<i32>(), Some(&5));

    // Several events of the same type in one batch all apply.
    store.dispatch(vec![incr.event(1i32), incr.event(2i32)]);
    assert_eq!(store.state_of(&counter).downcast_ref::<i32>(), Some(&8));
}

#[test]
fn derived_atom_recomputes_only_when_input_state_changes() {
    let incr = EventType::new("incr");
    let store = Store::new();
    let base = counter("base", incr);

    let calls = Arc::new(AtomicUsize::new(0));
    let doubled = Atom::new("doubled", 0i32, {
        let base = base.clone();
        let calls = calls.clone();
        move |track, _state| {
            calls.fetch_add(1, Ordering::SeqCst);
            let n = *track.get(&base).downcast_ref::<i32>().unwrap();
            value(n * 2)
        }
    });

    store.register(&base);
    store.register(&doubled);

    store.dispatch_one(incr.event(5i32));
    assert_eq!(store.state_of(&doubled).downcast_ref::<i32>(), Some(&10));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // An unrelated event leaves the whole chain untouched.
    let other = EventType::new("other");
    store.dispatch_one(other.event(()));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // So does an empty batch.
    store.dispatch(vec![]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    store.dispatch_one(incr.event(2i32));
    assert_eq!(store.state_of(&doubled).downcast_ref::<i32>(), Some(&14));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn snapshot_identity_is_preserved_across_quiet_transactions() {
    let incr = EventType::new("incr");
    let store = Store::new();
    let base = counter("base", incr);
    store.register(&base);

    store.dispatch_one(incr.event(1i32));
    let before = store.snapshot_of(&base);

    store.dispatch(vec![]);
    let after = store.snapshot_of(&base);

    assert!(Arc::ptr_eq(&before, &after));
}

#[test]
fn effects_observe_the_settled_graph() {
    let incr = EventType::new("incr");
    let store = Store::new();
    let base = counter("base", incr);

    let doubled = Atom::new("doubled", 0i32, {
        let base = base.clone();
        move |track, _state| {
            let n = *track.get(&base).downcast_ref::<i32>().unwrap();
            value(n * 2)
        }
    });

    let observed = Arc::new(AtomicI32::new(-1));
    let watcher = Atom::new("watcher", 0i32, {
        let base = base.clone();
        let doubled = doubled.clone();
        let observed = observed.clone();
        move |track, state| {
            track.watch(&base, |_state| {
                let doubled = doubled.clone();
                let observed = observed.clone();
                Some(Box::new(move |store: &Store, _ctx: &Ctx| {
                    let n = *store.state_of(&doubled).downcast_ref::<i32>().unwrap();
                    observed.store(n, Ordering::SeqCst);
                }))
            });
            state
        }
    });

    // The watcher resolves first, so its effect is queued before `doubled`
    // has even been computed. It must still see the committed result.
    store.register(&watcher);
    store.register(&base);
    store.register(&doubled);

    store.dispatch_one(incr.event(5i32));
    assert_eq!(observed.load(Ordering::SeqCst), 10);
}

#[test]
fn effect_receives_the_node_context() {
    let incr = EventType::new("incr");
    let hits = Arc::new(AtomicI32::new(0));
    let tally = Atom::with_ctx("tally", 0i32, hits.clone(), move |track, state| {
        track.on(incr, |_payload, _event| {
            Some(Box::new(|_store: &Store, ctx: &Ctx| {
                ctx.downcast_ref::<AtomicI32>()
                    .expect("tally ctx")
                    .fetch_add(1, Ordering::SeqCst);
            }))
        });
        state
    });

    let store = Store::new();
    store.register(&tally);

    store.dispatch(vec![incr.event(()), incr.event(())]);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[test]
fn diamond_dependency_resolves_each_node_once_per_transaction() {
    let incr = EventType::new("incr");
    let store = Store::new();

    let base_calls = Arc::new(AtomicUsize::new(0));
    let base = Atom::new("base", 0i32, {
        let calls = base_calls.clone();
        move |track, state| {
            calls.fetch_add(1, Ordering::SeqCst);
            let mut next = None;
            let current = *state.downcast_ref::<i32>().unwrap();
            track.on(incr, |payload, _event| {
                next = Some(current + *payload.downcast_ref::<i32>().unwrap());
                None
            });
            match next {
                Some(n) => value(n),
                None => state,
            }
        }
    });

    let left = Atom::new("left", 0i32, {
        let base = base.clone();
        move |track, _state| {
            let n = *track.get(&base).downcast_ref::<i32>().unwrap();
            value(n + 1)
        }
    });
    let right = Atom::new("right", 0i32, {
        let base = base.clone();
        move |track, _state| {
            let n = *track.get(&base).downcast_ref::<i32>().unwrap();
            value(n * 10)
        }
    });
    let top = Atom::new("top", 0i32, {
        let left = left.clone();
        let right = right.clone();
        move |track, _state| {
            let l = *track.get(&left).downcast_ref::<i32>().unwrap();
            let r = *track.get(&right).downcast_ref::<i32>().unwrap();
            value(l + r)
        }
    });

    store.register(&base);
    store.register(&left);
    store.register(&right);
    store.register(&top);

    store.dispatch_one(incr.event(3i32));
    assert_eq!(store.state_of(&top).downcast_ref::<i32>(), Some(&34));
    assert_eq!(base_calls.load(Ordering::SeqCst), 1, "base computed once");

    store.dispatch_one(incr.event(1i32));
    assert_eq!(store.state_of(&top).downcast_ref::<i32>(), Some(&45));
    assert_eq!(base_calls.load(Ordering::SeqCst), 2);
}

#[test]
fn effects_may_dispatch_follow_up_transactions() {
    let first = EventType::new("first");
    let second = EventType::new("second");
    let store = Store::new();

    let target = counter("target", second);
    let trigger = Atom::new("trigger", 0i32, move |track, state| {
        track.on(first, |_payload, _event| {
            Some(Box::new(move |store: &Store, _ctx: &Ctx| {
                store.dispatch_one(second.event(7i32));
            }))
        });
        state
    });

    store.register(&target);
    store.register(&trigger);

    store.dispatch_one(first.event(()));
    assert_eq!(store.state_of(&target).downcast_ref::<i32>(), Some(&7));
}
