//! The recompute engine.
//!
//! Given a transaction, a node's previous snapshot, and the node's pure
//! computation function, [`memo`] produces the node's current snapshot,
//! recomputing only when it has to.
//!
//! # How the decision is made
//!
//! 1. **Stability fast path.** If the previous snapshot has dependencies,
//!    check each one in recorded order: an event-type dependency is stable
//!    iff no event of that type is in the batch; a node dependency is stable
//!    iff its resolved state is identity-equal to the one recorded. The scan
//!    stops at the first unstable dependency. If every dependency is stable
//!    the computation is skipped outright and the previous state is carried
//!    forward.
//!
//! 2. **Recomputation.** Otherwise the computation runs exactly once inside
//!    a tracking sandbox ([`Track`]) that records the dependencies actually
//!    read this run and whether their order, snapshots, or type sets
//!    changed.
//!
//! 3. **Edge correction.** Reading fewer dependencies than last run is
//!    itself an order change.
//!
//! 4. **Assembly.** The invalidation type set is rebuilt only when the
//!    types-changed flag is set; otherwise the previous set object is reused
//!    as-is. The previous snapshot object itself is returned when no
//!    dependency changed and the computed state is identity-equal to the old
//!    one, which is what lets every node upstream short-circuit.
//!
//! Effects triggered by callbacks are appended to the transaction's queue
//! and never executed here.

use std::sync::Arc;

use indexmap::IndexSet;
use tracing::trace;

use super::snapshot::{value_eq, Dep, DepList, Snapshot, SnapshotRef, Value};
use super::track::Track;
use super::transaction::Transaction;

/// Resolve one node under a transaction: reuse the previous snapshot when
/// every dependency is stable, otherwise run `computer` once in a tracking
/// sandbox and assemble a structurally-shared result.
pub fn memo<'t, F>(tx: &'t Transaction<'t>, snapshot: &SnapshotRef, computer: F) -> SnapshotRef
where
    F: FnOnce(&Track<'t>, Value) -> Value,
{
    let mut cache_changed = false;
    let mut types_changed = false;
    let mut patch_deps = DepList::with_capacity(snapshot.deps.len());

    if !snapshot.deps.is_empty() {
        let mut stable = true;
        for dep in &snapshot.deps {
            match dep {
                Dep::Event { ty } => {
                    if tx.events().iter().any(|event| event.ty == *ty) {
                        stable = false;
                        break;
                    }
                    patch_deps.push(dep.clone());
                }
                Dep::Node { atom, cache } => {
                    let patch = tx.resolve(atom, Some(cache));
                    if Arc::ptr_eq(&patch, cache) {
                        patch_deps.push(dep.clone());
                    } else {
                        if !value_eq(&patch.state, &cache.state) {
                            stable = false;
                            break;
                        }
                        // The dependency re-wrapped its unchanged state in a
                        // fresh snapshot: keep the new snapshot, keep our
                        // state.
                        cache_changed = true;
                        types_changed |= !Arc::ptr_eq(&patch.types, &cache.types);
                        patch_deps.push(Dep::Node {
                            atom: atom.clone(),
                            cache: patch,
                        });
                    }
                }
            }
        }
        if stable {
            trace!(deps = patch_deps.len(), "dependencies stable, skipping recompute");
            return assemble(
                snapshot,
                patch_deps,
                snapshot.state.clone(),
                cache_changed,
                types_changed,
            );
        }
        patch_deps.clear();
    }

    trace!("recomputing");
    let track = Track::begin(tx, snapshot.clone(), patch_deps, cache_changed, types_changed);
    let state = computer(&track, snapshot.state.clone());
    let (patch_deps, mut order_changed, mut cache_changed, mut types_changed) = track.finish();

    // A shrinking dependency list is an order change too.
    order_changed |= snapshot.deps.len() > patch_deps.len();
    cache_changed |= order_changed;
    types_changed |= order_changed;

    assemble(snapshot, patch_deps, state, cache_changed, types_changed)
}

fn assemble(
    prev: &SnapshotRef,
    deps: DepList,
    state: Value,
    cache_changed: bool,
    types_changed: bool,
) -> SnapshotRef {
    let types = if types_changed {
        let mut types = IndexSet::new();
        for dep in &deps {
            match dep {
                Dep::Event { ty } => {
                    types.insert(*ty);
                }
                Dep::Node { cache, .. } => types.extend(cache.types.iter().copied()),
            }
        }
        Arc::new(types)
    } else {
        prev.types.clone()
    };

    if cache_changed || !value_eq(&prev.state, &state) || prev.deps.is_empty() {
        Arc::new(Snapshot {
            deps,
            ctx: prev.ctx.clone(),
            state,
            types,
        })
    } else {
        prev.clone()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
