//! Tracking-protocol violations.
//!
//! These are developer-facing assertions, not recoverable runtime faults: each
//! one means a computation function misused the tracking handle. A violation
//! aborts the current recomputation by panicking with the violation message
//! and propagates to the caller uncaught; retry policy, if any, belongs to
//! the surrounding transaction machinery.

use thiserror::Error;

/// The ways a computation function can break the tracking protocol.
///
/// Two variants are enforced statically by the typed [`Track`] API and can no
/// longer occur at runtime; they remain part of the taxonomy so diagnostics
/// and documentation cover the whole protocol.
///
/// [`Track`]: super::track::Track
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TrackViolation {
    /// The tracking handle was invoked after the computation had already
    /// returned, e.g. from a stray callback that captured it.
    #[error("tracking call after the computation already finished")]
    OutdatedTrackingCall,

    /// A dependency callback was supplied from inside another tracking
    /// callback. Only top-level reads may register callbacks.
    #[error("dependency callback inside a nested tracking call")]
    NestedTrackingCallback,

    /// An event subscription was attempted from inside another tracking
    /// callback.
    #[error("event handling inside a nested tracking call")]
    NestedEventHandling,

    /// The tracked argument was neither a known node nor an event type.
    /// Statically unreachable through the typed API.
    #[error("tracked argument is neither a known node nor an event type")]
    InvalidTrackArgument,

    /// An event subscription was made without a callback. Statically
    /// unreachable through the typed API, which requires one.
    #[error("event tracking requires a callback")]
    MissingEventCallback,
}

/// Abort the current recomputation with a protocol violation.
pub(crate) fn violation(kind: TrackViolation) -> ! {
    panic!("track protocol violation: {kind}");
}
