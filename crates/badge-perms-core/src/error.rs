// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Structural and rejection errors raised by the engine.
//!
//! Expected negative outcomes of a permission check (`Forbidden`,
//! `Unconstrained`) are ordinary [`Decision`](crate::Decision) values. The
//! variants here either abort a call on malformed input or report that an
//! all-or-nothing validator rejected a transition.

use thiserror::Error;

use crate::interval::IntervalSet;
use crate::region::{Axis, Region};

/// Errors produced by the permission engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// An interval was constructed with `start > end`.
    #[error("malformed interval: start {start} > end {end}")]
    MalformedInterval {
        /// Supplied start.
        start: u64,
        /// Supplied end.
        end: u64,
    },
    /// A record's permanently permitted and forbidden times overlap.
    #[error("contradictory permission: times {overlap} are both permanently permitted and forbidden")]
    ContradictoryPermission {
        /// The overlapping window.
        overlap: IntervalSet,
    },
    /// More than one compiled fragment matched a point query.
    ///
    /// Compiled collections are disjoint, so this indicates that the caller
    /// skipped first-match compilation.
    #[error("unresolved overlap: point query matched records {first} and {second}")]
    UnresolvedOverlap {
        /// Source index of the first matching fragment.
        first: usize,
        /// Source index of the second matching fragment.
        second: usize,
    },
    /// A bounded loop exceeded its cap.
    #[error("iteration limit exceeded in {context}: cap {limit}")]
    IterationLimitExceeded {
        /// Name of the loop that hit the cap.
        context: &'static str,
        /// The configured cap.
        limit: usize,
    },
    /// Records or queries that must share an axis schema do not.
    #[error("schema mismatch on axis {axis}")]
    SchemaMismatch {
        /// The first axis found missing or of the wrong kind.
        axis: Axis,
    },
    /// Two timeline items claim the same instant.
    #[error("overlapping timeline: items {first} and {second} share times {overlap}")]
    OverlappingTimeline {
        /// Index of the earlier item.
        first: usize,
        /// Index of the later item.
        second: usize,
        /// The shared window.
        overlap: IntervalSet,
    },
    /// A transition touched a window that a permission permanently forbids.
    #[error("forbidden by permission {record}: {region} is locked at {now}")]
    Forbidden {
        /// Index of the violated record in the caller's (uncompiled) collection.
        record: usize,
        /// The forbidden portion of the requested change.
        region: Region,
        /// Instant the check ran at.
        now: u64,
    },
    /// A permission update dropped permanently permitted or forbidden times.
    #[error("permanent lock removed over {region}: times {missing} no longer locked")]
    PermanentLockRemoved {
        /// Region whose lock shrank.
        region: Region,
        /// Times that were locked before the update and are not after it.
        missing: IntervalSet,
    },
}
