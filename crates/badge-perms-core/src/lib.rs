// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! badge-perms-core: deterministic permission and approval overlap resolution.
//!
//! Permissions are ordered lists of records over a multi-dimensional region
//! (interval axes such as badge IDs and times, list axes such as addresses).
//! The engine compiles them first-match into disjoint fragments, answers
//! point and region queries against a caller-supplied `now`, partitions two
//! collections into shared and exclusive pieces, and validates timeline and
//! permission updates against permanent locks.
//!
//! Every operation is a pure function of its inputs; `now` is always passed in
//! and every loop that can grow is capped by [`Limits`].
#![forbid(unsafe_code)]

mod checker;
mod error;
mod first_match;
mod interval;
mod limits;
mod list_set;
/// Badge metadata lists and their timeline diff.
pub mod metadata;
mod overlap;
/// Typed permission shapes and point-check wrappers.
pub mod permissions;
mod record;
mod region;
mod timeline;
mod update;

/// Decisions and point/region queries against compiled permissions.
pub use checker::{
    check_point, check_region, ensure_not_forbidden, Decision, RegionVerdict, Violation,
};
/// Engine error type.
pub use error::EngineError;
/// First-match compilation into disjoint fragments.
pub use first_match::{compile_first_match, CompiledPermissions, Fragment};
/// Closed integer intervals and normalized interval sets.
pub use interval::{merge_intervals, Interval, IntervalSet, UNIVERSE_END, UNIVERSE_START};
/// Work caps applied to every bounded operation.
pub use limits::{Limits, DEFAULT_MAX_FRAGMENTS, DEFAULT_MAX_ITERATIONS};
/// Whitelist/blacklist string sets.
pub use list_set::ListSet;
/// Old/new partitioning of two compiled collections.
pub use overlap::{resolve_overlaps, Overlap, OverlapResolution, Paired};
/// Permission records and permanent time locks.
pub use record::{PermissionRecord, TimeLocks};
/// Axes, regions and points.
pub use region::{Axis, Coordinate, Dimension, Point, Region};
/// Timelined values and change validation.
pub use timeline::{diff_timelines, validate_timeline_update, Timeline, TimelineItem};
/// Validation of permission updates against permanent locks.
pub use update::validate_permission_update;
