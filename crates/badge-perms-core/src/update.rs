// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Validation of permission updates.
//!
//! Permanent locks are one-way: once a region is permanently permitted or
//! forbidden for some times, every later version of the permission must keep
//! at least those times locked the same way over the same region.

use tracing::instrument;

use crate::error::EngineError;
use crate::first_match::compile_first_match;
use crate::limits::Limits;
use crate::overlap::resolve_overlaps;
use crate::record::PermissionRecord;

/// Rejects `new` if it drops any permanently permitted or forbidden time that
/// `old` set.
///
/// Both collections are first-match compiled, then resolved against each
/// other. A region only `old` still covers loses all of its locks; a shared
/// region loses whatever old locks the new side does not repeat.
#[instrument(level = "debug", skip_all, fields(old = old.len(), new = new.len()))]
pub fn validate_permission_update<V: Clone>(
    old: &[PermissionRecord<V>],
    new: &[PermissionRecord<V>],
    limits: &Limits,
) -> Result<(), EngineError> {
    let old = compile_first_match(old, limits)?;
    let new = compile_first_match(new, limits)?;
    let resolution = resolve_overlaps(&old, &new, limits)?;

    for fragment in &resolution.old_only {
        let locks = fragment.record().locks();
        if !locks.is_empty() {
            return Err(EngineError::PermanentLockRemoved {
                region: fragment.region().clone(),
                missing: locks.permitted_times().union(locks.forbidden_times()),
            });
        }
    }

    for overlap in &resolution.overlaps {
        let (before, after) = (&overlap.locks.old, &overlap.locks.new);
        let missing = before
            .permitted_times()
            .subtract(after.permitted_times())
            .union(&before.forbidden_times().subtract(after.forbidden_times()));
        if !missing.is_empty() {
            return Err(EngineError::PermanentLockRemoved {
                region: overlap.region.clone(),
                missing,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::interval::IntervalSet;
    use crate::record::TimeLocks;
    use crate::region::{Axis, Region};

    fn timed(start: u64, end: u64, locks: TimeLocks) -> PermissionRecord<()> {
        PermissionRecord::bare(
            Region::new().with(Axis::TimelineTimes, IntervalSet::range(start, end).unwrap()),
            locks,
        )
    }

    fn forbid(start: u64, end: u64) -> TimeLocks {
        TimeLocks::forbidden(IntervalSet::range(start, end).unwrap())
    }

    #[test]
    fn adding_locks_is_allowed() {
        let old = vec![timed(1, 100, TimeLocks::none())];
        let new = vec![timed(1, 100, forbid(10, 20))];
        assert!(validate_permission_update(&old, &new, &Limits::default()).is_ok());
        assert!(validate_permission_update(&[], &new, &Limits::default()).is_ok());
    }

    #[test]
    fn narrowing_a_lock_window_is_rejected() {
        let old = vec![timed(1, 100, forbid(10, 20))];
        let new = vec![timed(1, 100, forbid(10, 15))];
        let err = validate_permission_update(&old, &new, &Limits::default()).unwrap_err();
        assert_eq!(
            err,
            EngineError::PermanentLockRemoved {
                region: Region::new().with(Axis::TimelineTimes, IntervalSet::range(1, 100).unwrap()),
                missing: IntervalSet::range(16, 20).unwrap(),
            }
        );
    }

    #[test]
    fn dropping_a_locked_region_is_rejected() {
        let old = vec![timed(1, 100, forbid(10, 20))];
        let new = vec![timed(1, 50, forbid(10, 20))];
        let err = validate_permission_update(&old, &new, &Limits::default()).unwrap_err();
        assert!(matches!(err, EngineError::PermanentLockRemoved { .. }));
    }

    #[test]
    fn flipping_polarity_is_rejected() {
        let old = vec![timed(1, 100, forbid(10, 20))];
        let new = vec![timed(
            1,
            100,
            TimeLocks::permitted(IntervalSet::range(10, 20).unwrap()),
        )];
        assert!(validate_permission_update(&old, &new, &Limits::default()).is_err());
    }
}
