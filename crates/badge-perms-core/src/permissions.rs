// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Typed permission shapes used by collection call sites.
//!
//! Each shape fixes an axis schema and converts into a [`PermissionRecord`]
//! (the "universal" form the engine works on). The `check_*` wrappers compile
//! first-match and answer one point query, which is what every
//! `canUpdate…` style check boils down to.
//!
//! | shape | axes | used for |
//! |---|---|---|
//! | [`ActionPermission`] | none | delete collection |
//! | [`TimedUpdatePermission`] | timelineTimes | manager, collection metadata, custom data, standards, archive |
//! | [`TimedUpdateWithBadgeIdsPermission`] | timelineTimes, badgeIds | badge metadata, badge-ID validity |
//! | [`BalancesActionPermission`] | badgeIds, ownershipTimes | creating more badges |
//! | [`ApprovalPermission`] | from/to/initiatedBy lists, transfer/ownership times, badgeIds, approval/tracker IDs | collection approvals |

use crate::checker::{check_point, Decision};
use crate::error::EngineError;
use crate::first_match::{compile_first_match, CompiledPermissions};
use crate::interval::IntervalSet;
use crate::limits::Limits;
use crate::list_set::ListSet;
use crate::record::{PermissionRecord, TimeLocks};
use crate::region::{Axis, Point, Region};
use crate::timeline::{validate_timeline_update, Timeline};

/// A typed permission that can be lowered to a universal record.
pub trait UniversalPermission {
    /// The region the permission constrains.
    fn region(&self) -> Region;

    /// The permission's permanent time locks.
    fn locks(&self) -> &TimeLocks;

    /// Lowers the permission to a payload-free record.
    fn to_record(&self) -> PermissionRecord<()> {
        PermissionRecord::bare(self.region(), self.locks().clone())
    }
}

/// Compiles typed permissions in priority order.
pub fn compile_permissions<P: UniversalPermission>(
    permissions: &[P],
    limits: &Limits,
) -> Result<CompiledPermissions<()>, EngineError> {
    let records: Vec<PermissionRecord<()>> =
        permissions.iter().map(UniversalPermission::to_record).collect();
    compile_first_match(&records, limits)
}

/// Permission with no dimensions; the first entry decides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionPermission {
    /// Permanent locks.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub locks: TimeLocks,
}

impl UniversalPermission for ActionPermission {
    fn region(&self) -> Region {
        Region::new()
    }

    fn locks(&self) -> &TimeLocks {
        &self.locks
    }
}

/// Permission over when a timelined field may be updated.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct TimedUpdatePermission {
    /// Timeline windows this entry governs.
    pub timeline_times: IntervalSet,
    /// Permanent locks.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub locks: TimeLocks,
}

impl UniversalPermission for TimedUpdatePermission {
    fn region(&self) -> Region {
        Region::new().with(Axis::TimelineTimes, self.timeline_times.clone())
    }

    fn locks(&self) -> &TimeLocks {
        &self.locks
    }
}

/// Timed update permission further scoped to badge IDs.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct TimedUpdateWithBadgeIdsPermission {
    /// Timeline windows this entry governs.
    pub timeline_times: IntervalSet,
    /// Badge IDs this entry governs.
    pub badge_ids: IntervalSet,
    /// Permanent locks.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub locks: TimeLocks,
}

impl UniversalPermission for TimedUpdateWithBadgeIdsPermission {
    fn region(&self) -> Region {
        Region::new()
            .with(Axis::TimelineTimes, self.timeline_times.clone())
            .with(Axis::BadgeIds, self.badge_ids.clone())
    }

    fn locks(&self) -> &TimeLocks {
        &self.locks
    }
}

/// Permission over balance-creating actions.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct BalancesActionPermission {
    /// Badge IDs this entry governs.
    pub badge_ids: IntervalSet,
    /// Ownership times this entry governs.
    pub ownership_times: IntervalSet,
    /// Permanent locks.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub locks: TimeLocks,
}

impl UniversalPermission for BalancesActionPermission {
    fn region(&self) -> Region {
        Region::new()
            .with(Axis::BadgeIds, self.badge_ids.clone())
            .with(Axis::OwnershipTimes, self.ownership_times.clone())
    }

    fn locks(&self) -> &TimeLocks {
        &self.locks
    }
}

/// Permission over changes to collection transfer approvals.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct ApprovalPermission {
    /// Senders.
    pub from_list: ListSet,
    /// Recipients.
    pub to_list: ListSet,
    /// Initiators.
    pub initiated_by_list: ListSet,
    /// Transfer times.
    pub transfer_times: IntervalSet,
    /// Badge IDs.
    pub badge_ids: IntervalSet,
    /// Ownership times.
    pub ownership_times: IntervalSet,
    /// Approval IDs.
    pub approval_id_list: ListSet,
    /// Amount tracker IDs.
    pub amount_tracker_id_list: ListSet,
    /// Challenge tracker IDs.
    pub challenge_tracker_id_list: ListSet,
    /// Permanent locks.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub locks: TimeLocks,
}

impl ApprovalPermission {
    /// Covers every transfer, with the given locks.
    pub fn everything(locks: TimeLocks) -> Self {
        Self {
            from_list: ListSet::all(),
            to_list: ListSet::all(),
            initiated_by_list: ListSet::all(),
            transfer_times: IntervalSet::universe(),
            badge_ids: IntervalSet::universe(),
            ownership_times: IntervalSet::universe(),
            approval_id_list: ListSet::all(),
            amount_tracker_id_list: ListSet::all(),
            challenge_tracker_id_list: ListSet::all(),
            locks,
        }
    }
}

impl UniversalPermission for ApprovalPermission {
    fn region(&self) -> Region {
        Region::new()
            .with(Axis::FromList, self.from_list.clone())
            .with(Axis::ToList, self.to_list.clone())
            .with(Axis::InitiatedByList, self.initiated_by_list.clone())
            .with(Axis::TransferTimes, self.transfer_times.clone())
            .with(Axis::BadgeIds, self.badge_ids.clone())
            .with(Axis::OwnershipTimes, self.ownership_times.clone())
            .with(Axis::ApprovalIdList, self.approval_id_list.clone())
            .with(Axis::AmountTrackerIdList, self.amount_tracker_id_list.clone())
            .with(
                Axis::ChallengeTrackerIdList,
                self.challenge_tracker_id_list.clone(),
            )
    }

    fn locks(&self) -> &TimeLocks {
        &self.locks
    }
}

/// One concrete approval, as asked of [`check_approval`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct ApprovalQuery {
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Initiator address.
    pub initiated_by: String,
    /// Transfer time.
    pub transfer_time: u64,
    /// Badge ID.
    pub badge_id: u64,
    /// Ownership time.
    pub ownership_time: u64,
    /// Approval ID.
    pub approval_id: String,
    /// Amount tracker ID.
    pub amount_tracker_id: String,
    /// Challenge tracker ID.
    pub challenge_tracker_id: String,
}

impl ApprovalQuery {
    /// The query as a point on the approval schema.
    pub fn to_point(&self) -> Point {
        Point::new()
            .with_member(Axis::FromList, self.from.clone())
            .with_member(Axis::ToList, self.to.clone())
            .with_member(Axis::InitiatedByList, self.initiated_by.clone())
            .with_value(Axis::TransferTimes, self.transfer_time)
            .with_value(Axis::BadgeIds, self.badge_id)
            .with_value(Axis::OwnershipTimes, self.ownership_time)
            .with_member(Axis::ApprovalIdList, self.approval_id.clone())
            .with_member(Axis::AmountTrackerIdList, self.amount_tracker_id.clone())
            .with_member(
                Axis::ChallengeTrackerIdList,
                self.challenge_tracker_id.clone(),
            )
    }
}

/// Whether a dimensionless action (e.g. deleting the collection) is locked.
pub fn check_action(
    permissions: &[ActionPermission],
    now: u64,
    limits: &Limits,
) -> Result<Decision, EngineError> {
    let compiled = compile_permissions(permissions, limits)?;
    check_point(&compiled, &Point::new(), now)
}

/// Whether the field's value at `timeline_time` may be changed at `now`.
pub fn check_timed_update(
    permissions: &[TimedUpdatePermission],
    timeline_time: u64,
    now: u64,
    limits: &Limits,
) -> Result<Decision, EngineError> {
    let compiled = compile_permissions(permissions, limits)?;
    let point = Point::new().with_value(Axis::TimelineTimes, timeline_time);
    check_point(&compiled, &point, now)
}

/// Whether badge `badge_id`'s value at `timeline_time` may be changed at `now`.
pub fn check_timed_update_with_badge_ids(
    permissions: &[TimedUpdateWithBadgeIdsPermission],
    timeline_time: u64,
    badge_id: u64,
    now: u64,
    limits: &Limits,
) -> Result<Decision, EngineError> {
    let compiled = compile_permissions(permissions, limits)?;
    let point = Point::new()
        .with_value(Axis::TimelineTimes, timeline_time)
        .with_value(Axis::BadgeIds, badge_id);
    check_point(&compiled, &point, now)
}

/// Whether balances for `(badge_id, ownership_time)` may be created at `now`.
pub fn check_balances_action(
    permissions: &[BalancesActionPermission],
    badge_id: u64,
    ownership_time: u64,
    now: u64,
    limits: &Limits,
) -> Result<Decision, EngineError> {
    let compiled = compile_permissions(permissions, limits)?;
    let point = Point::new()
        .with_value(Axis::BadgeIds, badge_id)
        .with_value(Axis::OwnershipTimes, ownership_time);
    check_point(&compiled, &point, now)
}

/// Whether the approval described by `query` may be changed at `now`.
pub fn check_approval(
    permissions: &[ApprovalPermission],
    query: &ApprovalQuery,
    now: u64,
    limits: &Limits,
) -> Result<Decision, EngineError> {
    let compiled = compile_permissions(permissions, limits)?;
    check_point(&compiled, &query.to_point(), now)
}

/// Validates a timelined field update (manager, collection metadata, …)
/// against its timed update permissions.
pub fn validate_timed_update<T: PartialEq>(
    old: &Timeline<T>,
    new: &Timeline<T>,
    permissions: &[TimedUpdatePermission],
    now: u64,
    limits: &Limits,
) -> Result<(), EngineError> {
    let compiled = compile_permissions(permissions, limits)?;
    validate_timeline_update(old, new, &compiled, now)
}
