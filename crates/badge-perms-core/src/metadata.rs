// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Badge metadata lists and their timeline diff.
//!
//! A metadata list maps badge IDs to URIs with first-match precedence: when
//! two entries name the same badge ID, the earlier one wins. Metadata is
//! timelined, so a badge's URI can also change over time; validating an update
//! means finding every `(time, badge ID)` pair whose resolved URI changed and
//! checking it against the badge-scoped timed update permissions.

use tracing::{debug, instrument};

use crate::checker::ensure_not_forbidden;
use crate::error::EngineError;
use crate::first_match::CompiledPermissions;
use crate::interval::IntervalSet;
use crate::limits::{Budget, Limits};
use crate::region::{Axis, Region};
use crate::timeline::Timeline;

/// URI assigned to a set of badge IDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct BadgeMetadata {
    /// Metadata URI.
    pub uri: String,
    /// Badge IDs the URI applies to.
    pub badge_ids: IntervalSet,
}

impl BadgeMetadata {
    /// Assigns `uri` to `badge_ids`.
    pub fn new(uri: impl Into<String>, badge_ids: IntervalSet) -> Self {
        Self {
            uri: uri.into(),
            badge_ids,
        }
    }
}

/// Badge IDs sharing one resolved URI (`None` = no metadata).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MetadataGroup {
    /// Resolved URI.
    pub uri: Option<String>,
    /// Badge IDs resolving to it.
    pub badge_ids: IntervalSet,
}

/// A `(times, badge IDs)` window whose resolved URI changed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MetadataChange {
    /// Timeline times affected.
    pub times: IntervalSet,
    /// Badge IDs affected.
    pub badge_ids: IntervalSet,
}

/// First entry that covers `badge_id`.
pub fn metadata_for_badge(list: &[BadgeMetadata], badge_id: u64) -> Option<&BadgeMetadata> {
    list.iter().find(|m| m.badge_ids.contains(badge_id))
}

/// Rewrites `list` so entries are disjoint, keeping first-match meaning and
/// dropping entries left with no badge IDs.
pub fn prune_metadata(list: &[BadgeMetadata]) -> Vec<BadgeMetadata> {
    let mut claimed = IntervalSet::empty();
    let mut out = Vec::with_capacity(list.len());
    for entry in list {
        let own = entry.badge_ids.subtract(&claimed);
        claimed = claimed.union(&entry.badge_ids);
        if !own.is_empty() {
            out.push(BadgeMetadata::new(entry.uri.clone(), own));
        }
    }
    out
}

/// Returns a new list in which `entry` takes precedence over every older
/// entry for its badge IDs.
pub fn set_badge_metadata(list: &[BadgeMetadata], entry: BadgeMetadata) -> Vec<BadgeMetadata> {
    let mut out = Vec::with_capacity(list.len() + 1);
    out.push(entry);
    out.extend(list.iter().cloned());
    prune_metadata(&out)
}

/// Groups `badge_ids` by the URI each resolves to.
///
/// Walks the IDs from the lowest remaining one: resolve its entry, claim
/// every remaining ID that resolves to the same entry, repeat. The walk is
/// capped at `limits.max_iterations`.
#[instrument(level = "debug", skip_all, fields(entries = list.len()))]
pub fn group_badge_ids_by_metadata(
    list: &[BadgeMetadata],
    badge_ids: &IntervalSet,
    limits: &Limits,
) -> Result<Vec<MetadataGroup>, EngineError> {
    let pruned = prune_metadata(list);
    let all_claimed = pruned
        .iter()
        .fold(IntervalSet::empty(), |acc, m| acc.union(&m.badge_ids));

    let mut budget = Budget::new("metadata grouping walk", limits.max_iterations);
    let mut remaining = badge_ids.clone();
    let mut groups: Vec<MetadataGroup> = Vec::new();

    while let Some(next) = remaining.first() {
        budget.charge(1)?;
        let (uri, claim) = match metadata_for_badge(&pruned, next) {
            Some(entry) => (Some(entry.uri.clone()), entry.badge_ids.intersect(&remaining)),
            None => (None, remaining.subtract(&all_claimed)),
        };
        remaining = remaining.subtract(&claim);
        match groups.iter_mut().find(|g| g.uri == uri) {
            Some(group) => group.badge_ids = group.badge_ids.union(&claim),
            None => groups.push(MetadataGroup {
                uri,
                badge_ids: claim,
            }),
        }
    }
    Ok(groups)
}

/// Badge IDs whose resolved URI differs between two metadata lists.
pub fn changed_badge_ids(old: &[BadgeMetadata], new: &[BadgeMetadata]) -> IntervalSet {
    let (old, new) = (prune_metadata(old), prune_metadata(new));
    let mut touched = IntervalSet::empty();
    for m in old.iter().chain(new.iter()) {
        touched = touched.union(&m.badge_ids);
    }
    let mut same = IntervalSet::empty();
    for o in &old {
        for n in new.iter().filter(|n| n.uri == o.uri) {
            same = same.union(&o.badge_ids.intersect(&n.badge_ids));
        }
    }
    touched.subtract(&same)
}

/// Every `(times, badge IDs)` window whose resolved URI changed.
pub fn metadata_diff(
    old: &Timeline<Vec<BadgeMetadata>>,
    new: &Timeline<Vec<BadgeMetadata>>,
) -> Vec<MetadataChange> {
    let mut changes = Vec::new();
    let empty: Vec<BadgeMetadata> = Vec::new();

    let old_times = old.covered_times();
    let new_times = new.covered_times();

    for o in old.items() {
        for n in new.items() {
            let times = o.timeline_times.intersect(&n.timeline_times);
            if times.is_empty() {
                continue;
            }
            let badge_ids = changed_badge_ids(&o.value, &n.value);
            if !badge_ids.is_empty() {
                changes.push(MetadataChange { times, badge_ids });
            }
        }
        let dropped = o.timeline_times.subtract(&new_times);
        if !dropped.is_empty() {
            let badge_ids = changed_badge_ids(&o.value, &empty);
            if !badge_ids.is_empty() {
                changes.push(MetadataChange {
                    times: dropped,
                    badge_ids,
                });
            }
        }
    }
    for n in new.items() {
        let added = n.timeline_times.subtract(&old_times);
        if !added.is_empty() {
            let badge_ids = changed_badge_ids(&empty, &n.value);
            if !badge_ids.is_empty() {
                changes.push(MetadataChange {
                    times: added,
                    badge_ids,
                });
            }
        }
    }
    changes
}

/// Validates a badge metadata timeline update against badge-scoped timed
/// update permissions (`timelineTimes × badgeIds`).
#[instrument(level = "debug", skip_all, fields(now = now))]
pub fn validate_badge_metadata_update<V>(
    old: &Timeline<Vec<BadgeMetadata>>,
    new: &Timeline<Vec<BadgeMetadata>>,
    permissions: &CompiledPermissions<V>,
    now: u64,
) -> Result<(), EngineError> {
    if old == new {
        return Ok(());
    }
    let changes = metadata_diff(old, new);
    debug!(changes = changes.len(), "badge metadata changed");
    for change in changes {
        let query = Region::new()
            .with(Axis::TimelineTimes, change.times)
            .with(Axis::BadgeIds, change.badge_ids);
        ensure_not_forbidden(permissions, &query, now)?;
    }
    Ok(())
}
