// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Time-sharded values and change validation.
//!
//! A [`Timeline`] assigns at most one value to every instant. Validating an
//! update computes the instants whose effective value changed and rejects the
//! whole update if any of them is permanently forbidden.

use tracing::{debug, instrument};

use crate::checker::ensure_not_forbidden;
use crate::error::EngineError;
use crate::first_match::CompiledPermissions;
use crate::interval::IntervalSet;
use crate::region::{Axis, Region};

/// One value and the times it is in effect.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct TimelineItem<T> {
    /// Times the value is in effect.
    pub timeline_times: IntervalSet,
    /// The value.
    pub value: T,
}

impl<T> TimelineItem<T> {
    /// Pairs `value` with `timeline_times`.
    pub fn new(timeline_times: IntervalSet, value: T) -> Self {
        Self {
            timeline_times,
            value,
        }
    }
}

/// Ordered items whose time windows are pairwise disjoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<TimelineItem<T>>", into = "Vec<TimelineItem<T>>"),
    serde(bound(
        serialize = "T: Clone + serde::Serialize",
        deserialize = "T: serde::Deserialize<'de>"
    ))
)]
pub struct Timeline<T> {
    items: Vec<TimelineItem<T>>,
}

impl<T> Default for Timeline<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> TryFrom<Vec<TimelineItem<T>>> for Timeline<T> {
    type Error = EngineError;

    fn try_from(items: Vec<TimelineItem<T>>) -> Result<Self, Self::Error> {
        Self::new(items)
    }
}

impl<T> From<Timeline<T>> for Vec<TimelineItem<T>> {
    fn from(timeline: Timeline<T>) -> Self {
        timeline.items
    }
}

impl<T> Timeline<T> {
    /// Builds a timeline, rejecting items that share an instant.
    pub fn new(items: Vec<TimelineItem<T>>) -> Result<Self, EngineError> {
        for (i, a) in items.iter().enumerate() {
            for (j, b) in items.iter().enumerate().skip(i + 1) {
                let overlap = a.timeline_times.intersect(&b.timeline_times);
                if !overlap.is_empty() {
                    return Err(EngineError::OverlappingTimeline {
                        first: i,
                        second: j,
                        overlap,
                    });
                }
            }
        }
        Ok(Self { items })
    }

    /// The items in order.
    pub fn items(&self) -> &[TimelineItem<T>] {
        &self.items
    }

    /// Value in effect at `time`, if any.
    pub fn value_at(&self, time: u64) -> Option<&T> {
        self.items
            .iter()
            .find(|item| item.timeline_times.contains(time))
            .map(|item| &item.value)
    }

    /// Every instant that has a value.
    pub fn covered_times(&self) -> IntervalSet {
        self.items
            .iter()
            .fold(IntervalSet::empty(), |acc, item| acc.union(&item.timeline_times))
    }
}

/// Instants whose effective value differs between `old` and `new`.
///
/// An instant with a value on one side only counts as changed.
pub fn diff_timelines<T: PartialEq>(old: &Timeline<T>, new: &Timeline<T>) -> IntervalSet {
    let mut unchanged = IntervalSet::empty();
    for o in &old.items {
        for n in &new.items {
            if o.value == n.value {
                unchanged = unchanged.union(&o.timeline_times.intersect(&n.timeline_times));
            }
        }
    }
    old.covered_times()
        .union(&new.covered_times())
        .subtract(&unchanged)
}

/// Validates a timeline transition against a compiled permission collection.
///
/// Identical timelines are always allowed. Otherwise every changed instant is
/// queried on the `timelineTimes` axis at `now`, and any forbidden part aborts
/// the whole update.
#[instrument(level = "debug", skip_all, fields(now = now))]
pub fn validate_timeline_update<T: PartialEq, V>(
    old: &Timeline<T>,
    new: &Timeline<T>,
    permissions: &CompiledPermissions<V>,
    now: u64,
) -> Result<(), EngineError> {
    if old == new {
        return Ok(());
    }
    let changed = diff_timelines(old, new);
    if changed.is_empty() {
        return Ok(());
    }
    debug!(%changed, "timeline changed");
    let query = Region::new().with(Axis::TimelineTimes, changed);
    ensure_not_forbidden(permissions, &query, now)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn item(start: u64, end: u64, v: &'static str) -> TimelineItem<&'static str> {
        TimelineItem::new(IntervalSet::range(start, end).unwrap(), v)
    }

    #[test]
    fn overlapping_items_are_rejected() {
        let err = Timeline::new(vec![item(0, 10, "a"), item(10, 20, "b")]).unwrap_err();
        assert_eq!(
            err,
            EngineError::OverlappingTimeline {
                first: 0,
                second: 1,
                overlap: IntervalSet::point(10)
            }
        );
    }

    #[test]
    fn value_at_respects_windows() {
        let t = Timeline::new(vec![item(0, 50, "A"), item(51, 100, "B")]).unwrap();
        assert_eq!(t.value_at(50), Some(&"A"));
        assert_eq!(t.value_at(51), Some(&"B"));
        assert_eq!(t.value_at(101), None);
    }

    #[test]
    fn diff_detects_only_the_changed_window() {
        let old = Timeline::new(vec![item(0, 50, "A"), item(51, 100, "B")]).unwrap();
        let new = Timeline::new(vec![item(0, 100, "A")]).unwrap();
        assert_eq!(diff_timelines(&old, &new), IntervalSet::range(51, 100).unwrap());
    }

    #[test]
    fn dropped_and_added_times_count_as_changes() {
        let old = Timeline::new(vec![item(1, 10, "A")]).unwrap();
        let new = Timeline::new(vec![item(5, 20, "A")]).unwrap();
        assert_eq!(
            diff_timelines(&old, &new),
            IntervalSet::from_pairs(&[(1, 4), (11, 20)]).unwrap()
        );
    }
}
