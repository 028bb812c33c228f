// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Permission records: one rule over a region plus its permanent time locks.

use crate::checker::Decision;
use crate::error::EngineError;
use crate::interval::IntervalSet;
use crate::region::Region;

/// Windows in which a rule is permanently permitted or permanently forbidden.
///
/// The two sets never overlap; [`TimeLocks::new`] rejects a contradiction
/// instead of preferring either side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawTimeLocks", rename_all = "camelCase")
)]
pub struct TimeLocks {
    permanently_permitted_times: IntervalSet,
    permanently_forbidden_times: IntervalSet,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTimeLocks {
    #[serde(default)]
    permanently_permitted_times: IntervalSet,
    #[serde(default)]
    permanently_forbidden_times: IntervalSet,
}

#[cfg(feature = "serde")]
impl TryFrom<RawTimeLocks> for TimeLocks {
    type Error = EngineError;

    fn try_from(raw: RawTimeLocks) -> Result<Self, Self::Error> {
        Self::new(raw.permanently_permitted_times, raw.permanently_forbidden_times)
    }
}

impl TimeLocks {
    /// Builds locks, rejecting overlapping permitted and forbidden windows.
    pub fn new(permitted: IntervalSet, forbidden: IntervalSet) -> Result<Self, EngineError> {
        let overlap = permitted.intersect(&forbidden);
        if !overlap.is_empty() {
            return Err(EngineError::ContradictoryPermission { overlap });
        }
        Ok(Self {
            permanently_permitted_times: permitted,
            permanently_forbidden_times: forbidden,
        })
    }

    /// No locks at all.
    pub fn none() -> Self {
        Self::default()
    }

    /// Only permanently permitted times.
    pub fn permitted(times: IntervalSet) -> Self {
        Self {
            permanently_permitted_times: times,
            permanently_forbidden_times: IntervalSet::empty(),
        }
    }

    /// Only permanently forbidden times.
    pub fn forbidden(times: IntervalSet) -> Self {
        Self {
            permanently_permitted_times: IntervalSet::empty(),
            permanently_forbidden_times: times,
        }
    }

    /// Times in which the rule can never again be forbidden.
    pub fn permitted_times(&self) -> &IntervalSet {
        &self.permanently_permitted_times
    }

    /// Times in which the rule can never again be permitted.
    pub fn forbidden_times(&self) -> &IntervalSet {
        &self.permanently_forbidden_times
    }

    /// True if neither window holds any time.
    pub fn is_empty(&self) -> bool {
        self.permanently_permitted_times.is_empty() && self.permanently_forbidden_times.is_empty()
    }

    /// Evaluates the locks at `now`. Forbidden wins.
    pub fn decide(&self, now: u64) -> Decision {
        if self.permanently_forbidden_times.contains(now) {
            Decision::Forbidden
        } else if self.permanently_permitted_times.contains(now) {
            Decision::Permitted
        } else {
            Decision::Unconstrained
        }
    }
}

/// One rule: a region, its time locks and an opaque payload.
///
/// The payload is carried through compilation and overlap resolution but never
/// inspected by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct PermissionRecord<V> {
    region: Region,
    #[cfg_attr(feature = "serde", serde(flatten))]
    locks: TimeLocks,
    #[cfg_attr(feature = "serde", serde(default))]
    arbitrary_value: V,
}

impl<V> PermissionRecord<V> {
    /// Assembles a record from already-validated parts.
    pub fn new(region: Region, locks: TimeLocks, arbitrary_value: V) -> Self {
        Self {
            region,
            locks,
            arbitrary_value,
        }
    }

    /// The constrained region.
    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Permanent time locks.
    pub fn locks(&self) -> &TimeLocks {
        &self.locks
    }

    /// Opaque payload.
    pub fn value(&self) -> &V {
        &self.arbitrary_value
    }

    /// Splits the record into its parts.
    pub fn into_parts(self) -> (Region, TimeLocks, V) {
        (self.region, self.locks, self.arbitrary_value)
    }

    /// Same region and locks, new payload.
    pub fn map_value<U>(self, f: impl FnOnce(V) -> U) -> PermissionRecord<U> {
        PermissionRecord {
            region: self.region,
            locks: self.locks,
            arbitrary_value: f(self.arbitrary_value),
        }
    }

    /// Same locks and payload over a different region.
    pub(crate) fn with_region(&self, region: Region) -> Self
    where
        V: Clone,
    {
        Self {
            region,
            locks: self.locks.clone(),
            arbitrary_value: self.arbitrary_value.clone(),
        }
    }
}

impl PermissionRecord<()> {
    /// A payload-free record.
    pub fn bare(region: Region, locks: TimeLocks) -> Self {
        Self::new(region, locks, ())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn overlapping_locks_are_a_contradiction() {
        let p = IntervalSet::range(1, 10).unwrap();
        let f = IntervalSet::range(10, 20).unwrap();
        assert_eq!(
            TimeLocks::new(p, f),
            Err(EngineError::ContradictoryPermission {
                overlap: IntervalSet::point(10)
            })
        );
    }

    #[test]
    fn forbidden_is_sticky() {
        let locks = TimeLocks::new(
            IntervalSet::range(1, 9).unwrap(),
            IntervalSet::range(10, 20).unwrap(),
        )
        .unwrap();
        assert_eq!(locks.decide(5), Decision::Permitted);
        assert_eq!(locks.decide(10), Decision::Forbidden);
        assert_eq!(locks.decide(20), Decision::Forbidden);
        assert_eq!(locks.decide(21), Decision::Unconstrained);
    }
}
