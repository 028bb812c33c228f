// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Permission checks against a compiled partition.
//!
//! A check never reads a clock; `now` is always supplied by the caller.

use core::fmt;

use tracing::{debug, warn};

use crate::error::EngineError;
use crate::first_match::{CompiledPermissions, Fragment};
use crate::region::{Point, Region};

/// Three-valued outcome of a permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub enum Decision {
    /// A matching rule is permanently permitted at `now`.
    Permitted,
    /// A matching rule is permanently forbidden at `now`.
    Forbidden,
    /// Nothing locks the action open or closed; the call site decides.
    Unconstrained,
}

impl Decision {
    /// Collapses the decision to a boolean under the caller's policy for
    /// [`Decision::Unconstrained`].
    pub fn is_allowed(self, unconstrained_allowed: bool) -> bool {
        match self {
            Self::Permitted => true,
            Self::Forbidden => false,
            Self::Unconstrained => unconstrained_allowed,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Permitted => "permitted",
            Self::Forbidden => "forbidden",
            Self::Unconstrained => "unconstrained",
        })
    }
}

/// The part of a query a forbidding rule covers.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Violation {
    /// Index of the forbidding rule in the uncompiled input.
    pub record: usize,
    /// Intersection of the query with the rule's fragment.
    pub region: Region,
}

/// Outcome of a region query.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RegionVerdict {
    /// Aggregate decision.
    pub decision: Decision,
    /// First forbidding fragment, when `decision` is `Forbidden`.
    pub violation: Option<Violation>,
}

/// Answers a point query.
///
/// Zero matching fragments yield `Unconstrained`. Two or more matches mean
/// the collection was not compiled and raise
/// [`EngineError::UnresolvedOverlap`].
pub fn check_point<V>(
    compiled: &CompiledPermissions<V>,
    point: &Point,
    now: u64,
) -> Result<Decision, EngineError> {
    let mut found: Option<&Fragment<V>> = None;
    for fragment in compiled.iter() {
        if !fragment.region().contains_point(point)? {
            continue;
        }
        if let Some(prev) = found {
            warn!(
                first = prev.source(),
                second = fragment.source(),
                "point query matched overlapping fragments"
            );
            return Err(EngineError::UnresolvedOverlap {
                first: prev.source(),
                second: fragment.source(),
            });
        }
        found = Some(fragment);
    }
    Ok(found.map_or(Decision::Unconstrained, |f| f.record().locks().decide(now)))
}

/// Answers a region query.
///
/// Axes the query omits match anything. The first fragment (in compiled
/// order) forbidden at `now` decides `Forbidden`. Otherwise the verdict is
/// `Permitted` only if permitted fragments cover the whole query, else
/// `Unconstrained`.
pub fn check_region<V>(
    compiled: &CompiledPermissions<V>,
    query: &Region,
    now: u64,
) -> Result<RegionVerdict, EngineError> {
    let Some(template) = compiled.fragments().first() else {
        return Ok(RegionVerdict {
            decision: Decision::Unconstrained,
            violation: None,
        });
    };
    let full_query = template.region().complete_query(query)?;
    if full_query.is_empty() {
        return Ok(RegionVerdict {
            decision: Decision::Unconstrained,
            violation: None,
        });
    }

    let mut all_permitted = true;
    let mut covering: Vec<&Region> = Vec::new();
    for fragment in compiled.iter() {
        let Some(shared) = fragment.region().intersect(&full_query)? else {
            continue;
        };
        match fragment.record().locks().decide(now) {
            Decision::Forbidden => {
                debug!(record = fragment.source(), %shared, "region query forbidden");
                return Ok(RegionVerdict {
                    decision: Decision::Forbidden,
                    violation: Some(Violation {
                        record: fragment.source(),
                        region: shared,
                    }),
                });
            }
            Decision::Permitted => covering.push(fragment.region()),
            Decision::Unconstrained => all_permitted = false,
        }
    }

    let decision = if all_permitted
        && !covering.is_empty()
        && full_query.subtract_all(covering)?.is_empty()
    {
        Decision::Permitted
    } else {
        Decision::Unconstrained
    };
    Ok(RegionVerdict {
        decision,
        violation: None,
    })
}

/// All-or-nothing form of [`check_region`]: any forbidden part of the query
/// rejects the whole request.
pub fn ensure_not_forbidden<V>(
    compiled: &CompiledPermissions<V>,
    query: &Region,
    now: u64,
) -> Result<(), EngineError> {
    match check_region(compiled, query, now)? {
        RegionVerdict {
            violation: Some(Violation { record, region }),
            ..
        } => Err(EngineError::Forbidden {
            record,
            region,
            now,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::first_match::compile_first_match;
    use crate::interval::IntervalSet;
    use crate::limits::Limits;
    use crate::record::{PermissionRecord, TimeLocks};
    use crate::region::Axis;

    fn badges(start: u64, end: u64) -> Region {
        Region::new().with(Axis::BadgeIds, IntervalSet::range(start, end).unwrap())
    }

    fn compiled(records: &[PermissionRecord<()>]) -> CompiledPermissions<()> {
        compile_first_match(records, &Limits::default()).unwrap()
    }

    #[test]
    fn empty_collection_is_unconstrained() {
        let c = CompiledPermissions::<()>::default();
        let p = Point::new().with_value(Axis::BadgeIds, 1);
        assert_eq!(check_point(&c, &p, 0).unwrap(), Decision::Unconstrained);
    }

    #[test]
    fn uncompiled_overlap_is_an_invariant_violation() {
        let a = PermissionRecord::bare(badges(1, 10), TimeLocks::none());
        let b = PermissionRecord::bare(badges(5, 15), TimeLocks::none());
        let raw = CompiledPermissions::assume_disjoint(vec![
            Fragment::new(a, 0),
            Fragment::new(b, 1),
        ]);
        let p = Point::new().with_value(Axis::BadgeIds, 7);
        assert_eq!(
            check_point(&raw, &p, 0),
            Err(EngineError::UnresolvedOverlap {
                first: 0,
                second: 1
            })
        );
    }

    #[test]
    fn region_query_reports_forbidden_slice() {
        let c = compiled(&[
            PermissionRecord::bare(badges(1, 10), TimeLocks::permitted(IntervalSet::universe())),
            PermissionRecord::bare(badges(11, 20), TimeLocks::forbidden(IntervalSet::universe())),
        ]);
        let verdict = check_region(&c, &badges(8, 12), 5).unwrap();
        assert_eq!(verdict.decision, Decision::Forbidden);
        assert_eq!(
            verdict.violation,
            Some(Violation {
                record: 1,
                region: badges(11, 12)
            })
        );
    }

    #[test]
    fn region_query_needs_full_coverage_to_be_permitted() {
        let c = compiled(&[PermissionRecord::bare(
            badges(1, 10),
            TimeLocks::permitted(IntervalSet::universe()),
        )]);
        assert_eq!(
            check_region(&c, &badges(2, 9), 1).unwrap().decision,
            Decision::Permitted
        );
        assert_eq!(
            check_region(&c, &badges(2, 11), 1).unwrap().decision,
            Decision::Unconstrained
        );
    }

    #[test]
    fn ensure_not_forbidden_names_the_record() {
        let c = compiled(&[PermissionRecord::bare(
            badges(1, 10),
            TimeLocks::forbidden(IntervalSet::range(100, 200).unwrap()),
        )]);
        assert!(ensure_not_forbidden(&c, &badges(1, 3), 99).is_ok());
        let err = ensure_not_forbidden(&c, &badges(1, 3), 150).unwrap_err();
        assert_eq!(
            err,
            EngineError::Forbidden {
                record: 0,
                region: badges(1, 3),
                now: 150
            }
        );
    }

    #[test]
    fn unconstrained_policy_is_the_callers_choice() {
        assert!(Decision::Unconstrained.is_allowed(true));
        assert!(!Decision::Unconstrained.is_allowed(false));
        assert!(!Decision::Forbidden.is_allowed(true));
    }
}
