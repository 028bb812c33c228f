// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Closed-interval arithmetic over `u64`.
//!
//! An [`IntervalSet`] is always kept sorted ascending by `start` and fully
//! merged: no two elements overlap or touch. Every operation returns a fresh
//! set that upholds the same invariant, so callers never need to re-merge.
//!
//! ```text
//! [1,10] - [4,6]          = [1,3],[7,10]
//! [1,5],[6,9]  (merged)   = [1,9]
//! invert([3,7])           = [1,2],[8,MAX]
//! ```

use core::fmt;

use crate::error::EngineError;

/// Lowest value of the default universe.
pub const UNIVERSE_START: u64 = 1;

/// Highest value of every universe.
pub const UNIVERSE_END: u64 = u64::MAX;

/// Inclusive `[start, end]` range with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawInterval")
)]
pub struct Interval {
    start: u64,
    end: u64,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawInterval {
    start: u64,
    end: u64,
}

#[cfg(feature = "serde")]
impl TryFrom<RawInterval> for Interval {
    type Error = EngineError;

    fn try_from(raw: RawInterval) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl Interval {
    /// Builds `[start, end]`, rejecting `start > end`.
    pub fn new(start: u64, end: u64) -> Result<Self, EngineError> {
        if start > end {
            return Err(EngineError::MalformedInterval { start, end });
        }
        Ok(Self { start, end })
    }

    /// Single-point interval `[v, v]`.
    pub fn point(v: u64) -> Self {
        Self { start: v, end: v }
    }

    /// The default universe `[1, u64::MAX]`.
    pub fn universe() -> Self {
        Self {
            start: UNIVERSE_START,
            end: UNIVERSE_END,
        }
    }

    /// Inclusive lower bound.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Inclusive upper bound.
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Returns true if `v` lies within the interval (both ends inclusive).
    pub fn contains(&self, v: u64) -> bool {
        self.start <= v && v <= self.end
    }

    /// Returns the overlap with `other`, if any.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(Self { start, end })
    }

    /// True when `next` starts inside or immediately after `self`.
    fn touches(&self, next: &Self) -> bool {
        self.end == u64::MAX || next.start <= self.end + 1
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.start, self.end)
    }
}

/// Sorts and coalesces intervals; any pair with `next.start <= prev.end + 1`
/// becomes one element.
///
/// The output is independent of input order and `merge_intervals` is
/// idempotent.
pub fn merge_intervals(mut intervals: Vec<Interval>) -> Vec<Interval> {
    intervals.sort_unstable();
    let mut out: Vec<Interval> = Vec::with_capacity(intervals.len());
    for next in intervals {
        match out.last_mut() {
            Some(prev) if prev.touches(&next) => prev.end = prev.end.max(next.end),
            _ => out.push(next),
        }
    }
    out
}

/// Sorted, merged set of closed intervals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "Vec<Interval>", into = "Vec<Interval>")
)]
pub struct IntervalSet(Vec<Interval>);

impl From<Vec<Interval>> for IntervalSet {
    fn from(intervals: Vec<Interval>) -> Self {
        Self(merge_intervals(intervals))
    }
}

impl From<IntervalSet> for Vec<Interval> {
    fn from(set: IntervalSet) -> Self {
        set.0
    }
}

impl From<Interval> for IntervalSet {
    fn from(interval: Interval) -> Self {
        Self(vec![interval])
    }
}

impl FromIterator<Interval> for IntervalSet {
    fn from_iter<I: IntoIterator<Item = Interval>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl IntervalSet {
    /// The empty set.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// The default universe `[1, u64::MAX]`.
    pub fn universe() -> Self {
        Self(vec![Interval::universe()])
    }

    /// Single interval `[start, end]`.
    pub fn range(start: u64, end: u64) -> Result<Self, EngineError> {
        Interval::new(start, end).map(Self::from)
    }

    /// Builds a merged set from `(start, end)` pairs.
    pub fn from_pairs(pairs: &[(u64, u64)]) -> Result<Self, EngineError> {
        pairs
            .iter()
            .map(|&(s, e)| Interval::new(s, e))
            .collect::<Result<Vec<_>, _>>()
            .map(Self::from)
    }

    /// Single point `[v, v]`.
    pub fn point(v: u64) -> Self {
        Self(vec![Interval::point(v)])
    }

    /// Returns true if the set holds no values.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of disjoint intervals.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates the merged intervals in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &Interval> {
        self.0.iter()
    }

    /// The merged intervals as a slice.
    pub fn as_slice(&self) -> &[Interval] {
        &self.0
    }

    /// Smallest value in the set.
    pub fn first(&self) -> Option<u64> {
        self.0.first().map(Interval::start)
    }

    /// Binary-search containment.
    pub fn contains(&self, v: u64) -> bool {
        let idx = self.0.partition_point(|iv| iv.end < v);
        self.0.get(idx).is_some_and(|iv| iv.start <= v)
    }

    /// Returns the interval containing `v`, if any.
    pub fn interval_containing(&self, v: u64) -> Option<Interval> {
        let idx = self.0.partition_point(|iv| iv.end < v);
        self.0.get(idx).copied().filter(|iv| iv.start <= v)
    }

    /// Set union.
    pub fn union(&self, other: &Self) -> Self {
        let mut all = Vec::with_capacity(self.0.len() + other.0.len());
        all.extend_from_slice(&self.0);
        all.extend_from_slice(&other.0);
        Self::from(all)
    }

    /// Pairwise `[max start, min end]` of every overlapping pair.
    pub fn intersect(&self, other: &Self) -> Self {
        let (a, b) = (&self.0, &other.0);
        let mut out = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            if let Some(iv) = a[i].intersect(&b[j]) {
                out.push(iv);
            }
            if a[i].end < b[j].end {
                i += 1;
            } else {
                j += 1;
            }
        }
        // Pieces of disjoint, non-touching inputs stay disjoint and non-touching.
        Self(out)
    }

    /// Removes every value of `other` from `self`, splitting as needed.
    pub fn subtract(&self, other: &Self) -> Self {
        let b = &other.0;
        let mut out = Vec::with_capacity(self.0.len());
        let mut j = 0;
        for a in &self.0 {
            while j < b.len() && b[j].end < a.start {
                j += 1;
            }
            let mut cursor = a.start;
            let mut consumed = false;
            let mut k = j;
            while k < b.len() && b[k].start <= a.end {
                let cut = b[k];
                if cut.start > cursor {
                    out.push(Interval {
                        start: cursor,
                        end: cut.start - 1,
                    });
                }
                if cut.end >= a.end {
                    consumed = true;
                    break;
                }
                // cut.end < a.end <= u64::MAX
                cursor = cut.end + 1;
                k += 1;
            }
            if !consumed {
                out.push(Interval {
                    start: cursor,
                    end: a.end,
                });
            }
        }
        Self(out)
    }

    /// `universe - self`.
    pub fn invert_within(&self, universe: &Self) -> Self {
        universe.subtract(self)
    }

    /// Complement against the default universe `[1, u64::MAX]`.
    pub fn invert(&self) -> Self {
        self.invert_within(&Self::universe())
    }

    /// Returns true if any value is shared with `other`.
    pub fn overlaps(&self, other: &Self) -> bool {
        let (a, b) = (&self.0, &other.0);
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            if a[i].intersect(&b[j]).is_some() {
                return true;
            }
            if a[i].end < b[j].end {
                i += 1;
            } else {
                j += 1;
            }
        }
        false
    }

    /// Returns true if every value of `self` is in `other`.
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.subtract(other).is_empty()
    }
}

impl fmt::Display for IntervalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("{}");
        }
        for (i, iv) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{iv}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn set(pairs: &[(u64, u64)]) -> IntervalSet {
        IntervalSet::from_pairs(pairs).unwrap()
    }

    #[test]
    fn rejects_reversed_bounds() {
        assert_eq!(
            Interval::new(5, 4),
            Err(EngineError::MalformedInterval { start: 5, end: 4 })
        );
        assert!(Interval::new(7, 7).is_ok());
    }

    #[test]
    fn merge_coalesces_touching_and_overlapping() {
        assert_eq!(set(&[(6, 9), (1, 5)]), set(&[(1, 9)]));
        assert_eq!(set(&[(1, 5), (3, 4), (10, 12)]).len(), 2);
        assert_eq!(set(&[(1, 5), (7, 9)]).len(), 2);
    }

    #[test]
    fn merge_handles_max_end_without_overflow() {
        let s = set(&[(10, u64::MAX), (u64::MAX, u64::MAX), (5, 9)]);
        assert_eq!(s, set(&[(5, u64::MAX)]));
    }

    #[test]
    fn subtract_splits_interior_cut() {
        assert_eq!(set(&[(1, 10)]).subtract(&set(&[(4, 6)])), set(&[(1, 3), (7, 10)]));
        assert_eq!(
            set(&[(1, 100)]).subtract(&set(&[(20, 30)])),
            set(&[(1, 19), (31, 100)])
        );
    }

    #[test]
    fn subtract_covers_edges_and_multiple_cuts() {
        let a = set(&[(1, 10), (20, 30)]);
        let b = set(&[(1, 2), (9, 21), (30, 40)]);
        assert_eq!(a.subtract(&b), set(&[(3, 8), (22, 29)]));
        assert!(a.subtract(&a).is_empty());
        assert_eq!(a.subtract(&IntervalSet::empty()), a);
        assert!(IntervalSet::empty().subtract(&a).is_empty());
    }

    #[test]
    fn intersect_is_absorbing_on_empty() {
        let a = set(&[(1, 10)]);
        assert!(a.intersect(&IntervalSet::empty()).is_empty());
        assert_eq!(a.intersect(&set(&[(5, 20)])), set(&[(5, 10)]));
        assert_eq!(
            set(&[(1, 3), (5, 9)]).intersect(&set(&[(2, 6), (8, 8)])),
            set(&[(2, 3), (5, 6), (8, 8)])
        );
    }

    #[test]
    fn invert_uses_default_universe() {
        assert_eq!(
            set(&[(3, 7)]).invert(),
            set(&[(1, 2), (8, u64::MAX)])
        );
        assert!(IntervalSet::universe().invert().is_empty());
        assert_eq!(IntervalSet::empty().invert(), IntervalSet::universe());
    }

    #[test]
    fn contains_is_inclusive_at_both_ends() {
        let s = set(&[(10, 20), (30, 30)]);
        assert!(s.contains(10));
        assert!(s.contains(20));
        assert!(!s.contains(21));
        assert!(!s.contains(9));
        assert!(s.contains(30));
        assert!(!s.contains(31));
        assert_eq!(s.interval_containing(15), Some(Interval::new(10, 20).unwrap()));
    }

    #[test]
    fn display_lists_merged_intervals() {
        assert_eq!(set(&[(7, 10), (1, 3)]).to_string(), "[1,3],[7,10]");
        assert_eq!(IntervalSet::empty().to_string(), "{}");
    }
}
