// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Multi-dimensional boxes over named axes.
//!
//! A [`Region`] assigns one [`Dimension`] (an interval set or a list set) to
//! each [`Axis`] it constrains, and denotes the Cartesian product of those
//! sets. The engine is agnostic to how many axes a call site uses; it only
//! requires that regions combined with each other share the same axis schema.
//!
//! Subtraction explodes eagerly. Removing `b` from `a` offers, on every axis,
//! the choice between the leftover `a_d − b_d` and the shared part
//! `a_d ∩ b_d`; every combination except "shared on all axes" is a piece of
//! the result:
//!
//! ```text
//!   axis X:  [ leftover | shared ]       pieces of a − b:
//!   axis Y:  [ leftover | shared ]       (L,L) (L,S) (S,L)
//! ```
//!
//! Pieces are pairwise disjoint because they differ on at least one axis
//! where one takes the leftover and the other the shared part.

use core::fmt;
use std::collections::BTreeMap;

use crate::error::EngineError;
use crate::interval::IntervalSet;
use crate::limits::Budget;
use crate::list_set::ListSet;

/// Named dimension of a permission record.
///
/// Ordering is the declaration order and fixes the iteration order of every
/// region, so explosion output is deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub enum Axis {
    /// Times at which a timelined value is in effect.
    TimelineTimes,
    /// Badge ID ranges.
    BadgeIds,
    /// Ownership time ranges.
    OwnershipTimes,
    /// Transfer time ranges.
    TransferTimes,
    /// Sender address list.
    FromList,
    /// Recipient address list.
    ToList,
    /// Initiator address list.
    InitiatedByList,
    /// Approval ID list.
    ApprovalIdList,
    /// Amount tracker ID list.
    AmountTrackerIdList,
    /// Challenge tracker ID list.
    ChallengeTrackerIdList,
}

impl Axis {
    /// Wire name of the axis.
    pub fn name(self) -> &'static str {
        match self {
            Self::TimelineTimes => "timelineTimes",
            Self::BadgeIds => "badgeIds",
            Self::OwnershipTimes => "ownershipTimes",
            Self::TransferTimes => "transferTimes",
            Self::FromList => "fromList",
            Self::ToList => "toList",
            Self::InitiatedByList => "initiatedByList",
            Self::ApprovalIdList => "approvalIdList",
            Self::AmountTrackerIdList => "amountTrackerIdList",
            Self::ChallengeTrackerIdList => "challengeTrackerIdList",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Values a region allows along one axis.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum Dimension {
    /// Numeric ranges.
    Range(IntervalSet),
    /// Identifier membership.
    List(ListSet),
}

impl Dimension {
    /// True if the dimension admits no value.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Range(set) => set.is_empty(),
            Self::List(list) => list.is_empty(),
        }
    }

    /// The full universe of the same kind.
    pub fn universe_like(&self) -> Self {
        match self {
            Self::Range(_) => Self::Range(IntervalSet::universe()),
            Self::List(_) => Self::List(ListSet::all()),
        }
    }

    fn intersect(&self, other: &Self, axis: Axis) -> Result<Self, EngineError> {
        match (self, other) {
            (Self::Range(a), Self::Range(b)) => Ok(Self::Range(a.intersect(b))),
            (Self::List(a), Self::List(b)) => Ok(Self::List(a.intersect(b))),
            _ => Err(EngineError::SchemaMismatch { axis }),
        }
    }

    fn subtract(&self, other: &Self, axis: Axis) -> Result<Self, EngineError> {
        match (self, other) {
            (Self::Range(a), Self::Range(b)) => Ok(Self::Range(a.subtract(b))),
            (Self::List(a), Self::List(b)) => Ok(Self::List(a.subtract(b))),
            _ => Err(EngineError::SchemaMismatch { axis }),
        }
    }

    fn contains(&self, coord: &Coordinate, axis: Axis) -> Result<bool, EngineError> {
        match (self, coord) {
            (Self::Range(set), Coordinate::Value(v)) => Ok(set.contains(*v)),
            (Self::List(list), Coordinate::Member(id)) => Ok(list.contains(id)),
            _ => Err(EngineError::SchemaMismatch { axis }),
        }
    }
}

impl From<IntervalSet> for Dimension {
    fn from(set: IntervalSet) -> Self {
        Self::Range(set)
    }
}

impl From<ListSet> for Dimension {
    fn from(list: ListSet) -> Self {
        Self::List(list)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Range(set) => set.fmt(f),
            Self::List(list) => list.fmt(f),
        }
    }
}

/// A box in axis space: the product of one dimension per axis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct Region(BTreeMap<Axis, Dimension>);

impl Region {
    /// A region with no axes (the single point of zero-dimensional space).
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Sets `axis` to `dim`, replacing any previous value.
    pub fn with(mut self, axis: Axis, dim: impl Into<Dimension>) -> Self {
        self.0.insert(axis, dim.into());
        self
    }

    /// Returns the dimension for `axis`.
    pub fn get(&self, axis: Axis) -> Option<&Dimension> {
        self.0.get(&axis)
    }

    /// Returns the interval set for a range axis.
    pub fn range(&self, axis: Axis) -> Option<&IntervalSet> {
        match self.0.get(&axis) {
            Some(Dimension::Range(set)) => Some(set),
            _ => None,
        }
    }

    /// Axes in deterministic order.
    pub fn axes(&self) -> impl Iterator<Item = Axis> + '_ {
        self.0.keys().copied()
    }

    /// Iterates `(axis, dimension)` pairs in axis order.
    pub fn iter(&self) -> impl Iterator<Item = (Axis, &Dimension)> {
        self.0.iter().map(|(a, d)| (*a, d))
    }

    /// Number of axes.
    pub fn dimension_count(&self) -> usize {
        self.0.len()
    }

    /// True if any axis admits no value.
    pub fn is_empty(&self) -> bool {
        self.0.values().any(Dimension::is_empty)
    }

    /// Same axes, each widened to the universe of its kind.
    pub fn universe_like(&self) -> Self {
        Self(
            self.0
                .iter()
                .map(|(a, d)| (*a, d.universe_like()))
                .collect(),
        )
    }

    /// Fails unless both regions constrain the same axes with the same kinds.
    pub fn check_schema(&self, other: &Self) -> Result<(), EngineError> {
        for (axis, dim) in &self.0 {
            match other.0.get(axis) {
                Some(o) if core::mem::discriminant(o) == core::mem::discriminant(dim) => {}
                _ => return Err(EngineError::SchemaMismatch { axis: *axis }),
            }
        }
        if let Some(axis) = other.0.keys().find(|a| !self.0.contains_key(a)) {
            return Err(EngineError::SchemaMismatch { axis: *axis });
        }
        Ok(())
    }

    /// Per-axis intersection; `None` when the boxes do not meet.
    pub fn intersect(&self, other: &Self) -> Result<Option<Self>, EngineError> {
        self.check_schema(other)?;
        let mut out = BTreeMap::new();
        for (axis, dim) in &self.0 {
            let Some(o) = other.0.get(axis) else {
                return Err(EngineError::SchemaMismatch { axis: *axis });
            };
            let shared = dim.intersect(o, *axis)?;
            if shared.is_empty() {
                return Ok(None);
            }
            out.insert(*axis, shared);
        }
        Ok(Some(Self(out)))
    }

    /// Returns true if the boxes share at least one point.
    pub fn overlaps(&self, other: &Self) -> Result<bool, EngineError> {
        Ok(self.intersect(other)?.is_some())
    }

    /// `self − other` as pairwise disjoint boxes, exploded eagerly.
    pub fn subtract(&self, other: &Self) -> Result<Vec<Self>, EngineError> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        if !self.overlaps(other)? {
            return Ok(vec![self.clone()]);
        }

        // Per axis: (leftover, shared). Shared is never empty here.
        let mut choices: Vec<(Axis, Option<Dimension>, Dimension)> =
            Vec::with_capacity(self.0.len());
        for (axis, dim) in &self.0 {
            let Some(o) = other.0.get(axis) else {
                return Err(EngineError::SchemaMismatch { axis: *axis });
            };
            let leftover = dim.subtract(o, *axis)?;
            let shared = dim.intersect(o, *axis)?;
            choices.push((*axis, (!leftover.is_empty()).then_some(leftover), shared));
        }

        // Cartesian product; `true` in the mask selects the leftover.
        let mut partial: Vec<(BTreeMap<Axis, Dimension>, bool)> = vec![(BTreeMap::new(), false)];
        for (axis, leftover, shared) in &choices {
            let mut next = Vec::with_capacity(partial.len() * 2);
            for (dims, any_leftover) in partial {
                if let Some(l) = leftover {
                    let mut with_left = dims.clone();
                    with_left.insert(*axis, l.clone());
                    next.push((with_left, true));
                }
                let mut with_shared = dims;
                with_shared.insert(*axis, shared.clone());
                next.push((with_shared, any_leftover));
            }
            partial = next;
        }

        Ok(partial
            .into_iter()
            .filter(|(_, any_leftover)| *any_leftover)
            .map(|(dims, _)| Self(dims))
            .collect())
    }

    /// Removes every box in `cuts` from `self`.
    pub fn subtract_all<'a, I>(&self, cuts: I) -> Result<Vec<Self>, EngineError>
    where
        I: IntoIterator<Item = &'a Self>,
    {
        self.subtract_all_within(cuts, &Budget::unbounded())
    }

    /// [`Region::subtract_all`] that fails as soon as the pieces in flight
    /// would not fit in what is left of `budget`.
    pub(crate) fn subtract_all_within<'a, I>(
        &self,
        cuts: I,
        budget: &Budget,
    ) -> Result<Vec<Self>, EngineError>
    where
        I: IntoIterator<Item = &'a Self>,
    {
        let mut remaining = vec![self.clone()];
        for cut in cuts {
            let mut next = Vec::with_capacity(remaining.len());
            for piece in &remaining {
                next.extend(piece.subtract(cut)?);
                budget.reserve(next.len())?;
            }
            remaining = next;
            if remaining.is_empty() {
                break;
            }
        }
        Ok(remaining)
    }

    /// Returns true if `point` lies inside the box.
    ///
    /// The point must name exactly this region's axes.
    pub fn contains_point(&self, point: &Point) -> Result<bool, EngineError> {
        if let Some(axis) = point.0.keys().find(|a| !self.0.contains_key(a)) {
            return Err(EngineError::SchemaMismatch { axis: *axis });
        }
        for (axis, dim) in &self.0 {
            let Some(coord) = point.0.get(axis) else {
                return Err(EngineError::SchemaMismatch { axis: *axis });
            };
            if !dim.contains(coord, *axis)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Widens a partial `query` to this region's schema.
    ///
    /// Axes the query leaves out become the universe of their kind; axes the
    /// query names that `self` lacks are a schema mismatch.
    pub fn complete_query(&self, query: &Self) -> Result<Self, EngineError> {
        if let Some(axis) = query.0.keys().find(|a| !self.0.contains_key(a)) {
            return Err(EngineError::SchemaMismatch { axis: *axis });
        }
        Ok(Self(
            self.0
                .iter()
                .map(|(axis, dim)| {
                    let d = query
                        .0
                        .get(axis)
                        .cloned()
                        .unwrap_or_else(|| dim.universe_like());
                    (*axis, d)
                })
                .collect(),
        ))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (axis, dim)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{axis}: {dim}")?;
        }
        f.write_str("}")
    }
}

/// One concrete value along an axis.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum Coordinate {
    /// A badge ID or an instant.
    Value(u64),
    /// An address or identifier.
    Member(String),
}

/// A concrete query: one coordinate per axis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct Point(BTreeMap<Axis, Coordinate>);

impl Point {
    /// A point with no coordinates.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Sets a numeric coordinate.
    pub fn with_value(mut self, axis: Axis, v: u64) -> Self {
        self.0.insert(axis, Coordinate::Value(v));
        self
    }

    /// Sets an identifier coordinate.
    pub fn with_member(mut self, axis: Axis, id: impl Into<String>) -> Self {
        self.0.insert(axis, Coordinate::Member(id.into()));
        self
    }

    /// Returns the coordinate for `axis`.
    pub fn get(&self, axis: Axis) -> Option<&Coordinate> {
        self.0.get(&axis)
    }

    /// The degenerate region holding only this point.
    pub fn to_region(&self) -> Region {
        Region(
            self.0
                .iter()
                .map(|(axis, coord)| {
                    let dim = match coord {
                        Coordinate::Value(v) => Dimension::Range(IntervalSet::point(*v)),
                        Coordinate::Member(id) => Dimension::List(ListSet::only([id.clone()])),
                    };
                    (*axis, dim)
                })
                .collect(),
        )
    }
}
