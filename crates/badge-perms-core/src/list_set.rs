// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Membership sets over opaque identifiers (addresses, tracker IDs, approval
//! IDs) with whitelist/blacklist polarity.
//!
//! A whitelist `W(A)` matches exactly the members of `A`; a blacklist `B(A)`
//! matches everyone except the members of `A`. `B(∅)` is the universe and
//! `W(∅)` is empty. Combining two sets first normalises both operands by
//! polarity and then picks the most compact representation of the result:
//!
//! | a    | b    | a ∩ b    | a − b    | a ∪ b    |
//! |------|------|----------|----------|----------|
//! | W(A) | W(B) | W(A∩B)   | W(A−B)   | W(A∪B)   |
//! | W(A) | B(B) | W(A−B)   | W(A∩B)   | B(B−A)   |
//! | B(A) | W(B) | W(B−A)   | B(A∪B)   | B(A−B)   |
//! | B(A) | B(B) | B(A∪B)   | W(B−A)   | B(A∩B)   |
//!
//! Members live in a `BTreeSet`, so duplicates collapse on insertion and all
//! iteration is ordered.

use core::fmt;
use std::collections::BTreeSet;

/// Identifier membership set with polarity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ListSet {
    members: BTreeSet<String>,
    whitelist: bool,
}

fn cloned_union(a: &BTreeSet<String>, b: &BTreeSet<String>) -> BTreeSet<String> {
    a.union(b).cloned().collect()
}

fn cloned_intersection(a: &BTreeSet<String>, b: &BTreeSet<String>) -> BTreeSet<String> {
    a.intersection(b).cloned().collect()
}

fn cloned_difference(a: &BTreeSet<String>, b: &BTreeSet<String>) -> BTreeSet<String> {
    a.difference(b).cloned().collect()
}

impl ListSet {
    /// Builds a set from raw parts.
    pub fn new<I, S>(members: I, whitelist: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            members: members.into_iter().map(Into::into).collect(),
            whitelist,
        }
    }

    /// Matches only the given members.
    pub fn only<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(members, true)
    }

    /// Matches everyone except the given members.
    pub fn all_except<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(members, false)
    }

    /// Matches every identifier.
    pub fn all() -> Self {
        Self {
            members: BTreeSet::new(),
            whitelist: false,
        }
    }

    /// Matches nothing.
    pub fn none() -> Self {
        Self {
            members: BTreeSet::new(),
            whitelist: true,
        }
    }

    /// The listed members (interpretation depends on [`Self::is_whitelist`]).
    pub fn members(&self) -> &BTreeSet<String> {
        &self.members
    }

    /// True if only the listed members match.
    pub fn is_whitelist(&self) -> bool {
        self.whitelist
    }

    /// True if no identifier matches.
    pub fn is_empty(&self) -> bool {
        self.whitelist && self.members.is_empty()
    }

    /// True if every identifier matches.
    pub fn is_universe(&self) -> bool {
        !self.whitelist && self.members.is_empty()
    }

    /// Membership test honouring polarity.
    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id) == self.whitelist
    }

    /// Polarity flip: the complement of `self`.
    pub fn invert(&self) -> Self {
        Self {
            members: self.members.clone(),
            whitelist: !self.whitelist,
        }
    }

    /// Set intersection.
    pub fn intersect(&self, other: &Self) -> Self {
        let (a, b) = (&self.members, &other.members);
        match (self.whitelist, other.whitelist) {
            (true, true) => Self::only_set(cloned_intersection(a, b)),
            (true, false) => Self::only_set(cloned_difference(a, b)),
            (false, true) => Self::only_set(cloned_difference(b, a)),
            (false, false) => Self::except_set(cloned_union(a, b)),
        }
    }

    /// Removes every identifier matched by `other`.
    pub fn subtract(&self, other: &Self) -> Self {
        let (a, b) = (&self.members, &other.members);
        match (self.whitelist, other.whitelist) {
            (true, true) => Self::only_set(cloned_difference(a, b)),
            (true, false) => Self::only_set(cloned_intersection(a, b)),
            (false, true) => Self::except_set(cloned_union(a, b)),
            (false, false) => Self::only_set(cloned_difference(b, a)),
        }
    }

    /// Set union.
    pub fn union(&self, other: &Self) -> Self {
        let (a, b) = (&self.members, &other.members);
        match (self.whitelist, other.whitelist) {
            (true, true) => Self::only_set(cloned_union(a, b)),
            (true, false) => Self::except_set(cloned_difference(b, a)),
            (false, true) => Self::except_set(cloned_difference(a, b)),
            (false, false) => Self::except_set(cloned_intersection(a, b)),
        }
    }

    /// True if any identifier is matched by both sets.
    pub fn overlaps(&self, other: &Self) -> bool {
        !self.intersect(other).is_empty()
    }

    /// True if every identifier matched by `self` is matched by `other`.
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.subtract(other).is_empty()
    }

    fn only_set(members: BTreeSet<String>) -> Self {
        Self {
            members,
            whitelist: true,
        }
    }

    fn except_set(members: BTreeSet<String>) -> Self {
        Self {
            members,
            whitelist: false,
        }
    }
}

impl fmt::Display for ListSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_universe() {
            return f.write_str("all");
        }
        let members: Vec<&str> = self.members.iter().map(String::as_str).collect();
        if self.whitelist {
            write!(f, "only{{{}}}", members.join(","))
        } else {
            write!(f, "all except{{{}}}", members.join(","))
        }
    }
}
