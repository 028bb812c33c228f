// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Permission record construction for tests.
//!
//! Shorthands panic on malformed input; fixtures are expected to be
//! well-formed literals.
//!
//! ```
//! use badge_dry_tests::records::{ids, RecordBuilder};
//! use badge_perms_core::Axis;
//!
//! let record = RecordBuilder::new()
//!     .range(Axis::BadgeIds, 1, 10)
//!     .forbidden(100, 200)
//!     .build();
//! assert_eq!(record.region().range(Axis::BadgeIds), Some(&ids(1, 10)));
//! ```

use badge_perms_core::{Axis, Dimension, IntervalSet, ListSet, PermissionRecord, Region, TimeLocks};

/// `[start, end]` as an interval set.
#[allow(clippy::expect_used)]
pub fn ids(start: u64, end: u64) -> IntervalSet {
    IntervalSet::range(start, end).expect("fixture interval must have start <= end")
}

/// Union of `(start, end)` pairs.
#[allow(clippy::expect_used)]
pub fn ranges(pairs: &[(u64, u64)]) -> IntervalSet {
    IntervalSet::from_pairs(pairs).expect("fixture intervals must have start <= end")
}

/// Chainable builder for [`PermissionRecord`].
#[derive(Debug, Clone)]
pub struct RecordBuilder<V = ()> {
    region: Region,
    permitted: IntervalSet,
    forbidden: IntervalSet,
    value: V,
}

impl RecordBuilder<()> {
    /// Starts a payload-free record with no axes and no locks.
    pub fn new() -> Self {
        Self::with_value(())
    }
}

impl Default for RecordBuilder<()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> RecordBuilder<V> {
    /// Starts a record carrying `value`.
    pub fn with_value(value: V) -> Self {
        Self {
            region: Region::new(),
            permitted: IntervalSet::empty(),
            forbidden: IntervalSet::empty(),
            value,
        }
    }

    /// Sets an arbitrary dimension.
    pub fn axis(mut self, axis: Axis, dim: impl Into<Dimension>) -> Self {
        self.region = self.region.with(axis, dim);
        self
    }

    /// Sets a numeric axis to `[start, end]`.
    pub fn range(self, axis: Axis, start: u64, end: u64) -> Self {
        self.axis(axis, ids(start, end))
    }

    /// Sets a numeric axis to its full universe.
    pub fn all_values(self, axis: Axis) -> Self {
        self.axis(axis, IntervalSet::universe())
    }

    /// Sets a list axis to a whitelist.
    pub fn only<'a>(self, axis: Axis, members: impl IntoIterator<Item = &'a str>) -> Self {
        self.axis(axis, ListSet::only(members))
    }

    /// Sets a list axis to a blacklist.
    pub fn all_except<'a>(self, axis: Axis, members: impl IntoIterator<Item = &'a str>) -> Self {
        self.axis(axis, ListSet::all_except(members))
    }

    /// Adds `[start, end]` to the permanently permitted times.
    pub fn permitted(mut self, start: u64, end: u64) -> Self {
        self.permitted = self.permitted.union(&ids(start, end));
        self
    }

    /// Adds `[start, end]` to the permanently forbidden times.
    pub fn forbidden(mut self, start: u64, end: u64) -> Self {
        self.forbidden = self.forbidden.union(&ids(start, end));
        self
    }

    /// Builds the record.
    ///
    /// # Panics
    /// If the permitted and forbidden windows overlap.
    #[allow(clippy::expect_used)]
    pub fn build(self) -> PermissionRecord<V> {
        let locks = TimeLocks::new(self.permitted, self.forbidden)
            .expect("fixture locks must not overlap");
        PermissionRecord::new(self.region, locks, self.value)
    }
}
