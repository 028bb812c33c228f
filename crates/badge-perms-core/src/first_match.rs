// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! First-match compilation of an ordered rule list.
//!
//! Rules are listed in priority order (index 0 wins). Compilation is a strict
//! left fold: each rule keeps only the part of its region that no earlier rule
//! covers, in the same way a firewall rule list is flattened. The output
//! fragments are pairwise disjoint and each carries the locks and payload of
//! the first rule that covers it, plus that rule's index.

use tracing::{debug, instrument};

use crate::error::EngineError;
use crate::limits::{Budget, Limits};
use crate::record::PermissionRecord;
use crate::region::Region;

/// A disjoint piece of a compiled collection.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Fragment<V> {
    record: PermissionRecord<V>,
    source: usize,
}

impl<V> Fragment<V> {
    /// Wraps a record fragment that originated from input index `source`.
    pub fn new(record: PermissionRecord<V>, source: usize) -> Self {
        Self { record, source }
    }

    /// The fragment's region, locks and payload.
    pub fn record(&self) -> &PermissionRecord<V> {
        &self.record
    }

    /// The fragment's region.
    pub fn region(&self) -> &Region {
        self.record.region()
    }

    /// Index of the input rule that produced this fragment.
    pub fn source(&self) -> usize {
        self.source
    }
}

/// Output of [`compile_first_match`]: pairwise disjoint fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CompiledPermissions<V> {
    fragments: Vec<Fragment<V>>,
}

impl<V> Default for CompiledPermissions<V> {
    fn default() -> Self {
        Self {
            fragments: Vec::new(),
        }
    }
}

impl<V> CompiledPermissions<V> {
    /// Wraps fragments the caller guarantees to be pairwise disjoint, such as
    /// a partition already computed by the chain.
    ///
    /// The checker still reports [`EngineError::UnresolvedOverlap`] if the
    /// guarantee turns out to be false.
    pub fn assume_disjoint(fragments: Vec<Fragment<V>>) -> Self {
        Self { fragments }
    }

    /// The fragments in emission order.
    pub fn fragments(&self) -> &[Fragment<V>] {
        &self.fragments
    }

    /// Iterates the fragments in emission order.
    pub fn iter(&self) -> impl Iterator<Item = &Fragment<V>> {
        self.fragments.iter()
    }

    /// Number of fragments.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// True if no rule contributed anything.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Consumes the collection.
    pub fn into_fragments(self) -> Vec<Fragment<V>> {
        self.fragments
    }
}

/// Flattens `records` into a first-match partition.
///
/// Records fully masked by earlier ones contribute nothing. All records must
/// share one axis schema.
#[instrument(level = "debug", skip_all, fields(records = records.len()))]
pub fn compile_first_match<V: Clone>(
    records: &[PermissionRecord<V>],
    limits: &Limits,
) -> Result<CompiledPermissions<V>, EngineError> {
    let mut budget = Budget::new("first-match compilation", limits.max_fragments);
    let mut fragments = Vec::new();

    if let Some(first) = records.first() {
        for record in &records[1..] {
            first.region().check_schema(record.region())?;
        }
    }

    for (idx, record) in records.iter().enumerate() {
        let earlier = records[..idx]
            .iter()
            .map(PermissionRecord::region)
            .filter(|r| !r.is_empty());
        let pieces = record.region().subtract_all_within(earlier, &budget)?;
        budget.charge(pieces.len())?;
        for piece in pieces {
            fragments.push(Fragment::new(record.with_region(piece), idx));
        }
    }

    debug!(fragments = fragments.len(), "compiled first-match partition");
    Ok(CompiledPermissions { fragments })
}
