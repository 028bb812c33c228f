// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Overlap resolution between an old and a new compiled collection.
//!
//! The result partitions the space covered by either input into three groups:
//! regions covered by both (with both sides' locks and payloads), regions only
//! the old collection covers, and regions only the new one covers. Each input
//! must be internally disjoint, which [`compile_first_match`] guarantees; under
//! that precondition every covered point lands in exactly one output piece on
//! each side.
//!
//! [`compile_first_match`]: crate::compile_first_match

use tracing::{debug, instrument};

use crate::error::EngineError;
use crate::first_match::{CompiledPermissions, Fragment};
use crate::limits::{Budget, Limits};
use crate::record::TimeLocks;
use crate::region::Region;

/// An `(old, new)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Paired<T> {
    /// Value taken from the old collection.
    pub old: T,
    /// Value taken from the new collection.
    pub new: T,
}

/// A region covered by one fragment of each collection.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Overlap<V> {
    /// Per-axis intersection of the two fragments.
    pub region: Region,
    /// Both sides' time locks.
    pub locks: Paired<TimeLocks>,
    /// Both sides' payloads.
    pub value: Paired<V>,
    /// Both sides' source rule indices.
    pub sources: Paired<usize>,
}

/// Output of [`resolve_overlaps`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct OverlapResolution<V> {
    /// Regions covered by both collections.
    pub overlaps: Vec<Overlap<V>>,
    /// Regions covered only by the old collection.
    pub old_only: Vec<Fragment<V>>,
    /// Regions covered only by the new collection.
    pub new_only: Vec<Fragment<V>>,
}

/// Partitions `old` and `new` into shared, old-only and new-only pieces.
///
/// Pairwise intersections are `O(|old| · |new| · D)`; leftovers are exploded
/// eagerly per [`Region::subtract`].
#[instrument(level = "debug", skip_all, fields(old = old.len(), new = new.len()))]
pub fn resolve_overlaps<V: Clone>(
    old: &CompiledPermissions<V>,
    new: &CompiledPermissions<V>,
    limits: &Limits,
) -> Result<OverlapResolution<V>, EngineError> {
    let mut budget = Budget::new("overlap resolution", limits.max_fragments);

    if let (Some(o), Some(n)) = (old.fragments().first(), new.fragments().first()) {
        o.region().check_schema(n.region())?;
    }

    let mut overlaps = Vec::new();
    // Per side: the overlap regions each fragment must shed.
    let mut old_cuts: Vec<Vec<Region>> = vec![Vec::new(); old.len()];
    let mut new_cuts: Vec<Vec<Region>> = vec![Vec::new(); new.len()];

    for (i, o) in old.iter().enumerate() {
        for (j, n) in new.iter().enumerate() {
            let Some(shared) = o.region().intersect(n.region())? else {
                continue;
            };
            budget.charge(1)?;
            old_cuts[i].push(shared.clone());
            new_cuts[j].push(shared.clone());
            overlaps.push(Overlap {
                region: shared,
                locks: Paired {
                    old: o.record().locks().clone(),
                    new: n.record().locks().clone(),
                },
                value: Paired {
                    old: o.record().value().clone(),
                    new: n.record().value().clone(),
                },
                sources: Paired {
                    old: o.source(),
                    new: n.source(),
                },
            });
        }
    }

    let old_only = leftovers(old, &old_cuts, &mut budget)?;
    let new_only = leftovers(new, &new_cuts, &mut budget)?;

    debug!(
        overlaps = overlaps.len(),
        old_only = old_only.len(),
        new_only = new_only.len(),
        "resolved overlaps"
    );
    Ok(OverlapResolution {
        overlaps,
        old_only,
        new_only,
    })
}

fn leftovers<V: Clone>(
    side: &CompiledPermissions<V>,
    cuts: &[Vec<Region>],
    budget: &mut Budget,
) -> Result<Vec<Fragment<V>>, EngineError> {
    let mut out = Vec::new();
    for (fragment, cuts) in side.iter().zip(cuts) {
        let pieces = fragment.region().subtract_all_within(cuts, budget)?;
        budget.charge(pieces.len())?;
        out.extend(
            pieces
                .into_iter()
                .map(|piece| Fragment::new(fragment.record().with_region(piece), fragment.source())),
        );
    }
    Ok(out)
}
