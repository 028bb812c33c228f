// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Iteration caps for loops that repeatedly shrink a working set.

use crate::error::EngineError;

/// Default cap on walk iterations (metadata grouping and similar loops).
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

/// Default cap on fragments produced by a single compilation or resolution.
pub const DEFAULT_MAX_FRAGMENTS: usize = 100_000;

/// Explicit bounds injected into every loop that could otherwise run away on
/// corrupt data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Limits {
    /// Maximum iterations of a shrinking walk.
    pub max_iterations: usize,
    /// Maximum fragments a compilation or overlap resolution may emit.
    pub max_fragments: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_fragments: DEFAULT_MAX_FRAGMENTS,
        }
    }
}

/// Counts loop iterations against a cap.
#[derive(Debug)]
pub(crate) struct Budget {
    context: &'static str,
    limit: usize,
    spent: usize,
}

impl Budget {
    pub(crate) fn new(context: &'static str, limit: usize) -> Self {
        Self {
            context,
            limit,
            spent: 0,
        }
    }

    /// A budget that never runs out.
    pub(crate) fn unbounded() -> Self {
        Self::new("unbounded", usize::MAX)
    }

    /// Fails if `n` more units would exceed the cap, without spending them.
    pub(crate) fn reserve(&self, n: usize) -> Result<(), EngineError> {
        if self.spent.saturating_add(n) > self.limit {
            return Err(self.exceeded());
        }
        Ok(())
    }

    fn exceeded(&self) -> EngineError {
        tracing::warn!(context = self.context, limit = self.limit, "iteration cap hit");
        EngineError::IterationLimitExceeded {
            context: self.context,
            limit: self.limit,
        }
    }

    /// Charges `n` units; fails once the total exceeds the cap.
    pub(crate) fn charge(&mut self, n: usize) -> Result<(), EngineError> {
        self.spent = self.spent.saturating_add(n);
        if self.spent > self.limit {
            return Err(self.exceeded());
        }
        Ok(())
    }
}
