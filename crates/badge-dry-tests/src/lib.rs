// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for badge-perms crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`records`] - Permission record builder and interval shorthands
//! - [`scenarios`] - Canned collections used across integration tests

pub mod config;
pub mod records;
pub mod scenarios;

pub use config::InMemoryConfigStore;
pub use records::{ids, ranges, RecordBuilder};
pub use scenarios::{overlapping_badge_rules, split_manager_timeline};
