// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared application services for badge-perms tools (config, settings).
//! Keeps binaries thin and storage-agnostic.

pub mod config;
pub mod settings;
