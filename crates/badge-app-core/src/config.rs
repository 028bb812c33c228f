// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Storage port for persisted engine settings.
//!
//! A store holds one JSON document per settings profile. Profiles are named by
//! a short key (`engine` by default) which adapters map onto their own layout,
//! so keys are restricted to characters that are safe as a file stem.

use thiserror::Error;

/// Raw document storage for settings profiles.
pub trait ConfigStore {
    /// Reads the document stored for `key`. `Ok(None)` when nothing is stored.
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, ConfigError>;
    /// Replaces the document stored for `key`.
    fn write(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Failures while locating, reading, or decoding settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Profile key is empty or contains characters outside `[A-Za-z0-9_-]`.
    #[error("invalid settings key {key:?}")]
    InvalidKey {
        /// Offending key.
        key: String,
    },
    /// The backing store could not be opened.
    #[error("settings store unavailable: {0}")]
    Unavailable(String),
    /// Reading or writing the document for `key` failed.
    #[error("settings {key:?}: {source}")]
    Io {
        /// Profile key.
        key: String,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
    /// The stored document for `key` is not valid settings JSON.
    #[error("settings {key:?} are corrupt: {source}")]
    Corrupt {
        /// Profile key.
        key: String,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },
    /// A stored cap is zero, which would reject every engine call.
    #[error("settings {key:?}: {field} must be at least 1")]
    ZeroLimit {
        /// Profile key.
        key: String,
        /// Field holding the zero.
        field: &'static str,
    },
    /// Settings could not be encoded.
    #[error("encode settings: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Rejects keys that are not plain `[A-Za-z0-9_-]+` identifiers.
pub fn check_key(key: &str) -> Result<(), ConfigError> {
    let plain = !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if plain {
        Ok(())
    } else {
        Err(ConfigError::InvalidKey {
            key: key.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_keys_pass() {
        for key in ["engine", "ci-strict", "profile_2"] {
            assert!(check_key(key).is_ok(), "{key}");
        }
    }

    #[test]
    fn path_like_keys_are_rejected() {
        for key in ["", "../engine", "a/b", "engine.json", "with space"] {
            assert!(
                matches!(check_key(key), Err(ConfigError::InvalidKey { .. })),
                "{key}"
            );
        }
    }
}
