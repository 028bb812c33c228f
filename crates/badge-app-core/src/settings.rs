// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persisted engine settings shared by badge-perms tools.

use badge_perms_core::{Decision, Limits, DEFAULT_MAX_FRAGMENTS, DEFAULT_MAX_ITERATIONS};
use serde::{Deserialize, Serialize};

use crate::config::{check_key, ConfigError, ConfigStore};

/// Default profile key the settings are stored under.
pub const SETTINGS_KEY: &str = "engine";

/// How a call site treats an [`Decision::Unconstrained`] result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnconstrainedPolicy {
    /// Nothing locks the action, so it goes through.
    #[default]
    Allow,
    /// Only explicitly permitted actions go through.
    Deny,
}

impl UnconstrainedPolicy {
    /// Collapses `decision` to a boolean under this policy.
    pub fn allows(self, decision: Decision) -> bool {
        decision.is_allowed(self == Self::Allow)
    }
}

/// Work caps and decision policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Cap on shrinking-walk iterations.
    pub max_iterations: usize,
    /// Cap on fragments per compilation or resolution.
    pub max_fragments: usize,
    /// Treatment of unconstrained decisions.
    pub unconstrained_policy: UnconstrainedPolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_fragments: DEFAULT_MAX_FRAGMENTS,
            unconstrained_policy: UnconstrainedPolicy::default(),
        }
    }
}

impl EngineSettings {
    /// Engine limits derived from these settings.
    pub fn limits(&self) -> Limits {
        Limits {
            max_iterations: self.max_iterations,
            max_fragments: self.max_fragments,
        }
    }

    fn check_limits(&self, key: &str) -> Result<(), ConfigError> {
        let zero = if self.max_iterations == 0 {
            Some("max_iterations")
        } else if self.max_fragments == 0 {
            Some("max_fragments")
        } else {
            None
        };
        match zero {
            Some(field) => Err(ConfigError::ZeroLimit {
                key: key.to_owned(),
                field,
            }),
            None => Ok(()),
        }
    }
}

/// Per-run adjustments layered over stored settings; never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsOverrides {
    /// Replacement iteration cap.
    pub max_iterations: Option<usize>,
    /// Replacement fragment cap.
    pub max_fragments: Option<usize>,
    /// Replacement unconstrained policy.
    pub unconstrained_policy: Option<UnconstrainedPolicy>,
}

impl SettingsOverrides {
    /// Returns `settings` with every present override applied.
    pub fn apply(&self, mut settings: EngineSettings) -> EngineSettings {
        if let Some(n) = self.max_iterations {
            settings.max_iterations = n;
        }
        if let Some(n) = self.max_fragments {
            settings.max_fragments = n;
        }
        if let Some(policy) = self.unconstrained_policy {
            settings.unconstrained_policy = policy;
        }
        settings
    }
}

/// Reads and writes one settings profile through a [`ConfigStore`].
pub struct SettingsService<S> {
    store: S,
    key: String,
}

impl<S: ConfigStore> SettingsService<S> {
    /// Service for the default `engine` profile.
    pub fn new(store: S) -> Self {
        Self {
            store,
            key: SETTINGS_KEY.to_owned(),
        }
    }

    /// Service for a named profile.
    pub fn for_profile(store: S, key: &str) -> Result<Self, ConfigError> {
        check_key(key)?;
        Ok(Self {
            store,
            key: key.to_owned(),
        })
    }

    /// Profile key this service reads and writes.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Stored settings, or `None` when the profile is absent or blank.
    ///
    /// Missing fields take their defaults; a zero cap is rejected.
    pub fn stored(&self) -> Result<Option<EngineSettings>, ConfigError> {
        let Some(bytes) = self.store.read(&self.key)? else {
            return Ok(None);
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        let settings: EngineSettings =
            serde_json::from_slice(&bytes).map_err(|source| ConfigError::Corrupt {
                key: self.key.clone(),
                source,
            })?;
        settings.check_limits(&self.key)?;
        Ok(Some(settings))
    }

    /// Stored settings; on first use the defaults are written and returned.
    pub fn load(&self) -> Result<EngineSettings, ConfigError> {
        if let Some(settings) = self.stored()? {
            return Ok(settings);
        }
        let defaults = EngineSettings::default();
        self.save(&defaults)?;
        Ok(defaults)
    }

    /// Replaces the stored profile with `settings`.
    pub fn save(&self, settings: &EngineSettings) -> Result<(), ConfigError> {
        settings.check_limits(&self.key)?;
        let data = serde_json::to_vec_pretty(settings).map_err(ConfigError::Encode)?;
        self.store.write(&self.key, &data)
    }

    /// Consumes the service and returns the store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn policy_only_matters_for_unconstrained() {
        for policy in [UnconstrainedPolicy::Allow, UnconstrainedPolicy::Deny] {
            assert!(policy.allows(Decision::Permitted));
            assert!(!policy.allows(Decision::Forbidden));
        }
        assert!(UnconstrainedPolicy::Allow.allows(Decision::Unconstrained));
        assert!(!UnconstrainedPolicy::Deny.allows(Decision::Unconstrained));
    }

    #[test]
    fn limits_mirror_settings() {
        let settings = EngineSettings {
            max_iterations: 7,
            max_fragments: 9,
            unconstrained_policy: UnconstrainedPolicy::Deny,
        };
        assert_eq!(
            settings.limits(),
            Limits {
                max_iterations: 7,
                max_fragments: 9
            }
        );
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: EngineSettings =
            serde_json::from_str(r#"{"unconstrained_policy":"deny"}"#).unwrap();
        assert_eq!(settings.max_iterations, DEFAULT_MAX_ITERATIONS);
        assert_eq!(settings.unconstrained_policy, UnconstrainedPolicy::Deny);
    }

    #[test]
    fn overrides_replace_only_present_fields() {
        let overrides = SettingsOverrides {
            max_fragments: Some(3),
            ..SettingsOverrides::default()
        };
        let applied = overrides.apply(EngineSettings::default());
        assert_eq!(applied.max_fragments, 3);
        assert_eq!(applied.max_iterations, DEFAULT_MAX_ITERATIONS);
        assert_eq!(applied.unconstrained_policy, UnconstrainedPolicy::Allow);
        assert_eq!(
            SettingsOverrides::default().apply(applied.clone()),
            applied
        );
    }

    #[test]
    fn zero_caps_are_named() {
        let settings = EngineSettings {
            max_fragments: 0,
            ..EngineSettings::default()
        };
        let err = settings.check_limits("engine").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ZeroLimit {
                field: "max_fragments",
                ..
            }
        ));
    }
}
