// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Filesystem `ConfigStore` for badge-perms settings profiles.
//!
//! Each profile is one `<key>.json` file. Writes go to a sibling `.tmp` file
//! that is renamed into place, so a reader never sees a half-written profile.

use badge_app_core::config::{check_key, ConfigError, ConfigStore};
use directories::ProjectDirs;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Settings profiles stored as JSON files in one directory.
pub struct FsConfigStore {
    dir: PathBuf,
}

impl FsConfigStore {
    /// Store in the platform config directory (`~/.config/badge-perms` on Linux).
    pub fn platform() -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from("dev", "flyingrobots", "badge-perms").ok_or_else(|| {
            ConfigError::Unavailable("no home directory for platform config".into())
        })?;
        Self::at(dirs.config_dir())
    }

    /// Store in `dir`, created on demand.
    pub fn at(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .map_err(|err| ConfigError::Unavailable(format!("{}: {err}", dir.display())))?;
        Ok(Self { dir })
    }

    /// Directory holding the profiles.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File a profile is stored in.
    pub fn profile_path(&self, key: &str) -> Result<PathBuf, ConfigError> {
        check_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

fn io_error(key: &str) -> impl FnOnce(std::io::Error) -> ConfigError + '_ {
    move |source| ConfigError::Io {
        key: key.to_owned(),
        source,
    }
}

impl ConfigStore for FsConfigStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, ConfigError> {
        match fs::read(self.profile_path(key)?) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(key)(err)),
        }
    }

    fn write(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let path = self.profile_path(key)?;
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, data).map_err(io_error(key))?;
        fs::rename(&staging, &path).map_err(io_error(key))
    }
}
