//! Asset directory configuration.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{LoadError, LoadResult};

/// Environment variable holding the OBJ asset directory.
pub const OBJ_DIR_ENV: &str = "ICG_OBJ_DIR";

/// Where OBJ assets are looked up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetConfig {
    pub obj_dir: PathBuf,
}

impl AssetConfig {
    pub fn new(obj_dir: impl Into<PathBuf>) -> Self {
        Self {
            obj_dir: obj_dir.into(),
        }
    }

    /// Read the directory from [`OBJ_DIR_ENV`].
    pub fn from_env() -> LoadResult<Self> {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    /// Same as [`AssetConfig::from_env`] over an arbitrary lookup.
    /// Unset and empty values are both treated as missing.
    pub fn from_lookup<F>(lookup: F) -> LoadResult<Self>
    where
        F: FnOnce(&str) -> Option<OsString>,
    {
        match lookup(OBJ_DIR_ENV) {
            Some(dir) if !dir.is_empty() => Ok(Self::new(dir)),
            _ => Err(LoadError::MissingAssetDir { var: OBJ_DIR_ENV }),
        }
    }

    /// Full path of `file_name` inside the asset directory.
    pub fn resolve(&self, file_name: impl AsRef<Path>) -> PathBuf {
        self.obj_dir.join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_reads_obj_dir() {
        let cfg = AssetConfig::from_lookup(|key| {
            assert_eq!(key, OBJ_DIR_ENV);
            Some("/assets/obj".into())
        })
        .expect("configured");
        assert_eq!(cfg.resolve("cube.obj"), PathBuf::from("/assets/obj/cube.obj"));
    }

    #[test]
    fn missing_or_empty_dir_is_an_error() {
        assert!(matches!(
            AssetConfig::from_lookup(|_| None),
            Err(LoadError::MissingAssetDir { var: OBJ_DIR_ENV })
        ));
        assert!(matches!(
            AssetConfig::from_lookup(|_| Some(OsString::new())),
            Err(LoadError::MissingAssetDir { .. })
        ));
    }
}
