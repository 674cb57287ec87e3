// src/core/paths.rs

use crate::constants::{CONFIG_DIR_NAME, USER_PROPERTIES_FILENAME};
use anyhow::{Result, anyhow};
use lazy_static::lazy_static;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

lazy_static! {
    static ref ANVIL_CONFIG_DIR: Mutex<Option<PathBuf>> = Mutex::new(None);
}

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
}

/// Returns the per-user configuration directory (`~/.config/anvil` on Linux).
///
/// The directory is not created. The first call computes the path, later calls
/// return the cached value.
pub fn get_anvil_config_dir() -> Result<PathBuf, PathError> {
    let mut cached = ANVIL_CONFIG_DIR
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if let Some(path) = &*cached {
        return Ok(path.clone());
    }

    let config_path = dirs::config_dir()
        .ok_or(PathError::ConfigDirNotFound)?
        .join(CONFIG_DIR_NAME);
    *cached = Some(config_path.clone());
    Ok(config_path)
}

/// Returns the path of the per-user default properties file.
pub fn get_user_properties_path() -> Result<PathBuf, PathError> {
    get_anvil_config_dir().map(|dir| dir.join(USER_PROPERTIES_FILENAME))
}

/// Expands `~` and environment variables (`$VAR`, `${VAR}`) in a path given on
/// the command line or in a build file.
pub fn expand_path(template: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(template)
        .map_err(|e| anyhow!("Failed to expand path '{}': {}", template, e))?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// Resolves `path` against `base` unless it is already absolute.
///
/// A leading `~` is expanded. `.` components are dropped and `..` components
/// are folded lexically, without touching the filesystem.
pub fn resolve_against(base: &Path, path: &str) -> PathBuf {
    let expanded = shellexpand::tilde(path);
    let candidate = Path::new(expanded.as_ref());
    let joined = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base.join(candidate)
    };
    dunce::simplified(&normalize(&joined)).to_path_buf()
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}
