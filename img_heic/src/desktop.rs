//! Desktop Location Module
//!
//! Resolves the user's real desktop directory (OneDrive redirects move it
//! under the synced folder) and manages the fixed `heic` output directory
//! beneath it.

use crate::errors::{ImgHeicError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the output directory created on the desktop.
pub const OUTPUT_DIR_NAME: &str = "heic";

/// Return the actual desktop directory for the current user.
pub fn resolve_desktop_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or(ImgHeicError::NoHomeDirectory)?;
    resolve_desktop_dir_under(&home)
}

/// Desktop resolution rule, first match wins:
/// 1. the OneDrive-synced desktop, if present;
/// 2. the standard `Desktop` directory, if present;
/// 3. otherwise the standard location is created and returned.
pub fn resolve_desktop_dir_under(home: &Path) -> Result<PathBuf> {
    let onedrive = home.join("OneDrive").join("Desktop");
    if onedrive.exists() {
        return Ok(onedrive);
    }

    let standard = home.join("Desktop");
    if standard.exists() {
        return Ok(standard);
    }

    fs::create_dir_all(&standard)?;
    Ok(standard)
}

/// Ensure `<desktop>/heic` exists and return it. Idempotent.
pub fn ensure_output_dir() -> Result<PathBuf> {
    let desktop = resolve_desktop_dir()?;
    ensure_output_dir_under(&desktop)
}

pub fn ensure_output_dir_under(desktop: &Path) -> Result<PathBuf> {
    let out = desktop.join(OUTPUT_DIR_NAME);
    fs::create_dir_all(&out)?;
    Ok(out)
}
