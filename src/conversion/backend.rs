//! Locating and verifying the ffmpeg binary
//!
//! The binary is never downloaded. It comes from an explicit setting, a
//! `resources/bin` directory shipped next to the executable, or the `PATH`.
//! When a SHA-256 digest is pinned in the settings the binary must match it.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::core::Settings;
use crate::error::{Result, StereoError};

#[cfg(windows)]
const FFMPEG_BINARY: &str = "ffmpeg.exe";
#[cfg(not(windows))]
const FFMPEG_BINARY: &str = "ffmpeg";

/// Find, check and (optionally) verify the ffmpeg binary described by `settings`
pub fn acquire_ffmpeg(settings: &Settings) -> Result<PathBuf> {
    let path = locate_ffmpeg(settings.ffmpeg_path.as_deref())
        .map_err(StereoError::BackendUnavailable)?;
    verify_executable(&path).map_err(StereoError::BackendUnavailable)?;

    if let Some(ref expected) = settings.ffmpeg_sha256 {
        verify_checksum(&path, expected).map_err(StereoError::BackendUnavailable)?;
        log::debug!("ffmpeg checksum verified: {}", expected);
    }

    log::info!("Using ffmpeg at {}", path.display());
    Ok(path)
}

/// Get the path to the ffmpeg binary
///
/// An explicit path wins and must exist. Otherwise the bundled copy next to
/// the executable is preferred over whatever is on the `PATH`.
pub fn locate_ffmpeg(explicit: Option<&Path>) -> std::result::Result<PathBuf, String> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(format!("ffmpeg not found at {}", path.display()));
    }

    if let Some(bundled) = bundled_ffmpeg() {
        log::debug!("Found bundled ffmpeg at {:?}", bundled);
        return Ok(bundled);
    }

    if let Some(on_path) = find_on_path(FFMPEG_BINARY) {
        log::debug!("Found ffmpeg on PATH at {:?}", on_path);
        return Ok(on_path);
    }

    Err("ffmpeg binary not found. Install ffmpeg or set ffmpeg_path in the settings".to_string())
}

fn bundled_ffmpeg() -> Option<PathBuf> {
    let exe_path = std::env::current_exe().ok()?;
    let exe_dir = exe_path.parent()?;

    // macOS app bundle: Contents/MacOS/../Resources/bin/ffmpeg
    let candidates = [
        exe_dir.join("resources").join("bin").join(FFMPEG_BINARY),
        exe_dir.join("..").join("Resources").join("bin").join(FFMPEG_BINARY),
    ];
    candidates.into_iter().find(|p| p.is_file())
}

fn find_on_path(binary: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.is_file())
}

/// Verify that a binary exists and is executable
pub fn verify_executable(path: &Path) -> std::result::Result<(), String> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| format!("ffmpeg not found at {}: {}", path.display(), e))?;

    if !metadata.is_file() {
        return Err(format!("ffmpeg at {} is not a file", path.display()));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(format!("ffmpeg at {} is not executable", path.display()));
        }
    }

    Ok(())
}

/// Hex SHA-256 of a file
pub fn sha256_file(path: &Path) -> std::result::Result<String, String> {
    let mut file =
        File::open(path).map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file
            .read(&mut buf)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Compare a file against a pinned hex SHA-256 digest (case-insensitive)
pub fn verify_checksum(path: &Path, expected: &str) -> std::result::Result<(), String> {
    let actual = sha256_file(path)?;
    if actual.eq_ignore_ascii_case(expected.trim()) {
        Ok(())
    } else {
        Err(format!(
            "checksum mismatch for {}: expected {}, got {}",
            path.display(),
            expected,
            actual
        ))
    }
}
