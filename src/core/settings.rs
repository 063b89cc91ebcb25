//! Conversion settings
//!
//! Loaded once at startup and passed by value into the converter. Nothing
//! here is process-global.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, StereoError};

pub const DEFAULT_SAMPLE_RATE: u32 = 44100;
pub const DEFAULT_ARCHIVE_NAME: &str = "converted_stereo_files.zip";
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Which transcoding backend converts the files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// External ffmpeg process
    #[default]
    Ffmpeg,
    /// In-process decode (symphonia) and WAV write (hound)
    Native,
}

/// Settings for one run of the converter
///
/// Read from `settings.json` in the config directory, or from an explicit
/// `--config` file. Every field has a default so partial files are fine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub backend: BackendKind,
    /// Explicit ffmpeg binary; searched for when unset
    pub ffmpeg_path: Option<PathBuf>,
    /// Pinned SHA-256 (hex) of the ffmpeg binary
    pub ffmpeg_sha256: Option<String>,
    /// Output sample rate when a file has to be re-rendered
    pub sample_rate: u32,
    /// Leave files that are already stereo un-remixed and un-resampled
    pub passthrough_stereo: bool,
    /// Kill an ffmpeg run that takes longer than this
    pub timeout_secs: Option<u64>,
    pub archive_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            ffmpeg_path: None,
            ffmpeg_sha256: None,
            sample_rate: DEFAULT_SAMPLE_RATE,
            passthrough_stereo: true,
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
            archive_name: DEFAULT_ARCHIVE_NAME.to_string(),
        }
    }
}

impl Settings {
    const SETTINGS_FILE: &'static str = "settings.json";

    /// Default settings location (`<config dir>/auto-stereo/settings.json`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("auto-stereo").join(Self::SETTINGS_FILE))
    }

    /// Load settings from `path`, or from the default location if it exists.
    ///
    /// An explicit path that cannot be read is an error; a missing default
    /// file just means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings = match path {
            Some(p) => Self::load_from(p)?,
            None => match Self::default_path() {
                Some(p) if p.exists() => Self::load_from(&p)?,
                _ => {
                    log::debug!("No settings file, using defaults");
                    Self::default()
                }
            },
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            StereoError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
            StereoError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        log::debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(StereoError::Config("sample_rate must be positive".to_string()));
        }
        if self.archive_name.trim().is_empty() {
            return Err(StereoError::Config("archive_name must not be empty".to_string()));
        }
        if let Some(ref digest) = self.ffmpeg_sha256 {
            let valid = digest.len() == 64 && digest.chars().all(|c| c.is_ascii_hexdigit());
            if !valid {
                return Err(StereoError::Config(format!(
                    "ffmpeg_sha256 is not a SHA-256 hex digest: {}",
                    digest
                )));
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<std::time::Duration> {
        self.timeout_secs.map(std::time::Duration::from_secs)
    }
}
