//! Audio conversion module
//!
//! Converts one audio file to a 2-channel WAV. Two backends implement the
//! [`Converter`] trait: an external ffmpeg process and an in-process
//! symphonia decoder.

pub mod backend;
mod ffmpeg;
mod native;

pub use backend::acquire_ffmpeg;
pub use ffmpeg::{FfmpegConverter, FfmpegOptions};
pub use native::NativeConverter;

use std::path::{Path, PathBuf};

use crate::core::{BackendKind, Settings};
use crate::error::Result;

/// Extension given to every converted file
pub const OUTPUT_EXTENSION: &str = "wav";

/// Result of a file conversion
#[derive(Debug, Clone)]
pub struct ConversionResult {
    /// Path to the converted output file
    pub output_path: PathBuf,
    /// Original input file path
    pub input_path: PathBuf,
    /// Whether conversion was successful
    pub success: bool,
    /// Error message if conversion failed
    pub error: Option<String>,
}

impl ConversionResult {
    pub fn ok(input_path: &Path, output_path: &Path) -> Self {
        Self {
            output_path: output_path.to_path_buf(),
            input_path: input_path.to_path_buf(),
            success: true,
            error: None,
        }
    }

    pub fn failed(input_path: &Path, output_path: &Path, error: impl Into<String>) -> Self {
        Self {
            output_path: output_path.to_path_buf(),
            input_path: input_path.to_path_buf(),
            success: false,
            error: Some(error.into()),
        }
    }

    /// Build a result from a backend outcome, removing any partial output on failure
    pub(crate) fn from_outcome(
        input_path: &Path,
        output_path: &Path,
        outcome: std::result::Result<(), String>,
    ) -> Self {
        match outcome {
            Ok(()) => Self::ok(input_path, output_path),
            Err(e) => {
                let _ = std::fs::remove_file(output_path);
                Self::failed(input_path, output_path, e)
            }
        }
    }
}

/// A transcoding backend that turns one audio file into a stereo WAV
pub trait Converter {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Check the backend can run at all. A failure here aborts the batch.
    fn check_available(&self) -> Result<()>;

    /// Convert `input_path` into a 2-channel file at `output_path`
    fn convert(&self, input_path: &Path, output_path: &Path) -> ConversionResult;
}

/// Build the converter selected in `settings`
///
/// For ffmpeg this locates and verifies the binary, so a missing backend is
/// reported here, before any file is touched.
pub fn build_converter(settings: &Settings) -> Result<Box<dyn Converter>> {
    match settings.backend {
        BackendKind::Ffmpeg => {
            let ffmpeg_path = acquire_ffmpeg(settings)?;
            Ok(Box::new(FfmpegConverter::new(
                ffmpeg_path,
                FfmpegOptions::from_settings(settings),
            )))
        }
        BackendKind::Native => Ok(Box::new(NativeConverter::new())),
    }
}

/// Output file name for an uploaded file: its stem with a `.wav` extension
///
/// Directory components in the upload name are ignored.
pub fn output_file_name(input_name: &str) -> String {
    let stem = Path::new(input_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "output".to_string());
    format!("{}.{}", stem, OUTPUT_EXTENSION)
}
