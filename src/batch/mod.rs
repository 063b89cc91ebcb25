//! Batch conversion
//!
//! Converts a list of uploaded files one at a time inside a scratch
//! directory that lives only for the duration of the call:
//!
//! ```text
//! <tmp>/auto-stereo-XXXX/input/<upload name>
//! <tmp>/auto-stereo-XXXX/output/<stem>.wav
//! ```
//!
//! Files that fail to convert are reported and skipped. Only a missing
//! backend stops the batch.

pub mod archive;
pub mod report;

pub use archive::{build_archive, write_archive, ARCHIVE_MIME_TYPE};
pub use report::BatchReport;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::conversion::{output_file_name, Converter};
use crate::core::{ProgressState, UploadedFile};
use crate::error::Result;

/// Identifier for one batch run, used in logs and reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchId(uuid::Uuid);

impl BatchId {
    pub fn new() -> Self {
        BatchId(uuid::Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Events emitted while a batch runs
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    /// Batch accepted, backend available
    Started { batch_id: BatchId, total: usize },
    /// A file converted; `output_name` is its archive entry name
    FileConverted { name: String, output_name: String },
    /// A file failed and will be left out
    FileFailed { name: String, error: String },
    /// Emitted after every file, success or failure
    Progress {
        completed: usize,
        total: usize,
        fraction: f32,
    },
}

/// A file that could not be converted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedFile {
    pub name: String,
    pub error: String,
}

/// What a batch produced
#[derive(Debug, Clone)]
pub struct BatchOutcome<T> {
    pub batch_id: BatchId,
    /// Output names of the converted files, in input order
    pub converted: Vec<String>,
    pub failed: Vec<FailedFile>,
    /// `None` when nothing converted
    pub output: Option<T>,
}

impl<T> BatchOutcome<T> {
    fn empty(batch_id: BatchId) -> Self {
        Self {
            batch_id,
            converted: Vec::new(),
            failed: Vec::new(),
            output: None,
        }
    }

    pub fn total(&self) -> usize {
        self.converted.len() + self.failed.len()
    }
}

/// Runs uploads through a converter, one file at a time
pub struct BatchProcessor<'a> {
    converter: &'a dyn Converter,
}

impl<'a> BatchProcessor<'a> {
    pub fn new(converter: &'a dyn Converter) -> Self {
        Self { converter }
    }

    /// Convert every file and package the successes as ZIP bytes
    pub fn process<F>(&self, files: &[UploadedFile], on_event: F) -> Result<BatchOutcome<Vec<u8>>>
    where
        F: FnMut(BatchEvent),
    {
        self.run(files, on_event, build_archive)
    }

    /// Convert every file and copy the successes into `output_dir`
    pub fn process_to_dir<F>(
        &self,
        files: &[UploadedFile],
        output_dir: &Path,
        on_event: F,
    ) -> Result<BatchOutcome<Vec<PathBuf>>>
    where
        F: FnMut(BatchEvent),
    {
        self.run(files, on_event, |outputs| {
            std::fs::create_dir_all(output_dir)?;
            let mut written = Vec::with_capacity(outputs.len());
            for output in outputs {
                if let Some(name) = output.file_name() {
                    let dest = output_dir.join(name);
                    std::fs::copy(output, &dest)?;
                    written.push(dest);
                }
            }
            Ok(written)
        })
    }

    /// The batch loop. `collect` runs while the scratch directory still exists
    /// and only when at least one file converted.
    fn run<T, F, C>(&self, files: &[UploadedFile], mut on_event: F, collect: C) -> Result<BatchOutcome<T>>
    where
        F: FnMut(BatchEvent),
        C: FnOnce(&[PathBuf]) -> Result<T>,
    {
        let batch_id = BatchId::new();
        if files.is_empty() {
            log::info!("Batch {}: no files to convert", batch_id);
            return Ok(BatchOutcome::empty(batch_id));
        }

        self.converter.check_available()?;

        let scratch = tempfile::Builder::new().prefix("auto-stereo-").tempdir()?;
        let input_dir = scratch.path().join("input");
        let output_dir = scratch.path().join("output");
        std::fs::create_dir_all(&input_dir)?;
        std::fs::create_dir_all(&output_dir)?;

        log::info!(
            "Batch {}: converting {} files with {} backend",
            batch_id,
            files.len(),
            self.converter.name()
        );
        on_event(BatchEvent::Started {
            batch_id,
            total: files.len(),
        });

        let mut outcome = BatchOutcome::empty(batch_id);
        let mut outputs: Vec<PathBuf> = Vec::new();
        let mut used_inputs = HashSet::new();
        let mut used_outputs = HashSet::new();
        let mut progress = ProgressState::new(files.len());

        for file in files {
            let input_path = input_dir.join(unique_name(&scratch_name(&file.name), &mut used_inputs));
            let output_name = unique_name(&output_file_name(&file.name), &mut used_outputs);
            let output_path = output_dir.join(&output_name);

            let result = match std::fs::write(&input_path, &file.data) {
                Ok(()) => self.converter.convert(&input_path, &output_path),
                Err(e) => crate::conversion::ConversionResult::failed(
                    &input_path,
                    &output_path,
                    format!("Failed to write scratch file: {}", e),
                ),
            };

            if result.success {
                log::info!("Successfully converted: {}", file.name);
                outputs.push(result.output_path);
                outcome.converted.push(output_name.clone());
                on_event(BatchEvent::FileConverted {
                    name: file.name.clone(),
                    output_name,
                });
            } else {
                let error = result.error.unwrap_or_else(|| "Unknown error".to_string());
                log::debug!("Conversion failed: {} - {}", file.name, error);
                outcome.failed.push(FailedFile {
                    name: file.name.clone(),
                    error: error.clone(),
                });
                on_event(BatchEvent::FileFailed {
                    name: file.name.clone(),
                    error,
                });
            }

            let done = progress.advance(result.success);
            log::info!(
                "Progress ({}/{}): {:.0}%",
                done,
                progress.total(),
                progress.fraction() * 100.0
            );
            on_event(BatchEvent::Progress {
                completed: done,
                total: progress.total(),
                fraction: progress.fraction(),
            });
        }

        if !outputs.is_empty() {
            outcome.output = Some(collect(&outputs)?);
        }

        log::info!(
            "Batch {}: {} converted, {} failed",
            batch_id,
            progress.completed_count(),
            progress.failed_count()
        );

        // `scratch` is dropped here, removing every scratch and output file
        Ok(outcome)
    }
}

/// On-disk name for an upload: its last path component only
fn scratch_name(upload_name: &str) -> String {
    Path::new(upload_name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "upload.mp3".to_string())
}

/// Return `name`, or `name (2)`, `name (3)`... if already taken
fn unique_name(name: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.to_string()) {
        return name.to_string();
    }

    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    let ext = path.extension().map(|e| e.to_string_lossy().into_owned());

    let mut n = 2;
    loop {
        let candidate = match ext {
            Some(ref ext) => format!("{} ({}).{}", stem, n, ext),
            None => format!("{} ({})", stem, n),
        };
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests;
