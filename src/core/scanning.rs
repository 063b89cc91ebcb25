//! Input discovery
//!
//! Turns the paths given on the command line into uploaded files. Folders are
//! walked recursively; only `.mp3` files are picked up, by extension alone.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::audio::is_mp3_file;
use crate::error::Result;

/// One file handed to the batch: a name and its bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Read a file from disk, named after its last path component
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown.mp3".to_string());
        Ok(Self { name, data })
    }
}

/// Expand files and folders into the list of MP3 paths to convert
///
/// Explicit files keep their command-line order; each folder contributes its
/// MP3s sorted by path. Non-MP3 files are skipped with a warning.
pub fn find_mp3_files(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut found = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut in_folder: Vec<PathBuf> = WalkDir::new(input)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| is_mp3_file(p))
                .collect();
            in_folder.sort();
            log::debug!("Found {} MP3 files in {:?}", in_folder.len(), input);
            found.extend(in_folder);
        } else if is_mp3_file(input) {
            found.push(input.clone());
        } else {
            log::warn!("Skipping non-MP3 input: {}", input.display());
        }
    }

    found
}

/// Read every path into memory
pub fn load_uploads(paths: &[PathBuf]) -> Result<Vec<UploadedFile>> {
    paths.iter().map(|p| UploadedFile::from_path(p)).collect()
}
