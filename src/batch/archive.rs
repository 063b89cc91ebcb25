//! ZIP packaging of converted files

use std::fs::File;
use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::Result;

pub const ARCHIVE_MIME_TYPE: &str = "application/zip";

/// Build an in-memory ZIP holding each file under its base name
///
/// Entries keep the order of `paths`. Directory structure is dropped.
pub fn build_archive(paths: &[PathBuf]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in paths {
        let name = entry_name(path);
        zip.start_file(name.as_str(), options)?;
        let mut file = File::open(path)?;
        let written = io::copy(&mut file, &mut zip)?;
        log::debug!("Archived {} ({} bytes)", name, written);
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

/// Write archive bytes to disk
pub fn write_archive(bytes: &[u8], destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut file = File::create(destination)?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(())
}

fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
