use std::path::Path;

/// Check if a file looks like an MP3 based on its extension
///
/// Content is not inspected; a mislabeled file fails later at conversion.
pub fn is_mp3_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("mp3"))
        .unwrap_or(false)
}
