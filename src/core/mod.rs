//! Core types shared by the batch and the command-line shell

pub mod progress;
pub mod scanning;
pub mod settings;

pub use progress::ProgressState;
pub use scanning::{find_mp3_files, load_uploads, UploadedFile};
pub use settings::{BackendKind, Settings};
