// Audio module - input detection and stream probing

pub mod detection;
pub mod probe;

pub use detection::is_mp3_file;
pub use probe::{probe_stream, StreamInfo};
