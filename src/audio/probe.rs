use std::fs::File;
use std::path::Path;
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Basic facts about the first audio track of a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    /// Channel count, when the container or first frame declares it
    pub channels: Option<usize>,
    pub sample_rate: Option<u32>,
    /// Codec name as reported by symphonia (e.g. "mp3", "pcm_s16le")
    pub codec: String,
}

impl StreamInfo {
    pub fn is_stereo(&self) -> bool {
        self.channels == Some(2)
    }
}

/// Probe an audio file without decoding it
pub fn probe_stream(path: &Path) -> Result<StreamInfo, String> {
    let file = File::open(path).map_err(|e| format!("Failed to open file: {}", e))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension() {
        hint.with_extension(&ext.to_string_lossy());
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| format!("Failed to probe audio format: {}", e))?;

    let track = probed
        .format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| "No audio track found".to_string())?;

    let params = &track.codec_params;
    let codec = symphonia::default::get_codecs()
        .get_codec(params.codec)
        .map(|d| d.short_name.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    Ok(StreamInfo {
        channels: params.channels.map(|c| c.count()),
        sample_rate: params.sample_rate,
        codec,
    })
}
