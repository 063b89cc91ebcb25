//! In-process stereo conversion
//!
//! Decodes with symphonia and writes 16-bit PCM WAV with hound. The source
//! sample rate is kept; only the channel layout changes.

use std::fs::File;
use std::io::{BufWriter, ErrorKind};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::{ConversionResult, Converter};
use crate::error::Result;

/// Converter backed by the symphonia decoder
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeConverter;

impl NativeConverter {
    pub fn new() -> Self {
        Self
    }
}

impl Converter for NativeConverter {
    fn name(&self) -> &'static str {
        "native"
    }

    fn check_available(&self) -> Result<()> {
        Ok(())
    }

    fn convert(&self, input_path: &Path, output_path: &Path) -> ConversionResult {
        log::debug!(
            "Decoding: {} -> {}",
            input_path.display(),
            output_path.display()
        );
        let outcome = transcode_to_stereo_wav(input_path, output_path).map(|frames| {
            log::debug!("Wrote {} stereo frames to {}", frames, output_path.display());
        });
        ConversionResult::from_outcome(input_path, output_path, outcome)
    }
}

/// Map one interleaved frame to a left/right pair
///
/// Mono is duplicated; wider layouts keep their front pair.
fn stereo_frame(frame: &[i16]) -> (i16, i16) {
    match frame {
        [] => (0, 0),
        [mono] => (*mono, *mono),
        [left, right, ..] => (*left, *right),
    }
}

/// The WAV header carries one rate, so a stream that changes rate can't be written
fn check_rate(expected: u32, actual: u32) -> std::result::Result<(), String> {
    if expected == actual {
        Ok(())
    } else {
        Err(format!(
            "Sample rate changed mid-stream from {} Hz to {} Hz",
            expected, actual
        ))
    }
}

/// Decode `input_path` and write it as a 2-channel WAV, returning the frame count
fn transcode_to_stereo_wav(input_path: &Path, output_path: &Path) -> std::result::Result<u64, String> {
    let file = File::open(input_path).map_err(|e| format!("Failed to open audio file: {}", e))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = input_path.extension() {
        hint.with_extension(&ext.to_string_lossy());
    }

    let mut probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| format!("Failed to probe audio format: {}", e))?;

    let track = probed
        .format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| "No audio track found".to_string())?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| format!("Failed to create decoder: {}", e))?;

    let mut writer: Option<hound::WavWriter<BufWriter<File>>> = None;
    let mut frames_written: u64 = 0;
    let mut skipped_packets: usize = 0;

    loop {
        let packet = match probed.format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(format!("Failed to read packet: {}", e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                skipped_packets += 1;
                log::debug!("Skipping undecodable packet in {}: {}", input_path.display(), e);
                continue;
            }
            Err(e) => return Err(format!("Failed to decode: {}", e)),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count();
        if channels == 0 || decoded.frames() == 0 {
            continue;
        }

        let mut samples = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
        samples.copy_interleaved_ref(decoded);

        if writer.is_none() {
            let wav_spec = hound::WavSpec {
                channels: 2,
                sample_rate: spec.rate,
                bits_per_sample: 16,
                sample_format: hound::SampleFormat::Int,
            };
            let created = hound::WavWriter::create(output_path, wav_spec)
                .map_err(|e| format!("Failed to create output file: {}", e))?;
            writer = Some(created);
        }

        if let Some(w) = writer.as_mut() {
            check_rate(w.spec().sample_rate, spec.rate)?;
            for frame in samples.samples().chunks_exact(channels) {
                let (left, right) = stereo_frame(frame);
                w.write_sample(left)
                    .and_then(|_| w.write_sample(right))
                    .map_err(|e| format!("Failed to write samples: {}", e))?;
                frames_written += 1;
            }
        }
    }

    if skipped_packets > 0 {
        log::warn!(
            "{}: skipped {} undecodable packets",
            input_path.display(),
            skipped_packets
        );
    }

    match writer {
        Some(w) if frames_written > 0 => {
            w.finalize()
                .map_err(|e| format!("Failed to finalize output file: {}", e))?;
            Ok(frames_written)
        }
        _ => Err("No audio could be decoded".to_string()),
    }
}
