//! Test fixtures for conversion tests
//!
//! WAV fixtures are generated in-process with hound. MP3 fixtures need an
//! ffmpeg on the machine; helpers return `None` when there isn't one so
//! tests can skip.

#![cfg(test)]

use std::f32::consts::PI;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Find an ffmpeg for tests, if the machine has one
pub fn ffmpeg_path() -> Option<PathBuf> {
    let path = crate::conversion::backend::locate_ffmpeg(None).ok()?;
    crate::conversion::backend::verify_executable(&path).ok()?;
    Some(path)
}

/// Generate a 16-bit WAV containing a 440 Hz sine on every channel
///
/// # Arguments
/// * `dir` - Directory to write into
/// * `name` - File name
/// * `channels` - Channel count
/// * `sample_rate` - Sample rate in Hz
/// * `duration_secs` - Duration in seconds
pub fn generate_wav_file(
    dir: &Path,
    name: &str,
    channels: u16,
    sample_rate: u32,
    duration_secs: f32,
) -> PathBuf {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).expect("Failed to create WAV");

    let frames = (sample_rate as f32 * duration_secs) as u32;
    for i in 0..frames {
        let t = i as f32 / sample_rate as f32;
        let sample = ((2.0 * PI * 440.0 * t).sin() * 0.5 * i16::MAX as f32) as i16;
        for ch in 0..channels {
            // Slight per-channel offset so channels are distinguishable
            writer
                .write_sample(sample.saturating_add(ch as i16))
                .expect("Failed to write sample");
        }
    }
    writer.finalize().expect("Failed to finalize WAV");
    path
}

/// Generate a one-second MP3 with ffmpeg, or `None` without ffmpeg
pub fn generate_mp3_file(dir: &Path, name: &str, channels: u16) -> Option<PathBuf> {
    let ffmpeg = ffmpeg_path()?;
    let output_path = dir.join(name);

    let output = Command::new(&ffmpeg)
        .arg("-hide_banner")
        .arg("-loglevel")
        .arg("error")
        .arg("-f")
        .arg("lavfi")
        .arg("-i")
        .arg("sine=frequency=440:duration=1")
        .arg("-ac")
        .arg(channels.to_string())
        .arg("-codec:a")
        .arg("libmp3lame")
        .arg("-y")
        .arg(&output_path)
        .output()
        .ok()?;

    if !output.status.success() {
        // Some ffmpeg builds ship without libmp3lame
        eprintln!(
            "ffmpeg could not create MP3 fixture: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        return None;
    }

    Some(output_path)
}
