//! FFmpeg subprocess handling for stereo conversion

use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use super::{backend, ConversionResult, Converter};
use crate::audio::probe_stream;
use crate::core::Settings;
use crate::error::{Result, StereoError};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Options passed to ffmpeg for every file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegOptions {
    /// Sample rate used when a file is re-rendered to stereo
    pub sample_rate: u32,
    /// Leave already-stereo input at its own channel layout and rate
    pub passthrough_stereo: bool,
    /// Kill ffmpeg after this long
    pub timeout: Option<Duration>,
}

impl FfmpegOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            sample_rate: settings.sample_rate,
            passthrough_stereo: settings.passthrough_stereo,
            timeout: settings.timeout(),
        }
    }
}

impl Default for FfmpegOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Converter that shells out to ffmpeg
#[derive(Debug, Clone)]
pub struct FfmpegConverter {
    ffmpeg_path: PathBuf,
    options: FfmpegOptions,
}

impl FfmpegConverter {
    pub fn new(ffmpeg_path: PathBuf, options: FfmpegOptions) -> Self {
        Self {
            ffmpeg_path,
            options,
        }
    }

    /// Whether this input has to be remixed to two channels
    ///
    /// Unknown channel counts are always forced.
    fn needs_remix(&self, input_path: &Path) -> bool {
        if !self.options.passthrough_stereo {
            return true;
        }
        match probe_stream(input_path) {
            Ok(info) => {
                log::debug!(
                    "{}: codec={} channels={:?} rate={:?}",
                    input_path.display(),
                    info.codec,
                    info.channels,
                    info.sample_rate
                );
                !info.is_stereo()
            }
            Err(e) => {
                log::debug!("Probe failed for {}: {}", input_path.display(), e);
                true
            }
        }
    }
}

/// Build the ffmpeg argument list
///
/// `-acodec pcm_s16le` always; `-ac 2 -ar <rate>` only when `remix_rate` is set.
pub fn build_args(input_path: &Path, output_path: &Path, remix_rate: Option<u32>) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-hide_banner", "-nostdin", "-loglevel", "error", "-y", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(input_path.as_os_str().to_owned());
    args.extend(["-vn", "-acodec", "pcm_s16le"].into_iter().map(OsString::from));

    if let Some(rate) = remix_rate {
        args.push("-ac".into());
        args.push("2".into());
        args.push("-ar".into());
        args.push(rate.to_string().into());
    }

    args.push(output_path.as_os_str().to_owned());
    args
}

/// Run ffmpeg to completion, killing it if it outlives `timeout`
fn run_ffmpeg(
    ffmpeg_path: &Path,
    args: &[OsString],
    timeout: Option<Duration>,
) -> std::result::Result<(), String> {
    let mut cmd = Command::new(ffmpeg_path);
    cmd.args(args);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::null());
    cmd.stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|e| format!("Failed to spawn ffmpeg: {}", e))?;

    // Drain stderr while waiting; a full pipe blocks ffmpeg
    let stderr_reader = child.stderr.take().map(|mut stderr| {
        thread::spawn(move || {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf);
            buf
        })
    });

    let started = Instant::now();
    let status = loop {
        if let Some(status) = child
            .try_wait()
            .map_err(|e| format!("Failed to wait for ffmpeg: {}", e))?
        {
            break status;
        }
        if let Some(limit) = timeout {
            if started.elapsed() >= limit {
                let _ = child.kill();
                let _ = child.wait();
                return Err(format!("ffmpeg timed out after {:.1}s", limit.as_secs_f32()));
            }
        }
        thread::sleep(POLL_INTERVAL);
    };

    let stderr = stderr_reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();

    if status.success() {
        Ok(())
    } else {
        Err(format!(
            "ffmpeg exited with status {}: {}",
            status,
            stderr.lines().last().unwrap_or("Unknown error")
        ))
    }
}

impl Converter for FfmpegConverter {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn check_available(&self) -> Result<()> {
        backend::verify_executable(&self.ffmpeg_path).map_err(StereoError::BackendUnavailable)
    }

    fn convert(&self, input_path: &Path, output_path: &Path) -> ConversionResult {
        let remix_rate = if self.needs_remix(input_path) {
            Some(self.options.sample_rate)
        } else {
            None
        };

        log::debug!(
            "Converting: {} -> {} ({})",
            input_path.display(),
            output_path.display(),
            match remix_rate {
                Some(rate) => format!("remix to stereo @{}Hz", rate),
                None => "stereo passthrough".to_string(),
            }
        );

        let args = build_args(input_path, output_path, remix_rate);
        let outcome = run_ffmpeg(&self.ffmpeg_path, &args, self.options.timeout);
        if let Err(ref e) = outcome {
            log::debug!("ffmpeg failed for {}: {}", input_path.display(), e);
        }

        ConversionResult::from_outcome(input_path, output_path, outcome)
    }
}
