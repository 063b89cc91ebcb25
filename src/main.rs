//! auto-stereo - MP3 to stereo WAV converter
//!
//! Converts a set of MP3 files to 2-channel 16-bit WAV and bundles the
//! results into `converted_stereo_files.zip`.

mod audio;
mod batch;
mod conversion;
mod core;
mod error;
mod logging;
mod test_fixtures;

use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::batch::{write_archive, BatchEvent, BatchProcessor, BatchReport};
use crate::conversion::Converter;
use crate::core::{find_mp3_files, load_uploads, BackendKind, Settings, UploadedFile};
use crate::error::StereoError;

/// Convert MP3 files to stereo WAV and bundle them in a ZIP archive.
#[derive(Parser, Debug)]
#[command(name = "auto-stereo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// MP3 files or folders containing MP3 files
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Where to write the ZIP archive [default: converted_stereo_files.zip]
    #[arg(short, long, conflicts_with = "output_dir")]
    output: Option<PathBuf>,

    /// Write the WAV files into this folder instead of a ZIP archive
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Transcoding backend
    #[arg(long, value_enum)]
    backend: Option<BackendKind>,

    /// Path to the ffmpeg binary
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    /// Settings file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write a JSON summary of the batch to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Show debug output in the terminal
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Settings from file, with command-line flags on top
    fn settings(&self) -> Result<Settings, StereoError> {
        let mut settings = Settings::load(self.config.as_deref())?;
        if let Some(backend) = self.backend {
            settings.backend = backend;
        }
        if let Some(ref ffmpeg) = self.ffmpeg {
            settings.ffmpeg_path = Some(ffmpeg.clone());
        }
        Ok(settings)
    }
}

fn print_event(event: &BatchEvent) {
    match event {
        BatchEvent::Started { total, .. } => {
            println!("Converting {} file(s) to stereo WAV...", total);
        }
        BatchEvent::FileConverted { name, .. } => println!("Successfully converted: {}", name),
        BatchEvent::FileFailed { name, error } => {
            eprintln!("Failed to convert: {}", name);
            eprintln!("  {}", error);
        }
        BatchEvent::Progress {
            completed,
            total,
            fraction,
        } => println!("[{}/{}] {:.0}%", completed, total, fraction * 100.0),
    }
}

/// How a run ended, mapped to the process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunStatus {
    /// At least one file converted and its output was written
    Converted,
    /// No MP3 inputs, the conversion never ran
    NothingToConvert,
    /// Every file failed
    NothingConverted,
}

impl RunStatus {
    fn exit_code(self) -> ExitCode {
        match self {
            RunStatus::Converted => ExitCode::SUCCESS,
            RunStatus::NothingToConvert => ExitCode::from(2),
            RunStatus::NothingConverted => ExitCode::FAILURE,
        }
    }
}

fn run(cli: &Cli) -> Result<RunStatus, StereoError> {
    let settings = cli.settings()?;

    let paths = find_mp3_files(&cli.inputs);
    if paths.is_empty() {
        eprintln!("No MP3 files to convert.");
        return Ok(RunStatus::NothingToConvert);
    }
    let uploads = load_uploads(&paths)?;

    let converter = conversion::build_converter(&settings)?;
    convert_uploads(cli, &settings, converter.as_ref(), &uploads)
}

/// Run the batch and write its archive (or folder) and report
fn convert_uploads(
    cli: &Cli,
    settings: &Settings,
    converter: &dyn Converter,
    uploads: &[UploadedFile],
) -> Result<RunStatus, StereoError> {
    let processor = BatchProcessor::new(converter);
    let started_at = chrono::Utc::now();

    let (report, converted_any) = if let Some(ref dir) = cli.output_dir {
        let outcome = processor.process_to_dir(uploads, dir, |e| print_event(&e))?;
        let converted_any = outcome.output.is_some();
        if converted_any {
            println!("Conversion completed! Files written to {}", dir.display());
        }
        let output = converted_any.then(|| dir.clone());
        (
            BatchReport::from_outcome(&outcome, converter.name(), started_at, output),
            converted_any,
        )
    } else {
        let destination = cli
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(&settings.archive_name));
        let outcome = processor.process(uploads, |e| print_event(&e))?;
        let written = match outcome.output {
            Some(ref bytes) => {
                write_archive(bytes, &destination)?;
                log::debug!(
                    "Wrote {} bytes of {} to {}",
                    bytes.len(),
                    batch::ARCHIVE_MIME_TYPE,
                    destination.display()
                );
                println!("Conversion completed! Download: {}", destination.display());
                Some(destination)
            }
            None => None,
        };
        let converted_any = written.is_some();
        (
            BatchReport::from_outcome(&outcome, converter.name(), started_at, written),
            converted_any,
        )
    };

    if let Some(ref path) = cli.report {
        report.save(path)?;
    }

    if converted_any {
        Ok(RunStatus::Converted)
    } else {
        eprintln!("No files were successfully converted.");
        Ok(RunStatus::NothingConverted)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    logging::init_logging(level);

    match run(&cli) {
        Ok(status) => status.exit_code(),
        Err(e) => {
            log::debug!("Run aborted: {}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
