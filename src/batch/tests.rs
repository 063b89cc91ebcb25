use super::*;
use crate::conversion::{ConversionResult, NativeConverter};
use crate::error::StereoError;
use crate::test_fixtures::generate_wav_file;
use std::cell::{Cell, RefCell};
use std::io::Cursor;
use tempfile::TempDir;
use zip::ZipArchive;

/// Converter that "converts" by copying bytes, failing on payloads that
/// start with `corrupt`
#[derive(Default)]
struct FakeConverter {
    unavailable: bool,
    availability_checks: Cell<usize>,
    inputs: RefCell<Vec<PathBuf>>,
}

impl FakeConverter {
    fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }
}

impl Converter for FakeConverter {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn check_available(&self) -> Result<()> {
        self.availability_checks.set(self.availability_checks.get() + 1);
        if self.unavailable {
            Err(StereoError::BackendUnavailable("fake backend missing".to_string()))
        } else {
            Ok(())
        }
    }

    fn convert(&self, input_path: &Path, output_path: &Path) -> ConversionResult {
        self.inputs.borrow_mut().push(input_path.to_path_buf());
        let data = std::fs::read(input_path).unwrap();
        if data.starts_with(b"corrupt") {
            return ConversionResult::failed(input_path, output_path, "invalid data found");
        }
        std::fs::write(output_path, &data).unwrap();
        ConversionResult::ok(input_path, output_path)
    }
}

fn upload(name: &str, data: &[u8]) -> UploadedFile {
    UploadedFile::new(name, data.to_vec())
}

fn archive_entries(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    use std::io::Read;
    let mut archive = ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut entry = archive.by_index(i).unwrap();
            let mut data = Vec::new();
            entry.read_to_end(&mut data).unwrap();
            (entry.name().to_string(), data)
        })
        .collect()
}

#[test]
fn test_valid_and_corrupt_file() {
    let converter = FakeConverter::default();
    let files = vec![upload("a.mp3", b"audio-a"), upload("b.mp3", b"corrupt-b")];
    let mut events = Vec::new();

    let outcome = BatchProcessor::new(&converter)
        .process(&files, |e| events.push(e))
        .unwrap();

    let entries = archive_entries(&outcome.output.unwrap());
    assert_eq!(entries, vec![("a.wav".to_string(), b"audio-a".to_vec())]);
    assert_eq!(outcome.converted, vec!["a.wav"]);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].name, "b.mp3");

    assert!(events.iter().any(|e| matches!(
        e,
        BatchEvent::FileFailed { name, error } if name == "b.mp3" && error == "invalid data found"
    )));
}

#[test]
fn test_archive_entry_count_matches_successes() {
    let converter = FakeConverter::default();
    let files = vec![
        upload("one.mp3", b"1"),
        upload("two.mp3", b"corrupt"),
        upload("three.mp3", b"3"),
        upload("four.mp3", b"corrupt"),
        upload("five.mp3", b"5"),
    ];

    let outcome = BatchProcessor::new(&converter).process(&files, |_| {}).unwrap();

    let names: Vec<String> = archive_entries(outcome.output.as_ref().unwrap())
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(names, vec!["one.wav", "three.wav", "five.wav"]);
    assert_eq!(outcome.failed.len(), 2);
    assert_eq!(outcome.total(), 5);
}

#[test]
fn test_all_failures_produce_no_archive() {
    let converter = FakeConverter::default();
    let files = vec![upload("a.mp3", b"corrupt"), upload("b.mp3", b"corrupt")];

    let outcome = BatchProcessor::new(&converter).process(&files, |_| {}).unwrap();

    assert!(outcome.output.is_none());
    assert!(outcome.converted.is_empty());
    assert_eq!(outcome.failed.len(), 2);
}

#[test]
fn test_empty_batch_does_nothing() {
    let converter = FakeConverter::default();
    let mut events = Vec::new();

    let outcome = BatchProcessor::new(&converter)
        .process(&[], |e| events.push(e))
        .unwrap();

    assert!(outcome.output.is_none());
    assert!(events.is_empty());
    assert_eq!(converter.availability_checks.get(), 0);
}

#[test]
fn test_unavailable_backend_aborts_before_any_file() {
    let converter = FakeConverter::unavailable();
    let files = vec![upload("a.mp3", b"audio")];
    let mut events = Vec::new();

    let result = BatchProcessor::new(&converter).process(&files, |e| events.push(e));

    assert!(matches!(result, Err(StereoError::BackendUnavailable(_))));
    assert!(events.is_empty());
    assert!(converter.inputs.borrow().is_empty());
}

#[test]
fn test_progress_reaches_one() {
    let converter = FakeConverter::default();
    let files = vec![
        upload("a.mp3", b"a"),
        upload("b.mp3", b"corrupt"),
        upload("c.mp3", b"c"),
    ];
    let mut fractions = Vec::new();

    BatchProcessor::new(&converter)
        .process(&files, |e| {
            if let BatchEvent::Progress { fraction, .. } = e {
                fractions.push(fraction);
            }
        })
        .unwrap();

    assert_eq!(fractions.len(), 3);
    assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
    assert!((fractions[0] - 1.0 / 3.0).abs() < 1e-6);
    assert_eq!(*fractions.last().unwrap(), 1.0);
}

#[test]
fn test_events_follow_input_order() {
    let converter = FakeConverter::default();
    let files = vec![upload("x.mp3", b"x"), upload("y.mp3", b"corrupt")];
    let mut events = Vec::new();

    let outcome = BatchProcessor::new(&converter)
        .process(&files, |e| events.push(e))
        .unwrap();

    assert_eq!(events.len(), 5);
    assert_eq!(
        events[0],
        BatchEvent::Started {
            batch_id: outcome.batch_id,
            total: 2
        }
    );
    assert!(matches!(&events[1], BatchEvent::FileConverted { name, output_name } if name == "x.mp3" && output_name == "x.wav"));
    assert!(matches!(events[2], BatchEvent::Progress { completed: 1, total: 2, .. }));
    assert!(matches!(&events[3], BatchEvent::FileFailed { name, .. } if name == "y.mp3"));
    assert!(matches!(events[4], BatchEvent::Progress { completed: 2, total: 2, .. }));
}

#[test]
fn test_scratch_directory_is_removed() {
    let converter = FakeConverter::default();
    let files = vec![upload("a.mp3", b"a"), upload("b.mp3", b"corrupt")];

    BatchProcessor::new(&converter).process(&files, |_| {}).unwrap();

    let inputs = converter.inputs.borrow();
    assert_eq!(inputs.len(), 2);
    let scratch_root = inputs[0].parent().unwrap().parent().unwrap();
    assert!(!inputs[0].exists());
    assert!(!scratch_root.exists());
}

#[test]
fn test_duplicate_names_get_distinct_entries() {
    let converter = FakeConverter::default();
    let files = vec![
        upload("song.mp3", b"first"),
        upload("song.mp3", b"second"),
        upload("disc2/song.mp3", b"third"),
    ];

    let outcome = BatchProcessor::new(&converter).process(&files, |_| {}).unwrap();

    let entries = archive_entries(&outcome.output.unwrap());
    assert_eq!(
        entries,
        vec![
            ("song.wav".to_string(), b"first".to_vec()),
            ("song (2).wav".to_string(), b"second".to_vec()),
            ("song (3).wav".to_string(), b"third".to_vec()),
        ]
    );
}

#[test]
fn test_upload_names_cannot_escape_scratch_dir() {
    let converter = FakeConverter::default();
    let files = vec![upload("../../escape.mp3", b"data")];

    let outcome = BatchProcessor::new(&converter).process(&files, |_| {}).unwrap();

    assert_eq!(outcome.converted, vec!["escape.wav"]);
    let inputs = converter.inputs.borrow();
    assert_eq!(inputs[0].file_name().unwrap(), "escape.mp3");
    assert_eq!(inputs[0].parent().unwrap().file_name().unwrap(), "input");
}

#[test]
fn test_process_to_dir_writes_outputs() {
    let converter = FakeConverter::default();
    let out = TempDir::new().unwrap();
    let target = out.path().join("converted");
    let files = vec![upload("a.mp3", b"a"), upload("b.mp3", b"corrupt")];

    let outcome = BatchProcessor::new(&converter)
        .process_to_dir(&files, &target, |_| {})
        .unwrap();

    let written = outcome.output.unwrap();
    assert_eq!(written, vec![target.join("a.wav")]);
    assert_eq!(std::fs::read(target.join("a.wav")).unwrap(), b"a");
    assert!(!target.join("b.wav").exists());
}

#[test]
fn test_process_to_dir_all_failed_creates_nothing() {
    let converter = FakeConverter::default();
    let out = TempDir::new().unwrap();
    let target = out.path().join("converted");

    let outcome = BatchProcessor::new(&converter)
        .process_to_dir(&[upload("a.mp3", b"corrupt")], &target, |_| {})
        .unwrap();

    assert!(outcome.output.is_none());
    assert!(!target.exists());
}

#[test]
fn test_native_backend_end_to_end() {
    let fixtures = TempDir::new().unwrap();
    let mono = generate_wav_file(fixtures.path(), "tone.wav", 1, 16000, 0.25);
    let files = vec![
        UploadedFile::from_path(&mono).unwrap(),
        upload("broken.mp3", b"not audio"),
    ];
    let converter = NativeConverter::new();

    let outcome = BatchProcessor::new(&converter).process(&files, |_| {}).unwrap();

    assert_eq!(outcome.converted, vec!["tone.wav"]);
    assert_eq!(outcome.failed[0].name, "broken.mp3");

    let entries = archive_entries(&outcome.output.unwrap());
    assert_eq!(entries.len(), 1);
    let reader = hound::WavReader::new(Cursor::new(entries[0].1.clone())).unwrap();
    assert_eq!(reader.spec().channels, 2);
    assert_eq!(reader.duration(), 4000);
}

#[test]
fn test_unique_name() {
    let mut taken = HashSet::new();
    assert_eq!(unique_name("a.wav", &mut taken), "a.wav");
    assert_eq!(unique_name("a.wav", &mut taken), "a (2).wav");
    assert_eq!(unique_name("a.wav", &mut taken), "a (3).wav");
    assert_eq!(unique_name("noext", &mut taken), "noext");
    assert_eq!(unique_name("noext", &mut taken), "noext (2)");
}

#[test]
fn test_scratch_name() {
    assert_eq!(scratch_name("a.mp3"), "a.mp3");
    assert_eq!(scratch_name("dir/sub/a.mp3"), "a.mp3");
    assert_eq!(scratch_name(".."), "upload.mp3");
    assert_eq!(scratch_name(""), "upload.mp3");
}
