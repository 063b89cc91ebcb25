//! JSON summary of a finished batch

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{BatchOutcome, FailedFile};
use crate::error::Result;

/// Serializable record of what a batch did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_id: uuid::Uuid,
    pub backend: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total: usize,
    pub converted: Vec<String>,
    pub failed: Vec<FailedFile>,
    /// Where the results were written, if anywhere
    pub output: Option<PathBuf>,
}

impl BatchReport {
    pub fn from_outcome<T>(
        outcome: &BatchOutcome<T>,
        backend: &str,
        started_at: DateTime<Utc>,
        output: Option<PathBuf>,
    ) -> Self {
        Self {
            batch_id: *outcome.batch_id.as_uuid(),
            backend: backend.to_string(),
            started_at,
            finished_at: Utc::now(),
            total: outcome.total(),
            converted: outcome.converted.clone(),
            failed: outcome.failed.clone(),
            output,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::debug!("Saved batch report to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BatchId;
    use tempfile::TempDir;

    #[test]
    fn test_report_from_outcome() {
        let outcome: BatchOutcome<Vec<u8>> = BatchOutcome {
            batch_id: BatchId::new(),
            converted: vec!["a.wav".to_string()],
            failed: vec![FailedFile {
                name: "b.mp3".to_string(),
                error: "Invalid data found when processing input".to_string(),
            }],
            output: Some(vec![1, 2, 3]),
        };
        let started = Utc::now();

        let report = BatchReport::from_outcome(&outcome, "ffmpeg", started, None);
        assert_eq!(report.batch_id, *outcome.batch_id.as_uuid());
        assert_eq!(report.total, 2);
        assert_eq!(report.converted, vec!["a.wav"]);
        assert_eq!(report.failed[0].name, "b.mp3");
        assert!(report.finished_at >= report.started_at);
    }

    #[test]
    fn test_report_saved_as_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        let outcome: BatchOutcome<Vec<u8>> = BatchOutcome {
            batch_id: BatchId::new(),
            converted: Vec::new(),
            failed: Vec::new(),
            output: None,
        };
        let report = BatchReport::from_outcome(
            &outcome,
            "native",
            Utc::now(),
            Some(PathBuf::from("converted_stereo_files.zip")),
        );

        report.save(&path).unwrap();
        let loaded: BatchReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, report);
    }
}
