//! Local history of prediction results.
//!
//! Stored as a JSON array, newest first, at `$PDSCREEN_HISTORY` or
//! `<data_dir>/pdscreen/history.json`.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use pdscreen_common::Decision;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Environment variable overriding the history location
pub const HISTORY_ENV: &str = "PDSCREEN_HISTORY";

/// Oldest entries beyond this are dropped on record
pub const MAX_HISTORY_ENTRIES: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub prediction: u8,
    /// Probability as a rounded percentage
    pub probability: u8,
    pub severity: String,
}

impl HistoryEntry {
    pub fn from_decision(decision: &Decision, severity: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            prediction: decision.label,
            probability: (decision.probability * 100.0).round().clamp(0.0, 100.0) as u8,
            severity: severity.unwrap_or("unknown").to_string(),
        }
    }

    pub fn is_positive(&self) -> bool {
        self.prediction == 1
    }
}

/// Totals shown at the top of `history`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistorySummary {
    pub total: usize,
    pub positive: usize,
    pub negative: usize,
}

#[derive(Debug)]
pub struct History {
    path: PathBuf,
    entries: Vec<HistoryEntry>,
}

impl History {
    /// Resolve the default history path
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(HISTORY_ENV) {
            return Ok(PathBuf::from(path));
        }
        let data_dir =
            dirs::data_dir().ok_or_else(|| anyhow!("Cannot determine user data directory"))?;
        Ok(data_dir.join("pdscreen").join("history.json"))
    }

    /// History with no entries at `path`, without reading it
    pub fn empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            entries: Vec::new(),
        }
    }

    /// Load history from `path`. A missing file is an empty history.
    ///
    /// An unreadable or unrecognised file is an error, so it is never
    /// overwritten by a later `save`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::empty(path)),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()))
            }
        };
        let entries = serde_json::from_str(&content).with_context(|| {
            format!(
                "{} is not a pdscreen history file (move it aside or run `history --clear`)",
                path.display()
            )
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }

    /// Add an entry at the front, keeping at most `MAX_HISTORY_ENTRIES`
    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(MAX_HISTORY_ENTRIES);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn summary(&self) -> HistorySummary {
        let positive = self.entries.iter().filter(|e| e.is_positive()).count();
        HistorySummary {
            total: self.entries.len(),
            positive,
            negative: self.entries.len() - positive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_rounds_probability() {
        let entry = HistoryEntry::from_decision(&Decision::new(1, 0.8456), Some("mild"));
        assert_eq!(entry.probability, 85);
        assert_eq!(entry.severity, "mild");

        let entry = HistoryEntry::from_decision(&Decision::NEGATIVE, None);
        assert_eq!(entry.probability, 0);
        assert_eq!(entry.severity, "unknown");
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let history = History::load(&dir.path().join("history.json")).unwrap();
        assert!(history.entries().is_empty());
        assert_eq!(history.summary(), HistorySummary::default());
    }

    #[test]
    fn test_record_is_newest_first_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("history.json");

        let mut history = History::load(&path).unwrap();
        history.record(HistoryEntry::from_decision(&Decision::new(0, 0.1), None));
        history.record(HistoryEntry::from_decision(&Decision::new(1, 0.75), Some("severe")));
        history.save().unwrap();

        let reloaded = History::load(&path).unwrap();
        assert_eq!(reloaded.entries().len(), 2);
        assert_eq!(reloaded.entries()[0].prediction, 1);
        assert_eq!(reloaded.entries()[0].severity, "severe");
        assert_eq!(
            reloaded.summary(),
            HistorySummary {
                total: 2,
                positive: 1,
                negative: 1
            }
        );
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let mut history = History::load(&path).unwrap();
        history.record(HistoryEntry::from_decision(&Decision::new(1, 0.65), None));
        history.clear();
        history.save().unwrap();
        assert!(History::load(&path).unwrap().entries().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "not json").unwrap();
        let err = History::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("is not a pdscreen history file"));
    }

    #[test]
    fn test_foreign_history_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let foreign = r#"[{"prediction":1,"probability":75,"severity":"mild","date":"1/2/2025"}]"#;
        fs::write(&path, foreign).unwrap();

        assert!(History::load(&path).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), foreign);
    }

    #[test]
    fn test_record_caps_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut history = History::empty(&path);
        for i in 0..150 {
            let severity = format!("run-{}", i);
            history.record(HistoryEntry::from_decision(&Decision::NEGATIVE, Some(&severity)));
        }
        history.save().unwrap();

        let reloaded = History::load(&path).unwrap();
        assert_eq!(reloaded.entries().len(), MAX_HISTORY_ENTRIES);
        assert_eq!(reloaded.entries()[0].severity, "run-149");
        assert_eq!(reloaded.entries()[MAX_HISTORY_ENTRIES - 1].severity, "run-50");
    }
}
