//! Artifact writers.
//!
//! RULE: Writers hold no consistency logic. They receive a finished
//! Artifact and a destination and turn the record into bytes.
//! One rendering variant exists per Record kind; the pipeline never
//! depends on which one runs.

pub mod csv;
pub mod pdf;

use crate::{
    artifact::{Artifact, Record},
    error::{PopError, PopResult},
    store::HistoryDb,
};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// Destination for finished artifacts.
pub trait ArtifactWriter {
    /// Persist `artifact` at `path`. Returns the number of bytes written.
    fn write(&mut self, artifact: &Artifact, path: &Path) -> PopResult<u64>;
}

/// Render byte-oriented records. Database records return None: they
/// are built through the store instead.
pub fn render_bytes(record: &Record) -> PopResult<Option<Vec<u8>>> {
    let bytes = match record {
        Record::Text(text) => text.as_bytes().to_vec(),
        Record::Report(report) => pdf::render(report),
        Record::Workbook(table) => csv::render(table),
        Record::Json(value) => {
            let mut bytes = serde_json::to_vec_pretty(value)?;
            bytes.push(b'\n');
            bytes
        }
        Record::Binary(bytes) => bytes.clone(),
        Record::ChromiumHistory(_) | Record::FirefoxHistory(_) => return Ok(None),
    };
    Ok(Some(bytes))
}

fn fill_history(db: &HistoryDb, record: &Record) -> PopResult<()> {
    match record {
        Record::ChromiumHistory(history) => db.write_chromium(history),
        Record::FirefoxHistory(history) => db.write_firefox(history),
        other => Err(PopError::Other(anyhow::anyhow!(
            "{} record is not a history database",
            other.kind()
        ))),
    }
}

// ── File sink ─────────────────────────────────────────────────

/// Writes artifacts to the real file system, creating parent folders.
#[derive(Debug, Default)]
pub struct FileSink {
    pub files_written: usize,
    pub bytes_written: u64,
}

impl FileSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArtifactWriter for FileSink {
    fn write(&mut self, artifact: &Artifact, path: &Path) -> PopResult<u64> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PopError::io(parent, e))?;
        }
        let size = match render_bytes(&artifact.record)? {
            Some(bytes) => {
                std::fs::write(path, &bytes).map_err(|e| PopError::io(path, e))?;
                bytes.len() as u64
            }
            None => {
                let db = HistoryDb::create(path)?;
                fill_history(&db, &artifact.record)?;
                drop(db);
                std::fs::metadata(path)
                    .map_err(|e| PopError::io(path, e))?
                    .len()
            }
        };
        self.files_written += 1;
        self.bytes_written += size;
        log::debug!("wrote {} ({} bytes, {})", path.display(), size, artifact.record.kind());
        Ok(size)
    }
}

// ── Memory sink ───────────────────────────────────────────────

/// Keeps artifacts in memory keyed by destination. History databases
/// are still built, in an in-memory SQLite, so their size is real.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub files: BTreeMap<PathBuf, Artifact>,
    pub sizes: BTreeMap<PathBuf, u64>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Artifact stored at a path ending with `suffix` (forward slashes).
    pub fn find(&self, suffix: &str) -> Option<&Artifact> {
        self.files
            .iter()
            .find(|(path, _)| crate::artifact::slash_path(path).ends_with(suffix))
            .map(|(_, a)| a)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl ArtifactWriter for MemorySink {
    fn write(&mut self, artifact: &Artifact, path: &Path) -> PopResult<u64> {
        let size = match render_bytes(&artifact.record)? {
            Some(bytes) => bytes.len() as u64,
            None => {
                let db = HistoryDb::in_memory()?;
                fill_history(&db, &artifact.record)?;
                db.size_bytes()?
            }
        };
        self.files.insert(path.to_path_buf(), artifact.clone());
        self.sizes.insert(path.to_path_buf(), size);
        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{HistoryStore, Location, Report};
    use crate::types::ArtifactCategory;

    #[test]
    fn file_sink_creates_parents_and_counts_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Desktop/Notes/todo.txt");
        let artifact = Artifact::home(
            ArtifactCategory::Office,
            "Desktop/Notes/todo.txt",
            Record::Text("buy milk\n".into()),
        );

        let mut sink = FileSink::new();
        let n = sink.write(&artifact, &path).unwrap();
        assert_eq!(n, 9);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "buy milk\n");
        assert_eq!(sink.files_written, 1);
    }

    #[test]
    fn file_sink_builds_history_databases() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("History");
        let artifact = Artifact::new(
            ArtifactCategory::Browser,
            Location::LocalAppData,
            "History",
            Record::ChromiumHistory(HistoryStore { pages: vec![] }),
        );
        let n = FileSink::new().write(&artifact, &path).unwrap();
        assert!(n > 0);
        assert!(HistoryDb::open(&path).unwrap().chromium_urls().unwrap().is_empty());
    }

    #[test]
    fn memory_sink_finds_by_suffix() {
        let mut sink = MemorySink::new();
        let artifact = Artifact::home(
            ArtifactCategory::Tax,
            "Desktop/Tax Documents/2024/W2_Form_2024.pdf",
            Record::Report(Report::new("W-2")),
        );
        sink.write(&artifact, Path::new("/root/Desktop/Tax Documents/2024/W2_Form_2024.pdf"))
            .unwrap();
        assert!(sink.find("2024/W2_Form_2024.pdf").is_some());
        assert!(sink.find("W2_Form_2023.pdf").is_none());
    }
}
