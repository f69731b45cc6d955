/*
 * Durable storage for the completion log. The core only ever talks to the
 * `HistoryStoreOperations` trait, so tests inject in-memory fakes and the
 * log itself stays ignorant of where its bytes live. The shipped
 * implementation (`JsonHistoryStore`) keeps a single JSON file containing
 * the serialized entry array.
 *
 * Load semantics are deliberately forgiving: a missing file and a file
 * with malformed or non-array content both load as an empty history. Only
 * genuine I/O failures surface as errors, and the log recovers from those
 * too by starting empty.
 */
use super::models::HistoryEntry;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;

#[derive(Debug)]
pub enum PersistenceError {
    Io(io::Error),
    Serde(serde_json::Error),
}

impl From<io::Error> for PersistenceError {
    fn from(err: io::Error) -> Self {
        PersistenceError::Io(err)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::Serde(err)
    }
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceError::Io(e) => write!(f, "History I/O error: {e}"),
            PersistenceError::Serde(e) => write!(f, "History serialization error: {e}"),
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistenceError::Io(e) => Some(e),
            PersistenceError::Serde(e) => Some(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

pub trait HistoryStoreOperations: Send + Sync {
    fn load(&self) -> Result<Vec<HistoryEntry>>;
    fn save(&self, entries: &[HistoryEntry]) -> Result<()>;
}

pub struct JsonHistoryStore {
    file_path: PathBuf,
}

impl JsonHistoryStore {
    pub fn new(file_path: PathBuf) -> Self {
        JsonHistoryStore { file_path }
    }

    pub fn file_path(&self) -> &PathBuf {
        &self.file_path
    }
}

impl HistoryStoreOperations for JsonHistoryStore {
    /*
     * Reads the full entry array. A missing file is a normal first run.
     * Content that fails to parse is treated as an empty log rather than
     * an error; older or hand-edited files must never wedge startup.
     */
    fn load(&self) -> Result<Vec<HistoryEntry>> {
        log::trace!("JsonHistoryStore: Loading history from {:?}", self.file_path);
        if !self.file_path.exists() {
            log::debug!(
                "JsonHistoryStore: No history file at {:?}; starting empty.",
                self.file_path
            );
            return Ok(Vec::new());
        }

        let file = File::open(&self.file_path)?;
        let reader = BufReader::new(file);
        match serde_json::from_reader::<_, Vec<HistoryEntry>>(reader) {
            Ok(entries) => {
                log::debug!(
                    "JsonHistoryStore: Loaded {} entries from {:?}.",
                    entries.len(),
                    self.file_path
                );
                Ok(entries)
            }
            Err(e) => {
                log::warn!(
                    "JsonHistoryStore: Could not parse {:?} ({e}); treating as empty history.",
                    self.file_path
                );
                Ok(Vec::new())
            }
        }
    }

    /*
     * Writes the full entry array, creating parent directories on first
     * save. The file is replaced wholesale; the in-memory log is the
     * source of truth between saves.
     */
    fn save(&self, entries: &[HistoryEntry]) -> Result<()> {
        log::trace!(
            "JsonHistoryStore: Saving {} entries to {:?}",
            entries.len(),
            self.file_path
        );
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(&self.file_path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, entries)?;
        log::debug!(
            "JsonHistoryStore: Saved {} entries to {:?}.",
            entries.len(),
            self.file_path
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use time::macros::datetime;

    fn store_in(dir: &TempDir) -> JsonHistoryStore {
        JsonHistoryStore::new(dir.path().join("history.json"))
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().expect("Failed to create temp dir for test");
        let store = store_in(&dir);
        let loaded = store.load().unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = TempDir::new().expect("Failed to create temp dir for test");
        let store = store_in(&dir);

        let entries = vec![HistoryEntry {
            id: 1,
            title: "Sit".to_string(),
            completed_at: datetime!(2024-01-01 10:00:00 UTC),
            time_label: "10:00 AM".to_string(),
        }];

        store.save(&entries).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, entries);
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = TempDir::new().expect("Failed to create temp dir for test");
        let store = JsonHistoryStore::new(dir.path().join("nested/deeper/history.json"));
        store.save(&[]).unwrap();
        assert!(store.file_path().exists());
    }

    #[test]
    fn test_load_corrupted_file_is_empty() {
        let dir = TempDir::new().expect("Failed to create temp dir for test");
        let store = store_in(&dir);
        let mut file = File::create(store.file_path()).unwrap();
        write!(file, "this is not json").unwrap();

        let loaded = store.load().unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_load_non_array_json_is_empty() {
        let dir = TempDir::new().expect("Failed to create temp dir for test");
        let store = store_in(&dir);
        let mut file = File::create(store.file_path()).unwrap();
        write!(file, "{{\"unexpected\": true}}").unwrap();

        let loaded = store.load().unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_save_overwrites_previous_snapshot() {
        let dir = TempDir::new().expect("Failed to create temp dir for test");
        let store = store_in(&dir);

        let first = vec![HistoryEntry {
            id: 1,
            title: "Sit".to_string(),
            completed_at: datetime!(2024-01-01 10:00:00 UTC),
            time_label: "10:00 AM".to_string(),
        }];
        store.save(&first).unwrap();
        store.save(&[]).unwrap();
        assert!(store.load().unwrap().is_empty());
    }
}
