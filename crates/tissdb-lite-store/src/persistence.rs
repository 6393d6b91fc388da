//! JSON-file snapshot of every collection.
//!
//! The file is a single pretty-printed object mapping collection name to an
//! array of documents. Writes go to a sibling temporary file that is then
//! renamed over the data file, so a crash never leaves a truncated snapshot.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::document::Document;
use crate::error::StoreResult;

/// Collection name to documents, in a stable order.
pub type Snapshot = BTreeMap<String, Vec<Document>>;

/// Reads and writes the data file.
#[derive(Debug, Clone)]
pub struct DataFile {
    path: PathBuf,
}

impl DataFile {
    /// Bind to the data file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the data file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot, creating the parent directory if needed.
    ///
    /// A missing file is an empty snapshot. A file that cannot be read or
    /// decoded is logged and also treated as empty.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the data directory cannot be created.
    pub fn load(&self) -> StoreResult<Snapshot> {
        self.ensure_dir()?;
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Snapshot::new()),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "error loading data file, starting empty");
                return Ok(Snapshot::new());
            }
        };
        match serde_json::from_str::<Snapshot>(&raw) {
            Ok(snapshot) => {
                debug!(
                    path = %self.path.display(),
                    collections = snapshot.len(),
                    "loaded data file"
                );
                Ok(snapshot)
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "error decoding data file, starting empty");
                Ok(Snapshot::new())
            }
        }
    }

    /// Atomically replace the data file with `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` or `StoreError::Serialization` on failure;
    /// the previous file is left intact.
    pub fn save(&self, snapshot: &Snapshot) -> StoreResult<()> {
        self.ensure_dir()?;
        let json = serde_json::to_vec_pretty(snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), collections = snapshot.len(), "saved data file");
        Ok(())
    }

    fn ensure_dir(&self) -> StoreResult<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_should_load_empty_snapshot_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let file = DataFile::new(dir.path().join("nested").join("tissdb.json"));
        assert!(file.load().unwrap().is_empty());
        assert!(dir.path().join("nested").is_dir());
    }

    #[test]
    fn test_should_round_trip_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let file = DataFile::new(dir.path().join("tissdb.json"));
        let serde_json::Value::Object(doc) = json!({"_id": "1", "name": "Alice"}) else {
            unreachable!()
        };
        let snapshot = Snapshot::from([("users".to_owned(), vec![doc])]);
        file.save(&snapshot).unwrap();
        assert_eq!(file.load().unwrap(), snapshot);
        assert!(!dir.path().join("tissdb.json.tmp").exists());
    }

    #[test]
    fn test_should_start_empty_on_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tissdb.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(DataFile::new(&path).load().unwrap().is_empty());
    }

    #[test]
    fn test_should_write_pretty_json_object() {
        let dir = tempfile::tempdir().unwrap();
        let file = DataFile::new(dir.path().join("tissdb.json"));
        file.save(&Snapshot::from([("empty".to_owned(), Vec::new())]))
            .unwrap();
        let raw = fs::read_to_string(file.path()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, json!({"empty": []}));
        assert!(raw.contains('\n'));
    }
}
