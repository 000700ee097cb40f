//! Document store backed by JSON-lines files

use super::store::DocumentStore;
use crate::core::{Result, TelemetryError};
use fs2::FileExt;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Name of the database directory created under the store root
pub const DATABASE: &str = "telemetry";

/// One `<collection>.jsonl` file per collection under `<root>/telemetry/`.
///
/// Each insert appends a single line while holding an exclusive file lock,
/// so several processes can share a store directory.
pub struct JsonlStore {
    dir: PathBuf,
    writers: Mutex<HashMap<String, BufWriter<File>>>,
}

impl JsonlStore {
    /// Open (creating if needed) the store rooted at `root`
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let dir = root.as_ref().join(DATABASE);
        fs::create_dir_all(&dir).map_err(|e| {
            TelemetryError::io_operation(
                "creating store directory",
                dir.display().to_string(),
                e,
            )
        })?;

        Ok(Self {
            dir,
            writers: Mutex::new(HashMap::new()),
        })
    }

    /// Database directory holding the collection files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn collection_path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{}.jsonl", collection))
    }

    /// Read back every document of a collection, oldest first
    pub fn read(&self, collection: &str) -> Result<Vec<Value>> {
        validate_collection(collection)?;
        self.flush()?;

        let path = self.collection_path(collection);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&path)?);
        let mut documents = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            documents.push(serde_json::from_str(&line)?);
        }
        Ok(documents)
    }

    fn open_collection(&self, collection: &str) -> Result<BufWriter<File>> {
        let path = self.collection_path(collection);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                TelemetryError::io_operation("opening collection", path.display().to_string(), e)
            })?;
        Ok(BufWriter::new(file))
    }
}

/// Append one line while holding an exclusive lock on the file
fn append_locked(writer: &mut BufWriter<File>, line: &[u8]) -> std::io::Result<()> {
    FileExt::lock_exclusive(writer.get_ref())?;
    let written = writer.write_all(line).and_then(|_| writer.flush());
    let unlocked = FileExt::unlock(writer.get_ref());
    written.and(unlocked)
}

fn validate_collection(collection: &str) -> Result<()> {
    let valid = !collection.is_empty()
        && collection
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(TelemetryError::store(collection, "invalid collection name"))
    }
}

impl DocumentStore for JsonlStore {
    fn insert(&self, collection: &str, document: Value) -> Result<()> {
        validate_collection(collection)?;

        let mut line = serde_json::to_vec(&document)?;
        line.push(b'\n');

        let mut writers = self.writers.lock();
        if !writers.contains_key(collection) {
            let writer = self.open_collection(collection)?;
            writers.insert(collection.to_string(), writer);
        }
        let writer = writers
            .get_mut(collection)
            .ok_or_else(|| TelemetryError::store(collection, "collection writer missing"))?;

        if let Err(e) = append_locked(writer, &line) {
            // Discard the buffered remainder so it never prefixes the next line
            if let Some(broken) = writers.remove(collection) {
                let _ = broken.into_parts();
            }
            return Err(TelemetryError::store(collection, e.to_string()));
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        for writer in self.writers.lock().values_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}
