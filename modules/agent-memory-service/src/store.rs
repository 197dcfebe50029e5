//! Whole-document persistence for the shared memory file.
//!
//! Every request loads the full document and, for writes, rewrites the full
//! file. There is no locking: two requests that interleave their load/save
//! cycles can lose each other's changes (last write wins).

use agent_memory_types::Document;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub trait MemoryStore: Send + Sync {
    /// Read the current document. Never fails: unreadable or unparseable
    /// content is logged and replaced by an empty document.
    fn load(&self) -> Document;

    /// Overwrite the stored document in full.
    fn save(&self, doc: &Document) -> Result<(), String>;
}

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MemoryStore for JsonFileStore {
    fn load(&self) -> Document {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("Memory file {} does not exist yet", self.path.display());
                return Document::default();
            }
            Err(e) => {
                log::error!("Error reading memory file {}: {}", self.path.display(), e);
                return Document::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(doc) => doc,
            Err(e) => {
                log::error!("Error parsing memory file {}: {}", self.path.display(), e);
                Document::default()
            }
        }
    }

    fn save(&self, doc: &Document) -> Result<(), String> {
        let json = serde_json::to_string_pretty(doc).map_err(|e| {
            log::error!("Error serializing memory: {}", e);
            format!("Failed to serialize memory: {}", e)
        })?;

        fs::write(&self.path, json).map_err(|e| {
            log::error!("Error writing memory file {}: {}", self.path.display(), e);
            format!("Failed to write {}: {}", self.path.display(), e)
        })
    }
}

/// Store kept entirely in memory, for tests that should not touch disk.
#[cfg(test)]
pub struct InMemoryStore {
    doc: std::sync::Mutex<Document>,
    fail_saves: bool,
}

#[cfg(test)]
impl InMemoryStore {
    pub fn new(doc: Document) -> Self {
        Self {
            doc: std::sync::Mutex::new(doc),
            fail_saves: false,
        }
    }

    /// A store whose saves always fail, leaving the seeded document as is.
    pub fn failing(doc: Document) -> Self {
        Self {
            doc: std::sync::Mutex::new(doc),
            fail_saves: true,
        }
    }
}

#[cfg(test)]
impl MemoryStore for InMemoryStore {
    fn load(&self) -> Document {
        self.doc.lock().unwrap().clone()
    }

    fn save(&self, doc: &Document) -> Result<(), String> {
        if self.fail_saves {
            return Err("disk full".to_string());
        }
        *self.doc.lock().unwrap() = doc.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_memory_types::{Note, Task};

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("agent_memory.json"));
        assert_eq!(store.load(), Document::default());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent_memory.json");
        fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert_eq!(store.load(), Document::default());
        // the corrupt content is left alone until the next save
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("agent_memory.json"));

        let mut doc = Document::default();
        doc.push_task(Task::new("buy milk", "2024-05-01T10:00:00.000Z"));
        doc.push_note(Note::new("call mom", "2024-05-01T11:00:00.000Z"));
        store.save(&doc).unwrap();

        assert_eq!(store.load(), doc);
        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.starts_with("{\n  \"tasks\": ["));
    }

    #[test]
    fn test_resave_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent_memory.json");
        fs::write(
            &path,
            r#"{"notes":[{"note":"n","time":"2024-01-01T09:00:00.123456"}],"apps":{"b":1,"a":2},"tasks":[{"task":"t","done":true,"added":"2024-01-01T08:00:00"}]}"#,
        )
        .unwrap();
        let store = JsonFileStore::new(&path);

        store.save(&store.load()).unwrap();
        let first = fs::read(&path).unwrap();
        store.save(&store.load()).unwrap();
        let second = fs::read(&path).unwrap();

        assert_eq!(first, second);
        assert!(String::from_utf8(first).unwrap().contains("\"apps\""));
    }

    #[test]
    fn test_loosely_typed_records_are_not_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent_memory.json");
        fs::write(
            &path,
            r#"{
  "tasks": [
    {"task": "keep me", "done": null, "added": "2024-01-01T08:00:00", "by": "agent"},
    {"task": "b", "done": "yes", "added": 1714557600}
  ],
  "notes": [{"note": "n", "time": null}],
  "apps": {"notepad": "notepad.exe"}
}"#,
        )
        .unwrap();
        let store = JsonFileStore::new(&path);

        let mut doc = store.load();
        assert_eq!(doc.tasks.len(), 2);
        assert!(!doc.tasks[0].done);
        assert!(doc.tasks[1].done);
        assert_eq!(doc.notes.len(), 1);

        doc.push_task(Task::new("new", "2024-05-01T10:00:00.000Z"));
        store.save(&doc).unwrap();

        let on_disk: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk["tasks"].as_array().unwrap().len(), 3);
        assert_eq!(on_disk["tasks"][0]["task"], "keep me");
        assert_eq!(on_disk["tasks"][0]["by"], "agent");
        assert_eq!(on_disk["notes"][0]["note"], "n");
        assert_eq!(on_disk["apps"]["notepad"], "notepad.exe");
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("missing").join("agent_memory.json"));
        assert!(store.save(&Document::default()).is_err());
    }
}
