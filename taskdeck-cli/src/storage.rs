//! JSON file storage adapter for TaskCollection
//!
//! Handles persistence of tasks to a single JSON document. The previous
//! version of the file is kept as `<file>.bak` on every save.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use taskdeck_core::task::following_id;
use taskdeck_core::{CoreError, Result, TaskBackend, TaskCollection};
use tracing::{debug, warn};

/// JSON storage adapter
pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    /// Create a new storage adapter for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the storage path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".bak");
        PathBuf::from(name)
    }

    /// Create a backup of the tasks file
    pub fn backup(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }

        let backup_path = self.backup_path();
        fs::copy(&self.path, &backup_path).map_err(|e| {
            CoreError::storage_with_source(
                format!("Failed to back up {}", self.path.display()),
                e,
            )
        })?;
        debug!(path = %backup_path.display(), "backup written");
        Ok(())
    }

    /// Load tasks from the backup file
    pub fn recover(&self) -> Result<TaskCollection> {
        let backup_path = self.backup_path();

        if !backup_path.exists() {
            return Err(CoreError::storage("Backup file not found"));
        }

        read_collection(&backup_path)
    }

    /// Check if backup exists
    pub fn backup_exists(&self) -> bool {
        self.backup_path().exists()
    }
}

impl TaskBackend for JsonStorage {
    fn load(&self) -> Result<TaskCollection> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no task file yet, starting empty");
            return Ok(TaskCollection::new());
        }

        read_collection(&self.path)
    }

    fn save(&self, collection: &TaskCollection) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                CoreError::storage_with_source(
                    format!("Failed to create {}", parent.display()),
                    e,
                )
            })?;
        }

        self.backup()?;

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| {
                CoreError::storage_with_source(
                    format!("Failed to open {}", self.path.display()),
                    e,
                )
            })?;

        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, collection)
            .map_err(|e| CoreError::storage_with_source("Failed to encode tasks", e))?;
        writer
            .flush()
            .map_err(|e| CoreError::storage_with_source("Failed to write tasks", e))?;

        debug!(path = %self.path.display(), count = collection.len(), "tasks saved");
        Ok(())
    }
}

fn read_collection(path: &Path) -> Result<TaskCollection> {
    let file = File::open(path).map_err(|e| {
        CoreError::storage_with_source(format!("Failed to open {}", path.display()), e)
    })?;

    let mut collection: TaskCollection =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            warn!(path = %path.display(), error = %e, "task file is not valid JSON");
            CoreError::storage_with_source(format!("Failed to parse {}", path.display()), e)
        })?;

    // A hand-edited next_id must not hand out a used id
    let floor = match collection.tasks.keys().max() {
        Some(&max_id) => following_id(max_id)?,
        None => 1,
    };
    collection.next_id = collection.next_id.max(floor);

    Ok(collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use taskdeck_core::{Priority, TaskDraft};
    use tempfile::tempdir;

    fn sample() -> TaskCollection {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap();
        let mut collection = TaskCollection::new();
        collection
            .create(
                &TaskDraft::new("Write report", "Q1 numbers")
                    .with_category("Work")
                    .with_priority(Priority::High)
                    .with_due_date("2026-03-20"),
                now,
            )
            .unwrap();
        collection.create(&TaskDraft::new("Gym", ""), now).unwrap();
        collection.toggle(2, now).unwrap();
        collection
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path().join("tasks.json"));

        let collection = storage.load().unwrap();
        assert!(collection.is_empty());
        assert_eq!(collection.next_id, 1);
    }

    #[test]
    fn test_save_then_load_preserves_tasks() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path().join("nested").join("tasks.json"));
        let original = sample();

        storage.save(&original).unwrap();
        let loaded = storage.load().unwrap();

        assert_eq!(loaded.tasks, original.tasks);
        assert_eq!(loaded.next_id, original.next_id);
    }

    #[test]
    fn test_backup_and_recover() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path().join("tasks.json"));
        let mut collection = sample();

        storage.save(&collection).unwrap();
        assert!(!storage.backup_exists());

        collection.remove_completed();
        storage.save(&collection).unwrap();
        assert!(storage.backup_exists());

        let recovered = storage.recover().unwrap();
        assert_eq!(recovered.len(), 2);
        assert_eq!(storage.load().unwrap().len(), 1);
    }

    #[test]
    fn test_recover_without_backup_fails() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path().join("tasks.json"));

        assert!(matches!(storage.recover(), Err(CoreError::Storage { .. })));
    }

    #[test]
    fn test_corrupt_file_is_storage_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, "{ not json").unwrap();

        let storage = JsonStorage::new(path);
        assert!(matches!(storage.load(), Err(CoreError::Storage { .. })));
    }

    #[test]
    fn test_next_id_repaired_on_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let mut collection = sample();
        collection.next_id = 1;
        fs::write(&path, serde_json::to_string(&collection).unwrap()).unwrap();

        let loaded = JsonStorage::new(path).load().unwrap();
        assert_eq!(loaded.next_id, 3);
    }

    #[test]
    fn test_max_id_in_file_is_storage_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let mut collection = sample();
        let task = collection.remove(1).unwrap().with_id(u32::MAX);
        collection.tasks.insert(u32::MAX, task);
        fs::write(&path, serde_json::to_string(&collection).unwrap()).unwrap();

        let storage = JsonStorage::new(path);
        assert!(matches!(storage.load(), Err(CoreError::Storage { .. })));
    }
}
