use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use voxscribe_core::FileRecord;

/// Record store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("File record not found: {0}")]
    NotFound(Uuid),

    #[error("Failed to read record: {0}")]
    ReadFailed(String),

    #[error("Failed to write record: {0}")]
    WriteFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Flat-file key-value store for `FileRecord`, keyed by `file_id`.
///
/// Writes go through a temp file and an atomic rename so a crash mid-write
/// never leaves a truncated record behind. `update` holds a per-key lock
/// across its read-modify-write so concurrent updates to the same record
/// cannot race each other; different records never contend.
pub struct FileStore {
    data_dir: PathBuf,
    locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl FileStore {
    pub async fn new(data_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).await.map_err(|e| {
            StoreError::WriteFailed(format!(
                "Failed to create data directory {}: {}",
                data_dir.display(),
                e
            ))
        })?;
        Ok(FileStore {
            data_dir,
            locks: Mutex::new(HashMap::new()),
        })
    }

    fn record_path(&self, file_id: Uuid) -> PathBuf {
        self.data_dir.join(format!("{}.json", file_id))
    }

    fn key_lock(&self, file_id: Uuid) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().expect("lock map poisoned");
        locks.entry(file_id).or_default().clone()
    }

    async fn write_record(&self, path: &Path, record: &FileRecord) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| StoreError::WriteFailed(format!("Failed to serialize record: {}", e)))?;

        // Write to a sibling temp file, then rename into place: readers either
        // see the old record or the new one, never a partial write.
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, &json).await.map_err(|e| {
            StoreError::WriteFailed(format!("Failed to write {}: {}", tmp_path.display(), e))
        })?;
        fs::rename(&tmp_path, path).await.map_err(|e| {
            StoreError::WriteFailed(format!(
                "Failed to rename {} to {}: {}",
                tmp_path.display(),
                path.display(),
                e
            ))
        })?;

        Ok(())
    }

    async fn read_record(&self, path: &Path, file_id: Uuid) -> StoreResult<FileRecord> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(file_id));
            }
            Err(e) => {
                return Err(StoreError::ReadFailed(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            StoreError::ReadFailed(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Persist a newly created record.
    pub async fn create(&self, record: &FileRecord) -> StoreResult<()> {
        let path = self.record_path(record.file_id);
        self.write_record(&path, record).await?;

        tracing::info!(
            file_id = %record.file_id,
            original_name = %record.original_name,
            "File record created"
        );
        Ok(())
    }

    pub async fn get(&self, file_id: Uuid) -> StoreResult<FileRecord> {
        let path = self.record_path(file_id);
        self.read_record(&path, file_id).await
    }

    /// Read-modify-write under the per-key lock. The mutator sees the current
    /// record; `updated_at` is bumped after it runs.
    pub async fn update<F>(&self, file_id: Uuid, mutator: F) -> StoreResult<FileRecord>
    where
        F: FnOnce(&mut FileRecord),
    {
        let lock = self.key_lock(file_id);
        let _guard = lock.lock().await;

        let path = self.record_path(file_id);
        let mut record = self.read_record(&path, file_id).await?;
        mutator(&mut record);
        record.updated_at = chrono::Utc::now();
        self.write_record(&path, &record).await?;

        tracing::debug!(file_id = %file_id, status = %record.status, "File record updated");
        Ok(record)
    }

    /// List records sorted by `created_at` descending (newest first), with
    /// `file_id` as a tiebreaker so the order is deterministic. Unreadable
    /// entries are skipped with a warning rather than failing the listing.
    pub async fn list(&self, page: usize, per_page: usize) -> StoreResult<(Vec<FileRecord>, usize)> {
        let mut entries = match fs::read_dir(&self.data_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((Vec::new(), 0)),
            Err(e) => return Err(StoreError::Io(e)),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(file_id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| Uuid::parse_str(s).ok())
            else {
                continue;
            };
            match self.read_record(&path, file_id).await {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable record");
                }
            }
        }

        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.file_id.cmp(&b.file_id))
        });

        let total = records.len();
        let page = page.max(1);
        let start = (page - 1).saturating_mul(per_page);
        let page_items = records.into_iter().skip(start).take(per_page).collect();
        Ok((page_items, total))
    }

    /// Delete the metadata record. Fails with `NotFound` if absent; the
    /// caller is responsible for the companion binary file.
    pub async fn delete(&self, file_id: Uuid) -> StoreResult<()> {
        let lock = self.key_lock(file_id);
        let _guard = lock.lock().await;

        let path = self.record_path(file_id);
        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(file_id));
            }
            Err(e) => return Err(StoreError::Io(e)),
        }

        drop(_guard);
        self.locks.lock().expect("lock map poisoned").remove(&file_id);

        tracing::info!(file_id = %file_id, "File record deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;
    use voxscribe_core::{FileStatus, Transcription};

    fn sample_record(name: &str) -> FileRecord {
        FileRecord::new(
            Uuid::new_v4(),
            name.to_string(),
            1024,
            "audio/mpeg".to_string(),
            PathBuf::from(format!("uploads/{}", name)),
        )
    }

    #[tokio::test]
    async fn test_create_and_get_round_trip() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path()).await.unwrap();

        let record = sample_record("a.mp3");
        store.create(&record).await.unwrap();

        let loaded = store.get(record.file_id).await.unwrap();
        assert_eq!(record, loaded);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path()).await.unwrap();

        let result = store.get(Uuid::new_v4()).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_applies_mutator_and_bumps_updated_at() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path()).await.unwrap();

        let record = sample_record("b.mp3");
        store.create(&record).await.unwrap();

        let updated = store
            .update(record.file_id, |r| r.mark_processing())
            .await
            .unwrap();
        assert_eq!(updated.status, FileStatus::Processing);
        assert!(updated.updated_at >= record.updated_at);

        let reloaded = store.get(record.file_id).await.unwrap();
        assert_eq!(reloaded.status, FileStatus::Processing);
    }

    #[tokio::test]
    async fn test_concurrent_updates_to_same_key_are_serialized() {
        let dir = tempdir().unwrap();
        let store = Arc::new(FileStore::new(dir.path()).await.unwrap());

        let record = sample_record("c.mp3");
        store.create(&record).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            let file_id = record.file_id;
            handles.push(tokio::spawn(async move {
                store
                    .update(file_id, |r| {
                        // Each writer appends one character; all 16 must survive.
                        r.original_name.push('x');
                    })
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let final_record = store.get(record.file_id).await.unwrap();
        assert_eq!(final_record.original_name, format!("c.mp3{}", "x".repeat(16)));
    }

    #[tokio::test]
    async fn test_list_sorted_newest_first_with_pagination() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path()).await.unwrap();

        let mut ids = Vec::new();
        for i in 0..5 {
            let mut record = sample_record(&format!("{}.mp3", i));
            record.created_at = chrono::Utc::now() + chrono::Duration::seconds(i);
            record.updated_at = record.created_at;
            store.create(&record).await.unwrap();
            ids.push(record.file_id);
        }

        let (first_page, total) = store.list(1, 2).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(first_page.len(), 2);
        assert_eq!(first_page[0].file_id, ids[4]);
        assert_eq!(first_page[1].file_id, ids[3]);

        let (last_page, _) = store.list(3, 2).await.unwrap();
        assert_eq!(last_page.len(), 1);
        assert_eq!(last_page[0].file_id, ids[0]);

        let (beyond, _) = store.list(4, 2).await.unwrap();
        assert!(beyond.is_empty());
    }

    #[tokio::test]
    async fn test_list_skips_unreadable_entries() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path()).await.unwrap();

        let record = sample_record("ok.mp3");
        store.create(&record).await.unwrap();
        tokio::fs::write(dir.path().join(format!("{}.json", Uuid::new_v4())), b"not json")
            .await
            .unwrap();

        let (records, total) = store.list(1, 10).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(records[0].file_id, record.file_id);
    }

    #[tokio::test]
    async fn test_delete_removes_record() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path()).await.unwrap();

        let record = sample_record("d.mp3");
        store.create(&record).await.unwrap();
        store.delete(record.file_id).await.unwrap();

        assert!(matches!(
            store.get(record.file_id).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.delete(record.file_id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_completed_record_round_trips_with_transcription() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path()).await.unwrap();

        let mut record = sample_record("e.mp3");
        record.complete(Transcription::plain("转录文本"));
        store.create(&record).await.unwrap();

        let loaded = store.get(record.file_id).await.unwrap();
        assert_eq!(record, loaded);
        assert_eq!(loaded.transcription.unwrap().text, "转录文本");
    }
}
