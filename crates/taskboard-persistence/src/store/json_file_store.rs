use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use taskboard_core::{TaskboardError, TaskboardResult};
use taskboard_domain::{
    Board, BoardId, Priority, StoreEvent, Subtask, Task, TaskId, TaskStore, WriteBatch,
};
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

use crate::dataset::Dataset;
use crate::metadata::{PersistenceMetadata, FORMAT_VERSION};
use crate::store::atomic_writer::AtomicWriter;
use crate::store::memory_store::EVENT_CAPACITY;

/// On-disk file layout.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonEnvelope {
    pub version: u32,
    pub metadata: PersistenceMetadata,
    pub data: Dataset,
}

/// Store backed by a single JSON file.
///
/// The whole dataset is held in memory. Each `apply` writes the new dataset
/// to disk first and only then replaces the in-memory copy, so a failed write
/// changes nothing. The write and the swap run on their own task, so
/// cancelling the caller cannot leave the file ahead of memory.
pub struct JsonFileStore {
    path: PathBuf,
    instance_id: Uuid,
    data: Arc<Mutex<Dataset>>,
    events: broadcast::Sender<StoreEvent>,
}

impl JsonFileStore {
    /// Opens the file at `path`, starting empty if it does not exist.
    pub async fn open(path: impl AsRef<Path>) -> TaskboardResult<Self> {
        let path = path.as_ref().to_path_buf();
        let data = match AtomicWriter::read_if_exists(&path).await? {
            Some(bytes) => {
                let envelope: JsonEnvelope = serde_json::from_slice(&bytes)
                    .map_err(|e| TaskboardError::Serialization(e.to_string()))?;
                if envelope.version != FORMAT_VERSION {
                    return Err(TaskboardError::Serialization(format!(
                        "Unsupported format version: {}",
                        envelope.version
                    )));
                }
                let (boards, tasks, subtasks) = envelope.data.counts();
                tracing::info!(
                    "Loaded {} boards, {} tasks, {} subtasks from {}",
                    boards,
                    tasks,
                    subtasks,
                    path.display()
                );
                envelope.data
            }
            None => {
                tracing::info!("No data at {}, starting empty", path.display());
                Dataset::default()
            }
        };

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            path,
            instance_id: Uuid::new_v4(),
            data: Arc::new(Mutex::new(data)),
            events,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

}

async fn save(path: &Path, instance_id: Uuid, data: &Dataset) -> TaskboardResult<()> {
    let envelope = JsonEnvelope {
        version: FORMAT_VERSION,
        metadata: PersistenceMetadata::new(instance_id),
        data: data.clone(),
    };
    let json_bytes = serde_json::to_vec_pretty(&envelope)
        .map_err(|e| TaskboardError::Serialization(e.to_string()))?;

    AtomicWriter::write_atomic(path, &json_bytes)
        .await
        .map_err(|e| TaskboardError::Persistence(format!("{}: {}", path.display(), e)))?;

    tracing::info!("Saved {} bytes to {}", json_bytes.len(), path.display());
    Ok(())
}

#[async_trait]
impl TaskStore for JsonFileStore {
    async fn task(&self, id: TaskId) -> TaskboardResult<Option<Task>> {
        Ok(self.data.lock().await.task(id))
    }

    async fn tasks_by_board(&self, board_id: BoardId) -> TaskboardResult<Vec<Task>> {
        Ok(self.data.lock().await.tasks_by_board(board_id))
    }

    async fn tasks_by_date(&self, date: NaiveDate) -> TaskboardResult<Vec<Task>> {
        Ok(self.data.lock().await.tasks_by_date(date))
    }

    async fn tasks_by_priority(&self, priority: Priority) -> TaskboardResult<Vec<Task>> {
        Ok(self.data.lock().await.tasks_by_priority(priority))
    }

    async fn subtasks_of(&self, task_id: TaskId) -> TaskboardResult<Vec<Subtask>> {
        Ok(self.data.lock().await.subtasks_of(task_id))
    }

    async fn active_boards(&self) -> TaskboardResult<Vec<Board>> {
        Ok(self.data.lock().await.active_boards())
    }

    async fn apply(&self, batch: WriteBatch) -> TaskboardResult<()> {
        let mut data = self.data.clone().lock_owned().await;
        let (next, boards) = data.applied(batch)?;

        let path = self.path.clone();
        let instance_id = self.instance_id;
        let events = self.events.clone();
        // Runs to completion even if this future is dropped.
        let write = tokio::spawn(async move {
            save(&path, instance_id, &next).await?;
            *data = next;
            drop(data);
            let _ = events.send(StoreEvent::Changed { boards });
            Ok::<(), TaskboardError>(())
        });

        write
            .await
            .map_err(|e| TaskboardError::Internal(format!("write task failed: {}", e)))?
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("tasks.json");
        let board = Board::new("Home".to_string());
        let task = Task::new(board.id, "Laundry".to_string(), 0);

        let store = JsonFileStore::open(&file_path).await.unwrap();
        store
            .apply(WriteBatch {
                created_boards: vec![board.clone()],
                created_tasks: vec![task.clone()],
                ..WriteBatch::default()
            })
            .await
            .unwrap();
        assert!(file_path.exists());

        let reopened = JsonFileStore::open(&file_path).await.unwrap();
        assert_eq!(reopened.task(task.id).await.unwrap(), Some(task));
        assert_eq!(reopened.active_boards().await.unwrap(), vec![board]);
    }

    #[tokio::test]
    async fn test_envelope_layout() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("tasks.json");
        let store = JsonFileStore::open(&file_path).await.unwrap();
        store
            .apply(WriteBatch {
                created_boards: vec![Board::new("Home".to_string())],
                ..WriteBatch::default()
            })
            .await
            .unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&file_path).unwrap()).unwrap();

        assert_eq!(raw["version"], FORMAT_VERSION);
        assert_eq!(
            raw["metadata"]["instance_id"],
            store.instance_id().to_string()
        );
        assert_eq!(raw["data"]["boards"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_batch_does_not_touch_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("tasks.json");
        let store = JsonFileStore::open(&file_path).await.unwrap();

        let result = store
            .apply(WriteBatch {
                deleted_tasks: vec![TaskId::new()],
                ..WriteBatch::default()
            })
            .await;

        assert!(matches!(result, Err(TaskboardError::NotFound(_))));
        assert!(!file_path.exists());
    }

    #[tokio::test]
    async fn test_aborted_apply_still_swaps_memory() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("tasks.json");
        let store = Arc::new(JsonFileStore::open(&file_path).await.unwrap());
        let board = Board::new("Home".to_string());
        store
            .apply(WriteBatch {
                created_boards: vec![board.clone()],
                ..WriteBatch::default()
            })
            .await
            .unwrap();

        let task = Task::new(board.id, "Laundry".to_string(), 0);
        let writer = {
            let store = store.clone();
            let batch = WriteBatch {
                created_tasks: vec![task.clone()],
                ..WriteBatch::default()
            };
            tokio::spawn(async move { store.apply(batch).await })
        };
        tokio::task::yield_now().await;
        writer.abort();

        let in_memory = store.task(task.id).await.unwrap();
        let reopened = JsonFileStore::open(&file_path).await.unwrap();
        assert_eq!(in_memory, reopened.task(task.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_version_is_rejected() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("tasks.json");
        std::fs::write(
            &file_path,
            r#"{"version": 99, "metadata": {"format_version": 99, "instance_id": "00000000-0000-0000-0000-000000000000", "saved_at": "2024-01-01T00:00:00Z"}, "data": {}}"#,
        )
        .unwrap();

        let result = JsonFileStore::open(&file_path).await;

        assert!(matches!(result, Err(TaskboardError::Serialization(_))));
    }
}
