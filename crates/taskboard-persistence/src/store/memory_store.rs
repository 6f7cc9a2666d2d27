use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use taskboard_core::TaskboardResult;
use taskboard_domain::{
    Board, BoardId, Priority, StoreEvent, Subtask, Task, TaskId, TaskStore, WriteBatch,
};
use tokio::sync::broadcast;

use crate::dataset::Dataset;

pub(crate) const EVENT_CAPACITY: usize = 64;

/// In-process store. Nothing is written to disk.
pub struct MemoryStore {
    data: RwLock<Dataset>,
    events: broadcast::Sender<StoreEvent>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_dataset(Dataset::default())
    }

    pub fn with_dataset(dataset: Dataset) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            data: RwLock::new(dataset),
            events,
        }
    }

    /// Copy of every stored record.
    pub fn dataset(&self) -> Dataset {
        self.data.read().clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn task(&self, id: TaskId) -> TaskboardResult<Option<Task>> {
        Ok(self.data.read().task(id))
    }

    async fn tasks_by_board(&self, board_id: BoardId) -> TaskboardResult<Vec<Task>> {
        Ok(self.data.read().tasks_by_board(board_id))
    }

    async fn tasks_by_date(&self, date: NaiveDate) -> TaskboardResult<Vec<Task>> {
        Ok(self.data.read().tasks_by_date(date))
    }

    async fn tasks_by_priority(&self, priority: Priority) -> TaskboardResult<Vec<Task>> {
        Ok(self.data.read().tasks_by_priority(priority))
    }

    async fn subtasks_of(&self, task_id: TaskId) -> TaskboardResult<Vec<Subtask>> {
        Ok(self.data.read().subtasks_of(task_id))
    }

    async fn active_boards(&self) -> TaskboardResult<Vec<Board>> {
        Ok(self.data.read().active_boards())
    }

    async fn apply(&self, batch: WriteBatch) -> TaskboardResult<()> {
        let boards = {
            let mut data = self.data.write();
            let (next, boards) = data.applied(batch)?;
            *data = next;
            boards
        };
        // No receivers is fine.
        let _ = self.events.send(StoreEvent::Changed { boards });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}
