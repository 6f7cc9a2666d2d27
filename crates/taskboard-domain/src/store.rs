use async_trait::async_trait;
use chrono::NaiveDate;
use taskboard_core::TaskboardResult;
use tokio::sync::broadcast;

use crate::board::Board;
use crate::ids::{BoardId, SubtaskId, TaskId};
use crate::subtask::Subtask;
use crate::task::{Priority, Task};

/// A set of writes applied as one unit.
///
/// Stores apply creates first, then updates, then deletes. An update or delete
/// that names a missing record fails the whole batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    pub created_boards: Vec<Board>,
    pub created_tasks: Vec<Task>,
    pub updated_tasks: Vec<Task>,
    pub deleted_tasks: Vec<TaskId>,
    pub created_subtasks: Vec<Subtask>,
    pub updated_subtasks: Vec<Subtask>,
    pub deleted_subtasks: Vec<SubtaskId>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.created_boards.is_empty()
            && self.created_tasks.is_empty()
            && self.updated_tasks.is_empty()
            && self.deleted_tasks.is_empty()
            && self.created_subtasks.is_empty()
            && self.updated_subtasks.is_empty()
            && self.deleted_subtasks.is_empty()
    }

    /// Moves a task that has not been stored yet from the updates to the creates.
    pub fn promote_created_task(&mut self, fallback: Task) {
        let task = match self.updated_tasks.iter().position(|t| t.id == fallback.id) {
            Some(idx) => self.updated_tasks.remove(idx),
            None => fallback,
        };
        self.created_tasks.push(task);
    }

    /// Moves a subtask that has not been stored yet from the updates to the creates.
    pub fn promote_created_subtask(&mut self, fallback: Subtask) {
        let subtask = match self
            .updated_subtasks
            .iter()
            .position(|s| s.id == fallback.id)
        {
            Some(idx) => self.updated_subtasks.remove(idx),
            None => fallback,
        };
        self.created_subtasks.push(subtask);
    }

    pub fn write_count(&self) -> usize {
        self.created_boards.len()
            + self.created_tasks.len()
            + self.updated_tasks.len()
            + self.deleted_tasks.len()
            + self.created_subtasks.len()
            + self.updated_subtasks.len()
            + self.deleted_subtasks.len()
    }
}

/// Emitted after every successful [`TaskStore::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Changed { boards: Vec<BoardId> },
}

/// Storage for boards, tasks and subtasks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn task(&self, id: TaskId) -> TaskboardResult<Option<Task>>;

    async fn tasks_by_board(&self, board_id: BoardId) -> TaskboardResult<Vec<Task>>;

    async fn tasks_by_date(&self, date: NaiveDate) -> TaskboardResult<Vec<Task>>;

    async fn tasks_by_priority(&self, priority: Priority) -> TaskboardResult<Vec<Task>>;

    async fn subtasks_of(&self, task_id: TaskId) -> TaskboardResult<Vec<Subtask>>;

    async fn active_boards(&self) -> TaskboardResult<Vec<Board>>;

    /// Applies every write in the batch or none of them.
    async fn apply(&self, batch: WriteBatch) -> TaskboardResult<()>;

    /// Live change notifications for the stored collections.
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}
