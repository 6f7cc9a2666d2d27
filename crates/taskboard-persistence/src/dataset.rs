use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use taskboard_core::{TaskboardError, TaskboardResult};
use taskboard_domain::{Board, BoardId, Priority, Subtask, Task, TaskId, WriteBatch};

/// Every stored record. Both stores keep one of these and swap it whole on
/// each successful write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub boards: Vec<Board>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

impl Dataset {
    pub fn task(&self, id: TaskId) -> Option<Task> {
        self.tasks.iter().find(|t| t.id == id).cloned()
    }

    pub fn tasks_by_board(&self, board_id: BoardId) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|t| t.board_id == board_id)
            .cloned()
            .collect()
    }

    pub fn tasks_by_date(&self, date: NaiveDate) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|t| t.due_date == Some(date))
            .cloned()
            .collect()
    }

    pub fn tasks_by_priority(&self, priority: Priority) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|t| t.priority == priority)
            .cloned()
            .collect()
    }

    pub fn subtasks_of(&self, task_id: TaskId) -> Vec<Subtask> {
        self.subtasks
            .iter()
            .filter(|s| s.task_id == task_id)
            .cloned()
            .collect()
    }

    pub fn active_boards(&self) -> Vec<Board> {
        self.boards.iter().filter(|b| b.is_active()).cloned().collect()
    }

    /// Returns the dataset with `batch` applied, leaving `self` untouched.
    ///
    /// Creates go first, then updates, then deletes. Deleting a task removes
    /// its remaining subtasks. The second value lists the boards whose
    /// records changed.
    pub fn applied(&self, batch: WriteBatch) -> TaskboardResult<(Dataset, Vec<BoardId>)> {
        let mut next = self.clone();
        let mut touched = BTreeSet::new();

        for board in batch.created_boards {
            if next.boards.iter().any(|b| b.id == board.id) {
                return Err(duplicate("board", board.id));
            }
            touched.insert(board.id);
            next.boards.push(board);
        }
        for task in batch.created_tasks {
            if next.tasks.iter().any(|t| t.id == task.id) {
                return Err(duplicate("task", task.id));
            }
            next.require_board(task.board_id)?;
            touched.insert(task.board_id);
            next.tasks.push(task);
        }
        for subtask in batch.created_subtasks {
            if next.subtasks.iter().any(|s| s.id == subtask.id) {
                return Err(duplicate("subtask", subtask.id));
            }
            touched.insert(next.board_of(subtask.task_id)?);
            next.subtasks.push(subtask);
        }

        for task in batch.updated_tasks {
            next.require_board(task.board_id)?;
            let slot = next
                .tasks
                .iter_mut()
                .find(|t| t.id == task.id)
                .ok_or_else(|| missing("task", task.id))?;
            touched.insert(slot.board_id);
            touched.insert(task.board_id);
            *slot = task;
        }
        for subtask in batch.updated_subtasks {
            touched.insert(next.board_of(subtask.task_id)?);
            let slot = next
                .subtasks
                .iter_mut()
                .find(|s| s.id == subtask.id)
                .ok_or_else(|| missing("subtask", subtask.id))?;
            *slot = subtask;
        }

        for id in batch.deleted_subtasks {
            let idx = next
                .subtasks
                .iter()
                .position(|s| s.id == id)
                .ok_or_else(|| missing("subtask", id))?;
            let removed = next.subtasks.remove(idx);
            if let Ok(board_id) = next.board_of(removed.task_id) {
                touched.insert(board_id);
            }
        }
        for id in batch.deleted_tasks {
            let idx = next
                .tasks
                .iter()
                .position(|t| t.id == id)
                .ok_or_else(|| missing("task", id))?;
            let removed = next.tasks.remove(idx);
            next.subtasks.retain(|s| s.task_id != removed.id);
            touched.insert(removed.board_id);
        }

        Ok((next, touched.into_iter().collect()))
    }

    fn require_board(&self, board_id: BoardId) -> TaskboardResult<()> {
        if self.boards.iter().any(|b| b.id == board_id) {
            Ok(())
        } else {
            Err(missing("board", board_id))
        }
    }

    fn board_of(&self, task_id: TaskId) -> TaskboardResult<BoardId> {
        self.tasks
            .iter()
            .find(|t| t.id == task_id)
            .map(|t| t.board_id)
            .ok_or_else(|| missing("task", task_id))
    }

    /// Number of records of each kind, for logging.
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.boards.len(), self.tasks.len(), self.subtasks.len())
    }
}

fn missing(kind: &str, id: impl std::fmt::Display) -> TaskboardError {
    TaskboardError::NotFound(format!("{} {}", kind, id))
}

fn duplicate(kind: &str, id: impl std::fmt::Display) -> TaskboardError {
    TaskboardError::Persistence(format!("{} {} already exists", kind, id))
}
