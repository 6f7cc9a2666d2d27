//! Completion toggles.
//!
//! Moves tasks and subtasks between the active partition, where they hold a
//! rank, and the completed partition, where they are ordered by completion
//! time. Completing a task completes its active subtasks with strictly
//! increasing timestamps so a batch completed in one instant keeps its order.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use taskboard_core::{Clock, TaskboardError, TaskboardResult, ValidationError};

use crate::ids::TaskId;
use crate::ledger::{display_order, repack, sort_by_rank};
use crate::store::{TaskStore, WriteBatch};
use crate::subtask::Subtask;
use crate::task::Task;

/// The board rank a task held before it was last completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RememberedSlot {
    task_id: TaskId,
    position: u32,
}

/// Result of a task toggle, as persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskToggle {
    pub task: Task,
    pub subtasks: Vec<Subtask>,
    /// Board rank before the toggle, if the task was active.
    pub previous_position: Option<u32>,
}

impl TaskToggle {
    pub fn completed(&self) -> bool {
        self.task.is_completed
    }
}

pub struct CompletionPartitioner {
    store: Arc<dyn TaskStore>,
    clock: Arc<dyn Clock>,
    spacing: Duration,
    last_slot: Mutex<Option<RememberedSlot>>,
}

impl CompletionPartitioner {
    pub fn new(store: Arc<dyn TaskStore>, clock: Arc<dyn Clock>, spacing: Duration) -> Self {
        Self {
            store,
            clock,
            spacing,
            last_slot: Mutex::new(None),
        }
    }

    /// Flips a task between the active and completed partitions.
    ///
    /// With `undoing_toggle`, a task being reopened returns to the rank it
    /// held before its most recent completion instead of the end of the board.
    pub async fn toggle_task_completed(
        &self,
        task: &Task,
        subtasks: &[Subtask],
        undoing_toggle: bool,
    ) -> TaskboardResult<TaskToggle> {
        validate_task(task, subtasks)?;

        let mut stored = self
            .store
            .task(task.id)
            .await?
            .ok_or_else(|| TaskboardError::NotFound(format!("task {}", task.id)))?;

        let mut others: Vec<Task> = self
            .store
            .tasks_by_board(stored.board_id)
            .await?
            .into_iter()
            .filter(|t| t.id != stored.id && !t.is_completed)
            .collect();
        sort_by_rank(&mut others);

        let now = self.clock.now();
        let previous_position = stored.position;
        let (updated_tasks, updated_subtasks) = if stored.is_completed {
            let slot = self.last_slot.lock().take();
            let index = match slot {
                Some(slot) if undoing_toggle && slot.task_id == stored.id => {
                    (slot.position as usize).min(others.len())
                }
                other => {
                    // Keep a memory that belongs to another task.
                    *self.last_slot.lock() = other;
                    others.len()
                }
            };
            stored.reopen(now);
            others.insert(index, stored.clone());
            let reopened = reopen_subtasks(subtasks, now);
            tracing::debug!("Reopening task {} at rank {}", stored.id, index);
            (repack(others), reopened)
        } else {
            if let Some(position) = stored.position {
                *self.last_slot.lock() = Some(RememberedSlot {
                    task_id: stored.id,
                    position,
                });
            }
            stored.complete(now);
            let completed = complete_subtasks(subtasks, now, self.spacing);
            let mut updated = repack(others);
            updated.push(stored.clone());
            tracing::debug!(
                "Completing task {} with {} subtasks",
                stored.id,
                completed.len()
            );
            (updated, completed)
        };

        let task_after = updated_tasks
            .iter()
            .find(|t| t.id == stored.id)
            .cloned()
            .unwrap_or(stored);

        self.store
            .apply(WriteBatch {
                updated_tasks,
                updated_subtasks: updated_subtasks.clone(),
                ..WriteBatch::default()
            })
            .await?;

        tracing::info!(
            "Task {} is now {}",
            task_after.id,
            if task_after.is_completed { "completed" } else { "active" }
        );

        Ok(TaskToggle {
            task: task_after,
            subtasks: updated_subtasks,
            previous_position,
        })
    }

    /// Flips a subtask between the active and completed partitions of its task.
    pub async fn toggle_subtask_completed(&self, subtask: &Subtask) -> TaskboardResult<Subtask> {
        if subtask.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }

        let siblings = self.store.subtasks_of(subtask.task_id).await?;
        let mut stored = siblings
            .iter()
            .find(|s| s.id == subtask.id)
            .cloned()
            .ok_or_else(|| TaskboardError::NotFound(format!("subtask {}", subtask.id)))?;

        let mut active: Vec<Subtask> = siblings
            .into_iter()
            .filter(|s| s.id != stored.id && !s.is_completed)
            .collect();
        sort_by_rank(&mut active);

        let now = self.clock.now();
        let updated = if stored.is_completed {
            stored.reopen(now);
            active.push(stored.clone());
            repack(active)
        } else {
            stored.complete(now);
            let mut updated = repack(active);
            updated.push(stored.clone());
            updated
        };

        let subtask_after = updated
            .iter()
            .find(|s| s.id == stored.id)
            .cloned()
            .unwrap_or(stored);

        self.store
            .apply(WriteBatch {
                updated_subtasks: updated,
                ..WriteBatch::default()
            })
            .await?;

        tracing::info!(
            "Subtask {} is now {}",
            subtask_after.id,
            if subtask_after.is_completed { "completed" } else { "active" }
        );
        Ok(subtask_after)
    }

    /// Forgets the remembered rank, e.g. once the undo offer has lapsed.
    pub fn forget_last_slot(&self) {
        self.last_slot.lock().take();
    }
}

pub(crate) fn validate_task(task: &Task, subtasks: &[Subtask]) -> Result<(), ValidationError> {
    if task.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if task.due_time.is_some() && task.due_date.is_none() {
        return Err(ValidationError::InvalidState(
            "a time of day requires a date".to_string(),
        ));
    }
    if subtasks.iter().any(|s| s.task_id != task.id) {
        return Err(ValidationError::MixedOrigin);
    }
    Ok(())
}

/// Completes the active subtasks in rank order, `spacing` apart.
fn complete_subtasks(subtasks: &[Subtask], now: DateTime<Utc>, spacing: Duration) -> Vec<Subtask> {
    let mut active: Vec<Subtask> = subtasks
        .iter()
        .filter(|s| !s.is_completed)
        .cloned()
        .collect();
    sort_by_rank(&mut active);
    active
        .into_iter()
        .enumerate()
        .map(|(i, mut subtask)| {
            subtask.complete(now + spacing * i as i32);
            subtask
        })
        .collect()
}

/// Reopens every subtask, keeping their previous relative order.
fn reopen_subtasks(subtasks: &[Subtask], now: DateTime<Utc>) -> Vec<Subtask> {
    let ordered = display_order(subtasks.to_vec());
    let reopened = ordered
        .into_iter()
        .map(|mut subtask| {
            subtask.reopen(now);
            subtask
        })
        .collect();
    repack(reopened)
}
