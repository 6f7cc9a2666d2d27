//! Read models assembled from a [`TaskStore`].

use std::collections::HashSet;

use serde::Serialize;
use taskboard_core::{Clock, TaskboardError, TaskboardResult};

use crate::arrangement::ArrangementScope;
use crate::board::Board;
use crate::draggable::{flatten, DraggableItem};
use crate::ids::{BoardId, SubtaskId, TaskId};
use crate::ledger::{display_order, sort_by_rank};
use crate::store::TaskStore;
use crate::subtask::Subtask;
use crate::task::{Task, TaskWithSubtasks};

/// Canonical state of one board: every task with every subtask.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardSnapshot {
    pub board: Board,
    /// Active tasks by rank, then completed tasks by completion time.
    pub groups: Vec<TaskWithSubtasks>,
}

impl BoardSnapshot {
    pub async fn load(store: &dyn TaskStore, board_id: BoardId) -> TaskboardResult<Self> {
        let board = store
            .active_boards()
            .await?
            .into_iter()
            .find(|b| b.id == board_id)
            .ok_or_else(|| TaskboardError::NotFound(format!("board {}", board_id)))?;

        let (mut active, mut completed): (Vec<Task>, Vec<Task>) = store
            .tasks_by_board(board_id)
            .await?
            .into_iter()
            .partition(Task::is_active);
        sort_by_rank(&mut active);
        completed.sort_by_key(|t| t.completed_at);

        let mut groups = Vec::with_capacity(active.len() + completed.len());
        for task in active.into_iter().chain(completed) {
            let subtasks = display_order(store.subtasks_of(task.id).await?);
            groups.push(TaskWithSubtasks::new(task, subtasks));
        }

        tracing::debug!("Loaded board {} with {} tasks", board_id, groups.len());
        Ok(Self { board, groups })
    }

    pub fn view(&self) -> Vec<DraggableItem> {
        flatten(&self.groups)
    }

    pub fn task(&self, id: TaskId) -> Option<&TaskWithSubtasks> {
        self.groups.iter().find(|g| g.task.id == id)
    }

    pub fn subtask(&self, id: SubtaskId) -> Option<&Subtask> {
        self.groups
            .iter()
            .flat_map(|g| g.subtasks.iter())
            .find(|s| s.id == id)
    }

    pub fn active_tasks(&self) -> impl Iterator<Item = &Task> {
        self.groups.iter().map(|g| &g.task).filter(|t| t.is_active())
    }
}

/// Active tasks of an agenda scope, ordered by agenda rank then board rank.
///
/// Tasks of archived or deleted boards are dropped. The board scope yields
/// the board's active tasks by rank.
pub async fn agenda_tasks(
    store: &dyn TaskStore,
    clock: &dyn Clock,
    scope: ArrangementScope,
) -> TaskboardResult<Vec<Task>> {
    let mut tasks = match scope {
        ArrangementScope::Board(board_id) => {
            let mut tasks: Vec<Task> = store
                .tasks_by_board(board_id)
                .await?
                .into_iter()
                .filter(Task::is_active)
                .collect();
            sort_by_rank(&mut tasks);
            return Ok(tasks);
        }
        ArrangementScope::Today => store.tasks_by_date(clock.today()).await?,
        ArrangementScope::Tomorrow => store.tasks_by_date(clock.tomorrow()).await?,
        ArrangementScope::Urgent => {
            store
                .tasks_by_priority(crate::task::Priority::HIGHEST)
                .await?
        }
    };

    let live: HashSet<BoardId> = store
        .active_boards()
        .await?
        .into_iter()
        .map(|b| b.id)
        .collect();
    let before = tasks.len();
    tasks.retain(|t| t.is_active() && live.contains(&t.board_id));
    if tasks.len() != before {
        tracing::debug!(
            "Dropped {} completed or stale tasks from the {} agenda",
            before - tasks.len(),
            scope.label()
        );
    }

    tasks.sort_by_key(|t| {
        (
            t.agenda_position.is_none(),
            t.agenda_position,
            t.due_time.is_none(),
            t.due_time,
            t.position,
        )
    });
    Ok(tasks)
}
