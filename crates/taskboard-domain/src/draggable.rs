//! The flattened, UI-facing board view.
//!
//! Each active task is followed immediately by its active subtasks. Completed
//! items never appear in the view.

use serde::{Deserialize, Serialize};

use crate::ids::{ItemId, Parent, TaskId};
use crate::ledger::sort_by_rank;
use crate::subtask::Subtask;
use crate::task::{Task, TaskWithSubtasks};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Task,
    Subtask,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DraggableItem {
    Task(Task),
    Subtask(Subtask),
}

impl DraggableItem {
    pub fn id(&self) -> ItemId {
        match self {
            Self::Task(task) => ItemId::Task(task.id),
            Self::Subtask(subtask) => ItemId::Subtask(subtask.id),
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Task(_) => ItemKind::Task,
            Self::Subtask(_) => ItemKind::Subtask,
        }
    }

    pub fn parent(&self) -> Parent {
        match self {
            Self::Task(task) => Parent::Board(task.board_id),
            Self::Subtask(subtask) => Parent::Task(subtask.task_id),
        }
    }

    pub fn host(&self) -> Option<TaskId> {
        match self {
            Self::Task(_) => None,
            Self::Subtask(subtask) => Some(subtask.task_id),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Task(task) => &task.name,
            Self::Subtask(subtask) => &subtask.name,
        }
    }

    pub fn is_completed(&self) -> bool {
        match self {
            Self::Task(task) => task.is_completed,
            Self::Subtask(subtask) => subtask.is_completed,
        }
    }
}

/// Builds the flattened view from a board's tasks, active items only.
pub fn flatten(groups: &[TaskWithSubtasks]) -> Vec<DraggableItem> {
    let mut tasks: Vec<&TaskWithSubtasks> = groups.iter().filter(|g| g.task.is_active()).collect();
    tasks.sort_by_key(|g| (g.task.position.is_none(), g.task.position));

    let mut view = Vec::new();
    for group in tasks {
        view.push(DraggableItem::Task(group.task.clone()));
        let mut subtasks: Vec<Subtask> = group.active_subtasks().cloned().collect();
        sort_by_rank(&mut subtasks);
        view.extend(subtasks.into_iter().map(DraggableItem::Subtask));
    }
    view
}
