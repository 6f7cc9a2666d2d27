use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{SubtaskId, TaskId};
use crate::task::Task;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: SubtaskId,
    pub task_id: TaskId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Rank among the active subtasks of `task_id`; `None` once completed.
    #[serde(default)]
    pub position: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subtask {
    pub fn new(task_id: TaskId, name: String, position: u32) -> Self {
        let now = Utc::now();
        Self {
            id: SubtaskId::new(),
            task_id,
            name,
            description: None,
            is_completed: false,
            completed_at: None,
            position: Some(position),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Builds the subtask that replaces a task nested under `host`.
    pub fn from_task(task: &Task, id: SubtaskId, host: TaskId) -> Self {
        Self {
            id,
            task_id: host,
            name: task.name.clone(),
            description: task.description.clone(),
            is_completed: false,
            completed_at: None,
            position: task.position,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.is_completed
    }

    pub fn reparented(mut self, task_id: TaskId) -> Self {
        self.task_id = task_id;
        self
    }

    pub fn complete(&mut self, at: DateTime<Utc>) {
        self.is_completed = true;
        self.completed_at = Some(at);
        self.position = None;
        self.updated_at = at;
    }

    pub fn reopen(&mut self, at: DateTime<Utc>) {
        self.is_completed = false;
        self.completed_at = None;
        self.updated_at = at;
    }
}
