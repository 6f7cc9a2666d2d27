use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{BoardId, TaskId};
use crate::subtask::Subtask;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const HIGHEST: Priority = Priority::Urgent;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub board_id: BoardId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_time: Option<NaiveTime>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Rank among the board's active tasks; `None` once completed.
    #[serde(default)]
    pub position: Option<u32>,
    /// Rank inside the cross-board agenda views (today, tomorrow, urgent).
    #[serde(default)]
    pub agenda_position: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(board_id: BoardId, name: String, position: u32) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::new(),
            board_id,
            name,
            description: None,
            priority: Priority::default(),
            due_date: None,
            due_time: None,
            is_completed: false,
            completed_at: None,
            position: Some(position),
            agenda_position: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_due(mut self, date: Option<NaiveDate>, time: Option<NaiveTime>) -> Self {
        self.due_date = date;
        self.due_time = time;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Builds the standalone task that replaces a promoted subtask.
    pub fn from_subtask(subtask: &Subtask, id: TaskId, board_id: BoardId) -> Self {
        Self {
            id,
            board_id,
            name: subtask.name.clone(),
            description: subtask.description.clone(),
            priority: Priority::default(),
            due_date: None,
            due_time: None,
            is_completed: false,
            completed_at: None,
            position: subtask.position,
            agenda_position: None,
            created_at: subtask.created_at,
            updated_at: subtask.updated_at,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.is_completed
    }

    pub fn complete(&mut self, at: DateTime<Utc>) {
        self.is_completed = true;
        self.completed_at = Some(at);
        self.position = None;
        self.agenda_position = None;
        self.updated_at = at;
    }

    pub fn reopen(&mut self, at: DateTime<Utc>) {
        self.is_completed = false;
        self.completed_at = None;
        self.updated_at = at;
    }
}

/// A task together with the subtasks it owns, in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskWithSubtasks {
    pub task: Task,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

impl TaskWithSubtasks {
    pub fn new(task: Task, subtasks: Vec<Subtask>) -> Self {
        Self { task, subtasks }
    }

    pub fn active_subtasks(&self) -> impl Iterator<Item = &Subtask> {
        self.subtasks.iter().filter(|s| s.is_active())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::High < Priority::Urgent);
        assert_eq!(Priority::HIGHEST, Priority::Urgent);
    }

    #[test]
    fn test_complete_clears_ranks() {
        let mut task = Task::new(BoardId::new(), "Write report".to_string(), 3);
        task.agenda_position = Some(1);
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();

        task.complete(at);

        assert!(task.is_completed);
        assert_eq!(task.completed_at, Some(at));
        assert_eq!(task.position, None);
        assert_eq!(task.agenda_position, None);
    }

    #[test]
    fn test_reopen_clears_timestamp() {
        let mut task = Task::new(BoardId::new(), "Write report".to_string(), 0);
        task.complete(Utc::now());
        task.reopen(Utc::now());

        assert!(task.is_active());
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn test_from_subtask_keeps_content() {
        let board_id = BoardId::new();
        let parent = Task::new(board_id, "Parent".to_string(), 0);
        let subtask = Subtask::new(parent.id, "Child".to_string(), 1)
            .with_description(Some("details".to_string()));
        let id = TaskId::new();

        let task = Task::from_subtask(&subtask, id, board_id);

        assert_eq!(task.id, id);
        assert_eq!(task.board_id, board_id);
        assert_eq!(task.name, "Child");
        assert_eq!(task.description.as_deref(), Some("details"));
        assert_eq!(task.created_at, subtask.created_at);
    }
}
