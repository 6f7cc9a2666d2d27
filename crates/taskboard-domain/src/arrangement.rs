//! Arrangement of tasks within a scope.
//!
//! A scope is the key an ordered batch must share: one board, the tasks due
//! today or tomorrow, or the tasks at the highest priority. The board scope
//! ranks every supplied task into `position`; the agenda scopes rank active
//! tasks into `agenda_position` so a cross-board agenda never disturbs the
//! per-board rank space.

use std::sync::Arc;

use chrono::NaiveDate;
use taskboard_core::{Clock, TaskboardError, TaskboardResult, ValidationError};

use crate::ids::BoardId;
use crate::ledger::{repack, repack_by_parent, AgendaSlot};
use crate::store::{TaskStore, WriteBatch};
use crate::task::{Priority, Task, TaskWithSubtasks};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrangementScope {
    Board(BoardId),
    Today,
    Tomorrow,
    Urgent,
}

impl ArrangementScope {
    fn admits(&self, task: &Task, today: NaiveDate, tomorrow: NaiveDate) -> bool {
        match self {
            Self::Board(board_id) => task.board_id == *board_id,
            Self::Today => task.due_date == Some(today),
            Self::Tomorrow => task.due_date == Some(tomorrow),
            Self::Urgent => task.priority == Priority::HIGHEST,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Board(_) => "board",
            Self::Today => "today",
            Self::Tomorrow => "tomorrow",
            Self::Urgent => "urgent",
        }
    }
}

pub struct ArrangementService {
    store: Arc<dyn TaskStore>,
    clock: Arc<dyn Clock>,
}

impl ArrangementService {
    pub fn new(store: Arc<dyn TaskStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Validates the batch and computes the rank writes without persisting them.
    pub fn plan(
        &self,
        scope: ArrangementScope,
        items: Vec<TaskWithSubtasks>,
    ) -> TaskboardResult<WriteBatch> {
        let today = self.clock.today();
        let tomorrow = self.clock.tomorrow();

        if let Some(outsider) = items
            .iter()
            .find(|item| !scope.admits(&item.task, today, tomorrow))
        {
            tracing::warn!(
                "Rejected {} arrangement: task {} is out of scope",
                scope.label(),
                outsider.task.id
            );
            return Err(TaskboardError::InvalidState(format!(
                "task {} does not belong to the {} scope",
                outsider.task.id,
                scope.label()
            )));
        }

        if items
            .iter()
            .any(|item| item.subtasks.iter().any(|s| s.task_id != item.task.id))
        {
            return Err(ValidationError::MixedOrigin.into());
        }

        let mut tasks = Vec::with_capacity(items.len());
        let mut subtasks = Vec::new();
        for item in items {
            tasks.push(item.task);
            subtasks.extend(item.subtasks);
        }

        let updated_tasks = match scope {
            ArrangementScope::Board(_) => repack(tasks),
            ArrangementScope::Today | ArrangementScope::Tomorrow | ArrangementScope::Urgent => {
                let slots: Vec<AgendaSlot> = tasks
                    .into_iter()
                    .filter(|t| !t.is_completed)
                    .map(AgendaSlot)
                    .collect();
                repack(slots)
                    .into_iter()
                    .map(|slot| slot.0)
                    .collect()
            }
        };
        let updated_subtasks = repack_by_parent(subtasks);

        tracing::debug!(
            "Planned {} arrangement: {} tasks, {} subtasks",
            scope.label(),
            updated_tasks.len(),
            updated_subtasks.len()
        );

        Ok(WriteBatch {
            updated_tasks,
            updated_subtasks,
            ..WriteBatch::default()
        })
    }

    /// Ranks the batch in the given order and persists it.
    pub async fn invoke(
        &self,
        scope: ArrangementScope,
        items: Vec<TaskWithSubtasks>,
    ) -> TaskboardResult<()> {
        let batch = self.plan(scope, items)?;
        if batch.is_empty() {
            return Ok(());
        }
        let writes = batch.write_count();
        self.store.apply(batch).await?;
        tracing::info!("Arranged {} scope ({} writes)", scope.label(), writes);
        Ok(())
    }
}
