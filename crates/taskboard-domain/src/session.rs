//! The per-screen board session.
//!
//! Owns the board's canonical snapshot and the single drag gesture allowed on
//! it. Hover feedback and `can_drag` are synchronous and touch only memory; a
//! drop spawns the commit on the tokio runtime and the session reports busy
//! until [`BoardSession::await_commit`] has absorbed its result.

use std::sync::Arc;

use serde::Serialize;
use taskboard_core::{AppConfig, Clock, TaskboardError, TaskboardResult, ValidationError};
use tokio::task::JoinHandle;

use crate::arrangement::{ArrangementScope, ArrangementService};
use crate::completion::{validate_task, CompletionPartitioner, TaskToggle};
use crate::drag::{self, CommitPlan, Conversion, DragPhase, DropOutcome};
use crate::draggable::DraggableItem;
use crate::ids::{BoardId, ItemId, SubtaskId, TaskId};
use crate::query::BoardSnapshot;
use crate::store::{TaskStore, WriteBatch};
use crate::subtask::Subtask;
use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Info,
    Error,
}

/// The inverse of the most recent completion toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum UndoAction {
    ToggleTask(TaskId),
    ToggleSubtask(SubtaskId),
}

/// A dismissible message for the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub undo: Option<UndoAction>,
}

impl Notice {
    fn info(message: String, undo: Option<UndoAction>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message,
            undo,
        }
    }

    fn error(err: &TaskboardError) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: err.to_string(),
            undo: None,
        }
    }
}

type PendingCommit = JoinHandle<TaskboardResult<BoardSnapshot>>;

pub struct BoardSession {
    store: Arc<dyn TaskStore>,
    arranger: Arc<ArrangementService>,
    partitioner: CompletionPartitioner,
    snapshot: BoardSnapshot,
    phase: DragPhase,
    pending: Option<PendingCommit>,
    last_toggle: Option<UndoAction>,
    notices: Vec<Notice>,
}

impl BoardSession {
    pub async fn load(
        store: Arc<dyn TaskStore>,
        board_id: BoardId,
        config: &AppConfig,
        clock: Arc<dyn Clock>,
    ) -> TaskboardResult<Self> {
        let snapshot = BoardSnapshot::load(store.as_ref(), board_id).await?;
        Ok(Self {
            arranger: Arc::new(ArrangementService::new(store.clone(), clock.clone())),
            partitioner: CompletionPartitioner::new(
                store.clone(),
                clock,
                config.effective_completion_spacing(),
            ),
            store,
            snapshot,
            phase: DragPhase::Idle,
            pending: None,
            last_toggle: None,
            notices: Vec::new(),
        })
    }

    pub fn board_id(&self) -> BoardId {
        self.snapshot.board.id
    }

    pub fn snapshot(&self) -> &BoardSnapshot {
        &self.snapshot
    }

    pub fn phase(&self) -> &DragPhase {
        &self.phase
    }

    /// The flattened view, including provisional placement while dragging.
    pub fn view(&self) -> Vec<DraggableItem> {
        match &self.phase {
            DragPhase::Dragging(state) => state.view(),
            _ => self.snapshot.view(),
        }
    }

    /// Refetches the board from the store.
    pub async fn refresh(&mut self) -> TaskboardResult<()> {
        self.snapshot = BoardSnapshot::load(self.store.as_ref(), self.board_id()).await?;
        Ok(())
    }

    pub fn can_drag(&self, slot: ItemId) -> bool {
        drag::can_drag(&self.phase, &self.snapshot.groups, slot)
    }

    pub fn on_start_drag(&mut self, item: ItemId) -> TaskboardResult<()> {
        match &self.phase {
            DragPhase::Idle => {}
            DragPhase::Dragging(state) => {
                return Err(TaskboardError::SessionBusy(format!(
                    "already dragging {}",
                    state.dragged_id()
                )))
            }
            DragPhase::Committing => {
                tracing::warn!("Rejected drag of {} while a commit is in flight", item);
                return Err(TaskboardError::SessionBusy(
                    "a previous drop is still being saved".to_string(),
                ));
            }
        }

        let state = drag::start(&self.snapshot.view(), self.board_id(), item)?;
        self.phase = DragPhase::Dragging(state);
        Ok(())
    }

    /// Moves the dragged item to `target` and returns the provisional view.
    pub fn on_hover(&mut self, target: usize) -> TaskboardResult<Vec<DraggableItem>> {
        let state = self
            .phase
            .dragging()
            .ok_or_else(|| TaskboardError::InvalidState("no drag in progress".to_string()))?
            .hover(target);
        let view = state.view();
        self.phase = DragPhase::Dragging(state);
        Ok(view)
    }

    pub fn cancel_drag(&mut self) {
        if let DragPhase::Dragging(state) = &self.phase {
            tracing::debug!("Drag of {} cancelled", state.dragged_id());
            self.phase = DragPhase::Idle;
        }
    }

    /// Ends the gesture. Returns whether a commit was started.
    pub fn on_drop(&mut self, from: usize, to: usize) -> TaskboardResult<bool> {
        let state = match std::mem::take(&mut self.phase) {
            DragPhase::Dragging(state) => state,
            other => {
                self.phase = other;
                return Err(TaskboardError::InvalidState(
                    "no drag in progress".to_string(),
                ));
            }
        };

        let plan = match state.drop(from, to)? {
            DropOutcome::Discarded => return Ok(false),
            DropOutcome::Commit(plan) => plan,
        };

        let stranded = self.stranded_subtasks(&plan);
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| TaskboardError::Internal(format!("no async runtime: {}", e)))?;
        let store = self.store.clone();
        let arranger = self.arranger.clone();
        self.pending = Some(runtime.spawn(commit(store, arranger, plan, stranded)));
        self.phase = DragPhase::Committing;
        Ok(true)
    }

    /// Waits for the in-flight commit, if any, and adopts its result.
    ///
    /// A failed commit leaves the previous snapshot in place and raises an
    /// error notice.
    pub async fn await_commit(&mut self) -> TaskboardResult<()> {
        let Some(handle) = self.pending.take() else {
            return Ok(());
        };
        let result = match handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => {
                Err(TaskboardError::Internal("commit was cancelled".to_string()))
            }
            Err(e) => Err(TaskboardError::Internal(format!("commit task failed: {}", e))),
        };
        self.phase = DragPhase::Idle;

        match result {
            Ok(snapshot) => {
                self.snapshot = snapshot;
                Ok(())
            }
            Err(err) => {
                tracing::warn!("Drag commit failed: {}", err);
                self.notices.push(Notice::error(&err));
                Err(err)
            }
        }
    }

    pub async fn drop_and_commit(&mut self, from: usize, to: usize) -> TaskboardResult<()> {
        if self.on_drop(from, to)? {
            self.await_commit().await?;
        }
        Ok(())
    }

    /// Runs a whole gesture: drag the item at `from` and drop it at `to`.
    pub async fn move_item(&mut self, from: usize, to: usize) -> TaskboardResult<()> {
        let item = self
            .snapshot
            .view()
            .get(from)
            .map(DraggableItem::id)
            .ok_or_else(|| TaskboardError::NotFound(format!("no item at index {}", from)))?;
        self.on_start_drag(item)?;
        self.on_hover(to)?;
        self.drop_and_commit(from, to).await
    }

    /// Aborts a pending commit. The store applies a batch entirely or not at
    /// all, so an aborted commit leaves no partial writes.
    pub fn close(&mut self) {
        if let Some(handle) = self.pending.take() {
            tracing::info!("Aborting pending commit on board {}", self.board_id());
            handle.abort();
        }
        self.phase = DragPhase::Idle;
    }

    pub async fn on_toggle_task_completed(&mut self, task_id: TaskId) -> TaskboardResult<TaskToggle> {
        let result = self.toggle_task(task_id, false).await;
        if let Ok(toggle) = &result {
            let undo = UndoAction::ToggleTask(task_id);
            self.last_toggle = Some(undo);
            let verb = if toggle.completed() { "Completed" } else { "Reopened" };
            self.notices
                .push(Notice::info(format!("{} \"{}\"", verb, toggle.task.name), Some(undo)));
        }
        self.settle(result).await
    }

    pub async fn on_toggle_subtask_completed(
        &mut self,
        subtask_id: SubtaskId,
    ) -> TaskboardResult<Subtask> {
        let result = self.toggle_subtask(subtask_id).await;
        if let Ok(subtask) = &result {
            let undo = UndoAction::ToggleSubtask(subtask_id);
            self.last_toggle = Some(undo);
            let verb = if subtask.is_completed { "Completed" } else { "Reopened" };
            self.notices
                .push(Notice::info(format!("{} \"{}\"", verb, subtask.name), Some(undo)));
        }
        self.settle(result).await
    }

    /// Reverts the most recent completion toggle, restoring a reopened task
    /// to the rank it held before.
    pub async fn undo_last_toggle(&mut self) -> TaskboardResult<()> {
        let action = self
            .last_toggle
            .take()
            .ok_or_else(|| TaskboardError::InvalidState("nothing to undo".to_string()))?;
        let result = match action {
            UndoAction::ToggleTask(id) => self.toggle_task(id, true).await.map(|_| ()),
            UndoAction::ToggleSubtask(id) => self.toggle_subtask(id).await.map(|_| ()),
        };
        self.partitioner.forget_last_slot();
        self.settle(result).await
    }

    /// Drains the pending notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Appends a task at the end of the board.
    pub async fn add_task(&mut self, task: Task) -> TaskboardResult<Task> {
        self.ensure_idle()?;
        validate_task(&task, &[])?;
        let mut task = task;
        task.board_id = self.board_id();
        task.position = (!task.is_completed).then(|| self.snapshot.active_tasks().count() as u32);

        let result = self
            .store
            .apply(WriteBatch {
                created_tasks: vec![task.clone()],
                ..WriteBatch::default()
            })
            .await
            .map(|_| task);
        self.settle(result).await
    }

    /// Appends a subtask at the end of its task's active subtasks.
    pub async fn add_subtask(&mut self, task_id: TaskId, name: String) -> TaskboardResult<Subtask> {
        self.ensure_idle()?;
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        let group = self
            .snapshot
            .task(task_id)
            .ok_or_else(|| TaskboardError::NotFound(format!("task {}", task_id)))?;
        let subtask = Subtask::new(task_id, name, group.active_subtasks().count() as u32);

        let result = self
            .store
            .apply(WriteBatch {
                created_subtasks: vec![subtask.clone()],
                ..WriteBatch::default()
            })
            .await
            .map(|_| subtask);
        self.settle(result).await
    }

    async fn toggle_task(&self, task_id: TaskId, undoing: bool) -> TaskboardResult<TaskToggle> {
        self.ensure_idle()?;
        let group = self
            .snapshot
            .task(task_id)
            .ok_or_else(|| TaskboardError::NotFound(format!("task {}", task_id)))?;
        self.partitioner
            .toggle_task_completed(&group.task, &group.subtasks, undoing)
            .await
    }

    async fn toggle_subtask(&self, subtask_id: SubtaskId) -> TaskboardResult<Subtask> {
        self.ensure_idle()?;
        let subtask = self
            .snapshot
            .subtask(subtask_id)
            .ok_or_else(|| TaskboardError::NotFound(format!("subtask {}", subtask_id)))?;
        self.partitioner.toggle_subtask_completed(subtask).await
    }

    fn ensure_idle(&self) -> TaskboardResult<()> {
        if self.phase.is_idle() {
            Ok(())
        } else {
            Err(TaskboardError::SessionBusy(
                "finish the current drag first".to_string(),
            ))
        }
    }

    /// Reloads after a successful write, or records the error as a notice.
    async fn settle<T>(&mut self, result: TaskboardResult<T>) -> TaskboardResult<T> {
        match result {
            Ok(value) => {
                self.refresh().await?;
                Ok(value)
            }
            Err(err) => {
                self.notices.push(Notice::error(&err));
                Err(err)
            }
        }
    }

    /// Completed subtasks of a task about to be nested, which must follow
    /// their siblings to the new host.
    fn stranded_subtasks(&self, plan: &CommitPlan) -> Vec<Subtask> {
        let Some(Conversion::TaskToSubtask { created, orphan }) = &plan.conversion else {
            return Vec::new();
        };
        self.snapshot
            .task(*orphan)
            .map(|group| {
                group
                    .subtasks
                    .iter()
                    .filter(|s| s.is_completed)
                    .cloned()
                    .map(|s| s.reparented(created.task_id))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Drop for BoardSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Ranks the dropped arrangement, swaps converted records and reloads the
/// board, all in one store transaction.
async fn commit(
    store: Arc<dyn TaskStore>,
    arranger: Arc<ArrangementService>,
    plan: CommitPlan,
    stranded: Vec<Subtask>,
) -> TaskboardResult<BoardSnapshot> {
    let CommitPlan {
        board_id,
        moved,
        groups,
        conversion,
    } = plan;

    let mut batch = arranger.plan(ArrangementScope::Board(board_id), groups)?;
    match conversion {
        Some(Conversion::TaskToSubtask { created, orphan }) => {
            batch.promote_created_subtask(created);
            batch.updated_subtasks.extend(stranded);
            batch.deleted_tasks.push(orphan);
        }
        Some(Conversion::SubtaskToTask { created, orphan }) => {
            batch.promote_created_task(created);
            batch.deleted_subtasks.push(orphan);
        }
        None => {}
    }

    let writes = batch.write_count();
    store.apply(batch).await?;
    tracing::info!("Committed drop of {} ({} writes)", moved, writes);

    BoardSnapshot::load(store.as_ref(), board_id).await
}
