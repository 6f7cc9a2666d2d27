//! Drag-to-reorder state machine.
//!
//! A gesture runs `start`, any number of `hover`s, then `drop`. All three are
//! pure: they read a [`DragState`] and return a new one (or a [`DropOutcome`])
//! without touching storage. Only the commit of a [`CommitPlan`] performs I/O.
//!
//! While dragging, the view is split into the `base` (every item except the
//! dragged block) and the block itself: the dragged item plus, for a task, the
//! active subtasks it carries. A hover target is the index the block's head
//! would occupy in the resulting view, which is also its insertion index into
//! the base.
//!
//! Where the head lands decides its provisional type:
//!
//! | slot                                | dragged task         | dragged subtask      |
//! |-------------------------------------|----------------------|----------------------|
//! | directly before a subtask of `H`    | becomes subtask of H | joins H              |
//! | after the last subtask of `H`       | stays a task         | joins H              |
//! | between tasks / at either end       | stays a task         | becomes a task       |
//! | its original index                  | restored as-is       | restored as-is       |

use std::collections::HashMap;

use serde::Serialize;
use taskboard_core::{TaskboardError, TaskboardResult};

use crate::draggable::{DraggableItem, ItemKind};
use crate::ids::{BoardId, ItemId, Parent, SubtaskId, TaskId};
use crate::subtask::Subtask;
use crate::task::{Task, TaskWithSubtasks};

/// Where a slot in the base view sits relative to subtask groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SlotContext {
    /// Between two top-level tasks, or at either end of the board.
    TopLevel,
    /// Directly before an existing subtask of `host`.
    Group { host: TaskId },
    /// After the last subtask of `host`, before the next task.
    GroupTail { host: TaskId },
}

/// Classifies insertion index `index` of `base`.
pub fn classify_slot(base: &[DraggableItem], index: usize) -> SlotContext {
    let index = index.min(base.len());
    if let Some(host) = base.get(index).and_then(DraggableItem::host) {
        return SlotContext::Group { host };
    }
    match index
        .checked_sub(1)
        .and_then(|prev| base.get(prev))
        .and_then(DraggableItem::host)
    {
        Some(host) => SlotContext::GroupTail { host },
        None => SlotContext::TopLevel,
    }
}

/// The phase of the single drag gesture a board screen may run at a time.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragPhase {
    #[default]
    Idle,
    Dragging(DragState),
    Committing,
}

impl DragPhase {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn dragging(&self) -> Option<&DragState> {
        match self {
            Self::Dragging(state) => Some(state),
            _ => None,
        }
    }
}

/// Everything a gesture in progress needs, captured at `start`.
#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    board_id: BoardId,
    origin: DraggableItem,
    carried: Vec<Subtask>,
    original_index: usize,
    original_parent: Parent,
    base: Vec<DraggableItem>,
    reserved_task_id: TaskId,
    reserved_subtask_id: SubtaskId,
    index: usize,
    item: DraggableItem,
    carried_now: Vec<Subtask>,
}

/// Type change decided at drop time.
#[derive(Debug, Clone, PartialEq)]
pub enum Conversion {
    /// A task nested under another task: `created` replaces the task `orphan`.
    TaskToSubtask { created: Subtask, orphan: TaskId },
    /// A subtask promoted to the board: `created` replaces the subtask `orphan`.
    SubtaskToTask { created: Task, orphan: SubtaskId },
}

/// The final assignment produced by a drop, ready to be ranked and persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitPlan {
    pub board_id: BoardId,
    pub moved: ItemId,
    /// Active tasks in their new order, each with its active subtasks in order.
    pub groups: Vec<TaskWithSubtasks>,
    pub conversion: Option<Conversion>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    /// Nothing changed; no writes are needed.
    Discarded,
    Commit(CommitPlan),
}

/// Begins a gesture on `item` within the flattened `view`.
pub fn start(view: &[DraggableItem], board_id: BoardId, item: ItemId) -> TaskboardResult<DragState> {
    let index = view
        .iter()
        .position(|candidate| candidate.id() == item)
        .ok_or_else(|| TaskboardError::NotFound(format!("{} is not on the board", item)))?;
    let origin = view[index].clone();
    if origin.is_completed() {
        return Err(TaskboardError::InvalidState(format!(
            "{} is completed and cannot be dragged",
            item
        )));
    }

    let carried: Vec<Subtask> = match &origin {
        DraggableItem::Task(task) => view[index + 1..]
            .iter()
            .map_while(|next| match next {
                DraggableItem::Subtask(subtask) if subtask.task_id == task.id => {
                    Some(subtask.clone())
                }
                _ => None,
            })
            .collect(),
        DraggableItem::Subtask(_) => Vec::new(),
    };

    let block_end = index + 1 + carried.len();
    let base: Vec<DraggableItem> = view[..index]
        .iter()
        .chain(view[block_end..].iter())
        .cloned()
        .collect();

    tracing::debug!(
        "Drag started on {} at {} carrying {} subtasks",
        item,
        index,
        carried.len()
    );

    Ok(DragState {
        board_id,
        original_parent: origin.parent(),
        item: origin.clone(),
        carried_now: carried.clone(),
        origin,
        carried,
        original_index: index,
        base,
        reserved_task_id: TaskId::new(),
        reserved_subtask_id: SubtaskId::new(),
        index,
    })
}

impl DragState {
    pub fn board_id(&self) -> BoardId {
        self.board_id
    }

    pub fn dragged_id(&self) -> ItemId {
        self.origin.id()
    }

    pub fn original_kind(&self) -> ItemKind {
        self.origin.kind()
    }

    pub fn original_index(&self) -> usize {
        self.original_index
    }

    pub fn original_parent(&self) -> Parent {
        self.original_parent
    }

    /// Index of the dragged item's head in the provisional view.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn provisional_kind(&self) -> ItemKind {
        self.item.kind()
    }

    pub fn provisional_parent(&self) -> Parent {
        self.item.parent()
    }

    pub fn provisional_item(&self) -> &DraggableItem {
        &self.item
    }

    /// Ids of the subtasks the dragged task carries with it.
    pub fn carried_ids(&self) -> impl Iterator<Item = SubtaskId> + '_ {
        self.carried.iter().map(|s| s.id)
    }

    /// The provisional flattened view for live feedback.
    pub fn view(&self) -> Vec<DraggableItem> {
        let mut view = Vec::with_capacity(self.base.len() + 1 + self.carried_now.len());
        view.extend_from_slice(&self.base[..self.index]);
        view.push(self.item.clone());
        view.extend(self.carried_now.iter().cloned().map(DraggableItem::Subtask));
        view.extend_from_slice(&self.base[self.index..]);
        view
    }

    /// Moves the dragged block to `target` and re-derives its provisional type.
    pub fn hover(&self, target: usize) -> DragState {
        let index = target.min(self.base.len());
        let (item, carried_now) = self.place(index);
        if item.kind() != self.item.kind() {
            tracing::debug!(
                "Hover at {} turns {} into a {:?}",
                index,
                self.origin.id(),
                item.kind()
            );
        }
        DragState {
            index,
            item,
            carried_now,
            ..self.clone()
        }
    }

    /// Ends the gesture. Equal indices, or a return to the original slot,
    /// discard it.
    pub fn drop(self, from: usize, to: usize) -> TaskboardResult<DropOutcome> {
        if from == to || to.min(self.base.len()) == self.original_index {
            tracing::debug!("Drop of {} discarded", self.origin.id());
            return Ok(DropOutcome::Discarded);
        }

        let placed = self.hover(to);
        let groups = group_view(&placed.view())?;
        let conversion = match (&placed.origin, &placed.item) {
            (DraggableItem::Task(task), DraggableItem::Subtask(created)) => {
                Some(Conversion::TaskToSubtask {
                    created: created.clone(),
                    orphan: task.id,
                })
            }
            (DraggableItem::Subtask(subtask), DraggableItem::Task(created)) => {
                Some(Conversion::SubtaskToTask {
                    created: created.clone(),
                    orphan: subtask.id,
                })
            }
            _ => None,
        };

        Ok(DropOutcome::Commit(CommitPlan {
            board_id: placed.board_id,
            moved: placed.item.id(),
            groups,
            conversion,
        }))
    }

    fn place(&self, index: usize) -> (DraggableItem, Vec<Subtask>) {
        if index == self.original_index {
            return (self.origin.clone(), self.carried.clone());
        }

        match (&self.origin, classify_slot(&self.base, index)) {
            (DraggableItem::Task(task), SlotContext::Group { host }) => {
                let subtask = Subtask::from_task(task, self.reserved_subtask_id, host);
                let carried = self
                    .carried
                    .iter()
                    .cloned()
                    .map(|s| s.reparented(host))
                    .collect();
                (DraggableItem::Subtask(subtask), carried)
            }
            (DraggableItem::Task(_), SlotContext::TopLevel | SlotContext::GroupTail { .. }) => {
                (self.origin.clone(), self.carried.clone())
            }
            (
                DraggableItem::Subtask(subtask),
                SlotContext::Group { host } | SlotContext::GroupTail { host },
            ) => (
                DraggableItem::Subtask(subtask.clone().reparented(host)),
                Vec::new(),
            ),
            (DraggableItem::Subtask(subtask), SlotContext::TopLevel) => {
                let task = Task::from_subtask(subtask, self.reserved_task_id, self.board_id);
                (DraggableItem::Task(task), Vec::new())
            }
        }
    }
}

/// Regroups a flattened view into tasks with their subtasks, in view order.
pub fn group_view(view: &[DraggableItem]) -> TaskboardResult<Vec<TaskWithSubtasks>> {
    let mut groups: Vec<TaskWithSubtasks> = Vec::new();
    let mut index_of: HashMap<TaskId, usize> = HashMap::new();
    for item in view {
        match item {
            DraggableItem::Task(task) => {
                index_of.insert(task.id, groups.len());
                groups.push(TaskWithSubtasks::new(task.clone(), Vec::new()));
            }
            DraggableItem::Subtask(subtask) => {
                let idx = index_of.get(&subtask.task_id).copied().ok_or_else(|| {
                    TaskboardError::Internal(format!(
                        "subtask {} precedes its task {}",
                        subtask.id, subtask.task_id
                    ))
                })?;
                groups[idx].subtasks.push(subtask.clone());
            }
        }
    }
    Ok(groups)
}

/// Whether `slot` may receive hover feedback.
///
/// Completed items never accept a drop, and a dragged task cannot be dropped
/// onto one of its own subtasks.
pub fn can_drag(phase: &DragPhase, board: &[TaskWithSubtasks], slot: ItemId) -> bool {
    let completed = match slot {
        ItemId::Task(id) => board.iter().find(|g| g.task.id == id).map(|g| g.task.is_completed),
        ItemId::Subtask(id) => board
            .iter()
            .flat_map(|g| g.subtasks.iter())
            .find(|s| s.id == id)
            .map(|s| s.is_completed),
    };
    match completed {
        None | Some(true) => return false,
        Some(false) => {}
    }

    match (phase.dragging(), slot) {
        (Some(state), ItemId::Subtask(id)) => !state.carried_ids().any(|carried| carried == id),
        _ => true,
    }
}
