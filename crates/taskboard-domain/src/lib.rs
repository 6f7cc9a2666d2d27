pub mod arrangement;
pub mod board;
pub mod completion;
pub mod drag;
pub mod draggable;
pub mod ids;
pub mod ledger;
pub mod query;
pub mod session;
pub mod store;
pub mod subtask;
pub mod task;

pub use arrangement::{ArrangementScope, ArrangementService};
pub use board::Board;
pub use completion::{CompletionPartitioner, TaskToggle};
pub use drag::{
    can_drag, classify_slot, CommitPlan, Conversion, DragPhase, DragState, DropOutcome,
    SlotContext,
};
pub use draggable::{flatten, DraggableItem, ItemKind};
pub use ids::{BoardId, ItemId, Parent, SubtaskId, TaskId};
pub use query::{agenda_tasks, BoardSnapshot};
pub use session::{BoardSession, Notice, NoticeKind, UndoAction};
pub use store::{StoreEvent, TaskStore, WriteBatch};
pub use subtask::Subtask;
pub use task::{Priority, Task, TaskWithSubtasks};
