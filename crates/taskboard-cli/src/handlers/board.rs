use serde::Serialize;
use taskboard_domain::{
    Board, BoardId, BoardSession, DraggableItem, ItemKind, Parent, TaskStore, WriteBatch,
};

use crate::context::CliContext;
use crate::output;

/// One line of `list` output.
#[derive(Serialize)]
pub struct ItemRow {
    /// Index in the flattened view; `None` for completed items.
    pub index: Option<usize>,
    pub kind: ItemKind,
    pub id: String,
    pub name: String,
    pub parent: Parent,
    pub position: Option<u32>,
    pub completed: bool,
}

impl ItemRow {
    fn from_item(index: Option<usize>, item: &DraggableItem) -> Self {
        let position = match item {
            DraggableItem::Task(task) => task.position,
            DraggableItem::Subtask(subtask) => subtask.position,
        };
        let id = match item {
            DraggableItem::Task(task) => task.id.to_string(),
            DraggableItem::Subtask(subtask) => subtask.id.to_string(),
        };
        Self {
            index,
            kind: item.kind(),
            id,
            name: item.name().to_string(),
            parent: item.parent(),
            position,
            completed: item.is_completed(),
        }
    }
}

pub async fn init(ctx: &CliContext, name: String) -> anyhow::Result<()> {
    if name.trim().is_empty() {
        output::output_error("board name must not be blank");
    }
    let board = Board::new(name);
    ctx.store
        .apply(WriteBatch {
            created_boards: vec![board.clone()],
            ..WriteBatch::default()
        })
        .await?;
    output::output_success(&board);
    Ok(())
}

pub async fn list(ctx: &CliContext, board: Option<BoardId>) -> anyhow::Result<()> {
    let session = ctx.session(board).await?;
    output::output_list(rows(&session));
    Ok(())
}

/// Active items in view order, then completed tasks and subtasks.
pub fn rows(session: &BoardSession) -> Vec<ItemRow> {
    let mut rows: Vec<ItemRow> = session
        .view()
        .iter()
        .enumerate()
        .map(|(i, item)| ItemRow::from_item(Some(i), item))
        .collect();

    for group in &session.snapshot().groups {
        if group.task.is_completed {
            rows.push(ItemRow::from_item(
                None,
                &DraggableItem::Task(group.task.clone()),
            ));
        }
        for subtask in group.subtasks.iter().filter(|s| s.is_completed) {
            rows.push(ItemRow::from_item(
                None,
                &DraggableItem::Subtask(subtask.clone()),
            ));
        }
    }
    rows
}
