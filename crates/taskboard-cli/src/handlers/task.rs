use taskboard_domain::{SubtaskId, Task, TaskId, TaskStore};

use crate::cli::{SubtaskAction, TaskAction};
use crate::context::CliContext;
use crate::output;

pub async fn handle_task(ctx: &CliContext, action: TaskAction) -> anyhow::Result<()> {
    match action {
        TaskAction::Add {
            name,
            board,
            description,
            priority,
            due,
            time,
        } => {
            let mut session = ctx.session(board).await?;
            let task = Task::new(session.board_id(), name, 0)
                .with_description(description)
                .with_priority(priority.map(Into::into).unwrap_or_default())
                .with_due(due, time);
            let task = session.add_task(task).await?;
            output::output_success(&task);
        }
    }
    Ok(())
}

pub async fn handle_subtask(ctx: &CliContext, action: SubtaskAction) -> anyhow::Result<()> {
    match action {
        SubtaskAction::Add { task, name } => {
            let board_id = board_of(ctx, task).await?;
            let mut session = ctx.session(Some(board_id)).await?;
            let subtask = session.add_subtask(task, name).await?;
            output::output_success(&subtask);
        }
    }
    Ok(())
}

pub async fn toggle_task(ctx: &CliContext, id: TaskId) -> anyhow::Result<()> {
    let board_id = board_of(ctx, id).await?;
    let mut session = ctx.session(Some(board_id)).await?;
    let toggle = session.on_toggle_task_completed(id).await?;
    output::output_success(serde_json::json!({
        "task": toggle.task,
        "subtasks": toggle.subtasks,
        "previous_position": toggle.previous_position,
    }));
    Ok(())
}

pub async fn toggle_subtask(ctx: &CliContext, id: SubtaskId) -> anyhow::Result<()> {
    // Subtasks are looked up through their board.
    for board in ctx.store.active_boards().await? {
        let mut session = ctx.session(Some(board.id)).await?;
        if session.snapshot().subtask(id).is_some() {
            let subtask = session.on_toggle_subtask_completed(id).await?;
            output::output_success(&subtask);
            return Ok(());
        }
    }
    output::output_error(&format!("Subtask not found: {}", id));
}

async fn board_of(ctx: &CliContext, task_id: TaskId) -> anyhow::Result<taskboard_domain::BoardId> {
    match ctx.store.task(task_id).await? {
        Some(task) => Ok(task.board_id),
        None => output::output_error(&format!("Task not found: {}", task_id)),
    }
}
