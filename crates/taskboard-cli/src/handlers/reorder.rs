use taskboard_domain::{agenda_tasks, ArrangementScope, BoardId};

use crate::cli::AgendaScope;
use crate::context::CliContext;
use crate::handlers::board::rows;
use crate::output;

pub async fn move_item(
    ctx: &CliContext,
    board: Option<BoardId>,
    from: usize,
    to: usize,
) -> anyhow::Result<()> {
    let mut session = ctx.session(board).await?;
    let len = session.view().len();
    if from >= len {
        output::output_error(&format!("No item at index {} (board has {})", from, len));
    }
    session.move_item(from, to).await?;
    output::output_list(rows(&session));
    Ok(())
}

pub async fn agenda(ctx: &CliContext, scope: AgendaScope) -> anyhow::Result<()> {
    let scope = match scope {
        AgendaScope::Today => ArrangementScope::Today,
        AgendaScope::Tomorrow => ArrangementScope::Tomorrow,
        AgendaScope::Urgent => ArrangementScope::Urgent,
    };
    let tasks = agenda_tasks(ctx.store.as_ref(), ctx.clock.as_ref(), scope).await?;
    output::output_list(tasks);
    Ok(())
}
