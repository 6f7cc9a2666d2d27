mod cli;
mod context;
mod handlers;
mod output;

use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use context::CliContext;
use tracing_subscriber::EnvFilter;

fn init_logging() -> anyhow::Result<()> {
    if let Ok(log_path) = std::env::var("TASKBOARD_DEBUG_LOG") {
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        tracing_subscriber::fmt()
            .with_writer(log_file)
            .with_max_level(tracing::Level::DEBUG)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;

    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "taskboard", &mut std::io::stdout());
        return Ok(());
    }

    let ctx = match CliContext::load(cli.file).await {
        Ok(ctx) => ctx,
        Err(e) => output::output_error(&e.to_string()),
    };

    let result = match cli.command {
        Commands::Init { board } => handlers::board::init(&ctx, board).await,
        Commands::List { board } => handlers::board::list(&ctx, board).await,
        Commands::Task { action } => handlers::task::handle_task(&ctx, action).await,
        Commands::Subtask { action } => handlers::task::handle_subtask(&ctx, action).await,
        Commands::ToggleTask { id } => handlers::task::toggle_task(&ctx, id).await,
        Commands::ToggleSubtask { id } => handlers::task::toggle_subtask(&ctx, id).await,
        Commands::Move { from, to, board } => {
            handlers::reorder::move_item(&ctx, board, from, to).await
        }
        Commands::Agenda { scope } => handlers::reorder::agenda(&ctx, scope).await,
        Commands::Completions { .. } => Ok(()),
    };

    if let Err(e) = result {
        tracing::warn!("Command failed: {:#}", e);
        output::output_error(&e.to_string());
    }
    Ok(())
}
