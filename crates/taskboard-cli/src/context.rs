use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail};
use taskboard_core::{AppConfig, Clock, SystemClock};
use taskboard_domain::{BoardId, BoardSession, TaskStore};
use taskboard_persistence::JsonFileStore;

pub struct CliContext {
    pub store: Arc<JsonFileStore>,
    pub config: AppConfig,
    pub clock: Arc<dyn Clock>,
}

impl CliContext {
    /// Opens the data file named on the command line, falling back to the
    /// one in the config file.
    pub async fn load(file: Option<String>) -> anyhow::Result<Self> {
        let config = AppConfig::load();
        let path: PathBuf = file
            .map(PathBuf::from)
            .or_else(|| config.data_file.clone())
            .ok_or_else(|| anyhow!("--file is required for CLI operations"))?;

        let store = JsonFileStore::open(&path).await?;
        Ok(Self {
            store: Arc::new(store),
            config,
            clock: Arc::new(SystemClock),
        })
    }

    /// The given board, or the only active board when none is given.
    pub async fn resolve_board(&self, board: Option<BoardId>) -> anyhow::Result<BoardId> {
        if let Some(board_id) = board {
            return Ok(board_id);
        }
        let boards = self.store.active_boards().await?;
        match boards.as_slice() {
            [only] => Ok(only.id),
            [] => bail!("no boards yet, create one with `init --board NAME`"),
            _ => bail!("{} boards exist, pick one with --board", boards.len()),
        }
    }

    pub async fn session(&self, board: Option<BoardId>) -> anyhow::Result<BoardSession> {
        let board_id = self.resolve_board(board).await?;
        let session = BoardSession::load(
            self.store.clone(),
            board_id,
            &self.config,
            self.clock.clone(),
        )
        .await?;
        Ok(session)
    }
}
