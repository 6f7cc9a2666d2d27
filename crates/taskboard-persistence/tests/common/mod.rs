#![allow(dead_code)]

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use taskboard_core::{AppConfig, Clock, FixedClock};
use taskboard_domain::ledger::{is_packed, sort_by_rank};
use taskboard_domain::*;
use taskboard_persistence::MemoryStore;

pub fn clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap(),
    ))
}

/// Builds one board from `(task, [subtasks])` pairs, in rank order.
pub fn board_batch(name: &str, layout: &[(&str, &[&str])]) -> (Board, WriteBatch) {
    let board = Board::new(name.to_string());
    let mut batch = WriteBatch {
        created_boards: vec![board.clone()],
        ..WriteBatch::default()
    };
    for (i, (task_name, subtasks)) in layout.iter().enumerate() {
        let task = Task::new(board.id, task_name.to_string(), i as u32);
        for (j, subtask_name) in subtasks.iter().enumerate() {
            batch
                .created_subtasks
                .push(Subtask::new(task.id, subtask_name.to_string(), j as u32));
        }
        batch.created_tasks.push(task);
    }
    (board, batch)
}

pub async fn seed(layout: &[(&str, &[&str])]) -> (Arc<MemoryStore>, Board) {
    let store = Arc::new(MemoryStore::new());
    let (board, batch) = board_batch("Home", layout);
    store.apply(batch).await.unwrap();
    (store, board)
}

pub async fn open_session(store: Arc<dyn TaskStore>, board_id: BoardId) -> BoardSession {
    BoardSession::load(store, board_id, &AppConfig::default(), clock())
        .await
        .unwrap()
}

pub async fn task_named(store: &dyn TaskStore, board_id: BoardId, name: &str) -> Task {
    store
        .tasks_by_board(board_id)
        .await
        .unwrap()
        .into_iter()
        .find(|t| t.name == name)
        .unwrap_or_else(|| panic!("no task named {}", name))
}

/// Active tasks of a board as `(name, position)`, by rank.
pub async fn active_tasks(store: &dyn TaskStore, board_id: BoardId) -> Vec<(String, u32)> {
    let mut tasks: Vec<Task> = store
        .tasks_by_board(board_id)
        .await
        .unwrap()
        .into_iter()
        .filter(|t| !t.is_completed)
        .collect();
    sort_by_rank(&mut tasks);
    assert!(is_packed(&tasks), "board ranks are not contiguous");
    tasks
        .into_iter()
        .map(|t| (t.name, t.position.unwrap()))
        .collect()
}

/// Active subtasks of a task as `(name, position)`, by rank.
pub async fn active_subtasks(store: &dyn TaskStore, task_id: TaskId) -> Vec<(String, u32)> {
    let mut subtasks: Vec<Subtask> = store
        .subtasks_of(task_id)
        .await
        .unwrap()
        .into_iter()
        .filter(|s| !s.is_completed)
        .collect();
    sort_by_rank(&mut subtasks);
    assert!(is_packed(&subtasks), "subtask ranks are not contiguous");
    subtasks
        .into_iter()
        .map(|s| (s.name, s.position.unwrap()))
        .collect()
}

pub fn ranked(pairs: &[(&str, u32)]) -> Vec<(String, u32)> {
    pairs.iter().map(|(n, p)| (n.to_string(), *p)).collect()
}

pub fn view_names(view: &[DraggableItem]) -> Vec<String> {
    view.iter()
        .map(|item| match item {
            DraggableItem::Task(t) => t.name.clone(),
            DraggableItem::Subtask(s) => format!("  {}", s.name),
        })
        .collect()
}

pub fn item_named(session: &BoardSession, name: &str) -> ItemId {
    session
        .view()
        .iter()
        .find(|item| item.name() == name)
        .map(DraggableItem::id)
        .unwrap_or_else(|| panic!("no item named {}", name))
}
