mod common;

use std::sync::Arc;

use common::*;
use taskboard_core::TaskboardError;
use taskboard_domain::*;
use taskboard_persistence::JsonFileStore;
use tempfile::tempdir;

#[tokio::test]
async fn test_subtask_dropped_between_tasks_becomes_task() {
    let (store, board) = seed(&[("T", &["S1", "S2"]), ("U", &[]), ("V", &[])]).await;
    let mut session = open_session(store.clone(), board.id).await;
    let t = task_named(store.as_ref(), board.id, "T").await;
    let s2 = item_named(&session, "S2");

    session.on_start_drag(s2).unwrap();
    // Without S2 the view reads T, S1, U, V; slot 3 lies between U and V.
    let preview = session.on_hover(3).unwrap();
    assert_eq!(view_names(&preview), vec!["T", "  S1", "U", "S2", "V"]);
    session.drop_and_commit(2, 3).await.unwrap();

    assert_eq!(
        active_tasks(store.as_ref(), board.id).await,
        ranked(&[("T", 0), ("U", 1), ("S2", 2), ("V", 3)])
    );
    assert_eq!(
        active_subtasks(store.as_ref(), t.id).await,
        ranked(&[("S1", 0)])
    );
    let promoted = task_named(store.as_ref(), board.id, "S2").await;
    assert_ne!(ItemId::Task(promoted.id), s2);
    assert_eq!(view_names(&session.view()), vec!["T", "  S1", "U", "S2", "V"]);
}

#[tokio::test]
async fn test_task_dropped_into_group_becomes_subtask() {
    let (store, board) = seed(&[("Y", &["S1", "S2"]), ("X", &[])]).await;
    let mut session = open_session(store.clone(), board.id).await;
    let x = task_named(store.as_ref(), board.id, "X").await;
    let y = task_named(store.as_ref(), board.id, "Y").await;

    session.on_start_drag(ItemId::Task(x.id)).unwrap();
    session.on_hover(2).unwrap();
    session.drop_and_commit(3, 2).await.unwrap();

    assert_eq!(
        active_subtasks(store.as_ref(), y.id).await,
        ranked(&[("S1", 0), ("X", 1), ("S2", 2)])
    );
    assert_eq!(store.task(x.id).await.unwrap(), None);
    assert_eq!(
        active_tasks(store.as_ref(), board.id).await,
        ranked(&[("Y", 0)])
    );
}

#[tokio::test]
async fn test_round_trip_gesture_writes_nothing() {
    let (store, board) = seed(&[("T", &["S1", "S2"]), ("U", &[]), ("V", &[])]).await;
    let before = store.dataset();
    let mut events = store.subscribe();
    let mut session = open_session(store.clone(), board.id).await;
    let s2 = item_named(&session, "S2");

    session.on_start_drag(s2).unwrap();
    session.on_hover(4).unwrap();
    session.on_hover(0).unwrap();
    let preview = session.on_hover(2).unwrap();
    assert_eq!(preview, session.snapshot().view());
    assert!(!session.on_drop(2, 2).unwrap());

    assert_eq!(store.dataset(), before);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_subtask_reparented_into_other_group() {
    let (store, board) = seed(&[("T", &["S1", "S2"]), ("U", &["R1"])]).await;
    let mut session = open_session(store.clone(), board.id).await;
    let t = task_named(store.as_ref(), board.id, "T").await;
    let u = task_named(store.as_ref(), board.id, "U").await;
    let s1 = item_named(&session, "S1");

    session.on_start_drag(s1).unwrap();
    session.on_hover(4).unwrap();
    session.drop_and_commit(1, 4).await.unwrap();

    assert_eq!(
        active_subtasks(store.as_ref(), t.id).await,
        ranked(&[("S2", 0)])
    );
    assert_eq!(
        active_subtasks(store.as_ref(), u.id).await,
        ranked(&[("R1", 0), ("S1", 1)])
    );
    let moved = store.subtasks_of(u.id).await.unwrap();
    assert!(moved.iter().any(|s| ItemId::Subtask(s.id) == s1));
}

#[tokio::test]
async fn test_last_subtask_moved_away_is_promoted() {
    let (store, board) = seed(&[("T", &["S1"]), ("U", &[]), ("V", &[])]).await;
    let mut session = open_session(store.clone(), board.id).await;
    let t = task_named(store.as_ref(), board.id, "T").await;

    session.move_item(1, 2).await.unwrap();

    assert_eq!(
        active_tasks(store.as_ref(), board.id).await,
        ranked(&[("T", 0), ("U", 1), ("S1", 2), ("V", 3)])
    );
    assert!(store.subtasks_of(t.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_nested_task_brings_its_subtasks() {
    let (store, board) = seed(&[("Y", &["S1"]), ("X", &["C1", "C2", "C3"])]).await;
    let mut session = open_session(store.clone(), board.id).await;
    let x = task_named(store.as_ref(), board.id, "X").await;
    let y = task_named(store.as_ref(), board.id, "Y").await;
    let ItemId::Subtask(c3) = item_named(&session, "C3") else {
        panic!("C3 is not a subtask");
    };
    session.on_toggle_subtask_completed(c3).await.unwrap();

    // View: Y, S1, X, C1, C2. Without X and its subtasks: Y, S1.
    session.on_start_drag(ItemId::Task(x.id)).unwrap();
    assert!(!session.can_drag(item_named(&session, "C1")));
    let preview = session.on_hover(1).unwrap();
    assert_eq!(
        view_names(&preview),
        vec!["Y", "  X", "  C1", "  C2", "  S1"]
    );
    session.drop_and_commit(2, 1).await.unwrap();

    assert_eq!(
        active_subtasks(store.as_ref(), y.id).await,
        ranked(&[("X", 0), ("C1", 1), ("C2", 2), ("S1", 3)])
    );
    let under_y = store.subtasks_of(y.id).await.unwrap();
    let completed: Vec<_> = under_y
        .iter()
        .filter(|s| s.is_completed)
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(completed, vec!["C3"]);
    assert_eq!(store.task(x.id).await.unwrap(), None);
}

#[tokio::test]
async fn test_task_with_subtasks_reordered_as_unit() {
    let (store, board) = seed(&[("T", &["S1", "S2"]), ("U", &[]), ("V", &[])]).await;
    let mut session = open_session(store.clone(), board.id).await;
    let t = task_named(store.as_ref(), board.id, "T").await;

    session.on_start_drag(ItemId::Task(t.id)).unwrap();
    session.on_hover(2).unwrap();
    session.drop_and_commit(0, 2).await.unwrap();

    assert_eq!(
        active_tasks(store.as_ref(), board.id).await,
        ranked(&[("U", 0), ("V", 1), ("T", 2)])
    );
    assert_eq!(
        active_subtasks(store.as_ref(), t.id).await,
        ranked(&[("S1", 0), ("S2", 1)])
    );
    assert_eq!(
        view_names(&session.view()),
        vec!["U", "V", "T", "  S1", "  S2"]
    );
}

#[tokio::test]
async fn test_new_drag_rejected_until_commit_absorbed() {
    let (store, board) = seed(&[("A", &[]), ("B", &[])]).await;
    let mut session = open_session(store.clone(), board.id).await;
    let a = item_named(&session, "A");
    let b = item_named(&session, "B");

    session.on_start_drag(a).unwrap();
    session.on_hover(1).unwrap();
    assert!(session.on_drop(0, 1).unwrap());

    assert!(matches!(
        session.on_start_drag(b),
        Err(TaskboardError::SessionBusy(_))
    ));
    session.await_commit().await.unwrap();
    session.on_start_drag(b).unwrap();
}

#[tokio::test]
async fn test_closed_session_leaves_board_consistent() {
    let (store, board) = seed(&[("A", &[]), ("B", &[]), ("C", &[])]).await;
    let mut session = open_session(store.clone(), board.id).await;
    let a = item_named(&session, "A");

    session.on_start_drag(a).unwrap();
    session.on_hover(2).unwrap();
    session.on_drop(0, 2).unwrap();
    session.close();
    drop(session);
    tokio::task::yield_now().await;

    let order = active_tasks(store.as_ref(), board.id).await;
    assert!(
        order == ranked(&[("A", 0), ("B", 1), ("C", 2)])
            || order == ranked(&[("B", 0), ("C", 1), ("A", 2)])
    );
}

#[tokio::test]
async fn test_closed_session_keeps_json_file_and_memory_in_step() {
    for yields in 0..6 {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let store = Arc::new(JsonFileStore::open(&path).await.unwrap());
        let (board, batch) = board_batch("Home", &[("A", &[]), ("B", &[]), ("C", &[])]);
        store.apply(batch).await.unwrap();
        let mut session = open_session(store.clone(), board.id).await;
        let a = item_named(&session, "A");

        session.on_start_drag(a).unwrap();
        session.on_hover(2).unwrap();
        session.on_drop(0, 2).unwrap();
        for _ in 0..yields {
            tokio::task::yield_now().await;
        }
        session.close();
        drop(session);

        // Reading waits for any write still holding the store.
        let in_memory = active_tasks(store.as_ref(), board.id).await;
        let reopened = JsonFileStore::open(&path).await.unwrap();
        let on_disk = active_tasks(&reopened, board.id).await;

        assert_eq!(in_memory, on_disk, "after {} yields", yields);
        assert!(
            on_disk == ranked(&[("A", 0), ("B", 1), ("C", 2)])
                || on_disk == ranked(&[("B", 0), ("C", 1), ("A", 2)])
        );
    }
}

#[tokio::test]
async fn test_commit_persists_to_json_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tasks.json");
    let store = Arc::new(JsonFileStore::open(&path).await.unwrap());
    let (board, batch) = board_batch("Home", &[("T", &["S1", "S2"]), ("U", &[])]);
    store.apply(batch).await.unwrap();
    let mut session = open_session(store.clone(), board.id).await;

    // Move S2 below U: it becomes a task at the end of the board.
    session.move_item(2, 3).await.unwrap();
    drop(session);

    let reopened = JsonFileStore::open(&path).await.unwrap();
    assert_eq!(
        active_tasks(&reopened, board.id).await,
        ranked(&[("T", 0), ("U", 1), ("S2", 2)])
    );
    let t = task_named(&reopened, board.id, "T").await;
    assert_eq!(
        active_subtasks(&reopened, t.id).await,
        ranked(&[("S1", 0)])
    );
}
