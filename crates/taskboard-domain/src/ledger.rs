//! Position ledger.
//!
//! Repacks ordered collections into contiguous zero-based ranks. Active
//! members receive `0..n-1` in sequence order, completed members lose their
//! rank. Completed members are ordered by completion timestamp instead, with
//! ties resolved by their order in the sequence.

use std::collections::HashMap;
use std::hash::Hash;

use crate::subtask::Subtask;
use crate::task::Task;

/// An item that occupies a rank while active.
pub trait Ranked {
    fn is_completed(&self) -> bool;
    fn rank(&self) -> Option<u32>;
    fn set_rank(&mut self, rank: Option<u32>);
}

/// A ranked item whose ranks are scoped to a parent.
pub trait Nested: Ranked {
    type ParentId: Copy + Eq + Hash;

    fn parent_id(&self) -> Self::ParentId;
}

impl Ranked for Task {
    fn is_completed(&self) -> bool {
        self.is_completed
    }

    fn rank(&self) -> Option<u32> {
        self.position
    }

    fn set_rank(&mut self, rank: Option<u32>) {
        self.position = rank;
    }
}

impl Ranked for Subtask {
    fn is_completed(&self) -> bool {
        self.is_completed
    }

    fn rank(&self) -> Option<u32> {
        self.position
    }

    fn set_rank(&mut self, rank: Option<u32>) {
        self.position = rank;
    }
}

impl Nested for Subtask {
    type ParentId = crate::ids::TaskId;

    fn parent_id(&self) -> Self::ParentId {
        self.task_id
    }
}

/// A task viewed through its agenda rank rather than its board rank.
#[derive(Debug, Clone, PartialEq)]
pub struct AgendaSlot(pub Task);

impl Ranked for AgendaSlot {
    fn is_completed(&self) -> bool {
        self.0.is_completed
    }

    fn rank(&self) -> Option<u32> {
        self.0.agenda_position
    }

    fn set_rank(&mut self, rank: Option<u32>) {
        self.0.agenda_position = rank;
    }
}

/// Assigns `position = index` among active items, in input order.
pub fn repack<T: Ranked>(mut items: Vec<T>) -> Vec<T> {
    let mut next = 0;
    for item in items.iter_mut() {
        if item.is_completed() {
            item.set_rank(None);
        } else {
            item.set_rank(Some(next));
            next += 1;
        }
    }
    items
}

/// Like [`repack`], but keeps an independent counter per parent.
///
/// Members of one parent need not be adjacent; each parent's ranks follow
/// first-occurrence order within the sequence.
pub fn repack_by_parent<T: Nested>(mut items: Vec<T>) -> Vec<T> {
    let mut counters: HashMap<T::ParentId, u32> = HashMap::new();
    for item in items.iter_mut() {
        if item.is_completed() {
            item.set_rank(None);
            continue;
        }
        let next = counters.entry(item.parent_id()).or_insert(0);
        item.set_rank(Some(*next));
        *next += 1;
    }
    items
}

/// Checks that active ranks read `0..n-1` in sequence order and that
/// completed items carry no rank.
pub fn is_packed<T: Ranked>(items: &[T]) -> bool {
    let mut expected = 0;
    for item in items {
        match (item.is_completed(), item.rank()) {
            (true, None) => {}
            (false, Some(rank)) if rank == expected => expected += 1,
            _ => return false,
        }
    }
    true
}

/// Sorts active items by rank. Unranked active items keep their relative
/// order after the ranked ones.
pub fn sort_by_rank<T: Ranked>(items: &mut [T]) {
    items.sort_by_key(|item| (item.rank().is_none(), item.rank()));
}

/// Active subtasks by rank followed by completed ones by completion time.
///
/// The sort is stable, so subtasks sharing a timestamp keep their order.
pub fn display_order(mut subtasks: Vec<Subtask>) -> Vec<Subtask> {
    subtasks.sort_by(|a, b| {
        a.is_completed
            .cmp(&b.is_completed)
            .then_with(|| match (a.is_completed, b.is_completed) {
                (true, true) => a.completed_at.cmp(&b.completed_at),
                _ => (a.position.is_none(), a.position).cmp(&(b.position.is_none(), b.position)),
            })
    });
    subtasks
}
