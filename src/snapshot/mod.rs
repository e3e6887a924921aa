use crate::fleet::{Task, Unit};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};


/// Units and tasks as known after the most recent successful fetches
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub units: Vec<Unit>,
    pub tasks: Vec<Task>,

    /// When this snapshot replaced its predecessor (`None` before the first poll)
    pub captured_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.units.is_empty() && self.tasks.is_empty()
    }

    pub fn task(&self, task_id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }
}

/// Holds the current snapshot.
///
/// The snapshot is immutable once published; every replacement swaps in a
/// whole new `Arc<Snapshot>` under the write lock, so a reader never sees
/// units from one state paired with tasks from another.
pub struct SnapshotStore {
    current: RwLock<Arc<Snapshot>>,
}

impl SnapshotStore {
    /// Empty store (empty collections until the first successful poll)
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(Snapshot::default())),
        }
    }

    /// Current snapshot
    pub fn current(&self) -> Arc<Snapshot> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// Replace both collections in one step. Returns the previous snapshot.
    pub fn replace(&self, units: Vec<Unit>, tasks: Vec<Task>) -> Arc<Snapshot> {
        self.swap(|_| (units, tasks))
    }

    /// Replace the units, carrying the current tasks over. Returns the
    /// previous snapshot.
    pub fn replace_units(&self, units: Vec<Unit>) -> Arc<Snapshot> {
        self.swap(|previous| (units, previous.tasks.clone()))
    }

    /// Replace the tasks, carrying the current units over. Returns the
    /// previous snapshot.
    pub fn replace_tasks(&self, tasks: Vec<Task>) -> Arc<Snapshot> {
        self.swap(|previous| (previous.units.clone(), tasks))
    }

    fn swap<F>(&self, build: F) -> Arc<Snapshot>
    where
        F: FnOnce(&Snapshot) -> (Vec<Unit>, Vec<Task>),
    {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let (units, tasks) = build(&guard);
        let next = Arc::new(Snapshot {
            units,
            tasks,
            captured_at: Some(Utc::now()),
        });
        std::mem::replace(&mut *guard, next)
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
