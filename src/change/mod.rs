//! Change detection between consecutive snapshots.
//!
//! Pure functions: the previous and new collections are only borrowed.

use crate::activity::Severity;
use crate::fleet::{Task, Unit, BATTERY_CRITICAL};
use serde::Serialize;
use std::collections::HashMap;


/// A semantic state transition detected between two snapshots
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeEvent {
    UnitCreated {
        unit_id: i64,
    },
    UnitStateChanged {
        unit_id: i64,
        from: String,
        to: String,
    },
    TaskStarted {
        unit_id: i64,
        task_id: Option<i64>,
    },
    TaskCompleted {
        unit_id: i64,
        task_id: Option<i64>,
    },
    BatteryCritical {
        unit_id: i64,
        battery: f64,
    },
    TaskCreated {
        task_id: i64,
    },
    TaskStateChanged {
        task_id: i64,
        from: String,
        to: String,
    },
}

impl ChangeEvent {
    pub fn severity(&self) -> Severity {
        match self {
            ChangeEvent::UnitCreated { .. }
            | ChangeEvent::TaskCreated { .. }
            | ChangeEvent::TaskStarted { .. }
            | ChangeEvent::TaskCompleted { .. } => Severity::Success,
            ChangeEvent::BatteryCritical { .. } => Severity::Warning,
            ChangeEvent::UnitStateChanged { .. } | ChangeEvent::TaskStateChanged { .. } => {
                Severity::Info
            }
        }
    }

    /// Human-readable activity message
    pub fn message(&self) -> String {
        match self {
            ChangeEvent::UnitCreated { unit_id } => format!("New rover: {}", unit_id),
            ChangeEvent::UnitStateChanged { unit_id, from, to } => {
                format!("Rover {}: {} → {}", unit_id, from, to)
            }
            ChangeEvent::TaskStarted { unit_id, task_id } => match task_id {
                Some(task_id) => format!("Rover {} started mission #{}", unit_id, task_id),
                None => format!("Rover {} started a mission", unit_id),
            },
            ChangeEvent::TaskCompleted { unit_id, task_id } => match task_id {
                Some(task_id) => format!("Rover {} completed mission #{}", unit_id, task_id),
                None => format!("Rover {} completed a mission", unit_id),
            },
            ChangeEvent::BatteryCritical { unit_id, battery } => {
                format!("Rover {} battery critical ({}%)", unit_id, battery)
            }
            ChangeEvent::TaskCreated { task_id } => format!("New mission: #{}", task_id),
            ChangeEvent::TaskStateChanged { task_id, from, to } => {
                format!("Mission #{}: {} → {}", task_id, from, to)
            }
        }
    }
}

/// Diff both collections: unit events first, then task events.
pub fn diff(
    previous_units: &[Unit],
    new_units: &[Unit],
    previous_tasks: &[Task],
    new_tasks: &[Task],
) -> Vec<ChangeEvent> {
    let mut events = diff_units(previous_units, new_units);
    events.extend(diff_tasks(previous_tasks, new_tasks));
    events
}

/// Unit events in new-collection order.
///
/// An empty `previous` is a baseline and yields nothing. Units missing from
/// `current` are not reported. Per unit, rules fire in this order: state
/// change, task start/completion, battery crossing below the critical
/// threshold. Climbing back above the threshold emits nothing.
pub fn diff_units(previous: &[Unit], current: &[Unit]) -> Vec<ChangeEvent> {
    if previous.is_empty() {
        return Vec::new();
    }

    let by_id = first_by_id(previous, |u| u.id);
    let mut events = Vec::new();

    for unit in current {
        let old = match by_id.get(&unit.id) {
            Some(old) => old,
            None => {
                events.push(ChangeEvent::UnitCreated { unit_id: unit.id });
                continue;
            }
        };

        if old.state != unit.state {
            events.push(ChangeEvent::UnitStateChanged {
                unit_id: unit.id,
                from: old.state.clone(),
                to: unit.state.clone(),
            });
        }

        match (old.active_task, unit.active_task) {
            (None, Some(started)) => events.push(ChangeEvent::TaskStarted {
                unit_id: unit.id,
                task_id: Some(started.task_id),
            }),
            (Some(finished), None) => events.push(ChangeEvent::TaskCompleted {
                unit_id: unit.id,
                task_id: Some(finished.task_id),
            }),
            _ => {}
        }

        if unit.battery < BATTERY_CRITICAL && old.battery >= BATTERY_CRITICAL {
            events.push(ChangeEvent::BatteryCritical {
                unit_id: unit.id,
                battery: unit.battery,
            });
        }
    }

    events
}

/// Task events in new-collection order. Same baseline and removal rules as
/// [`diff_units`]; the only field rule is a raw state code change.
pub fn diff_tasks(previous: &[Task], current: &[Task]) -> Vec<ChangeEvent> {
    if previous.is_empty() {
        return Vec::new();
    }

    let by_id = first_by_id(previous, |t| t.id);

    current
        .iter()
        .filter_map(|task| match by_id.get(&task.id) {
            None => Some(ChangeEvent::TaskCreated { task_id: task.id }),
            Some(old) if old.state != task.state => Some(ChangeEvent::TaskStateChanged {
                task_id: task.id,
                from: old.state.clone(),
                to: task.state.clone(),
            }),
            Some(_) => None,
        })
        .collect()
}

/// Index by id. With duplicate ids the first occurrence wins.
fn first_by_id<T>(items: &[T], id: impl Fn(&T) -> i64) -> HashMap<i64, &T> {
    let mut by_id = HashMap::with_capacity(items.len());
    for item in items {
        by_id.entry(id(item)).or_insert(item);
    }
    by_id
}
