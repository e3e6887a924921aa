// Fleet summary counters and derived display views

mod views;
#[cfg(test)]
mod tests;

pub use views::{
    filter_tasks, filter_units, mission_timeline, progress_class, StateFilter, TaskView,
    TimelineEntry, UnitView,
};

use crate::fleet::StateCategory;
use crate::snapshot::Snapshot;
use serde::Serialize;

/// Summary counters derived from a snapshot
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FleetStats {
    pub total_units: usize,
    /// Units whose state canonicalizes to `available`
    pub available_units: usize,
    /// Tasks in `in-mission`, `in-progress` or `pending`
    pub active_tasks: usize,
    pub completed_tasks: usize,
    /// Mean completion percentage over units with an active task (0 when none)
    pub mean_task_progress: f64,
    /// Mean battery over all units (0 when none)
    pub mean_battery: f64,
}

/// Aggregate summary counters. Empty collections yield zeros.
pub fn aggregate(snapshot: &Snapshot) -> FleetStats {
    let available_units = snapshot
        .units
        .iter()
        .filter(|u| u.category() == Some(StateCategory::Available))
        .count();

    let active_tasks = snapshot
        .tasks
        .iter()
        .filter(|t| {
            matches!(
                t.category(),
                Some(StateCategory::InMission | StateCategory::InProgress | StateCategory::Pending)
            )
        })
        .count();

    let completed_tasks = snapshot
        .tasks
        .iter()
        .filter(|t| t.category() == Some(StateCategory::Completed))
        .count();

    let progress: Vec<f64> = snapshot
        .units
        .iter()
        .filter_map(|u| u.active_task.map(|t| t.progress))
        .collect();

    let batteries: Vec<f64> = snapshot.units.iter().map(|u| u.battery).collect();

    FleetStats {
        total_units: snapshot.units.len(),
        available_units,
        active_tasks,
        completed_tasks,
        mean_task_progress: mean(&progress),
        mean_battery: mean(&batteries),
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
