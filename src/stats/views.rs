use crate::fleet::{canonicalize, LevelClass, Priority, StateCategory, Task, Unit};
use crate::snapshot::Snapshot;
use serde::Serialize;
use std::str::FromStr;

/// Filter over canonical state categories.
///
/// Parses from "all" or a category label such as "in-mission".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StateFilter {
    #[default]
    All,
    Category(StateCategory),
}

impl StateFilter {
    /// Uncategorized states only match `All`.
    pub fn matches(&self, category: Option<StateCategory>) -> bool {
        match self {
            StateFilter::All => true,
            StateFilter::Category(wanted) => category == Some(*wanted),
        }
    }
}

impl FromStr for StateFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(StateFilter::All);
        }
        StateCategory::from_label(s)
            .map(StateFilter::Category)
            .ok_or_else(|| format!("unknown state filter '{}'", s))
    }
}

pub fn filter_units(units: &[Unit], filter: StateFilter) -> Vec<Unit> {
    units
        .iter()
        .filter(|u| filter.matches(u.category()))
        .cloned()
        .collect()
}

pub fn filter_tasks(tasks: &[Task], filter: StateFilter) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| filter.matches(t.category()))
        .cloned()
        .collect()
}

/// Unit as rendered: the raw fields plus its display classes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UnitView {
    #[serde(flatten)]
    pub unit: Unit,
    pub category: Option<StateCategory>,
    /// Category label, or the normalized code when uncategorized
    pub state_label: String,
    pub battery_class: LevelClass,
}

impl From<&Unit> for UnitView {
    fn from(unit: &Unit) -> Self {
        let canonical = canonicalize(&unit.state);
        Self {
            state_label: canonical.label().to_string(),
            category: canonical.category,
            battery_class: unit.battery_class(),
            unit: unit.clone(),
        }
    }
}

/// Task as rendered. `priority` stays the raw value sent by the service.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub category: Option<StateCategory>,
    pub state_label: String,
    pub priority_class: Priority,
    pub distance: f64,
}

impl From<&Task> for TaskView {
    fn from(task: &Task) -> Self {
        let canonical = canonicalize(&task.state);
        Self {
            state_label: canonical.label().to_string(),
            category: canonical.category,
            priority_class: task.priority_class(),
            distance: task.distance(),
            task: task.clone(),
        }
    }
}

/// A unit currently executing a known task
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub task_id: i64,
    pub unit_id: i64,
    pub description: String,
    pub priority: Priority,
    pub progress: f64,
    pub progress_class: LevelClass,
    pub battery: f64,
    pub speed: f64,
}

/// Progress below 30% is danger, below 70% warning.
pub fn progress_class(progress: f64) -> LevelClass {
    if progress < 30.0 {
        LevelClass::Danger
    } else if progress < 70.0 {
        LevelClass::Warning
    } else {
        LevelClass::Normal
    }
}

/// One row per unit with an active task. Units whose task id is not in the
/// snapshot's task collection are skipped.
pub fn mission_timeline(snapshot: &Snapshot) -> Vec<TimelineEntry> {
    snapshot
        .units
        .iter()
        .filter_map(|unit| {
            let active = unit.active_task?;
            let task = snapshot.task(active.task_id)?;
            Some(TimelineEntry {
                task_id: task.id,
                unit_id: unit.id,
                description: task.description.clone(),
                priority: task.priority_class(),
                progress: active.progress,
                progress_class: progress_class(active.progress),
                battery: unit.battery,
                speed: unit.speed,
            })
        })
        .collect()
}
