use crate::activity::{ActivityEntry, ActivityLog, Severity};
use crate::fleet::TelemetrySample;
use crate::snapshot::SnapshotStore;
use crate::stats::{aggregate, mission_timeline, FleetStats, TaskView, TimelineEntry, UnitView};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Reachability of the fleet service as of the latest completed fetch
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    /// No fetch has completed yet
    #[default]
    Unknown,
    Online,
    Offline,
}

#[derive(Debug, Default)]
struct Status {
    connectivity: Connectivity,
    stats: FleetStats,
    last_updated: Option<DateTime<Utc>>,
}

/// Everything the dashboard renders, in one serializable value
#[derive(Clone, Debug, Serialize)]
pub struct DashboardView {
    pub units: Vec<UnitView>,
    pub tasks: Vec<TaskView>,
    pub telemetry: Vec<TelemetrySample>,
    pub activity: Vec<ActivityEntry>,
    pub stats: FleetStats,
    pub connectivity: Connectivity,
    pub last_updated: Option<DateTime<Utc>>,
    pub timeline: Vec<TimelineEntry>,
}

/// Owned dashboard state, created once at startup and shared by the
/// orchestrator and the feed API.
pub struct DashboardContext {
    snapshots: SnapshotStore,
    activity: Mutex<ActivityLog>,
    telemetry: Mutex<Vec<TelemetrySample>>,
    telemetry_max_items: usize,
    status: Mutex<Status>,
}

impl DashboardContext {
    pub fn new(activity_capacity: usize, telemetry_max_items: usize) -> Self {
        Self {
            snapshots: SnapshotStore::new(),
            activity: Mutex::new(ActivityLog::new(activity_capacity)),
            telemetry: Mutex::new(Vec::new()),
            telemetry_max_items,
            status: Mutex::new(Status::default()),
        }
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    pub fn log(&self, severity: Severity, message: impl Into<String>) -> ActivityEntry {
        lock(&self.activity).append(severity, message)
    }

    /// Activity entries, newest first
    pub fn activity(&self) -> Vec<ActivityEntry> {
        lock(&self.activity).to_vec()
    }

    pub fn clear_activity(&self) {
        lock(&self.activity).clear();
    }

    /// Keep only the most recent `telemetry_max_items` samples, oldest first.
    pub fn set_telemetry(&self, mut samples: Vec<TelemetrySample>) {
        if samples.len() > self.telemetry_max_items {
            samples.drain(..samples.len() - self.telemetry_max_items);
        }
        *lock(&self.telemetry) = samples;
    }

    pub fn telemetry(&self) -> Vec<TelemetrySample> {
        lock(&self.telemetry).clone()
    }

    /// Record a fetch outcome. Returns the previous value.
    pub fn set_connectivity(&self, connectivity: Connectivity) -> Connectivity {
        std::mem::replace(&mut lock(&self.status).connectivity, connectivity)
    }

    pub fn connectivity(&self) -> Connectivity {
        lock(&self.status).connectivity
    }

    /// Re-aggregate stats over the current snapshot and stamp `last_updated`.
    pub fn refresh_stats(&self) -> FleetStats {
        let stats = aggregate(&self.snapshots.current());
        let mut status = lock(&self.status);
        status.stats = stats.clone();
        status.last_updated = Some(Utc::now());
        stats
    }

    pub fn stats(&self) -> FleetStats {
        lock(&self.status).stats.clone()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        lock(&self.status).last_updated
    }

    pub fn view(&self) -> DashboardView {
        let snapshot = self.snapshots.current();
        let timeline = mission_timeline(&snapshot);
        let (stats, connectivity, last_updated) = {
            let status = lock(&self.status);
            (status.stats.clone(), status.connectivity, status.last_updated)
        };

        DashboardView {
            units: snapshot.units.iter().map(UnitView::from).collect(),
            tasks: snapshot.tasks.iter().map(TaskView::from).collect(),
            telemetry: self.telemetry(),
            activity: self.activity(),
            stats,
            connectivity,
            last_updated,
            timeline,
        }
    }
}

impl Default for DashboardContext {
    fn default() -> Self {
        Self::new(crate::activity::DEFAULT_CAPACITY, 20)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
