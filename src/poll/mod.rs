//! Poll orchestration.
//!
//! A cycle issues the three fetches concurrently and applies each result as
//! soon as it arrives:
//! - failure: error entry scoped to the resource, connectivity offline, the
//!   stored resource is left untouched
//! - success: the resource is swapped into the snapshot store, the change
//!   detector runs against the value it replaced, connectivity online
//!
//! Once all three have resolved, stats are re-aggregated over whatever the
//! store holds and `last_updated` is stamped.

mod context;

pub use context::{Connectivity, DashboardContext, DashboardView};

use crate::activity::Severity;
use crate::change::{diff_tasks, diff_units, ChangeEvent};
use crate::client::{ClientError, CreateTaskAck, FleetApi};
use crate::config::CyclePolicy;
use crate::fleet::{NewTask, Task, TelemetrySample, Unit, ValidationError};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Shortest accepted poll interval
pub const MIN_INTERVAL: Duration = Duration::from_millis(100);

/// The three resources fetched every cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resource {
    Units,
    Tasks,
    Telemetry,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Resource::Units => "rovers",
            Resource::Tasks => "missions",
            Resource::Telemetry => "telemetry",
        };
        f.write_str(label)
    }
}

/// Outcome of one cycle
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Change events in the order they were applied
    pub events: Vec<ChangeEvent>,
    pub failures: Vec<(Resource, ClientError)>,
    /// Joined a cycle already in flight instead of running its own
    pub coalesced: bool,
}

/// Create-task failure
#[derive(Debug)]
pub enum CreateTaskError {
    Invalid(ValidationError),
    Client(ClientError),
}

impl fmt::Display for CreateTaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreateTaskError::Invalid(e) => write!(f, "invalid mission: {}", e),
            CreateTaskError::Client(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CreateTaskError {}

/// Drives fetch cycles against the fleet service.
///
/// Timer-driven and manual cycles share `run_cycle`. Under
/// `CyclePolicy::Overlap` nothing stops two cycles from running at once and
/// results land in completion order.
pub struct PollOrchestrator {
    api: Arc<dyn FleetApi>,
    context: Arc<DashboardContext>,
    interval: Duration,
    policy: CyclePolicy,
    cycle_lock: tokio::sync::Mutex<()>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl PollOrchestrator {
    pub fn new(
        api: Arc<dyn FleetApi>,
        context: Arc<DashboardContext>,
        interval: Duration,
        policy: CyclePolicy,
    ) -> Self {
        if interval < MIN_INTERVAL {
            warn!(
                interval_ms = interval.as_millis() as u64,
                min_ms = MIN_INTERVAL.as_millis() as u64,
                "Poll interval too short, clamping"
            );
        }

        Self {
            api,
            context,
            interval: interval.max(MIN_INTERVAL),
            policy,
            cycle_lock: tokio::sync::Mutex::new(()),
            timer: Mutex::new(None),
        }
    }

    pub fn context(&self) -> &Arc<DashboardContext> {
        &self.context
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn policy(&self) -> CyclePolicy {
        self.policy
    }

    /// Run one fetch cycle.
    pub async fn run_cycle(&self) -> CycleReport {
        match self.policy {
            CyclePolicy::Overlap => self.cycle().await,
            CyclePolicy::Serialized => match self.cycle_lock.try_lock() {
                Ok(_guard) => self.cycle().await,
                Err(_) => {
                    // Let the in-flight cycle land, then return without running another
                    let _guard = self.cycle_lock.lock().await;
                    debug!("Cycle coalesced with in-flight cycle");
                    CycleReport {
                        coalesced: true,
                        ..CycleReport::default()
                    }
                }
            },
        }
    }

    /// Manual trigger from the user
    pub async fn refresh_manual(&self) -> CycleReport {
        self.context.log(Severity::Info, "Manual refresh requested");
        self.run_cycle().await
    }

    /// Validate and submit a new task, then reload everything on success.
    pub async fn create_task(&self, task: NewTask) -> Result<CreateTaskAck, CreateTaskError> {
        if let Err(e) = task.validate() {
            warn!(task_id = task.id, error = %e, "Rejected mission");
            self.context
                .log(Severity::Error, format!("Mission rejected: {}", e));
            return Err(CreateTaskError::Invalid(e));
        }

        match self.api.create_task(&task).await {
            Ok(ack) => {
                info!(task_id = task.id, "Mission created");
                self.context
                    .log(Severity::Success, format!("Mission #{} created", task.id));
                self.run_cycle().await;
                Ok(ack)
            }
            Err(e) => {
                warn!(task_id = task.id, error = %e, "Failed to create mission");
                self.context
                    .log(Severity::Error, format!("Failed to create mission: {}", e));
                self.mark(Connectivity::Offline);
                Err(CreateTaskError::Client(e))
            }
        }
    }

    /// Start the timer. The first cycle runs immediately. A previous timer
    /// is aborted so only one is ever live.
    pub fn start(self: &Arc<Self>) {
        let orchestrator = Arc::clone(self);
        let period = self.interval;

        let handle = tokio::spawn(async move {
            info!(interval_ms = period.as_millis() as u64, "Starting poll timer");

            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                // Ticks never wait for the previous cycle
                if orchestrator.cycle_in_flight() {
                    debug!("Cycle still in flight, skipping tick");
                    continue;
                }
                let cycle = Arc::clone(&orchestrator);
                tokio::spawn(async move {
                    cycle.run_cycle().await;
                });
            }
        });

        let mut timer = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(old) = timer.replace(handle) {
            debug!("Replacing previous poll timer");
            old.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Stop the timer. In-flight cycles are not cancelled.
    pub fn shutdown(&self) {
        let handle = self
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
            info!("Poll timer stopped");
        }
    }

    /// Only meaningful under `Serialized`; overlapping cycles are never in the way.
    fn cycle_in_flight(&self) -> bool {
        self.policy == CyclePolicy::Serialized && self.cycle_lock.try_lock().is_err()
    }

    async fn cycle(&self) -> CycleReport {
        let (units, tasks, telemetry) = futures::join!(
            async {
                let result = self.api.fetch_units().await;
                self.apply_units(result)
            },
            async {
                let result = self.api.fetch_tasks().await;
                self.apply_tasks(result)
            },
            async {
                let result = self.api.fetch_telemetry_history().await;
                self.apply_telemetry(result)
            },
        );

        let mut report = CycleReport::default();
        for (resource, outcome) in [
            (Resource::Units, units),
            (Resource::Tasks, tasks),
            (Resource::Telemetry, telemetry),
        ] {
            match outcome {
                Ok(events) => report.events.extend(events),
                Err(e) => report.failures.push((resource, e)),
            }
        }

        let stats = self.context.refresh_stats();
        debug!(
            units = stats.total_units,
            events = report.events.len(),
            failures = report.failures.len(),
            "Poll cycle complete"
        );
        report
    }

    fn apply_units(
        &self,
        result: Result<Vec<Unit>, ClientError>,
    ) -> Result<Vec<ChangeEvent>, ClientError> {
        let units = result.map_err(|e| self.fail(Resource::Units, e))?;
        let previous = self.context.snapshots().replace_units(units.clone());
        let events = diff_units(&previous.units, &units);
        self.record(&events);
        self.mark(Connectivity::Online);
        Ok(events)
    }

    fn apply_tasks(
        &self,
        result: Result<Vec<Task>, ClientError>,
    ) -> Result<Vec<ChangeEvent>, ClientError> {
        let tasks = result.map_err(|e| self.fail(Resource::Tasks, e))?;
        let previous = self.context.snapshots().replace_tasks(tasks.clone());
        let events = diff_tasks(&previous.tasks, &tasks);
        self.record(&events);
        self.mark(Connectivity::Online);
        Ok(events)
    }

    fn apply_telemetry(
        &self,
        result: Result<Vec<TelemetrySample>, ClientError>,
    ) -> Result<Vec<ChangeEvent>, ClientError> {
        let samples = result.map_err(|e| self.fail(Resource::Telemetry, e))?;
        self.context.set_telemetry(samples);
        self.mark(Connectivity::Online);
        Ok(Vec::new())
    }

    fn fail(&self, resource: Resource, error: ClientError) -> ClientError {
        warn!(
            resource = %resource,
            path = error.path(),
            protocol = error.is_protocol(),
            error = %error,
            "Fetch failed"
        );
        self.context
            .log(Severity::Error, format!("Failed to load {}: {}", resource, error));
        self.mark(Connectivity::Offline);
        error
    }

    fn record(&self, events: &[ChangeEvent]) {
        for event in events {
            self.context.log(event.severity(), event.message());
        }
    }

    fn mark(&self, connectivity: Connectivity) {
        let previous = self.context.set_connectivity(connectivity);
        if previous == connectivity {
            return;
        }

        match connectivity {
            Connectivity::Online => {
                info!("Fleet service reachable");
                self.context.log(Severity::Success, "Connection established");
            }
            Connectivity::Offline => warn!("Fleet service unreachable"),
            Connectivity::Unknown => {}
        }
    }
}
