use serde::{Deserialize, Serialize};

mod state_code;
mod validation;

pub use state_code::{canonicalize, CanonicalState, StateCategory};
pub use validation::ValidationError;

/// Battery level below which a unit is reported as critical.
pub const BATTERY_CRITICAL: f64 = 20.0;

/// Battery level below which a unit is shown with a warning class.
pub const BATTERY_WARNING: f64 = 50.0;

/// State code sent with every newly created task.
pub const NEW_TASK_STATE: &str = "PENDENTE";

/// 2D position on the field grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Position) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Linkage from a unit to the task it is currently executing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ActiveTask {
    pub task_id: i64,
    /// Completion percentage (0-100)
    pub progress: f64,
}

/// Unit (rover) as reported by the fleet service.
///
/// `active_task` is `Some` exactly when the service reports the unit as
/// having a task; stale task fields on the wire are dropped at the boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawUnit")]
pub struct Unit {
    pub id: i64,
    /// Raw operational state code (e.g. "EM_MISSAO")
    pub state: String,
    pub position: Position,
    /// Battery level (0-100)
    pub battery: f64,
    /// Speed in m/s
    pub speed: f64,
    pub active_task: Option<ActiveTask>,
}

impl Unit {
    pub fn has_active_task(&self) -> bool {
        self.active_task.is_some()
    }

    pub fn category(&self) -> Option<StateCategory> {
        canonicalize(&self.state).category
    }

    pub fn battery_class(&self) -> LevelClass {
        if self.battery < BATTERY_CRITICAL {
            LevelClass::Danger
        } else if self.battery < BATTERY_WARNING {
            LevelClass::Warning
        } else {
            LevelClass::Normal
        }
    }
}

/// Wire shape of a unit.
#[derive(Deserialize)]
struct RawUnit {
    #[serde(rename = "idRover")]
    id: i64,
    #[serde(rename = "estadoOperacional")]
    state: String,
    #[serde(rename = "posicaoX")]
    x: f64,
    #[serde(rename = "posicaoY")]
    y: f64,
    #[serde(rename = "bateria")]
    battery: f64,
    #[serde(rename = "velocidade", default)]
    speed: f64,
    #[serde(rename = "temMissao", default)]
    has_task: bool,
    #[serde(rename = "idMissaoAtual", default)]
    task_id: Option<i64>,
    #[serde(rename = "progressoMissao", default)]
    progress: Option<f64>,
}

impl From<RawUnit> for Unit {
    fn from(raw: RawUnit) -> Self {
        let active_task = raw.has_task.then(|| ActiveTask {
            task_id: raw.task_id.unwrap_or_default(),
            progress: raw.progress.unwrap_or(0.0).clamp(0.0, 100.0),
        });

        Self {
            id: raw.id,
            state: raw.state,
            position: Position::new(raw.x, raw.y),
            battery: raw.battery,
            speed: raw.speed,
            active_task,
        }
    }
}

/// Task (mission) as reported by the fleet service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawTask")]
pub struct Task {
    pub id: i64,
    pub description: String,
    /// Raw state code (e.g. "PENDENTE")
    pub state: String,
    /// Raw priority as stored by the service (nominally 1-3)
    pub priority: i64,
    pub start: Position,
    pub end: Position,
}

impl Task {
    pub fn category(&self) -> Option<StateCategory> {
        canonicalize(&self.state).category
    }

    pub fn priority_class(&self) -> Priority {
        Priority::from_raw(self.priority)
    }

    /// Straight-line distance from start to end point.
    pub fn distance(&self) -> f64 {
        self.start.distance_to(&self.end)
    }
}

#[derive(Deserialize)]
struct RawTask {
    #[serde(rename = "idMissao")]
    id: i64,
    #[serde(rename = "tarefa", default)]
    description: String,
    #[serde(rename = "estado")]
    state: String,
    #[serde(rename = "prioridade", default)]
    priority: i64,
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

impl From<RawTask> for Task {
    fn from(raw: RawTask) -> Self {
        Self {
            id: raw.id,
            description: raw.description,
            state: raw.state,
            priority: raw.priority,
            start: Position::new(raw.x1, raw.y1),
            end: Position::new(raw.x2, raw.y2),
        }
    }
}

/// One historical telemetry sample (a unit snapshot without id or task fields).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawTelemetry")]
pub struct TelemetrySample {
    pub state: String,
    pub position: Position,
    pub battery: f64,
    pub speed: f64,
}

#[derive(Deserialize)]
struct RawTelemetry {
    #[serde(rename = "estadoOperacional")]
    state: String,
    #[serde(rename = "posicaoX")]
    x: f64,
    #[serde(rename = "posicaoY")]
    y: f64,
    #[serde(rename = "bateria")]
    battery: f64,
    #[serde(rename = "velocidade", default)]
    speed: f64,
}

impl From<RawTelemetry> for TelemetrySample {
    fn from(raw: RawTelemetry) -> Self {
        Self {
            state: raw.state,
            position: Position::new(raw.x, raw.y),
            battery: raw.battery,
            speed: raw.speed,
        }
    }
}

/// Display priority of a task.
///
/// Raw values above the nominal range clamp to `Low`; zero or negative
/// values are unknown and treated as `Medium`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            1 => Priority::High,
            r if r >= 3 => Priority::Low,
            _ => Priority::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

/// Three-level display class for battery and progress indicators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelClass {
    Danger,
    Warning,
    Normal,
}

/// Request to create a new task.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub id: i64,
    pub description: String,
    pub priority: i64,
    pub start: Position,
    pub end: Position,
}

impl NewTask {
    /// Checks the request before it is sent to the fleet service.
    ///
    /// Priority is deliberately not range-checked: out-of-range values are
    /// accepted and displayed through [`Priority::from_raw`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_new_task(self)
    }

    /// Body of `POST <tasks-path>`.
    pub fn to_wire(&self) -> CreateTaskBody<'_> {
        CreateTaskBody {
            id: self.id,
            description: &self.description,
            state: NEW_TASK_STATE,
            priority: self.priority,
            x1: self.start.x,
            y1: self.start.y,
            x2: self.end.x,
            y2: self.end.y,
        }
    }
}

/// Wire shape of a create-task request.
#[derive(Debug, Serialize)]
pub struct CreateTaskBody<'a> {
    #[serde(rename = "idMissao")]
    pub id: i64,
    #[serde(rename = "tarefa")]
    pub description: &'a str,
    #[serde(rename = "estado")]
    pub state: &'static str,
    #[serde(rename = "prioridade")]
    pub priority: i64,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}
