//! Remote fleet service client.
//!
//! Three read resources and one mutation over HTTP/JSON. The client never
//! retries; the poll orchestrator's next cycle is the retry.

use crate::fleet::{NewTask, Task, TelemetrySample, Unit};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;


pub const UNITS_PATH: &str = "/rovers";
pub const TASKS_PATH: &str = "/missoes";
pub const TELEMETRY_HISTORY_PATH: &str = "/telemetria/historico";

/// Failure of a single request to the fleet service.
///
/// `Status` and `MalformedBody` are both protocol failures: the request made
/// the round trip but the answer was unusable.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientError {
    /// Request never reached the service or the response never came back
    Transport { path: String, message: String },
    /// Service answered with a non-success status
    Status { path: String, status: u16 },
    /// Body did not parse as the expected shape
    MalformedBody { path: String, message: String },
}

impl ClientError {
    /// True for network-level failures, false for protocol failures
    /// (bad status or unparseable body).
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport { .. })
    }

    pub fn is_protocol(&self) -> bool {
        !self.is_transport()
    }

    pub fn path(&self) -> &str {
        match self {
            ClientError::Transport { path, .. }
            | ClientError::Status { path, .. }
            | ClientError::MalformedBody { path, .. } => path,
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Transport { path, message } => {
                write!(f, "transport error on {}: {}", path, message)
            }
            ClientError::Status { path, status } => write!(f, "HTTP {} on {}", status, path),
            ClientError::MalformedBody { path, message } => {
                write!(f, "malformed response from {}: {}", path, message)
            }
        }
    }
}

impl std::error::Error for ClientError {}

/// Acknowledgement returned by the service for a created task.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateTaskAck {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub id: Option<i64>,
}

/// Operations the orchestrator needs from the fleet service.
///
/// Implemented over HTTP by [`HttpFleetClient`]; tests substitute
/// in-memory fakes.
#[async_trait]
pub trait FleetApi: Send + Sync {
    async fn fetch_units(&self) -> Result<Vec<Unit>, ClientError>;

    async fn fetch_tasks(&self) -> Result<Vec<Task>, ClientError>;

    async fn fetch_telemetry_history(&self) -> Result<Vec<TelemetrySample>, ClientError>;

    async fn create_task(&self, task: &NewTask) -> Result<CreateTaskAck, ClientError>;
}

/// HTTP client for the fleet service REST API.
pub struct HttpFleetClient {
    http_client: Client,
    base_url: String,
}

impl HttpFleetClient {
    /// Create a client for `base_url` (e.g. "http://localhost:8080").
    ///
    /// `timeout` of `None` leaves requests unbounded.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> reqwest::Result<Self> {
        let mut builder = Client::builder().user_agent("ground-control/0.1");
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http_client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http_client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| transport_error(path, e))?;

        parse_body(path, response).await
    }
}

#[async_trait]
impl FleetApi for HttpFleetClient {
    async fn fetch_units(&self) -> Result<Vec<Unit>, ClientError> {
        self.get_json(UNITS_PATH).await
    }

    async fn fetch_tasks(&self) -> Result<Vec<Task>, ClientError> {
        self.get_json(TASKS_PATH).await
    }

    async fn fetch_telemetry_history(&self) -> Result<Vec<TelemetrySample>, ClientError> {
        self.get_json(TELEMETRY_HISTORY_PATH).await
    }

    async fn create_task(&self, task: &NewTask) -> Result<CreateTaskAck, ClientError> {
        let url = format!("{}{}", self.base_url, TASKS_PATH);
        let response = self
            .http_client
            .post(&url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(&task.to_wire())
            .send()
            .await
            .map_err(|e| transport_error(TASKS_PATH, e))?;

        parse_body(TASKS_PATH, response).await
    }
}

/// Check the status, then read and parse the body.
///
/// Reading the body is a transport concern; parsing it is a protocol one.
async fn parse_body<T: DeserializeOwned>(path: &str, response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::Status {
            path: path.to_string(),
            status: status.as_u16(),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| transport_error(path, e))?;

    serde_json::from_slice(&bytes).map_err(|e| ClientError::MalformedBody {
        path: path.to_string(),
        message: e.to_string(),
    })
}

fn transport_error(path: &str, e: reqwest::Error) -> ClientError {
    ClientError::Transport {
        path: path.to_string(),
        message: e.to_string(),
    }
}
