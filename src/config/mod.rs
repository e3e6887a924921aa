pub mod endpoint;
pub use endpoint::{detect_local_addr, resolve_base_url, EndpointSource, ResolvedEndpoint};

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

/// Complete ground-control configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroundControlConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub activity: ActivityConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Fleet service connection
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    /// Explicit base endpoint; skips topology detection when set
    #[serde(default)]
    pub base_url: Option<String>,
    /// Per-request timeout. Unset means requests may hang indefinitely.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

/// What happens when a cycle is triggered while another is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclePolicy {
    /// Cycles overlap; results land in completion order
    #[default]
    Overlap,
    /// One cycle at a time; a trigger during a cycle joins it
    Serialized,
}

impl std::str::FromStr for CyclePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "overlap" => Ok(CyclePolicy::Overlap),
            "serialized" => Ok(CyclePolicy::Serialized),
            other => Err(format!("unknown cycle policy '{}'", other)),
        }
    }
}

/// Poll scheduling
#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_poll_interval")]
    pub interval_ms: u64,
    #[serde(default)]
    pub cycle_policy: CyclePolicy,
}

fn default_poll_interval() -> u64 {
    5000
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval(),
            cycle_policy: CyclePolicy::default(),
        }
    }
}

/// Activity log
#[derive(Debug, Clone, Deserialize)]
pub struct ActivityConfig {
    #[serde(default = "default_activity_capacity")]
    pub capacity: usize,
}

fn default_activity_capacity() -> usize {
    crate::activity::DEFAULT_CAPACITY
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            capacity: default_activity_capacity(),
        }
    }
}

/// Telemetry feed
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// Most recent samples kept for display
    #[serde(default = "default_telemetry_max_items")]
    pub max_items: usize,
}

fn default_telemetry_max_items() -> usize {
    20
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            max_items: default_telemetry_max_items(),
        }
    }
}

/// Dashboard feed API
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_enabled")]
    pub enabled: bool,
    #[serde(default = "default_server_port")]
    pub port: u16,
}

fn default_server_enabled() -> bool {
    true
}

fn default_server_port() -> u16 {
    3080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: default_server_enabled(),
            port: default_server_port(),
        }
    }
}

impl GroundControlConfig {
    /// Load from `GROUND_CONTROL_CONFIG` (if set), then apply environment
    /// overrides.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var("GROUND_CONTROL_CONFIG") {
            Ok(path) => load_config(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a key lookup (environment variables in
    /// production). Unparseable values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("GROUND_CONTROL_API") {
            if !v.trim().is_empty() {
                self.api.base_url = Some(v);
            }
        }
        if let Some(v) = lookup("GROUND_CONTROL_POLL_INTERVAL_MS") {
            if let Ok(n) = v.parse::<u64>() {
                self.poll.interval_ms = n;
            }
        }
        if let Some(v) = lookup("GROUND_CONTROL_CYCLE_POLICY") {
            if let Ok(policy) = v.parse::<CyclePolicy>() {
                self.poll.cycle_policy = policy;
            }
        }
        if let Some(v) = lookup("GROUND_CONTROL_PORT") {
            if let Ok(port) = v.parse::<u16>() {
                self.server.port = port;
            }
        }
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> Result<GroundControlConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path))?;
    let config: GroundControlConfig =
        toml::from_str(&contents).with_context(|| format!("Failed to parse config file {}", path))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = GroundControlConfig::default();
        assert_eq!(config.api.base_url, None);
        assert_eq!(config.api.request_timeout(), None);
        assert_eq!(config.poll.interval_ms, 5000);
        assert_eq!(config.poll.cycle_policy, CyclePolicy::Overlap);
        assert_eq!(config.activity.capacity, 50);
        assert_eq!(config.telemetry.max_items, 20);
        assert!(config.server.enabled);
        assert_eq!(config.server.port, 3080);
    }

    #[test]
    fn test_config_deserialization() {
        let toml = r#"
            [api]
            base_url = "http://10.0.0.1:8080"
            request_timeout_ms = 3000

            [poll]
            interval_ms = 2000
            cycle_policy = "serialized"

            [activity]
            capacity = 10

            [telemetry]
            max_items = 5

            [server]
            enabled = false
            port = 9000
        "#;

        let config: GroundControlConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.api.base_url.as_deref(), Some("http://10.0.0.1:8080"));
        assert_eq!(config.api.request_timeout(), Some(Duration::from_secs(3)));
        assert_eq!(config.poll.interval(), Duration::from_secs(2));
        assert_eq!(config.poll.cycle_policy, CyclePolicy::Serialized);
        assert_eq!(config.activity.capacity, 10);
        assert_eq!(config.telemetry.max_items, 5);
        assert!(!config.server.enabled);
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_partial_config() {
        // Missing sections use defaults
        let toml = r#"
            [poll]
            interval_ms = 1000
        "#;

        let config: GroundControlConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.poll.interval_ms, 1000);
        assert_eq!(config.poll.cycle_policy, CyclePolicy::Overlap); // Default
        assert_eq!(config.activity.capacity, 50); // Default
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[activity]\ncapacity = 7").unwrap();

        let config = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.activity.capacity, 7);
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config("/nonexistent/ground-control.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("GROUND_CONTROL_API", "http://192.168.1.5:8080"),
            ("GROUND_CONTROL_POLL_INTERVAL_MS", "750"),
            ("GROUND_CONTROL_CYCLE_POLICY", "serialized"),
            ("GROUND_CONTROL_PORT", "not-a-port"),
        ]
        .into_iter()
        .collect();

        let mut config = GroundControlConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.api.base_url.as_deref(), Some("http://192.168.1.5:8080"));
        assert_eq!(config.poll.interval_ms, 750);
        assert_eq!(config.poll.cycle_policy, CyclePolicy::Serialized);
        // Unparseable value leaves the default in place
        assert_eq!(config.server.port, 3080);
    }

    #[test]
    fn test_blank_api_override_is_ignored() {
        let mut config = GroundControlConfig::default();
        config.apply_overrides(|key| (key == "GROUND_CONTROL_API").then(|| "  ".to_string()));
        assert_eq!(config.api.base_url, None);
    }
}
