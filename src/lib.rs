// Fleet data model and wire format
pub mod fleet;

// Remote fleet service client
pub mod client;

// Snapshot store
pub mod snapshot;

// Change detection between snapshots
pub mod change;

// Bounded activity log
pub mod activity;

// Summary stats and derived views
pub mod stats;

// Poll orchestration and dashboard context
pub mod poll;

// Dashboard feed API
pub mod api;

// Configuration and endpoint resolution
pub mod config;
