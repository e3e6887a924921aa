use anyhow::{Context, Result};
use ground_control::activity::Severity;
use ground_control::api::{create_dashboard_router, DashboardAppState};
use ground_control::client::HttpFleetClient;
use ground_control::config::{detect_local_addr, resolve_base_url, GroundControlConfig};
use ground_control::poll::{DashboardContext, PollOrchestrator};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ground_control=info".into()),
        )
        .init();

    info!("Ground control starting...");

    let config = GroundControlConfig::load().context("Failed to load configuration")?;

    // Resolved once; never re-evaluated while running
    let endpoint = resolve_base_url(config.api.base_url.as_deref(), detect_local_addr());
    info!(
        base_url = %endpoint.base_url,
        source = ?endpoint.source,
        "Configuration loaded"
    );

    let client = HttpFleetClient::new(&endpoint.base_url, config.api.request_timeout())
        .context("Failed to build fleet service client")?;
    info!(base_url = client.base_url(), "Fleet service client ready");

    let context = Arc::new(DashboardContext::new(
        config.activity.capacity,
        config.telemetry.max_items,
    ));
    context.log(Severity::Info, "System started");

    let orchestrator = Arc::new(PollOrchestrator::new(
        Arc::new(client),
        Arc::clone(&context),
        config.poll.interval(),
        config.poll.cycle_policy,
    ));
    info!(
        interval_ms = orchestrator.interval().as_millis() as u64,
        cycle_policy = ?orchestrator.policy(),
        "Poll orchestrator ready"
    );
    orchestrator.start();

    // Start dashboard feed API
    let server_handle = if config.server.enabled {
        let router = create_dashboard_router(Arc::new(DashboardAppState {
            orchestrator: Arc::clone(&orchestrator),
        }));
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.server.port))
            .await
            .context("Failed to bind dashboard API port")?;
        info!(port = config.server.port, "Dashboard API listening");

        Some(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!(error = %e, "Dashboard API server error");
            }
        }))
    } else {
        info!("Dashboard API disabled");
        None
    };

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl_c signal")?;
    info!("Shutdown signal received");

    if let Some(handle) = server_handle {
        handle.abort();
    }
    orchestrator.shutdown();
    info!("Ground control stopped");

    Ok(())
}
