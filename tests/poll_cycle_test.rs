// End-to-end poll cycles against a mock fleet service

use ground_control::activity::Severity;
use ground_control::client::HttpFleetClient;
use ground_control::config::CyclePolicy;
use ground_control::fleet::{NewTask, Position};
use ground_control::poll::{Connectivity, DashboardContext, PollOrchestrator};
use mockito::{Matcher, Mock, ServerGuard};
use std::sync::Arc;
use std::time::Duration;

fn rover(id: i64, state: &str, battery: f64, task: Option<(i64, f64)>) -> serde_json::Value {
    let (task_id, progress) = task.unwrap_or((0, 0.0));
    serde_json::json!({
        "idRover": id,
        "posicaoX": 5.0,
        "posicaoY": 5.0,
        "bateria": battery,
        "velocidade": 1.0,
        "estadoOperacional": state,
        "idMissaoAtual": task_id,
        "progressoMissao": progress,
        "temMissao": task.is_some(),
    })
}

fn mission(id: i64, state: &str) -> serde_json::Value {
    serde_json::json!({
        "idMissao": id,
        "tarefa": format!("Mission {}", id),
        "estado": state,
        "x1": 0.0, "y1": 0.0, "x2": 3.0, "y2": 4.0,
        "prioridade": 1,
    })
}

async fn serve_json(server: &mut ServerGuard, path: &str, body: serde_json::Value) -> Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}

async fn serve_status(server: &mut ServerGuard, path: &str, status: usize) -> Mock {
    server
        .mock("GET", path)
        .with_status(status)
        .create_async()
        .await
}

fn create_orchestrator(server: &ServerGuard) -> Arc<PollOrchestrator> {
    let client = HttpFleetClient::new(&server.url(), Some(Duration::from_secs(5))).unwrap();
    let context = Arc::new(DashboardContext::new(50, 20));
    Arc::new(PollOrchestrator::new(
        Arc::new(client),
        context,
        Duration::from_secs(5),
        CyclePolicy::Overlap,
    ))
}

/// Baseline cycle logs nothing; the next cycle logs every transition.
#[tokio::test]
async fn test_change_detection_across_cycles() {
    let mut server = mockito::Server::new_async().await;
    let rovers = serve_json(
        &mut server,
        "/rovers",
        serde_json::json!([rover(1, "DISPONIVEL", 25.0, None)]),
    )
    .await;
    let missions = serve_json(&mut server, "/missoes", serde_json::json!([mission(9, "PENDENTE")])).await;
    let _telemetry = serve_json(&mut server, "/telemetria/historico", serde_json::json!([])).await;

    let orchestrator = create_orchestrator(&server);
    let report = orchestrator.run_cycle().await;
    assert!(report.events.is_empty());
    assert!(report.failures.is_empty());

    rovers.remove_async().await;
    missions.remove_async().await;
    let _rovers = serve_json(
        &mut server,
        "/rovers",
        serde_json::json!([rover(1, "EM_MISSAO", 15.0, Some((9, 0.0))), rover(2, "DISPONIVEL", 100.0, None)]),
    )
    .await;
    let _missions = serve_json(&mut server, "/missoes", serde_json::json!([mission(9, "EM_ANDAMENTO")])).await;

    let report = orchestrator.run_cycle().await;
    assert_eq!(report.events.len(), 5);

    let messages: Vec<String> = orchestrator
        .context()
        .activity()
        .into_iter()
        .map(|e| e.message)
        .collect();
    assert_eq!(messages.len(), 6);
    assert_eq!(messages[5], "Connection established");
    // Rovers and missions land in response order; within one resource the
    // detector's order is kept (newest first here)
    let rover_messages: Vec<&str> = messages
        .iter()
        .map(String::as_str)
        .filter(|m| m.starts_with("Rover") || m.starts_with("New rover"))
        .collect();
    assert_eq!(
        rover_messages,
        vec![
            "New rover: 2",
            "Rover 1 battery critical (15%)",
            "Rover 1 started mission #9",
            "Rover 1: DISPONIVEL → EM_MISSAO",
        ]
    );
    assert!(messages.contains(&"Mission #9: PENDENTE → EM_ANDAMENTO".to_string()));

    let stats = orchestrator.context().stats();
    assert_eq!(stats.total_units, 2);
    assert_eq!(stats.available_units, 1);
    assert_eq!(stats.active_tasks, 1);
}

/// A failing resource is reported on its own; the others still land.
#[tokio::test]
async fn test_partial_failure() {
    let mut server = mockito::Server::new_async().await;
    let _rovers = serve_json(
        &mut server,
        "/rovers",
        serde_json::json!([rover(1, "DISPONIVEL", 80.0, None)]),
    )
    .await;
    let _missions = serve_status(&mut server, "/missoes", 500).await;
    let _telemetry = serve_json(
        &mut server,
        "/telemetria/historico",
        serde_json::json!([{
            "posicaoX": 1.0, "posicaoY": 2.0,
            "estadoOperacional": "DISPONIVEL",
            "bateria": 80.0, "velocidade": 0.0
        }]),
    )
    .await;

    let orchestrator = create_orchestrator(&server);
    let report = orchestrator.run_cycle().await;

    assert_eq!(report.failures.len(), 1);
    let context = orchestrator.context();
    assert_eq!(context.snapshots().current().units.len(), 1);
    assert!(context.snapshots().current().tasks.is_empty());
    assert_eq!(context.telemetry().len(), 1);

    let errors: Vec<_> = context
        .activity()
        .into_iter()
        .filter(|e| e.severity == Severity::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("HTTP 500 on /missoes"));
}

/// Nothing listening: every fetch is a transport failure.
#[tokio::test]
async fn test_unreachable_service_goes_offline() {
    let client = HttpFleetClient::new("http://127.0.0.1:1", Some(Duration::from_secs(2))).unwrap();
    let orchestrator = PollOrchestrator::new(
        Arc::new(client),
        Arc::new(DashboardContext::default()),
        Duration::from_secs(5),
        CyclePolicy::Serialized,
    );

    let report = orchestrator.run_cycle().await;

    assert_eq!(report.failures.len(), 3);
    assert!(report.failures.iter().all(|(_, e)| e.is_transport()));
    assert_eq!(orchestrator.context().connectivity(), Connectivity::Offline);
}

/// Create posts the wire body, then reloads every resource.
#[tokio::test]
async fn test_create_mission_then_reload() {
    let mut server = mockito::Server::new_async().await;
    let create = server
        .mock("POST", "/missoes")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "idMissao": 12,
            "tarefa": "Scan ridge",
            "estado": "PENDENTE",
            "prioridade": 2,
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status":"created","id":12}"#)
        .create_async()
        .await;
    let rovers = server
        .mock("GET", "/rovers")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .expect(1)
        .create_async()
        .await;
    let _missions = serve_json(&mut server, "/missoes", serde_json::json!([mission(12, "PENDENTE")])).await;
    let _telemetry = serve_json(&mut server, "/telemetria/historico", serde_json::json!([])).await;

    let orchestrator = create_orchestrator(&server);
    let ack = orchestrator
        .create_task(NewTask {
            id: 12,
            description: "Scan ridge".to_string(),
            priority: 2,
            start: Position::new(1.0, 1.0),
            end: Position::new(4.0, 5.0),
        })
        .await
        .unwrap();

    assert_eq!(ack.id, Some(12));
    create.assert_async().await;
    rovers.assert_async().await;
    assert_eq!(orchestrator.context().snapshots().current().tasks[0].id, 12);
}
