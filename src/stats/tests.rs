use super::*;
use crate::fleet::{ActiveTask, LevelClass, Position, Priority, Task, Unit};

fn unit(id: i64, state: &str, battery: f64, active_task: Option<(i64, f64)>) -> Unit {
    Unit {
        id,
        state: state.to_string(),
        position: Position::default(),
        battery,
        speed: 1.0,
        active_task: active_task.map(|(task_id, progress)| ActiveTask { task_id, progress }),
    }
}

fn task(id: i64, state: &str, priority: i64) -> Task {
    Task {
        id,
        description: format!("mission {}", id),
        state: state.to_string(),
        priority,
        start: Position::default(),
        end: Position::new(2.0, 0.0),
    }
}

fn fleet() -> Snapshot {
    Snapshot {
        units: vec![
            unit(1, "DISPONIVEL", 90.0, None),
            unit(2, "EM_MISSAO", 40.0, Some((10, 20.0))),
            unit(3, "EM_MISSAO", 50.0, Some((11, 80.0))),
            unit(4, "ESTADO_FALHA", 0.0, None),
        ],
        tasks: vec![
            task(10, "EM_ANDAMENTO", 1),
            task(11, "EM_ANDAMENTO", 5),
            task(12, "PENDENTE", 2),
            task(13, "CONCLUIDA", 3),
            task(14, "CANCELADA", 2),
        ],
        captured_at: None,
    }
}

#[test]
fn test_aggregate() {
    let stats = aggregate(&fleet());

    assert_eq!(stats.total_units, 4);
    assert_eq!(stats.available_units, 1);
    assert_eq!(stats.active_tasks, 3);
    assert_eq!(stats.completed_tasks, 1);
    assert_eq!(stats.mean_task_progress, 50.0);
    assert_eq!(stats.mean_battery, 45.0);
}

#[test]
fn test_aggregate_empty_snapshot_is_zero() {
    let stats = aggregate(&Snapshot::default());

    assert_eq!(stats, FleetStats::default());
    assert_eq!(stats.mean_battery, 0.0);
    assert_eq!(stats.mean_task_progress, 0.0);
}

#[test]
fn test_mean_progress_zero_when_no_unit_has_task() {
    let snapshot = Snapshot {
        units: vec![unit(1, "DISPONIVEL", 60.0, None)],
        ..Snapshot::default()
    };

    let stats = aggregate(&snapshot);
    assert_eq!(stats.mean_task_progress, 0.0);
    assert_eq!(stats.mean_battery, 60.0);
}

#[test]
fn test_state_filter_parsing() {
    assert_eq!("all".parse::<StateFilter>(), Ok(StateFilter::All));
    assert_eq!(
        "in-mission".parse::<StateFilter>(),
        Ok(StateFilter::Category(StateCategory::InMission))
    );
    assert!("flying".parse::<StateFilter>().is_err());
}

#[test]
fn test_filter_units_and_tasks() {
    let snapshot = fleet();

    let on_mission = filter_units(&snapshot.units, StateFilter::Category(StateCategory::InMission));
    assert_eq!(on_mission.iter().map(|u| u.id).collect::<Vec<_>>(), vec![2, 3]);

    let all = filter_units(&snapshot.units, StateFilter::All);
    assert_eq!(all.len(), 4);

    let pending = filter_tasks(&snapshot.tasks, StateFilter::Category(StateCategory::Pending));
    assert_eq!(pending.iter().map(|t| t.id).collect::<Vec<_>>(), vec![12]);
}

#[test]
fn test_uncategorized_only_matches_all() {
    let snapshot = fleet();
    // "CANCELADA" has no category
    for category in StateCategory::ALL {
        let tasks = filter_tasks(&snapshot.tasks, StateFilter::Category(category));
        assert!(tasks.iter().all(|t| t.id != 14));
    }
    assert!(filter_tasks(&snapshot.tasks, StateFilter::All)
        .iter()
        .any(|t| t.id == 14));
}

#[test]
fn test_display_views() {
    let snapshot = fleet();

    let view = UnitView::from(&snapshot.units[1]);
    assert_eq!(view.category, Some(StateCategory::InMission));
    assert_eq!(view.state_label, "in-mission");
    assert_eq!(view.battery_class, LevelClass::Warning);

    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["id"], 2);
    assert_eq!(json["state"], "EM_MISSAO");
    assert_eq!(json["category"], "in-mission");
    assert_eq!(json["battery_class"], "warning");

    let cancelled = snapshot.tasks.iter().find(|t| t.id == 14).unwrap();
    let view = TaskView::from(cancelled);
    assert_eq!(view.category, None);
    assert_eq!(view.state_label, "cancelada");
    assert_eq!(view.distance, 2.0);

    let json = serde_json::to_value(&view).unwrap();
    assert!(json["category"].is_null());
    assert_eq!(json["priority"], 2);
    assert_eq!(json["priority_class"], "medium");
}

#[test]
fn test_mission_timeline() {
    let mut snapshot = fleet();
    // Unit on a task the service no longer lists is skipped
    snapshot.units.push(unit(5, "EM_MISSAO", 70.0, Some((99, 10.0))));

    let timeline = mission_timeline(&snapshot);
    assert_eq!(timeline.len(), 2);

    assert_eq!(timeline[0].unit_id, 2);
    assert_eq!(timeline[0].task_id, 10);
    assert_eq!(timeline[0].priority, Priority::High);
    assert_eq!(timeline[0].progress_class, LevelClass::Danger);

    assert_eq!(timeline[1].unit_id, 3);
    // Priority 5 displays like priority 3
    assert_eq!(timeline[1].priority, Priority::Low);
    assert_eq!(timeline[1].progress_class, LevelClass::Normal);
}

#[test]
fn test_progress_class_boundaries() {
    assert_eq!(progress_class(29.9), LevelClass::Danger);
    assert_eq!(progress_class(30.0), LevelClass::Warning);
    assert_eq!(progress_class(69.9), LevelClass::Warning);
    assert_eq!(progress_class(70.0), LevelClass::Normal);
}
