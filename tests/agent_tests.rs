use std::sync::Arc;
use std::time::Duration;

use surface_planner::{
    agent::{
        agent::Orchestrator,
        agent_model::{EventOutcome, StalePlanPolicy},
        error::{ExtractError, PlanError},
    },
    interpreter::report_model::StepOutcome,
    plan::{
        client::{HttpPlanClient, MockPlanBackend, MockReply},
        plan_model::{ActionStep, Plan},
    },
    surface::memory::{MemorySurface, NodeSpec, Primitive, PrimitiveCall},
    trace::logger::TraceLogger,
};

use crate::common::{
    planner_server::FakePlanner,
    utils::{FLIGHT_GOAL, config_with_policy, flight_search_screen, orchestrator, root_with},
};

mod common;

fn tap_plan(id: &str) -> Plan {
    Plan::new(vec![ActionStep::tap(id)])
}

// =========================================================================
// End to end
// =========================================================================

#[tokio::test]
async fn flight_search_tap_is_the_only_side_effect() {
    let planner = FakePlanner::start(
        200,
        r#"{"steps":[{"action":"tap","target":{"resource_id":"search_button"}}]}"#,
    )
    .await;
    let surface = Arc::new(MemorySurface::from_root(root_with(vec![
        NodeSpec::with_id("search_button"),
    ])));
    let backend = Arc::new(
        HttpPlanClient::new(&planner.base_url, Duration::from_secs(5)).unwrap(),
    );
    let agent = orchestrator(surface.clone(), backend, StalePlanPolicy::Apply);

    let outcome = agent.on_surface_changed().unwrap().await.unwrap();

    match outcome {
        EventOutcome::Applied { generation, stale, report } => {
            assert_eq!(generation, 1);
            assert!(!stale);
            assert_eq!(
                report.outcomes(),
                vec![&StepOutcome::Applied { matched: 1, failed: 0 }]
            );
        }
        other => panic!("Expected Applied, got {:?}", other),
    }
    assert_eq!(
        surface.calls(),
        vec![PrimitiveCall {
            serial: 1,
            element_id: Some("search_button".into()),
            primitive: Primitive::Activate,
        }]
    );

    let received = planner.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0]["userGoal"], FLIGHT_GOAL);
    assert_eq!(received[0]["screenContext"]["appName"], "UnknownApp");
}

#[tokio::test]
async fn request_carries_goal_and_snapshot_of_the_event() {
    let surface = Arc::new(MemorySurface::from_root(flight_search_screen()));
    let backend = Arc::new(MockPlanBackend::with_plan(Plan::default()));
    let agent = orchestrator(surface, backend.clone(), StalePlanPolicy::Apply);

    agent.on_surface_changed().unwrap().await.unwrap();

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].user_goal, FLIGHT_GOAL);
    assert_eq!(requests[0].screen_context.elements.len(), 4);
}

// =========================================================================
// Failure absorption
// =========================================================================

#[tokio::test]
async fn missing_root_abandons_event_without_calling_planner() {
    let surface = Arc::new(MemorySurface::without_root());
    let backend = Arc::new(MockPlanBackend::with_plan(tap_plan("x")));
    let agent = orchestrator(surface, backend.clone(), StalePlanPolicy::Apply);

    let result = agent.on_surface_changed();

    assert_eq!(result.unwrap_err(), ExtractError::RootUnavailable);
    assert!(backend.requests().is_empty());
    assert_eq!(agent.latest_generation(), 0);
}

#[tokio::test]
async fn failed_plan_touches_nothing_and_next_event_still_runs() {
    let surface = Arc::new(MemorySurface::from_root(flight_search_screen()));
    let backend = Arc::new(
        MockPlanBackend::with_plan(tap_plan("search_button"))
            .then_reply(MockReply::Fail("timeout".into()), Duration::ZERO),
    );
    let agent = orchestrator(surface.clone(), backend, StalePlanPolicy::Apply);

    let first = agent.on_surface_changed().unwrap().await.unwrap();
    assert!(matches!(first, EventOutcome::PlanFailed { generation: 1, error: PlanError::Unavailable(_) }));
    assert!(surface.calls().is_empty());

    let second = agent.on_surface_changed().unwrap().await.unwrap();
    assert_eq!(second.kind(), "applied");
    assert_eq!(surface.calls().len(), 1);
}

#[tokio::test]
async fn unreachable_planner_never_stops_dispatch() {
    let surface = Arc::new(MemorySurface::from_root(flight_search_screen()));
    let backend = Arc::new(MockPlanBackend::failing("connection refused"));
    let agent = orchestrator(surface.clone(), backend.clone(), StalePlanPolicy::Apply);

    let handles: Vec<_> = (0..3).map(|_| agent.on_surface_changed().unwrap()).collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap().kind(), "plan_failed");
    }

    assert_eq!(backend.requests().len(), 3);
    assert_eq!(agent.latest_generation(), 3);
    assert!(surface.calls().is_empty());
}

// =========================================================================
// Concurrency and staleness
// =========================================================================

#[tokio::test]
async fn overlapping_events_run_independently() {
    let surface = Arc::new(MemorySurface::from_root(flight_search_screen()));
    let backend = Arc::new(
        MockPlanBackend::with_plan(tap_plan("search_button"))
            .then_reply(MockReply::Plan(tap_plan("from_field")), Duration::from_millis(300))
            .then_reply(MockReply::Plan(tap_plan("to_field")), Duration::ZERO),
    );
    let agent = orchestrator(surface.clone(), backend, StalePlanPolicy::Apply);

    let slow = agent.on_surface_changed().unwrap();
    let fast = agent.on_surface_changed().unwrap();

    let fast_outcome = fast.await.unwrap();
    assert!(!slow.is_finished(), "slow task must not hold up the fast one");
    let slow_outcome = slow.await.unwrap();

    assert_eq!(fast_outcome.generation(), 2);
    assert_eq!(slow_outcome.generation(), 1);
    assert_eq!(fast_outcome.kind(), "applied");
    assert_eq!(slow_outcome.kind(), "applied");

    let order: Vec<_> = surface
        .calls()
        .into_iter()
        .map(|c| c.element_id.unwrap())
        .collect();
    assert_eq!(order, vec!["to_field", "from_field"]);
}

#[tokio::test]
async fn late_plan_is_applied_and_flagged_under_apply_policy() {
    let surface = Arc::new(MemorySurface::from_root(flight_search_screen()));
    let backend = Arc::new(
        MockPlanBackend::with_plan(tap_plan("to_field"))
            .then_reply(MockReply::Plan(tap_plan("from_field")), Duration::from_millis(200)),
    );
    let agent = orchestrator(surface.clone(), backend, StalePlanPolicy::Apply);

    let first = agent.on_surface_changed().unwrap();
    let second = agent.on_surface_changed().unwrap();
    let second = second.await.unwrap();
    let first = first.await.unwrap();

    assert!(matches!(second, EventOutcome::Applied { stale: false, .. }));
    assert!(matches!(first, EventOutcome::Applied { generation: 1, stale: true, .. }));
    assert_eq!(surface.calls().len(), 2);
}

#[tokio::test]
async fn late_plan_is_dropped_under_discard_policy() {
    let surface = Arc::new(MemorySurface::from_root(flight_search_screen()));
    let backend = Arc::new(
        MockPlanBackend::with_plan(tap_plan("to_field"))
            .then_reply(MockReply::Plan(tap_plan("from_field")), Duration::from_millis(200)),
    );
    let agent = orchestrator(surface.clone(), backend, StalePlanPolicy::Discard);

    let first = agent.on_surface_changed().unwrap();
    let second = agent.on_surface_changed().unwrap();
    let second = second.await.unwrap();
    let first = first.await.unwrap();

    assert!(matches!(first, EventOutcome::Stale { generation: 1, latest: 2 }));
    assert_eq!(second.kind(), "applied");
    assert_eq!(
        surface.calls(),
        vec![PrimitiveCall {
            serial: 2,
            element_id: Some("to_field".into()),
            primitive: Primitive::Activate,
        }]
    );
}

#[tokio::test]
async fn goal_change_applies_to_later_events_only() {
    let surface = Arc::new(MemorySurface::from_root(flight_search_screen()));
    let backend = Arc::new(MockPlanBackend::with_plan(Plan::default()));
    let agent = orchestrator(surface, backend.clone(), StalePlanPolicy::Apply);

    let first = agent.on_surface_changed().unwrap();
    agent.set_goal("Find a hotel in London");
    let second = agent.on_surface_changed().unwrap();
    first.await.unwrap();
    second.await.unwrap();

    let goals: Vec<_> = backend.requests().into_iter().map(|r| r.user_goal).collect();
    assert_eq!(goals, vec![FLIGHT_GOAL.to_string(), "Find a hotel in London".to_string()]);
}

// =========================================================================
// Trace log
// =========================================================================

#[tokio::test]
async fn every_finished_event_is_traced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.jsonl");

    let surface = Arc::new(MemorySurface::from_root(flight_search_screen()));
    let backend = Arc::new(
        MockPlanBackend::with_plan(Plan::new(vec![
            ActionStep::fill("from_field", "NYC"),
            ActionStep::new("wiggle").with_param("resource_id", "to_field"),
        ]))
        .then_reply(MockReply::Fail("bad gateway".into()), Duration::ZERO),
    );
    let agent = Arc::new(
        Orchestrator::new(
            &config_with_policy(StalePlanPolicy::Apply),
            surface,
            backend,
        )
        .with_tracer(Arc::new(TraceLogger::new(&path))),
    );
    assert!(path.exists());

    agent.on_surface_changed().unwrap().await.unwrap();
    agent.on_surface_changed().unwrap().await.unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<serde_json::Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);

    assert_eq!(lines[0]["generation"], 1);
    assert_eq!(lines[0]["outcome"], "plan_failed");
    assert!(lines[0]["error"].as_str().unwrap().contains("bad gateway"));
    assert_eq!(lines[0]["element_count"], 4);
    assert_eq!(lines[0]["snapshot_fingerprint"].as_str().unwrap().len(), 40);

    assert_eq!(lines[1]["outcome"], "applied");
    assert_eq!(lines[1]["steps"][0]["outcome"], "applied");
    assert_eq!(lines[1]["steps"][1]["outcome"], "skipped");
    assert_eq!(
        lines[1]["steps"][1]["reason"]["unrecognized_action"],
        "wiggle"
    );
}
