use std::sync::Arc;

use surface_planner::{
    agent::{agent::Orchestrator, agent_model::{AgentConfig, StalePlanPolicy}},
    plan::client::PlanBackend,
    surface::memory::{MemorySurface, NodeSpec},
};

pub const FLIGHT_GOAL: &str = "Book a flight from NYC to London";

pub fn root_with(children: Vec<NodeSpec>) -> NodeSpec {
    let mut root = NodeSpec::with_id("root");
    root.children = children;
    root
}

/// Flight search screen: two fields, a button, and an unlabelled banner.
pub fn flight_search_screen() -> NodeSpec {
    root_with(vec![
        NodeSpec::with_id("from_field").description("From"),
        NodeSpec::with_id("to_field").description("To"),
        NodeSpec::with_id("search_button").text("Search"),
        NodeSpec::new().text("Cheap flights today"),
    ])
}

pub fn config_with_policy(stale_policy: StalePlanPolicy) -> AgentConfig {
    AgentConfig {
        goal: FLIGHT_GOAL.to_string(),
        stale_policy,
        ..AgentConfig::default()
    }
}

pub fn orchestrator(
    surface: Arc<MemorySurface>,
    backend: Arc<dyn PlanBackend>,
    stale_policy: StalePlanPolicy,
) -> Arc<Orchestrator> {
    Arc::new(Orchestrator::new(
        &config_with_policy(stale_policy),
        surface,
        backend,
    ))
}
