use std::sync::Arc;

use tracing::{info, warn};

use crate::agent::agent::Orchestrator;
use crate::agent::agent_model::{AgentConfig, EventOutcome};
use crate::agent::error::AgentError;
use crate::interpreter::report_model::{ExecutionReport, StepOutcome};
use crate::plan::client::{HttpPlanClient, MockPlanBackend, PlanBackend};
use crate::plan::plan_model::Plan;
use crate::surface::memory::MemorySurface;
use crate::trace::logger::TraceLogger;

// ============================================================================
// snapshot subcommand
// ============================================================================

/// Render the request body for the surface in `surface_path`.
pub fn cmd_snapshot(surface_path: &str, config: &AgentConfig) -> Result<String, AgentError> {
    let surface = load_surface(surface_path)?;
    let orchestrator = Orchestrator::new(
        config,
        Arc::new(surface),
        Arc::new(MockPlanBackend::with_plan(Plan::default())),
    );

    let (request, _root) = orchestrator.prepare()?;
    serde_json::to_string_pretty(&request).map_err(|e| AgentError::JsonSerialize {
        context: "PlanRequest".into(),
        source: e,
    })
}

// ============================================================================
// run subcommand
// ============================================================================

/// Options for `run` that do not belong in AgentConfig.
#[derive(Debug, Clone)]
pub struct RunOptions<'a> {
    pub surface_path: &'a str,
    pub planner: &'a str,
    pub mock_plan: Option<&'a str>,
    pub events: usize,
    pub trace_path: Option<&'a str>,
}

/// Dispatch `events` surface-changed notifications back to back, wait for
/// every task, and return the text summary.
pub async fn cmd_run(options: &RunOptions<'_>, config: &AgentConfig) -> Result<String, AgentError> {
    let surface = Arc::new(load_surface(options.surface_path)?);
    let backend = build_backend(options.planner, options.mock_plan, config)?;

    let tracer = match options.trace_path {
        Some(path) => Arc::new(TraceLogger::new(path)),
        None => Arc::new(TraceLogger::disabled()),
    };

    let orchestrator = Arc::new(
        Orchestrator::new(config, surface.clone(), backend).with_tracer(tracer),
    );

    let mut handles = Vec::with_capacity(options.events);
    for _ in 0..options.events {
        match orchestrator.on_surface_changed() {
            Ok(handle) => handles.push(handle),
            Err(e) => warn!(error = %e, "surface event abandoned"),
        }
    }
    info!(dispatched = handles.len(), "waiting for event tasks");

    let mut outcomes = Vec::with_capacity(handles.len());
    for handle in handles {
        outcomes.push(handle.await?);
    }
    outcomes.sort_by_key(EventOutcome::generation);

    let mut out = String::new();
    for outcome in &outcomes {
        out.push_str(&format_outcome(outcome));
    }

    let calls = surface.calls();
    out.push_str(&format!("Primitive calls: {}\n", calls.len()));
    for call in &calls {
        out.push_str(&format!(
            "  #{} {} {:?}\n",
            call.serial,
            call.element_id.as_deref().unwrap_or("<no id>"),
            call.primitive
        ));
    }

    Ok(out)
}

// ============================================================================
// Helpers
// ============================================================================

/// Load a surface fixture. YAML is a superset of JSON, so both work.
pub fn load_surface(path: &str) -> Result<MemorySurface, AgentError> {
    let content = std::fs::read_to_string(path).map_err(|e| AgentError::Io {
        path: path.to_string(),
        source: e,
    })?;

    MemorySurface::from_yaml_str(&content).map_err(|e| AgentError::Fixture {
        path: path.to_string(),
        source: e,
    })
}

/// Load a plan in the planner's response format.
pub fn load_plan(path: &str) -> Result<Plan, AgentError> {
    let content = std::fs::read_to_string(path).map_err(|e| AgentError::Io {
        path: path.to_string(),
        source: e,
    })?;

    serde_json::from_str(&content).map_err(|e| AgentError::PlanFile {
        path: path.to_string(),
        source: e,
    })
}

/// Build the appropriate PlanBackend based on name.
fn build_backend(
    name: &str,
    mock_plan: Option<&str>,
    config: &AgentConfig,
) -> Result<Arc<dyn PlanBackend>, AgentError> {
    match name {
        "mock" => {
            let plan = match mock_plan {
                Some(path) => load_plan(path)?,
                None => Plan::default(),
            };
            Ok(Arc::new(MockPlanBackend::with_plan(plan)))
        }
        "http" => {
            let client = HttpPlanClient::new(&config.endpoint, config.request_timeout)?;
            Ok(Arc::new(client))
        }
        other => Err(AgentError::Config(format!(
            "unknown planner '{}' (expected http or mock)",
            other
        ))),
    }
}

pub fn format_outcome(outcome: &EventOutcome) -> String {
    match outcome {
        EventOutcome::Applied {
            generation,
            stale,
            report,
        } => {
            let mut out = format!(
                "Event {}: applied {} of {} steps{}\n",
                generation,
                report.applied_count(),
                report.steps.len(),
                if *stale { " (stale)" } else { "" }
            );
            out.push_str(&format_report(report));
            out
        }
        EventOutcome::Stale { generation, latest } => format!(
            "Event {}: plan discarded, superseded by event {}\n",
            generation, latest
        ),
        EventOutcome::PlanFailed { generation, error } => {
            format!("Event {}: no plan ({})\n", generation, error)
        }
    }
}

pub fn format_report(report: &ExecutionReport) -> String {
    let mut out = String::new();
    for step in &report.steps {
        let detail = match &step.outcome {
            StepOutcome::Applied { matched, failed } if *failed > 0 => {
                format!("{} matched, {} failed", matched, failed)
            }
            StepOutcome::Applied { matched, .. } => format!("{} matched", matched),
            StepOutcome::Skipped { reason } => format!("skipped: {:?}", reason),
        };
        out.push_str(&format!("  [{}] {}: {}\n", step.index, step.action, detail));
    }
    out
}
