use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{
    agent::agent_model::EventOutcome,
    interpreter::report_model::StepRecord,
    plan::plan_model::PlanRequest,
};

/// One JSONL line per finished event.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub generation: u64,

    pub goal: String,
    pub app_name: String,
    pub snapshot_fingerprint: String,
    pub element_count: usize,

    pub outcome: String,
    pub stale: bool,
    pub latest_generation: Option<u64>,
    pub error: Option<String>,

    pub steps: Vec<StepRecord>,
}

impl TraceEvent {
    pub fn now(generation: u64, request: &PlanRequest) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            generation,
            goal: request.user_goal.clone(),
            app_name: request.screen_context.app_name.clone(),
            snapshot_fingerprint: request.screen_context.fingerprint(),
            element_count: request.screen_context.elements.len(),
            outcome: String::new(),
            stale: false,
            latest_generation: None,
            error: None,
            steps: vec![],
        }
    }

    pub fn with_outcome(mut self, outcome: &EventOutcome) -> Self {
        self.outcome = outcome.kind().to_string();
        match outcome {
            EventOutcome::Applied { stale, report, .. } => {
                self.stale = *stale;
                self.steps = report.steps.clone();
            }
            EventOutcome::Stale { latest, .. } => {
                self.stale = true;
                self.latest_generation = Some(*latest);
            }
            EventOutcome::PlanFailed { error, .. } => {
                self.error = Some(error.to_string());
            }
        }
        self
    }
}
