use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::agent::error::PlanError;
use crate::interpreter::report_model::ExecutionReport;

pub const DEFAULT_GOAL: &str = "Book a flight from NYC to London";
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// What to do with a plan whose event has been superseded by a newer one
/// by the time the planner answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StalePlanPolicy {
    /// Apply it anyway; only log the staleness.
    #[default]
    Apply,
    /// Drop it without touching the surface.
    Discard,
}

impl FromStr for StalePlanPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "apply" => Ok(StalePlanPolicy::Apply),
            "discard" => Ok(StalePlanPolicy::Discard),
            other => Err(format!(
                "unknown stale plan policy '{}' (expected apply or discard)",
                other
            )),
        }
    }
}

/// Runtime settings for one orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    pub goal: String,
    pub endpoint: String,
    /// Used when the surface cannot name its own app.
    pub app_name: Option<String>,
    pub request_timeout: Duration,
    pub stale_policy: StalePlanPolicy,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            goal: DEFAULT_GOAL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            app_name: None,
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            stale_policy: StalePlanPolicy::default(),
        }
    }
}

/// Result of one surface-changed event once its task has finished.
#[derive(Debug)]
pub enum EventOutcome {
    /// The plan ran. `stale` is set when a newer event had been dispatched
    /// before the plan arrived.
    Applied {
        generation: u64,
        stale: bool,
        report: ExecutionReport,
    },
    /// The plan arrived after a newer event and was dropped.
    Stale { generation: u64, latest: u64 },
    /// No plan: the request or its decoding failed.
    PlanFailed { generation: u64, error: PlanError },
}

impl EventOutcome {
    pub fn generation(&self) -> u64 {
        match self {
            EventOutcome::Applied { generation, .. }
            | EventOutcome::Stale { generation, .. }
            | EventOutcome::PlanFailed { generation, .. } => *generation,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            EventOutcome::Applied { .. } => "applied",
            EventOutcome::Stale { .. } => "stale",
            EventOutcome::PlanFailed { .. } => "plan_failed",
        }
    }
}
