use serde::Serialize;

use crate::plan::plan_model::SkipReason;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    /// The primitive was invoked on every match; `failed` of them reported an error.
    Applied { matched: usize, failed: usize },
    Skipped { reason: SkipReason },
}

impl StepOutcome {
    pub fn skipped(reason: SkipReason) -> Self {
        StepOutcome::Skipped { reason }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, StepOutcome::Applied { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub index: usize,
    pub action: String,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

/// Per-step results of one interpreter pass, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    pub steps: Vec<StepRecord>,
}

impl ExecutionReport {
    pub fn push(&mut self, action: &str, outcome: StepOutcome) {
        self.steps.push(StepRecord {
            index: self.steps.len(),
            action: action.to_string(),
            outcome,
        });
    }

    pub fn applied_count(&self) -> usize {
        self.steps.iter().filter(|s| s.outcome.is_applied()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.steps.len() - self.applied_count()
    }

    /// Total primitive invocations that returned an error.
    pub fn primitive_failures(&self) -> usize {
        self.steps
            .iter()
            .map(|s| match s.outcome {
                StepOutcome::Applied { failed, .. } => failed,
                StepOutcome::Skipped { .. } => 0,
            })
            .sum()
    }

    pub fn outcomes(&self) -> Vec<&StepOutcome> {
        self.steps.iter().map(|s| &s.outcome).collect()
    }
}
