use tracing::{debug, warn};

use crate::agent::error::SurfaceError;
use crate::interpreter::report_model::{ExecutionReport, StepOutcome};
use crate::plan::plan_model::{ActionStep, Plan, PlanAction, SkipReason};
use crate::surface::surface_model::SurfaceElement;

/// Run every step of `plan` against the live tree under `root`, in order.
///
/// A step that cannot be decoded, resolved, or recognized is recorded as
/// skipped and the pass continues with the next one.
pub fn apply_plan(plan: &Plan, root: &SurfaceElement) -> ExecutionReport {
    let mut report = ExecutionReport::default();

    for step in &plan.steps {
        let outcome = apply_step(step, root);
        report.push(&step.action, outcome);
    }

    debug!(
        steps = report.steps.len(),
        applied = report.applied_count(),
        skipped = report.skipped_count(),
        "plan applied"
    );
    report
}

/// Decode one step and dispatch it. Targets are looked up in the live tree
/// now, after any earlier step has already changed it.
pub fn apply_step(step: &ActionStep, root: &SurfaceElement) -> StepOutcome {
    let action = match PlanAction::decode(step) {
        Ok(action) => action,
        Err(reason) => {
            debug!(action = %step.action, ?reason, "skipping step");
            return StepOutcome::skipped(reason);
        }
    };

    match action {
        PlanAction::Tap { resource_id } => {
            invoke_on_matches(root, &resource_id, |element| element.activate())
        }
        PlanAction::Fill { resource_id, text } => {
            invoke_on_matches(root, &resource_id, |element| element.set_text(&text))
        }
        PlanAction::Unknown { action, .. } => {
            debug!(%action, "ignoring unrecognized action");
            StepOutcome::skipped(SkipReason::UnrecognizedAction(action))
        }
    }
}

fn invoke_on_matches<F>(root: &SurfaceElement, resource_id: &str, primitive: F) -> StepOutcome
where
    F: Fn(&SurfaceElement) -> Result<(), SurfaceError>,
{
    let targets = root.find_by_id(resource_id);
    if targets.is_empty() {
        debug!(%resource_id, "no live element matches");
        return StepOutcome::skipped(SkipReason::NoMatchingElement);
    }

    let mut failed = 0;
    for target in &targets {
        if let Err(e) = primitive(target) {
            warn!(%resource_id, error = %e, "primitive operation failed");
            failed += 1;
        }
    }

    StepOutcome::Applied {
        matched: targets.len(),
        failed,
    }
}
