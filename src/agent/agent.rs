use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::{
    agent::{
        agent_model::{AgentConfig, EventOutcome, StalePlanPolicy},
        error::ExtractError,
    },
    interpreter::interpreter::apply_plan,
    plan::{
        client::PlanBackend,
        plan_model::PlanRequest,
    },
    surface::{
        extractor::extract,
        surface_model::{Surface, SurfaceElement},
    },
    trace::{logger::TraceLogger, trace::TraceEvent},
};

/// Wires surface-changed events to plan requests and interpreter passes.
///
/// Every event becomes its own task; tasks are never merged, serialized, or
/// cancelled. Each carries a generation number so a late plan can be
/// recognized as stale.
pub struct Orchestrator {
    surface: Arc<dyn Surface>,
    backend: Arc<dyn PlanBackend>,
    goal: RwLock<String>,
    app_name: Option<String>,
    stale_policy: StalePlanPolicy,
    generation: AtomicU64,
    tracer: Arc<TraceLogger>,
}

impl Orchestrator {
    pub fn new(
        config: &AgentConfig,
        surface: Arc<dyn Surface>,
        backend: Arc<dyn PlanBackend>,
    ) -> Self {
        Self {
            surface,
            backend,
            goal: RwLock::new(config.goal.clone()),
            app_name: config.app_name.clone(),
            stale_policy: config.stale_policy,
            generation: AtomicU64::new(0),
            tracer: Arc::new(TraceLogger::disabled()),
        }
    }

    pub fn with_tracer(mut self, tracer: Arc<TraceLogger>) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn goal(&self) -> String {
        self.goal
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the goal for events dispatched from now on. Tasks already in
    /// flight keep the goal they were dispatched with.
    pub fn set_goal(&self, goal: &str) {
        *self.goal.write().unwrap_or_else(PoisonError::into_inner) = goal.to_string();
    }

    /// Generation of the most recently dispatched event (0 before the first).
    pub fn latest_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Handle one surface-changed notification.
    ///
    /// Extraction runs on the caller's path; the planner call and the
    /// interpreter pass run on a spawned task so the caller never waits on
    /// the network. Must be called from within a Tokio runtime.
    ///
    /// Returns `Err` only when there is no surface to read; the event is
    /// then abandoned and nothing is sent.
    pub fn on_surface_changed(
        self: &Arc<Self>,
    ) -> Result<JoinHandle<EventOutcome>, ExtractError> {
        let (request, root) = self.prepare()?;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let this = Arc::clone(self);
        Ok(tokio::spawn(async move {
            this.run_event(generation, request, root).await
        }))
    }

    /// Extract the surface and build the request that goes with it.
    pub fn prepare(&self) -> Result<(PlanRequest, SurfaceElement), ExtractError> {
        let (root, snapshot) = extract(self.surface.as_ref(), self.app_name.as_deref())
            .inspect_err(|e| debug!(error = %e, "abandoning surface event"))?;

        Ok((PlanRequest::new(&self.goal(), snapshot), root))
    }

    /// Request a plan for `request` and apply it to `root`.
    #[instrument(level = "debug", skip(self, request, root))]
    pub async fn run_event(
        &self,
        generation: u64,
        request: PlanRequest,
        root: SurfaceElement,
    ) -> EventOutcome {
        let outcome = match self.backend.request_plan(&request).await {
            Err(error) => {
                warn!(error = %error, "dropping plan");
                EventOutcome::PlanFailed { generation, error }
            }
            Ok(plan) => {
                let latest = self.latest_generation();
                let stale = latest > generation;

                match (stale, self.stale_policy) {
                    (true, StalePlanPolicy::Discard) => {
                        info!(latest, "discarding plan from superseded event");
                        EventOutcome::Stale { generation, latest }
                    }
                    _ => {
                        if stale {
                            warn!(latest, "applying plan from superseded event");
                        }
                        let report = apply_plan(&plan, &root);
                        EventOutcome::Applied {
                            generation,
                            stale,
                            report,
                        }
                    }
                }
            }
        };

        self.tracer
            .log(&TraceEvent::now(generation, &request).with_outcome(&outcome));
        outcome
    }
}
