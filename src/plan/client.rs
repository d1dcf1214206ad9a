use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::agent::error::PlanError;
use crate::plan::plan_model::{Plan, PlanRequest};

pub const PLAN_PATH: &str = "plan";

/// Remote planning service: goal + snapshot in, ordered steps out.
#[async_trait]
pub trait PlanBackend: Send + Sync {
    async fn request_plan(&self, request: &PlanRequest) -> Result<Plan, PlanError>;
}

// ============================================================================
// HTTP backend
// ============================================================================

/// `{base}/plan` regardless of whether the base ends in a slash.
pub fn plan_url(base_url: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), PLAN_PATH)
}

/// One POST per request, no retry. The inner `reqwest::Client` pools
/// connections and is shared by every event task.
pub struct HttpPlanClient {
    client: reqwest::Client,
    plan_url: String,
}

impl HttpPlanClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, PlanError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(PlanError::Client)?;

        Ok(Self {
            client,
            plan_url: plan_url(base_url),
        })
    }

    pub fn plan_url(&self) -> &str {
        &self.plan_url
    }
}

#[async_trait]
impl PlanBackend for HttpPlanClient {
    async fn request_plan(&self, request: &PlanRequest) -> Result<Plan, PlanError> {
        debug!(
            url = %self.plan_url,
            elements = request.screen_context.elements.len(),
            "requesting plan"
        );

        let response = self
            .client
            .post(&self.plan_url)
            .json(request)
            .send()
            .await
            .map_err(PlanError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlanError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await.map_err(PlanError::Transport)?;
        let plan: Plan = serde_json::from_slice(&body).map_err(PlanError::Decode)?;

        debug!(steps = plan.steps.len(), "received plan");
        Ok(plan)
    }
}

// ============================================================================
// Mock backend (for testing without a planner)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    Plan(Plan),
    Fail(String),
}

/// Canned planner. Scripted replies are consumed in request-arrival order;
/// after that every request gets the default reply.
pub struct MockPlanBackend {
    default_reply: MockReply,
    scripted: Mutex<VecDeque<(MockReply, Duration)>>,
    requests: Mutex<Vec<PlanRequest>>,
}

impl MockPlanBackend {
    pub fn new(reply: MockReply) -> Self {
        Self {
            default_reply: reply,
            scripted: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_plan(plan: Plan) -> Self {
        Self::new(MockReply::Plan(plan))
    }

    pub fn failing(message: &str) -> Self {
        Self::new(MockReply::Fail(message.to_string()))
    }

    /// Queue a one-shot reply ahead of the default one.
    pub fn then_reply(self, reply: MockReply, delay: Duration) -> Self {
        self.scripted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back((reply, delay));
        self
    }

    /// Requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<PlanRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl PlanBackend for MockPlanBackend {
    async fn request_plan(&self, request: &PlanRequest) -> Result<Plan, PlanError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let (reply, delay) = self
            .scripted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| (self.default_reply.clone(), Duration::ZERO));

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match reply {
            MockReply::Plan(plan) => Ok(plan),
            MockReply::Fail(message) => Err(PlanError::Unavailable(message)),
        }
    }
}
