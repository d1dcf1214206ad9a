//! Remote-plan execution agent.
//!
//! A surface-changed event is turned into a snapshot of the surface's top-level
//! elements, sent with the current goal to a planning service, and the ordered
//! steps it returns are applied to the live surface.

pub mod agent;
pub mod cli;
pub mod interpreter;
pub mod plan;
pub mod surface;
pub mod trace;

pub use agent::agent::Orchestrator;
pub use agent::agent_model::{AgentConfig, EventOutcome, StalePlanPolicy};
pub use agent::error::{AgentError, ExtractError, PlanError, SurfaceError};
pub use interpreter::interpreter::{apply_plan, apply_step};
pub use plan::client::{HttpPlanClient, MockPlanBackend, MockReply, PlanBackend};
pub use plan::plan_model::{ActionStep, Element, Plan, PlanAction, PlanRequest, SkipReason, Snapshot};
pub use surface::extractor::{extract, extract_snapshot};
pub use surface::surface_model::{Surface, SurfaceElement, SurfaceElementImpl};
