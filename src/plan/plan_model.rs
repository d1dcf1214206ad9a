use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub const RESOURCE_ID_KEY: &str = "resource_id";
pub const TEXT_KEY: &str = "text";

pub const TAP: &str = "tap";
pub const FILL: &str = "fill";

// ============================================================================
// Request side
// ============================================================================

/// One addressable unit of the surface, as sent to the planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub element_id: String,
    pub text: Option<String>,
    pub description: Option<String>,
    pub resource_id: Option<String>,
}

/// Wire name: `screenContext`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub app_name: String,
    pub elements: Vec<Element>,
}

impl Snapshot {
    /// SHA-1 over the serialized snapshot, for correlating trace records.
    pub fn fingerprint(&self) -> String {
        use sha1::{Digest, Sha1};

        let bytes = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = Sha1::new();
        hasher.update(&bytes);
        format!("{:x}", hasher.finalize())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub user_goal: String,
    pub screen_context: Snapshot,
}

impl PlanRequest {
    pub fn new(goal: &str, snapshot: Snapshot) -> Self {
        Self {
            user_goal: goal.to_string(),
            screen_context: snapshot,
        }
    }
}

// ============================================================================
// Response side
// ============================================================================

/// One step as the planner sent it. `action` is an open tag; unknown tags are
/// kept and ignored by the interpreter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionStep {
    pub action: String,

    /// Wire name: `target`. A missing or null target decodes as empty.
    #[serde(rename = "target", default, deserialize_with = "null_as_empty")]
    pub parameters: Map<String, Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl ActionStep {
    pub fn new(action: &str) -> Self {
        Self {
            action: action.to_string(),
            parameters: Map::new(),
        }
    }

    pub fn tap(resource_id: &str) -> Self {
        Self::new(TAP).with_param(RESOURCE_ID_KEY, resource_id)
    }

    pub fn fill(resource_id: &str, text: &str) -> Self {
        Self::new(FILL)
            .with_param(RESOURCE_ID_KEY, resource_id)
            .with_param(TEXT_KEY, text)
    }

    pub fn with_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }

    fn string_param(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(Value::as_str)
    }
}

/// Ordered steps answering one snapshot. Wire shape: `{ "steps": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub steps: Vec<ActionStep>,
}

impl Plan {
    pub fn new(steps: Vec<ActionStep>) -> Self {
        Self { steps }
    }
}

// ============================================================================
// Typed actions
// ============================================================================

/// Why a step produced no primitive call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// `resource_id` absent or not a string.
    MissingResourceId,
    /// Tag this agent does not know; kept for forward compatibility.
    UnrecognizedAction(String),
    /// No live element carries the identifier.
    NoMatchingElement,
}

/// A step decoded from the open wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanAction {
    Tap { resource_id: String },
    Fill { resource_id: String, text: String },
    Unknown { action: String, resource_id: String },
}

impl PlanAction {
    pub fn decode(step: &ActionStep) -> Result<PlanAction, SkipReason> {
        let resource_id = step
            .string_param(RESOURCE_ID_KEY)
            .ok_or(SkipReason::MissingResourceId)?
            .to_string();

        let action = match step.action.as_str() {
            TAP => PlanAction::Tap { resource_id },
            FILL => PlanAction::Fill {
                resource_id,
                text: step.string_param(TEXT_KEY).unwrap_or_default().to_string(),
            },
            other => PlanAction::Unknown {
                action: other.to_string(),
                resource_id,
            },
        };

        Ok(action)
    }

    pub fn resource_id(&self) -> &str {
        match self {
            PlanAction::Tap { resource_id }
            | PlanAction::Fill { resource_id, .. }
            | PlanAction::Unknown { resource_id, .. } => resource_id,
        }
    }
}

impl TryFrom<&ActionStep> for PlanAction {
    type Error = SkipReason;

    fn try_from(step: &ActionStep) -> Result<Self, Self::Error> {
        PlanAction::decode(step)
    }
}
