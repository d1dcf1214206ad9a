use thiserror::Error;

/// Failure of a primitive operation on a single live element.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("Element is detached from the surface: {0}")]
    Detached(String),

    #[error("Element is not enabled: {0}")]
    NotEnabled(String),

    #[error("Platform error: {0}")]
    Platform(String),
}

/// The surface could not be read for this event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Surface root is unavailable")]
    RootUnavailable,
}

/// Any failure between sending a plan request and holding a decoded plan.
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Failed to build planner client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Planner request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Planner returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed plan response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Planner unavailable: {0}")]
    Unavailable(String),
}

/// Setup and command-line failures. Nothing on the event path returns this.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid surface fixture {path}: {source}")]
    Fixture {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid plan file {path}: {source}")]
    PlanFile {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON serialize error ({context}): {source}")]
    JsonSerialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("Event task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
