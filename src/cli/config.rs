use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::agent::agent_model::{
    AgentConfig, DEFAULT_ENDPOINT, DEFAULT_GOAL, DEFAULT_TIMEOUT_MS, StalePlanPolicy,
};
use crate::agent::error::AgentError;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "surface-planner",
    version,
    about = "Executes remotely planned actions against an element surface"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Planner base URL (the request goes to <endpoint>/plan)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Planner request timeout in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Path to config file (default: surface-planner.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the plan request that would be sent for a surface
    Snapshot {
        /// Surface fixture (YAML or JSON)
        #[arg(long)]
        surface: String,

        /// Goal to embed in the request
        #[arg(long)]
        goal: Option<String>,
    },

    /// Dispatch surface-changed events and apply the returned plans
    Run {
        /// Surface fixture (YAML or JSON)
        #[arg(long)]
        surface: String,

        /// Goal sent with every request
        #[arg(long)]
        goal: Option<String>,

        /// Planner: http or mock
        #[arg(long, default_value = "http")]
        planner: String,

        /// Plan JSON returned by the mock planner
        #[arg(long)]
        mock_plan: Option<String>,

        /// Number of back-to-back surface-changed events
        #[arg(long, default_value_t = 1)]
        events: usize,

        /// What to do with plans from superseded events: apply or discard
        #[arg(long)]
        stale_policy: Option<String>,

        /// JSONL trace output path
        #[arg(long)]
        trace: Option<String>,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `surface-planner.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub agent: AgentSection,
    #[serde(default)]
    pub trace: TraceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSection {
    #[serde(default = "default_goal")]
    pub goal: String,

    pub app_name: Option<String>,

    #[serde(default)]
    pub stale_policy: StalePlanPolicy,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            goal: default_goal(),
            app_name: None,
            stale_policy: StalePlanPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceConfig {
    pub path: Option<String>,
}

// Serde default helpers
fn default_endpoint() -> String { DEFAULT_ENDPOINT.to_string() }
fn default_timeout_ms() -> u64 { DEFAULT_TIMEOUT_MS }
fn default_goal() -> String { DEFAULT_GOAL.to_string() }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("surface-planner.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_default(),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// Values given on the command line; each one wins over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides<'a> {
    pub goal: Option<&'a str>,
    pub endpoint: Option<&'a str>,
    pub timeout_ms: Option<u64>,
    pub stale_policy: Option<&'a str>,
}

/// Resolve an AgentConfig: CLI > config file > defaults.
pub fn build_agent_config(
    config: &AppConfig,
    overrides: &Overrides<'_>,
) -> Result<AgentConfig, AgentError> {
    let stale_policy = match overrides.stale_policy {
        Some(raw) => raw.parse().map_err(AgentError::Config)?,
        None => config.agent.stale_policy,
    };

    let goal = overrides.goal.unwrap_or(&config.agent.goal);
    if goal.trim().is_empty() {
        return Err(AgentError::Config("goal must not be empty".into()));
    }

    Ok(AgentConfig {
        goal: goal.to_string(),
        endpoint: overrides
            .endpoint
            .unwrap_or(&config.planner.endpoint)
            .to_string(),
        app_name: config.agent.app_name.clone(),
        request_timeout: Duration::from_millis(
            overrides.timeout_ms.unwrap_or(config.planner.timeout_ms),
        ),
        stale_policy,
    })
}
