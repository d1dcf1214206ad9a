use clap::Parser;
use surface_planner::cli::commands::{RunOptions, cmd_run, cmd_snapshot};
use surface_planner::cli::config::{Cli, Commands, Overrides, build_agent_config, load_config};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("surface_planner={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(cli.config.as_deref());

    match cli.command {
        Commands::Snapshot { surface, goal } => {
            let overrides = Overrides {
                goal: goal.as_deref(),
                endpoint: cli.endpoint.as_deref(),
                timeout_ms: cli.timeout_ms,
                stale_policy: None,
            };
            let agent_config = build_agent_config(&config, &overrides)?;
            println!("{}", cmd_snapshot(&surface, &agent_config)?);
        }
        Commands::Run {
            surface,
            goal,
            planner,
            mock_plan,
            events,
            stale_policy,
            trace,
        } => {
            let overrides = Overrides {
                goal: goal.as_deref(),
                endpoint: cli.endpoint.as_deref(),
                timeout_ms: cli.timeout_ms,
                stale_policy: stale_policy.as_deref(),
            };
            let agent_config = build_agent_config(&config, &overrides)?;

            // CLI > config file for the trace path
            let trace_path = trace.as_deref().or(config.trace.path.as_deref());

            let options = RunOptions {
                surface_path: &surface,
                planner: &planner,
                mock_plan: mock_plan.as_deref(),
                events,
                trace_path,
            };
            print!("{}", cmd_run(&options, &agent_config).await?);
        }
    }

    Ok(())
}
