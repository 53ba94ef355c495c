use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use meshpilot_core_types::AgentKind;
use meshpilot_cli::{list_scenarios, run_scenario};

/// Drive Qube Mesh agent workflows from scenario data.
#[derive(Parser)]
#[command(name = "meshpilot", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one scenario through its agent's state machine.
    Run {
        /// Agent to drive, e.g. `contract-termination`.
        #[arg(long)]
        agent: String,
        /// Scenario key within the data file.
        #[arg(long)]
        sno: String,
        /// Scenario data file (CSV).
        #[arg(long)]
        data: PathBuf,
        /// Drive the scripted rehearsal page instead of a live browser.
        #[arg(long)]
        rehearse: bool,
        /// Print the full run report as JSON instead of just the end state.
        #[arg(long)]
        json: bool,
    },
    /// List the scenario keys a data file can serve.
    List {
        /// Scenario data file (CSV).
        #[arg(long)]
        data: PathBuf,
    },
}

fn parse_agent(slug: &str) -> Result<AgentKind> {
    AgentKind::from_slug(slug).ok_or_else(|| {
        let known: Vec<&str> = AgentKind::all().iter().map(|k| k.slug()).collect();
        anyhow!("unknown agent '{slug}'; expected one of: {}", known.join(", "))
    })
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run {
            agent,
            sno,
            data,
            rehearse,
            json,
        } => {
            let agent = parse_agent(&agent)?;
            let report = run_scenario(agent, &sno, &data, rehearse).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.end);
            }
        }
        Command::List { data } => {
            for key in list_scenarios(&data)? {
                println!("{key}");
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
