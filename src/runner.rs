//! Scenario execution: provider + context + policy + page, one run at a time.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use meshpilot_core_types::{AgentKind, FlowPolicy, RunId, SessionProvider, WorkflowContext, WorkflowEnd};
use meshpilot_scenario_data::{CsvProvider, RowProvider};
use meshpilot_workflows::workflow_for;

use crate::rehearsal;

/// Outcome of one workflow invocation, for printing and exit-code mapping.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub agent: AgentKind,
    pub sno: String,
    pub end: WorkflowEnd,
}

/// Run one scenario row through its agent's state machine.
///
/// Rehearsal runs use the scripted page and the tight rehearsal budgets so a
/// scenario file can be validated offline in seconds.
pub async fn run_scenario(
    agent: AgentKind,
    sno: &str,
    data: &Path,
    rehearse: bool,
) -> Result<RunReport> {
    let provider = CsvProvider::from_path(data)
        .with_context(|| format!("loading scenario data from {}", data.display()))?;
    let row = provider
        .get_row(sno)
        .with_context(|| format!("looking up scenario '{sno}'"))?;
    debug!(
        sno,
        fields = ?row.field_names().collect::<Vec<_>>(),
        "scenario row loaded"
    );

    let session = SessionProvider::ephemeral();
    let ctx = WorkflowContext::for_agent(agent);
    let run_id = RunId::new();
    info!(
        %run_id,
        agent = %agent,
        sno,
        storage_state = ?session.storage_state(),
        "starting workflow run"
    );

    if !rehearse {
        bail!(
            "no live page adapter is configured in this build; \
             rerun with --rehearse to drive the scripted page"
        );
    }

    let policy = FlowPolicy::rehearsal();
    let page = rehearsal::scripted_page(agent, &row);
    let end = workflow_for(agent).run(&page, &ctx, &row, &policy).await?;
    info!(%run_id, end = %end, "workflow run finished");

    Ok(RunReport {
        run_id,
        agent,
        sno: sno.to_string(),
        end,
    })
}

/// All scenario keys a data file can serve, in stable order.
pub fn list_scenarios(data: &Path) -> Result<Vec<String>> {
    let provider = CsvProvider::from_path(data)
        .with_context(|| format!("loading scenario data from {}", data.display()))?;
    Ok(provider.available_keys())
}
