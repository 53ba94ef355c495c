//! Supplier Offboarding.
//!
//! After the opening prompt the app lands in one of three confirmation
//! variants, depending on how precisely the query pinned the supplier down:
//! a selectable grid, a direct confirmation card, or an identification-number
//! lookup. All three converge on the proceed step, the reason buttons and
//! Create Request.

use async_trait::async_trait;
use tracing::{debug, info};

use meshpilot_core_types::row::fields;
use meshpilot_core_types::{
    AgentKind, FlowError, FlowPolicy, ScenarioRow, WorkflowContext, WorkflowEnd,
};
use meshpilot_finalizer::finalize;
use meshpilot_intent_resolver::Intent;
use meshpilot_page_port::{ElementQuery, ElementRef, PagePort, TextMatch};
use meshpilot_ui_actions::{submit_text, wait_any};

use crate::steps::StepCtx;
use crate::Workflow;

const NAME: &str = "supplier-offboarding";

/// How the app asked for supplier confirmation on this run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Confirmation {
    Grid,
    Card,
    IdLookup,
}

pub struct SupplierOffboarding;

#[async_trait]
impl Workflow for SupplierOffboarding {
    fn agent(&self) -> AgentKind {
        AgentKind::SupplierOffboarding
    }

    async fn run(
        &self,
        page: &dyn PagePort,
        ctx: &WorkflowContext,
        row: &ScenarioRow,
        policy: &FlowPolicy,
    ) -> Result<WorkflowEnd, FlowError> {
        info!(agent = %ctx.agent_name, sno = %row.sno, "starting supplier offboarding");
        let mut step = StepCtx::new(page, policy, NAME);
        let t = &policy.timeouts;

        step.submit_prompt(row.require(fields::QUERY)?).await?;

        match wait_confirmation(&step, row).await? {
            (Confirmation::Grid, _) => select_grid_row(&mut step, row).await?,
            (Confirmation::Card, _) => debug!("direct confirmation card; nothing to select"),
            (Confirmation::IdLookup, lookup_box) => {
                let id = row.require(fields::IDENTIFICATION_NUMBER)?;
                submit_text(page, &lookup_box, id)
                    .await
                    .map_err(|err| FlowError::Page(err.to_string()))?;
                step.heartbeat().await;
                // The lookup narrows to a grid or a card; a grid still needs
                // a row ticked.
                if step
                    .resolver
                    .try_resolve(&Intent::GridRowCheckbox { row_text: None }, t.optional())
                    .await
                    .is_some()
                {
                    select_grid_row(&mut step, row).await?;
                }
            }
        }

        // Whichever proceed control this variant renders.
        match step
            .race(&[Intent::ProceedWithRequest, Intent::Proceed], t.prompt())
            .await
        {
            Some((_, el)) => step.click_found(&el, "proceed control").await?,
            None => return Err(step.required_missing("a proceed control").await),
        }

        step.click_reason_button(row.require(fields::OFFBOARD_REASON)?, t.prompt())
            .await?;
        step.click_required(&Intent::CreateRequest, t.prompt()).await?;
        finalize(&step.resolver, t.end()).await
    }
}

/// Race the three confirmation variants; the grid takes priority when more
/// than one is on screen.
async fn wait_confirmation(
    step: &StepCtx<'_>,
    row: &ScenarioRow,
) -> Result<(Confirmation, ElementRef), FlowError> {
    use TextMatch::{Contains, Pattern};

    let mut variants = Vec::new();
    let mut queries = Vec::new();
    let grid = Intent::GridRowCheckbox {
        row_text: row.get(fields::SUPPLIER_NAME).map(str::to_string),
    };
    for q in grid.candidates() {
        variants.push(Confirmation::Grid);
        queries.push(q);
    }
    for q in [
        ElementQuery::text(Pattern(r"(?:do you want|would you like) to proceed".into())),
        ElementQuery::text(Contains("confirm the supplier".into())),
    ] {
        variants.push(Confirmation::Card);
        queries.push(q);
    }
    for q in [
        ElementQuery::role("textbox", Contains("identification".into())),
        ElementQuery::css("[data-identification-number]"),
    ] {
        variants.push(Confirmation::IdLookup);
        queries.push(q);
    }

    match wait_any(
        step.page,
        &queries,
        step.policy.timeouts.prompt(),
        step.policy.timeouts.poll(),
    )
    .await
    {
        Some((index, el)) => {
            debug!(variant = ?variants[index], "supplier confirmation variant detected");
            Ok((variants[index], el))
        }
        None => Err(step
            .required_missing("supplier confirmation (grid, card or id lookup)")
            .await),
    }
}

async fn select_grid_row(step: &mut StepCtx<'_>, row: &ScenarioRow) -> Result<(), FlowError> {
    let checkbox = Intent::GridRowCheckbox {
        row_text: row.get(fields::SUPPLIER_NAME).map(str::to_string),
    };
    let timeout = step.policy.timeouts.control();
    step.click_required(&checkbox, timeout).await
}
