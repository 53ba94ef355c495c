//! Contract Amendment.
//!
//! Proceed with Request, confirm the supplier discussion in free text, pick
//! the amendment reason from a streamed dropdown, describe the amendment,
//! answer up to two conditional questions, then Create Request.

use async_trait::async_trait;
use tracing::{debug, info};

use meshpilot_core_types::row::fields;
use meshpilot_core_types::{
    AgentKind, FlowError, FlowPolicy, ScenarioRow, WorkflowContext, WorkflowEnd,
};
use meshpilot_finalizer::finalize;
use meshpilot_intent_resolver::Intent;
use meshpilot_page_port::PagePort;

use crate::steps::StepCtx;
use crate::Workflow;

const NAME: &str = "contract-amendment";
const REASON_DROPDOWN: &str = "Amendment Reason";

/// Row phrasing mapped to the dropdown's canonical captions.
const REASON_KEYWORDS: &[(&str, &str)] = &[
    ("price", "Pricing Change"),
    ("pricing", "Pricing Change"),
    ("cost", "Pricing Change"),
    ("scope", "Scope Change"),
    ("duration", "Duration Change"),
    ("extend", "Duration Change"),
    ("term", "Terms and Conditions"),
    ("volume", "Volume Change"),
];

/// Positional fallback: the second entry, where this build keeps its
/// general-purpose amendment reason.
const REASON_FALLBACK_INDEX: usize = 1;

pub struct ContractAmendment;

#[async_trait]
impl Workflow for ContractAmendment {
    fn agent(&self) -> AgentKind {
        AgentKind::ContractAmendment
    }

    async fn run(
        &self,
        page: &dyn PagePort,
        ctx: &WorkflowContext,
        row: &ScenarioRow,
        policy: &FlowPolicy,
    ) -> Result<WorkflowEnd, FlowError> {
        info!(agent = %ctx.agent_name, sno = %row.sno, "starting contract amendment");
        let mut step = StepCtx::new(page, policy, NAME);
        let t = &policy.timeouts;

        step.submit_prompt(row.require(fields::QUERY)?).await?;
        step.click_required(&Intent::ProceedWithRequest, t.prompt()).await?;
        step.confirm_discussion().await?;

        step.open_dropdown(REASON_DROPDOWN).await?;
        let wanted = row.require(fields::AMENDMENT_REASON)?;
        let tier = step
            .select_reason(wanted, REASON_KEYWORDS, REASON_FALLBACK_INDEX, t.control())
            .await?;
        debug!(wanted, ?tier, "amendment reason selected");
        step.close_dropdown().await;

        step.click_required(&Intent::Proceed, t.control()).await?;
        step.submit_prompt(row.require(fields::DESCRIPTION)?).await?;
        step.answer_questions(row).await;
        step.click_required(&Intent::CreateRequest, t.prompt()).await?;
        finalize(&step.resolver, t.end()).await
    }
}
