//! Contract Extension.
//!
//! The conversation must surface the right contract before anything is
//! clicked. Then: extension date through the date sub-protocol, reason from
//! a dropdown, the modification radio, optionally a multi-select of
//! applicable options, the discussion confirmation and the conditional
//! questions. The closing summary is the slowest AI step in the app, so the
//! finalizer runs on the extended budget.

use async_trait::async_trait;
use tracing::{debug, info};

use meshpilot_core_types::row::fields;
use meshpilot_core_types::{
    AgentKind, FlowError, FlowPolicy, ScenarioRow, WorkflowContext, WorkflowEnd,
};
use meshpilot_finalizer::finalize;
use meshpilot_intent_resolver::Intent;
use meshpilot_page_port::{ElementQuery, PagePort, TextMatch};
use meshpilot_ui_actions::wait_present;

use crate::dates::{select_date, FlowDate};
use crate::steps::StepCtx;
use crate::Workflow;

const NAME: &str = "contract-extension";
const DATE_LABEL: &str = "Extension Date";
const REASON_DROPDOWN: &str = "Extension Reason";
const OPTIONS_DROPDOWN: &str = "Applicable Options";

const REASON_KEYWORDS: &[(&str, &str)] = &[
    ("market", "Favorable Market Terms"),
    ("performance", "Strong Supplier Performance"),
    ("capacity", "Capacity Requirements"),
    ("continuity", "Business Continuity"),
    ("project", "Ongoing Project Needs"),
    ("need", "Ongoing Project Needs"),
];

const REASON_FALLBACK_INDEX: usize = 0;

pub struct ContractExtension;

#[async_trait]
impl Workflow for ContractExtension {
    fn agent(&self) -> AgentKind {
        AgentKind::ContractExtension
    }

    async fn run(
        &self,
        page: &dyn PagePort,
        ctx: &WorkflowContext,
        row: &ScenarioRow,
        policy: &FlowPolicy,
    ) -> Result<WorkflowEnd, FlowError> {
        info!(agent = %ctx.agent_name, sno = %row.sno, "starting contract extension");
        let mut step = StepCtx::new(page, policy, NAME);
        let t = &policy.timeouts;

        step.submit_prompt(row.require(fields::QUERY)?).await?;

        // Anchor to the right contract before touching any control.
        let contract = row.require(fields::CONTRACT_ID)?;
        let anchor = ElementQuery::text(TextMatch::Contains(contract.to_string()));
        if wait_present(page, &anchor, t.prompt(), t.poll()).await.is_none() {
            return Err(step
                .required_missing(&format!("contract '{contract}' in the conversation"))
                .await);
        }

        step.click_required(&Intent::ProceedWithRequest, t.control()).await?;

        let date = FlowDate::parse(row.require(fields::EXTENSION_DATE)?)?;
        select_date(&mut step, DATE_LABEL, &date).await?;

        step.open_dropdown(REASON_DROPDOWN).await?;
        let wanted = row.require(fields::EXTENSION_REASON)?;
        let tier = step
            .select_reason(wanted, REASON_KEYWORDS, REASON_FALLBACK_INDEX, t.control())
            .await?;
        debug!(wanted, ?tier, "extension reason selected");
        step.close_dropdown().await;

        let propose = row
            .get(fields::MODIFICATION)
            .map(|m| m.to_ascii_lowercase().contains("propose"))
            .unwrap_or(false);
        step.click_required(&Intent::ModificationChoice { propose }, t.control())
            .await?;

        if propose {
            step.open_dropdown(OPTIONS_DROPDOWN).await?;
            let raw = row.require(fields::APPLICABLE_OPTIONS)?;
            for option in raw.split([';', ',']).map(str::trim).filter(|s| !s.is_empty()) {
                let outcome = step
                    .resolver
                    .ensure_option_selected(option, t.control())
                    .await
                    .map_err(|e| e.into_flow(NAME))?;
                debug!(option, ?outcome, "applicable option ensured");
            }
            step.close_dropdown().await;
        }

        step.confirm_discussion().await?;
        step.answer_questions(row).await;
        finalize(&step.resolver, t.extended_end()).await
    }
}
