//! Contract Termination.
//!
//! Two branches from the scenario's status field: immediate termination,
//! where the date widget must never be touched, and future-dated
//! termination, which runs the full date sub-protocol. Both converge on the
//! termination-reason dropdown and Create Request.

use async_trait::async_trait;
use tracing::{debug, info};

use meshpilot_core_types::row::fields;
use meshpilot_core_types::{
    AgentKind, FlowError, FlowPolicy, ScenarioRow, WorkflowContext, WorkflowEnd,
};
use meshpilot_finalizer::finalize;
use meshpilot_intent_resolver::Intent;
use meshpilot_page_port::PagePort;

use crate::dates::{select_date, FlowDate};
use crate::steps::StepCtx;
use crate::Workflow;

const NAME: &str = "contract-termination";
const DATE_LABEL: &str = "Termination Date";
const REASON_DROPDOWN: &str = "Termination Reason";

const REASON_KEYWORDS: &[(&str, &str)] = &[
    ("budget", "Budget Cuts"),
    ("cost", "Budget Cuts"),
    ("perform", "Poor Performance"),
    ("quality", "Poor Performance"),
    ("breach", "Breach of Contract"),
    ("compliance", "Compliance Concerns"),
    ("risk", "Compliance Concerns"),
    ("business", "Change in Business Needs"),
];

/// Positional fallback: first available option.
const REASON_FALLBACK_INDEX: usize = 0;

/// Which termination branch the scenario asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminationMode {
    Immediate,
    FutureDate,
}

impl TerminationMode {
    /// Lenient parse of the scenario's status field: casing and spacing are
    /// normalized, "immediately" counts as immediate, anything mentioning
    /// "future" counts as future-dated.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_lowercase();
        if normalized.contains("immediate") {
            return Some(Self::Immediate);
        }
        if normalized.contains("future") {
            return Some(Self::FutureDate);
        }
        None
    }
}

pub struct ContractTermination;

#[async_trait]
impl Workflow for ContractTermination {
    fn agent(&self) -> AgentKind {
        AgentKind::ContractTermination
    }

    async fn run(
        &self,
        page: &dyn PagePort,
        ctx: &WorkflowContext,
        row: &ScenarioRow,
        policy: &FlowPolicy,
    ) -> Result<WorkflowEnd, FlowError> {
        info!(agent = %ctx.agent_name, sno = %row.sno, "starting contract termination");
        let mut step = StepCtx::new(page, policy, NAME);
        let t = &policy.timeouts;

        step.submit_prompt(row.require(fields::QUERY)?).await?;
        step.click_required(&Intent::ProceedWithRequest, t.prompt()).await?;

        let status = row.require(fields::TERMINATION_STATUS)?;
        let mode = TerminationMode::parse(status).ok_or_else(|| FlowError::UnsupportedScenario {
            field: fields::TERMINATION_STATUS.to_string(),
            value: status.to_string(),
            supported: vec!["future".to_string(), "immediate".to_string()],
        })?;

        match mode {
            TerminationMode::Immediate => {
                info!("immediate termination; date entry not applicable");
                step.click_required(&Intent::TerminateImmediately, t.control())
                    .await?;
            }
            TerminationMode::FutureDate => {
                step.click_required(&Intent::TerminateFutureDate, t.control())
                    .await?;
                let date = FlowDate::parse(row.require(fields::TERMINATION_DATE)?)?;
                select_date(&mut step, DATE_LABEL, &date).await?;
            }
        }

        step.open_dropdown(REASON_DROPDOWN).await?;
        let wanted = row.require(fields::TERMINATION_REASON)?;
        let tier = step
            .select_reason(wanted, REASON_KEYWORDS, REASON_FALLBACK_INDEX, t.control())
            .await?;
        debug!(wanted, ?tier, "termination reason selected");
        step.close_dropdown().await;

        step.click_required(&Intent::CreateRequest, t.prompt()).await?;
        finalize(&step.resolver, t.end()).await
    }
}
