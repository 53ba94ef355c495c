//! Supplier Profile Update.
//!
//! Selects the supplier in the grid by name and code when the row carries
//! both, picks the update type from a toggling multi-select, describes the
//! change, optionally attaches a supporting file through the upload widget's
//! own input, and creates the request. Some builds put the validation click
//! inside this flow, so it is taken opportunistically before the shared
//! finalizer judges the terminal state.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use meshpilot_core_types::row::fields;
use meshpilot_core_types::{
    AgentKind, FlowError, FlowPolicy, ScenarioRow, WorkflowContext, WorkflowEnd,
};
use meshpilot_finalizer::finalize;
use meshpilot_intent_resolver::Intent;
use meshpilot_page_port::PagePort;

use crate::steps::StepCtx;
use crate::Workflow;

const NAME: &str = "supplier-profile-update";
const OPTIONS_DROPDOWN: &str = "Choose Option";

pub struct SupplierProfileUpdate;

#[async_trait]
impl Workflow for SupplierProfileUpdate {
    fn agent(&self) -> AgentKind {
        AgentKind::SupplierProfileUpdate
    }

    async fn run(
        &self,
        page: &dyn PagePort,
        ctx: &WorkflowContext,
        row: &ScenarioRow,
        policy: &FlowPolicy,
    ) -> Result<WorkflowEnd, FlowError> {
        info!(agent = %ctx.agent_name, sno = %row.sno, "starting supplier profile update");
        let mut step = StepCtx::new(page, policy, NAME);
        let t = &policy.timeouts;

        step.submit_prompt(row.require(fields::QUERY)?).await?;
        select_supplier(&mut step, row).await?;
        step.click_required(&Intent::ProceedWithRequest, t.prompt()).await?;

        step.open_dropdown(OPTIONS_DROPDOWN).await?;
        let update_type = row.require(fields::UPDATE_TYPE)?;
        let outcome = step
            .resolver
            .ensure_option_selected(update_type, t.control())
            .await
            .map_err(|e| e.into_flow(NAME))?;
        debug!(update_type, ?outcome, "update type ensured");
        step.close_dropdown().await;

        step.click_required(&Intent::Proceed, t.control()).await?;
        step.submit_prompt(row.require(fields::DETAIL)?).await?;

        if let Some(path) = row.get(fields::FILE_PATH) {
            attach_file(&mut step, path).await?;
        }

        let done = step.click_optional(&Intent::DoneButton).await;
        let add = step.click_optional(&Intent::AddButton).await;
        if !(done || add) {
            warn!("no Done or Add control after the detail step; continuing");
        }

        step.click_required(&Intent::CreateRequest, t.prompt()).await?;
        let validated = step.click_optional(&Intent::SendForValidation).await;

        let end = finalize(&step.resolver, t.end()).await?;
        // The in-flow validation click already happened; a bare
        // congratulations screen then means the validation path succeeded.
        Ok(if validated && end == WorkflowEnd::Congratulations {
            WorkflowEnd::SendForValidation
        } else {
            end
        })
    }
}

/// Tick the supplier's grid row. With both name and code on the row, the
/// matching grid row must carry both; otherwise the first row is taken.
async fn select_supplier(step: &mut StepCtx<'_>, row: &ScenarioRow) -> Result<(), FlowError> {
    let prompt = step.policy.timeouts.prompt();
    let control = step.policy.timeouts.control();

    let (name, code) = match (
        row.get(fields::SUPPLIER_NAME),
        row.get(fields::SUPPLIER_CODE),
    ) {
        (Some(name), Some(code)) => (name.to_string(), code.to_string()),
        _ => {
            debug!("supplier identifiers incomplete; selecting the first grid row");
            return step
                .click_required(&Intent::GridRowCheckbox { row_text: None }, prompt)
                .await;
        }
    };

    let target = Intent::GridRow {
        text: Some(name.clone()),
    };
    let carries_code = match step.resolver.try_resolve(&target, prompt).await {
        Some(el) => step
            .page
            .state(&el)
            .await
            .map(|state| state.all_text().contains(&code))
            .unwrap_or(false),
        None => false,
    };

    if carries_code {
        step.click_required(
            &Intent::GridRowCheckbox {
                row_text: Some(name),
            },
            control,
        )
        .await
    } else {
        warn!(%name, %code, "no grid row carries both identifiers; taking the first row");
        step.click_required(&Intent::GridRowCheckbox { row_text: None }, control)
            .await
    }
}

/// Attach the row's file through the upload widget's own input. The widget
/// is optional per build; a page-global file input is never acceptable, it
/// would misdirect the attachment into the chat composer.
async fn attach_file(step: &mut StepCtx<'_>, path: &str) -> Result<(), FlowError> {
    let optional = step.policy.timeouts.optional();
    match step.resolver.try_resolve(&Intent::FileAttachment, optional).await {
        Some(input) => {
            step.page
                .set_input_files(&input, &[PathBuf::from(path)])
                .await
                .map_err(|err| FlowError::Page(err.to_string()))?;
            info!(path, "attached supporting file");
            step.heartbeat().await;
            Ok(())
        }
        None => {
            warn!(path, "row names a file but no upload widget is present; skipping");
            Ok(())
        }
    }
}
