//! Terminal-state detection shared by every workflow.
//!
//! All workflows are judged uniformly: a run ends via the congratulations
//! screen, via an explicit validation click, or at a
//! request-created-but-not-validated state. Exactly one of the three is
//! produced per call; anything else is a timeout failure. No workflow exits
//! without passing through [`finalize`].

use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use meshpilot_core_types::{FlowError, WorkflowEnd};
use meshpilot_intent_resolver::{Intent, Resolver};
use meshpilot_ui_actions::{robust_click, wait_any};

/// Which terminal signal a candidate query belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Signal {
    Congratulations,
    SendForValidation,
    EditProjectRequest,
}

/// Detect the workflow's terminal state, bounded by `end_timeout`.
///
/// Races visibility of the three terminal signals. Congratulations wins
/// outright. An "Edit Project Request" sighting grants "Send for Validation"
/// a short grace window before falling back to the edit-only state. A
/// validation control, once seen, is clicked with the escalating click
/// policy and must be followed by the congratulations screen.
pub async fn finalize(
    resolver: &Resolver<'_>,
    end_timeout: Duration,
) -> Result<WorkflowEnd, FlowError> {
    let timeouts = &resolver.policy().timeouts;
    let page = resolver.page();
    let started = Instant::now();

    // Flatten the three intents' candidate chains into one prioritized race.
    let mut signals = Vec::new();
    let mut queries = Vec::new();
    for (signal, intent) in [
        (Signal::Congratulations, Intent::CongratulationsBanner),
        (Signal::SendForValidation, Intent::SendForValidation),
        (Signal::EditProjectRequest, Intent::EditProjectRequest),
    ] {
        for query in intent.candidates() {
            signals.push(signal);
            queries.push(query);
        }
    }

    let raced = wait_any(page, &queries, end_timeout, timeouts.poll()).await;
    let Some((index, _)) = raced else {
        return Err(FlowError::TerminalTimeout {
            waited_ms: started.elapsed().as_millis() as u64,
            diagnostics: resolver.diagnostics().await,
        });
    };

    match signals[index] {
        Signal::Congratulations => {
            info!("terminal state: congratulations already visible");
            Ok(WorkflowEnd::Congratulations)
        }
        Signal::SendForValidation => {
            click_validation_and_confirm(resolver, end_timeout.saturating_sub(started.elapsed()))
                .await
        }
        Signal::EditProjectRequest => {
            // Some builds surface the validation control a beat after the
            // edit control; grant it a grace window before settling.
            let grace = timeouts.validation_grace();
            let send = wait_any(
                page,
                &Intent::SendForValidation.candidates(),
                grace,
                timeouts.poll(),
            )
            .await;
            match send {
                Some(_) => {
                    click_validation_and_confirm(
                        resolver,
                        end_timeout.saturating_sub(started.elapsed()),
                    )
                    .await
                }
                None => {
                    info!("terminal state: edit-project-request only, no validation control");
                    Ok(WorkflowEnd::EditProjectRequestOnly)
                }
            }
        }
    }
}

async fn click_validation_and_confirm(
    resolver: &Resolver<'_>,
    remaining: Duration,
) -> Result<WorkflowEnd, FlowError> {
    let timeouts = &resolver.policy().timeouts;
    let page = resolver.page();

    let element = match wait_any(
        page,
        &Intent::SendForValidation.candidates(),
        timeouts.validation_grace(),
        timeouts.poll(),
    )
    .await
    {
        Some((_, el)) => el,
        None => {
            // It was visible a moment ago; treat the disappearance like the
            // grace-window miss and settle for the edit-only state.
            warn!("validation control vanished before it could be clicked");
            return Ok(WorkflowEnd::EditProjectRequestOnly);
        }
    };

    robust_click(page, &element)
        .await
        .map_err(|err| FlowError::Page(err.to_string()))?;
    info!("clicked Send for Validation, awaiting confirmation");

    let confirm_budget = remaining.max(timeouts.validation_grace());
    if wait_any(
        page,
        &Intent::CongratulationsBanner.candidates(),
        confirm_budget,
        timeouts.poll(),
    )
    .await
    .is_some()
    {
        return Ok(WorkflowEnd::SendForValidation);
    }
    Err(FlowError::TerminalTimeout {
        waited_ms: confirm_budget.as_millis() as u64,
        diagnostics: resolver.diagnostics().await,
    })
}
