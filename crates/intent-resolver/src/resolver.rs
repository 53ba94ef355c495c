//! Resolution and interaction over intent candidate chains.

use std::time::Duration;

use regex::escape;
use tracing::{debug, info, warn};

use meshpilot_core_types::{FlowPolicy, PageDiagnostics};
use meshpilot_page_port::{ElementQuery, ElementRef, PagePort, TextMatch};
use meshpilot_ui_actions::{fill_text, robust_click, submit_text, wait_any, wait_present};

use crate::errors::ResolveError;
use crate::intents::Intent;

/// Which matching tier satisfied a dropdown selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionTier {
    Exact,
    Flexible,
    /// Positional fallback; a degradation, logged but never an error.
    Index,
}

/// What an idempotent multi-select toggle ended up doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleOutcome {
    Clicked,
    AlreadySelected,
    /// No option matched the label textually; the selections were left
    /// untouched. A positional default would risk flipping off an option
    /// that is already correct.
    Skipped,
}

/// Resolves semantic intents against one page and performs interactions with
/// escalating robustness.
pub struct Resolver<'a> {
    page: &'a dyn PagePort,
    policy: &'a FlowPolicy,
}

impl<'a> Resolver<'a> {
    pub fn new(page: &'a dyn PagePort, policy: &'a FlowPolicy) -> Self {
        Self { page, policy }
    }

    pub fn page(&self) -> &dyn PagePort {
        self.page
    }

    pub fn policy(&self) -> &FlowPolicy {
        self.policy
    }

    /// Resolve `intent` to a concrete element, bounded by `timeout`.
    ///
    /// Candidates are evaluated in order each poll round; the first visible
    /// match wins, so ambiguity resolves by candidate priority rather than
    /// failing.
    pub async fn resolve(
        &self,
        intent: &Intent,
        timeout: Duration,
    ) -> Result<ElementRef, ResolveError> {
        let candidates = intent.candidates();
        match wait_any(
            self.page,
            &candidates,
            timeout,
            self.policy.timeouts.poll(),
        )
        .await
        {
            Some((index, element)) => {
                if index > 0 {
                    debug!(
                        intent = %intent,
                        strategy = index,
                        query = %candidates[index].describe(),
                        "resolved via fallback strategy"
                    );
                }
                Ok(element)
            }
            None => Err(ResolveError::NotFound {
                intent: intent.describe(),
                diagnostics: self.diagnostics().await,
            }),
        }
    }

    /// Optional-step resolution: absence within `timeout` is `None`, not an error.
    pub async fn try_resolve(&self, intent: &Intent, timeout: Duration) -> Option<ElementRef> {
        let candidates = intent.candidates();
        wait_any(
            self.page,
            &candidates,
            timeout,
            self.policy.timeouts.poll(),
        )
        .await
        .map(|(_, el)| el)
    }

    /// Resolve and click with the escalating click policy.
    pub async fn click(
        &self,
        intent: &Intent,
        timeout: Duration,
    ) -> Result<ElementRef, ResolveError> {
        if self.policy.dismiss_blocking_dialogs {
            self.dismiss_blocking_dialog().await;
        }
        let element = self.resolve(intent, timeout).await?;
        robust_click(self.page, &element)
            .await
            .map_err(|source| ResolveError::Interaction {
                intent: intent.describe(),
                source,
            })?;
        Ok(element)
    }

    /// Resolve and fill a text control.
    pub async fn fill(
        &self,
        intent: &Intent,
        text: &str,
        timeout: Duration,
    ) -> Result<ElementRef, ResolveError> {
        let element = self.resolve(intent, timeout).await?;
        fill_text(self.page, &element, text)
            .await
            .map_err(|source| ResolveError::Interaction {
                intent: intent.describe(),
                source,
            })?;
        Ok(element)
    }

    /// Resolve, fill and submit with Enter.
    pub async fn submit(
        &self,
        intent: &Intent,
        text: &str,
        timeout: Duration,
    ) -> Result<ElementRef, ResolveError> {
        let element = self.resolve(intent, timeout).await?;
        submit_text(self.page, &element, text)
            .await
            .map_err(|source| ResolveError::Interaction {
                intent: intent.describe(),
                source,
            })?;
        Ok(element)
    }

    /// Text-only selection attempt: exact label, then a whitespace/dash-
    /// tolerant pattern. `Ok(None)` means no option matched textually and
    /// nothing was clicked, so the caller can retry with a different label
    /// or degrade positionally.
    pub async fn try_select_option(
        &self,
        label: &str,
        timeout: Duration,
    ) -> Result<Option<SelectionTier>, ResolveError> {
        let slice = timeout / 2;
        let poll = self.policy.timeouts.poll();

        let exact = ElementQuery::role("option", TextMatch::Exact(label.to_string()));
        if let Some(el) = wait_present(self.page, &exact, slice, poll).await {
            self.click_option(&el, label).await?;
            return Ok(Some(SelectionTier::Exact));
        }

        let flexible = ElementQuery::role(
            "option",
            TextMatch::Pattern(flexible_pattern(label)),
        );
        if let Some(el) = wait_present(self.page, &flexible, slice, poll).await {
            info!(label, "dropdown option matched flexibly");
            self.click_option(&el, label).await?;
            return Ok(Some(SelectionTier::Flexible));
        }
        Ok(None)
    }

    /// Select a dropdown option by label with graceful degradation.
    ///
    /// Tiers: exact label, then a whitespace/dash-tolerant pattern, then the
    /// option at `default_index`. The positional tier is a logged
    /// degradation, never a failure — only a dropdown with no options at all
    /// errors.
    pub async fn select_dropdown_option(
        &self,
        label: &str,
        default_index: usize,
        timeout: Duration,
    ) -> Result<SelectionTier, ResolveError> {
        if let Some(tier) = self.try_select_option(label, timeout * 2 / 3).await? {
            return Ok(tier);
        }
        let poll = self.policy.timeouts.poll();

        let any = ElementQuery::role("option", TextMatch::Any);
        let options = wait_present(self.page, &any, timeout / 3, poll).await;
        if options.is_none() {
            return Err(ResolveError::NotFound {
                intent: format!("dropdown option '{label}'"),
                diagnostics: self.diagnostics().await,
            });
        }
        let rendered = self.page.query(&any).await.unwrap_or_default();
        let pick = match rendered.get(default_index).or_else(|| rendered.last()) {
            Some(pick) => pick.clone(),
            None => {
                return Err(ResolveError::NotFound {
                    intent: format!("dropdown option '{label}'"),
                    diagnostics: self.diagnostics().await,
                })
            }
        };
        warn!(
            label,
            default_index,
            chosen = %pick.label,
            "dropdown option not matched by text; degrading to positional default"
        );
        self.click_option(&pick, label).await?;
        Ok(SelectionTier::Index)
    }

    /// Ensure a multi-select option is selected, without double-toggling.
    ///
    /// These controls toggle on every click, so a second "ensure" must not
    /// click again. An unmatched label degrades to a logged skip rather than
    /// a failure — a positional default would toggle an arbitrary option off
    /// as easily as on. Only a multi-select with no options at all errors.
    pub async fn ensure_option_selected(
        &self,
        label: &str,
        timeout: Duration,
    ) -> Result<ToggleOutcome, ResolveError> {
        let slice = timeout / 2;
        let poll = self.policy.timeouts.poll();

        let exact = ElementQuery::role("option", TextMatch::Exact(label.to_string()));
        let flexible = ElementQuery::role(
            "option",
            TextMatch::Pattern(flexible_pattern(label)),
        );
        let element = match wait_present(self.page, &exact, slice, poll).await {
            Some(el) => el,
            None => match wait_present(self.page, &flexible, slice, poll).await {
                Some(el) => el,
                None => {
                    let any = ElementQuery::role("option", TextMatch::Any);
                    if wait_present(self.page, &any, self.policy.timeouts.lookup(), poll)
                        .await
                        .is_none()
                    {
                        return Err(ResolveError::NotFound {
                            intent: format!("multi-select option '{label}'"),
                            diagnostics: self.diagnostics().await,
                        });
                    }
                    warn!(
                        label,
                        "multi-select option not matched by text; leaving selections untouched"
                    );
                    return Ok(ToggleOutcome::Skipped);
                }
            },
        };

        let state = self
            .page
            .state(&element)
            .await
            .map_err(|source| ResolveError::Interaction {
                intent: format!("multi-select option '{label}'"),
                source,
            })?;
        if state.selected {
            debug!(label, "option already selected; skipping click");
            return Ok(ToggleOutcome::AlreadySelected);
        }
        self.click_option(&element, label).await?;
        Ok(ToggleOutcome::Clicked)
    }

    /// Dismiss the FAQ overlay if it currently blocks the page. Best effort.
    pub async fn dismiss_blocking_dialog(&self) {
        let poll = self.policy.timeouts.poll();
        let overlay_present = {
            let mut found = false;
            for query in Intent::FaqOverlay.candidates() {
                if let Ok(matches) = self.page.query(&query).await {
                    for el in matches {
                        if let Ok(state) = self.page.state(&el).await {
                            if state.visible {
                                found = true;
                                break;
                            }
                        }
                    }
                }
                if found {
                    break;
                }
            }
            found
        };
        if !overlay_present {
            return;
        }
        info!("FAQ overlay is blocking the page; dismissing");
        match wait_any(
            self.page,
            &Intent::FaqDismiss.candidates(),
            self.policy.timeouts.lookup(),
            poll,
        )
        .await
        {
            Some((_, el)) => {
                if let Err(err) = robust_click(self.page, &el).await {
                    warn!(%err, "failed to dismiss FAQ overlay; continuing");
                }
            }
            None => warn!("FAQ overlay visible but no dismiss control found; continuing"),
        }
    }

    /// Snapshot the page for failure messages.
    pub async fn diagnostics(&self) -> PageDiagnostics {
        PageDiagnostics::new(
            self.page.url().await,
            self.page.title().await,
            &self.page.body_text().await,
        )
    }

    async fn click_option(&self, element: &ElementRef, label: &str) -> Result<(), ResolveError> {
        robust_click(self.page, element)
            .await
            .map_err(|source| ResolveError::Interaction {
                intent: format!("dropdown option '{label}'"),
                source,
            })
    }
}

/// Whitespace- and dash-tolerant pattern for a label.
///
/// "Not approved - TPRM" matches "Not approved — TPRM" and collapsed spacing.
pub fn flexible_pattern(label: &str) -> String {
    let tokens: Vec<String> = label
        .split(|c: char| c.is_whitespace() || c == '-' || c == '—' || c == '–')
        .filter(|t| !t.is_empty())
        .map(|t| escape(t))
        .collect();
    if tokens.is_empty() {
        escape(label)
    } else {
        tokens.join(r"[\s\-—–]+")
    }
}
