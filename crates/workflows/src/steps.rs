//! Step vocabulary shared by the five state machines.
//!
//! Each helper is one conversational step: act, then take an advisory
//! heartbeat, then leave the caller to wait for its next expected control.
//! Mandatory steps abort the invocation; optional steps skip with a log line.

use std::time::Duration;

use tracing::{debug, info, warn};

use meshpilot_core_types::{FlowError, FlowPolicy, ScenarioRow};
use meshpilot_intent_resolver::{flexible_pattern, Intent, Resolver, SelectionTier};
use meshpilot_page_port::{ElementQuery, ElementRef, PagePort, TextMatch};
use meshpilot_ui_actions::{
    robust_click, wait_actionable, wait_any, wait_for_activity, wait_gone,
};

/// The free-text confirmation some flows require before they continue.
pub const DISCUSSION_CONFIRMATION: &str = "Yes, I have discussed this with the supplier";

/// Per-invocation step state. Created at workflow start, dropped at the end.
pub struct StepCtx<'a> {
    pub page: &'a dyn PagePort,
    pub resolver: Resolver<'a>,
    pub policy: &'a FlowPolicy,
    pub workflow: &'static str,
    /// Last observed activity-counter value, when the page carries one.
    pub activity: Option<u64>,
}

impl<'a> StepCtx<'a> {
    pub fn new(page: &'a dyn PagePort, policy: &'a FlowPolicy, workflow: &'static str) -> Self {
        Self {
            page,
            resolver: Resolver::new(page, policy),
            policy,
            workflow,
            activity: None,
        }
    }

    /// Advisory heartbeat after an interaction that should make the app work.
    pub async fn heartbeat(&mut self) {
        self.activity = wait_for_activity(self.page, self.activity, &self.policy.timeouts).await;
    }

    /// Send free text through the conversational composer.
    pub async fn submit_prompt(&mut self, text: &str) -> Result<(), FlowError> {
        debug!(workflow = self.workflow, "submitting prompt text");
        self.resolver
            .submit(&Intent::PromptInput, text, self.policy.timeouts.prompt())
            .await
            .map_err(|e| e.into_flow(self.workflow))?;
        self.heartbeat().await;
        Ok(())
    }

    /// The discussion-confirmation phrase, sent as ordinary prompt text.
    pub async fn confirm_discussion(&mut self) -> Result<(), FlowError> {
        self.submit_prompt(DISCUSSION_CONFIRMATION).await
    }

    /// Mandatory click; a miss aborts the invocation.
    pub async fn click_required(
        &mut self,
        intent: &Intent,
        timeout: Duration,
    ) -> Result<(), FlowError> {
        self.resolver
            .click(intent, timeout)
            .await
            .map_err(|e| e.into_flow(self.workflow))?;
        self.heartbeat().await;
        Ok(())
    }

    /// Optional click; absence within the grace window is a logged skip.
    /// Returns whether the control was found and clicked.
    pub async fn click_optional(&mut self, intent: &Intent) -> bool {
        match self
            .resolver
            .try_resolve(intent, self.policy.timeouts.optional())
            .await
        {
            Some(el) => match robust_click(self.page, &el).await {
                Ok(()) => {
                    self.heartbeat().await;
                    true
                }
                Err(err) => {
                    warn!(
                        workflow = self.workflow,
                        intent = %intent,
                        %err,
                        "optional control found but unclickable; skipping"
                    );
                    false
                }
            },
            None => {
                debug!(workflow = self.workflow, intent = %intent, "optional control absent; skipping");
                false
            }
        }
    }

    /// Click an element another wait already produced.
    pub async fn click_found(&mut self, element: &ElementRef, what: &str) -> Result<(), FlowError> {
        robust_click(self.page, element)
            .await
            .map_err(|err| FlowError::Page(format!("{what}: {err}")))?;
        self.heartbeat().await;
        Ok(())
    }

    /// Race several intents; the flattening preserves intent order as the
    /// priority when more than one is already on screen.
    pub async fn race(
        &self,
        intents: &[Intent],
        timeout: Duration,
    ) -> Option<(usize, ElementRef)> {
        let mut owners = Vec::new();
        let mut queries = Vec::new();
        for (index, intent) in intents.iter().enumerate() {
            for query in intent.candidates() {
                owners.push(index);
                queries.push(query);
            }
        }
        wait_any(self.page, &queries, timeout, self.policy.timeouts.poll())
            .await
            .map(|(i, el)| (owners[i], el))
    }

    /// A mandatory-element failure with a fresh page snapshot.
    pub async fn required_missing(&self, what: &str) -> FlowError {
        FlowError::RequiredElementTimeout {
            workflow: self.workflow.to_string(),
            intent: what.to_string(),
            diagnostics: self.resolver.diagnostics().await,
        }
    }

    /// Open a labeled dropdown, retrying through the streaming spinner.
    ///
    /// Per attempt: click the trigger, wait out any spinner, then check for
    /// at least one visible option. Contents stream in after the chevron
    /// click and sometimes need a re-click to materialize.
    pub async fn open_dropdown(&mut self, label: &str) -> Result<(), FlowError> {
        let trigger = Intent::DropdownTrigger {
            label: label.to_string(),
        };
        let t = &self.policy.timeouts;
        let any_option = ElementQuery::role("option", TextMatch::Any);

        for attempt in 1..=self.policy.dropdown_open_attempts {
            self.resolver
                .click(&trigger, t.control())
                .await
                .map_err(|e| e.into_flow(self.workflow))?;

            if self
                .resolver
                .try_resolve(&Intent::LoadingSpinner, t.lookup())
                .await
                .is_some()
            {
                debug!(label, attempt, "dropdown contents streaming; waiting out the spinner");
                for query in Intent::LoadingSpinner.candidates() {
                    wait_gone(self.page, &query, t.control(), t.poll()).await;
                }
            }

            // An option streaming in disabled does not count as open yet.
            if wait_actionable(self.page, &any_option, t.lookup(), t.poll())
                .await
                .is_some()
            {
                return Ok(());
            }
            warn!(label, attempt, "dropdown produced no options; re-clicking the trigger");
        }
        Err(self
            .required_missing(&format!("options of dropdown '{label}'"))
            .await)
    }

    /// Collapse an open dropdown by clicking neutral page space.
    pub async fn close_dropdown(&mut self) {
        if let Err(err) = self.page.pointer_click(2.0, 2.0).await {
            debug!(workflow = self.workflow, %err, "dismiss click failed; dropdown may stay open");
        }
    }

    /// One optional Yes/No branch question, if it is on screen.
    pub async fn answer_optional_question(&mut self, yes: bool) -> bool {
        let intent = if yes {
            Intent::YesAnswer { question: None }
        } else {
            Intent::NoAnswer { question: None }
        };
        self.click_optional(&intent).await
    }

    /// Up to two conditional branch questions. Answers come from the row's
    /// `question1`/`question2` fields, defaulting to Yes; the chain stops at
    /// the first question that never appears.
    pub async fn answer_questions(&mut self, row: &ScenarioRow) -> usize {
        let mut answered = 0;
        for n in 1..=2u8 {
            let yes = row
                .get(&format!("question{n}"))
                .map(|v| !v.eq_ignore_ascii_case("no"))
                .unwrap_or(true);
            if !self.answer_optional_question(yes).await {
                break;
            }
            answered += 1;
        }
        debug!(workflow = self.workflow, answered, "conditional questions handled");
        answered
    }

    /// Pick a reason from an open dropdown. The row's literal phrasing is
    /// tried textually first (exact, then flexible); only when it matches
    /// nothing does the keyword table's canonical caption get a turn, and
    /// only after that the positional default.
    pub async fn select_reason(
        &mut self,
        wanted: &str,
        keywords: &[(&'static str, &'static str)],
        default_index: usize,
        timeout: Duration,
    ) -> Result<SelectionTier, FlowError> {
        let slice = timeout / 2;
        if let Some(tier) = self
            .resolver
            .try_select_option(wanted, slice)
            .await
            .map_err(|e| e.into_flow(self.workflow))?
        {
            return Ok(tier);
        }
        let caption = match keyword_label(wanted, keywords) {
            Some(caption) if !caption.eq_ignore_ascii_case(wanted) => {
                info!(
                    workflow = self.workflow,
                    wanted, caption, "reason not rendered literally; using its keyword caption"
                );
                caption
            }
            _ => wanted,
        };
        self.resolver
            .select_dropdown_option(caption, default_index, slice)
            .await
            .map_err(|e| e.into_flow(self.workflow))
    }

    /// Click a reason button by caption: exact first, then a spacing- and
    /// dash-tolerant phrase match over buttons and free text.
    pub async fn click_reason_button(
        &mut self,
        caption: &str,
        timeout: Duration,
    ) -> Result<(), FlowError> {
        let queries = vec![
            ElementQuery::role("button", TextMatch::Exact(caption.to_string())),
            ElementQuery::role("button", TextMatch::Pattern(flexible_pattern(caption))),
            ElementQuery::text(TextMatch::Pattern(flexible_pattern(caption))),
        ];
        match wait_any(self.page, &queries, timeout, self.policy.timeouts.poll()).await {
            Some((index, el)) => {
                if index > 0 {
                    info!(caption, strategy = index, "reason caption matched flexibly");
                }
                self.click_found(&el, &format!("reason button '{caption}'"))
                    .await
            }
            None => Err(self
                .required_missing(&format!("reason button '{caption}'"))
                .await),
        }
    }
}

/// First table entry whose keyword occurs in `value`, case-insensitive.
pub(crate) fn keyword_label(
    value: &str,
    table: &[(&'static str, &'static str)],
) -> Option<&'static str> {
    let needle = value.to_ascii_lowercase();
    table
        .iter()
        .find(|(keyword, _)| needle.contains(keyword))
        .map(|(_, label)| *label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshpilot_page_port::mock::{MockNode, MockPage};
    use std::sync::Arc;
    use tokio::time::sleep;

    fn policy() -> FlowPolicy {
        FlowPolicy::rehearsal()
    }

    #[tokio::test]
    async fn optional_click_skips_absent_controls() {
        let policy = policy();
        let page = MockPage::new(MockNode::new("root"));
        let mut step = StepCtx::new(&page, &policy, "test-flow");
        assert!(!step.click_optional(&Intent::DoneButton).await);
        assert!(page.inspect(|dom| dom.click_log().is_empty()));
    }

    #[tokio::test]
    async fn optional_click_takes_present_controls() {
        let policy = policy();
        let page = MockPage::new(
            MockNode::new("root").child(MockNode::new("done").role("button").name("Done")),
        );
        let mut step = StepCtx::new(&page, &policy, "test-flow");
        assert!(step.click_optional(&Intent::DoneButton).await);
        assert_eq!(page.inspect(|dom| dom.click_log().to_vec()), vec!["done"]);
    }

    #[tokio::test]
    async fn dropdown_open_retries_until_options_appear() {
        let policy = policy();
        let page = MockPage::new(
            MockNode::new("root")
                .child(MockNode::new("trigger").role("combobox").name("Reason"))
                .child(
                    MockNode::new("list")
                        .role("listbox")
                        .hidden()
                        .child(MockNode::new("opt").role("option").name("Alpha")),
                ),
        );
        // First chevron click yields nothing; the second opens the list.
        let mut clicks = 0u32;
        page.on_click("trigger", move |dom| {
            clicks += 1;
            if clicks >= 2 {
                dom.show("list");
            }
        });
        let mut step = StepCtx::new(&page, &policy, "test-flow");
        step.open_dropdown("Reason").await.unwrap();
        let trigger_clicks = page.inspect(|dom| {
            dom.click_log().iter().filter(|id| *id == "trigger").count()
        });
        assert_eq!(trigger_clicks, 2);
    }

    #[tokio::test]
    async fn dropdown_open_waits_out_the_spinner() {
        let policy = policy();
        let page = Arc::new(MockPage::new(
            MockNode::new("root")
                .child(MockNode::new("trigger").role("combobox").name("Reason"))
                .child(MockNode::new("spinner").role("progressbar").hidden())
                .child(
                    MockNode::new("list")
                        .role("listbox")
                        .hidden()
                        .child(MockNode::new("opt").role("option").name("Alpha")),
                ),
        ));
        page.on_click("trigger", |dom| dom.show("spinner"));
        let clearer = {
            let page = page.clone();
            tokio::spawn(async move {
                sleep(Duration::from_millis(20)).await;
                page.mutate(|dom| {
                    dom.hide("spinner");
                    dom.show("list");
                });
            })
        };
        let mut step = StepCtx::new(page.as_ref(), &policy, "test-flow");
        step.open_dropdown("Reason").await.unwrap();
        clearer.await.unwrap();
    }

    #[tokio::test]
    async fn dropdown_open_gives_up_after_the_attempt_budget() {
        let mut policy = policy();
        policy.dropdown_open_attempts = 2;
        let page = MockPage::new(
            MockNode::new("root").child(MockNode::new("trigger").role("combobox").name("Reason")),
        );
        let mut step = StepCtx::new(&page, &policy, "test-flow");
        let err = step.open_dropdown("Reason").await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(page.inspect(|dom| dom.click_log().len()), 2);
    }

    #[tokio::test]
    async fn dropdown_with_only_disabled_options_does_not_count_as_open() {
        let mut policy = policy();
        policy.dropdown_open_attempts = 2;
        let page = MockPage::new(
            MockNode::new("root")
                .child(MockNode::new("trigger").role("combobox").name("Reason"))
                .child(
                    MockNode::new("list")
                        .role("listbox")
                        .child(MockNode::new("opt").role("option").name("Alpha").disabled()),
                ),
        );
        let mut step = StepCtx::new(&page, &policy, "test-flow");
        let err = step.open_dropdown("Reason").await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn literal_reason_phrasing_beats_the_keyword_caption() {
        let policy = policy();
        let page = MockPage::new(
            MockNode::new("root")
                .child(MockNode::new("opt-literal").role("option").name("Quality issues"))
                .child(MockNode::new("opt-mapped").role("option").name("Poor Performance")),
        );
        let table: &[(&str, &str)] = &[("quality", "Poor Performance")];
        let mut step = StepCtx::new(&page, &policy, "test-flow");
        let tier = step
            .select_reason("Quality issues", table, 0, Duration::from_millis(80))
            .await
            .unwrap();
        assert_eq!(tier, SelectionTier::Exact);
        assert_eq!(
            page.inspect(|dom| dom.click_log().to_vec()),
            vec!["opt-literal"]
        );
    }

    #[tokio::test]
    async fn keyword_caption_is_tried_only_after_the_literal_misses() {
        let policy = policy();
        let page = MockPage::new(
            MockNode::new("root")
                .child(MockNode::new("opt-mapped").role("option").name("Poor Performance"))
                .child(MockNode::new("opt-other").role("option").name("Budget Cuts")),
        );
        let table: &[(&str, &str)] = &[("quality", "Poor Performance")];
        let mut step = StepCtx::new(&page, &policy, "test-flow");
        let tier = step
            .select_reason("ongoing quality problems", table, 1, Duration::from_millis(80))
            .await
            .unwrap();
        assert_eq!(tier, SelectionTier::Exact);
        assert_eq!(
            page.inspect(|dom| dom.click_log().to_vec()),
            vec!["opt-mapped"]
        );
    }

    #[tokio::test]
    async fn unmatched_reason_degrades_to_the_positional_default() {
        let policy = policy();
        let page = MockPage::new(
            MockNode::new("root")
                .child(MockNode::new("o1").role("option").name("Alpha"))
                .child(MockNode::new("o2").role("option").name("Beta")),
        );
        let table: &[(&str, &str)] = &[("quality", "Poor Performance")];
        let mut step = StepCtx::new(&page, &policy, "test-flow");
        let tier = step
            .select_reason("Delta", table, 1, Duration::from_millis(80))
            .await
            .unwrap();
        assert_eq!(tier, SelectionTier::Index);
        assert_eq!(page.inspect(|dom| dom.click_log().to_vec()), vec!["o2"]);
    }

    #[tokio::test]
    async fn questions_follow_row_answers_and_stop_on_absence() {
        let policy = policy();
        let page = MockPage::new(
            MockNode::new("root")
                .child(MockNode::new("q1-yes").role("button").name("Yes"))
                .child(MockNode::new("q1-no").role("button").name("No"))
                .child(MockNode::new("q2-yes").role("button").name("Yes").hidden())
                .child(MockNode::new("q2-no").role("button").name("No").hidden()),
        );
        page.on_click("q1-no", |dom| {
            dom.hide("q1-yes");
            dom.hide("q1-no");
            dom.show("q2-yes");
            dom.show("q2-no");
        });
        page.on_click("q2-yes", |dom| {
            dom.hide("q2-yes");
            dom.hide("q2-no");
        });
        let row = ScenarioRow::new("1").with("question1", "No");
        let mut step = StepCtx::new(&page, &policy, "test-flow");
        let answered = step.answer_questions(&row).await;
        assert_eq!(answered, 2);
        assert_eq!(
            page.inspect(|dom| dom.click_log().to_vec()),
            vec!["q1-no", "q2-yes"]
        );
    }

    #[tokio::test]
    async fn reason_button_falls_back_to_flexible_phrase() {
        let policy = policy();
        let page = MockPage::new(MockNode::new("root").child(
            MockNode::new("reason").role("button").name("Not  approved — TPRM"),
        ));
        let mut step = StepCtx::new(&page, &policy, "test-flow");
        step.click_reason_button("Not approved - TPRM", Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(page.inspect(|dom| dom.click_log().to_vec()), vec!["reason"]);
    }

    #[test]
    fn keyword_table_lookup_is_case_insensitive() {
        let table: &[(&str, &str)] = &[("price", "Pricing Change"), ("scope", "Scope Change")];
        assert_eq!(
            keyword_label("Price increase for Q3", table),
            Some("Pricing Change")
        );
        assert_eq!(keyword_label("unrelated", table), None);
    }
}
