//! Date entry against the two widget variants the app ships.
//!
//! Some builds open a navigable calendar popup; others take typed input. The
//! sub-protocol opens the control, prefers the calendar path, falls back to
//! typing one accepted form after another, and then asserts the widget
//! actually took the date before clicking Proceed. The assertion is the
//! point: a silently ignored date is worse than a failed run.

use chrono::{Datelike, NaiveDate};
use tracing::{debug, warn};

use meshpilot_core_types::FlowError;
use meshpilot_intent_resolver::Intent;
use meshpilot_page_port::{ElementQuery, TextMatch};
use meshpilot_ui_actions::{fill_text, robust_click, wait_any};

use crate::steps::StepCtx;

/// A scenario date, accepted in ISO or day-first form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlowDate {
    inner: NaiveDate,
}

impl FlowDate {
    /// Parse `YYYY-MM-DD` or `DD/MM/YYYY`.
    pub fn parse(raw: &str) -> Result<Self, FlowError> {
        let raw = raw.trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
            .map(|inner| Self { inner })
            .map_err(|_| FlowError::InvalidDate(raw.to_string()))
    }

    pub fn iso(&self) -> String {
        self.inner.format("%Y-%m-%d").to_string()
    }

    pub fn day_first(&self) -> String {
        self.inner.format("%d/%m/%Y").to_string()
    }

    pub fn day_month_abbr(&self) -> String {
        self.inner.format("%d %b %Y").to_string()
    }

    pub fn year(&self) -> i32 {
        self.inner.year()
    }

    pub fn month_abbr(&self) -> String {
        self.inner.format("%b").to_string()
    }

    pub fn day(&self) -> u32 {
        self.inner.day()
    }

    /// Typed-entry forms, tried in order until the widget takes one.
    pub fn typed_forms(&self) -> [String; 3] {
        [self.iso(), self.day_first(), self.day_month_abbr()]
    }

    /// Textual forms a widget might render once the date is applied.
    pub fn renderings(&self) -> Vec<String> {
        vec![
            self.iso(),
            self.day_first(),
            self.day_month_abbr(),
            format!(
                "{}/{}/{}",
                self.inner.day(),
                self.inner.month(),
                self.inner.year()
            ),
            self.inner.format("%b %d, %Y").to_string(),
            self.inner.format("%d-%m-%Y").to_string(),
        ]
    }

    /// Whether `shown` contains any recognized rendering of this date.
    pub fn matches_rendered(&self, shown: &str) -> bool {
        let haystack = shown.to_ascii_lowercase();
        self.renderings()
            .iter()
            .any(|r| haystack.contains(&r.to_ascii_lowercase()))
    }
}

impl std::fmt::Display for FlowDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.day_first())
    }
}

/// Drive a labeled date control to `date`, assert it applied, then Proceed.
pub async fn select_date(
    step: &mut StepCtx<'_>,
    label: &str,
    date: &FlowDate,
) -> Result<(), FlowError> {
    let control = step.policy.timeouts.control();
    let lookup = step.policy.timeouts.lookup();

    let opener = Intent::DateControl {
        label: label.to_string(),
    };
    let mut calendar_open = false;
    for pass in 1..=step.policy.date_open_passes {
        let Some(el) = step.resolver.try_resolve(&opener, control).await else {
            debug!(label, "no date opener on this build; going straight to typed entry");
            break;
        };
        if let Err(err) = robust_click(step.page, &el).await {
            warn!(label, pass, %err, "date opener click failed; retrying");
            continue;
        }
        if step
            .resolver
            .try_resolve(&Intent::CalendarOverlay, lookup)
            .await
            .is_some()
        {
            calendar_open = true;
            break;
        }
        debug!(label, pass, "no calendar overlay after opener click");
    }

    if calendar_open {
        pick_from_calendar(step, date).await?;
    } else {
        type_date(step, label, date).await?;
    }

    assert_applied(step, label, date).await?;
    step.click_required(&Intent::Proceed, control).await
}

/// Navigate the calendar overlay period -> year -> month -> day by exact
/// cell text. Year and month cells are skipped when the view is already
/// past them; the day cell is mandatory.
async fn pick_from_calendar(step: &mut StepCtx<'_>, date: &FlowDate) -> Result<(), FlowError> {
    let lookup = step.policy.timeouts.lookup();
    let control = step.policy.timeouts.control();
    let year = date.year().to_string();

    // Zoom out through the period header when the year is not yet on screen.
    if step
        .resolver
        .try_resolve(&Intent::CalendarCell { text: year.clone() }, lookup)
        .await
        .is_none()
    {
        let header_queries: Vec<ElementQuery> = Intent::CalendarOverlay
            .candidates()
            .into_iter()
            .map(|scope| {
                ElementQuery::within(
                    scope,
                    ElementQuery::role("button", TextMatch::Pattern(r"\d{4}".into())),
                )
            })
            .collect();
        if let Some((_, header)) =
            wait_any(step.page, &header_queries, lookup, step.policy.timeouts.poll()).await
        {
            let _ = robust_click(step.page, &header).await;
        }
    }

    click_cell(step, &year, lookup, false).await?;
    click_cell(step, &date.month_abbr(), lookup, false).await?;
    click_cell(step, &date.day().to_string(), control, true).await?;
    Ok(())
}

async fn click_cell(
    step: &mut StepCtx<'_>,
    text: &str,
    timeout: std::time::Duration,
    required: bool,
) -> Result<(), FlowError> {
    let intent = Intent::CalendarCell {
        text: text.to_string(),
    };
    match step.resolver.try_resolve(&intent, timeout).await {
        Some(el) => {
            robust_click(step.page, &el)
                .await
                .map_err(|err| FlowError::Page(format!("calendar cell '{text}': {err}")))?;
            Ok(())
        }
        None if required => Err(step
            .required_missing(&format!("calendar cell '{text}'"))
            .await),
        None => {
            debug!(text, "calendar cell absent; view already past it");
            Ok(())
        }
    }
}

/// Typed fallback: feed accepted forms into the date input until the widget
/// renders one back. The final assertion in [`select_date`] is authoritative.
async fn type_date(step: &mut StepCtx<'_>, label: &str, date: &FlowDate) -> Result<(), FlowError> {
    let control = step.policy.timeouts.control();
    let input_intent = Intent::DateInput {
        label: label.to_string(),
    };
    for (attempt, form) in date.typed_forms().iter().enumerate() {
        let input = step
            .resolver
            .resolve(&input_intent, control)
            .await
            .map_err(|e| e.into_flow(step.workflow))?;
        if let Err(err) = fill_text(step.page, &input, form).await {
            warn!(label, form = %form, %err, "typed date entry failed; trying the next form");
            continue;
        }
        let _ = step.page.press(&input, "Enter").await;
        if applied(step, label, date).await {
            return Ok(());
        }
        debug!(label, form = %form, attempt = attempt + 1, "widget did not take this form");
    }
    Ok(())
}

async fn applied(step: &StepCtx<'_>, label: &str, date: &FlowDate) -> bool {
    match rendered_text(step, label).await {
        Some(shown) => date.matches_rendered(&shown),
        None => false,
    }
}

async fn assert_applied(
    step: &StepCtx<'_>,
    label: &str,
    date: &FlowDate,
) -> Result<(), FlowError> {
    let shown = rendered_text(step, label).await.unwrap_or_default();
    if date.matches_rendered(&shown) {
        debug!(label, %date, "date widget confirmed the selection");
        return Ok(());
    }
    Err(FlowError::DateNotApplied {
        expected: date.day_first(),
        shown,
    })
}

async fn rendered_text(step: &StepCtx<'_>, label: &str) -> Option<String> {
    let display = Intent::DateDisplay {
        label: label.to_string(),
    };
    let el = step
        .resolver
        .try_resolve(&display, step.policy.timeouts.lookup())
        .await?;
    let state = step.page.state(&el).await.ok()?;
    Some(state.all_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshpilot_core_types::FlowPolicy;
    use meshpilot_page_port::mock::{MockNode, MockPage};

    fn date_widget(label: &str) -> MockNode {
        MockNode::new("widget")
            .text(label)
            .child(MockNode::new("cal-toggle").role("button").name("Open calendar"))
            .child(MockNode::new("date-input").role("textbox"))
            .child(MockNode::new("date-display").css(".date-display"))
    }

    #[test]
    fn both_input_forms_parse_to_the_same_date() {
        let iso = FlowDate::parse("2025-12-01").unwrap();
        let day_first = FlowDate::parse("01/12/2025").unwrap();
        assert_eq!(iso, day_first);
        assert_eq!(iso.day_first(), "01/12/2025");
        assert_eq!(iso.iso(), "2025-12-01");
        assert_eq!(iso.day_month_abbr(), "01 Dec 2025");
    }

    #[test]
    fn junk_dates_are_rejected() {
        for raw in ["someday", "2025/12/01", "13/13/2025", ""] {
            assert!(
                matches!(FlowDate::parse(raw), Err(FlowError::InvalidDate(_))),
                "{raw:?} should not parse"
            );
        }
    }

    #[test]
    fn rendered_matching_accepts_widget_variants() {
        let date = FlowDate::parse("2026-03-14").unwrap();
        assert!(date.matches_rendered("Selected: 14/03/2026"));
        assert!(date.matches_rendered("2026-03-14"));
        assert!(date.matches_rendered("14 mar 2026"));
        assert!(date.matches_rendered("Mar 14, 2026"));
        assert!(!date.matches_rendered("15/03/2026"));
        assert!(!date.matches_rendered(""));
    }

    #[tokio::test]
    async fn typed_fallback_applies_and_proceeds() {
        let policy = FlowPolicy::rehearsal();
        let page = MockPage::new(
            MockNode::new("root")
                .child(date_widget("Termination Date"))
                .child(MockNode::new("proceed").role("button").name("Proceed").hidden()),
        );
        page.on_fill("date-input", |dom, text| {
            if text == "2025-12-01" {
                dom.set_text("date-display", "01/12/2025");
                dom.show("proceed");
            }
        });
        let date = FlowDate::parse("2025-12-01").unwrap();
        let mut step = StepCtx::new(&page, &policy, "test-flow");
        select_date(&mut step, "Termination Date", &date).await.unwrap();
        assert!(page.inspect(|dom| dom.click_log().contains(&"proceed".to_string())));
    }

    #[tokio::test]
    async fn calendar_path_navigates_by_cell_text() {
        let policy = FlowPolicy::rehearsal();
        let page = MockPage::new(
            MockNode::new("root")
                .child(date_widget("Extension Date"))
                .child(
                    MockNode::new("calendar")
                        .role("dialog")
                        .name("Calendar")
                        .hidden()
                        .child(MockNode::new("cell-year").role("gridcell").name("2026"))
                        .child(MockNode::new("cell-month").role("gridcell").name("Mar").hidden())
                        .child(MockNode::new("cell-day").role("gridcell").name("14").hidden()),
                )
                .child(MockNode::new("proceed").role("button").name("Proceed").hidden()),
        );
        page.on_click("cal-toggle", |dom| dom.show("calendar"));
        page.on_click("cell-year", |dom| {
            dom.hide("cell-year");
            dom.show("cell-month");
        });
        page.on_click("cell-month", |dom| {
            dom.hide("cell-month");
            dom.show("cell-day");
        });
        page.on_click("cell-day", |dom| {
            dom.hide("calendar");
            dom.set_text("date-display", "14/03/2026");
            dom.show("proceed");
        });
        let date = FlowDate::parse("2026-03-14").unwrap();
        let mut step = StepCtx::new(&page, &policy, "test-flow");
        select_date(&mut step, "Extension Date", &date).await.unwrap();
        assert_eq!(
            page.inspect(|dom| {
                dom.click_log()
                    .iter()
                    .filter(|id| id.starts_with("cell-"))
                    .cloned()
                    .collect::<Vec<_>>()
            }),
            vec!["cell-year", "cell-month", "cell-day"]
        );
    }

    #[tokio::test]
    async fn unapplied_date_is_an_error_with_the_shown_text() {
        let policy = FlowPolicy::rehearsal();
        let page = MockPage::new(MockNode::new("root").child(date_widget("Termination Date")));
        page.on_fill("date-input", |dom, _| {
            dom.set_text("date-display", "pick a date");
        });
        let date = FlowDate::parse("2025-12-01").unwrap();
        let mut step = StepCtx::new(&page, &policy, "test-flow");
        let err = select_date(&mut step, "Termination Date", &date)
            .await
            .unwrap_err();
        match err {
            FlowError::DateNotApplied { expected, shown } => {
                assert_eq!(expected, "01/12/2025");
                assert!(shown.contains("pick a date"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
