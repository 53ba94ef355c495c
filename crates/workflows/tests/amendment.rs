//! End-to-end contract amendment runs against the scripted page.

use meshpilot_core_types::row::fields;
use meshpilot_core_types::{AgentKind, FlowError, FlowPolicy, ScenarioRow, WorkflowContext, WorkflowEnd};
use meshpilot_page_port::mock::{MockNode, MockPage};
use meshpilot_workflows::workflow_for;

async fn run(page: &MockPage, row: &ScenarioRow) -> Result<WorkflowEnd, FlowError> {
    let kind = AgentKind::ContractAmendment;
    let policy = FlowPolicy::rehearsal();
    let ctx = WorkflowContext::for_agent(kind);
    workflow_for(kind).run(page, &ctx, row, &policy).await
}

/// The reason dropdown needs a second chevron click before its contents
/// materialize, like the real streamed control.
fn amendment_app() -> MockPage {
    let page = MockPage::new(
        MockNode::new("root")
            .child(MockNode::activity_counter(0))
            .child(MockNode::new("prompt").role("textbox").name("Ask the agent"))
            .child(
                MockNode::new("pwr")
                    .role("button")
                    .name("Proceed with Request")
                    .hidden(),
            )
            .child(
                MockNode::new("reason-trigger")
                    .role("combobox")
                    .name("Amendment Reason")
                    .hidden(),
            )
            .child(
                MockNode::new("reason-list")
                    .role("listbox")
                    .hidden()
                    .child(MockNode::new("opt-pricing").role("option").name("Pricing Change"))
                    .child(MockNode::new("opt-scope").role("option").name("Scope Change")),
            )
            .child(MockNode::new("am-proceed").role("button").name("Proceed").hidden())
            .child(MockNode::new("q1-yes").role("button").name("Yes").hidden())
            .child(MockNode::new("q2-yes").role("button").name("Yes").hidden())
            .child(MockNode::new("create").role("button").name("Create Request").hidden())
            .child(
                MockNode::new("edit")
                    .role("button")
                    .name("Edit Project Request")
                    .hidden(),
            ),
    );
    page.on_press("prompt", |dom, key| {
        if key != "Enter" {
            return;
        }
        dom.bump_activity();
        let value = dom.find("prompt").map(|n| n.value.clone()).unwrap_or_default();
        if value.contains("amend") {
            dom.show("pwr");
        } else if value.contains("discussed") {
            dom.show("reason-trigger");
        } else {
            dom.show("q1-yes");
        }
    });
    page.on_click("pwr", |dom| dom.bump_activity());
    let mut trigger_clicks = 0u32;
    page.on_click("reason-trigger", move |dom| {
        trigger_clicks += 1;
        if trigger_clicks >= 2 {
            dom.show("reason-list");
        }
    });
    page.on_click("opt-pricing", |dom| {
        dom.hide("reason-list");
        dom.show("am-proceed");
    });
    page.on_click("am-proceed", |dom| dom.bump_activity());
    page.on_click("q1-yes", |dom| {
        dom.hide("q1-yes");
        dom.show("q2-yes");
    });
    page.on_click("q2-yes", |dom| {
        dom.hide("q2-yes");
        dom.show("create");
    });
    page.on_click("create", |dom| {
        dom.bump_activity();
        dom.show("edit");
    });
    page
}

#[tokio::test]
async fn amendment_runs_to_edit_only_through_the_streamed_dropdown() {
    let page = amendment_app();
    let row = ScenarioRow::new("20")
        .with(fields::QUERY, "amend contract CT-88 pricing terms")
        .with(fields::AMENDMENT_REASON, "price increase for raw materials")
        .with(fields::DESCRIPTION, "Increase unit cost by 4% from January");
    let end = run(&page, &row).await.unwrap();
    assert_eq!(end, WorkflowEnd::EditProjectRequestOnly);

    let clicks = page.inspect(|dom| dom.click_log().to_vec());
    let trigger_clicks = clicks.iter().filter(|id| *id == "reason-trigger").count();
    assert_eq!(trigger_clicks, 2, "chevron should have been re-clicked once");
    // The keyword table turned the row phrasing into the canonical caption.
    assert!(clicks.contains(&"opt-pricing".to_string()));
    assert!(!clicks.contains(&"opt-scope".to_string()));
    // Both conditional questions answered.
    assert!(clicks.contains(&"q1-yes".to_string()));
    assert!(clicks.contains(&"q2-yes".to_string()));
}

#[tokio::test]
async fn missing_description_field_fails_by_name() {
    let page = amendment_app();
    let row = ScenarioRow::new("21")
        .with(fields::QUERY, "amend contract CT-88 pricing terms")
        .with(fields::AMENDMENT_REASON, "pricing");
    let err = run(&page, &row).await.unwrap_err();
    match err {
        FlowError::MissingField { sno, field } => {
            assert_eq!(sno, "21");
            assert_eq!(field, fields::DESCRIPTION);
        }
        other => panic!("unexpected error: {other}"),
    }
}
