//! End-to-end contract termination runs against the scripted page.

use meshpilot_core_types::row::fields;
use meshpilot_core_types::{AgentKind, FlowError, FlowPolicy, ScenarioRow, WorkflowContext, WorkflowEnd};
use meshpilot_page_port::mock::{MockNode, MockPage};
use meshpilot_workflows::workflow_for;

async fn run(page: &MockPage, row: &ScenarioRow) -> Result<WorkflowEnd, FlowError> {
    let kind = AgentKind::ContractTermination;
    let policy = FlowPolicy::rehearsal();
    let ctx = WorkflowContext::for_agent(kind);
    workflow_for(kind).run(page, &ctx, row, &policy).await
}

fn termination_app() -> MockPage {
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
                MockNode::new("term-imm")
                    .role("button")
                    .name("Terminate Immediately")
                    .hidden(),
            )
            .child(
                MockNode::new("term-future")
                    .role("button")
                    .name("Terminate for a future date")
                    .hidden(),
            )
            .child(
                MockNode::new("date-widget")
                    .text("Termination Date")
                    .hidden()
                    .child(MockNode::new("cal-toggle").role("button").name("Open calendar"))
                    .child(MockNode::new("date-input").role("textbox"))
                    .child(MockNode::new("date-display").css(".date-display")),
            )
            .child(MockNode::new("date-proceed").role("button").name("Proceed").hidden())
            .child(
                MockNode::new("reason-trigger")
                    .role("combobox")
                    .name("Termination Reason")
                    .hidden(),
            )
            .child(
                MockNode::new("reason-list")
                    .role("listbox")
                    .hidden()
                    .child(MockNode::new("opt-budget").role("option").name("Budget Cuts"))
                    .child(
                        MockNode::new("opt-breach")
                            .role("option")
                            .name("Breach of Contract"),
                    )
                    .child(MockNode::new("opt-perf").role("option").name("Poor Performance"))
                    .child(
                        MockNode::new("opt-quality")
                            .role("option")
                            .name("Quality issues"),
                    ),
            )
            .child(MockNode::new("create").role("button").name("Create Request").hidden())
            .child(
                MockNode::new("congrats")
                    .role("heading")
                    .text("Congratulations! The termination request is in.")
                    .hidden(),
            ),
    );
    page.on_press("prompt", |dom, key| {
        if key == "Enter" {
            dom.bump_activity();
            dom.show("pwr");
        }
    });
    page.on_click("pwr", |dom| {
        dom.bump_activity();
        dom.show("term-imm");
        dom.show("term-future");
    });
    page.on_click("term-imm", |dom| {
        dom.hide("term-future");
        dom.show("reason-trigger");
    });
    page.on_click("term-future", |dom| {
        dom.hide("term-imm");
        dom.show("date-widget");
    });
    page.on_fill("date-input", |dom, text| {
        if text == "2025-12-01" {
            dom.set_text("date-display", "01/12/2025");
            dom.show("date-proceed");
        }
    });
    page.on_click("date-proceed", |dom| {
        dom.bump_activity();
        dom.show("reason-trigger");
    });
    page.on_click("reason-trigger", |dom| dom.show("reason-list"));
    for opt in ["opt-budget", "opt-perf", "opt-quality"] {
        page.on_click(opt, |dom| {
            dom.hide("reason-list");
            dom.show("create");
        });
    }
    page.on_click("create", |dom| {
        dom.bump_activity();
        dom.show("congrats");
    });
    page
}

#[tokio::test]
async fn immediate_branch_never_touches_the_date_widget() {
    let page = termination_app();
    let row = ScenarioRow::new("10")
        .with(fields::QUERY, "terminate the logistics contract")
        .with(fields::TERMINATION_STATUS, "Immediate")
        .with(fields::TERMINATION_REASON, "budget cuts after restructuring");
    let end = run(&page, &row).await.unwrap();
    assert_eq!(end, WorkflowEnd::Congratulations);

    let clicks = page.inspect(|dom| dom.click_log().to_vec());
    assert!(clicks.contains(&"term-imm".to_string()));
    assert!(!clicks.contains(&"term-future".to_string()));
    assert!(!clicks.contains(&"cal-toggle".to_string()));
    let fills = page.inspect(|dom| dom.fill_log().to_vec());
    assert!(fills.iter().all(|(id, _)| id == "prompt"));
}

#[tokio::test]
async fn future_branch_runs_the_date_protocol() {
    let page = termination_app();
    let row = ScenarioRow::new("11")
        .with(fields::QUERY, "terminate the logistics contract")
        .with(fields::TERMINATION_STATUS, "future date")
        .with(fields::TERMINATION_DATE, "2025-12-01")
        .with(fields::TERMINATION_REASON, "Budget Cuts");
    let end = run(&page, &row).await.unwrap();
    assert_eq!(end, WorkflowEnd::Congratulations);

    let clicks = page.inspect(|dom| dom.click_log().to_vec());
    assert!(clicks.contains(&"term-future".to_string()));
    assert!(clicks.contains(&"date-proceed".to_string()));
    // The ISO row value was rendered back by the widget in day-first form.
    let shown = page.inspect(|dom| dom.find("date-display").unwrap().text.clone());
    assert_eq!(shown, "01/12/2025");
}

#[tokio::test]
async fn day_first_row_value_drives_the_same_widget_state() {
    let page = termination_app();
    let row = ScenarioRow::new("12")
        .with(fields::QUERY, "terminate the logistics contract")
        .with(fields::TERMINATION_STATUS, "terminate at a future date")
        .with(fields::TERMINATION_DATE, "01/12/2025")
        .with(fields::TERMINATION_REASON, "Budget Cuts");
    let end = run(&page, &row).await.unwrap();
    assert_eq!(end, WorkflowEnd::Congratulations);
    let shown = page.inspect(|dom| dom.find("date-display").unwrap().text.clone());
    assert_eq!(shown, "01/12/2025");
}

#[tokio::test]
async fn reason_rendered_literally_is_picked_over_its_keyword_caption() {
    let page = termination_app();
    // "Quality issues" maps to "Poor Performance" in the keyword table, but
    // this dropdown renders the literal phrasing too; the literal must win.
    let row = ScenarioRow::new("14")
        .with(fields::QUERY, "terminate the logistics contract")
        .with(fields::TERMINATION_STATUS, "Immediate")
        .with(fields::TERMINATION_REASON, "Quality issues");
    let end = run(&page, &row).await.unwrap();
    assert_eq!(end, WorkflowEnd::Congratulations);

    let clicks = page.inspect(|dom| dom.click_log().to_vec());
    assert!(clicks.contains(&"opt-quality".to_string()));
    assert!(!clicks.contains(&"opt-perf".to_string()), "keyword caption preempted the literal");
}

#[tokio::test]
async fn unsupported_status_fails_before_any_branch_click() {
    let page = termination_app();
    let row = ScenarioRow::new("13")
        .with(fields::QUERY, "terminate the logistics contract")
        .with(fields::TERMINATION_STATUS, "someday")
        .with(fields::TERMINATION_REASON, "Budget Cuts");
    let err = run(&page, &row).await.unwrap_err();
    match err {
        FlowError::UnsupportedScenario { value, supported, .. } => {
            assert_eq!(value, "someday");
            assert!(supported.contains(&"future".to_string()));
            assert!(supported.contains(&"immediate".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
    let clicks = page.inspect(|dom| dom.click_log().to_vec());
    assert!(!clicks.contains(&"term-imm".to_string()));
    assert!(!clicks.contains(&"term-future".to_string()));
}
