//! End-to-end supplier offboarding runs against the scripted page.

use meshpilot_core_types::row::fields;
use meshpilot_core_types::{AgentKind, FlowError, FlowPolicy, ScenarioRow, WorkflowContext, WorkflowEnd};
use meshpilot_page_port::mock::{MockNode, MockPage};
use meshpilot_workflows::workflow_for;

async fn run(page: &MockPage, row: &ScenarioRow) -> Result<WorkflowEnd, FlowError> {
    let kind = AgentKind::SupplierOffboarding;
    let policy = FlowPolicy::rehearsal();
    let ctx = WorkflowContext::for_agent(kind);
    workflow_for(kind).run(page, &ctx, row, &policy).await
}

fn non_prompt_clicks(page: &MockPage) -> Vec<String> {
    page.inspect(|dom| {
        dom.click_log()
            .iter()
            .filter(|id| *id != "prompt")
            .cloned()
            .collect()
    })
}

/// The app answers the query with a selectable supplier grid.
fn grid_app() -> MockPage {
    let page = MockPage::new(
        MockNode::new("root")
            .child(MockNode::activity_counter(0))
            .child(MockNode::new("prompt").role("textbox").name("Ask the agent"))
            .child(
                MockNode::new("grid")
                    .role("grid")
                    .name("Suppliers")
                    .hidden()
                    .child(
                        MockNode::new("row-x")
                            .role("row")
                            .name("Supplier X")
                            .child(MockNode::new("cb-x").role("checkbox")),
                    ),
            )
            .child(MockNode::new("proceed").role("button").name("Proceed").hidden())
            .child(
                MockNode::new("reason-tprm")
                    .role("button")
                    .name("Not approved by TPRM")
                    .hidden(),
            )
            .child(
                MockNode::new("reason-quality")
                    .role("button")
                    .name("Quality issues")
                    .hidden(),
            )
            .child(MockNode::new("create").role("button").name("Create Request").hidden())
            .child(MockNode::new("send").role("button").name("Send for Validation").hidden())
            .child(
                MockNode::new("congrats")
                    .role("heading")
                    .text("Congratulations! The offboarding request was raised.")
                    .hidden(),
            ),
    );
    page.on_press("prompt", |dom, key| {
        if key == "Enter" {
            dom.bump_activity();
            dom.show("grid");
        }
    });
    page.on_click("cb-x", |dom| {
        dom.set_checked("cb-x", true);
        dom.show("proceed");
    });
    page.on_click("proceed", |dom| {
        dom.bump_activity();
        dom.show("reason-tprm");
        dom.show("reason-quality");
    });
    page.on_click("reason-tprm", |dom| dom.show("create"));
    page.on_click("create", |dom| {
        dom.bump_activity();
        dom.show("send");
    });
    page.on_click("send", |dom| {
        dom.hide("send");
        dom.show("congrats");
    });
    page
}

#[tokio::test]
async fn grid_variant_runs_to_validation() {
    let page = grid_app();
    let row = ScenarioRow::new("1")
        .with(fields::QUERY, "offboard supplier X")
        .with(fields::SUPPLIER_NAME, "Supplier X")
        .with(fields::OFFBOARD_REASON, "Not approved by TPRM");
    let end = run(&page, &row).await.unwrap();
    assert_eq!(end, WorkflowEnd::SendForValidation);
    assert_eq!(
        non_prompt_clicks(&page),
        vec!["cb-x", "proceed", "reason-tprm", "create", "send"]
    );
}

#[tokio::test]
async fn missing_reason_button_is_a_required_timeout() {
    let page = grid_app();
    let row = ScenarioRow::new("1")
        .with(fields::QUERY, "offboard supplier X")
        .with(fields::SUPPLIER_NAME, "Supplier X")
        .with(fields::OFFBOARD_REASON, "Strategic exit");
    let err = run(&page, &row).await.unwrap_err();
    assert!(err.is_timeout(), "unexpected: {err}");
    assert!(err.to_string().contains("Strategic exit"));
}

#[tokio::test]
async fn card_variant_needs_no_selection() {
    let page = MockPage::new(
        MockNode::new("root")
            .child(MockNode::activity_counter(0))
            .child(MockNode::new("prompt").role("textbox").name("Ask the agent"))
            .child(
                MockNode::new("card")
                    .text("Do you want to proceed with offboarding Supplier X?")
                    .hidden(),
            )
            .child(
                MockNode::new("pwr")
                    .role("button")
                    .name("Proceed with Request")
                    .hidden(),
            )
            .child(
                MockNode::new("reason-quality")
                    .role("button")
                    .name("Quality issues")
                    .hidden(),
            )
            .child(MockNode::new("create").role("button").name("Create Request").hidden())
            .child(
                MockNode::new("congrats")
                    .role("heading")
                    .text("Congratulations! All done.")
                    .hidden(),
            ),
    );
    page.on_press("prompt", |dom, key| {
        if key == "Enter" {
            dom.bump_activity();
            dom.show("card");
            dom.show("pwr");
        }
    });
    page.on_click("pwr", |dom| {
        dom.bump_activity();
        dom.show("reason-quality");
    });
    page.on_click("reason-quality", |dom| dom.show("create"));
    page.on_click("create", |dom| {
        dom.bump_activity();
        dom.show("congrats");
    });

    let row = ScenarioRow::new("2")
        .with(fields::QUERY, "offboard Supplier X right away")
        .with(fields::OFFBOARD_REASON, "Quality issues");
    let end = run(&page, &row).await.unwrap();
    assert_eq!(end, WorkflowEnd::Congratulations);
    assert_eq!(non_prompt_clicks(&page), vec!["pwr", "reason-quality", "create"]);
}

#[tokio::test]
async fn id_lookup_variant_narrows_then_selects() {
    let page = MockPage::new(
        MockNode::new("root")
            .child(MockNode::activity_counter(0))
            .child(MockNode::new("prompt").role("textbox").name("Ask the agent"))
            .child(
                MockNode::new("id-box")
                    .role("textbox")
                    .name("Enter identification number")
                    .hidden(),
            )
            .child(
                MockNode::new("grid")
                    .role("grid")
                    .name("Suppliers")
                    .hidden()
                    .child(
                        MockNode::new("row-y")
                            .role("row")
                            .name("Supplier Y")
                            .child(MockNode::new("cb-y").role("checkbox")),
                    ),
            )
            .child(MockNode::new("proceed").role("button").name("Proceed").hidden())
            .child(
                MockNode::new("reason-quality")
                    .role("button")
                    .name("Quality issues")
                    .hidden(),
            )
            .child(MockNode::new("create").role("button").name("Create Request").hidden())
            .child(
                MockNode::new("edit")
                    .role("button")
                    .name("Edit Project Request")
                    .hidden(),
            ),
    );
    page.on_press("prompt", |dom, key| {
        if key == "Enter" {
            dom.bump_activity();
            dom.show("id-box");
        }
    });
    page.on_press("id-box", |dom, key| {
        if key == "Enter" {
            dom.bump_activity();
            dom.show("grid");
        }
    });
    page.on_click("cb-y", |dom| dom.show("proceed"));
    page.on_click("proceed", |dom| {
        dom.bump_activity();
        dom.show("reason-quality");
    });
    page.on_click("reason-quality", |dom| dom.show("create"));
    page.on_click("create", |dom| {
        dom.bump_activity();
        dom.show("edit");
    });

    let row = ScenarioRow::new("3")
        .with(fields::QUERY, "offboard the supplier with this id")
        .with(fields::IDENTIFICATION_NUMBER, "ID-7781")
        .with(fields::OFFBOARD_REASON, "Quality issues");
    let end = run(&page, &row).await.unwrap();
    assert_eq!(end, WorkflowEnd::EditProjectRequestOnly);
    let fills = page.inspect(|dom| dom.fill_log().to_vec());
    assert!(fills.contains(&("id-box".to_string(), "ID-7781".to_string())));
    assert!(page.inspect(|dom| dom.click_log().contains(&"cb-y".to_string())));
}
