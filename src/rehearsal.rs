//! Scripted pages for offline rehearsal runs.
//!
//! Each agent gets a cooperative mock application built from the scenario
//! row itself: grid rows are named after the row's supplier, reason lists
//! carry the canonical captions the keyword tables resolve to, and the date
//! widget echoes whatever rendering of the row's date gets typed. A
//! rehearsal run exercises the full state machine without a browser.

use meshpilot_core_types::row::fields;
use meshpilot_core_types::{AgentKind, ScenarioRow};
use meshpilot_page_port::mock::{MockNode, MockPage};
use meshpilot_workflows::FlowDate;

/// Build the scripted page for one agent/row pair.
pub fn scripted_page(agent: AgentKind, row: &ScenarioRow) -> MockPage {
    match agent {
        AgentKind::SupplierOffboarding => offboarding_page(row),
        AgentKind::ContractAmendment => amendment_page(row),
        AgentKind::ContractTermination => termination_page(row),
        AgentKind::ContractExtension => extension_page(row),
        AgentKind::SupplierProfileUpdate => profile_update_page(row),
    }
}

fn shell() -> MockNode {
    MockNode::new("root")
        .child(MockNode::activity_counter(0))
        .child(MockNode::new("prompt").role("textbox").name("Ask the agent"))
}

fn congrats() -> MockNode {
    MockNode::new("congrats")
        .role("heading")
        .text("Congratulations! Your request has been created.")
        .hidden()
}

/// Wire the typed-date protocol: echo the day-first rendering into the
/// display once any accepted form of `date` lands in the input, then
/// surface the proceed control.
fn wire_date_widget(page: &MockPage, date: Option<FlowDate>, proceed_id: &'static str) {
    let Some(date) = date else { return };
    let forms = date.typed_forms();
    let shown = date.day_first();
    page.on_fill("date-input", move |dom, text| {
        if forms.iter().any(|form| form.as_str() == text) {
            dom.set_text("date-display", shown.as_str());
            dom.show(proceed_id);
        }
    });
}

fn date_widget(label: &str) -> MockNode {
    MockNode::new("date-widget")
        .text(label)
        .hidden()
        .child(MockNode::new("cal-toggle").role("button").name("Open calendar"))
        .child(MockNode::new("date-input").role("textbox"))
        .child(MockNode::new("date-display").css(".date-display"))
}

fn offboarding_page(row: &ScenarioRow) -> MockPage {
    let supplier = row.get(fields::SUPPLIER_NAME).unwrap_or("Supplier").to_string();
    let reason = row.get(fields::OFFBOARD_REASON).unwrap_or("Other").to_string();

    let page = MockPage::new(
        shell()
            .child(
                MockNode::new("grid")
                    .role("grid")
                    .name("Suppliers")
                    .hidden()
                    .child(
                        MockNode::new("row-supplier")
                            .role("row")
                            .name(&supplier)
                            .text(&supplier)
                            .child(MockNode::new("cb-supplier").role("checkbox")),
                    ),
            )
            .child(
                MockNode::new("pwr")
                    .role("button")
                    .name("Proceed with Request")
                    .hidden(),
            )
            .child(MockNode::new("reason").role("button").name(&reason).hidden())
            .child(MockNode::new("create").role("button").name("Create Request").hidden())
            .child(congrats()),
    );
    page.on_press("prompt", |dom, key| {
        if key == "Enter" {
            dom.bump_activity();
            dom.show("grid");
        }
    });
    page.on_click("cb-supplier", |dom| dom.show("pwr"));
    page.on_click("pwr", |dom| {
        dom.bump_activity();
        dom.show("reason");
    });
    page.on_click("reason", |dom| dom.show("create"));
    page.on_click("create", |dom| {
        dom.bump_activity();
        dom.show("congrats");
    });
    page
}

/// Canonical captions the amendment keyword table can resolve to, plus the
/// row's raw phrasing so unmatched wording still finds an option.
fn amendment_page(row: &ScenarioRow) -> MockPage {
    let mut list = MockNode::new("reason-list").role("listbox").hidden();
    let captions = [
        "Pricing Change",
        "Scope Change",
        "Duration Change",
        "Terms and Conditions",
        "Volume Change",
    ];
    for (i, caption) in captions.iter().enumerate() {
        list = list.child(MockNode::new(format!("opt-{i}")).role("option").name(*caption));
    }
    if let Some(raw) = row.get(fields::AMENDMENT_REASON) {
        if !captions.iter().any(|c| c.eq_ignore_ascii_case(raw)) {
            list = list.child(MockNode::new("opt-raw").role("option").name(raw));
        }
    }

    let page = MockPage::new(
        shell()
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
            .child(list)
            .child(MockNode::new("am-proceed").role("button").name("Proceed").hidden())
            .child(MockNode::new("create").role("button").name("Create Request").hidden())
            .child(congrats()),
    );
    let mut presses = 0u32;
    page.on_press("prompt", move |dom, key| {
        if key != "Enter" {
            return;
        }
        dom.bump_activity();
        presses += 1;
        match presses {
            1 => dom.show("pwr"),
            2 => dom.show("reason-trigger"),
            _ => dom.show("create"),
        }
    });
    page.on_click("pwr", |dom| dom.bump_activity());
    page.on_click("reason-trigger", |dom| dom.show("reason-list"));
    for i in 0..5 {
        page.on_click(format!("opt-{i}"), |dom| {
            dom.hide("reason-list");
            dom.show("am-proceed");
        });
    }
    page.on_click("opt-raw", |dom| {
        dom.hide("reason-list");
        dom.show("am-proceed");
    });
    page.on_click("am-proceed", |dom| dom.bump_activity());
    page.on_click("create", |dom| {
        dom.bump_activity();
        dom.show("congrats");
    });
    page
}

fn termination_page(row: &ScenarioRow) -> MockPage {
    let date = row
        .get(fields::TERMINATION_DATE)
        .and_then(|v| FlowDate::parse(v).ok());

    let mut list = MockNode::new("reason-list").role("listbox").hidden();
    let captions = [
        "Budget Cuts",
        "Poor Performance",
        "Breach of Contract",
        "Compliance Concerns",
        "Change in Business Needs",
    ];
    for (i, caption) in captions.iter().enumerate() {
        list = list.child(MockNode::new(format!("opt-{i}")).role("option").name(*caption));
    }

    let page = MockPage::new(
        shell()
            .child(
                MockNode::new("pwr")
                    .role("button")
                    .name("Proceed with Request")
                    .hidden(),
            )
            .child(
                MockNode::new("imm")
                    .role("button")
                    .name("Terminate Immediately")
                    .hidden(),
            )
            .child(
                MockNode::new("fut")
                    .role("button")
                    .name("Terminate for a future date")
                    .hidden(),
            )
            .child(date_widget("Termination Date"))
            .child(MockNode::new("t-proceed").role("button").name("Proceed").hidden())
            .child(
                MockNode::new("reason-trigger")
                    .role("combobox")
                    .name("Termination Reason")
                    .hidden(),
            )
            .child(list)
            .child(MockNode::new("create").role("button").name("Create Request").hidden())
            .child(congrats()),
    );
    page.on_press("prompt", |dom, key| {
        if key == "Enter" {
            dom.bump_activity();
            dom.show("pwr");
        }
    });
    page.on_click("pwr", |dom| {
        dom.bump_activity();
        dom.show("imm");
        dom.show("fut");
    });
    page.on_click("imm", |dom| dom.show("create"));
    page.on_click("fut", |dom| dom.show("date-widget"));
    wire_date_widget(&page, date, "t-proceed");
    page.on_click("t-proceed", |dom| {
        dom.bump_activity();
        dom.show("reason-trigger");
    });
    page.on_click("reason-trigger", |dom| dom.show("reason-list"));
    for i in 0..5 {
        page.on_click(format!("opt-{i}"), |dom| {
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

fn extension_page(row: &ScenarioRow) -> MockPage {
    let contract = row.get(fields::CONTRACT_ID).unwrap_or("Contract").to_string();
    let date = row
        .get(fields::EXTENSION_DATE)
        .and_then(|v| FlowDate::parse(v).ok());

    let mut reasons = MockNode::new("reason-list").role("listbox").hidden();
    let captions = [
        "Ongoing Project Needs",
        "Favorable Market Terms",
        "Strong Performance",
        "Capacity Requirements",
        "Business Continuity",
    ];
    for (i, caption) in captions.iter().enumerate() {
        reasons = reasons.child(MockNode::new(format!("opt-{i}")).role("option").name(*caption));
    }
    if let Some(raw) = row.get(fields::EXTENSION_REASON) {
        if !captions.iter().any(|c| c.eq_ignore_ascii_case(raw)) {
            reasons = reasons.child(MockNode::new("opt-raw").role("option").name(raw));
        }
    }

    // The applicable-options multiselect mirrors whatever the row asks for.
    let mut options = MockNode::new("options-list").role("listbox").hidden();
    let mut option_ids = Vec::new();
    if let Some(raw) = row.get(fields::APPLICABLE_OPTIONS) {
        for (i, entry) in raw
            .split([';', ','])
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .enumerate()
        {
            let id = format!("multi-{i}");
            options = options.child(MockNode::new(id.as_str()).role("option").name(entry));
            option_ids.push(id);
        }
    }

    let page = MockPage::new(
        shell()
            .child(
                MockNode::new("banner")
                    .text(format!("Contract {contract} conversation summary"))
                    .hidden(),
            )
            .child(
                MockNode::new("pwr")
                    .role("button")
                    .name("Proceed with Request")
                    .hidden(),
            )
            .child(date_widget("Extension Date"))
            .child(MockNode::new("ext-proceed").role("button").name("Proceed").hidden())
            .child(
                MockNode::new("reason-trigger")
                    .role("combobox")
                    .name("Extension Reason")
                    .hidden(),
            )
            .child(reasons)
            .child(
                MockNode::new("radio-propose")
                    .role("radio")
                    .name("Propose modifications")
                    .hidden(),
            )
            .child(
                MockNode::new("radio-keep")
                    .role("radio")
                    .name("Keep unchanged")
                    .hidden(),
            )
            .child(
                MockNode::new("options-trigger")
                    .role("combobox")
                    .name("Applicable Options")
                    .hidden(),
            )
            .child(options)
            .child(congrats()),
    );
    let mut presses = 0u32;
    page.on_press("prompt", move |dom, key| {
        if key != "Enter" {
            return;
        }
        dom.bump_activity();
        presses += 1;
        if presses == 1 {
            dom.show("banner");
            dom.show("pwr");
        } else {
            dom.show("congrats");
        }
    });
    page.on_click("pwr", |dom| {
        dom.bump_activity();
        dom.show("date-widget");
    });
    wire_date_widget(&page, date, "ext-proceed");
    page.on_click("ext-proceed", |dom| {
        dom.bump_activity();
        dom.show("reason-trigger");
    });
    page.on_click("reason-trigger", |dom| dom.show("reason-list"));
    for i in 0..5 {
        page.on_click(format!("opt-{i}"), |dom| {
            dom.hide("reason-list");
            dom.show("radio-propose");
            dom.show("radio-keep");
        });
    }
    page.on_click("opt-raw", |dom| {
        dom.hide("reason-list");
        dom.show("radio-propose");
        dom.show("radio-keep");
    });
    page.on_click("radio-propose", |dom| {
        dom.set_checked("radio-propose", true);
        dom.show("options-trigger");
    });
    page.on_click("radio-keep", |dom| dom.set_checked("radio-keep", true));
    page.on_click("options-trigger", |dom| dom.show("options-list"));
    for id in option_ids {
        page.on_click(id.clone(), move |dom| dom.toggle_selected(&id));
    }
    page
}

fn profile_update_page(row: &ScenarioRow) -> MockPage {
    let name = row.get(fields::SUPPLIER_NAME).unwrap_or("Supplier").to_string();
    let code = row.get(fields::SUPPLIER_CODE).unwrap_or("").to_string();
    let update_type = row.get(fields::UPDATE_TYPE).unwrap_or("Other").to_string();

    let page = MockPage::new(
        shell()
            .child(
                MockNode::new("grid")
                    .role("grid")
                    .name("Suppliers")
                    .hidden()
                    .child(
                        MockNode::new("row-supplier")
                            .role("row")
                            .name(&name)
                            .text(format!("{name} {code}"))
                            .child(MockNode::new("cb-supplier").role("checkbox")),
                    ),
            )
            .child(
                MockNode::new("pwr")
                    .role("button")
                    .name("Proceed with Request")
                    .hidden(),
            )
            .child(
                MockNode::new("choose-trigger")
                    .role("combobox")
                    .name("Choose Option(s)")
                    .hidden(),
            )
            .child(
                MockNode::new("choose-list")
                    .role("listbox")
                    .hidden()
                    .child(MockNode::new("opt-type").role("option").name(&update_type)),
            )
            .child(MockNode::new("pu-proceed").role("button").name("Proceed").hidden())
            .child(
                MockNode::new("upload-widget")
                    .css("[data-upload-widget]")
                    .text("Upload supporting documents")
                    .hidden()
                    .child(MockNode::new("file-input").css("input[type='file']")),
            )
            .child(MockNode::new("done").role("button").name("Done").hidden())
            .child(MockNode::new("create").role("button").name("Create Request").hidden())
            .child(MockNode::new("send").role("button").name("Send for Validation").hidden())
            .child(congrats()),
    );
    let mut presses = 0u32;
    page.on_press("prompt", move |dom, key| {
        if key != "Enter" {
            return;
        }
        dom.bump_activity();
        presses += 1;
        if presses == 1 {
            dom.show("grid");
        } else {
            dom.show("upload-widget");
            dom.show("done");
        }
    });
    page.on_click("cb-supplier", |dom| dom.show("pwr"));
    page.on_click("pwr", |dom| {
        dom.bump_activity();
        dom.show("choose-trigger");
    });
    page.on_click("choose-trigger", |dom| dom.show("choose-list"));
    page.on_click("opt-type", |dom| {
        dom.toggle_selected("opt-type");
        dom.show("pu-proceed");
    });
    page.on_click("pu-proceed", |dom| {
        dom.bump_activity();
        dom.hide("choose-list");
    });
    page.on_click("done", |dom| dom.show("create"));
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
