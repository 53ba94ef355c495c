//! The matcher table: semantic intents and their ordered candidate queries.
//!
//! Order is the tie-break policy. Exact accessible-role + name comes first,
//! then case-insensitive patterns over visible text, then structural
//! fallbacks (CSS hooks, containing elements). Positional fallback for
//! dropdown options lives in the resolver, not here.

use std::fmt;

use meshpilot_page_port::{ElementQuery, TextMatch};

/// A semantic UI intent, independent of the app build's concrete markup.
#[derive(Clone, Debug, PartialEq)]
pub enum Intent {
    /// The conversational prompt input box.
    PromptInput,
    /// The bare "Proceed" action.
    Proceed,
    /// The "Proceed with Request" action.
    ProceedWithRequest,
    /// The "Create Request" action.
    CreateRequest,
    /// The "Send for Validation" action on the terminal screen.
    SendForValidation,
    /// The "Edit Project Request" control on the terminal screen.
    EditProjectRequest,
    /// The congratulations message shown on full completion.
    CongratulationsBanner,
    /// A "Yes" answer, optionally scoped to the question that asked it.
    YesAnswer { question: Option<String> },
    /// A "No" answer, optionally scoped to the question that asked it.
    NoAnswer { question: Option<String> },
    /// The trigger (chevron) of a labeled dropdown/listbox.
    DropdownTrigger { label: String },
    /// The in-flight spinner shown while dropdown contents stream in.
    LoadingSpinner,
    /// A selection checkbox inside a tabular row, optionally text-matched.
    GridRowCheckbox { row_text: Option<String> },
    /// A grid/table row, optionally text-matched.
    GridRow { text: Option<String> },
    /// The opener of a labeled date-entry control.
    DateControl { label: String },
    /// The raw text/date input inside a labeled date-entry control.
    DateInput { label: String },
    /// The widget element whose text/aria renders the chosen date.
    DateDisplay { label: String },
    /// The calendar popup, when the date control opens one.
    CalendarOverlay,
    /// One calendar cell (period, year, month or day) by exact text.
    CalendarCell { text: String },
    /// The file input of the upload widget. Strictly scoped to the widget's
    /// own control: a page-global file input would misdirect the attachment
    /// into the chat composer.
    FileAttachment,
    /// The optional "Done" control of the upload widget.
    DoneButton,
    /// The optional "Add" control of the upload widget.
    AddButton,
    /// The immediate-termination branch button.
    TerminateImmediately,
    /// The future-dated-termination branch button.
    TerminateFutureDate,
    /// The modification radio choice on the extension flow.
    ModificationChoice { propose: bool },
    /// The FAQ overlay that occasionally blocks unrelated controls.
    FaqOverlay,
    /// The control dismissing the FAQ overlay.
    FaqDismiss,
}

impl Intent {
    /// Short name for logs and failure messages.
    pub fn describe(&self) -> String {
        match self {
            Intent::PromptInput => "prompt input".into(),
            Intent::Proceed => "Proceed".into(),
            Intent::ProceedWithRequest => "Proceed with Request".into(),
            Intent::CreateRequest => "Create Request".into(),
            Intent::SendForValidation => "Send for Validation".into(),
            Intent::EditProjectRequest => "Edit Project Request".into(),
            Intent::CongratulationsBanner => "congratulations banner".into(),
            Intent::YesAnswer { question: Some(q) } => format!("Yes answer for '{q}'"),
            Intent::YesAnswer { question: None } => "Yes answer".into(),
            Intent::NoAnswer { question: Some(q) } => format!("No answer for '{q}'"),
            Intent::NoAnswer { question: None } => "No answer".into(),
            Intent::DropdownTrigger { label } => format!("dropdown '{label}'"),
            Intent::LoadingSpinner => "loading spinner".into(),
            Intent::GridRowCheckbox { row_text: Some(t) } => format!("row checkbox '{t}'"),
            Intent::GridRowCheckbox { row_text: None } => "row checkbox".into(),
            Intent::GridRow { text: Some(t) } => format!("grid row '{t}'"),
            Intent::GridRow { text: None } => "grid row".into(),
            Intent::DateControl { label } => format!("date control '{label}'"),
            Intent::DateInput { label } => format!("date input '{label}'"),
            Intent::DateDisplay { label } => format!("date display '{label}'"),
            Intent::CalendarOverlay => "calendar overlay".into(),
            Intent::CalendarCell { text } => format!("calendar cell '{text}'"),
            Intent::FileAttachment => "file attachment input".into(),
            Intent::DoneButton => "Done".into(),
            Intent::AddButton => "Add".into(),
            Intent::TerminateImmediately => "Terminate Immediately".into(),
            Intent::TerminateFutureDate => "Terminate for a future date".into(),
            Intent::ModificationChoice { propose: true } => "propose modifications".into(),
            Intent::ModificationChoice { propose: false } => "keep unchanged".into(),
            Intent::FaqOverlay => "FAQ overlay".into(),
            Intent::FaqDismiss => "FAQ dismiss".into(),
        }
    }

    /// The ordered candidate queries for this intent.
    pub fn candidates(&self) -> Vec<ElementQuery> {
        use ElementQuery as Q;
        use TextMatch::{Any, Contains, Exact, Pattern};

        match self {
            Intent::PromptInput => vec![
                Q::role("textbox", Contains("ask".into())),
                Q::role("textbox", Contains("prompt".into())),
                Q::css("textarea"),
                Q::css("[contenteditable='true']"),
                Q::role("textbox", Any),
            ],
            Intent::Proceed => vec![
                Q::role("button", Exact("Proceed".into())),
                Q::text(Pattern(r"^\s*proceed\s*$".into())),
                Q::css("[data-action='proceed']"),
            ],
            Intent::ProceedWithRequest => vec![
                Q::role("button", Exact("Proceed with Request".into())),
                Q::text(Pattern(r"proceed\s+with\s+request".into())),
                Q::role("button", Contains("with request".into())),
            ],
            Intent::CreateRequest => vec![
                Q::role("button", Exact("Create Request".into())),
                Q::text(Pattern(r"create\s+request".into())),
                Q::css("[data-action='create-request']"),
            ],
            Intent::SendForValidation => vec![
                Q::role("button", Exact("Send for Validation".into())),
                Q::text(Pattern(r"send\s+for\s+validation".into())),
            ],
            Intent::EditProjectRequest => vec![
                Q::role("button", Exact("Edit Project Request".into())),
                Q::text(Pattern(r"edit\s+project\s+request".into())),
            ],
            Intent::CongratulationsBanner => vec![
                Q::role("heading", Contains("congratulations".into())),
                Q::text(Contains("congratulations".into())),
                Q::css(".congrats-banner"),
            ],
            Intent::YesAnswer { question } => scoped_answer(question.as_deref(), "Yes"),
            Intent::NoAnswer { question } => scoped_answer(question.as_deref(), "No"),
            Intent::DropdownTrigger { label } => vec![
                Q::role("combobox", Contains(label.clone())),
                Q::within(
                    Q::text(Contains(label.clone())),
                    Q::css(".dropdown-chevron"),
                ),
                Q::within(Q::text(Contains(label.clone())), Q::role("button", Any)),
                Q::css(".dropdown-chevron"),
            ],
            Intent::LoadingSpinner => vec![
                Q::role("progressbar", Any),
                Q::css(".loading-spinner"),
            ],
            Intent::GridRowCheckbox { row_text } => match row_text {
                Some(text) => vec![
                    Q::within(
                        Q::role("row", Contains(text.clone())),
                        Q::role("checkbox", Any),
                    ),
                    Q::within(Q::text(Contains(text.clone())), Q::role("checkbox", Any)),
                    Q::within(Q::role("grid", Any), Q::role("checkbox", Any)),
                ],
                None => vec![
                    Q::within(Q::role("grid", Any), Q::role("checkbox", Any)),
                    Q::within(Q::role("table", Any), Q::role("checkbox", Any)),
                    Q::role("checkbox", Any),
                ],
            },
            Intent::GridRow { text } => match text {
                Some(t) => vec![
                    Q::role("row", Contains(t.clone())),
                    Q::within(Q::role("grid", Any), Q::text(Contains(t.clone()))),
                ],
                None => vec![
                    Q::within(Q::role("grid", Any), Q::role("row", Any)),
                    Q::role("row", Any),
                ],
            },
            Intent::DateControl { label } => vec![
                Q::within(
                    Q::text(Contains(label.clone())),
                    Q::role("button", Contains("calendar".into())),
                ),
                Q::role("button", Contains("calendar".into())),
                Q::within(Q::text(Contains(label.clone())), Q::css(".date-display")),
                Q::within(Q::text(Contains(label.clone())), Q::css("input")),
                Q::css("[data-date-widget]"),
            ],
            Intent::DateInput { label } => vec![
                Q::within(Q::text(Contains(label.clone())), Q::role("textbox", Any)),
                Q::within(Q::text(Contains(label.clone())), Q::css("input")),
                Q::css("input[type='date']"),
                Q::role("textbox", Contains("date".into())),
            ],
            Intent::DateDisplay { label } => vec![
                Q::within(Q::text(Contains(label.clone())), Q::css(".date-display")),
                Q::css("[data-date-widget]"),
                Q::text(Contains(label.clone())),
            ],
            Intent::CalendarOverlay => vec![
                Q::role("dialog", Contains("calendar".into())),
                Q::css(".calendar-overlay"),
                Q::role("grid", Contains("calendar".into())),
            ],
            Intent::CalendarCell { text } => vec![
                Q::within(
                    Q::role("dialog", Contains("calendar".into())),
                    Q::role("gridcell", Exact(text.clone())),
                ),
                Q::within(
                    Q::css(".calendar-overlay"),
                    Q::text(Exact(text.clone())),
                ),
                Q::role("gridcell", Exact(text.clone())),
                Q::role("button", Exact(text.clone())),
            ],
            Intent::FileAttachment => vec![
                Q::within(
                    Q::css("[data-upload-widget]"),
                    Q::css("input[type='file']"),
                ),
                Q::within(
                    Q::text(Contains("upload".into())),
                    Q::css("input[type='file']"),
                ),
                Q::within(
                    Q::text(Contains("attach".into())),
                    Q::css("input[type='file']"),
                ),
            ],
            Intent::DoneButton => vec![
                Q::role("button", Exact("Done".into())),
                Q::text(Pattern(r"^\s*done\s*$".into())),
            ],
            Intent::AddButton => vec![
                Q::role("button", Exact("Add".into())),
                Q::text(Pattern(r"^\s*add\s*$".into())),
            ],
            Intent::TerminateImmediately => vec![
                Q::role("button", Exact("Terminate Immediately".into())),
                Q::text(Pattern(r"terminate\s+immediately".into())),
            ],
            Intent::TerminateFutureDate => vec![
                Q::role("button", Exact("Terminate for a future date".into())),
                Q::text(Pattern(r"terminate\s+for\s+a\s+future\s+date".into())),
                Q::text(Pattern(r"future\s+date".into())),
            ],
            Intent::ModificationChoice { propose: true } => vec![
                Q::role("radio", Contains("propose".into())),
                Q::text(Pattern(r"propose\s+modifications?".into())),
            ],
            Intent::ModificationChoice { propose: false } => vec![
                Q::role("radio", Contains("keep".into())),
                Q::text(Pattern(r"keep\s+(it\s+)?unchanged".into())),
            ],
            Intent::FaqOverlay => vec![
                Q::role("dialog", Contains("faq".into())),
                Q::css(".faq-overlay"),
            ],
            Intent::FaqDismiss => vec![
                Q::within(
                    Q::role("dialog", Contains("faq".into())),
                    Q::role("button", Contains("close".into())),
                ),
                Q::within(Q::css(".faq-overlay"), Q::role("button", Any)),
                Q::role("button", Exact("Got it".into())),
            ],
        }
    }
}

fn scoped_answer(question: Option<&str>, answer: &str) -> Vec<ElementQuery> {
    use ElementQuery as Q;
    use TextMatch::{Contains, Exact, Pattern};

    let mut out = Vec::new();
    if let Some(q) = question {
        out.push(Q::within(
            Q::text(Contains(q.to_string())),
            Q::role("button", Exact(answer.to_string())),
        ));
    }
    out.push(Q::role("button", Exact(answer.to_string())));
    out.push(Q::text(Pattern(format!(r"^\s*{}\s*$", answer.to_lowercase()))));
    out
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}
