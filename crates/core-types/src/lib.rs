//! Shared primitives for the meshpilot workflow driver.
//!
//! Everything here is created at workflow-invocation start and discarded at
//! invocation end; no type in this crate owns cross-run state.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod errors;
pub mod policy;
pub mod row;
pub mod session;

pub use errors::{FlowError, PageDiagnostics};
pub use policy::{FlowPolicy, FlowTimeouts};
pub use row::ScenarioRow;
pub use session::SessionProvider;

/// Unique id for one workflow invocation, used for log correlation.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The five conversational personas exposed by the Qube Mesh agent picker.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    SupplierOffboarding,
    ContractAmendment,
    ContractTermination,
    ContractExtension,
    SupplierProfileUpdate,
}

impl AgentKind {
    /// Display name as shown in the application's agent picker.
    pub fn name(&self) -> &'static str {
        match self {
            AgentKind::SupplierOffboarding => "Supplier Offboarding",
            AgentKind::ContractAmendment => "Contract Amendment",
            AgentKind::ContractTermination => "Contract Termination",
            AgentKind::ContractExtension => "Contract Extension",
            AgentKind::SupplierProfileUpdate => "Supplier Profile Update",
        }
    }

    /// Position of the agent tile in the picker, zero-based.
    pub fn index(&self) -> usize {
        match self {
            AgentKind::SupplierOffboarding => 0,
            AgentKind::ContractAmendment => 1,
            AgentKind::ContractTermination => 2,
            AgentKind::ContractExtension => 3,
            AgentKind::SupplierProfileUpdate => 4,
        }
    }

    pub fn all() -> [AgentKind; 5] {
        [
            AgentKind::SupplierOffboarding,
            AgentKind::ContractAmendment,
            AgentKind::ContractTermination,
            AgentKind::ContractExtension,
            AgentKind::SupplierProfileUpdate,
        ]
    }

    /// Parse a CLI-style identifier like `contract-termination`.
    pub fn from_slug(slug: &str) -> Option<AgentKind> {
        let normalized = slug.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "supplier-offboarding" | "offboarding" => Some(AgentKind::SupplierOffboarding),
            "contract-amendment" | "amendment" => Some(AgentKind::ContractAmendment),
            "contract-termination" | "termination" => Some(AgentKind::ContractTermination),
            "contract-extension" | "extension" => Some(AgentKind::ContractExtension),
            "supplier-profile-update" | "profile-update" => Some(AgentKind::SupplierProfileUpdate),
            _ => None,
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            AgentKind::SupplierOffboarding => "supplier-offboarding",
            AgentKind::ContractAmendment => "contract-amendment",
            AgentKind::ContractTermination => "contract-termination",
            AgentKind::ContractExtension => "contract-extension",
            AgentKind::SupplierProfileUpdate => "supplier-profile-update",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifies which agent/persona a workflow invocation exercises.
///
/// Immutable; passed by reference into every state-machine step.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct WorkflowContext {
    pub agent_name: String,
    pub agent_index: usize,
}

impl WorkflowContext {
    pub fn for_agent(kind: AgentKind) -> Self {
        Self {
            agent_name: kind.name().to_string(),
            agent_index: kind.index(),
        }
    }
}

/// The shared end-of-workflow contract.
///
/// Every workflow converges to exactly one of these three states; any other
/// terminal condition is a failure surfaced as a [`FlowError`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowEnd {
    /// The flow fully completed and the congratulations screen is shown.
    Congratulations,
    /// The explicit validation step was clicked and succeeded.
    SendForValidation,
    /// The flow stopped at a request-created-but-not-validated state.
    EditProjectRequestOnly,
}

impl WorkflowEnd {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowEnd::Congratulations => "congratulations",
            WorkflowEnd::SendForValidation => "send-for-validation",
            WorkflowEnd::EditProjectRequestOnly => "edit-project-request-only",
        }
    }
}

impl fmt::Display for WorkflowEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
