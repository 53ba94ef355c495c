//! Per-agent workflow state machines.
//!
//! Each of the five Qube Mesh personas gets one linear, explicit flow:
//! prompt in, controls awaited and clicked in order, terminal state judged
//! by the shared finalizer. All waits are bounded by the invocation's
//! policy; optional steps skip with a log line, mandatory ones abort the
//! invocation with page diagnostics attached.

mod amendment;
mod dates;
mod extension;
mod offboarding;
mod profile_update;
mod steps;
mod termination;

pub use amendment::ContractAmendment;
pub use dates::{select_date, FlowDate};
pub use extension::ContractExtension;
pub use offboarding::SupplierOffboarding;
pub use profile_update::SupplierProfileUpdate;
pub use steps::{StepCtx, DISCUSSION_CONFIRMATION};
pub use termination::{ContractTermination, TerminationMode};

use async_trait::async_trait;

use meshpilot_core_types::{
    AgentKind, FlowError, FlowPolicy, ScenarioRow, WorkflowContext, WorkflowEnd,
};
use meshpilot_page_port::PagePort;

/// One agent persona's end-to-end conversational flow.
#[async_trait]
pub trait Workflow: Send + Sync {
    fn agent(&self) -> AgentKind;

    /// Drive the flow on `page` to one of the three terminal states.
    ///
    /// The page is exclusively owned by this invocation for its duration.
    async fn run(
        &self,
        page: &dyn PagePort,
        ctx: &WorkflowContext,
        row: &ScenarioRow,
        policy: &FlowPolicy,
    ) -> Result<WorkflowEnd, FlowError>;
}

/// The state machine for `kind`.
pub fn workflow_for(kind: AgentKind) -> Box<dyn Workflow> {
    match kind {
        AgentKind::SupplierOffboarding => Box::new(SupplierOffboarding),
        AgentKind::ContractAmendment => Box::new(ContractAmendment),
        AgentKind::ContractTermination => Box::new(ContractTermination),
        AgentKind::ContractExtension => Box::new(ContractExtension),
        AgentKind::SupplierProfileUpdate => Box::new(SupplierProfileUpdate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_covers_every_agent() {
        for kind in AgentKind::all() {
            assert_eq!(workflow_for(kind).agent(), kind);
        }
    }
}
