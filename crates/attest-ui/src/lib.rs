//! The UI agent variant (§4.1): a reference action vocabulary
//! (`navigate | click | type | wait | snapshot`) replayed against a
//! deterministic in-memory fixture responder, never a live browser backend.

pub mod agent;
pub mod contract;

pub use agent::UiAgent;
pub use contract::{
    evaluate_ui_case, ui_contract_capabilities, UiCaseExpectation, UiContractCapabilities,
    UiContractCase, UiContractFixture, UiOutcomeKind, UiReplayResult, UiReplayStep,
};
