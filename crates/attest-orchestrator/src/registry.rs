//! Resolves a scenario's agent role into a constructed `Agent` (§4.1
//! component table / §4.4 "reuse session-scoped agent instances across
//! scenarios when their type/config is identical").
//!
//! Each `Scenario.agents` entry names an `AgentType` plus a free-form JSON
//! config blob; this module is the one place that knows how to turn that
//! blob into the concrete agent crate's config type and construct the
//! matching `Agent` impl.

use std::collections::BTreeMap;

use attest_core::agent::Agent;
use attest_core::model::{AgentRoleConfig, AgentType, Scenario};
use attest_http::ApiAgent;
use attest_issues::IssueAgent;
use attest_llm::{ComprehensionAgent, FakeChatCompletionClient};
use attest_session::SessionAgent;
use attest_system::SystemAgent;
use attest_triage::PriorityAgent;
use attest_ui::UiAgent;

fn config_or_default<T: Default + serde::de::DeserializeOwned>(raw: &serde_json::Value) -> T {
    if raw.is_null() {
        return T::default();
    }
    serde_json::from_value(raw.clone()).unwrap_or_else(|error| {
        tracing::warn!(%error, "agent role config failed to deserialize, falling back to defaults");
        T::default()
    })
}

/// Builds the single `Agent` a scenario's primary role resolves to.
///
/// A `Scenario` can in principle name more than one agent role, but the
/// `execute_scenario` template operates on one `Agent`; this orchestrator
/// picks the lexicographically-first role (`BTreeMap` iteration order),
/// which for every fixture in this system is also the only role.
pub fn build_agent(role: &AgentRoleConfig) -> Box<dyn Agent> {
    match role.agent_type {
        AgentType::Api => Box::new(ApiAgent::new(config_or_default(&role.config))),
        AgentType::Cli | AgentType::Tui => Box::new(SessionAgent::new(config_or_default(&role.config))),
        AgentType::Ui => Box::new(UiAgent::new()),
        AgentType::System => Box::new(SystemAgent::new(config_or_default(&role.config))),
        AgentType::Issue => Box::new(IssueAgent::new(config_or_default(&role.config))),
        AgentType::Priority => Box::new(PriorityAgent::new(config_or_default(&role.config))),
        AgentType::Comprehension => {
            let canned = role
                .config
                .get("cannedResponse")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("{}")
                .to_string();
            Box::new(ComprehensionAgent::new(Box::new(FakeChatCompletionClient::constant(canned))))
        }
    }
}

/// Picks the scenario's primary agent role, if any are declared.
pub fn primary_role(scenario: &Scenario) -> Option<&AgentRoleConfig> {
    scenario.agents.values().next()
}
