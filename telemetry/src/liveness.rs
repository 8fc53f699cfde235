// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The liveness document reported by an agent on `/liveness`.

use serde::{Deserialize, Serialize};

/// Operational state of an agent, as a numeric wire code.
///
/// Codes beyond the known set are preserved verbatim so that decoding a
/// document from a newer agent never fails.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(from = "u32", into = "u32")]
pub enum AgentState {
    /// The agent is still initializing.
    #[default]
    Init,
    /// The agent is up and serving telemetry.
    Operational,
    /// The agent reported an internal error.
    Error,
    /// A state code this build does not know about.
    Other(u32),
}

impl From<u32> for AgentState {
    fn from(value: u32) -> Self {
        match value {
            0 => AgentState::Init,
            1 => AgentState::Operational,
            2 => AgentState::Error,
            other => AgentState::Other(other),
        }
    }
}

impl From<AgentState> for u32 {
    fn from(value: AgentState) -> Self {
        match value {
            AgentState::Init => 0,
            AgentState::Operational => 1,
            AgentState::Error => 2,
            AgentState::Other(other) => other,
        }
    }
}

/// Build and uptime information of a node agent.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct NodeLiveness {
    #[serde(default)]
    pub build_version: String,
    #[serde(default)]
    pub build_date: String,
    #[serde(default)]
    pub state: AgentState,
    #[serde(default)]
    pub start_time: u32,
    #[serde(default)]
    pub last_change: u32,
    #[serde(default)]
    pub last_update: u32,
    #[serde(default)]
    pub commit_hash: String,
}
