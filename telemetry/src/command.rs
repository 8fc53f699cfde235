// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Raw command output captured from an agent, keyed by command string.
//! This document is not polled by the collector; it is attached to a node
//! record by operators or side channels.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Telemetry command outputs, keyed by command string.
pub type NodeTelemetryMap = HashMap<String, NodeTelemetry>;

/// Output of one command run on the agent.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct CommandOutput {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub output: String,
}

/// A command and the outputs it produced.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct NodeTelemetry {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub output: Vec<CommandOutput>,
}
