// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The L2 forwarding table reported by an agent on `/l2fibs`, keyed by
//! destination MAC address.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The `/l2fibs` document, keyed by MAC address string.
pub type NodeL2FibTable = HashMap<String, NodeL2FibEntry>;

/// One MAC forwarding entry of a bridge domain.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct NodeL2FibEntry {
    #[serde(default)]
    pub bridge_domain_idx: u32,
    #[serde(default)]
    pub outgoing_interface_sw_if_idx: u32,
    #[serde(default)]
    pub phys_address: String,
    #[serde(default)]
    pub static_config: bool,
    #[serde(default)]
    pub bridged_virtual_interface: bool,
}
