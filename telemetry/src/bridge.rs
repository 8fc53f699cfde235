// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The bridge-domain table reported by an agent on `/bridgedomains`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Name of the bridge domain interconnecting the per-node VXLAN tunnels.
pub const VXLAN_BD_NAME: &str = "vxlanBD";

/// The `/bridgedomains` document, keyed by bridge-domain index.
pub type NodeBridgeDomainMap = HashMap<u32, NodeBridgeDomain>;

/// One member interface of a bridge domain.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct BdMember {
    pub sw_if_index: u32,
    /// Set on the member acting as the bridged virtual interface (the L3
    /// endpoint of the domain).
    #[serde(default)]
    pub bridged_virtual_interface: bool,
    #[serde(default)]
    pub split_horizon_group: u32,
}

/// One bridge domain of the `/bridgedomains` document.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct NodeBridgeDomain {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub forward: bool,
    #[serde(default)]
    pub interfaces: Vec<BdMember>,
}

impl NodeBridgeDomain {
    /// Members flagged as bridged virtual interface.
    pub fn bvi_members(&self) -> impl Iterator<Item = &BdMember> {
        self.interfaces
            .iter()
            .filter(|member| member.bridged_virtual_interface)
    }
}
