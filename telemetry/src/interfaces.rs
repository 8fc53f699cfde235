// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The interface table reported by an agent on `/interfaces`: a map from
//! software interface index to interface record.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default `vpp_internal_name` prefix identifying the bridged virtual
/// (loopback) interface of the vxlan bridge domain.
pub const DEFAULT_LOOPBACK_PATTERN: &str = "loop0";

/// The `/interfaces` document, keyed by software interface index.
pub type NodeInterfaceMap = HashMap<u32, NodeInterface>;

/// Kind of a vswitch interface, as a numeric wire code.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(from = "u32", into = "u32")]
pub enum InterfaceType {
    /// The built-in `local0` interface.
    #[default]
    Local,
    /// A hardware NIC (e.g. GigabitEthernet).
    Hardware,
    /// A software loopback.
    Loopback,
    /// A tap into the host stack.
    Tap,
    /// A shared-memory interface.
    Memif,
    /// A VXLAN tunnel endpoint.
    Vxlan,
    /// A type code this build does not know about.
    Other(u32),
}

impl From<u32> for InterfaceType {
    fn from(value: u32) -> Self {
        match value {
            0 => InterfaceType::Local,
            1 => InterfaceType::Hardware,
            2 => InterfaceType::Loopback,
            3 => InterfaceType::Tap,
            4 => InterfaceType::Memif,
            5 => InterfaceType::Vxlan,
            other => InterfaceType::Other(other),
        }
    }
}

impl From<InterfaceType> for u32 {
    fn from(value: InterfaceType) -> Self {
        match value {
            InterfaceType::Local => 0,
            InterfaceType::Hardware => 1,
            InterfaceType::Loopback => 2,
            InterfaceType::Tap => 3,
            InterfaceType::Memif => 4,
            InterfaceType::Vxlan => 5,
            InterfaceType::Other(other) => other,
        }
    }
}

/// VXLAN tunnel endpoints of an interface, present for tunnel interfaces.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Vxlan {
    #[serde(default)]
    pub src_address: String,
    #[serde(default)]
    pub dst_address: String,
    #[serde(default)]
    pub vni: u32,
}

/// Tap details of an interface, present for tap interfaces.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Tap {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub host_if_name: String,
}

/// One interface record of the `/interfaces` document.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct NodeInterface {
    #[serde(default)]
    pub vpp_internal_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub if_type: InterfaceType,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub phys_address: String,
    #[serde(default)]
    pub mtu: u32,
    #[serde(default)]
    pub vxlan: Vxlan,
    #[serde(default)]
    pub ip_addresses: Vec<String>,
    #[serde(default)]
    pub tap: Tap,
}

impl NodeInterface {
    /// Tell if this interface is the loopback/BVI interface, by matching its
    /// internal name against the configured loopback pattern.
    #[must_use]
    pub fn is_loopback(&self, pattern: &str) -> bool {
        self.vpp_internal_name.starts_with(pattern)
    }

    /// Tell if this interface carries a VXLAN tunnel record.
    #[must_use]
    pub fn is_vxlan_tunnel(&self) -> bool {
        self.if_type == InterfaceType::Vxlan
    }
}
