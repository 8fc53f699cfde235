// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Kubernetes node records as emitted by the external watcher.

use serde::{Deserialize, Serialize};

/// Kind of a node address, as the numeric code used by the watcher.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(from = "u32", into = "u32")]
pub enum AddressType {
    #[default]
    Undefined,
    Hostname,
    ExternalIp,
    /// The management address the agents are reached on.
    InternalIp,
    Other(u32),
}

impl From<u32> for AddressType {
    fn from(value: u32) -> Self {
        match value {
            0 => AddressType::Undefined,
            1 => AddressType::Hostname,
            2 => AddressType::ExternalIp,
            3 => AddressType::InternalIp,
            other => AddressType::Other(other),
        }
    }
}

impl From<AddressType> for u32 {
    fn from(value: AddressType) -> Self {
        match value {
            AddressType::Undefined => 0,
            AddressType::Hostname => 1,
            AddressType::ExternalIp => 2,
            AddressType::InternalIp => 3,
            AddressType::Other(other) => other,
        }
    }
}

/// One address of a Kubernetes node.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct NodeAddress {
    #[serde(rename = "type", default)]
    pub address_type: AddressType,
    #[serde(default)]
    pub address: String,
}

/// System information of a Kubernetes node.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct NodeSystemInfo {
    #[serde(default)]
    pub machine_id: String,
    #[serde(default)]
    pub system_uuid: String,
    #[serde(default)]
    pub boot_id: String,
    #[serde(default)]
    pub kernel_version: String,
    #[serde(default)]
    pub operating_system: String,
    #[serde(default)]
    pub container_runtime_version: String,
    #[serde(default)]
    pub kubelet_version: String,
    #[serde(default)]
    pub os_image: String,
    #[serde(default)]
    pub architecture: String,
}

/// A Kubernetes node record.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct K8sNode {
    pub name: String,
    #[serde(default)]
    pub pod_cidr: String,
    #[serde(default)]
    pub provider_id: String,
    #[serde(default)]
    pub addresses: Vec<NodeAddress>,
    #[serde(default)]
    pub node_info: NodeSystemInfo,
}

impl K8sNode {
    /// The internal (management) IP addresses of this node.
    pub fn internal_ips(&self) -> impl Iterator<Item = &str> {
        self.addresses
            .iter()
            .filter(|a| a.address_type == AddressType::InternalIp)
            .map(|a| a.address.as_str())
    }

    /// Tell whether `address` is one of this node's internal IPs.
    #[must_use]
    pub fn has_internal_ip(&self, address: &str) -> bool {
        self.internal_ips().any(|ip| ip == address)
    }
}
