// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Data model for the telemetry documents served by the per-node vswitch
//! agents and for the Kubernetes node / pod records mirrored next to them.
//!
//! Everything here is plain data: the types deserialize straight off the
//! agent wire format (unknown fields are ignored, missing optional fields
//! default to zero / empty) and carry no behavior beyond small accessors.

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod arp;
pub mod bridge;
pub mod command;
pub mod interfaces;
pub mod k8s;
pub mod l2fib;
pub mod liveness;
pub mod pod;

// re-exports
pub use arp::{NodeIpArpEntry, NodeIpArpTable};
pub use bridge::{BdMember, NodeBridgeDomain, NodeBridgeDomainMap, VXLAN_BD_NAME};
pub use command::{CommandOutput, NodeTelemetry, NodeTelemetryMap};
pub use interfaces::{
    DEFAULT_LOOPBACK_PATTERN, InterfaceType, NodeInterface, NodeInterfaceMap, Tap, Vxlan,
};
pub use k8s::{AddressType, K8sNode, NodeAddress, NodeSystemInfo};
pub use l2fib::{NodeL2FibEntry, NodeL2FibTable};
pub use liveness::{AgentState, NodeLiveness};
pub use pod::{MultiIndexPodMap, Pod, PodContainer, PodKey, PodLabel};

/// Strip the CIDR mask from an address string, if any.
///
/// The agent reports interface addresses as `"a.b.c.d/len"` while ARP and
/// tunnel endpoints are bare addresses; cross-referencing the two always
/// happens on the bare form.
#[must_use]
pub fn strip_cidr(address: &str) -> &str {
    match address.split_once('/') {
        Some((bare, _)) => bare,
        None => address,
    }
}
