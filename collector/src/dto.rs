// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The typed results flowing from the fetch tasks to the joiner.

use crate::errors::CollectError;
use std::fmt::{Display, Formatter};
use telemetry::{
    NodeBridgeDomainMap, NodeInterfaceMap, NodeIpArpTable, NodeL2FibTable, NodeLiveness,
};

/// Number of documents collected per node and cycle. Update this whenever a
/// document kind is added.
pub const NUM_DTOS: usize = 5;

/// The document kinds polled from every agent, in collection order.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum TelemetryKind {
    Liveness,
    Interfaces,
    BridgeDomains,
    L2Fibs,
    IpArps,
}

impl TelemetryKind {
    /// All document kinds, in collection order.
    pub const ALL: [TelemetryKind; NUM_DTOS] = [
        TelemetryKind::Liveness,
        TelemetryKind::Interfaces,
        TelemetryKind::BridgeDomains,
        TelemetryKind::L2Fibs,
        TelemetryKind::IpArps,
    ];

    /// The agent endpoint serving this document.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            TelemetryKind::Liveness => "/liveness",
            TelemetryKind::Interfaces => "/interfaces",
            TelemetryKind::BridgeDomains => "/bridgedomains",
            TelemetryKind::L2Fibs => "/l2fibs",
            TelemetryKind::IpArps => "/arps",
        }
    }
}

impl Display for TelemetryKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TelemetryKind::Liveness => "liveness",
            TelemetryKind::Interfaces => "interfaces",
            TelemetryKind::BridgeDomains => "bridge domains",
            TelemetryKind::L2Fibs => "l2 fibs",
            TelemetryKind::IpArps => "ip arps",
        };
        write!(f, "{name}")
    }
}

/// A decoded agent document, tagged by kind. The joiner dispatches on the
/// tag to pick the matching store setter.
#[derive(Clone, Debug)]
pub enum TelemetryPayload {
    Liveness(NodeLiveness),
    Interfaces(NodeInterfaceMap),
    BridgeDomains(NodeBridgeDomainMap),
    L2Fibs(NodeL2FibTable),
    IpArps(NodeIpArpTable),
}

impl TelemetryPayload {
    #[must_use]
    pub fn kind(&self) -> TelemetryKind {
        match self {
            TelemetryPayload::Liveness(_) => TelemetryKind::Liveness,
            TelemetryPayload::Interfaces(_) => TelemetryKind::Interfaces,
            TelemetryPayload::BridgeDomains(_) => TelemetryKind::BridgeDomains,
            TelemetryPayload::L2Fibs(_) => TelemetryKind::L2Fibs,
            TelemetryPayload::IpArps(_) => TelemetryKind::IpArps,
        }
    }
}

/// One fetch outcome. Exactly one of these is emitted per (node, document)
/// pair and cycle, error or not, so the joiner can count the batch.
#[derive(Debug)]
pub struct TelemetryResult {
    /// The cycle this result belongs to; results from earlier cycles are
    /// dropped by the joiner.
    pub cycle: u64,
    pub node: String,
    pub kind: TelemetryKind,
    pub payload: Result<TelemetryPayload, CollectError>,
}
