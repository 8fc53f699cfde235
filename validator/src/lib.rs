// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Topology consistency checks over the joined caches.
//!
//! The validator walks the cluster graph the collector assembled: VXLAN
//! tunnels must pair up across nodes, L2 FIB entries must resolve to BVI
//! MACs somewhere in the cluster, BVI ARP entries must agree with the
//! loopback indexes, and pods must sit inside the pod CIDR of the node
//! that hosts them. Nothing here returns an error: every outcome is a
//! finding in the report, keyed by the offending node or by the global
//! key.

#![deny(clippy::all)]

mod arp;
mod l2;
mod nodes;
mod pods;

use datastore::TelemetryDb;
use std::sync::Arc;
use telemetry::DEFAULT_LOOPBACK_PATTERN;
use tracing::debug;

/// The check suite. Build one per [`TelemetryDb`] and run
/// [`Validator::validate`] after every collection cycle.
pub struct Validator {
    db: Arc<TelemetryDb>,
    loopback_pattern: String,
}

impl Validator {
    #[must_use]
    pub fn new(db: Arc<TelemetryDb>) -> Self {
        Self::with_loopback_pattern(db, DEFAULT_LOOPBACK_PATTERN)
    }

    /// Build a validator matching loopback interfaces against `pattern`
    /// instead of the default.
    #[must_use]
    pub fn with_loopback_pattern(db: Arc<TelemetryDb>, pattern: impl Into<String>) -> Self {
        Validator {
            db,
            loopback_pattern: pattern.into(),
        }
    }

    /// Run the whole suite in its fixed order. Each check that finds
    /// nothing wrong contributes one informational global marker, so a
    /// clean topology always yields exactly four global entries.
    pub fn validate(&self) {
        debug!("Running topology validation");
        let checks: [(&str, fn(&Validator) -> usize); 4] = [
            ("k8s node cross-reference check passed", Validator::validate_k8s_node_info),
            (
                "vxlan bridge domain and l2 fib check passed",
                Validator::validate_l2_connectivity,
            ),
            ("BVI arp table check passed", Validator::validate_arp_tables),
            ("pod placement check passed", Validator::validate_pod_placement),
        ];
        for (marker, check) in checks {
            let defects = check(self);
            if defects == 0 {
                self.db.report.append_global(marker);
            } else {
                debug!("{defects} finding(s) from check '{marker}'");
            }
        }
    }
}
