// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The aggregate of all in-memory state the pipeline works on.

use crate::k8s::K8sDataStore;
use crate::report::Report;
use crate::vpp::VppDataStore;
use tracing::debug;

/// All cluster state: vswitch telemetry, Kubernetes records and the
/// current report. One instance is shared between the collector, the
/// external watcher glue and the validator; each member store does its own
/// locking.
#[derive(Default)]
pub struct TelemetryDb {
    pub vpp: VppDataStore,
    pub k8s: K8sDataStore,
    pub report: Report,
}

impl TelemetryDb {
    #[must_use]
    pub fn new() -> Self {
        TelemetryDb::default()
    }

    /// Build a db whose vpp store matches loopback interfaces against
    /// `pattern`.
    #[must_use]
    pub fn with_loopback_pattern(pattern: impl Into<String>) -> Self {
        TelemetryDb {
            vpp: VppDataStore::with_loopback_pattern(pattern),
            k8s: K8sDataStore::new(),
            report: Report::new(),
        }
    }

    /// Full reset: vswitch telemetry, Kubernetes records and report. The
    /// next polling cycle and the watcher event stream rebuild everything.
    pub fn reinitialize(&self) {
        debug!("Reinitializing telemetry db");
        self.vpp.reinitialize_cache();
        self.k8s.reinitialize_cache();
        self.report.clear();
    }
}
