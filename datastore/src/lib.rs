// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! In-memory stores for the cluster telemetry pipeline: the vswitch node
//! store with its secondary indexes, the Kubernetes node/pod store, and the
//! keyed report the validator writes findings to.

#![deny(clippy::all)]
#![allow(clippy::collapsible_if)]

mod db;
mod errors;
pub mod k8s;
pub mod report;
pub mod vpp;

// re-exports
pub use db::TelemetryDb;
pub use errors::DataStoreError;
pub use k8s::K8sDataStore;
pub use report::{GLOBAL_KEY, Report};
pub use vpp::{IndexCollision, VppDataStore, VppNode};
