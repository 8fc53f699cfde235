// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The error results returned by the stores in this crate.

use thiserror::Error;

/// The reasons a store operation may fail.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum DataStoreError {
    #[error("No node named '{0}'")]
    NoSuchNode(String),

    #[error("A node named '{0}' already exists")]
    DuplicateNode(String),

    #[error("A node with id '{0}' already exists")]
    DuplicateNodeId(u32),

    #[error("No node with {index} '{key}'")]
    IndexMiss { index: &'static str, key: String },

    #[error("No k8s node named '{0}'")]
    NoSuchK8sNode(String),

    #[error("A k8s node named '{0}' already exists")]
    DuplicateK8sNode(String),

    #[error("No pod '{0}'")]
    NoSuchPod(String),

    #[error("Pod '{0}' already exists")]
    DuplicatePod(String),
}
