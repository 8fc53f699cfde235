// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Kubernetes pod records as emitted by the external watcher.
//!
//! `Pod` derives its multi-index container here, next to the type: pods are
//! looked up by `(namespace, name)` and, non-uniquely, by the IP of the
//! node hosting them.

#![allow(missing_docs)] // multi-index-map generated code is not documented
#![allow(clippy::unsafe_derive_deserialize)] // generated code uses unsafe

use multi_index_map::MultiIndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The `(namespace, name)` pair identifying a pod.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct PodKey {
    pub namespace: String,
    pub name: String,
}

impl PodKey {
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl Display for PodKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// One `key: value` label of a pod.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct PodLabel {
    pub key: String,
    pub value: String,
}

/// A container of a pod. Opaque to the validator; carried for reporting.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct PodContainer {
    #[serde(default)]
    pub name: String,
}

/// A Kubernetes pod record.
#[derive(Clone, Debug, Deserialize, MultiIndexMap, Serialize)]
#[multi_index_derive(Clone, Debug, Default)]
pub struct Pod {
    #[multi_index(ordered_unique)]
    pub key: PodKey,
    #[serde(default)]
    pub labels: Vec<PodLabel>,
    #[serde(default)]
    pub ip_address: String,
    #[multi_index(hashed_non_unique)]
    pub host_ip_address: String,
    #[serde(default)]
    pub containers: Vec<PodContainer>,
}
