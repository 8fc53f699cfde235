// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Check 1: every vswitch node must have a Kubernetes node of the same
//! name, and vice versa.

use crate::Validator;
use tracing::warn;

impl Validator {
    /// Cross-reference vswitch and Kubernetes node records by name.
    ///
    /// A missing counterpart files a finding under the node's name plus an
    /// accompanying global finding; differing node counts file one more
    /// global finding, so the global count alone tells a monitor whether
    /// the two views agree. Matched nodes get their Kubernetes internal
    /// IPs registered in the host-IP index.
    ///
    /// Returns the number of defects found.
    pub fn validate_k8s_node_info(&self) -> usize {
        let mut defects = 0;
        let vpp_nodes = self.db.vpp.retrieve_all_nodes();
        let k8s_nodes = self.db.k8s.retrieve_all_k8s_nodes();

        if vpp_nodes.len() != k8s_nodes.len() {
            self.db.report.append_global(format!(
                "vswitch and k8s node counts differ: {} vswitch node(s) vs {} k8s node(s)",
                vpp_nodes.len(),
                k8s_nodes.len()
            ));
            defects += 1;
        }

        for node in &vpp_nodes {
            match self.db.k8s.retrieve_k8s_node(&node.name) {
                Ok(k8s_node) => {
                    for ip in k8s_node.internal_ips() {
                        if let Err(error) = self.db.vpp.set_node_host_ip(&node.name, ip) {
                            warn!("Could not register host IP '{ip}': {error}");
                        }
                    }
                }
                Err(_) => {
                    let finding =
                        format!("vswitch node '{}' has no k8s node counterpart", node.name);
                    self.db.report.append(&node.name, finding.clone());
                    self.db.report.append_global(finding);
                    defects += 1;
                }
            }
        }

        for k8s_node in &k8s_nodes {
            if self.db.vpp.retrieve_node(&k8s_node.name).is_err() {
                let finding = format!(
                    "k8s node '{}' has no vswitch node counterpart",
                    k8s_node.name
                );
                self.db.report.append(&k8s_node.name, finding.clone());
                self.db.report.append_global(finding);
                defects += 1;
            }
        }

        defects
    }
}
