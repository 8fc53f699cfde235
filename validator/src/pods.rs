// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Check 4: every pod must sit on a known node and, unless it shares the
//! host's network namespace, inside that node's pod CIDR.

use crate::Validator;
use ipnetwork::IpNetwork;
use std::net::IpAddr;

impl Validator {
    /// Resolve every pod's host and verify its address placement. Returns
    /// the number of defects found.
    pub fn validate_pod_placement(&self) -> usize {
        let mut defects = 0;
        let k8s_nodes = self.db.k8s.retrieve_all_k8s_nodes();

        for pod in self.db.k8s.retrieve_all_pods() {
            let Some(host) = k8s_nodes
                .iter()
                .find(|node| node.has_internal_ip(&pod.host_ip_address))
            else {
                self.db.report.append_global(format!(
                    "pod '{}' reports host '{}', which is no k8s node management address",
                    pod.key, pod.host_ip_address
                ));
                defects += 1;
                continue;
            };

            // host-networked pods share the node address
            if pod.ip_address == pod.host_ip_address {
                continue;
            }

            let cidr: IpNetwork = match host.pod_cidr.parse() {
                Ok(cidr) => cidr,
                Err(_) => {
                    self.db.report.append(
                        &host.name,
                        format!(
                            "k8s node '{}' has unparsable pod CIDR '{}'",
                            host.name, host.pod_cidr
                        ),
                    );
                    defects += 1;
                    continue;
                }
            };
            match pod.ip_address.parse::<IpAddr>() {
                Ok(ip) if cidr.contains(ip) => {}
                Ok(_) => {
                    self.db.report.append(
                        &host.name,
                        format!(
                            "pod '{}' address {} is outside the pod CIDR {} of node '{}'",
                            pod.key, pod.ip_address, host.pod_cidr, host.name
                        ),
                    );
                    defects += 1;
                }
                Err(_) => {
                    self.db.report.append(
                        &host.name,
                        format!("pod '{}' has unparsable address '{}'", pod.key, pod.ip_address),
                    );
                    defects += 1;
                }
            }
        }
        defects
    }
}
