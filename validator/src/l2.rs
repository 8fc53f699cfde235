// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Check 2: the vxlan bridge domain of every node must have exactly one
//! BVI backed by a loopback interface, its tunnel members must pair up
//! with tunnels on the remote nodes, and every L2 FIB entry in the domain
//! must resolve to the BVI MAC of some node in the cluster.

use crate::Validator;
use datastore::VppNode;
use std::collections::HashMap;
use telemetry::{VXLAN_BD_NAME, Vxlan, strip_cidr};

impl Validator {
    /// Walk the vxlan bridge domain of every node. Returns the number of
    /// defects found.
    pub fn validate_l2_connectivity(&self) -> usize {
        let mut defects = 0;
        let nodes = self.db.vpp.retrieve_all_nodes();

        // underlay address -> node, with the create-time mask stripped
        let nodes_by_gige: HashMap<&str, &VppNode> = nodes
            .iter()
            .map(|node| (strip_cidr(&node.ip_addr), node))
            .collect();

        // every BVI MAC in the cluster
        let bvi_macs: HashMap<&str, &str> = nodes
            .iter()
            .filter_map(|node| {
                node.loopback_interface(&self.loopback_pattern)
                    .map(|(_, ifc)| (ifc.phys_address.as_str(), node.name.as_str()))
            })
            .collect();

        for node in &nodes {
            defects += self.validate_node_bridge_domain(node, &nodes_by_gige, &bvi_macs);
        }
        defects
    }

    fn validate_node_bridge_domain(
        &self,
        node: &VppNode,
        nodes_by_gige: &HashMap<&str, &VppNode>,
        bvi_macs: &HashMap<&str, &str>,
    ) -> usize {
        let report = &self.db.report;
        let mut defects = 0;

        let Some(interfaces) = node.interfaces.as_ref() else {
            report.append(&node.name, "no interface data collected");
            return 1;
        };
        let Some(bridge_domains) = node.bridge_domains.as_ref() else {
            report.append(&node.name, "no bridge-domain data collected");
            return 1;
        };
        let Some((bd_index, bd)) = bridge_domains
            .iter()
            .find(|(_, bd)| bd.name == VXLAN_BD_NAME)
        else {
            report.append(
                &node.name,
                format!("no bridge domain named '{VXLAN_BD_NAME}'"),
            );
            return 1;
        };

        // exactly one member must be flagged as the BVI, and it must be a
        // loopback interface
        let bvi_members: Vec<_> = bd.bvi_members().collect();
        if bvi_members.len() != 1 {
            report.append(
                &node.name,
                format!(
                    "bridge domain '{VXLAN_BD_NAME}' has {} BVI member(s), expected exactly 1",
                    bvi_members.len()
                ),
            );
            defects += 1;
        }
        for member in &bvi_members {
            match interfaces.get(&member.sw_if_index) {
                Some(ifc) if ifc.is_loopback(&self.loopback_pattern) => {}
                Some(ifc) => {
                    report.append(
                        &node.name,
                        format!(
                            "BVI member {} of '{VXLAN_BD_NAME}' is not a loopback interface ('{}')",
                            member.sw_if_index, ifc.vpp_internal_name
                        ),
                    );
                    defects += 1;
                }
                None => {
                    report.append(
                        &node.name,
                        format!(
                            "BVI member {} of '{VXLAN_BD_NAME}' is not in the interface table",
                            member.sw_if_index
                        ),
                    );
                    defects += 1;
                }
            }
        }

        // the remaining members must be vxlan tunnels with a matching
        // reverse tunnel on the remote node
        for member in bd.interfaces.iter().filter(|m| !m.bridged_virtual_interface) {
            let Some(ifc) = interfaces.get(&member.sw_if_index) else {
                report.append(
                    &node.name,
                    format!(
                        "member {} of '{VXLAN_BD_NAME}' is not in the interface table",
                        member.sw_if_index
                    ),
                );
                defects += 1;
                continue;
            };
            if !ifc.is_vxlan_tunnel() {
                report.append(
                    &node.name,
                    format!(
                        "member '{}' of '{VXLAN_BD_NAME}' is neither BVI nor vxlan tunnel",
                        ifc.name
                    ),
                );
                defects += 1;
                continue;
            }
            let vxlan = &ifc.vxlan;
            let Some(remote) = nodes_by_gige.get(vxlan.dst_address.as_str()) else {
                report.append(
                    &node.name,
                    format!(
                        "vxlan tunnel '{}' points at '{}', which is no known node",
                        ifc.name, vxlan.dst_address
                    ),
                );
                defects += 1;
                continue;
            };
            if !has_reverse_tunnel(remote, vxlan) {
                report.append(
                    &node.name,
                    format!(
                        "vxlan tunnel '{}' ({} -> {}, vni {}) has no counterpart on node '{}'",
                        ifc.name, vxlan.src_address, vxlan.dst_address, vxlan.vni, remote.name
                    ),
                );
                defects += 1;
            }
        }

        // every fib entry of this bridge domain must point at a BVI MAC
        // known somewhere in the cluster
        let Some(fibs) = node.l2_fibs.as_ref() else {
            report.append(&node.name, "no l2 fib data collected");
            return defects + 1;
        };
        let mut entries: Vec<_> = fibs
            .iter()
            .filter(|(_, entry)| entry.bridge_domain_idx == *bd_index)
            .collect();
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        for (mac, _) in entries {
            if !bvi_macs.contains_key(mac.as_str()) {
                report.append(
                    &node.name,
                    format!("l2 fib entry '{mac}' does not resolve to any node BVI"),
                );
                defects += 1;
            }
        }

        defects
    }
}

fn has_reverse_tunnel(remote: &VppNode, vxlan: &Vxlan) -> bool {
    remote.interfaces.as_ref().is_some_and(|interfaces| {
        interfaces.values().any(|ifc| {
            ifc.is_vxlan_tunnel()
                && ifc.vxlan.src_address == vxlan.dst_address
                && ifc.vxlan.dst_address == vxlan.src_address
                && ifc.vxlan.vni == vxlan.vni
        })
    })
}
