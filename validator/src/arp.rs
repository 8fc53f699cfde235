// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Check 3: the static ARP entries on every node's BVI must describe the
//! BVIs of the other nodes — no orphans, none missing.

use crate::Validator;
use std::collections::HashSet;

impl Validator {
    /// Cross-check BVI ARP entries against the loopback indexes. Returns
    /// the number of defects found.
    pub fn validate_arp_tables(&self) -> usize {
        let mut defects = 0;
        let nodes = self.db.vpp.retrieve_all_nodes();

        for node in &nodes {
            let Some((bvi_index, _)) = node.loopback_interface(&self.loopback_pattern) else {
                self.db
                    .report
                    .append(&node.name, "no loopback interface to check arp entries on");
                defects += 1;
                continue;
            };
            let Some(arps) = node.ip_arps.as_ref() else {
                self.db.report.append(&node.name, "no arp data collected");
                defects += 1;
                continue;
            };

            // every static entry on the BVI must name the BVI of exactly
            // one other node, by IP and by MAC consistently
            let mut seen: HashSet<String> = HashSet::new();
            for entry in arps
                .iter()
                .filter(|entry| entry.interface == bvi_index && entry.is_static)
            {
                let by_ip = self.db.vpp.retrieve_node_by_loop_ip_addr(&entry.ip_address);
                let by_mac = self
                    .db
                    .vpp
                    .retrieve_node_by_loop_mac_addr(&entry.mac_address);
                match (by_ip, by_mac) {
                    (Ok(ip_node), Ok(mac_node)) if ip_node.name == mac_node.name => {
                        seen.insert(ip_node.name);
                    }
                    _ => {
                        self.db.report.append(
                            &node.name,
                            format!(
                                "BVI arp entry {} / {} does not match any node BVI",
                                entry.ip_address, entry.mac_address
                            ),
                        );
                        defects += 1;
                    }
                }
            }

            // and every other node with a BVI must be covered
            for other in nodes.iter().filter(|other| other.name != node.name) {
                if other.loopback_interface(&self.loopback_pattern).is_some()
                    && !seen.contains(&other.name)
                {
                    self.db.report.append(
                        &node.name,
                        format!("missing BVI arp entry for node '{}'", other.name),
                    );
                    defects += 1;
                }
            }
        }
        defects
    }
}
