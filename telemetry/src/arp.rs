// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The IP neighbor table reported by an agent on `/arps`.

use serde::{Deserialize, Serialize};

/// The `/arps` document: the agent reports entries as an ordered list.
pub type NodeIpArpTable = Vec<NodeIpArpEntry>;

/// One ARP entry. The wire uses capitalized field names for everything but
/// the interface index.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct NodeIpArpEntry {
    pub interface: u32,
    #[serde(rename = "IPAddress", default)]
    pub ip_address: String,
    #[serde(rename = "MacAddress", default)]
    pub mac_address: String,
    #[serde(rename = "Static", default)]
    pub is_static: bool,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decode_arp_document() {
        let body = r#"[
            {"interface": 4, "IPAddress": "192.168.30.1", "MacAddress": "1a:2b:3c:4d:5e:01", "Static": true},
            {"interface": 2, "IPAddress": "172.30.3.2", "MacAddress": "96:ff:16:6e:60:6f", "Static": true}
        ]"#;
        let arps: NodeIpArpTable = serde_json::from_str(body).expect("Should decode");
        assert_eq!(arps.len(), 2);
        assert_eq!(arps[0].ip_address, "192.168.30.1");
        assert!(arps[0].is_static);
    }
}
