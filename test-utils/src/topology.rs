// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! A defect-free 3-node reference topology (one master, two workers),
//! matching what a small vagrant cluster reports: a full mesh of VXLAN
//! tunnels between the GigE underlay addresses, one vxlanBD per node with
//! the loop0 BVI, L2 FIB entries for every BVI MAC and static BVI ARP
//! entries for the two remote nodes.
//!
//! Tests inject defects into copies of this topology; the base form must
//! pass every check.

use datastore::TelemetryDb;
use telemetry::{
    AddressType, BdMember, InterfaceType, K8sNode, NodeAddress, NodeBridgeDomain,
    NodeBridgeDomainMap, NodeInterface, NodeInterfaceMap, NodeIpArpEntry, NodeIpArpTable,
    NodeL2FibEntry, NodeL2FibTable, NodeLiveness, NodeSystemInfo, Pod, PodKey, PodLabel, Tap,
    Vxlan,
};

pub const MASTER: &str = "k8s-master";
pub const WORKER1: &str = "k8s-worker1";
pub const WORKER2: &str = "k8s-worker2";

pub const MASTER_MAN_IP: &str = "10.20.0.2";
pub const WORKER1_MAN_IP: &str = "10.20.0.10";
pub const WORKER2_MAN_IP: &str = "10.20.0.11";

pub const MASTER_BVI_MAC: &str = "1a:2b:3c:4d:5e:03";
pub const WORKER1_BVI_MAC: &str = "1a:2b:3c:4d:5e:02";
pub const WORKER2_BVI_MAC: &str = "1a:2b:3c:4d:5e:01";

/// Everything one node agent reports, plus the identity the node record is
/// created with.
#[derive(Clone, Debug)]
pub struct NodeFixture {
    pub id: u32,
    pub name: String,
    pub ip_addr: String,
    pub man_ip_addr: String,
    pub liveness: NodeLiveness,
    pub interfaces: NodeInterfaceMap,
    pub bridge_domains: NodeBridgeDomainMap,
    pub l2_fibs: NodeL2FibTable,
    pub ip_arps: NodeIpArpTable,
}

fn liveness(start_time: u32) -> NodeLiveness {
    NodeLiveness {
        build_version: "v1.2-alpha-179-g4e2d712".to_string(),
        build_date: "2018-07-19T09:54+00:00".to_string(),
        state: telemetry::AgentState::Operational,
        start_time,
        last_change: start_time + 13,
        last_update: start_time + 105_277,
        commit_hash: "4e2d712".to_string(),
    }
}

fn local0() -> NodeInterface {
    NodeInterface {
        vpp_internal_name: "local0".to_string(),
        name: "local0".to_string(),
        ..NodeInterface::default()
    }
}

fn gige(mac: &str, ip: &str) -> NodeInterface {
    NodeInterface {
        vpp_internal_name: "GigabitEthernet0/8".to_string(),
        name: "GigabitEthernet0/8".to_string(),
        if_type: InterfaceType::Hardware,
        enabled: true,
        phys_address: mac.to_string(),
        mtu: 9202,
        ip_addresses: vec![ip.to_string()],
        ..NodeInterface::default()
    }
}

fn tap(internal: &str, name: &str, ip: &str) -> NodeInterface {
    NodeInterface {
        vpp_internal_name: internal.to_string(),
        name: name.to_string(),
        if_type: InterfaceType::Tap,
        enabled: true,
        phys_address: "01:23:45:67:89:42".to_string(),
        mtu: 1500,
        ip_addresses: vec![ip.to_string()],
        tap: Tap {
            version: 2,
            host_if_name: String::new(),
        },
        ..NodeInterface::default()
    }
}

fn bvi(mac: &str, ip: &str) -> NodeInterface {
    NodeInterface {
        vpp_internal_name: "loop0".to_string(),
        name: "vxlanBVI".to_string(),
        enabled: true,
        phys_address: mac.to_string(),
        mtu: 1500,
        ip_addresses: vec![ip.to_string()],
        ..NodeInterface::default()
    }
}

fn vxlan_tunnel(internal: &str, name: &str, src: &str, dst: &str) -> NodeInterface {
    NodeInterface {
        vpp_internal_name: internal.to_string(),
        name: name.to_string(),
        if_type: InterfaceType::Vxlan,
        enabled: true,
        vxlan: Vxlan {
            src_address: src.to_string(),
            dst_address: dst.to_string(),
            vni: 10,
        },
        ..NodeInterface::default()
    }
}

fn vxlan_bd(bvi_index: u32, tunnel_indices: &[u32]) -> NodeBridgeDomainMap {
    let mut members = vec![BdMember {
        sw_if_index: bvi_index,
        bridged_virtual_interface: true,
        split_horizon_group: 0,
    }];
    for index in tunnel_indices {
        members.push(BdMember {
            sw_if_index: *index,
            bridged_virtual_interface: false,
            split_horizon_group: 1,
        });
    }
    let mut bds = NodeBridgeDomainMap::new();
    bds.insert(
        1,
        NodeBridgeDomain {
            name: "vxlanBD".to_string(),
            forward: true,
            interfaces: members,
        },
    );
    bds
}

fn fib(mac: &str, outgoing: u32, is_bvi: bool) -> (String, NodeL2FibEntry) {
    (
        mac.to_string(),
        NodeL2FibEntry {
            bridge_domain_idx: 1,
            outgoing_interface_sw_if_idx: outgoing,
            phys_address: mac.to_string(),
            static_config: true,
            bridged_virtual_interface: is_bvi,
        },
    )
}

fn arp(interface: u32, ip: &str, mac: &str) -> NodeIpArpEntry {
    NodeIpArpEntry {
        interface,
        ip_address: ip.to_string(),
        mac_address: mac.to_string(),
        is_static: true,
    }
}

#[must_use]
pub fn master_fixture() -> NodeFixture {
    let mut interfaces = NodeInterfaceMap::new();
    interfaces.insert(0, local0());
    interfaces.insert(1, gige("08:00:27:c1:dd:42", "192.168.16.3/24"));
    interfaces.insert(2, tap("tap0", "tap-vpp2", "172.30.3.1/24"));
    interfaces.insert(3, tap("tap1", "tap3aa4d77d27d0bf3", "10.2.1.7/32"));
    interfaces.insert(4, bvi(MASTER_BVI_MAC, "192.168.30.3/24"));
    interfaces.insert(
        5,
        vxlan_tunnel("vxlan_tunnel0", "vxlan1", "192.168.16.3", "192.168.16.1"),
    );
    interfaces.insert(
        6,
        vxlan_tunnel("vxlan_tunnel1", "vxlan2", "192.168.16.3", "192.168.16.2"),
    );

    NodeFixture {
        id: 3,
        name: MASTER.to_string(),
        ip_addr: "192.168.16.3/24".to_string(),
        man_ip_addr: MASTER_MAN_IP.to_string(),
        liveness: liveness(1_532_891_958),
        interfaces,
        bridge_domains: vxlan_bd(4, &[5, 6]),
        l2_fibs: NodeL2FibTable::from([
            fib(WORKER2_BVI_MAC, 5, false),
            fib(WORKER1_BVI_MAC, 6, false),
            fib(MASTER_BVI_MAC, 4, true),
        ]),
        ip_arps: vec![
            arp(4, "192.168.30.1", WORKER2_BVI_MAC),
            arp(4, "192.168.30.2", WORKER1_BVI_MAC),
            arp(2, "172.30.3.2", "96:ff:16:6e:60:6f"),
            arp(3, "10.1.3.7", "00:00:00:00:00:02"),
        ],
    }
}

#[must_use]
pub fn worker1_fixture() -> NodeFixture {
    let mut interfaces = NodeInterfaceMap::new();
    interfaces.insert(0, local0());
    interfaces.insert(1, gige("08:00:27:11:e4:c4", "192.168.16.2/24"));
    interfaces.insert(2, tap("tap0", "tap-vpp2", "172.30.1.1/24"));
    interfaces.insert(3, bvi(WORKER1_BVI_MAC, "192.168.30.2/24"));
    interfaces.insert(
        4,
        vxlan_tunnel("vxlan_tunnel0", "vxlan1", "192.168.16.2", "192.168.16.1"),
    );
    interfaces.insert(
        5,
        vxlan_tunnel("vxlan_tunnel1", "vxlan3", "192.168.16.2", "192.168.16.3"),
    );

    NodeFixture {
        id: 2,
        name: WORKER1.to_string(),
        ip_addr: "192.168.16.2/24".to_string(),
        man_ip_addr: WORKER1_MAN_IP.to_string(),
        liveness: liveness(1_532_649_516),
        interfaces,
        bridge_domains: vxlan_bd(3, &[4, 5]),
        l2_fibs: NodeL2FibTable::from([
            fib(WORKER2_BVI_MAC, 4, false),
            fib(WORKER1_BVI_MAC, 3, true),
            fib(MASTER_BVI_MAC, 5, false),
        ]),
        ip_arps: vec![
            arp(3, "192.168.30.1", WORKER2_BVI_MAC),
            arp(3, "192.168.30.3", MASTER_BVI_MAC),
        ],
    }
}

#[must_use]
pub fn worker2_fixture() -> NodeFixture {
    let mut interfaces = NodeInterfaceMap::new();
    interfaces.insert(0, local0());
    interfaces.insert(1, gige("08:00:27:1b:02:8c", "192.168.16.1/24"));
    interfaces.insert(2, tap("tap0", "tap-vpp2", "172.30.2.1/24"));
    interfaces.insert(3, bvi(WORKER2_BVI_MAC, "192.168.30.1/24"));
    interfaces.insert(
        4,
        vxlan_tunnel("vxlan_tunnel0", "vxlan2", "192.168.16.1", "192.168.16.2"),
    );
    interfaces.insert(
        5,
        vxlan_tunnel("vxlan_tunnel1", "vxlan3", "192.168.16.1", "192.168.16.3"),
    );

    NodeFixture {
        id: 1,
        name: WORKER2.to_string(),
        ip_addr: "192.168.16.1/24".to_string(),
        man_ip_addr: WORKER2_MAN_IP.to_string(),
        liveness: liveness(1_532_727_081),
        interfaces,
        bridge_domains: vxlan_bd(3, &[4, 5]),
        l2_fibs: NodeL2FibTable::from([
            fib(WORKER2_BVI_MAC, 3, true),
            fib(WORKER1_BVI_MAC, 4, false),
            fib(MASTER_BVI_MAC, 5, false),
        ]),
        ip_arps: vec![
            arp(3, "192.168.30.2", WORKER1_BVI_MAC),
            arp(3, "192.168.30.3", MASTER_BVI_MAC),
        ],
    }
}

/// The three node fixtures, master first.
#[must_use]
pub fn reference_topology() -> Vec<NodeFixture> {
    vec![master_fixture(), worker1_fixture(), worker2_fixture()]
}

fn k8s_node(name: &str, pod_cidr: &str, man_ip: &str, system_uuid: &str) -> K8sNode {
    K8sNode {
        name: name.to_string(),
        pod_cidr: pod_cidr.to_string(),
        provider_id: String::new(),
        addresses: vec![
            NodeAddress {
                address_type: AddressType::InternalIp,
                address: man_ip.to_string(),
            },
            NodeAddress {
                address_type: AddressType::Hostname,
                address: name.to_string(),
            },
        ],
        node_info: NodeSystemInfo {
            machine_id: "91550c3d3d1bca06c11d4f64575584db".to_string(),
            system_uuid: system_uuid.to_string(),
            boot_id: "be649475-5bf4-4f20-bb3c-7a98610d375a".to_string(),
            kernel_version: "4.4.0-21-generic".to_string(),
            operating_system: "Ubuntu 16.04 LTS".to_string(),
            container_runtime_version: "docker://18.6.0".to_string(),
            kubelet_version: "v1.10.5".to_string(),
            os_image: "linux".to_string(),
            architecture: "amd64".to_string(),
        },
    }
}

/// The Kubernetes node records matching [`reference_topology`].
#[must_use]
pub fn k8s_topology() -> Vec<K8sNode> {
    vec![
        k8s_node(
            MASTER,
            "10.1.3.0/24",
            MASTER_MAN_IP,
            "AC7BF39D-C7B5-4FB8-A2AD-32BD08DB8325",
        ),
        k8s_node(
            WORKER1,
            "10.1.2.0/24",
            WORKER1_MAN_IP,
            "EF76A9B2-4AE5-4372-96EF-FF5B49C6EE99",
        ),
        k8s_node(
            WORKER2,
            "10.1.1.0/24",
            WORKER2_MAN_IP,
            "E82E94E3-39C8-42A7-BD4D-9D8BDAF5BD59",
        ),
    ]
}

fn pod(namespace: &str, name: &str, app: &str, ip: &str, host_ip: &str) -> Pod {
    Pod {
        key: PodKey::new(namespace, name),
        labels: vec![PodLabel {
            key: "k8s-app".to_string(),
            value: app.to_string(),
        }],
        ip_address: ip.to_string(),
        host_ip_address: host_ip.to_string(),
        containers: vec![],
    }
}

/// The pod records matching [`k8s_topology`]: the host-networked system
/// pods plus a few pods inside the per-node pod CIDRs.
#[must_use]
pub fn pod_topology() -> Vec<Pod> {
    vec![
        pod("kube-system", "contiv-vswitch-xrt99", "contiv-vswitch", MASTER_MAN_IP, MASTER_MAN_IP),
        pod("kube-system", "contiv-vswitch-765tb", "contiv-vswitch", WORKER1_MAN_IP, WORKER1_MAN_IP),
        pod("kube-system", "contiv-vswitch-jxz5w", "contiv-vswitch", WORKER2_MAN_IP, WORKER2_MAN_IP),
        pod("kube-system", "etcd-k8s-master", "etcd", MASTER_MAN_IP, MASTER_MAN_IP),
        pod("kube-system", "kube-dns-86f4d74b45-ztgjq", "kube-dns", "10.1.3.10", MASTER_MAN_IP),
        pod("default", "nginx-65899c769f-bhwl4", "nginx", "10.1.3.9", MASTER_MAN_IP),
        pod("default", "nginx-65899c769f-qc8mf", "nginx", "10.1.2.6", WORKER1_MAN_IP),
        pod("default", "nginx-65899c769f-dg5v7", "nginx", "10.1.1.4", WORKER2_MAN_IP),
    ]
}

/// Install one node fixture into the vpp store, identity and documents.
pub fn install_node(db: &TelemetryDb, fixture: NodeFixture) {
    db.vpp
        .create_node(fixture.id, &fixture.name, &fixture.ip_addr, &fixture.man_ip_addr)
        .expect("node creation failed");
    db.vpp
        .set_node_liveness(&fixture.name, fixture.liveness)
        .expect("liveness upload failed");
    let collisions = db
        .vpp
        .set_node_interfaces(&fixture.name, fixture.interfaces)
        .expect("interface upload failed");
    assert!(collisions.is_empty(), "reference topology must be collision-free");
    db.vpp
        .set_node_bridge_domains(&fixture.name, fixture.bridge_domains)
        .expect("bridge-domain upload failed");
    db.vpp
        .set_node_l2fibs(&fixture.name, fixture.l2_fibs)
        .expect("l2 fib upload failed");
    db.vpp
        .set_node_ip_arps(&fixture.name, fixture.ip_arps)
        .expect("arp upload failed");
}

/// Populate the vpp store with the full reference topology.
pub fn populate_vpp(db: &TelemetryDb) {
    for fixture in reference_topology() {
        install_node(db, fixture);
    }
}

/// Populate the k8s store with the matching node and pod records.
pub fn populate_k8s(db: &TelemetryDb) {
    for node in k8s_topology() {
        db.k8s.create_k8s_node(node).expect("k8s node creation failed");
    }
    for pod in pod_topology() {
        db.k8s.create_pod(pod).expect("pod creation failed");
    }
}

/// Populate both stores with the defect-free reference cluster.
pub fn populate_all(db: &TelemetryDb) {
    populate_vpp(db);
    populate_k8s(db);
}
