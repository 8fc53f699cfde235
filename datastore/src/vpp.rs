// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The vswitch telemetry store: one record per node, reachable by name and
//! by a set of secondary indexes (node id, GigE IP, loopback IP, loopback
//! MAC, host IP).
//!
//! The primary map is the single owner of node records; every secondary
//! index maps its key to a node *name*, never to a record, so deleting a
//! node cannot leave a reachable stale record behind. All mutators update
//! the primary map and every affected index under the same write guard, so
//! readers never observe a half-installed node.

use crate::errors::DataStoreError;
use ahash::RandomState;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, hash_map::Entry};
use std::fmt::{Display, Formatter};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use telemetry::{
    DEFAULT_LOOPBACK_PATTERN, NodeBridgeDomainMap, NodeInterface, NodeInterfaceMap,
    NodeIpArpTable, NodeL2FibTable, NodeLiveness, NodeTelemetryMap, strip_cidr,
};
use tracing::{debug, warn};

/// All telemetry known about one vswitch node.
///
/// A node is created with its identity fields only; the child collections
/// are attached one by one as the collector gathers the agent documents,
/// and stay `None` until then.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct VppNode {
    pub id: u32,
    pub name: String,
    /// The GigE (underlay) address, as provided at create time. May carry
    /// a CIDR mask.
    pub ip_addr: String,
    /// The management address the agent is polled on.
    pub man_ip_addr: String,
    pub liveness: Option<NodeLiveness>,
    pub interfaces: Option<NodeInterfaceMap>,
    pub bridge_domains: Option<NodeBridgeDomainMap>,
    pub l2_fibs: Option<NodeL2FibTable>,
    pub ip_arps: Option<NodeIpArpTable>,
    pub telemetry: Option<NodeTelemetryMap>,
}

impl VppNode {
    fn new(id: u32, name: &str, ip_addr: &str, man_ip_addr: &str) -> Self {
        VppNode {
            id,
            name: name.to_string(),
            ip_addr: ip_addr.to_string(),
            man_ip_addr: man_ip_addr.to_string(),
            ..VppNode::default()
        }
    }

    /// The loopback (BVI) interface of this node, if the interface table
    /// was uploaded and contains one.
    #[must_use]
    pub fn loopback_interface(&self, pattern: &str) -> Option<(u32, &NodeInterface)> {
        self.interfaces
            .as_ref()?
            .iter()
            .find(|(_, ifc)| ifc.is_loopback(pattern))
            .map(|(index, ifc)| (*index, ifc))
    }
}

/// A rejected attempt to point a unique secondary index row at a second
/// node. The first writer stays in place; the collision is handed back to
/// the caller to be reported.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexCollision {
    pub index: &'static str,
    pub key: String,
    /// The node that owns the index row.
    pub holder: String,
    /// The node whose upload tried to claim the row.
    pub claimant: String,
}

impl Display for IndexCollision {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} '{}' is claimed by both node '{}' and node '{}'",
            self.index, self.key, self.holder, self.claimant
        )
    }
}

const LOOP_IP_INDEX: &str = "loopback IP";
const LOOP_MAC_INDEX: &str = "loopback MAC";

type IndexMap = HashMap<String, String, RandomState>;

#[derive(Default)]
struct VppStoreInner {
    nodes: BTreeMap<String, VppNode>,
    by_id: HashMap<u32, String, RandomState>,
    by_gige_ip: IndexMap,
    by_loop_ip: IndexMap,
    by_loop_mac: IndexMap,
    by_host_ip: IndexMap,
}

impl VppStoreInner {
    /// Drop every loopback index row owned by `name`. Run before relinking
    /// so the loop indexes are always a function of the current interface
    /// table.
    fn unlink_loop_indexes(&mut self, name: &str) {
        self.by_loop_ip.retain(|_, owner| owner.as_str() != name);
        self.by_loop_mac.retain(|_, owner| owner.as_str() != name);
    }

    /// Register the loopback addresses of `interfaces` for node `name`.
    /// Rows already owned by another node are left in place and returned
    /// as collisions.
    fn link_loop_indexes(
        &mut self,
        name: &str,
        interfaces: &NodeInterfaceMap,
        pattern: &str,
    ) -> Vec<IndexCollision> {
        let mut collisions = Vec::new();
        for ifc in interfaces.values().filter(|ifc| ifc.is_loopback(pattern)) {
            for address in &ifc.ip_addresses {
                let bare = strip_cidr(address).to_string();
                claim_row(&mut self.by_loop_ip, LOOP_IP_INDEX, bare, name, &mut collisions);
            }
            if !ifc.phys_address.is_empty() {
                claim_row(
                    &mut self.by_loop_mac,
                    LOOP_MAC_INDEX,
                    ifc.phys_address.clone(),
                    name,
                    &mut collisions,
                );
            }
        }
        collisions
    }
}

fn claim_row(
    index: &mut IndexMap,
    index_name: &'static str,
    key: String,
    claimant: &str,
    collisions: &mut Vec<IndexCollision>,
) {
    match index.entry(key) {
        Entry::Vacant(row) => {
            row.insert(claimant.to_string());
        }
        Entry::Occupied(row) => {
            if row.get() != claimant {
                collisions.push(IndexCollision {
                    index: index_name,
                    key: row.key().clone(),
                    holder: row.get().clone(),
                    claimant: claimant.to_string(),
                });
            }
        }
    }
}

/// The store of per-node vswitch telemetry.
pub struct VppDataStore {
    inner: RwLock<VppStoreInner>,
    loopback_pattern: String,
}

impl Default for VppDataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VppDataStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_loopback_pattern(DEFAULT_LOOPBACK_PATTERN)
    }

    /// Build a store matching loopback interfaces against `pattern`
    /// instead of the default.
    #[must_use]
    pub fn with_loopback_pattern(pattern: impl Into<String>) -> Self {
        VppDataStore {
            inner: RwLock::new(VppStoreInner::default()),
            loopback_pattern: pattern.into(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, VppStoreInner> {
        self.inner.read().expect("poisoned vpp store lock")
    }

    fn write(&self) -> RwLockWriteGuard<'_, VppStoreInner> {
        self.inner.write().expect("poisoned vpp store lock")
    }

    /// Add a node to the store and register its GigE address.
    ///
    /// # Errors
    ///
    /// Fails if a node with the same name or id already exists; the store
    /// is left untouched in that case.
    pub fn create_node(
        &self,
        id: u32,
        name: &str,
        ip_addr: &str,
        man_ip_addr: &str,
    ) -> Result<(), DataStoreError> {
        let mut guard = self.write();
        let inner = &mut *guard;
        if inner.nodes.contains_key(name) {
            return Err(DataStoreError::DuplicateNode(name.to_string()));
        }
        if inner.by_id.contains_key(&id) {
            return Err(DataStoreError::DuplicateNodeId(id));
        }
        debug!("Adding node '{name}' (id {id}, gigE '{ip_addr}', mgmt '{man_ip_addr}')");
        inner.by_id.insert(id, name.to_string());
        if !ip_addr.is_empty() {
            inner.by_gige_ip.insert(ip_addr.to_string(), name.to_string());
        }
        inner
            .nodes
            .insert(name.to_string(), VppNode::new(id, name, ip_addr, man_ip_addr));
        Ok(())
    }

    /// Replace the addresses of an existing node. The node id and the
    /// child collections are preserved.
    ///
    /// # Errors
    ///
    /// Fails if no node with this name exists.
    pub fn update_node(
        &self,
        id: u32,
        name: &str,
        ip_addr: &str,
        man_ip_addr: &str,
    ) -> Result<(), DataStoreError> {
        let mut guard = self.write();
        let inner = &mut *guard;
        let Some(node) = inner.nodes.get_mut(name) else {
            return Err(DataStoreError::NoSuchNode(name.to_string()));
        };
        if node.id != id {
            warn!("Ignoring id change {} -> {id} for node '{name}'", node.id);
        }
        let old_ip = std::mem::replace(&mut node.ip_addr, ip_addr.to_string());
        node.man_ip_addr = man_ip_addr.to_string();
        if old_ip != ip_addr {
            if inner.by_gige_ip.get(&old_ip).is_some_and(|owner| owner == name) {
                inner.by_gige_ip.remove(&old_ip);
            }
            if !ip_addr.is_empty() {
                inner.by_gige_ip.insert(ip_addr.to_string(), name.to_string());
            }
        }
        Ok(())
    }

    /// Remove a node and every index row that referenced it.
    ///
    /// # Errors
    ///
    /// Fails if no node with this name exists.
    pub fn delete_node(&self, name: &str) -> Result<(), DataStoreError> {
        let mut guard = self.write();
        let inner = &mut *guard;
        let Some(node) = inner.nodes.remove(name) else {
            return Err(DataStoreError::NoSuchNode(name.to_string()));
        };
        debug!("Deleted node '{name}' (id {})", node.id);
        inner.by_id.retain(|_, owner| owner.as_str() != name);
        inner.by_gige_ip.retain(|_, owner| owner.as_str() != name);
        inner.by_host_ip.retain(|_, owner| owner.as_str() != name);
        inner.unlink_loop_indexes(name);
        Ok(())
    }

    /// Look up a node by name.
    ///
    /// # Errors
    ///
    /// Fails if no node with this name exists.
    pub fn retrieve_node(&self, name: &str) -> Result<VppNode, DataStoreError> {
        self.read()
            .nodes
            .get(name)
            .cloned()
            .ok_or_else(|| DataStoreError::NoSuchNode(name.to_string()))
    }

    /// All nodes, in ascending name order. Callers depend on the ordering.
    #[must_use]
    pub fn retrieve_all_nodes(&self) -> Vec<VppNode> {
        self.read().nodes.values().cloned().collect()
    }

    /// The names of all nodes, in ascending order.
    #[must_use]
    pub fn node_names(&self) -> Vec<String> {
        self.read().nodes.keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().nodes.is_empty()
    }

    fn retrieve_by_index(
        &self,
        index: &'static str,
        select: impl Fn(&VppStoreInner) -> &IndexMap,
        key: &str,
    ) -> Result<VppNode, DataStoreError> {
        let inner = self.read();
        select(&inner)
            .get(key)
            .and_then(|name| inner.nodes.get(name))
            .cloned()
            .ok_or_else(|| DataStoreError::IndexMiss {
                index,
                key: key.to_string(),
            })
    }

    /// Look up a node by node id.
    ///
    /// # Errors
    ///
    /// Fails if the id is not registered.
    pub fn retrieve_node_by_id(&self, id: u32) -> Result<VppNode, DataStoreError> {
        let inner = self.read();
        inner
            .by_id
            .get(&id)
            .and_then(|name| inner.nodes.get(name))
            .cloned()
            .ok_or_else(|| DataStoreError::IndexMiss {
                index: "id",
                key: id.to_string(),
            })
    }

    /// Look up a node by the GigE address it was created with. Exact match
    /// on the raw string, mask included.
    ///
    /// # Errors
    ///
    /// Fails if the address is not registered.
    pub fn retrieve_node_by_gige_ip_addr(&self, ip: &str) -> Result<VppNode, DataStoreError> {
        self.retrieve_by_index("gigE IP", |inner| &inner.by_gige_ip, ip)
    }

    /// Look up a node by host IP.
    ///
    /// # Errors
    ///
    /// Fails if the address is not registered.
    pub fn retrieve_node_by_host_ip_addr(&self, ip: &str) -> Result<VppNode, DataStoreError> {
        self.retrieve_by_index("host IP", |inner| &inner.by_host_ip, ip)
    }

    /// Look up a node by one of its loopback addresses (bare, no mask).
    ///
    /// # Errors
    ///
    /// Fails if the address is not registered.
    pub fn retrieve_node_by_loop_ip_addr(&self, ip: &str) -> Result<VppNode, DataStoreError> {
        self.retrieve_by_index(LOOP_IP_INDEX, |inner| &inner.by_loop_ip, ip)
    }

    /// Look up a node by its loopback MAC address.
    ///
    /// # Errors
    ///
    /// Fails if the address is not registered.
    pub fn retrieve_node_by_loop_mac_addr(&self, mac: &str) -> Result<VppNode, DataStoreError> {
        self.retrieve_by_index(LOOP_MAC_INDEX, |inner| &inner.by_loop_mac, mac)
    }

    /// Attach the liveness document to a node.
    ///
    /// # Errors
    ///
    /// Fails if no node with this name exists.
    pub fn set_node_liveness(
        &self,
        name: &str,
        liveness: NodeLiveness,
    ) -> Result<(), DataStoreError> {
        self.with_node(name, |node| node.liveness = Some(liveness))
    }

    /// Attach the interface table to a node and rebuild the loopback IP and
    /// loopback MAC indexes from it. Rows owned by other nodes are
    /// preserved and returned as collisions for the caller to report.
    ///
    /// # Errors
    ///
    /// Fails if no node with this name exists.
    pub fn set_node_interfaces(
        &self,
        name: &str,
        interfaces: NodeInterfaceMap,
    ) -> Result<Vec<IndexCollision>, DataStoreError> {
        let mut guard = self.write();
        let inner = &mut *guard;
        if !inner.nodes.contains_key(name) {
            return Err(DataStoreError::NoSuchNode(name.to_string()));
        }
        inner.unlink_loop_indexes(name);
        let collisions = inner.link_loop_indexes(name, &interfaces, &self.loopback_pattern);
        for collision in &collisions {
            warn!("{collision}");
        }
        if let Some(node) = inner.nodes.get_mut(name) {
            node.interfaces = Some(interfaces);
        }
        Ok(collisions)
    }

    /// Attach the bridge-domain table to a node.
    ///
    /// # Errors
    ///
    /// Fails if no node with this name exists.
    pub fn set_node_bridge_domains(
        &self,
        name: &str,
        bridge_domains: NodeBridgeDomainMap,
    ) -> Result<(), DataStoreError> {
        self.with_node(name, |node| node.bridge_domains = Some(bridge_domains))
    }

    /// Attach the L2 FIB table to a node.
    ///
    /// # Errors
    ///
    /// Fails if no node with this name exists.
    pub fn set_node_l2fibs(&self, name: &str, fibs: NodeL2FibTable) -> Result<(), DataStoreError> {
        self.with_node(name, |node| node.l2_fibs = Some(fibs))
    }

    /// Attach the ARP table to a node.
    ///
    /// # Errors
    ///
    /// Fails if no node with this name exists.
    pub fn set_node_ip_arps(&self, name: &str, arps: NodeIpArpTable) -> Result<(), DataStoreError> {
        self.with_node(name, |node| node.ip_arps = Some(arps))
    }

    /// Attach raw command outputs to a node.
    ///
    /// # Errors
    ///
    /// Fails if no node with this name exists.
    pub fn set_node_telemetry(
        &self,
        name: &str,
        telemetry: NodeTelemetryMap,
    ) -> Result<(), DataStoreError> {
        self.with_node(name, |node| node.telemetry = Some(telemetry))
    }

    /// Register a host IP for a node. First writer wins; a later claim for
    /// the same address by another node is logged and ignored.
    ///
    /// # Errors
    ///
    /// Fails if no node with this name exists.
    pub fn set_node_host_ip(&self, name: &str, host_ip: &str) -> Result<(), DataStoreError> {
        let mut guard = self.write();
        let inner = &mut *guard;
        if !inner.nodes.contains_key(name) {
            return Err(DataStoreError::NoSuchNode(name.to_string()));
        }
        match inner.by_host_ip.entry(host_ip.to_string()) {
            Entry::Vacant(row) => {
                row.insert(name.to_string());
            }
            Entry::Occupied(row) => {
                if row.get() != name {
                    warn!(
                        "host IP '{host_ip}' already registered for node '{}'; not relinking to '{name}'",
                        row.get()
                    );
                }
            }
        }
        Ok(())
    }

    fn with_node(
        &self,
        name: &str,
        update: impl FnOnce(&mut VppNode),
    ) -> Result<(), DataStoreError> {
        let mut inner = self.write();
        let Some(node) = inner.nodes.get_mut(name) else {
            return Err(DataStoreError::NoSuchNode(name.to_string()));
        };
        update(node);
        Ok(())
    }

    /// Drop all node records and the indexes derived from them.
    pub fn clear_cache(&self) {
        debug!("Clearing vpp store");
        let mut guard = self.write();
        let inner = &mut *guard;
        inner.nodes.clear();
        inner.by_id.clear();
        inner.by_gige_ip.clear();
        inner.by_loop_ip.clear();
        inner.by_loop_mac.clear();
        inner.by_host_ip.clear();
    }

    /// Full reset of the store, discovered pointers included.
    pub fn reinitialize_cache(&self) {
        debug!("Reinitializing vpp store");
        *self.write() = VppStoreInner::default();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use telemetry::{InterfaceType, Vxlan};
    use tracing_test::traced_test;

    fn loop_interface(name: &str, mac: &str, ips: &[&str]) -> NodeInterface {
        NodeInterface {
            vpp_internal_name: name.to_string(),
            name: "vxlanBVI".to_string(),
            enabled: true,
            phys_address: mac.to_string(),
            mtu: 1500,
            ip_addresses: ips.iter().map(ToString::to_string).collect(),
            ..NodeInterface::default()
        }
    }

    fn vxlan_interface(src: &str, dst: &str) -> NodeInterface {
        NodeInterface {
            vpp_internal_name: "vxlan_tunnel0".to_string(),
            name: "vxlan1".to_string(),
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

    #[test]
    fn create_and_retrieve_node() {
        let store = VppDataStore::new();
        store
            .create_node(1, "k8s-master", "192.168.16.3/24", "10.20.0.2")
            .expect("Should succeed");

        let node = store.retrieve_node("k8s-master").expect("Should succeed");
        assert_eq!(node.id, 1);
        assert_eq!(node.ip_addr, "192.168.16.3/24");
        assert_eq!(node.man_ip_addr, "10.20.0.2");
        assert!(node.liveness.is_none());
    }

    #[test]
    fn duplicate_create_fails_and_leaves_state_untouched() {
        let store = VppDataStore::new();
        store
            .create_node(1, "k8s-master", "10", "20")
            .expect("Should succeed");
        assert_eq!(
            store.create_node(2, "k8s-master", "30", "40"),
            Err(DataStoreError::DuplicateNode("k8s-master".to_string()))
        );
        assert_eq!(
            store.create_node(1, "k8s-worker1", "30", "40"),
            Err(DataStoreError::DuplicateNodeId(1))
        );

        let node = store.retrieve_node("k8s-master").expect("Should succeed");
        assert_eq!(node.ip_addr, "10");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn retrieve_unknown_node_fails() {
        let store = VppDataStore::new();
        assert_eq!(
            store.retrieve_node("nonexistent"),
            Err(DataStoreError::NoSuchNode("nonexistent".to_string()))
        );
    }

    #[test]
    fn retrieve_all_nodes_is_sorted_by_name() {
        let store = VppDataStore::new();
        store.create_node(1, "k8s-worker1", "10", "10").expect("Should succeed");
        store.create_node(2, "k8s-master", "11", "11").expect("Should succeed");
        store.create_node(3, "a-node", "12", "12").expect("Should succeed");

        let names: Vec<_> = store
            .retrieve_all_nodes()
            .into_iter()
            .map(|node| node.name)
            .collect();
        assert_eq!(names, vec!["a-node", "k8s-master", "k8s-worker1"]);
        assert_eq!(store.node_names(), names);
    }

    #[test]
    fn update_node_replaces_addresses_and_preserves_children() {
        let store = VppDataStore::new();
        store.create_node(1, "k8s-master", "10", "10").expect("Should succeed");
        store
            .set_node_liveness("k8s-master", NodeLiveness::default())
            .expect("Should succeed");

        store
            .update_node(1, "k8s-master", "20", "21")
            .expect("Should succeed");
        let node = store.retrieve_node("k8s-master").expect("Should succeed");
        assert_eq!(node.ip_addr, "20");
        assert_eq!(node.man_ip_addr, "21");
        assert_eq!(node.id, 1);
        assert!(node.liveness.is_some());

        // the gigE index follows the address
        assert!(store.retrieve_node_by_gige_ip_addr("10").is_err());
        assert_eq!(
            store
                .retrieve_node_by_gige_ip_addr("20")
                .expect("Should succeed")
                .name,
            "k8s-master"
        );

        assert_eq!(
            store.update_node(1, "nonexistent", "2", "2"),
            Err(DataStoreError::NoSuchNode("nonexistent".to_string()))
        );
    }

    #[test]
    fn delete_node_removes_every_index_row() {
        let store = VppDataStore::new();
        store
            .create_node(1, "k8s-master", "192.168.16.3/24", "10.20.0.2")
            .expect("Should succeed");
        let mut interfaces = NodeInterfaceMap::new();
        interfaces.insert(3, loop_interface("loop0", "1a:2b:3c:4d:5e:03", &["192.168.30.3/24"]));
        store
            .set_node_interfaces("k8s-master", interfaces)
            .expect("Should succeed");
        store
            .set_node_host_ip("k8s-master", "10.20.0.2")
            .expect("Should succeed");

        store.delete_node("k8s-master").expect("Should succeed");
        assert!(store.retrieve_node("k8s-master").is_err());
        assert!(store.retrieve_node_by_id(1).is_err());
        assert!(store.retrieve_node_by_gige_ip_addr("192.168.16.3/24").is_err());
        assert!(store.retrieve_node_by_loop_ip_addr("192.168.30.3").is_err());
        assert!(store.retrieve_node_by_loop_mac_addr("1a:2b:3c:4d:5e:03").is_err());
        assert!(store.retrieve_node_by_host_ip_addr("10.20.0.2").is_err());

        assert_eq!(
            store.delete_node("k8s-master"),
            Err(DataStoreError::NoSuchNode("k8s-master".to_string()))
        );
    }

    #[test]
    fn create_delete_retrieve_roundtrip() {
        let store = VppDataStore::new();
        store.create_node(1, "k8s-master", "10", "10").expect("Should succeed");
        store.delete_node("k8s-master").expect("Should succeed");
        assert_eq!(
            store.retrieve_node("k8s-master"),
            Err(DataStoreError::NoSuchNode("k8s-master".to_string()))
        );
    }

    #[test]
    fn setters_fail_for_unknown_node() {
        let store = VppDataStore::new();
        assert!(store.set_node_liveness("nonexistent", NodeLiveness::default()).is_err());
        assert!(store.set_node_interfaces("nonexistent", NodeInterfaceMap::new()).is_err());
        assert!(store.set_node_bridge_domains("nonexistent", NodeBridgeDomainMap::new()).is_err());
        assert!(store.set_node_l2fibs("nonexistent", NodeL2FibTable::new()).is_err());
        assert!(store.set_node_ip_arps("nonexistent", NodeIpArpTable::new()).is_err());
        assert!(store.set_node_telemetry("nonexistent", NodeTelemetryMap::new()).is_err());
        assert!(store.set_node_host_ip("nonexistent", "10.20.0.2").is_err());
    }

    #[test]
    fn set_liveness_roundtrip() {
        let store = VppDataStore::new();
        store.create_node(1, "k8s-master", "10", "10").expect("Should succeed");
        let liveness = NodeLiveness {
            build_version: "v1.2-alpha-179-g4e2d712".to_string(),
            ..NodeLiveness::default()
        };
        store
            .set_node_liveness("k8s-master", liveness.clone())
            .expect("Should succeed");
        let node = store.retrieve_node("k8s-master").expect("Should succeed");
        assert_eq!(node.liveness, Some(liveness));
    }

    #[test]
    fn loop_index_follows_interface_upload() {
        let store = VppDataStore::new();
        store.create_node(1, "n", "10", "10").expect("Should succeed");

        // upload with a loop0 interface
        let mut interfaces = NodeInterfaceMap::new();
        interfaces.insert(3, loop_interface("loop0", "aa:bb:cc:dd:ee:ff", &["1.2.3.4"]));
        let collisions = store
            .set_node_interfaces("n", interfaces)
            .expect("Should succeed");
        assert!(collisions.is_empty());
        assert_eq!(
            store
                .retrieve_node_by_loop_ip_addr("1.2.3.4")
                .expect("Should succeed")
                .name,
            "n"
        );
        assert_eq!(
            store
                .retrieve_node_by_loop_mac_addr("aa:bb:cc:dd:ee:ff")
                .expect("Should succeed")
                .name,
            "n"
        );

        // upload again without loop0: no stale rows may remain
        let mut interfaces = NodeInterfaceMap::new();
        interfaces.insert(1, vxlan_interface("10.20.30.40", "11.22.33.44"));
        store.set_node_interfaces("n", interfaces).expect("Should succeed");
        assert!(store.retrieve_node_by_loop_ip_addr("1.2.3.4").is_err());
        assert!(store.retrieve_node_by_loop_mac_addr("aa:bb:cc:dd:ee:ff").is_err());
    }

    #[test]
    fn loop_index_strips_cidr_mask() {
        let store = VppDataStore::new();
        store.create_node(1, "n", "10", "10").expect("Should succeed");
        let mut interfaces = NodeInterfaceMap::new();
        interfaces.insert(4, loop_interface("loop0", "1a:2b:3c:4d:5e:03", &["192.168.30.3/24"]));
        store.set_node_interfaces("n", interfaces).expect("Should succeed");
        assert!(store.retrieve_node_by_loop_ip_addr("192.168.30.3").is_ok());
        assert!(store.retrieve_node_by_loop_ip_addr("192.168.30.3/24").is_err());
    }

    #[test]
    #[traced_test]
    fn loop_index_collision_preserves_first_writer() {
        let store = VppDataStore::new();
        store.create_node(1, "first", "10", "10").expect("Should succeed");
        store.create_node(2, "second", "11", "11").expect("Should succeed");

        let mut interfaces = NodeInterfaceMap::new();
        interfaces.insert(3, loop_interface("loop0", "aa:bb:cc:dd:ee:ff", &["1.2.3.4"]));
        store
            .set_node_interfaces("first", interfaces.clone())
            .expect("Should succeed");

        let collisions = store
            .set_node_interfaces("second", interfaces)
            .expect("Should succeed");
        assert_eq!(collisions.len(), 2); // one for the IP, one for the MAC
        assert_eq!(collisions[0].holder, "first");
        assert_eq!(collisions[0].claimant, "second");

        // the first writer keeps the rows
        assert_eq!(
            store
                .retrieve_node_by_loop_ip_addr("1.2.3.4")
                .expect("Should succeed")
                .name,
            "first"
        );
        assert_eq!(
            store
                .retrieve_node_by_loop_mac_addr("aa:bb:cc:dd:ee:ff")
                .expect("Should succeed")
                .name,
            "first"
        );
    }

    #[test]
    fn gige_index_uses_raw_create_time_string() {
        let store = VppDataStore::new();
        store
            .create_node(1, "k8s-master", "192.168.16.3/24", "10.20.0.2")
            .expect("Should succeed");
        assert!(store.retrieve_node_by_gige_ip_addr("192.168.16.3/24").is_ok());
        assert!(store.retrieve_node_by_gige_ip_addr("192.168.16.3").is_err());
    }

    #[test]
    fn host_ip_registration_first_writer_wins() {
        let store = VppDataStore::new();
        store.create_node(1, "first", "10", "10").expect("Should succeed");
        store.create_node(2, "second", "11", "11").expect("Should succeed");
        store.set_node_host_ip("first", "10.20.0.2").expect("Should succeed");
        store.set_node_host_ip("second", "10.20.0.2").expect("Should succeed");
        assert_eq!(
            store
                .retrieve_node_by_host_ip_addr("10.20.0.2")
                .expect("Should succeed")
                .name,
            "first"
        );
    }

    #[test]
    fn clear_cache_empties_records_and_indexes() {
        let store = VppDataStore::new();
        store.create_node(1, "k8s-master", "10", "10").expect("Should succeed");
        store.create_node(2, "k8s-worker1", "20", "20").expect("Should succeed");
        store.clear_cache();
        assert!(store.is_empty());
        assert!(store.retrieve_node("k8s-master").is_err());
        assert!(store.retrieve_node_by_gige_ip_addr("10").is_err());

        // names and ids are free for reuse after the reset
        store.create_node(1, "k8s-master", "10", "10").expect("Should succeed");
    }

    #[test]
    fn reinitialize_cache_is_a_full_reset() {
        let store = VppDataStore::new();
        store.create_node(1, "k8s-master", "10", "10").expect("Should succeed");
        store.set_node_host_ip("k8s-master", "10.20.0.2").expect("Should succeed");
        store.reinitialize_cache();
        assert!(store.is_empty());
        assert!(store.retrieve_node_by_host_ip_addr("10.20.0.2").is_err());
    }

    #[test]
    fn loopback_interface_lookup_respects_pattern() {
        let store = VppDataStore::with_loopback_pattern("lo");
        store.create_node(1, "n", "10", "10").expect("Should succeed");
        let mut interfaces = NodeInterfaceMap::new();
        interfaces.insert(7, loop_interface("lo0", "aa:bb:cc:dd:ee:01", &["1.1.1.1"]));
        store.set_node_interfaces("n", interfaces).expect("Should succeed");
        assert!(store.retrieve_node_by_loop_ip_addr("1.1.1.1").is_ok());

        let node = store.retrieve_node("n").expect("Should succeed");
        let (index, ifc) = node.loopback_interface("lo").expect("Should succeed");
        assert_eq!(index, 7);
        assert_eq!(ifc.phys_address, "aa:bb:cc:dd:ee:01");
        assert!(node.loopback_interface("loop0").is_none());
    }
}
