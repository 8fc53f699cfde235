// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The Kubernetes state store: node records keyed by name and pod records
//! keyed by `(namespace, name)` with a secondary host-IP index.

use crate::errors::DataStoreError;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use telemetry::{K8sNode, MultiIndexPodMap, Pod, PodKey};
use tracing::debug;

#[derive(Default)]
struct K8sStoreInner {
    nodes: BTreeMap<String, K8sNode>,
    pods: MultiIndexPodMap,
}

/// The store of Kubernetes node and pod records, fed by the external
/// watcher.
#[derive(Default)]
pub struct K8sDataStore {
    inner: RwLock<K8sStoreInner>,
}

impl K8sDataStore {
    #[must_use]
    pub fn new() -> Self {
        K8sDataStore::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, K8sStoreInner> {
        self.inner.read().expect("poisoned k8s store lock")
    }

    fn write(&self) -> RwLockWriteGuard<'_, K8sStoreInner> {
        self.inner.write().expect("poisoned k8s store lock")
    }

    /// Add a node record.
    ///
    /// # Errors
    ///
    /// Fails if a node with the same name already exists.
    pub fn create_k8s_node(&self, node: K8sNode) -> Result<(), DataStoreError> {
        let mut inner = self.write();
        if inner.nodes.contains_key(&node.name) {
            return Err(DataStoreError::DuplicateK8sNode(node.name.clone()));
        }
        debug!("Adding k8s node '{}'", node.name);
        inner.nodes.insert(node.name.clone(), node);
        Ok(())
    }

    /// Replace an existing node record wholesale.
    ///
    /// # Errors
    ///
    /// Fails if no node with this name exists.
    pub fn update_k8s_node(&self, node: K8sNode) -> Result<(), DataStoreError> {
        let mut inner = self.write();
        if !inner.nodes.contains_key(&node.name) {
            return Err(DataStoreError::NoSuchK8sNode(node.name.clone()));
        }
        inner.nodes.insert(node.name.clone(), node);
        Ok(())
    }

    /// Remove a node record.
    ///
    /// # Errors
    ///
    /// Fails if no node with this name exists.
    pub fn delete_k8s_node(&self, name: &str) -> Result<(), DataStoreError> {
        let mut inner = self.write();
        match inner.nodes.remove(name) {
            Some(_) => {
                debug!("Deleted k8s node '{name}'");
                Ok(())
            }
            None => Err(DataStoreError::NoSuchK8sNode(name.to_string())),
        }
    }

    /// Look up a node record by name.
    ///
    /// # Errors
    ///
    /// Fails if no node with this name exists.
    pub fn retrieve_k8s_node(&self, name: &str) -> Result<K8sNode, DataStoreError> {
        self.read()
            .nodes
            .get(name)
            .cloned()
            .ok_or_else(|| DataStoreError::NoSuchK8sNode(name.to_string()))
    }

    /// All node records, in ascending name order.
    #[must_use]
    pub fn retrieve_all_k8s_nodes(&self) -> Vec<K8sNode> {
        self.read().nodes.values().cloned().collect()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.read().nodes.len()
    }

    /// Add a pod record.
    ///
    /// # Errors
    ///
    /// Fails if a pod with the same `(namespace, name)` already exists.
    pub fn create_pod(&self, pod: Pod) -> Result<(), DataStoreError> {
        let mut inner = self.write();
        if inner.pods.get_by_key(&pod.key).is_some() {
            return Err(DataStoreError::DuplicatePod(pod.key.to_string()));
        }
        debug!("Adding pod '{}' on host '{}'", pod.key, pod.host_ip_address);
        inner.pods.insert(pod);
        Ok(())
    }

    /// Remove a pod record.
    ///
    /// # Errors
    ///
    /// Fails if no such pod exists.
    pub fn delete_pod(&self, key: &PodKey) -> Result<(), DataStoreError> {
        let mut inner = self.write();
        match inner.pods.remove_by_key(key) {
            Some(_) => {
                debug!("Deleted pod '{key}'");
                Ok(())
            }
            None => Err(DataStoreError::NoSuchPod(key.to_string())),
        }
    }

    /// Look up a pod record.
    ///
    /// # Errors
    ///
    /// Fails if no such pod exists.
    pub fn retrieve_pod(&self, key: &PodKey) -> Result<Pod, DataStoreError> {
        self.read()
            .pods
            .get_by_key(key)
            .cloned()
            .ok_or_else(|| DataStoreError::NoSuchPod(key.to_string()))
    }

    /// All pod records, ordered by `(namespace, name)`.
    #[must_use]
    pub fn retrieve_all_pods(&self) -> Vec<Pod> {
        self.read().pods.iter_by_key().cloned().collect()
    }

    /// The pods scheduled on the node with the given host IP.
    #[must_use]
    pub fn retrieve_pods_by_host_ip(&self, host_ip: &str) -> Vec<Pod> {
        self.read()
            .pods
            .get_by_host_ip_address(&host_ip.to_string())
            .into_iter()
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn pod_count(&self) -> usize {
        self.read().pods.len()
    }

    /// Full reset of the store.
    pub fn reinitialize_cache(&self) {
        debug!("Reinitializing k8s store");
        *self.write() = K8sStoreInner::default();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use telemetry::{AddressType, NodeAddress};

    fn k8s_node(name: &str, internal_ip: &str) -> K8sNode {
        K8sNode {
            name: name.to_string(),
            pod_cidr: "10.1.3.0/24".to_string(),
            addresses: vec![NodeAddress {
                address_type: AddressType::InternalIp,
                address: internal_ip.to_string(),
            }],
            ..K8sNode::default()
        }
    }

    fn pod(namespace: &str, name: &str, host_ip: &str) -> Pod {
        Pod {
            key: PodKey::new(namespace, name),
            labels: vec![],
            ip_address: host_ip.to_string(),
            host_ip_address: host_ip.to_string(),
            containers: vec![],
        }
    }

    #[test]
    fn node_crud() {
        let store = K8sDataStore::new();
        store
            .create_k8s_node(k8s_node("k8s-master", "10.20.0.2"))
            .expect("Should succeed");
        assert_eq!(
            store.create_k8s_node(k8s_node("k8s-master", "10.20.0.9")),
            Err(DataStoreError::DuplicateK8sNode("k8s-master".to_string()))
        );

        let node = store.retrieve_k8s_node("k8s-master").expect("Should succeed");
        assert!(node.has_internal_ip("10.20.0.2"));

        store
            .update_k8s_node(k8s_node("k8s-master", "10.20.0.3"))
            .expect("Should succeed");
        let node = store.retrieve_k8s_node("k8s-master").expect("Should succeed");
        assert!(node.has_internal_ip("10.20.0.3"));
        assert_eq!(
            store.update_k8s_node(k8s_node("nonexistent", "1.2.3.4")),
            Err(DataStoreError::NoSuchK8sNode("nonexistent".to_string()))
        );

        store.delete_k8s_node("k8s-master").expect("Should succeed");
        assert!(store.retrieve_k8s_node("k8s-master").is_err());
        assert_eq!(
            store.delete_k8s_node("k8s-master"),
            Err(DataStoreError::NoSuchK8sNode("k8s-master".to_string()))
        );
    }

    #[test]
    fn nodes_are_listed_in_name_order() {
        let store = K8sDataStore::new();
        store.create_k8s_node(k8s_node("k8s-worker1", "10.20.0.10")).expect("Should succeed");
        store.create_k8s_node(k8s_node("k8s-master", "10.20.0.2")).expect("Should succeed");
        let names: Vec<_> = store
            .retrieve_all_k8s_nodes()
            .into_iter()
            .map(|node| node.name)
            .collect();
        assert_eq!(names, vec!["k8s-master", "k8s-worker1"]);
    }

    #[test]
    fn pod_crud_and_host_ip_index() {
        let store = K8sDataStore::new();
        store
            .create_pod(pod("kube-system", "kube-proxy-bqjhx", "10.20.0.2"))
            .expect("Should succeed");
        store
            .create_pod(pod("kube-system", "contiv-ksr-mt9nj", "10.20.0.2"))
            .expect("Should succeed");
        store
            .create_pod(pod("default", "nginx-65899c769f-dg5v7", "10.20.0.11"))
            .expect("Should succeed");
        assert_eq!(
            store.create_pod(pod("kube-system", "kube-proxy-bqjhx", "10.20.0.2")),
            Err(DataStoreError::DuplicatePod(
                "kube-system/kube-proxy-bqjhx".to_string()
            ))
        );

        assert_eq!(store.pod_count(), 3);
        assert_eq!(store.retrieve_pods_by_host_ip("10.20.0.2").len(), 2);
        assert_eq!(store.retrieve_pods_by_host_ip("10.20.0.99").len(), 0);

        let key = PodKey::new("kube-system", "kube-proxy-bqjhx");
        assert!(store.retrieve_pod(&key).is_ok());
        store.delete_pod(&key).expect("Should succeed");
        assert!(store.retrieve_pod(&key).is_err());
        assert_eq!(store.retrieve_pods_by_host_ip("10.20.0.2").len(), 1);
    }

    #[test]
    fn all_pods_ordered_by_key() {
        let store = K8sDataStore::new();
        store.create_pod(pod("kube-system", "kube-dns", "10.20.0.2")).expect("Should succeed");
        store.create_pod(pod("default", "nginx", "10.20.0.10")).expect("Should succeed");
        let keys: Vec<_> = store
            .retrieve_all_pods()
            .into_iter()
            .map(|p| p.key.to_string())
            .collect();
        assert_eq!(keys, vec!["default/nginx", "kube-system/kube-dns"]);
    }

    #[test]
    fn reinitialize_drops_everything() {
        let store = K8sDataStore::new();
        store.create_k8s_node(k8s_node("k8s-master", "10.20.0.2")).expect("Should succeed");
        store.create_pod(pod("default", "nginx", "10.20.0.2")).expect("Should succeed");
        store.reinitialize_cache();
        assert_eq!(store.node_count(), 0);
        assert_eq!(store.pod_count(), 0);
    }
}
