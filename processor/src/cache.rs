// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Local copy of the objects the load-balancer depends on

use crate::event::{Object, ResyncEvent};
use model::{Endpoints, Node, NodeId, ObjectId, ObjectKey, ObjectKind, Pod, Service};
use multi_index_map::MultiIndexMap;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use tracing::{debug, warn};

/// A pod known to the cache
#[derive(Clone, Debug, MultiIndexMap)]
#[multi_index_derive(Clone, Debug, Default)]
pub struct PodRecord {
    #[multi_index(ordered_unique)]
    pub id: ObjectId,
    /// `None` while the pod has no address, or when its address is malformed
    #[multi_index(hashed_non_unique)]
    pub ip: Option<Ipv4Addr>,
    pub pod: Pod,
    /// The pod is being torn down
    pub deleting: bool,
}

impl PodRecord {
    fn new(pod: Pod) -> Self {
        let ip = pod.ip().unwrap_or_else(|e| {
            warn!("Ignoring address of pod: {e}");
            None
        });
        Self {
            id: pod.id(),
            ip,
            pod,
            deleting: false,
        }
    }
}

/// Object records by identity. Records are kept exactly as received; they are only validated
/// when the NAT configuration is built from them.
#[derive(Clone, Debug, Default)]
pub struct ObjectCache {
    pods: MultiIndexPodRecordMap,
    endpoints: BTreeMap<ObjectId, Endpoints>,
    services: BTreeMap<ObjectId, Service>,
    nodes: BTreeMap<NodeId, Node>,
}

impl ObjectCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an object
    pub fn put(&mut self, object: Object) {
        match object {
            Object::Pod(pod) => {
                let record = PodRecord::new(pod);
                // an update of a pod being torn down does not bring it back
                let deleting = self
                    .pods
                    .remove_by_id(&record.id)
                    .is_some_and(|old| old.deleting);
                self.insert_pod(PodRecord { deleting, ..record });
            }
            Object::Endpoints(endpoints) => {
                self.endpoints.insert(endpoints.id(), endpoints);
            }
            Object::Service(service) => {
                self.services.insert(service.id(), service);
            }
            Object::Node(node) => {
                self.nodes.insert(node.node_id(), node);
            }
        }
    }

    /// Remove an object. Returns false if it was not known.
    pub fn delete(&mut self, key: &ObjectKey) -> bool {
        match key {
            ObjectKey::Pod(id) => self.pods.remove_by_id(id).is_some(),
            ObjectKey::Endpoints(id) => self.endpoints.remove(id).is_some(),
            ObjectKey::Service(id) => self.services.remove(id).is_some(),
            ObjectKey::Node(id) => self.nodes.remove(id).is_some(),
        }
    }

    /// Flag a pod as being torn down. Returns false if the pod is unknown or already flagged.
    pub fn mark_pod_deleting(&mut self, id: &ObjectId) -> bool {
        match self.pods.remove_by_id(id) {
            Some(record) => {
                let changed = !record.deleting;
                self.insert_pod(PodRecord {
                    deleting: true,
                    ..record
                });
                changed
            }
            None => false,
        }
    }

    fn insert_pod(&mut self, record: PodRecord) {
        if let Err(e) = self.pods.try_insert(record) {
            // the previous record was removed first, so this cannot collide
            warn!("Failed to store pod record: {e:?}");
        }
    }

    /// Replace the contents of every kind covered by `event`.
    ///
    /// Pods supplied by the event are no longer considered as being torn down.
    pub fn resync(&mut self, event: ResyncEvent) {
        for kind in ObjectKind::ALL {
            if !event.covers(kind) {
                warn!(
                    "Resync does not cover {} objects (prefix {}): keeping cached ones",
                    kind,
                    kind.key_prefix()
                );
            }
        }
        let (pods, endpoints, services, nodes) = (
            event.covers(ObjectKind::Pod),
            event.covers(ObjectKind::Endpoints),
            event.covers(ObjectKind::Service),
            event.covers(ObjectKind::Node),
        );
        let ResyncEvent {
            pods: new_pods,
            endpoints: new_endpoints,
            services: new_services,
            nodes: new_nodes,
            ..
        } = event;
        if pods {
            self.pods.clear();
            for pod in new_pods {
                self.insert_pod(PodRecord::new(pod));
            }
        }
        if endpoints {
            self.endpoints = new_endpoints.into_iter().map(|e| (e.id(), e)).collect();
        }
        if services {
            self.services = new_services.into_iter().map(|s| (s.id(), s)).collect();
        }
        if nodes {
            self.nodes = new_nodes.into_iter().map(|n| (n.node_id(), n)).collect();
        }
        debug!(
            "Cache resynced: {} pods, {} endpoints, {} services, {} nodes",
            self.pods.len(),
            self.endpoints.len(),
            self.services.len(),
            self.nodes.len()
        );
    }

    #[must_use]
    pub fn pod(&self, id: &ObjectId) -> Option<&PodRecord> {
        self.pods.get_by_id(id)
    }

    /// Pods ordered by identity
    pub fn pods(&self) -> impl Iterator<Item = &PodRecord> {
        self.pods.iter_by_id()
    }

    /// Pods currently holding `ip`
    #[must_use]
    pub fn pods_with_ip(&self, ip: Ipv4Addr) -> Vec<&PodRecord> {
        self.pods.get_by_ip(&Some(ip))
    }

    pub fn services(&self) -> impl Iterator<Item = &Service> {
        self.services.values()
    }

    #[must_use]
    pub fn endpoints(&self, service: &ObjectId) -> Option<&Endpoints> {
        self.endpoints.get(service)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    #[must_use]
    pub fn len(&self, kind: ObjectKind) -> usize {
        match kind {
            ObjectKind::Pod => self.pods.len(),
            ObjectKind::Endpoints => self.endpoints.len(),
            ObjectKind::Service => self.services.len(),
            ObjectKind::Node => self.nodes.len(),
        }
    }
}
