// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Events fed to the service processor by the watch layer

use derive_builder::Builder;
use model::{Endpoints, Node, ObjectId, ObjectKey, ObjectKind, Pod, Service};
use std::fmt::Display;

/// An object record of any watched kind
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Object {
    Pod(Pod),
    Endpoints(Endpoints),
    Service(Service),
    Node(Node),
}

impl Object {
    #[must_use]
    pub fn key(&self) -> ObjectKey {
        match self {
            Object::Pod(pod) => ObjectKey::Pod(pod.id()),
            Object::Endpoints(endpoints) => ObjectKey::Endpoints(endpoints.id()),
            Object::Service(service) => ObjectKey::Service(service.id()),
            Object::Node(node) => ObjectKey::Node(node.node_id()),
        }
    }
}

impl From<Pod> for Object {
    fn from(pod: Pod) -> Self {
        Object::Pod(pod)
    }
}
impl From<Endpoints> for Object {
    fn from(endpoints: Endpoints) -> Self {
        Object::Endpoints(endpoints)
    }
}
impl From<Service> for Object {
    fn from(service: Service) -> Self {
        Object::Service(service)
    }
}
impl From<Node> for Object {
    fn from(node: Node) -> Self {
        Object::Node(node)
    }
}

/// A change to a single object
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WatchEvent {
    /// The object was created or updated
    Put(Object),
    Delete(ObjectKey),
    /// The pod is being torn down. Its record may stay around, and endpoints may still reference
    /// it, until it is deleted.
    PodDeleting(ObjectId),
}

impl WatchEvent {
    #[must_use]
    pub fn put(object: impl Into<Object>) -> Self {
        WatchEvent::Put(object.into())
    }
}

impl Display for WatchEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatchEvent::Put(object) => write!(f, "put {}", object.key()),
            WatchEvent::Delete(key) => write!(f, "delete {key}"),
            WatchEvent::PodDeleting(id) => write!(f, "pod {id} deleting"),
        }
    }
}

/// The complete set of objects of the kinds whose key prefixes are listed
#[derive(Builder, Clone, Debug, Default, PartialEq, Eq)]
#[builder(default)]
pub struct ResyncEvent {
    /// The prefixes this event is authoritative for, e.g. `k8s/pod/`
    #[builder(setter(custom))]
    pub key_prefixes: Vec<String>,
    pub pods: Vec<Pod>,
    pub endpoints: Vec<Endpoints>,
    pub services: Vec<Service>,
    pub nodes: Vec<Node>,
}

impl ResyncEventBuilder {
    /// Declare the event authoritative for the given kinds
    pub fn kinds(&mut self, kinds: &[ObjectKind]) -> &mut Self {
        self.key_prefixes = Some(
            kinds
                .iter()
                .map(|kind| kind.key_prefix().to_owned())
                .collect(),
        );
        self
    }
}

impl ResyncEvent {
    /// An event covering all the kinds, holding no object
    #[must_use]
    pub fn empty() -> Self {
        Self {
            key_prefixes: ObjectKind::ALL
                .iter()
                .map(|kind| kind.key_prefix().to_owned())
                .collect(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn covers(&self, kind: ObjectKind) -> bool {
        self.key_prefixes
            .iter()
            .any(|prefix| prefix == kind.key_prefix())
    }
}
