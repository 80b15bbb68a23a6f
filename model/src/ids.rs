// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Identities of cluster objects and the keys they are stored under

use crate::errors::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Identity of a namespaced object (pod, service, endpoints)
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId {
    pub namespace: String,
    pub name: String,
}

impl ObjectId {
    #[must_use]
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_owned(),
            name: name.to_owned(),
        }
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Cluster-unique identifier allocated to a node
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The object kinds the load-balancer watches
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display)]
pub enum ObjectKind {
    Pod,
    Endpoints,
    Service,
    Node,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 4] = [Self::Pod, Self::Endpoints, Self::Service, Self::Node];

    /// Prefix of the keys under which objects of this kind are stored
    #[must_use]
    pub const fn key_prefix(self) -> &'static str {
        match self {
            ObjectKind::Pod => "k8s/pod/",
            ObjectKind::Endpoints => "k8s/endpoints/",
            ObjectKind::Service => "k8s/service/",
            ObjectKind::Node => "allocatedIDs/",
        }
    }
}

/// Key of an individual object
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjectKey {
    Pod(ObjectId),
    Endpoints(ObjectId),
    Service(ObjectId),
    Node(NodeId),
}

impl ObjectKey {
    #[must_use]
    pub fn kind(&self) -> ObjectKind {
        match self {
            ObjectKey::Pod(_) => ObjectKind::Pod,
            ObjectKey::Endpoints(_) => ObjectKind::Endpoints,
            ObjectKey::Service(_) => ObjectKind::Service,
            ObjectKey::Node(_) => ObjectKind::Node,
        }
    }

    /// Parse a key such as `k8s/service/default/kube-dns` or `allocatedIDs/3`
    pub fn parse(key: &str) -> ModelResult<Self> {
        let bad_key = || ModelError::BadKey(key.to_owned());
        let kind = ObjectKind::ALL
            .into_iter()
            .find(|kind| key.starts_with(kind.key_prefix()))
            .ok_or_else(bad_key)?;
        let suffix = &key[kind.key_prefix().len()..];
        let namespaced = || -> ModelResult<ObjectId> {
            let (namespace, name) = suffix.split_once('/').ok_or_else(bad_key)?;
            if namespace.is_empty() || name.is_empty() || name.contains('/') {
                return Err(bad_key());
            }
            Ok(ObjectId::new(namespace, name))
        };
        Ok(match kind {
            ObjectKind::Pod => ObjectKey::Pod(namespaced()?),
            ObjectKind::Endpoints => ObjectKey::Endpoints(namespaced()?),
            ObjectKind::Service => ObjectKey::Service(namespaced()?),
            ObjectKind::Node => ObjectKey::Node(NodeId(suffix.parse().map_err(|_| bad_key())?)),
        })
    }
}

impl Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = self.kind().key_prefix();
        match self {
            ObjectKey::Pod(id) | ObjectKey::Endpoints(id) | ObjectKey::Service(id) => {
                write!(f, "{prefix}{id}")
            }
            ObjectKey::Node(id) => write!(f, "{prefix}{id}"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn key_roundtrip() {
        let keys = [
            ObjectKey::Pod(ObjectId::new("default", "pod1")),
            ObjectKey::Endpoints(ObjectId::new("default", "service1")),
            ObjectKey::Service(ObjectId::new("another-ns", "service2")),
            ObjectKey::Node(NodeId(2)),
        ];
        for key in keys {
            assert_eq!(ObjectKey::parse(&key.to_string()), Ok(key));
        }
        assert_eq!(
            ObjectKey::Service(ObjectId::new("default", "svc")).to_string(),
            "k8s/service/default/svc"
        );
    }

    #[test]
    fn bad_keys() {
        for key in [
            "",
            "k8s/pod/",
            "k8s/pod/default",
            "k8s/pod//pod1",
            "k8s/pod/default/pod1/extra",
            "allocatedIDs/x",
            "config/something",
        ] {
            assert_eq!(
                ObjectKey::parse(key),
                Err(ModelError::BadKey(key.to_owned())),
                "{key}"
            );
        }
    }
}
