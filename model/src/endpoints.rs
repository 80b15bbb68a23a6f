// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Endpoints records: the live backends of a service

use crate::errors::{ModelError, ModelResult};
use crate::ids::ObjectId;
use crate::parse_ipv4;
use crate::protocol::Protocol;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Reference to the object backing an endpoint address, usually a pod
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectReference {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl ObjectReference {
    #[must_use]
    pub fn pod(id: &ObjectId) -> Self {
        Self {
            kind: "Pod".to_owned(),
            namespace: id.namespace.clone(),
            name: id.name.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointAddress {
    pub ip: String,
    pub node_name: String, /* node hosting the backend */
    pub target_ref: Option<ObjectReference>,
}

impl EndpointAddress {
    #[must_use]
    pub fn new(ip: &str, node_name: &str, pod: Option<&ObjectId>) -> Self {
        Self {
            ip: ip.to_owned(),
            node_name: node_name.to_owned(),
            target_ref: pod.map(ObjectReference::pod),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointPort {
    pub name: String,
    pub port: u16,
    pub protocol: String,
}

impl EndpointPort {
    #[must_use]
    pub fn new(name: &str, port: u16, protocol: &str) -> Self {
        Self {
            name: name.to_owned(),
            port,
            protocol: protocol.to_owned(),
        }
    }
}

/// A group of addresses which are all valid backends for every port of the group
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSubset {
    pub addresses: Vec<EndpointAddress>,
    pub ports: Vec<EndpointPort>,
}

/// Endpoints record, as received from the watch layer. Shares its identity with the service.
#[derive(Builder, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    #[builder(setter(into))]
    pub name: String,
    #[builder(setter(into))]
    pub namespace: String,
    #[builder(default)]
    pub subsets: Vec<EndpointSubset>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidAddress {
    pub ip: Ipv4Addr,
    pub node_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidPort {
    pub name: String,
    pub port: u16,
    pub protocol: Protocol,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidSubset {
    pub addresses: Vec<ValidAddress>,
    pub ports: Vec<ValidPort>,
}

/// An [`Endpoints`] record whose fields were all checked and parsed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidEndpoints {
    pub id: ObjectId,
    pub subsets: Vec<ValidSubset>,
}

impl Endpoints {
    #[must_use]
    pub fn id(&self) -> ObjectId {
        ObjectId::new(&self.namespace, &self.name)
    }

    /// Check and parse all the fields of this record
    pub fn validate(&self) -> ModelResult<ValidEndpoints> {
        let id = self.id();
        let mut subsets = Vec::with_capacity(self.subsets.len());
        for subset in &self.subsets {
            let addresses = subset
                .addresses
                .iter()
                .map(|address| {
                    Ok(ValidAddress {
                        ip: parse_ipv4(&id, &address.ip)?,
                        node_name: address.node_name.clone(),
                    })
                })
                .collect::<ModelResult<Vec<_>>>()?;
            let ports = subset
                .ports
                .iter()
                .map(|port| {
                    if port.port == 0 {
                        return Err(ModelError::ZeroPort(id.clone(), port.name.clone()));
                    }
                    let protocol = Protocol::from_str(&port.protocol)
                        .map_err(|_| ModelError::BadProtocol(id.clone(), port.protocol.clone()))?;
                    Ok(ValidPort {
                        name: port.name.clone(),
                        port: port.port,
                        protocol,
                    })
                })
                .collect::<ModelResult<Vec<_>>>()?;
            subsets.push(ValidSubset { addresses, ports });
        }
        Ok(ValidEndpoints { id, subsets })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn endpoint_port_without_protocol_is_malformed() {
        let pod1 = ObjectId::new("default", "pod1");
        let eps = EndpointsBuilder::default()
            .name("service1")
            .namespace("default")
            .subsets(vec![EndpointSubset {
                addresses: vec![EndpointAddress::new("10.1.1.3", "master", Some(&pod1))],
                ports: vec![EndpointPort::new("http", 8080, "")],
            }])
            .build()
            .unwrap();
        assert_eq!(
            eps.validate(),
            Err(ModelError::BadProtocol(eps.id(), String::new()))
        );
    }

    #[test]
    fn validate_endpoints() {
        let eps = EndpointsBuilder::default()
            .name("service2")
            .namespace("another-ns")
            .subsets(vec![
                EndpointSubset {
                    addresses: vec![EndpointAddress::new("10.1.1.3", "master", None)],
                    ports: vec![EndpointPort::new("dns-udp", 10053, "UDP")],
                },
                EndpointSubset::default(),
            ])
            .build()
            .unwrap();
        let valid = eps.validate().unwrap();
        assert_eq!(valid.subsets.len(), 2);
        assert_eq!(valid.subsets[0].addresses[0].ip, Ipv4Addr::new(10, 1, 1, 3));
        assert_eq!(valid.subsets[0].ports[0].protocol, Protocol::Udp);
        assert!(valid.subsets[1].addresses.is_empty());
    }

    #[test]
    fn bad_backend_address() {
        let mut eps = Endpoints {
            name: "s".to_owned(),
            namespace: "ns".to_owned(),
            subsets: vec![EndpointSubset::default()],
        };
        eps.subsets[0]
            .addresses
            .push(EndpointAddress::new("10.1.1.300", "master", None));
        assert!(matches!(eps.validate(), Err(ModelError::BadAddress(_, _))));
    }
}
