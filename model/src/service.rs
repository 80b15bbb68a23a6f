// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Service records

use crate::errors::{ModelError, ModelResult};
use crate::ids::ObjectId;
use crate::parse_ipv4;
use crate::protocol::Protocol;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// A port exposed by a [`Service`]. The name is the join key with [`crate::EndpointPort`]s.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePort {
    pub name: String,
    pub protocol: String,
    pub port: u16,
    pub node_port: u16, /* 0: not exposed on nodes */
}

impl ServicePort {
    #[must_use]
    pub fn new(name: &str, protocol: &str, port: u16, node_port: u16) -> Self {
        Self {
            name: name.to_owned(),
            protocol: protocol.to_owned(),
            port,
            node_port,
        }
    }
}

/// A service record, as received from the watch layer
#[derive(Builder, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    #[builder(setter(into))]
    pub name: String,
    #[builder(setter(into))]
    pub namespace: String,
    /// Empty or `None` for headless services
    #[builder(setter(into), default)]
    pub cluster_ip: String,
    #[builder(default)]
    pub external_ips: Vec<String>,
    #[builder(default)]
    pub ports: Vec<ServicePort>,
    #[builder(setter(into), default)]
    pub external_traffic_policy: String,
}

/// Whether traffic arriving on nodes may be forwarded to backends on other nodes.
///
/// Load-balancing currently always behaves as [`TrafficPolicy::Cluster`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrafficPolicy {
    #[default]
    Cluster,
    Local,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidServicePort {
    pub name: String,
    pub protocol: Protocol,
    pub port: u16,
    pub node_port: Option<u16>,
}

/// A [`Service`] whose fields were all checked and parsed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidService {
    pub id: ObjectId,
    pub cluster_ip: Option<Ipv4Addr>,
    pub external_ips: Vec<Ipv4Addr>,
    pub ports: Vec<ValidServicePort>,
    pub traffic_policy: TrafficPolicy,
}

impl ValidService {
    /// The addresses the service is reachable at regardless of node ports
    pub fn frontends(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        self.cluster_ip
            .into_iter()
            .chain(self.external_ips.iter().copied())
    }
}

impl Service {
    #[must_use]
    pub fn id(&self) -> ObjectId {
        ObjectId::new(&self.namespace, &self.name)
    }

    /// Check and parse all the fields of this service
    pub fn validate(&self) -> ModelResult<ValidService> {
        let id = self.id();
        let cluster_ip = match self.cluster_ip.trim() {
            "" | "None" => None,
            addr => Some(parse_ipv4(&id, addr)?),
        };
        let external_ips = self
            .external_ips
            .iter()
            .map(|addr| parse_ipv4(&id, addr))
            .collect::<ModelResult<Vec<_>>>()?;

        let mut names = BTreeSet::new();
        let mut ports = Vec::with_capacity(self.ports.len());
        for port in &self.ports {
            if !names.insert(port.name.as_str()) {
                return Err(ModelError::DuplicatePortName(id, port.name.clone()));
            }
            if port.port == 0 {
                return Err(ModelError::ZeroPort(id, port.name.clone()));
            }
            let protocol = Protocol::from_str(&port.protocol)
                .map_err(|_| ModelError::BadProtocol(id.clone(), port.protocol.clone()))?;
            ports.push(ValidServicePort {
                name: port.name.clone(),
                protocol,
                port: port.port,
                node_port: (port.node_port != 0).then_some(port.node_port),
            });
        }

        let traffic_policy = match self.external_traffic_policy.as_str() {
            "" | "Cluster" => TrafficPolicy::Cluster,
            "Local" => TrafficPolicy::Local,
            other => return Err(ModelError::BadTrafficPolicy(id, other.to_owned())),
        };

        Ok(ValidService {
            id,
            cluster_ip,
            external_ips,
            ports,
            traffic_policy,
        })
    }
}
