// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Node records. Each cluster node is allocated a unique [`NodeId`].

use crate::errors::{ModelError, ModelResult};
use crate::ids::NodeId;
use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: u32,
    pub name: String,
    pub ip_address: String,            /* address with prefix length, e.g. "192.168.16.10/24" */
    pub management_ip_address: String, /* empty if not set */
}

impl Node {
    #[must_use]
    pub fn new(id: u32, name: &str, ip_address: &str, management_ip_address: &str) -> Self {
        Self {
            id,
            name: name.to_owned(),
            ip_address: ip_address.to_owned(),
            management_ip_address: management_ip_address.to_owned(),
        }
    }

    #[must_use]
    pub fn node_id(&self) -> NodeId {
        NodeId(self.id)
    }

    /// Check and parse the addresses of this node. A bare address is taken as a /32.
    pub fn validate(&self) -> ModelResult<ValidNode> {
        let id = self.node_id();
        let bad = |addr: &str| ModelError::BadNodeAddress(id, addr.to_owned());
        let ip = match self.ip_address.trim() {
            "" => return Err(ModelError::MissingNodeAddress(id)),
            addr if addr.contains('/') => addr.parse::<Ipv4Net>().map_err(|_| bad(addr))?,
            addr => Ipv4Net::from(addr.parse::<Ipv4Addr>().map_err(|_| bad(addr))?),
        };
        let management_ip = match self.management_ip_address.trim() {
            "" => None,
            addr => Some(addr.parse::<Ipv4Addr>().map_err(|_| bad(addr))?),
        };
        Ok(ValidNode {
            id,
            name: self.name.clone(),
            ip,
            management_ip,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidNode {
    pub id: NodeId,
    pub name: String,
    pub ip: Ipv4Net,
    pub management_ip: Option<Ipv4Addr>,
}

impl ValidNode {
    /// The addresses on which node ports are exposed for this node
    pub fn addresses(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        std::iter::once(self.ip.addr()).chain(self.management_ip)
    }
}
