// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Pod records

use crate::errors::ModelResult;
use crate::ids::ObjectId;
use crate::parse_ipv4;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pod {
    pub name: String,
    pub namespace: String,
    pub ip_address: String, /* empty until the pod is addressed */
}

impl Pod {
    #[must_use]
    pub fn new(namespace: &str, name: &str, ip_address: &str) -> Self {
        Self {
            name: name.to_owned(),
            namespace: namespace.to_owned(),
            ip_address: ip_address.to_owned(),
        }
    }

    #[must_use]
    pub fn id(&self) -> ObjectId {
        ObjectId::new(&self.namespace, &self.name)
    }

    /// The address of the pod, `None` if it has not been assigned one yet
    pub fn ip(&self) -> ModelResult<Option<Ipv4Addr>> {
        match self.ip_address.trim() {
            "" => Ok(None),
            addr => parse_ipv4(&self.id(), addr).map(Some),
        }
    }
}
