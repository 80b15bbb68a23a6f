// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Facts about the local node that the load-balancer needs: its identity, addressing, the
//! dataplane interfaces and their roles, and whether egress traffic is source-NATed.

use crate::errors::ConfigError;
use crate::ids::ObjectId;
use derive_builder::Builder;
use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use tracing::debug;

/// Read-only view of the local node's network topology.
pub trait Topology {
    /// Label (name) of the local node, compared with endpoint addresses' node names
    fn own_node_label(&self) -> &str;
    /// The primary address of the node, carried by the main physical interface
    fn node_ip_with_prefix(&self) -> Option<Ipv4Net>;
    fn default_gateway_ip(&self) -> Option<Ipv4Addr>;
    fn main_physical_interface(&self) -> &str;
    /// Physical interfaces besides the main one, in configuration order
    fn other_physical_interfaces(&self) -> Vec<String>;
    /// Address of a physical interface, if known
    fn interface_address(&self, name: &str) -> Option<Ipv4Net>;
    fn overlay_interface(&self) -> Option<&str>;
    fn host_interconnect_interface(&self) -> Option<&str>;
    fn pod_subnet(&self) -> Option<Ipv4Net>;
    /// Name of the dataplane interface wired to a pod, `None` if the pod is not wired (yet)
    fn pod_interface_name(&self, pod: &ObjectId) -> Option<String>;
    /// Whether traffic leaving the node should be source-NATed
    fn snat_enabled(&self) -> bool;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalInterface {
    pub name: String,
    #[serde(default)]
    pub address: Option<Ipv4Net>,
}

impl PhysicalInterface {
    #[must_use]
    pub fn new(name: &str, address: Option<Ipv4Net>) -> Self {
        Self {
            name: name.to_owned(),
            address,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodInterface {
    pub namespace: String,
    pub name: String,
    pub interface: String,
}

impl PodInterface {
    #[must_use]
    pub fn new(pod: &ObjectId, interface: &str) -> Self {
        Self {
            namespace: pod.namespace.clone(),
            name: pod.name.clone(),
            interface: interface.to_owned(),
        }
    }
}

/// A [`Topology`] given by configuration
#[derive(Builder, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticTopology {
    #[builder(setter(into))]
    pub node_label: String,
    #[builder(setter(strip_option), default)]
    pub node_ip: Option<Ipv4Net>,
    #[builder(setter(strip_option), default)]
    pub default_gateway: Option<Ipv4Addr>,
    #[builder(setter(into))]
    pub main_interface: String,
    #[builder(default)]
    pub other_interfaces: Vec<PhysicalInterface>,
    #[builder(setter(into, strip_option), default)]
    pub overlay_interface: Option<String>,
    #[builder(setter(into, strip_option), default)]
    pub host_interconnect_interface: Option<String>,
    #[builder(setter(strip_option), default)]
    pub pod_subnet: Option<Ipv4Net>,
    #[builder(default)]
    pub pod_interfaces: Vec<PodInterface>,
    #[builder(default)]
    pub snat_enabled: bool,
}

impl StaticTopology {
    /// Load a topology from its YAML representation and validate it
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let topology: StaticTopology =
            serde_yaml_ng::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        topology.validate()?;
        debug!("Loaded topology for node '{}'", topology.node_label);
        Ok(topology)
    }

    /// Check that the topology is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node_label.is_empty() {
            return Err(ConfigError::MissingParameter("node_label"));
        }
        if self.main_interface.is_empty() {
            return Err(ConfigError::MissingParameter("main_interface"));
        }
        if self.pod_subnet.is_none() {
            return Err(ConfigError::MissingParameter("pod_subnet"));
        }
        let mut names = BTreeSet::new();
        let all_interfaces = std::iter::once(self.main_interface.as_str())
            .chain(self.other_interfaces.iter().map(|i| i.name.as_str()))
            .chain(self.overlay_interface.as_deref())
            .chain(self.host_interconnect_interface.as_deref())
            .chain(self.pod_interfaces.iter().map(|p| p.interface.as_str()));
        for name in all_interfaces {
            if !names.insert(name) {
                return Err(ConfigError::DuplicateInterface(name.to_owned()));
            }
        }
        let mut pods = BTreeSet::new();
        for pod in &self.pod_interfaces {
            let id = ObjectId::new(&pod.namespace, &pod.name);
            if pods.contains(&id) {
                return Err(ConfigError::DuplicatePodInterface(id));
            }
            pods.insert(id);
        }
        Ok(())
    }
}

impl Topology for StaticTopology {
    fn own_node_label(&self) -> &str {
        &self.node_label
    }
    fn node_ip_with_prefix(&self) -> Option<Ipv4Net> {
        self.node_ip
    }
    fn default_gateway_ip(&self) -> Option<Ipv4Addr> {
        self.default_gateway
    }
    fn main_physical_interface(&self) -> &str {
        &self.main_interface
    }
    fn other_physical_interfaces(&self) -> Vec<String> {
        self.other_interfaces.iter().map(|i| i.name.clone()).collect()
    }
    fn interface_address(&self, name: &str) -> Option<Ipv4Net> {
        if name == self.main_interface {
            return self.node_ip;
        }
        self.other_interfaces
            .iter()
            .find(|i| i.name == name)
            .and_then(|i| i.address)
    }
    fn overlay_interface(&self) -> Option<&str> {
        self.overlay_interface.as_deref()
    }
    fn host_interconnect_interface(&self) -> Option<&str> {
        self.host_interconnect_interface.as_deref()
    }
    fn pod_subnet(&self) -> Option<Ipv4Net> {
        self.pod_subnet
    }
    fn pod_interface_name(&self, pod: &ObjectId) -> Option<String> {
        self.pod_interfaces
            .iter()
            .find(|p| p.namespace == pod.namespace && p.name == pod.name)
            .map(|p| p.interface.clone())
    }
    fn snat_enabled(&self) -> bool {
        self.snat_enabled
    }
}
