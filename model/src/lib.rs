// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Models of the cluster objects feeding the service load-balancer: services, endpoints,
//! pods and nodes, as received from the watch layer, plus the node topology facts the
//! load-balancer depends on.
//!
//! Object records keep addresses and protocols in the textual form they are received in.
//! Each record can be validated into a typed view; a record that fails validation is
//! malformed and contributes nothing to the NAT configuration.

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic
)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod endpoints;
pub mod errors;
pub mod ids;
pub mod node;
pub mod pod;
pub mod protocol;
pub mod service;
pub mod topology;

pub use endpoints::{
    EndpointAddress, EndpointPort, EndpointSubset, Endpoints, EndpointsBuilder, ObjectReference,
    ValidAddress, ValidEndpoints, ValidPort, ValidSubset,
};
pub use errors::{ConfigError, ModelError, ModelResult};
pub use ids::{NodeId, ObjectId, ObjectKey, ObjectKind};
pub use node::{Node, ValidNode};
pub use pod::Pod;
pub use protocol::Protocol;
pub use service::{
    Service, ServiceBuilder, ServicePort, TrafficPolicy, ValidService, ValidServicePort,
};
pub use topology::{PhysicalInterface, PodInterface, StaticTopology, StaticTopologyBuilder, Topology};

use tracectl::trace_target;
trace_target!("model", LevelFilter::INFO);

use std::net::Ipv4Addr;

/// Parse a textual IPv4 address of object `id`, tolerating surrounding whitespace
pub(crate) fn parse_ipv4(id: &ObjectId, addr: &str) -> ModelResult<Ipv4Addr> {
    addr.trim()
        .parse()
        .map_err(|_| ModelError::BadAddress(id.clone(), addr.to_owned()))
}
