// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Cluster fixtures shared by the integration tests

#![allow(dead_code)]

use svclb_processor as processor;

use model::{
    EndpointAddress, EndpointPort, EndpointSubset, Endpoints, EndpointsBuilder, Node, ObjectId,
    Pod, PodInterface, Service, ServiceBuilder, ServicePort, StaticTopology,
    StaticTopologyBuilder,
};
use nat::testing::MemoryDataplane;
use nat::{Local, StaticMapping};
use processor::ServiceProcessor;
use std::net::Ipv4Addr;

pub const MASTER: &str = "master";
pub const WORKER: &str = "worker";

pub const MAIN_IF: &str = "GbE";
pub const VXLAN_IF: &str = "VXLAN-BVI";
pub const HOST_IF: &str = "VPP-Host";
pub const NODE_IP: &str = "192.168.16.10";
pub const MGMT_IP: &str = "172.30.1.1";
pub const WORKER_IP: &str = "192.168.16.20";
pub const WORKER_MGMT_IP: &str = "172.30.1.2";

pub const POD1_IP: &str = "10.1.1.3";
pub const POD2_IP: &str = "10.1.1.4";
pub const POD3_IP: &str = "10.2.1.1";
pub const POD1_IF: &str = "master-tap1";
pub const POD2_IF: &str = "master-tap2";

pub type Processor = ServiceProcessor<StaticTopology, MemoryDataplane, MemoryDataplane>;

pub fn ip(addr: &str) -> Ipv4Addr {
    addr.parse().unwrap()
}

pub fn pod1_id() -> ObjectId {
    ObjectId::new("default", "pod1")
}

pub fn pod2_id() -> ObjectId {
    ObjectId::new("default", "pod2")
}

pub fn pod3_id() -> ObjectId {
    ObjectId::new("another-ns", "pod3")
}

pub fn pod1() -> Pod {
    Pod::new("default", "pod1", POD1_IP)
}

pub fn pod2() -> Pod {
    Pod::new("default", "pod2", POD2_IP)
}

pub fn pod3() -> Pod {
    Pod::new("another-ns", "pod3", POD3_IP)
}

/// The master node: SNAT through the main interface, two pods wired to the dataplane
pub fn master_topology() -> StaticTopologyBuilder {
    let mut builder = StaticTopologyBuilder::default();
    builder
        .node_label(MASTER)
        .node_ip(format!("{NODE_IP}/24").parse().unwrap())
        .default_gateway(ip("192.168.16.1"))
        .main_interface(MAIN_IF)
        .overlay_interface(VXLAN_IF)
        .host_interconnect_interface(HOST_IF)
        .pod_subnet("10.1.0.0/16".parse().unwrap())
        .pod_interfaces(vec![
            PodInterface::new(&pod1_id(), POD1_IF),
            PodInterface::new(&pod2_id(), POD2_IF),
        ])
        .snat_enabled(true);
    builder
}

/// A started processor programming a fresh in-memory dataplane
pub fn start(topology: StaticTopology, dataplane: &MemoryDataplane) -> Processor {
    let mut processor = ServiceProcessor::new(topology, dataplane.clone(), dataplane.clone());
    processor.init().unwrap();
    processor
}

pub fn master_node() -> Node {
    Node::new(1, MASTER, &format!("{NODE_IP}/24"), MGMT_IP)
}

pub fn worker_node() -> Node {
    Node::new(2, WORKER, &format!("{WORKER_IP}/24"), WORKER_MGMT_IP)
}

pub fn service(
    namespace: &str,
    name: &str,
    cluster_ip: &str,
    external_ips: &[&str],
    ports: Vec<ServicePort>,
) -> Service {
    ServiceBuilder::default()
        .name(name)
        .namespace(namespace)
        .cluster_ip(cluster_ip)
        .external_ips(external_ips.iter().map(ToString::to_string).collect::<Vec<_>>())
        .ports(ports)
        .external_traffic_policy("Cluster")
        .build()
        .unwrap()
}

pub fn endpoints(namespace: &str, name: &str, subsets: Vec<EndpointSubset>) -> Endpoints {
    EndpointsBuilder::default()
        .name(name)
        .namespace(namespace)
        .subsets(subsets)
        .build()
        .unwrap()
}

/// One subset: `(ip, node, pod)` backends, `(name, port, protocol)` ports
pub fn subset(
    addresses: &[(&str, &str, &ObjectId)],
    ports: &[(&str, u16, &str)],
) -> EndpointSubset {
    EndpointSubset {
        addresses: addresses
            .iter()
            .map(|(ip, node, pod)| EndpointAddress::new(ip, node, Some(pod)))
            .collect(),
        ports: ports
            .iter()
            .map(|(name, port, protocol)| EndpointPort::new(name, *port, protocol))
            .collect(),
    }
}

pub fn tcp_mapping(external_ip: &str, external_port: u16, locals: &[(&str, u16, u8)]) -> StaticMapping {
    mapping(external_ip, external_port, model::Protocol::Tcp, locals)
}

pub fn mapping(
    external_ip: &str,
    external_port: u16,
    protocol: model::Protocol,
    locals: &[(&str, u16, u8)],
) -> StaticMapping {
    StaticMapping::new(
        ip(external_ip),
        external_port,
        protocol,
        locals
            .iter()
            .map(|(addr, port, weight)| Local::new(ip(addr), *port, *weight)),
    )
}
