// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! NAT roles of the dataplane interfaces

use crate::cache::ObjectCache;
use model::{ObjectId, Topology};
use nat::NatFeatures;
use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;
use tracing::{debug, warn};

/// Interface features and source-NAT address pool for a node
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Classification {
    pub address_pool: BTreeSet<Ipv4Addr>,
    pub interfaces: BTreeMap<String, NatFeatures>,
}

impl Classification {
    fn set(&mut self, name: &str, features: NatFeatures) {
        if name.is_empty() {
            return;
        }
        if let Some(old) = self.interfaces.insert(name.to_owned(), features)
            && old != features
        {
            warn!("Interface {name} has several roles, keeping {features} over {old}");
        }
    }
}

/// The physical interface egress traffic leaves through, when source-NAT applies
#[derive(Clone, Debug, PartialEq, Eq)]
struct Uplink {
    name: String,
    address: Option<Ipv4Addr>,
}

/// Find the physical interface whose subnet holds the default gateway, main interface first
fn find_uplink<T: Topology + ?Sized>(topology: &T, gateway: Ipv4Addr) -> Uplink {
    let main = topology.main_physical_interface();
    let main_address = topology.node_ip_with_prefix();
    if main_address.is_some_and(|net| net.contains(&gateway)) {
        return Uplink {
            name: main.to_owned(),
            address: main_address.map(|net| net.addr()),
        };
    }
    for name in topology.other_physical_interfaces() {
        if let Some(net) = topology.interface_address(&name)
            && net.contains(&gateway)
        {
            return Uplink {
                name,
                address: Some(net.addr()),
            };
        }
    }
    debug!("No interface in the subnet of gateway {gateway}, using {main} as uplink");
    Uplink {
        name: main.to_owned(),
        address: main_address.map(|net| net.addr()),
    }
}

/// Assign NAT features to the interfaces of the node.
///
/// Pod interfaces are only considered for pods which are in `cache`, not being torn down, and
/// wired to the dataplane. They are inside interfaces once the pod is one of `live_backends`.
pub fn classify<T: Topology + ?Sized>(
    topology: &T,
    cache: &ObjectCache,
    live_backends: &BTreeSet<Ipv4Addr>,
) -> Classification {
    let mut out = Classification::default();
    let main = topology.main_physical_interface();
    let others = topology.other_physical_interfaces();

    // without an overlay, traffic leaving the node is never source-NATed
    let snat = topology.snat_enabled() && topology.overlay_interface().is_some();
    if !snat {
        out.set(main, NatFeatures::IN_OUT);
        for name in &others {
            out.set(name, NatFeatures::IN_OUT);
        }
    } else if let Some(gateway) = topology.default_gateway_ip() {
        let uplink = find_uplink(topology, gateway);
        out.set(main, NatFeatures::OUT);
        for name in &others {
            out.set(name, NatFeatures::OUT);
        }
        out.set(&uplink.name, NatFeatures::OUTPUT_OUT);
        match uplink.address {
            Some(address) => {
                out.address_pool.insert(address);
            }
            None => warn!("Uplink {} has no address: source-NAT pool is empty", uplink.name),
        }
    } else {
        out.set(main, NatFeatures::OUT);
        for name in &others {
            out.set(name, NatFeatures::OUT);
        }
    }

    if let Some(name) = topology.overlay_interface() {
        out.set(name, NatFeatures::IN_OUT);
    }
    if let Some(name) = topology.host_interconnect_interface() {
        out.set(name, NatFeatures::IN_OUT);
    }

    let pod_subnet = topology.pod_subnet();
    let backends: BTreeSet<&ObjectId> = live_backends
        .iter()
        .filter(|ip| pod_subnet.is_some_and(|net| net.contains(*ip)))
        .flat_map(|ip| cache.pods_with_ip(*ip))
        .map(|record| &record.id)
        .collect();
    for record in cache.pods().filter(|record| !record.deleting) {
        let Some(name) = topology.pod_interface_name(&record.id) else {
            continue;
        };
        let features = if backends.contains(&record.id) {
            NatFeatures::IN_OUT
        } else {
            NatFeatures::OUT
        };
        out.set(&name, features);
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use model::{
        ObjectId, PhysicalInterface, Pod, PodInterface, StaticTopology, StaticTopologyBuilder,
    };
    use pretty_assertions::assert_eq;

    fn topology() -> StaticTopologyBuilder {
        let mut builder = StaticTopologyBuilder::default();
        builder
            .node_label("master")
            .node_ip("192.168.16.10/24".parse().unwrap())
            .default_gateway(Ipv4Addr::new(192, 168, 16, 1))
            .main_interface("GbE")
            .overlay_interface("VXLAN-BVI")
            .host_interconnect_interface("VPP-Host")
            .pod_subnet("10.1.0.0/16".parse().unwrap())
            .pod_interfaces(vec![
                PodInterface::new(&ObjectId::new("default", "pod1"), "master-tap1"),
                PodInterface::new(&ObjectId::new("default", "pod2"), "master-tap2"),
            ])
            .snat_enabled(true);
        builder
    }

    fn features(pairs: &[(&str, NatFeatures)]) -> BTreeMap<String, NatFeatures> {
        pairs
            .iter()
            .map(|(name, features)| ((*name).to_owned(), *features))
            .collect()
    }

    fn classify_empty(topology: &StaticTopology) -> Classification {
        classify(topology, &ObjectCache::new(), &BTreeSet::new())
    }

    #[test]
    fn snat_on_main_interface() {
        let out = classify_empty(&topology().build().unwrap());
        assert_eq!(out.address_pool, BTreeSet::from([Ipv4Addr::new(192, 168, 16, 10)]));
        assert_eq!(
            out.interfaces,
            features(&[
                ("GbE", NatFeatures::OUTPUT_OUT),
                ("VXLAN-BVI", NatFeatures::IN_OUT),
                ("VPP-Host", NatFeatures::IN_OUT),
            ])
        );
    }

    #[test]
    fn snat_disabled() {
        let topology = topology().snat_enabled(false).build().unwrap();
        let out = classify_empty(&topology);
        assert!(out.address_pool.is_empty());
        assert_eq!(
            out.interfaces,
            features(&[
                ("GbE", NatFeatures::IN_OUT),
                ("VXLAN-BVI", NatFeatures::IN_OUT),
                ("VPP-Host", NatFeatures::IN_OUT),
            ])
        );
    }

    #[test]
    fn snat_without_overlay() {
        let mut topology = topology().build().unwrap();
        topology.overlay_interface = None;
        let out = classify_empty(&topology);
        assert!(out.address_pool.is_empty());
        assert_eq!(
            out.interfaces,
            features(&[("GbE", NatFeatures::IN_OUT), ("VPP-Host", NatFeatures::IN_OUT)])
        );
    }

    #[test]
    fn no_gateway() {
        let mut topology = topology()
            .other_interfaces(vec![PhysicalInterface::new("GbE2", None)])
            .build()
            .unwrap();
        topology.default_gateway = None;
        let out = classify_empty(&topology);
        assert!(out.address_pool.is_empty());
        assert_eq!(
            out.interfaces,
            features(&[
                ("GbE", NatFeatures::OUT),
                ("GbE2", NatFeatures::OUT),
                ("VXLAN-BVI", NatFeatures::IN_OUT),
                ("VPP-Host", NatFeatures::IN_OUT),
            ])
        );
    }

    #[test]
    fn gateway_behind_other_interface() {
        let topology = topology()
            .default_gateway(Ipv4Addr::new(192, 168, 17, 1))
            .other_interfaces(vec![
                PhysicalInterface::new("GbE2", Some("192.168.17.10/24".parse().unwrap())),
                PhysicalInterface::new("GbE3", Some("192.168.18.10/24".parse().unwrap())),
            ])
            .build()
            .unwrap();
        let out = classify_empty(&topology);
        assert_eq!(out.address_pool, BTreeSet::from([Ipv4Addr::new(192, 168, 17, 10)]));
        assert_eq!(
            out.interfaces,
            features(&[
                ("GbE", NatFeatures::OUT),
                ("GbE2", NatFeatures::OUTPUT_OUT),
                ("GbE3", NatFeatures::OUT),
                ("VXLAN-BVI", NatFeatures::IN_OUT),
                ("VPP-Host", NatFeatures::IN_OUT),
            ])
        );
    }

    #[test]
    fn unmatched_gateway_falls_back_to_main() {
        let topology = topology()
            .default_gateway(Ipv4Addr::new(172, 16, 0, 1))
            .build()
            .unwrap();
        let out = classify_empty(&topology);
        assert_eq!(out.interfaces["GbE"], NatFeatures::OUTPUT_OUT);
        assert_eq!(out.address_pool, BTreeSet::from([Ipv4Addr::new(192, 168, 16, 10)]));
    }

    #[test]
    fn pod_interfaces() {
        let topology = topology().build().unwrap();
        let mut cache = ObjectCache::new();
        cache.put(Pod::new("default", "pod1", "10.1.1.3").into());
        cache.put(Pod::new("default", "pod2", "10.1.1.4").into());
        // no interface for this one
        cache.put(Pod::new("default", "pod3", "10.1.1.5").into());

        let mut live = BTreeSet::from([Ipv4Addr::new(10, 1, 1, 3), Ipv4Addr::new(10, 1, 1, 5)]);
        let out = classify(&topology, &cache, &live);
        assert_eq!(out.interfaces["master-tap1"], NatFeatures::IN_OUT);
        assert_eq!(out.interfaces["master-tap2"], NatFeatures::OUT);
        assert_eq!(out.interfaces.len(), 5);

        cache.mark_pod_deleting(&ObjectId::new("default", "pod1"));
        live.insert(Ipv4Addr::new(10, 1, 1, 4));
        let out = classify(&topology, &cache, &live);
        assert!(!out.interfaces.contains_key("master-tap1"));
        assert_eq!(out.interfaces["master-tap2"], NatFeatures::IN_OUT);
    }

    #[test]
    fn backend_address_reused() {
        let topology = topology().build().unwrap();
        let mut cache = ObjectCache::new();
        cache.put(Pod::new("default", "pod1", "10.1.1.3").into());
        cache.mark_pod_deleting(&ObjectId::new("default", "pod1"));
        cache.put(Pod::new("default", "pod2", "10.1.1.3").into());
        let live = BTreeSet::from([Ipv4Addr::new(10, 1, 1, 3)]);
        let out = classify(&topology, &cache, &live);
        assert!(!out.interfaces.contains_key("master-tap1"));
        assert_eq!(out.interfaces["master-tap2"], NatFeatures::IN_OUT);

        // the backend address is looked up by the current address of the pod
        cache.put(Pod::new("default", "pod2", "10.1.1.4").into());
        let out = classify(&topology, &cache, &live);
        assert_eq!(out.interfaces["master-tap2"], NatFeatures::OUT);
    }

    #[test]
    fn backend_outside_pod_subnet() {
        let topology = topology().build().unwrap();
        let mut cache = ObjectCache::new();
        cache.put(Pod::new("default", "pod1", "10.2.1.1").into());
        let out = classify(&topology, &cache, &BTreeSet::from([Ipv4Addr::new(10, 2, 1, 1)]));
        assert_eq!(out.interfaces["master-tap1"], NatFeatures::OUT);
    }
}
