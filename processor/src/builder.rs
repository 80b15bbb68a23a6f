// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Building the desired NAT configuration from the cached objects

use crate::cache::ObjectCache;
use crate::classifier::classify;
use model::{
    ObjectId, Protocol, Topology, ValidEndpoints, ValidNode, ValidService, ValidServicePort,
};
use nat::{GlobalConfig, Local, Snapshot, StaticMapping};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;
use tracing::{debug, warn};

/// Weight of a backend running on this node
pub const LOCAL_WEIGHT: u8 = 2;
/// Weight of a backend running on another node
pub const REMOTE_WEIGHT: u8 = 1;

/// The load-balancing part of the desired configuration
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DesiredMappings {
    pub static_mappings: BTreeSet<StaticMapping>,
    /// Addresses of all the backends used by some mapping
    pub live_backends: BTreeSet<Ipv4Addr>,
}

/// Collect the backends of a service port, weighted by locality.
///
/// A backend listed by several subsets is kept once, with the weight of its last occurrence.
fn collect_locals(
    port: &ValidServicePort,
    endpoints: &ValidEndpoints,
    own_node: &str,
) -> Vec<Local> {
    let mut locals: BTreeMap<(Ipv4Addr, u16), u8> = BTreeMap::new();
    for subset in &endpoints.subsets {
        for backend_port in subset
            .ports
            .iter()
            .filter(|p| p.name == port.name && p.protocol == port.protocol)
        {
            for address in &subset.addresses {
                let weight = if address.node_name == own_node {
                    LOCAL_WEIGHT
                } else {
                    REMOTE_WEIGHT
                };
                let key = (address.ip, backend_port.port);
                // TODO: settle which weight wins when subsets disagree about a backend's node
                if let Some(previous) = locals.insert(key, weight)
                    && previous != weight
                {
                    warn!(
                        "{}: backend {}:{} listed with weights {previous} and {weight}, using {weight}",
                        endpoints.id, address.ip, backend_port.port
                    );
                }
            }
        }
    }
    locals
        .into_iter()
        .map(|((ip, port), weight)| Local::new(ip, port, weight))
        .collect()
}

/// Static mappings by frontend, with the service owning each
type Frontends = BTreeMap<(Ipv4Addr, u16, Protocol), (ObjectId, StaticMapping)>;

fn service_mappings(
    service: &ValidService,
    endpoints: &ValidEndpoints,
    nodes: &[ValidNode],
    own_node: &str,
    claimed: &mut Frontends,
) {
    for port in &service.ports {
        let locals = collect_locals(port, endpoints, own_node);
        if locals.is_empty() {
            debug!("{}: no backend for port {}", service.id, port.name);
            continue;
        }

        let frontends: BTreeSet<(Ipv4Addr, u16)> = service
            .frontends()
            .map(|ip| (ip, port.port))
            .chain(port.node_port.into_iter().flat_map(|node_port| {
                nodes
                    .iter()
                    .flat_map(ValidNode::addresses)
                    .map(move |ip| (ip, node_port))
            }))
            .collect();
        for (ip, external_port) in frontends {
            let mapping =
                StaticMapping::new(ip, external_port, port.protocol, locals.iter().copied());
            match claimed.entry(mapping.frontend()) {
                Entry::Vacant(entry) => {
                    entry.insert((service.id.clone(), mapping));
                }
                Entry::Occupied(entry) => {
                    let (owner, kept) = entry.get();
                    if kept != &mapping {
                        warn!(
                            "{}: {} {ip}:{external_port} is already used by {owner}, not mapping it",
                            service.id, port.protocol
                        );
                    }
                }
            }
        }
    }
}

/// Build the static mappings for all the cached services. Malformed objects are skipped.
pub fn build_mappings<T: Topology + ?Sized>(topology: &T, cache: &ObjectCache) -> DesiredMappings {
    let own_node = topology.own_node_label();
    let nodes: Vec<ValidNode> = cache
        .nodes()
        .filter_map(|node| {
            node.validate()
                .inspect_err(|e| warn!("Skipping malformed node: {e}"))
                .ok()
        })
        .collect();

    let mut claimed = Frontends::new();
    for service in cache.services() {
        let service = match service.validate() {
            Ok(service) => service,
            Err(e) => {
                warn!("Skipping malformed service: {e}");
                continue;
            }
        };
        let endpoints = match cache.endpoints(&service.id).map(model::Endpoints::validate) {
            Some(Ok(endpoints)) => endpoints,
            Some(Err(e)) => {
                warn!("Skipping malformed endpoints: {e}");
                continue;
            }
            None => {
                debug!("{}: no endpoints", service.id);
                continue;
            }
        };
        service_mappings(&service, &endpoints, &nodes, own_node, &mut claimed);
    }

    let static_mappings: BTreeSet<StaticMapping> =
        claimed.into_values().map(|(_, mapping)| mapping).collect();
    let live_backends = static_mappings
        .iter()
        .flat_map(|mapping| mapping.locals.iter().map(|local| local.ip))
        .collect();
    DesiredMappings {
        static_mappings,
        live_backends,
    }
}

/// Compute the complete NAT configuration the dataplane should have
pub fn desired_snapshot<T: Topology + ?Sized>(topology: &T, cache: &ObjectCache) -> Snapshot {
    let mappings = build_mappings(topology, cache);
    let classification = classify(topology, cache, &mappings.live_backends);
    Snapshot {
        global: GlobalConfig {
            forwarding: true,
            address_pool: classification.address_pool,
            interfaces: classification.interfaces,
        },
        static_mappings: mappings.static_mappings,
        identity_mappings: BTreeSet::new(),
    }
}
