// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Generators for NAT configurations.
//!
//! Addresses, ports and interface names are drawn from small sets so that independently
//! generated configurations overlap.

use crate::features::NatFeatures;
use crate::mapping::{IdentityMapping, Local, StaticMapping};
use crate::snapshot::{GlobalConfig, Snapshot};
use bolero::{Driver, TypeGenerator};
use model::Protocol;
use std::net::Ipv4Addr;

const INTERFACES: [&str; 4] = ["eth0", "eth1", "vxlanBVI", "tap0"];
const PORTS: [u16; 3] = [53, 80, 8080];

fn small_addr<D: Driver>(driver: &mut D, subnet: [u8; 3]) -> Option<Ipv4Addr> {
    let host = driver.produce::<u8>()? % 8;
    Some(Ipv4Addr::new(subnet[0], subnet[1], subnet[2], host + 1))
}

fn small_port<D: Driver>(driver: &mut D) -> Option<u16> {
    Some(PORTS[usize::from(driver.produce::<u8>()?) % PORTS.len()])
}

fn small_count<D: Driver>(driver: &mut D, max: u8) -> Option<u8> {
    Some(driver.produce::<u8>()? % (max + 1))
}

impl TypeGenerator for NatFeatures {
    /// Generate a valid combination of features
    fn generate<D: Driver>(driver: &mut D) -> Option<Self> {
        let valid = [
            NatFeatures::IN,
            NatFeatures::OUT,
            NatFeatures::IN_OUT,
            NatFeatures::OUTPUT_OUT,
        ];
        Some(valid[usize::from(driver.produce::<u8>()?) % valid.len()])
    }
}

impl TypeGenerator for Local {
    fn generate<D: Driver>(driver: &mut D) -> Option<Self> {
        Some(Local::new(
            small_addr(driver, [10, 1, 1])?,
            small_port(driver)?,
            1 + driver.produce::<u8>()? % 2,
        ))
    }
}

impl TypeGenerator for StaticMapping {
    fn generate<D: Driver>(driver: &mut D) -> Option<Self> {
        let external_ip = small_addr(driver, [10, 96, 0])?;
        let external_port = small_port(driver)?;
        let protocol = driver.produce::<Protocol>()?;
        let mut locals: Vec<Local> = Vec::new();
        for _ in 0..=small_count(driver, 3)? {
            let local = driver.produce::<Local>()?;
            if !locals.iter().any(|l| l.ip == local.ip && l.port == local.port) {
                locals.push(local);
            }
        }
        Some(StaticMapping::new(
            external_ip,
            external_port,
            protocol,
            locals,
        ))
    }
}

impl TypeGenerator for IdentityMapping {
    fn generate<D: Driver>(driver: &mut D) -> Option<Self> {
        Some(IdentityMapping {
            ip: small_addr(driver, [10, 96, 0])?,
            port: small_port(driver)?,
            protocol: driver.produce()?,
        })
    }
}

impl TypeGenerator for GlobalConfig {
    fn generate<D: Driver>(driver: &mut D) -> Option<Self> {
        let mut global = GlobalConfig {
            forwarding: driver.produce()?,
            ..Default::default()
        };
        for _ in 0..small_count(driver, 2)? {
            global
                .address_pool
                .insert(small_addr(driver, [192, 168, 16])?);
        }
        for name in INTERFACES {
            if driver.produce::<bool>()? {
                global
                    .interfaces
                    .insert(name.to_owned(), driver.produce()?);
            }
        }
        Some(global)
    }
}

impl TypeGenerator for Snapshot {
    fn generate<D: Driver>(driver: &mut D) -> Option<Self> {
        let mut snapshot = Snapshot {
            global: driver.produce()?,
            ..Default::default()
        };
        for _ in 0..small_count(driver, 4)? {
            let mapping: StaticMapping = driver.produce()?;
            // one mapping per external address, port and protocol
            if !snapshot.static_mappings.iter().any(|m| m.frontend() == mapping.frontend()) {
                snapshot.static_mappings.insert(mapping);
            }
        }
        for _ in 0..small_count(driver, 2)? {
            snapshot.identity_mappings.insert(driver.produce()?);
        }
        Some(snapshot)
    }
}
