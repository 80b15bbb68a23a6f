// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Destination-NAT mappings

use model::Protocol;
use std::fmt::Display;
use std::net::Ipv4Addr;

/// A backend of a [`StaticMapping`]. The weight is a load-balancing hint for the dataplane's
/// weighted selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Local {
    pub ip: Ipv4Addr,
    pub port: u16,
    pub weight: u8,
}

impl Local {
    #[must_use]
    pub fn new(ip: Ipv4Addr, port: u16, weight: u8) -> Self {
        Self { ip, port, weight }
    }
}

impl Display for Local {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}(w={})", self.ip, self.port, self.weight)
    }
}

/// A load-balanced mapping from `external_ip:external_port` to a list of locals.
///
/// Locals are kept ordered by IP, then port, so that two mappings with the same content compare
/// equal.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StaticMapping {
    pub external_ip: Ipv4Addr,
    pub external_port: u16,
    pub protocol: Protocol,
    pub locals: Vec<Local>,
}

impl StaticMapping {
    #[must_use]
    pub fn new(
        external_ip: Ipv4Addr,
        external_port: u16,
        protocol: Protocol,
        locals: impl IntoIterator<Item = Local>,
    ) -> Self {
        let mut locals: Vec<Local> = locals.into_iter().collect();
        locals.sort_unstable();
        Self {
            external_ip,
            external_port,
            protocol,
            locals,
        }
    }

    /// The address, port and protocol the mapping answers on. A dataplane holds at most one
    /// static mapping per frontend.
    #[must_use]
    pub fn frontend(&self) -> (Ipv4Addr, u16, Protocol) {
        (self.external_ip, self.external_port, self.protocol)
    }
}

impl Display for StaticMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}:{} ->",
            self.protocol, self.external_ip, self.external_port
        )?;
        for local in &self.locals {
            write!(f, " {local}")?;
        }
        Ok(())
    }
}

/// A 1:1 mapping letting traffic to `ip:port` through without translation
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdentityMapping {
    pub ip: Ipv4Addr,
    pub port: u16,
    pub protocol: Protocol,
}

impl Display for IdentityMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}:{} (identity)", self.protocol, self.ip, self.port)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NatMapping {
    Static(StaticMapping),
    Identity(IdentityMapping),
}

impl Display for NatMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NatMapping::Static(mapping) => mapping.fmt(f),
            NatMapping::Identity(mapping) => mapping.fmt(f),
        }
    }
}
