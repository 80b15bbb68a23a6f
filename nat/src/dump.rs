// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Reading back the NAT configuration of the dataplane

use crate::features::NatFeatures;
use crate::mapping::{IdentityMapping, Local, StaticMapping};
use crate::snapshot::{GlobalConfig, Snapshot};
use model::Protocol;
use rekon::{AsRequirement, Observe};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;
use std::str::FromStr;
use tracing::{debug, error};

/// Largest number of addresses a single pool range may cover
pub const MAX_POOL_RANGE: u32 = 1024;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DumpError {
    #[error("Dataplane dump unavailable: {0}")]
    Unavailable(String),
    #[error("Invalid address '{0}'")]
    BadAddress(String),
    #[error("Invalid protocol '{0}'")]
    BadProtocol(String),
    #[error("Invalid address range {0}")]
    BadRange(String),
    #[error("Conflicting NAT features for interface {0}")]
    BadInterface(String),
    #[error("Static mapping {0} has no locals")]
    NoLocals(String),
    #[error("Local {1} appears twice in static mapping {0}")]
    DuplicateLocal(String, String),
    #[error("Mapping {0} appears twice")]
    DuplicateMapping(String),
}

/// One row of the interface table. An interface that is both inside and outside shows up as
/// two rows.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDump {
    pub name: String,
    pub inside: bool,
    pub output_feature: bool,
}

/// Inclusive range of pool addresses; `last` is absent for a single address.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRangeDump {
    pub first: String,
    #[serde(default)]
    pub last: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfigDump {
    pub forwarding: bool,
    #[serde(default)]
    pub interfaces: Vec<InterfaceDump>,
    #[serde(default)]
    pub address_pool: Vec<AddressRangeDump>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalDump {
    pub ip: String,
    pub port: u16,
    /// weight of the local in the dataplane's weighted selection
    pub probability: u8,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticMappingDump {
    pub external_ip: String,
    pub external_port: u16,
    pub protocol: String,
    #[serde(default)]
    pub locals: Vec<LocalDump>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityMappingDump {
    pub ip: String,
    pub port: u16,
    pub protocol: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingsDump {
    #[serde(default)]
    pub static_mappings: Vec<StaticMappingDump>,
    #[serde(default)]
    pub identity_mappings: Vec<IdentityMappingDump>,
}

/// Everything read back from the dataplane
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataplaneDump {
    pub global: GlobalConfigDump,
    pub mappings: MappingsDump,
}

/// Read access to the NAT configuration of a dataplane.
pub trait NatDump {
    fn dump_global_config(&self) -> Result<GlobalConfigDump, DumpError>;
    fn dump_mappings(&self) -> Result<MappingsDump, DumpError>;
}

fn parse_addr(addr: &str) -> Result<Ipv4Addr, DumpError> {
    Ipv4Addr::from_str(addr).map_err(|_| DumpError::BadAddress(addr.to_owned()))
}

fn parse_protocol(protocol: &str) -> Result<Protocol, DumpError> {
    Protocol::from_str(protocol).map_err(|_| DumpError::BadProtocol(protocol.to_owned()))
}

impl AddressRangeDump {
    fn addresses(&self) -> Result<impl Iterator<Item = Ipv4Addr>, DumpError> {
        let first = u32::from(parse_addr(&self.first)?);
        let last = match &self.last {
            Some(last) => u32::from(parse_addr(last)?),
            None => first,
        };
        if last < first || last - first >= MAX_POOL_RANGE {
            return Err(DumpError::BadRange(format!(
                "{}-{}",
                self.first,
                self.last.as_deref().unwrap_or_default()
            )));
        }
        Ok((first..=last).map(Ipv4Addr::from))
    }
}

impl AsRequirement<GlobalConfig> for GlobalConfigDump {
    type Requirement<'a>
        = Result<GlobalConfig, DumpError>
    where
        Self: 'a;

    fn as_requirement<'a>(&'a self) -> Self::Requirement<'a> {
        let mut interfaces: BTreeMap<String, NatFeatures> = BTreeMap::new();
        for row in &self.interfaces {
            let row_features = match (row.inside, row.output_feature) {
                (true, true) => return Err(DumpError::BadInterface(row.name.clone())),
                (true, false) => NatFeatures::IN,
                (false, false) => NatFeatures::OUT,
                (false, true) => NatFeatures::OUTPUT_OUT,
            };
            let features = interfaces.entry(row.name.clone()).or_default();
            if features.intersects(row_features) {
                return Err(DumpError::BadInterface(row.name.clone()));
            }
            features.insert(row_features);
            if !features.is_valid() {
                return Err(DumpError::BadInterface(row.name.clone()));
            }
        }
        let mut address_pool = BTreeSet::new();
        for range in &self.address_pool {
            address_pool.extend(range.addresses()?);
        }
        Ok(GlobalConfig {
            forwarding: self.forwarding,
            address_pool,
            interfaces,
        })
    }
}

impl AsRequirement<StaticMapping> for StaticMappingDump {
    type Requirement<'a>
        = Result<StaticMapping, DumpError>
    where
        Self: 'a;

    fn as_requirement<'a>(&'a self) -> Self::Requirement<'a> {
        let name = format!("{}:{}", self.external_ip, self.external_port);
        let external_ip = parse_addr(&self.external_ip)?;
        let protocol = parse_protocol(&self.protocol)?;
        if self.locals.is_empty() {
            return Err(DumpError::NoLocals(name));
        }
        let mut seen = BTreeSet::new();
        let mut locals = Vec::with_capacity(self.locals.len());
        for local in &self.locals {
            let ip = parse_addr(&local.ip)?;
            if !seen.insert((ip, local.port)) {
                return Err(DumpError::DuplicateLocal(
                    name,
                    format!("{}:{}", local.ip, local.port),
                ));
            }
            locals.push(Local::new(ip, local.port, local.probability));
        }
        Ok(StaticMapping::new(
            external_ip,
            self.external_port,
            protocol,
            locals,
        ))
    }
}

impl AsRequirement<IdentityMapping> for IdentityMappingDump {
    type Requirement<'a>
        = Result<IdentityMapping, DumpError>
    where
        Self: 'a;

    fn as_requirement<'a>(&'a self) -> Self::Requirement<'a> {
        Ok(IdentityMapping {
            ip: parse_addr(&self.ip)?,
            port: self.port,
            protocol: parse_protocol(&self.protocol)?,
        })
    }
}

impl AsRequirement<Snapshot> for DataplaneDump {
    type Requirement<'a>
        = Result<Snapshot, DumpError>
    where
        Self: 'a;

    fn as_requirement<'a>(&'a self) -> Self::Requirement<'a> {
        let mut snapshot = Snapshot {
            global: self.global.as_requirement()?,
            ..Default::default()
        };
        for dump in &self.mappings.static_mappings {
            let mapping = dump.as_requirement()?;
            if snapshot.static_mappings.iter().any(|m| m.frontend() == mapping.frontend()) {
                return Err(DumpError::DuplicateMapping(mapping.to_string()));
            }
            snapshot.static_mappings.insert(mapping);
        }
        for dump in &self.mappings.identity_mappings {
            let mapping = dump.as_requirement()?;
            if !snapshot.identity_mappings.insert(mapping) {
                return Err(DumpError::DuplicateMapping(mapping.to_string()));
            }
        }
        Ok(snapshot)
    }
}

impl From<&GlobalConfig> for GlobalConfigDump {
    fn from(global: &GlobalConfig) -> Self {
        let mut interfaces = Vec::new();
        for (name, features) in &global.interfaces {
            if features.contains(NatFeatures::IN) {
                interfaces.push(InterfaceDump {
                    name: name.clone(),
                    inside: true,
                    output_feature: false,
                });
            }
            if features.contains(NatFeatures::OUT) {
                interfaces.push(InterfaceDump {
                    name: name.clone(),
                    inside: false,
                    output_feature: features.contains(NatFeatures::OUTPUT),
                });
            }
        }
        // consecutive addresses are reported as one range
        let mut address_pool: Vec<AddressRangeDump> = Vec::new();
        let mut current: Option<(u32, u32)> = None;
        let mut close = |(first, last): (u32, u32)| {
            address_pool.push(AddressRangeDump {
                first: Ipv4Addr::from(first).to_string(),
                last: (last != first).then(|| Ipv4Addr::from(last).to_string()),
            });
        };
        for addr in global.address_pool.iter().map(|a| u32::from(*a)) {
            current = match current {
                Some((first, last))
                    if last.checked_add(1) == Some(addr) && addr - first < MAX_POOL_RANGE =>
                {
                    Some((first, addr))
                }
                Some(range) => {
                    close(range);
                    Some((addr, addr))
                }
                None => Some((addr, addr)),
            };
        }
        if let Some(range) = current {
            close(range);
        }
        GlobalConfigDump {
            forwarding: global.forwarding,
            interfaces,
            address_pool,
        }
    }
}

impl From<&StaticMapping> for StaticMappingDump {
    fn from(mapping: &StaticMapping) -> Self {
        StaticMappingDump {
            external_ip: mapping.external_ip.to_string(),
            external_port: mapping.external_port,
            protocol: mapping.protocol.to_string(),
            locals: mapping
                .locals
                .iter()
                .map(|local| LocalDump {
                    ip: local.ip.to_string(),
                    port: local.port,
                    probability: local.weight,
                })
                .collect(),
        }
    }
}

impl From<&IdentityMapping> for IdentityMappingDump {
    fn from(mapping: &IdentityMapping) -> Self {
        IdentityMappingDump {
            ip: mapping.ip.to_string(),
            port: mapping.port,
            protocol: mapping.protocol.to_string(),
        }
    }
}

impl From<&Snapshot> for DataplaneDump {
    fn from(snapshot: &Snapshot) -> Self {
        DataplaneDump {
            global: GlobalConfigDump::from(&snapshot.global),
            mappings: MappingsDump {
                static_mappings: snapshot.static_mappings.iter().map(Into::into).collect(),
                identity_mappings: snapshot.identity_mappings.iter().map(Into::into).collect(),
            },
        }
    }
}

/// Observes the NAT configuration of a dataplane through its [`NatDump`] interface.
pub struct NatObserver<'d, D: NatDump> {
    dump: &'d D,
}

impl<'d, D: NatDump> NatObserver<'d, D> {
    #[must_use]
    pub fn new(dump: &'d D) -> Self {
        Self { dump }
    }

    fn read(&self) -> Result<DataplaneDump, DumpError> {
        Ok(DataplaneDump {
            global: self.dump.dump_global_config()?,
            mappings: self.dump.dump_mappings()?,
        })
    }
}

impl<D: NatDump> Observe for NatObserver<'_, D> {
    type Observation<'a>
        = Result<Snapshot, DumpError>
    where
        Self: 'a;

    fn observe<'a>(&'a self) -> Self::Observation<'a> {
        let snapshot = self
            .read()
            .and_then(|dump| dump.as_requirement())
            .inspect_err(|e| error!("Failed to read NAT configuration: {e}"))?;
        debug!(
            "Observed NAT configuration: {} interfaces, {} pool addresses, {} mappings",
            snapshot.global.interfaces.len(),
            snapshot.global.address_pool.len(),
            snapshot.mapping_count()
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(name: &str, inside: bool, output_feature: bool) -> InterfaceDump {
        InterfaceDump {
            name: name.to_owned(),
            inside,
            output_feature,
        }
    }

    fn range(first: &str, last: Option<&str>) -> AddressRangeDump {
        AddressRangeDump {
            first: first.to_owned(),
            last: last.map(ToOwned::to_owned),
        }
    }

    #[test]
    fn interface_rows() {
        let dump = GlobalConfigDump {
            forwarding: true,
            interfaces: vec![
                row("eth0", false, true),
                row("vxlanBVI", true, false),
                row("vxlanBVI", false, false),
                row("tap1", false, false),
            ],
            address_pool: vec![],
        };
        let global = dump.as_requirement().unwrap();
        assert_eq!(global.interfaces["eth0"], NatFeatures::OUTPUT_OUT);
        assert_eq!(global.interfaces["vxlanBVI"], NatFeatures::IN_OUT);
        assert_eq!(global.interfaces["tap1"], NatFeatures::OUT);
        assert_eq!(GlobalConfigDump::from(&global).as_requirement(), Ok(global));
    }

    #[test]
    fn conflicting_interface_rows() {
        for rows in [
            vec![row("eth0", true, true)],
            vec![row("eth0", false, false), row("eth0", false, false)],
            vec![row("eth0", true, false), row("eth0", false, true)],
        ] {
            let dump = GlobalConfigDump {
                forwarding: true,
                interfaces: rows,
                address_pool: vec![],
            };
            assert_eq!(
                dump.as_requirement(),
                Err(DumpError::BadInterface("eth0".to_owned()))
            );
        }
    }

    #[test]
    fn pool_ranges() {
        let dump = GlobalConfigDump {
            forwarding: false,
            interfaces: vec![],
            address_pool: vec![
                range("192.168.16.1", None),
                range("10.0.0.254", Some("10.0.1.1")),
            ],
        };
        let global = dump.as_requirement().unwrap();
        assert_eq!(global.address_pool.len(), 5);
        assert!(global.address_pool.contains(&Ipv4Addr::new(10, 0, 1, 0)));
        assert_eq!(
            GlobalConfigDump::from(&global).address_pool,
            vec![
                range("10.0.0.254", Some("10.0.1.1")),
                range("192.168.16.1", None)
            ]
        );

        for bad in [
            range("10.0.0.2", Some("10.0.0.1")),
            range("10.0.0.0", Some("10.1.0.0")),
            range("10.0.0.300", None),
        ] {
            let dump = GlobalConfigDump {
                address_pool: vec![bad],
                ..Default::default()
            };
            assert!(dump.as_requirement().is_err());
        }
    }

    #[test]
    fn mapping_validation() {
        let local = |ip: &str, port| LocalDump {
            ip: ip.to_owned(),
            port,
            probability: 2,
        };
        let mut dump = StaticMappingDump {
            external_ip: "10.96.0.1".to_owned(),
            external_port: 80,
            protocol: "tcp".to_owned(),
            locals: vec![local("10.1.1.4", 8080), local("10.1.1.3", 8080)],
        };
        let mapping = dump.as_requirement().unwrap();
        assert_eq!(mapping.protocol, Protocol::Tcp);
        assert_eq!(mapping.locals[0].ip, Ipv4Addr::new(10, 1, 1, 3));

        dump.locals.push(local("10.1.1.3", 8080));
        assert!(matches!(
            dump.as_requirement(),
            Err(DumpError::DuplicateLocal(..))
        ));
        dump.locals.clear();
        assert!(matches!(dump.as_requirement(), Err(DumpError::NoLocals(_))));
        dump.protocol = "SCTP".to_owned();
        assert_eq!(
            dump.as_requirement(),
            Err(DumpError::BadProtocol("SCTP".to_owned()))
        );

        let identity = IdentityMappingDump {
            ip: "10.1.1.3".to_owned(),
            port: 22,
            protocol: "UDP".to_owned(),
        };
        let full = DataplaneDump {
            global: GlobalConfigDump::default(),
            mappings: MappingsDump {
                static_mappings: vec![],
                identity_mappings: vec![identity.clone(), identity],
            },
        };
        assert!(matches!(
            full.as_requirement(),
            Err(DumpError::DuplicateMapping(_))
        ));
    }

    #[test]
    fn dump_from_yaml() {
        let yaml = r"
global:
  forwarding: true
  interfaces:
    - { name: GigabitEthernet0/8/0, inside: false, output_feature: false }
    - { name: loop0, inside: true, output_feature: false }
  address_pool:
    - { first: 192.168.16.10 }
mappings:
  static_mappings:
    - external_ip: 10.96.0.10
      external_port: 53
      protocol: UDP
      locals:
        - { ip: 10.1.1.5, port: 53, probability: 1 }
";
        let dump: DataplaneDump = serde_yaml_ng::from_str(yaml).unwrap();
        let snapshot = dump.as_requirement().unwrap();
        assert!(snapshot.global.forwarding);
        assert_eq!(
            snapshot.interface_features("loop0"),
            Some(NatFeatures::IN)
        );
        assert_eq!(snapshot.static_mappings.len(), 1);
        assert_eq!(DataplaneDump::from(&snapshot).as_requirement(), Ok(snapshot));
    }
}
