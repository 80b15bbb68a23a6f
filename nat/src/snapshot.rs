// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The complete NAT configuration at a point in time

use crate::features::NatFeatures;
use crate::mapping::{IdentityMapping, NatMapping, StaticMapping};
use crate::txn::{ApplyError, GlobalItem, NatTransaction};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::net::Ipv4Addr;
use tracing::trace;

/// Global NAT settings of the dataplane
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GlobalConfig {
    pub forwarding: bool,
    pub address_pool: BTreeSet<Ipv4Addr>,
    /// interfaces with some NAT feature enabled; interfaces without any are absent
    pub interfaces: BTreeMap<String, NatFeatures>,
}

/// Global settings and mappings: everything the load-balancer configures in the dataplane.
///
/// The default snapshot is the configuration of an empty dataplane.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub global: GlobalConfig,
    pub static_mappings: BTreeSet<StaticMapping>,
    pub identity_mappings: BTreeSet<IdentityMapping>,
}

impl Snapshot {
    #[must_use]
    pub fn mapping_count(&self) -> usize {
        self.static_mappings.len() + self.identity_mappings.len()
    }

    #[must_use]
    pub fn interface_features(&self, name: &str) -> Option<NatFeatures> {
        self.global.interfaces.get(name).copied()
    }

    /// Apply a transaction: removals first, then additions.
    ///
    /// Every removed item must be present and every added item absent, otherwise the snapshot is
    /// left untouched and an error is returned.
    pub fn apply(&mut self, txn: &NatTransaction) -> Result<(), ApplyError> {
        let mut next = self.clone();
        for item in &txn.global_removes {
            next.remove_global(item)?;
        }
        for mapping in &txn.mapping_removes {
            let removed = match mapping {
                NatMapping::Static(m) => next.static_mappings.remove(m),
                NatMapping::Identity(m) => next.identity_mappings.remove(m),
            };
            if !removed {
                return Err(ApplyError::Missing(mapping.to_string()));
            }
        }
        for item in &txn.global_adds {
            next.add_global(item)?;
        }
        for mapping in &txn.mapping_adds {
            let added = match mapping {
                NatMapping::Static(m) => next.static_mappings.insert(m.clone()),
                NatMapping::Identity(m) => next.identity_mappings.insert(*m),
            };
            if !added {
                return Err(ApplyError::Duplicate(mapping.to_string()));
            }
        }
        trace!("Applied transaction: {txn}");
        *self = next;
        Ok(())
    }

    fn remove_global(&mut self, item: &GlobalItem) -> Result<(), ApplyError> {
        let present = match item {
            GlobalItem::Forwarding => std::mem::take(&mut self.global.forwarding),
            GlobalItem::PoolAddress(addr) => self.global.address_pool.remove(addr),
            GlobalItem::Interface { name, features } => {
                if self.global.interfaces.get(name) == Some(features) {
                    self.global.interfaces.remove(name);
                    true
                } else {
                    false
                }
            }
        };
        if present {
            Ok(())
        } else {
            Err(ApplyError::Missing(item.to_string()))
        }
    }

    fn add_global(&mut self, item: &GlobalItem) -> Result<(), ApplyError> {
        let added = match item {
            GlobalItem::Forwarding => !std::mem::replace(&mut self.global.forwarding, true),
            GlobalItem::PoolAddress(addr) => self.global.address_pool.insert(*addr),
            GlobalItem::Interface { name, features } => {
                if !features.is_valid() {
                    return Err(ApplyError::InvalidFeatures(name.clone(), *features));
                }
                self.global
                    .interfaces
                    .insert(name.clone(), *features)
                    .is_none()
            }
        };
        if added {
            Ok(())
        } else {
            Err(ApplyError::Duplicate(item.to_string()))
        }
    }
}

impl Display for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "forwarding: {}", self.global.forwarding)?;
        for addr in &self.global.address_pool {
            writeln!(f, "pool: {addr}")?;
        }
        for (name, features) in &self.global.interfaces {
            writeln!(f, "interface {name}: {features}")?;
        }
        for mapping in &self.static_mappings {
            writeln!(f, "{mapping}")?;
        }
        for mapping in &self.identity_mappings {
            writeln!(f, "{mapping}")?;
        }
        Ok(())
    }
}
