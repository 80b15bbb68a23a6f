// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Transactions: the batches of changes submitted to the dataplane

use crate::features::NatFeatures;
use crate::mapping::NatMapping;
use std::fmt::Display;
use std::net::Ipv4Addr;

/// An item of the global NAT configuration which can be added or removed
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GlobalItem {
    /// Forwarding of packets not matching any NAT session; adding enables it
    Forwarding,
    PoolAddress(Ipv4Addr),
    Interface { name: String, features: NatFeatures },
}

impl Display for GlobalItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GlobalItem::Forwarding => write!(f, "forwarding"),
            GlobalItem::PoolAddress(addr) => write!(f, "pool address {addr}"),
            GlobalItem::Interface { name, features } => write!(f, "interface {name} {features}"),
        }
    }
}

/// A batch of changes, applied as one logical unit: removals, then additions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NatTransaction {
    pub global_adds: Vec<GlobalItem>,
    pub global_removes: Vec<GlobalItem>,
    pub mapping_adds: Vec<NatMapping>,
    pub mapping_removes: Vec<NatMapping>,
}

impl NatTransaction {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of individual operations
    #[must_use]
    pub fn len(&self) -> usize {
        self.global_adds.len()
            + self.global_removes.len()
            + self.mapping_adds.len()
            + self.mapping_removes.len()
    }
}

impl Display for NatTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "global +{}/-{}, mappings +{}/-{}",
            self.global_adds.len(),
            self.global_removes.len(),
            self.mapping_adds.len(),
            self.mapping_removes.len()
        )
    }
}

/// Reasons why a transaction cannot be applied to a configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    #[error("cannot remove {0}: not configured")]
    Missing(String),
    #[error("cannot add {0}: already configured")]
    Duplicate(String),
    #[error("invalid NAT features {1} for interface {0}")]
    InvalidFeatures(String, NatFeatures),
}

/// Failures reported by a [`TxnSink`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    #[error("Transaction rejected: {0}")]
    Rejected(#[from] ApplyError),
    #[error("Dataplane unreachable: {0}")]
    Unreachable(String),
}

/// The component programming the dataplane.
pub trait TxnSink {
    /// Apply a transaction.
    ///
    /// # Contract
    ///
    /// On error, the caller must assume that no part of the transaction was applied.
    fn commit(&self, txn: &NatTransaction) -> Result<(), SinkError>;
}
