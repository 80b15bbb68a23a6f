// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Computing and submitting the difference between two NAT configurations

use crate::mapping::NatMapping;
use crate::snapshot::Snapshot;
use crate::txn::{GlobalItem, NatTransaction, SinkError, TxnSink};
use rekon::Reconcile;
use tracing::{debug, error, info};

/// Build the transaction turning `previous` into `desired`.
///
/// Interfaces whose features did not change are left alone, and mappings are compared by value:
/// a mapping differing in any field (locals and weights included) is removed and re-added.
#[must_use]
pub fn diff(previous: &Snapshot, desired: &Snapshot) -> NatTransaction {
    let mut txn = NatTransaction::default();
    let (prev, next) = (&previous.global, &desired.global);

    match (prev.forwarding, next.forwarding) {
        (false, true) => txn.global_adds.push(GlobalItem::Forwarding),
        (true, false) => txn.global_removes.push(GlobalItem::Forwarding),
        _ => {}
    }

    txn.global_removes.extend(
        prev.address_pool
            .difference(&next.address_pool)
            .map(|addr| GlobalItem::PoolAddress(*addr)),
    );
    txn.global_adds.extend(
        next.address_pool
            .difference(&prev.address_pool)
            .map(|addr| GlobalItem::PoolAddress(*addr)),
    );

    for (name, features) in &prev.interfaces {
        if next.interfaces.get(name) != Some(features) {
            txn.global_removes.push(GlobalItem::Interface {
                name: name.clone(),
                features: *features,
            });
        }
    }
    for (name, features) in &next.interfaces {
        if prev.interfaces.get(name) != Some(features) {
            txn.global_adds.push(GlobalItem::Interface {
                name: name.clone(),
                features: *features,
            });
        }
    }

    txn.mapping_removes.extend(
        previous
            .static_mappings
            .difference(&desired.static_mappings)
            .cloned()
            .map(NatMapping::Static),
    );
    txn.mapping_removes.extend(
        previous
            .identity_mappings
            .difference(&desired.identity_mappings)
            .copied()
            .map(NatMapping::Identity),
    );
    txn.mapping_adds.extend(
        desired
            .static_mappings
            .difference(&previous.static_mappings)
            .cloned()
            .map(NatMapping::Static),
    );
    txn.mapping_adds.extend(
        desired
            .identity_mappings
            .difference(&previous.identity_mappings)
            .copied()
            .map(NatMapping::Identity),
    );
    txn
}

/// Submits to a [`TxnSink`] the changes needed to move the dataplane from one configuration to
/// another.
pub struct NatReconciler<'s, S: TxnSink> {
    sink: &'s S,
}

impl<'s, S: TxnSink> NatReconciler<'s, S> {
    #[must_use]
    pub fn new(sink: &'s S) -> Self {
        Self { sink }
    }
}

impl<S: TxnSink> Reconcile for NatReconciler<'_, S> {
    type Requirement<'a>
        = &'a Snapshot
    where
        Self: 'a;
    type Observation<'a>
        = &'a Snapshot
    where
        Self: 'a;
    type Outcome<'a>
        = Result<NatTransaction, SinkError>
    where
        Self: 'a;

    /// Compute the transaction from `observation` to `requirement` and commit it, unless it is
    /// empty. The committed transaction is returned.
    fn reconcile<'a>(
        &'a self,
        requirement: Self::Requirement<'a>,
        observation: Self::Observation<'a>,
    ) -> Self::Outcome<'a> {
        let txn = diff(observation, requirement);
        if txn.is_empty() {
            debug!("NAT configuration is up to date");
            return Ok(txn);
        }
        match self.sink.commit(&txn) {
            Ok(()) => {
                info!("Committed NAT transaction: {txn}");
                Ok(txn)
            }
            Err(e) => {
                error!("Failed to commit NAT transaction ({txn}): {e}");
                Err(e)
            }
        }
    }
}
