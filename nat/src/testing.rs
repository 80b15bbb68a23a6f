// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! An in-memory dataplane, for tests

use crate::dump::{DataplaneDump, DumpError, GlobalConfigDump, MappingsDump, NatDump};
use crate::features::NatFeatures;
use crate::snapshot::Snapshot;
use crate::txn::{NatTransaction, SinkError, TxnSink};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

#[derive(Default)]
struct Inner {
    config: Snapshot,
    commits: usize,
    last_txn: Option<NatTransaction>,
    fail_next_commit: bool,
    fail_dump: bool,
    raw_dump: Option<DataplaneDump>,
}

/// A dataplane keeping its NAT configuration in memory.
///
/// Clones share the same state, so a test can hand a clone to the code under test and inspect
/// the original. Transactions are applied strictly: removing an absent item or adding a present
/// one makes the commit fail without changing anything.
#[derive(Clone, Default)]
pub struct MemoryDataplane {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryDataplane {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A dataplane already holding `config`, as after a restart of the control plane
    #[must_use]
    pub fn with_config(config: Snapshot) -> Self {
        let dataplane = Self::new();
        dataplane.inner.lock().config = config;
        dataplane
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.inner.lock().config.clone()
    }

    /// Number of successful commits
    #[must_use]
    pub fn commits(&self) -> usize {
        self.inner.lock().commits
    }

    #[must_use]
    pub fn last_transaction(&self) -> Option<NatTransaction> {
        self.inner.lock().last_txn.clone()
    }

    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.inner.lock().config.global.address_pool.len()
    }

    #[must_use]
    pub fn interface_features(&self, name: &str) -> NatFeatures {
        self.inner
            .lock()
            .config
            .interface_features(name)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn static_mapping_count(&self) -> usize {
        self.inner.lock().config.static_mappings.len()
    }

    #[must_use]
    pub fn identity_mapping_count(&self) -> usize {
        self.inner.lock().config.identity_mappings.len()
    }

    /// Make the next commit fail as if the dataplane could not be reached
    pub fn fail_next_commit(&self) {
        self.inner.lock().fail_next_commit = true;
    }

    /// Make dumps fail (or succeed again)
    pub fn fail_dump(&self, fail: bool) {
        self.inner.lock().fail_dump = fail;
    }

    /// Report `dump` instead of the actual configuration when dumped
    pub fn set_raw_dump(&self, dump: Option<DataplaneDump>) {
        self.inner.lock().raw_dump = dump;
    }

    fn dump(&self) -> Result<DataplaneDump, DumpError> {
        let inner = self.inner.lock();
        if inner.fail_dump {
            return Err(DumpError::Unavailable("dump disabled".to_owned()));
        }
        Ok(inner
            .raw_dump
            .clone()
            .unwrap_or_else(|| DataplaneDump::from(&inner.config)))
    }
}

impl TxnSink for MemoryDataplane {
    fn commit(&self, txn: &NatTransaction) -> Result<(), SinkError> {
        let mut inner = self.inner.lock();
        if std::mem::take(&mut inner.fail_next_commit) {
            return Err(SinkError::Unreachable("commit disabled".to_owned()));
        }
        inner.config.apply(txn)?;
        inner.commits += 1;
        inner.last_txn = Some(txn.clone());
        debug!("In-memory dataplane applied transaction: {txn}");
        Ok(())
    }
}

impl NatDump for MemoryDataplane {
    fn dump_global_config(&self) -> Result<GlobalConfigDump, DumpError> {
        Ok(self.dump()?.global)
    }

    fn dump_mappings(&self) -> Result<MappingsDump, DumpError> {
        Ok(self.dump()?.mappings)
    }
}

#[cfg(test)]
mod test {
    use super::MemoryDataplane;
    use crate::dump::{DataplaneDump, InterfaceDump, NatObserver};
    use crate::txn::{GlobalItem, NatTransaction, SinkError, TxnSink};
    use crate::{ApplyError, NatFeatures, Snapshot};
    use rekon::Observe;
    use std::net::Ipv4Addr;

    fn txn_adding_pool() -> NatTransaction {
        NatTransaction {
            global_adds: vec![
                GlobalItem::Forwarding,
                GlobalItem::PoolAddress(Ipv4Addr::new(192, 168, 16, 1)),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn strict_commit() {
        let dataplane = MemoryDataplane::new();
        let handle = dataplane.clone();
        handle.commit(&txn_adding_pool()).unwrap();
        assert_eq!(dataplane.pool_size(), 1);
        assert_eq!(dataplane.commits(), 1);

        // adding again is rejected as a whole
        let err = handle.commit(&txn_adding_pool()).unwrap_err();
        assert_eq!(
            err,
            SinkError::Rejected(ApplyError::Duplicate("forwarding".to_owned()))
        );
        assert_eq!(dataplane.commits(), 1);

        let removal = NatTransaction {
            global_removes: vec![GlobalItem::Interface {
                name: "eth0".to_owned(),
                features: NatFeatures::OUT,
            }],
            ..Default::default()
        };
        assert!(matches!(
            handle.commit(&removal),
            Err(SinkError::Rejected(ApplyError::Missing(_)))
        ));
        assert_eq!(dataplane.interface_features("eth0"), NatFeatures::empty());
    }

    #[test]
    fn observed_dump() {
        let dataplane = MemoryDataplane::new();
        dataplane.commit(&txn_adding_pool()).unwrap();
        let observed = NatObserver::new(&dataplane).observe().unwrap();
        assert_eq!(observed, dataplane.snapshot());

        dataplane.fail_dump(true);
        assert!(NatObserver::new(&dataplane).observe().is_err());
        dataplane.fail_dump(false);

        let mut raw = DataplaneDump::from(&Snapshot::default());
        raw.global.interfaces.push(InterfaceDump {
            name: "eth0".to_owned(),
            inside: true,
            output_feature: true,
        });
        dataplane.set_raw_dump(Some(raw));
        assert!(NatObserver::new(&dataplane).observe().is_err());
    }
}
