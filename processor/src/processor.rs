// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The service processor: keeps the NAT configuration of the dataplane in line with the
//! cluster objects.

use crate::builder::desired_snapshot;
use crate::cache::ObjectCache;
use crate::errors::{ProcessorError, ProcessorResult};
use crate::event::{ResyncEvent, WatchEvent};
use model::Topology;
use nat::{NatDump, NatObserver, NatReconciler, Snapshot, TxnSink};
use rekon::{Observe, Reconcile};
use tracing::{debug, info};

/// Lifecycle of a [`ServiceProcessor`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum ProcessorState {
    Uninitialized,
    Ready,
    Closed,
}

/// Turns object events into NAT transactions.
///
/// After each event, the complete desired configuration is recomputed from the cached objects
/// and compared with the configuration last applied to the dataplane; the difference is committed
/// to the sink. Callers must serialize calls.
pub struct ServiceProcessor<T: Topology, S: TxnSink, D: NatDump> {
    topology: T,
    sink: S,
    dump: D,
    cache: ObjectCache,
    last_applied: Snapshot,
    state: ProcessorState,
}

impl<T: Topology, S: TxnSink, D: NatDump> ServiceProcessor<T, S, D> {
    #[must_use]
    pub fn new(topology: T, sink: S, dump: D) -> Self {
        Self {
            topology,
            sink,
            dump,
            cache: ObjectCache::new(),
            last_applied: Snapshot::default(),
            state: ProcessorState::Uninitialized,
        }
    }

    #[must_use]
    pub fn state(&self) -> ProcessorState {
        self.state
    }

    /// The configuration the dataplane is believed to have
    #[must_use]
    pub fn last_applied(&self) -> &Snapshot {
        &self.last_applied
    }

    #[must_use]
    pub fn cache(&self) -> &ObjectCache {
        &self.cache
    }

    #[must_use]
    pub fn topology(&self) -> &T {
        &self.topology
    }

    fn ensure_ready(&self, op: &'static str) -> ProcessorResult<()> {
        if self.state == ProcessorState::Ready {
            Ok(())
        } else {
            Err(ProcessorError::InvalidState {
                op,
                state: self.state,
            })
        }
    }

    pub fn init(&mut self) -> ProcessorResult<()> {
        if self.state != ProcessorState::Uninitialized {
            return Err(ProcessorError::InvalidState {
                op: "init",
                state: self.state,
            });
        }
        self.state = ProcessorState::Ready;
        info!(
            "Service processor ready on node '{}'",
            self.topology.own_node_label()
        );
        Ok(())
    }

    /// Stop processing events. Closing twice is harmless; a closed processor cannot be
    /// initialized again.
    pub fn close(&mut self) -> ProcessorResult<()> {
        if self.state != ProcessorState::Closed {
            info!("Closing service processor");
        }
        self.state = ProcessorState::Closed;
        Ok(())
    }

    /// Apply a change to a single object and converge the dataplane
    pub fn update(&mut self, event: WatchEvent) -> ProcessorResult<()> {
        self.ensure_ready("update")?;
        debug!("Processing event: {event}");
        match event {
            WatchEvent::Put(object) => self.cache.put(object),
            WatchEvent::Delete(key) => {
                if !self.cache.delete(&key) {
                    debug!("Deleted object {key} was not known");
                }
            }
            WatchEvent::PodDeleting(id) => {
                if !self.cache.mark_pod_deleting(&id) {
                    debug!("Pod {id} is unknown or already being deleted");
                }
            }
        }
        self.converge()
    }

    /// Replace the cached objects and converge the dataplane from the configuration it reports.
    ///
    /// If the dataplane cannot be read, nothing changes and the error is returned.
    pub fn resync(&mut self, event: ResyncEvent) -> ProcessorResult<()> {
        self.ensure_ready("resync")?;
        let observed = NatObserver::new(&self.dump).observe()?;
        info!(
            "Resyncing from dataplane with {} mappings",
            observed.mapping_count()
        );
        self.cache.resync(event);
        self.last_applied = observed;
        self.converge()
    }

    /// Commit the difference between the desired and last applied configurations
    fn converge(&mut self) -> ProcessorResult<()> {
        let desired = desired_snapshot(&self.topology, &self.cache);
        NatReconciler::new(&self.sink).reconcile(&desired, &self.last_applied)?;
        self.last_applied = desired;
        Ok(())
    }
}
