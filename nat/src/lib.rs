// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic
)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

//! NAT44 configuration for service load-balancing
//!
//! This package models the NAT44 configuration a dataplane needs to load-balance traffic sent to
//! service addresses: global settings (forwarding, source-NAT address pool, per-interface NAT
//! features) and destination-NAT mappings. It provides:
//!
//! - [`Snapshot`]: the complete configuration at a point in time, as a value;
//! - [`diff`]: the minimal [`NatTransaction`] turning one snapshot into another;
//! - [`TxnSink`] and [`NatDump`]: the contracts of the dataplane, to apply transactions and to
//!   read back the current configuration;
//! - [`NatReconciler`] and [`NatObserver`], implementing the `rekon` traits on top of those.
//!
//! # Limitations
//!
//! - Only NAT44 is supported
//! - Mappings are never modified in place: a changed mapping is removed and re-added

mod diff;
mod dump;
mod features;
mod mapping;
mod snapshot;
mod txn;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

#[cfg(any(test, feature = "bolero"))]
mod contract;

pub use diff::{NatReconciler, diff};
pub use dump::{
    AddressRangeDump, DataplaneDump, DumpError, GlobalConfigDump, IdentityMappingDump,
    InterfaceDump, LocalDump, MappingsDump, NatDump, NatObserver, StaticMappingDump,
};
pub use features::NatFeatures;
pub use mapping::{IdentityMapping, Local, NatMapping, StaticMapping};
pub use snapshot::{GlobalConfig, Snapshot};
pub use txn::{ApplyError, GlobalItem, NatTransaction, SinkError, TxnSink};

use tracectl::trace_target;
trace_target!("nat", LevelFilter::INFO);
