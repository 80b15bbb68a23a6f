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

//! Service load-balancing control loop.
//!
//! The [`ServiceProcessor`] caches the services, endpoints, pods and nodes it is told about,
//! derives from them the NAT configuration the dataplane of this node needs, and commits the
//! difference with what was applied before:
//!
//! - [`classifier`] assigns NAT features to interfaces and picks the source-NAT pool;
//! - [`builder`] turns services and their endpoints into weighted static mappings;
//! - [`nat::diff`] computes the transaction.

pub mod builder;
pub mod cache;
pub mod classifier;
mod errors;
mod event;
mod processor;

pub use errors::{ProcessorError, ProcessorResult};
pub use event::{Object, ResyncEvent, ResyncEventBuilder, WatchEvent};
pub use processor::{ProcessorState, ServiceProcessor};

use tracectl::trace_target;
trace_target!("processor", LevelFilter::INFO);
