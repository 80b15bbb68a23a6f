// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Crate to declare tracing targets statically and adjust their levels at runtime
//!
//! Libraries only declare their targets with [`trace_target!`]. The binary calls
//! [`TracingControl::init`] once at startup to install the subscriber; until then, events go
//! to whatever subscriber is in place.

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic
)]

pub mod control;
pub mod targets;

// re-exports
pub use control::{TraceCtlError, TracingControl, get_trace_ctl};
pub use tracing::level_filters::LevelFilter;
