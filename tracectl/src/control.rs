// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Tracing runtime control.

use parking_lot::Mutex;
use std::sync::OnceLock;
use tracing::{debug, info};
use tracing_subscriber::filter::{Directive, ParseError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

use crate::LevelFilter;
use crate::targets::TargetRegistry;
use crate::trace_target;

trace_target!("tracectl", LevelFilter::INFO);

#[derive(Debug, thiserror::Error)]
pub enum TraceCtlError {
    #[error("Tracing was already initialized")]
    AlreadyInitialized,
    #[error("Failed to install subscriber: {0}")]
    Install(String),
    #[error("Invalid filter directive: {0}")]
    BadDirective(#[from] ParseError),
    #[error("Unknown tracing target '{0}'")]
    UnknownTarget(String),
    #[error("Failed to reload filter: {0}")]
    Reload(#[from] reload::Error),
}

struct ControlState {
    default: LevelFilter,
    registry: TargetRegistry,
}

/// Owner of the reloadable filter installed in the global subscriber.
pub struct TracingControl {
    state: Mutex<ControlState>,
    handle: reload::Handle<EnvFilter, Registry>,
}

static TRACE_CTL: OnceLock<TracingControl> = OnceLock::new();

/// Get the tracing control, if [`TracingControl::init`] was called.
#[must_use]
pub fn get_trace_ctl() -> Option<&'static TracingControl> {
    TRACE_CTL.get()
}

fn build_filter(default: LevelFilter, registry: &TargetRegistry) -> Result<EnvFilter, ParseError> {
    let mut filter = EnvFilter::default().add_directive(Directive::from(default));
    for directive in registry.directives() {
        filter = filter.add_directive(directive.parse()?);
    }
    Ok(filter)
}

impl TracingControl {
    /// Install the global subscriber: formatted output filtered by the levels of the registered
    /// targets, `default` applying to everything else.
    ///
    /// # Errors
    ///
    /// Fails if called twice or if another global subscriber was installed already.
    pub fn init(default: LevelFilter) -> Result<&'static TracingControl, TraceCtlError> {
        if TRACE_CTL.get().is_some() {
            return Err(TraceCtlError::AlreadyInitialized);
        }
        let registry = TargetRegistry::collect();
        let filter = build_filter(default, &registry)?;
        let (layer, handle) = reload::Layer::new(filter);
        tracing_subscriber::registry()
            .with(layer)
            .with(fmt::layer().with_target(true))
            .try_init()
            .map_err(|e| TraceCtlError::Install(e.to_string()))?;

        let control = TracingControl {
            state: Mutex::new(ControlState { default, registry }),
            handle,
        };
        if TRACE_CTL.set(control).is_err() {
            return Err(TraceCtlError::AlreadyInitialized);
        }
        info!("Tracing initialized with default level {default}");
        TRACE_CTL.get().ok_or(TraceCtlError::AlreadyInitialized)
    }

    fn reload(&self, state: &ControlState) -> Result<(), TraceCtlError> {
        let filter = build_filter(state.default, &state.registry)?;
        self.handle.reload(filter)?;
        Ok(())
    }

    /// Change the level of the target(s) registered with `name`.
    ///
    /// # Errors
    ///
    /// Fails if no target has that name or the new filter cannot be installed.
    pub fn set_level(&self, name: &str, level: LevelFilter) -> Result<(), TraceCtlError> {
        let mut state = self.state.lock();
        if state.registry.set_level(name, level) == 0 {
            return Err(TraceCtlError::UnknownTarget(name.to_string()));
        }
        debug!("Setting level of target '{name}' to {level}");
        self.reload(&state)
    }

    /// Change the level applying to targets that were not registered.
    ///
    /// # Errors
    ///
    /// Fails if the new filter cannot be installed.
    pub fn set_default_level(&self, level: LevelFilter) -> Result<(), TraceCtlError> {
        let mut state = self.state.lock();
        state.default = level;
        self.reload(&state)
    }

    #[must_use]
    pub fn level_of(&self, name: &str) -> Option<LevelFilter> {
        self.state.lock().registry.level_of(name)
    }
}
