// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Link-time registry of tracing targets declared by the crates linked in a binary

use crate::LevelFilter;
use linkme::distributed_slice;
use ordermap::OrderMap;

/// A tracing target as declared with [`trace_target!`](crate::trace_target).
#[derive(Debug)]
pub struct TraceTarget {
    pub(crate) target: &'static str,
    pub(crate) name: &'static str,
    pub(crate) level: LevelFilter,
}

impl TraceTarget {
    #[must_use]
    pub const fn new(target: &'static str, name: &'static str, level: LevelFilter) -> Self {
        Self {
            target,
            name,
            level,
        }
    }
}

#[distributed_slice]
pub static TRACE_TARGETS: [TraceTarget];

#[macro_export]
/// Declare the module invoking the macro as a tracing target with a short name and default level.
///
/// Callers need `linkme` among their dependencies.
macro_rules! trace_target {
    ($name:expr, $level:expr) => {
        // anonymous const scope: the imports stay local and the static gets a distinct
        // linker name on every invocation
        const _: () = {
            use linkme::distributed_slice;
            use $crate::LevelFilter;
            use $crate::targets::{TRACE_TARGETS, TraceTarget};

            #[distributed_slice(TRACE_TARGETS)]
            static TRACE_TGT: TraceTarget = TraceTarget::new(module_path!(), $name, $level);
        };
    };
}

/// Current level of a registered target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetLevel {
    pub name: &'static str,
    pub level: LevelFilter,
}

/// Snapshot of the registered targets, keyed by module path, in registration order.
#[derive(Debug, Clone, Default)]
pub struct TargetRegistry {
    targets: OrderMap<&'static str, TargetLevel>,
}

impl TargetRegistry {
    /// Build the registry from all targets linked into the binary.
    #[must_use]
    pub fn collect() -> Self {
        let mut registry = Self::default();
        for target in TRACE_TARGETS {
            registry.targets.insert(
                target.target,
                TargetLevel {
                    name: target.name,
                    level: target.level,
                },
            );
        }
        registry
    }

    /// Set the level of every target registered under `name`. Returns how many were changed.
    pub fn set_level(&mut self, name: &str, level: LevelFilter) -> usize {
        let mut changed = 0;
        for target in self.targets.values_mut().filter(|t| t.name == name) {
            target.level = level;
            changed += 1;
        }
        changed
    }

    #[must_use]
    pub fn level_of(&self, name: &str) -> Option<LevelFilter> {
        self.targets
            .values()
            .find(|t| t.name == name)
            .map(|t| t.level)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &TargetLevel)> {
        self.targets.iter().map(|(target, level)| (*target, level))
    }

    /// Filter directives (`target=level`) for all registered targets.
    #[must_use]
    pub fn directives(&self) -> Vec<String> {
        self.targets
            .iter()
            .map(|(target, t)| format!("{target}={}", t.level))
            .collect()
    }
}
