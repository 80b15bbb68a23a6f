// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Small vocabulary for reconciliation loops.
//!
//! A reconciliation loop compares what some external system currently looks like (an
//! observation) with what it should look like (a requirement) and acts to close the gap.
//! These traits name the three pieces of that loop so that the pieces can be implemented and
//! tested independently.

/// `Observe` is implemented by whatever is able to read the current state of an external system,
/// such as a dataplane dump interface.
pub trait Observe {
    /// The data produced by an observation.
    ///
    /// This is a [GAT] so that implementations may return borrowed data, an `Option`, or a
    /// `Result` when observing may fail.
    ///
    /// [GAT]: https://rust-lang.github.io/generic-associated-types-initiative/explainer/motivation.html
    type Observation<'a>
    where
        Self: 'a;

    /// Observe the state of the system.
    ///
    /// # Contract
    ///
    /// Implementations must not mutate the state of the external system.
    fn observe<'a>(&'a self) -> Self::Observation<'a>;
}

/// Map an observed record back to the requirement it would satisfy.
///
/// Observed records are usually in the external system's own representation. Converting them
/// lets the observed state be compared with the required state using plain equality.
pub trait AsRequirement<Spec> {
    /// Typically `Option<Spec>` or `Result<Spec, E>`: not every observed record
    /// has a valid requirement counterpart.
    type Requirement<'a>
    where
        Self: 'a;

    fn as_requirement<'a>(&'a self) -> Self::Requirement<'a>;
}

/// Attempt to drive an external resource into its required condition.
pub trait Reconcile {
    /// The data describing the desired state.
    type Requirement<'a>
    where
        Self: 'a;

    /// The data describing the state believed (or observed) to be current.
    type Observation<'a>
    where
        Self: 'a;

    /// Whatever the reconciliation produced, often a `Result`.
    type Outcome<'a>
    where
        Self: 'a;

    /// Move the external system from `observation` toward `requirement`.
    ///
    /// # Contract
    ///
    /// Reconciling twice with a requirement equal to the observation must not act on the
    /// external system.
    fn reconcile<'a>(
        &'a self,
        requirement: Self::Requirement<'a>,
        observation: Self::Observation<'a>,
    ) -> Self::Outcome<'a>;
}
