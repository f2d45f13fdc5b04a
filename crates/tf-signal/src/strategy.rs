//! The `ControlStrategy` trait, the extension point for signal control.

use tf_core::Tick;

use crate::{Observation, PhaseIndex, PhasePlan};

/// Pluggable traffic-light control.
///
/// One boxed strategy may be bound to many intersections; it is called once
/// per bound intersection per tick.  Implementations hold only their
/// parameters, so a strategy must be `Send + Sync` and any per-intersection
/// memory has to be derived from the [`Observation`].
///
/// # Example
///
/// ```rust,ignore
/// struct Alternate;
///
/// impl ControlStrategy for Alternate {
///     fn name(&self) -> &str { "alternate" }
///
///     fn decide(&self, obs: &Observation<'_>, _tick: Tick) -> PhaseIndex {
///         PhaseIndex(((obs.phase.index() + 1) % obs.num_phases()) as u16)
///     }
/// }
/// ```
pub trait ControlStrategy: Send + Sync {
    /// Short label used in logs and output.
    fn name(&self) -> &str;

    /// Phase installed before tick 0.
    ///
    /// Default: the first phase of the plan.
    fn initial_phase(&self, _plan: &PhasePlan) -> PhaseIndex {
        PhaseIndex(0)
    }

    /// The phase to install for `tick`.
    ///
    /// Called at the end of tick `tick - 1`.  Returning an index outside the
    /// plan is a configuration error that stops the simulation.
    fn decide(&self, obs: &Observation<'_>, tick: Tick) -> PhaseIndex;
}

impl<S: ControlStrategy + ?Sized> ControlStrategy for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn initial_phase(&self, plan: &PhasePlan) -> PhaseIndex {
        (**self).initial_phase(plan)
    }

    fn decide(&self, obs: &Observation<'_>, tick: Tick) -> PhaseIndex {
        (**self).decide(obs, tick)
    }
}
