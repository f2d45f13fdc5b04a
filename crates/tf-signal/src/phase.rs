//! Phase plans and conflict sets.
//!
//! A *phase* is the set of headings that are green while it is active.  All
//! lights in one simulation share a single [`PhasePlan`]; each light only
//! stores the index of its current phase.
//!
//! ```text
//! default plan     phase 0 = {N, S}    phase 1 = {E, W}
//! default conflict every N/S heading × every E/W heading
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use tf_core::{Axis, Direction, DirectionSet};

use crate::{SignalError, SignalResult};

// ── PhaseIndex ────────────────────────────────────────────────────────────────

/// Position of a phase inside its [`PhasePlan`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhaseIndex(pub u16);

impl PhaseIndex {
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PhaseIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ── ConflictSet ───────────────────────────────────────────────────────────────

/// Symmetric relation over headings that must never be green together.
///
/// Serialized as a list of heading pairs.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(from = "Vec<(Direction, Direction)>", into = "Vec<(Direction, Direction)>")]
pub struct ConflictSet {
    /// `by_heading[d]` = headings conflicting with `d`.
    by_heading: [DirectionSet; 4],
}

impl ConflictSet {
    /// No conflicts at all.
    pub fn none() -> Self {
        Self { by_heading: [DirectionSet::EMPTY; 4] }
    }

    /// Add the pair `(a, b)`; the relation stays symmetric.
    pub fn with(mut self, a: Direction, b: Direction) -> Self {
        self.by_heading[a.index()] = self.by_heading[a.index()].with(b);
        self.by_heading[b.index()] = self.by_heading[b.index()].with(a);
        self
    }

    #[inline]
    pub fn conflicts(&self, a: Direction, b: Direction) -> bool {
        self.by_heading[a.index()].contains(b)
    }

    /// First conflicting pair inside `green`, scanning in heading order.
    pub fn first_conflict_in(&self, green: DirectionSet) -> Option<(Direction, Direction)> {
        green
            .iter()
            .flat_map(|a| green.iter().map(move |b| (a, b)))
            .find(|&(a, b)| a < b && self.conflicts(a, b))
    }

    /// Every conflicting pair, each listed once with the lower heading first.
    pub fn pairs(&self) -> Vec<(Direction, Direction)> {
        Direction::ALL
            .into_iter()
            .flat_map(|a| self.by_heading[a.index()].iter().map(move |b| (a, b)))
            .filter(|(a, b)| a <= b)
            .collect()
    }
}

impl Default for ConflictSet {
    /// Crossing traffic: every north/south heading against every east/west
    /// heading.
    fn default() -> Self {
        let mut set = Self::none();
        for a in Axis::NorthSouth.directions().iter() {
            for b in Axis::EastWest.directions().iter() {
                set = set.with(a, b);
            }
        }
        set
    }
}

impl From<Vec<(Direction, Direction)>> for ConflictSet {
    fn from(pairs: Vec<(Direction, Direction)>) -> Self {
        pairs.into_iter().fold(Self::none(), |set, (a, b)| set.with(a, b))
    }
}

impl From<ConflictSet> for Vec<(Direction, Direction)> {
    fn from(set: ConflictSet) -> Self {
        set.pairs()
    }
}

// ── PhasePlan ─────────────────────────────────────────────────────────────────

/// Ordered list of phases shared by every light in a simulation.
///
/// Serialized as a list of heading lists, e.g. `[["north", "south"], ["east", "west"]]`.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhasePlan {
    phases: Vec<DirectionSet>,
}

impl PhasePlan {
    /// Build a plan without validation.  Call [`validate`][Self::validate]
    /// before handing it to a simulation.
    pub fn new(phases: Vec<DirectionSet>) -> Self {
        Self { phases }
    }

    /// The classic two-phase plan with `first` green in phase 0.
    pub fn two_phase(first: Axis) -> Self {
        Self::new(vec![first.directions(), first.other().directions()])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Green headings of `phase`, or `None` if out of range.
    #[inline]
    pub fn green(&self, phase: PhaseIndex) -> Option<DirectionSet> {
        self.phases.get(phase.index()).copied()
    }

    pub fn phases(&self) -> &[DirectionSet] {
        &self.phases
    }

    /// All phase indices in order.
    pub fn indices(&self) -> impl Iterator<Item = PhaseIndex> + use<> {
        (0..self.phases.len() as u16).map(PhaseIndex)
    }

    /// Returns `phase` if it exists in this plan.
    pub fn check(&self, phase: PhaseIndex) -> SignalResult<PhaseIndex> {
        if phase.index() < self.phases.len() {
            Ok(phase)
        } else {
            Err(SignalError::PhaseOutOfRange { phase, phases: self.phases.len() })
        }
    }

    /// Reject empty plans, empty phases, phases wider than `u16` indices, and
    /// any phase that is green for a conflicting pair.
    pub fn validate(&self, conflicts: &ConflictSet) -> SignalResult<()> {
        if self.phases.is_empty() {
            return Err(SignalError::EmptyPlan);
        }
        if self.phases.len() > u16::MAX as usize {
            return Err(SignalError::InvalidParameter(format!(
                "{} phases exceed the supported maximum of {}",
                self.phases.len(),
                u16::MAX
            )));
        }
        for (phase, green) in self.indices().zip(&self.phases) {
            if green.is_empty() {
                return Err(SignalError::EmptyPhase { phase });
            }
            if let Some((a, b)) = conflicts.first_conflict_in(*green) {
                return Err(SignalError::ConflictingGreen { phase, a, b });
            }
        }
        Ok(())
    }
}

impl Default for PhasePlan {
    fn default() -> Self {
        Self::two_phase(Axis::NorthSouth)
    }
}
