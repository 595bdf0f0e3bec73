//! Typed failure modes for every fallible stage of the scheduling core.

use thiserror::Error;

/// Everything that can go wrong while building or improving a solution.
///
/// None of these are retried by the core itself — a caller that wants a
/// retry policy (e.g. relaxing an instance and re-running) implements it
/// above this layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    /// The instance itself violates a structural invariant (ordering,
    /// non-negative fields, dense zero-based ids, ...).
    #[error("invalid instance: {0}")]
    InvalidInstance(String),

    /// The initial-solution search exhausted every backtrack.
    #[error("no feasible solution")]
    Infeasible,

    /// Cluster widening (search step 3) met a converter that was already
    /// widened — the heuristic only staggers two-element clusters.
    #[error("heuristic cannot serialize clusters longer than 2")]
    ClusterTooLong,

    /// The conflict resolver could not absorb a transit overlap into
    /// either schedule's buffer slack.
    #[error("cannot resolve transit conflicts")]
    IrreparableConflict,

    /// Three or more torpedoes occupy a single-capacity transit state at
    /// once; the resolver is only designed to split pairs.
    #[error("invariant violation: {count} simultaneous transit-to-desulf entries at slot {slot}")]
    InvariantViolation { slot: usize, count: usize },
}
