//! Typed errors surfaced by the reasoner.
//!
//! Partitioned exactly as spec.md §7: a clash during SAT search never
//! becomes an error here (it stays a local `ClashSignal` inside
//! [`crate::tableau`], driving backjumping); everything that is surfaced to
//! a caller or aborts the session goes through [`ReasonerError`].

use std::path::PathBuf;
use thiserror::Error;

/// Identifies an axiom for error reporting (see `AxiomLoadFailure`).
pub type AxiomId = u32;

/// Errors a reasoning session can surface to its caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReasonerError {
    /// A number restriction (`<=n R.C` / `>=n R.C`) was posted against a
    /// role that is not simple (its automaton has more than two states, or
    /// either safety condition fails).
    #[error("role '{0}' is not simple and cannot be used in a number restriction")]
    NonSimpleRoleMisuse(String),

    /// Role-inclusion-axiom automaton construction looped non-trivially
    /// (e.g. `R o S o R ⊑ R` with `R` non-transitive).
    #[error("cycle detected while constructing the automaton for role '{0}'")]
    CycleInRoleInclusion(String),

    /// The session was cancelled via its `CancellationToken`.
    #[error("reasoning was cancelled")]
    Cancelled,

    /// The per-session wall-clock timeout elapsed.
    #[error("reasoning exceeded the configured timeout of {0:?}")]
    Timeout(std::time::Duration),

    /// The reasoner reached an internal state that should be unreachable;
    /// only constructed under `debug_assertions`.
    #[error("internal invariant breach: {0}")]
    InvariantBreach(String),

    /// An axiom failed to load during preprocessing/absorption.
    #[error("axiom {0} failed to load: {1}")]
    AxiomLoadFailure(AxiomId, String),

    /// Save/load of the persisted binary format failed (interface only —
    /// persistence itself is out of scope for this crate).
    #[error("save/load failed for path {0}")]
    SaveLoadFailure(PathBuf),

    /// A query was issued after the session already failed; no further
    /// reasoning is attempted.
    #[error("reasoner is in a failed state after a prior unrecoverable error")]
    FailedReasoning,
}

/// Convenience alias for fallible reasoner operations.
pub type Result<T> = std::result::Result<T, ReasonerError>;
