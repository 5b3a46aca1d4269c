//! Model caches: a cheap, syntactic over-approximation of whether a node's
//! label could ever model a consistent tableau branch, used to skip
//! re-expanding a subtree that's structurally identical to one already
//! expanded (see [`crate::cascade`]).
//!
//! Three cache shapes exist, cheapest first: [`ConstCache`] for `TOP`/`BOTTOM`,
//! [`SingletonCache`] for a node whose whole model is one concept, and
//! [`IanCache`] — the general case — which buckets a node's label and edges
//! into a handful of sets and answers merge questions by set intersection
//! instead of by running the tableau.

mod const_cache;
mod ian;
mod singleton;

use std::any::Any;
use std::fmt::Debug;

pub use const_cache::ConstCache;
pub use ian::IanCache;
pub use singleton::SingletonCache;

/// The outcome of checking (or merging) a model cache, named after the
/// question it answers rather than its position in a lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Direct contradiction: the model (or merge) is definitely inconsistent.
    Invalid,
    /// The model (or merge) is definitely consistent.
    Valid,
    /// The cache can't decide — the merge might fail for reasons outside
    /// what it tracks; fall back to running the tableau.
    Failed,
    /// Not yet tested.
    Unknown,
}

impl CacheState {
    /// Combine two states the way two merged models' states combine:
    /// `Invalid` dominates, then `Failed`, then `Unknown`, and only
    /// `Valid + Valid` stays `Valid`.
    #[must_use]
    pub fn merge(a: CacheState, b: CacheState) -> CacheState {
        use CacheState::{Failed, Invalid, Unknown, Valid};
        if a == Invalid || b == Invalid {
            Invalid
        } else if a == Failed || b == Failed {
            Failed
        } else if a == Unknown || b == Unknown {
            Unknown
        } else {
            Valid
        }
    }
}

/// Which concrete cache a [`ModelCache`] trait object is, used to recover
/// the concrete type for a merge that needs more than the trait's interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheType {
    Const,
    Singleton,
    Ian,
}

/// A cached over-approximation of a node's model, built once and consulted
/// whenever the tableau considers re-expanding a structurally identical node.
pub trait ModelCache: Debug {
    /// The cache's own internal state (clash, consistent, or undecided).
    fn state(&self) -> CacheState;

    /// Whether this cache and `other` could describe the same node without
    /// a guaranteed clash.
    fn can_merge(&self, other: &dyn ModelCache) -> CacheState;

    /// The concrete cache kind, used for the double-dispatch `can_merge`
    /// needs when it must inspect `other`'s own fields.
    fn cache_type(&self) -> CacheType;

    /// `true` for a cache that conservatively never signals a false clash
    /// (a "shallow" cache, safe to use anywhere); `false` for one that
    /// tracks enough of a model's shape that merging it needs care.
    fn shallow(&self) -> bool {
        true
    }

    /// Whether the node this cache was built from (or merged from) has a
    /// nominal among its label concepts; two nominal models can never be
    /// merged, regardless of what else they contain.
    fn has_nominal_node(&self) -> bool;

    /// Recovers the concrete type behind the trait object, the way the
    /// original's `dynamic_cast` recovers it from a base-class pointer.
    fn as_any(&self) -> &dyn Any;
}

/// `true` iff both caches claim a nominal node — in which case they can
/// never be merged, independent of anything else they track.
#[must_use]
pub fn has_nominal_clash(a: &dyn ModelCache, b: &dyn ModelCache) -> bool {
    a.has_nominal_node() && b.has_nominal_node()
}
