//! Cache for the two degenerate nodes, `TOP` and `BOTTOM`.

use std::any::Any;

use crate::bipointer::{Bp, BOTTOM, TOP};

use super::{CacheState, CacheType, ModelCache};

/// The cache for a node labelled only with `TOP` or only with `BOTTOM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstCache {
    is_top: bool,
}

impl ConstCache {
    /// Build the cache for `bp`, which must be [`TOP`] or [`BOTTOM`].
    #[must_use]
    pub fn new(bp: Bp) -> Self {
        debug_assert!(bp == TOP || bp == BOTTOM, "ConstCache built from a non-const pointer");
        ConstCache { is_top: bp == TOP }
    }

    #[must_use]
    pub fn value(&self) -> bool {
        self.is_top
    }
}

impl ModelCache for ConstCache {
    fn state(&self) -> CacheState {
        if self.is_top {
            CacheState::Valid
        } else {
            CacheState::Invalid
        }
    }

    fn can_merge(&self, other: &dyn ModelCache) -> CacheState {
        if let Some(o) = other.as_any().downcast_ref::<ConstCache>() {
            if self.is_top && o.is_top {
                CacheState::Valid
            } else {
                CacheState::Invalid
            }
        } else {
            other.can_merge(self)
        }
    }

    fn cache_type(&self) -> CacheType {
        CacheType::Const
    }

    fn has_nominal_node(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_merges_with_top_but_not_with_bottom() {
        let top = ConstCache::new(TOP);
        let bottom = ConstCache::new(BOTTOM);
        assert_eq!(top.can_merge(&top), CacheState::Valid);
        assert_eq!(top.can_merge(&bottom), CacheState::Invalid);
        assert_eq!(bottom.can_merge(&bottom), CacheState::Invalid);
    }

    #[test]
    fn bottom_state_is_invalid() {
        assert_eq!(ConstCache::new(BOTTOM).state(), CacheState::Invalid);
        assert_eq!(ConstCache::new(TOP).state(), CacheState::Valid);
    }
}
