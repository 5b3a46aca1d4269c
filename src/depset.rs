//! Dependency sets: which branching levels a derived fact depends on.
//!
//! A [`DepSet`] tracks the set of non-deterministic branch points a fact's
//! derivation passes through. It supports union, restriction below a level,
//! and a `level()` query (the maximum element) used for backjumping. The
//! spec permits either a BDD-over-level-variables encoding or a sorted
//! small-set encoding "with set-theoretic-only semantics"; this
//! implementation takes the sorted small-set, since a BDD library has no
//! home in this crate's dependency stack (see `DESIGN.md`).

use smallvec::SmallVec;

/// A branching level: `0` means "no branch" (deterministic).
pub type Level = u32;

/// A set of branching levels a fact's derivation depends on.
///
/// Two dep-sets are equal iff they contain the same levels; the empty
/// dep-set marks a deterministic derivation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepSet {
    levels: SmallVec<[Level; 4]>,
}

impl DepSet {
    /// The empty (deterministic) dependency set.
    #[must_use]
    pub fn empty() -> Self {
        DepSet::default()
    }

    /// A dep-set depending on a single branching level.
    #[must_use]
    pub fn singleton(level: Level) -> Self {
        if level == 0 {
            return DepSet::empty();
        }
        DepSet {
            levels: SmallVec::from_slice(&[level]),
        }
    }

    /// `true` iff this dep-set is deterministic (empty).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// The maximum level in the set, or `0` if empty.
    #[must_use]
    pub fn level(&self) -> Level {
        self.levels.last().copied().unwrap_or(0)
    }

    /// `true` iff `level` is a member of this set.
    #[must_use]
    pub fn contains(&self, level: Level) -> bool {
        self.levels.binary_search(&level).is_ok()
    }

    /// Add a single level to this dep-set in place.
    pub fn add_level(&mut self, level: Level) {
        if level == 0 {
            return;
        }
        if let Err(pos) = self.levels.binary_search(&level) {
            self.levels.insert(pos, level);
        }
    }

    /// Union another dep-set into this one in place.
    pub fn add(&mut self, other: &DepSet) {
        for &l in &other.levels {
            self.add_level(l);
        }
    }

    /// Return the union of two dep-sets without mutating either.
    #[must_use]
    pub fn merge(&self, other: &DepSet) -> DepSet {
        let mut out = self.clone();
        out.add(other);
        out
    }

    /// Drop every level `>= level`, in place.
    pub fn restrict(&mut self, level: Level) {
        let cut = self.levels.partition_point(|&l| l < level);
        self.levels.truncate(cut);
    }

    /// Return a copy with every level `>= level` removed.
    #[must_use]
    pub fn restricted(&self, level: Level) -> DepSet {
        let mut out = self.clone();
        out.restrict(level);
        out
    }

    /// Iterate the member levels in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Level> + '_ {
        self.levels.iter().copied()
    }
}

impl std::ops::Add<&DepSet> for DepSet {
    type Output = DepSet;
    fn add(mut self, rhs: &DepSet) -> DepSet {
        self.add(rhs);
        self
    }
}

impl FromIterator<Level> for DepSet {
    fn from_iter<T: IntoIterator<Item = Level>>(iter: T) -> Self {
        let mut d = DepSet::empty();
        for l in iter {
            d.add_level(l);
        }
        d
    }
}

/// Tracks how many branching levels currently exist so that levels created
/// by a new `save()` are representable by every dep-set.
///
/// With the sorted small-set `DepSet` representation there is no shared
/// table to resize (unlike the BDD manager in `depSet_bdd.h`, whose
/// `ensureLevel` grows a global variable-order table); `DepSetManager` keeps
/// the bookkeeping call sites spec-compatible and gives call sites a place
/// to assert monotonicity.
#[derive(Debug, Default)]
pub struct DepSetManager {
    high_water: Level,
}

impl DepSetManager {
    /// Start a fresh manager at level 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grow to the next level (called just before a `save()`).
    pub fn grow_level(&mut self) -> Level {
        self.high_water += 1;
        self.high_water
    }

    /// Ensure `level` is representable (a no-op bookkeeping assertion here).
    pub fn ensure_level(&mut self, level: Level) {
        if level > self.high_water {
            self.high_water = level;
        }
    }

    /// The highest level ever grown to.
    #[must_use]
    pub fn high_water(&self) -> Level {
        self.high_water
    }

    /// Restore the high-water mark on backjump (levels `> level` are gone).
    pub fn restore(&mut self, level: Level) {
        if self.high_water > level {
            self.high_water = level;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_with_self_is_idempotent() {
        let d = DepSet::singleton(3).merge(&DepSet::singleton(5));
        assert_eq!(d.merge(&d), d);
    }

    #[test]
    fn restrict_is_a_subset() {
        let d = DepSet::singleton(1).merge(&DepSet::singleton(4)).merge(&DepSet::singleton(7));
        let r = d.restricted(5);
        for l in r.iter() {
            assert!(d.contains(l));
        }
        assert!(!r.contains(7));
        assert!(r.contains(4));
    }

    #[test]
    fn level_is_the_max_element() {
        let d = DepSet::singleton(2).merge(&DepSet::singleton(9)).merge(&DepSet::singleton(4));
        assert_eq!(d.level(), 9);
    }

    #[test]
    fn empty_is_deterministic() {
        assert!(DepSet::empty().is_empty());
        assert_eq!(DepSet::empty().level(), 0);
    }

    proptest::proptest! {
        #[test]
        fn prop_union_idempotent(levels in proptest::collection::vec(1u32..50, 0..10)) {
            let d: DepSet = levels.into_iter().collect();
            assert_eq!(d.merge(&d), d);
        }

        #[test]
        fn prop_restrict_is_subset(levels in proptest::collection::vec(1u32..50, 0..10), cut in 0u32..50) {
            let d: DepSet = levels.into_iter().collect();
            let r = d.restricted(cut);
            for l in r.iter() {
                assert!(d.contains(l));
                assert!(l < cut);
            }
        }
    }
}
