//! Node labels: the set of concepts (each tagged with the dependency set
//! that derived it) attached to a completion-graph node.
//!
//! A label is split into two trail-ordered arrays — simple concepts and
//! complex ones (`forall`/`<= n`/`Irr`/`forall U`) — so the ToDo worklist can
//! offset-address either half without walking the other (see
//! [`CGLabel::last_offset`]). Both arrays are plain growable vectors rather
//! than the original's `growingArray`: backtracking truncates to a saved
//! length instead of reusing freed slots, which this crate's allocator
//! doesn't need to avoid.

use crate::bipointer::{Bp, BOTTOM, TOP};
use crate::dag::DagTag;
use crate::depset::DepSet;

/// One concept in a label, together with the dependency set that derived it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptWDep {
    bp: Bp,
    dep: DepSet,
}

impl ConceptWDep {
    #[must_use]
    pub fn new(bp: Bp, dep: DepSet) -> Self {
        ConceptWDep { bp, dep }
    }

    #[must_use]
    pub fn bp(&self) -> Bp {
        self.bp
    }

    #[must_use]
    pub fn dep(&self) -> &DepSet {
        &self.dep
    }

    /// Merge another dependency set into this entry's, as happens when a
    /// merge of two nodes discovers the same concept already present with a
    /// different derivation.
    pub fn add_dep(&mut self, dep: &DepSet) {
        self.dep.add(dep);
    }
}

/// The result of attempting to add a concept to a label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddConceptResult {
    /// `p`'s negation is already present; `.0` is the merged clash dep-set.
    Clash(DepSet),
    /// `p` is already present; nothing to do.
    Exists,
    /// `p` was not present and may be added.
    Done,
}

/// A trail-ordered array of [`ConceptWDep`]s — one half of a node's label.
#[derive(Debug, Clone, Default)]
pub struct CwdArray {
    base: Vec<ConceptWDep>,
}

impl CwdArray {
    #[must_use]
    pub fn new() -> Self {
        CwdArray::default()
    }

    /// Reserve `capacity` entries up front; called once when a node is
    /// created (the original sizes `scLabel`/`ccLabel` differently — see
    /// [`CGLabel::init`]).
    pub fn init(&mut self, capacity: usize) {
        self.base.clear();
        self.base.reserve(capacity);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConceptWDep> {
        self.base.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.base.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    pub fn add(&mut self, c: ConceptWDep) {
        self.base.push(c);
    }

    #[must_use]
    pub fn get(&self, n: usize) -> &ConceptWDep {
        &self.base[n]
    }

    #[must_use]
    pub fn contains(&self, bp: Bp) -> bool {
        self.base.iter().any(|c| c.bp == bp)
    }

    /// `true` iff every concept in `self` also appears in `other`
    /// (ignoring dep-sets) — the blocking-candidate subset test.
    #[must_use]
    pub fn is_subset_of(&self, other: &CwdArray) -> bool {
        self.base.iter().all(|c| other.contains(c.bp))
    }

    /// General add-check: clashes if `p`'s negation is present, reports
    /// `Exists` if `p` itself is already present, else `Done`.
    #[must_use]
    pub fn check_added_concept(&self, p: Bp, dep: &DepSet) -> AddConceptResult {
        let inv_p = p.inverse();
        for c in &self.base {
            if c.bp == p {
                return AddConceptResult::Exists;
            } else if c.bp == inv_p {
                return AddConceptResult::Clash(dep.merge(c.dep()));
            }
        }
        AddConceptResult::Done
    }

    /// Add-check for a `p` whose negation is known not to occur in this
    /// label by construction (e.g. the label was just created): only the
    /// `Exists` case is checked.
    #[must_use]
    pub fn check_added_concept_p(&self, p: Bp) -> AddConceptResult {
        if self.contains(p) {
            AddConceptResult::Exists
        } else {
            AddConceptResult::Done
        }
    }

    /// Add-check for a `p` known not to already occur in this label by
    /// construction: only the `Clash` case is checked.
    #[must_use]
    pub fn check_added_concept_n(&self, p: Bp, dep: &DepSet) -> AddConceptResult {
        let inv_p = p.inverse();
        for c in &self.base {
            if c.bp == inv_p {
                return AddConceptResult::Clash(dep.merge(c.dep()));
            }
        }
        AddConceptResult::Done
    }

    /// Merge `dep` into the entry for `bp`, if present, returning its
    /// previous dep-set so the caller can restore it on backtrack. A no-op
    /// (`None`) if `dep` is empty or `bp` isn't labelled here.
    pub fn update_dep_set(&mut self, bp: Bp, dep: &DepSet) -> Option<DepSet> {
        if dep.is_empty() {
            return None;
        }
        let entry = self.base.iter_mut().find(|c| c.bp == bp)?;
        let old = entry.dep.clone();
        entry.add_dep(dep);
        Some(old)
    }

    /// Undo a prior [`CwdArray::update_dep_set`] by restoring the dep-set it returned.
    pub fn restore_dep_set(&mut self, bp: Bp, dep: DepSet) {
        if let Some(entry) = self.base.iter_mut().find(|c| c.bp == bp) {
            entry.dep = dep;
        }
    }

    /// Save just the current length; [`CwdArray::restore`] truncates back to it.
    #[must_use]
    pub fn save(&self) -> usize {
        self.base.len()
    }

    pub fn restore(&mut self, saved_len: usize) {
        self.base.truncate(saved_len);
    }
}

/// `true` iff `tag` labels a complex concept (kept in the `cc` half of a
/// [`CGLabel`] instead of the `sc` half).
#[must_use]
fn is_complex_concept(tag: DagTag) -> bool {
    matches!(tag, DagTag::Forall | DagTag::Le | DagTag::Irr | DagTag::UAll)
}

/// A completion-graph node's full label: simple concepts and complex ones,
/// addressable either directly or by a signed ToDo offset (`n >= 0` into the
/// simple half, `n < 0` into the complex half via `-(n+1)`).
#[derive(Debug, Clone, Default)]
pub struct CGLabel {
    sc_label: CwdArray,
    cc_label: CwdArray,
}

/// A save point for both halves of a [`CGLabel`].
#[derive(Debug, Clone, Copy)]
pub struct LabelSaveState {
    sc: usize,
    cc: usize,
}

impl CGLabel {
    #[must_use]
    pub fn new() -> Self {
        CGLabel::default()
    }

    /// Initialise a newly-created node's label with the capacities the
    /// original reserves (`8` simple slots, `4` complex ones).
    pub fn init(&mut self) {
        self.sc_label.init(8);
        self.cc_label.init(4);
    }

    #[must_use]
    pub fn label(&self, tag: DagTag) -> &CwdArray {
        if is_complex_concept(tag) {
            &self.cc_label
        } else {
            &self.sc_label
        }
    }

    pub fn label_mut(&mut self, tag: DagTag) -> &mut CwdArray {
        if is_complex_concept(tag) {
            &mut self.cc_label
        } else {
            &mut self.sc_label
        }
    }

    #[must_use]
    pub fn check_added_concept(&self, tag: DagTag, p: Bp, dep: &DepSet) -> AddConceptResult {
        self.label(tag).check_added_concept(p, dep)
    }

    #[must_use]
    pub fn check_added_concept_p(&self, tag: DagTag, p: Bp) -> AddConceptResult {
        self.label(tag).check_added_concept_p(p)
    }

    #[must_use]
    pub fn check_added_concept_n(&self, tag: DagTag, p: Bp, dep: &DepSet) -> AddConceptResult {
        self.label(tag).check_added_concept_n(p, dep)
    }

    #[must_use]
    pub fn sc_offset(index: usize) -> i32 {
        i32::try_from(index).expect("label index overflowed i32")
    }

    #[must_use]
    pub fn cc_offset(index: usize) -> i32 {
        -(i32::try_from(index).expect("label index overflowed i32") + 1)
    }

    /// The ToDo offset of the most recently added concept of the half `tag` belongs to.
    #[must_use]
    pub fn last_offset(&self, tag: DagTag) -> i32 {
        if is_complex_concept(tag) {
            CGLabel::cc_offset(self.cc_label.len() - 1)
        } else {
            CGLabel::sc_offset(self.sc_label.len() - 1)
        }
    }

    /// The concept at a signed ToDo offset: `n >= 0` addresses the simple
    /// half directly, `n < 0` addresses the complex half via `-(n+1)`.
    #[must_use]
    pub fn concept(&self, n: i32) -> &ConceptWDep {
        if n < 0 {
            self.cc_label.get((-(n + 1)) as usize)
        } else {
            self.sc_label.get(n as usize)
        }
    }

    /// The ToDo offset of a complex concept `bp` known to be in the label.
    #[must_use]
    pub fn cc_offset_of(&self, bp: Bp) -> Option<i32> {
        self.cc_label.iter().position(|c| c.bp() == bp).map(CGLabel::cc_offset)
    }

    #[must_use]
    pub fn contains(&self, p: Bp) -> bool {
        match p {
            TOP => true,
            BOTTOM => false,
            _ => self.contains_sc(p) || self.contains_cc(p),
        }
    }

    #[must_use]
    pub fn contains_sc(&self, p: Bp) -> bool {
        self.sc_label.contains(p)
    }

    #[must_use]
    pub fn contains_cc(&self, p: Bp) -> bool {
        self.cc_label.contains(p)
    }

    /// `true` iff `other` is a superset of `self` on both halves — the
    /// subset-blocking test (`B2`/`B3`; see [`crate::blocking`]).
    #[must_use]
    pub fn is_subset_of(&self, other: &CGLabel) -> bool {
        self.sc_label.is_subset_of(&other.sc_label) && self.cc_label.is_subset_of(&other.cc_label)
    }

    /// `true` iff `self` and `other` label exactly the same concepts.
    #[must_use]
    pub fn equals(&self, other: &CGLabel) -> bool {
        self.is_subset_of(other) && other.is_subset_of(self)
    }

    #[must_use]
    pub fn save(&self) -> LabelSaveState {
        LabelSaveState {
            sc: self.sc_label.save(),
            cc: self.cc_label.save(),
        }
    }

    pub fn restore(&mut self, ss: LabelSaveState) {
        self.sc_label.restore(ss.sc);
        self.cc_label.restore(ss.cc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bp(n: u32) -> Bp {
        Bp::create(n, true)
    }

    #[test]
    fn adding_a_fresh_concept_reports_done() {
        let mut arr = CwdArray::new();
        assert_eq!(arr.check_added_concept(bp(1), &DepSet::empty()), AddConceptResult::Done);
        arr.add(ConceptWDep::new(bp(1), DepSet::empty()));
        assert_eq!(arr.check_added_concept_p(bp(1)), AddConceptResult::Exists);
    }

    #[test]
    fn adding_a_negated_concept_clashes() {
        let mut arr = CwdArray::new();
        arr.add(ConceptWDep::new(bp(1), DepSet::singleton(2)));
        let result = arr.check_added_concept_n(bp(1).inverse(), &DepSet::singleton(3));
        match result {
            AddConceptResult::Clash(dep) => {
                assert!(dep.contains(2));
                assert!(dep.contains(3));
            }
            other => panic!("expected a clash, got {other:?}"),
        }
    }

    #[test]
    fn restore_truncates_to_saved_length() {
        let mut arr = CwdArray::new();
        arr.add(ConceptWDep::new(bp(1), DepSet::empty()));
        let saved = arr.save();
        arr.add(ConceptWDep::new(bp(2), DepSet::empty()));
        assert_eq!(arr.len(), 2);
        arr.restore(saved);
        assert_eq!(arr.len(), 1);
        assert!(arr.contains(bp(1)));
        assert!(!arr.contains(bp(2)));
    }

    #[test]
    fn simple_and_complex_concepts_land_in_different_halves() {
        let mut label = CGLabel::new();
        label.init();
        label.label_mut(DagTag::PConcept).add(ConceptWDep::new(bp(1), DepSet::empty()));
        label.label_mut(DagTag::Forall).add(ConceptWDep::new(bp(2), DepSet::empty()));
        assert!(label.contains_sc(bp(1)));
        assert!(!label.contains_cc(bp(1)));
        assert!(label.contains_cc(bp(2)));
        assert!(!label.contains_sc(bp(2)));
    }

    #[test]
    fn offsets_round_trip_through_concept_lookup() {
        let mut label = CGLabel::new();
        label.init();
        label.label_mut(DagTag::PConcept).add(ConceptWDep::new(bp(1), DepSet::empty()));
        label.label_mut(DagTag::Forall).add(ConceptWDep::new(bp(2), DepSet::empty()));
        let sc_off = label.last_offset(DagTag::PConcept);
        let cc_off = label.last_offset(DagTag::Forall);
        assert!(sc_off >= 0);
        assert!(cc_off < 0);
        assert_eq!(label.concept(sc_off).bp(), bp(1));
        assert_eq!(label.concept(cc_off).bp(), bp(2));
    }

    #[test]
    fn top_is_always_contained_and_bottom_never_is() {
        let label = CGLabel::new();
        assert!(label.contains(TOP));
        assert!(!label.contains(BOTTOM));
    }

    #[test]
    fn subset_and_equality_mirror_blocking_comparisons() {
        let mut small = CGLabel::new();
        small.init();
        small.label_mut(DagTag::PConcept).add(ConceptWDep::new(bp(1), DepSet::empty()));

        let mut big = CGLabel::new();
        big.init();
        big.label_mut(DagTag::PConcept).add(ConceptWDep::new(bp(1), DepSet::empty()));
        big.label_mut(DagTag::PConcept).add(ConceptWDep::new(bp(2), DepSet::empty()));

        assert!(small.is_subset_of(&big));
        assert!(!big.is_subset_of(&small));
        assert!(!small.equals(&big));
        assert!(small.equals(&small.clone()));
    }
}
