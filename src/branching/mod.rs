//! Branching contexts: the per-level state the tableau pushes before trying
//! a non-deterministic expansion rule, so backtracking can pick the next
//! untried alternative instead of restarting the rule from scratch.
//!
//! The original gives every rule its own `BranchingContext` subclass,
//! dispatched virtually; since the set of rules is fixed, this crate
//! collects the shared fields into [`BranchingContext`] and the
//! rule-specific ones into [`BcKind`] instead of reaching for a trait
//! object.

use smallvec::SmallVec;

use crate::bipointer::{Bp, INVALID};
use crate::depset::{DepSet, Level};
use crate::graph::{EdgeId, NodeId};
use crate::label::ConceptWDep;

/// One `Or` disjunct under consideration: whether it's still available, was
/// chosen this pass, or has already been tried and ruled out.
#[derive(Debug, Clone)]
pub struct OrArg {
    c: Bp,
    not_c: Bp,
    clash_reason: DepSet,
    chosen: bool,
    free: bool,
    tried: bool,
}

impl OrArg {
    #[must_use]
    pub fn free(c: Bp) -> Self {
        OrArg { c, not_c: c.inverse(), clash_reason: DepSet::empty(), chosen: false, free: true, tried: false }
    }

    #[must_use]
    pub fn clashed(c: Bp, ds: DepSet) -> Self {
        let mut arg = OrArg::free(c);
        arg.set_tried(ds);
        arg
    }

    pub fn set_tried(&mut self, ds: DepSet) {
        debug_assert!(!self.tried, "OrArg tried twice");
        self.chosen = false;
        self.free = false;
        self.tried = true;
        self.clash_reason = ds;
    }

    #[must_use]
    pub fn concept(&self) -> Bp {
        self.c
    }

    #[must_use]
    pub fn negation(&self) -> Bp {
        self.not_c
    }

    #[must_use]
    pub fn clash_reason(&self) -> &DepSet {
        &self.clash_reason
    }

    #[must_use]
    pub fn is_chosen(&self) -> bool {
        self.chosen
    }

    #[must_use]
    pub fn is_free(&self) -> bool {
        self.free
    }

    #[must_use]
    pub fn is_tried(&self) -> bool {
        self.tried
    }
}

/// Branching state for the `Or` rule: which disjunct is being tried, and
/// what's left once it clashes.
#[derive(Debug, Clone, Default)]
pub struct BcOr {
    entries: Vec<OrArg>,
    level: Level,
    branch_index: usize,
    free_choices: usize,
}

impl BcOr {
    pub fn init(&mut self) {
        self.entries.clear();
        self.level = 0;
        self.branch_index = 0;
        self.free_choices = 0;
    }

    pub fn next_option(&mut self) {
        self.branch_index += 1;
    }

    /// Install the disjuncts applicable at this node, counting how many are
    /// still free choices.
    pub fn set_or_index(&mut self, entries: Vec<OrArg>) {
        self.free_choices = entries.iter().filter(|e| e.is_free()).count();
        self.entries = entries;
    }

    #[must_use]
    pub fn no_more_options(&self) -> bool {
        self.free_choices == 0
    }

    /// The combined dep-set of every disjunct's clash reason, once all of
    /// them have been tried and ruled out.
    #[must_use]
    pub fn gather_clash_set(&self) -> DepSet {
        let mut dep = DepSet::empty();
        for e in &self.entries {
            dep.add(e.clash_reason());
        }
        dep
    }

    pub fn choose_free_option(&mut self) {
        for e in &mut self.entries {
            if e.free {
                e.free = false;
                e.chosen = true;
                break;
            }
        }
    }

    #[must_use]
    pub fn is_last_or_entry(&self) -> bool {
        self.entries.len() == self.branch_index + 1
    }

    /// `true` once [`BcOr::next_option`] has walked past the last stored
    /// disjunct — every alternative this branch point offered has been tried.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.branch_index >= self.entries.len()
    }

    #[must_use]
    pub fn current(&self) -> &OrArg {
        &self.entries[self.branch_index]
    }

    #[must_use]
    pub fn entries(&self) -> &[OrArg] {
        &self.entries
    }

    pub fn set_level(&mut self, level: Level) {
        self.level = level;
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }
}

/// Branching state for the `>= n` (NN) rule: which cardinality `m` (`1..=n`)
/// is currently being tried for the number of new successors to merge down to.
#[derive(Debug, Clone, Copy)]
pub struct BcNn {
    value: u32,
}

impl Default for BcNn {
    fn default() -> Self {
        BcNn { value: 1 }
    }
}

impl BcNn {
    pub fn init(&mut self) {
        self.value = 1;
    }

    pub fn next_option(&mut self) {
        self.value += 1;
    }

    #[must_use]
    pub fn no_more_options(&self, n: u32) -> bool {
        self.value > n
    }

    #[must_use]
    pub fn value(&self) -> u32 {
        self.value
    }
}

/// Branching state for the `<= n` rule: which pair of same-role edges is
/// currently being tried for a merge, walked from the newest edge down.
#[derive(Debug, Clone, Default)]
pub struct BcLe {
    items_to_merge: SmallVec<[EdgeId; 4]>,
    to_index: usize,
    from_index: usize,
}

impl BcLe {
    pub fn init(&mut self) {
        self.to_index = 0;
        self.from_index = 0;
    }

    pub fn set_items(&mut self, items: SmallVec<[EdgeId; 4]>) {
        self.items_to_merge = items;
        self.reset_from_index();
    }

    fn reset_from_index(&mut self) {
        self.from_index = self.items_to_merge.len().saturating_sub(1);
    }

    /// Advance to the next `(from, to)` merge candidate.
    pub fn next_option(&mut self) {
        if self.from_index == 0 {
            self.to_index += 1;
            self.from_index = self.to_index;
            return;
        }
        self.from_index -= 1;
        if self.from_index == self.to_index {
            self.to_index += 1;
            self.reset_from_index();
        }
    }

    #[must_use]
    pub fn no_more_options(&self) -> bool {
        self.from_index <= self.to_index
    }

    #[must_use]
    pub fn from(&self) -> EdgeId {
        self.items_to_merge[self.from_index]
    }

    #[must_use]
    pub fn to(&self) -> EdgeId {
        self.items_to_merge[self.to_index]
    }
}

/// The rule-specific payload of a [`BranchingContext`].
#[derive(Debug, Clone)]
pub enum BcKind {
    Or(BcOr),
    Choose,
    Nn(BcNn),
    Le(BcLe),
    Barrier,
}

/// A single level's worth of branching state: which node/concept triggered
/// the branch, how far the rule has gotten through its alternatives, and
/// the bookkeeping needed to undo session-global side effects (the used-set
/// trail indices, the GCI-vector size) on backtrack.
#[derive(Debug, Clone)]
pub struct BranchingContext {
    cur_node: Option<NodeId>,
    cur_concept: Bp,
    p_used_index: usize,
    n_used_index: usize,
    sg_size: usize,
    branch_dep: DepSet,
    kind: BcKind,
}

impl BranchingContext {
    #[must_use]
    fn new(kind: BcKind) -> Self {
        BranchingContext {
            cur_node: None,
            cur_concept: INVALID,
            p_used_index: 0,
            n_used_index: 0,
            sg_size: 0,
            branch_dep: DepSet::empty(),
            kind,
        }
    }

    #[must_use]
    pub fn or_context() -> Self {
        BranchingContext::new(BcKind::Or(BcOr::default()))
    }

    #[must_use]
    pub fn choose_context() -> Self {
        BranchingContext::new(BcKind::Choose)
    }

    #[must_use]
    pub fn nn_context() -> Self {
        BranchingContext::new(BcKind::Nn(BcNn::default()))
    }

    #[must_use]
    pub fn le_context() -> Self {
        BranchingContext::new(BcKind::Le(BcLe::default()))
    }

    #[must_use]
    pub fn barrier_context() -> Self {
        BranchingContext::new(BcKind::Barrier)
    }

    /// Reset this context for reuse at a new branching level, recording the
    /// node/concept that's branching and the trail positions to roll back
    /// to if every alternative clashes.
    pub fn init(&mut self, node: NodeId, concept: &ConceptWDep, p_used_index: usize, n_used_index: usize, sg_size: usize) {
        self.cur_node = Some(node);
        self.cur_concept = concept.bp();
        self.p_used_index = p_used_index;
        self.n_used_index = n_used_index;
        self.sg_size = sg_size;
        self.branch_dep = DepSet::empty();
        match &mut self.kind {
            BcKind::Or(bc) => bc.init(),
            BcKind::Nn(bc) => bc.init(),
            BcKind::Le(bc) => bc.init(),
            BcKind::Choose | BcKind::Barrier => {}
        }
    }

    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        self.cur_node
    }

    #[must_use]
    pub fn concept(&self) -> Bp {
        self.cur_concept
    }

    #[must_use]
    pub fn p_used_index(&self) -> usize {
        self.p_used_index
    }

    #[must_use]
    pub fn n_used_index(&self) -> usize {
        self.n_used_index
    }

    #[must_use]
    pub fn sg_size(&self) -> usize {
        self.sg_size
    }

    #[must_use]
    pub fn branch_dep(&self) -> &DepSet {
        &self.branch_dep
    }

    pub fn add_branch_dep(&mut self, dep: &DepSet) {
        self.branch_dep.add(dep);
    }

    #[must_use]
    pub fn kind(&self) -> &BcKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut BcKind {
        &mut self.kind
    }

    #[must_use]
    pub fn as_or(&self) -> Option<&BcOr> {
        match &self.kind {
            BcKind::Or(bc) => Some(bc),
            _ => None,
        }
    }

    pub fn as_or_mut(&mut self) -> Option<&mut BcOr> {
        match &mut self.kind {
            BcKind::Or(bc) => Some(bc),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_nn(&self) -> Option<&BcNn> {
        match &self.kind {
            BcKind::Nn(bc) => Some(bc),
            _ => None,
        }
    }

    pub fn as_nn_mut(&mut self) -> Option<&mut BcNn> {
        match &mut self.kind {
            BcKind::Nn(bc) => Some(bc),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_le(&self) -> Option<&BcLe> {
        match &self.kind {
            BcKind::Le(bc) => Some(bc),
            _ => None,
        }
    }

    pub fn as_le_mut(&mut self) -> Option<&mut BcLe> {
        match &mut self.kind {
            BcKind::Le(bc) => Some(bc),
            _ => None,
        }
    }
}

/// A deleteless stack of [`BranchingContext`]s, one per currently-open
/// branching level — mirrors the way [`crate::graph::CompletionGraph`]
/// reuses node slots instead of freeing them on backtrack.
#[derive(Debug, Default)]
pub struct BranchingStack {
    contexts: Vec<BranchingContext>,
}

impl BranchingStack {
    #[must_use]
    pub fn new() -> Self {
        BranchingStack::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn push(&mut self, ctx: BranchingContext) {
        self.contexts.push(ctx);
    }

    #[must_use]
    pub fn top(&self) -> Option<&BranchingContext> {
        self.contexts.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut BranchingContext> {
        self.contexts.last_mut()
    }

    pub fn pop(&mut self) -> Option<BranchingContext> {
        self.contexts.pop()
    }

    /// Drop every context above `level` (a 1-based branching level, as used
    /// throughout the graph/ToDo save-stacks).
    pub fn truncate(&mut self, level: Level) {
        self.contexts.truncate(level as usize);
    }

    pub fn clear(&mut self) {
        self.contexts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn or_arg_starts_free_and_can_be_marked_tried() {
        let mut arg = OrArg::free(Bp::create(1, true));
        assert!(arg.is_free() && !arg.is_tried());
        arg.set_tried(DepSet::singleton(2));
        assert!(!arg.is_free() && arg.is_tried());
        assert!(arg.clash_reason().contains(2));
    }

    #[test]
    fn bc_or_counts_free_choices_and_detects_exhaustion() {
        let mut bc = BcOr::default();
        bc.init();
        bc.set_or_index(vec![
            OrArg::clashed(Bp::create(1, true), DepSet::singleton(1)),
            OrArg::free(Bp::create(2, true)),
        ]);
        assert!(!bc.no_more_options());
        bc.choose_free_option();
        assert!(bc.entries()[1].is_chosen());

        let mut exhausted = BcOr::default();
        exhausted.init();
        exhausted.set_or_index(vec![OrArg::clashed(Bp::create(1, true), DepSet::empty())]);
        assert!(exhausted.no_more_options());
    }

    #[test]
    fn bc_nn_counts_up_from_one() {
        let mut bc = BcNn::default();
        bc.init();
        assert_eq!(bc.value(), 1);
        assert!(!bc.no_more_options(1));
        bc.next_option();
        assert_eq!(bc.value(), 2);
        assert!(bc.no_more_options(1));
    }

    #[test]
    fn bc_le_walks_every_pair_before_exhausting() {
        let mut bc = BcLe::default();
        bc.init();
        let items: SmallVec<[EdgeId; 4]> = [EdgeId(0), EdgeId(1), EdgeId(2)].into_iter().collect();
        bc.set_items(items);
        let mut pairs = Vec::new();
        while !bc.no_more_options() {
            pairs.push((bc.from(), bc.to()));
            bc.next_option();
        }
        assert_eq!(pairs, vec![(EdgeId(2), EdgeId(0)), (EdgeId(1), EdgeId(0)), (EdgeId(2), EdgeId(1))]);
    }

    #[test]
    fn branching_stack_truncates_to_a_level() {
        let mut stack = BranchingStack::new();
        stack.push(BranchingContext::or_context());
        stack.push(BranchingContext::barrier_context());
        stack.push(BranchingContext::nn_context());
        assert_eq!(stack.len(), 3);
        stack.truncate(1);
        assert_eq!(stack.len(), 1);
        assert!(matches!(stack.top().unwrap().kind(), BcKind::Or(_)));
    }
}
