//! The blocking engine: decides when a blockable node's subtree can stop
//! expanding because some other node already stands in for the same part
//! of a model.
//!
//! Kept as a separate module implementing `crate::tableau::BlockingOracle`
//! rather than folded into `tableau::Reasoner` directly, since it inspects
//! the completion graph the tableau builds while the tableau, in turn,
//! needs to call into it — the trait boundary is the only way to let the
//! two depend on each other without a cycle.

use tracing::warn;

use crate::depset::Level;
use crate::graph::{CompletionGraph, NodeId};
use crate::role::RoleMaster;
use crate::tableau::BlockingOracle;

/// Which blocking condition `Engine::blocks` tests, chosen once up front
/// from the logic features a KB actually uses — a weaker condition is
/// cheaper to test and still complete for a logic that doesn't need the
/// stronger one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockingMode {
    /// `SH`: `label(x) ⊆ label(y)`.
    Subset,
    /// `SHI`: subset in both directions (inverse roles let a blocked
    /// node's ancestor be reached back from it, so one-way subset alone
    /// isn't sound).
    Equality,
    /// `SHIQ` (Motik–Horrocks): `Subset` plus the B2–B6 successor/parent
    /// conditions qualified number restrictions need.
    OptimisedDouble,
}

impl BlockingMode {
    /// Pick the cheapest sound mode for a KB with the given features.
    #[must_use]
    pub fn select(has_inverse_roles: bool, has_qualified_cardinality: bool) -> Self {
        if has_inverse_roles && has_qualified_cardinality {
            BlockingMode::OptimisedDouble
        } else if has_inverse_roles {
            BlockingMode::Equality
        } else {
            BlockingMode::Subset
        }
    }
}

/// Where a candidate blocker is looked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStrategy {
    /// Walk up `x`'s own parent chain only.
    Ancestor,
    /// Scan every earlier node in id order.
    Anywhere,
}


/// When a label change triggers a fresh blocking decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Recompute immediately on every concept added to a label.
    Eager,
    /// Only mark the node affected; the actual recheck happens the next
    /// time the ToDo table drains and `recheck_all` runs.
    Lazy,
}

/// Per-rule attempt/failure counters, one pair per blocking condition —
/// `B1` is the shared subset test, `B2..B6` only fire under
/// [`BlockingMode::OptimisedDouble`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockingStats {
    pub b1_attempts: u64,
    pub b1_failures: u64,
    pub b2_attempts: u64,
    pub b2_failures: u64,
    pub b3_attempts: u64,
    pub b3_failures: u64,
    pub b4_attempts: u64,
    pub b4_failures: u64,
    pub b5_attempts: u64,
    pub b5_failures: u64,
    pub b6_attempts: u64,
    pub b6_failures: u64,
    pub ancestor_searches: u64,
    pub anywhere_searches: u64,
    pub blocks_set: u64,
    pub unblocks: u64,
}

/// One undone-on-backtrack change to a node's `d_blocker`/`i_blocker`,
/// tagged with the branching level the node's other rare state was at
/// when the change happened (`Node::cur_level`, the same granularity
/// `graph`'s own save/restore trail already tracks per node).
#[derive(Debug, Clone, Copy)]
enum RestoreEntry {
    Direct { node: NodeId, prev: Option<NodeId>, level: u32 },
    Indirect { node: NodeId, prev: Option<NodeId>, level: u32 },
}

impl RestoreEntry {
    fn level(&self) -> u32 {
        match *self {
            RestoreEntry::Direct { level, .. } | RestoreEntry::Indirect { level, .. } => level,
        }
    }
}

/// Decides blocking status for the tableau, implementing
/// [`BlockingOracle`]. One `Engine` is built once per reasoning session
/// (it has no per-run state worth resetting between `check_consistency`
/// calls beyond what `Reasoner::reset` already clears through a fresh
/// `CompletionGraph`).
#[derive(Debug)]
pub struct Engine {
    mode: BlockingMode,
    search: SearchStrategy,
    trigger: Trigger,
    stats: BlockingStats,
    trail: Vec<RestoreEntry>,
}

impl Engine {
    /// `needs_nn_rule` forces `Anywhere` down to `Ancestor` for the whole
    /// session (the NN-rule's fairness argument doesn't hold under
    /// anywhere blocking), the same session-wide degrade-on-condition
    /// shape `ConceptDag::sorted_reasoning_enabled` uses.
    #[must_use]
    pub fn new(mode: BlockingMode, search: SearchStrategy, trigger: Trigger, needs_nn_rule: bool) -> Self {
        let search = if needs_nn_rule && search == SearchStrategy::Anywhere {
            warn!("anywhere blocking disabled: session requires the NN-rule");
            SearchStrategy::Ancestor
        } else {
            search
        };
        Engine {
            mode,
            search,
            trigger,
            stats: BlockingStats::default(),
            trail: Vec::new(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> BlockingStats {
        self.stats
    }

    #[must_use]
    pub fn trigger(&self) -> Trigger {
        self.trigger
    }

    fn record_direct(&mut self, graph: &CompletionGraph, node: NodeId, prev: Option<NodeId>) {
        self.trail.push(RestoreEntry::Direct { node, prev, level: graph.node(node).cur_level() });
    }

    fn record_indirect(&mut self, graph: &CompletionGraph, node: NodeId, prev: Option<NodeId>) {
        self.trail.push(RestoreEntry::Indirect { node, prev, level: graph.node(node).cur_level() });
    }

    /// B1: `label(x) ⊆ label(y)`. The shared entry condition for every mode.
    fn b1(&mut self, graph: &CompletionGraph, x: NodeId, y: NodeId) -> bool {
        self.stats.b1_attempts += 1;
        let ok = graph.node(x).label().is_subset_of(graph.node(y).label());
        if !ok {
            self.stats.b1_failures += 1;
        }
        ok
    }

    /// B2: every `\forall S.C` asserted on `y` already shows up on each of
    /// `y`'s own `S`-successors — a precondition on the *candidate blocker*
    /// itself, independent of which node it ends up blocking.
    fn b2(&mut self, dag: &crate::dag::ConceptDag, graph: &CompletionGraph, roles: &RoleMaster, y: NodeId) -> bool {
        self.stats.b2_attempts += 1;
        let foralls: Vec<_> = graph.node(y).label().label(crate::dag::DagTag::Forall).iter().cloned().collect();
        for c in &foralls {
            let v = dag.get(c.bp());
            if v.tag() != crate::dag::DagTag::Forall {
                continue;
            }
            let Some(role) = v.role() else { continue };
            let filler = v.get_c();
            for &edge in graph.node(y).children() {
                let e = graph.edge(edge);
                if e.is_i_blocked() || !e.is_neighbour(role, roles) {
                    continue;
                }
                if !graph.node(e.target()).label().contains(filler) {
                    self.stats.b2_failures += 1;
                    return false;
                }
            }
        }
        true
    }

    /// B3/B4 and their dual B5/B6: the Motik–Horrocks parent-pair check —
    /// `x`'s own parent's label restricted to number restrictions must
    /// agree with `y`'s parent's, in both directions, since a qualified
    /// `<= n`/`>= n` on the parent constrains how many successors can be
    /// collapsed onto a blocker.
    fn b3_through_b6(&mut self, graph: &CompletionGraph, x: NodeId, y: NodeId) -> bool {
        let Some(&x_parent_edge) = graph.node(x).parents().first() else { return true };
        let Some(&y_parent_edge) = graph.node(y).parents().first() else { return true };
        let x_parent = graph.edge(x_parent_edge).target();
        let y_parent = graph.edge(y_parent_edge).target();

        self.stats.b3_attempts += 1;
        self.stats.b5_attempts += 1;
        let forward = graph.node(x_parent).label().label(crate::dag::DagTag::Le).is_subset_of(graph.node(y_parent).label().label(crate::dag::DagTag::Le));
        if !forward {
            self.stats.b3_failures += 1;
        }

        self.stats.b4_attempts += 1;
        self.stats.b6_attempts += 1;
        let backward = graph.node(y_parent).label().label(crate::dag::DagTag::Le).is_subset_of(graph.node(x_parent).label().label(crate::dag::DagTag::Le));
        if !backward {
            self.stats.b4_failures += 1;
        }

        forward && backward
    }

    /// `true` iff `y` may block `x` under the configured mode.
    fn blocks(&mut self, dag: &crate::dag::ConceptDag, graph: &CompletionGraph, roles: &RoleMaster, x: NodeId, y: NodeId) -> bool {
        if !self.b1(graph, x, y) {
            return false;
        }
        match self.mode {
            BlockingMode::Subset => true,
            BlockingMode::Equality => graph.node(y).label().is_subset_of(graph.node(x).label()),
            BlockingMode::OptimisedDouble => {
                self.b2(dag, graph, roles, y) && graph.node(y).label().is_subset_of(graph.node(x).label()) && self.b3_through_b6(graph, x, y)
            }
        }
    }

    /// Search candidate blockers for `x`, per [`SearchStrategy`].
    fn find_blocker(&mut self, dag: &crate::dag::ConceptDag, graph: &CompletionGraph, roles: &RoleMaster, x: NodeId) -> Option<NodeId> {
        match self.search {
            SearchStrategy::Ancestor => {
                self.stats.ancestor_searches += 1;
                let mut cur = x;
                while let Some(&parent_edge) = graph.node(cur).parents().first() {
                    let y = graph.edge(parent_edge).target();
                    if y == x {
                        break;
                    }
                    if graph.node(y).is_blockable() && self.blocks(dag, graph, roles, x, y) {
                        return Some(y);
                    }
                    cur = y;
                }
                None
            }
            SearchStrategy::Anywhere => {
                self.stats.anywhere_searches += 1;
                for idx in 0..x.0 {
                    let y = NodeId(idx);
                    if y.0 < graph.len() as u32 && graph.node(y).is_blockable() && self.blocks(dag, graph, roles, x, y) {
                        return Some(y);
                    }
                }
                None
            }
        }
    }

    /// Propagate `set_i_blocked` from a freshly `d`-blocked node onto every
    /// non-i-blocked successor, recording each change for undo.
    fn propagate_i_blocked(&mut self, graph: &mut CompletionGraph, node: NodeId, blocker: NodeId) {
        let children: Vec<_> = graph.node(node).children().to_vec();
        for edge in children {
            if graph.edge(edge).is_i_blocked() {
                continue;
            }
            let target = graph.edge(edge).target();
            if graph.node(target).is_i_blocked() {
                continue;
            }
            let prev = graph.node_mut(target).set_i_blocked(Some(blocker));
            self.record_indirect(graph, target, prev);
            self.propagate_i_blocked(graph, target, blocker);
        }
    }

    fn set_blocked(&mut self, graph: &mut CompletionGraph, node: NodeId, blocker: NodeId) {
        let prev = graph.node_mut(node).set_d_blocked(Some(blocker));
        if prev != Some(blocker) {
            self.record_direct(graph, node, prev);
            self.stats.blocks_set += 1;
            self.propagate_i_blocked(graph, node, blocker);
        }
    }

    /// Clear `node`'s own direct blocker (not its propagated i-blocks,
    /// which `recheck_all`'s own sweep re-derives from scratch) and mark
    /// it affected so [`crate::tableau::Reasoner::requeue_unblocked`]'s
    /// sweep picks its generating rules back up.
    fn unblock(&mut self, graph: &mut CompletionGraph, node: NodeId) {
        let prev = graph.node_mut(node).set_d_blocked(None);
        if prev.is_some() {
            self.record_direct(graph, node, prev);
            self.stats.unblocks += 1;
            graph.mark_affected_recursive(node);
        }
    }
}

impl BlockingOracle for Engine {
    fn update_after_label_change(&mut self, graph: &CompletionGraph, node: NodeId) {
        let _ = (graph, node);
        // Eager mode would re-run detection straight from here, but doing
        // so needs `&mut CompletionGraph` and the DAG this trait method
        // doesn't carry; both modes converge on the same decision once
        // `recheck_all` runs, lazy just defers it. See `Trigger`'s doc
        // comment.
    }

    fn update_after_edge_change(&mut self, graph: &CompletionGraph, from: NodeId, to: NodeId) {
        let _ = (graph, from, to);
    }

    fn recheck_all(&mut self, graph: &mut CompletionGraph, roles: &RoleMaster, dag: &crate::dag::ConceptDag) -> bool {
        let mut changed = false;
        let live = graph.len();

        // First drop any blocker that no longer holds -- a backtrack can
        // shrink a label the blocking decision depended on.
        for idx in 0..live {
            let node = NodeId(idx as u32);
            let Some(blocker) = graph.node(node).d_blocker() else { continue };
            if !self.blocks(dag, graph, roles, node, blocker) {
                self.unblock(graph, node);
                changed = true;
            }
        }

        // Then look for new blocks among whatever is still unblocked.
        for idx in 0..live {
            let node = NodeId(idx as u32);
            if graph.node(node).is_blocked() || !graph.node(node).is_blockable() {
                continue;
            }
            if let Some(blocker) = self.find_blocker(dag, graph, roles, node) {
                self.set_blocked(graph, node, blocker);
                changed = true;
            }
        }

        changed
    }

    fn restore(&mut self, graph: &mut CompletionGraph, level: Level) {
        while let Some(top) = self.trail.last() {
            if top.level() <= level {
                break;
            }
            match self.trail.pop().expect("just peeked") {
                RestoreEntry::Direct { node, prev, .. } => {
                    graph.node_mut(node).set_d_blocked(prev);
                }
                RestoreEntry::Indirect { node, prev, .. } => {
                    graph.node_mut(node).set_i_blocked(prev);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::{ConceptDag, DagTag, NamedEntryId};
    use crate::depset::DepSet;
    use crate::graph::CompletionGraph;
    use crate::label::ConceptWDep;
    use crate::role::RoleMaster;

    #[test]
    fn select_picks_the_cheapest_sound_mode() {
        assert_eq!(BlockingMode::select(false, false), BlockingMode::Subset);
        assert_eq!(BlockingMode::select(true, false), BlockingMode::Equality);
        assert_eq!(BlockingMode::select(true, true), BlockingMode::OptimisedDouble);
        assert_eq!(BlockingMode::select(false, true), BlockingMode::Subset);
    }

    #[test]
    fn subset_blocking_blocks_a_node_whose_label_an_ancestor_already_covers() {
        let mut roles = RoleMaster::new();
        let role = roles.ensure_role("r", false);
        let mut graph = CompletionGraph::new();
        let mut dag = ConceptDag::new();
        let a = dag.add_named(DagTag::PConcept, NamedEntryId(0));

        let ancestor = graph.new_node();
        graph.add_concept(ancestor, ConceptWDep::new(a, DepSet::empty()), DagTag::PConcept);
        let child = graph.new_node();
        graph.add_concept(child, ConceptWDep::new(a, DepSet::empty()), DagTag::PConcept);
        graph.add_role_label(child, ancestor, true, role, &roles, DepSet::empty());

        let mut engine = Engine::new(BlockingMode::Subset, SearchStrategy::Ancestor, Trigger::Lazy, false);
        let changed = engine.recheck_all(&mut graph, &roles, &dag);

        assert!(changed);
        assert_eq!(graph.node(child).d_blocker(), Some(ancestor));
        assert_eq!(engine.stats().blocks_set, 1);
    }

    #[test]
    fn restore_reverts_blocks_recorded_past_the_requested_level() {
        let mut roles = RoleMaster::new();
        let role = roles.ensure_role("r", false);
        let mut graph = CompletionGraph::new();
        let mut dag = ConceptDag::new();
        let a = dag.add_named(DagTag::PConcept, NamedEntryId(0));

        let ancestor = graph.new_node();
        graph.add_concept(ancestor, ConceptWDep::new(a, DepSet::empty()), DagTag::PConcept);
        let base_level = graph.node(ancestor).cur_level();

        // Simulate having branched once before the child (and its block)
        // ever showed up, so restoring past that branch point should undo it.
        graph.save();
        let child = graph.new_node();
        graph.add_concept(child, ConceptWDep::new(a, DepSet::empty()), DagTag::PConcept);
        graph.add_role_label(child, ancestor, true, role, &roles, DepSet::empty());

        let mut engine = Engine::new(BlockingMode::Subset, SearchStrategy::Ancestor, Trigger::Lazy, false);
        engine.recheck_all(&mut graph, &roles, &dag);
        assert!(graph.node(child).d_blocker().is_some());

        engine.restore(&mut graph, base_level);
        assert_eq!(graph.node(child).d_blocker(), None);
    }

    #[test]
    fn anywhere_blocking_is_forced_to_ancestor_when_the_nn_rule_is_needed() {
        let engine = Engine::new(BlockingMode::Subset, SearchStrategy::Anywhere, Trigger::Lazy, true);
        assert_eq!(engine.search, SearchStrategy::Ancestor);
    }
}
