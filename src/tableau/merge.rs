//! Merging two completion-graph nodes into one: the o-rule (two nominal
//! labels turn out to name the same individual) and the `<= n` rule (too
//! many same-role neighbours, some must be identified) both bottom out
//! here.

use crate::bipointer::Bp;
use crate::dag::{ConceptDag, DagTag};
use crate::depset::DepSet;
use crate::graph::{NodeId, PurgeTrailEntry};

use super::{BlockingOracle, PurgeUndoRecord, Reasoner};

impl<'r, B: BlockingOracle> Reasoner<'r, B> {
    fn record_purge_trail(&mut self, entries: Vec<PurgeTrailEntry>) {
        let level = self.current_level();
        for e in entries {
            self.purge_trail.push(PurgeUndoRecord { level, node: e.node, prev_blocker: e.prev_blocker, prev_dep: e.prev_dep });
        }
    }

    /// Copy every concept in `from`'s label onto `to`'s, widening `to`'s
    /// existing entries rather than duplicating them — the concept-label
    /// half of a merge, shared by the actual `graph.merge` call below.
    fn copy_label_onto(&mut self, dag: &ConceptDag, from: NodeId, to: NodeId, dep: &DepSet) -> Option<DepSet> {
        let entries: Vec<(Bp, DepSet)> = self
            .graph
            .node(from)
            .label()
            .label(DagTag::PConcept)
            .iter()
            .chain(self.graph.node(from).label().label(DagTag::Forall).iter())
            .map(|c| (c.bp(), c.dep().clone()))
            .collect();
        for (bp, c_dep) in entries {
            let mut merged = c_dep;
            merged.add(dep);
            let tag = dag.get(bp).tag();
            if let Some(clash) = self.add_to_do_entry(dag, to, bp, merged, tag) {
                return Some(clash);
            }
        }
        None
    }

    /// Reapply every already-asserted `forall R.C` (plain or
    /// automaton-state) on `node` across a single `R`-edge into `target` —
    /// the per-edge slice of [`Reasoner::tactic_forall`], reused when a
    /// merge redirects an edge onto a node whose foralls `target` hasn't
    /// seen before.
    fn reapply_foralls_over_edge(
        &mut self,
        dag: &ConceptDag,
        node: NodeId,
        edge_role: crate::role::RoleId,
        target: NodeId,
    ) -> Option<DepSet> {
        let foralls: Vec<crate::label::ConceptWDep> = self.graph.node(node).label().label(DagTag::Forall).iter().cloned().collect();
        for c in foralls {
            if dag.get(c.bp()).tag() != DagTag::Forall {
                continue;
            }
            let v = dag.get(c.bp());
            let Some(role) = v.role() else { continue };
            if !self.role_matches(edge_role, role) {
                continue;
            }
            let filler = v.get_c();
            let state = v.get_state();
            let dep = c.dep().clone();
            if state == 0 {
                let tag = dag.get(filler).tag();
                if let Some(clash) = self.add_to_do_entry(dag, target, filler, dep, tag) {
                    return Some(clash);
                }
                continue;
            }
            let automaton = self.roles.get(role).automaton();
            let trans = automaton.state(state);
            for t in trans.transitions() {
                if !t.roles().iter().any(|&r| self.role_matches(edge_role, r)) {
                    continue;
                }
                if t.final_state() == automaton.final_state() {
                    let tag = dag.get(filler).tag();
                    if let Some(clash) = self.add_to_do_entry(dag, target, filler, dep.clone(), tag) {
                        return Some(clash);
                    }
                } else {
                    let next = super::dag_forall_state(dag, role, filler, t.final_state());
                    let tag = dag.get(next).tag();
                    if let Some(clash) = self.add_to_do_entry(dag, target, next, dep.clone(), tag) {
                        return Some(clash);
                    }
                }
            }
        }
        None
    }

    /// Merge `a` and `b` (order irrelevant to the caller: a nominal node
    /// always survives over a blockable one, mirroring the original's
    /// "named individuals never get purged" invariant) into a single node,
    /// under `dep`. Returns the clash dep-set if the merge itself — or
    /// anything it reapplies — turns out unsatisfiable.
    pub(super) fn merge_nodes(&mut self, dag: &ConceptDag, a: NodeId, b: NodeId, dep: DepSet) -> Option<DepSet> {
        let a = self.graph.resolve_purged(a);
        let b = self.graph.resolve_purged(b);
        if a == b {
            return None;
        }

        if let Some(ineq_dep) = self.ineq.known_different(a, b) {
            let mut clash = dep;
            clash.add(&ineq_dep);
            return Some(clash);
        }

        // A nominal node is never the one purged away; if neither or both
        // are nominal, keep the caller's own ordering.
        let (from, to) = if self.graph.node(a).is_nominal() && !self.graph.node(b).is_nominal() {
            (b, a)
        } else {
            (a, b)
        };

        if let Some(clash) = self.copy_label_onto(dag, from, to, &dep) {
            return Some(clash);
        }

        let (moved_edges, purge_trail) = self.graph.merge(from, to, self.roles, dep.clone());
        self.record_purge_trail(purge_trail);

        for edge_id in moved_edges {
            let edge = self.graph.edge(edge_id);
            let target = edge.target();
            let role = edge.role();
            self.blocking.update_after_edge_change(&self.graph, to, target);
            if let Some(role) = role {
                if let Some(clash) = self.reapply_foralls_over_edge(dag, to, role, target) {
                    return Some(clash);
                }
            }
        }

        self.blocking.update_after_label_change(&self.graph, to);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::absorption::Absorber;
    use crate::bipointer::TOP;
    use crate::data_reasoner::NullDataReasoner;
    use crate::depset::DepSet;
    use crate::role::RoleMaster;
    use crate::tableau::{CancellationToken, NoBlocking, Reasoner};
    use crate::todo::PriorityMatrix;

    fn fresh_reasoner<'r>(roles: &'r RoleMaster, absorber: &'r Absorber) -> Reasoner<'r, NoBlocking> {
        Reasoner::new(
            roles,
            absorber,
            PriorityMatrix::default(),
            true,
            Box::new(NullDataReasoner::new()),
            NoBlocking,
            CancellationToken::new(),
            None,
        )
    }

    #[test]
    fn merging_a_node_into_itself_is_a_no_op() {
        let roles = RoleMaster::new();
        let absorber = Absorber::new();
        let mut reasoner = fresh_reasoner(&roles, &absorber);
        let dag = ConceptDag::new();
        reasoner.check_consistency(&dag, TOP).unwrap();
        let root = reasoner.graph().actual_root();
        assert!(reasoner.merge_nodes(&dag, root, root, DepSet::empty()).is_none());
    }

    #[test]
    fn merging_two_fresh_neighbours_unions_their_labels() {
        let mut roles = RoleMaster::new();
        let r = roles.ensure_role("r", false);
        roles.finish_construction().unwrap();
        let absorber = Absorber::new();
        let mut reasoner = fresh_reasoner(&roles, &absorber);
        let mut dag = ConceptDag::new();
        let a = dag.add_named(DagTag::PConcept, crate::dag::NamedEntryId(0));
        let b = dag.add_named(DagTag::PConcept, crate::dag::NamedEntryId(1));
        let some_a = dag.get_forall(Some(r), a, 0).inverse();
        let some_b = dag.get_forall(Some(r), b, 0).inverse();
        let conj = dag.get_and([some_a, some_b], false);
        reasoner.check_consistency(&dag, conj).unwrap();

        let root = reasoner.graph().actual_root();
        let children: Vec<_> = reasoner.graph().node(root).children().to_vec();
        assert_eq!(children.len(), 2);
        let n1 = reasoner.graph().edge(children[0]).target();
        let n2 = reasoner.graph().edge(children[1]).target();

        let clash = reasoner.merge_nodes(&dag, n1, n2, DepSet::empty());
        assert!(clash.is_none());
        let survivor = reasoner.graph().resolve_purged(n1);
        assert!(reasoner.graph().node(survivor).label().contains(a));
        assert!(reasoner.graph().node(survivor).label().contains(b));
    }

    #[test]
    fn merging_known_different_nodes_clashes() {
        let roles = RoleMaster::new();
        let absorber = Absorber::new();
        let mut reasoner = fresh_reasoner(&roles, &absorber);
        let dag = ConceptDag::new();
        reasoner.check_consistency(&dag, TOP).unwrap();
        let a = reasoner.graph.new_node();
        let b = reasoner.graph.new_node();
        reasoner.ineq.record(a, b, DepSet::singleton(1));
        let clash = reasoner.merge_nodes(&dag, a, b, DepSet::singleton(2));
        let dep = clash.expect("known-different nodes must clash");
        assert!(dep.contains(1));
        assert!(dep.contains(2));
    }
}
