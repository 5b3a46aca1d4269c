//! Backjumping: given a clash's dependency set, pop every open branch point
//! the clash doesn't actually depend on, then either retry the first
//! relevant one with its next untried alternative or, once every branch
//! point is exhausted, report the clash as global (the tested concept is
//! genuinely unsatisfiable).

use crate::bipointer::Bp;
use crate::branching::BcKind;
use crate::dag::ConceptDag;
use crate::depset::{DepSet, Level};
use crate::graph::EdgeId;

use super::{BlockingOracle, Reasoner};

/// What [`Reasoner::backtrack`] found.
#[derive(Debug, Clone)]
pub enum BacktrackOutcome {
    /// A branch point was retried with a fresh alternative; the ToDo loop
    /// should resume processing.
    Backjumped,
    /// Every open branch point is exhausted (or none ever depended on the
    /// clash): `.0` is the accumulated dep-set behind the unconditional clash.
    GlobalClash(DepSet),
}

/// The alternative [`Reasoner::retry_top`] picked for the topmost branch
/// point, not yet acted on.
enum RetryChoice {
    Or(Bp),
    Le(EdgeId, EdgeId),
}

/// What trying the topmost branch point's next alternative led to.
enum RetryResult {
    /// A fresh alternative was pushed with no immediate clash.
    Resumed,
    /// A fresh alternative was tried but clashed immediately; `.0` folds
    /// into the running dep-set and the same level is retried again.
    Clashed(DepSet),
    /// Every alternative at this level has been tried.
    Exhausted,
}

impl<'r, B: BlockingOracle> Reasoner<'r, B> {
    /// Undo the current level's work, then ask the topmost branch point for
    /// its next alternative (if any) and act on it immediately.
    fn retry_top(&mut self, dag: &ConceptDag, level: Level) -> RetryResult {
        let node = self
            .branching
            .top()
            .and_then(|ctx| ctx.node())
            .expect("every branch context records the node it branched on");

        let choice = {
            let ctx = self.branching.top_mut().expect("checked non-empty by the caller");
            match ctx.kind_mut() {
                BcKind::Or(bc) => {
                    bc.next_option();
                    if bc.is_exhausted() {
                        None
                    } else {
                        Some(RetryChoice::Or(bc.current().concept()))
                    }
                }
                BcKind::Le(bc) => {
                    bc.next_option();
                    if bc.no_more_options() {
                        None
                    } else {
                        Some(RetryChoice::Le(bc.from(), bc.to()))
                    }
                }
                // Barrier/Choose/Nn branch points mark a save point without
                // offering an alternative to retry — a clash under one of
                // them always backjumps straight past it.
                BcKind::Nn(_) | BcKind::Choose | BcKind::Barrier => None,
            }
        };

        let Some(choice) = choice else {
            return RetryResult::Exhausted;
        };

        let dep = DepSet::singleton(level);
        match choice {
            RetryChoice::Or(bp) => {
                let tag = dag.get(bp).tag();
                match self.add_to_do_entry(dag, node, bp, dep, tag) {
                    Some(clash) => RetryResult::Clashed(clash),
                    None => RetryResult::Resumed,
                }
            }
            RetryChoice::Le(from_edge, to_edge) => {
                let from = self.graph.edge(from_edge).target();
                let to = self.graph.edge(to_edge).target();
                match self.merge_nodes(dag, from, to, dep) {
                    Some(clash) => RetryResult::Clashed(clash),
                    None => RetryResult::Resumed,
                }
            }
        }
    }

    /// Resolve a clash found under `dep`: pop branch points the clash
    /// doesn't depend on, then retry the first one that matters. Each
    /// retried alternative that itself clashes immediately is folded into
    /// `dep` and the same level tried again before giving up on it.
    pub(super) fn backtrack(&mut self, dag: &ConceptDag, mut dep: DepSet) -> BacktrackOutcome {
        loop {
            if self.branching.is_empty() {
                return BacktrackOutcome::GlobalClash(dep);
            }
            let level = self.branching.len() as Level;

            if !dep.contains(level) {
                // nothing in the clash came from this level's choice —
                // skip it without trying any of its alternatives.
                self.branching.pop();
                self.backtrack_to(level - 1);
                continue;
            }

            loop {
                self.backtrack_to(level);
                match self.retry_top(dag, level) {
                    RetryResult::Resumed => return BacktrackOutcome::Backjumped,
                    RetryResult::Clashed(d) => {
                        dep.add(&d);
                        continue;
                    }
                    RetryResult::Exhausted => break,
                }
            }

            let ctx = self.branching.pop().expect("checked non-empty above");
            dep.add(ctx.branch_dep());
            self.backtrack_to(level - 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::absorption::Absorber;
    use crate::bipointer::TOP;
    use crate::dag::{ConceptDag, DagTag, NamedEntryId};
    use crate::data_reasoner::NullDataReasoner;
    use crate::role::RoleMaster;
    use crate::tableau::{CancellationToken, NoBlocking, Reasoner, TacticOutcome};
    use crate::todo::PriorityMatrix;

    fn fresh_reasoner<'r>(roles: &'r RoleMaster, absorber: &'r Absorber) -> Reasoner<'r, NoBlocking> {
        Reasoner::new(
            roles,
            absorber,
            PriorityMatrix::default(),
            false,
            Box::new(NullDataReasoner::new()),
            NoBlocking,
            CancellationToken::new(),
            None,
        )
    }

    #[test]
    fn exhausting_every_disjunct_backjumps_to_an_unconditional_clash() {
        let roles = RoleMaster::new();
        let absorber = Absorber::new();
        let mut reasoner = fresh_reasoner(&roles, &absorber);
        let mut dag = ConceptDag::new();
        let a = dag.add_named(DagTag::PConcept, NamedEntryId(0));
        let b = dag.add_named(DagTag::PConcept, NamedEntryId(1));
        // Both disjuncts are internally contradictory, but only once their
        // own `And` tactic unfolds them -- neither is ruled out when `Or`
        // first picks a branch, so resolving this needs a real retry.
        let d1 = dag.get_and([a, a.inverse()], false);
        let d2 = dag.get_and([b, b.inverse()], false);
        let or_vertex = dag.get_and([d1.inverse(), d2.inverse()], false).inverse();
        let outcome = reasoner.check_consistency(&dag, or_vertex).unwrap();
        assert!(matches!(outcome, TacticOutcome::Clash(_)));
        assert!(reasoner.stats().backjumps >= 1);
    }

    #[test]
    fn a_disjunction_with_one_satisfiable_branch_finds_it() {
        let roles = RoleMaster::new();
        let absorber = Absorber::new();
        let mut reasoner = fresh_reasoner(&roles, &absorber);
        let mut dag = ConceptDag::new();
        let a = dag.add_named(DagTag::PConcept, NamedEntryId(0));
        let b = dag.add_named(DagTag::PConcept, NamedEntryId(1));
        // The first disjunct is self-contradictory (forces a retry); the
        // second is just `b`, which survives.
        let d1 = dag.get_and([a, a.inverse()], false);
        let or_vertex = dag.get_and([d1.inverse(), b.inverse()], false).inverse();
        let outcome = reasoner.check_consistency(&dag, or_vertex).unwrap();
        assert!(matches!(outcome, TacticOutcome::Done));
        let root = reasoner.graph().actual_root();
        assert!(reasoner.graph().node(root).label().contains(b));
        assert_eq!(reasoner.stats().backjumps, 1);
    }
}
