//! The cascaded cache builder: walks a DAG vertex's definition before
//! running a full satisfiability check on it, so every concept a
//! satisfiability test for `p` would need a cache for already has one by
//! the time the test runs.
//!
//! "Cascaded" because caching a named concept cascades into caching its
//! definition, caching a `forall R.C` cascades into caching `C`, and so on
//! — with a cycle guard so a concept that (indirectly) mentions itself
//! doesn't recurse forever.

use smallvec::SmallVec;

use crate::bipointer::{Bp, TOP};
use crate::cache::ModelCache;
use crate::dag::{ConceptDag, DagTag};
use crate::role::RoleMaster;
use std::sync::Arc;

/// Runs a full tableau satisfiability check on `p` and derives a model
/// cache from the result — [`crate::tableau::Reasoner`] is the only
/// implementor. Kept as a trait so this module doesn't need to depend on
/// the tableau (which, in turn, calls back into this builder).
///
/// `dag` is threaded through explicitly rather than held by the
/// implementor: a `Reasoner` that cached its own `&mut ConceptDag` field
/// would alias the `&mut ConceptDag` [`CascadedCacheBuilder::get_cache`]
/// already holds for its own bookkeeping the moment a cascade recurses
/// into a sibling's satisfiability test.
pub trait SatChecker {
    fn check_sat(&mut self, dag: &mut ConceptDag, p: Bp) -> Arc<dyn ModelCache>;
}

/// Builds model caches over a [`ConceptDag`], recursively ensuring a
/// vertex's dependencies are cached before running a SAT test on it.
pub struct CascadedCacheBuilder<'r> {
    roles: &'r RoleMaster,
}

impl<'r> CascadedCacheBuilder<'r> {
    #[must_use]
    pub fn new(roles: &'r RoleMaster) -> Self {
        CascadedCacheBuilder { roles }
    }

    /// Get (building if necessary) the cache for `p`.
    pub fn get_cache(&mut self, dag: &mut ConceptDag, p: Bp, sat: &mut dyn SatChecker) -> Arc<dyn ModelCache> {
        debug_assert!(p.is_valid());
        if let Some(c) = dag.get_cache(p) {
            return Arc::clone(c);
        }

        self.prepare(dag, p, sat);

        // a cycle may have caused `p`'s own cache to be filled in while
        // preparing one of its dependents.
        if let Some(c) = dag.get_cache(p) {
            return Arc::clone(c);
        }

        let cache = sat.check_sat(dag, p);
        dag.set_cache(p, Arc::clone(&cache));
        cache
    }

    /// Ensure every cache `p`'s own satisfiability test would need already
    /// exists, recursing into `p`'s definition.
    fn prepare(&mut self, dag: &mut ConceptDag, p: Bp, sat: &mut dyn SatChecker) {
        let positive = p.is_positive();

        if dag.get(p).is_visited(positive) {
            // back-edge: `p` is already being prepared higher up this same
            // walk. Leave it be — the caller that's already expanding it
            // will finish the job, and the top-level `get_cache` for
            // whichever vertex asked for `p` will still run its own SAT
            // test once preparation unwinds.
            dag.get_mut(p).set_in_cycle(positive);
            return;
        }
        if dag.get_cache(p).is_some() {
            return;
        }

        match dag.get(p).tag() {
            DagTag::Top | DagTag::DataType | DagTag::DataValue | DagTag::DataExpr | DagTag::Irr => {}

            DagTag::And | DagTag::Collection => {
                let children: SmallVec<[Bp; 8]> =
                    dag.get(p).children().iter().map(|&c| if positive { c } else { c.inverse() }).collect();
                for c in children {
                    self.prepare(dag, c, sat);
                }
            }

            DagTag::PConcept | DagTag::NConcept | DagTag::PSingleton | DagTag::NSingleton => {
                if !positive && dag.get(p).tag().is_primitive_name() {
                    return;
                }
                // A bare named concept (no told definition recorded as a
                // DAG child) has nothing further to cascade into.
                let Some(&c) = dag.get(p).children().first() else {
                    return;
                };
                dag.get_mut(p).set_visited(positive);
                let target = if positive { c } else { c.inverse() };
                self.prepare(dag, target, sat);
                dag.get_mut(p).set_processed(positive);
            }

            DagTag::Forall | DagTag::Le => {
                if let Some(role_id) = dag.get(p).role() {
                    if self.roles.get(role_id).is_data_role() {
                        return;
                    }
                }
                let c = dag.get(p).get_c();
                let x = if positive { c } else { c.inverse() };
                if x != TOP {
                    dag.get_mut(p).set_visited(positive);
                    self.get_cache(dag, x, sat);
                    dag.get_mut(p).set_processed(positive);
                }
            }

            DagTag::UAll => {
                let c = dag.get(p).get_c();
                let x = if positive { c } else { c.inverse() };
                if x != TOP {
                    dag.get_mut(p).set_visited(positive);
                    self.get_cache(dag, x, sat);
                    dag.get_mut(p).set_processed(positive);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ConstCache;
    use crate::dag::DagVertex;
    use crate::role::RoleMaster;

    struct StubSat {
        calls: Vec<Bp>,
    }

    impl SatChecker for StubSat {
        fn check_sat(&mut self, _dag: &mut ConceptDag, p: Bp) -> Arc<dyn ModelCache> {
            self.calls.push(p);
            Arc::new(ConstCache::new(crate::bipointer::TOP))
        }
    }

    #[test]
    fn get_cache_runs_sat_once_and_memoises() {
        let mut dag = ConceptDag::new();
        let p = dag.add(DagVertex::conjunction(false));
        let roles = RoleMaster::new();
        let mut builder = CascadedCacheBuilder::new(&roles);
        let mut sat = StubSat { calls: Vec::new() };

        let c1 = builder.get_cache(&mut dag, p, &mut sat);
        let c2 = builder.get_cache(&mut dag, p, &mut sat);
        assert_eq!(sat.calls.len(), 1);
        assert!(Arc::ptr_eq(&c1, &c2));
    }

    #[test]
    fn and_cascades_into_its_children_before_running_sat() {
        let mut dag = ConceptDag::new();
        let mut conj = DagVertex::conjunction(false);
        conj.add_child(Bp::create(1, true)); // TOP, absorbed silently
        let and_bp = dag.add(conj);
        let roles = RoleMaster::new();
        let mut builder = CascadedCacheBuilder::new(&roles);
        let mut sat = StubSat { calls: Vec::new() };

        builder.get_cache(&mut dag, and_bp, &mut sat);
        assert_eq!(sat.calls, vec![and_bp]);
    }

    #[test]
    fn bare_named_concept_has_nothing_to_cascade_into() {
        let mut dag = ConceptDag::new();
        let p = dag.add(DagVertex::named(DagTag::PConcept, crate::dag::NamedEntryId(0)));
        let roles = RoleMaster::new();
        let mut builder = CascadedCacheBuilder::new(&roles);
        let mut sat = StubSat { calls: Vec::new() };

        let cache = builder.get_cache(&mut dag, p, &mut sat);
        assert_eq!(sat.calls, vec![p]);
        assert_eq!(cache.state(), crate::cache::CacheState::Valid);
    }
}
