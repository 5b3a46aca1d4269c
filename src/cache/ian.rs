//! The general-purpose model cache: buckets a node's label concepts and
//! edge roles into a handful of fixed-universe bitsets, and answers merge
//! questions by set intersection instead of re-running the tableau on the
//! merged node.
//!
//! Concepts are split four ways — positive/negative crossed with
//! deterministic/non-deterministic — because a deterministic clash is a
//! certain [`CacheState::Invalid`], while a clash that only one
//! non-deterministic choice produced is merely [`CacheState::Failed`]: the
//! cache can't rule out a different choice avoiding it.

use std::any::Any;

use fixedbitset::FixedBitSet;

use crate::bipointer::Bp;
use crate::dag::{ConceptDag, DagTag};
use crate::graph::{CompletionGraph, NodeId};
use crate::role::{RoleId, RoleMaster};

use super::{has_nominal_clash, singleton::SingletonCache, CacheState, CacheType, ModelCache};

fn bp_bit(bp: Bp) -> usize {
    bp.vertex_index() as usize
}

fn role_bit(role: RoleId) -> usize {
    role.0 as usize
}

/// Grow `set` if needed, then set `bit`.
fn set_bit(set: &mut FixedBitSet, bit: usize) {
    if bit >= set.len() {
        set.grow(bit + 1);
    }
    set.insert(bit);
}

/// `true` iff no bit is set in both `a` and `b`, regardless of whether they
/// were sized from different DAG/role-table snapshots.
fn disjoint(a: &FixedBitSet, b: &FixedBitSet) -> bool {
    let (small, big) = if a.count_ones(..) <= b.count_ones(..) { (a, b) } else { (b, a) };
    small.ones().all(|bit| !big.contains(bit))
}

/// Grow `into` to cover `from` if needed, then union `from` into it.
fn union_into(into: &mut FixedBitSet, from: &FixedBitSet) {
    if from.len() > into.len() {
        into.grow(from.len());
    }
    into.union_with(from);
}

#[derive(Debug, Clone)]
pub struct IanCache {
    pos_d: FixedBitSet,
    pos_n: FixedBitSet,
    neg_d: FixedBitSet,
    neg_n: FixedBitSet,
    /// Partial Simple Rule applications, deterministic/non-deterministic —
    /// carried for structural parity with the cache fields this crate's
    /// label/DAG layers could eventually feed, though nothing populates
    /// them yet (Simple Rules aren't an implemented tableau optimisation
    /// here).
    extra_d: FixedBitSet,
    extra_n: FixedBitSet,
    exists_roles: FixedBitSet,
    forall_roles: FixedBitSet,
    func_roles: FixedBitSet,
    state: CacheState,
    has_nominal: bool,
}

impl IanCache {
    /// An empty, valid cache sized for a DAG of `dag_size` vertices and a
    /// role table of `role_count` roles — the starting point both for
    /// building one from a node and for accumulating a cascaded merge.
    #[must_use]
    pub fn empty(dag_size: usize, role_count: usize, has_nominal: bool) -> Self {
        IanCache {
            pos_d: FixedBitSet::with_capacity(dag_size + 1),
            pos_n: FixedBitSet::with_capacity(dag_size + 1),
            neg_d: FixedBitSet::with_capacity(dag_size + 1),
            neg_n: FixedBitSet::with_capacity(dag_size + 1),
            extra_d: FixedBitSet::with_capacity(dag_size + 1),
            extra_n: FixedBitSet::with_capacity(dag_size + 1),
            exists_roles: FixedBitSet::with_capacity(role_count),
            forall_roles: FixedBitSet::with_capacity(role_count),
            func_roles: FixedBitSet::with_capacity(role_count),
            state: CacheState::Valid,
            has_nominal,
        }
    }

    /// Build a cache describing `node`'s current label and incident edges.
    pub fn from_node(dag: &ConceptDag, roles: &RoleMaster, graph: &CompletionGraph, node: NodeId, has_nominal: bool) -> Self {
        let mut cache = IanCache::empty(dag.len(), roles.len(), has_nominal);
        let label = graph.node(node).label();
        for half in [label.label(DagTag::PConcept), label.label(DagTag::Forall)] {
            for c in half.iter() {
                cache.process_concept(dag, roles, c.bp(), c.dep().is_empty());
            }
        }
        cache.init_roles_from_arcs(roles, graph, node);
        cache
    }

    fn concepts(&self, det: bool, positive: bool) -> &FixedBitSet {
        match (det, positive) {
            (true, true) => &self.pos_d,
            (true, false) => &self.neg_d,
            (false, true) => &self.pos_n,
            (false, false) => &self.neg_n,
        }
    }

    fn concepts_mut(&mut self, det: bool, positive: bool) -> &mut FixedBitSet {
        match (det, positive) {
            (true, true) => &mut self.pos_d,
            (true, false) => &mut self.neg_d,
            (false, true) => &mut self.pos_n,
            (false, false) => &mut self.neg_n,
        }
    }

    fn insert_concept(&mut self, det: bool, positive: bool, bp: Bp) {
        let bit = bp_bit(bp);
        set_bit(self.concepts_mut(det, positive), bit);
    }

    fn process_concept(&mut self, dag: &ConceptDag, roles: &RoleMaster, bp: Bp, det: bool) {
        let v = dag.get(bp);
        let positive = bp.is_positive();
        match v.tag() {
            DagTag::PConcept | DagTag::NConcept | DagTag::PSingleton | DagTag::NSingleton => {
                self.insert_concept(det, positive, bp);
            }
            // \E-\A constructors: only the positive occurrence constrains
            // anything here — existentials are already visible through the
            // node's edges, so only `forall`/`<= n`/`Irr` need recording.
            DagTag::Irr | DagTag::Forall | DagTag::Le => {
                if !positive {
                    return;
                }
                if let Some(role_id) = v.role() {
                    let role = roles.get(role_id);
                    if role.is_simple() {
                        self.add_forall_role(roles, role_id);
                    } else {
                        let state = if v.tag() == DagTag::Forall { v.get_state() } else { role.automaton().initial() };
                        self.process_automaton(roles, role_id, state);
                    }
                }
            }
            _ => {}
        }
    }

    fn add_forall_role(&mut self, roles: &RoleMaster, role_id: RoleId) {
        set_bit(&mut self.forall_roles, role_bit(role_id));
        for &a in roles.get(role_id).ancestors() {
            set_bit(&mut self.forall_roles, role_bit(a));
        }
    }

    fn process_automaton(&mut self, roles: &RoleMaster, role_id: RoleId, state: u32) {
        let automaton = roles.get(role_id).automaton();
        for trans in automaton.state(state).transitions() {
            for &r in trans.roles() {
                set_bit(&mut self.forall_roles, role_bit(r));
            }
        }
    }

    fn add_exists_role(&mut self, roles: &RoleMaster, role_id: RoleId) {
        let role = roles.get(role_id);
        set_bit(&mut self.exists_roles, role_bit(role_id));
        for &a in role.ancestors() {
            set_bit(&mut self.exists_roles, role_bit(a));
        }
        if role.is_functional() {
            set_bit(&mut self.func_roles, role_bit(role_id));
            for &a in role.ancestors() {
                set_bit(&mut self.func_roles, role_bit(a));
            }
        }
    }

    /// Add every role labelling an edge incident to `node` (parent or
    /// child) to the exists-/func-role sets, so a merge can detect a role
    /// that would force a clash via `>= 2 R` / functionality.
    fn init_roles_from_arcs(&mut self, roles: &RoleMaster, graph: &CompletionGraph, node: NodeId) {
        let n = graph.node(node);
        for &e in n.parents().iter().chain(n.children().iter()) {
            if let Some(role_id) = graph.edge(e).role() {
                self.add_exists_role(roles, role_id);
            }
        }
    }

    fn is_mergable_singleton(&self, bp: Bp) -> CacheState {
        let positive = bp.is_positive();
        let bit = bp_bit(bp);
        if self.concepts(true, !positive).contains(bit) {
            CacheState::Invalid
        } else if self.concepts(false, !positive).contains(bit) {
            CacheState::Failed
        } else {
            CacheState::Valid
        }
    }

    fn is_mergable_ian(&self, q: &IanCache) -> CacheState {
        if !disjoint(&self.pos_d, &q.neg_d)
            || !disjoint(&q.pos_d, &self.neg_d)
            || !disjoint(&self.extra_d, &q.extra_d)
        {
            return CacheState::Invalid;
        }
        if !disjoint(&self.pos_d, &q.neg_n)
            || !disjoint(&self.pos_n, &q.neg_d)
            || !disjoint(&self.pos_n, &q.neg_n)
            || !disjoint(&q.pos_d, &self.neg_n)
            || !disjoint(&q.pos_n, &self.neg_d)
            || !disjoint(&q.pos_n, &self.neg_n)
            || !disjoint(&self.extra_d, &q.extra_n)
            || !disjoint(&self.extra_n, &q.extra_d)
            || !disjoint(&self.extra_n, &q.extra_n)
            || !disjoint(&self.exists_roles, &q.forall_roles)
            || !disjoint(&q.exists_roles, &self.forall_roles)
            || !disjoint(&self.func_roles, &q.func_roles)
        {
            return CacheState::Failed;
        }
        CacheState::Valid
    }

    fn merge_singleton(&mut self, bp: Bp) {
        let new_state = self.is_mergable_singleton(bp);
        if new_state == CacheState::Valid {
            let positive = bp.is_positive();
            self.insert_concept(true, positive, bp);
        } else {
            self.state = CacheState::merge(self.state, new_state);
        }
    }

    fn merge_ian(&mut self, q: &IanCache) {
        self.state = self.is_mergable_ian(q);
        union_into(&mut self.pos_d, &q.pos_d);
        union_into(&mut self.pos_n, &q.pos_n);
        union_into(&mut self.neg_d, &q.neg_d);
        union_into(&mut self.neg_n, &q.neg_n);
        union_into(&mut self.extra_d, &q.extra_d);
        union_into(&mut self.extra_n, &q.extra_n);
        union_into(&mut self.exists_roles, &q.exists_roles);
        union_into(&mut self.forall_roles, &q.forall_roles);
        union_into(&mut self.func_roles, &q.func_roles);
    }

    /// Fold `other` into this cache in place, the way the cascaded cache
    /// builder accumulates a node's children one at a time; returns the
    /// resulting state.
    pub fn merge(&mut self, other: &dyn ModelCache) -> CacheState {
        if has_nominal_clash(self, other) {
            self.state = CacheState::Failed;
            self.has_nominal = true;
            return self.state;
        }
        match other.cache_type() {
            CacheType::Const => self.state = CacheState::merge(self.state, other.state()),
            CacheType::Singleton => {
                let o = other.as_any().downcast_ref::<SingletonCache>().expect("cache_type() said Singleton");
                self.merge_singleton(o.value());
            }
            CacheType::Ian => {
                let o = other.as_any().downcast_ref::<IanCache>().expect("cache_type() said Ian");
                self.merge_ian(o);
            }
        }
        self.has_nominal = self.has_nominal || other.has_nominal_node();
        self.state
    }
}

impl ModelCache for IanCache {
    fn state(&self) -> CacheState {
        self.state
    }

    fn can_merge(&self, other: &dyn ModelCache) -> CacheState {
        if has_nominal_clash(self, other) {
            return CacheState::Failed;
        }
        if other.state() != CacheState::Valid || self.state() != CacheState::Valid {
            return CacheState::merge(other.state(), self.state());
        }
        match other.cache_type() {
            CacheType::Const => CacheState::Valid,
            CacheType::Singleton => {
                let o = other.as_any().downcast_ref::<SingletonCache>().expect("cache_type() said Singleton");
                self.is_mergable_singleton(o.value())
            }
            CacheType::Ian => {
                let o = other.as_any().downcast_ref::<IanCache>().expect("cache_type() said Ian");
                self.is_mergable_ian(o)
            }
        }
    }

    fn cache_type(&self) -> CacheType {
        CacheType::Ian
    }

    fn shallow(&self) -> bool {
        self.exists_roles.count_ones(..) == 0
    }

    fn has_nominal_node(&self) -> bool {
        self.has_nominal
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_polarity_det_concepts_merge_cleanly() {
        let mut a = IanCache::empty(16, 4, false);
        a.insert_concept(true, true, Bp::create(1, true));
        let mut b = IanCache::empty(16, 4, false);
        b.insert_concept(true, true, Bp::create(1, true));
        assert_eq!(a.can_merge(&b), CacheState::Valid);
    }

    #[test]
    fn opposite_det_concepts_clash_invalid() {
        let mut a = IanCache::empty(16, 4, false);
        a.insert_concept(true, true, Bp::create(1, true));
        let mut b = IanCache::empty(16, 4, false);
        b.insert_concept(true, false, Bp::create(1, true));
        assert_eq!(a.can_merge(&b), CacheState::Invalid);
    }

    #[test]
    fn opposite_nondet_concepts_only_fail() {
        let mut a = IanCache::empty(16, 4, false);
        a.insert_concept(false, true, Bp::create(1, true));
        let mut b = IanCache::empty(16, 4, false);
        b.insert_concept(false, false, Bp::create(1, true));
        assert_eq!(a.can_merge(&b), CacheState::Failed);
    }

    #[test]
    fn exists_and_forall_on_the_same_role_fail_to_merge() {
        let mut a = IanCache::empty(8, 8, false);
        set_bit(&mut a.exists_roles, role_bit(RoleId(3)));
        let mut b = IanCache::empty(8, 8, false);
        set_bit(&mut b.forall_roles, role_bit(RoleId(3)));
        assert_eq!(a.can_merge(&b), CacheState::Failed);
    }

    #[test]
    fn merge_unions_every_set_and_updates_state() {
        let mut a = IanCache::empty(8, 4, false);
        a.insert_concept(true, true, Bp::create(1, true));
        let mut b = IanCache::empty(8, 4, false);
        b.insert_concept(true, true, Bp::create(2, true));
        let state = a.merge(&b);
        assert_eq!(state, CacheState::Valid);
        assert!(a.concepts(true, true).contains(bp_bit(Bp::create(2, true))));
    }

    #[test]
    fn nominal_clash_forces_failed_regardless_of_contents() {
        let a = IanCache::empty(4, 4, true);
        let b = IanCache::empty(4, 4, true);
        assert_eq!(a.can_merge(&b), CacheState::Failed);
    }
}
