//! The concept DAG: a hash-consed store of normalised concept/data
//! expressions, indexed by [`crate::bipointer::Bp`].
//!
//! Every non-named operator vertex (`And`, `Collection`, `Forall`, `UAll`,
//! `Irr`, `Le`) is deduplicated against vertices already in the DAG, so two
//! syntactically distinct axioms that normalise to the same expression share
//! one vertex — and, transitively, one cache entry once the cascaded cache
//! builder runs (see [`crate::cascade`]).

pub mod vertex;

use std::collections::HashMap;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::bipointer::{Bp, BOTTOM, TOP};
use crate::cache::ModelCache;
use crate::role::RoleId;
pub use vertex::{DagTag, DagVertex, Generation, Labeller, NamedEntryId, VertexStats};

/// How the DAG orders operands of `Or`-like branching points (the ToDo
/// engine consults this through `ConceptDag::ordering`). Per this crate's
/// Open Question decision, a caller always supplies an explicit spec; the
/// GALEN/WINE auto-tuning heuristics of the original are out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderMetric {
    /// No particular ordering.
    None,
    /// Order by subtree size.
    Size,
    /// Order by subtree depth.
    Depth,
    /// Order by observed reference frequency.
    Freq,
    /// Order by branching-rule count.
    Branch,
    /// Order by generating-rule count.
    Gener,
}

/// A complete OR-ordering configuration, set once via [`ConceptDag::set_ordering`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderingSpec {
    pub metric: OrderMetric,
    pub ascending: bool,
    pub prefer_non_generating: bool,
}

impl Default for OrderingSpec {
    fn default() -> Self {
        OrderingSpec {
            metric: OrderMetric::None,
            ascending: true,
            prefer_non_generating: true,
        }
    }
}

/// A naive sum-of-fields hash, mirroring `dlVHashTable::hash`: cheap, and
/// collisions are resolved by the linear `PartialEq` scan in
/// [`ConceptDag::locate`] rather than by the hash being exact.
fn hash_vertex(v: &DagVertex) -> u64 {
    let mut sum: i64 = 0;
    if let Some(r) = v.role() {
        sum += i64::from(r.0);
    }
    for &c in v.children() {
        sum += i64::from(c.raw());
    }
    sum as u64
}

type HashBucket = HashMap<u64, SmallVec<[Bp; 2]>>;

fn bucket_for(tag: DagTag) -> Option<usize> {
    match tag {
        DagTag::And | DagTag::Collection => Some(0),
        DagTag::Irr | DagTag::UAll | DagTag::Forall => Some(1),
        DagTag::Le => Some(2),
        _ => None,
    }
}

/// The DAG of normalised DL expressions used throughout a reasoning session.
pub struct ConceptDag {
    vertices: Vec<DagVertex>,
    buckets: [HashBucket; 3],
    use_cache: bool,
    n_cache_hits: u64,
    sorted_reasoning_enabled: bool,
    ordering_sat: OrderingSpec,
    ordering_sub: OrderingSpec,
    labeller: Labeller,
}

impl Default for ConceptDag {
    fn default() -> Self {
        Self::new()
    }
}

impl ConceptDag {
    /// A fresh DAG containing only the `TOP` sentinel at index 1.
    #[must_use]
    pub fn new() -> Self {
        let mut dag = ConceptDag {
            vertices: Vec::new(),
            buckets: [HashMap::new(), HashMap::new(), HashMap::new()],
            use_cache: true,
            n_cache_hits: 0,
            sorted_reasoning_enabled: true,
            ordering_sat: OrderingSpec::default(),
            ordering_sub: OrderingSpec::default(),
            labeller: Labeller::new(),
        };
        let top = dag.direct_add(DagVertex::top());
        debug_assert_eq!(top, TOP);
        dag
    }

    /// Number of vertices, including `TOP`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Heuristic pre-sizing for the next query's worth of vertices, mirroring
    /// `DLDag::maxSize`.
    #[must_use]
    pub fn max_size(&self) -> usize {
        self.len() + if self.len() < 220 { 10 } else { self.len() / 20 }
    }

    #[must_use]
    pub fn get(&self, p: Bp) -> &DagVertex {
        &self.vertices[p.as_array_index()]
    }

    pub fn get_mut(&mut self, p: Bp) -> &mut DagVertex {
        &mut self.vertices[p.as_array_index()]
    }

    #[must_use]
    pub fn is_last(&self, p: Bp) -> bool {
        p.as_array_index() == self.vertices.len() - 1
    }

    /// Enable or disable the hash-cons lookup (query time can turn it off
    /// once the DAG is frozen and every further vertex is known-fresh).
    pub fn set_expression_cache(&mut self, enabled: bool) {
        self.use_cache = enabled;
    }

    #[must_use]
    pub fn cache_hits(&self) -> u64 {
        self.n_cache_hits
    }

    /// Append `v` unconditionally, without consulting or updating the
    /// hash-cons tables.
    pub fn direct_add(&mut self, v: DagVertex) -> Bp {
        self.vertices.push(v);
        let idx = u32::try_from(self.vertices.len()).expect("DAG grew past u32 index space");
        Bp::create(idx, true)
    }

    fn direct_add_and_cache(&mut self, v: DagVertex) -> Bp {
        let tag = v.tag();
        let bp = self.direct_add(v);
        if self.use_cache {
            self.update_index(tag, bp);
        }
        bp
    }

    fn update_index(&mut self, tag: DagTag, bp: Bp) {
        let Some(bucket_idx) = bucket_for(tag) else {
            return;
        };
        let hash = hash_vertex(&self.vertices[bp.as_array_index()]);
        self.buckets[bucket_idx].entry(hash).or_default().push(bp);
    }

    fn locate(&self, tag: DagTag, v: &DagVertex) -> Option<Bp> {
        let bucket_idx = bucket_for(tag)?;
        let hash = hash_vertex(v);
        self.buckets[bucket_idx]
            .get(&hash)?
            .iter()
            .copied()
            .find(|&cand| &self.vertices[cand.as_array_index()] == v)
    }

    /// Add a dedup-eligible vertex, returning the existing `Bp` if an
    /// identical vertex is already present.
    pub fn add(&mut self, v: DagVertex) -> Bp {
        debug_assert!(v.tag().is_dedup_eligible(), "add() used for a non-dedup-eligible tag {:?}", v.tag());
        if self.use_cache {
            if let Some(found) = self.locate(v.tag(), &v) {
                self.n_cache_hits += 1;
                return found;
            }
        }
        self.direct_add_and_cache(v)
    }

    /// Build (or find) the `And` of `children`, applying the usual
    /// normalisations: `TOP` operands drop out, a direct clash collapses to
    /// `BOTTOM`, zero operands is `TOP`, one operand is itself.
    pub fn get_and<I: IntoIterator<Item = Bp>>(&mut self, children: I, collection: bool) -> Bp {
        let mut v = DagVertex::conjunction(collection);
        for c in children {
            if c == TOP {
                continue;
            }
            if c == BOTTOM || v.add_child(c) {
                self.sorted_reasoning_enabled = false;
                return BOTTOM;
            }
        }
        match v.children().len() {
            0 => TOP,
            1 => v.children()[0],
            _ => self.add(v),
        }
    }

    /// `forall R.C` (or, with `role = None`, `forall U.C`), at automaton
    /// state `state` (`0` for a simple role with a trivial automaton).
    pub fn get_forall(&mut self, role: Option<RoleId>, c: Bp, state: u32) -> Bp {
        self.add(DagVertex::forall(role, c, state))
    }

    /// `<= n R.C`.
    pub fn get_at_most(&mut self, n: u32, role: RoleId, c: Bp) -> Bp {
        self.add(DagVertex::at_most(n, role, c))
    }

    /// `not (exists R.Self)`.
    pub fn get_irreflexive(&mut self, role: RoleId) -> Bp {
        self.add(DagVertex::irreflexive(role))
    }

    /// A named concept or individual; never hash-consed (each `NamedEntryId`
    /// already denotes a unique vertex).
    pub fn add_named(&mut self, tag: DagTag, entry: NamedEntryId) -> Bp {
        self.direct_add(DagVertex::named(tag, entry))
    }

    /// A concrete-domain vertex; never hash-consed.
    pub fn add_data(&mut self, tag: DagTag, operand: Option<Bp>) -> Bp {
        self.direct_add(DagVertex::data(tag, operand))
    }

    /// Record the OR-ordering to use for SAT/cache tests vs. SUB/classify
    /// tests. Always explicit (see this module's doc comment).
    pub fn set_ordering(&mut self, for_sat: OrderingSpec, for_sub: OrderingSpec) {
        self.ordering_sat = for_sat;
        self.ordering_sub = for_sub;
    }

    #[must_use]
    pub fn ordering_for_sat(&self) -> OrderingSpec {
        self.ordering_sat
    }

    #[must_use]
    pub fn ordering_for_sub(&self) -> OrderingSpec {
        self.ordering_sub
    }

    #[must_use]
    pub fn get_cache(&self, p: Bp) -> Option<&Arc<dyn ModelCache>> {
        self.get(p).cache(p.is_positive())
    }

    pub fn set_cache(&mut self, p: Bp, cache: Arc<dyn ModelCache>) {
        let positive = p.is_positive();
        self.get_mut(p).set_cache(positive, cache);
    }

    /// Turns off the sort-label shortcut for the rest of the session: once a
    /// non-trivial `And`-vertex clash is detected at DAG-build time, sort
    /// labels can no longer be trusted to separate every pair that is
    /// actually distinguishable, so `have_same_sort` degrades to "always
    /// compatible" (never unsound, just loses the shortcut).
    pub fn disable_sorted_reasoning(&mut self) {
        self.sorted_reasoning_enabled = false;
    }

    #[must_use]
    pub fn sorted_reasoning_enabled(&self) -> bool {
        self.sorted_reasoning_enabled
    }

    fn resolve_sort(&mut self, mut idx: usize) -> usize {
        let mut path = Vec::new();
        while let Some(parent) = self.vertices[idx].sort_parent {
            path.push(idx);
            idx = parent;
        }
        for node in path {
            self.vertices[node].sort_parent = Some(idx);
        }
        idx
    }

    /// Merge the sort classes of `a` and `b` (e.g. on adding the edge
    /// `<a,b>:R`, merging domain/range sorts with `R`'s).
    pub fn merge_sort(&mut self, a: Bp, b: Bp) {
        if !self.sorted_reasoning_enabled || !a.is_valid() || !b.is_valid() || a == TOP || b == TOP || a == BOTTOM || b == BOTTOM {
            return;
        }
        let ra = self.resolve_sort(a.as_array_index());
        let rb = self.resolve_sort(b.as_array_index());
        if ra != rb {
            self.vertices[ra].sort_parent = Some(rb);
        }
    }

    /// `true` iff `p` and `q` cannot be told apart by sort analysis alone —
    /// always `true` once [`ConceptDag::disable_sorted_reasoning`] has fired,
    /// and always `true` for `TOP`.
    pub fn have_same_sort(&mut self, p: Bp, q: Bp) -> bool {
        if !self.sorted_reasoning_enabled || !p.is_valid() || !q.is_valid() || p == TOP || q == TOP {
            return true;
        }
        self.resolve_sort(p.as_array_index()) == self.resolve_sort(q.as_array_index())
    }

    #[must_use]
    pub fn labeller(&self) -> &Labeller {
        &self.labeller
    }

    pub fn labeller_mut(&mut self) -> &mut Labeller {
        &mut self.labeller
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_is_vertex_one() {
        let dag = ConceptDag::new();
        assert_eq!(dag.len(), 1);
        assert_eq!(dag.get(TOP).tag(), DagTag::Top);
    }

    #[test]
    fn and_vertices_are_hash_consed() {
        let mut dag = ConceptDag::new();
        let a = dag.add_named(DagTag::PConcept, NamedEntryId(1));
        let b = dag.add_named(DagTag::PConcept, NamedEntryId(2));
        let v1 = dag.get_and([a, b], false);
        let v2 = dag.get_and([a, b], false);
        assert_eq!(v1, v2);
        assert_eq!(dag.cache_hits(), 1);
    }

    #[test]
    fn and_with_direct_clash_collapses_to_bottom() {
        let mut dag = ConceptDag::new();
        let a = dag.add_named(DagTag::PConcept, NamedEntryId(1));
        let v = dag.get_and([a, a.inverse()], false);
        assert_eq!(v, BOTTOM);
        assert!(!dag.sorted_reasoning_enabled());
    }

    #[test]
    fn and_with_top_operand_is_absorbed() {
        let mut dag = ConceptDag::new();
        let a = dag.add_named(DagTag::PConcept, NamedEntryId(1));
        let v = dag.get_and([a, TOP], false);
        assert_eq!(v, a);
    }

    #[test]
    fn and_of_nothing_is_top() {
        let mut dag = ConceptDag::new();
        let v = dag.get_and(std::iter::empty(), false);
        assert_eq!(v, TOP);
    }

    #[test]
    fn forall_vertices_with_different_states_are_distinct() {
        let mut dag = ConceptDag::new();
        let c = dag.add_named(DagTag::PConcept, NamedEntryId(1));
        let r = RoleId(7);
        let f0 = dag.get_forall(Some(r), c, 0);
        let f1 = dag.get_forall(Some(r), c, 1);
        assert_ne!(f0, f1);
    }

    #[test]
    fn sort_labels_merge_transitively() {
        let mut dag = ConceptDag::new();
        let a = dag.add_named(DagTag::PConcept, NamedEntryId(1));
        let b = dag.add_named(DagTag::PConcept, NamedEntryId(2));
        let c = dag.add_named(DagTag::PConcept, NamedEntryId(3));
        dag.merge_sort(a, b);
        dag.merge_sort(b, c);
        assert!(dag.have_same_sort(a, c));
    }

    #[test]
    fn disabling_sorted_reasoning_forces_same_sort_true() {
        let mut dag = ConceptDag::new();
        let a = dag.add_named(DagTag::PConcept, NamedEntryId(1));
        let b = dag.add_named(DagTag::PConcept, NamedEntryId(2));
        dag.disable_sorted_reasoning();
        assert!(dag.have_same_sort(a, b));
    }
}
