//! The completion graph: the tableau's working structure of nodes (each
//! carrying a [`CGLabel`]) connected by role-labelled edges.
//!
//! This module owns only the graph's *shape* — allocation, edges, merging,
//! purging, and the save/restore trail. Deciding whether a node is blocked
//! is a separate concern with its own comparison machinery and lives in
//! [`crate::blocking`]; this module just stores the three blocker pointers
//! (`d`/`i`/`p`) a blocking decision sets; it never sets them itself.

use smallvec::SmallVec;

use crate::bipointer::Bp;
use crate::dag::DagTag;
use crate::depset::DepSet;
use crate::label::{CGLabel, ConceptWDep, LabelSaveState};
use crate::role::{RoleId, RoleMaster};

/// An index into [`CompletionGraph`]'s node arena. Node `0` is always the
/// graph's root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// An index into [`CompletionGraph`]'s edge arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u32);

/// Nominal nodes carry the branching level at which they were merged into
/// the ABox; blockable nodes carry none.
pub type NominalLevel = u32;

/// One node's `p_blocker`/`purge_dep` as they were immediately before a
/// [`CompletionGraph::purge`] call overwrote them — see [`CompletionGraph::merge`].
#[derive(Debug, Clone)]
pub struct PurgeTrailEntry {
    pub node: NodeId,
    pub prev_blocker: Option<NodeId>,
    pub prev_dep: DepSet,
}

/// Per-node state captured by [`CompletionGraph::save`], undone by
/// [`CompletionGraph::restore`].
#[derive(Debug, Clone, Copy)]
struct NodeSaveState {
    label: LabelSaveState,
    cur_level: u32,
    n_parents: usize,
    n_children: usize,
    cached: bool,
    affected: bool,
}

/// A single completion-graph node.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    label: CGLabel,
    parents: SmallVec<[EdgeId; 2]>,
    children: SmallVec<[EdgeId; 4]>,
    /// `None` for a blockable node, `Some(level)` for a nominal one (the
    /// original's `BlockableLevel` sentinel).
    nominal_level: Option<NominalLevel>,
    /// The concept that caused this node to be created; the cheap first
    /// check a blocking comparison makes before walking the full label.
    init: Bp,
    data_node: bool,
    cached: bool,
    affected: bool,
    d_blocker: Option<NodeId>,
    i_blocker: Option<NodeId>,
    p_blocker: Option<NodeId>,
    purge_dep: DepSet,
    cur_level: u32,
    saves: Vec<NodeSaveState>,
}

impl Node {
    fn new(id: NodeId, level: u32) -> Self {
        Node {
            id,
            label: CGLabel::new(),
            parents: SmallVec::new(),
            children: SmallVec::new(),
            nominal_level: None,
            init: crate::bipointer::TOP,
            data_node: false,
            cached: false,
            affected: true,
            d_blocker: None,
            i_blocker: None,
            p_blocker: None,
            purge_dep: DepSet::empty(),
            cur_level: level,
            saves: Vec::new(),
        }
    }

    /// Reinitialise a reused arena slot for a fresh node at `level`.
    fn reinit(&mut self, level: u32) {
        self.label = CGLabel::new();
        self.label.init();
        self.parents.clear();
        self.children.clear();
        self.nominal_level = None;
        self.init = crate::bipointer::TOP;
        self.data_node = false;
        self.cached = false;
        self.affected = true;
        self.d_blocker = None;
        self.i_blocker = None;
        self.p_blocker = None;
        self.purge_dep = DepSet::empty();
        self.cur_level = level;
        self.saves.clear();
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub fn label(&self) -> &CGLabel {
        &self.label
    }

    pub fn label_mut(&mut self) -> &mut CGLabel {
        &mut self.label
    }

    #[must_use]
    pub fn parents(&self) -> &[EdgeId] {
        &self.parents
    }

    #[must_use]
    pub fn children(&self) -> &[EdgeId] {
        &self.children
    }

    #[must_use]
    pub fn has_parents(&self) -> bool {
        !self.parents.is_empty()
    }

    #[must_use]
    pub fn is_blockable(&self) -> bool {
        self.nominal_level.is_none()
    }

    #[must_use]
    pub fn is_nominal(&self) -> bool {
        self.nominal_level.is_some()
    }

    #[must_use]
    pub fn nominal_level(&self) -> Option<NominalLevel> {
        self.nominal_level
    }

    pub fn set_nominal_level(&mut self, level: NominalLevel) {
        self.nominal_level = Some(level);
    }

    /// Undo a [`set_nominal_level`](Node::set_nominal_level) call on
    /// backtrack — not reachable through `save`/`restore_to`, see the
    /// module doc comment on rare per-node state.
    pub fn clear_nominal_level(&mut self) {
        self.nominal_level = None;
    }

    #[must_use]
    pub fn init_concept(&self) -> Bp {
        self.init
    }

    pub fn set_init_concept(&mut self, p: Bp) {
        self.init = p;
    }

    #[must_use]
    pub fn is_data_node(&self) -> bool {
        self.data_node
    }

    pub fn set_data_node(&mut self) {
        self.data_node = true;
    }

    #[must_use]
    pub fn is_cached(&self) -> bool {
        self.cached
    }

    pub fn set_cached(&mut self, value: bool) {
        self.cached = value;
    }

    #[must_use]
    pub fn is_affected(&self) -> bool {
        self.affected
    }

    /// Mark this node affected; callers that need the original's recursive
    /// "propagate to all non-nominal, non-p-blocked children" behaviour do
    /// so themselves via [`CompletionGraph::mark_affected_recursive`], since
    /// that walk needs sibling nodes this type alone can't see.
    pub fn set_affected(&mut self) {
        self.affected = true;
    }

    pub fn clear_affected(&mut self) {
        self.affected = false;
    }

    #[must_use]
    pub fn is_d_blocked(&self) -> bool {
        self.d_blocker.is_some()
    }

    #[must_use]
    pub fn is_i_blocked(&self) -> bool {
        self.i_blocker.is_some()
    }

    #[must_use]
    pub fn is_p_blocked(&self) -> bool {
        self.p_blocker.is_some()
    }

    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.is_d_blocked() || self.is_i_blocked()
    }

    #[must_use]
    pub fn d_blocker(&self) -> Option<NodeId> {
        self.d_blocker
    }

    #[must_use]
    pub fn i_blocker(&self) -> Option<NodeId> {
        self.i_blocker
    }

    #[must_use]
    pub fn p_blocker(&self) -> Option<NodeId> {
        self.p_blocker
    }

    #[must_use]
    pub fn purge_dep(&self) -> &DepSet {
        &self.purge_dep
    }

    /// The branching level this node's state was last saved at — the same
    /// granularity `save`/`restore_to` already track, reused by callers
    /// (e.g. `crate::blocking`) that keep their own rare-state trail over
    /// fields this type doesn't cover itself.
    #[must_use]
    pub fn cur_level(&self) -> u32 {
        self.cur_level
    }

    /// Record `blocker` as this node's direct blocker. Returns the previous
    /// value so a caller restoring on backtrack can put it back; callers
    /// needing the rarely-changed-info semantics push this onto their own
    /// restore trail (mirrors the original's `saveRareCond`).
    pub fn set_d_blocked(&mut self, blocker: Option<NodeId>) -> Option<NodeId> {
        std::mem::replace(&mut self.d_blocker, blocker)
    }

    pub fn set_i_blocked(&mut self, blocker: Option<NodeId>) -> Option<NodeId> {
        std::mem::replace(&mut self.i_blocker, blocker)
    }

    /// Mark this node purged into `root`, recording the dep-set that would
    /// need to be added on backjumping past this purge.
    pub fn set_p_blocked(&mut self, root: NodeId, dep: DepSet) -> (Option<NodeId>, DepSet) {
        let old = (self.p_blocker, std::mem::replace(&mut self.purge_dep, dep));
        self.p_blocker = Some(root);
        old
    }

    pub fn unset_p_blocked(&mut self, blocker: Option<NodeId>, dep: DepSet) {
        self.p_blocker = blocker;
        self.purge_dep = dep;
    }

    #[must_use]
    fn needs_save(&self, new_level: u32) -> bool {
        self.cur_level < new_level
    }

    #[must_use]
    fn needs_restore(&self, restore_level: u32) -> bool {
        self.cur_level > restore_level
    }

    fn save(&mut self, level: u32) {
        self.saves.push(NodeSaveState {
            label: self.label.save(),
            cur_level: self.cur_level,
            n_parents: self.parents.len(),
            n_children: self.children.len(),
            cached: self.cached,
            affected: self.affected,
        });
        self.cur_level = level;
    }

    fn restore_to(&mut self, level: u32) {
        while let Some(top) = self.saves.last() {
            if top.cur_level <= level {
                break;
            }
            let ss = self.saves.pop().unwrap();
            self.cur_level = ss.cur_level;
            self.label.restore(ss.label);
            self.parents.truncate(ss.n_parents);
            self.children.truncate(ss.n_children);
            self.cached = ss.cached;
            self.affected = ss.affected;
        }
        // it's cheaper to dirty the affected flag than to save it precisely
        self.affected = true;
    }
}

/// An edge between two nodes, labelled with a role. Two arcs are created
/// per `createEdge` call (forward and reverse); `role: None` marks an
/// i-blocked/merged-away edge the same way the original's `NULL` role does.
#[derive(Debug, Clone)]
pub struct Edge {
    target: NodeId,
    role: Option<RoleId>,
    dep: DepSet,
    reverse: Option<EdgeId>,
}

impl Edge {
    #[must_use]
    pub fn target(&self) -> NodeId {
        self.target
    }

    #[must_use]
    pub fn role(&self) -> Option<RoleId> {
        self.role
    }

    #[must_use]
    pub fn dep(&self) -> &DepSet {
        &self.dep
    }

    #[must_use]
    pub fn reverse(&self) -> Option<EdgeId> {
        self.reverse
    }

    #[must_use]
    pub fn is_i_blocked(&self) -> bool {
        self.role.is_none()
    }

    /// `true` iff this edge loops a node back to itself.
    #[must_use]
    pub fn is_reflexive(&self, from: NodeId) -> bool {
        self.target == from
    }

    /// `true` iff a search for `role` may traverse this edge: the edge
    /// isn't i-blocked, and its own role label is at least as specific as
    /// `role` in the role hierarchy (the edge's role is a sub-role of, or
    /// equal to, `role`).
    #[must_use]
    pub fn is_neighbour(&self, role: RoleId, roles: &RoleMaster) -> bool {
        match self.role {
            None => false,
            Some(r) => roles.get(r).is_sub_role_of(role),
        }
    }

    /// Invalidate this edge in place, turning it into an i-blocked one.
    /// Returns the role it carried so the caller can restore it.
    fn invalidate(&mut self) -> Option<RoleId> {
        self.role.take()
    }

    fn revalidate(&mut self, role: Option<RoleId>) {
        self.role = role;
    }

    pub fn add_dep(&mut self, dep: &DepSet) {
        self.dep.add(dep);
    }
}

/// Save/restore state for the graph-wide bookkeeping (node/edge counts and
/// branching level); per-node state is saved separately via
/// [`CompletionGraph::save`]'s call to each live node's own trail.
#[derive(Debug, Clone, Copy)]
struct GraphSaveState {
    n_nodes: usize,
    branching_level: u32,
}

/// The completion graph proper: a deleteless node/edge arena plus the
/// operations the tableau drives it with (allocation, role labelling,
/// merging two nodes, purging a subtree, and the save/restore trail).
#[derive(Debug)]
pub struct CompletionGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    end_used: usize,
    branching_level: u32,
    saves: Vec<GraphSaveState>,
    n_node_saves: u64,
    n_node_restores: u64,
}

const INIT_BRANCHING_LEVEL: u32 = 1;

impl CompletionGraph {
    /// A fresh graph with a single root node.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = CompletionGraph {
            nodes: Vec::new(),
            edges: Vec::new(),
            end_used: 0,
            branching_level: INIT_BRANCHING_LEVEL,
            saves: Vec::new(),
            n_node_saves: 0,
            n_node_restores: 0,
        };
        graph.new_node();
        graph
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The actual root of the graph, following purge pointers if the root
    /// itself was merged into a nominal node.
    #[must_use]
    pub fn actual_root(&self) -> NodeId {
        self.resolve_purged(self.root())
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    #[must_use]
    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0 as usize]
    }

    fn edge_mut(&mut self, id: EdgeId) -> &mut Edge {
        &mut self.edges[id.0 as usize]
    }

    /// Iterate over every live node.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes[..self.end_used].iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.end_used
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end_used == 0
    }

    /// Resolve a chain of purge-blockers down to the live node `id` was
    /// ultimately merged into, accumulating the dep-sets along the way.
    #[must_use]
    pub fn resolve_purged(&self, id: NodeId) -> NodeId {
        let mut cur = id;
        while let Some(next) = self.node(cur).p_blocker() {
            cur = next;
        }
        cur
    }

    /// As [`CompletionGraph::resolve_purged`], also folding every purge
    /// dep-set along the chain into `dep`.
    pub fn resolve_purged_with_dep(&self, id: NodeId, dep: &mut DepSet) -> NodeId {
        let mut cur = id;
        while let Some(next) = self.node(cur).p_blocker() {
            dep.add(self.node(cur).purge_dep());
            cur = next;
        }
        cur
    }

    /// Allocate a new node at the current branching level.
    pub fn new_node(&mut self) -> NodeId {
        let level = self.branching_level;
        if self.end_used == self.nodes.len() {
            let id = NodeId(self.end_used as u32);
            let mut node = Node::new(id, level);
            node.label.init();
            self.nodes.push(node);
        } else {
            self.nodes[self.end_used].reinit(level);
        }
        let id = NodeId(self.end_used as u32);
        self.end_used += 1;
        id
    }

    /// Add a concept to `node`'s label under `tag`; callers drive the
    /// blocking re-check this triggers (lazy vs. eager) since that decision
    /// belongs to [`crate::blocking`], not this module.
    pub fn add_concept(&mut self, node: NodeId, c: ConceptWDep, tag: DagTag) {
        self.save_node(node);
        let n = self.node_mut(node);
        n.label_mut().label_mut(tag).add(c);
        n.set_affected();
    }

    fn push_edge(&mut self, edge: Edge) -> EdgeId {
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(edge);
        id
    }

    /// Create a fresh pair of forward/backward arcs between `from` and `to`
    /// labelled with `role`/`role.inverse()`, linking them as parent/child
    /// of one another; `is_up_link` matches the original's naming (`to` is
    /// `from`'s parent rather than its child).
    fn create_edge(&mut self, from: NodeId, to: NodeId, is_up_link: bool, role: RoleId, roles: &RoleMaster, dep: DepSet) -> EdgeId {
        self.save_node(from);
        self.save_node(to);

        let forward = self.push_edge(Edge { target: to, role: Some(role), dep: dep.clone(), reverse: None });
        let backward = self.push_edge(Edge {
            target: from,
            role: Some(roles.get(role).inverse()),
            dep,
            reverse: None,
        });
        self.edge_mut(forward).reverse = Some(backward);
        self.edge_mut(backward).reverse = Some(forward);

        if is_up_link {
            self.node_mut(from).parents.push(forward);
            self.node_mut(to).children.push(backward);
        } else {
            self.node_mut(from).children.push(forward);
            self.node_mut(to).parents.push(backward);
        }
        forward
    }

    /// Add `role` to the label of the `from -> to` arc, creating a fresh
    /// edge if none already connects the two in that direction, or merging
    /// `dep` into the existing one otherwise.
    pub fn add_role_label(&mut self, from: NodeId, to: NodeId, is_up_link: bool, role: RoleId, roles: &RoleMaster, dep: DepSet) -> EdgeId {
        let existing = self.edge_labelled(from, role, to, is_up_link, roles);
        if let Some(id) = existing {
            self.edge_mut(id).add_dep(&dep);
            id
        } else {
            self.create_edge(from, to, is_up_link, role, roles, dep)
        }
    }

    /// An empty `R`-neighbour of `from`: a fresh node joined by a new edge.
    pub fn create_neighbour(&mut self, from: NodeId, is_up_link: bool, role: RoleId, roles: &RoleMaster, dep: DepSet) -> (NodeId, EdgeId) {
        let to = self.new_node();
        let edge = self.create_edge(from, to, is_up_link, role, roles, dep);
        (to, edge)
    }

    /// Search `from`'s edges (parents if `is_up_link`, else children) for
    /// one already labelled exactly `role` and ending at `to`.
    fn edge_labelled(&self, from: NodeId, role: RoleId, to: NodeId, is_up_link: bool, _roles: &RoleMaster) -> Option<EdgeId> {
        let candidates: &[EdgeId] = if is_up_link { self.node(from).parents() } else { self.node(from).children() };
        candidates.iter().copied().find(|&e| {
            let edge = self.edge(e);
            edge.target == to && edge.role == Some(role)
        })
    }

    /// Replace an edge that used to go from the merged-away node to `x`
    /// with one from `node` to `x`, skipping edges that shouldn't survive a
    /// merge (already-invalidated ones, and successor edges to non-nominal
    /// nodes).
    fn move_edge(&mut self, node: NodeId, edge: EdgeId, is_up_link: bool, roles: &RoleMaster, dep: DepSet) -> Option<EdgeId> {
        if self.edge(edge).is_i_blocked() {
            return None;
        }
        let to = self.edge(edge).target();
        if !is_up_link && !self.node(to).is_nominal() {
            return None;
        }
        let role = self.edge(edge).role().expect("checked not i-blocked above");

        if self.edge(edge).is_reflexive(node) {
            return Some(self.add_role_label(node, node, is_up_link, role, roles, dep));
        }

        self.invalidate_edge(edge);

        let existing: &[EdgeId] = if is_up_link { self.node(node).parents() } else { self.node(node).children() };
        for &p in existing {
            if self.edge(p).target() == to {
                return Some(self.add_role_label(node, to, !is_up_link, role, roles, dep));
            }
        }
        Some(self.add_role_label(node, to, is_up_link, role, roles, dep))
    }

    /// Invalidate an edge (and its reverse), marking it i-blocked; returns
    /// the role it carried in case a caller needs to restore it.
    fn invalidate_edge(&mut self, edge: EdgeId) -> Option<RoleId> {
        let role = self.edge_mut(edge).invalidate();
        if let Some(rev) = self.edge(edge).reverse() {
            self.edge_mut(rev).invalidate();
        }
        role
    }

    /// Merge `from` into `to`: move every in-edge and every nominal-bound
    /// out-edge of `from` onto `to`, then purge what's left of `from`.
    /// Returns the edges newly created on `to` (callers replay these
    /// through whatever clash/cache machinery a fresh edge needs to go
    /// through) together with a trail of every node `purge` marked
    /// p-blocked, each tagged with the state it carried before — `p_blocker`
    /// isn't covered by `save`/`restore_to` (see the module doc comment on
    /// rare per-node state), so a caller that needs to undo this merge on
    /// backjump replays this trail in reverse via
    /// [`Node::unset_p_blocked`](Node::unset_p_blocked).
    pub fn merge(&mut self, from: NodeId, to: NodeId, roles: &RoleMaster, dep: DepSet) -> (Vec<EdgeId>, Vec<PurgeTrailEntry>) {
        let mut moved = Vec::new();

        let parents: SmallVec<[EdgeId; 2]> = self.node(from).parents().into();
        for p in parents {
            if let Some(e) = self.move_edge(to, p, true, roles, dep.clone()) {
                moved.push(e);
            }
        }
        let children: SmallVec<[EdgeId; 4]> = self.node(from).children().into();
        for c in children {
            if let Some(e) = self.move_edge(to, c, false, roles, dep.clone()) {
                moved.push(e);
            }
        }

        let mut purge_trail = Vec::new();
        self.purge(from, to, dep, &mut purge_trail);
        (moved, purge_trail)
    }

    /// Purge `node`, marking it merged into `root`; recurses into every
    /// blockable successor (nominal successors are left alone, only their
    /// connecting edge is invalidated). Every node actually purged (i.e.
    /// not already p-blocked) is appended to `trail` with its prior
    /// `p_blocker`/`purge_dep`, so a caller can undo the purge on backjump.
    pub fn purge(&mut self, node: NodeId, root: NodeId, dep: DepSet, trail: &mut Vec<PurgeTrailEntry>) {
        if self.node(node).is_p_blocked() {
            return;
        }
        let (prev_blocker, prev_dep) = self.node_mut(node).set_p_blocked(root, dep.clone());
        trail.push(PurgeTrailEntry { node, prev_blocker, prev_dep });

        let children: SmallVec<[EdgeId; 4]> = self.node(node).children().into();
        for c in children {
            let target = self.edge(c).target();
            if self.node(target).is_blockable() {
                self.purge(target, root, dep.clone(), trail);
            } else {
                self.invalidate_edge(c);
            }
        }
    }

    fn save_node(&mut self, node: NodeId) {
        let level = self.branching_level;
        let n = self.node_mut(node);
        if n.needs_save(level) {
            n.save(level);
            self.n_node_saves += 1;
        }
    }

    fn restore_node(&mut self, node: NodeId, level: u32) {
        let n = self.node_mut(node);
        if n.needs_restore(level) {
            n.restore_to(level);
            self.n_node_restores += 1;
        }
    }

    /// Push a save point and bump the branching level.
    pub fn save(&mut self) {
        self.saves.push(GraphSaveState {
            n_nodes: self.end_used,
            branching_level: self.branching_level,
        });
        self.branching_level += 1;
    }

    /// Restore graph-wide state to `level`, restoring every node that was
    /// touched since (every live node, since this crate doesn't track the
    /// original's "recently saved" shortlist).
    pub fn restore(&mut self, level: u32) {
        assert!(level > 0, "restore level must be positive");
        while let Some(top) = self.saves.last() {
            if top.branching_level <= level {
                break;
            }
            let ss = self.saves.pop().unwrap();
            self.end_used = ss.n_nodes;
        }
        self.branching_level = level;
        let end_used = self.end_used;
        for idx in 0..end_used {
            self.restore_node(NodeId(idx as u32), level);
        }
    }

    #[must_use]
    pub fn node_saves(&self) -> u64 {
        self.n_node_saves
    }

    #[must_use]
    pub fn node_restores(&self) -> u64 {
        self.n_node_restores
    }

    /// Mark `node` and every non-nominal, non-p-blocked descendant
    /// affected, stopping the walk as soon as it reaches an
    /// already-affected node.
    pub fn mark_affected_recursive(&mut self, node: NodeId) {
        if self.node(node).is_affected() || self.node(node).is_nominal() || self.node(node).is_p_blocked() {
            return;
        }
        self.node_mut(node).set_affected();
        let children: SmallVec<[EdgeId; 4]> = self.node(node).children().into();
        for c in children {
            let target = self.edge(c).target();
            if !self.edge(c).is_i_blocked() {
                self.mark_affected_recursive(target);
            }
        }
    }
}

impl Default for CompletionGraph {
    fn default() -> Self {
        CompletionGraph::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bipointer::Bp;

    fn roles_with_one_role() -> (RoleMaster, RoleId) {
        let mut rm = RoleMaster::new();
        let r = rm.ensure_role("r", false);
        (rm, r)
    }

    #[test]
    fn fresh_graph_has_a_single_root_node() {
        let g = CompletionGraph::new();
        assert_eq!(g.len(), 1);
        assert_eq!(g.root(), NodeId(0));
    }

    #[test]
    fn create_neighbour_links_parent_and_child() {
        let mut g = CompletionGraph::new();
        let (roles, r) = roles_with_one_role();
        let root = g.root();
        let (child, edge) = g.create_neighbour(root, false, r, &roles, DepSet::empty());
        assert_eq!(g.len(), 2);
        assert_eq!(g.edge(edge).target(), child);
        assert!(g.node(root).children().contains(&edge));
        let reverse = g.edge(edge).reverse().unwrap();
        assert!(g.node(child).parents().contains(&reverse));
    }

    #[test]
    fn add_role_label_reuses_an_existing_edge() {
        let mut g = CompletionGraph::new();
        let (roles, r) = roles_with_one_role();
        let root = g.root();
        let (child, _) = g.create_neighbour(root, false, r, &roles, DepSet::singleton(1));
        let before = g.edges.len();
        let edge = g.add_role_label(root, child, false, r, &roles, DepSet::singleton(2));
        assert_eq!(g.edges.len(), before);
        assert!(g.edge(edge).dep().contains(1));
        assert!(g.edge(edge).dep().contains(2));
    }

    #[test]
    fn purge_marks_node_p_blocked_and_recurses_into_blockable_children() {
        let mut g = CompletionGraph::new();
        let (roles, r) = roles_with_one_role();
        let root = g.root();
        let (child, _) = g.create_neighbour(root, false, r, &roles, DepSet::empty());
        let (grandchild, _) = g.create_neighbour(child, false, r, &roles, DepSet::empty());

        let mut trail = Vec::new();
        g.purge(child, root, DepSet::singleton(1), &mut trail);
        assert!(g.node(child).is_p_blocked());
        assert_eq!(trail.len(), 2);
        assert!(g.node(grandchild).is_p_blocked());
        assert_eq!(g.node(child).p_blocker(), Some(root));
    }

    #[test]
    fn save_restore_truncates_nodes_allocated_after_the_save_point() {
        let mut g = CompletionGraph::new();
        let (roles, r) = roles_with_one_role();
        let root = g.root();

        g.save();
        let level = g.branching_level;
        g.create_neighbour(root, false, r, &roles, DepSet::empty());
        assert_eq!(g.len(), 2);

        g.restore(level - 1);
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn add_concept_marks_the_node_affected() {
        let mut g = CompletionGraph::new();
        let root = g.root();
        g.node_mut(root).clear_affected();
        g.add_concept(root, ConceptWDep::new(Bp::create(1, true), DepSet::empty()), DagTag::PConcept);
        assert!(g.node(root).is_affected());
        assert!(g.node(root).label().contains_sc(Bp::create(1, true)));
    }
}
