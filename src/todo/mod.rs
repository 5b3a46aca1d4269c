//! The ToDo worklist: per-operator priority queues that feed the tableau's
//! expansion loop.
//!
//! Every concept added to a node's label is routed, by its DAG tag and
//! polarity, into one of the regular priority queues, the ID queue
//! (primitive/defined-name expansion, always highest priority), or the NN
//! queue (`<= n R.C` inside a nominal node, kept ordered by nominal level so
//! merges of lower-numbered nominals are attempted first).

use crate::dag::DagTag;
use crate::depset::Level;
use crate::error::{ReasonerError, Result};
use crate::graph::NodeId;

/// Number of ordinary (non-ID, non-NN) priority queues.
pub const N_REGULAR_OPS: usize = 7;

/// One entry in the ToDo table: a node plus the signed label offset of the
/// concept that needs expanding (see `CGLabel::concept`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToDoEntry {
    pub node: NodeId,
    pub offset: i32,
}

/// Which queue an `(operator, sign, in-a-nominal-node)` combination routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Regular(usize),
    Id,
    Nn,
    Skip,
}

/// Assigns each `(operator, sign, nominal-ness)` combination a queue index,
/// built from a 6-digit priority string — positions `1..=6` give
/// `And/Or/Exists/Forall/Le/Ge`, each a digit in `0..N_REGULAR_OPS` (position
/// `0` is reserved, matching the layout of the original's option string).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityMatrix {
    i_and: usize,
    i_or: usize,
    i_exists: usize,
    i_forall: usize,
    i_le: usize,
    i_ge: usize,
}

impl PriorityMatrix {
    /// Parse an explicit priority assignment.
    pub fn parse(options: &str) -> Result<Self> {
        let bytes = options.as_bytes();
        if bytes.len() < 7 {
            return Err(ReasonerError::InvariantBreach(format!(
                "ToDo priority string '{options}' must have at least 7 characters"
            )));
        }
        let digit = |pos: usize| -> Result<usize> {
            let c = bytes[pos];
            if !c.is_ascii_digit() {
                return Err(ReasonerError::InvariantBreach(format!(
                    "ToDo priority string '{options}' has a non-digit at position {pos}"
                )));
            }
            let d = (c - b'0') as usize;
            if d >= N_REGULAR_OPS {
                return Err(ReasonerError::InvariantBreach(format!(
                    "ToDo priority string '{options}' position {pos} is out of range"
                )));
            }
            Ok(d)
        };
        Ok(PriorityMatrix {
            i_and: digit(1)?,
            i_or: digit(2)?,
            i_exists: digit(3)?,
            i_forall: digit(4)?,
            i_le: digit(5)?,
            i_ge: digit(6)?,
        })
    }

    fn route(&self, tag: DagTag, sign: bool, nominal_node: bool) -> Route {
        use DagTag::{And, Collection, DataExpr, DataType, DataValue, Forall, Irr, Le, NConcept, NSingleton, PConcept, PSingleton, Top, UAll};
        match tag {
            And | Collection => Route::Regular(if sign { self.i_and } else { self.i_or }),
            Forall | UAll | Irr => Route::Regular(if sign { self.i_forall } else { self.i_exists }),
            Le => {
                if sign {
                    if nominal_node {
                        Route::Nn
                    } else {
                        Route::Regular(self.i_le)
                    }
                } else {
                    Route::Regular(self.i_ge)
                }
            }
            DataType | DataValue | DataExpr | Top => Route::Skip,
            PSingleton | PConcept => {
                if sign {
                    Route::Id
                } else {
                    Route::Skip
                }
            }
            NSingleton | NConcept => Route::Id,
        }
    }
}

impl Default for PriorityMatrix {
    /// A plain ascending assignment (`And=0, Or=1, ...`); real sessions
    /// should build theirs from configuration via [`PriorityMatrix::parse`].
    fn default() -> Self {
        PriorityMatrix {
            i_and: 0,
            i_or: 1,
            i_exists: 2,
            i_forall: 3,
            i_le: 4,
            i_ge: 5,
        }
    }
}

/// A save point for an [`ArrayQueue`]/[`NnQueue`]'s append-only history.
#[derive(Debug, Clone, Copy, Default)]
struct QueueSaveState {
    sp: usize,
    ep: usize,
}

/// A plain FIFO queue: entries are only ever appended, so save/restore is a
/// cheap (start-pointer, length) pair.
#[derive(Debug, Clone, Default)]
struct ArrayQueue {
    wait: Vec<ToDoEntry>,
    s_pointer: usize,
}

impl ArrayQueue {
    fn add(&mut self, entry: ToDoEntry) {
        self.wait.push(entry);
    }

    fn clear(&mut self) {
        self.s_pointer = 0;
        self.wait.clear();
    }

    fn is_empty(&self) -> bool {
        self.s_pointer == self.wait.len()
    }

    fn get(&mut self) -> ToDoEntry {
        let e = self.wait[self.s_pointer];
        self.s_pointer += 1;
        e
    }

    fn save(&self) -> QueueSaveState {
        QueueSaveState { sp: self.s_pointer, ep: self.wait.len() }
    }

    fn restore(&mut self, ss: QueueSaveState) {
        self.s_pointer = ss.sp;
        self.wait.truncate(ss.ep);
    }
}

/// A snapshot of [`NnQueue`] taken immediately before an out-of-order
/// insertion, so the insertion can be undone even though it breaks the
/// append-only invariant [`ArrayQueue`]'s save/restore relies on.
#[derive(Debug, Clone)]
struct NnReorder {
    level: Level,
    wait: Vec<(ToDoEntry, u32)>,
    s_pointer: usize,
}

/// The `<= n R.C`-in-a-nominal-node queue: kept sorted by ascending nominal
/// level so number-restriction merges are attempted on lower-numbered
/// nominals first. Entries normally just append like [`ArrayQueue`]; only
/// an out-of-order insertion needs the heavier [`NnReorder`] snapshot.
#[derive(Debug, Clone, Default)]
struct NnQueue {
    wait: Vec<(ToDoEntry, u32)>,
    s_pointer: usize,
    reorders: Vec<NnReorder>,
}

impl NnQueue {
    fn add(&mut self, entry: ToDoEntry, nominal_key: u32, level: Level) {
        if self.wait.last().map_or(true, |(_, key)| *key <= nominal_key) {
            self.wait.push((entry, nominal_key));
            return;
        }

        self.reorders.push(NnReorder { level, wait: self.wait.clone(), s_pointer: self.s_pointer });
        let mut n = self.wait.len();
        self.wait.push((entry, nominal_key));
        while n > self.s_pointer && self.wait[n - 1].1 > nominal_key {
            self.wait[n] = self.wait[n - 1];
            n -= 1;
        }
        self.wait[n] = (entry, nominal_key);
    }

    fn clear(&mut self) {
        self.s_pointer = 0;
        self.wait.clear();
        self.reorders.clear();
    }

    fn is_empty(&self) -> bool {
        self.s_pointer == self.wait.len()
    }

    fn get(&mut self) -> ToDoEntry {
        let e = self.wait[self.s_pointer].0;
        self.s_pointer += 1;
        e
    }

    fn save(&self) -> QueueSaveState {
        QueueSaveState { sp: self.s_pointer, ep: self.wait.len() }
    }

    fn restore(&mut self, ss: QueueSaveState) {
        self.s_pointer = ss.sp;
        self.wait.truncate(ss.ep);
    }

    /// Undo every out-of-order insertion performed at a level deeper than
    /// `level`, restoring the queue to the shape it had before them. Must
    /// run before a regular length-based [`NnQueue::restore`], since that
    /// truncation assumes a length a reorder may have since invalidated.
    fn restore_rare(&mut self, level: Level) {
        while let Some(top) = self.reorders.last() {
            if top.level <= level {
                break;
            }
            let r = self.reorders.pop().expect("just peeked");
            self.wait = r.wait;
            self.s_pointer = r.s_pointer;
        }
    }
}

/// A save point for the whole [`ToDoList`].
#[derive(Debug, Clone, Copy)]
struct ToDoSaveState {
    id: QueueSaveState,
    nn: QueueSaveState,
    regular: [QueueSaveState; N_REGULAR_OPS],
    noe: usize,
}

/// The complete ToDo table: one ID queue, one NN queue, and
/// [`N_REGULAR_OPS`] regular operator queues, drained in that priority
/// order by [`ToDoList::next_entry`].
#[derive(Debug)]
pub struct ToDoList {
    queue_id: ArrayQueue,
    queue_nn: NnQueue,
    regular: [ArrayQueue; N_REGULAR_OPS],
    matrix: PriorityMatrix,
    noe: usize,
    saves: Vec<ToDoSaveState>,
    level: Level,
}

impl ToDoList {
    #[must_use]
    pub fn new(matrix: PriorityMatrix) -> Self {
        ToDoList {
            queue_id: ArrayQueue::default(),
            queue_nn: NnQueue::default(),
            regular: std::array::from_fn(|_| ArrayQueue::default()),
            matrix,
            noe: 0,
            saves: Vec::new(),
            level: 1,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.noe == 0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.noe
    }

    pub fn clear(&mut self) {
        self.queue_id.clear();
        self.queue_nn.clear();
        for q in &mut self.regular {
            q.clear();
        }
        self.saves.clear();
        self.noe = 0;
        self.level = 1;
    }

    /// Route a concept tagged `tag` (with polarity `sign`) attached to
    /// `node` at `offset` into the appropriate queue; a no-op for operators
    /// that need no further expansion (`Top`, data vertices, a primitive
    /// name's negation). `nominal_node`/`nominal_key` are the node's own
    /// `is_nominal()`/`nominal_level()` (`u32::MAX` for a blockable node),
    /// queried by the caller so this module stays independent of the graph
    /// representation.
    pub fn add_entry(&mut self, node: NodeId, tag: DagTag, sign: bool, nominal_node: bool, nominal_key: u32, offset: i32) {
        let entry = ToDoEntry { node, offset };
        match self.matrix.route(tag, sign, nominal_node) {
            Route::Skip => {}
            Route::Id => {
                self.queue_id.add(entry);
                self.noe += 1;
            }
            Route::Nn => {
                self.queue_nn.add(entry, nominal_key, self.level);
                self.noe += 1;
            }
            Route::Regular(i) => {
                self.regular[i].add(entry);
                self.noe += 1;
            }
        }
    }

    /// Pop the next entry in priority order (ID, then NN, then regular
    /// queues in index order), or `None` if the table is empty.
    pub fn next_entry(&mut self) -> Option<ToDoEntry> {
        if self.noe == 0 {
            return None;
        }
        self.noe -= 1;
        if !self.queue_id.is_empty() {
            return Some(self.queue_id.get());
        }
        if !self.queue_nn.is_empty() {
            return Some(self.queue_nn.get());
        }
        for q in &mut self.regular {
            if !q.is_empty() {
                return Some(q.get());
            }
        }
        unreachable!("noe was nonzero but every queue was empty")
    }

    /// Push a save point and bump the branching level.
    pub fn save(&mut self) {
        self.saves.push(ToDoSaveState {
            id: self.queue_id.save(),
            nn: self.queue_nn.save(),
            regular: std::array::from_fn(|i| self.regular[i].save()),
            noe: self.noe,
        });
        self.level += 1;
    }

    /// Restore the table to the state it had right after the `level`'th
    /// [`ToDoList::save`] call.
    pub fn restore(&mut self, level: Level) {
        assert!(level >= 1, "restore level must be positive");
        self.queue_nn.restore_rare(level);
        let idx = (level - 1) as usize;
        assert!(idx < self.saves.len(), "no saved ToDo state for level {level}");
        let ss = self.saves[idx];
        self.saves.truncate(idx);
        self.queue_id.restore(ss.id);
        self.queue_nn.restore(ss.nn);
        for (q, s) in self.regular.iter_mut().zip(ss.regular.iter()) {
            q.restore(*s);
        }
        self.noe = ss.noe;
        self.level = level;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(id: u32) -> NodeId {
        NodeId(id)
    }

    #[test]
    fn primitive_concept_routes_to_id_queue_only_when_positive() {
        let m = PriorityMatrix::default();
        assert_eq!(m.route(DagTag::PConcept, true, false), Route::Id);
        assert_eq!(m.route(DagTag::PConcept, false, false), Route::Skip);
        assert_eq!(m.route(DagTag::NConcept, false, false), Route::Id);
    }

    #[test]
    fn le_routes_to_nn_only_when_positive_and_nominal() {
        let m = PriorityMatrix::default();
        assert_eq!(m.route(DagTag::Le, true, true), Route::Nn);
        assert_eq!(m.route(DagTag::Le, true, false), Route::Regular(m.i_le));
        assert_eq!(m.route(DagTag::Le, false, true), Route::Regular(m.i_ge));
    }

    #[test]
    fn entries_drain_id_before_nn_before_regular() {
        let mut list = ToDoList::new(PriorityMatrix::default());
        list.add_entry(n(1), DagTag::Forall, true, false, u32::MAX, 0);
        list.add_entry(n(2), DagTag::Le, true, true, 5, 0);
        list.add_entry(n(3), DagTag::PConcept, true, false, u32::MAX, 0);

        assert_eq!(list.next_entry().unwrap().node, n(3));
        assert_eq!(list.next_entry().unwrap().node, n(2));
        assert_eq!(list.next_entry().unwrap().node, n(1));
        assert!(list.next_entry().is_none());
    }

    #[test]
    fn nn_queue_sorts_by_ascending_nominal_level() {
        let mut list = ToDoList::new(PriorityMatrix::default());
        list.add_entry(n(1), DagTag::Le, true, true, 3, 0);
        list.add_entry(n(2), DagTag::Le, true, true, 1, 0);
        list.add_entry(n(3), DagTag::Le, true, true, 2, 0);

        assert_eq!(list.next_entry().unwrap().node, n(1));
        assert_eq!(list.next_entry().unwrap().node, n(3));
        assert_eq!(list.next_entry().unwrap().node, n(2));
    }

    #[test]
    fn save_restore_undoes_entries_added_after_the_save_point() {
        let mut list = ToDoList::new(PriorityMatrix::default());
        list.add_entry(n(1), DagTag::PConcept, true, false, u32::MAX, 0);
        list.save();
        let level = list.level;
        list.add_entry(n(2), DagTag::PConcept, true, false, u32::MAX, 0);
        list.add_entry(n(3), DagTag::Le, true, true, 1, 0);
        assert_eq!(list.len(), 3);

        list.restore(level - 1);
        assert_eq!(list.len(), 1);
        assert_eq!(list.next_entry().unwrap().node, n(1));
        assert!(list.next_entry().is_none());
    }

    #[test]
    fn save_restore_undoes_an_nn_reorder_across_the_save_point() {
        let mut list = ToDoList::new(PriorityMatrix::default());
        list.add_entry(n(1), DagTag::Le, true, true, 5, 0);
        list.save();
        let level = list.level;
        // Out of order wrt the level-5 entry already queued: triggers a reorder.
        list.add_entry(n(2), DagTag::Le, true, true, 1, 0);
        assert_eq!(list.len(), 2);

        list.restore(level - 1);
        assert_eq!(list.len(), 1);
        assert_eq!(list.next_entry().unwrap().node, n(1));
    }
}
