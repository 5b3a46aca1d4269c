//! Role automata: the finite automata over role names that encode complex
//! role inclusion axioms (`R1 o R2 o ... o Rn [= S`) for SROIQ's regular RBox.
//!
//! A role is *simple* iff its automaton has exactly two states and is both
//! input- and output-safe — number restrictions, `Self`, and the universal
//! role's negation may only be built over simple roles (see
//! [`crate::error::ReasonerError::NonSimpleRoleMisuse`]).

use std::collections::HashSet;

use super::RoleId;

/// A state in a [`RoleAutomaton`].
pub type RAState = u32;

/// A (possibly multi-role) labelled transition to a target state.
#[derive(Debug, Clone)]
pub struct RATransition {
    label: Vec<RoleId>,
    state: RAState,
}

impl RATransition {
    #[must_use]
    pub fn to(state: RAState) -> Self {
        RATransition { label: Vec::new(), state }
    }

    #[must_use]
    pub fn labelled(state: RAState, role: RoleId) -> Self {
        RATransition { label: vec![role], state }
    }

    pub fn add(&mut self, role: RoleId) {
        self.label.push(role);
    }

    pub fn add_label_of(&mut self, other: &RATransition) {
        self.label.extend(other.label.iter().copied());
    }

    /// Add `other`'s label, skipping roles already applicable here.
    pub fn add_if_new(&mut self, other: &RATransition) {
        for &r in &other.label {
            if !self.applicable(r) {
                self.add(r);
            }
        }
    }

    #[must_use]
    pub fn final_state(&self) -> RAState {
        self.state
    }

    #[must_use]
    pub fn applicable(&self, role: RoleId) -> bool {
        self.label.contains(&role)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.label.is_empty()
    }

    #[must_use]
    pub fn roles(&self) -> &[RoleId] {
        &self.label
    }
}

/// Every transition leaving a single automaton state.
#[derive(Debug, Clone, Default)]
pub struct RaStateTransitions {
    transitions: Vec<RATransition>,
    applicable_roles: HashSet<u32>,
    has_empty_transition: bool,
}

impl RaStateTransitions {
    pub fn add(&mut self, trans: RATransition) {
        if trans.is_empty() {
            self.has_empty_transition = true;
        }
        self.applicable_roles.extend(trans.roles().iter().map(|r| r.0));
        self.transitions.push(trans);
    }

    /// Merge `trans`'s label into an existing transition to the same target
    /// state; returns `false` if no such transition exists yet.
    pub fn add_to_existing(&mut self, trans: &RATransition) -> bool {
        if let Some(existing) = self.transitions.iter_mut().find(|t| t.final_state() == trans.final_state()) {
            existing.add_if_new(trans);
            self.applicable_roles.extend(trans.roles().iter().map(|r| r.0));
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn recognises(&self, role: RoleId) -> bool {
        self.applicable_roles.contains(&role.0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    #[must_use]
    pub fn has_empty_transition(&self) -> bool {
        self.has_empty_transition
    }

    #[must_use]
    pub fn is_singleton(&self) -> bool {
        self.transitions.len() == 1
    }

    #[must_use]
    pub fn transitions(&self) -> &[RATransition] {
        &self.transitions
    }
}

/// The automaton attached to a role, built up by chaining in the automata of
/// its sub-roles and role-inclusion compositions.
#[derive(Debug, Clone)]
pub struct RoleAutomaton {
    states: Vec<RaStateTransitions>,
    chain_cursor: RAState,
    i_safe: bool,
    o_safe: bool,
    completed: bool,
}

impl RoleAutomaton {
    /// A fresh automaton with just the initial/final states and no
    /// transitions yet (the trivial `R [= R` self-loop is added by the role
    /// that owns this automaton, once its own `RoleId` is known).
    #[must_use]
    pub fn new() -> Self {
        RoleAutomaton {
            states: vec![RaStateTransitions::default(), RaStateTransitions::default()],
            chain_cursor: 0,
            i_safe: true,
            o_safe: true,
            completed: false,
        }
    }

    #[must_use]
    pub fn initial(&self) -> RAState {
        0
    }

    #[must_use]
    pub fn final_state(&self) -> RAState {
        1
    }

    fn ensure_state(&mut self, state: RAState) {
        let needed = state as usize + 1;
        if needed > self.states.len() {
            self.states.resize_with(needed, RaStateTransitions::default);
        }
    }

    pub fn new_state(&mut self) -> RAState {
        let id = self.states.len() as RAState;
        self.ensure_state(id);
        id
    }

    fn check_transition(&mut self, from: RAState, to: RAState) {
        if from == self.final_state() {
            self.o_safe = false;
        }
        if to == self.initial() {
            self.i_safe = false;
        }
    }

    /// Add a transition from `from`, growing the automaton to fit both ends.
    pub fn add_transition_safe(&mut self, from: RAState, trans: RATransition) {
        self.ensure_state(from);
        self.ensure_state(trans.final_state());
        self.check_transition(from, trans.final_state());
        self.states[from as usize].add(trans);
    }

    /// The trivial `from -> final` transition labelled with `role`, added by
    /// every role for itself (`R [= R`).
    pub fn add_trivial_transition(&mut self, role: RoleId) {
        let final_state = self.final_state();
        self.add_transition_safe(self.initial(), RATransition::labelled(final_state, role));
    }

    pub fn init_chain(&mut self, from: RAState) {
        self.chain_cursor = from;
    }

    pub fn next_chain_transition(&mut self, to: RAState) {
        let cursor = self.chain_cursor;
        self.add_transition_safe(cursor, RATransition::to(to));
        self.chain_cursor = to;
    }

    /// Append `other`'s automaton onto the current chain cursor, remapping
    /// its states into fresh ones of `self`; `o_safe` reports whether the
    /// automaton chained so far is output-safe (propagated to `self`).
    pub fn add_to_chain(&mut self, other: &RoleAutomaton, o_safe: bool, final_of_chain: RAState) {
        if !o_safe {
            self.o_safe = false;
        }
        let mut remap = vec![0 as RAState; other.states.len()];
        remap[other.initial() as usize] = self.chain_cursor;
        remap[other.final_state() as usize] = final_of_chain;
        for (idx, state) in remap.iter_mut().enumerate() {
            let idx = idx as RAState;
            if idx != other.initial() && idx != other.final_state() {
                *state = self.new_state();
            }
        }
        for (from_idx, sts) in other.states.iter().enumerate() {
            let from = remap[from_idx];
            for trans in sts.transitions() {
                let to = remap[trans.final_state() as usize];
                let mut copied = RATransition::to(to);
                copied.label = trans.roles().to_vec();
                self.add_transition_safe(from, copied);
            }
        }
        self.chain_cursor = final_of_chain;
    }

    /// Add a sub-role's completed automaton to `self`: merged into the
    /// initial state's existing transition if `other` is simple, chained in
    /// as a sub-automaton otherwise.
    pub fn add_role_automaton(&mut self, other: &RoleAutomaton) {
        debug_assert!(!self.completed, "automaton extended after completion");
        if other.is_simple() {
            let initial = self.initial();
            let final_state = self.final_state();
            let trivial = other.states[other.initial() as usize]
                .transitions()
                .iter()
                .find(|t| t.final_state() == other.final_state())
                .cloned()
                .unwrap_or_else(|| RATransition::to(final_state));
            if !self.states[initial as usize].add_to_existing(&trivial) {
                self.add_transition_safe(initial, trivial);
            }
        } else {
            let initial = self.initial();
            let final_state = self.final_state();
            self.init_chain(initial);
            self.add_to_chain(other, false, final_state);
        }
    }

    /// Merge `trans` into the initial state's existing transition to the
    /// same target, or add it fresh if there is none yet.
    pub fn add_transition_to_initial(&mut self, trans: RATransition) {
        let initial = self.initial() as usize;
        if !self.states[initial].add_to_existing(&trans) {
            self.add_transition_safe(initial as RAState, trans);
        }
    }

    pub fn set_completed(&mut self) {
        self.completed = true;
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn is_i_safe(&self) -> bool {
        self.i_safe
    }

    #[must_use]
    pub fn is_o_safe(&self) -> bool {
        self.o_safe
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.states.len()
    }

    /// `true` iff this automaton has exactly two states and is fully safe —
    /// the condition under which a role may be used in number restrictions.
    #[must_use]
    pub fn is_simple(&self) -> bool {
        debug_assert!(self.completed, "isSimple() queried before completion");
        self.size() == 2 && self.i_safe && self.o_safe
    }

    #[must_use]
    pub fn state(&self, state: RAState) -> &RaStateTransitions {
        &self.states[state as usize]
    }
}

impl Default for RoleAutomaton {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_automaton_with_trivial_transition_is_simple() {
        let mut a = RoleAutomaton::new();
        a.add_trivial_transition(RoleId(0));
        a.set_completed();
        assert!(a.is_simple());
    }

    #[test]
    fn chained_sub_role_breaks_output_safety() {
        let mut sub = RoleAutomaton::new();
        sub.add_trivial_transition(RoleId(1));
        sub.set_completed();

        let mut sup = RoleAutomaton::new();
        sup.add_trivial_transition(RoleId(0));
        // A composition R.S [= Sup makes Sup's automaton longer than 2 states.
        let mid = sup.new_state();
        sup.init_chain(sup.initial());
        sup.next_chain_transition(mid);
        sup.add_role_automaton(&sub);
        sup.set_completed();
        assert!(sup.size() > 2 || !sup.is_o_safe());
    }
}
