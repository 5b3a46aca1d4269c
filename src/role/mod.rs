//! Roles and the role hierarchy: `TRole`/`RoleMaster` of the original,
//! reshaped as an index-based arena instead of a pointer graph.
//!
//! Every role name `R` is stored alongside its inverse `R^-` as two entries
//! that point back at each other; asking a role for `functional`,
//! `transitive`, etc. is always really asking about the pair, since the
//! spec's semantics make those properties inverse-symmetric.

pub mod automaton;

use std::collections::{HashMap, HashSet};

use crate::bipointer::Bp;
use crate::error::{ReasonerError, Result};
use automaton::{RAState, RATransition, RoleAutomaton};

/// An index into [`RoleMaster`]'s role table. `R` and `R^-` are distinct
/// `RoleId`s, each pointing at the other via `Role::inverse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoleId(pub u32);

/// A three-valued flag: unset, or set to `true`/`false` — mirrors
/// `TRole::TKnownValue`, distinguishing "not yet told" from "told false".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KnownFlag(Option<bool>);

impl KnownFlag {
    #[must_use]
    pub fn is_known(self) -> bool {
        self.0.is_some()
    }

    #[must_use]
    pub fn value(self) -> bool {
        self.0.unwrap_or(false)
    }

    pub fn set(&mut self, value: bool) {
        self.0 = Some(value);
    }
}

/// A single DL role (object- or data-property) name.
#[derive(Debug)]
pub struct Role {
    id: RoleId,
    name: String,
    inverse: RoleId,
    is_data_role: bool,
    functional: KnownFlag,
    symmetric: KnownFlag,
    asymmetric: KnownFlag,
    transitive: KnownFlag,
    reflexive: KnownFlag,
    irreflexive: KnownFlag,
    domain: Option<Bp>,
    functional_vertex: Option<Bp>,
    has_special_domain: bool,
    ancestors: Vec<RoleId>,
    descendants: Vec<RoleId>,
    top_functional_super: Vec<RoleId>,
    disjoint: HashSet<RoleId>,
    sub_compositions: Vec<Vec<RoleId>>,
    ancestor_bitmap: Vec<bool>,
    disjoint_bitmap: Vec<bool>,
    automaton: RoleAutomaton,
}

impl Role {
    fn new(id: RoleId, inverse: RoleId, name: String, is_data_role: bool) -> Self {
        let mut automaton = RoleAutomaton::new();
        automaton.add_trivial_transition(id);
        Role {
            id,
            name,
            inverse,
            is_data_role,
            functional: KnownFlag::default(),
            symmetric: KnownFlag::default(),
            asymmetric: KnownFlag::default(),
            transitive: KnownFlag::default(),
            reflexive: KnownFlag::default(),
            irreflexive: KnownFlag::default(),
            domain: None,
            functional_vertex: None,
            has_special_domain: false,
            ancestors: Vec::new(),
            descendants: Vec::new(),
            top_functional_super: Vec::new(),
            disjoint: HashSet::new(),
            sub_compositions: Vec::new(),
            ancestor_bitmap: Vec::new(),
            disjoint_bitmap: Vec::new(),
            automaton,
        }
    }

    #[must_use]
    pub fn id(&self) -> RoleId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn inverse(&self) -> RoleId {
        self.inverse
    }

    #[must_use]
    pub fn is_data_role(&self) -> bool {
        self.is_data_role
    }

    #[must_use]
    pub fn is_functional(&self) -> bool {
        self.functional.value()
    }

    #[must_use]
    pub fn is_transitive(&self) -> bool {
        self.transitive.value()
    }

    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        self.symmetric.value()
    }

    #[must_use]
    pub fn is_asymmetric(&self) -> bool {
        self.asymmetric.value()
    }

    #[must_use]
    pub fn is_reflexive(&self) -> bool {
        self.reflexive.value()
    }

    #[must_use]
    pub fn is_irreflexive(&self) -> bool {
        self.irreflexive.value()
    }

    #[must_use]
    pub fn is_simple(&self) -> bool {
        self.automaton.is_simple()
    }

    #[must_use]
    pub fn is_top_func(&self) -> bool {
        self.top_functional_super.first() == Some(&self.id)
    }

    #[must_use]
    pub fn is_disjoint(&self) -> bool {
        !self.disjoint.is_empty()
    }

    #[must_use]
    pub fn is_disjoint_with(&self, other: RoleId) -> bool {
        self.disjoint_bitmap.get(other.0 as usize).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn ancestors(&self) -> &[RoleId] {
        &self.ancestors
    }

    #[must_use]
    pub fn descendants(&self) -> &[RoleId] {
        &self.descendants
    }

    /// `true` iff `self` is a (non-strict) sub-role of `other`, using the
    /// ancestor bitmap built by `RoleMaster::finish_construction`.
    #[must_use]
    pub fn is_sub_role_of(&self, other: RoleId) -> bool {
        self.id == other || self.ancestor_bitmap.get(other.0 as usize).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn domain(&self) -> Option<Bp> {
        self.domain
    }

    #[must_use]
    pub fn functional_vertex(&self) -> Option<Bp> {
        self.functional_vertex
    }

    #[must_use]
    pub fn has_special_domain(&self) -> bool {
        self.has_special_domain
    }

    #[must_use]
    pub fn automaton(&self) -> &RoleAutomaton {
        &self.automaton
    }

    /// Role consistency per §4.1: a non-simple role cannot be functional,
    /// cannot be a data role, and cannot be disjoint with anything.
    fn check_consistent(&self) -> Result<()> {
        if self.is_simple() {
            return Ok(());
        }
        if self.is_functional() || self.is_data_role || self.is_disjoint() {
            return Err(ReasonerError::NonSimpleRoleMisuse(self.name.clone()));
        }
        Ok(())
    }
}

/// Owns every role name in a session and the hierarchy between them.
#[derive(Debug, Default)]
pub struct RoleMaster {
    roles: Vec<Role>,
    by_name: HashMap<String, RoleId>,
    completed: bool,
}

impl RoleMaster {
    #[must_use]
    pub fn new() -> Self {
        RoleMaster::default()
    }

    /// Look up a role by name, creating it (and its inverse) if this is the
    /// first mention.
    pub fn ensure_role(&mut self, name: &str, is_data_role: bool) -> RoleId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let fwd_id = RoleId(self.roles.len() as u32);
        let inv_id = RoleId(self.roles.len() as u32 + 1);
        let fwd = Role::new(fwd_id, inv_id, name.to_string(), is_data_role);
        let inv = Role::new(inv_id, fwd_id, format!("inv({name})"), is_data_role);
        self.roles.push(fwd);
        self.roles.push(inv);
        self.by_name.insert(name.to_string(), fwd_id);
        fwd_id
    }

    #[must_use]
    pub fn get(&self, id: RoleId) -> &Role {
        &self.roles[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: RoleId) -> &mut Role {
        &mut self.roles[id.0 as usize]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn by_name(&self, name: &str) -> Option<RoleId> {
        self.by_name.get(name).copied()
    }

    fn set_both(&mut self, id: RoleId, apply: impl Fn(&mut Role, bool), value: bool) {
        let inv = self.get(id).inverse();
        apply(self.get_mut(id), value);
        apply(self.get_mut(inv), value);
    }

    pub fn set_functional(&mut self, id: RoleId) {
        self.get_mut(id).functional.set(true);
        if self.get(id).top_functional_super.is_empty() {
            self.get_mut(id).top_functional_super.push(id);
        }
    }

    pub fn set_functional_vertex(&mut self, id: RoleId, vertex: Bp) {
        self.get_mut(id).functional_vertex = Some(vertex);
    }

    pub fn set_transitive(&mut self, id: RoleId, value: bool) {
        self.set_both(id, |r, v| r.transitive.set(v), value);
    }

    pub fn set_symmetric(&mut self, id: RoleId, value: bool) {
        self.set_both(id, |r, v| r.symmetric.set(v), value);
    }

    pub fn set_asymmetric(&mut self, id: RoleId, value: bool) {
        self.set_both(id, |r, v| r.asymmetric.set(v), value);
    }

    pub fn set_reflexive(&mut self, id: RoleId, value: bool) {
        self.set_both(id, |r, v| r.reflexive.set(v), value);
    }

    pub fn set_irreflexive(&mut self, id: RoleId, value: bool) {
        self.set_both(id, |r, v| r.irreflexive.set(v), value);
    }

    pub fn set_domain(&mut self, id: RoleId, domain: Bp) {
        self.get_mut(id).domain = Some(domain);
    }

    pub fn set_special_domain(&mut self, id: RoleId) {
        self.get_mut(id).has_special_domain = true;
    }

    /// `R` is declared a synonym of `S`: every axiom about `R` is folded
    /// into `S`'s entry. This crate keeps the pair distinct but records `R`
    /// as a trivial sub/super-role of `S` in both directions, which gives
    /// the same subsumption answers without a union-find rewrite pass.
    pub fn add_role_synonym(&mut self, r: RoleId, s: RoleId) {
        self.add_role_subsumption(r, s);
        self.add_role_subsumption(s, r);
    }

    /// Record `sub [= sup` (a simple role inclusion axiom); told ancestors
    /// are accumulated here and flattened into bitmaps by
    /// `finish_construction`.
    pub fn add_role_subsumption(&mut self, sub: RoleId, sup: RoleId) {
        if sub == sup {
            return;
        }
        self.get_mut(sub).ancestors.push(sup);
        self.get_mut(sup).descendants.push(sub);
        let trivial = self.get(sub).automaton.state(0).transitions().first().cloned();
        if let Some(trivial) = trivial {
            self.merge_sub_automaton(sup, &trivial);
        }
    }

    fn merge_sub_automaton(&mut self, sup: RoleId, sub_trivial: &RATransition) {
        let final_state = self.get(sup).automaton.final_state();
        let mut trans = RATransition::to(final_state);
        for &r in sub_trivial.roles() {
            trans.add(r);
        }
        self.get_mut(sup).automaton.add_transition_to_initial(trans);
    }

    /// Record a complex role inclusion `R1 o R2 o ... o Rn [= sup`.
    pub fn add_role_composition(&mut self, sup: RoleId, chain: &[RoleId]) {
        self.get_mut(sup).sub_compositions.push(chain.to_vec());
    }

    /// `r` and `s` (and, transitively, everything under `s`) are pairwise
    /// disjoint.
    pub fn add_disjoint_roles(&mut self, r: RoleId, s: RoleId) {
        self.get_mut(r).disjoint.insert(s);
        self.get_mut(s).disjoint.insert(r);
        let s_descendants = self.get(s).descendants.clone();
        for d in s_descendants {
            self.get_mut(r).disjoint.insert(d);
            self.get_mut(d).disjoint.insert(r);
        }
        let r_descendants = self.get(r).descendants.clone();
        for d in r_descendants {
            self.get_mut(s).disjoint.insert(d);
            self.get_mut(d).disjoint.insert(s);
        }
    }

    /// Complete every role's automaton (chaining in sub-role and
    /// composition automata, checking i-/o-safety), then freeze the
    /// ancestor/disjoint bitmaps used by `Role::is_sub_role_of`/`is_disjoint_with`.
    pub fn finish_construction(&mut self) -> Result<()> {
        let n = self.roles.len();
        for i in 0..n {
            let id = RoleId(i as u32);
            let mut in_process = HashSet::new();
            self.complete_automaton(id, &mut in_process)?;
        }
        self.close_told_hierarchy();
        for i in 0..n {
            let id = RoleId(i as u32);
            let mut bitmap = vec![false; n];
            for &anc in &self.get(id).ancestors.clone() {
                bitmap[anc.0 as usize] = true;
            }
            self.get_mut(id).ancestor_bitmap = bitmap;
        }
        for i in 0..n {
            let id = RoleId(i as u32);
            let mut bitmap = vec![false; n];
            for &d in &self.get(id).disjoint.clone() {
                bitmap[d.0 as usize] = true;
            }
            self.get_mut(id).disjoint_bitmap = bitmap;
        }
        for i in 0..n {
            self.roles[i].check_consistent()?;
        }
        self.completed = true;
        Ok(())
    }

    /// Fixpoint closure of the told `sub [= sup` edges recorded by
    /// `add_role_subsumption`: if `a [= b` and `b [= c` then `a [= c`.
    fn close_told_hierarchy(&mut self) {
        let n = self.roles.len();
        loop {
            let mut changed = false;
            for i in 0..n {
                let id = RoleId(i as u32);
                let ancestors = self.get(id).ancestors.clone();
                for anc in ancestors {
                    let grand = self.get(anc).ancestors.clone();
                    for g in grand {
                        if g != id && !self.get(id).ancestors.contains(&g) {
                            self.get_mut(id).ancestors.push(g);
                            self.get_mut(g).descendants.push(id);
                            changed = true;
                        }
                    }
                }
            }
            if !changed {
                break;
            }
        }
    }

    fn complete_automaton(&mut self, id: RoleId, in_process: &mut HashSet<RoleId>) -> Result<()> {
        if self.get(id).automaton.is_completed() {
            return Ok(());
        }
        if !in_process.insert(id) {
            return Err(ReasonerError::CycleInRoleInclusion(self.get(id).name.clone()));
        }
        let compositions = self.get(id).sub_compositions.clone();
        for chain in compositions {
            self.complete_composition(id, &chain, in_process)?;
        }
        in_process.remove(&id);
        self.get_mut(id).automaton.set_completed();
        Ok(())
    }

    fn complete_composition(&mut self, id: RoleId, chain: &[RoleId], in_process: &mut HashSet<RoleId>) -> Result<()> {
        if chain.len() == 1 {
            self.complete_automaton(chain[0], in_process)?;
            let sub_automaton = self.get(chain[0]).automaton.clone();
            self.get_mut(id).automaton.add_role_automaton(&sub_automaton);
            return Ok(());
        }
        let initial = self.get(id).automaton.initial();
        let final_state = self.get(id).automaton.final_state();
        self.get_mut(id).automaton.init_chain(initial);
        for (i, &r) in chain.iter().enumerate() {
            self.complete_automaton(r, in_process)?;
            let r_automaton = self.get(r).automaton.clone();
            let is_last = i + 1 == chain.len();
            let cursor_target = if is_last {
                final_state
            } else {
                self.get_mut(id).automaton.new_state()
            };
            self.get_mut(id).automaton.add_to_chain(&r_automaton, !is_last, cursor_target);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_role_creates_a_linked_inverse() {
        let mut rm = RoleMaster::new();
        let r = rm.ensure_role("hasChild", false);
        let inv = rm.get(r).inverse();
        assert_eq!(rm.get(inv).inverse(), r);
    }

    #[test]
    fn ensure_role_is_idempotent_by_name() {
        let mut rm = RoleMaster::new();
        let r1 = rm.ensure_role("hasChild", false);
        let r2 = rm.ensure_role("hasChild", false);
        assert_eq!(r1, r2);
    }

    #[test]
    fn transitive_is_set_on_both_directions() {
        let mut rm = RoleMaster::new();
        let r = rm.ensure_role("hasPart", false);
        rm.set_transitive(r, true);
        assert!(rm.get(r).is_transitive());
        assert!(rm.get(rm.get(r).inverse()).is_transitive());
    }

    #[test]
    fn fresh_role_is_simple() {
        let mut rm = RoleMaster::new();
        let r = rm.ensure_role("r", false);
        rm.finish_construction().unwrap();
        assert!(rm.get(r).is_simple());
    }

    #[test]
    fn functional_non_simple_role_is_rejected() {
        let mut rm = RoleMaster::new();
        let r = rm.ensure_role("r", false);
        let s = rm.ensure_role("s", false);
        rm.add_role_composition(r, &[r, s]);
        rm.set_functional(r);
        let err = rm.finish_construction().unwrap_err();
        assert!(matches!(err, ReasonerError::NonSimpleRoleMisuse(_)));
    }

    #[test]
    fn role_inclusion_cycle_is_detected() {
        let mut rm = RoleMaster::new();
        let r = rm.ensure_role("r", false);
        let s = rm.ensure_role("s", false);
        rm.add_role_composition(r, &[s]);
        rm.add_role_composition(s, &[r]);
        let err = rm.finish_construction().unwrap_err();
        assert!(matches!(err, ReasonerError::CycleInRoleInclusion(_)));
    }

    #[test]
    fn subsumption_builds_ancestor_bitmap() {
        let mut rm = RoleMaster::new();
        let r = rm.ensure_role("r", false);
        let s = rm.ensure_role("s", false);
        rm.add_role_subsumption(r, s);
        rm.finish_construction().unwrap();
        assert!(rm.get(r).is_sub_role_of(s));
        assert!(!rm.get(s).is_sub_role_of(r));
    }

    #[test]
    fn disjoint_roles_are_symmetric() {
        let mut rm = RoleMaster::new();
        let r = rm.ensure_role("r", false);
        let s = rm.ensure_role("s", false);
        rm.add_disjoint_roles(r, s);
        rm.finish_construction().unwrap();
        assert!(rm.get(r).is_disjoint_with(s));
        assert!(rm.get(s).is_disjoint_with(r));
    }
}
