//! The reasoning session: owns one ontology's [`RoleMaster`], [`ConceptDag`]
//! and [`Absorber`], and is the only thing a caller outside this crate talks
//! to — building axioms, then answering the upward-interface queries
//! (`isConsistent`, `isSubHolds`, `isSatisfiable`, `checkDisjointRoles`).
//!
//! ```text
//! Session
//! ├── RoleMaster     (role hierarchy, transitivity, disjointness)
//! ├── ConceptDag     (hash-consed concept expressions)
//! ├── Absorber       (GCIs rewritten into concept/domain conditions)
//! └── Taxonomy       (built lazily by `classify`, cached until the next axiom)
//! ```
//!
//! A session that surfaces a [`ReasonerError`] other than a query issued
//! after an earlier failure moves to a permanently failed state: every
//! later query returns [`ReasonerError::FailedReasoning`] without
//! re-running anything, matching the "no reasoning after cancellation/
//! timeout/invariant breach is trustworthy" design note.

use std::collections::HashMap;

use crate::absorption::{Absorber, TAxiomSet};
use crate::bipointer::{Bp, BOTTOM, TOP};
use crate::blocking;
use crate::config::ReasoningConfig;
use crate::dag::{ConceptDag, DagTag, NamedEntryId};
use crate::data_reasoner::NullDataReasoner;
use crate::error::{ReasonerError, Result};
use crate::role::{RoleId, RoleMaster};
use crate::statistics::SessionStats;
use crate::tableau::{CancellationToken, Reasoner, TacticOutcome};
use crate::todo::PriorityMatrix;
use crate::taxonomy::{Taxonomy, TaxonomyBuilder};

/// Owns an ontology and answers reasoning queries about it.
pub struct Session {
    config: ReasoningConfig,
    roles: RoleMaster,
    dag: ConceptDag,
    absorber: Absorber,
    axioms: TAxiomSet,
    names: HashMap<String, (NamedEntryId, Bp, bool)>,
    next_entry: u32,
    has_nominal: bool,
    has_inverse_roles: bool,
    has_qualified_cardinality: bool,
    cancellation: CancellationToken,
    stats: SessionStats,
    failed: Option<ReasonerError>,
    taxonomy: Option<Taxonomy>,
}

impl Session {
    #[must_use]
    pub fn new(config: ReasoningConfig) -> Self {
        let order = config.tableau.absorption_order.clone();
        Session {
            config,
            roles: RoleMaster::new(),
            dag: ConceptDag::new(),
            absorber: Absorber::new(),
            axioms: TAxiomSet::new(order),
            names: HashMap::new(),
            next_entry: 0,
            has_nominal: false,
            has_inverse_roles: false,
            has_qualified_cardinality: false,
            cancellation: CancellationToken::new(),
            stats: SessionStats::new(),
            failed: None,
            taxonomy: None,
        }
    }

    #[must_use]
    pub fn cancellation(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    fn check_failed(&self) -> Result<()> {
        if self.failed.is_some() {
            return Err(ReasonerError::FailedReasoning);
        }
        Ok(())
    }

    fn fresh_entry(&mut self) -> NamedEntryId {
        let id = NamedEntryId(self.next_entry);
        self.next_entry += 1;
        id
    }

    /// Declare a primitive named concept (`A ⊑ ⊤` by default, further
    /// conditions added separately via [`Session::add_subsumption`]).
    pub fn declare_concept(&mut self, name: &str) -> Bp {
        if let Some((_, bp, _)) = self.names.get(name) {
            return *bp;
        }
        let entry = self.fresh_entry();
        let bp = self.dag.add_named(DagTag::PConcept, entry);
        self.names.insert(name.to_string(), (entry, bp, true));
        self.taxonomy = None;
        bp
    }

    /// Declare a fully-defined (non-primitive) concept equal to `definition`.
    pub fn define_concept(&mut self, name: &str, definition: Bp) -> Bp {
        let entry = self.fresh_entry();
        let bp = self.dag.add_named(DagTag::NConcept, entry);
        self.absorber.register_definition(entry, definition);
        self.axioms.add_gci(bp, definition);
        self.axioms.add_gci(definition, bp);
        self.names.insert(name.to_string(), (entry, bp, false));
        self.taxonomy = None;
        bp
    }

    pub fn declare_role(&mut self, name: &str, is_data_role: bool) -> RoleId {
        self.roles.ensure_role(name, is_data_role)
    }

    /// Declare a nominal (a named individual), represented as a `PSingleton`
    /// concept whose only instance is that individual.
    pub fn declare_individual(&mut self, name: &str) -> Bp {
        if let Some((_, bp, _)) = self.names.get(name) {
            return *bp;
        }
        let entry = self.fresh_entry();
        let bp = self.dag.add_named(DagTag::PSingleton, entry);
        self.names.insert(name.to_string(), (entry, bp, true));
        self.has_nominal = true;
        self.taxonomy = None;
        bp
    }

    /// `∃R.C`, built as `¬∀R.¬C` over the bipolar DAG encoding.
    pub fn some(&mut self, role: RoleId, c: Bp) -> Bp {
        let forall = self.dag.get_forall(Some(role), c.inverse(), 0);
        forall.inverse()
    }

    /// `∀R.C`.
    pub fn all(&mut self, role: RoleId, c: Bp) -> Bp {
        self.dag.get_forall(Some(role), c, 0)
    }

    /// `<=n R.C`.
    pub fn at_most(&mut self, n: u32, role: RoleId, c: Bp) -> Bp {
        if c != TOP {
            self.has_qualified_cardinality = true;
        }
        self.dag.get_at_most(n, role, c)
    }

    /// `>=n R.C`, built as `¬(<=(n-1) R.C)`.
    pub fn at_least(&mut self, n: u32, role: RoleId, c: Bp) -> Bp {
        if n == 0 {
            return TOP;
        }
        self.at_most(n - 1, role, c).inverse()
    }

    /// Assert `individual : concept` — `{individual} ⊑ concept`.
    pub fn assert_concept(&mut self, individual: Bp, concept: Bp) {
        self.axioms.add_gci(individual, concept);
        self.taxonomy = None;
    }

    /// Assert `role(source, target)` — `{source} ⊑ ∃role.{target}`.
    pub fn assert_role(&mut self, role: RoleId, source: Bp, target: Bp) {
        let restriction = self.some(role, target);
        self.axioms.add_gci(source, restriction);
        self.taxonomy = None;
    }

    pub fn mark_role_transitive(&mut self, role: RoleId) {
        self.roles.set_transitive(role, true);
    }

    pub fn mark_role_functional(&mut self, role: RoleId) {
        self.roles.set_functional(role);
    }

    /// Post a GCI `lhs ⊑ rhs`.
    pub fn add_subsumption(&mut self, lhs: Bp, rhs: Bp) {
        self.axioms.add_gci(lhs, rhs);
        self.taxonomy = None;
    }

    /// Post `lhs ≡ rhs` as two GCIs.
    pub fn add_equivalence(&mut self, lhs: Bp, rhs: Bp) {
        self.axioms.add_gci(lhs, rhs);
        self.axioms.add_gci(rhs, lhs);
        self.taxonomy = None;
    }

    pub fn add_disjoint_roles(&mut self, r: RoleId, s: RoleId) {
        self.roles.add_disjoint_roles(r, s);
    }

    pub fn mark_has_nominal(&mut self) {
        self.has_nominal = true;
    }

    /// Declare that the ontology uses inverse roles — widens blocking from
    /// subset to equality blocking (see [`blocking::BlockingMode::select`]).
    pub fn mark_has_inverse_roles(&mut self) {
        self.has_inverse_roles = true;
    }

    /// Declare that the ontology uses qualified number restrictions —
    /// widens blocking to optimised-double blocking when inverse roles are
    /// also present.
    pub fn mark_has_qualified_cardinality(&mut self) {
        self.has_qualified_cardinality = true;
    }

    /// Finish construction: run role-automaton construction and absorb
    /// every pending GCI into the DAG. Must be called once after every
    /// axiom is posted and before the first query.
    pub fn finalize(&mut self) -> Result<()> {
        self.check_failed()?;
        self.roles.finish_construction()?;
        self.absorber.absorb(&mut self.axioms, &mut self.dag);
        Ok(())
    }

    /// Build a fresh `Reasoner` borrowing only `roles`/`absorber`, never
    /// `self` as a whole — so a caller can still mutate `self.dag` or
    /// `self.stats` while the returned reasoner is alive.
    #[allow(clippy::too_many_arguments)]
    fn build_reasoner<'a>(
        roles: &'a RoleMaster,
        absorber: &'a Absorber,
        config: &ReasoningConfig,
        has_nominal: bool,
        has_inverse_roles: bool,
        has_qualified_cardinality: bool,
        cancellation: CancellationToken,
    ) -> Result<Reasoner<'a, blocking::Engine>> {
        let priorities = PriorityMatrix::parse(&config.tableau.todo_priorities)?;
        let engine = blocking::Engine::new(
            blocking::BlockingMode::select(has_inverse_roles, has_qualified_cardinality),
            config.blocking.search_strategy(),
            config.blocking.trigger_mode(),
            false,
        );
        Ok(Reasoner::new(roles, absorber, priorities, has_nominal, Box::new(NullDataReasoner::new()), engine, cancellation, config.tableau.timeout()))
    }

    fn run_sat_check(&mut self, p: Bp) -> Result<bool> {
        self.check_failed()?;
        let mut reasoner = Self::build_reasoner(
            &self.roles,
            &self.absorber,
            &self.config,
            self.has_nominal,
            self.has_inverse_roles,
            self.has_qualified_cardinality,
            self.cancellation.clone(),
        )?;
        let outcome = reasoner.check_consistency(&self.dag, p);
        match outcome {
            Ok(outcome) => {
                self.stats.record(reasoner.stats(), reasoner.blocking().stats());
                Ok(matches!(outcome, TacticOutcome::Done | TacticOutcome::Unused))
            }
            Err(e) => {
                self.failed = Some(e.clone());
                Err(e)
            }
        }
    }

    /// `isSatisfiable(C)`.
    pub fn is_satisfiable(&mut self, p: Bp) -> Result<bool> {
        self.run_sat_check(p)
    }

    /// `isConsistent()`: the whole ontology (including its global GCIs) has
    /// a model — equivalent to `TOP` being satisfiable.
    pub fn is_consistent(&mut self) -> Result<bool> {
        self.run_sat_check(TOP)
    }

    /// `isSubHolds(C, D)`: does `C ⊑ D` hold? Consults the cached taxonomy
    /// if one has already been built over both concepts; otherwise runs a
    /// direct satisfiability test of `C ⊓ ¬D`.
    pub fn is_sub_holds(&mut self, c: Bp, d: Bp) -> Result<bool> {
        self.check_failed()?;
        if c == d || d == TOP {
            return Ok(true);
        }
        if c == BOTTOM {
            return Ok(true);
        }
        let conj = self.dag.get_and([c, d.inverse()], false);
        let sat = self.run_sat_check(conj)?;
        Ok(!sat)
    }

    /// `checkDisjointRoles(R, S)`.
    pub fn check_disjoint_roles(&self, r: RoleId, s: RoleId) -> bool {
        self.roles.get(r).is_disjoint_with(s)
    }

    /// Classify every declared concept, building (and caching) the
    /// session's [`Taxonomy`].
    pub fn classify(&mut self) -> Result<&Taxonomy> {
        self.check_failed()?;
        if self.taxonomy.is_none() {
            let concepts: Vec<(NamedEntryId, Bp, bool)> = self.names.values().copied().collect();
            let mut builder = TaxonomyBuilder::new(&self.roles);
            let mut reasoner = Self::build_reasoner(
                &self.roles,
                &self.absorber,
                &self.config,
                self.has_nominal,
                self.has_inverse_roles,
                self.has_qualified_cardinality,
                self.cancellation.clone(),
            )?;
            let tax = builder.classify(&mut self.dag, &mut reasoner, &concepts);
            self.taxonomy = Some(tax);
        }
        Ok(self.taxonomy.as_ref().expect("just inserted"))
    }

    #[must_use]
    pub fn concept_named(&self, name: &str) -> Option<Bp> {
        self.names.get(name).map(|(_, bp, _)| *bp)
    }

    /// The [`NamedEntryId`] a declared concept or individual was given,
    /// for looking its vertex up in a built [`Taxonomy`].
    #[must_use]
    pub fn entry_of(&self, name: &str) -> Option<NamedEntryId> {
        self.names.get(name).map(|(entry, _, _)| *entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(ReasoningConfig::default())
    }

    #[test]
    fn an_empty_ontology_is_consistent() {
        let mut s = session();
        s.finalize().unwrap();
        assert!(s.is_consistent().unwrap());
    }

    #[test]
    fn a_concept_disjoint_from_itself_is_unsatisfiable() {
        let mut s = session();
        let a = s.declare_concept("A");
        s.add_subsumption(a, BOTTOM);
        s.finalize().unwrap();
        assert!(!s.is_satisfiable(a).unwrap());
    }

    #[test]
    fn a_subsumed_concept_reports_is_sub_holds() {
        let mut s = session();
        let a = s.declare_concept("A");
        let b = s.declare_concept("B");
        s.add_subsumption(a, b);
        s.finalize().unwrap();
        assert!(s.is_sub_holds(a, b).unwrap());
    }

    #[test]
    fn queries_after_a_failure_return_failed_reasoning() {
        let mut s = session();
        s.failed = Some(ReasonerError::Cancelled);
        assert_eq!(s.is_consistent(), Err(ReasonerError::FailedReasoning));
    }

    #[test]
    fn disjoint_roles_are_reported_both_ways() {
        let mut s = session();
        let r = s.declare_role("r", false);
        let t = s.declare_role("t", false);
        s.add_disjoint_roles(r, t);
        s.finalize().unwrap();
        assert!(s.check_disjoint_roles(r, t));
        assert!(s.check_disjoint_roles(t, r));
    }
}
