//! Axiom absorption: rewriting general concept inclusions (GCIs) that would
//! otherwise all land in one global axiom applied to every node, into
//! necessary conditions attached directly to a concept, a negated concept,
//! or a role's domain — the classic optimisation that keeps most TBoxes out
//! of the "everything and the kitchen sink" GCI case.
//!
//! The original absorbs pre-DAG syntax trees; this crate absorbs post-DAG
//! [`Bp`]s instead (see `DESIGN.md`), so a GCI's disjuncts are a `Vec<Bp>`
//! and the recognisable patterns (a primitive concept literal, a `forall`
//! restriction, a conjunction to split) are read straight off
//! [`DagVertex`] tags instead of `DLTree` tokens.

use std::collections::HashMap;

use crate::bipointer::{Bp, BOTTOM, TOP};
use crate::dag::{ConceptDag, DagTag, NamedEntryId};
use crate::role::RoleId;

/// One general concept inclusion, represented as its disjunction:
/// `TAxiom { disjuncts: [d1, d2, ...] }` means `TOP [= d1 OR d2 OR ...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TAxiom {
    disjuncts: Vec<Bp>,
}

impl TAxiom {
    #[must_use]
    pub fn new() -> Self {
        TAxiom { disjuncts: Vec::new() }
    }

    /// The GCI `lhs [= rhs`, stored as its disjunction `(not lhs) or rhs`.
    #[must_use]
    pub fn for_gci(lhs: Bp, rhs: Bp) -> Self {
        TAxiom {
            disjuncts: vec![lhs.inverse(), rhs],
        }
    }

    pub fn add(&mut self, p: Bp) {
        self.disjuncts.push(p);
    }

    #[must_use]
    pub fn disjuncts(&self) -> &[Bp] {
        &self.disjuncts
    }

    fn replacing(&self, skip: usize, with: impl IntoIterator<Item = Bp>) -> TAxiom {
        let mut out: Vec<Bp> = self.disjuncts.iter().copied().enumerate().filter(|&(i, _)| i != skip).map(|(_, p)| p).collect();
        out.extend(with);
        TAxiom { disjuncts: out }
    }

    /// The `Or` of every disjunct except the one at `skip`, built through
    /// the DAG's `And` hash-cons table via De Morgan (`Or(xs) = not(And(not xs))`).
    fn rest_as_or(&self, skip: usize, dag: &mut ConceptDag) -> Bp {
        let negated = self.disjuncts.iter().enumerate().filter(|&(i, _)| i != skip).map(|(_, &p)| p.inverse());
        dag.get_and(negated, false).inverse()
    }

    /// `B`: a disjunct is literally `TOP`, making the whole GCI a tautology.
    #[must_use]
    pub fn absorb_into_bottom(&self) -> bool {
        self.disjuncts.iter().any(|&d| d == TOP)
    }

    /// `E`: a disjunct negates to a *non-primitive* named concept — replace
    /// it with the negation of that concept's definition, unfolding one
    /// step of the `C == D` equivalence.
    #[must_use]
    pub fn simplify_cn(&self, dag: &ConceptDag, descriptions: &HashMap<NamedEntryId, Bp>) -> Option<TAxiom> {
        for (i, &d) in self.disjuncts.iter().enumerate() {
            if !d.is_negative() {
                continue;
            }
            let v = dag.get(d);
            if v.tag().is_non_primitive_name() {
                if let Some(&desc) = v.named_entry().and_then(|e| descriptions.get(&e)) {
                    return Some(self.replacing(i, [desc.inverse()]));
                }
            }
        }
        None
    }

    /// `C`: exactly one disjunct *is* `not P` for a primitive named concept
    /// `P` (i.e. the GCI's antecedent named `P` directly) — the rest becomes
    /// a necessary condition on `P`.
    #[must_use]
    pub fn absorb_into_concept(&self, dag: &mut ConceptDag) -> Option<(NamedEntryId, Bp)> {
        let mut found = None;
        for (i, &d) in self.disjuncts.iter().enumerate() {
            if !d.is_negative() {
                continue;
            }
            let v = dag.get(d);
            if v.tag().is_primitive_name() && !v.tag().is_singleton() {
                if found.is_some() {
                    return None;
                }
                found = Some((i, v.named_entry().expect("primitive name vertex always carries a NamedEntryId")));
            }
        }
        let (i, entry) = found?;
        let condition = self.rest_as_or(i, dag);
        Some((entry, condition))
    }

    /// `N`: exactly one disjunct *is* a primitive named concept `P`
    /// (unnegated) — the rest becomes a necessary condition on `not P`.
    #[must_use]
    pub fn absorb_into_neg_concept(&self, dag: &mut ConceptDag) -> Option<(NamedEntryId, Bp)> {
        let mut found = None;
        for (i, &d) in self.disjuncts.iter().enumerate() {
            if !d.is_positive() {
                continue;
            }
            let v = dag.get(d);
            if v.tag().is_primitive_name() && !v.tag().is_singleton() {
                if found.is_some() {
                    return None;
                }
                found = Some((i, v.named_entry().expect("primitive name vertex always carries a NamedEntryId")));
            }
        }
        let (i, entry) = found?;
        let condition = self.rest_as_or(i, dag);
        Some((entry, condition))
    }

    /// `R`: exactly one disjunct *is* `forall R.BOTTOM` (i.e. the GCI's
    /// antecedent was `exists R.TOP`, De Morgan'd to `not (forall R.BOTTOM)`
    /// and then negated again by [`TAxiom::for_gci`]) — the rest becomes a
    /// necessary condition on `R`'s domain.
    #[must_use]
    pub fn absorb_into_domain(&self, dag: &mut ConceptDag) -> Option<(RoleId, Bp)> {
        let mut found = None;
        for (i, &d) in self.disjuncts.iter().enumerate() {
            if !d.is_positive() {
                continue;
            }
            let v = dag.get(d);
            if v.tag() == DagTag::Forall && v.get_c() == BOTTOM {
                if let Some(role) = v.role() {
                    if found.is_some() {
                        return None;
                    }
                    found = Some((i, role));
                }
            }
        }
        let (i, role) = found?;
        let condition = self.rest_as_or(i, dag);
        Some((role, condition))
    }

    /// `F`: a disjunct is itself `forall R.C` — abbreviate it with a fresh
    /// concept name so later classification doesn't re-expand it on every
    /// node the GCI touches. Returns the rewritten axiom (with the `forall`
    /// disjunct replaced by the fresh concept) and the `forall` vertex that
    /// is now the fresh concept's definition.
    #[must_use]
    pub fn simplify_forall(&self, dag: &mut ConceptDag, fresh: NamedEntryId) -> Option<(TAxiom, Bp)> {
        for (i, &d) in self.disjuncts.iter().enumerate() {
            if dag.get(d).tag() == DagTag::Forall && d.is_positive() {
                let fresh_bp = dag.add_named(DagTag::NConcept, fresh);
                let rewritten = self.replacing(i, [fresh_bp]);
                return Some((rewritten, d));
            }
        }
        None
    }

    /// `S`: a disjunct is itself a (positive) conjunction — split the axiom
    /// via `Or(x, And(a,b)) == And(Or(x,a), Or(x,b))`, producing two axioms
    /// that must *both* hold in place of this one.
    #[must_use]
    pub fn split(&self, dag: &ConceptDag) -> Option<Vec<TAxiom>> {
        for (i, &d) in self.disjuncts.iter().enumerate() {
            let v = dag.get(d);
            if v.tag() == DagTag::And && d.is_positive() {
                return Some(v.children().iter().map(|&c| self.replacing(i, [c])).collect());
            }
        }
        None
    }
}

impl Default for TAxiom {
    fn default() -> Self {
        Self::new()
    }
}

/// The order in which [`TAxiomSet::absorb`] tries each rewrite rule against
/// an axiom before falling back to the global GCI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AbsorptionRule {
    Bottom,
    Top,
    SimplifyCn,
    Concept,
    NegConcept,
    SimplifyForall,
    Domain,
    Split,
}

/// The default `B T E C N F R S` order the ledger commits this crate to.
pub const DEFAULT_ORDER: [AbsorptionRule; 8] = [
    AbsorptionRule::Bottom,
    AbsorptionRule::Top,
    AbsorptionRule::SimplifyCn,
    AbsorptionRule::Concept,
    AbsorptionRule::NegConcept,
    AbsorptionRule::SimplifyForall,
    AbsorptionRule::Domain,
    AbsorptionRule::Split,
];

/// Accumulates incoming GCIs and drives them through the absorption rules
/// to a fixed point, exactly as `TAxiomSet::absorb` does: every
/// freshly-produced axiom is re-queued and re-tried from the first rule.
#[derive(Debug, Default)]
pub struct TAxiomSet {
    accum: Vec<TAxiom>,
    order: Vec<AbsorptionRule>,
}

impl TAxiomSet {
    #[must_use]
    pub fn new(order: Vec<AbsorptionRule>) -> Self {
        TAxiomSet { accum: Vec::new(), order }
    }

    pub fn add_gci(&mut self, lhs: Bp, rhs: Bp) {
        self.accum.push(TAxiom::for_gci(lhs, rhs));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.accum.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accum.is_empty()
    }
}

/// Owns the absorption tables a [`crate::tableau::Reasoner`] consults: a
/// primitive concept's (or its negation's) necessary conditions, a role's
/// domain conditions, and whatever never absorbed (`T_G`, applied to every
/// node via the tableau's global-GCI tactic).
#[derive(Debug, Default)]
pub struct Absorber {
    concept_conditions: HashMap<NamedEntryId, Vec<Bp>>,
    neg_concept_conditions: HashMap<NamedEntryId, Vec<Bp>>,
    domain_conditions: HashMap<RoleId, Vec<Bp>>,
    concept_descriptions: HashMap<NamedEntryId, Bp>,
    global_gci: Vec<Bp>,
    next_fresh_entry: u32,
}

impl Absorber {
    #[must_use]
    pub fn new() -> Self {
        Absorber::default()
    }

    /// Register `entry`'s full definition (for non-primitive concepts), so
    /// `E`/`simplify_cn` can unfold references to it.
    pub fn register_definition(&mut self, entry: NamedEntryId, description: Bp) {
        self.concept_descriptions.insert(entry, description);
    }

    #[must_use]
    pub fn concept_conditions(&self, entry: NamedEntryId) -> &[Bp] {
        self.concept_conditions.get(&entry).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn neg_concept_conditions(&self, entry: NamedEntryId) -> &[Bp] {
        self.neg_concept_conditions.get(&entry).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn domain_conditions(&self, role: RoleId) -> &[Bp] {
        self.domain_conditions.get(&role).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn global_gci(&self) -> &[Bp] {
        &self.global_gci
    }

    /// Absorb every queued axiom in `set` to a fixed point, filling this
    /// absorber's tables and leaving genuinely unabsorbable GCIs in
    /// `global_gci`.
    pub fn absorb(&mut self, set: &mut TAxiomSet, dag: &mut ConceptDag) {
        let mut queue: Vec<TAxiom> = std::mem::take(&mut set.accum);
        let order = set.order.clone();
        let mut processed: Vec<TAxiom> = Vec::new();

        while let Some(ax) = queue.pop() {
            if ax.absorb_into_bottom() {
                continue;
            }
            if processed.contains(&ax) {
                continue;
            }

            let mut absorbed = false;
            for rule in &order {
                match rule {
                    AbsorptionRule::Bottom => {
                        if ax.absorb_into_bottom() {
                            absorbed = true;
                            break;
                        }
                    }
                    AbsorptionRule::SimplifyCn => {
                        if let Some(rewritten) = ax.simplify_cn(dag, &self.concept_descriptions) {
                            queue.push(rewritten);
                            absorbed = true;
                            break;
                        }
                    }
                    AbsorptionRule::Concept => {
                        if let Some((entry, condition)) = ax.absorb_into_concept(dag) {
                            self.concept_conditions.entry(entry).or_default().push(condition);
                            absorbed = true;
                            break;
                        }
                    }
                    AbsorptionRule::NegConcept => {
                        if let Some((entry, condition)) = ax.absorb_into_neg_concept(dag) {
                            self.neg_concept_conditions.entry(entry).or_default().push(condition);
                            absorbed = true;
                            break;
                        }
                    }
                    AbsorptionRule::Domain => {
                        if let Some((role, condition)) = ax.absorb_into_domain(dag) {
                            self.domain_conditions.entry(role).or_default().push(condition);
                            absorbed = true;
                            break;
                        }
                    }
                    AbsorptionRule::Split => {
                        if let Some(parts) = ax.split(dag) {
                            queue.extend(parts);
                            absorbed = true;
                            break;
                        }
                    }
                    AbsorptionRule::SimplifyForall => {
                        let fresh = self.fresh_entry();
                        if let Some((rewritten, definition)) = ax.simplify_forall(dag, fresh) {
                            self.concept_descriptions.insert(fresh, definition);
                            queue.push(rewritten);
                            absorbed = true;
                            break;
                        }
                    }
                    AbsorptionRule::Top => {
                        // No pattern of its own: `T` is the terminal
                        // fallback that folds whatever nothing else
                        // absorbed into the global GCI, handled once the
                        // rule loop exits without a match (see below).
                    }
                }
            }

            if !absorbed {
                processed.push(ax);
            }
        }

        for ax in processed {
            self.global_gci.extend(ax.disjuncts().iter().copied());
        }
        set.accum.clear();
    }

    /// A fresh, session-unique `NamedEntryId` for synthetic concepts.
    pub fn fresh_entry(&mut self) -> NamedEntryId {
        self.next_fresh_entry += 1;
        NamedEntryId(u32::MAX - self.next_fresh_entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::DagTag;

    #[test]
    fn tautological_axiom_absorbs_into_bottom() {
        let ax = TAxiom::for_gci(TOP, TOP);
        assert!(ax.absorb_into_bottom());
    }

    #[test]
    fn single_primitive_antecedent_absorbs_into_concept() {
        let mut dag = ConceptDag::new();
        let p = dag.add_named(DagTag::PConcept, NamedEntryId(1));
        let d = dag.add_named(DagTag::PConcept, NamedEntryId(2));
        let ax = TAxiom::for_gci(p, d);
        let (entry, condition) = ax.absorb_into_concept(&mut dag).expect("should absorb");
        assert_eq!(entry, NamedEntryId(1));
        assert_eq!(condition, d);
    }

    #[test]
    fn split_distributes_a_conjunctive_disjunct() {
        let mut dag = ConceptDag::new();
        let a = dag.add_named(DagTag::PConcept, NamedEntryId(1));
        let b = dag.add_named(DagTag::PConcept, NamedEntryId(2));
        let x = dag.add_named(DagTag::PConcept, NamedEntryId(3));
        let and_ab = dag.get_and([a, b], false);
        let ax = TAxiom {
            disjuncts: vec![x, and_ab],
        };
        let parts = ax.split(&dag).expect("should split");
        assert_eq!(parts.len(), 2);
    }

    #[test]
    fn absorber_folds_named_consequent_into_neg_concept_conditions() {
        let mut dag = ConceptDag::new();
        let mut set = TAxiomSet::new(DEFAULT_ORDER.to_vec());
        let a = dag.add_named(DagTag::PConcept, NamedEntryId(1));
        let b = dag.add_named(DagTag::PConcept, NamedEntryId(2));
        // `(a and b) [= a`: the antecedent isn't a bare primitive literal, so
        // `C` can't apply, but the consequent `a` is a bare primitive literal,
        // so `N` folds the rest into `not a`'s conditions.
        set.add_gci(dag.get_and([a, b], false), a);
        let mut absorber = Absorber::new();
        absorber.absorb(&mut set, &mut dag);
        assert!(!absorber.neg_concept_conditions(NamedEntryId(1)).is_empty());
        assert!(absorber.global_gci().is_empty());
    }

    #[test]
    fn absorber_falls_back_to_global_gci_when_nothing_matches() {
        let mut dag = ConceptDag::new();
        let mut set = TAxiomSet::new(DEFAULT_ORDER.to_vec());
        let a = dag.add_named(DagTag::PConcept, NamedEntryId(1));
        let b = dag.add_named(DagTag::PConcept, NamedEntryId(2));
        let c = dag.add_named(DagTag::PConcept, NamedEntryId(3));
        let d = dag.add_named(DagTag::PConcept, NamedEntryId(4));
        let and_ab = dag.get_and([a, b], false);
        let and_cd = dag.get_and([c, d], false);
        // `not (a and b and c and d)`, a 4-way disjointness constraint with
        // no bare primitive literal on either disjunct: no rule matches it.
        set.accum.push(TAxiom {
            disjuncts: vec![and_ab.inverse(), and_cd.inverse()],
        });
        let mut absorber = Absorber::new();
        absorber.absorb(&mut set, &mut dag);
        assert!(!absorber.global_gci().is_empty());
    }
}
