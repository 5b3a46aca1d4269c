//! End-to-end scenarios run against the public [`factpp_core::session::Session`]
//! surface, plus a handful of whole-pipeline property tests for the
//! invariants that only show up once axioms, absorption, the tableau and
//! the taxonomy are wired together (the individual modules already cover
//! the invariants that are local to one data structure).

use proptest::prelude::*;

use factpp_core::bipointer::{Bp, BOTTOM, TOP};
use factpp_core::config::ReasoningConfig;
use factpp_core::session::Session;

fn session() -> Session {
    Session::new(ReasoningConfig::default())
}

/// Scenario 1 — simple subsumption: `A ⊑ B ⊑ C`.
#[test]
fn simple_subsumption_chain() {
    let mut s = session();
    let a = s.declare_concept("A");
    let b = s.declare_concept("B");
    let c = s.declare_concept("C");
    s.add_subsumption(a, b);
    s.add_subsumption(b, c);
    s.finalize().unwrap();

    assert!(s.is_sub_holds(a, c).unwrap());
    assert!(!s.is_sub_holds(c, a).unwrap());

    let entry_a = s.entry_of("A").unwrap();
    let entry_b = s.entry_of("B").unwrap();
    let entry_c = s.entry_of("C").unwrap();
    let tax = s.classify().unwrap();
    let v_a = tax.vertex_of(entry_a).unwrap();
    let v_b = tax.vertex_of(entry_b).unwrap();
    let v_c = tax.vertex_of(entry_c).unwrap();
    assert!(tax.is_subsumed_by(v_a, v_b));
    assert!(tax.is_subsumed_by(v_b, v_c));
    assert!(tax.is_subsumed_by(v_c, tax.top()));
    assert!(tax.is_subsumed_by(tax.bottom(), v_a));
}

/// Scenario 2 — disjoint with cycle: `A ⊑ B`, `B ⊑ ¬A` forces `A` to BOTTOM.
#[test]
fn disjoint_cycle_forces_unsatisfiability() {
    let mut s = session();
    let a = s.declare_concept("A");
    let b = s.declare_concept("B");
    s.add_subsumption(a, b);
    s.add_subsumption(b, a.inverse());
    s.finalize().unwrap();

    assert!(!s.is_satisfiable(a).unwrap());
    assert!(s.is_sub_holds(a, BOTTOM).unwrap());
}

/// Scenario 3 — a functional role forces two asserted successors to merge:
/// `Func(R)`, `x : ∃R.A`, `x : ∃R.B` stays consistent (the merged successor
/// is labelled with both `A` and `B`).
#[test]
fn functional_role_forces_merge_and_stays_consistent() {
    let mut s = session();
    let r = s.declare_role("R", false);
    s.mark_role_functional(r);
    let a = s.declare_concept("A");
    let b = s.declare_concept("B");
    let x = s.declare_individual("x");

    let some_a = s.some(r, a);
    let some_b = s.some(r, b);
    s.assert_concept(x, some_a);
    s.assert_concept(x, some_b);
    s.finalize().unwrap();

    assert!(s.is_consistent().unwrap());
}

/// Scenario 4 — transitive role propagation: `Trans(R)`, `A ⊑ ∀R.A`,
/// `a : A`, `R(a,b)`, `R(b,c)` entails `c : A`, which here we observe as the
/// ontology staying consistent even once we additionally assert `c : ¬A`
/// is unsatisfiable.
#[test]
fn transitive_role_propagates_universal_restriction() {
    let mut s = session();
    let r = s.declare_role("R", false);
    s.mark_role_transitive(r);
    let big_a = s.declare_concept("A");
    let all_r_a = s.all(r, big_a);
    s.add_subsumption(big_a, all_r_a);

    let a = s.declare_individual("a");
    let b = s.declare_individual("b");
    let c = s.declare_individual("c");
    s.assert_concept(a, big_a);
    s.assert_role(r, a, b);
    s.assert_role(r, b, c);
    s.finalize().unwrap();

    assert!(s.is_consistent().unwrap());
    assert!(!s.is_sub_holds(c, big_a.inverse()).unwrap());
}

/// Scenario 5 — an at-most restriction together with two distinct asserted
/// successors forces inconsistency once the two are kept apart.
#[test]
fn at_most_restriction_with_distinct_successors_is_inconsistent() {
    let mut s = session();
    let r = s.declare_role("R", false);
    let x = s.declare_individual("x");
    let a = s.declare_individual("a");
    let b = s.declare_individual("b");

    let at_most_one = s.at_most(1, r, TOP);
    s.assert_concept(x, at_most_one);
    s.assert_role(r, x, a);
    s.assert_role(r, x, b);
    // force a and b apart: each gets a disjoint marker concept
    let marker_a = s.declare_concept("MarkerA");
    let marker_b = s.declare_concept("MarkerB");
    s.assert_concept(a, marker_a);
    s.assert_concept(b, marker_b);
    s.add_subsumption(marker_a, marker_b.inverse());
    s.finalize().unwrap();

    assert!(!s.is_consistent().unwrap());
}

/// Scenario 6 — nominal short-cut: `A ⊑ ∃R.{o}`, `∀R.B` on `{o}`, `x : A`
/// entails `o : B`.
#[test]
fn nominal_shortcut_entails_instance_on_the_nominal() {
    let mut s = session();
    let r = s.declare_role("R", false);
    let o = s.declare_individual("o");
    let big_a = s.declare_concept("A");
    let big_b = s.declare_concept("B");

    let some_r_o = s.some(r, o);
    s.add_subsumption(big_a, some_r_o);
    let all_r_b = s.all(r, big_b);
    s.assert_concept(o, all_r_b);

    let x = s.declare_individual("x");
    s.assert_concept(x, big_a);
    s.finalize().unwrap();

    assert!(s.is_consistent().unwrap());
    assert!(s.is_sub_holds(o, big_b).unwrap());
}

/// An empty ontology is consistent and its taxonomy is just `TOP ⊐ BOTTOM`.
#[test]
fn empty_ontology_boundary() {
    let mut s = session();
    s.finalize().unwrap();
    assert!(s.is_consistent().unwrap());

    let tax = s.classify().unwrap();
    assert_eq!(tax.len(), 2);
    assert!(tax.is_subsumed_by(tax.bottom(), tax.top()));
}

proptest! {
    /// Invariant 1 (BP polarity): `inverse(inverse(bp)) = bp`, and TOP/BOTTOM
    /// invert to each other, for any Bp built off a fresh DAG entry.
    #[test]
    fn prop_bp_double_inverse_is_identity(raw in 1i32..500) {
        let bp = Bp::create(raw as u32, raw % 2 == 0);
        assert_eq!(bp.inverse().inverse(), bp);
    }

    #[test]
    fn prop_top_bottom_invert_to_each_other(_unit in any::<()>()) {
        assert_eq!(TOP.inverse(), BOTTOM);
        assert_eq!(BOTTOM.inverse(), TOP);
    }

    /// A chain of `n` concepts `C0 ⊑ C1 ⊑ ... ⊑ C(n-1)` always classifies so
    /// that every `Ci` is subsumed by every `Cj` with `j >= i`, and never the
    /// reverse unless `i == j` — i.e. the taxonomy agrees with `is_sub_holds`
    /// on every pair, end to end through absorption and the tableau.
    #[test]
    fn prop_chain_classification_matches_pairwise_subsumption(depth in 2usize..8) {
        let mut s = session();
        let mut concepts = Vec::with_capacity(depth);
        for i in 0..depth {
            concepts.push(s.declare_concept(&format!("C{i}")));
        }
        for w in concepts.windows(2) {
            s.add_subsumption(w[0], w[1]);
        }
        s.finalize().unwrap();

        for i in 0..depth {
            for j in 0..depth {
                let expect = i <= j;
                let got = s.is_sub_holds(concepts[i], concepts[j]).unwrap();
                prop_assert_eq!(got, expect, "C{} sub C{} expected {} got {}", i, j, expect, got);
            }
        }
    }
}
