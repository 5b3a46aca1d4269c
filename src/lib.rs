//! # factpp-core
//!
//! A tableau-based reasoner core for expressive Description Logics
//! (SROIQ(D) and sub-logics): given a TBox/RBox built against a
//! [`dag::ConceptDag`] and [`role::RoleMaster`], decides concept
//! satisfiability, ontology consistency, subsumption, and produces a
//! classification taxonomy.
//!
//! ## Pipeline
//!
//! ```text
//! axioms posted via session::Session
//!     ↓
//! [absorption]        GCIs rewritten into concept/domain conditions
//!     ↓
//! [dag]               hash-consed concept DAG (`Bp` pointers)
//!     ↓
//! [tableau]           expansion rules + backjumping + blocking → model or clash
//!     ├── [branching]     choice points (disjunction, <=n, NN-rule)
//!     ├── [blocking]      subset/equality/optimised-double cycle detection
//!     ├── [cache]         model caches (Const/Singleton/Ian) short-circuit re-expansion
//!     └── [cascade]       builds those caches bottom-up before a SAT test needs them
//!     ↓
//! [taxonomy]          enhanced top-down classification over the whole TBox
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use factpp_core::config::ReasoningConfig;
//! use factpp_core::session::Session;
//! use factpp_core::bipointer::BOTTOM;
//!
//! let mut session = Session::new(ReasoningConfig::default());
//! let person = session.declare_concept("Person");
//! let student = session.declare_concept("Student");
//! session.add_subsumption(student, person);
//! session.finalize()?;
//!
//! assert!(session.is_consistent()?);
//! assert!(session.is_sub_holds(student, person)?);
//! # Ok::<(), factpp_core::error::ReasonerError>(())
//! ```

pub mod absorption;
pub mod bipointer;
pub mod blocking;
pub mod branching;
pub mod cache;
pub mod cascade;
pub mod config;
pub mod dag;
mod data_reasoner;
pub mod depset;
pub mod error;
pub mod graph;
pub mod label;
mod progress;
pub mod role;
pub mod session;
pub mod statistics;
pub mod tableau;
pub mod taxonomy;
mod todo;

#[cfg(test)]
mod tests {
    use crate::bipointer::BOTTOM;
    use crate::config::ReasoningConfig;
    use crate::session::Session;

    #[test]
    fn a_minimal_ontology_classifies_student_under_person() {
        let mut session = Session::new(ReasoningConfig::default());
        let person = session.declare_concept("Person");
        let student = session.declare_concept("Student");
        session.add_subsumption(student, person);
        session.finalize().unwrap();

        assert!(session.is_consistent().unwrap());
        assert!(session.is_sub_holds(student, person).unwrap());
        assert!(!session.is_sub_holds(person, student).unwrap());

        let tax = session.classify().unwrap();
        assert!(tax.len() >= 2);
    }

    #[test]
    fn an_unsatisfiable_concept_is_subsumed_by_bottom_only() {
        let mut session = Session::new(ReasoningConfig::default());
        let a = session.declare_concept("A");
        session.add_subsumption(a, BOTTOM);
        session.finalize().unwrap();
        assert!(!session.is_satisfiable(a).unwrap());
    }
}
