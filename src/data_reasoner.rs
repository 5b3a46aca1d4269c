//! Plug-in interface for reasoning over concrete domains (datatypes).
//!
//! The tableau hands every `DataType`/`DataValue`/`DataExpr` vertex it meets
//! to whatever implements this trait rather than interpreting facet
//! expressions itself — enumerating the basic datatypes and their facets is
//! out of scope here (see the crate-level Non-goals), but the seam a real
//! implementation plugs into is not.

use crate::bipointer::Bp;
use crate::depset::DepSet;

/// A concrete-domain reasoner: accumulates data-value constraints posted
/// against a single completion-graph node and answers whether they clash.
///
/// One instance is scoped to one node's data constraints; [`clear`] resets
/// it for reuse against the next node, mirroring the DAG cache's
/// one-instance-per-node-in-flight lifetime rather than allocating fresh.
///
/// [`clear`]: DataReasoner::clear
pub trait DataReasoner {
    /// Forget all previously added entries.
    fn clear(&mut self);

    /// Add a `DataType`/`DataValue`/`DataExpr` bipointer with the dep-set it
    /// was derived under. Returns the clash dep-set immediately if this
    /// addition is a direct contradiction with what's already present.
    fn add_data_entry(&mut self, bp: Bp, dep: DepSet) -> Option<DepSet>;

    /// Whether the entries added so far are jointly unsatisfiable.
    fn check_clash(&mut self) -> bool;

    /// The dep-set behind the clash found by [`check_clash`], if any.
    ///
    /// [`check_clash`]: DataReasoner::check_clash
    fn clash_set(&self) -> DepSet;
}

/// A [`DataReasoner`] that rejects every facet expression and accepts a
/// bare datatype/value only once per node — enough to keep the tableau
/// loop correct for ontologies that don't use the concrete domain, without
/// pretending to implement facet arithmetic.
#[derive(Debug, Default)]
pub struct NullDataReasoner {
    seen: Vec<(Bp, DepSet)>,
    clash: Option<DepSet>,
}

impl NullDataReasoner {
    #[must_use]
    pub fn new() -> Self {
        NullDataReasoner::default()
    }
}

impl DataReasoner for NullDataReasoner {
    fn clear(&mut self) {
        self.seen.clear();
        self.clash = None;
    }

    fn add_data_entry(&mut self, bp: Bp, dep: DepSet) -> Option<DepSet> {
        for &(other, ref other_dep) in &self.seen {
            if other == bp.inverse() {
                let clash = dep.merge(other_dep);
                self.clash = Some(clash.clone());
                return Some(clash);
            }
        }
        self.seen.push((bp, dep));
        None
    }

    fn check_clash(&mut self) -> bool {
        self.clash.is_some()
    }

    fn clash_set(&self) -> DepSet {
        self.clash.clone().unwrap_or_else(DepSet::empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_entries_clash() {
        let mut dr = NullDataReasoner::new();
        let p = Bp::create(3, true);
        assert!(dr.add_data_entry(p, DepSet::singleton(1)).is_none());
        let clash = dr.add_data_entry(p.inverse(), DepSet::singleton(2));
        assert!(clash.is_some());
        assert!(dr.check_clash());
        assert!(dr.clash_set().contains(1));
        assert!(dr.clash_set().contains(2));
    }

    #[test]
    fn repeated_entry_is_not_a_clash() {
        let mut dr = NullDataReasoner::new();
        let p = Bp::create(3, true);
        assert!(dr.add_data_entry(p, DepSet::singleton(1)).is_none());
        assert!(dr.add_data_entry(p, DepSet::singleton(1)).is_none());
        assert!(!dr.check_clash());
    }

    #[test]
    fn clear_forgets_everything() {
        let mut dr = NullDataReasoner::new();
        let p = Bp::create(3, true);
        dr.add_data_entry(p, DepSet::singleton(1));
        dr.add_data_entry(p.inverse(), DepSet::singleton(2));
        assert!(dr.check_clash());
        dr.clear();
        assert!(!dr.check_clash());
    }
}
