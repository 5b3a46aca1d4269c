//! Session-level statistics: read-only snapshots of the counters each
//! subsystem already keeps (`tableau::ReasoningStats`, `blocking::BlockingStats`),
//! aggregated so a caller can inspect one session's reasoning cost without
//! reaching into `Reasoner`/`blocking::Engine` internals directly.
//!
//! Per spec design note: global mutable counters are avoided — every field
//! here is copied out of a per-session owner (`Session`) rather than read
//! from a static.

use crate::blocking::BlockingStats;
use crate::tableau::ReasoningStats;

/// A snapshot of everything a [`crate::session::Session`] tracked across
/// every satisfiability test it has run so far.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionStats {
    /// Number of top-level `isSatisfiable`/`isSubHolds`/consistency checks run.
    pub queries: u64,
    /// Tableau steps, clashes, backjumps and cache hits, summed across
    /// every check run in this session.
    pub reasoning: ReasoningStats,
    /// Blocking attempts/failures per rule, summed the same way.
    pub blocking: BlockingStats,
}

impl SessionStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one more check's counters into the running total.
    pub fn record(&mut self, reasoning: ReasoningStats, blocking: BlockingStats) {
        self.queries += 1;
        self.reasoning.steps += reasoning.steps;
        self.reasoning.clashes += reasoning.clashes;
        self.reasoning.backjumps += reasoning.backjumps;
        self.reasoning.cache_hits += reasoning.cache_hits;

        self.blocking.b1_attempts += blocking.b1_attempts;
        self.blocking.b1_failures += blocking.b1_failures;
        self.blocking.b2_attempts += blocking.b2_attempts;
        self.blocking.b2_failures += blocking.b2_failures;
        self.blocking.b3_attempts += blocking.b3_attempts;
        self.blocking.b3_failures += blocking.b3_failures;
        self.blocking.b4_attempts += blocking.b4_attempts;
        self.blocking.b4_failures += blocking.b4_failures;
        self.blocking.b5_attempts += blocking.b5_attempts;
        self.blocking.b5_failures += blocking.b5_failures;
        self.blocking.b6_attempts += blocking.b6_attempts;
        self.blocking.b6_failures += blocking.b6_failures;
        self.blocking.ancestor_searches += blocking.ancestor_searches;
        self.blocking.anywhere_searches += blocking.anywhere_searches;
        self.blocking.blocks_set += blocking.blocks_set;
        self.blocking.unblocks += blocking.unblocks;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_accumulates_across_multiple_checks() {
        let mut stats = SessionStats::new();
        let mut reasoning = ReasoningStats::default();
        reasoning.steps = 10;
        reasoning.clashes = 2;
        stats.record(reasoning, BlockingStats::default());
        stats.record(reasoning, BlockingStats::default());

        assert_eq!(stats.queries, 2);
        assert_eq!(stats.reasoning.steps, 20);
        assert_eq!(stats.reasoning.clashes, 4);
    }
}
