//! Configuration loading: hierarchical, figment-backed, layered the same
//! way as every other ambient concern in this crate — a checked-in
//! `reasoner.toml`, an optional git-ignored `reasoner.local.toml`, then
//! `FACTPP_*` environment variables, each layer overriding the last.
//!
//! ## Example
//!
//! ```toml
//! # reasoner.toml
//! [tableau]
//! todo_priorities = "0012345"
//! semantic_branching = true
//!
//! [blocking]
//! search = "ancestor"
//! trigger = "lazy"
//! ```
//!
//! ```bash
//! FACTPP_TABLEAU__TIMEOUT_SECS=30
//! ```

use std::time::Duration;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::absorption::AbsorptionRule;

/// Root configuration for a [`crate::session::Session`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningConfig {
    #[serde(default)]
    pub tableau: TableauConfig,
    #[serde(default)]
    pub blocking: BlockingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Tuning knobs for the expansion loop itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableauConfig {
    /// `PriorityMatrix::parse` input — which ToDo bucket each tactic kind
    /// routes to. Matches `PriorityMatrix::default`'s ascending assignment.
    #[serde(default = "default_todo_priorities")]
    pub todo_priorities: String,

    /// Order `TAxiomSet::absorb` tries its rewrite rules in.
    #[serde(default = "default_absorption_order")]
    pub absorption_order: Vec<AbsorptionRule>,

    /// Prefer the branch with fewer remaining disjuncts first (semantic
    /// branching) instead of syntactic left-to-right order.
    #[serde(default = "default_true")]
    pub semantic_branching: bool,

    /// Jump straight to the branch point that caused a clash instead of
    /// chronological backtracking.
    #[serde(default = "default_true")]
    pub backjumping: bool,

    /// Wall-clock budget for a single top-level satisfiability test;
    /// `None` means no timeout.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl TableauConfig {
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Tuning knobs for the blocking engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockingConfig {
    /// `"ancestor"` or `"anywhere"`.
    #[serde(default = "default_search")]
    pub search: String,

    /// `"eager"` or `"lazy"`.
    #[serde(default = "default_trigger")]
    pub trigger: String,
}

impl BlockingConfig {
    #[must_use]
    pub fn search_strategy(&self) -> crate::blocking::SearchStrategy {
        if self.search.eq_ignore_ascii_case("anywhere") {
            crate::blocking::SearchStrategy::Anywhere
        } else {
            crate::blocking::SearchStrategy::Ancestor
        }
    }

    #[must_use]
    pub fn trigger_mode(&self) -> crate::blocking::Trigger {
        if self.trigger.eq_ignore_ascii_case("eager") {
            crate::blocking::Trigger::Eager
        } else {
            crate::blocking::Trigger::Lazy
        }
    }
}

/// Logging configuration handed to `tracing-subscriber` at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `trace`/`debug`/`info`/`warn`/`error`, or a full `EnvFilter` directive.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `text` or `json`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_todo_priorities() -> String {
    "0012345".to_string()
}
fn default_absorption_order() -> Vec<AbsorptionRule> {
    crate::absorption::DEFAULT_ORDER.to_vec()
}
fn default_true() -> bool {
    true
}
fn default_search() -> String {
    "ancestor".to_string()
}
fn default_trigger() -> String {
    "lazy".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

impl Default for TableauConfig {
    fn default() -> Self {
        TableauConfig {
            todo_priorities: default_todo_priorities(),
            absorption_order: default_absorption_order(),
            semantic_branching: true,
            backjumping: true,
            timeout_secs: None,
        }
    }
}

impl Default for BlockingConfig {
    fn default() -> Self {
        BlockingConfig { search: default_search(), trigger: default_trigger() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { level: default_log_level(), format: default_log_format() }
    }
}

impl ReasoningConfig {
    /// Merge `reasoner.toml`, then `reasoner.local.toml`, then `FACTPP_*`
    /// environment variables (`__`-separated for nested keys).
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("reasoner.toml"))
            .merge(Toml::file("reasoner.local.toml"))
            .merge(Env::prefixed("FACTPP_").split("__"))
            .extract()
    }

    /// Merge a specific file plus environment overrides, bypassing the
    /// default two-file layering — used by the CLI's `--config` flag.
    pub fn from_file(path: &str) -> Result<Self, figment::Error> {
        Figment::new().merge(Toml::file(path)).merge(Env::prefixed("FACTPP_").split("__")).extract()
    }

    #[must_use]
    pub fn default() -> Self {
        ReasoningConfig { tableau: TableauConfig::default(), blocking: BlockingConfig::default(), logging: LoggingConfig::default() }
    }
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_crates_built_in_ordering() {
        let config = ReasoningConfig::default();
        assert_eq!(config.tableau.todo_priorities, "0012345");
        assert!(config.tableau.semantic_branching);
        assert!(config.tableau.backjumping);
        assert_eq!(config.blocking.search, "ancestor");
        assert_eq!(config.blocking.trigger, "lazy");
    }

    #[test]
    fn round_trips_through_toml() {
        let config = ReasoningConfig::default();
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("[tableau]"));
        assert!(text.contains("[blocking]"));
        assert!(text.contains("[logging]"));
    }

    #[test]
    fn timeout_secs_converts_to_a_duration() {
        let mut config = TableauConfig::default();
        config.timeout_secs = Some(30);
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
        config.timeout_secs = None;
        assert_eq!(config.timeout(), None);
    }
}
