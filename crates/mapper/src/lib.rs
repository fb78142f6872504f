//! Property Mapper: turns raw settings into the typed world-option record.
//!
//! # Invariants
//! - Output order is the rule table's declaration order, never input order.
//! - Unknown keys are reported and dropped; they never fail the run.
//! - Any validation failure aborts mapping; no partial map is returned.
//! - Pure: no I/O.

pub mod mapper;
pub mod rules;

pub use mapper::{MappingError, MappingReport, PropertyMapper, map};
pub use rules::{MappingRule, RuleError, ValueKind, WORLD_OPTION_RULES, validate_rules};
