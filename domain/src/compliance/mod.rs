//! Compliance domain: rules, violations, results and history statistics.

pub mod result;
pub mod rule;
pub mod statistics;

pub use result::{ComplianceLevel, ComplianceResult, Violation, compliance_score};
pub use rule::{ComplianceScope, ConstitutionalRule, RuleSeverity};
pub use statistics::{ComplianceStatistics, ComplianceTrend, TrendDirection};
