//! Constitutional rule files
//!
//! Teams extend the built-in rule set with a TOML or JSON file named by
//! `compliance.rules_file`. Pattern compilation happens at registration in
//! the compliance engine; this module only parses and shape-checks entries.

mod loader;

pub use loader::{RuleFileError, RuleFormat, load_rules, parse_rules};
