//! Parse CODEOWNERS files and resolve which rule owns a path.
//!
//! Patterns follow gitignore semantics, and the last rule whose pattern
//! matches a path governs it:
//!
//! ```
//! use ownership::{PathKind, RuleSet};
//!
//! let ruleset = RuleSet::parse("*.rs @rustaceans\n/docs/ @writers\n", "CODEOWNERS").unwrap();
//! let rule = ruleset.resolve_as("docs/build.rs", PathKind::File).unwrap();
//! assert_eq!(rule.source.to_string(), "CODEOWNERS:2");
//! assert_eq!(rule.owners()[0].as_str(), "@writers");
//! ```

mod error;
mod glob;
pub mod parser;
mod path_tree;
mod pattern;
pub mod patternset;
mod ruleset;

use std::path::Path;

pub use error::{Error, MalformedPatternError, PatternError};
pub use pattern::{PathKind, Pattern};
pub use ruleset::{AnnotatedRule, Owner, OwnershipRule, RuleSet, RuleSetBuilder, RuleSource};

/// Read an ownership file and build a rule set from it. Rules are attributed
/// to the path as given.
pub fn from_path(path: impl AsRef<Path>) -> Result<RuleSet, Error> {
    let rules = parser::parse_file(path, None)?;
    Ok(RuleSet::new(rules))
}
