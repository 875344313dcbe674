use std::fmt;

use crate::{
    parser,
    pattern::{PathKind, Pattern},
    patternset, MalformedPatternError,
};

/// An owner identifier as written in the ownership file: a user handle, a
/// team or an email address. The engine never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Owner(String);

impl Owner {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Owner {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Owner {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A pattern and the owners of the paths it matches. An empty owner list
/// marks matching paths as explicitly unowned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipRule {
    pub pattern: Pattern,
    pub owners: Vec<Owner>,
}

/// Where a rule was defined: the name of its source and its 1-based line
/// number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleSource {
    pub source_name: String,
    pub line: usize,
}

impl RuleSource {
    pub fn new(source_name: impl Into<String>, line: usize) -> Self {
        Self {
            source_name: source_name.into(),
            line,
        }
    }
}

impl fmt::Display for RuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source_name, self.line)
    }
}

/// An [`OwnershipRule`] along with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedRule {
    pub source: RuleSource,
    pub rule: OwnershipRule,
}

impl AnnotatedRule {
    pub fn pattern(&self) -> &Pattern {
        &self.rule.pattern
    }

    pub fn owners(&self) -> &[Owner] {
        &self.rule.owners
    }
}

/// An ordered set of ownership rules. Later rules take precedence over
/// earlier ones: a path is governed by the last rule whose pattern matches
/// it.
///
/// All patterns are compiled into a single matcher when the set is built, so
/// each query walks the path's components once regardless of how many rules
/// there are. The set is immutable and can be shared between threads.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<AnnotatedRule>,
    matcher: patternset::Matcher,
}

impl RuleSet {
    /// Build a rule set. Rules keep the order given, which is their
    /// precedence order.
    pub fn new(rules: Vec<AnnotatedRule>) -> Self {
        let mut builder = RuleSetBuilder::new();
        for rule in rules {
            builder.add(rule);
        }
        builder.build()
    }

    /// Parse ownership file contents and build a rule set from them.
    pub fn parse(source: &str, source_name: &str) -> Result<Self, MalformedPatternError> {
        Ok(Self::new(parser::parse(source, source_name)?))
    }

    pub fn rules(&self) -> &[AnnotatedRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Find the rule governing a path. The final component may be either a
    /// file or a directory; use [`RuleSet::resolve_as`] to say which.
    pub fn resolve(&self, path: &str) -> Option<&AnnotatedRule> {
        self.resolve_as(path, PathKind::Directory)
    }

    /// Find the rule governing a path of the given kind. Returns `None` when
    /// no rule matches, or when the last matching rule is negated.
    pub fn resolve_as(&self, path: &str, kind: PathKind) -> Option<&AnnotatedRule> {
        let idx = self.matcher.last_matching_pattern(path, kind);
        self.governing_rule(idx)
    }

    /// Evaluate every rule in order against the path, without the index.
    /// Always agrees with [`RuleSet::resolve_as`].
    pub fn resolve_linear(&self, path: &str, kind: PathKind) -> Option<&AnnotatedRule> {
        let mut current = None;
        for rule in &self.rules {
            if rule.pattern().is_match(path, kind) {
                current = if rule.pattern().is_negated() {
                    None
                } else {
                    Some(rule)
                };
            }
        }
        current
    }

    /// Resolve many paths at once. Returns the governing rule for each path,
    /// in the same order as `paths`.
    pub fn resolve_all<P: AsRef<str>>(
        &self,
        paths: &[P],
        kind: PathKind,
    ) -> Vec<Option<&AnnotatedRule>> {
        self.matcher
            .last_matching_patterns(paths, kind)
            .into_iter()
            .map(|idx| self.governing_rule(idx))
            .collect()
    }

    /// Every rule whose pattern matches the path, in rule order. Negation is
    /// ignored, so this shows which rules were considered.
    pub fn matching_rules(&self, path: &str, kind: PathKind) -> Vec<&AnnotatedRule> {
        self.matcher
            .matching_patterns(path, kind)
            .into_iter()
            .map(|idx| &self.rules[idx])
            .collect()
    }

    /// The owners of a path, or `None` if no rule governs it. A governing rule
    /// with no owners gives an empty slice.
    pub fn owners(&self, path: &str, kind: PathKind) -> Option<&[Owner]> {
        self.resolve_as(path, kind).map(AnnotatedRule::owners)
    }

    fn governing_rule(&self, idx: Option<usize>) -> Option<&AnnotatedRule> {
        let rule = &self.rules[idx?];
        if rule.pattern().is_negated() {
            None
        } else {
            Some(rule)
        }
    }
}

/// Incrementally builds a [`RuleSet`].
#[derive(Clone)]
pub struct RuleSetBuilder {
    rules: Vec<AnnotatedRule>,
    pattern_set_builder: patternset::Builder,
}

impl RuleSetBuilder {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            pattern_set_builder: patternset::Builder::new(),
        }
    }

    /// Add a rule. It takes precedence over every rule added before it.
    pub fn add(&mut self, rule: AnnotatedRule) {
        self.pattern_set_builder.add(rule.pattern());
        self.rules.push(rule);
    }

    pub fn build(self) -> RuleSet {
        let matcher = self.pattern_set_builder.build();
        tracing::debug!(
            rules = self.rules.len(),
            states = matcher.num_states(),
            "built rule set index"
        );
        RuleSet {
            rules: self.rules,
            matcher,
        }
    }
}

impl Default for RuleSetBuilder {
    fn default() -> Self {
        Self::new()
    }
}
