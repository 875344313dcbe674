use std::{fs, path::Path};

use crate::{
    error::{Error, MalformedPatternError, PatternError},
    pattern::Pattern,
    ruleset::{AnnotatedRule, Owner, OwnershipRule, RuleSource},
};

/// Split ownership file contents into numbered lines. Lines are separated by
/// `\n`, a trailing `\r` is dropped, and empty lines are kept so numbering
/// starts at 1 and matches the file.
pub fn lines(source: &str) -> impl Iterator<Item = (usize, &str)> {
    source.split('\n').enumerate().map(|(idx, line)| {
        let line = line.strip_suffix('\r').unwrap_or(line);
        (idx + 1, line)
    })
}

/// Parse a single line. Blank lines and comments give `Ok(None)`. Otherwise
/// the first token is the pattern and every remaining token is an owner.
/// Tokens are separated by ASCII whitespace only.
pub fn parse_line(line: &str) -> Result<Option<OwnershipRule>, PatternError> {
    let mut tokens = line.split_ascii_whitespace();
    let Some(pattern) = tokens.next() else {
        return Ok(None);
    };
    if pattern.starts_with('#') {
        return Ok(None);
    }

    let pattern = Pattern::new(pattern)?;
    let owners = tokens.map(Owner::from).collect();
    Ok(Some(OwnershipRule { pattern, owners }))
}

/// Parse numbered lines into rules annotated with `source_name` and their
/// line number. The first line with a pattern that fails to compile aborts
/// parsing.
pub fn parse_lines<'a, I>(
    lines: I,
    source_name: &str,
) -> Result<Vec<AnnotatedRule>, MalformedPatternError>
where
    I: IntoIterator<Item = (usize, &'a str)>,
{
    let mut rules = Vec::new();
    for (line_number, line) in lines {
        match parse_line(line) {
            Ok(Some(rule)) => rules.push(AnnotatedRule {
                source: RuleSource::new(source_name, line_number),
                rule,
            }),
            Ok(None) => {
                tracing::trace!(source = source_name, line = line_number, "skipping line");
            }
            Err(reason) => {
                return Err(MalformedPatternError {
                    rule_source: RuleSource::new(source_name, line_number),
                    pattern: line
                        .split_ascii_whitespace()
                        .next()
                        .unwrap_or_default()
                        .to_owned(),
                    reason,
                });
            }
        }
    }
    Ok(rules)
}

/// Parse ownership file contents.
pub fn parse(source: &str, source_name: &str) -> Result<Vec<AnnotatedRule>, MalformedPatternError> {
    let rules = parse_lines(lines(source), source_name)?;
    tracing::debug!(source = source_name, rules = rules.len(), "parsed ownership rules");
    Ok(rules)
}

/// Read and parse an ownership file. Rules are attributed to `source_name`,
/// or to the path as given when it's `None`.
pub fn parse_file(
    path: impl AsRef<Path>,
    source_name: Option<&str>,
) -> Result<Vec<AnnotatedRule>, Error> {
    let path = path.as_ref();
    let source = fs::read_to_string(path)?;
    let source_name = match source_name {
        Some(name) => name.to_owned(),
        None => path.display().to_string(),
    };
    Ok(parse(&source, &source_name)?)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn ownership_rule(pattern: &str, owners: &[&str]) -> OwnershipRule {
        OwnershipRule {
            pattern: Pattern::new(pattern).unwrap(),
            owners: owners.iter().map(|&o| Owner::from(o)).collect(),
        }
    }

    #[test]
    fn test_lines() {
        let lines = lines("a\nbb\r\n\nccc").collect::<Vec<_>>();
        assert_eq!(lines, vec![(1, "a"), (2, "bb"), (3, ""), (4, "ccc")]);

        assert_eq!(super::lines("").collect::<Vec<_>>(), vec![(1, "")]);
        assert_eq!(super::lines("a\n").collect::<Vec<_>>(), vec![(1, "a"), (2, "")]);
    }

    #[test]
    fn test_parse_non_rule() {
        for line in ["", "\t", "  ", "# comment", "  # comment", "#no-space"] {
            assert_eq!(parse_line(line), Ok(None), "expected no rule for {:?}", line);
        }
    }

    #[test]
    fn test_parse_valid_rules() {
        let examples = [
            ("docs/*  docs@example.com", ownership_rule("docs/*", &["docs@example.com"])),
            ("/docs/  @doctocat", ownership_rule("/docs/", &["@doctocat"])),
            ("apps/  @octocat", ownership_rule("apps/", &["@octocat"])),
            ("\t*.js @a @org/team  c@d.co ", ownership_rule("*.js", &["@a", "@org/team", "c@d.co"])),
            ("build/", ownership_rule("build/", &[])),
            ("!vendor/ @nobody", ownership_rule("!vendor/", &["@nobody"])),
        ];

        for (line, expected) in examples {
            assert_eq!(parse_line(line), Ok(Some(expected)), "result mismatch for `{}`", line);
        }
    }

    #[test]
    fn test_every_token_after_pattern_is_an_owner() {
        assert_eq!(
            parse_line("*.rs @a #b @c"),
            Ok(Some(ownership_rule("*.rs", &["@a", "#b", "@c"])))
        );

        let ruleset = crate::RuleSet::parse("*.rs @a #b @c\n", "C").unwrap();
        let owners = ruleset
            .owners("lib.rs", crate::PathKind::File)
            .unwrap()
            .iter()
            .map(Owner::as_str)
            .collect::<Vec<_>>();
        assert_eq!(owners, vec!["@a", "#b", "@c"]);
    }

    #[test]
    fn test_only_ascii_whitespace_separates_tokens() {
        assert_eq!(
            parse_line("a\u{a0}b @x"),
            Ok(Some(ownership_rule("a\u{a0}b", &["@x"])))
        );
        assert_eq!(
            parse_line("docs/*\t@a\x0c@b"),
            Ok(Some(ownership_rule("docs/*", &["@a", "@b"])))
        );

        let rule = parse_line("\u{a0}x\u{a0} @y").unwrap().unwrap();
        assert_eq!(rule.pattern.as_str(), "\u{a0}x\u{a0}");
    }

    #[test]
    fn test_parse_invalid_rule() {
        assert_eq!(parse_line("/ @root"), Err(PatternError::NoComponents));
        assert!(matches!(
            parse_line("[abc @x"),
            Err(PatternError::UnterminatedClass(_))
        ));
    }

    #[test]
    fn test_parse() {
        let content = "# Comment
        docs/*  docs@example.com

        # Comment
        apps/  @octocat
    ";

        let rules = parse(content, ".github/CODEOWNERS").unwrap();
        assert_eq!(
            rules,
            vec![
                AnnotatedRule {
                    source: RuleSource::new(".github/CODEOWNERS", 2),
                    rule: ownership_rule("docs/*", &["docs@example.com"]),
                },
                AnnotatedRule {
                    source: RuleSource::new(".github/CODEOWNERS", 5),
                    rule: ownership_rule("apps/", &["@octocat"]),
                },
            ]
        );
    }

    #[test]
    fn test_parse_lines_keeps_given_numbers() {
        let rules = parse_lines([(10, "*.md @docs"), (42, "# skip"), (43, "/src/ @core")], "inline").unwrap();
        let sources = rules.iter().map(|r| r.source.to_string()).collect::<Vec<_>>();
        assert_eq!(sources, vec!["inline:10", "inline:43"]);
    }

    #[test]
    fn test_malformed_pattern() {
        let content = "*.rs @rust\n\n  [z-a].txt @bad\n*.md @docs\n";
        let err = parse(content, "CODEOWNERS").unwrap_err();
        assert_eq!(err.rule_source, RuleSource::new("CODEOWNERS", 3));
        assert_eq!(err.pattern, "[z-a].txt");
        assert_eq!(
            err.reason,
            PatternError::InvalidRange {
                start: 'z',
                end: 'a'
            }
        );
        assert!(err.to_string().starts_with("CODEOWNERS:3: invalid pattern `[z-a].txt`: "));
    }

    #[test]
    fn test_parse_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "*.rs @rust").unwrap();
        writeln!(file, "/docs/ @docs").unwrap();

        let rules = parse_file(file.path(), Some("CODEOWNERS")).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[1].source, RuleSource::new("CODEOWNERS", 2));

        let rules = parse_file(file.path(), None).unwrap();
        assert_eq!(rules[0].source.source_name, file.path().display().to_string());

        let missing = file.path().with_extension("missing");
        assert!(matches!(parse_file(&missing, None), Err(Error::Io(_))));
    }
}
