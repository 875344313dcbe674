use std::{fmt, iter::Peekable, str::CharIndices};

use crate::error::PatternError;

/// A glob that matches a single path component. Supports `*`, `?`, bracket
/// character classes and backslash escapes. None of the wildcards match `/`.
///
/// Most globs in real CODEOWNERS files are literals or have a single leading
/// or trailing star, so those are matched without a regex.
#[derive(Clone)]
pub(crate) struct SegmentGlob {
    glob: String,
    condition: Condition,
}

impl SegmentGlob {
    pub(crate) fn new(glob: &str) -> Result<Self, PatternError> {
        let tokens = tokenize(glob)?;
        let condition = Condition::new(glob, &tokens)?;
        Ok(Self {
            glob: glob.to_owned(),
            condition,
        })
    }

    /// A glob matching any single component.
    pub(crate) fn any() -> Self {
        Self {
            glob: "*".to_owned(),
            condition: Condition::Unconditional,
        }
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.glob
    }

    pub(crate) fn is_match(&self, candidate: &str) -> bool {
        self.condition.is_match(candidate)
    }
}

impl fmt::Debug for SegmentGlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SegmentGlob").field(&self.glob).finish()
    }
}

#[derive(Debug, Clone)]
enum Condition {
    Unconditional,
    Literal(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
    Regex(regex::Regex),
}

impl Condition {
    fn new(glob: &str, tokens: &[Token]) -> Result<Self, PatternError> {
        let condition = match tokens {
            [Token::Star] => Self::Unconditional,
            [Token::Star, middle @ .., Token::Star] if all_literal(middle) => {
                Self::Contains(literal(middle))
            }
            [Token::Star, rest @ ..] if all_literal(rest) => Self::Suffix(literal(rest)),
            [rest @ .., Token::Star] if all_literal(rest) => Self::Prefix(literal(rest)),
            _ if all_literal(tokens) => Self::Literal(literal(tokens)),
            _ => Self::Regex(tokens_to_regex(glob, tokens)?),
        };
        Ok(condition)
    }

    fn is_match(&self, candidate: &str) -> bool {
        match self {
            Self::Unconditional => true,
            Self::Literal(literal) => literal == candidate,
            Self::Prefix(prefix) => candidate.starts_with(prefix.as_str()),
            Self::Suffix(suffix) => candidate.ends_with(suffix.as_str()),
            Self::Contains(needle) => {
                memchr::memmem::find(candidate.as_bytes(), needle.as_bytes()).is_some()
            }
            Self::Regex(re) => re.is_match(candidate),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Char(char),
    Star,
    AnyChar,
    Class { negated: bool, ranges: Vec<(char, char)> },
}

fn all_literal(tokens: &[Token]) -> bool {
    tokens.iter().all(|t| matches!(t, Token::Char(_)))
}

fn literal(tokens: &[Token]) -> String {
    tokens
        .iter()
        .filter_map(|t| match t {
            Token::Char(c) => Some(*c),
            _ => None,
        })
        .collect()
}

fn tokenize(glob: &str) -> Result<Vec<Token>, PatternError> {
    let mut tokens = Vec::with_capacity(glob.len());
    let mut chars = glob.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        match c {
            // Runs of stars behave like a single star within a component
            '*' => {
                if tokens.last() != Some(&Token::Star) {
                    tokens.push(Token::Star);
                }
            }
            '?' => tokens.push(Token::AnyChar),
            '\\' => match chars.next() {
                Some((_, escaped)) => tokens.push(Token::Char(escaped)),
                None => return Err(PatternError::TrailingBackslash(glob.to_owned())),
            },
            '[' => tokens.push(parse_class(glob, &mut chars)?),
            _ => tokens.push(Token::Char(c)),
        }
    }
    Ok(tokens)
}

// Parses a bracket expression, with the opening `[` already consumed. A `]`
// immediately after the opening bracket (or the negation marker) is literal.
fn parse_class(glob: &str, chars: &mut Peekable<CharIndices>) -> Result<Token, PatternError> {
    let unterminated = || PatternError::UnterminatedClass(glob.to_owned());

    let negated = matches!(chars.peek(), Some((_, '!' | '^')));
    if negated {
        chars.next();
    }

    let mut ranges = Vec::new();
    let mut first = true;
    loop {
        let start = match chars.next() {
            Some((_, ']')) if !first => break,
            Some((_, '\\')) => chars.next().map(|(_, c)| c).ok_or_else(unterminated)?,
            Some((_, c)) => c,
            None => return Err(unterminated()),
        };
        first = false;

        // A `-` is a range operator unless it's the last character in the class
        let mut lookahead = chars.clone();
        let is_range = matches!(lookahead.next(), Some((_, '-')))
            && !matches!(lookahead.next(), Some((_, ']')) | None);
        if !is_range {
            ranges.push((start, start));
            continue;
        }

        chars.next();
        let end = match chars.next() {
            Some((_, '\\')) => chars.next().map(|(_, c)| c).ok_or_else(unterminated)?,
            Some((_, c)) => c,
            None => return Err(unterminated()),
        };
        if end < start {
            return Err(PatternError::InvalidRange { start, end });
        }
        ranges.push((start, end));
    }

    Ok(Token::Class { negated, ranges })
}

fn tokens_to_regex(glob: &str, tokens: &[Token]) -> Result<regex::Regex, PatternError> {
    let mut regex = String::with_capacity(glob.len() + 8);
    regex.push_str(r#"\A"#);
    for token in tokens {
        match token {
            Token::Star => regex.push_str(r#"[^/]*"#),
            Token::AnyChar => regex.push_str(r#"[^/]"#),
            Token::Char(c) => push_escaped(&mut regex, *c),
            Token::Class { negated, ranges } => {
                regex.push('[');
                if *negated {
                    regex.push('^');
                }
                for &(start, end) in ranges {
                    push_escaped(&mut regex, start);
                    if start != end {
                        regex.push('-');
                        push_escaped(&mut regex, end);
                    }
                }
                regex.push(']');
            }
        }
    }
    regex.push_str(r#"\z"#);

    regex::Regex::new(&regex).map_err(|err| PatternError::Regex {
        glob: glob.to_owned(),
        message: err.to_string(),
    })
}

fn push_escaped(regex: &mut String, c: char) {
    if regex_syntax::is_meta_character(c) {
        regex.push('\\');
    }
    regex.push(c);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glob(s: &str) -> SegmentGlob {
        SegmentGlob::new(s).unwrap_or_else(|err| panic!("invalid glob {:?}: {}", s, err))
    }

    #[test]
    fn test_literal() {
        assert!(glob("foo").is_match("foo"));
        assert!(!glob("fo").is_match("foo"));
        assert!(!glob("foo").is_match("fo"));
        assert!(!glob("Foo").is_match("foo"));
    }

    #[test]
    fn test_question_mark() {
        assert!(glob("?").is_match("a"));
        assert!(glob("f??").is_match("foo"));
        assert!(!glob("b??").is_match("foo"));
        assert!(!glob("?b").is_match("foo"));
        assert!(glob("?").is_match("é"));
    }

    #[test]
    fn test_star() {
        assert!(glob("*").is_match(""));
        assert!(glob("*").is_match("foo"));
        assert!(glob("f*").is_match("foo"));
        assert!(glob("*o").is_match("foo"));
        assert!(glob("f*o").is_match("foo"));
        assert!(glob("fo*o").is_match("foo"));
        assert!(glob("foo*").is_match("foo"));
        assert!(glob("*foo").is_match("foo"));
        assert!(glob("*o*").is_match("foo"));
        assert!(glob("**.rs").is_match("lib.rs"));
        assert!(!glob("b*").is_match("foo"));
        assert!(!glob("*b").is_match("a"));
        assert!(!glob("*b").is_match("foo"));
        assert!(!glob("*x*").is_match("foo"));
    }

    #[test]
    fn test_exponential_match() {
        let mut pat = "a*".repeat(10);
        pat.push('b');
        let cand = "a".repeat(100);
        assert!(!glob(&pat).is_match(&cand));
    }

    #[test]
    fn test_character_classes() {
        assert!(glob("[abc].rs").is_match("b.rs"));
        assert!(!glob("[abc].rs").is_match("d.rs"));
        assert!(glob("[a-c]x").is_match("cx"));
        assert!(!glob("[a-c]x").is_match("dx"));
        assert!(glob("[!a-c]x").is_match("dx"));
        assert!(glob("[^a-c]x").is_match("dx"));
        assert!(!glob("[!a-c]x").is_match("ax"));
        assert!(glob("[]]").is_match("]"));
        assert!(glob("[a-]").is_match("-"));
        assert!(glob("v[0-9].[0-9]").is_match("v1.2"));
        assert!(glob("[.]md").is_match(".md"));
        assert!(!glob("[.]md").is_match("xmd"));
    }

    #[test]
    fn test_escape_sequences() {
        assert!(glob("f\\*o").is_match("f*o"));
        assert!(!glob("f\\*o").is_match("foo"));
        assert!(glob("a*b\\??").is_match("axb?!"));
        assert!(!glob("a*b\\??").is_match("axbc!"));
        assert!(glob("\\*qux").is_match("*qux"));
        assert!(!glob("\\*qux").is_match("xqux"));
        assert!(glob("bar\\*").is_match("bar*"));
        assert!(!glob("bar\\*").is_match("bar"));
        assert!(glob("\\[x]").is_match("[x]"));
    }

    #[test]
    fn test_malformed() {
        assert_eq!(
            SegmentGlob::new("[abc").unwrap_err(),
            PatternError::UnterminatedClass("[abc".to_owned())
        );
        assert_eq!(
            SegmentGlob::new("[]").unwrap_err(),
            PatternError::UnterminatedClass("[]".to_owned())
        );
        assert_eq!(
            SegmentGlob::new("[z-a]").unwrap_err(),
            PatternError::InvalidRange {
                start: 'z',
                end: 'a'
            }
        );
        assert_eq!(
            SegmentGlob::new("foo\\").unwrap_err(),
            PatternError::TrailingBackslash("foo\\".to_owned())
        );
    }

    #[test]
    fn test_condition_selection() {
        assert!(matches!(glob("*").condition, Condition::Unconditional));
        assert!(matches!(glob("**").condition, Condition::Unconditional));
        assert!(matches!(glob("foo").condition, Condition::Literal(_)));
        assert!(matches!(glob("foo*").condition, Condition::Prefix(_)));
        assert!(matches!(glob("*.rs").condition, Condition::Suffix(_)));
        assert!(matches!(glob("*test*").condition, Condition::Contains(_)));
        assert!(matches!(glob("\\*.rs").condition, Condition::Literal(_)));
        assert!(matches!(glob("f?o").condition, Condition::Regex(_)));
        assert!(matches!(glob("*.[ch]").condition, Condition::Regex(_)));
    }
}
