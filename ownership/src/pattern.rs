use std::{fmt, hash, str::FromStr};

use crate::{error::PatternError, glob::SegmentGlob};

/// Whether a queried path names a plain file or a directory. This only
/// matters for directory patterns (those with a trailing slash), and only for
/// the final component of the path: every other component is a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    File,
    Directory,
}

/// A compiled CODEOWNERS pattern, following gitignore matching rules.
///
/// Patterns are compared by their text: two patterns with the same text
/// always match the same paths.
#[derive(Clone)]
pub struct Pattern {
    text: String,
    negated: bool,
    anchored: bool,
    directory_only: bool,
    has_separator_in_middle: bool,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone)]
pub(crate) enum Segment {
    /// `**`, matching zero or more whole path components
    AnyDepth,
    Glob(SegmentGlob),
}

impl Pattern {
    /// Compile a pattern. Surrounding ASCII whitespace is ignored.
    pub fn new(text: &str) -> Result<Pattern, PatternError> {
        let text = text.trim_matches(|c: char| c.is_ascii_whitespace());
        if text.is_empty() {
            return Err(PatternError::Empty);
        }
        if text.starts_with('#') {
            return Err(PatternError::Comment);
        }
        if text.contains('\0') {
            return Err(PatternError::NullByte);
        }

        let (glob, negated) = match text.strip_prefix('!') {
            Some(glob) => (glob, true),
            None => (text, false),
        };

        // A leading slash anchors the pattern to the root
        let (glob, anchored) = match glob.strip_prefix('/') {
            Some(glob) => (glob, true),
            None => (glob, false),
        };

        // A trailing slash restricts the final component to directories
        let (glob, directory_only) = match glob.strip_suffix('/') {
            Some(glob) => (glob, true),
            None => (glob, false),
        };

        // CODEOWNERS files use Unix path separators.
        let raw_segments = glob
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>();
        if raw_segments.is_empty() {
            return Err(PatternError::NoComponents);
        }
        let has_separator_in_middle = raw_segments.len() > 1;

        let mut segments: Vec<Segment> = Vec::with_capacity(raw_segments.len() + 1);
        for raw in raw_segments {
            if raw == "**" {
                // Consecutive double stars are equivalent to one
                if !matches!(segments.last(), Some(Segment::AnyDepth)) {
                    segments.push(Segment::AnyDepth);
                }
            } else {
                segments.push(Segment::Glob(SegmentGlob::new(raw)?));
            }
        }

        // A trailing `**` matches everything inside a directory but not the
        // directory itself. Since a match on a directory extends to everything
        // beneath it, that's the same as a trailing `*`. This also covers a
        // lone `**`, which is an ordinary single-component glob.
        if let Some(last) = segments.last_mut() {
            if matches!(last, Segment::AnyDepth) {
                *last = Segment::Glob(SegmentGlob::any());
            }
        }

        // Patterns without a leading or inner separator match at any depth,
        // exactly like they would with a leading `**/`.
        if !anchored && !has_separator_in_middle {
            segments.insert(0, Segment::AnyDepth);
        }

        Ok(Pattern {
            text: text.to_owned(),
            negated,
            anchored,
            directory_only,
            has_separator_in_middle,
            segments,
        })
    }

    /// The pattern text, as written in the rules file.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// True for patterns starting with `!`.
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// True for patterns starting with `/`.
    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    /// True for patterns ending with `/`.
    pub fn is_directory_only(&self) -> bool {
        self.directory_only
    }

    pub fn has_separator_in_middle(&self) -> bool {
        self.has_separator_in_middle
    }

    pub(crate) fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Match a relative path, honoring negation. The final component isn't
    /// assumed to be a plain file, so directory patterns can match it.
    pub fn matches(&self, path: &str) -> bool {
        self.matches_as(path, PathKind::Directory)
    }

    /// Match a relative path of a known kind, honoring negation.
    pub fn matches_as(&self, path: &str, kind: PathKind) -> bool {
        self.is_match(path, kind) != self.negated
    }

    /// Whether the underlying glob matches the path, ignoring negation.
    ///
    /// A path matches if the glob matches the path itself or any of its
    /// ancestor directories, since matching a directory matches everything
    /// beneath it.
    pub fn is_match(&self, path: &str, kind: PathKind) -> bool {
        let (components, trailing_slash) = split_path(path);
        let kind = if trailing_slash {
            PathKind::Directory
        } else {
            kind
        };
        let Some(last) = components.len().checked_sub(1) else {
            return false;
        };

        let reachable = self.prefix_matches(&components);
        reachable[1..=last].iter().any(|&matched| matched)
            || (reachable[last + 1] && (!self.directory_only || kind == PathKind::Directory))
    }

    // Returns a vec where entry `k` is true iff the pattern's segments match
    // exactly the first `k` path components. Dynamic programming over the
    // segments keeps globstars linear instead of backtracking.
    fn prefix_matches(&self, components: &[&str]) -> Vec<bool> {
        let mut reachable = vec![false; components.len() + 1];
        reachable[0] = true;

        for segment in &self.segments {
            let mut next = vec![false; components.len() + 1];
            match segment {
                Segment::AnyDepth => {
                    let mut seen = false;
                    for (k, &matched) in reachable.iter().enumerate() {
                        seen |= matched;
                        next[k] = seen;
                    }
                }
                Segment::Glob(glob) => {
                    for (k, component) in components.iter().enumerate() {
                        next[k + 1] = reachable[k] && glob.is_match(component);
                    }
                }
            }
            reachable = next;
        }

        reachable
    }
}

/// Split a relative path into its components. Empty and `.` components are
/// dropped. Also reports whether the path had a trailing slash.
pub(crate) fn split_path(path: &str) -> (Vec<&str>, bool) {
    let components = path
        .split('/')
        .filter(|component| !component.is_empty() && *component != ".")
        .collect();
    (components, path.ends_with('/'))
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Pattern {}

impl hash::Hash for Pattern {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.text).finish()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Pattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pattern::new(s)
    }
}

impl TryFrom<&str> for Pattern {
    type Error = PatternError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Pattern::new(s)
    }
}
