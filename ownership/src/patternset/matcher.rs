use crate::pattern::{split_path, PathKind};

use super::nfa::{Nfa, StateId};

/// Matches paths against a set of patterns. Created using a
/// [`super::Builder`]. The matcher is immutable, so it can be shared between
/// threads freely.
#[derive(Debug, Clone)]
pub struct Matcher {
    pub(super) nfa: Nfa,
}

impl Matcher {
    pub(crate) fn new(nfa: Nfa) -> Matcher {
        Self { nfa }
    }

    /// The number of automaton states backing the matcher.
    pub fn num_states(&self) -> usize {
        self.nfa.len()
    }

    /// Returns the ids of all patterns whose glob matches the path, in
    /// ascending order. Negation is not applied.
    pub fn matching_patterns(&self, path: &str, kind: PathKind) -> Vec<usize> {
        let mut matches = Vec::new();
        self.walk(path, kind, |nfa, states, final_kind| {
            nfa.accepting_patterns(states, final_kind, &mut matches)
        });
        matches.sort_unstable();
        matches.dedup();
        matches
    }

    /// Returns the id of the last added pattern whose glob matches the path.
    pub fn last_matching_pattern(&self, path: &str, kind: PathKind) -> Option<usize> {
        let mut highest = None;
        self.walk(path, kind, |nfa, states, final_kind| {
            highest = highest.max(nfa.highest_accepting_pattern(states, final_kind));
        });
        highest
    }

    // Step through the NFA one path component at a time, handing the states
    // reached after each component to `visit`. For every component but the
    // last the consumed prefix is a directory, so `visit` gets `None` rather
    // than the path's kind.
    fn walk<F>(&self, path: &str, kind: PathKind, mut visit: F)
    where
        F: FnMut(&Nfa, &[StateId], Option<PathKind>),
    {
        let (components, trailing_slash) = split_path(path);
        let kind = if trailing_slash {
            PathKind::Directory
        } else {
            kind
        };

        let mut states = self.nfa.initial_states();
        for (idx, segment) in components.iter().enumerate() {
            states = self.nfa.next_states(segment, &states);
            if states.is_empty() {
                break;
            }
            let final_kind = (idx + 1 == components.len()).then_some(kind);
            visit(&self.nfa, &states, final_kind);
        }
    }
}
