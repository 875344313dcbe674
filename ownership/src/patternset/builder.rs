use crate::{
    glob::SegmentGlob,
    pattern::{Pattern, Segment},
};

use super::{
    nfa::{Nfa, StateId, Terminal, Transition},
    Matcher,
};

/// Builder for a patternset [`Matcher`]. Calling [`Builder::build`] will
/// consume the builder.
#[derive(Clone)]
pub struct Builder {
    nfa: Nfa,
    next_pattern_id: usize,
}

impl Builder {
    /// Create a new `Builder`.
    pub fn new() -> Self {
        Self {
            nfa: Nfa::new(),
            next_pattern_id: 0,
        }
    }

    /// Build the `Matcher` from the patterns added to the builder. This will
    /// consume the builder.
    pub fn build(self) -> Matcher {
        Matcher::new(self.nfa)
    }

    /// Add a pattern to the builder, returning its id. Ids are assigned in
    /// insertion order, starting at zero. Negation is ignored here: the
    /// matcher reports where the underlying glob matches.
    pub fn add(&mut self, pattern: &Pattern) -> usize {
        let pattern_id = self.next_pattern_id;
        self.next_pattern_id += 1;

        // Compiled patterns already encode anchoring: unanchored patterns start
        // with a double star, and a trailing double star has been rewritten to
        // a single star, so a pattern never ends on a double star state.
        let end_state_id =
            pattern
                .segments()
                .iter()
                .fold(Nfa::START_STATE, |from_id, segment| match segment {
                    Segment::AnyDepth => self.add_epsilon_transition(from_id),
                    Segment::Glob(glob) => self.add_transition(from_id, glob),
                });

        // Mark the final state as the terminal state for this pattern. Matching
        // extends to everything beneath a matched directory, which the matcher
        // handles as it walks the path.
        self.nfa.state_mut(end_state_id).mark_as_terminal(Terminal {
            pattern_id,
            directory_only: pattern.is_directory_only(),
        });

        pattern_id
    }

    // Add a regular (non-epsilon) transition from a given state via the
    // provided path segment.
    fn add_transition(&mut self, from_id: StateId, glob: &SegmentGlob) -> StateId {
        let existing_transition = self
            .nfa
            .transitions_from(from_id)
            .find(|t| t.path_segment() == glob.as_str() && t.target != from_id);
        if let Some(t) = existing_transition {
            t.target
        } else {
            let state_id = self.nfa.add_state();
            self.nfa
                .state_mut(from_id)
                .add_transition(Transition::new(glob.clone(), state_id));
            state_id
        }
    }

    // Add an epsilon transition from a given state to a new state. If an epsilon transition
    // already exists, return the id of that transition.
    fn add_epsilon_transition(&mut self, from_id: StateId) -> StateId {
        // Double star segments match zero or more of anything, so there's never a need to
        // have multiple consecutive double star states. Multiple consecutive double star
        // states mean we require multiple path segments, which violates the gitignore spec
        let has_existing_transition = self
            .nfa
            .transitions_from(from_id)
            .any(|t| t.path_segment() == "*" && t.target == from_id);
        if has_existing_transition {
            return from_id;
        }

        match self.nfa.state(from_id).epsilon_transition {
            // If there's already an epsilon transition, don't create a new one
            // as multiple epsilon transitions coalesce into one
            Some(to_id) => to_id,
            // Otherwise, add a new state and an epsilon transition to it
            None => {
                let state_id = self.nfa.add_state();
                self.nfa
                    .state_mut(state_id)
                    .add_transition(Transition::new(SegmentGlob::any(), state_id));
                self.nfa.state_mut(from_id).epsilon_transition = Some(state_id);
                state_id
            }
        }
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}
