use crate::{glob::SegmentGlob, pattern::PathKind};

/// A nondeterministic automaton over path components. Each transition
/// consumes one component, so states form a trie of component globs. Double
/// star segments are states with a self loop, reached via an epsilon
/// transition. Patterns that share leading segments share states.
#[derive(Debug, Clone)]
pub(crate) struct Nfa {
    states: Vec<State>,
}

impl Nfa {
    pub(crate) const START_STATE: StateId = StateId(0);

    pub(crate) fn new() -> Self {
        Self {
            states: vec![State::new()],
        }
    }

    pub(crate) fn add_state(&mut self) -> StateId {
        let id = self.states.len();

        let state = State::new();
        self.states.push(state);

        StateId(id as u32)
    }

    pub(crate) fn len(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub(crate) fn state(&self, id: StateId) -> &State {
        &self.states[usize::from(id)]
    }

    #[inline]
    pub(crate) fn state_mut(&mut self, id: StateId) -> &mut State {
        &mut self.states[usize::from(id)]
    }

    #[cfg(test)]
    pub(crate) fn states_iter(&self) -> impl Iterator<Item = &State> {
        self.states.iter()
    }

    pub(crate) fn initial_states(&self) -> Vec<StateId> {
        let mut states = vec![Self::START_STATE];
        if let Some(epsilon_node_id) = self.state(Self::START_STATE).epsilon_transition {
            states.push(epsilon_node_id);
        }
        states
    }

    pub(crate) fn transitions_from(&self, state_id: StateId) -> impl Iterator<Item = &Transition> {
        self.state(state_id).transitions.iter()
    }

    pub(crate) fn epsilon_transitions_from(&self, state_id: StateId) -> Option<StateId> {
        self.state(state_id).epsilon_transition
    }

    // Given the set of states we're in, return the set of states we're in
    // after consuming one path segment, following any epsilon edges.
    pub(crate) fn next_states(&self, segment: &str, from_states: &[StateId]) -> Vec<StateId> {
        let mut next_states = Vec::new();
        for &state_id in from_states {
            self.transitions_from(state_id)
                .filter(|transition| transition.is_match(segment))
                .for_each(|transition| next_states.push(transition.target));
        }

        // Automatically traverse epsilon edges. Epsilon targets are double
        // star states, which never have epsilon edges of their own.
        let epsilon_nodes = next_states
            .iter()
            .flat_map(|&state_id| self.epsilon_transitions_from(state_id))
            .collect::<Vec<_>>();
        next_states.extend(epsilon_nodes);

        // Several patterns' double stars can lead back into the same states
        next_states.sort_unstable();
        next_states.dedup();
        next_states
    }

    /// Append the ids of patterns accepting in any of `states`. When the states
    /// were reached by consuming the final path component, `final_kind` is the
    /// kind of that path and directory-only patterns are filtered by it.
    /// Otherwise the consumed components form an ancestor directory and
    /// every accepting pattern counts.
    pub(crate) fn accepting_patterns(
        &self,
        states: &[StateId],
        final_kind: Option<PathKind>,
        matches: &mut Vec<usize>,
    ) {
        for &state_id in states {
            for terminal in &self.state(state_id).terminals {
                if terminal.accepts(final_kind) {
                    matches.push(terminal.pattern_id);
                }
            }
        }
    }

    /// Like [`Nfa::accepting_patterns`], but only returns the highest
    /// pattern id.
    pub(crate) fn highest_accepting_pattern(
        &self,
        states: &[StateId],
        final_kind: Option<PathKind>,
    ) -> Option<usize> {
        states
            .iter()
            .flat_map(|&state_id| self.state(state_id).terminals.iter())
            .filter(|terminal| terminal.accepts(final_kind))
            .map(|terminal| terminal.pattern_id)
            .max()
    }
}

impl Default for Nfa {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct StateId(pub(crate) u32);

impl From<StateId> for usize {
    fn from(id: StateId) -> usize {
        id.0 as usize
    }
}

#[derive(Debug, Clone)]
pub(crate) struct State {
    pub(crate) terminals: Vec<Terminal>,
    pub(crate) transitions: Vec<Transition>,
    pub(crate) epsilon_transition: Option<StateId>,
}

impl State {
    fn new() -> Self {
        Self {
            terminals: Vec::new(),
            transitions: Vec::new(),
            epsilon_transition: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_terminal(&self) -> bool {
        !self.terminals.is_empty()
    }

    pub(crate) fn add_transition(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }

    pub(crate) fn mark_as_terminal(&mut self, terminal: Terminal) {
        self.terminals.push(terminal);
    }
}

/// Marks a state as accepting for a pattern.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Terminal {
    pub(crate) pattern_id: usize,
    pub(crate) directory_only: bool,
}

impl Terminal {
    fn accepts(&self, final_kind: Option<PathKind>) -> bool {
        match final_kind {
            Some(PathKind::File) => !self.directory_only,
            Some(PathKind::Directory) | None => true,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Transition {
    pub(crate) glob: SegmentGlob,
    pub(crate) target: StateId,
}

impl Transition {
    pub(crate) fn new(glob: SegmentGlob, target: StateId) -> Transition {
        Self { glob, target }
    }

    pub(crate) fn path_segment(&self) -> &str {
        self.glob.as_str()
    }

    pub(crate) fn is_match(&self, candidate: &str) -> bool {
        self.glob.is_match(candidate)
    }
}
