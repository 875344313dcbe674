use crate::{
    path_tree::{NodeId, PathTree},
    pattern::PathKind,
};

use super::{nfa::StateId, Matcher};

impl Matcher {
    /// Match many paths against the patterns in the set. Returns, for each
    /// path in `paths`, the id of the last added pattern whose glob matches
    /// it. The result is the same as calling
    /// [`Matcher::last_matching_pattern`] on each path, but directory prefixes
    /// shared between paths are only stepped through once.
    pub fn last_matching_patterns<P: AsRef<str>>(
        &self,
        paths: &[P],
        kind: PathKind,
    ) -> Vec<Option<usize>> {
        let mut tree = PathTree::new();
        for (index, path) in paths.iter().enumerate() {
            tree.insert(index, path.as_ref(), kind);
        }

        let mut matches = vec![None; paths.len()];

        // Each queue item carries the NFA states for the node's path and the
        // highest pattern matched by any strict ancestor directory, which
        // covers everything beneath it.
        let mut queue: Vec<(Vec<StateId>, NodeId, Option<usize>)> = Vec::new();
        let root = tree.node(PathTree::root_id());
        let initial_states = self.nfa.initial_states();
        for (segment, &child_id) in &root.children {
            queue.push((
                self.nfa.next_states(segment, &initial_states),
                child_id,
                None,
            ));
        }

        while let Some((states, node_id, inherited)) = queue.pop() {
            let node = tree.node(node_id);
            for entry in &node.entries {
                let own = self
                    .nfa
                    .highest_accepting_pattern(&states, Some(entry.kind));
                matches[entry.index] = inherited.max(own);
            }

            if node.children.is_empty() {
                continue;
            }

            // Stepping past this node makes it an ancestor directory
            let inherited = inherited.max(self.nfa.highest_accepting_pattern(&states, None));
            for (segment, &child_id) in &node.children {
                let next_states = if states.is_empty() {
                    Vec::new()
                } else {
                    self.nfa.next_states(segment, &states)
                };
                // Nothing more can match below here; only the inherited
                // match remains
                if next_states.is_empty() && inherited.is_none() {
                    continue;
                }
                queue.push((next_states, child_id, inherited));
            }
        }
        matches
    }
}
