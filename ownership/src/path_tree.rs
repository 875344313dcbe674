use std::collections::HashMap;

use crate::pattern::{split_path, PathKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct NodeId(pub(crate) usize);

/// A path queued for matching: its position in the caller's input and its
/// kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Entry {
    pub(crate) index: usize,
    pub(crate) kind: PathKind,
}

pub(crate) struct Node {
    pub(crate) children: HashMap<String, NodeId>,
    pub(crate) entries: Vec<Entry>,
}

impl Node {
    fn new() -> Self {
        Self {
            children: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

/// A trie of path components. Paths sharing a directory prefix share nodes,
/// so a batch of paths can be matched by walking each prefix only once.
pub(crate) struct PathTree {
    nodes: Vec<Node>,
}

impl PathTree {
    pub(crate) fn new() -> Self {
        Self {
            nodes: vec![Node::new()],
        }
    }

    pub(crate) fn root_id() -> NodeId {
        NodeId(0)
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Insert a path, recording `index` against the node for its final
    /// component. A trailing slash marks the path as a directory.
    pub(crate) fn insert(&mut self, index: usize, path: &str, kind: PathKind) {
        let (components, trailing_slash) = split_path(path);
        let kind = if trailing_slash {
            PathKind::Directory
        } else {
            kind
        };

        let mut current_node = Self::root_id();
        for segment in components {
            let child = self.nodes[current_node.0].children.get(segment);
            if let Some(&node_id) = child {
                current_node = node_id;
            } else {
                let node_id = NodeId(self.nodes.len());
                self.nodes.push(Node::new());
                self.nodes[current_node.0]
                    .children
                    .insert(segment.to_owned(), node_id);
                current_node = node_id;
            }
        }
        self.nodes[current_node.0]
            .entries
            .push(Entry { index, kind });
    }
}

impl Default for PathTree {
    fn default() -> Self {
        Self::new()
    }
}
