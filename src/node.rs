//! The record tree: nodes and per-record arenas.
//!
//! A record is a tree of nodes, each holding an interned tag, an optional
//! value, and (for the root only) an optional cross-reference key. Nodes link
//! to their parent, first child and next sibling; sibling order is
//! semantically significant.
//!
//! Nodes live in a per-record arena ([`Record`]) and are addressed by
//! [`NodeId`]. Cross-record relations are textual keys resolved through the
//! database index, never direct node references, so a record owns its whole
//! subtree and nothing else.

use crate::record::{RecordKind, Sex};
use crate::tag::{intern, Tag};

/// Identifies a node within its owning [`Record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A single node of a record tree.
#[derive(Debug, Clone)]
pub struct GNode {
    /// Cross-reference key; only level-0 nodes carry one.
    key: Option<String>,
    /// The tag, borrowed from the process-wide interned pool.
    tag: Tag,
    /// The optional line value, verbatim from the source.
    value: Option<String>,
    parent: Option<NodeId>,
    child: Option<NodeId>,
    sibling: Option<NodeId>,
}

impl GNode {
    fn new(key: Option<&str>, tag: &str, value: Option<&str>) -> Self {
        GNode {
            key: key.map(str::to_string),
            tag: intern(tag),
            value: value.map(str::to_string),
            parent: None,
            child: None,
            sibling: None,
        }
    }
}

/// A record: a root node and its subtree, held in one arena.
///
/// The root is always the first allocated node. The line number of the root
/// in its source file is retained for diagnostics.
#[derive(Debug, Clone)]
pub struct Record {
    nodes: Vec<GNode>,
    line: usize,
}

impl Record {
    /// Creates a record consisting of a single root node.
    #[must_use]
    pub fn new(key: Option<&str>, tag: &str, value: Option<&str>) -> Self {
        Record {
            nodes: vec![GNode::new(key, tag, value)],
            line: 0,
        }
    }

    /// Sets the source line of the record's root.
    pub fn set_line(&mut self, line: usize) {
        self.line = line;
    }

    /// Returns the source line of the record's root; 0 if unknown.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Returns the id of the root node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Returns the record's cross-reference key, if any.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.nodes[0].key.as_deref()
    }

    /// Replaces the record's cross-reference key.
    pub fn set_key(&mut self, key: Option<String>) {
        self.nodes[0].key = key;
    }

    /// Classifies the record by its root tag.
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        RecordKind::from_tag(&self.nodes[0].tag)
    }

    /// Allocates a detached node in this record's arena.
    pub fn alloc(&mut self, key: Option<&str>, tag: &str, value: Option<&str>) -> NodeId {
        self.nodes.push(GNode::new(key, tag, value));
        NodeId(self.nodes.len() - 1)
    }

    /// Returns the tag of a node.
    #[must_use]
    pub fn tag(&self, id: NodeId) -> &str {
        &self.nodes[id.0].tag
    }

    /// Returns the value of a node, if any.
    #[must_use]
    pub fn value(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0].value.as_deref()
    }

    /// Replaces the value of a node.
    pub fn set_value(&mut self, id: NodeId, value: Option<String>) {
        self.nodes[id.0].value = value;
    }

    /// Returns the key carried by a node, if any.
    #[must_use]
    pub fn node_key(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0].key.as_deref()
    }

    /// Returns a node's parent.
    #[must_use]
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Returns a node's first child.
    #[must_use]
    pub fn child_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].child
    }

    /// Returns a node's next sibling.
    #[must_use]
    pub fn sibling_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].sibling
    }

    /// Reconstructs the level of a node by counting parent links.
    #[must_use]
    pub fn level(&self, id: NodeId) -> u32 {
        let mut level = 0;
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].parent {
            level += 1;
            current = parent;
        }
        level
    }

    /// Iterates the children of a node in sibling order.
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        ChildIter {
            record: self,
            next: self.nodes[id.0].child,
        }
    }

    /// Returns the first child of `id` bearing `tag`.
    #[must_use]
    pub fn find_child(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.children(id).find(|&child| self.tag(child) == tag)
    }

    /// Returns the child of `id` with the given tag and value.
    #[must_use]
    pub fn find_child_with_value(&self, id: NodeId, tag: &str, value: &str) -> Option<NodeId> {
        self.children(id)
            .find(|&child| self.tag(child) == tag && self.value(child) == Some(value))
    }

    /// Iterates the run of children bearing `tag`, starting at the first such
    /// child and stopping as soon as the run ends. On canonical records the
    /// run covers every child with the tag.
    pub fn tagged_run<'a>(&'a self, id: NodeId, tag: &'a str) -> TagRunIter<'a> {
        TagRunIter {
            record: self,
            next: self.find_child(id, tag),
            tag,
        }
    }

    /// Appends `child` at the end of `parent`'s child list.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[child.0].sibling = None;
        match self.nodes[parent.0].child {
            None => self.nodes[parent.0].child = Some(child),
            Some(first) => {
                let mut last = first;
                while let Some(next) = self.nodes[last.0].sibling {
                    last = next;
                }
                self.nodes[last.0].sibling = Some(child);
            }
        }
    }

    /// Unlinks a node (and its subtree) from the tree. The arena slot
    /// remains allocated but unreachable.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id.0].parent else {
            return;
        };
        let sibling = self.nodes[id.0].sibling;
        if self.nodes[parent.0].child == Some(id) {
            self.nodes[parent.0].child = sibling;
        } else {
            let mut prev = self.nodes[parent.0].child;
            while let Some(p) = prev {
                if self.nodes[p.0].sibling == Some(id) {
                    self.nodes[p.0].sibling = sibling;
                    break;
                }
                prev = self.nodes[p.0].sibling;
            }
        }
        self.nodes[id.0].parent = None;
        self.nodes[id.0].sibling = None;
    }

    /// Traverses the whole record tree in depth-first pre-order.
    pub fn traverse(&self) -> Traverse<'_> {
        self.traverse_from(self.root())
    }

    /// Traverses the subtree rooted at `start` in depth-first pre-order.
    /// Siblings of `start` are not visited.
    pub fn traverse_from(&self, start: NodeId) -> Traverse<'_> {
        Traverse {
            record: self,
            start,
            stack: vec![start],
        }
    }

    /// Counts the nodes reachable from the root, root included.
    #[must_use]
    pub fn count_nodes(&self) -> usize {
        self.traverse().count()
    }

    /// Counts the nodes in the subtree rooted at `id`, `id` included.
    #[must_use]
    pub fn subtree_size(&self, id: NodeId) -> usize {
        self.traverse_from(id).count()
    }

    /// Counts the nodes that occur strictly before `id` in depth-first
    /// pre-order. Since each node corresponds to one source line, the root
    /// line plus this count is the exact line of the node.
    #[must_use]
    pub fn count_nodes_before(&self, id: NodeId) -> usize {
        let mut count = 0;
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].parent {
            let mut child = self.nodes[parent.0].child;
            while let Some(c) = child {
                if c == current {
                    break;
                }
                count += self.subtree_size(c);
                child = self.nodes[c.0].sibling;
            }
            count += 1;
            current = parent;
        }
        count
    }

    /// Returns the sex recorded on a person's first SEX line; `Unknown` when
    /// there is none.
    #[must_use]
    pub fn sex(&self) -> Sex {
        match self.find_child(self.root(), "SEX") {
            Some(node) => match self.value(node) {
                Some(value) => Sex::parse(value),
                None => Sex::Unknown,
            },
            None => Sex::Unknown,
        }
    }
}

impl PartialEq for Record {
    /// Structural equality: two records are equal when their pre-order node
    /// sequences agree on level, key, tag and value.
    fn eq(&self, other: &Self) -> bool {
        let mut a = self.traverse();
        let mut b = other.traverse();
        loop {
            match (a.next(), b.next()) {
                (None, None) => return true,
                (Some(x), Some(y)) => {
                    if self.level(x) != other.level(y)
                        || self.node_key(x) != other.node_key(y)
                        || self.tag(x) != other.tag(y)
                        || self.value(x) != other.value(y)
                    {
                        return false;
                    }
                }
                _ => return false,
            }
        }
    }
}

impl Eq for Record {}

/// Iterator over the children of one node.
pub struct ChildIter<'a> {
    record: &'a Record,
    next: Option<NodeId>,
}

impl Iterator for ChildIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.record.sibling_of(id);
        Some(id)
    }
}

/// Iterator over a run of equally tagged children.
pub struct TagRunIter<'a> {
    record: &'a Record,
    next: Option<NodeId>,
    tag: &'a str,
}

impl Iterator for TagRunIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self
            .record
            .sibling_of(id)
            .filter(|&sib| self.record.tag(sib) == self.tag);
        Some(id)
    }
}

/// Depth-first pre-order traversal of a subtree.
pub struct Traverse<'a> {
    record: &'a Record,
    start: NodeId,
    stack: Vec<NodeId>,
}

impl Iterator for Traverse<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        if id != self.start {
            if let Some(sibling) = self.record.sibling_of(id) {
                self.stack.push(sibling);
            }
        }
        if let Some(child) = self.record.child_of(id) {
            self.stack.push(child);
        }
        Some(id)
    }
}
