//! Trie nodes and the arena that owns them.

use std::ops::{Index, IndexMut};

use smallvec::SmallVec;

use crate::pattern::Head;

/// Literal children stored inline before spilling to the heap.
pub(crate) const INLINE_CHILDREN: usize = 4;

/// Index of a node in its [`Arena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(u32);

impl NodeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Label {
    /// A byte run. Only the root may hold an empty run.
    Literal(Box<[u8]>),
    /// Zero or more arbitrary bytes.
    Wildcard,
}

#[derive(Clone, Debug)]
pub(crate) struct Node<V> {
    pub(crate) label: Label,
    /// First byte of each literal child, sorted; parallel to `children`.
    keys: SmallVec<[u8; INLINE_CHILDREN]>,
    children: SmallVec<[NodeId; INLINE_CHILDREN]>,
    pub(crate) wildcard: Option<NodeId>,
    /// `Some` iff a stored pattern ends exactly here.
    pub(crate) value: Option<V>,
}

impl<V> Node<V> {
    pub(crate) fn literal(text: &[u8]) -> Self {
        Self::with_label(Label::Literal(text.into()))
    }

    pub(crate) fn wildcard() -> Self {
        Self::with_label(Label::Wildcard)
    }

    fn with_label(label: Label) -> Self {
        Self {
            label,
            keys: SmallVec::new(),
            children: SmallVec::new(),
            wildcard: None,
            value: None,
        }
    }

    /// The byte run of a literal node; empty for a wildcard.
    #[inline]
    pub(crate) fn text(&self) -> &[u8] {
        match &self.label {
            Label::Literal(text) => text,
            Label::Wildcard => &[],
        }
    }

    /// Key under which this node hangs off its parent: the first byte for a
    /// literal, `None` for a wildcard continuation.
    #[inline]
    pub(crate) fn first_byte(&self) -> Option<u8> {
        match &self.label {
            Label::Literal(text) => text.first().copied(),
            Label::Wildcard => None,
        }
    }

    #[inline]
    pub(crate) fn child(&self, first: u8) -> Option<NodeId> {
        self.keys
            .binary_search(&first)
            .ok()
            .map(|i| self.children[i])
    }

    /// Callers look the byte up first, so an existing key is only ever
    /// replaced, never duplicated.
    pub(crate) fn add_child(&mut self, first: u8, id: NodeId) {
        match self.keys.binary_search(&first) {
            Ok(i) => self.children[i] = id,
            Err(i) => {
                self.keys.insert(i, first);
                self.children.insert(i, id);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn children(&self) -> impl Iterator<Item = (u8, NodeId)> + '_ {
        self.keys.iter().copied().zip(self.children.iter().copied())
    }

    /// Heap bytes owned by this node beyond its inline size.
    fn heap_bytes(&self) -> usize {
        let label = match &self.label {
            Label::Literal(text) => text.len(),
            Label::Wildcard => 0,
        };
        let keys = if self.keys.spilled() {
            self.keys.capacity()
        } else {
            0
        };
        let children = if self.children.spilled() {
            self.children.capacity() * std::mem::size_of::<NodeId>()
        } else {
            0
        };
        label + keys + children
    }
}

impl<V> From<Head<'_>> for Node<V> {
    fn from(head: Head<'_>) -> Self {
        match head {
            Head::Literal(run) => Self::literal(run),
            Head::Wildcard => Self::wildcard(),
        }
    }
}

/// Owns every node of a trie. Nodes are only ever appended; a split keeps
/// the split node's id and appends the hoisted suffix.
#[derive(Clone, Debug)]
pub(crate) struct Arena<V> {
    nodes: Vec<Node<V>>,
}

impl<V> Arena<V> {
    pub(crate) fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Id the next [`Arena::push`] will return.
    #[inline]
    pub(crate) fn next_id(&self) -> NodeId {
        debug_assert!(self.nodes.len() < u32::MAX as usize);
        NodeId(self.nodes.len() as u32)
    }

    pub(crate) fn push(&mut self, node: Node<V>) -> NodeId {
        let id = self.next_id();
        self.nodes.push(node);
        id
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        self.nodes.shrink_to_fit();
        for node in &mut self.nodes {
            node.keys.shrink_to_fit();
            node.children.shrink_to_fit();
        }
    }

    pub(crate) fn memory_usage(&self) -> usize {
        self.nodes.capacity() * std::mem::size_of::<Node<V>>()
            + self.nodes.iter().map(Node::heap_bytes).sum::<usize>()
    }
}

impl<V> Index<NodeId> for Arena<V> {
    type Output = Node<V>;

    #[inline]
    fn index(&self, id: NodeId) -> &Node<V> {
        &self.nodes[id.index()]
    }
}

impl<V> IndexMut<NodeId> for Arena<V> {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut Node<V> {
        &mut self.nodes[id.index()]
    }
}
