//! # wildtrie
//!
//! A compressed prefix tree (radix tree) of patterns containing `*` wildcards.
//!
//! Each stored pattern carries a value. [`WildTrie::lookup`] takes a concrete
//! byte string and returns the value of the most specific stored pattern it
//! matches: at every branch a literal continuation is tried before a wildcard
//! one, and every wildcard tries the shortest capture first.
//!
//! ## Example
//!
//! ```rust
//! use wildtrie::WildTrie;
//!
//! let mut trie: WildTrie<u32> = WildTrie::new();
//! trie.insert("*.google.com", 1);
//! trie.insert(r"http://example.com/\*", 2);
//! trie.insert("http://example.com/*", 3);
//!
//! assert_eq!(trie.lookup("www.google.com"), Some(&1));
//! assert_eq!(trie.lookup("http://example.com/*"), Some(&2));
//! assert_eq!(trie.lookup("http://example.com/index.html"), Some(&3));
//! assert_eq!(trie.lookup("google.com"), None);
//! ```
//!
//! ## Patterns
//!
//! - `*` matches any run of zero or more bytes
//! - `\` makes the next byte literal, so `\*` is a literal star and `\\` a
//!   literal backslash
//! - a trailing lone `\` is dropped
//!
//! Matching is byte-wise. A wildcard may capture part of a multi-byte UTF-8
//! sequence; that never produces a wrong answer because both sides share the
//! same encoding.
//!
//! The structure is not internally synchronized. Lookups take `&self` and
//! may run concurrently once insertion is finished.

#![deny(unsafe_code)]

use std::fmt;

use log::trace;
use smallvec::SmallVec;

mod matcher;
mod node;
mod pattern;

pub use matcher::{is_match, Matcher};
pub use pattern::{Pattern, Segment};

use node::{Arena, Label, Node, NodeId};
use pattern::{Cursor, Head};

// =============================================================================
// Configuration
// =============================================================================

/// Lookup frames kept on the stack before the search spills to the heap.
const LOOKUP_STACK_INLINE: usize = 32;

/// One pending step of the lookup search.
#[derive(Clone, Copy, Debug)]
enum Frame {
    /// Match the node's own label starting at the offset.
    Enter(NodeId, usize),
    /// The node's label matched up to the offset; try what hangs below it.
    Follow(NodeId, usize),
    /// A wildcard node captured everything up to the offset. Longer captures
    /// are queued behind this one.
    Capture(NodeId, usize),
}

/// A radix tree mapping wildcard patterns to values.
pub struct WildTrie<V> {
    nodes: Arena<V>,
    root: Option<NodeId>,
    /// Number of stored patterns (terminal nodes).
    len: usize,
}

impl<V> WildTrie<V> {
    pub fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
            len: 0,
        }
    }

    /// Creates an empty trie with room for `nodes` nodes before reallocating.
    pub fn with_capacity(nodes: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(nodes),
            root: None,
            len: 0,
        }
    }

    /// Number of distinct stored patterns.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Approximate bytes owned by the trie, including unused capacity.
    pub fn memory_usage(&self) -> usize {
        self.nodes.memory_usage()
    }

    pub fn shrink_to_fit(&mut self) {
        self.nodes.shrink_to_fit();
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.len = 0;
    }

    /// Stores `value` under `pattern`, returning the value previously stored
    /// under the same pattern.
    ///
    /// Patterns are compared after parsing, so `b\ar` and `bar` are the same
    /// pattern. A pattern that parses to nothing (`""` or a lone `\`) is
    /// ignored and `None` is returned.
    pub fn insert(&mut self, pattern: impl AsRef<[u8]>, value: V) -> Option<V> {
        self.insert_pattern(&Pattern::parse(pattern), value)
    }

    /// Like [`WildTrie::insert`] for an already parsed pattern.
    pub fn insert_pattern(&mut self, pattern: &Pattern, value: V) -> Option<V> {
        if pattern.is_empty() {
            trace!("ignoring empty pattern");
            return None;
        }

        let mut rest = Cursor::new(pattern);
        let Some(mut id) = self.root else {
            self.root = Some(self.new_branch(rest, value));
            return None;
        };

        loop {
            let split_at = match &self.nodes[id].label {
                Label::Wildcard if rest.at_wildcard() => {
                    rest.skip_wildcard();
                    None
                }
                // Only the root can be reached this way.
                Label::Wildcard => Some(0),
                Label::Literal(text) => {
                    let common = rest.common_prefix_len(text);
                    if common == text.len() {
                        rest.advance(common);
                        None
                    } else {
                        Some(common)
                    }
                }
            };
            if let Some(at) = split_at {
                self.split(id, at);
                // The node now holds exactly the common prefix; the next pass
                // consumes it.
                continue;
            }

            match rest.head() {
                None => return self.set_value(id, value),
                Some(Head::Wildcard) => match self.nodes[id].wildcard {
                    Some(wildcard) => id = wildcard,
                    None => {
                        let branch = self.new_branch(rest, value);
                        self.nodes[id].wildcard = Some(branch);
                        return None;
                    }
                },
                Some(Head::Literal(run)) => {
                    let first = run[0];
                    match self.nodes[id].child(first) {
                        Some(child) => id = child,
                        None => {
                            let branch = self.new_branch(rest, value);
                            self.nodes[id].add_child(first, branch);
                            return None;
                        }
                    }
                }
            }
        }
    }

    /// Returns the value of the most specific stored pattern matching
    /// `candidate`.
    ///
    /// The search is exhaustive: if any stored pattern matches, a value is
    /// returned. When several match, the one reached through literal
    /// continuations first and the shortest wildcard captures wins.
    pub fn lookup(&self, candidate: impl AsRef<[u8]>) -> Option<&V> {
        let candidate = candidate.as_ref();
        let root = self.root?;

        let mut stack: SmallVec<[Frame; LOOKUP_STACK_INLINE]> = SmallVec::new();
        // Smallest offset each wildcard node has been entered from, indexed
        // by node id. Reaching it again from that offset or later can only
        // fail again.
        let mut entered: SmallVec<[usize; LOOKUP_STACK_INLINE]> = SmallVec::new();
        stack.push(Frame::Enter(root, 0));

        while let Some(frame) = stack.pop() {
            let (id, at) = match frame {
                Frame::Enter(id, at) => {
                    match &self.nodes[id].label {
                        Label::Literal(text) => {
                            if candidate[at..].starts_with(text) {
                                stack.push(Frame::Follow(id, at + text.len()));
                            }
                        }
                        Label::Wildcard => {
                            if entered.len() <= id.index() {
                                entered.resize(id.index() + 1, usize::MAX);
                            }
                            let first = &mut entered[id.index()];
                            if at < *first {
                                *first = at;
                                stack.push(Frame::Capture(id, at));
                            }
                        }
                    }
                    continue;
                }
                Frame::Capture(id, end) => {
                    if end < candidate.len() {
                        stack.push(Frame::Capture(id, end + 1));
                    }
                    (id, end)
                }
                Frame::Follow(id, at) => (id, at),
            };

            let node = &self.nodes[id];
            let Some(&next) = candidate.get(at) else {
                if let Some(value) = &node.value {
                    return Some(value);
                }
                // A trailing wildcard may capture nothing.
                if let Some(wildcard) = node.wildcard {
                    stack.push(Frame::Enter(wildcard, at));
                }
                continue;
            };
            // Pushed first so the literal child is tried first.
            if let Some(wildcard) = node.wildcard {
                stack.push(Frame::Enter(wildcard, at));
            }
            if let Some(child) = node.child(next) {
                stack.push(Frame::Enter(child, at));
            }
        }

        None
    }

    /// Whether any stored pattern matches `candidate`.
    pub fn contains(&self, candidate: impl AsRef<[u8]>) -> bool {
        self.lookup(candidate).is_some()
    }

    fn set_value(&mut self, id: NodeId, value: V) -> Option<V> {
        let old = self.nodes[id].value.replace(value);
        if old.is_none() {
            self.len += 1;
        }
        old
    }

    /// Builds a fresh chain for the rest of a pattern and returns its head.
    /// The last node of the chain becomes terminal with `value`.
    fn new_branch(&mut self, rest: Cursor<'_>, value: V) -> NodeId {
        debug_assert!(!rest.is_empty());
        let head = self.nodes.next_id();
        let mut prev: Option<NodeId> = None;
        for piece in rest.heads() {
            let id = self.nodes.push(Node::from(piece));
            if let Some(prev) = prev {
                self.link(prev, id);
            }
            prev = Some(id);
        }
        if let Some(last) = prev {
            self.nodes[last].value = Some(value);
            self.len += 1;
        }
        trace!(
            "new branch {:?}..={:?}, {} node(s) total",
            head,
            prev,
            self.nodes.len()
        );
        head
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        match self.nodes[child].first_byte() {
            Some(first) => self.nodes[parent].add_child(first, child),
            None => self.nodes[parent].wildcard = Some(child),
        }
    }

    /// Shrinks node `id` to the first `at` bytes of its label. Everything the
    /// node held (the label's tail, children, wildcard continuation and value)
    /// moves into a new node that becomes its only successor.
    fn split(&mut self, id: NodeId, at: usize) {
        let node = &mut self.nodes[id];
        let prefix = &node.text()[..at];
        let suffix = match &node.label {
            Label::Literal(text) => Label::Literal(text[at..].into()),
            Label::Wildcard => Label::Wildcard,
        };
        let shrunk = Node::literal(prefix);
        let mut hoisted = std::mem::replace(node, shrunk);
        hoisted.label = suffix;

        let hoisted = self.nodes.push(hoisted);
        self.link(id, hoisted);
        trace!("split {:?} at {} into {:?}", id, at, hoisted);
    }
}

impl<V> Default for WildTrie<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Clone for WildTrie<V> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            root: self.root,
            len: self.len,
        }
    }
}

impl<V> fmt::Debug for WildTrie<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WildTrie")
            .field("len", &self.len)
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

impl<P: AsRef<[u8]>, V> Extend<(P, V)> for WildTrie<V> {
    fn extend<I: IntoIterator<Item = (P, V)>>(&mut self, iter: I) {
        for (pattern, value) in iter {
            self.insert(pattern, value);
        }
    }
}

impl<P: AsRef<[u8]>, V> FromIterator<(P, V)> for WildTrie<V> {
    fn from_iter<I: IntoIterator<Item = (P, V)>>(iter: I) -> Self {
        let mut trie = Self::new();
        trie.extend(iter);
        trie
    }
}


#[cfg(test)]
mod proptests;
