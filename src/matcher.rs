//! Yes/no matching against a set of patterns.

use log::debug;

use crate::WildTrie;

/// Several patterns compiled into one trie.
///
/// ```rust
/// use wildtrie::Matcher;
///
/// let m = Matcher::compile(["hello*world", "Hello,*world", "*foo*bar"]);
/// assert!(m.is_match("hello,world"));
/// assert!(!m.is_match("Helloworld"));
/// assert!(m.is_match("foobar"));
/// assert!(!m.is_match("foobar,"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Matcher {
    trie: WildTrie<()>,
}

impl Matcher {
    pub fn compile<I>(patterns: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let mut trie = WildTrie::new();
        for pattern in patterns {
            trie.insert(pattern, ());
        }
        debug!(
            "compiled {} pattern(s) into {} node(s)",
            trie.len(),
            trie.node_count()
        );
        Self { trie }
    }

    /// Whether `candidate` matches any of the compiled patterns.
    #[inline]
    pub fn is_match(&self, candidate: impl AsRef<[u8]>) -> bool {
        self.trie.contains(candidate)
    }

    /// Number of distinct patterns.
    pub fn len(&self) -> usize {
        self.trie.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trie.is_empty()
    }
}

impl<P: AsRef<[u8]>> FromIterator<P> for Matcher {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self::compile(iter)
    }
}

/// Tests `candidate` against a single pattern.
pub fn is_match(pattern: impl AsRef<[u8]>, candidate: impl AsRef<[u8]>) -> bool {
    Matcher::compile([pattern]).is_match(candidate)
}
