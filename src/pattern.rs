//! Pattern segmentation.
//!
//! A raw pattern is a byte string where `*` matches any run of zero or more
//! bytes and `\` makes the following byte literal. Parsing splits it into
//! maximal literal runs and wildcard markers.

use std::mem::take;

/// One unit of a parsed pattern.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Segment {
    /// A non-empty run of literal bytes, escapes resolved.
    Literal(Vec<u8>),
    /// `*`: any run of zero or more bytes.
    Wildcard,
}

/// A parsed wildcard pattern.
///
/// ```rust
/// use wildtrie::{Pattern, Segment};
///
/// let p = Pattern::parse(r"foo\**");
/// assert_eq!(
///     p.segments(),
///     &[Segment::Literal(b"foo*".to_vec()), Segment::Wildcard]
/// );
/// assert!(p.matches("foo*bar"));
/// assert!(!p.matches("foobar"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Pattern {
    segments: Vec<Segment>,
}

impl Pattern {
    /// Parses a raw pattern. Never fails.
    ///
    /// Consecutive wildcards collapse into one. A trailing backslash with no
    /// byte after it is dropped, so `foo\` parses the same as `foo`.
    pub fn parse(raw: impl AsRef<[u8]>) -> Self {
        let mut segments = Vec::new();
        let mut literal = Vec::new();
        let mut escaped = false;

        for &b in raw.as_ref() {
            if escaped {
                literal.push(b);
                escaped = false;
                continue;
            }
            match b {
                b'\\' => escaped = true,
                b'*' => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(take(&mut literal)));
                    }
                    if !matches!(segments.last(), Some(Segment::Wildcard)) {
                        segments.push(Segment::Wildcard);
                    }
                }
                _ => literal.push(b),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self { segments }
    }

    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True when the pattern contributes nothing to store, e.g. `""` or `"\"`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn has_wildcard(&self) -> bool {
        self.segments.contains(&Segment::Wildcard)
    }

    /// Tests this single pattern against `candidate` by backtracking.
    ///
    /// Byte-wise: a wildcard may stop in the middle of a multi-byte UTF-8
    /// sequence.
    pub fn matches(&self, candidate: impl AsRef<[u8]>) -> bool {
        match_segments(&self.segments, candidate.as_ref())
    }
}

fn match_segments(segments: &[Segment], text: &[u8]) -> bool {
    match segments.split_first() {
        None => text.is_empty(),
        Some((Segment::Literal(run), rest)) => text
            .strip_prefix(run.as_slice())
            .is_some_and(|text| match_segments(rest, text)),
        Some((Segment::Wildcard, [])) => true,
        Some((Segment::Wildcard, rest)) => {
            (0..=text.len()).any(|capture| match_segments(rest, &text[capture..]))
        }
    }
}

/// What the cursor currently points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Head<'a> {
    /// Remaining bytes of the current literal run; never empty.
    Literal(&'a [u8]),
    Wildcard,
}

/// Read position inside a parsed pattern, used while walking the trie.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cursor<'a> {
    segments: &'a [Segment],
    /// Offset into `segments[0]` when it is a literal.
    offset: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(pattern: &'a Pattern) -> Self {
        Self {
            segments: &pattern.segments,
            offset: 0,
        }
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub(crate) fn head(&self) -> Option<Head<'a>> {
        match self.segments.first()? {
            Segment::Literal(run) => Some(Head::Literal(&run[self.offset..])),
            Segment::Wildcard => Some(Head::Wildcard),
        }
    }

    #[inline]
    pub(crate) fn at_wildcard(&self) -> bool {
        matches!(self.segments.first(), Some(Segment::Wildcard))
    }

    /// Common prefix length of the current literal run and `text`.
    /// Zero when the cursor sits on a wildcard or is exhausted.
    pub(crate) fn common_prefix_len(&self, text: &[u8]) -> usize {
        match self.head() {
            Some(Head::Literal(run)) => common_prefix_len(run, text),
            _ => 0,
        }
    }

    /// Consumes `n` bytes of the current literal run.
    pub(crate) fn advance(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        let Some(Segment::Literal(run)) = self.segments.first() else {
            debug_assert!(false, "advance past a wildcard");
            return;
        };
        self.offset += n;
        debug_assert!(self.offset <= run.len());
        if self.offset >= run.len() {
            self.segments = &self.segments[1..];
            self.offset = 0;
        }
    }

    pub(crate) fn skip_wildcard(&mut self) {
        debug_assert!(self.at_wildcard());
        self.segments = &self.segments[1..];
        self.offset = 0;
    }

    /// The remaining pattern, one literal run or wildcard at a time.
    pub(crate) fn heads(self) -> impl Iterator<Item = Head<'a>> {
        let offset = self.offset;
        self.segments
            .iter()
            .enumerate()
            .map(move |(i, segment)| match segment {
                Segment::Literal(run) if i == 0 => Head::Literal(&run[offset..]),
                Segment::Literal(run) => Head::Literal(run),
                Segment::Wildcard => Head::Wildcard,
            })
    }
}

#[inline]
pub(crate) fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}
