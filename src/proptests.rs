use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeMap;

fn validate_tree<V>(t: &WildTrie<V>) {
    let Some(root) = t.root else {
        assert_eq!(t.len, 0, "empty trie must have no patterns");
        assert_eq!(t.nodes.len(), 0, "empty trie must have no nodes");
        return;
    };

    let mut seen = vec![false; t.nodes.len()];
    let mut stack = vec![root];
    let mut terminals = 0usize;

    while let Some(id) = stack.pop() {
        let index = id.index();
        assert!(!seen[index], "node {id:?} reachable twice");
        seen[index] = true;

        let node = &t.nodes[id];
        if node.value.is_some() {
            terminals += 1;
        }

        if id != root {
            if let Label::Literal(text) = &node.label {
                assert!(!text.is_empty(), "only the root may have an empty label");
            }
        }

        let mut prev: Option<u8> = None;
        let mut literal_children = 0usize;
        for (key, child) in node.children() {
            assert!(prev.map_or(true, |p| p < key), "child keys must be strictly sorted");
            prev = Some(key);
            assert_eq!(t.nodes[child].first_byte(), Some(key), "child keyed by wrong byte");
            literal_children += 1;
            stack.push(child);
        }

        if let Some(wildcard) = node.wildcard {
            assert_eq!(t.nodes[wildcard].label, Label::Wildcard, "wildcard slot holds a literal");
            if node.label == Label::Wildcard {
                panic!("consecutive wildcards must be collapsed");
            }
            stack.push(wildcard);
        }

        let successors = literal_children + usize::from(node.wildcard.is_some());
        assert!(
            successors > 0 || node.value.is_some(),
            "leaf {id:?} must be terminal"
        );
        if matches!(node.label, Label::Literal(_)) && node.value.is_none() && node.wildcard.is_none() {
            assert!(literal_children >= 2, "mergeable literal node {id:?}");
        }
    }

    assert!(seen.iter().all(|&s| s), "unreachable nodes in arena");
    assert_eq!(terminals, t.len, "terminal count must match WildTrie::len");
}

/// Pattern alphabet: a few literals plus both metacharacters.
#[derive(Clone, Copy, Debug, Arbitrary)]
enum PatternByte {
    A,
    B,
    C,
    Star,
    Backslash,
}

impl PatternByte {
    fn byte(self) -> u8 {
        match self {
            PatternByte::A => b'a',
            PatternByte::B => b'b',
            PatternByte::C => b'c',
            PatternByte::Star => b'*',
            PatternByte::Backslash => b'\\',
        }
    }
}

fn pattern_strategy() -> impl Strategy<Value = Vec<u8>> + Clone {
    prop::collection::vec(any::<PatternByte>(), 0..=8)
        .prop_map(|bytes| bytes.into_iter().map(PatternByte::byte).collect())
}

fn candidate_strategy() -> impl Strategy<Value = Vec<u8>> + Clone {
    prop::collection::vec(prop::sample::select(b"abc*\\".to_vec()), 0..=10)
}

#[derive(Clone, Debug)]
enum Op {
    Insert(Vec<u8>),
    Lookup(Vec<u8>),
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        40 => pattern_strategy().prop_map(Op::Insert),
        60 => candidate_strategy().prop_map(Op::Lookup),
    ];
    prop::collection::vec(op, 0..=300)
}

/// Recursive form of the lookup order: literal child before wildcard,
/// shortest wildcard capture first, no memoization.
fn recursive_lookup<'a, V>(t: &'a WildTrie<V>, candidate: &[u8]) -> Option<&'a V> {
    recursive_enter(t, t.root?, candidate)
}

fn recursive_enter<'a, V>(t: &'a WildTrie<V>, id: NodeId, rest: &[u8]) -> Option<&'a V> {
    match &t.nodes[id].label {
        Label::Literal(text) => recursive_follow(t, id, rest.strip_prefix(&text[..])?),
        Label::Wildcard => {
            (0..=rest.len()).find_map(|capture| recursive_follow(t, id, &rest[capture..]))
        }
    }
}

fn recursive_follow<'a, V>(t: &'a WildTrie<V>, id: NodeId, rest: &[u8]) -> Option<&'a V> {
    let node = &t.nodes[id];
    let wildcard = || node.wildcard.and_then(|w| recursive_enter(t, w, rest));
    match rest.first() {
        None => node.value.as_ref().or_else(wildcard),
        Some(&next) => node
            .child(next)
            .and_then(|child| recursive_enter(t, child, rest))
            .or_else(wildcard),
    }
}

/// Checks a lookup against every stored pattern and against the recursive
/// search order: something must be found exactly when some pattern matches,
/// what is found must belong to a matching pattern, and it must be the
/// pattern the recursive order picks.
fn check_lookup(t: &WildTrie<u64>, model: &BTreeMap<Pattern, u64>, candidate: &[u8]) {
    let got = t.lookup(candidate).copied();
    let shown = String::from_utf8_lossy(candidate);
    let any_match = model.keys().any(|p| p.matches(candidate));
    assert_eq!(got.is_some(), any_match, "candidate {shown:?}");
    if let Some(v) = got {
        assert!(
            model.iter().any(|(p, &pv)| pv == v && p.matches(candidate)),
            "value {v} does not belong to a matching pattern"
        );
    }
    assert_eq!(
        got,
        recursive_lookup(t, candidate).copied(),
        "precedence differs for candidate {shown:?}"
    );
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in ops_strategy()) {
        let mut t: WildTrie<u64> = WildTrie::new();
        let mut m: BTreeMap<Pattern, u64> = BTreeMap::new();

        for (i, op) in ops.into_iter().enumerate() {
            let v = i as u64;
            match op {
                Op::Insert(raw) => {
                    let pattern = Pattern::parse(&raw);
                    let old_t = t.insert(&raw, v);
                    let old_m = if pattern.is_empty() { None } else { m.insert(pattern, v) };
                    prop_assert_eq!(old_t, old_m);
                }
                Op::Lookup(candidate) => check_lookup(&t, &m, &candidate),
            }
            prop_assert_eq!(t.len(), m.len());
        }

        validate_tree(&t);
    }

    #[test]
    fn prop_single_pattern_agrees(raw in pattern_strategy(), candidate in candidate_strategy()) {
        let pattern = Pattern::parse(&raw);
        let expected = !pattern.is_empty() && pattern.matches(&candidate);
        prop_assert_eq!(is_match(&raw, &candidate), expected);
    }

    #[test]
    fn prop_stored_literal_is_found(raw in pattern_strategy()) {
        // A pattern always matches its own literal spelling with every
        // wildcard capturing nothing.
        let pattern = Pattern::parse(&raw);
        prop_assume!(!pattern.is_empty());
        let spelled: Vec<u8> = pattern
            .segments()
            .iter()
            .flat_map(|s| match s {
                Segment::Literal(run) => run.clone(),
                Segment::Wildcard => Vec::new(),
            })
            .collect();
        let mut t: WildTrie<u64> = WildTrie::new();
        t.insert(&raw, 1);
        prop_assert_eq!(t.lookup(&spelled), Some(&1));
    }
}

/// Calls `f` with every ordering of `items` (Heap's algorithm).
fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    let mut order = items.to_vec();
    let mut counters = vec![0usize; order.len()];
    f(order.clone());

    let mut k = 1;
    while k < order.len() {
        if counters[k] < k {
            let swap_with = if k % 2 == 0 { 0 } else { counters[k] };
            order.swap(swap_with, k);
            f(order.clone());
            counters[k] += 1;
            k = 1;
        } else {
            counters[k] = 0;
            k += 1;
        }
    }
}

#[test]
fn permutations_are_complete() {
    let mut seen = std::collections::BTreeSet::new();
    for_each_permutation(&[1, 2, 3, 4], |perm| {
        assert!(seen.insert(perm), "permutation repeated");
    });
    assert_eq!(seen.len(), 24);
}

#[test]
fn exhaustive_insert_order_small_set() {
    let patterns: Vec<(&str, u64)> = vec![
        ("a", 0),
        ("ab", 1),
        ("a*", 2),
        ("*b", 3),
        ("a*b*", 4),
        (r"a\*", 5),
    ];
    let candidates = [
        "", "a", "b", "ab", "ba", "abb", "a*", "a*b", "aab", "bab", "abab", "*", "**",
    ];

    let mut expected: Option<(usize, Vec<Option<u64>>)> = None;
    for_each_permutation(&patterns, |perm| {
        let mut t: WildTrie<u64> = WildTrie::new();
        for (pattern, v) in perm {
            assert_eq!(t.insert(pattern, v), None);
        }
        validate_tree(&t);

        let got: Vec<Option<u64>> = candidates.iter().map(|c| t.lookup(c).copied()).collect();
        match &expected {
            None => expected = Some((t.node_count(), got)),
            Some((nodes, results)) => {
                assert_eq!(t.node_count(), *nodes, "structure depends on insertion order");
                assert_eq!(&got, results, "lookup depends on insertion order");
            }
        }
    });

    let (_, results) = expected.unwrap();
    assert_eq!(
        results,
        vec![
            None,
            Some(0),
            Some(3),
            Some(1),
            None,
            Some(4),
            Some(5),
            Some(4),
            Some(4),
            Some(3),
            Some(4),
            None,
            None,
        ]
    );
}

#[test]
fn randomized_against_reference() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const ALPHABET: &[u8] = b"abc/.*\\";

    let mut rng = StdRng::seed_from_u64(1);
    let mut t: WildTrie<u64> = WildTrie::new();
    let mut m: BTreeMap<Pattern, u64> = BTreeMap::new();

    for i in 0..2000u64 {
        let len = rng.gen_range(0..12);
        let raw: Vec<u8> = (0..len)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())])
            .collect();

        if rng.gen_bool(0.3) {
            let pattern = Pattern::parse(&raw);
            let expected = if pattern.is_empty() { None } else { m.insert(pattern, i) };
            assert_eq!(t.insert(&raw, i), expected);
        } else {
            check_lookup(&t, &m, &raw);
        }
    }

    assert_eq!(t.len(), m.len());
    validate_tree(&t);
}

#[test]
fn wildcard_revisits_follow_recursive_order() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const ALPHABET: &[u8] = b"ab*\\";

    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..1000 {
        let mut t: WildTrie<u64> = WildTrie::new();
        let mut m: BTreeMap<Pattern, u64> = BTreeMap::new();
        for v in 0..rng.gen_range(1..10u64) {
            let len = rng.gen_range(0..8);
            let raw: Vec<u8> = (0..len)
                .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())])
                .collect();
            let pattern = Pattern::parse(&raw);
            if !pattern.is_empty() {
                m.insert(pattern, v);
            }
            t.insert(&raw, v);
        }
        for _ in 0..50 {
            let len = rng.gen_range(0..12);
            let candidate: Vec<u8> = (0..len).map(|_| b"ab*"[rng.gen_range(0..3)]).collect();
            check_lookup(&t, &m, &candidate);
        }
    }
}

#[test]
fn long_candidate_against_wildcard_chain() {
    let mut t: WildTrie<u64> = WildTrie::new();
    t.insert("*y*y*y*y*y*z", 1);
    t.insert("*y*y*", 2);
    let mut candidate = "y".repeat(100_000);
    assert_eq!(t.lookup(&candidate), Some(&2));
    candidate.push('z');
    assert_eq!(t.lookup(&candidate), Some(&1));
    assert_eq!(t.lookup("x".repeat(100_000)), None);
}
