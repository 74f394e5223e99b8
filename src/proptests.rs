use super::*;

use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Payload `i` resolves to the i-th key pushed.
#[derive(Clone, Default)]
struct KeyTable(Vec<KeyBytes>);

impl LoadKey for KeyTable {
    fn load_key(&self, value: u64, key: &mut KeyBytes) {
        key.extend_from_slice(&self.0[value as usize]);
    }
}

fn validate_tree<L: LoadKey>(t: &ArtTree<L>) {
    let issues = t.verify_integrity();
    assert!(issues.is_empty(), "integrity issues: {issues:?}\n{}", t.dump());

    let stats = t.stats();
    assert_eq!(stats.leaf_count, t.len(), "reachable leaf count must match len()");
    if t.len() > 1 {
        assert!(stats.inner_count() > 0, "two or more keys need an inner node");
    }
}

/// Insert `raw` as a terminated string key, registering a fresh payload.
fn insert_str(t: &mut ArtTree<KeyTable>, raw: &[u8]) -> (KeyBytes, u64, Option<u64>) {
    let key = encode_str(raw).unwrap();
    let id = t.loader().0.len() as u64;
    t.loader_mut().0.push(key.clone());
    let old = t.insert(&key, id).unwrap();
    (key, id, old)
}

#[derive(Clone, Debug)]
enum Op {
    Insert(Vec<u8>),
    Remove(Vec<u8>),
    Get(Vec<u8>),
    Ceiling(Vec<u8>),
    Floor(Vec<u8>),
    Prefix(Vec<u8>),
}

fn key_strategy() -> impl Strategy<Value = Vec<u8>> + Clone {
    // A small alphabet forces shared prefixes; the long stem forces paths that
    // do not fit inline.
    let short = prop::collection::vec(prop::sample::select(vec![b'a', b'b', b'c', 0x01, 0xff]), 0..=12);
    let stemmed = (0..3usize, prop::collection::vec(b'a'..=b'e', 0..=6)).prop_map(|(stem, tail)| {
        let stems: [&[u8]; 3] = [
            b"http://example.org/resource/",
            b"http://example.org/",
            b"http://example.net/a/very/long/path/",
        ];
        let mut key = stems[stem].to_vec();
        key.extend(tail);
        key
    });
    let any_bytes = prop::collection::vec(1u8..=255, 0..=32);
    prop_oneof![4 => short, 4 => stemmed, 2 => any_bytes]
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let key = key_strategy();
    let op = prop_oneof![
        40 => key.clone().prop_map(Op::Insert),
        20 => key.clone().prop_map(Op::Remove),
        20 => key.clone().prop_map(Op::Get),
        7 => key.clone().prop_map(Op::Ceiling),
        7 => key.clone().prop_map(Op::Floor),
        6 => key.clone().prop_map(Op::Prefix),
    ];
    prop::collection::vec(op, 0..=1000)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_strings(ops in ops_strategy()) {
        let mut t = ArtTree::new(KeyTable::default());
        let mut m: BTreeMap<KeyBytes, u64> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(raw) => {
                    let (key, id, old_t) = insert_str(&mut t, &raw);
                    let old_m = m.insert(key, id);
                    prop_assert_eq!(old_t, old_m);
                }
                Op::Remove(raw) => {
                    let key = encode_str(&raw).unwrap();
                    prop_assert_eq!(t.erase(&key), m.remove(&key));
                }
                Op::Get(raw) => {
                    let key = encode_str(&raw).unwrap();
                    let expected = m.get(&key).copied();
                    prop_assert_eq!(t.lookup_with(&key, PrefixMatch::Optimistic), expected);
                    prop_assert_eq!(t.lookup_with(&key, PrefixMatch::Pessimistic), expected);
                }
                Op::Ceiling(raw) => {
                    let key = encode_str(&raw).unwrap();
                    let expected = m.range(key.clone()..).next().map(|(_, v)| *v);
                    prop_assert_eq!(t.ceiling(&key), expected);
                }
                Op::Floor(raw) => {
                    let key = encode_str(&raw).unwrap();
                    let expected = m.range(..=key.clone()).next_back().map(|(_, v)| *v);
                    prop_assert_eq!(t.floor(&key), expected);
                }
                Op::Prefix(raw) => {
                    // Raw bytes without the terminator select every extension.
                    let got: Option<Vec<u64>> = t.lookup_prefix(&raw).map(|sub| sub.iter().collect());
                    let expected: Vec<u64> = m
                        .iter()
                        .filter(|(k, _)| k.starts_with(&raw))
                        .map(|(_, v)| *v)
                        .collect();
                    prop_assert_eq!(got.unwrap_or_default(), expected);
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        validate_tree(&t);
        let got: Vec<u64> = t.iter().collect();
        let expected: Vec<u64> = m.values().copied().collect();
        prop_assert_eq!(got, expected);
        prop_assert_eq!(t.minimum(), m.values().next().copied());
        prop_assert_eq!(t.maximum(), m.values().next_back().copied());
    }

    #[test]
    fn prop_equivalence_u64(values in prop::collection::vec(any::<u64>(), 0..=500), removals in prop::collection::vec(any::<prop::sample::Index>(), 0..=200)) {
        let mut t = ArtTree::new(U64Keys);
        let mut m: HashMap<u64, u64> = HashMap::new();

        for &value in &values {
            let old_t = t.insert(&encode_u64(value), value).unwrap();
            let old_m = m.insert(value, value);
            prop_assert_eq!(old_t, old_m);
        }
        if !values.is_empty() {
            for index in removals {
                let value = *index.get(&values);
                prop_assert_eq!(t.erase(&encode_u64(value)), m.remove(&value));
            }
        }

        validate_tree(&t);
        prop_assert_eq!(t.len(), m.len());
        for &value in &values {
            prop_assert_eq!(t.lookup(&encode_u64(value)), m.get(&value).copied());
        }

        let mut sorted: Vec<u64> = m.keys().copied().collect();
        sorted.sort_unstable();
        prop_assert_eq!(t.iter().collect::<Vec<_>>(), sorted);
    }

    #[test]
    fn prop_ceiling_floor_u64(values in prop::collection::btree_set(0u64..10_000, 0..=300), probes in prop::collection::vec(0u64..10_100, 0..=100)) {
        let mut t = ArtTree::new(U64Keys);
        for &value in &values {
            t.insert(&encode_u64(value), value).unwrap();
        }
        let reference: BTreeSet<u64> = values;
        for probe in probes {
            let key = encode_u64(probe);
            prop_assert_eq!(t.ceiling(&key), reference.range(probe..).next().copied());
            prop_assert_eq!(t.floor(&key), reference.range(..=probe).next_back().copied());
        }
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

const SMALL_SET: [&[u8]; 6] = [b"a", b"b", b"c", b"aa", b"ab", b"ba"];

#[test]
fn exhaustive_insert_order_small_set() {
    for_each_permutation(&SMALL_SET, |perm| {
        let mut t = ArtTree::new(KeyTable::default());
        let mut m: BTreeMap<KeyBytes, u64> = BTreeMap::new();

        for raw in perm {
            let (key, id, old) = insert_str(&mut t, raw);
            assert_eq!(old, m.insert(key, id));
        }

        validate_tree(&t);
        let got: Vec<u64> = t.iter().collect();
        let expected: Vec<u64> = m.values().copied().collect();
        assert_eq!(got, expected);
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    // Insert in a fixed order, then remove in all permutations.
    let mut base_tree = ArtTree::new(KeyTable::default());
    let mut base_map: BTreeMap<KeyBytes, u64> = BTreeMap::new();
    for raw in SMALL_SET {
        let (key, id, old) = insert_str(&mut base_tree, raw);
        assert_eq!(old, base_map.insert(key, id));
    }

    for_each_permutation(&SMALL_SET, |perm| {
        let mut t = base_tree.clone();
        let mut m = base_map.clone();

        for raw in perm {
            let key = encode_str(raw).unwrap();
            assert_eq!(t.erase(&key), m.remove(&key));
            assert_eq!(t.len(), m.len());
            validate_tree(&t);
        }
        assert_eq!(t.len(), 0);
        assert!(t.is_empty());
    });
}

#[test]
fn exhaustive_long_paths() {
    // Every pair splits a path beyond the inline capacity at a different spot.
    let keys: [&[u8]; 5] = [
        b"0123456789abcdef/x",
        b"0123456789abcdef/y",
        b"0123456789abcdeg",
        b"0123456789ab",
        b"012345678",
    ];

    for_each_permutation(&keys, |perm| {
        let mut t = ArtTree::new(KeyTable::default());
        for raw in &perm {
            insert_str(&mut t, raw);
        }
        validate_tree(&t);
        for raw in &keys {
            let key = encode_str(raw).unwrap();
            assert!(t.lookup_with(&key, PrefixMatch::Pessimistic).is_some());
            assert!(t.lookup_with(&key, PrefixMatch::Optimistic).is_some());
        }
        for raw in perm {
            assert!(t.erase(&encode_str(raw).unwrap()).is_some());
            validate_tree(&t);
        }
        assert!(t.is_empty());
    });
}
