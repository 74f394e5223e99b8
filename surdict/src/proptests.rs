use super::*;

use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Debug)]
enum Op {
    Insert(Vec<u8>),
    Remove(Vec<u8>),
    RemoveId(u64),
    Update(u64, Vec<u8>),
    Range(Vec<u8>),
}

fn string_strategy() -> impl Strategy<Value = Vec<u8>> + Clone {
    let short = prop::collection::vec(prop::sample::select(vec![b'a', b'b', b'c', b'/']), 0..=8);
    let stemmed = prop::collection::vec(b'a'..=b'd', 0..=4).prop_map(|tail| {
        let mut s = b"http://example.org/resource/".to_vec();
        s.extend(tail);
        s
    });
    prop_oneof![3 => short, 2 => stemmed]
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let s = string_strategy();
    let op = prop_oneof![
        50 => s.clone().prop_map(Op::Insert),
        10 => s.clone().prop_map(Op::Remove),
        10 => (1u64..200).prop_map(Op::RemoveId),
        10 => (1u64..200, s.clone()).prop_map(|(id, s)| Op::Update(id, s)),
        20 => s.prop_map(Op::Range),
    ];
    prop::collection::vec(op, 0..=400)
}

/// Reference model: strings to IDs and back.
#[derive(Default)]
struct Model {
    by_str: BTreeMap<Vec<u8>, u64>,
    by_id: HashMap<u64, Vec<u8>>,
    next_id: u64,
}

impl Model {
    fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    fn insert(&mut self, s: &[u8]) -> AddResult {
        if let Some(&id) = self.by_str.get(s) {
            return AddResult::Known(id);
        }
        let id = self.next_id;
        self.next_id += 1;
        self.by_str.insert(s.to_vec(), id);
        self.by_id.insert(id, s.to_vec());
        AddResult::Fresh(id)
    }

    fn remove_id(&mut self, id: u64) -> Option<Vec<u8>> {
        let s = self.by_id.remove(&id)?;
        self.by_str.remove(&s);
        Some(s)
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_dictionary_matches_model(ops in ops_strategy()) {
        let mut dict = ArtDictionary::new();
        let mut model = Model::new();

        for op in ops {
            match op {
                Op::Insert(s) => {
                    prop_assert_eq!(dict.insert(&s).unwrap(), model.insert(&s));
                }
                Op::Remove(s) => {
                    let expected = model.by_str.get(&s).copied();
                    if let Some(id) = expected {
                        model.remove_id(id);
                    }
                    prop_assert_eq!(dict.remove(&s), expected);
                }
                Op::RemoveId(id) => {
                    prop_assert_eq!(dict.remove_id(id), model.remove_id(id));
                }
                Op::Update(id, s) => {
                    let got = dict.update(id, &s);
                    match model.by_id.get(&id).cloned() {
                        None => prop_assert_eq!(got, Err(Error::UnknownId(id))),
                        Some(current) if current == s => {
                            prop_assert_eq!(got, Ok(AddResult::Known(id)));
                        }
                        Some(_) => {
                            model.remove_id(id);
                            prop_assert_eq!(got, Ok(model.insert(&s)));
                        }
                    }
                }
                Op::Range(prefix) => {
                    let ids: Vec<u64> = model
                        .by_str
                        .iter()
                        .filter(|(k, _)| k.starts_with(&prefix))
                        .map(|(_, &id)| id)
                        .collect();
                    prop_assert_eq!(dict.prefix_ids(&prefix), ids.clone());
                    let bounds = ids.first().copied().zip(ids.last().copied());
                    prop_assert_eq!(dict.range_lookup(&prefix), bounds);
                }
            }
            prop_assert_eq!(dict.len(), model.by_str.len());
        }

        let issues = dict.verify_integrity();
        prop_assert!(issues.is_empty(), "integrity issues: {:?}", issues);
        for (s, &id) in &model.by_str {
            prop_assert_eq!(dict.lookup_id(s), Some(id));
            prop_assert_eq!(dict.lookup_str(id), Some(s.as_slice()));
        }
        let got: Vec<u64> = dict.iter().map(|(id, _)| id).collect();
        let expected: Vec<u64> = model.by_str.values().copied().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_sorted_load_ranges_are_dense(strings in prop::collection::btree_set(string_strategy(), 0..=200), prefix in string_strategy()) {
        let mut dict = ArtDictionary::new();
        prop_assert_eq!(dict.bulk_load(&strings).unwrap(), strings.len());

        let matching: Vec<u64> = dict.prefix_ids(&prefix);
        if let Some((lo, hi)) = dict.range_lookup(&prefix) {
            prop_assert_eq!(matching, (lo..=hi).collect::<Vec<_>>());
        } else {
            prop_assert!(matching.is_empty());
        }
    }
}
