use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeMap;

fn validate_trie<V, S: Symbol, const RANGE: usize>(t: &TrieMap<V, S, RANGE>) {
    let root = t.nodes.get(NodeId::ROOT);
    assert_eq!(root.parent, None, "root must not have a parent");

    let mut stack = vec![NodeId::ROOT];
    let mut reachable = 0usize;
    let mut values = 0usize;
    while let Some(id) = stack.pop() {
        reachable += 1;
        let node = t.nodes.get(id);
        if node.value.is_some() {
            values += 1;
        }

        let mut occupied = 0usize;
        for (index, child) in node.children.iter().enumerate() {
            let Some(child) = *child else {
                continue;
            };
            occupied += 1;
            let c = t.nodes.get(child);
            assert_eq!(c.parent, Some(id), "child must link back to its owner");
            assert_eq!(c.symbol, index, "child must remember its slot");
            assert!(
                c.value.is_some() || c.child_count > 0,
                "empty leaf must have been pruned"
            );
            stack.push(child);
        }
        assert_eq!(node.child_count, occupied, "cached child count is stale");
    }

    assert_eq!(reachable, t.node_count(), "unreachable nodes were leaked");
    assert_eq!(values, t.len(), "stored value count must match TrieMap::len");
}

fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
    // A tiny alphabet makes shared prefixes and prefix keys the common case.
    prop::collection::vec(b'a'..=b'd', 0..=6)
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 50)]
    Insert(#[proptest(strategy = "key_strategy()")] Vec<u8>, u64),
    #[proptest(weight = 25)]
    Remove(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 20)]
    Get(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 2)]
    DoubleAll,
    #[proptest(weight = 2)]
    Compact,
    #[proptest(weight = 2)]
    ShrinkToFit,
    #[proptest(weight = 1)]
    Clear,
}

fn cursor_entries(t: &TrieMap<u64>) -> Vec<(Vec<u8>, u64)> {
    let mut out = Vec::new();
    let mut c = t.begin();
    while c != t.end() {
        out.push((c.key(), *c.value().expect("cursor before end must have a value")));
        c.advance();
    }
    out
}

fn visitor_entries(t: &TrieMap<u64>) -> Vec<(Vec<u8>, u64)> {
    let mut out = Vec::new();
    let mut buf = [0u8; 16];
    t.for_each(&mut buf, |key, value| {
        out.push((key.to_vec(), *value));
        true
    });
    out
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_u64(ops in prop::collection::vec(any::<Op>(), 0..=500)) {
        let mut t: TrieMap<u64> = TrieMap::new();
        let mut m: BTreeMap<Vec<u8>, u64> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    let fresh = !m.contains_key(&key);
                    let expected = *m.entry(key.clone()).or_insert(value);
                    let (got, inserted) = t.insert(&key, value);
                    prop_assert_eq!((*got, inserted), (expected, fresh));
                }
                Op::Remove(key) => {
                    prop_assert_eq!(t.remove(&key), m.remove(&key));
                }
                Op::Get(key) => {
                    prop_assert_eq!(t.get(&key).copied(), m.get(&key).copied());
                }
                Op::DoubleAll => {
                    for (_, v) in t.iter_mut() {
                        *v = v.wrapping_mul(2);
                    }
                    for v in m.values_mut() {
                        *v = v.wrapping_mul(2);
                    }
                }
                Op::Compact => {
                    t.compact();
                }
                Op::ShrinkToFit => {
                    t.shrink_to_fit();
                }
                Op::Clear => {
                    t.clear();
                    m.clear();
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        validate_trie(&t);
        let expected: Vec<(Vec<u8>, u64)> = m.iter().map(|(k, v)| (k.clone(), *v)).collect();
        let got: Vec<(Vec<u8>, u64)> = t.iter().map(|(k, v)| (k, *v)).collect();
        prop_assert_eq!(&got, &expected);

        let below_root: Vec<(Vec<u8>, u64)> =
            expected.into_iter().filter(|(k, _)| !k.is_empty()).collect();
        prop_assert_eq!(&cursor_entries(&t), &below_root);
        prop_assert_eq!(&visitor_entries(&t), &below_root);
    }

    #[test]
    fn prop_erase_never_touches_other_keys(
        keys in prop::collection::btree_set(key_strategy(), 1..40),
        victim in any::<prop::sample::Index>(),
    ) {
        let keys: Vec<Vec<u8>> = keys.into_iter().collect();
        let mut t: TrieMap<u64> = TrieMap::new();
        for (i, k) in keys.iter().enumerate() {
            t.insert(k, i as u64);
        }

        let victim = victim.index(keys.len());
        prop_assert_eq!(t.remove(&keys[victim]), Some(victim as u64));
        validate_trie(&t);
        for (i, k) in keys.iter().enumerate() {
            let expected = (i != victim).then_some(i as u64);
            prop_assert_eq!(t.get(k).copied(), expected);
        }
    }

    #[test]
    fn prop_clone_is_independent(
        keys in prop::collection::vec(key_strategy(), 0..40),
        extra in key_strategy(),
    ) {
        let t: TrieMap<u64> = keys.iter().map(|k| (k, 1u64)).collect();
        let mut copy = t.clone();
        prop_assert_eq!(&copy, &t);

        for k in &keys {
            copy.erase(k);
        }
        copy.insert(&extra, 2);
        validate_trie(&copy);
        validate_trie(&t);
        for k in &keys {
            prop_assert_eq!(t.get(k), Some(&1));
        }
    }
}

/// Call `f` with every ordering of `keys` (Heap's algorithm, no recursion).
fn for_each_key_order(keys: &[Vec<u8>], mut f: impl FnMut(&[&[u8]])) {
    let mut order: Vec<&[u8]> = keys.iter().map(Vec::as_slice).collect();
    let mut counters = vec![0usize; order.len()];
    f(&order);

    let mut i = 1;
    while i < order.len() {
        if counters[i] < i {
            let j = if i % 2 == 0 { 0 } else { counters[i] };
            order.swap(j, i);
            f(&order);
            counters[i] += 1;
            i = 1;
        } else {
            counters[i] = 0;
            i += 1;
        }
    }
}

fn small_keys() -> Vec<Vec<u8>> {
    vec![
        b"a".to_vec(),
        b"b".to_vec(),
        b"c".to_vec(),
        b"aa".to_vec(),
        b"ab".to_vec(),
        b"ba".to_vec(),
    ]
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys = small_keys();
    let mut reference: Option<TrieMap<u64>> = None;

    let mut orders = 0;
    for_each_key_order(&keys, |order| {
        orders += 1;
        let mut t: TrieMap<u64> = TrieMap::new();
        for &k in order {
            // Value depends on the key only, so every order builds an equal map.
            t.insert(k, k.len() as u64 * 10 + u64::from(k[0]));
        }

        validate_trie(&t);
        let got: Vec<Vec<u8>> = cursor_entries(&t).into_iter().map(|(k, _)| k).collect();
        let mut expected = keys.clone();
        expected.sort();
        assert_eq!(got, expected);

        match &reference {
            Some(r) => assert_eq!(&t, r),
            None => reference = Some(t),
        }
    });
    assert_eq!(orders, 720);
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys = small_keys();

    let mut base_trie: TrieMap<u64> = TrieMap::new();
    let mut base_map: BTreeMap<Vec<u8>, u64> = BTreeMap::new();
    for (i, k) in keys.iter().enumerate() {
        let v = i as u64;
        t_insert(&mut base_trie, &mut base_map, k, v);
    }

    for_each_key_order(&keys, |order| {
        let mut t = base_trie.clone();
        let mut m = base_map.clone();

        for &k in order {
            assert_eq!(t.remove(k), m.remove(k));
            assert_eq!(t.len(), m.len());
            validate_trie(&t);
            assert_eq!(
                visitor_entries(&t),
                m.iter().map(|(k, v)| (k.clone(), *v)).collect::<Vec<_>>()
            );
        }
        assert_eq!(t.len(), 0);
        assert_eq!(t.node_count(), 1);
    });
}

fn t_insert(t: &mut TrieMap<u64>, m: &mut BTreeMap<Vec<u8>, u64>, key: &[u8], v: u64) {
    assert!(t.insert(key, v).1);
    assert!(m.insert(key.to_vec(), v).is_none());
}
