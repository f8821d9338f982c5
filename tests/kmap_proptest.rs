use kmap::KMap;
use proptest::prelude::*;
use std::collections::BTreeMap;

// Model operations on KMap through the public surface only and compare
// against a BTreeMap. Only the exact-counting paths are used, so the entry
// count must always equal the number of distinct keys.
proptest! {
    #[test]
    fn prop_kmap_matches_model(keys in 1u32..=400, ops in proptest::collection::vec((0u8..=3u8, 0u32..10_000u32, any::<i64>()), 1..400)) {
        let mut m: KMap<u32, i64> = KMap::new();
        let mut model: BTreeMap<u32, i64> = BTreeMap::new();

        for (op, raw_k, v) in ops {
            let k = raw_k % keys;
            match op {
                // Lookup-or-insert then overwrite
                0 => {
                    *m.get_or_insert_default(k) = v;
                    model.insert(k, v);
                }
                // Remove
                1 => {
                    prop_assert_eq!(m.remove(&k), model.remove(&k));
                }
                // Find
                2 => {
                    prop_assert_eq!(m.find(&k), model.get(&k));
                }
                // Add in place when present
                3 => {
                    if let Some(x) = m.find_mut(&k) {
                        *x = x.wrapping_add(v);
                    }
                    if let Some(x) = model.get_mut(&k) {
                        *x = x.wrapping_add(v);
                    }
                }
                _ => unreachable!(),
            }

            prop_assert_eq!(m.entry_count(), model.len());
            prop_assert_eq!(m.is_empty(), model.is_empty());
        }

        let mut pairs: Vec<(u32, i64)> = m.iter().map(|(k, v)| (*k, *v)).collect();
        pairs.sort();
        let expected: Vec<(u32, i64)> = model.into_iter().collect();
        prop_assert_eq!(pairs, expected);
    }
}
