#![cfg(test)]

// Property tests for KMap kept inside the crate so they can reach the
// bucket layout directly.

use crate::kmap::{KMap, BUCKET_LOAD};
use core::hash::{BuildHasher, Hasher};
use hashbrown::HashMap;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::fmt;

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    GetOrInsert(usize, i32),
    Remove(usize),
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    Resize(usize),
    Clean,
    Iterate,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=12).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::GetOrInsert(i, v)),
            2 => idx.clone().prop_map(OpI::Remove),
            1 => idx.clone().prop_map(OpI::Find),
            1 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => (0usize..1_000).prop_map(OpI::Resize),
            1 => Just(OpI::Clean),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..300).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Drive `sut` and a hashbrown model through `ops`, tracking the entry count
// the table is expected to report.
//
// Invariants exercised:
// - `find`/`contains_key` parity with the model after every op.
// - `insert` counts every call; `get_or_insert_with` and `remove` count only
//   real changes; a rehash recounts from the buckets.
// - Growth happens exactly when the count reaches the threshold and doubles
//   the bucket count.
// - Every model key sits in the bucket `bucket_index` reports, and bucket
//   sizes sum to the number of distinct keys.
// - `iter` and a cursor walk both yield each live entry exactly once.
fn run_state_machine<S>(
    mut sut: KMap<Key, i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError>
where
    S: BuildHasher,
{
    let mut model: HashMap<Key, i32> = HashMap::new();
    let mut count = 0usize;

    for op in ops {
        let buckets_before = sut.bucket_capacity();
        let threshold_before = sut.growth_threshold();
        let mut grew = false;
        let resized = matches!(op, OpI::Resize(_));
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(pool, i);
                if count >= threshold_before {
                    count = model.len();
                    grew = true;
                }
                let old = sut.insert(k.clone(), v);
                prop_assert_eq!(old, model.insert(k, v));
                count += 1;
            }
            OpI::GetOrInsert(i, v) => {
                let k = key_from(pool, i);
                let absent = !model.contains_key(&k);
                if absent {
                    if count >= threshold_before {
                        count = model.len();
                        grew = true;
                    }
                    count += 1;
                }
                let got = *sut.get_or_insert_with(k.clone(), || v);
                let want = *model.entry(k).or_insert(v);
                prop_assert_eq!(got, want);
            }
            OpI::Remove(i) => {
                let k = key_from(pool, i);
                // The count never drops below the number of distinct keys,
                // so the empty-count short circuit only hits empty tables.
                let removed = sut.remove(&k);
                prop_assert_eq!(removed, model.remove(&k));
                if removed.is_some() {
                    count -= 1;
                }
                prop_assert!(!sut.contains_key(&k));
            }
            OpI::Find(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.find(&k), model.get(&k));
            }
            OpI::Contains(s) => {
                let has = sut.contains_key(s.as_str());
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(has, has_model);
            }
            OpI::Mutate(i, d) => {
                let k = key_from(pool, i);
                if let Some(vr) = sut.find_mut(&k) {
                    *vr = vr.wrapping_add(d);
                }
                if let Some(mv) = model.get_mut(&k) {
                    *mv = mv.wrapping_add(d);
                }
            }
            OpI::Resize(n) => {
                sut.resize(n);
                if n >= threshold_before && n.div_ceil(BUCKET_LOAD) > buckets_before {
                    count = model.len();
                    prop_assert_eq!(sut.bucket_capacity(), n.div_ceil(BUCKET_LOAD));
                } else {
                    prop_assert_eq!(sut.bucket_capacity(), buckets_before);
                }
            }
            OpI::Clean => {
                sut.clean();
                model.clear();
                count = 0;
                prop_assert_eq!(sut.bucket_capacity(), buckets_before);
            }
            OpI::Iterate => {
                let s_keys: Vec<_> = sut.iter().map(|(k, _)| k.clone()).collect();
                let unique: BTreeSet<_> = s_keys.iter().cloned().collect();
                prop_assert_eq!(s_keys.len(), unique.len());
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(unique, m_keys);

                let mut walked = Vec::new();
                let mut c = sut.begin();
                while !c.at_end() {
                    walked.push(sut.cursor_key(&c).unwrap().clone());
                    sut.advance(&mut c).unwrap();
                }
                prop_assert_eq!(walked, s_keys);
            }
        }

        if grew {
            prop_assert_eq!(sut.bucket_capacity(), buckets_before * 2);
            prop_assert_eq!(sut.growth_threshold(), threshold_before * 2);
        } else if !resized {
            prop_assert_eq!(sut.bucket_capacity(), buckets_before);
        }

        // Post-conditions after each op
        prop_assert_eq!(sut.entry_count(), count);
        prop_assert_eq!(sut.is_empty(), count == 0);
        prop_assert_eq!(sut.growth_threshold(), sut.bucket_capacity() * BUCKET_LOAD);
        let stored: usize = (0..sut.bucket_capacity()).map(|i| sut.bucket_at(i).len()).sum();
        prop_assert_eq!(stored, model.len());
        for (k, v) in model.iter() {
            let b = sut.bucket_index(k);
            prop_assert_eq!(sut.bucket_at(b).get(k), Some(v));
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_state_machine(KMap::new(), &pool, ops)?;
    }
}

// Collision variant using a constant hasher: every key lands in bucket 0,
// so growth relocates nothing and bucket 0 carries the whole table.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_state_machine(KMap::with_hasher(ConstBuildHasher), &pool, ops)?;
    }
}

// Growth-heavy variant: many distinct keys through the counting-exact
// insertion path, checking that every key survives each rehash.
proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_growth_keeps_every_key(keys in proptest::collection::btree_set(any::<u32>(), 1..1_500)) {
        let mut sut: KMap<u32, u32> = KMap::new();
        for &k in &keys {
            *sut.get_or_insert_default(k) = k ^ 0x5a5a;
        }
        prop_assert_eq!(sut.entry_count(), keys.len());
        let expected_buckets = keys.len().div_ceil(BUCKET_LOAD).max(2).next_power_of_two();
        prop_assert_eq!(sut.bucket_capacity(), expected_buckets);
        for &k in &keys {
            prop_assert_eq!(sut.find(&k), Some(&(k ^ 0x5a5a)));
        }
        prop_assert_eq!(sut.iter().count(), keys.len());
    }
}
