//! KMap: hash table of ordered buckets with load-factor driven rehashing.

use crate::iter::{Iter, IterMut};
use crate::kvec::KVec;
use crate::select::{select_bucket, Tuning};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash, Hasher};
use hashbrown::hash_map::DefaultHashBuilder;
use log::{debug, trace};
use std::collections::BTreeMap;

/// Average number of entries per bucket before the table grows.
pub const BUCKET_LOAD: usize = 64;

/// Fewest buckets a table ever has.
pub const MIN_BUCKETS: usize = 2;

pub type Bucket<K, V> = BTreeMap<K, V>;

#[derive(Clone)]
pub struct KMap<K, V, S = DefaultHashBuilder> {
    hasher: S,
    tuning: Tuning,
    buckets: KVec<Bucket<K, V>>, // every slot up to capacity is a bucket
    entries: usize,
    growth_threshold: usize,
    generation: u64,
}

impl<K, V> KMap<K, V>
where
    K: Hash + Ord,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    /// Pre-size for `expected` entries: `ceil(expected / BUCKET_LOAD)`
    /// buckets, never fewer than `MIN_BUCKETS`.
    pub fn with_capacity(expected: usize) -> Self {
        Self::with_tuning_and_hasher(expected, Tuning::default(), Default::default())
    }
}

impl<K, V, S> KMap<K, V, S>
where
    K: Hash + Ord,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_tuning_and_hasher(0, Tuning::default(), hasher)
    }

    pub fn with_tuning_and_hasher(expected: usize, tuning: Tuning, hasher: S) -> Self {
        let m = buckets_for(expected).max(MIN_BUCKETS);
        trace!("kmap: new table for {} entries, {} buckets", expected, m);
        let mut buckets = KVec::with_capacity(m);
        buckets.resize(m);
        Self {
            hasher,
            tuning,
            buckets,
            entries: 0,
            growth_threshold: m * BUCKET_LOAD,
            generation: 0,
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        let mut h = self.hasher.build_hasher();
        q.hash(&mut h);
        h.finish()
    }

    /// Bucket that `q` resolves to under the current bucket count.
    pub fn bucket_index<Q>(&self, q: &Q) -> usize
    where
        Q: ?Sized + Hash,
    {
        select_bucket(self.make_hash(q), self.buckets.capacity(), &self.tuning)
    }

    pub fn entry_count(&self) -> usize {
        self.entries
    }
    pub fn len(&self) -> usize {
        self.entries
    }
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }
    pub fn bucket_capacity(&self) -> usize {
        self.buckets.capacity()
    }
    pub fn growth_threshold(&self) -> usize {
        self.growth_threshold
    }
    pub fn tuning(&self) -> Tuning {
        self.tuning
    }
    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn slots(&self) -> &[Bucket<K, V>] {
        self.buckets.slots()
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Bucket<K, V>] {
        self.buckets.slots_mut()
    }

    /// Raw access to a whole bucket. Panics if `index >= bucket_capacity()`.
    pub fn bucket_at(&self, index: usize) -> &Bucket<K, V> {
        &self.buckets[index]
    }

    /// Mutable raw access to a whole bucket. Inserting or removing through
    /// this reference bypasses the entry count and the growth check; keys
    /// added here must belong to this bucket or they become unreachable.
    pub fn bucket_at_mut(&mut self, index: usize) -> &mut Bucket<K, V> {
        &mut self.buckets[index]
    }

    /// Write `value` under `key`, returning the value it replaced.
    ///
    /// The entry count goes up on every call, including when `key` was
    /// already present. Callers that overwrite keys through `insert` will see
    /// `entry_count()` run ahead of the number of distinct keys until the
    /// next rehash recounts the buckets.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.reserve_one();
        let index = self.bucket_index(&key);
        let old = self.buckets[index].insert(key, value);
        self.entries += 1;
        old
    }

    /// Value for `key`, inserting `V::default()` first if absent.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    /// Value for `key`, inserting `default()` first if absent. `default`
    /// only runs when an insertion happens.
    pub fn get_or_insert_with<F>(&mut self, key: K, default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let mut index = self.bucket_index(&key);
        if !self.buckets[index].contains_key(&key) {
            if self.reserve_one() {
                index = self.bucket_index(&key);
            }
            self.entries += 1;
        }
        self.buckets[index].entry(key).or_insert_with(default)
    }

    pub fn find<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Ord,
    {
        self.buckets[self.bucket_index(q)].get(q)
    }

    pub fn find_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Ord,
    {
        let index = self.bucket_index(q);
        self.buckets[index].get_mut(q)
    }

    pub fn find_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Ord,
    {
        self.buckets[self.bucket_index(q)].get_key_value(q)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Ord,
    {
        self.buckets[self.bucket_index(q)].contains_key(q)
    }

    /// Erase `q`, returning its value. Absent keys and an empty table leave
    /// everything untouched.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Ord,
    {
        if self.entries == 0 {
            return None;
        }
        let index = self.bucket_index(q);
        let removed = self.buckets[index].remove(q)?;
        self.entries -= 1;
        Some(removed)
    }

    /// Grow so that at least `min_entries` fit under the load factor.
    ///
    /// Does nothing unless `min_entries` reaches the current growth
    /// threshold; the table never shrinks here.
    pub fn resize(&mut self, min_entries: usize) {
        if min_entries < self.growth_threshold {
            return;
        }
        let m = buckets_for(min_entries);
        if m > self.buckets.capacity() {
            self.rehash_into(m);
        }
    }

    /// Drop every entry and return to `MIN_BUCKETS` buckets.
    pub fn clear(&mut self) {
        trace!("kmap: clear {} entries", self.entries);
        self.buckets.clear();
        self.buckets.resize(MIN_BUCKETS);
        self.growth_threshold = MIN_BUCKETS * BUCKET_LOAD;
        self.entries = 0;
        self.generation += 1;
    }

    /// Drop every entry, keeping the bucket count.
    pub fn clean(&mut self) {
        trace!("kmap: clean {} entries", self.entries);
        self.buckets.clean();
        self.entries = 0;
        self.generation += 1;
    }

    /// Exchange the complete state of two tables in O(1).
    pub fn swap(&mut self, other: &mut Self) {
        self.buckets.swap(&mut other.buckets);
        core::mem::swap(&mut self.hasher, &mut other.hasher);
        core::mem::swap(&mut self.tuning, &mut other.tuning);
        core::mem::swap(&mut self.entries, &mut other.entries);
        core::mem::swap(&mut self.growth_threshold, &mut other.growth_threshold);
        // Cursors taken from either table must not validate against the other.
        let next = self.generation.max(other.generation) + 1;
        self.generation = next;
        other.generation = next + 1;
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.buckets.slots())
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(self.buckets.slots_mut())
    }

    /// Double the bucket array if one more entry would pass the threshold.
    /// Returns true when a rehash happened.
    fn reserve_one(&mut self) -> bool {
        if self.entries < self.growth_threshold {
            return false;
        }
        let m = self.buckets.capacity() * 2;
        self.rehash_into(m);
        true
    }

    fn rehash_into(&mut self, new_m: usize) {
        let old_m = self.buckets.capacity();
        // The array's logical size is not used for occupancy; only capacity
        // matters to the table.
        self.buckets.resize(new_m);
        self.growth_threshold = new_m * BUCKET_LOAD;

        let mut moved = 0usize;
        let mut leaving: Vec<(usize, K, V)> = Vec::new();
        for i in 0..old_m {
            if self.buckets[i].is_empty() {
                continue;
            }
            // Split the bucket in one full pass, then apply the moves.
            let bucket = core::mem::take(&mut self.buckets[i]);
            let mut staying = Bucket::new();
            for (k, v) in bucket {
                let j = self.bucket_index(&k);
                if j == i {
                    staying.insert(k, v);
                } else {
                    leaving.push((j, k, v));
                }
            }
            self.buckets[i] = staying;
            moved += leaving.len();
            for (j, k, v) in leaving.drain(..) {
                self.buckets[j].insert(k, v);
            }
        }

        self.entries = self.buckets.slots().iter().map(Bucket::len).sum();
        self.generation += 1;
        debug!(
            "kmap: grew {} -> {} buckets, relocated {} of {} entries",
            old_m, new_m, moved, self.entries
        );
    }
}

/// `ceil(n / BUCKET_LOAD)`.
fn buckets_for(n: usize) -> usize {
    n.div_ceil(BUCKET_LOAD)
}

impl<K, V, S> Default for KMap<K, V, S>
where
    K: Hash + Ord,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> fmt::Debug for KMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(Iter::new(self.buckets.slots()))
            .finish()
    }
}

impl<K, V, S> Extend<(K, V)> for KMap<K, V, S>
where
    K: Hash + Ord,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for KMap<K, V, S>
where
    K: Hash + Ord,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut m = Self::default();
        m.extend(iter);
        m
    }
}

impl<'a, K, V, S> IntoIterator for &'a KMap<K, V, S>
where
    K: Hash + Ord,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut KMap<K, V, S>
where
    K: Hash + Ord,
    S: BuildHasher,
{
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
