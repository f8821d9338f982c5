//! Traversal over a KMap: borrowing iterators and detached cursors.
//!
//! Both walk buckets in index order and each bucket in key order, skipping
//! empty buckets. Iterators borrow the table, so the compiler rules out
//! mutation underneath them. Cursors do not borrow; they carry the key they
//! point at plus the table's generation, and every dereference re-checks
//! both against the table.

use crate::kmap::{Bucket, KMap};
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use core::ops::Bound;
use std::collections::btree_map;
use thiserror::Error;

pub struct Iter<'a, K, V> {
    buckets: core::slice::Iter<'a, Bucket<K, V>>,
    inner: Option<btree_map::Iter<'a, K, V>>,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(buckets: &'a [Bucket<K, V>]) -> Self {
        Self {
            buckets: buckets.iter(),
            inner: None,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.inner.as_mut().and_then(Iterator::next) {
                return Some(item);
            }
            let bucket = self.buckets.next()?;
            self.inner = Some(bucket.iter());
        }
    }
}

impl<'a, K, V> Clone for Iter<'a, K, V> {
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets.clone(),
            inner: self.inner.clone(),
        }
    }
}

pub struct IterMut<'a, K, V> {
    buckets: core::slice::IterMut<'a, Bucket<K, V>>,
    inner: Option<btree_map::IterMut<'a, K, V>>,
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(crate) fn new(buckets: &'a mut [Bucket<K, V>]) -> Self {
        Self {
            buckets: buckets.iter_mut(),
            inner: None,
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.inner.as_mut().and_then(Iterator::next) {
                return Some(item);
            }
            let bucket = self.buckets.next()?;
            self.inner = Some(bucket.iter_mut());
        }
    }
}

/// Why a cursor could not be dereferenced or advanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CursorError {
    #[error("cursor out of range: positioned at end")]
    End,
    #[error("cursor out of range: table was restructured after the cursor was taken")]
    Stale,
    #[error("cursor out of range: entry is no longer in its bucket")]
    Vacant,
}

/// Detached position in a KMap.
///
/// Two cursors are equal when they name the same bucket and the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor<K> {
    bucket: usize,
    key: Option<K>,
    end: usize,
    generation: u64,
}

impl<K> Cursor<K> {
    pub fn at_end(&self) -> bool {
        self.bucket == self.end
    }

    /// Bucket the cursor is in; equals the bucket count at the end.
    pub fn bucket(&self) -> usize {
        self.bucket
    }

    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }
}

impl<K, V, S> KMap<K, V, S>
where
    K: Hash + Ord + Clone,
    S: BuildHasher,
{
    /// Cursor at the first entry of the first non-empty bucket, or `end()`.
    pub fn begin(&self) -> Cursor<K> {
        self.first_from(0)
    }

    pub fn end(&self) -> Cursor<K> {
        let m = self.bucket_capacity();
        Cursor {
            bucket: m,
            key: None,
            end: m,
            generation: self.generation(),
        }
    }

    /// Cursor positioned at `q`, if present.
    pub fn cursor_at<Q>(&self, q: &Q) -> Option<Cursor<K>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Ord,
    {
        let bucket = self.bucket_index(q);
        let (k, _) = self.bucket_at(bucket).get_key_value(q)?;
        Some(Cursor {
            bucket,
            key: Some(k.clone()),
            end: self.bucket_capacity(),
            generation: self.generation(),
        })
    }

    /// Step to the next entry, crossing into later buckets as needed.
    ///
    /// Works even if the current entry was removed: the cursor moves to the
    /// next key after it in the same bucket.
    pub fn advance(&self, cursor: &mut Cursor<K>) -> Result<(), CursorError> {
        let bucket = self.cursor_bucket(cursor)?;
        let key = cursor.key.as_ref().ok_or(CursorError::End)?;
        let next = bucket
            .range::<K, _>((Bound::Excluded(key), Bound::Unbounded))
            .next()
            .map(|(k, _)| k.clone());
        match next {
            Some(k) => cursor.key = Some(k),
            None => *cursor = self.first_from(cursor.bucket + 1),
        }
        Ok(())
    }

    pub fn cursor_entry(&self, cursor: &Cursor<K>) -> Result<(&K, &V), CursorError> {
        let bucket = self.cursor_bucket(cursor)?;
        let key = cursor.key.as_ref().ok_or(CursorError::End)?;
        bucket.get_key_value(key).ok_or(CursorError::Vacant)
    }

    pub fn cursor_key(&self, cursor: &Cursor<K>) -> Result<&K, CursorError> {
        self.cursor_entry(cursor).map(|(k, _)| k)
    }

    pub fn cursor_value(&self, cursor: &Cursor<K>) -> Result<&V, CursorError> {
        self.cursor_entry(cursor).map(|(_, v)| v)
    }

    pub fn cursor_value_mut(&mut self, cursor: &Cursor<K>) -> Result<&mut V, CursorError> {
        self.check_generation(cursor)?;
        let key = cursor.key.as_ref().ok_or(CursorError::End)?;
        if cursor.at_end() {
            return Err(CursorError::End);
        }
        self.slots_mut()
            .get_mut(cursor.bucket)
            .ok_or(CursorError::Stale)?
            .get_mut(key)
            .ok_or(CursorError::Vacant)
    }

    /// Overwrite the value under the cursor, returning the old one.
    pub fn set_cursor_value(&mut self, cursor: &Cursor<K>, value: V) -> Result<V, CursorError> {
        let slot = self.cursor_value_mut(cursor)?;
        Ok(core::mem::replace(slot, value))
    }

    // A cursor belongs to this table layout only if both the generation and
    // the bucket count it was taken under still hold.
    fn check_generation(&self, cursor: &Cursor<K>) -> Result<(), CursorError> {
        if cursor.generation == self.generation() && cursor.end == self.bucket_capacity() {
            Ok(())
        } else {
            Err(CursorError::Stale)
        }
    }

    // Bucket under a live cursor. End cursors report `End`; a bucket index
    // outside this table reports `Stale`.
    fn cursor_bucket(&self, cursor: &Cursor<K>) -> Result<&Bucket<K, V>, CursorError> {
        self.check_generation(cursor)?;
        if cursor.at_end() {
            return Err(CursorError::End);
        }
        self.slots().get(cursor.bucket).ok_or(CursorError::Stale)
    }

    fn first_from(&self, start: usize) -> Cursor<K> {
        let slots = self.slots();
        let hit = slots
            .iter()
            .enumerate()
            .skip(start)
            .find_map(|(i, b)| b.keys().next().map(|k| (i, k.clone())));
        match hit {
            Some((bucket, key)) => Cursor {
                bucket,
                key: Some(key),
                end: slots.len(),
                generation: self.generation(),
            },
            None => self.end(),
        }
    }
}
